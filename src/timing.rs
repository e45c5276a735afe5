/*
\file
\brief Phase timers for a partitioning run
*/

use std::fmt;
use std::time::{Duration, Instant};

/// Accumulated wall time per phase
#[derive(Debug, Default, Clone)]
pub struct Timers {
    pub total: Duration,
    pub coarsen: Duration,
    pub matching: Duration,
    pub make_cgraph: Duration,
    pub lanczos: Duration,
    pub rqi: Duration,
    pub assign: Duration,
    pub inertial: Duration,
    pub kl: Duration,
    pub klv: Duration,
    pub bpm: Duration,
    pub refine_part: Duration,
}

/// Selects one accumulator of [`Timers`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Timer {
    Total,
    Coarsen,
    Matching,
    MakeCgraph,
    Lanczos,
    Rqi,
    Assign,
    Inertial,
    Kl,
    Klv,
    Bpm,
    RefinePart,
}

impl Timers {
    /// clears the timers
    pub fn init_timers(&mut self) {
        *self = Self::default();
    }

    fn slot(&mut self, timer: Timer) -> &mut Duration {
        match timer {
            Timer::Total => &mut self.total,
            Timer::Coarsen => &mut self.coarsen,
            Timer::Matching => &mut self.matching,
            Timer::MakeCgraph => &mut self.make_cgraph,
            Timer::Lanczos => &mut self.lanczos,
            Timer::Rqi => &mut self.rqi,
            Timer::Assign => &mut self.assign,
            Timer::Inertial => &mut self.inertial,
            Timer::Kl => &mut self.kl,
            Timer::Klv => &mut self.klv,
            Timer::Bpm => &mut self.bpm,
            Timer::RefinePart => &mut self.refine_part,
        }
    }

    /// Adds the time elapsed since `start` to a timer
    pub fn add(&mut self, timer: Timer, start: Instant) {
        *self.slot(timer) += start.elapsed();
    }
}

impl fmt::Display for Timers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = |d: Duration| d.as_secs_f64();
        writeln!(
            f,
            "Timing Information -------------------------------------------------"
        )?;
        writeln!(f, " Partitioning: \t\t {:7.3}", s(self.total))?;
        writeln!(f, "     Coarsening: \t\t {:7.3}", s(self.coarsen))?;
        writeln!(f, "            Matching: \t\t\t {:7.3}", s(self.matching))?;
        writeln!(f, "            Contract: \t\t\t {:7.3}", s(self.make_cgraph))?;
        writeln!(f, "     Lanczos: \t\t\t {:7.3}", s(self.lanczos))?;
        writeln!(f, "     RQI: \t\t\t {:7.3}", s(self.rqi))?;
        writeln!(f, "     Inertial: \t\t\t {:7.3}", s(self.inertial))?;
        writeln!(f, "     Assignment: \t\t {:7.3}", s(self.assign))?;
        writeln!(f, "     KL: \t\t\t {:7.3}", s(self.kl))?;
        writeln!(f, "     KLV: \t\t\t {:7.3}", s(self.klv))?;
        writeln!(f, "     BPM: \t\t\t {:7.3}", s(self.bpm))?;
        writeln!(f, "     Pairwise refinement: \t {:7.3}", s(self.refine_part))?;
        write!(
            f,
            "********************************************************************"
        )
    }
}
