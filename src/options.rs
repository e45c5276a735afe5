/*
\file
\brief Run parameters and the per-run control structure.

Every tunable lives in [`Params`]; everything that changes while a run is in progress (the random
number generator, timers, counters, the adaptive bisection safety factor) lives in [`Ctrl`], which
is created fresh for every call into the partitioner.
*/

use std::fmt;

use crate::error::{ChacoError, Result};
use crate::timing::Timers;

/// How each subgraph is divided before local refinement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GlobalMethod {
    /// Coarsen, partition the coarsest graph spectrally, refine with KL while uncoarsening.
    MultilevelKl,
    /// Eigenvectors of the Laplacian followed by an assignment scheme.
    Spectral,
    /// Principal axes of the vertex coordinates.
    Inertial,
    /// Consecutive vertex numbers.
    Linear,
    /// Random permutation, then linear.
    Random,
    /// Round robin over the sets.
    Scattered,
    /// Use the caller supplied assignment.
    Provided,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocalMethod {
    Kl,
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EigenMethod {
    /// Lanczos directly on the graph being divided.
    Lanczos,
    /// Lanczos on a coarsened graph, then interpolation and RQI while uncoarsening.
    MultilevelRqi,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LanczosVariant {
    /// Full orthogonalization.
    Full,
    /// Full orthogonalization on the inverted operator.
    FullInverse,
    /// Selective orthogonalization against good Ritz vectors at the left end.
    Selective,
    /// Selective orthogonalization monitoring both ends of the spectrum.
    SelectiveBothEnds,
}

/// Storage precision of the selective orthogonalization Lanczos vectors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Precision {
    Single,
    Double,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchType {
    /// In-order scan from a random start, first unmatched neighbor.
    Cheap,
    /// Random order, heaviest unmatched edge.
    HeavyEdge,
    /// Random order, random unmatched neighbor.
    Random,
    /// Uniformly random edges.
    FullyRandom,
    /// Nearest unmatched neighbor in the supplied coordinates.
    Geometric,
}

/// How eigenvector (or inertial) coordinates become a set assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MappingType {
    CutAtOrigin,
    MinCost,
    RecursiveMedian,
    IndependentMedians,
}

/// Debug levels, combined as bit flags in [`Params::dbglvl`].
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DbgLvl {
    Info = 1,
    Time = 2,
    Coarsen = 4,
    Lanczos = 8,
    Rqi = 16,
    Assign = 32,
    Refine = 64,
    MoveInfo = 128,
    SepInfo = 256,
    Input = 512,
}

#[derive(Debug, Clone)]
pub struct Params {
    pub global_method: GlobalMethod,
    pub local_method: LocalMethod,
    pub eigen_method: EigenMethod,
    pub lanczos_variant: LanczosVariant,
    pub precision: Precision,

    /// Number of hypercube dimensions handled per division step (1, 2 or 3).
    pub ndims: usize,
    pub mapping: MappingType,

    /// Eigensolver tolerance.
    pub eigtol: f64,
    /// Lanczos iteration cap. `None` means twice the number of vertices.
    pub lanczos_maxitns: Option<usize>,
    /// Steps between pauses of selective orthogonalization.
    pub lanczos_so_interval: usize,
    /// Memory budget for stored Lanczos vectors. `None` means unlimited.
    pub lanczos_max_vecs: Option<usize>,
    /// Initial multiplier on the bisection tolerance for Ritz values.
    pub bisection_safety: f64,
    /// Residuals above `warning_evecs * eigtol` get a warning.
    pub warning_evecs: f64,
    /// Rayleigh quotient iterations per eigenvector.
    pub rqi_maxiter: usize,

    /// Coarsen until at most this many vertices remain.
    pub vmax: usize,
    pub match_type: MatchType,
    /// Give up coarsening when a level keeps more than this fraction of vertices.
    pub coarsen_ratio_min: f64,
    /// Levels between RQI refinements while uncoarsening eigenvectors.
    pub coarse_nlevel_rqi: usize,
    /// Levels between KL refinements while uncoarsening a partition.
    pub coarse_nlevel_kl: usize,

    /// Allowed fractional imbalance in KL.
    pub kl_imbalance: f64,
    /// Consecutive non-improving moves before a pass stops.
    pub kl_bad_moves: usize,
    /// Non-improving passes before refinement stops.
    pub kl_ntries_bad: usize,
    pub kl_max_pass: usize,
    /// Randomize the order in which vertices enter the buckets.
    pub kl_randomize: bool,
    /// Upper bound on the number of bucket slots KL may allocate.
    pub kl_max_bucket_space: usize,

    pub term_prop: bool,
    /// Relative cost of a cut edge vs. a hop in terminal propagation.
    pub cut_to_hop_cost: f64,

    pub vertex_separator: bool,
    /// Build the initial separator as a minimum cover of the cut edges.
    pub vertex_cover: bool,
    /// Passes of pairwise KL between adjacent final sets.
    pub refine_partition: usize,
    pub internal_vertices: bool,
    pub output_metrics: bool,

    pub seed: u64,
    pub dbglvl: u32,
}

impl Default for Params {
    fn default() -> Self {
        Self {
            global_method: GlobalMethod::MultilevelKl,
            local_method: LocalMethod::Kl,
            eigen_method: EigenMethod::Lanczos,
            lanczos_variant: LanczosVariant::Selective,
            precision: Precision::Double,
            ndims: 1,
            mapping: MappingType::MinCost,
            eigtol: 1.0e-3,
            lanczos_maxitns: None,
            lanczos_so_interval: 10,
            lanczos_max_vecs: None,
            bisection_safety: 10.0,
            warning_evecs: 2.0,
            rqi_maxiter: 10,
            vmax: 100,
            match_type: MatchType::Cheap,
            coarsen_ratio_min: 0.7,
            coarse_nlevel_rqi: 2,
            coarse_nlevel_kl: 2,
            kl_imbalance: 0.0,
            kl_bad_moves: 20,
            kl_ntries_bad: 1,
            kl_max_pass: 50,
            kl_randomize: true,
            kl_max_bucket_space: 1 << 26,
            term_prop: false,
            cut_to_hop_cost: 1.0,
            vertex_separator: false,
            vertex_cover: false,
            refine_partition: 0,
            internal_vertices: false,
            output_metrics: false,
            seed: 7654321,
            dbglvl: 0,
        }
    }
}

impl Params {
    /// Checks the validity of the parameters on their own. Checks that need the graph happen in
    /// [`crate::checkgraph::check_input`].
    pub fn check_params(&self) -> Result<()> {
        if !(1..=3).contains(&self.ndims) {
            return Err(ChacoError::InvalidParams(format!(
                "ndims must be 1, 2 or 3, got {}",
                self.ndims
            )));
        }
        if !(self.eigtol > 0.0 && self.eigtol < 1.0) {
            return Err(ChacoError::InvalidParams(format!(
                "eigtol must lie in (0, 1), got {}",
                self.eigtol
            )));
        }
        if self.lanczos_so_interval == 0 {
            return Err(ChacoError::InvalidParams(
                "lanczos_so_interval must be positive".into(),
            ));
        }
        if self.bisection_safety < 1.0 {
            return Err(ChacoError::InvalidParams(format!(
                "bisection_safety must be at least 1, got {}",
                self.bisection_safety
            )));
        }
        if !(0.0..1.0).contains(&self.kl_imbalance) {
            return Err(ChacoError::InvalidParams(format!(
                "kl_imbalance must lie in [0, 1), got {}",
                self.kl_imbalance
            )));
        }
        if !(self.coarsen_ratio_min > 0.0 && self.coarsen_ratio_min <= 1.0) {
            return Err(ChacoError::InvalidParams(format!(
                "coarsen_ratio_min must lie in (0, 1], got {}",
                self.coarsen_ratio_min
            )));
        }
        if self.coarse_nlevel_rqi == 0 || self.coarse_nlevel_kl == 0 {
            return Err(ChacoError::InvalidParams(
                "coarse_nlevel_rqi and coarse_nlevel_kl must be positive".into(),
            ));
        }
        if self.rqi_maxiter == 0 {
            return Err(ChacoError::InvalidParams("rqi_maxiter must be positive".into()));
        }
        if self.uses_coarsening() {
            let min = 2 << self.ndims;
            if self.vmax < min {
                return Err(ChacoError::CoarseningFloor {
                    vmax: self.vmax,
                    min,
                });
            }
        }
        Ok(())
    }

    /// true if some stage of the configured run builds a multilevel hierarchy
    pub fn uses_coarsening(&self) -> bool {
        match self.global_method {
            GlobalMethod::MultilevelKl => true,
            GlobalMethod::Spectral => self.eigen_method == EigenMethod::MultilevelRqi,
            _ => false,
        }
    }

    pub fn needs_eigensolver(&self) -> bool {
        matches!(
            self.global_method,
            GlobalMethod::MultilevelKl | GlobalMethod::Spectral
        )
    }
}

impl fmt::Display for Params {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Runtime parameters:")?;
        writeln!(f, "   Global method: {:?}", self.global_method)?;
        writeln!(f, "   Local method: {:?}", self.local_method)?;
        if self.needs_eigensolver() {
            writeln!(
                f,
                "   Eigensolver: {:?} ({:?}, {:?}), tolerance {:.2e}",
                self.eigen_method, self.lanczos_variant, self.precision, self.eigtol
            )?;
        }
        if self.uses_coarsening() {
            writeln!(
                f,
                "   Coarsening: vmax {}, matching {:?}, ratio min {:.2}",
                self.vmax, self.match_type, self.coarsen_ratio_min
            )?;
        }
        writeln!(f, "   Dimensions per step: {}, mapping {:?}", self.ndims, self.mapping)?;
        writeln!(
            f,
            "   KL: imbalance {:.3}, bad moves {}, bad passes {}",
            self.kl_imbalance, self.kl_bad_moves, self.kl_ntries_bad
        )?;
        writeln!(
            f,
            "   Terminal propagation: {}, vertex separator: {}",
            self.term_prop, self.vertex_separator
        )?;
        write!(f, "   Seed: {}", self.seed)
    }
}

/// Instrumentation counters, reset at the start of every run.
#[derive(Debug, Default, Clone)]
pub struct Counters {
    pub nvtx_moves: usize,
    pub lanczos_steps: usize,
    pub rqi_iterations: usize,
    pub minres_steps: usize,
    pub coarsen_levels: usize,
    pub kl_passes: usize,
    pub klv_passes: usize,
    pub bpm_rounds: usize,
}

/// Per-run control structure. Owns every piece of mutable run state.
pub struct Ctrl {
    pub params: Params,
    pub dbglvl: u32,
    pub rng: fastrand::Rng,
    pub timers: Timers,
    pub counters: Counters,
    /// Current bisection safety factor. Grows when Ritz vectors come out inaccurate.
    pub bisection_safety: f64,
}

impl Ctrl {
    pub fn new(params: Params) -> Self {
        let rng = fastrand::Rng::with_seed(params.seed);
        let dbglvl = params.dbglvl;
        let bisection_safety = params.bisection_safety;
        Self {
            params,
            dbglvl,
            rng,
            timers: Timers::default(),
            counters: Counters::default(),
            bisection_safety,
        }
    }

    /// Reseeds and clears all instrumentation.
    pub fn reset(&mut self) {
        self.rng = fastrand::Rng::with_seed(self.params.seed);
        self.timers.init_timers();
        self.counters = Counters::default();
        self.bisection_safety = self.params.bisection_safety;
    }

    pub fn print_ctrl(&self) {
        ifset!(self.dbglvl, DbgLvl::Info, log::info!("{}", self.params));
    }
}
