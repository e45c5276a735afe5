/*
\file
\brief Statistics of a finished partition: set weights and sizes, cuts, hops, boundary and
internal vertices, and the separator when there is one.
*/

use std::fmt;

use crate::arch::Architecture;
use crate::defs::SEPARATOR;
use crate::graph::Graph;
use crate::util::{argmax, argmin};

#[derive(Debug, Clone, PartialEq)]
pub struct PartitionReport {
    pub nsets: usize,
    pub set_wgts: Vec<i64>,
    pub set_sizes: Vec<usize>,
    pub goals: Vec<f64>,
    /// total weight of the edges between different sets
    pub cut_weight: f64,
    pub cut_edges: usize,
    /// cut weight times the architecture distance between the sets
    pub total_hops: f64,
    /// `pair_cuts[a][b]` is the weight of the edges between sets `a` and `b`
    pub pair_cuts: Vec<Vec<f64>>,
    /// vertices of each set with a neighbor elsewhere
    pub boundary: Vec<usize>,
    pub internal: Vec<usize>,
    /// (size, weight) of the vertex separator
    pub separator: Option<(usize, i64)>,
}

/// Gathers the statistics of `assignment`. Vertices marked `SEPARATOR` count toward the
/// separator only.
pub fn countup(
    graph: &Graph,
    assignment: &[usize],
    goals: &[f64],
    arch: &Architecture,
) -> PartitionReport {
    let nsets = goals.len();
    let mut set_wgts = vec![0i64; nsets];
    let mut set_sizes = vec![0usize; nsets];
    let mut pair_cuts = vec![vec![0.0f64; nsets]; nsets];
    let mut boundary = vec![0usize; nsets];
    let mut internal = vec![0usize; nsets];
    let mut sep: Option<(usize, i64)> = None;
    let mut cut_edges = 0;

    for (v, vtx) in graph.vtxs.iter().enumerate() {
        let a = assignment[v];
        if a == SEPARATOR {
            let s = sep.get_or_insert((0, 0));
            s.0 += 1;
            s.1 += vtx.vwgt as i64;
            continue;
        }
        set_wgts[a] += vtx.vwgt as i64;
        set_sizes[a] += 1;

        let mut on_boundary = false;
        for (u, w) in vtx.adj() {
            let b = assignment[u];
            if b != a {
                on_boundary = true;
                if b != SEPARATOR {
                    pair_cuts[a][b] += w as f64;
                    if a < b {
                        cut_edges += 1;
                    }
                }
            }
        }
        if on_boundary {
            boundary[a] += 1;
        } else {
            internal[a] += 1;
        }
    }

    let mut cut_weight = 0.0;
    let mut total_hops = 0.0;
    for a in 0..nsets {
        for b in a + 1..nsets {
            cut_weight += pair_cuts[a][b];
            total_hops += pair_cuts[a][b] * arch.hops(a, b) as f64;
        }
    }

    PartitionReport {
        nsets,
        set_wgts,
        set_sizes,
        goals: goals.to_vec(),
        cut_weight,
        cut_edges,
        total_hops,
        pair_cuts,
        boundary,
        internal,
        separator: sep,
    }
}

impl PartitionReport {
    /// Largest set weight over its goal
    pub fn max_imbalance(&self) -> f64 {
        self.set_wgts
            .iter()
            .zip(&self.goals)
            .filter(|(_, &g)| g > 0.0)
            .map(|(&w, &g)| w as f64 / g)
            .fold(0.0, f64::max)
    }

    /// Number of other sets each set shares an edge with
    pub fn adjacent_sets(&self) -> Vec<usize> {
        self.pair_cuts
            .iter()
            .map(|row| row.iter().filter(|&&c| c > 0.0).count())
            .collect()
    }
}

/// min, max and average of a per-set quantity
fn spread<T: PartialOrd + Copy + Into<f64>>(x: &[T]) -> (T, T, f64) {
    let avg = x.iter().map(|&v| v.into()).sum::<f64>() / x.len().max(1) as f64;
    (x[argmin(x)], x[argmax(x)], avg)
}

impl fmt::Display for PartitionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.nsets == 0 {
            return writeln!(f, "empty partition");
        }
        writeln!(
            f,
            "{}-way Cut: {:.0} ({} edges), Hops: {:.0}, Balance: {:5.3}",
            self.nsets,
            self.cut_weight,
            self.cut_edges,
            self.total_hops,
            self.max_imbalance()
        )?;

        let wgts: Vec<f64> = self.set_wgts.iter().map(|&w| w as f64).collect();
        let (lo, hi, avg) = spread(&wgts);
        writeln!(f, "Min/Max/Avg set weight:          {lo:7.0} {hi:7.0} {avg:9.2}")?;

        let adj: Vec<u32> = self.adjacent_sets().iter().map(|&n| n as u32).collect();
        let (lo, hi, avg) = spread(&adj);
        writeln!(f, "Min/Max/Avg # of adjacent sets:  {lo:7} {hi:7} {avg:9.2}")?;

        let cuts: Vec<f64> = self.pair_cuts.iter().map(|row| row.iter().sum()).collect();
        let (lo, hi, avg) = spread(&cuts);
        writeln!(f, "Min/Max/Avg set cut weight:      {lo:7.0} {hi:7.0} {avg:9.2}")?;

        let bnd: Vec<u32> = self.boundary.iter().map(|&n| n as u32).collect();
        let (lo, hi, avg) = spread(&bnd);
        writeln!(f, "Min/Max/Avg boundary vertices:   {lo:7} {hi:7} {avg:9.2}")?;

        let int: Vec<u32> = self.internal.iter().map(|&n| n as u32).collect();
        let (lo, hi, avg) = spread(&int);
        write!(f, "Min/Max/Avg internal vertices:   {lo:7} {hi:7} {avg:9.2}")?;

        if let Some((size, wgt)) = self.separator {
            write!(f, "\nSeparator: {size} vertices, weight {wgt}")?;
        }
        Ok(())
    }
}
