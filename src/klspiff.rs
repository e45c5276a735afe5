/*
\file
\brief Kernighan-Lin refinement of an edge partition into several sets.

Gains are integers. Fractional edge weights and terminal costs are scaled so that the largest
maps to `KL_EWGT_RESOLUTION` and rounded, positive weights staying at least 1. A cut edge costs
its weight times the number of hops between the sets of its ends, so the same code refines both
bisections and hypercube divisions.

Each pass moves every vertex at most once, always taking the best eligible move over all set
pairs, and then rolls back to the best point seen. Points are ranked by total balance violation
first and cumulative gain second.
*/

use std::time::Instant;

use log::debug;

use crate::bucketsort::Buckets;
use crate::defs::KL_EWGT_RESOLUTION;
use crate::graph::Graph;
use crate::options::{Ctrl, DbgLvl};
use crate::timing::Timer;
use crate::util::hops;

/// Hop counts between hypercube labels `0..nsets`
pub fn hop_matrix(nsets: usize) -> Vec<Vec<usize>> {
    (0..nsets)
        .map(|a| (0..nsets).map(|b| hops(a, b)).collect())
        .collect()
}

/// Integer edge weights and terminal costs of one refinement call
pub(crate) struct IntWeights {
    /// parallel to each vertex's `edges`, slot 0 unused
    pub ewgts: Vec<Vec<i64>>,
    /// `term[set][vertex]`
    pub term: Option<Vec<Vec<i64>>>,
}

impl IntWeights {
    pub fn new(graph: &Graph, term: Option<&[Vec<f64>]>) -> Self {
        let mut max = 0.0f64;
        let mut integral = true;
        if graph.using_ewgts {
            for vtx in &graph.vtxs {
                for &w in &vtx.ewgts[1..] {
                    max = max.max(w as f64);
                    integral &= w.fract() == 0.0;
                }
            }
        }
        if let Some(term) = term {
            for &c in term.iter().flatten() {
                max = max.max(c.abs());
                integral &= c.fract() == 0.0;
            }
        }
        let scale = if integral || max == 0.0 {
            1.0
        } else {
            KL_EWGT_RESOLUTION / max
        };
        let round = |x: f64| -> i64 {
            let r = (x * scale).round() as i64;
            if x > 0.0 {
                r.max(1)
            } else {
                r
            }
        };

        let ewgts = graph
            .vtxs
            .iter()
            .map(|vtx| {
                (0..vtx.edges.len())
                    .map(|k| if k == 0 { 0 } else { round(vtx.ewgt(k) as f64) })
                    .collect()
            })
            .collect();
        let term = term.map(|t| {
            t.iter()
                .map(|costs| costs.iter().map(|&c| round(c)).collect())
                .collect()
        });
        Self { ewgts, term }
    }

    /// Cost of `v` sitting in `set` given the sets of its neighbors
    pub fn cost(
        &self,
        graph: &Graph,
        hop: &[Vec<usize>],
        assignment: &[usize],
        v: usize,
        set: usize,
    ) -> i64 {
        let vtx = &graph.vtxs[v];
        let mut c = self.term.as_ref().map_or(0, |t| t[set][v]);
        for (k, &u) in vtx.edges.iter().enumerate().skip(1) {
            c += self.ewgts[v][k] * hop[set][assignment[u]] as i64;
        }
        c
    }

    /// Upper bound on the absolute gain of any single move
    pub fn max_gain(&self, graph: &Graph, hop: &[Vec<usize>]) -> i64 {
        let maxhop = hop.iter().flatten().copied().max().unwrap_or(0) as i64;
        (0..graph.nvtxs())
            .map(|v| {
                let edges: i64 = self.ewgts[v].iter().sum::<i64>() * maxhop;
                let spread = self.term.as_ref().map_or(0, |t| {
                    let max = t.iter().map(|c| c[v]).max().unwrap_or(0);
                    let min = t.iter().map(|c| c[v]).min().unwrap_or(0);
                    max - min
                });
                edges + spread
            })
            .max()
            .unwrap_or(0)
    }
}

/// Balance bookkeeping shared by the KL refiners
pub(crate) struct Balance {
    pub loads: Vec<i64>,
    goals: Vec<f64>,
    /// tolerated excess when scoring a point
    slack: Vec<f64>,
    /// excess a single move may create
    reach: Vec<f64>,
}

impl Balance {
    pub fn new(loads: Vec<i64>, goals: &[f64], imbalance: f64, maxvwgt: i64) -> Self {
        let slack = goals
            .iter()
            .map(|&g| (imbalance * g).max(0.5 * maxvwgt as f64))
            .collect();
        let reach = goals
            .iter()
            .map(|&g| (imbalance * g).max(maxvwgt as f64))
            .collect();
        Self {
            loads,
            goals: goals.to_vec(),
            slack,
            reach,
        }
    }

    fn excess(&self, set: usize, load: i64) -> f64 {
        (load as f64 - self.goals[set] - self.slack[set]).max(0.0)
    }

    pub fn violation(&self) -> f64 {
        (0..self.loads.len())
            .map(|s| self.excess(s, self.loads[s]))
            .sum()
    }

    /// true if moving weight `w` from `from` to `to` is allowed.
    ///
    /// While some set is over its goal plus slack only moves out of an overweight set that do not
    /// add to the violation qualify; otherwise any move within `reach` of the target's goal.
    pub fn eligible(&self, from: usize, to: usize, w: i64) -> bool {
        if self.violation() > 0.0 {
            if self.excess(from, self.loads[from]) == 0.0 {
                return false;
            }
            let before = self.excess(from, self.loads[from]) + self.excess(to, self.loads[to]);
            let after =
                self.excess(from, self.loads[from] - w) + self.excess(to, self.loads[to] + w);
            return after <= before;
        }
        self.loads[to] as f64 + w as f64 <= self.goals[to] + self.reach[to]
    }

    pub fn apply(&mut self, from: usize, to: usize, w: i64) {
        self.loads[from] -= w;
        self.loads[to] += w;
    }
}

/// Ranks (violation, gain) points; true if `a` is strictly better than `b`
pub(crate) fn better(a: (f64, i64), b: (f64, i64)) -> bool {
    const EPS: f64 = 1.0e-9;
    a.0 < b.0 - EPS || (a.0 <= b.0 + EPS && a.1 > b.1)
}

/// Refines `assignment` into `goals.len()` sets. `hop[a][b]` is the cost multiplier of an edge
/// cut between sets `a` and `b`, and `term[set][v]` an optional extra cost of `v` in `set`.
///
/// Returns true when the assignment changed. When the bucket tables cannot be allocated the
/// assignment is left untouched.
pub fn nway_kl(
    ctrl: &mut Ctrl,
    graph: &Graph,
    assignment: &mut [usize],
    goals: &[f64],
    term: Option<&[Vec<f64>]>,
    hop: &[Vec<usize>],
) -> bool {
    let start = Instant::now();
    let nsets = goals.len();
    let nvtxs = graph.nvtxs();
    if nsets < 2 || nvtxs < 2 {
        return false;
    }

    let iw = IntWeights::new(graph, term);
    let maxgain = iw.max_gain(graph, hop);
    let Some(mut buckets) =
        Buckets::try_new(nvtxs, nsets, maxgain, ctrl.params.kl_max_bucket_space)
    else {
        return false;
    };

    let vwgts: Vec<i64> = graph.vtxs.iter().map(|v| v.vwgt as i64).collect();
    let mut balance = Balance::new(
        graph.set_weights(assignment, nsets),
        goals,
        ctrl.params.kl_imbalance,
        graph.max_vwgt() as i64,
    );

    let mut gains = vec![0i64; nvtxs * nsets];
    let mut locked = vec![false; nvtxs];
    let mut order: Vec<usize> = (0..nvtxs).collect();
    let mut changed = false;
    let mut bad_passes = 0;
    let mut npass = 0;

    let compute_gains = |assignment: &[usize], v: usize, gains: &mut [i64]| {
        let from = assignment[v];
        let here = iw.cost(graph, hop, assignment, v, from);
        for to in 0..nsets {
            if to != from {
                gains[v * nsets + to] = here - iw.cost(graph, hop, assignment, v, to);
            }
        }
    };

    while npass < ctrl.params.kl_max_pass {
        npass += 1;
        buckets.clear();
        locked.iter_mut().for_each(|l| *l = false);
        if ctrl.params.kl_randomize {
            ctrl.rng.shuffle(&mut order);
        }
        for &v in &order {
            compute_gains(assignment, v, &mut gains);
            let from = assignment[v];
            for to in (0..nsets).filter(|&t| t != from) {
                buckets.insert(v, from, to, gains[v * nsets + to]);
            }
        }

        let start_point = (balance.violation(), 0i64);
        let mut best_point = start_point;
        let mut best_len = 0;
        let mut cum = 0i64;
        let cutoff = (0..nvtxs)
            .map(|v| iw.cost(graph, hop, assignment, v, assignment[v]))
            .sum::<i64>()
            + 1;
        let mut history: Vec<(usize, usize)> = Vec::new();
        let mut nbad = 0;

        loop {
            // best eligible move over all set pairs
            let mut pick: Option<(usize, usize, usize, i64)> = None;
            for from in 0..nsets {
                for to in (0..nsets).filter(|&t| t != from) {
                    let Some((_, g)) = buckets.best(from, to) else {
                        continue;
                    };
                    if pick.is_some_and(|p| p.3 >= g) {
                        continue;
                    }
                    if let Some(v) = buckets
                        .bucket(from, to, g)
                        .find(|&v| balance.eligible(from, to, vwgts[v]))
                    {
                        pick = Some((v, from, to, g));
                    }
                }
            }
            let Some((v, from, to, gain)) = pick else {
                break;
            };

            for t in (0..nsets).filter(|&t| t != from) {
                buckets.remove(v, from, t, gains[v * nsets + t]);
            }
            locked[v] = true;
            assignment[v] = to;
            balance.apply(from, to, vwgts[v]);
            cum += gain;
            history.push((v, from));

            for &u in graph.vtxs[v].neighbors() {
                if locked[u] {
                    continue;
                }
                let su = assignment[u];
                for t in (0..nsets).filter(|&t| t != su) {
                    buckets.remove(u, su, t, gains[u * nsets + t]);
                }
                compute_gains(assignment, u, &mut gains);
                for t in (0..nsets).filter(|&t| t != su) {
                    buckets.insert(u, su, t, gains[u * nsets + t]);
                }
            }

            let point = (balance.violation(), cum);
            if better(point, best_point) {
                best_point = point;
                best_len = history.len();
                nbad = 0;
            } else {
                nbad += 1;
                if nbad >= ctrl.params.kl_bad_moves || best_point.1 - cum > cutoff {
                    break;
                }
            }
        }

        ctrl.counters.nvtx_moves += history.len();
        for &(v, from) in history[best_len..].iter().rev() {
            let to = assignment[v];
            assignment[v] = from;
            balance.apply(to, from, vwgts[v]);
        }

        ifset!(
            ctrl.dbglvl,
            DbgLvl::Refine,
            debug!(
                "KL pass {npass}: {} moves tried, kept {best_len}, gain {}, violation {:.1} -> {:.1}",
                history.len(),
                best_point.1,
                start_point.0,
                best_point.0
            )
        );

        if best_len > 0 {
            changed = true;
        }
        if better(best_point, start_point) {
            bad_passes = 0;
        } else {
            bad_passes += 1;
            if bad_passes >= ctrl.params.kl_ntries_bad {
                break;
            }
        }
    }

    ctrl.counters.kl_passes += npass;
    ctrl.timers.add(Timer::Kl, start);
    changed
}
