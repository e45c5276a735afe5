/*
\file
\brief Kernighan-Lin refinement of a vertex separator.

Vertices are on side 0, side 1 or in the separator (`SEP_SIDE`). The only move is taking a
separator vertex onto a side, which pulls its neighbors from the other side into the separator.
The gain of a move is the drop in separator weight. Side balance is measured against the goals
scaled down to the weight outside the separator.
*/

use std::time::Instant;

use log::debug;

use crate::bucketsort::Buckets;
use crate::defs::SEP_SIDE;
use crate::graph::Graph;
use crate::klspiff::better;
use crate::options::{Ctrl, DbgLvl};
use crate::timing::Timer;

/// Weights of sides 0, 1 and the separator, against the two side goals
#[derive(Debug, Clone)]
pub struct SideBalance {
    /// side 0, side 1, separator
    pub loads: [i64; 3],
    goals: [f64; 2],
    total: f64,
    slack: [f64; 2],
    reach: [f64; 2],
}

impl SideBalance {
    pub fn new(graph: &Graph, sides: &[usize], goals: &[f64], imbalance: f64) -> Self {
        let mut loads = [0i64; 3];
        for (vtx, &s) in graph.vtxs.iter().zip(sides) {
            loads[s] += vtx.vwgt as i64;
        }
        let maxw = graph.max_vwgt() as f64;
        let goals = [goals[0], goals[1]];
        Self {
            loads,
            goals,
            total: goals[0] + goals[1],
            slack: goals.map(|g| (imbalance * g).max(0.5 * maxw)),
            reach: goals.map(|g| (imbalance * g).max(maxw)),
        }
    }

    fn target(&self, side: usize, sepw: i64) -> f64 {
        if self.total > 0.0 {
            self.goals[side] * (self.total - sepw as f64) / self.total
        } else {
            0.0
        }
    }

    fn violation_of(&self, loads: &[i64; 3]) -> f64 {
        (0..2)
            .map(|s| (loads[s] as f64 - self.target(s, loads[2]) - self.slack[s]).max(0.0))
            .sum()
    }

    pub fn violation(&self) -> f64 {
        self.violation_of(&self.loads)
    }

    /// How far `side` is above its scaled goal, negative when below
    pub fn over(&self, side: usize) -> f64 {
        self.loads[side] as f64 - self.target(side, self.loads[2])
    }

    /// Loads after moving weight `w` from the separator to `side` and `pulled` back into it
    fn after(&self, side: usize, w: i64, pulled: i64) -> [i64; 3] {
        let mut l = self.loads;
        l[side] += w;
        l[1 - side] -= pulled;
        l[2] += pulled - w;
        l
    }

    pub fn eligible(&self, side: usize, w: i64, pulled: i64) -> bool {
        let l = self.after(side, w, pulled);
        l[side] as f64 <= self.target(side, l[2]) + self.reach[side]
            || self.violation_of(&l) < self.violation()
    }

    pub fn apply(&mut self, side: usize, w: i64, pulled: i64) {
        self.loads = self.after(side, w, pulled);
    }
}

/// Weight of the neighbors of `v` on side `side`
fn side_weight(graph: &Graph, sides: &[usize], v: usize, side: usize) -> i64 {
    graph.vtxs[v]
        .neighbors()
        .iter()
        .filter(|&&u| sides[u] == side)
        .map(|&u| graph.vtxs[u].vwgt as i64)
        .sum()
}

/// Refines the separator in `sides`. Returns true when anything changed.
pub fn nway_klv(ctrl: &mut Ctrl, graph: &Graph, sides: &mut [usize], goals: &[f64]) -> bool {
    let start = Instant::now();
    let nvtxs = graph.nvtxs();
    let mut balance = SideBalance::new(graph, sides, goals, ctrl.params.kl_imbalance);
    if balance.loads[2] == 0 {
        return false;
    }

    let maxgain = graph
        .vtxs
        .iter()
        .map(|v| {
            v.vwgt as i64 + v.neighbors().iter().map(|&u| graph.vtxs[u].vwgt as i64).sum::<i64>()
        })
        .max()
        .unwrap_or(0);
    let Some(mut buckets) = Buckets::try_new(nvtxs, 3, maxgain, ctrl.params.kl_max_bucket_space)
    else {
        return false;
    };

    // gains[2 * v + side] for separator vertices
    let mut gains = vec![0i64; 2 * nvtxs];
    let mut in_buckets = vec![false; nvtxs];
    let mut locked = vec![false; nvtxs];
    let mut changed = false;
    let mut bad_passes = 0;
    let mut npass = 0;

    let gain_of = |sides: &[usize], v: usize, side: usize| -> i64 {
        graph.vtxs[v].vwgt as i64 - side_weight(graph, sides, v, 1 - side)
    };

    while npass < ctrl.params.kl_max_pass {
        npass += 1;
        buckets.clear();
        locked.iter_mut().for_each(|l| *l = false);
        in_buckets.iter_mut().for_each(|b| *b = false);
        let mut order: Vec<usize> = (0..nvtxs).filter(|&v| sides[v] == SEP_SIDE).collect();
        if ctrl.params.kl_randomize {
            ctrl.rng.shuffle(&mut order);
        }
        for &v in &order {
            for side in 0..2 {
                gains[2 * v + side] = gain_of(sides, v, side);
                buckets.insert(v, SEP_SIDE, side, gains[2 * v + side]);
            }
            in_buckets[v] = true;
        }

        let start_point = (balance.violation(), 0i64);
        let mut best_point = start_point;
        let mut best_len = 0;
        let mut cum = 0i64;
        // (vertex, side it moved to, vertices pulled into the separator)
        let mut history: Vec<(usize, usize, Vec<usize>)> = Vec::new();
        let mut nbad = 0;

        loop {
            // largest gain first, then the smaller resulting violation
            let mut pick: Option<(usize, usize, i64, f64)> = None;
            for side in 0..2 {
                let Some((_, g)) = buckets.best(SEP_SIDE, side) else {
                    continue;
                };
                let candidate = buckets.bucket(SEP_SIDE, side, g).find_map(|v| {
                    let w = graph.vtxs[v].vwgt as i64;
                    let pulled = side_weight(graph, sides, v, 1 - side);
                    balance
                        .eligible(side, w, pulled)
                        .then(|| balance.violation_of(&balance.after(side, w, pulled)))
                        .map(|viol| (v, side, g, viol))
                });
                if let Some(c) = candidate {
                    if pick.map_or(true, |p| c.2 > p.2 || (c.2 == p.2 && c.3 < p.3)) {
                        pick = Some(c);
                    }
                }
            }
            let Some((v, side, gain, _)) = pick else {
                break;
            };

            for s in 0..2 {
                buckets.remove(v, SEP_SIDE, s, gains[2 * v + s]);
            }
            in_buckets[v] = false;
            locked[v] = true;

            let w = graph.vtxs[v].vwgt as i64;
            let pulled: Vec<usize> = graph.vtxs[v]
                .neighbors()
                .iter()
                .copied()
                .filter(|&u| sides[u] == 1 - side)
                .collect();
            let pulled_w: i64 = pulled.iter().map(|&u| graph.vtxs[u].vwgt as i64).sum();
            sides[v] = side;
            for &u in &pulled {
                sides[u] = SEP_SIDE;
            }
            balance.apply(side, w, pulled_w);
            cum += gain;

            // separator vertices next to anything that changed side
            let mut touched: Vec<usize> = pulled.clone();
            touched.extend(graph.vtxs[v].neighbors().iter().copied());
            for &u in &pulled {
                touched.extend(graph.vtxs[u].neighbors().iter().copied());
            }
            touched.sort_unstable();
            touched.dedup();
            for u in touched {
                if sides[u] != SEP_SIDE || locked[u] {
                    continue;
                }
                if in_buckets[u] {
                    for s in 0..2 {
                        buckets.remove(u, SEP_SIDE, s, gains[2 * u + s]);
                    }
                }
                for s in 0..2 {
                    gains[2 * u + s] = gain_of(sides, u, s);
                    buckets.insert(u, SEP_SIDE, s, gains[2 * u + s]);
                }
                in_buckets[u] = true;
            }
            history.push((v, side, pulled));

            let point = (balance.violation(), cum);
            if better(point, best_point) {
                best_point = point;
                best_len = history.len();
                nbad = 0;
            } else {
                nbad += 1;
                if nbad >= ctrl.params.kl_bad_moves {
                    break;
                }
            }
        }

        ctrl.counters.nvtx_moves += history.len();
        for (v, side, pulled) in history.drain(best_len..).rev() {
            let pulled_w: i64 = pulled.iter().map(|&u| graph.vtxs[u].vwgt as i64).sum();
            for &u in &pulled {
                sides[u] = 1 - side;
            }
            sides[v] = SEP_SIDE;
            let w = graph.vtxs[v].vwgt as i64;
            // exact inverse of `apply`
            balance.loads[side] -= w;
            balance.loads[1 - side] += pulled_w;
            balance.loads[2] += w - pulled_w;
        }

        ifset!(
            ctrl.dbglvl,
            DbgLvl::SepInfo,
            debug!(
                "KLV pass {npass}: kept {best_len} moves, separator weight {}, violation {:.1} -> {:.1}",
                balance.loads[2],
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

    ctrl.counters.klv_passes += npass;
    ctrl.timers.add(Timer::Klv, start);
    changed
}

/// true if no edge joins side 0 to side 1
pub fn is_separator(graph: &Graph, sides: &[usize]) -> bool {
    graph.vtxs.iter().enumerate().all(|(v, vtx)| {
        sides[v] == SEP_SIDE
            || vtx
                .neighbors()
                .iter()
                .all(|&u| sides[u] == SEP_SIDE || sides[u] == sides[v])
    })
}
