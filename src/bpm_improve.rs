/*
\file
\brief Separator improvement through bipartite vertex covers.

The separator together with its neighbors on one side forms a bipartite graph, and every vertex
cover of that graph is again a separator: uncovered separator vertices join the other side and
covered side vertices enter the separator. A minimum cover therefore never makes the separator
heavier, and the change is kept when the balance allows it.
*/

use std::time::Instant;

use log::debug;

use crate::bpmatch::Bipartite;
use crate::defs::SEP_SIDE;
use crate::graph::Graph;
use crate::klspiff::better;
use crate::klvspiff::SideBalance;
use crate::options::{Ctrl, DbgLvl};
use crate::timing::Timer;

/// Sides after replacing the separator by a minimum cover against side `side`
fn cover_against(graph: &Graph, sides: &[usize], side: usize) -> Vec<usize> {
    let sep: Vec<usize> = (0..graph.nvtxs()).filter(|&v| sides[v] == SEP_SIDE).collect();
    let mut rindex: Vec<Option<usize>> = vec![None; graph.nvtxs()];
    let mut right: Vec<usize> = Vec::new();
    let adj: Vec<Vec<usize>> = sep
        .iter()
        .map(|&v| {
            graph.vtxs[v]
                .neighbors()
                .iter()
                .filter(|&&u| sides[u] == side)
                .map(|&u| {
                    *rindex[u].get_or_insert_with(|| {
                        right.push(u);
                        right.len() - 1
                    })
                })
                .collect()
        })
        .collect();

    let bp = Bipartite {
        nleft: sep.len(),
        nright: right.len(),
        adj,
    };
    let cover = if graph.using_vwgts {
        let w = |v: &usize| graph.vtxs[*v].vwgt as i64;
        let lw: Vec<i64> = sep.iter().map(w).collect();
        let rw: Vec<i64> = right.iter().map(w).collect();
        bp.min_weight_cover(&lw, &rw)
    } else {
        bp.min_cover()
    };

    let mut new = sides.to_vec();
    for (i, &v) in sep.iter().enumerate() {
        if !cover.left[i] {
            new[v] = 1 - side;
        }
    }
    for (j, &u) in right.iter().enumerate() {
        if cover.right[j] {
            new[u] = SEP_SIDE;
        }
    }
    new
}

/// Alternately shrinks the heavier and the lighter side through separator covers until neither
/// improves on (balance violation, separator weight). Returns true when `sides` changed.
pub fn bpm_improve(ctrl: &mut Ctrl, graph: &Graph, sides: &mut [usize], goals: &[f64]) -> bool {
    let start = Instant::now();
    let imbalance = ctrl.params.kl_imbalance;
    let mut changed = false;

    loop {
        let cur = SideBalance::new(graph, sides, goals, imbalance);
        if cur.loads[2] == 0 {
            break;
        }
        let heavy = if cur.over(1) > cur.over(0) { 1 } else { 0 };
        let cur_point = (cur.violation(), -cur.loads[2]);
        ctrl.counters.bpm_rounds += 1;

        let mut improved = false;
        for side in [heavy, 1 - heavy] {
            let trial = cover_against(graph, sides, side);
            let next = SideBalance::new(graph, &trial, goals, imbalance);
            let point = (next.violation(), -next.loads[2]);
            if better(point, cur_point) {
                ifset!(
                    ctrl.dbglvl,
                    DbgLvl::SepInfo,
                    debug!(
                        "cover against side {side}: separator {} -> {}, loads {:?}",
                        cur.loads[2], next.loads[2], next.loads
                    )
                );
                sides.copy_from_slice(&trial);
                improved = true;
                break;
            }
        }
        if !improved {
            break;
        }
        changed = true;
    }

    ctrl.timers.add(Timer::Bpm, start);
    changed
}
