//! Turns partition coordinates into a division into `2^ndims` sets.

use std::time::Instant;

use log::debug;

use crate::graph::Graph;
use crate::mapper::{map2d, map3d};
use crate::median::{median, rec_median_1, rec_median_k};
use crate::options::{Ctrl, DbgLvl, MappingType};
use crate::timing::Timer;

/// Assigns every vertex a local set in `0..2^ndims` from the coordinate vectors `yvecs`.
///
/// Set numbers are hypercube labels: bit `b` of a set corresponds to the cut along vector `b`
/// (or to the bits of a gray code when one vector is sliced several times). When fewer vectors
/// than dimensions are supplied the first one is sliced.
pub fn assign(
    ctrl: &mut Ctrl,
    graph: &Graph,
    yvecs: &[Vec<f64>],
    goals: &[f64],
    ndims: usize,
) -> Vec<usize> {
    let start = Instant::now();
    debug_assert_eq!(goals.len(), 1 << ndims);
    let mapping = if yvecs.len() < ndims {
        MappingType::RecursiveMedian
    } else {
        ctrl.params.mapping
    };

    let assignment = match mapping {
        MappingType::CutAtOrigin => (0..graph.nvtxs())
            .map(|v| {
                (0..ndims)
                    .filter(|&b| yvecs[b][v] > 0.0)
                    .fold(0, |set, b| set | (1 << b))
            })
            .collect(),
        MappingType::MinCost => match ndims {
            1 => median(graph, &yvecs[0], goals),
            2 => map2d(ctrl, graph, &yvecs[..2], goals),
            _ => map3d(ctrl, graph, &yvecs[..3], goals),
        },
        MappingType::RecursiveMedian => rec_median_1(graph, &yvecs[0], goals, ndims),
        MappingType::IndependentMedians => rec_median_k(graph, &yvecs[..ndims], goals),
    };

    ifset!(
        ctrl.dbglvl,
        DbgLvl::Assign,
        debug!(
            "{mapping:?} assignment into {} sets: weights {:?}",
            goals.len(),
            graph.set_weights(&assignment, goals.len())
        )
    );
    ctrl.timers.add(Timer::Assign, start);
    assignment
}
