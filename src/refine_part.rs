/*
\file
\brief Final KL between pairs of adjacent sets.

Each pair is refined on its own as a bisection of the subgraph the two sets induce. Edges from
the pair to the other sets do not move and enter the bisection as terminal costs, weighted by
the architecture distance to the far set.
*/

use std::time::Instant;

use log::debug;

use crate::arch::Architecture;
use crate::graph::{make_subgraph, Graph};
use crate::klspiff::nway_kl;
use crate::options::{Ctrl, DbgLvl};
use crate::timing::Timer;

/// Pairs of distinct sets joined by at least one edge, each listed once as (low, high)
fn adjacent_pairs(graph: &Graph, assignment: &[usize], nsets: usize) -> Vec<(usize, usize)> {
    let mut adjacent = vec![false; nsets * nsets];
    for (v, vtx) in graph.vtxs.iter().enumerate() {
        let a = assignment[v];
        for &u in vtx.neighbors() {
            let b = assignment[u];
            if a < b {
                adjacent[a * nsets + b] = true;
            }
        }
    }
    (0..nsets)
        .flat_map(|a| (a + 1..nsets).map(move |b| (a, b)))
        .filter(|&(a, b)| adjacent[a * nsets + b])
        .collect()
}

/// Refines one pair. Returns true when a vertex changed sets.
fn refine_pair(
    ctrl: &mut Ctrl,
    graph: &Graph,
    arch: &Architecture,
    assignment: &mut [usize],
    goals: &[f64],
    pair: (usize, usize),
    glob2loc: &mut [Option<usize>],
) -> bool {
    let (a, b) = pair;
    let vertices: Vec<usize> = (0..graph.nvtxs())
        .filter(|&v| assignment[v] == a || assignment[v] == b)
        .collect();
    let sub = make_subgraph(graph, &vertices, glob2loc);

    let mut term = vec![vec![0.0; vertices.len()]; 2];
    for (l, &v) in vertices.iter().enumerate() {
        for (u, w) in graph.vtxs[v].adj() {
            let s = assignment[u];
            if s != a && s != b {
                term[0][l] += w as f64 * arch.hops(a, s) as f64;
                term[1][l] += w as f64 * arch.hops(b, s) as f64;
            }
        }
    }
    let term = term.iter().flatten().any(|&c| c > 0.0).then_some(term);

    let mut local: Vec<usize> = vertices
        .iter()
        .map(|&v| usize::from(assignment[v] == b))
        .collect();
    let h = arch.hops(a, b);
    let hop = [vec![0, h], vec![h, 0]];
    let changed = nway_kl(
        ctrl,
        &sub.graph,
        &mut local,
        &[goals[a], goals[b]],
        term.as_deref(),
        &hop,
    );
    if changed {
        let sets = [a, b];
        for (&v, &l) in vertices.iter().zip(&local) {
            assignment[v] = sets[l];
        }
    }
    changed
}

/// Runs up to `refine_partition` sweeps of pairwise KL over all adjacent set pairs. A sweep
/// without changes ends the refinement.
pub fn refine_part(
    ctrl: &mut Ctrl,
    graph: &Graph,
    arch: &Architecture,
    assignment: &mut [usize],
    goals: &[f64],
) -> bool {
    let start = Instant::now();
    let nsets = goals.len();
    let mut glob2loc: Vec<Option<usize>> = vec![None; graph.nvtxs()];
    let mut changed = false;

    for sweep in 0..ctrl.params.refine_partition {
        let before = graph.cut_size(assignment);
        let mut any = false;
        for pair in adjacent_pairs(graph, assignment, nsets) {
            any |= refine_pair(ctrl, graph, arch, assignment, goals, pair, &mut glob2loc);
        }
        ifset!(
            ctrl.dbglvl,
            DbgLvl::Refine,
            debug!(
                "pairwise refinement sweep {sweep}: cut {before} -> {}",
                graph.cut_size(assignment)
            )
        );
        changed |= any;
        if !any {
            break;
        }
    }

    ctrl.timers.add(Timer::RefinePart, start);
    changed
}
