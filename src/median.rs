/*
\file
\brief Weighted median splits of vertex values.

Vertices are taken in increasing order of value and each one goes to the earlier set while its
midpoint stays within that set's goal. A vertex straddling a boundary therefore lands on the side
with the larger remaining deficit, and every set ends within half a vertex weight of its goal
boundary.
*/

use crate::graph::Graph;
use crate::util::gray;

/// vertices sorted by value, ties by index
fn sorted_order(vals: &[f64]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..vals.len()).collect();
    order.sort_by(|&a, &b| vals[a].total_cmp(&vals[b]).then(a.cmp(&b)));
    order
}

/// Goals rescaled so that they sum to `total`
fn scaled_goals(goals: &[f64], total: f64) -> Vec<f64> {
    let sum: f64 = goals.iter().sum();
    if sum > 0.0 {
        goals.iter().map(|g| g * total / sum).collect()
    } else {
        vec![total / goals.len() as f64; goals.len()]
    }
}

/// Walks `order` filling sets `labels[0]`, `labels[1]`, ... up to their goals.
fn fill_in_order(
    graph: &Graph,
    order: &[usize],
    goals: &[f64],
    labels: &[usize],
    assignment: &mut [usize],
) {
    let total: f64 = order.iter().map(|&v| graph.vtxs[v].vwgt as f64).sum();
    let goals = scaled_goals(goals, total);
    let mut slice = 0;
    let mut bound = goals[0];
    let mut cum = 0.0;
    for &v in order {
        let w = graph.vtxs[v].vwgt as f64;
        while slice + 1 < goals.len() && cum + 0.5 * w > bound {
            slice += 1;
            bound += goals[slice];
        }
        assignment[v] = labels[slice];
        cum += w;
    }
}

/// Splits the vertices of `graph` into sets 0 and 1 by the weighted median of `vals`, with
/// `goals` the two set sizes. Lower values go to set 0.
pub fn median(graph: &Graph, vals: &[f64], goals: &[f64]) -> Vec<usize> {
    debug_assert_eq!(goals.len(), 2);
    let order = sorted_order(vals);
    let mut assignment = vec![0; vals.len()];
    fill_in_order(graph, &order, goals, &[0, 1], &mut assignment);
    assignment
}

/// Cuts one vector into `2^ndims` slices. Consecutive slices get gray coded set numbers, so
/// neighboring slices are one hop apart.
pub fn rec_median_1(graph: &Graph, vals: &[f64], goals: &[f64], ndims: usize) -> Vec<usize> {
    let nsets = 1 << ndims;
    debug_assert_eq!(goals.len(), nsets);
    let labels: Vec<usize> = (0..nsets).map(gray).collect();
    let slice_goals: Vec<f64> = labels.iter().map(|&s| goals[s]).collect();
    let order = sorted_order(vals);
    let mut assignment = vec![0; vals.len()];
    fill_in_order(graph, &order, &slice_goals, &labels, &mut assignment);
    assignment
}

/// Uses vector `k` to decide bit `k` of every vertex's set, splitting each group formed by the
/// earlier bits at its own weighted median.
pub fn rec_median_k(graph: &Graph, vals: &[Vec<f64>], goals: &[f64]) -> Vec<usize> {
    let ndims = vals.len();
    let nsets = 1 << ndims;
    debug_assert_eq!(goals.len(), nsets);
    let nvtxs = graph.nvtxs();
    let mut assignment = vec![0usize; nvtxs];

    for (k, vec) in vals.iter().enumerate() {
        let mask = (1 << k) - 1;
        for prefix in 0..(1usize << k) {
            let members: Vec<usize> = (0..nvtxs).filter(|&v| assignment[v] & mask == prefix).collect();
            if members.is_empty() {
                continue;
            }
            // goals of the sets below this prefix, split by bit k
            let mut split = [0.0; 2];
            for (s, g) in goals.iter().enumerate() {
                if s & mask == prefix {
                    split[(s >> k) & 1] += g;
                }
            }
            let mut order = members;
            order.sort_by(|&a, &b| vec[a].total_cmp(&vec[b]).then(a.cmp(&b)));
            let mut bit = vec![0; nvtxs];
            fill_in_order(graph, &order, &split, &[0, 1], &mut bit);
            for &v in &order {
                assignment[v] |= bit[v] << k;
            }
        }
    }
    assignment
}
