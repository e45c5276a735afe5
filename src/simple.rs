//! Assignments that look at nothing but vertex numbers and weights.

use crate::graph::Graph;
use crate::options::{Ctrl, GlobalMethod};

/// Fills sets `0..goals.len()` in vertex order, switching to the next set once a vertex's
/// midpoint would pass the current set's goal.
pub fn simple_linear(graph: &Graph, goals: &[f64]) -> Vec<usize> {
    let order: Vec<usize> = (0..graph.nvtxs()).collect();
    fill_linear(graph, &order, goals)
}

fn fill_linear(graph: &Graph, order: &[usize], goals: &[f64]) -> Vec<usize> {
    let mut assignment = vec![0; graph.nvtxs()];
    let nsets = goals.len();
    let mut set = 0;
    let mut bound = goals[0];
    let mut cum = 0.0;
    for &v in order {
        let w = graph.vtxs[v].vwgt as f64;
        while set + 1 < nsets && cum + 0.5 * w > bound {
            set += 1;
            bound += goals[set];
        }
        assignment[v] = set;
        cum += w;
    }
    assignment
}

/// Linear assignment of a random permutation of the vertices
pub fn simple_random(ctrl: &mut Ctrl, graph: &Graph, goals: &[f64]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..graph.nvtxs()).collect();
    ctrl.rng.shuffle(&mut order);
    fill_linear(graph, &order, goals)
}

/// Deals the vertices out round robin, skipping sets that already reached their goal.
pub fn simple_scattered(graph: &Graph, goals: &[f64]) -> Vec<usize> {
    let nsets = goals.len();
    let mut loads = vec![0.0; nsets];
    let mut set = 0;
    graph
        .vtxs
        .iter()
        .map(|vtx| {
            let w = vtx.vwgt as f64;
            // at most one full round looking for room; all full means the goals are exhausted
            for _ in 0..nsets {
                if loads[set] + 0.5 * w <= goals[set] {
                    break;
                }
                set = (set + 1) % nsets;
            }
            let s = set;
            loads[s] += w;
            set = (set + 1) % nsets;
            s
        })
        .collect()
}

/// Dispatches on the simple global methods. Anything else falls back to linear.
pub fn simple_part(ctrl: &mut Ctrl, graph: &Graph, goals: &[f64], method: GlobalMethod) -> Vec<usize> {
    match method {
        GlobalMethod::Random => simple_random(ctrl, graph, goals),
        GlobalMethod::Scattered => simple_scattered(graph, goals),
        _ => simple_linear(graph, goals),
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::graph::GraphInput;
    use crate::options::Params;
    use crate::util::create_dummy_graph;

    fn ring(vwgts: &[i32]) -> Graph {
        let (xadj, adjncy) = create_dummy_graph(vwgts.len());
        Graph::from_csr(&GraphInput::new(&xadj, &adjncy).with_vwgts(vwgts)).unwrap()
    }

    #[test]
    fn linear_blocks() {
        let graph = ring(&[1; 9]);
        let part = simple_linear(&graph, &[3.0, 3.0, 3.0]);
        assert_eq!(part, vec![0, 0, 0, 1, 1, 1, 2, 2, 2]);
        // weighted: the heavy vertex fills set 0 on its own
        let graph = ring(&[4, 1, 1, 1, 1]);
        let part = simple_linear(&graph, &[4.0, 4.0]);
        assert_eq!(part, vec![0, 1, 1, 1, 1]);
    }

    #[test]
    fn scattered_round_robin() {
        let graph = ring(&[1; 8]);
        let part = simple_scattered(&graph, &[2.0; 4]);
        assert_eq!(part, vec![0, 1, 2, 3, 0, 1, 2, 3]);
        // uneven goals skip the full set
        let part = simple_scattered(&graph, &[1.0, 4.0, 3.0]);
        assert_eq!(graph.set_weights(&part, 3), vec![1, 4, 3]);
    }

    #[test]
    fn random_is_balanced_and_seeded() {
        let graph = ring(&[1; 12]);
        let mut a = Ctrl::new(Params::default());
        let mut b = Ctrl::new(Params::default());
        let pa = simple_random(&mut a, &graph, &[4.0; 3]);
        let pb = simple_random(&mut b, &graph, &[4.0; 3]);
        assert_eq!(pa, pb);
        assert_eq!(graph.set_weights(&pa, 3), vec![4, 4, 4]);
    }
}
