/*
\file
\brief Consistency checks on the input graph and the remaining run arguments.
*/

use log::warn;

use crate::defs::GOAL_TOLERANCE;
use crate::error::{ChacoError, Result};
use crate::graph::Graph;
use crate::options::{GlobalMethod, MatchType, Params};

/// Checks that a graph satisfies the adjacency invariants:
/// - every vertex lists itself in slot 0 and has positive weight
/// - it is undirected, (u,v) and (v,u) are both present with the same weight
/// - no neighbor is listed twice, and there are no self loops past slot 0
/// - edge weights are non-negative and the self slot holds their negated sum
/// - the number of listed edges matches `nedges`
///
/// Every finding is logged. Returns the number of errors found.
pub fn check_graph_errors(graph: &Graph) -> usize {
    let nvtxs = graph.nvtxs();
    let mut err = 0;
    let mut nzero = 0;
    let mut narcs = 0;

    let mut htable = vec![0usize; nvtxs];

    for (i, vtx) in graph.vtxs.iter().enumerate() {
        if vtx.edges.first() != Some(&i) {
            warn!("Vertex {i} does not list itself first");
            err += 1;
            continue;
        }
        if vtx.vwgt <= 0 {
            warn!("Vertex {i} has non-positive weight {}", vtx.vwgt);
            err += 1;
        }
        if graph.using_ewgts && vtx.ewgts.len() != vtx.edges.len() {
            warn!(
                "Vertex {i} has {} edge weights for {} edges",
                vtx.ewgts.len(),
                vtx.edges.len()
            );
            err += 1;
            continue;
        }

        let mut sum = 0.0f64;
        for (k, &j) in vtx.edges.iter().enumerate().skip(1) {
            narcs += 1;
            if j >= nvtxs {
                warn!("Edge ({i}, {j}) points past the last vertex");
                err += 1;
                continue;
            }
            if j == i {
                warn!("Vertex {i} contains a self-loop");
                err += 1;
                continue;
            }
            let w = vtx.ewgt(k);
            sum += w as f64;
            if w < 0.0 {
                warn!("Edge ({i}, {j}) has negative weight {w}");
                err += 1;
            } else if w == 0.0 {
                nzero += 1;
            }

            match graph.vtxs[j].edges.iter().skip(1).position(|&u| u == i) {
                Some(l) => {
                    let back = graph.vtxs[j].ewgt(l + 1);
                    if back != w {
                        warn!(
                            "Edges (u:{i} v:{j} wgt:{w}) and (v:{j} u:{i} wgt:{back}) do not have the same weight!"
                        );
                        err += 1;
                    }
                }
                None => {
                    warn!("Missing edge: ({j} {i})!");
                    err += 1;
                }
            }

            htable[j] += 1;
            if htable[j] > 1 {
                warn!(
                    "Edge {j} from vertex {i} is repeated {} times",
                    htable[j]
                );
                err += 1;
            }
        }
        for &j in vtx.neighbors() {
            if j < nvtxs {
                htable[j] = 0;
            }
        }

        if graph.using_ewgts {
            let diag = -(vtx.ewgts[0] as f64);
            if (diag - sum).abs() > 1.0e-5 * sum.abs().max(1.0) {
                warn!("Vertex {i} self slot {diag} does not match its edge weight sum {sum}");
                err += 1;
            }
        }
    }

    if narcs != 2 * graph.nedges {
        warn!(
            "Graph claims {} edges, but {narcs} directed entries are listed",
            graph.nedges
        );
        err += 1;
    }

    if nzero > 0 {
        warn!("{} edge entries have zero weight", nzero);
    }

    if err > 0 {
        warn!("A total of {err} errors exist in the input graph.");
    }

    err
}

/// Advisory check: true if any inconsistency was found
pub fn check_graph(graph: &Graph) -> bool {
    check_graph_errors(graph) > 0
}

/// Validates the arguments of a run against each other.
///
/// `goals` must already have one entry per final set.
pub fn check_input(
    graph: &Graph,
    params: &Params,
    nsets_tot: usize,
    goals: &[f64],
    coords: Option<&[Vec<f64>]>,
    initial: Option<&[usize]>,
) -> Result<()> {
    let nvtxs = graph.nvtxs();
    if nvtxs == 0 {
        return Err(ChacoError::InvalidInput("graph has no vertices".into()));
    }

    if goals.len() != nsets_tot {
        return Err(ChacoError::InvalidInput(format!(
            "{} goals for {nsets_tot} sets",
            goals.len()
        )));
    }
    if let Some(g) = goals.iter().find(|&&g| !(g >= 0.0)) {
        return Err(ChacoError::InvalidInput(format!("invalid set goal {g}")));
    }
    let goal_sum: f64 = goals.iter().sum();
    let vwgt_sum = graph.total_vwgt() as f64;
    if (goal_sum - vwgt_sum).abs() > GOAL_TOLERANCE * vwgt_sum {
        return Err(ChacoError::GoalMismatch { goal_sum, vwgt_sum });
    }

    let needs_coords = params.global_method == GlobalMethod::Inertial
        || (params.match_type == MatchType::Geometric && params.uses_coarsening());
    match coords {
        Some(coords) => {
            if coords.is_empty() || coords.len() > 3 {
                return Err(ChacoError::InvalidInput(format!(
                    "coordinates must have 1 to 3 axes, got {}",
                    coords.len()
                )));
            }
            if let Some(axis) = coords.iter().position(|c| c.len() != nvtxs) {
                return Err(ChacoError::InvalidInput(format!(
                    "coordinate axis {axis} has {} entries for {nvtxs} vertices",
                    coords[axis].len()
                )));
            }
        }
        None if needs_coords => {
            return Err(ChacoError::InvalidInput(
                "coordinates are required for inertial partitioning and geometric matching"
                    .into(),
            ));
        }
        None => {}
    }

    match initial {
        Some(initial) => {
            if initial.len() != nvtxs {
                return Err(ChacoError::InvalidInput(format!(
                    "initial assignment has {} entries for {nvtxs} vertices",
                    initial.len()
                )));
            }
            if let Some(&bad) = initial.iter().find(|&&s| s >= nsets_tot) {
                return Err(ChacoError::InvalidInput(format!(
                    "initial assignment uses set {bad}, but there are only {nsets_tot} sets"
                )));
            }
        }
        None if params.global_method == GlobalMethod::Provided => {
            return Err(ChacoError::InvalidInput(
                "the provided global method needs an initial assignment".into(),
            ));
        }
        None => {}
    }

    if nsets_tot > nvtxs {
        warn!("{nsets_tot} sets requested for only {nvtxs} vertices; some sets stay empty");
    }

    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::graph::{GraphInput, Vertex};
    use crate::util::create_dummy_graph;

    fn ring(n: usize) -> Graph {
        let (xadj, adjncy) = create_dummy_graph(n);
        Graph::from_csr(&GraphInput::new(&xadj, &adjncy)).unwrap()
    }

    #[test]
    fn ring_is_clean() {
        assert_eq!(check_graph_errors(&ring(7)), 0);
        assert!(!check_graph(&ring(7)));
    }

    #[test]
    fn missing_back_edge() {
        let xadj = [0, 1, 1];
        let adjncy = [1];
        let graph = Graph::from_csr(&GraphInput::new(&xadj, &adjncy)).unwrap();
        // the missing back edge and the odd arc count
        assert_eq!(check_graph_errors(&graph), 2);
    }

    #[test]
    fn duplicate_and_weight_mismatch() {
        let mut graph = ring(4);
        graph.vtxs[0].edges.push(1);
        graph.vtxs[1].edges.push(0);
        graph.nedges += 1;
        assert!(check_graph_errors(&graph) >= 2);

        let mut graph = ring(4);
        graph.ensure_ewgts();
        graph.vtxs[0].ewgts[1] = 3.0;
        graph.fix_self_slots();
        // both directions report the mismatch
        assert_eq!(check_graph_errors(&graph), 2);
    }

    #[test]
    fn non_positive_vertex_weight() {
        let mut graph = ring(4);
        graph.vtxs[2] = Vertex {
            vwgt: 0,
            ..graph.vtxs[2].clone()
        };
        assert_eq!(check_graph_errors(&graph), 1);
    }

    #[test]
    fn goal_mismatch() {
        let graph = ring(8);
        let params = Params::default();
        assert!(check_input(&graph, &params, 2, &[4.0, 4.0], None, None).is_ok());
        assert_eq!(
            check_input(&graph, &params, 2, &[4.0, 5.0], None, None),
            Err(ChacoError::GoalMismatch {
                goal_sum: 9.0,
                vwgt_sum: 8.0
            })
        );
    }

    #[test]
    fn inertial_needs_coords() {
        let graph = ring(8);
        let params = Params {
            global_method: GlobalMethod::Inertial,
            ..Default::default()
        };
        assert!(check_input(&graph, &params, 2, &[4.0, 4.0], None, None).is_err());
        let coords = vec![vec![0.0; 8]];
        assert!(check_input(&graph, &params, 2, &[4.0, 4.0], Some(&coords), None).is_ok());
    }
}
