//! Connected components, and temporary edges that make a disconnected graph connected so that
//! its Laplacian has a one dimensional null space.

use std::collections::VecDeque;

use crate::defs::CONNECT_EWGT;
use crate::graph::Graph;

/// Labels every vertex with its component. Returns (number of components, labels). Component ids
/// are ordered by their lowest vertex.
pub fn find_comps(graph: &Graph) -> (usize, Vec<usize>) {
    let nvtxs = graph.nvtxs();
    let mut comp = vec![usize::MAX; nvtxs];
    let mut queue = VecDeque::new();
    let mut ncomps = 0;

    for root in 0..nvtxs {
        if comp[root] != usize::MAX {
            continue;
        }
        comp[root] = ncomps;
        queue.push_back(root);
        while let Some(v) = queue.pop_front() {
            for &u in graph.vtxs[v].neighbors() {
                if comp[u] == usize::MAX {
                    comp[u] = ncomps;
                    queue.push_back(u);
                }
            }
        }
        ncomps += 1;
    }

    (ncomps, comp)
}

/// Chains the components together with light edges between their lowest numbered vertices.
/// Returns the edges that were added, for [`make_unconnected`].
pub fn make_connected(graph: &mut Graph) -> Vec<(usize, usize)> {
    let (ncomps, comp) = find_comps(graph);
    if ncomps <= 1 {
        return Vec::new();
    }

    let mut roots = vec![usize::MAX; ncomps];
    for (v, &c) in comp.iter().enumerate() {
        if roots[c] == usize::MAX {
            roots[c] = v;
        }
    }

    log::debug!("connecting {ncomps} components with {} edges", ncomps - 1);
    let w = if graph.using_ewgts { CONNECT_EWGT } else { 1.0 };
    let mut added = Vec::with_capacity(ncomps - 1);
    for pair in roots.windows(2) {
        graph.add_edge(pair[0], pair[1], w);
        added.push((pair[0], pair[1]));
    }
    added
}

/// Removes the edges [`make_connected`] added
pub fn make_unconnected(graph: &mut Graph, added: &[(usize, usize)]) {
    for &(u, v) in added {
        let removed = graph.remove_edge(u, v);
        debug_assert!(removed);
    }
}
