/*
\file
\brief Maximal matchings that pick the vertex pairs contracted by one coarsening step.

Every variant returns `(nmerged, mflag)` where `mflag[v]` is the partner of `v`, or `None`
when `v` is unmatched, and `nmerged` is the number of matched pairs. All variants draw their
randomness from the run's seeded generator, so results are reproducible.
*/

use std::time::Instant;

use log::debug;

use crate::bucketsort::bucket_sort_keys_inc;
use crate::graph::Graph;
use crate::options::{Ctrl, DbgLvl, MatchType};
use crate::timing::Timer;

pub type Matching = (usize, Vec<Option<usize>>);

/// Computes a maximal matching with the configured method. `Geometric` needs `coords` and
/// falls back to `Cheap` without them.
pub fn maxmatch(ctrl: &mut Ctrl, graph: &Graph, coords: Option<&[Vec<f64>]>) -> Matching {
    let start = Instant::now();
    let res = match (ctrl.params.match_type, coords) {
        (MatchType::Cheap, _) | (MatchType::Geometric, None) => match_cheap(ctrl, graph),
        (MatchType::HeavyEdge, _) => match_heavy_edge(ctrl, graph),
        (MatchType::Random, _) => match_random(ctrl, graph),
        (MatchType::FullyRandom, _) => match_fully_random(ctrl, graph),
        (MatchType::Geometric, Some(coords)) => match_geometric(ctrl, graph, coords),
    };
    ctrl.timers.add(Timer::Matching, start);
    ifset!(
        ctrl.dbglvl,
        DbgLvl::Coarsen,
        debug!(
            "{:?} matching merged {} pairs of {} vertices",
            ctrl.params.match_type,
            res.0,
            graph.nvtxs()
        )
    );
    res
}

fn pair(mflag: &mut [Option<usize>], u: usize, v: usize) {
    mflag[u] = Some(v);
    mflag[v] = Some(u);
}

/// In-order scan from a random starting vertex, first unmatched neighbor
pub fn match_cheap(ctrl: &mut Ctrl, graph: &Graph) -> Matching {
    let nvtxs = graph.nvtxs();
    let mut mflag = vec![None; nvtxs];
    if nvtxs == 0 {
        return (0, mflag);
    }
    let mut nmerged = 0;
    let first = ctrl.rng.usize(0..nvtxs);
    for i in 0..nvtxs {
        let v = (first + i) % nvtxs;
        if mflag[v].is_some() {
            continue;
        }
        if let Some(&u) = graph.vtxs[v].neighbors().iter().find(|&&u| mflag[u].is_none()) {
            pair(&mut mflag, u, v);
            nmerged += 1;
        }
    }
    (nmerged, mflag)
}

/// Visits vertices in random order, low degree first, and takes the heaviest unmatched edge.
/// Ties go to the neighbor with the smaller vertex weight.
pub fn match_heavy_edge(ctrl: &mut Ctrl, graph: &Graph) -> Matching {
    let nvtxs = graph.nvtxs();
    let mut mflag = vec![None; nvtxs];
    let mut tperm: Vec<usize> = (0..nvtxs).collect();
    ctrl.rng.shuffle(&mut tperm);
    let degrees: Vec<usize> = graph.vtxs.iter().map(|v| v.degree()).collect();
    let maxdeg = degrees.iter().copied().max().unwrap_or(0);
    let perm = bucket_sort_keys_inc(&degrees, maxdeg, &tperm);

    let mut nmerged = 0;
    for &v in &perm {
        if mflag[v].is_some() {
            continue;
        }
        let mut best: Option<(usize, f32, i32)> = None;
        for (u, w) in graph.vtxs[v].adj() {
            if mflag[u].is_some() {
                continue;
            }
            let uw = graph.vtxs[u].vwgt;
            let better = match best {
                None => true,
                Some((_, bw, bvw)) => w > bw || (w == bw && uw < bvw),
            };
            if better {
                best = Some((u, w, uw));
            }
        }
        if let Some((u, _, _)) = best {
            pair(&mut mflag, u, v);
            nmerged += 1;
        }
    }
    (nmerged, mflag)
}

/// Random vertex order, random unmatched neighbor
pub fn match_random(ctrl: &mut Ctrl, graph: &Graph) -> Matching {
    let nvtxs = graph.nvtxs();
    let mut mflag = vec![None; nvtxs];
    let mut perm: Vec<usize> = (0..nvtxs).collect();
    ctrl.rng.shuffle(&mut perm);

    let mut nmerged = 0;
    let mut free = Vec::new();
    for &v in &perm {
        if mflag[v].is_some() {
            continue;
        }
        free.clear();
        free.extend(graph.vtxs[v].neighbors().iter().filter(|&&u| mflag[u].is_none()));
        if !free.is_empty() {
            let u = free[ctrl.rng.usize(0..free.len())];
            pair(&mut mflag, u, v);
            nmerged += 1;
        }
    }
    (nmerged, mflag)
}

/// Picks edges uniformly at random among those whose endpoints are both still unmatched
pub fn match_fully_random(ctrl: &mut Ctrl, graph: &Graph) -> Matching {
    let nvtxs = graph.nvtxs();
    let mut mflag = vec![None; nvtxs];
    let mut edges: Vec<(usize, usize)> = Vec::with_capacity(graph.nedges);
    for (v, vtx) in graph.vtxs.iter().enumerate() {
        edges.extend(vtx.neighbors().iter().filter(|&&u| u > v).map(|&u| (v, u)));
    }
    // a random permutation visited in order is a sequence of uniform draws without replacement
    ctrl.rng.shuffle(&mut edges);

    let mut nmerged = 0;
    for (v, u) in edges {
        if mflag[v].is_none() && mflag[u].is_none() {
            pair(&mut mflag, u, v);
            nmerged += 1;
        }
    }
    (nmerged, mflag)
}

/// Random vertex order, nearest unmatched neighbor in the coordinates
pub fn match_geometric(ctrl: &mut Ctrl, graph: &Graph, coords: &[Vec<f64>]) -> Matching {
    let nvtxs = graph.nvtxs();
    let mut mflag = vec![None; nvtxs];
    let mut perm: Vec<usize> = (0..nvtxs).collect();
    ctrl.rng.shuffle(&mut perm);

    let dist2 = |a: usize, b: usize| -> f64 {
        coords.iter().map(|axis| (axis[a] - axis[b]).powi(2)).sum()
    };

    let mut nmerged = 0;
    for &v in &perm {
        if mflag[v].is_some() {
            continue;
        }
        let best = graph.vtxs[v]
            .neighbors()
            .iter()
            .filter(|&&u| mflag[u].is_none())
            .map(|&u| (u, dist2(u, v)))
            .min_by(|a, b| a.1.total_cmp(&b.1));
        if let Some((u, _)) = best {
            pair(&mut mflag, u, v);
            nmerged += 1;
        }
    }
    (nmerged, mflag)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::graph::GraphInput;
    use crate::options::Params;
    use crate::util::create_grid_graph;

    fn valid(graph: &Graph, (nmerged, mflag): &Matching) {
        let mut count = 0;
        for (v, m) in mflag.iter().enumerate() {
            if let Some(u) = *m {
                assert_eq!(mflag[u], Some(v));
                assert!(graph.vtxs[v].neighbors().contains(&u));
                count += 1;
            }
        }
        assert_eq!(count, 2 * nmerged);
        // maximal: no edge joins two unmatched vertices
        for (v, vtx) in graph.vtxs.iter().enumerate() {
            if mflag[v].is_none() {
                assert!(vtx.neighbors().iter().all(|&u| mflag[u].is_some()));
            }
        }
    }

    fn grid_coords(nx: usize, ny: usize) -> Vec<Vec<f64>> {
        vec![
            (0..nx * ny).map(|v| (v % nx) as f64).collect(),
            (0..nx * ny).map(|v| 3.0 * (v / nx) as f64).collect(),
        ]
    }

    #[test]
    fn every_method_is_valid_and_deterministic() {
        let (xadj, adjncy) = create_grid_graph(7, 6);
        let ewgts: Vec<f32> = (0..adjncy.len()).map(|_| 1.0).collect();
        let graph =
            Graph::from_csr(&GraphInput::new(&xadj, &adjncy).with_ewgts(&ewgts)).unwrap();
        let coords = grid_coords(7, 6);
        for match_type in [
            MatchType::Cheap,
            MatchType::HeavyEdge,
            MatchType::Random,
            MatchType::FullyRandom,
            MatchType::Geometric,
        ] {
            let params = Params {
                match_type,
                ..Default::default()
            };
            let a = maxmatch(&mut Ctrl::new(params.clone()), &graph, Some(&coords));
            let b = maxmatch(&mut Ctrl::new(params), &graph, Some(&coords));
            valid(&graph, &a);
            assert_eq!(a, b, "{match_type:?}");
        }
    }

    #[test]
    fn heavy_edge_prefers_heavy() {
        // vertex 0 has the lowest degree, a light edge to 1 and a heavy edge to 2; 1..=4 form a K4
        let xadj = [0, 2, 6, 10, 13, 16];
        let adjncy = [1, 2, 0, 2, 3, 4, 0, 1, 3, 4, 1, 2, 4, 1, 2, 3];
        let ewgts = [
            1.0, 5.0, 1.0, 1.0, 1.0, 1.0, 5.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0,
        ];
        let graph =
            Graph::from_csr(&GraphInput::new(&xadj, &adjncy).with_ewgts(&ewgts)).unwrap();
        for seed in 0..10 {
            let mut ctrl = Ctrl::new(Params {
                match_type: MatchType::HeavyEdge,
                seed,
                ..Default::default()
            });
            let (nmerged, mflag) = maxmatch(&mut ctrl, &graph, None);
            assert_eq!(mflag[0], Some(2));
            assert_eq!(nmerged, 2);
        }
    }

    #[test]
    fn geometric_pairs_nearest() {
        let (xadj, adjncy) = create_grid_graph(2, 5);
        let graph = Graph::from_csr(&GraphInput::new(&xadj, &adjncy)).unwrap();
        let coords = grid_coords(2, 5);
        let mut ctrl = Ctrl::new(Params {
            match_type: MatchType::Geometric,
            ..Default::default()
        });
        let (nmerged, mflag) = maxmatch(&mut ctrl, &graph, Some(&coords));
        // horizontal neighbors are closer, so every pair is horizontal
        assert_eq!(nmerged, 5);
        for (v, m) in mflag.iter().enumerate() {
            assert_eq!(m.unwrap() / 2, v / 2);
        }
    }
}
