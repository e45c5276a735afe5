/*
\file
\brief Graph contraction and the multilevel eigensolver driver.

A coarsening step contracts the pairs of a maximal matching into single vertices. Coarse
graphs always carry vertex and edge weights. Levels are kept on an explicit stack, finest first;
`Level::v2cv` maps the vertices of the next finer graph onto the level's graph.
*/

use std::time::Instant;

use log::{debug, warn};

use crate::eigensolve::solve_lanczos;
use crate::error::Result;
use crate::graph::Graph;
use crate::interpolate::interpolate;
use crate::lanczos_fo::Eigenpairs;
use crate::matching::maxmatch;
use crate::operator::Laplacian;
use crate::options::{Ctrl, DbgLvl};
use crate::rqi::rqi;
use crate::timing::Timer;

/// One coarsened graph together with the map that produced it
#[derive(Debug, Clone)]
pub struct Level {
    pub graph: Graph,
    /// finer vertex -> vertex of `graph`
    pub v2cv: Vec<usize>,
    /// center of mass coordinates, when the finer graph had coordinates
    pub coords: Option<Vec<Vec<f64>>>,
    /// summed terminal costs, `term[set][vertex]`
    pub term: Option<Vec<Vec<f64>>>,
}

/// Contracts the matched pairs of `graph`.
pub fn coarsen1(
    ctrl: &mut Ctrl,
    graph: &Graph,
    mflag: &[Option<usize>],
    coords: Option<&[Vec<f64>]>,
    term: Option<&[Vec<f64>]>,
) -> Level {
    let start = Instant::now();
    let nvtxs = graph.nvtxs();

    let mut v2cv = vec![usize::MAX; nvtxs];
    let mut cnvtxs = 0;
    for v in 0..nvtxs {
        if v2cv[v] != usize::MAX {
            continue;
        }
        v2cv[v] = cnvtxs;
        if let Some(u) = mflag[v] {
            v2cv[u] = cnvtxs;
        }
        cnvtxs += 1;
    }

    let mut members: Vec<Vec<usize>> = vec![Vec::with_capacity(2); cnvtxs];
    for (v, &cv) in v2cv.iter().enumerate() {
        members[cv].push(v);
    }

    let mut cvwgts = vec![0i32; cnvtxs];
    let mut adj: Vec<Vec<(usize, f32)>> = Vec::with_capacity(cnvtxs);
    // position of a coarse neighbor in the list being built
    let mut slot: Vec<Option<usize>> = vec![None; cnvtxs];
    for cv in 0..cnvtxs {
        let mut list: Vec<(usize, f32)> = Vec::new();
        for &v in &members[cv] {
            cvwgts[cv] += graph.vtxs[v].vwgt;
            for (u, w) in graph.vtxs[v].adj() {
                let cu = v2cv[u];
                if cu == cv {
                    continue;
                }
                match slot[cu] {
                    Some(k) => list[k].1 += w,
                    None => {
                        slot[cu] = Some(list.len());
                        list.push((cu, w));
                    }
                }
            }
        }
        for &(cu, _) in &list {
            slot[cu] = None;
        }
        adj.push(list);
    }

    let ccoords = coords.map(|coords| {
        coords
            .iter()
            .map(|axis| {
                (0..cnvtxs)
                    .map(|cv| {
                        let mut sum = 0.0;
                        for &v in &members[cv] {
                            sum += graph.vtxs[v].vwgt as f64 * axis[v];
                        }
                        sum / cvwgts[cv] as f64
                    })
                    .collect()
            })
            .collect()
    });

    let cterm = term.map(|term| {
        term.iter()
            .map(|costs| {
                let mut c = vec![0.0; cnvtxs];
                for (v, &cv) in v2cv.iter().enumerate() {
                    c[cv] += costs[v];
                }
                c
            })
            .collect()
    });

    let cgraph = Graph::from_adjacency(cvwgts, adj, true, true);
    ctrl.timers.add(Timer::MakeCgraph, start);

    Level {
        graph: cgraph,
        v2cv,
        coords: ccoords,
        term: cterm,
    }
}

/// Coarsens until the graph has at most `vmax` vertices, the matching comes back empty, or a
/// step stops paying off. Returns the levels, finest first; empty when `graph` is already small.
pub fn coarsen_levels(
    ctrl: &mut Ctrl,
    graph: &Graph,
    coords: Option<&[Vec<f64>]>,
    term: Option<&[Vec<f64>]>,
    vmax: usize,
) -> Vec<Level> {
    let start = Instant::now();
    let ratio_min = ctrl.params.coarsen_ratio_min;
    let mut levels: Vec<Level> = Vec::new();

    loop {
        let (cur, cur_coords, cur_term) = match levels.last() {
            Some(l) => (&l.graph, l.coords.as_deref(), l.term.as_deref()),
            None => (graph, coords, term),
        };
        let nvtxs = cur.nvtxs();
        if nvtxs <= vmax {
            break;
        }

        let (nmerged, mflag) = maxmatch(ctrl, cur, cur_coords);
        if nmerged == 0 {
            warn!("coarsening stopped at {nvtxs} vertices: no vertices could be matched");
            break;
        }
        let cnvtxs = nvtxs - nmerged;
        if cnvtxs as f64 > ratio_min * nvtxs as f64 {
            warn!("coarsening stalled at {nvtxs} vertices ({cnvtxs} after matching); giving up");
            break;
        }

        let level = coarsen1(ctrl, cur, &mflag, cur_coords, cur_term);
        ifset!(
            ctrl.dbglvl,
            DbgLvl::Coarsen,
            debug!(
                "level {}: {} vertices, {} edges",
                levels.len() + 1,
                level.graph.nvtxs(),
                level.graph.nedges
            )
        );
        ctrl.counters.coarsen_levels += 1;
        levels.push(level);
    }

    ctrl.timers.add(Timer::Coarsen, start);
    levels
}

/// The graph one level finer than `levels[k]`
pub fn finer<'a>(graph: &'a Graph, levels: &'a [Level], k: usize) -> &'a Graph {
    if k == 0 {
        graph
    } else {
        &levels[k - 1].graph
    }
}

/// Multilevel eigensolver: Lanczos on the coarsest graph, then interpolation back up with
/// Rayleigh quotient iteration every `coarse_nlevel_rqi` levels and on the input graph.
///
/// The returned vectors are eigenvectors of the Laplacian of `graph`.
pub fn coarsen(
    ctrl: &mut Ctrl,
    graph: &Graph,
    neigs: usize,
    coords: Option<&[Vec<f64>]>,
) -> Result<Eigenpairs> {
    let vmax = ctrl.params.vmax;
    let levels = coarsen_levels(ctrl, graph, coords, None, vmax);
    let coarsest = levels.last().map_or(graph, |l| &l.graph);

    let lap = Laplacian::new(coarsest);
    let start = Instant::now();
    let Eigenpairs {
        mut evals,
        mut evecs,
        steps,
        converged,
    } = solve_lanczos(ctrl, &lap, neigs)?;
    ctrl.timers.add(Timer::Lanczos, start);

    let mut yvecs: Vec<Vec<f64>> = evecs.iter().map(|x| lap.to_coords(x)).collect();
    let nlevels = levels.len();
    let every = ctrl.params.coarse_nlevel_rqi;
    for k in (0..nlevels).rev() {
        let fine = finer(graph, &levels, k);
        let flap = Laplacian::new(fine);
        let mut xvecs = interpolate(&flap, &levels[k].v2cv, &yvecs);

        if k == 0 || (nlevels - k) % every == 0 {
            let start = Instant::now();
            for i in 0..xvecs.len() {
                let (done, rest) = xvecs.split_at_mut(i);
                let prev: Vec<&[f64]> = done.iter().map(|v| v.as_slice()).collect();
                evals[i] = rqi(ctrl, &flap, &mut rest[0], &prev);
            }
            ctrl.timers.add(Timer::Rqi, start);
            ifset!(
                ctrl.dbglvl,
                DbgLvl::Rqi,
                debug!("refined at level {k} ({} vertices): {evals:?}", fine.nvtxs())
            );
        }

        yvecs = xvecs.iter().map(|x| flap.to_coords(x)).collect();
        evecs = xvecs;
    }

    Ok(Eigenpairs {
        evals,
        evecs,
        steps,
        converged,
    })
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::graph::GraphInput;
    use crate::options::{MatchType, Params};
    use crate::util::create_grid_graph;

    fn grid(nx: usize, ny: usize) -> Graph {
        let (xadj, adjncy) = create_grid_graph(nx, ny);
        Graph::from_csr(&GraphInput::new(&xadj, &adjncy)).unwrap()
    }

    #[test]
    fn contraction_conserves_weight() {
        let graph = grid(6, 5);
        let mut ctrl = Ctrl::new(Params::default());
        let (nmerged, mflag) = maxmatch(&mut ctrl, &graph, None);
        let coords = vec![(0..30).map(|v| (v % 6) as f64).collect::<Vec<_>>()];
        let term = vec![vec![1.0; 30], vec![0.5; 30]];
        let level = coarsen1(&mut ctrl, &graph, &mflag, Some(&coords), Some(&term));

        let cg = &level.graph;
        assert_eq!(cg.nvtxs(), 30 - nmerged);
        assert_eq!(cg.total_vwgt(), 30);
        assert!(!crate::checkgraph::check_graph(cg));
        // edge weight is conserved apart from contracted edges
        let fine: f64 = graph.vtxs.iter().map(|v| v.ewgt_sum()).sum::<f64>() / 2.0;
        let coarse: f64 = cg.vtxs.iter().map(|v| v.ewgt_sum()).sum::<f64>() / 2.0;
        assert_eq!(fine - coarse, nmerged as f64);

        let term = level.term.unwrap();
        assert_eq!(term[0].iter().sum::<f64>(), 30.0);
        assert_eq!(term[1].iter().sum::<f64>(), 15.0);
        let ccoords = level.coords.unwrap();
        let mass: f64 = cg
            .vtxs
            .iter()
            .zip(&ccoords[0])
            .map(|(v, x)| v.vwgt as f64 * x)
            .sum();
        assert!((mass - coords[0].iter().sum::<f64>()).abs() < 1e-10);
    }

    #[test]
    fn levels_shrink_to_vmax() {
        let graph = grid(16, 16);
        let mut ctrl = Ctrl::new(Params {
            match_type: MatchType::HeavyEdge,
            ..Default::default()
        });
        let levels = coarsen_levels(&mut ctrl, &graph, None, None, 20);
        assert!(!levels.is_empty());
        let mut prev = graph.nvtxs();
        for l in &levels {
            assert!(l.graph.nvtxs() < prev);
            assert_eq!(l.graph.total_vwgt(), 256);
            assert_eq!(l.v2cv.len(), prev);
            prev = l.graph.nvtxs();
        }
        assert!(prev <= 20);
        assert_eq!(ctrl.counters.coarsen_levels, levels.len());
    }

    #[test]
    fn star_gives_up() {
        // a star only ever matches one pair per step
        let n = 30;
        let mut xadj = vec![0, n - 1];
        let mut adjncy: Vec<usize> = (1..n).collect();
        for _ in 1..n {
            adjncy.push(0);
            xadj.push(adjncy.len());
        }
        let graph = Graph::from_csr(&GraphInput::new(&xadj, &adjncy)).unwrap();
        let mut ctrl = Ctrl::new(Params::default());
        let levels = coarsen_levels(&mut ctrl, &graph, None, None, 5);
        assert!(levels.is_empty());
    }

    #[test]
    fn multilevel_fiedler_value() {
        let graph = grid(24, 6);
        let mut ctrl = Ctrl::new(Params {
            eigtol: 1e-6,
            vmax: 20,
            ..Default::default()
        });
        let res = coarsen(&mut ctrl, &graph, 1, None).unwrap();
        let exact = 2.0 - 2.0 * (std::f64::consts::PI / 24.0).cos();
        assert!((res.evals[0] - exact).abs() < 1e-6, "{} {exact}", res.evals[0]);
        assert!(ctrl.counters.rqi_iterations > 0);
        let lap = Laplacian::new(&graph);
        assert!(crate::blas::dot(&res.evecs[0], lap.null()).abs() < 1e-8);
    }
}
