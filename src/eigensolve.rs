/*
\file
\brief Eigensolver front end: validates the request, makes the graph connected, dispatches on
the configured method and checks the resulting residuals.

The vectors handed back are partition coordinates, one entry per vertex, with the vertex weight
scaling of the normalized Laplacian already removed.
*/

use std::time::Instant;

use log::{debug, warn};

use crate::blas::norm;
use crate::coarsen::coarsen;
use crate::connected::{find_comps, make_connected};
use crate::error::{ChacoError, Result};
use crate::graph::Graph;
use crate::lanczos_ext::{lanczos_ext, ExtOutcome};
use crate::lanczos_fo::{lanczos_fo, Eigenpairs, End};
use crate::lanczos_so::lanczos_so;
use crate::operator::{InverseOperator, Laplacian};
use crate::options::{Ctrl, DbgLvl, EigenMethod, LanczosVariant, Precision};
use crate::timing::Timer;

/// Accuracy of the inner solves when Lanczos runs on the pseudo-inverse
const INVERSE_RTOL: f64 = 1.0e-10;

/// Eigenvalues with the matching partition coordinates
#[derive(Debug, Clone)]
pub struct SpectralCoords {
    pub evals: Vec<f64>,
    pub yvecs: Vec<Vec<f64>>,
}

/// Runs the configured Lanczos variant for the `neigs` smallest nonzero eigenpairs of `lap`.
pub fn solve_lanczos(ctrl: &mut Ctrl, lap: &Laplacian, neigs: usize) -> Result<Eigenpairs> {
    match ctrl.params.lanczos_variant {
        LanczosVariant::Full => lanczos_fo(ctrl, lap, lap.null(), neigs, End::Left, None),
        LanczosVariant::FullInverse => {
            let n = lap.graph().nvtxs();
            let inv = InverseOperator::new(lap, INVERSE_RTOL, 4 * n);
            let mut res = lanczos_fo(ctrl, &inv, lap.null(), neigs, End::Right, None)?;
            ctrl.counters.minres_steps += inv.steps();
            // the largest eigenvalues of the inverse are the smallest of the Laplacian
            res.evals = res.evals.iter().rev().map(|&t| 1.0 / t).collect();
            res.evecs.reverse();
            Ok(res)
        }
        variant => {
            let both_ends = variant == LanczosVariant::SelectiveBothEnds;
            match ctrl.params.precision {
                Precision::Double => lanczos_so::<f64>(ctrl, lap, neigs, both_ends, None),
                Precision::Single => lanczos_so::<f32>(ctrl, lap, neigs, both_ends, None),
            }
        }
    }
}

/// Right hand side of the extended eigenproblem from terminal costs `term[set][vertex]` of a
/// bisection. Vertices that are expensive in set 0 are pushed toward positive coordinates.
fn ext_rhs(lap: &Laplacian, term: &[Vec<f64>]) -> Vec<f64> {
    let graph = lap.graph();
    let scale = (graph.total_vwgt() as f64).sqrt();
    (0..graph.nvtxs())
        .map(|v| {
            let g = term[0][v] - term[1][v];
            match lap.vwsqrt() {
                Some(s) => g / (s[v] * scale),
                None => g / scale,
            }
        })
        .collect()
}

/// Warns about eigenpairs whose residual exceeds `warning_evecs * eigtol`
pub fn checkeig(ctrl: &Ctrl, lap: &Laplacian, pairs: &Eigenpairs) {
    let limit = ctrl.params.warning_evecs * ctrl.params.eigtol;
    let floor = 1.0e-6 * lap.norm_bound();
    for (k, (x, &lambda)) in pairs.evecs.iter().zip(&pairs.evals).enumerate() {
        let res = lap.residual(x, lambda);
        ifset!(
            ctrl.dbglvl,
            DbgLvl::Lanczos,
            debug!("eigenpair {k}: lambda {lambda:.8e}, residual {res:.3e}")
        );
        if res > limit * lambda.abs().max(floor) {
            warn!("eigenvector {k} has residual {res:.3e} for eigenvalue {lambda:.6e}");
        }
    }
}

/// Computes `neigs` partition coordinate vectors for `graph`.
///
/// When `term` holds terminal costs of a bisection and terminal propagation is on, the extended
/// eigenproblem is solved instead, falling back to the plain one when the costs do not
/// distinguish the two sets.
pub fn eigensolve(
    ctrl: &mut Ctrl,
    graph: &Graph,
    neigs: usize,
    coords: Option<&[Vec<f64>]>,
    term: Option<&[Vec<f64>]>,
) -> Result<SpectralCoords> {
    let n = graph.nvtxs();
    if n <= neigs {
        return Err(ChacoError::TooSmall { nvtxs: n, neigs });
    }

    let connected: Graph;
    let (ncomps, _) = find_comps(graph);
    let graph = if ncomps > 1 {
        warn!("graph has {ncomps} connected components; linking them for the eigensolver");
        let mut g = graph.clone();
        make_connected(&mut g);
        connected = g;
        &connected
    } else {
        graph
    };
    let lap = Laplacian::new(graph);

    if let (Some(term), 1, true) = (term, neigs, ctrl.params.term_prop) {
        let rhs = ext_rhs(&lap, term);
        let start = Instant::now();
        let outcome = lanczos_ext(ctrl, &lap, &rhs)?;
        ctrl.timers.add(Timer::Lanczos, start);
        match outcome {
            ExtOutcome::Solved { y, lambda, steps } => {
                ifset!(
                    ctrl.dbglvl,
                    DbgLvl::Lanczos,
                    debug!(
                        "extended eigenproblem: lambda {lambda:.6e} after {steps} steps, |g| {:.3e}",
                        norm(&rhs)
                    )
                );
                return Ok(SpectralCoords {
                    evals: vec![lambda],
                    yvecs: vec![lap.to_coords(&y)],
                });
            }
            ExtOutcome::Fallback => {}
        }
    }

    let pairs = if ctrl.params.eigen_method == EigenMethod::MultilevelRqi && n > ctrl.params.vmax
    {
        coarsen(ctrl, graph, neigs, coords)?
    } else {
        let start = Instant::now();
        let res = solve_lanczos(ctrl, &lap, neigs)?;
        ctrl.timers.add(Timer::Lanczos, start);
        res
    };
    checkeig(ctrl, &lap, &pairs);

    Ok(SpectralCoords {
        yvecs: pairs.evecs.iter().map(|x| lap.to_coords(x)).collect(),
        evals: pairs.evals,
    })
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::graph::GraphInput;
    use crate::options::Params;
    use crate::util::create_grid_graph;
    use std::f64::consts::PI;

    fn grid(nx: usize, ny: usize) -> Graph {
        let (xadj, adjncy) = create_grid_graph(nx, ny);
        Graph::from_csr(&GraphInput::new(&xadj, &adjncy)).unwrap()
    }

    #[test]
    fn every_variant_finds_fiedler_value() {
        let graph = grid(10, 3);
        let exact = 2.0 - 2.0 * (PI / 10.0).cos();
        for (lanczos_variant, precision, eigen_method) in [
            (LanczosVariant::Full, Precision::Double, EigenMethod::Lanczos),
            (LanczosVariant::FullInverse, Precision::Double, EigenMethod::Lanczos),
            (LanczosVariant::Selective, Precision::Double, EigenMethod::Lanczos),
            (LanczosVariant::Selective, Precision::Single, EigenMethod::Lanczos),
            (LanczosVariant::SelectiveBothEnds, Precision::Double, EigenMethod::Lanczos),
            (LanczosVariant::Selective, Precision::Double, EigenMethod::MultilevelRqi),
        ] {
            let mut ctrl = Ctrl::new(Params {
                lanczos_variant,
                precision,
                eigen_method,
                eigtol: 1e-5,
                vmax: 8,
                ..Default::default()
            });
            let res = eigensolve(&mut ctrl, &graph, 1, None, None).unwrap();
            let tol = if precision == Precision::Single { 1e-4 } else { 1e-6 };
            assert!(
                (res.evals[0] - exact).abs() < tol,
                "{lanczos_variant:?} {precision:?} {eigen_method:?}: {} vs {exact}",
                res.evals[0]
            );
            assert_eq!(res.yvecs[0].len(), 30);
        }
    }

    #[test]
    fn too_small() {
        let xadj = [0, 0];
        let graph = Graph::from_csr(&GraphInput::new(&xadj, &[])).unwrap();
        let mut ctrl = Ctrl::new(Params::default());
        assert_eq!(
            eigensolve(&mut ctrl, &graph, 1, None, None).unwrap_err(),
            ChacoError::TooSmall { nvtxs: 1, neigs: 1 }
        );
    }

    #[test]
    fn disconnected_graph_separates_components() {
        // two 3 x 3 grids side by side without edges between them
        let (xadj1, adjncy1) = create_grid_graph(3, 3);
        let mut xadj = xadj1.clone();
        let mut adjncy = adjncy1.clone();
        for &x in &xadj1[1..] {
            xadj.push(x + adjncy1.len());
        }
        adjncy.extend(adjncy1.iter().map(|&u| u + 9));
        let graph = Graph::from_csr(&GraphInput::new(&xadj, &adjncy)).unwrap();
        let mut ctrl = Ctrl::new(Params::default());
        let res = eigensolve(&mut ctrl, &graph, 1, None, None).unwrap();
        let y = &res.yvecs[0];
        let left = y[..9].iter().all(|&v| v < 0.0) && y[9..].iter().all(|&v| v > 0.0);
        let right = y[..9].iter().all(|&v| v > 0.0) && y[9..].iter().all(|&v| v < 0.0);
        assert!(left || right);
        // the input graph is untouched
        assert_eq!(graph.nedges, 24);
    }

    #[test]
    fn terminal_costs_orient_the_vector() {
        let graph = grid(6, 2);
        let mut ctrl = Ctrl::new(Params {
            term_prop: true,
            ..Default::default()
        });
        // the left column is expensive in set 0
        let mut term = vec![vec![0.0; 12], vec![0.0; 12]];
        term[0][0] = 1.0;
        term[0][6] = 1.0;
        let res = eigensolve(&mut ctrl, &graph, 1, None, Some(&term)).unwrap();
        let y = &res.yvecs[0];
        assert!(y[0] > y[5] && y[6] > y[11]);

        // equal costs carry no information and the plain problem is solved
        let flat = vec![vec![1.0; 12], vec![1.0; 12]];
        let res = eigensolve(&mut ctrl, &graph, 1, None, Some(&flat)).unwrap();
        let exact = 2.0 - 2.0 * (PI / 6.0).cos();
        assert!((res.evals[0] - exact).abs() < 1e-6);
    }
}
