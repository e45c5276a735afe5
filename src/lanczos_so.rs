/*
\file
\brief Lanczos with selective orthogonalization, in single or double precision.

Instead of orthogonalizing against every Lanczos vector, each new vector is only kept orthogonal
to the null vector and to Ritz vectors that have converged far enough to start polluting the
recurrence. Those are found at periodic pauses, where the Ritz pairs of T are computed anyway
to test for convergence.
*/

use log::{debug, warn};

use crate::blas::{axpy, dot, norm, normalize, orthog1_mixed, Scalar};
use crate::defs::{DOUBLE_EPSILON, ZERO_NORM};
use crate::error::{ChacoError, Result};
use crate::lanczos_fo::{pair_converged, random_start, ritz_vectors, try_alloc, Eigenpairs};
use crate::operator::Laplacian;
use crate::options::{Ctrl, DbgLvl};
use crate::orthog::OrthList;
use crate::tridiag::{ritz_pairs, tri_norm, RitzPair};

/// Ritz vector `Q s` in the storage precision
fn ritz_vector<F: Scalar>(q: &[Vec<F>], s: &[f64], null: &[f64]) -> Vec<F> {
    let mut y = vec![F::zero(); null.len()];
    for (qk, &sk) in q.iter().zip(s) {
        axpy(sk, qk, &mut y);
    }
    orthog1_mixed(&mut y, null);
    normalize(&mut y);
    y
}

/// Selective orthogonalization Lanczos for the `neigs` smallest nonzero eigenpairs of the
/// Laplacian. With `both_ends` the largest Ritz pairs are monitored as well.
pub fn lanczos_so<F: Scalar>(
    ctrl: &mut Ctrl,
    lap: &Laplacian,
    neigs: usize,
    both_ends: bool,
    start: Option<&[f64]>,
) -> Result<Eigenpairs> {
    let n = lap.graph().nvtxs();
    if neigs + 1 > n {
        return Err(ChacoError::TooSmall { nvtxs: n, neigs });
    }
    let null = lap.null();
    let eigtol = ctrl.params.eigtol;
    let interval = ctrl.params.lanczos_so_interval;
    let max_vecs = ctrl.params.lanczos_max_vecs;
    let maxj = ctrl
        .params
        .lanczos_maxitns
        .unwrap_or(2 * n)
        .min(n - 1)
        .max(neigs);
    let eps = F::epsilon().as_f64();
    let good_tol = eps.sqrt();

    let first = match start {
        Some(s) => {
            let mut v = s.to_vec();
            crate::blas::orthog1(&mut v, null);
            if normalize(&mut v) > ZERO_NORM {
                v
            } else {
                random_start(ctrl, n, null, &[])
            }
        }
        None => random_start(ctrl, n, null, &[]),
    };
    let mut q: Vec<Vec<F>> = vec![crate::blas::convert(&first)];

    let mut good: OrthList<F> = OrthList::new();
    let mut alpha: Vec<f64> = Vec::new();
    let mut beta: Vec<f64> = Vec::new();
    let mut r: Vec<F> = vec![F::zero(); n];
    let mut checkpoint = 0;
    let mut pairs: Vec<RitzPair> = Vec::new();
    let mut converged = false;

    let mut j = 0;
    loop {
        lap.splarax(&q[j], &mut r);
        let a = dot(&q[j], &r);
        axpy(-a, &q[j], &mut r);
        if j > 0 {
            axpy(-beta[j - 1], &q[j - 1], &mut r);
        }
        alpha.push(a);
        orthog1_mixed(&mut r, null);
        good.orthogonalize(&mut r);
        let mut b = norm(&r);
        j += 1;
        ctrl.counters.lanczos_steps += 1;

        let exhausted = b <= ZERO_NORM * (1.0 + a.abs());
        if j >= neigs && (j % interval == 0 || j >= maxj || exhausted) {
            let nrm = tri_norm(&alpha, &beta).max(DOUBLE_EPSILON);
            let nright = if both_ends { neigs.min(j - neigs) } else { 0 };
            let (left, right) = ritz_pairs(ctrl, &alpha, &beta, b, neigs, nright)?;

            let mut added = 0;
            for p in left.iter().chain(&right) {
                if p.bji <= good_tol * nrm {
                    let y = ritz_vector(&q, &p.s, null);
                    if good.max_overlap(&y) < 0.5 && good.add_orthogonal(y) {
                        added += 1;
                    }
                }
            }
            if added > 0 {
                good.orthogonalize(&mut r);
                orthog1_mixed(&mut r, null);
                b = norm(&r);
            }

            converged = left
                .iter()
                .all(|p| pair_converged(p, eigtol, nrm, eps));
            pairs = left;
            checkpoint = j;
            ifset!(
                ctrl.dbglvl,
                DbgLvl::Lanczos,
                debug!(
                    "lanczos_so pause at step {j}: {} good vectors, bounds {:?}",
                    good.len(),
                    pairs.iter().map(|p| p.bji).collect::<Vec<_>>()
                )
            );
            if converged {
                break;
            }
        }
        if j >= maxj {
            if j < n - 1 {
                warn!("Lanczos reached its iteration limit of {maxj} without converging");
            } else {
                converged = true;
            }
            break;
        }

        let budget_hit = max_vecs.is_some_and(|m| q.len() >= m);
        let next = if budget_hit || q.try_reserve(1).is_err() {
            None
        } else {
            try_alloc::<F>(n)
        };
        let Some(mut next) = next else {
            if checkpoint == 0 {
                return Err(ChacoError::OutOfMemory { step: j });
            }
            warn!("Lanczos ran out of space at step {j}; backing up to the pause at step {checkpoint}");
            alpha.truncate(checkpoint);
            beta.truncate(checkpoint - 1);
            break;
        };

        if b <= ZERO_NORM * (1.0 + a.abs()) {
            let qd: Vec<Vec<f64>> = q.iter().map(|v| crate::blas::convert(v)).collect();
            let v = random_start(ctrl, n, null, &qd);
            next.copy_from_slice(&crate::blas::convert::<f64, F>(&v));
            beta.push(0.0);
        } else {
            for (x, &ri) in next.iter_mut().zip(&r) {
                *x = ri / F::of(b);
            }
            beta.push(b);
        }
        q.push(next);
    }

    let m = alpha.len();
    if pairs.is_empty() || pairs[0].s.len() != m {
        pairs = ritz_pairs(ctrl, &alpha, &beta, 0.0, neigs, 0)?.0;
    }
    let evecs = ritz_vectors(&q[..m], &pairs, null);
    Ok(Eigenpairs {
        evals: pairs.iter().map(|p| p.theta).collect(),
        evecs,
        steps: m,
        converged,
    })
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::graph::{Graph, GraphInput};
    use crate::options::Params;
    use crate::util::create_grid_graph;

    fn grid(nx: usize, ny: usize) -> Graph {
        let (xadj, adjncy) = create_grid_graph(nx, ny);
        Graph::from_csr(&GraphInput::new(&xadj, &adjncy)).unwrap()
    }

    #[test]
    fn double_precision_grid() {
        let graph = grid(12, 5);
        let lap = Laplacian::new(&graph);
        let mut ctrl = Ctrl::new(Params {
            eigtol: 1e-6,
            ..Default::default()
        });
        let res = lanczos_so::<f64>(&mut ctrl, &lap, 1, false, None).unwrap();
        // smallest nonzero eigenvalue of a 12 x 5 grid is that of the 12 path
        let exact = 2.0 - 2.0 * (std::f64::consts::PI / 12.0).cos();
        assert!((res.evals[0] - exact).abs() < 1e-6);
        assert!(dot(&res.evecs[0], lap.null()).abs() < 1e-8);
    }

    #[test]
    fn precisions_agree() {
        let graph = grid(9, 7);
        let lap = Laplacian::new(&graph);
        let params = Params {
            eigtol: 1e-4,
            lanczos_so_interval: 2,
            ..Default::default()
        };
        let mut c64 = Ctrl::new(params.clone());
        let mut c32 = Ctrl::new(params);
        let d = lanczos_so::<f64>(&mut c64, &lap, 2, false, None).unwrap();
        let s = lanczos_so::<f32>(&mut c32, &lap, 2, true, None).unwrap();
        for k in 0..2 {
            assert!(
                (d.evals[k] - s.evals[k]).abs() < 1e-3 * d.evals[k].max(1.0),
                "{} {}",
                d.evals[k],
                s.evals[k]
            );
            assert!(dot(&s.evecs[k], lap.null()).abs() < 1e-5);
        }
        // eigenvectors agree up to sign
        let overlap = dot(&d.evecs[0], &s.evecs[0]).abs();
        assert!(overlap > 0.99, "{overlap}");
    }
}
