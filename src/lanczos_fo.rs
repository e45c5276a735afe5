/*
\file
\brief Lanczos with full orthogonalization.

Every new Lanczos vector is orthogonalized against the null vector and all previous Lanczos
vectors. The same driver runs on the Laplacian for the smallest eigenpairs, or on its
pseudo-inverse for the largest eigenpairs of the inverse.
*/

use log::{debug, warn};

use crate::blas::{axpy, dot, normalize, orthog1, Scalar};
use crate::defs::{DOUBLE_EPSILON, ZERO_NORM};
use crate::error::{ChacoError, Result};
use crate::operator::Operator;
use crate::options::{Ctrl, DbgLvl};
use crate::tridiag::{ritz_pairs, tri_norm, RitzPair};

/// Approximate eigenpairs of an operator
#[derive(Debug, Clone)]
pub struct Eigenpairs {
    /// ascending
    pub evals: Vec<f64>,
    /// unit vectors, parallel to `evals`
    pub evecs: Vec<Vec<f64>>,
    pub steps: usize,
    pub converged: bool,
}

/// Which end of the spectrum is wanted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum End {
    Left,
    Right,
}

/// Paige bound acceptance test for one Ritz pair
pub(crate) fn pair_converged(pair: &RitzPair, eigtol: f64, nrm: f64, eps: f64) -> bool {
    pair.bji <= eigtol * pair.theta.abs().max(1.0e-6 * nrm) || pair.bji <= 100.0 * eps * nrm
}

/// Allocates a vector of length `n` without aborting on failure
pub(crate) fn try_alloc<F: Scalar>(n: usize) -> Option<Vec<F>> {
    let mut v = Vec::new();
    v.try_reserve_exact(n).ok()?;
    v.resize(n, F::zero());
    Some(v)
}

/// Random unit vector orthogonal to `null` and to `basis`
pub(crate) fn random_start(
    ctrl: &mut Ctrl,
    n: usize,
    null: &[f64],
    basis: &[Vec<f64>],
) -> Vec<f64> {
    loop {
        let mut v: Vec<f64> = (0..n).map(|_| ctrl.rng.f64() - 0.5).collect();
        orthog1(&mut v, null);
        for q in basis {
            orthog1(&mut v, q);
        }
        if normalize(&mut v) > ZERO_NORM {
            return v;
        }
    }
}

/// Ritz vectors `Q s` for a set of tridiagonal eigenvectors
pub(crate) fn ritz_vectors<F: Scalar>(q: &[Vec<F>], pairs: &[RitzPair], null: &[f64]) -> Vec<Vec<f64>> {
    let n = null.len();
    pairs
        .iter()
        .map(|p| {
            let mut y = vec![0.0; n];
            for (qk, &sk) in q.iter().zip(&p.s) {
                for (yi, &qi) in y.iter_mut().zip(qk) {
                    *yi += sk * qi.as_f64();
                }
            }
            orthog1(&mut y, null);
            normalize(&mut y);
            y
        })
        .collect()
}

/// Full orthogonalization Lanczos for `neigs` eigenpairs at one end of the spectrum of `op`
/// restricted to the complement of `null`.
pub fn lanczos_fo<O: Operator + ?Sized>(
    ctrl: &mut Ctrl,
    op: &O,
    null: &[f64],
    neigs: usize,
    end: End,
    start: Option<&[f64]>,
) -> Result<Eigenpairs> {
    let n = op.n();
    if neigs + 1 > n {
        return Err(ChacoError::TooSmall { nvtxs: n, neigs });
    }
    let eigtol = ctrl.params.eigtol;
    let maxj = ctrl
        .params
        .lanczos_maxitns
        .unwrap_or(2 * n)
        .min(n - 1)
        .max(neigs);
    let max_vecs = ctrl.params.lanczos_max_vecs;

    let mut q: Vec<Vec<f64>> = Vec::new();
    let first = match start {
        Some(s) => {
            let mut v = s.to_vec();
            orthog1(&mut v, null);
            if normalize(&mut v) > ZERO_NORM {
                v
            } else {
                random_start(ctrl, n, null, &q)
            }
        }
        None => random_start(ctrl, n, null, &q),
    };
    q.push(first);

    let mut alpha: Vec<f64> = Vec::new();
    let mut beta: Vec<f64> = Vec::new();
    let mut r = vec![0.0; n];
    let mut checkpoint = 0;
    let mut pairs: Vec<RitzPair> = Vec::new();
    let mut converged = false;

    let mut j = 0;
    loop {
        op.apply(&q[j], &mut r);
        let a = dot(&q[j], &r);
        axpy(-a, &q[j], &mut r);
        if j > 0 {
            axpy(-beta[j - 1], &q[j - 1], &mut r);
        }
        alpha.push(a);

        // twice is enough
        for _ in 0..2 {
            orthog1(&mut r, null);
            for qk in &q {
                orthog1(&mut r, qk);
            }
        }
        let b = crate::blas::norm(&r);
        j += 1;
        ctrl.counters.lanczos_steps += 1;

        if j >= neigs {
            let nrm = tri_norm(&alpha, &beta).max(DOUBLE_EPSILON);
            let (left, right) = match end {
                End::Left => ritz_pairs(ctrl, &alpha, &beta, b, neigs, 0)?,
                End::Right => ritz_pairs(ctrl, &alpha, &beta, b, 0, neigs)?,
            };
            pairs = if end == End::Left { left } else { right };
            checkpoint = j;
            converged = pairs
                .iter()
                .all(|p| pair_converged(p, eigtol, nrm, DOUBLE_EPSILON));
            ifset!(
                ctrl.dbglvl,
                DbgLvl::Lanczos,
                debug!(
                    "lanczos_fo step {j}: bounds {:?}",
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
                // full Krylov space, T is exact
                converged = true;
            }
            break;
        }

        let budget_hit = max_vecs.is_some_and(|m| q.len() >= m);
        let next = if budget_hit || q.try_reserve(1).is_err() {
            None
        } else {
            try_alloc::<f64>(n)
        };
        let Some(mut next) = next else {
            if checkpoint == 0 {
                return Err(ChacoError::OutOfMemory { step: j });
            }
            warn!("Lanczos ran out of space at step {j}; using the approximation from step {checkpoint}");
            alpha.truncate(checkpoint);
            beta.truncate(checkpoint - 1);
            break;
        };

        if b <= ZERO_NORM * (1.0 + a.abs()) {
            // invariant subspace, restart in the orthogonal complement
            next.copy_from_slice(&random_start(ctrl, n, null, &q));
            beta.push(0.0);
        } else {
            for (x, &ri) in next.iter_mut().zip(&r) {
                *x = ri / b;
            }
            beta.push(b);
        }
        q.push(next);
    }

    let m = alpha.len();
    if pairs.is_empty() || pairs[0].s.len() != m {
        let (left, right) = match end {
            End::Left => ritz_pairs(ctrl, &alpha, &beta, 0.0, neigs, 0)?,
            End::Right => ritz_pairs(ctrl, &alpha, &beta, 0.0, 0, neigs)?,
        };
        pairs = if end == End::Left { left } else { right };
    }

    let evecs = ritz_vectors(&q[..m], &pairs, null);
    Ok(Eigenpairs {
        evals: pairs.iter().map(|p| p.theta).collect(),
        evecs,
        steps: m,
        converged,
    })
}
