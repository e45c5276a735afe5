/*
\file
\brief Extended eigenproblem for terminal propagation.

Solves `L y = lambda y + g` with `||y|| = 1`, `y` orthogonal to the null vector and `lambda`
below the smallest nonzero eigenvalue of `L`. Lanczos is seeded with the projected right hand
side, so on the Krylov space the problem becomes `(T - lambda I) s = ||g|| e1`, and `lambda` is
the root of the secular equation `||s(lambda)|| = 1` to the left of the smallest Ritz value.
*/

use log::{debug, warn};

use crate::blas::{axpy, dot, norm, normalize, orthog1};
use crate::defs::{BISECT_MAXITER, DOUBLE_EPSILON, ZERO_NORM};
use crate::error::{ChacoError, Result};
use crate::lanczos_fo::try_alloc;
use crate::operator::Laplacian;
use crate::options::{Ctrl, DbgLvl};
use crate::tridiag::{bisect, tri_norm, tri_solve};

#[derive(Debug, Clone)]
pub enum ExtOutcome {
    /// unit solution vector and its multiplier
    Solved { y: Vec<f64>, lambda: f64, steps: usize },
    /// the right hand side has no component off the null vector; solve the plain eigenproblem
    Fallback,
}

/// Solves the tridiagonal secular equation. Returns `lambda` and the (unit) vector `s`.
fn secular(alpha: &[f64], beta: &[f64], gnorm: f64) -> Option<(f64, Vec<f64>)> {
    let m = alpha.len();
    let nrm = tri_norm(alpha, beta).max(gnorm).max(f64::MIN_POSITIVE);
    let tiny = DOUBLE_EPSILON * nrm;
    let theta_min = *bisect(alpha, beta, 1, 0, 4.0 * DOUBLE_EPSILON * nrm)?
        .left
        .first()?;

    let solve = |lambda: f64| {
        let d: Vec<f64> = alpha.iter().map(|&a| a - lambda).collect();
        let mut s = vec![0.0; m];
        s[0] = gnorm;
        tri_solve(&d, beta, &mut s, tiny);
        s
    };

    // ||s(lambda)|| <= gnorm / (theta_min - lambda), so the root lies in [theta_min - gnorm, theta_min)
    let mut lo = theta_min - gnorm;
    let mut hi = theta_min;
    for _ in 0..BISECT_MAXITER {
        if hi - lo <= 4.0 * DOUBLE_EPSILON * nrm {
            break;
        }
        let mid = 0.5 * (lo + hi);
        if norm(&solve(mid)) > 1.0 {
            hi = mid;
        } else {
            lo = mid;
        }
    }

    let lambda = lo;
    let mut s = solve(lambda);
    let snorm = norm(&s);
    if !(snorm.is_finite() && snorm > 0.0) {
        return None;
    }
    // below 1 only when g has no component along the lowest eigenvector of T
    if snorm < 1.0 {
        s.iter_mut().for_each(|x| *x /= snorm);
    }
    Some((lambda, s))
}

/// Lanczos for the extended eigenproblem with right hand side `rhs` (in the operator's scaling).
pub fn lanczos_ext(ctrl: &mut Ctrl, lap: &Laplacian, rhs: &[f64]) -> Result<ExtOutcome> {
    let n = lap.graph().nvtxs();
    if n < 2 {
        return Err(ChacoError::TooSmall { nvtxs: n, neigs: 1 });
    }
    let null = lap.null();
    let eigtol = ctrl.params.eigtol;
    let max_vecs = ctrl.params.lanczos_max_vecs;
    let maxj = ctrl.params.lanczos_maxitns.unwrap_or(2 * n).min(n - 1).max(1);

    let raw = norm(rhs);
    let mut g = rhs.to_vec();
    orthog1(&mut g, null);
    let gnorm = norm(&g);
    if raw <= ZERO_NORM || gnorm <= ZERO_NORM * raw.max(1.0) {
        ifset!(
            ctrl.dbglvl,
            DbgLvl::Lanczos,
            debug!("lanczos_ext: right hand side is in the null space, falling back")
        );
        return Ok(ExtOutcome::Fallback);
    }

    let mut first = g.clone();
    normalize(&mut first);
    let mut q: Vec<Vec<f64>> = vec![first];
    let mut alpha: Vec<f64> = Vec::new();
    let mut beta: Vec<f64> = Vec::new();
    let mut r = vec![0.0; n];

    let mut j = 0;
    let (lambda, s) = loop {
        lap.splarax(&q[j], &mut r);
        let a = dot(&q[j], &r);
        axpy(-a, &q[j], &mut r);
        if j > 0 {
            axpy(-beta[j - 1], &q[j - 1], &mut r);
        }
        alpha.push(a);
        for _ in 0..2 {
            orthog1(&mut r, null);
            for qk in &q {
                orthog1(&mut r, qk);
            }
        }
        let b = norm(&r);
        j += 1;
        ctrl.counters.lanczos_steps += 1;

        let (lambda, s) =
            secular(&alpha, &beta, gnorm).ok_or(ChacoError::DegenerateExtended)?;
        let exhausted = b <= ZERO_NORM * (1.0 + a.abs());
        let bound = if exhausted { 0.0 } else { b * s[j - 1].abs() };
        ifset!(
            ctrl.dbglvl,
            DbgLvl::Lanczos,
            debug!("lanczos_ext step {j}: lambda {lambda:.6e}, residual bound {bound:.3e}")
        );
        if bound <= eigtol * gnorm {
            break (lambda, s);
        }
        if j >= maxj {
            warn!("extended Lanczos reached its iteration limit of {maxj} without converging");
            break (lambda, s);
        }

        let budget_hit = max_vecs.is_some_and(|m| q.len() >= m);
        let next = if budget_hit || q.try_reserve(1).is_err() {
            None
        } else {
            try_alloc::<f64>(n)
        };
        let Some(mut next) = next else {
            warn!("extended Lanczos ran out of space at step {j}; using the current approximation");
            break (lambda, s);
        };
        for (x, &ri) in next.iter_mut().zip(&r) {
            *x = ri / b;
        }
        beta.push(b);
        q.push(next);
    };

    let m = alpha.len();
    let mut y = vec![0.0; n];
    for (qk, &sk) in q[..m].iter().zip(&s) {
        axpy(sk, qk, &mut y);
    }
    orthog1(&mut y, null);
    if normalize(&mut y) <= ZERO_NORM || y.iter().any(|v| !v.is_finite()) {
        return Err(ChacoError::DegenerateExtended);
    }
    Ok(ExtOutcome::Solved {
        y,
        lambda,
        steps: m,
    })
}
