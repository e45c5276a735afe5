/*
\file
\brief Eigenvalues and eigenvectors of the symmetric tridiagonal matrices built by Lanczos.

`alpha` is the diagonal and `beta[i]` couples rows `i` and `i + 1`, so `beta` is one shorter
than `alpha`.
*/

use log::{debug, warn};

use crate::defs::{
    BISECT_MAXITER, DOUBLE_EPSILON, MAX_BISECTION_SAFETY, QL_MAXITER, RITZ_RELTOL, TEVEC_RELTOL,
};
use crate::error::{ChacoError, Result};
use crate::options::{Ctrl, DbgLvl};

/// Ritz values at both ends of the spectrum, each ascending
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RitzVals {
    pub left: Vec<f64>,
    pub right: Vec<f64>,
}

/// A Ritz value with its tridiagonal eigenvector and Paige's error bound
#[derive(Debug, Clone)]
pub struct RitzPair {
    pub theta: f64,
    /// unit eigenvector of T
    pub s: Vec<f64>,
    /// beta_{j+1} * |s_j|
    pub bji: f64,
}

/// infinity norm of T
pub fn tri_norm(alpha: &[f64], beta: &[f64]) -> f64 {
    let m = alpha.len();
    let mut nrm = 0.0f64;
    for i in 0..m {
        let mut row = alpha[i].abs();
        if i > 0 {
            row += beta[i - 1].abs();
        }
        if i + 1 < m {
            row += beta[i].abs();
        }
        nrm = nrm.max(row);
    }
    nrm
}

/// All eigenvalues by the implicit QL iteration, ascending. None if an eigenvalue does not
/// converge within `QL_MAXITER` sweeps.
pub fn ql(alpha: &[f64], beta: &[f64]) -> Option<Vec<f64>> {
    let n = alpha.len();
    let mut d = alpha.to_vec();
    let mut e = vec![0.0; n];
    e[..n.saturating_sub(1)].copy_from_slice(&beta[..n.saturating_sub(1)]);

    for l in 0..n {
        let mut iter = 0;
        loop {
            let mut m = l;
            while m + 1 < n {
                let dd = d[m].abs() + d[m + 1].abs();
                if e[m].abs() <= DOUBLE_EPSILON * dd {
                    break;
                }
                m += 1;
            }
            if m == l {
                break;
            }
            iter += 1;
            if iter > QL_MAXITER || !d[l].is_finite() {
                return None;
            }

            let mut g = (d[l + 1] - d[l]) / (2.0 * e[l]);
            let mut r = g.hypot(1.0);
            g = d[m] - d[l] + e[l] / (g + r.copysign(g));
            let (mut s, mut c, mut p) = (1.0, 1.0, 0.0);
            let mut underflow = false;
            let mut i = m;
            while i > l {
                i -= 1;
                let f = s * e[i];
                let b = c * e[i];
                r = f.hypot(g);
                e[i + 1] = r;
                if r == 0.0 {
                    d[i + 1] -= p;
                    e[m] = 0.0;
                    underflow = true;
                    break;
                }
                s = f / r;
                c = g / r;
                g = d[i + 1] - p;
                r = (d[i] - g) * s + 2.0 * c * b;
                p = s * r;
                d[i + 1] = g + p;
                g = c * r - b;
            }
            if underflow {
                continue;
            }
            d[l] -= p;
            e[l] = g;
            e[m] = 0.0;
        }
    }

    if d.iter().any(|x| !x.is_finite()) {
        return None;
    }
    d.sort_by(|a, b| a.total_cmp(b));
    Some(d)
}

/// Number of eigenvalues of T strictly below `x`
pub fn sturm_count(alpha: &[f64], beta: &[f64], x: f64) -> usize {
    let tiny = DOUBLE_EPSILON * DOUBLE_EPSILON;
    let mut count = 0;
    let mut q = alpha[0] - x;
    if q < 0.0 {
        count += 1;
    }
    for i in 1..alpha.len() {
        if q == 0.0 {
            q = tiny;
        }
        q = alpha[i] - x - beta[i - 1] * beta[i - 1] / q;
        if q < 0.0 {
            count += 1;
        }
    }
    count
}

/// Gershgorin interval containing the spectrum of T
fn gershgorin(alpha: &[f64], beta: &[f64]) -> (f64, f64) {
    let m = alpha.len();
    let mut lo = f64::INFINITY;
    let mut hi = f64::NEG_INFINITY;
    for i in 0..m {
        let mut r = 0.0;
        if i > 0 {
            r += beta[i - 1].abs();
        }
        if i + 1 < m {
            r += beta[i].abs();
        }
        lo = lo.min(alpha[i] - r);
        hi = hi.max(alpha[i] + r);
    }
    (lo, hi)
}

/// The `k`th smallest eigenvalue (0 based) by Sturm sequence bisection
fn bisect_one(alpha: &[f64], beta: &[f64], k: usize, tol: f64, lo: f64, hi: f64) -> Option<f64> {
    let (mut lo, mut hi) = (lo, hi);
    for _ in 0..BISECT_MAXITER {
        let width_tol = tol.max(2.0 * DOUBLE_EPSILON * lo.abs().max(hi.abs()));
        if hi - lo <= width_tol {
            return Some(0.5 * (lo + hi));
        }
        let mid = 0.5 * (lo + hi);
        if sturm_count(alpha, beta, mid) > k {
            hi = mid;
        } else {
            lo = mid;
        }
    }
    None
}

/// The `nleft` smallest and `nright` largest eigenvalues by bisection
pub fn bisect(
    alpha: &[f64],
    beta: &[f64],
    nleft: usize,
    nright: usize,
    tol: f64,
) -> Option<RitzVals> {
    let m = alpha.len();
    if alpha.iter().chain(beta).any(|x| !x.is_finite()) {
        return None;
    }
    let (lo, hi) = gershgorin(alpha, beta);
    let (lo, hi) = (lo - tol, hi + tol);
    let nleft = nleft.min(m);
    let nright = nright.min(m - nleft);

    let mut vals = RitzVals::default();
    for k in 0..nleft {
        vals.left.push(bisect_one(alpha, beta, k, tol, lo, hi)?);
    }
    for k in (m - nright)..m {
        vals.right.push(bisect_one(alpha, beta, k, tol, lo, hi)?);
    }
    Some(vals)
}

/// Computes Ritz values at the two ends of the spectrum of T, choosing between bisection and QL
/// by estimated cost. The other method is tried if the first one fails.
pub fn get_ritzvals(
    alpha: &[f64],
    beta: &[f64],
    nleft: usize,
    nright: usize,
    tol: f64,
    dbglvl: u32,
) -> Result<RitzVals> {
    let m = alpha.len();
    let nleft = nleft.min(m);
    let nright = nright.min(m - nleft);

    let (lo, hi) = gershgorin(alpha, beta);
    let steps = ((hi - lo).abs().max(tol) / tol.max(f64::MIN_POSITIVE))
        .log2()
        .clamp(1.0, BISECT_MAXITER as f64);
    let bisect_cost = (nleft + nright) as f64 * m as f64 * steps;
    let ql_cost = 3.0 * (m * m) as f64;

    let from_ql = |all: Vec<f64>| RitzVals {
        left: all[..nleft].to_vec(),
        right: all[m - nright..].to_vec(),
    };

    let vals = if bisect_cost < ql_cost {
        ifset!(dbglvl, DbgLvl::Lanczos, debug!("get_ritzvals: bisection, m = {m}"));
        bisect(alpha, beta, nleft, nright, tol).or_else(|| {
            warn!("Sturm bisection failed, trying QL");
            ql(alpha, beta).map(from_ql)
        })
    } else {
        ifset!(dbglvl, DbgLvl::Lanczos, debug!("get_ritzvals: QL, m = {m}"));
        ql(alpha, beta).map(from_ql).or_else(|| {
            warn!("QL failed, trying Sturm bisection");
            bisect(alpha, beta, nleft, nright, tol)
        })
    };

    vals.ok_or(ChacoError::RitzValues)
}

/// Solves (d + diag) x = b for a tridiagonal matrix with partial pivoting, in place in `b`
pub(crate) fn tri_solve(d: &[f64], e: &[f64], b: &mut [f64], tiny: f64) {
    let m = d.len();
    if m == 1 {
        let piv = if d[0] == 0.0 { tiny } else { d[0] };
        b[0] /= piv;
        return;
    }
    let mut dd = d.to_vec();
    let mut du = e.to_vec();
    let mut du2 = vec![0.0; m];
    for i in 0..m - 1 {
        let dl = e[i];
        if dd[i].abs() >= dl.abs() {
            if dd[i] == 0.0 {
                dd[i] = tiny;
            }
            let fact = dl / dd[i];
            dd[i + 1] -= fact * du[i];
            b[i + 1] -= fact * b[i];
        } else {
            let fact = dd[i] / dl;
            dd[i] = dl;
            let temp = dd[i + 1];
            dd[i + 1] = du[i] - fact * temp;
            if i + 2 < m {
                du2[i] = du[i + 1];
                du[i + 1] = -fact * du2[i];
            }
            du[i] = temp;
            let temp = b[i];
            b[i] = b[i + 1];
            b[i + 1] = temp - fact * b[i + 1];
        }
    }
    if dd[m - 1] == 0.0 {
        dd[m - 1] = tiny;
    }

    b[m - 1] /= dd[m - 1];
    b[m - 2] = (b[m - 2] - du[m - 2] * b[m - 1]) / dd[m - 2];
    for i in (0..m.saturating_sub(2)).rev() {
        b[i] = (b[i] - du[i] * b[i + 1] - du2[i] * b[i + 2]) / dd[i];
    }
}

/// Eigenvector of T for the eigenvalue estimate `theta` by inverse iteration. Returns the unit
/// vector and its residual `||T s - theta s||`.
pub fn tevec(alpha: &[f64], beta: &[f64], theta: f64) -> (Vec<f64>, f64) {
    let m = alpha.len();
    let nrm = tri_norm(alpha, beta).max(f64::MIN_POSITIVE);
    let tiny = DOUBLE_EPSILON * nrm;
    let d: Vec<f64> = alpha.iter().map(|&a| a - theta).collect();

    let mut s: Vec<f64> = (0..m).map(|i| 1.0 + 0.01 * (i % 7) as f64).collect();
    for _ in 0..3 {
        tri_solve(&d, beta, &mut s, tiny);
        let n = s.iter().map(|x| x * x).sum::<f64>().sqrt();
        if !(n.is_finite() && n > 0.0) {
            s = vec![0.0; m];
            s[0] = 1.0;
            break;
        }
        s.iter_mut().for_each(|x| *x /= n);
    }

    let mut res = 0.0;
    for i in 0..m {
        let mut ts = d[i] * s[i];
        if i > 0 {
            ts += beta[i - 1] * s[i - 1];
        }
        if i + 1 < m {
            ts += beta[i] * s[i + 1];
        }
        res += ts * ts;
    }
    (s, res.sqrt())
}

/// `T s` for the tridiagonal matrix with diagonal `alpha` and off diagonal `beta`
fn tri_apply(alpha: &[f64], beta: &[f64], s: &[f64]) -> Vec<f64> {
    let m = alpha.len();
    (0..m)
        .map(|i| {
            let mut ts = alpha[i] * s[i];
            if i > 0 {
                ts += beta[i - 1] * s[i - 1];
            }
            if i + 1 < m {
                ts += beta[i] * s[i + 1];
            }
            ts
        })
        .collect()
}

/// Rayleigh quotient `s^T T s / s^T s`
pub fn tri_rayleigh(alpha: &[f64], beta: &[f64], s: &[f64]) -> f64 {
    let ts = tri_apply(alpha, beta, s);
    let num: f64 = ts.iter().zip(s).map(|(a, b)| a * b).sum();
    let den: f64 = s.iter().map(|x| x * x).sum();
    if den > 0.0 {
        num / den
    } else {
        0.0
    }
}

/// `||T s - theta s||`
fn tri_residual(alpha: &[f64], beta: &[f64], s: &[f64], theta: f64) -> f64 {
    tri_apply(alpha, beta, s)
        .iter()
        .zip(s)
        .map(|(ts, x)| (ts - theta * x).powi(2))
        .sum::<f64>()
        .sqrt()
}

/// Ritz pairs at both ends of T, with the Paige bound computed from `beta_next`, the norm of the
/// latest Lanczos residual.
///
/// When an eigenvector of T comes out inaccurate the bisection safety factor in `ctrl` is raised
/// and the Ritz values recomputed with a tighter tolerance.
pub fn ritz_pairs(
    ctrl: &mut Ctrl,
    alpha: &[f64],
    beta: &[f64],
    beta_next: f64,
    nleft: usize,
    nright: usize,
) -> Result<(Vec<RitzPair>, Vec<RitzPair>)> {
    let m = alpha.len();
    let nrm = tri_norm(alpha, beta).max(f64::MIN_POSITIVE);
    loop {
        let reltol = RITZ_RELTOL.min(ctrl.params.eigtol);
        let tol = (nrm * reltol / ctrl.bisection_safety).max(4.0 * DOUBLE_EPSILON * nrm);
        let vals = get_ritzvals(alpha, beta, nleft, nright, tol, ctrl.dbglvl)?;

        let mut maxres = 0.0f64;
        let mut make = |theta: f64| {
            let (s, _) = tevec(alpha, beta, theta);
            // the bisection interval brackets the eigenvalue, the quotient stays inside it
            let rq = tri_rayleigh(alpha, beta, &s);
            let theta = if (rq - theta).abs() <= tol { rq } else { theta };
            maxres = maxres.max(tri_residual(alpha, beta, &s, theta));
            RitzPair {
                theta,
                bji: beta_next * s[m - 1].abs(),
                s,
            }
        };
        let left: Vec<_> = vals.left.iter().map(|&t| make(t)).collect();
        let right: Vec<_> = vals.right.iter().map(|&t| make(t)).collect();

        let restol = TEVEC_RELTOL.min(ctrl.params.eigtol) * nrm;
        if maxres <= restol || ctrl.bisection_safety >= MAX_BISECTION_SAFETY {
            return Ok((left, right));
        }
        ctrl.bisection_safety = (ctrl.bisection_safety * 10.0).min(MAX_BISECTION_SAFETY);
        warn!(
            "tridiagonal eigenvector residual {maxres:.3e} too large; bisection safety raised to {:e}",
            ctrl.bisection_safety
        );
    }
}
