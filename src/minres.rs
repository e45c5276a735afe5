/*
\file
\brief MINRES for shifted symmetric systems (A - shift I) x = b restricted to the complement of
a set of orthonormal vectors.

The shifted systems solved inside Rayleigh quotient iteration are indefinite and nearly
singular, so a Lanczos based minimum residual method is used rather than conjugate gradients.
*/

use crate::blas::{axpy, dot, norm, orthog1};
use crate::operator::Operator;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MinresInfo {
    pub iters: usize,
    /// estimate of the final residual norm
    pub rnorm: f64,
    pub converged: bool,
}

fn deflate(x: &mut [f64], basis: &[&[f64]]) {
    for u in basis {
        orthog1(x, u);
    }
}

/// Solves `(A - shift I) x = b` on the complement of `basis`.
///
/// `x` holds the initial guess on entry and the solution on return. Stops when the residual
/// falls below `rtol * ||b - (A - shift I) x0||` or after `maxit` iterations.
pub fn minres<O: Operator + ?Sized>(
    op: &O,
    shift: f64,
    b: &[f64],
    x: &mut [f64],
    basis: &[&[f64]],
    rtol: f64,
    maxit: usize,
) -> MinresInfo {
    let n = b.len();
    debug_assert_eq!(op.n(), n);

    deflate(x, basis);
    let mut r1 = vec![0.0; n];
    op.apply(x, &mut r1);
    for i in 0..n {
        r1[i] = b[i] - (r1[i] - shift * x[i]);
    }
    deflate(&mut r1, basis);

    let beta1 = norm(&r1);
    if beta1 == 0.0 {
        return MinresInfo {
            iters: 0,
            rnorm: 0.0,
            converged: true,
        };
    }

    let mut r2 = r1.clone();
    let mut y = r1.clone();
    let mut v = vec![0.0; n];
    let mut w = vec![0.0; n];
    let mut w1 = vec![0.0; n];
    let mut w2 = vec![0.0; n];

    let mut oldb = 0.0;
    let mut beta = beta1;
    let mut dbar = 0.0;
    let mut epsln = 0.0;
    let mut phibar = beta1;
    let mut cs = -1.0;
    let mut sn = 0.0;
    let tiny = f64::EPSILON * beta1;

    let mut itn = 0;
    let mut converged = false;
    while itn < maxit {
        itn += 1;

        let s = 1.0 / beta;
        for i in 0..n {
            v[i] = s * y[i];
        }
        op.apply(&v, &mut y);
        axpy(-shift, &v, &mut y);
        if itn >= 2 {
            axpy(-beta / oldb, &r1, &mut y);
        }
        let alfa = dot(&v, &y);
        axpy(-alfa / beta, &r2, &mut y);
        deflate(&mut y, basis);
        std::mem::swap(&mut r1, &mut r2);
        r2.copy_from_slice(&y);
        oldb = beta;
        beta = norm(&y);

        // plane rotation to eliminate the subdiagonal
        let oldeps = epsln;
        let delta = cs * dbar + sn * alfa;
        let gbar = sn * dbar - cs * alfa;
        epsln = sn * beta;
        dbar = -cs * beta;
        let gamma = (gbar * gbar + beta * beta).sqrt().max(f64::EPSILON);
        cs = gbar / gamma;
        sn = beta / gamma;
        let phi = cs * phibar;
        phibar *= sn;

        let denom = 1.0 / gamma;
        std::mem::swap(&mut w1, &mut w2);
        std::mem::swap(&mut w2, &mut w);
        for i in 0..n {
            w[i] = (v[i] - oldeps * w1[i] - delta * w2[i]) * denom;
        }
        axpy(phi, &w, x);

        if phibar <= rtol * beta1 {
            converged = true;
            break;
        }
        if beta <= tiny {
            // Krylov space exhausted, x is exact
            converged = true;
            break;
        }
    }

    MinresInfo {
        iters: itn,
        rnorm: phibar,
        converged,
    }
}
