//! Rayleigh quotient iteration for sharpening interpolated eigenvectors.

use log::debug;

use crate::blas::{dot, normalize, orthog1};
use crate::minres::minres;
use crate::operator::Laplacian;
use crate::options::{Ctrl, DbgLvl};

/// Relative accuracy of the inner shifted solves
const RQI_INNER_RTOL: f64 = 1.0e-3;

fn rayleigh(lap: &Laplacian, y: &[f64], work: &mut [f64]) -> (f64, f64) {
    lap.splarax(y, work);
    let theta = dot(y, work);
    let res = work
        .iter()
        .zip(y)
        .map(|(&ly, &yi)| (ly - theta * yi).powi(2))
        .sum::<f64>()
        .sqrt();
    (theta, res)
}

/// Refines the unit vector `y` in place toward an eigenvector of the Laplacian, keeping it
/// orthogonal to the null vector and to `deflate`. Returns the final Rayleigh quotient.
pub fn rqi(ctrl: &mut Ctrl, lap: &Laplacian, y: &mut [f64], deflate: &[&[f64]]) -> f64 {
    let n = y.len();
    let null = lap.null();
    let mut basis: Vec<&[f64]> = Vec::with_capacity(deflate.len() + 1);
    basis.push(null);
    basis.extend_from_slice(deflate);

    for u in &basis {
        orthog1(y, u);
    }
    normalize(y);

    let eigtol = ctrl.params.eigtol;
    let floor = 1.0e-6 * lap.norm_bound();
    let mut work = vec![0.0; n];
    let mut x = vec![0.0; n];
    let (mut theta, mut res) = rayleigh(lap, y, &mut work);

    for it in 0..ctrl.params.rqi_maxiter {
        if res <= eigtol * theta.abs().max(floor) {
            break;
        }
        x.iter_mut().for_each(|v| *v = 0.0);
        let info = minres(lap, theta, y, &mut x, &basis, RQI_INNER_RTOL, n);
        ctrl.counters.minres_steps += info.iters;
        ctrl.counters.rqi_iterations += 1;

        for u in &basis {
            orthog1(&mut x, u);
        }
        if normalize(&mut x) == 0.0 || x.iter().any(|v| !v.is_finite()) {
            break;
        }
        y.copy_from_slice(&x);
        (theta, res) = rayleigh(lap, y, &mut work);
        ifset!(
            ctrl.dbglvl,
            DbgLvl::Rqi,
            debug!(
                "rqi iteration {}: theta {theta:.8e}, residual {res:.3e}, {} inner steps",
                it + 1,
                info.iters
            )
        );
    }

    theta
}
