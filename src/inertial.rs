/*
\file
\brief Inertial partitioning: principal axes of the vertex coordinates.

The vertex weighted inertia tensor of the coordinates is diagonalized with cyclic Jacobi
rotations. Projections of the centered coordinates onto the axes of largest spread play the role
the eigenvectors play in spectral partitioning.
*/

use std::time::Instant;

use log::debug;

use crate::defs::JACOBI_MAXSWEEP;
use crate::graph::Graph;
use crate::options::{Ctrl, DbgLvl};
use crate::timing::Timer;

/// Eigen decomposition of a small symmetric matrix by cyclic Jacobi rotations.
///
/// Returns the eigenvalues and the eigenvectors as rows, sorted by decreasing eigenvalue.
pub fn jacobi(mut a: Vec<Vec<f64>>) -> (Vec<f64>, Vec<Vec<f64>>) {
    let n = a.len();
    let mut v: Vec<Vec<f64>> = (0..n)
        .map(|i| (0..n).map(|j| if i == j { 1.0 } else { 0.0 }).collect())
        .collect();

    for _ in 0..JACOBI_MAXSWEEP {
        let off: f64 = (0..n)
            .flat_map(|i| (i + 1..n).map(move |j| (i, j)))
            .map(|(i, j)| a[i][j] * a[i][j])
            .sum();
        let diag: f64 = (0..n).map(|i| a[i][i] * a[i][i]).sum();
        if off <= f64::EPSILON * f64::EPSILON * diag.max(f64::MIN_POSITIVE) {
            break;
        }
        for p in 0..n {
            for q in p + 1..n {
                if a[p][q] == 0.0 {
                    continue;
                }
                let theta = (a[q][q] - a[p][p]) / (2.0 * a[p][q]);
                let t = theta.signum() / (theta.abs() + (theta * theta + 1.0).sqrt());
                let t = if theta == 0.0 { 1.0 } else { t };
                let c = 1.0 / (t * t + 1.0).sqrt();
                let s = t * c;
                for k in 0..n {
                    let akp = a[k][p];
                    let akq = a[k][q];
                    a[k][p] = c * akp - s * akq;
                    a[k][q] = s * akp + c * akq;
                }
                for k in 0..n {
                    let apk = a[p][k];
                    let aqk = a[q][k];
                    a[p][k] = c * apk - s * aqk;
                    a[q][k] = s * apk + c * aqk;
                }
                for row in v.iter_mut() {
                    let vp = row[p];
                    let vq = row[q];
                    row[p] = c * vp - s * vq;
                    row[q] = s * vp + c * vq;
                }
            }
        }
    }

    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&i, &j| a[j][j].total_cmp(&a[i][i]));
    let evals = order.iter().map(|&i| a[i][i]).collect();
    // eigenvectors are the columns of v
    let evecs = order
        .iter()
        .map(|&i| (0..n).map(|k| v[k][i]).collect())
        .collect();
    (evals, evecs)
}

/// Projections of the vertex coordinates onto their principal axes, largest spread first.
///
/// One vector per coordinate axis comes back; the caller uses as many as it cuts along.
pub fn inertial(ctrl: &mut Ctrl, graph: &Graph, coords: &[Vec<f64>]) -> Vec<Vec<f64>> {
    let start = Instant::now();
    let igeom = coords.len();
    let nvtxs = graph.nvtxs();
    let total = graph.total_vwgt() as f64;

    let center: Vec<f64> = coords
        .iter()
        .map(|axis| {
            graph
                .vtxs
                .iter()
                .zip(axis)
                .map(|(v, x)| v.vwgt as f64 * x)
                .sum::<f64>()
                / total
        })
        .collect();

    let mut tensor = vec![vec![0.0; igeom]; igeom];
    for v in 0..nvtxs {
        let w = graph.vtxs[v].vwgt as f64;
        for i in 0..igeom {
            let di = coords[i][v] - center[i];
            for j in i..igeom {
                tensor[i][j] += w * di * (coords[j][v] - center[j]);
            }
        }
    }
    for i in 0..igeom {
        for j in 0..i {
            tensor[i][j] = tensor[j][i];
        }
    }

    let (evals, axes) = jacobi(tensor);
    ifset!(
        ctrl.dbglvl,
        DbgLvl::Assign,
        debug!("inertial: center {center:?}, moments {evals:?}, axes {axes:?}")
    );

    let proj = axes
        .iter()
        .map(|axis| {
            (0..nvtxs)
                .map(|v| (0..igeom).map(|k| axis[k] * (coords[k][v] - center[k])).sum())
                .collect()
        })
        .collect();
    ctrl.timers.add(Timer::Inertial, start);
    proj
}
