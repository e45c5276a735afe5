//! Moves eigenvectors from a coarse graph to the next finer one.

use crate::blas::{normalize, orthog1};
use crate::operator::Laplacian;

/// Interpolates coarse partition coordinates `yvecs` onto the graph of `fine`.
///
/// Each fine vertex takes the value of its coarse vertex, then one edge weighted Gauss-Seidel
/// sweep smooths the result. The vectors come back in the scaling of `fine`'s operator,
/// orthonormalized against its null vector and against each other, in order.
pub fn interpolate(fine: &Laplacian, v2cv: &[usize], yvecs: &[Vec<f64>]) -> Vec<Vec<f64>> {
    let graph = fine.graph();
    let mut out: Vec<Vec<f64>> = Vec::with_capacity(yvecs.len());

    for ycoarse in yvecs {
        let mut y: Vec<f64> = v2cv.iter().map(|&cv| ycoarse[cv]).collect();

        for (v, vtx) in graph.vtxs.iter().enumerate() {
            let mut sum = 0.0;
            let mut wsum = 0.0;
            for (u, w) in vtx.adj() {
                sum += w as f64 * y[u];
                wsum += w as f64;
            }
            if wsum > 0.0 {
                y[v] = sum / wsum;
            }
        }

        let mut x = fine.from_coords(&y);
        orthog1(&mut x, fine.null());
        for prev in &out {
            orthog1(&mut x, prev);
        }
        normalize(&mut x);
        out.push(x);
    }
    out
}
