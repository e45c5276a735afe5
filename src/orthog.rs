//! Growable lists of unit vectors that later vectors are kept orthogonal to.

use crate::blas::{axpy, dot, normalize, Scalar};

/// Previously computed unit vectors (Lanczos or Ritz vectors), released with the solver.
#[derive(Debug, Clone, Default)]
pub struct OrthList<F: Scalar> {
    vecs: Vec<Vec<F>>,
}

impl<F: Scalar> OrthList<F> {
    pub fn new() -> Self {
        Self { vecs: Vec::new() }
    }

    pub fn len(&self) -> usize {
        self.vecs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vecs.is_empty()
    }

    /// Adds a vector. Fails without side effects if the list cannot grow.
    pub fn try_push(&mut self, v: Vec<F>) -> Result<(), std::collections::TryReserveError> {
        self.vecs.try_reserve(1)?;
        self.vecs.push(v);
        Ok(())
    }

    pub fn get(&self, i: usize) -> &[F] {
        &self.vecs[i]
    }

    pub fn iter(&self) -> impl Iterator<Item = &[F]> {
        self.vecs.iter().map(|v| v.as_slice())
    }

    /// Gram-Schmidt of `x` against every vector in the list, twice when the first pass removed
    /// most of `x`.
    pub fn orthogonalize(&self, x: &mut [F]) {
        let before = dot(x, x);
        let mut removed = 0.0;
        for u in &self.vecs {
            let c = dot(x, u);
            removed += c * c;
            axpy(-c, u, x);
        }
        if removed > 0.5 * before {
            for u in &self.vecs {
                let c = dot(x, u);
                axpy(-c, u, x);
            }
        }
    }

    /// Orthogonalizes and normalizes `x`, then adds it to the list. Returns false when `x` was
    /// numerically inside the span of the list and nothing was added.
    pub fn add_orthogonal(&mut self, mut x: Vec<F>) -> bool {
        let before = dot(&x, &x).sqrt();
        self.orthogonalize(&mut x);
        let after = normalize(&mut x);
        if after <= 1.0e-8 * before || after == 0.0 {
            return false;
        }
        self.vecs.push(x);
        true
    }

    /// Largest |<x, u>| over the list
    pub fn max_overlap(&self, x: &[F]) -> f64 {
        self.vecs
            .iter()
            .map(|u| dot(x, u).abs())
            .fold(0.0, f64::max)
    }
}
