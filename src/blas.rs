//! Level 1 vector kernels used by the eigensolvers, generic over the storage precision.

use std::fmt::Debug;
use std::iter::Sum;

use num_traits::Float;

/// Floating point type a Lanczos vector can be stored in
pub trait Scalar: Float + Sum + Debug + Default + Send + Sync + 'static {
    fn of(x: f64) -> Self;
    fn as_f64(self) -> f64;
}

impl Scalar for f32 {
    #[inline(always)]
    fn of(x: f64) -> Self {
        x as f32
    }
    #[inline(always)]
    fn as_f64(self) -> f64 {
        self as f64
    }
}

impl Scalar for f64 {
    #[inline(always)]
    fn of(x: f64) -> Self {
        x
    }
    #[inline(always)]
    fn as_f64(self) -> f64 {
        self
    }
}

/// Dot product, accumulated in double precision
#[inline]
pub fn dot<F: Scalar>(x: &[F], y: &[F]) -> f64 {
    debug_assert_eq!(x.len(), y.len());
    x.iter()
        .zip(y)
        .map(|(&a, &b)| a.as_f64() * b.as_f64())
        .sum()
}

/// Dot product of a double vector with a vector of any precision
#[inline]
pub fn dot_mixed<F: Scalar>(x: &[f64], y: &[F]) -> f64 {
    debug_assert_eq!(x.len(), y.len());
    x.iter().zip(y).map(|(&a, &b)| a * b.as_f64()).sum()
}

#[inline]
pub fn norm<F: Scalar>(x: &[F]) -> f64 {
    dot(x, x).sqrt()
}

/// ?axpy routine - computes y += alpha * x
#[inline]
pub fn axpy<F: Scalar>(alpha: f64, x: &[F], y: &mut [F]) {
    debug_assert_eq!(x.len(), y.len());
    let alpha = F::of(alpha);
    for (y, &x) in y.iter_mut().zip(x) {
        *y = *y + alpha * x;
    }
}

#[inline]
pub fn scale<F: Scalar>(alpha: f64, x: &mut [F]) {
    let alpha = F::of(alpha);
    for x in x.iter_mut() {
        *x = *x * alpha;
    }
}

/// Scales `x` to unit length and returns its former norm. A zero vector is left untouched.
pub fn normalize<F: Scalar>(x: &mut [F]) -> f64 {
    let nrm = norm(x);
    if nrm > 0.0 {
        scale(1.0 / nrm, x);
    }
    nrm
}

/// Removes the component of `x` along the unit vector `u`
#[inline]
pub fn orthog1<F: Scalar>(x: &mut [F], u: &[F]) {
    let c = dot(x, u);
    axpy(-c, u, x);
}

/// Removes the component of `x` along the unit double vector `u`
#[inline]
pub fn orthog1_mixed<F: Scalar>(x: &mut [F], u: &[f64]) {
    let c = dot_mixed(u, x);
    for (x, &u) in x.iter_mut().zip(u) {
        *x = *x - F::of(c * u);
    }
}

/// Converts between precisions
pub fn convert<F: Scalar, G: Scalar>(x: &[F]) -> Vec<G> {
    x.iter().map(|&a| G::of(a.as_f64())).collect()
}

/// Unit vector orthogonal to which every eigenvector must be. All ones normalized for a graph
/// without vertex weights, otherwise the normalized square roots of the weights.
pub fn null_vector(vwsqrt: Option<&[f64]>, n: usize) -> Vec<f64> {
    let mut u = match vwsqrt {
        Some(w) => w.to_vec(),
        None => vec![1.0; n],
    };
    normalize(&mut u);
    u
}
