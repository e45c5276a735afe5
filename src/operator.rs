//! The graph Laplacian as a linear operator.
//!
//! With vertex weights the operator is the normalized Laplacian `W^{-1/2} L W^{-1/2}`, whose null
//! vector is the square root of the weights. Partition coordinates are recovered from its
//! eigenvectors by dividing by that same vector.

use crate::blas::{null_vector, Scalar};
use crate::graph::Graph;
use crate::minres::{minres, MinresInfo};

/// A symmetric linear operator on double vectors
pub trait Operator {
    fn n(&self) -> usize;
    fn apply(&self, x: &[f64], y: &mut [f64]);
}

pub struct Laplacian<'a> {
    graph: &'a Graph,
    vwsqrt: Option<Vec<f64>>,
    null: Vec<f64>,
}

impl<'a> Laplacian<'a> {
    pub fn new(graph: &'a Graph) -> Self {
        let vwsqrt = graph.using_vwgts.then(|| graph.vwsqrt());
        let null = null_vector(vwsqrt.as_deref(), graph.nvtxs());
        Self {
            graph,
            vwsqrt,
            null,
        }
    }

    pub fn graph(&self) -> &Graph {
        self.graph
    }

    /// unit null vector
    pub fn null(&self) -> &[f64] {
        &self.null
    }

    pub fn vwsqrt(&self) -> Option<&[f64]> {
        self.vwsqrt.as_deref()
    }

    /// Gershgorin bound on the largest eigenvalue
    pub fn norm_bound(&self) -> f64 {
        let mut bound = 0.0f64;
        for v in &self.graph.vtxs {
            let d = 2.0 * v.ewgt_sum();
            let d = match self.vwsqrt {
                Some(_) => d / v.vwgt as f64,
                None => d,
            };
            bound = bound.max(d);
        }
        bound
    }

    /// y = L x in the precision of the vectors
    pub fn splarax<F: Scalar>(&self, x: &[F], y: &mut [F]) {
        debug_assert_eq!(x.len(), self.graph.nvtxs());
        match &self.vwsqrt {
            None => {
                for (i, v) in self.graph.vtxs.iter().enumerate() {
                    let mut sum = F::of(v.ewgt_sum()) * x[i];
                    if v.ewgts.is_empty() {
                        for &j in v.neighbors() {
                            sum = sum - x[j];
                        }
                    } else {
                        for (k, &j) in v.edges.iter().enumerate().skip(1) {
                            sum = sum - F::of(v.ewgts[k] as f64) * x[j];
                        }
                    }
                    y[i] = sum;
                }
            }
            Some(vwsqrt) => {
                for (i, v) in self.graph.vtxs.iter().enumerate() {
                    let mut sum = v.ewgt_sum() * x[i].as_f64() / vwsqrt[i];
                    for (j, w) in v.adj() {
                        sum -= w as f64 * x[j].as_f64() / vwsqrt[j];
                    }
                    y[i] = F::of(sum / vwsqrt[i]);
                }
            }
        }
    }

    /// Partition coordinates of an eigenvector
    pub fn to_coords(&self, x: &[f64]) -> Vec<f64> {
        match &self.vwsqrt {
            Some(w) => x.iter().zip(w).map(|(&a, &s)| a / s).collect(),
            None => x.to_vec(),
        }
    }

    /// Inverse of [`Self::to_coords`]
    pub fn from_coords(&self, y: &[f64]) -> Vec<f64> {
        match &self.vwsqrt {
            Some(w) => y.iter().zip(w).map(|(&a, &s)| a * s).collect(),
            None => y.to_vec(),
        }
    }

    /// || L x - lambda x ||
    pub fn residual(&self, x: &[f64], lambda: f64) -> f64 {
        let mut work = vec![0.0; x.len()];
        self.splarax(x, &mut work);
        work.iter()
            .zip(x)
            .map(|(&lx, &xi)| (lx - lambda * xi).powi(2))
            .sum::<f64>()
            .sqrt()
    }
}

impl Operator for Laplacian<'_> {
    fn n(&self) -> usize {
        self.graph.nvtxs()
    }

    fn apply(&self, x: &[f64], y: &mut [f64]) {
        self.splarax(x, y)
    }
}

/// The pseudo-inverse of a Laplacian on the complement of its null vector, applied through an
/// inner MINRES solve.
pub struct InverseOperator<'a, 'g> {
    lap: &'a Laplacian<'g>,
    rtol: f64,
    maxit: usize,
    steps: std::cell::Cell<usize>,
}

impl<'a, 'g> InverseOperator<'a, 'g> {
    pub fn new(lap: &'a Laplacian<'g>, rtol: f64, maxit: usize) -> Self {
        Self {
            lap,
            rtol,
            maxit,
            steps: std::cell::Cell::new(0),
        }
    }

    /// total inner MINRES iterations so far
    pub fn steps(&self) -> usize {
        self.steps.get()
    }
}

impl Operator for InverseOperator<'_, '_> {
    fn n(&self) -> usize {
        self.lap.n()
    }

    fn apply(&self, x: &[f64], y: &mut [f64]) {
        y.iter_mut().for_each(|v| *v = 0.0);
        let info: MinresInfo = minres(
            self.lap,
            0.0,
            x,
            y,
            &[self.lap.null()],
            self.rtol,
            self.maxit,
        );
        self.steps.set(self.steps.get() + info.iters);
    }
}
