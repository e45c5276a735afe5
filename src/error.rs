//! Fatal conditions that stop a partitioning run.
//!
//! Recoverable situations (coarsening stalls, Lanczos memory budget after a checkpoint, missing
//! refinement scratch space) are handled inside the component that detects them and only ever
//! show up as `log::warn!` lines.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ChacoError {
    /// The eigenproblem needs more vertices than the graph has.
    #[error("graph is too small: {nvtxs} vertices cannot provide {neigs} eigenvector(s)")]
    TooSmall { nvtxs: usize, neigs: usize },

    /// Neither tridiagonal eigenvalue method produced Ritz values.
    #[error("Sturm bisection and QL both failed")]
    RitzValues,

    /// The right hand side of the extended eigenproblem is degenerate and no fallback was allowed.
    #[error("degenerate right hand side in extended eigenproblem")]
    DegenerateExtended,

    /// Coarsening floor cannot support the requested division.
    #[error("coarsening floor vmax = {vmax} is too small; at least {min} is needed")]
    CoarseningFloor { vmax: usize, min: usize },

    /// The input graph breaks the adjacency invariants.
    #[error("input graph failed the consistency check with {0} error(s)")]
    InvalidGraph(usize),

    /// Malformed input arrays.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Set goals disagree with the graph weight.
    #[error("set goals sum to {goal_sum}, but the total vertex weight is {vwgt_sum}")]
    GoalMismatch { goal_sum: f64, vwgt_sum: f64 },

    /// Parameter combination is not supported.
    #[error("invalid parameters: {0}")]
    InvalidParams(String),

    /// Lanczos ran out of memory before reaching its first checkpoint.
    #[error("out of memory in Lanczos iteration before the first checkpoint (step {step})")]
    OutOfMemory { step: usize },
}

pub type Result<T> = std::result::Result<T, ChacoError>;
