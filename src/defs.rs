//! Constant definitions

/// Set id reported for vertex separator members.
pub const SEPARATOR: usize = usize::MAX;

/// Side id of separator vertices inside the two-sided separator refiners.
pub const SEP_SIDE: usize = 2;

/// Relative tolerance used when checking that the set goals sum to the graph weight.
pub const GOAL_TOLERANCE: f64 = 1.0e-6;

/// Machine precision used by the eigensolvers.
pub const DOUBLE_EPSILON: f64 = f64::EPSILON;

/// Below this norm a vector is treated as zero.
pub const ZERO_NORM: f64 = 1.0e-14;

/// Upper bound for the automatically increased bisection safety factor.
pub const MAX_BISECTION_SAFETY: f64 = 1.0e6;

/// Maximum number of implicit QL sweeps per eigenvalue.
pub const QL_MAXITER: usize = 30;

/// Maximum bisection steps per eigenvalue.
pub const BISECT_MAXITER: usize = 200;

/// Weight given to edges added to connect graph components.
pub const CONNECT_EWGT: f32 = 1.0;

/// Fractional edge weights are scaled so that the largest one maps to this integer in KL.
pub const KL_EWGT_RESOLUTION: f64 = 1000.0;

/// Number of rotations tried by the 2D assignment.
pub const MAP2D_NANGLES: usize = 16;

/// Number of samples per Euler angle tried by the 3D assignment.
pub const MAP3D_NANGLES: usize = 4;

/// Maximum number of inner Jacobi sweeps for the small inertia tensors.
pub const JACOBI_MAXSWEEP: usize = 50;

/// Relative tolerance (before the bisection safety divisor) for Ritz values found by bisection.
pub const RITZ_RELTOL: f64 = 1.0e-5;

/// Relative residual above which a tridiagonal eigenvector is considered inaccurate.
pub const TEVEC_RELTOL: f64 = 1.0e-6;
