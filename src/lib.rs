#![allow(clippy::needless_range_loop, clippy::too_many_arguments)]

//! Multilevel spectral graph partitioning.
//!
//! A graph is split into the sets of a target [`Architecture`] by recursive division. Each step
//! cuts the current piece into 2, 4 or 8 parts with a global method (multilevel Kernighan-Lin,
//! spectral, inertial or a simple ordering) and improves it with Kernighan-Lin. The final
//! assignment can be refined pairwise, pushed toward internal vertices, or turned into a vertex
//! separator. Start at [`partition`].

#[macro_use]
pub mod util;

pub mod error;
pub mod defs;
pub mod options;
pub mod timing;

pub mod graph;
pub mod checkgraph;
pub mod connected;

pub mod blas;
pub mod operator;
pub mod minres;
pub mod tridiag;
pub mod orthog;
pub mod lanczos_fo;
pub mod lanczos_so;
pub mod lanczos_ext;
pub mod rqi;
pub mod eigensolve;

pub mod bucketsort;
pub mod matching;
pub mod coarsen;
pub mod interpolate;

pub(crate) mod pqueue;
pub mod median;
pub mod mapper;
pub mod inertial;
pub mod simple;
pub mod assign;

pub mod klspiff;
pub mod klvspiff;
pub mod bpmatch;
pub mod bpm_improve;
pub mod separator;

pub mod arch;
pub mod coarsen_kl;
pub mod divide;
pub mod refine_part;
pub mod internal;
pub mod stat;
pub mod interface;

#[cfg(test)]
pub(crate) mod graph_gen;

pub use arch::Architecture;
pub use defs::SEPARATOR;
pub use error::{ChacoError, Result};
pub use graph::GraphInput;
pub use interface::{partition, Partition};
pub use options::{
    DbgLvl, EigenMethod, GlobalMethod, LanczosVariant, LocalMethod, MappingType, MatchType,
    Params, Precision,
};
pub use stat::PartitionReport;

#[cfg(test)]
mod tests;
