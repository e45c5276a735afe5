/*
\file
\brief The public entry point of the partitioner.
*/

use std::time::Instant;

use log::{debug, info};

use crate::arch::Architecture;
use crate::checkgraph::{check_graph_errors, check_input};
use crate::defs::{SEPARATOR, SEP_SIDE};
use crate::divide::recurse;
use crate::error::{ChacoError, Result};
use crate::graph::{Graph, GraphInput};
use crate::internal::force_internal;
use crate::klspiff::nway_kl;
use crate::options::{Counters, Ctrl, DbgLvl, GlobalMethod, LocalMethod, Params};
use crate::refine_part::refine_part;
use crate::separator::find_separator;
use crate::stat::{countup, PartitionReport};
use crate::timing::{Timer, Timers};

/// Result of a partitioning run
#[derive(Debug, Clone)]
pub struct Partition {
    /// final set of every vertex; `SEPARATOR` marks separator vertices
    pub assignment: Vec<usize>,
    /// present when `output_metrics` is set
    pub report: Option<PartitionReport>,
    pub timers: Timers,
    pub counters: Counters,
}

/// Partitions a graph onto the sets of `arch`.
///
/// `coords` are optional vertex coordinates (one vector per axis), `goals` the desired weight of
/// every final set (equal split when `None`) and `initial` a starting assignment, required when
/// the global method is [`GlobalMethod::Provided`].
pub fn partition(
    input: &GraphInput,
    coords: Option<&[Vec<f64>]>,
    arch: Architecture,
    goals: Option<&[f64]>,
    params: Params,
    initial: Option<&[usize]>,
) -> Result<Partition> {
    params.check_params()?;
    arch.check()?;

    let graph = Graph::from_csr(input)?;
    let nerrs = check_graph_errors(&graph);
    if nerrs > 0 {
        return Err(ChacoError::InvalidGraph(nerrs));
    }

    let nsets_tot = arch.nsets_tot();
    let goals: Vec<f64> = match goals {
        Some(g) => g.to_vec(),
        None => vec![graph.total_vwgt() as f64 / nsets_tot as f64; nsets_tot],
    };
    check_input(&graph, &params, nsets_tot, &goals, coords, initial)?;
    if params.vertex_separator && nsets_tot != 2 {
        return Err(ChacoError::InvalidParams(format!(
            "vertex separators need exactly 2 sets, got {nsets_tot}"
        )));
    }

    let nvtxs = graph.nvtxs();
    let neigs = match arch {
        Architecture::Hypercube { ndims_tot } => params.ndims.min(ndims_tot),
        Architecture::Mesh { .. } => usize::from(nsets_tot > 1),
    };
    if params.needs_eigensolver() && neigs > 0 && nvtxs <= neigs {
        return Err(ChacoError::TooSmall { nvtxs, neigs });
    }

    let mut ctrl = Ctrl::new(params);
    ctrl.timers.init_timers();
    let start = Instant::now();
    ctrl.print_ctrl();
    ifset!(
        ctrl.dbglvl,
        DbgLvl::Input,
        debug!(
            "graph: {nvtxs} vertices, {} edges, total weight {}, {nsets_tot} sets {arch:?}",
            graph.nedges,
            graph.total_vwgt()
        )
    );

    let mut assignment = match (ctrl.params.global_method, initial) {
        (GlobalMethod::Provided, Some(initial)) => {
            let mut assignment = initial.to_vec();
            if ctrl.params.local_method == LocalMethod::Kl {
                let hop: Vec<Vec<usize>> = (0..nsets_tot)
                    .map(|a| (0..nsets_tot).map(|b| arch.hops(a, b)).collect())
                    .collect();
                nway_kl(&mut ctrl, &graph, &mut assignment, &goals, None, &hop);
            }
            assignment
        }
        _ => recurse(&mut ctrl, &graph, &arch, &goals, coords)?,
    };

    if ctrl.params.refine_partition > 0 {
        refine_part(&mut ctrl, &graph, &arch, &mut assignment, &goals);
    }
    if ctrl.params.internal_vertices {
        force_internal(&mut ctrl, &graph, &mut assignment, &goals);
    }
    if ctrl.params.vertex_separator {
        let sides = find_separator(&mut ctrl, &graph, &assignment, &goals);
        assignment = sides
            .into_iter()
            .map(|s| if s == SEP_SIDE { SEPARATOR } else { s })
            .collect();
    }

    ctrl.timers.add(Timer::Total, start);

    let report = ctrl
        .params
        .output_metrics
        .then(|| countup(&graph, &assignment, &goals, &arch));
    if let Some(report) = &report {
        info!("{report}");
    }
    ifset!(ctrl.dbglvl, DbgLvl::Time, info!("{}", ctrl.timers));
    ifset!(ctrl.dbglvl, DbgLvl::Info, info!("{:?}", ctrl.counters));

    Ok(Partition {
        assignment,
        report,
        timers: ctrl.timers,
        counters: ctrl.counters,
    })
}
