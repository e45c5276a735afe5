/*
\file
\brief Recursive division of a graph onto the sets of a target architecture.

Every step takes a region of final sets (a subcube or a mesh sub-box) together with the vertices
headed there, splits the region into 2^k children and divides the induced subgraph into matching
local sets. Regions wait on an explicit stack. With terminal propagation on, edges to vertices
already sent elsewhere become costs that pull each vertex toward the nearer children.
*/

use log::debug;

use crate::arch::{Architecture, SetRegion};
use crate::assign::assign;
use crate::coarsen_kl::coarsen_kl;
use crate::eigensolve::eigensolve;
use crate::error::{ChacoError, Result};
use crate::graph::{make_subgraph, Graph};
use crate::inertial::inertial;
use crate::klspiff::{hop_matrix, nway_kl};
use crate::options::{Ctrl, DbgLvl, GlobalMethod, LocalMethod};
use crate::simple::{simple_linear, simple_part};

/// Divides `graph` into `2^ndims` local sets with the configured global method followed by KL.
///
/// Graphs with no more vertices than sets are filled linearly.
pub fn divide(
    ctrl: &mut Ctrl,
    graph: &Graph,
    goals: &[f64],
    ndims: usize,
    coords: Option<&[Vec<f64>]>,
    term: Option<&[Vec<f64>]>,
) -> Result<Vec<usize>> {
    let nsets = 1 << ndims;
    debug_assert_eq!(goals.len(), nsets);
    if graph.nvtxs() <= nsets {
        return Ok(simple_linear(graph, goals));
    }

    let method = ctrl.params.global_method;
    let mut assignment = match method {
        GlobalMethod::MultilevelKl => {
            return coarsen_kl(ctrl, graph, goals, ndims, coords, term);
        }
        GlobalMethod::Spectral => {
            let spectral = eigensolve(ctrl, graph, ndims, coords, term)?;
            assign(ctrl, graph, &spectral.yvecs, goals, ndims)
        }
        GlobalMethod::Inertial => {
            let coords = coords.ok_or_else(|| {
                ChacoError::InvalidInput("inertial division needs vertex coordinates".into())
            })?;
            let axes = inertial(ctrl, graph, coords);
            assign(ctrl, graph, &axes, goals, ndims)
        }
        GlobalMethod::Linear | GlobalMethod::Random | GlobalMethod::Scattered => {
            simple_part(ctrl, graph, goals, method)
        }
        GlobalMethod::Provided => {
            return Err(ChacoError::InvalidParams(
                "a provided assignment is never divided".into(),
            ))
        }
    };

    if ctrl.params.local_method == LocalMethod::Kl {
        nway_kl(ctrl, graph, &mut assignment, goals, term, &hop_matrix(nsets));
    }
    Ok(assignment)
}

/// Terminal costs `term[child][local vertex]` for dividing the vertices of `region`.
///
/// Returns `None` when no vertex has a neighbor outside the region.
fn terminal_costs(
    arch: &Architecture,
    graph: &Graph,
    vertices: &[usize],
    region: SetRegion,
    kids: &[SetRegion],
    region_of: &[SetRegion],
    cut_to_hop_cost: f64,
) -> Option<Vec<Vec<f64>>> {
    let mut term = vec![vec![0.0; vertices.len()]; kids.len()];
    let mut any = false;
    for (l, &v) in vertices.iter().enumerate() {
        for (u, w) in graph.vtxs[v].adj() {
            if region_of[u] == region {
                continue;
            }
            for (k, &kid) in kids.iter().enumerate() {
                let d = arch.region_distance(kid, region_of[u]);
                if d > 0 {
                    term[k][l] += cut_to_hop_cost * w as f64 * d as f64;
                    any = true;
                }
            }
        }
    }
    any.then_some(term)
}

/// Sum of the final set goals in `region`
fn region_goal(arch: &Architecture, region: SetRegion, goals: &[f64]) -> f64 {
    arch.sets(region).iter().map(|&s| goals[s]).sum()
}

/// Recursively divides `graph` onto the sets of `arch`. Returns the final set of every vertex.
pub fn recurse(
    ctrl: &mut Ctrl,
    graph: &Graph,
    arch: &Architecture,
    goals: &[f64],
    coords: Option<&[Vec<f64>]>,
) -> Result<Vec<usize>> {
    let nvtxs = graph.nvtxs();
    let ndims = ctrl.params.ndims;
    let mut assignment = vec![0; nvtxs];
    let mut region_of = vec![arch.root(); nvtxs];
    let mut glob2loc: Vec<Option<usize>> = vec![None; nvtxs];

    let mut stack: Vec<(SetRegion, Vec<usize>)> = vec![(arch.root(), (0..nvtxs).collect())];
    while let Some((region, vertices)) = stack.pop() {
        if region.is_final() {
            if let Some(&set) = arch.sets(region).first() {
                for &v in &vertices {
                    assignment[v] = set;
                }
            }
            continue;
        }
        if vertices.is_empty() {
            continue;
        }

        let kids = arch.split(region, ndims);
        let step = kids.len().trailing_zeros() as usize;

        // goals of the children, scaled to the weight that actually arrived here
        let mut kid_goals: Vec<f64> = kids.iter().map(|&r| region_goal(arch, r, goals)).collect();
        let want: f64 = kid_goals.iter().sum();
        let have: f64 = vertices.iter().map(|&v| graph.vtxs[v].vwgt as f64).sum();
        if want > 0.0 {
            kid_goals.iter_mut().for_each(|g| *g *= have / want);
        }

        let sub = make_subgraph(graph, &vertices, &mut glob2loc);
        let scoords: Option<Vec<Vec<f64>>> =
            coords.map(|c| c.iter().map(|axis| sub.gather(axis)).collect());
        let term = if ctrl.params.term_prop {
            terminal_costs(
                arch,
                graph,
                &vertices,
                region,
                &kids,
                &region_of,
                ctrl.params.cut_to_hop_cost,
            )
        } else {
            None
        };

        let local = divide(
            ctrl,
            &sub.graph,
            &kid_goals,
            step,
            scoords.as_deref(),
            term.as_deref(),
        )?;

        ifset!(
            ctrl.dbglvl,
            DbgLvl::Info,
            debug!(
                "divided {} vertices of {region:?} into {} sets, weights {:?}, cut {}",
                vertices.len(),
                kids.len(),
                sub.graph.set_weights(&local, kids.len()),
                sub.graph.cut_size(&local)
            )
        );

        let mut parts: Vec<Vec<usize>> = vec![Vec::new(); kids.len()];
        for (&v, &l) in vertices.iter().zip(&local) {
            parts[l].push(v);
            region_of[v] = kids[l];
        }
        for (kid, part) in kids.into_iter().zip(parts).rev() {
            stack.push((kid, part));
        }
    }

    Ok(assignment)
}
