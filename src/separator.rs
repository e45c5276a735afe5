/*
\file
\brief Turns an edge bisection into a vertex separator.

The initial separator is either the boundary of one side or a minimum cover of the cut edges.
It is then improved with bipartite covers and, when local refinement is on, separator KL.
*/

use log::{debug, warn};

use crate::bpm_improve::bpm_improve;
use crate::bpmatch::Bipartite;
use crate::defs::SEP_SIDE;
use crate::graph::Graph;
use crate::klvspiff::{is_separator, nway_klv};
use crate::options::{Ctrl, DbgLvl, LocalMethod};

/// Minimum cover of the edges cut by the bisection `part`
fn cut_cover(graph: &Graph, part: &[usize]) -> Vec<usize> {
    let nvtxs = graph.nvtxs();
    let mut index: Vec<Option<usize>> = vec![None; nvtxs];
    let mut lverts = Vec::new();
    let mut rverts = Vec::new();
    for v in 0..nvtxs {
        if graph.vtxs[v].neighbors().iter().any(|&u| part[u] != part[v]) {
            let list = if part[v] == 0 { &mut lverts } else { &mut rverts };
            index[v] = Some(list.len());
            list.push(v);
        }
    }
    let adj = lverts
        .iter()
        .map(|&v| {
            graph.vtxs[v]
                .neighbors()
                .iter()
                .filter(|&&u| part[u] == 1)
                .filter_map(|&u| index[u])
                .collect()
        })
        .collect();
    let bp = Bipartite {
        nleft: lverts.len(),
        nright: rverts.len(),
        adj,
    };
    let cover = if graph.using_vwgts {
        let lw: Vec<i64> = lverts.iter().map(|&v| graph.vtxs[v].vwgt as i64).collect();
        let rw: Vec<i64> = rverts.iter().map(|&v| graph.vtxs[v].vwgt as i64).collect();
        bp.min_weight_cover(&lw, &rw)
    } else {
        bp.min_cover()
    };

    let mut sides = part.to_vec();
    for (i, &v) in lverts.iter().enumerate() {
        if cover.left[i] {
            sides[v] = SEP_SIDE;
        }
    }
    for (j, &v) in rverts.iter().enumerate() {
        if cover.right[j] {
            sides[v] = SEP_SIDE;
        }
    }
    sides
}

/// The lighter of the two side boundaries becomes the separator
fn boundary_separator(graph: &Graph, part: &[usize]) -> Vec<usize> {
    let mut bnd = [Vec::new(), Vec::new()];
    let mut wgt = [0i64; 2];
    for v in 0..graph.nvtxs() {
        if graph.vtxs[v].neighbors().iter().any(|&u| part[u] != part[v]) {
            bnd[part[v]].push(v);
            wgt[part[v]] += graph.vtxs[v].vwgt as i64;
        }
    }
    let side = if wgt[1] < wgt[0] { 1 } else { 0 };
    let mut sides = part.to_vec();
    for &v in &bnd[side] {
        sides[v] = SEP_SIDE;
    }
    sides
}

/// Builds a separator from the bisection `part` (sets 0 and 1) whose sides aim at `goals`.
///
/// Returns per-vertex sides 0, 1 or `SEP_SIDE`.
pub fn find_separator(ctrl: &mut Ctrl, graph: &Graph, part: &[usize], goals: &[f64]) -> Vec<usize> {
    let mut sides = if ctrl.params.vertex_cover {
        cut_cover(graph, part)
    } else {
        boundary_separator(graph, part)
    };
    debug_assert!(is_separator(graph, &sides));

    let initial = graph.set_weights(&sides, 3)[SEP_SIDE];
    bpm_improve(ctrl, graph, &mut sides, goals);
    if ctrl.params.local_method == LocalMethod::Kl {
        nway_klv(ctrl, graph, &mut sides, goals);
    }

    if !is_separator(graph, &sides) {
        warn!("separator refinement left sides 0 and 1 adjacent");
    }
    ifset!(
        ctrl.dbglvl,
        DbgLvl::SepInfo,
        debug!(
            "separator weight {initial} -> {}, side weights {:?}",
            graph.set_weights(&sides, 3)[SEP_SIDE],
            &graph.set_weights(&sides, 2)
        )
    );
    sides
}
