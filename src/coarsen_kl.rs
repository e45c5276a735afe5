/*
\file
\brief Multilevel KL: coarsen, divide the coarsest graph spectrally, and refine the division
while projecting it back up.
*/

use log::debug;

use crate::assign::assign;
use crate::coarsen::{coarsen_levels, finer};
use crate::eigensolve::eigensolve;
use crate::error::Result;
use crate::graph::Graph;
use crate::klspiff::{hop_matrix, nway_kl};
use crate::options::{Ctrl, DbgLvl, LocalMethod};

/// Divides `graph` into `2^ndims` local sets. `term[set][v]` are optional terminal costs.
///
/// KL runs on the coarsest graph, every `coarse_nlevel_kl` levels on the way up, and always on
/// `graph` itself.
pub fn coarsen_kl(
    ctrl: &mut Ctrl,
    graph: &Graph,
    goals: &[f64],
    ndims: usize,
    coords: Option<&[Vec<f64>]>,
    term: Option<&[Vec<f64>]>,
) -> Result<Vec<usize>> {
    let nsets = 1 << ndims;
    debug_assert_eq!(goals.len(), nsets);
    let hop = hop_matrix(nsets);
    let refine = ctrl.params.local_method == LocalMethod::Kl;

    let vmax = ctrl.params.vmax.max(2 * nsets);
    let levels = coarsen_levels(ctrl, graph, coords, term, vmax);
    let nlevels = levels.len();
    let (coarsest, ccoords, cterm) = match levels.last() {
        Some(l) => (&l.graph, l.coords.as_deref(), l.term.as_deref()),
        None => (graph, coords, term),
    };

    let spectral = eigensolve(ctrl, coarsest, ndims, ccoords, cterm)?;
    let mut assignment = assign(ctrl, coarsest, &spectral.yvecs, goals, ndims);
    if refine && nlevels > 0 {
        nway_kl(ctrl, coarsest, &mut assignment, goals, cterm, &hop);
    }
    ifset!(
        ctrl.dbglvl,
        DbgLvl::Coarsen,
        debug!(
            "coarsest graph ({} vertices) cut {}",
            coarsest.nvtxs(),
            coarsest.cut_size(&assignment)
        )
    );

    let every = ctrl.params.coarse_nlevel_kl;
    for k in (0..nlevels).rev() {
        let fine = finer(graph, &levels, k);
        let fterm = if k == 0 {
            term
        } else {
            levels[k - 1].term.as_deref()
        };
        assignment = levels[k].v2cv.iter().map(|&cv| assignment[cv]).collect();

        if refine && (k == 0 || (nlevels - k) % every == 0) {
            nway_kl(ctrl, fine, &mut assignment, goals, fterm, &hop);
            ifset!(
                ctrl.dbglvl,
                DbgLvl::Refine,
                debug!(
                    "level {k} ({} vertices): cut {}",
                    fine.nvtxs(),
                    fine.cut_size(&assignment)
                )
            );
        }
    }

    if refine && nlevels == 0 {
        nway_kl(ctrl, graph, &mut assignment, goals, term, &hop);
    }
    Ok(assignment)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::graph::GraphInput;
    use crate::options::Params;
    use crate::util::create_grid_graph;

    fn grid(nx: usize, ny: usize) -> Graph {
        let (xadj, adjncy) = create_grid_graph(nx, ny);
        Graph::from_csr(&GraphInput::new(&xadj, &adjncy)).unwrap()
    }

    #[test]
    fn bisects_a_grid() {
        let graph = grid(20, 12);
        let mut ctrl = Ctrl::new(Params {
            vmax: 40,
            ..Default::default()
        });
        let part = coarsen_kl(&mut ctrl, &graph, &[120.0, 120.0], 1, None, None).unwrap();
        let w = graph.set_weights(&part, 2);
        assert_eq!(w[0] + w[1], 240);
        assert!(w[0].abs_diff(120) <= 2, "{w:?}");
        assert!(graph.cut_size(&part) <= 16.0, "cut {}", graph.cut_size(&part));
        assert!(ctrl.counters.coarsen_levels > 0);
        assert!(ctrl.counters.kl_passes > 0);
    }

    #[test]
    fn four_sets_without_refinement() {
        let graph = grid(16, 16);
        let mut ctrl = Ctrl::new(Params {
            local_method: LocalMethod::None,
            vmax: 50,
            ..Default::default()
        });
        let part = coarsen_kl(&mut ctrl, &graph, &[64.0; 4], 2, None, None).unwrap();
        let w = graph.set_weights(&part, 4);
        assert_eq!(w.iter().sum::<i64>(), 256);
        assert!(w.iter().all(|&x| x > 0), "{w:?}");
        assert_eq!(ctrl.counters.kl_passes, 0);
    }

    #[test]
    fn small_graph_skips_coarsening() {
        let graph = grid(6, 4);
        let mut ctrl = Ctrl::new(Params::default());
        let part = coarsen_kl(&mut ctrl, &graph, &[12.0, 12.0], 1, None, None).unwrap();
        assert_eq!(ctrl.counters.coarsen_levels, 0);
        assert_eq!(graph.set_weights(&part, 2), vec![12, 12]);
        assert_eq!(graph.cut_size(&part), 4.0);
    }
}
