#![cfg(test)]

use crate::arch::Architecture;
use crate::defs::SEPARATOR;
use crate::error::ChacoError;
use crate::graph::GraphInput;
use crate::graph_gen::GraphBuilder;
use crate::interface::partition;
use crate::options::{
    EigenMethod, GlobalMethod, LanczosVariant, LocalMethod, MappingType, MatchType, Params,
    Precision,
};

#[test]
fn ring_bisection() {
    let (xadj, adjncy) = crate::util::create_dummy_graph(8);
    for global_method in [GlobalMethod::Spectral, GlobalMethod::MultilevelKl] {
        let params = Params {
            global_method,
            mapping: MappingType::RecursiveMedian,
            ..Default::default()
        };
        let res = partition(
            &GraphInput::new(&xadj, &adjncy),
            None,
            Architecture::Hypercube { ndims_tot: 1 },
            None,
            params,
            None,
        )
        .unwrap();
        let part = res.assignment;
        assert_eq!(part.iter().filter(|&&s| s == 0).count(), 4);
        assert_eq!(part.iter().filter(|&&s| s == 1).count(), 4);
        let cut = (0..8).filter(|&v| part[v] != part[(v + 1) % 8]).count();
        assert_eq!(cut, 2, "{global_method:?}: {part:?}");
    }
}

#[test]
fn single_vertex_is_too_small() {
    let res = partition(
        &GraphInput::new(&[0, 0], &[]),
        None,
        Architecture::Hypercube { ndims_tot: 1 },
        None,
        Params {
            global_method: GlobalMethod::Spectral,
            ..Default::default()
        },
        None,
    );
    assert!(matches!(res, Err(ChacoError::TooSmall { nvtxs: 1, neigs: 1 })));
}

#[test]
fn asymmetric_input_is_rejected() {
    // 0 -> 1 without 1 -> 0
    let res = partition(
        &GraphInput::new(&[0, 1, 1, 2], &[1, 1]),
        None,
        Architecture::Hypercube { ndims_tot: 1 },
        None,
        Params::default(),
        None,
    );
    assert!(matches!(res, Err(ChacoError::InvalidGraph(_))));
}

#[test]
fn goals_must_match_the_weight() {
    let mut builder = GraphBuilder::grid(4, 4);
    builder.goals = Some(vec![8.0, 9.0]);
    assert!(matches!(builder.call(), Err(ChacoError::GoalMismatch { .. })));
}

#[test]
fn separator_splits_a_grid() {
    let mut builder = GraphBuilder::grid(9, 6);
    builder.params = Params {
        vertex_separator: true,
        output_metrics: true,
        kl_imbalance: 0.1,
        ..Default::default()
    };
    let res = builder.call().unwrap();
    let part = &res.assignment;
    for v in 0..builder.nvtxs() {
        if part[v] == SEPARATOR {
            continue;
        }
        for &u in &builder.adjncy[builder.xadj[v]..builder.xadj[v + 1]] {
            assert!(part[u] == part[v] || part[u] == SEPARATOR, "{v} and {u} touch");
        }
    }
    let report = res.report.unwrap();
    let (size, _) = report.separator.unwrap();
    assert!(size <= 9, "separator of {size} vertices");
    assert!(report.set_wgts.iter().all(|&w| w >= 18), "{:?}", report.set_wgts);
    assert_eq!(report.cut_weight, 0.0);
}

#[test]
fn separator_needs_two_sets() {
    let mut builder = GraphBuilder::grid(4, 4);
    builder.arch = Architecture::Hypercube { ndims_tot: 2 };
    builder.params.vertex_separator = true;
    assert!(matches!(builder.call(), Err(ChacoError::InvalidParams(_))));
}

#[test]
fn metrics_agree_with_the_assignment() {
    let mut builder = GraphBuilder::grid(12, 12);
    builder.arch = Architecture::Mesh { dims: [2, 2, 1] };
    builder.params = Params {
        output_metrics: true,
        refine_partition: 2,
        internal_vertices: true,
        ..Default::default()
    };
    let res = builder.call().unwrap();
    let cut = builder.verify_part(&res.assignment);
    let report = res.report.unwrap();
    assert_eq!(report.cut_weight, cut);
    assert_eq!(report.set_wgts.iter().sum::<i64>(), 144);
    assert_eq!(
        report.boundary.iter().sum::<usize>() + report.internal.iter().sum::<usize>(),
        144
    );
    assert!(res.timers.total > std::time::Duration::ZERO);
}

#[test]
fn provided_assignment_is_refined() {
    let (xadj, adjncy) = crate::util::create_grid_graph(6, 6);
    // halves with a column swapped in the middle rows
    let mut initial: Vec<usize> = (0..36).map(|v| usize::from(v % 6 >= 3)).collect();
    initial.swap(2 + 6 * 2, 3 + 6 * 2);
    let res = partition(
        &GraphInput::new(&xadj, &adjncy),
        None,
        Architecture::Hypercube { ndims_tot: 1 },
        None,
        Params {
            global_method: GlobalMethod::Provided,
            ..Default::default()
        },
        Some(&initial),
    )
    .unwrap();
    let (pwgts, cut) =
        crate::util::verify_part(&xadj, &adjncy, None, None, &res.assignment, 2);
    assert_eq!(pwgts, vec![18, 18]);
    assert_eq!(cut, 6.0);

    let res = partition(
        &GraphInput::new(&xadj, &adjncy),
        None,
        Architecture::Hypercube { ndims_tot: 1 },
        None,
        Params {
            global_method: GlobalMethod::Provided,
            local_method: LocalMethod::None,
            ..Default::default()
        },
        Some(&initial),
    )
    .unwrap();
    assert_eq!(res.assignment, initial);
}

fn part_graph_and_verify(mut builder: GraphBuilder, arch: Architecture, params: Params) -> f64 {
    builder.arch = arch;
    builder.params = params;
    let res = builder.call().unwrap();
    builder.verify_part(&res.assignment)
}

macro_rules! part_test {
    (
    name: $name:ident,
    graph: $graph:expr,
    arch: $arch:expr,
    params: $params:expr,
    max_cut: $max_cut:expr,
    ) => {
        #[test]
        fn $name() {
            let cut = part_graph_and_verify($graph, $arch, $params);
            assert!(cut <= $max_cut, "cut {cut} above {}", $max_cut);
        }
    };
}

fn weighted(mut builder: GraphBuilder) -> GraphBuilder {
    builder.random_vwgt().random_ewgts();
    builder
}

fn random_degrees(nvtxs: usize, seed: u64) -> GraphBuilder {
    let mut rng = fastrand::Rng::with_seed(seed);
    let mut deg: Vec<usize> = (0..nvtxs).map(|_| rng.usize(2..6)).collect();
    loop {
        if let Some(builder) = GraphBuilder::from_degrees(&deg, seed) {
            return builder;
        }
        let v = rng.usize(0..nvtxs);
        deg[v] = deg[v].saturating_sub(1).max(1);
        deg[0] = if deg.iter().sum::<usize>() % 2 == 1 { deg[0] + 1 } else { deg[0] };
    }
}

part_test! {
    name: grid_four_sets_cube,
    graph: GraphBuilder::grid(16, 16),
    arch: Architecture::Hypercube { ndims_tot: 2 },
    params: Params { ndims: 2, ..Default::default() },
    max_cut: 64.0,
}

part_test! {
    name: grid_four_sets_bisections,
    graph: GraphBuilder::grid(16, 16),
    arch: Architecture::Hypercube { ndims_tot: 2 },
    params: Params::default(),
    max_cut: 64.0,
}

part_test! {
    name: grid_eight_sets_octants,
    graph: GraphBuilder::grid(24, 16),
    arch: Architecture::Hypercube { ndims_tot: 3 },
    params: Params { ndims: 3, vmax: 64, ..Default::default() },
    max_cut: 160.0,
}

part_test! {
    name: grid_four_sets_mesh,
    graph: GraphBuilder::grid(16, 16),
    arch: Architecture::Mesh { dims: [2, 2, 1] },
    params: Params::default(),
    max_cut: 64.0,
}

part_test! {
    name: grid_eight_sets_mesh,
    graph: GraphBuilder::grid(24, 16),
    arch: Architecture::Mesh { dims: [4, 2, 1] },
    params: Params { global_method: GlobalMethod::Spectral, ..Default::default() },
    max_cut: 160.0,
}

part_test! {
    name: odd_mesh_with_terminal_propagation,
    graph: GraphBuilder::grid(15, 10),
    arch: Architecture::Mesh { dims: [3, 1, 1] },
    params: Params { term_prop: true, global_method: GlobalMethod::Spectral, ..Default::default() },
    max_cut: 40.0,
}

part_test! {
    name: cube_with_terminal_propagation,
    graph: GraphBuilder::grid(16, 12),
    arch: Architecture::Hypercube { ndims_tot: 2 },
    params: Params { term_prop: true, ..Default::default() },
    max_cut: 60.0,
}

part_test! {
    name: inertial_grid,
    graph: GraphBuilder::grid(20, 10),
    arch: Architecture::Hypercube { ndims_tot: 2 },
    params: Params { global_method: GlobalMethod::Inertial, ndims: 2, ..Default::default() },
    max_cut: 50.0,
}

part_test! {
    name: linear_then_kl,
    graph: GraphBuilder::grid(10, 10),
    arch: Architecture::Hypercube { ndims_tot: 1 },
    params: Params { global_method: GlobalMethod::Linear, ..Default::default() },
    max_cut: 10.0,
}

part_test! {
    name: random_then_kl,
    graph: GraphBuilder::grid(10, 10),
    arch: Architecture::Hypercube { ndims_tot: 2 },
    params: Params { global_method: GlobalMethod::Random, ..Default::default() },
    max_cut: f64::INFINITY,
}

part_test! {
    name: scattered_without_kl,
    graph: GraphBuilder::ring(30),
    arch: Architecture::Mesh { dims: [3, 1, 1] },
    params: Params {
        global_method: GlobalMethod::Scattered,
        local_method: LocalMethod::None,
        ..Default::default()
    },
    max_cut: 30.0,
}

part_test! {
    name: weighted_grid_spectral,
    graph: weighted(GraphBuilder::grid(12, 10)),
    arch: Architecture::Hypercube { ndims_tot: 2 },
    params: Params { global_method: GlobalMethod::Spectral, kl_imbalance: 0.05, ..Default::default() },
    max_cut: f64::INFINITY,
}

part_test! {
    name: weighted_random_graph_multilevel,
    graph: weighted(random_degrees(300, 17)),
    arch: Architecture::Hypercube { ndims_tot: 2 },
    params: Params { match_type: MatchType::HeavyEdge, kl_imbalance: 0.05, ..Default::default() },
    max_cut: f64::INFINITY,
}

part_test! {
    name: full_orthogonalization,
    graph: GraphBuilder::grid(14, 9),
    arch: Architecture::Hypercube { ndims_tot: 1 },
    params: Params {
        global_method: GlobalMethod::Spectral,
        lanczos_variant: LanczosVariant::Full,
        ..Default::default()
    },
    max_cut: 9.0,
}

part_test! {
    name: inverse_operator,
    graph: GraphBuilder::grid(14, 9),
    arch: Architecture::Hypercube { ndims_tot: 1 },
    params: Params {
        global_method: GlobalMethod::Spectral,
        lanczos_variant: LanczosVariant::FullInverse,
        ..Default::default()
    },
    max_cut: 9.0,
}

part_test! {
    name: selective_both_ends_single_precision,
    graph: GraphBuilder::grid(14, 9),
    arch: Architecture::Hypercube { ndims_tot: 1 },
    params: Params {
        global_method: GlobalMethod::Spectral,
        lanczos_variant: LanczosVariant::SelectiveBothEnds,
        precision: Precision::Single,
        ..Default::default()
    },
    max_cut: 9.0,
}

part_test! {
    name: multilevel_rqi,
    graph: GraphBuilder::grid(30, 12),
    arch: Architecture::Hypercube { ndims_tot: 1 },
    params: Params {
        global_method: GlobalMethod::Spectral,
        eigen_method: EigenMethod::MultilevelRqi,
        vmax: 50,
        ..Default::default()
    },
    max_cut: 12.0,
}

part_test! {
    name: geometric_matching,
    graph: GraphBuilder::grid(20, 20),
    arch: Architecture::Hypercube { ndims_tot: 1 },
    params: Params { match_type: MatchType::Geometric, vmax: 40, ..Default::default() },
    max_cut: 30.0,
}

#[cfg(feature = "extra_tests")]
part_test! {
    name: large_grid_sixteen_sets,
    graph: GraphBuilder::grid(64, 64),
    arch: Architecture::Hypercube { ndims_tot: 4 },
    params: Params { ndims: 2, ..Default::default() },
    max_cut: 600.0,
}
