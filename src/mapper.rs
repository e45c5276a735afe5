/*
\file
\brief Assignment of two or three eigenvectors to the corners of a square or cube.

Each set is a corner direction with one sign bit per axis, so the set number is the hypercube
label of the corner and adjacent corners are one hop apart. A rotation of the corner frame is
chosen to best fit the vertex coordinates, every vertex goes to its closest corner, and then
chains of single vertex moves rebalance the sets toward their goals at the least loss of fit.
*/

use std::f64::consts::FRAC_PI_2;

use log::{debug, warn};

use crate::defs::{MAP2D_NANGLES, MAP3D_NANGLES};
use crate::graph::Graph;
use crate::options::{Ctrl, DbgLvl};
use crate::pqueue::IndexedPriorityQueue;

/// Unit corner directions of the `ndims` cube in the frame `rot` (rows are the rotated axes)
fn corners(rot: &[[f64; 3]; 3], ndims: usize) -> Vec<[f64; 3]> {
    let scale = 1.0 / (ndims as f64).sqrt();
    (0..1usize << ndims)
        .map(|s| {
            let mut dir = [0.0; 3];
            for axis in 0..ndims {
                let sign = if (s >> axis) & 1 == 1 { scale } else { -scale };
                for k in 0..ndims {
                    dir[k] += sign * rot[axis][k];
                }
            }
            dir
        })
        .collect()
}

fn fit(yvecs: &[Vec<f64>], v: usize, dir: &[f64; 3]) -> f64 {
    yvecs.iter().enumerate().map(|(k, y)| y[v] * dir[k]).sum()
}

/// Nearest corner assignment for one frame, with its total weighted fit
fn nearest_corners(graph: &Graph, yvecs: &[Vec<f64>], dirs: &[[f64; 3]]) -> (Vec<usize>, f64) {
    let mut total = 0.0;
    let mut assignment = Vec::with_capacity(graph.nvtxs());
    for v in 0..graph.nvtxs() {
        let (best, score) = dirs
            .iter()
            .enumerate()
            .map(|(s, d)| (s, fit(yvecs, v, d)))
            .fold((0, f64::NEG_INFINITY), |a, b| if b.1 > a.1 { b } else { a });
        total += graph.vtxs[v].vwgt as f64 * score;
        assignment.push(best);
    }
    (assignment, total)
}

fn rotation2d(theta: f64) -> [[f64; 3]; 3] {
    let (s, c) = theta.sin_cos();
    [[c, s, 0.0], [-s, c, 0.0], [0.0, 0.0, 1.0]]
}

fn rotation3d(a: f64, b: f64, g: f64) -> [[f64; 3]; 3] {
    let (sa, ca) = a.sin_cos();
    let (sb, cb) = b.sin_cos();
    let (sg, cg) = g.sin_cos();
    // z(a) y(b) z(g) Euler angles
    [
        [ca * cb * cg - sa * sg, -ca * cb * sg - sa * cg, ca * sb],
        [sa * cb * cg + ca * sg, -sa * cb * sg + ca * cg, sa * sb],
        [-sb * cg, sb * sg, cb],
    ]
}

/// Best of `MAP2D_NANGLES` rotations of the square
pub fn inits2d(graph: &Graph, yvecs: &[Vec<f64>]) -> (Vec<usize>, Vec<[f64; 3]>) {
    let mut best: Option<(Vec<usize>, f64, Vec<[f64; 3]>)> = None;
    for i in 0..MAP2D_NANGLES {
        let theta = FRAC_PI_2 * i as f64 / MAP2D_NANGLES as f64;
        let dirs = corners(&rotation2d(theta), 2);
        let (assignment, score) = nearest_corners(graph, yvecs, &dirs);
        if best.as_ref().map_or(true, |b| score > b.1) {
            best = Some((assignment, score, dirs));
        }
    }
    let (assignment, _, dirs) = best.unwrap_or_default();
    (assignment, dirs)
}

/// Best of `MAP3D_NANGLES^3` Euler rotations of the cube
pub fn inits3d(graph: &Graph, yvecs: &[Vec<f64>]) -> (Vec<usize>, Vec<[f64; 3]>) {
    let mut best: Option<(Vec<usize>, f64, Vec<[f64; 3]>)> = None;
    let step = FRAC_PI_2 / MAP3D_NANGLES as f64;
    for i in 0..MAP3D_NANGLES {
        for j in 0..MAP3D_NANGLES {
            for k in 0..MAP3D_NANGLES {
                let rot = rotation3d(i as f64 * step, j as f64 * step, k as f64 * step);
                let dirs = corners(&rot, 3);
                let (assignment, score) = nearest_corners(graph, yvecs, &dirs);
                if best.as_ref().map_or(true, |b| score > b.1) {
                    best = Some((assignment, score, dirs));
                }
            }
        }
    }
    let (assignment, _, dirs) = best.unwrap_or_default();
    (assignment, dirs)
}

/// Moves vertices between sets along least cost chains until no set is above its goal by more
/// than half the largest vertex weight, or no chain to a set below its goal is left. A moved
/// vertex is locked, so each chain is a simple path and the loop terminates.
pub fn movevtxs(
    ctrl: &mut Ctrl,
    graph: &Graph,
    yvecs: &[Vec<f64>],
    dirs: &[[f64; 3]],
    goals: &[f64],
    assignment: &mut [usize],
) {
    let nsets = dirs.len();
    let nvtxs = graph.nvtxs();
    let slack = 0.5 * graph.max_vwgt() as f64;

    let mut loads = vec![0.0; nsets];
    // queues of a set are indexed by position in its initial member list
    let mut members: Vec<Vec<usize>> = vec![Vec::new(); nsets];
    for v in 0..nvtxs {
        let s = assignment[v];
        loads[s] += graph.vtxs[v].vwgt as f64;
        members[s].push(v);
    }

    let cost = |v: usize, from: usize, to: usize| -> f64 {
        fit(yvecs, v, &dirs[from]) - fit(yvecs, v, &dirs[to])
    };

    let mut queues: Vec<IndexedPriorityQueue<f64>> = Vec::with_capacity(nsets * nsets);
    for from in 0..nsets {
        for to in 0..nsets {
            let mut q = IndexedPriorityQueue::new(if from == to { 0 } else { members[from].len() });
            if from != to {
                for (l, &v) in members[from].iter().enumerate() {
                    q.insert(l, cost(v, from, to));
                }
            }
            queues.push(q);
        }
    }

    let mut nmoves = 0;
    loop {
        let Some(src) = (0..nsets)
            .filter(|&s| loads[s] > goals[s] + slack)
            .max_by(|&a, &b| (loads[a] - goals[a]).total_cmp(&(loads[b] - goals[b])))
        else {
            break;
        };

        // Dijkstra over the sets, edge cost = cheapest unlocked move
        let mut dist = vec![f64::INFINITY; nsets];
        let mut prev: Vec<Option<usize>> = vec![None; nsets];
        let mut done = vec![false; nsets];
        dist[src] = 0.0;
        let mut target = None;
        loop {
            let Some(x) = (0..nsets)
                .filter(|&s| !done[s] && dist[s].is_finite())
                .min_by(|&a, &b| dist[a].total_cmp(&dist[b]))
            else {
                break;
            };
            done[x] = true;
            if x != src && loads[x] < goals[x] {
                target = Some(x);
                break;
            }
            for y in 0..nsets {
                if y == x || done[y] {
                    continue;
                }
                if let Some(c) = queues[x * nsets + y].see_top_key() {
                    if dist[x] + c < dist[y] {
                        dist[y] = dist[x] + c;
                        prev[y] = Some(x);
                    }
                }
            }
        }

        let Some(target) = target else {
            warn!("could not rebalance the corner assignment; set loads {loads:?}");
            break;
        };

        let mut path = vec![target];
        let mut at = target;
        while let Some(p) = prev[at] {
            path.push(p);
            at = p;
        }
        path.reverse();

        for hop in path.windows(2) {
            let (from, to) = (hop[0], hop[1]);
            let Some(l) = queues[from * nsets + to].see_top_val() else {
                break;
            };
            let v = members[from][l];
            for other in 0..nsets {
                if other != from {
                    queues[from * nsets + other].delete(l);
                }
            }
            assignment[v] = to;
            let w = graph.vtxs[v].vwgt as f64;
            loads[from] -= w;
            loads[to] += w;
            nmoves += 1;
        }
    }

    ctrl.counters.nvtx_moves += nmoves;
    ifset!(
        ctrl.dbglvl,
        DbgLvl::Assign,
        debug!("movevtxs: {nmoves} moves, final loads {loads:?}, goals {goals:?}")
    );
}

/// Four way assignment from two coordinate vectors
pub fn map2d(ctrl: &mut Ctrl, graph: &Graph, yvecs: &[Vec<f64>], goals: &[f64]) -> Vec<usize> {
    let (mut assignment, dirs) = inits2d(graph, yvecs);
    movevtxs(ctrl, graph, yvecs, &dirs, goals, &mut assignment);
    assignment
}

/// Eight way assignment from three coordinate vectors
pub fn map3d(ctrl: &mut Ctrl, graph: &Graph, yvecs: &[Vec<f64>], goals: &[f64]) -> Vec<usize> {
    let (mut assignment, dirs) = inits3d(graph, yvecs);
    movevtxs(ctrl, graph, yvecs, &dirs, goals, &mut assignment);
    assignment
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

    fn loads(assignment: &[usize], nsets: usize) -> Vec<usize> {
        let mut l = vec![0; nsets];
        for &s in assignment {
            l[s] += 1;
        }
        l
    }

    #[test]
    fn map2d_balances_quadrants() {
        let graph = grid(8, 8);
        let yvecs = vec![
            (0..64).map(|v| (v % 8) as f64 - 3.5).collect::<Vec<_>>(),
            (0..64).map(|v| (v / 8) as f64 - 3.5).collect::<Vec<_>>(),
        ];
        let mut ctrl = Ctrl::new(Params::default());
        let part = map2d(&mut ctrl, &graph, &yvecs, &[16.0; 4]);
        assert_eq!(loads(&part, 4), vec![16; 4]);
        // opposite corners of the grid end up in sets with no common bit
        assert_eq!(part[0] ^ part[63], 3);
    }

    #[test]
    fn movevtxs_rebalances_skewed_start() {
        let graph = grid(6, 4);
        let yvecs = vec![
            (0..24).map(|v| (v % 6) as f64 + 2.0).collect::<Vec<_>>(),
            (0..24).map(|v| (v / 6) as f64 - 1.5).collect::<Vec<_>>(),
        ];
        let mut ctrl = Ctrl::new(Params::default());
        let (mut part, dirs) = inits2d(&graph, &yvecs);
        // everything starts on the positive x side
        assert!(loads(&part, 4).iter().filter(|&&l| l == 0).count() >= 2);
        movevtxs(&mut ctrl, &graph, &yvecs, &dirs, &[6.0; 4], &mut part);
        assert_eq!(loads(&part, 4), vec![6; 4]);
        assert!(ctrl.counters.nvtx_moves >= 12);
    }

    #[test]
    fn map3d_balances_octants() {
        let graph = grid(8, 8);
        let mut rng = fastrand::Rng::with_seed(3);
        let yvecs: Vec<Vec<f64>> = (0..3)
            .map(|_| (0..64).map(|_| rng.f64() - 0.5).collect())
            .collect();
        let mut ctrl = Ctrl::new(Params::default());
        let part = map3d(&mut ctrl, &graph, &yvecs, &[8.0; 8]);
        assert_eq!(loads(&part, 8), vec![8; 8]);
    }
}
