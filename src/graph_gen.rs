//! Graph construction for the crate level test suite: grids, graphs with prescribed degrees and
//! random weights, plus a checked call into the partitioner.

use fastrand::Rng;

use crate::arch::Architecture;
use crate::error::Result;
use crate::graph::GraphInput;
use crate::interface::{partition, Partition};
use crate::options::Params;
use crate::util::{create_dummy_graph, create_grid_graph, make_csr, verify_part};

pub struct GraphBuilder {
    pub xadj: Vec<usize>,
    pub adjncy: Vec<usize>,
    pub vwgts: Option<Vec<i32>>,
    pub ewgts: Option<Vec<f32>>,
    pub coords: Option<Vec<Vec<f64>>>,
    pub goals: Option<Vec<f64>>,
    pub arch: Architecture,
    pub params: Params,
    rng: Rng,
}

#[allow(unused)]
impl GraphBuilder {
    fn from_csr(xadj: Vec<usize>, adjncy: Vec<usize>) -> Self {
        Self {
            xadj,
            adjncy,
            vwgts: None,
            ewgts: None,
            coords: None,
            goals: None,
            arch: Architecture::Hypercube { ndims_tot: 1 },
            params: Params::default(),
            rng: Rng::with_seed(0x5eed),
        }
    }

    pub fn ring(nvtxs: usize) -> Self {
        let (xadj, adjncy) = create_dummy_graph(nvtxs);
        Self::from_csr(xadj, adjncy)
    }

    /// `nx` by `ny` grid with its vertex positions as coordinates
    pub fn grid(nx: usize, ny: usize) -> Self {
        let (xadj, adjncy) = create_grid_graph(nx, ny);
        let mut builder = Self::from_csr(xadj, adjncy);
        builder.coords = Some(vec![
            (0..nx * ny).map(|v| (v % nx) as f64).collect(),
            (0..nx * ny).map(|v| (v / nx) as f64).collect(),
        ]);
        builder
    }

    /// Havel-Hakimi check that `deg` is the degree sequence of a simple graph
    fn validate_degrees(deg: &[usize]) -> bool {
        let mut deg = deg.to_vec();
        loop {
            deg.sort_unstable();
            let Some(d) = deg.pop() else {
                return true;
            };
            if d > deg.len() {
                return false;
            }
            for item in deg.iter_mut().rev().take(d) {
                if *item == 0 {
                    return false;
                }
                *item -= 1;
            }
        }
    }

    /// A graph with exactly the degrees `deg`, built by Havel-Hakimi on a random relabeling.
    /// Returns `None` when no simple graph has these degrees.
    pub fn from_degrees(deg: &[usize], seed: u64) -> Option<Self> {
        if !Self::validate_degrees(deg) {
            return None;
        }
        let nvtxs = deg.len();
        let mut rng = Rng::with_seed(seed);
        let mut label: Vec<usize> = (0..nvtxs).collect();
        rng.shuffle(&mut label);

        let mut left: Vec<(usize, usize)> = deg.iter().copied().zip(0..nvtxs).collect();
        let mut adj: Vec<Vec<usize>> = vec![Vec::new(); nvtxs];
        loop {
            left.sort_unstable();
            let Some((d, v)) = left.pop() else {
                break;
            };
            let n = left.len();
            for item in &mut left[n - d..] {
                item.0 -= 1;
                adj[label[v]].push(label[item.1]);
                adj[label[item.1]].push(label[v]);
            }
        }

        let mut xadj: Vec<usize> = adj.iter().map(Vec::len).chain([0]).collect();
        make_csr(&mut xadj);
        let adjncy = adj.into_iter().flatten().collect();
        Some(Self::from_csr(xadj, adjncy))
    }

    pub fn nvtxs(&self) -> usize {
        self.xadj.len() - 1
    }

    pub fn random_vwgt(&mut self) -> &mut Self {
        let n = self.nvtxs();
        self.vwgts = Some((0..n).map(|_| self.rng.i32(1..20)).collect());
        self
    }

    /// Random edge weights, equal on both directions of every edge
    pub fn random_ewgts(&mut self) -> &mut Self {
        let mut ewgts = vec![0.0f32; self.adjncy.len()];
        for v in 0..self.nvtxs() {
            for j in self.xadj[v]..self.xadj[v + 1] {
                let u = self.adjncy[j];
                if u < v {
                    continue;
                }
                let w = self.rng.u32(1..20) as f32;
                ewgts[j] = w;
                if let Some(k) = (self.xadj[u]..self.xadj[u + 1]).find(|&k| self.adjncy[k] == v) {
                    ewgts[k] = w;
                }
            }
        }
        self.ewgts = Some(ewgts);
        self
    }

    pub fn call(&self) -> Result<Partition> {
        let mut input = GraphInput::new(&self.xadj, &self.adjncy);
        if let Some(vwgts) = &self.vwgts {
            input = input.with_vwgts(vwgts);
        }
        if let Some(ewgts) = &self.ewgts {
            input = input.with_ewgts(ewgts);
        }
        partition(
            &input,
            self.coords.as_deref(),
            self.arch,
            self.goals.as_deref(),
            self.params.clone(),
            None,
        )
    }

    /// Checks that every vertex got a set and that no set is far above its goal. Each division
    /// step may miss by up to one vertex weight. Returns the cut.
    pub fn verify_part(&self, part: &[usize]) -> f64 {
        let nsets = self.arch.nsets_tot();
        let (pwgts, cut) = verify_part(
            &self.xadj,
            &self.adjncy,
            self.vwgts.as_deref(),
            self.ewgts.as_deref(),
            part,
            nsets,
        );

        let total: i64 = pwgts.iter().sum();
        let maxw = self.vwgts.as_ref().map_or(1, |w| w.iter().copied().max().unwrap_or(1));
        let depth = nsets.next_power_of_two().trailing_zeros().max(1) as f64;
        for (s, &w) in pwgts.iter().enumerate() {
            let goal = match &self.goals {
                Some(g) => g[s],
                None => total as f64 / nsets as f64,
            };
            let bound = goal * (1.0 + self.params.kl_imbalance) * 1.05 + depth * maxw as f64;
            assert!(
                w as f64 <= bound,
                "set {s} has weight {w}, goal {goal:.1}, all sets {pwgts:?}"
            );
        }
        cut
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::checkgraph::check_graph;
    use crate::graph::Graph;

    #[test]
    fn degrees_are_realized() {
        let deg = [3, 3, 2, 2, 2, 1, 1];
        let builder = GraphBuilder::from_degrees(&deg, 11).unwrap();
        let graph = Graph::from_csr(&GraphInput::new(&builder.xadj, &builder.adjncy)).unwrap();
        assert!(!check_graph(&graph));
        let mut got: Vec<usize> = graph.vtxs.iter().map(|v| v.degree()).collect();
        got.sort_unstable();
        let mut want = deg.to_vec();
        want.sort_unstable();
        assert_eq!(got, want);

        assert!(GraphBuilder::from_degrees(&[3, 1, 1], 0).is_none());
        assert!(GraphBuilder::from_degrees(&[2, 2, 1], 0).is_none());
    }

    #[test]
    fn random_ewgts_are_symmetric() {
        let mut builder = GraphBuilder::grid(5, 4);
        builder.random_ewgts().random_vwgt();
        let input = GraphInput::new(&builder.xadj, &builder.adjncy)
            .with_vwgts(builder.vwgts.as_ref().unwrap())
            .with_ewgts(builder.ewgts.as_ref().unwrap());
        let graph = Graph::from_csr(&input).unwrap();
        assert!(!check_graph(&graph));
    }
}
