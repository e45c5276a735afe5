//! Shared helpers for the integration tests: graph generators, a run description that calls the
//! public entry point, and checks on what comes back.

#![allow(dead_code)]

pub use chaco::{
    partition, Architecture, ChacoError, GlobalMethod, GraphInput, LocalMethod, MatchType,
    Params, Partition, SEPARATOR,
};

/// Compressed adjacency of a test graph
#[derive(Clone, Debug)]
pub struct TestGraph {
    pub xadj: Vec<usize>,
    pub adjncy: Vec<usize>,
    pub vwgts: Option<Vec<i32>>,
    pub ewgts: Option<Vec<f32>>,
    pub coords: Option<Vec<Vec<f64>>>,
}

impl TestGraph {
    fn from_lists(adj: Vec<Vec<usize>>) -> Self {
        let mut xadj = vec![0];
        let mut adjncy = Vec::new();
        for nbrs in adj {
            adjncy.extend(nbrs);
            xadj.push(adjncy.len());
        }
        Self {
            xadj,
            adjncy,
            vwgts: None,
            ewgts: None,
            coords: None,
        }
    }

    /// `nx` by `ny` grid, row major, with unit coordinates
    pub fn grid(nx: usize, ny: usize) -> Self {
        let mut adj = vec![Vec::new(); nx * ny];
        for y in 0..ny {
            for x in 0..nx {
                let v = x + nx * y;
                if x > 0 {
                    adj[v].push(v - 1);
                }
                if x + 1 < nx {
                    adj[v].push(v + 1);
                }
                if y > 0 {
                    adj[v].push(v - nx);
                }
                if y + 1 < ny {
                    adj[v].push(v + nx);
                }
            }
        }
        let mut g = Self::from_lists(adj);
        g.coords = Some(vec![
            (0..nx * ny).map(|v| (v % nx) as f64).collect(),
            (0..nx * ny).map(|v| (v / nx) as f64).collect(),
        ]);
        g
    }

    pub fn path(n: usize) -> Self {
        Self::from_lists(
            (0..n)
                .map(|v| {
                    let mut nbrs = Vec::new();
                    if v > 0 {
                        nbrs.push(v - 1);
                    }
                    if v + 1 < n {
                        nbrs.push(v + 1);
                    }
                    nbrs
                })
                .collect(),
        )
    }

    /// Two cliques of `k` vertices joined by a single edge between their first vertices
    pub fn barbell(k: usize) -> Self {
        let mut adj = vec![Vec::new(); 2 * k];
        for side in 0..2 {
            for a in 0..k {
                for b in 0..k {
                    if a != b {
                        adj[side * k + a].push(side * k + b);
                    }
                }
            }
        }
        adj[0].push(k);
        adj[k].push(0);
        Self::from_lists(adj)
    }

    /// Random graph from an edge list; duplicates and loops are dropped
    pub fn from_edges(n: usize, edges: &[(usize, usize)]) -> Self {
        let mut adj = vec![Vec::new(); n];
        for &(a, b) in edges {
            if a == b || adj[a].contains(&b) {
                continue;
            }
            adj[a].push(b);
            adj[b].push(a);
        }
        Self::from_lists(adj)
    }

    pub fn nvtxs(&self) -> usize {
        self.xadj.len() - 1
    }

    pub fn with_vwgts(mut self, vwgts: Vec<i32>) -> Self {
        self.vwgts = Some(vwgts);
        self
    }

    pub fn input(&self) -> GraphInput<'_> {
        let mut input = GraphInput::new(&self.xadj, &self.adjncy);
        if let Some(v) = &self.vwgts {
            input = input.with_vwgts(v);
        }
        if let Some(e) = &self.ewgts {
            input = input.with_ewgts(e);
        }
        input
    }

    pub fn vwgt(&self, v: usize) -> i64 {
        self.vwgts.as_ref().map_or(1, |w| w[v] as i64)
    }

    pub fn total_vwgt(&self) -> i64 {
        (0..self.nvtxs()).map(|v| self.vwgt(v)).sum()
    }

    /// Set weights and cut weight of `part`, ignoring separator vertices
    pub fn measure(&self, part: &[usize], nsets: usize) -> (Vec<i64>, f64) {
        let mut wgts = vec![0i64; nsets];
        let mut cut = 0.0;
        for v in 0..self.nvtxs() {
            if part[v] == SEPARATOR {
                continue;
            }
            assert!(part[v] < nsets, "vertex {v} in set {}", part[v]);
            wgts[part[v]] += self.vwgt(v);
            for j in self.xadj[v]..self.xadj[v + 1] {
                let u = self.adjncy[j];
                if part[u] != SEPARATOR && part[u] != part[v] {
                    cut += self.ewgts.as_ref().map_or(1.0, |e| e[j] as f64);
                }
            }
        }
        (wgts, cut / 2.0)
    }
}

/// One call of the partitioner
pub struct Run {
    pub graph: TestGraph,
    pub arch: Architecture,
    pub params: Params,
    pub goals: Option<Vec<f64>>,
    pub initial: Option<Vec<usize>>,
}

impl Run {
    pub fn new(graph: TestGraph, arch: Architecture) -> Self {
        Self {
            graph,
            arch,
            params: Params::default(),
            goals: None,
            initial: None,
        }
    }

    pub fn call(&self) -> chaco::Result<Partition> {
        partition(
            &self.graph.input(),
            self.graph.coords.as_deref(),
            self.arch,
            self.goals.as_deref(),
            self.params.clone(),
            self.initial.as_deref(),
        )
    }

    /// Runs and checks that every set is within `tol` (relative) plus one vertex weight per
    /// division level of its goal. Returns the assignment and its cut.
    pub fn call_assert_balanced(&self, tol: f64) -> (Vec<usize>, f64) {
        let res = self.call().unwrap_or_else(|e| panic!("partition failed: {e}"));
        let nsets = self.arch.nsets_tot();
        assert_eq!(res.assignment.len(), self.graph.nvtxs());
        let (wgts, cut) = self.graph.measure(&res.assignment, nsets);

        let total = self.graph.total_vwgt() as f64;
        let maxw = (0..self.graph.nvtxs())
            .map(|v| self.graph.vwgt(v))
            .max()
            .unwrap_or(1) as f64;
        let depth = nsets.next_power_of_two().trailing_zeros().max(1) as f64;
        for (s, &w) in wgts.iter().enumerate() {
            let goal = self.goals.as_ref().map_or(total / nsets as f64, |g| g[s]);
            assert!(
                w as f64 <= goal * (1.0 + tol) + depth * maxw,
                "set {s}: weight {w}, goal {goal}, all {wgts:?}"
            );
        }
        (res.assignment, cut)
    }
}
