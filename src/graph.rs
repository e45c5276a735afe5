/*
\file
\brief The vertex arena every stage of the partitioner works on, plus subgraph extraction.

Every vertex owns its adjacency list with itself in slot 0. When the graph carries edge weights
the parallel weight list holds the negative sum of the remaining weights in slot 0, which makes
each vertex's list one row of the graph Laplacian.
*/

use crate::error::{ChacoError, Result};

/// Borrowed 0-based CSR description of a graph, as handed in by the caller.
#[derive(Debug, Clone, Copy)]
pub struct GraphInput<'a> {
    pub xadj: &'a [usize],
    pub adjncy: &'a [usize],
    pub vwgts: Option<&'a [i32]>,
    pub ewgts: Option<&'a [f32]>,
}

impl<'a> GraphInput<'a> {
    pub fn new(xadj: &'a [usize], adjncy: &'a [usize]) -> Self {
        Self {
            xadj,
            adjncy,
            vwgts: None,
            ewgts: None,
        }
    }

    pub fn with_vwgts(mut self, vwgts: &'a [i32]) -> Self {
        self.vwgts = Some(vwgts);
        self
    }

    pub fn with_ewgts(mut self, ewgts: &'a [f32]) -> Self {
        self.ewgts = Some(ewgts);
        self
    }

    pub fn nvtxs(&self) -> usize {
        self.xadj.len().saturating_sub(1)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Vertex {
    pub vwgt: i32,
    /// adjacent vertices, `edges[0]` is the vertex itself
    pub edges: Vec<usize>,
    /// empty for unweighted graphs, otherwise parallel to `edges`
    pub ewgts: Vec<f32>,
}

impl Vertex {
    #[inline]
    pub fn degree(&self) -> usize {
        self.edges.len() - 1
    }

    #[inline]
    pub fn neighbors(&self) -> &[usize] {
        &self.edges[1..]
    }

    /// Weight of the edge in slot `k` (`k >= 1`)
    #[inline]
    pub fn ewgt(&self, k: usize) -> f32 {
        if self.ewgts.is_empty() {
            1.0
        } else {
            self.ewgts[k]
        }
    }

    /// (neighbor, edge weight) pairs, skipping the self slot
    pub fn adj(&self) -> impl Iterator<Item = (usize, f32)> + '_ {
        self.edges[1..]
            .iter()
            .enumerate()
            .map(move |(k, &u)| (u, self.ewgt(k + 1)))
    }

    /// Laplacian diagonal of this vertex
    pub fn ewgt_sum(&self) -> f64 {
        if self.ewgts.is_empty() {
            self.degree() as f64
        } else {
            -(self.ewgts[0] as f64)
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Graph {
    pub vtxs: Vec<Vertex>,
    /// number of undirected edges
    pub nedges: usize,
    pub using_vwgts: bool,
    pub using_ewgts: bool,
}

impl Graph {
    /// Builds the vertex arena from CSR input.
    ///
    /// Structural problems with the arrays themselves are errors. Semantic problems (asymmetry,
    /// duplicates, bad weights) are left for [`crate::checkgraph::check_graph`].
    pub fn from_csr(input: &GraphInput) -> Result<Self> {
        let xadj = input.xadj;
        let adjncy = input.adjncy;
        if xadj.is_empty() {
            return Err(ChacoError::InvalidInput("xadj must have at least one entry".into()));
        }
        let nvtxs = xadj.len() - 1;
        if xadj[0] != 0 {
            return Err(ChacoError::InvalidInput(format!(
                "xadj[0] must be 0, got {}",
                xadj[0]
            )));
        }
        if xadj[nvtxs] != adjncy.len() {
            return Err(ChacoError::InvalidInput(format!(
                "xadj[{nvtxs}] = {} does not match {} adjacency entries",
                xadj[nvtxs],
                adjncy.len()
            )));
        }
        if let Some(vwgts) = input.vwgts {
            if vwgts.len() != nvtxs {
                return Err(ChacoError::InvalidInput(format!(
                    "{} vertex weights for {nvtxs} vertices",
                    vwgts.len()
                )));
            }
        }
        if let Some(ewgts) = input.ewgts {
            if ewgts.len() != adjncy.len() {
                return Err(ChacoError::InvalidInput(format!(
                    "{} edge weights for {} adjacency entries",
                    ewgts.len(),
                    adjncy.len()
                )));
            }
        }

        let mut vtxs = Vec::with_capacity(nvtxs);
        for i in 0..nvtxs {
            let (start, end) = (xadj[i], xadj[i + 1]);
            if start > end {
                return Err(ChacoError::InvalidInput(format!(
                    "xadj is decreasing at vertex {i}"
                )));
            }
            let mut edges = Vec::with_capacity(end - start + 1);
            edges.push(i);
            for &j in &adjncy[start..end] {
                if j >= nvtxs {
                    return Err(ChacoError::InvalidInput(format!(
                        "vertex {i} lists neighbor {j}, but there are only {nvtxs} vertices"
                    )));
                }
                if j == i {
                    return Err(ChacoError::InvalidInput(format!(
                        "vertex {i} has a self loop"
                    )));
                }
                edges.push(j);
            }

            let ewgts = match input.ewgts {
                Some(w) => {
                    let mut ewgts = Vec::with_capacity(end - start + 1);
                    ewgts.push(0.0);
                    ewgts.extend_from_slice(&w[start..end]);
                    ewgts[0] = -ewgts[1..].iter().sum::<f32>();
                    ewgts
                }
                None => Vec::new(),
            };

            vtxs.push(Vertex {
                vwgt: input.vwgts.map_or(1, |w| w[i]),
                edges,
                ewgts,
            });
        }

        Ok(Self {
            vtxs,
            nedges: adjncy.len() / 2,
            using_vwgts: input.vwgts.is_some(),
            using_ewgts: input.ewgts.is_some(),
        })
    }

    /// Builds a graph from per-vertex (neighbor, weight) lists that are already symmetric and
    /// free of duplicates and self loops.
    pub fn from_adjacency(
        vwgts: Vec<i32>,
        adj: Vec<Vec<(usize, f32)>>,
        using_vwgts: bool,
        using_ewgts: bool,
    ) -> Self {
        debug_assert_eq!(vwgts.len(), adj.len());
        let mut nedges = 0;
        let vtxs = vwgts
            .into_iter()
            .zip(adj)
            .enumerate()
            .map(|(i, (vwgt, list))| {
                nedges += list.len();
                let mut edges = Vec::with_capacity(list.len() + 1);
                edges.push(i);
                edges.extend(list.iter().map(|&(u, _)| u));
                let ewgts = if using_ewgts {
                    let mut ewgts = Vec::with_capacity(list.len() + 1);
                    ewgts.push(-list.iter().map(|&(_, w)| w).sum::<f32>());
                    ewgts.extend(list.iter().map(|&(_, w)| w));
                    ewgts
                } else {
                    Vec::new()
                };
                Vertex { vwgt, edges, ewgts }
            })
            .collect();

        Self {
            vtxs,
            nedges: nedges / 2,
            using_vwgts,
            using_ewgts,
        }
    }

    #[inline]
    pub fn nvtxs(&self) -> usize {
        self.vtxs.len()
    }

    pub fn total_vwgt(&self) -> i64 {
        self.vtxs.iter().map(|v| v.vwgt as i64).sum()
    }

    pub fn max_vwgt(&self) -> i32 {
        self.vtxs.iter().map(|v| v.vwgt).max().unwrap_or(0)
    }

    /// Recomputes every self slot from the remaining weights
    pub fn fix_self_slots(&mut self) {
        if !self.using_ewgts {
            return;
        }
        for v in &mut self.vtxs {
            v.ewgts[0] = -v.ewgts[1..].iter().sum::<f32>();
        }
    }

    /// Adds weight to the edge (u, v), creating it when missing
    pub fn add_edge(&mut self, u: usize, v: usize, w: f32) {
        debug_assert!(self.using_ewgts || w == 1.0);
        for (a, b) in [(u, v), (v, u)] {
            let vtx = &mut self.vtxs[a];
            match vtx.edges[1..].iter().position(|&x| x == b) {
                Some(k) => {
                    if self.using_ewgts {
                        vtx.ewgts[k + 1] += w;
                        vtx.ewgts[0] -= w;
                    }
                }
                None => {
                    vtx.edges.push(b);
                    if self.using_ewgts {
                        vtx.ewgts.push(w);
                        vtx.ewgts[0] -= w;
                    }
                    if a == u {
                        self.nedges += 1;
                    }
                }
            }
        }
    }

    /// Removes the edge (u, v) entirely. Returns false if it did not exist.
    pub fn remove_edge(&mut self, u: usize, v: usize) -> bool {
        let mut found = false;
        for (a, b) in [(u, v), (v, u)] {
            let vtx = &mut self.vtxs[a];
            if let Some(k) = vtx.edges[1..].iter().position(|&x| x == b) {
                vtx.edges.remove(k + 1);
                if !vtx.ewgts.is_empty() {
                    let w = vtx.ewgts.remove(k + 1);
                    vtx.ewgts[0] += w;
                }
                found = true;
            }
        }
        if found {
            self.nedges -= 1;
        }
        found
    }

    /// Converts an unweighted graph to one with explicit unit edge weights
    pub fn ensure_ewgts(&mut self) {
        if self.using_ewgts {
            return;
        }
        for v in &mut self.vtxs {
            let deg = v.degree();
            v.ewgts = Vec::with_capacity(deg + 1);
            v.ewgts.push(-(deg as f32));
            v.ewgts.extend(std::iter::repeat(1.0).take(deg));
        }
        self.using_ewgts = true;
    }

    /// Weight of all cut edges, each edge counted once
    pub fn cut_size(&self, assignment: &[usize]) -> f64 {
        let mut cut = 0.0;
        for (i, v) in self.vtxs.iter().enumerate() {
            for (j, w) in v.adj() {
                if assignment[i] != assignment[j] {
                    cut += w as f64;
                }
            }
        }
        cut / 2.0
    }

    /// Vertex weight in each of `nsets` sets. Vertices with ids `>= nsets` are ignored.
    pub fn set_weights(&self, assignment: &[usize], nsets: usize) -> Vec<i64> {
        let mut wgts = vec![0; nsets];
        for (v, &set) in self.vtxs.iter().zip(assignment) {
            if set < nsets {
                wgts[set] += v.vwgt as i64;
            }
        }
        wgts
    }

    /// Square roots of the vertex weights, the null vector of the normalized Laplacian
    pub fn vwsqrt(&self) -> Vec<f64> {
        self.vtxs.iter().map(|v| (v.vwgt as f64).sqrt()).collect()
    }
}

/// A compact copy of part of a graph together with its vertex map.
#[derive(Debug, Clone)]
pub struct Subgraph {
    pub graph: Graph,
    /// local vertex id -> vertex id in the parent graph
    pub loc2glob: Vec<usize>,
}

impl Subgraph {
    /// Writes per-vertex local values back into the parent's array
    pub fn scatter<T: Copy>(&self, local: &[T], global: &mut [T]) {
        for (&g, &x) in self.loc2glob.iter().zip(local) {
            global[g] = x;
        }
    }

    /// Reads per-vertex values of the parent into a local array
    pub fn gather<T: Copy>(&self, global: &[T]) -> Vec<T> {
        self.loc2glob.iter().map(|&g| global[g]).collect()
    }
}

/// Builds the subgraph induced by `vertices`. Edges leaving the set are dropped and the self
/// slots are recomputed.
///
/// `glob2loc` is scratch space with one entry per parent vertex; it must be all `None` on entry
/// and is left that way on return.
pub fn make_subgraph(
    graph: &Graph,
    vertices: &[usize],
    glob2loc: &mut [Option<usize>],
) -> Subgraph {
    for (l, &g) in vertices.iter().enumerate() {
        debug_assert!(glob2loc[g].is_none());
        glob2loc[g] = Some(l);
    }

    let mut nedges = 0;
    let mut vtxs = Vec::with_capacity(vertices.len());
    for (l, &g) in vertices.iter().enumerate() {
        let vtx = &graph.vtxs[g];
        let mut edges = Vec::with_capacity(vtx.edges.len());
        let mut ewgts = Vec::new();
        edges.push(l);
        if graph.using_ewgts {
            ewgts.reserve(vtx.edges.len());
            ewgts.push(0.0);
        }
        for (k, &u) in vtx.edges.iter().enumerate().skip(1) {
            if let Some(lu) = glob2loc[u] {
                edges.push(lu);
                if graph.using_ewgts {
                    ewgts.push(vtx.ewgts[k]);
                }
            }
        }
        if graph.using_ewgts {
            ewgts[0] = -ewgts[1..].iter().sum::<f32>();
        }
        nedges += edges.len() - 1;
        vtxs.push(Vertex {
            vwgt: vtx.vwgt,
            edges,
            ewgts,
        });
    }

    for &g in vertices {
        glob2loc[g] = None;
    }

    Subgraph {
        graph: Graph {
            vtxs,
            nedges: nedges / 2,
            using_vwgts: graph.using_vwgts,
            using_ewgts: graph.using_ewgts,
        },
        loc2glob: vertices.to_vec(),
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::util::{create_dummy_graph, create_grid_graph};

    #[test]
    fn ring_from_csr() {
        let (xadj, adjncy) = create_dummy_graph(5);
        let graph = Graph::from_csr(&GraphInput::new(&xadj, &adjncy)).unwrap();
        assert_eq!(graph.nvtxs(), 5);
        assert_eq!(graph.nedges, 5);
        assert_eq!(graph.vtxs[2].edges, vec![2, 3, 1]);
        assert_eq!(graph.vtxs[2].ewgt_sum(), 2.0);
        assert_eq!(graph.total_vwgt(), 5);
    }

    #[test]
    fn weighted_self_slot() {
        let xadj = [0, 2, 3, 4];
        let adjncy = [1, 2, 0, 0];
        let ewgts = [2.0, 0.5, 2.0, 0.5];
        let graph =
            Graph::from_csr(&GraphInput::new(&xadj, &adjncy).with_ewgts(&ewgts)).unwrap();
        assert_eq!(graph.vtxs[0].ewgts, vec![-2.5, 2.0, 0.5]);
        assert_eq!(graph.vtxs[1].ewgt_sum(), 2.0);
    }

    #[test]
    fn rejects_self_loop() {
        let xadj = [0, 2, 3];
        let adjncy = [0, 1, 0];
        assert!(matches!(
            Graph::from_csr(&GraphInput::new(&xadj, &adjncy)),
            Err(ChacoError::InvalidInput(_))
        ));
    }

    #[test]
    fn rejects_dangling_index() {
        let xadj = [0, 1, 2];
        let adjncy = [1, 7];
        assert!(Graph::from_csr(&GraphInput::new(&xadj, &adjncy)).is_err());
    }

    #[test]
    fn cut_of_ring() {
        let (xadj, adjncy) = create_dummy_graph(8);
        let graph = Graph::from_csr(&GraphInput::new(&xadj, &adjncy)).unwrap();
        assert_eq!(graph.cut_size(&[0, 0, 0, 0, 1, 1, 1, 1]), 2.0);
        assert_eq!(graph.cut_size(&[0, 1, 0, 1, 0, 1, 0, 1]), 8.0);
    }

    #[test]
    fn subgraph_drops_outside_edges() {
        let (xadj, adjncy) = create_grid_graph(3, 3);
        let graph = Graph::from_csr(&GraphInput::new(&xadj, &adjncy)).unwrap();
        let mut glob2loc = vec![None; 9];
        // left column
        let sub = make_subgraph(&graph, &[0, 3, 6], &mut glob2loc);
        assert!(glob2loc.iter().all(|x| x.is_none()));
        assert_eq!(sub.graph.nvtxs(), 3);
        assert_eq!(sub.graph.nedges, 2);
        assert_eq!(sub.graph.vtxs[1].neighbors(), &[0, 2]);

        let mut global = vec![9; 9];
        sub.scatter(&[1, 2, 3], &mut global);
        assert_eq!(global[3], 2);
        assert_eq!(sub.gather(&global), vec![1, 2, 3]);
    }

    #[test]
    fn add_and_remove_edges() {
        let (xadj, adjncy) = create_dummy_graph(4);
        let mut graph = Graph::from_csr(&GraphInput::new(&xadj, &adjncy)).unwrap();
        graph.ensure_ewgts();
        graph.add_edge(0, 2, 0.5);
        assert_eq!(graph.nedges, 5);
        assert_eq!(graph.vtxs[0].ewgt_sum(), 2.5);
        assert!(graph.remove_edge(2, 0));
        assert_eq!(graph.nedges, 4);
        assert_eq!(graph.vtxs[0].ewgt_sum(), 2.0);
        assert!(!graph.remove_edge(0, 2));
    }
}
