/*
\file
\brief Minimum vertex covers of bipartite graphs.

Unit weight covers come from a maximum matching (Hopcroft-Karp) through König's theorem. Weighted
covers come from a minimum cut of the flow network source -> left -> right -> sink, with the
vertex weights as capacities of the outer arcs.
*/

use std::collections::VecDeque;

/// Bipartite graph with edges stored from the left side
#[derive(Debug, Clone)]
pub struct Bipartite {
    pub nleft: usize,
    pub nright: usize,
    /// right neighbors of every left vertex
    pub adj: Vec<Vec<usize>>,
}

/// A vertex cover, flagged per side
#[derive(Debug, Clone, PartialEq)]
pub struct Cover {
    pub left: Vec<bool>,
    pub right: Vec<bool>,
}

impl Cover {
    pub fn weight(&self, lwgts: &[i64], rwgts: &[i64]) -> i64 {
        let l: i64 = self.left.iter().zip(lwgts).filter(|(&c, _)| c).map(|(_, &w)| w).sum();
        let r: i64 = self.right.iter().zip(rwgts).filter(|(&c, _)| c).map(|(_, &w)| w).sum();
        l + r
    }

    pub fn covers(&self, bp: &Bipartite) -> bool {
        bp.adj
            .iter()
            .enumerate()
            .all(|(l, list)| self.left[l] || list.iter().all(|&r| self.right[r]))
    }
}

impl Bipartite {
    /// Maximum matching. Returns its size and the partner of every left and right vertex.
    pub fn max_matching(&self) -> (usize, Vec<Option<usize>>, Vec<Option<usize>>) {
        let mut lmate: Vec<Option<usize>> = vec![None; self.nleft];
        let mut rmate: Vec<Option<usize>> = vec![None; self.nright];
        let mut size = 0;
        let mut dist = vec![usize::MAX; self.nleft];

        loop {
            // layer the free left vertices and everything reachable by alternating paths
            let mut queue = VecDeque::new();
            for l in 0..self.nleft {
                if lmate[l].is_none() {
                    dist[l] = 0;
                    queue.push_back(l);
                } else {
                    dist[l] = usize::MAX;
                }
            }
            let mut found = false;
            while let Some(l) = queue.pop_front() {
                for &r in &self.adj[l] {
                    match rmate[r] {
                        None => found = true,
                        Some(l2) if dist[l2] == usize::MAX => {
                            dist[l2] = dist[l] + 1;
                            queue.push_back(l2);
                        }
                        Some(_) => {}
                    }
                }
            }
            if !found {
                break;
            }

            for l in 0..self.nleft {
                if lmate[l].is_none() && self.augment(l, &mut dist, &mut lmate, &mut rmate) {
                    size += 1;
                }
            }
        }
        (size, lmate, rmate)
    }

    /// Depth first search along the layers for an augmenting path from `start`. Explicit stack.
    fn augment(
        &self,
        start: usize,
        dist: &mut [usize],
        lmate: &mut [Option<usize>],
        rmate: &mut [Option<usize>],
    ) -> bool {
        // (left vertex, next adjacency position), and the right vertex used to enter it
        let mut stack: Vec<(usize, usize)> = vec![(start, 0)];
        let mut via: Vec<usize> = Vec::new();
        while let Some(&mut (l, ref mut pos)) = stack.last_mut() {
            if *pos == self.adj[l].len() {
                dist[l] = usize::MAX;
                stack.pop();
                via.pop();
                continue;
            }
            let r = self.adj[l][*pos];
            *pos += 1;
            match rmate[r] {
                None => {
                    // flip the path
                    via.push(r);
                    for (&(l, _), &r) in stack.iter().zip(&via) {
                        lmate[l] = Some(r);
                        rmate[r] = Some(l);
                    }
                    return true;
                }
                Some(l2) if dist[l2] == dist[l] + 1 => {
                    via.push(r);
                    stack.push((l2, 0));
                }
                Some(_) => {}
            }
        }
        false
    }

    /// Minimum cardinality vertex cover by König's theorem
    pub fn min_cover(&self) -> Cover {
        let (_, lmate, rmate) = self.max_matching();
        // alternating reachability from the free left vertices
        let mut lvis = vec![false; self.nleft];
        let mut rvis = vec![false; self.nright];
        let mut stack: Vec<usize> = (0..self.nleft).filter(|&l| lmate[l].is_none()).collect();
        for &l in &stack {
            lvis[l] = true;
        }
        while let Some(l) = stack.pop() {
            for &r in &self.adj[l] {
                if rvis[r] {
                    continue;
                }
                rvis[r] = true;
                if let Some(l2) = rmate[r] {
                    if !lvis[l2] {
                        lvis[l2] = true;
                        stack.push(l2);
                    }
                }
            }
        }
        Cover {
            left: lvis.iter().map(|&v| !v).collect(),
            right: rvis,
        }
    }

    /// Minimum weight vertex cover from a minimum source/sink cut
    pub fn min_weight_cover(&self, lwgts: &[i64], rwgts: &[i64]) -> Cover {
        let mut net = Network::new(self, lwgts, rwgts);
        net.max_flow();
        let reach = net.source_side();
        // left vertices cut off from the source and right vertices still reachable
        Cover {
            left: (0..self.nleft).map(|l| !reach[1 + l]).collect(),
            right: (0..self.nright).map(|r| reach[1 + self.nleft + r]).collect(),
        }
    }
}

struct Arc {
    to: usize,
    cap: i64,
}

/// Residual network: node 0 is the source, then the left vertices, then the right ones, then
/// the sink. Arcs are stored in pairs, so `a ^ 1` is the reverse of `a`.
struct Network {
    arcs: Vec<Arc>,
    out: Vec<Vec<usize>>,
    sink: usize,
}

impl Network {
    fn new(bp: &Bipartite, lwgts: &[i64], rwgts: &[i64]) -> Self {
        let n = bp.nleft + bp.nright + 2;
        let sink = n - 1;
        let inf: i64 = lwgts.iter().chain(rwgts).sum::<i64>() + 1;
        let mut net = Self {
            arcs: Vec::new(),
            out: vec![Vec::new(); n],
            sink,
        };
        for l in 0..bp.nleft {
            net.add_arc(0, 1 + l, lwgts[l]);
            for &r in &bp.adj[l] {
                net.add_arc(1 + l, 1 + bp.nleft + r, inf);
            }
        }
        for r in 0..bp.nright {
            net.add_arc(1 + bp.nleft + r, sink, rwgts[r]);
        }
        net
    }

    fn add_arc(&mut self, from: usize, to: usize, cap: i64) {
        self.out[from].push(self.arcs.len());
        self.arcs.push(Arc { to, cap });
        self.out[to].push(self.arcs.len());
        self.arcs.push(Arc { to: from, cap: 0 });
    }

    /// Shortest augmenting paths until the sink is unreachable
    fn max_flow(&mut self) -> i64 {
        let n = self.out.len();
        let mut flow = 0;
        loop {
            let mut pred: Vec<Option<usize>> = vec![None; n];
            let mut seen = vec![false; n];
            seen[0] = true;
            let mut queue = VecDeque::from([0]);
            while let Some(x) = queue.pop_front() {
                if x == self.sink {
                    break;
                }
                for &a in &self.out[x] {
                    let y = self.arcs[a].to;
                    if !seen[y] && self.arcs[a].cap > 0 {
                        seen[y] = true;
                        pred[y] = Some(a);
                        queue.push_back(y);
                    }
                }
            }
            if !seen[self.sink] {
                return flow;
            }

            let mut bottleneck = i64::MAX;
            let mut x = self.sink;
            while let Some(a) = pred[x] {
                bottleneck = bottleneck.min(self.arcs[a].cap);
                x = self.arcs[a ^ 1].to;
            }
            let mut x = self.sink;
            while let Some(a) = pred[x] {
                self.arcs[a].cap -= bottleneck;
                self.arcs[a ^ 1].cap += bottleneck;
                x = self.arcs[a ^ 1].to;
            }
            flow += bottleneck;
        }
    }

    /// Nodes reachable from the source in the residual network
    fn source_side(&self) -> Vec<bool> {
        let mut seen = vec![false; self.out.len()];
        seen[0] = true;
        let mut stack = vec![0];
        while let Some(x) = stack.pop() {
            for &a in &self.out[x] {
                let y = self.arcs[a].to;
                if !seen[y] && self.arcs[a].cap > 0 {
                    seen[y] = true;
                    stack.push(y);
                }
            }
        }
        seen
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use proptest::prelude::*;

    fn brute_force_cover(bp: &Bipartite, lw: &[i64], rw: &[i64]) -> i64 {
        let n = bp.nleft + bp.nright;
        (0u32..1 << n)
            .filter_map(|mask| {
                let cover = Cover {
                    left: (0..bp.nleft).map(|l| mask >> l & 1 == 1).collect(),
                    right: (0..bp.nright).map(|r| mask >> (bp.nleft + r) & 1 == 1).collect(),
                };
                cover.covers(bp).then(|| cover.weight(lw, rw))
            })
            .min()
            .unwrap()
    }

    #[test]
    fn star_and_path() {
        // left 0 joined to every right vertex, plus a path l1 - r2 - l2
        let bp = Bipartite {
            nleft: 3,
            nright: 3,
            adj: vec![vec![0, 1, 2], vec![2], vec![2]],
        };
        let (size, lmate, _) = bp.max_matching();
        assert_eq!(size, 2);
        assert!(lmate[0].is_some());
        let cover = bp.min_cover();
        assert!(cover.covers(&bp));
        assert_eq!(cover.weight(&[1; 3], &[1; 3]), 2);
        assert!(cover.left[0] && cover.right[2]);
    }

    #[test]
    fn weighted_cover_avoids_heavy_vertex() {
        // one heavy left vertex adjacent to two light right vertices
        let bp = Bipartite {
            nleft: 1,
            nright: 2,
            adj: vec![vec![0, 1]],
        };
        let cover = bp.min_weight_cover(&[5], &[1, 1]);
        assert_eq!(cover.left, vec![false]);
        assert_eq!(cover.right, vec![true, true]);
        let cover = bp.min_weight_cover(&[1], &[1, 1]);
        assert_eq!(cover.left, vec![true]);
    }

    proptest! {
        #[test]
        fn covers_are_minimum(
            nleft in 1usize..5,
            nright in 1usize..5,
            edges in prop::collection::vec((0usize..5, 0usize..5), 0..12),
            lw in prop::collection::vec(1i64..6, 5),
            rw in prop::collection::vec(1i64..6, 5),
        ) {
            let mut adj = vec![Vec::new(); nleft];
            for (l, r) in edges {
                let (l, r) = (l % nleft, r % nright);
                if !adj[l].contains(&r) {
                    adj[l].push(r);
                }
            }
            let bp = Bipartite { nleft, nright, adj };
            let (lw, rw) = (&lw[..nleft], &rw[..nright]);

            let (size, _, _) = bp.max_matching();
            let cover = bp.min_cover();
            prop_assert!(cover.covers(&bp));
            prop_assert_eq!(cover.weight(&vec![1; nleft], &vec![1; nright]), size as i64);
            prop_assert_eq!(size as i64, brute_force_cover(&bp, &vec![1; nleft], &vec![1; nright]));

            let wcover = bp.min_weight_cover(lw, rw);
            prop_assert!(wcover.covers(&bp));
            prop_assert_eq!(wcover.weight(lw, rw), brute_force_cover(&bp, lw, rw));
        }
    }
}
