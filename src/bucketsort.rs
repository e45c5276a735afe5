/*
\file
\brief Counting sort of small integer keys, and the bucket lists of move gains used by the KL
refiners.
*/

use log::warn;

use crate::util::make_csr;

/// Counting sort of `tperm` by `keys`, stable with respect to the order of `tperm`. Keys lie in
/// `0..=max`. Used to visit vertices by increasing degree during matching.
pub fn bucket_sort_keys_inc(keys: &[usize], max: usize, tperm: &[usize]) -> Vec<usize> {
    let mut counts = vec![0; max + 2];
    for &k in keys {
        counts[k] += 1;
    }
    make_csr(&mut counts);

    let mut perm = vec![0; tperm.len()];
    for &i in tperm {
        let cnt = &mut counts[keys[i]];
        perm[*cnt] = i;
        *cnt += 1;
    }
    perm
}

/// Doubly linked lists of vertices bucketed by gain, one table per (from, to) set pair.
///
/// A vertex currently in set `from` has one node per destination set, with id `v * nsets + to`.
#[derive(Debug)]
pub struct Buckets {
    nsets: usize,
    maxgain: i64,
    nslots: usize,
    heads: Vec<Option<usize>>,
    next: Vec<Option<usize>>,
    prev: Vec<Option<usize>>,
    /// per pair, no slot above this one is occupied
    tops: Vec<usize>,
}

impl Buckets {
    /// Reserves the tables, or returns `None` when they would exceed `max_space` entries or the
    /// allocation fails.
    pub fn try_new(nvtxs: usize, nsets: usize, maxgain: i64, max_space: usize) -> Option<Self> {
        let nslots = 2 * maxgain.max(0) as usize + 1;
        let npairs = nsets * nsets;
        let space = npairs
            .checked_mul(nslots)?
            .checked_add(nvtxs.checked_mul(nsets)?.checked_mul(2)?)?;
        if space > max_space {
            warn!("no space to perform local refinement ({space} bucket entries needed)");
            return None;
        }

        let alloc = |len: usize| -> Option<Vec<Option<usize>>> {
            let mut v = Vec::new();
            v.try_reserve_exact(len).ok()?;
            v.resize(len, None);
            Some(v)
        };
        let (Some(heads), Some(next), Some(prev)) = (
            alloc(npairs * nslots),
            alloc(nvtxs * nsets),
            alloc(nvtxs * nsets),
        ) else {
            warn!("no space to perform local refinement");
            return None;
        };

        Some(Self {
            nsets,
            maxgain: maxgain.max(0),
            nslots,
            heads,
            next,
            prev,
            tops: vec![0; npairs],
        })
    }

    fn slot(&self, gain: i64) -> usize {
        (gain.clamp(-self.maxgain, self.maxgain) + self.maxgain) as usize
    }

    fn head(&self, from: usize, to: usize, slot: usize) -> usize {
        (from * self.nsets + to) * self.nslots + slot
    }

    /// empties every list
    pub fn clear(&mut self) {
        self.heads.iter_mut().for_each(|h| *h = None);
        self.next.iter_mut().for_each(|h| *h = None);
        self.prev.iter_mut().for_each(|h| *h = None);
        self.tops.iter_mut().for_each(|t| *t = 0);
    }

    pub fn insert(&mut self, v: usize, from: usize, to: usize, gain: i64) {
        let slot = self.slot(gain);
        let h = self.head(from, to, slot);
        let node = v * self.nsets + to;
        self.prev[node] = None;
        self.next[node] = self.heads[h];
        if let Some(old) = self.heads[h] {
            self.prev[old] = Some(node);
        }
        self.heads[h] = Some(node);
        let top = &mut self.tops[from * self.nsets + to];
        *top = (*top).max(slot);
    }

    /// Unlinks `v` from its (from, to) list. `gain` must be the gain it was inserted with.
    pub fn remove(&mut self, v: usize, from: usize, to: usize, gain: i64) {
        let node = v * self.nsets + to;
        let h = self.head(from, to, self.slot(gain));
        match self.prev[node] {
            Some(p) => self.next[p] = self.next[node],
            None => {
                debug_assert_eq!(self.heads[h], Some(node));
                self.heads[h] = self.next[node];
            }
        }
        if let Some(n) = self.next[node] {
            self.prev[n] = self.prev[node];
        }
        self.next[node] = None;
        self.prev[node] = None;
    }

    /// Vertex with the largest gain for moving from `from` to `to`
    pub fn best(&mut self, from: usize, to: usize) -> Option<(usize, i64)> {
        let pair = from * self.nsets + to;
        let mut slot = self.tops[pair];
        loop {
            if let Some(node) = self.heads[self.head(from, to, slot)] {
                self.tops[pair] = slot;
                return Some((node / self.nsets, slot as i64 - self.maxgain));
            }
            if slot == 0 {
                self.tops[pair] = 0;
                return None;
            }
            slot -= 1;
        }
    }

    /// All vertices in one gain bucket, most recently inserted first
    pub fn bucket(&self, from: usize, to: usize, gain: i64) -> impl Iterator<Item = usize> + '_ {
        let mut cur = self.heads[self.head(from, to, self.slot(gain))];
        std::iter::from_fn(move || {
            let node = cur?;
            cur = self.next[node];
            Some(node / self.nsets)
        })
    }
}
