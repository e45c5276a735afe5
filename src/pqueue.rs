/*
\file
\brief Indexed binary min-heap

After inserting an (index, key) pair the entry can be found, rekeyed or removed through its
index. Used by the rebalancing chains of the 2d/3d mappers, where each (from, to) set pair owns
one queue keyed by move cost.
*/

#[derive(Default, Clone, Copy, Debug)]
struct Node<K> {
    key: K,
    val: usize,
}

/// Priority queue augmented with indices. The smallest key is on top.
#[derive(Debug, Clone)]
pub struct IndexedPriorityQueue<K: PartialOrd + Copy + Default> {
    nnodes: usize,
    locator: Box<[Option<usize>]>,
    heap: Box<[Node<K>]>,
}

impl<K: PartialOrd + Copy + Default> IndexedPriorityQueue<K> {
    /// queue for indices `0..maxnodes`
    pub fn new(maxnodes: usize) -> Self {
        Self {
            nnodes: 0,
            heap: vec![Node::default(); maxnodes].into_boxed_slice(),
            locator: vec![None; maxnodes].into_boxed_slice(),
        }
    }

    pub fn len(&self) -> usize {
        self.nnodes
    }

    pub fn is_empty(&self) -> bool {
        self.nnodes == 0
    }

    fn place(&mut self, i: usize, node: Node<K>) {
        self.heap[i] = node;
        self.locator[node.val] = Some(i);
    }

    fn filter_up(&mut self, mut i: usize, node: Node<K>) {
        while i > 0 {
            let j = (i - 1) >> 1;
            if node.key < self.heap[j].key {
                let parent = self.heap[j];
                self.place(i, parent);
                i = j;
            } else {
                break;
            }
        }
        self.place(i, node);
    }

    fn filter_down(&mut self, mut i: usize, node: Node<K>) {
        let nnodes = self.nnodes;
        loop {
            let mut j = (i << 1) + 1;
            if j >= nnodes {
                break;
            }
            if j + 1 < nnodes && self.heap[j + 1].key < self.heap[j].key {
                j += 1;
            }
            if self.heap[j].key < node.key {
                let child = self.heap[j];
                self.place(i, child);
                i = j;
            } else {
                break;
            }
        }
        self.place(i, node);
    }

    /// insert an item
    pub fn insert(&mut self, index: usize, key: K) {
        debug_assert!(self.locator[index].is_none());
        let i = self.nnodes;
        self.nnodes += 1;
        self.filter_up(i, Node { key, val: index });
        debug_assert!(self.check_heap());
    }

    /// delete an item, returns false if it was not in the queue
    pub fn delete(&mut self, index: usize) -> bool {
        let Some(i) = self.locator[index].take() else {
            return false;
        };
        self.nnodes -= 1;
        if i != self.nnodes {
            let last = self.heap[self.nnodes];
            if last.key < self.heap[i].key {
                self.filter_up(i, last);
            } else {
                self.filter_down(i, last);
            }
        }
        debug_assert!(self.check_heap());
        true
    }

    /// changes the key of an item already in the queue
    pub fn update(&mut self, index: usize, newkey: K) {
        let Some(i) = self.locator[index] else {
            debug_assert!(false, "update of an item not in the queue");
            return;
        };
        let oldkey = self.heap[i].key;
        let node = Node {
            key: newkey,
            val: index,
        };
        if newkey < oldkey {
            self.filter_up(i, node);
        } else {
            self.filter_down(i, node);
        }
        debug_assert!(self.check_heap());
    }

    /// removes and returns the item with the smallest key
    pub fn get_top(&mut self) -> Option<usize> {
        if self.nnodes == 0 {
            return None;
        }
        let top = self.heap[0].val;
        self.delete(top);
        Some(top)
    }

    pub fn see_top_val(&self) -> Option<usize> {
        (self.nnodes > 0).then(|| self.heap[0].val)
    }

    pub fn see_top_key(&self) -> Option<K> {
        (self.nnodes > 0).then(|| self.heap[0].key)
    }

    pub fn see_key(&self, index: usize) -> Option<K> {
        self.locator[index].map(|i| self.heap[i].key)
    }

    /// checks the consistency of the heap
    pub fn check_heap(&self) -> bool {
        for i in 0..self.nnodes {
            if self.locator[self.heap[i].val] != Some(i) {
                return false;
            }
            if i > 0 && self.heap[i].key < self.heap[(i - 1) / 2].key {
                return false;
            }
        }
        self.locator.iter().filter(|l| l.is_some()).count() == self.nnodes
    }
}
