/*
\file
\brief Small helpers shared by the whole crate: the debug gate, CSR construction and
verification helpers used by the test suites.
*/

/// Evaluate `$body` only when `$flag` is set in the debug level bit set
#[macro_export]
macro_rules! ifset {
    ($dbglvl:expr, $flag:expr, $body:expr $(,)?) => {
        if $dbglvl & ($flag as u32) != 0 {
            $body;
        }
    };
}

/// Turns a slice of counts into CSR offsets in place.
///
/// `a` has one more element than there are counts; on return `a[i]` is the start of bucket `i`
/// and `a[n]` the total.
///
/// ```
/// # use chaco::util::make_csr;
/// let mut a = vec![2, 0, 3, 1, 0];
/// make_csr(&mut a);
/// assert_eq!(a, vec![0, 2, 2, 5, 6]);
/// ```
#[inline(always)]
pub fn make_csr(a: &mut [usize]) {
    let n = a.len() - 1;
    if n == 0 {
        a[0] = 0;
        return;
    }

    for i in 1..n {
        a[i] += a[i - 1];
    }
    for i in (1..=n).rev() {
        a[i] = a[i - 1];
    }
    a[0] = 0;
}

/// Index of the largest element, first one on ties. Returns 0 for an empty slice.
pub fn argmax<T: PartialOrd + Copy>(x: &[T]) -> usize {
    let mut max = 0;
    for j in 1..x.len() {
        if x[j] > x[max] {
            max = j;
        }
    }
    max
}

/// Index of the smallest element, first one on ties. Returns 0 for an empty slice.
pub fn argmin<T: PartialOrd + Copy>(x: &[T]) -> usize {
    let mut min = 0;
    for j in 1..x.len() {
        if x[j] < x[min] {
            min = j;
        }
    }
    min
}

/// Number of differing bits between two hypercube set ids
#[inline(always)]
pub fn hops(a: usize, b: usize) -> usize {
    (a ^ b).count_ones() as usize
}

/// Gray code of `i`
#[inline(always)]
pub fn gray(i: usize) -> usize {
    i ^ (i >> 1)
}

/// Reverses the low `nbits` bits of `i`
#[inline(always)]
pub fn bit_reverse(i: usize, nbits: usize) -> usize {
    let mut out = 0;
    for b in 0..nbits {
        if i & (1 << b) != 0 {
            out |= 1 << (nbits - 1 - b);
        }
    }
    out
}

/// returns (xadj, adjncy) of a ring with `nvtxs` vertices
pub fn create_dummy_graph(nvtxs: usize) -> (Vec<usize>, Vec<usize>) {
    let mut xadj = Vec::with_capacity(nvtxs + 1);
    let mut adjncy = Vec::with_capacity(nvtxs * 2);
    for x in 0..nvtxs {
        xadj.push(adjncy.len());
        adjncy.push((x + 1) % nvtxs);
        adjncy.push((x + nvtxs - 1) % nvtxs);
    }
    xadj.push(adjncy.len());

    (xadj, adjncy)
}

/// returns (xadj, adjncy) of an `nx` by `ny` grid, vertex `x + nx * y`
pub fn create_grid_graph(nx: usize, ny: usize) -> (Vec<usize>, Vec<usize>) {
    let mut xadj = Vec::with_capacity(nx * ny + 1);
    let mut adjncy = Vec::with_capacity(nx * ny * 4);
    for y in 0..ny {
        for x in 0..nx {
            xadj.push(adjncy.len());
            if y > 0 {
                adjncy.push(x + nx * (y - 1));
            }
            if x > 0 {
                adjncy.push(x - 1 + nx * y);
            }
            if x + 1 < nx {
                adjncy.push(x + 1 + nx * y);
            }
            if y + 1 < ny {
                adjncy.push(x + nx * (y + 1));
            }
        }
    }
    xadj.push(adjncy.len());

    (xadj, adjncy)
}

/// Checks that a partition is a complete assignment into `nsets` sets and returns
/// (per set weights, cut weight)
///
/// The cut is counted once per edge.
pub fn verify_part(
    xadj: &[usize],
    adjncy: &[usize],
    vwgts: Option<&[i32]>,
    ewgts: Option<&[f32]>,
    part: &[usize],
    nsets: usize,
) -> (Vec<i64>, f64) {
    assert!(nsets > 0);
    assert_eq!(
        xadj.len() - 1,
        part.len(),
        "part is the set that each vertex goes to"
    );

    let nvtxs = part.len();
    let mut pwgts = vec![0i64; nsets];
    let mut cut = 0.0;
    for i in 0..nvtxs {
        assert!(part[i] < nsets, "vertex {i} is in set {}", part[i]);
        pwgts[part[i]] += vwgts.map(|v| v[i]).unwrap_or(1) as i64;
        for j in xadj[i]..xadj[i + 1] {
            if part[i] != part[adjncy[j]] {
                cut += ewgts.map(|v| v[j]).unwrap_or(1.0) as f64;
            }
        }
    }

    (pwgts, cut / 2.0)
}
