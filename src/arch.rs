/*
\file
\brief Target architectures and the regions of final sets that recursive division works on.

Hypercube sets are numbered by their binary labels, so the distance between two sets is the
number of differing bits. Mesh sets are numbered `x + dims[0] * (y + dims[1] * z)` and their
distance is the Manhattan distance between the grid positions.
*/

use crate::error::{ChacoError, Result};
use crate::util::hops;

/// Largest hypercube dimension accepted
pub const MAX_CUBE_DIM: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Architecture {
    Hypercube { ndims_tot: usize },
    Mesh { dims: [usize; 3] },
}

/// A set of final sets still to be separated: a subcube or a sub-box of the mesh.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetRegion {
    /// sets `prefix << nfree .. (prefix + 1) << nfree`
    Cube { prefix: usize, nfree: usize },
    /// grid positions `lo[d] .. hi[d]` along every dimension
    Box { lo: [usize; 3], hi: [usize; 3] },
}

impl Architecture {
    pub fn nsets_tot(&self) -> usize {
        match *self {
            Architecture::Hypercube { ndims_tot } => 1 << ndims_tot,
            Architecture::Mesh { dims } => dims.iter().product(),
        }
    }

    pub fn check(&self) -> Result<()> {
        match *self {
            Architecture::Hypercube { ndims_tot } if ndims_tot > MAX_CUBE_DIM => {
                Err(ChacoError::InvalidParams(format!(
                    "hypercube dimension {ndims_tot} exceeds {MAX_CUBE_DIM}"
                )))
            }
            Architecture::Mesh { dims } if dims.contains(&0) => Err(ChacoError::InvalidParams(
                format!("mesh dimensions must be positive, got {dims:?}"),
            )),
            _ => Ok(()),
        }
    }

    /// Mesh extents; a hypercube is laid out along the first axis
    fn dims(&self) -> [usize; 3] {
        match *self {
            Architecture::Hypercube { .. } => [self.nsets_tot(), 1, 1],
            Architecture::Mesh { dims } => dims,
        }
    }

    /// Grid position of a mesh set
    fn position(&self, set: usize) -> [usize; 3] {
        let dims = self.dims();
        [set % dims[0], (set / dims[0]) % dims[1], set / (dims[0] * dims[1])]
    }

    /// Number of hops between final sets `a` and `b`
    pub fn hops(&self, a: usize, b: usize) -> usize {
        match *self {
            Architecture::Hypercube { .. } => hops(a, b),
            Architecture::Mesh { .. } => {
                let (pa, pb) = (self.position(a), self.position(b));
                (0..3).map(|d| pa[d].abs_diff(pb[d])).sum()
            }
        }
    }

    /// The region holding every final set
    pub fn root(&self) -> SetRegion {
        match *self {
            Architecture::Hypercube { ndims_tot } => SetRegion::Cube {
                prefix: 0,
                nfree: ndims_tot,
            },
            Architecture::Mesh { dims } => SetRegion::Box { lo: [0; 3], hi: dims },
        }
    }

    /// Splits `region` into local sets for one division step with up to `ndims` cuts.
    ///
    /// Child `l` of a subcube fixes the next bits to `l`, so local labels are hypercube labels.
    /// A box is halved along its longest dimension, lower half first.
    pub fn split(&self, region: SetRegion, ndims: usize) -> Vec<SetRegion> {
        match region {
            SetRegion::Cube { prefix, nfree } => {
                let k = ndims.min(nfree);
                (0..1 << k)
                    .map(|l| SetRegion::Cube {
                        prefix: (prefix << k) | l,
                        nfree: nfree - k,
                    })
                    .collect()
            }
            SetRegion::Box { lo, hi } => {
                let d = (0..3).max_by_key(|&d| (hi[d] - lo[d], 3 - d)).unwrap_or(0);
                let mid = lo[d] + (hi[d] - lo[d]) / 2;
                let (mut hi0, mut lo1) = (hi, lo);
                hi0[d] = mid;
                lo1[d] = mid;
                vec![SetRegion::Box { lo, hi: hi0 }, SetRegion::Box { lo: lo1, hi }]
            }
        }
    }

    /// Final sets in `region`
    pub fn sets(&self, region: SetRegion) -> Vec<usize> {
        match region {
            SetRegion::Cube { prefix, nfree } => {
                ((prefix << nfree)..((prefix + 1) << nfree)).collect()
            }
            SetRegion::Box { lo, hi } => {
                let dims = self.dims();
                let mut sets = Vec::new();
                for z in lo[2]..hi[2] {
                    for y in lo[1]..hi[1] {
                        for x in lo[0]..hi[0] {
                            sets.push(x + dims[0] * (y + dims[1] * z));
                        }
                    }
                }
                sets
            }
        }
    }

    /// Fewest hops between any set of `a` and any set of `b`
    pub fn region_distance(&self, a: SetRegion, b: SetRegion) -> usize {
        match (a, b) {
            (
                SetRegion::Cube { prefix: pa, nfree: fa },
                SetRegion::Cube { prefix: pb, nfree: fb },
            ) => {
                // only bits fixed in both regions can differ everywhere
                let free = fa.max(fb);
                hops(pa << fa >> free, pb << fb >> free)
            }
            (SetRegion::Box { lo: la, hi: ha }, SetRegion::Box { lo: lb, hi: hb }) => (0..3)
                .map(|d| {
                    if ha[d] <= lb[d] {
                        lb[d] + 1 - ha[d]
                    } else if hb[d] <= la[d] {
                        la[d] + 1 - hb[d]
                    } else {
                        0
                    }
                })
                .sum(),
            _ => 0,
        }
    }
}

impl SetRegion {
    /// true once the region is a single final set
    pub fn is_final(&self) -> bool {
        match *self {
            SetRegion::Cube { nfree, .. } => nfree == 0,
            SetRegion::Box { lo, hi } => (0..3).all(|d| hi[d] - lo[d] == 1),
        }
    }
}
