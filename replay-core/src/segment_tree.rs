//! Segment trees for prioritized sampling.
//!
//! A single generic [`SegmentTree`] aggregates its leaves with an
//! [`Operation`]. Prioritized replay uses two instances over the same slots:
//!
//! - [`SumTree`] answers range sums and maps a cumulative mass back to the
//!   leaf that owns it ([`SegmentTree::find_prefix_index`]).
//! - [`MinTree`] keeps the minimum priority, used to normalize importance
//!   sampling weights.
//!
//! Nodes are stored in a flat array of length `2 * capacity`. Node `1` is
//! the root, node `i` has children `2i` and `2i + 1`, and leaf `j` lives at
//! `capacity + j`. Node `0` is unused.
mod ops;
use crate::error::{ReplayError, Result};
use num_traits::Float;
pub use ops::{Min, Operation, Sum};

/// Segment tree over `f32` priorities aggregated by addition.
pub type SumTree = SegmentTree<f32, Sum>;

/// Segment tree over `f32` priorities aggregated by minimum.
pub type MinTree = SegmentTree<f32, Min>;

/// A complete binary tree whose internal nodes hold the aggregate of their
/// subtrees.
///
/// Every internal node is recomputed from its two children on each
/// [`set`](SegmentTree::set), so aggregates are always up to date.
#[derive(Clone, Debug)]
pub struct SegmentTree<N, O> {
    /// Number of leaves, a power of two.
    capacity: usize,

    /// Nodes, root at index 1.
    nodes: Vec<N>,

    /// Aggregation operation.
    op: O,
}

impl<N, O> SegmentTree<N, O>
where
    N: Copy,
    O: Operation<N>,
{
    /// Creates a tree with `capacity` leaves, all set to the identity of `op`.
    ///
    /// # Errors
    ///
    /// Returns [`ReplayError::InvalidCapacity`] if `capacity` is zero or not
    /// a power of two.
    pub fn new(capacity: usize, op: O) -> Result<Self> {
        if capacity == 0 || !capacity.is_power_of_two() {
            return Err(ReplayError::InvalidCapacity(capacity));
        }

        Ok(Self {
            capacity,
            nodes: vec![op.identity(); 2 * capacity],
            op,
        })
    }

    /// Returns the number of leaves.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    #[inline]
    fn check_index(&self, index: usize) -> Result<()> {
        if index < self.capacity {
            Ok(())
        } else {
            Err(ReplayError::IndexOutOfRange {
                index,
                len: self.capacity,
            })
        }
    }

    /// Sets the value of leaf `index` and recomputes its ancestors.
    pub fn set(&mut self, index: usize, value: N) -> Result<()> {
        self.check_index(index)?;
        self.update(index, value);
        Ok(())
    }

    /// [`set`](Self::set) for callers that already hold a valid index.
    pub(crate) fn update(&mut self, index: usize, value: N) {
        let mut ix = index + self.capacity;
        self.nodes[ix] = value;
        while ix > 1 {
            ix /= 2;
            self.nodes[ix] = self.op.combine(self.nodes[2 * ix], self.nodes[2 * ix + 1]);
        }
    }

    /// Returns the value of leaf `index`.
    pub fn get(&self, index: usize) -> Result<N> {
        self.check_index(index)?;
        Ok(self.nodes[index + self.capacity])
    }

    /// Returns the aggregate of all leaves.
    #[inline]
    pub fn root(&self) -> N {
        self.nodes[1]
    }

    /// Returns the aggregate of the leaves in `[lo, hi]` (both inclusive).
    pub fn range_combine(&self, lo: usize, hi: usize) -> Result<N> {
        self.check_index(hi)?;
        if lo > hi {
            return Err(ReplayError::IndexOutOfRange {
                index: lo,
                len: self.capacity,
            });
        }

        // Half-open interval of node indices at the current level.
        let mut l = lo + self.capacity;
        let mut r = hi + self.capacity + 1;
        let mut acc_l = self.op.identity();
        let mut acc_r = self.op.identity();

        while l < r {
            if l & 1 == 1 {
                acc_l = self.op.combine(acc_l, self.nodes[l]);
                l += 1;
            }
            if r & 1 == 1 {
                r -= 1;
                acc_r = self.op.combine(self.nodes[r], acc_r);
            }
            l /= 2;
            r /= 2;
        }

        Ok(self.op.combine(acc_l, acc_r))
    }

    /// Sets every leaf back to the identity.
    pub fn clear(&mut self) {
        let identity = self.op.identity();
        self.nodes.iter_mut().for_each(|n| *n = identity);
    }
}

impl<N: Float> SegmentTree<N, Sum> {
    /// Returns the sum of all leaves.
    #[inline]
    pub fn sum(&self) -> N {
        self.root()
    }

    /// Returns the smallest leaf index `i` such that the sum of leaves
    /// `[0, i]` exceeds `target`.
    ///
    /// The descent never enters a subtree without mass, so an index whose
    /// leaf is zero is never returned.
    ///
    /// # Errors
    ///
    /// Returns [`ReplayError::PrefixOutOfRange`] unless `0 <= target < sum()`.
    pub fn find_prefix_index(&self, target: N) -> Result<usize> {
        let total = self.sum();
        if !(target >= N::zero() && target < total) {
            return Err(ReplayError::PrefixOutOfRange {
                target: target.to_f64().unwrap_or(f64::NAN),
                total: total.to_f64().unwrap_or(f64::NAN),
            });
        }

        let mut ix = 1;
        let mut mass = target;
        while ix < self.capacity {
            let left = 2 * ix;
            let right = left + 1;
            if mass < self.nodes[left] || self.nodes[right] <= N::zero() {
                ix = left;
            } else {
                mass = mass - self.nodes[left];
                ix = right;
            }
        }

        Ok(ix - self.capacity)
    }
}

impl<N: Float> SegmentTree<N, Min> {
    /// Returns the minimum over all leaves, `+inf` if no leaf was set.
    #[inline]
    pub fn min(&self) -> N {
        self.root()
    }
}

#[cfg(test)]
impl<N, O> SegmentTree<N, O>
where
    N: Copy + PartialEq,
    O: Operation<N>,
{
    /// Whether every internal node equals the combination of its children.
    fn is_consistent(&self) -> bool {
        (1..self.capacity).all(|ix| {
            self.nodes[ix] == self.op.combine(self.nodes[2 * ix], self.nodes[2 * ix + 1])
        })
    }
}
