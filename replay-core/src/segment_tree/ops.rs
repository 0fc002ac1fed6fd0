//! Associative operations aggregated by [`SegmentTree`](super::SegmentTree).
use num_traits::Float;

/// An associative operation with an identity element.
///
/// `combine(identity(), a) == a` must hold for every `a`, so that unused
/// leaves never influence aggregates.
pub trait Operation<N> {
    /// Identity element of the operation.
    fn identity(&self) -> N;

    /// Combines two values.
    fn combine(&self, a: N, b: N) -> N;
}

/// Addition, with identity `0`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Sum;

impl<N: Float> Operation<N> for Sum {
    #[inline]
    fn identity(&self) -> N {
        N::zero()
    }

    #[inline]
    fn combine(&self, a: N, b: N) -> N {
        a + b
    }
}

/// Minimum, with identity `+inf`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Min;

impl<N: Float> Operation<N> for Min {
    #[inline]
    fn identity(&self) -> N {
        N::infinity()
    }

    #[inline]
    fn combine(&self, a: N, b: N) -> N {
        a.min(b)
    }
}
