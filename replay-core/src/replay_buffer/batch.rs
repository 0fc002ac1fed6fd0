//! Batches of transitions sampled from replay buffers.

/// A batch of transitions sampled from a replay buffer.
///
/// `transitions`, `ix_sample` and (when present) `weight` are parallel
/// vectors. Indices must be passed back to
/// [`update_priorities`](super::PrioritizedReplayBuffer::update_priorities)
/// after a learning step.
#[derive(Clone, Debug, PartialEq)]
pub struct TransitionBatch<T> {
    /// Copies of the sampled transitions, in draw order.
    pub transitions: Vec<T>,

    /// Slot indices of the sampled transitions.
    pub ix_sample: Vec<usize>,

    /// Importance sampling weights, `None` for uniform sampling.
    pub weight: Option<Vec<f32>>,
}

impl<T> TransitionBatch<T> {
    /// Returns an empty batch.
    pub fn empty() -> Self {
        Self {
            transitions: vec![],
            ix_sample: vec![],
            weight: None,
        }
    }

    /// Returns the number of transitions in the batch.
    pub fn len(&self) -> usize {
        self.transitions.len()
    }

    /// Returns `true` if the batch holds no transition.
    pub fn is_empty(&self) -> bool {
        self.transitions.is_empty()
    }

    /// Iterates over `(transition, slot index, weight)`.
    ///
    /// The weight is `1.0` for batches sampled without priorities.
    pub fn iter(&self) -> impl Iterator<Item = (&T, usize, f32)> + '_ {
        self.transitions
            .iter()
            .zip(self.ix_sample.iter())
            .enumerate()
            .map(move |(k, (t, &ix))| {
                let w = self.weight.as_ref().map_or(1.0, |ws| ws[k]);
                (t, ix, w)
            })
    }

    /// Splits the batch into its parts.
    pub fn unpack(self) -> (Vec<T>, Vec<usize>, Option<Vec<f32>>) {
        (self.transitions, self.ix_sample, self.weight)
    }
}
