//! Replay buffer interface.
//!
//! Both sampling policies implement the two traits below, so that a
//! training loop can be written once and run with either buffer.
use anyhow::Result;

/// Interface for buffers that store experiences.
///
/// This is the side of a buffer seen by processes collecting transitions
/// from an environment.
pub trait ExperienceBufferBase {
    /// The type of items stored in the buffer.
    type Item;

    /// Pushes a new experience into the buffer.
    ///
    /// When the buffer is full the oldest experience is overwritten.
    fn push(&mut self, tr: Self::Item) -> Result<()>;

    /// Returns the current number of experiences in the buffer.
    fn len(&self) -> usize;

    /// Returns `true` if the buffer holds no experience.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Interface for replay buffers that generate batches for training.
pub trait ReplayBufferBase {
    /// Configuration parameters for the replay buffer.
    type Config: Clone;

    /// The type of batch generated for training.
    type Batch;

    /// Builds a new replay buffer from the given configuration.
    fn build(config: &Self::Config) -> Result<Self>
    where
        Self: Sized;

    /// Samples a batch of at most `size` experiences.
    fn batch(&mut self, size: usize) -> Result<Self::Batch>;

    /// Updates the priorities of experiences at `ixs` with `td_errs`.
    ///
    /// Buffers without priorities ignore this call.
    fn update_priority(&mut self, ixs: &[usize], td_errs: &[f32]) -> Result<()>;
}
