//! Replay buffer with uniform sampling.
use super::{ReplayBufferConfig, TransitionBatch};
use crate::{
    error::{ReplayError, Result},
    store::TransitionStore,
    ExperienceBufferBase, ReplayBufferBase, Transition,
};
use rand::{rngs::StdRng, seq::index, SeedableRng};

/// A replay buffer sampling transitions uniformly without replacement.
pub struct UniformReplayBuffer<T = Transition> {
    store: TransitionStore<T>,
    rng: StdRng,
}

impl<T: Clone> UniformReplayBuffer<T> {
    /// Creates an empty buffer.
    ///
    /// # Errors
    ///
    /// Returns [`ReplayError::InvalidCapacity`] if `config.capacity` is zero.
    pub fn new(config: &ReplayBufferConfig) -> Result<Self> {
        if config.per_config.is_some() {
            log::warn!("per_config is ignored by UniformReplayBuffer");
        }
        log::info!("Uniform replay buffer: capacity = {}", config.capacity);

        Ok(Self {
            store: TransitionStore::new(config.capacity)?,
            rng: StdRng::seed_from_u64(config.seed),
        })
    }

    /// Creates a buffer and fills it with `transitions`, in order.
    ///
    /// When there are more transitions than `config.capacity`, only the last
    /// ones are kept. Passing [`iter`](Self::iter) of another buffer copies its
    /// contents into a buffer of a different size.
    pub fn from_transitions<I>(config: &ReplayBufferConfig, transitions: I) -> Result<Self>
    where
        I: IntoIterator<Item = T>,
    {
        let mut buffer = Self::new(config)?;
        buffer.extend(transitions);
        Ok(buffer)
    }

    /// Inserts a transition and returns its slot index.
    pub fn insert(&mut self, tr: T) -> usize {
        self.store.insert(tr)
    }

    /// Inserts transitions in order.
    pub fn extend<I: IntoIterator<Item = T>>(&mut self, transitions: I) {
        for tr in transitions {
            self.store.insert(tr);
        }
    }

    /// Draws `min(batch_size, len())` distinct slot indices.
    ///
    /// # Errors
    ///
    /// Returns [`ReplayError::EmptyBuffer`] if the buffer is empty and
    /// `batch_size > 0`.
    pub fn sample_indices(&mut self, batch_size: usize) -> Result<Vec<usize>> {
        if batch_size == 0 {
            return Ok(vec![]);
        }

        let size = self.store.len();
        if size == 0 {
            return Err(ReplayError::EmptyBuffer);
        }

        let batch_size = batch_size.min(size);
        Ok(index::sample(&mut self.rng, size, batch_size).into_vec())
    }

    /// Samples `min(batch_size, len())` distinct transitions.
    ///
    /// The returned batch carries no weights.
    pub fn sample(&mut self, batch_size: usize) -> Result<TransitionBatch<T>> {
        let ixs = self.sample_indices(batch_size)?;
        Ok(TransitionBatch {
            transitions: self.store.gather(&ixs)?,
            ix_sample: ixs,
            weight: None,
        })
    }

    /// Returns a copy of the transition at slot `ix`.
    pub fn get(&self, ix: usize) -> Result<T> {
        self.store.get(ix)
    }

    /// Returns the number of stored transitions.
    pub fn len(&self) -> usize {
        self.store.len()
    }

    /// Returns `true` if no transition is stored.
    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    /// Returns the maximum number of transitions.
    pub fn capacity(&self) -> usize {
        self.store.capacity()
    }

    /// Iterates over the stored transitions from the oldest to the newest.
    pub fn iter(&self) -> impl Iterator<Item = &T> + '_ {
        self.store.iter()
    }

    /// Removes all transitions.
    pub fn clear(&mut self) {
        self.store.clear();
    }
}

impl<T: Clone> ExperienceBufferBase for UniformReplayBuffer<T> {
    type Item = T;

    fn push(&mut self, tr: T) -> anyhow::Result<()> {
        self.insert(tr);
        Ok(())
    }

    fn len(&self) -> usize {
        self.store.len()
    }
}

impl<T: Clone> ReplayBufferBase for UniformReplayBuffer<T> {
    type Config = ReplayBufferConfig;
    type Batch = TransitionBatch<T>;

    fn build(config: &Self::Config) -> anyhow::Result<Self> {
        Ok(Self::new(config)?)
    }

    fn batch(&mut self, size: usize) -> anyhow::Result<Self::Batch> {
        Ok(self.sample(size)?)
    }

    fn update_priority(&mut self, _ixs: &[usize], _td_errs: &[f32]) -> anyhow::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn transition(n: usize) -> Transition {
        let s = n as f32;
        Transition::new(vec![s, s], vec![0.0], s, vec![s + 1.0, s + 1.0], false)
    }

    fn buffer(capacity: usize) -> UniformReplayBuffer {
        UniformReplayBuffer::new(&ReplayBufferConfig::default().capacity(capacity)).unwrap()
    }

    #[test]
    fn test_zero_capacity() {
        assert!(matches!(
            UniformReplayBuffer::<Transition>::new(&ReplayBufferConfig::default().capacity(0)),
            Err(ReplayError::InvalidCapacity(0))
        ));
    }

    #[test]
    fn test_empty_buffer() {
        let mut buffer = buffer(8);
        assert_eq!(buffer.sample(4).unwrap_err(), ReplayError::EmptyBuffer);
        assert!(buffer.sample(0).unwrap().is_empty());
    }

    #[test]
    fn test_distinct_indices() {
        let mut buffer = buffer(100);
        buffer.extend((0..60).map(transition));

        for _ in 0..50 {
            let batch = buffer.sample(32).unwrap();
            assert_eq!(batch.len(), 32);
            assert!(batch.weight.is_none());

            let ixs = batch.ix_sample.iter().cloned().collect::<HashSet<_>>();
            assert_eq!(ixs.len(), 32);
            assert!(batch.ix_sample.iter().all(|&ix| ix < 60));

            for (tr, ix, w) in batch.iter() {
                assert_eq!(*tr, transition(ix));
                assert_eq!(w, 1.0);
            }
        }
    }

    #[test]
    fn test_batch_size_is_clamped() {
        let mut buffer = buffer(10);
        buffer.extend((0..3).map(transition));

        let mut ixs = buffer.sample(8).unwrap().ix_sample;
        ixs.sort_unstable();
        assert_eq!(ixs, vec![0, 1, 2]);
    }

    #[test]
    fn test_eviction() {
        let mut buffer = buffer(2);
        for n in 0..3 {
            buffer.insert(transition(n));
        }

        assert_eq!(buffer.len(), 2);
        assert_eq!(buffer.get(0).unwrap(), transition(2));
        for _ in 0..100 {
            let batch = buffer.sample(2).unwrap();
            assert!(batch.transitions.iter().all(|tr| *tr != transition(0)));
        }
    }

    #[test]
    fn test_from_transitions() {
        let mut src = buffer(4);
        src.extend((0..6).map(transition));

        // Shrinking keeps the newest transitions.
        let config = ReplayBufferConfig::default().capacity(3);
        let dst = UniformReplayBuffer::from_transitions(&config, src.iter().cloned()).unwrap();
        assert_eq!(
            dst.iter().cloned().collect::<Vec<_>>(),
            (3..6).map(transition).collect::<Vec<_>>()
        );
    }

    #[test]
    fn test_seeded_sampling_is_reproducible() {
        let mut a = buffer(50);
        let mut b = buffer(50);
        a.extend((0..50).map(transition));
        b.extend((0..50).map(transition));
        assert_eq!(a.sample_indices(16).unwrap(), b.sample_indices(16).unwrap());
    }

    #[test]
    fn test_trait_surface() -> anyhow::Result<()> {
        let config = ReplayBufferConfig::default().capacity(4);
        let mut buffer = <UniformReplayBuffer as ReplayBufferBase>::build(&config)?;
        assert!(ExperienceBufferBase::is_empty(&buffer));

        ExperienceBufferBase::push(&mut buffer, transition(0))?;
        let batch = buffer.batch(1)?;
        buffer.update_priority(&batch.ix_sample, &[0.5])?;
        assert_eq!(batch.transitions, vec![transition(0)]);

        let err = UniformReplayBuffer::<Transition>::new(&config)?.batch(1).unwrap_err();
        assert_eq!(
            err.downcast_ref::<ReplayError>(),
            Some(&ReplayError::EmptyBuffer)
        );
        Ok(())
    }
}
