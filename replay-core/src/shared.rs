//! Replay buffer shared between threads.
use crate::error::{ReplayError, Result};
use std::sync::{Arc, Mutex, MutexGuard};

/// A replay buffer behind a single mutex.
///
/// Buffers are not synchronized internally. A rollout thread inserting
/// transitions and a learner thread sampling batches share one buffer through
/// clones of this handle; every operation holds the lock for its whole
/// duration.
pub struct SharedReplayBuffer<B> {
    inner: Arc<Mutex<B>>,
}

impl<B> Clone for SharedReplayBuffer<B> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<B> SharedReplayBuffer<B> {
    /// Wraps `buffer`.
    pub fn new(buffer: B) -> Self {
        Self {
            inner: Arc::new(Mutex::new(buffer)),
        }
    }

    /// Locks the buffer.
    ///
    /// # Errors
    ///
    /// Returns [`ReplayError::Poisoned`] if another holder of the lock panicked.
    pub fn lock(&self) -> Result<MutexGuard<'_, B>> {
        self.inner.lock().map_err(|_| ReplayError::Poisoned)
    }

    /// Runs `f` with the buffer locked.
    pub fn with<R>(&self, f: impl FnOnce(&mut B) -> R) -> Result<R> {
        let mut buffer = self.lock()?;
        Ok(f(&mut buffer))
    }
}

impl<B> From<B> for SharedReplayBuffer<B> {
    fn from(buffer: B) -> Self {
        Self::new(buffer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{PrioritizedReplayBuffer, ReplayBufferConfig, Transition};
    use std::thread;

    fn transition(n: usize) -> Transition {
        let s = n as f32;
        Transition::new(vec![s], vec![0.0], 0.0, vec![s], false)
    }

    #[test]
    fn test_concurrent_insert_and_sample() {
        let config = ReplayBufferConfig::default().capacity(128);
        let shared = SharedReplayBuffer::new(PrioritizedReplayBuffer::new(&config).unwrap());

        let producer = {
            let shared = shared.clone();
            thread::spawn(move || {
                for n in 0..1000 {
                    shared.with(|b| b.insert(transition(n))).unwrap();
                }
            })
        };

        let mut n_batches = 0;
        while n_batches < 200 {
            let mut buffer = shared.lock().unwrap();
            if buffer.is_empty() {
                continue;
            }
            let batch = buffer.sample(16).unwrap();
            let ps = vec![2.0; batch.len()];
            buffer.update_priorities(&batch.ix_sample, &ps).unwrap();
            n_batches += 1;
        }

        producer.join().unwrap();
        assert_eq!(shared.lock().unwrap().len(), 128);
    }

    #[test]
    fn test_poisoned_lock() {
        let shared = SharedReplayBuffer::new(0usize);
        let handle = {
            let shared = shared.clone();
            thread::spawn(move || {
                let _guard = shared.lock().unwrap();
                panic!("poison the lock");
            })
        };
        assert!(handle.join().is_err());

        assert!(matches!(shared.lock(), Err(ReplayError::Poisoned)));
        assert_eq!(shared.with(|n| *n).unwrap_err(), ReplayError::Poisoned);
    }
}
