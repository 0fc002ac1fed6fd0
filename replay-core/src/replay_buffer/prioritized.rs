//! Replay buffer with prioritized sampling.
use super::{ReplayBufferConfig, TransitionBatch};
use crate::{
    error::{ReplayError, Result},
    segment_tree::{Min, MinTree, Sum, SumTree},
    store::TransitionStore,
    ExperienceBufferBase, ReplayBufferBase, Transition,
};
use rand::{rngs::StdRng, Rng, SeedableRng};

/// Added to absolute TD errors so that priorities stay positive.
pub const TD_ERR_EPS: f32 = 1e-6;

#[cfg_attr(doc, aquamarine::aquamarine)]
/// A replay buffer sampling transitions proportionally to `priority^alpha`.
///
/// Two segment trees are kept index-aligned with the transition store. Every
/// insertion writes the same slot in the store and in both trees.
///
/// ```mermaid
/// flowchart LR
///     I[insert] --> S[TransitionStore]
///     I -- "max_priority^alpha" --> T1[SumTree]
///     I -- "max_priority^alpha" --> T2[MinTree]
///     B[sample] -- "prefix-sum descent" --> T1
///     B -- "min probability" --> T2
///     B --> S
///     U[update_priorities] -- "priority^alpha" --> T1
///     U -- "priority^alpha" --> T2
/// ```
///
/// Sampling splits the total mass into `batch_size` strata of equal width and
/// draws one point in each. For a sampled slot `i` with probability
/// `P(i) = p_i^alpha / sum_k p_k^alpha`, the importance sampling weight is
/// `w_i = (N P(i))^(-beta)`, normalized by the largest possible weight
/// `(N min_k P(k))^(-beta)` so that every weight lies in `(0, 1]`.
///
/// New transitions get the largest priority seen so far. That value only
/// grows, even after the transitions carrying it have been evicted, until
/// [`clear`](Self::clear) is called.
pub struct PrioritizedReplayBuffer<T = Transition> {
    store: TransitionStore<T>,
    sum_tree: SumTree,
    min_tree: MinTree,
    alpha: f32,
    beta: f32,
    max_priority: f32,
    rng: StdRng,
}

impl<T: Clone> PrioritizedReplayBuffer<T> {
    /// Creates an empty buffer.
    ///
    /// `beta` starts at `beta_0` of the PER configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ReplayError::InvalidCapacity`] if `config.capacity` is zero.
    pub fn new(config: &ReplayBufferConfig) -> Result<Self> {
        let per_config = config.per_config.clone().unwrap_or_default();
        let store = TransitionStore::new(config.capacity)?;
        let tree_capacity = config.capacity.next_power_of_two();

        log::info!(
            "Prioritized replay buffer: capacity = {}, alpha = {}, beta = {}",
            config.capacity,
            per_config.alpha,
            per_config.beta_0
        );

        Ok(Self {
            store,
            sum_tree: SumTree::new(tree_capacity, Sum)?,
            min_tree: MinTree::new(tree_capacity, Min)?,
            alpha: per_config.alpha,
            beta: per_config.beta_0,
            max_priority: 1.0,
            rng: StdRng::seed_from_u64(config.seed),
        })
    }

    #[inline]
    fn write_leaf(&mut self, ix: usize, priority: f32) {
        let p = priority.powf(self.alpha);
        self.sum_tree.update(ix, p);
        self.min_tree.update(ix, p);
    }

    /// Inserts a transition with the current maximum priority and returns its
    /// slot index.
    pub fn insert(&mut self, tr: T) -> usize {
        let ix = self.store.insert(tr);
        self.write_leaf(ix, self.max_priority);
        ix
    }

    /// Inserts transitions in order.
    pub fn extend<I: IntoIterator<Item = T>>(&mut self, transitions: I) {
        for tr in transitions {
            self.insert(tr);
        }
    }

    /// Draws one slot index per stratum of the priority mass.
    fn sample_proportional(&mut self, batch_size: usize) -> Result<Vec<usize>> {
        let total = self.sum_tree.range_combine(0, self.store.len() - 1)?;
        let width = total / batch_size as f32;
        // Keeps the last stratum strictly below `total`.
        let upper = total * (1.0 - f32::EPSILON);

        let mut ixs = Vec::with_capacity(batch_size);
        for k in 0..batch_size {
            let u: f32 = self.rng.gen();
            let mass = (u * width + k as f32 * width).min(upper);
            ixs.push(self.sum_tree.find_prefix_index(mass)?);
        }

        Ok(ixs)
    }

    /// Samples `min(batch_size, len())` transitions with importance sampling
    /// weights.
    ///
    /// # Errors
    ///
    /// Returns [`ReplayError::EmptyBuffer`] if the buffer is empty and
    /// `batch_size > 0`.
    pub fn sample(&mut self, batch_size: usize) -> Result<TransitionBatch<T>> {
        if batch_size == 0 {
            return Ok(TransitionBatch {
                weight: Some(vec![]),
                ..TransitionBatch::empty()
            });
        }

        let size = self.store.len();
        if size == 0 {
            return Err(ReplayError::EmptyBuffer);
        }

        let batch_size = batch_size.min(size);
        let ixs = self.sample_proportional(batch_size)?;

        let n = size as f32;
        let total = self.sum_tree.sum();
        let p_min = self.min_tree.min() / total;
        let w_max = (p_min * n).powf(-self.beta);

        let weight = ixs
            .iter()
            .map(|&ix| -> Result<f32> {
                let p = self.sum_tree.get(ix)? / total;
                Ok(((p * n).powf(-self.beta) / w_max).min(1.0))
            })
            .collect::<Result<Vec<_>>>()?;

        log::trace!("Sampled {:?} with weights {:?}", ixs, weight);

        Ok(TransitionBatch {
            transitions: self.store.gather(&ixs)?,
            ix_sample: ixs,
            weight: Some(weight),
        })
    }

    /// Sets the priorities of the transitions at `ixs`.
    ///
    /// All pairs are checked before any of them is written, so a failing call
    /// leaves the buffer unchanged.
    ///
    /// # Errors
    ///
    /// * [`ReplayError::LengthMismatch`] if the slices differ in length.
    /// * [`ReplayError::InvalidPriority`] if a priority is not finite and positive.
    /// * [`ReplayError::IndexOutOfRange`] if an index is not below `len()`.
    pub fn update_priorities(&mut self, ixs: &[usize], priorities: &[f32]) -> Result<()> {
        if ixs.len() != priorities.len() {
            return Err(ReplayError::LengthMismatch(ixs.len(), priorities.len()));
        }

        let size = self.store.len();
        for (&ix, &p) in ixs.iter().zip(priorities.iter()) {
            if !(p > 0.0 && p.is_finite()) {
                return Err(ReplayError::InvalidPriority(p));
            }
            if ix >= size {
                return Err(ReplayError::IndexOutOfRange {
                    index: ix,
                    len: size,
                });
            }
        }

        for (&ix, &p) in ixs.iter().zip(priorities.iter()) {
            self.write_leaf(ix, p);
            self.max_priority = self.max_priority.max(p);
        }

        Ok(())
    }

    /// Sets the exponent of importance sampling weights for later samples.
    pub fn set_beta(&mut self, beta: f32) {
        self.beta = beta;
    }

    /// Returns the exponent of importance sampling weights.
    pub fn beta(&self) -> f32 {
        self.beta
    }

    /// Returns the exponent applied to priorities.
    pub fn alpha(&self) -> f32 {
        self.alpha
    }

    /// Returns the priority given to new transitions.
    pub fn max_priority(&self) -> f32 {
        self.max_priority
    }

    /// Returns `priority^alpha` of slot `ix`.
    pub fn priority(&self, ix: usize) -> Result<f32> {
        if ix >= self.store.len() {
            return Err(ReplayError::IndexOutOfRange {
                index: ix,
                len: self.store.len(),
            });
        }
        self.sum_tree.get(ix)
    }

    /// Returns the tree of `priority^alpha` sums.
    pub fn sum_tree(&self) -> &SumTree {
        &self.sum_tree
    }

    /// Returns the tree of `priority^alpha` minimums.
    pub fn min_tree(&self) -> &MinTree {
        &self.min_tree
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

    /// Removes all transitions and resets the maximum priority to `1.0`.
    pub fn clear(&mut self) {
        self.store.clear();
        self.sum_tree.clear();
        self.min_tree.clear();
        self.max_priority = 1.0;
        log::debug!("Cleared prioritized replay buffer");
    }
}

impl<T: Clone> ExperienceBufferBase for PrioritizedReplayBuffer<T> {
    type Item = T;

    fn push(&mut self, tr: T) -> anyhow::Result<()> {
        self.insert(tr);
        Ok(())
    }

    fn len(&self) -> usize {
        self.store.len()
    }
}

impl<T: Clone> ReplayBufferBase for PrioritizedReplayBuffer<T> {
    type Config = ReplayBufferConfig;
    type Batch = TransitionBatch<T>;

    fn build(config: &Self::Config) -> anyhow::Result<Self> {
        Ok(Self::new(config)?)
    }

    fn batch(&mut self, size: usize) -> anyhow::Result<Self::Batch> {
        Ok(self.sample(size)?)
    }

    /// Sets priorities to `|td_err| + TD_ERR_EPS`.
    fn update_priority(&mut self, ixs: &[usize], td_errs: &[f32]) -> anyhow::Result<()> {
        let priorities = td_errs
            .iter()
            .map(|e| e.abs() + TD_ERR_EPS)
            .collect::<Vec<_>>();
        Ok(self.update_priorities(ixs, &priorities)?)
    }
}
