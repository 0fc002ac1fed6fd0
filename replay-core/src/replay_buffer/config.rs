//! Configuration of replay buffers.
use super::IwScheduler;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::{
    default::Default,
    fs::File,
    io::{BufReader, Write},
    path::Path,
};

/// Configuration of prioritized experience replay (PER).
///
/// ```rust
/// use replay_core::PerConfig;
///
/// let config = PerConfig::default()
///     .alpha(0.6)
///     .beta_0(0.4)
///     .beta_final(1.0)
///     .n_opts_final(500_000);
/// ```
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct PerConfig {
    /// Exponent applied to priorities. `0` gives uniform sampling.
    pub alpha: f32,

    /// Initial exponent of importance sampling weights.
    pub beta_0: f32,

    /// Final exponent of importance sampling weights, typically `1.0`.
    pub beta_final: f32,

    /// Number of optimization steps after which `beta` reaches `beta_final`.
    pub n_opts_final: usize,
}

impl Default for PerConfig {
    /// `alpha = 0.6`, `beta_0 = 0.4`, `beta_final = 1.0`, `n_opts_final = 500_000`.
    fn default() -> Self {
        Self {
            alpha: 0.6,
            beta_0: 0.4,
            beta_final: 1.0,
            n_opts_final: 500_000,
        }
    }
}

impl PerConfig {
    /// Sets the exponent applied to priorities.
    pub fn alpha(mut self, alpha: f32) -> Self {
        self.alpha = alpha;
        self
    }

    /// Sets the initial exponent of importance sampling weights.
    pub fn beta_0(mut self, beta_0: f32) -> Self {
        self.beta_0 = beta_0;
        self
    }

    /// Sets the final exponent of importance sampling weights.
    pub fn beta_final(mut self, beta_final: f32) -> Self {
        self.beta_final = beta_final;
        self
    }

    /// Sets the number of optimization steps to reach `beta_final`.
    pub fn n_opts_final(mut self, n_opts_final: usize) -> Self {
        self.n_opts_final = n_opts_final;
        self
    }

    /// Creates a scheduler annealing `beta` as configured.
    pub fn iw_scheduler(&self) -> IwScheduler {
        IwScheduler::from(self)
    }
}

/// Configuration of replay buffers.
///
/// [`UniformReplayBuffer`](super::UniformReplayBuffer) ignores `per_config`.
/// [`PrioritizedReplayBuffer`](super::PrioritizedReplayBuffer) falls back to
/// [`PerConfig::default()`] when it is `None`.
///
/// ```rust
/// use replay_core::{PerConfig, ReplayBufferConfig};
///
/// let config = ReplayBufferConfig::default()
///     .capacity(10000)
///     .seed(42)
///     .per_config(Some(PerConfig::default()));
/// ```
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct ReplayBufferConfig {
    /// Maximum number of transitions. When the buffer is full, new
    /// transitions replace the oldest ones.
    pub capacity: usize,

    /// Seed of the random number generator used for sampling.
    pub seed: u64,

    /// Configuration of prioritized sampling.
    pub per_config: Option<PerConfig>,
}

impl Default for ReplayBufferConfig {
    /// `capacity = 10000`, `seed = 42`, `per_config = None`.
    fn default() -> Self {
        Self {
            capacity: 10000,
            seed: 42,
            per_config: None,
        }
    }
}

impl ReplayBufferConfig {
    /// Sets the capacity of the replay buffer.
    pub fn capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Sets the random seed for sampling.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Sets the configuration of prioritized sampling.
    pub fn per_config(mut self, per_config: Option<PerConfig>) -> Self {
        self.per_config = per_config;
        self
    }

    /// Loads the configuration from a YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b = serde_yaml::from_reader(rdr)?;
        Ok(b)
    }

    /// Saves the configuration to a YAML file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        Ok(())
    }
}
