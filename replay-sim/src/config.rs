//! Configuration of the simulation.
use anyhow::Result;
use replay_core::ReplayBufferConfig;
use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, Write},
    path::Path,
};

/// Configuration of [`run`](crate::trainer::run).
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct SimConfig {
    /// Replay buffer. Prioritized sampling is used when `per_config` is set.
    pub replay_buffer: ReplayBufferConfig,

    /// Number of transitions per batch.
    pub batch_size: usize,

    /// Number of stored transitions required before optimization starts.
    pub warmup: usize,

    /// Number of optimization steps.
    pub max_opts: usize,

    /// Dimension of synthetic observations.
    pub obs_dim: usize,

    /// Dimension of synthetic actions.
    pub act_dim: usize,

    /// Number of steps of a synthetic episode.
    pub episode_len: usize,

    /// Number of transitions sent to the buffer thread per message.
    pub n_buffer: usize,

    /// Discount factor of the value estimate.
    pub discount_factor: f32,

    /// Learning rate of the value estimate.
    pub lr: f32,

    /// Interval of optimization steps between log lines.
    pub record_interval: usize,

    /// Seed of the synthetic environment.
    pub seed: u64,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            replay_buffer: ReplayBufferConfig::default(),
            batch_size: 64,
            warmup: 500,
            max_opts: 10_000,
            obs_dim: 4,
            act_dim: 1,
            episode_len: 200,
            n_buffer: 16,
            discount_factor: 0.99,
            lr: 0.01,
            record_interval: 1000,
            seed: 0,
        }
    }
}

impl SimConfig {
    /// Sets the replay buffer configuration.
    pub fn replay_buffer(mut self, replay_buffer: ReplayBufferConfig) -> Self {
        self.replay_buffer = replay_buffer;
        self
    }

    /// Sets the batch size.
    pub fn batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    /// Sets the warmup period.
    pub fn warmup(mut self, warmup: usize) -> Self {
        self.warmup = warmup;
        self
    }

    /// Sets the number of optimization steps.
    pub fn max_opts(mut self, max_opts: usize) -> Self {
        self.max_opts = max_opts;
        self
    }

    /// Sets the interval of log lines.
    pub fn record_interval(mut self, record_interval: usize) -> Self {
        self.record_interval = record_interval;
        self
    }

    /// Sets the seed of the synthetic environment.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
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

#[cfg(test)]
mod tests {
    use super::*;
    use replay_core::PerConfig;
    use tempdir::TempDir;

    #[test]
    fn test_save_load() -> Result<()> {
        let tmp_dir = TempDir::new("sim_config")?;
        let path = tmp_dir.path().join("sim.yaml");

        let config = SimConfig::default()
            .replay_buffer(
                ReplayBufferConfig::default()
                    .capacity(256)
                    .per_config(Some(PerConfig::default())),
            )
            .batch_size(8)
            .max_opts(10);
        config.save(&path)?;
        assert_eq!(SimConfig::load(&path)?, config);
        Ok(())
    }
}
