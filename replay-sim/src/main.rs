//! Runs a synthetic training loop against a replay buffer.
mod config;
mod messages;
mod model;
mod rollout;
mod trainer;
use anyhow::Result;
use clap::Parser;
use config::SimConfig;
use replay_core::{PerConfig, PrioritizedReplayBuffer, UniformReplayBuffer};
use std::path::PathBuf;
use trainer::run;

/// Drive a replay buffer with a synthetic environment and a TD(0) learner
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// YAML configuration file, defaults are used if omitted
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Use prioritized sampling with default parameters if the configuration
    /// has none
    #[arg(short, long, default_value_t = false)]
    prioritized: bool,

    /// Number of optimization steps
    #[arg(long)]
    max_opts: Option<usize>,

    /// Batch size
    #[arg(long)]
    batch_size: Option<usize>,

    /// Seed of the environment and of the replay buffer
    #[arg(long)]
    seed: Option<u64>,

    /// Save the resulting configuration to this file and exit
    #[arg(long)]
    save_config: Option<PathBuf>,
}

fn sim_config(args: &Args) -> Result<SimConfig> {
    let mut config = match &args.config {
        Some(path) => SimConfig::load(path)?,
        None => SimConfig::default(),
    };

    if args.prioritized && config.replay_buffer.per_config.is_none() {
        config.replay_buffer.per_config = Some(PerConfig::default());
    }
    if let Some(max_opts) = args.max_opts {
        config = config.max_opts(max_opts);
    }
    if let Some(batch_size) = args.batch_size {
        config = config.batch_size(batch_size);
    }
    if let Some(seed) = args.seed {
        config.replay_buffer.seed = seed;
        config = config.seed(seed);
    }

    Ok(config)
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let config = sim_config(&args)?;

    if let Some(path) = &args.save_config {
        config.save(path)?;
        log::info!("Saved configuration to {:?}", path);
        return Ok(());
    }

    match config.replay_buffer.per_config {
        Some(_) => run::<PrioritizedReplayBuffer>(&config)?,
        None => run::<UniformReplayBuffer>(&config)?,
    };

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempdir::TempDir;

    #[test]
    fn test_sim_config_from_args() -> Result<()> {
        let args = Args::parse_from(["replay-sim", "-p", "--max-opts", "20", "--seed", "3"]);
        let config = sim_config(&args)?;
        assert_eq!(config.replay_buffer.per_config, Some(PerConfig::default()));
        assert_eq!(config.max_opts, 20);
        assert_eq!(config.seed, 3);
        assert_eq!(config.replay_buffer.seed, 3);
        assert_eq!(config.batch_size, SimConfig::default().batch_size);
        Ok(())
    }

    #[test]
    fn test_sim_config_from_file() -> Result<()> {
        let tmp_dir = TempDir::new("replay_sim")?;
        let path = tmp_dir.path().join("sim.yaml");
        SimConfig::default().batch_size(7).save(&path)?;

        let path = path.to_string_lossy().to_string();
        let args = Args::parse_from(vec!["replay-sim", "--config", path.as_str()]);
        let config = sim_config(&args)?;
        assert_eq!(config.batch_size, 7);
        assert!(config.replay_buffer.per_config.is_none());
        Ok(())
    }
}
