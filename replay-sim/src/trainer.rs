//! Training loop driving a shared replay buffer.
//!
//! Three threads take part:
//!
//! 1. A rollout thread steps a [`Rollout`] and sends batches of transitions
//!    over a bounded channel.
//! 2. A replay buffer thread receives them, checks their shape against
//!    `obs_dim` and `act_dim`, and pushes them into the buffer.
//! 3. The calling thread runs the learner. With the buffer locked, it samples
//!    a batch, takes an optimization step of a [`ValueModel`] and writes the
//!    TD errors back as priorities.
//!
//! The loop stops after `max_opts` optimization steps.
use crate::{config::SimConfig, messages::PushedItemMessage, model::ValueModel, rollout::Rollout};
use anyhow::{anyhow, Result};
use crossbeam_channel::{bounded, Receiver, Sender};
use replay_core::{
    ExperienceBufferBase, PrioritizedReplayBuffer, ReplayBufferBase, ReplayBufferConfig,
    SharedReplayBuffer, Transition, TransitionBatch, TransitionShape, UniformReplayBuffer,
};
use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    thread::{self, JoinHandle},
    time::{Duration, SystemTime},
};

/// Capacity of the channel between the rollout and replay buffer threads.
const CHANNEL_CAPACITY: usize = 4;

/// Replay buffers whose importance weight exponent can be annealed.
pub trait Anneal {
    /// Sets `beta` for later batches. Ignored without importance weights.
    fn anneal_beta(&mut self, _beta: f32) {}
}

impl Anneal for UniformReplayBuffer {}

impl Anneal for PrioritizedReplayBuffer {
    fn anneal_beta(&mut self, beta: f32) {
        self.set_beta(beta);
    }
}

/// Summary of a run.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SimStats {
    /// Optimization steps taken.
    pub opt_steps: usize,

    /// Transitions delivered by the rollout thread.
    pub env_steps: usize,

    /// Transitions in the buffer at the end of the run.
    pub buffer_len: usize,

    /// Mean absolute TD error over the last record interval.
    pub mean_abs_td_err: f32,

    /// Mean importance sampling weight over the last record interval.
    pub mean_weight: f32,
}

fn spawn_rollout(
    config: &SimConfig,
    sender: Sender<PushedItemMessage>,
    stop: Arc<AtomicBool>,
) -> JoinHandle<usize> {
    let mut rollout = Rollout::new(config);
    let n_buffer = config.n_buffer.max(1);

    thread::spawn(move || {
        let mut env_steps = 0;
        while !stop.load(Ordering::SeqCst) {
            let pushed_items = (0..n_buffer).map(|_| rollout.step()).collect();
            let msg = PushedItemMessage {
                id: 0,
                pushed_items,
            };
            if sender.send(msg).is_err() {
                log::debug!("Replay buffer thread is gone, stopping rollout");
                break;
            }
            env_steps += n_buffer;
        }
        env_steps
    })
}

fn spawn_replay_buffer<R>(
    buffer: SharedReplayBuffer<R>,
    receiver: Receiver<PushedItemMessage>,
    shape: TransitionShape,
) -> JoinHandle<Result<()>>
where
    R: ExperienceBufferBase<Item = Transition> + Send + 'static,
{
    thread::spawn(move || {
        for msg in receiver.iter() {
            for tr in msg.pushed_items.iter() {
                shape.check(tr)?;
            }
            let mut buffer = buffer.lock()?;
            for tr in msg.pushed_items {
                buffer.push(tr)?;
            }
            log::trace!("Pushed transitions from rollout {}", msg.id);
        }
        Ok(())
    })
}

fn learn<R>(
    config: &SimConfig,
    shared: &SharedReplayBuffer<R>,
    rollout: &JoinHandle<usize>,
) -> Result<SimStats>
where
    R: ReplayBufferBase<Batch = TransitionBatch<Transition>>
        + ExperienceBufferBase<Item = Transition>
        + Anneal,
{
    let warmup = config.warmup.min(config.replay_buffer.capacity).max(1);
    let record_interval = config.record_interval.max(1);
    let mut iw_scheduler = config
        .replay_buffer
        .per_config
        .as_ref()
        .map(|c| c.iw_scheduler());
    let mut model = ValueModel::new(config.obs_dim, config.discount_factor, config.lr);

    let mut stats = SimStats::default();
    let mut abs_td_err_sum = 0f32;
    let mut weight_sum = 0f32;
    let mut n_samples = 0usize;
    let mut opt_steps_ = 0;
    let mut time = SystemTime::now();

    while stats.opt_steps < config.max_opts {
        let (abs_td_err, weight, n) = {
            let mut buffer = shared.lock()?;
            if buffer.len() < warmup {
                drop(buffer);
                if rollout.is_finished() {
                    return Err(anyhow!("Rollout stopped during warmup"));
                }
                thread::sleep(Duration::from_millis(1));
                continue;
            }

            if let Some(iw_scheduler) = &iw_scheduler {
                buffer.anneal_beta(iw_scheduler.beta());
            }
            let batch = buffer.batch(config.batch_size)?;
            let td_errs = model.opt(&batch);
            buffer.update_priority(&batch.ix_sample, &td_errs)?;

            (
                td_errs.iter().map(|e| e.abs()).sum::<f32>(),
                batch.iter().map(|(_, _, w)| w).sum::<f32>(),
                batch.len(),
            )
        };

        if let Some(iw_scheduler) = iw_scheduler.as_mut() {
            iw_scheduler.add_n_opts();
        }
        stats.opt_steps += 1;
        opt_steps_ += 1;
        abs_td_err_sum += abs_td_err;
        weight_sum += weight;
        n_samples += n;

        if stats.opt_steps % record_interval == 0 {
            let n = n_samples.max(1) as f32;
            stats.mean_abs_td_err = abs_td_err_sum / n;
            stats.mean_weight = weight_sum / n;

            let osps = opt_steps_ as f32 / time.elapsed()?.as_secs_f32().max(1e-6);
            log::info!(
                "opt_steps = {}, mean |td_err| = {:.4}, mean weight = {:.4}, beta = {:?}, osps = {:.1}",
                stats.opt_steps,
                stats.mean_abs_td_err,
                stats.mean_weight,
                iw_scheduler.as_ref().map(|s| s.beta()),
                osps
            );

            abs_td_err_sum = 0.0;
            weight_sum = 0.0;
            n_samples = 0;
            opt_steps_ = 0;
            time = SystemTime::now();
        }
    }

    Ok(stats)
}

/// Runs the simulation with a replay buffer of type `R`.
pub fn run<R>(config: &SimConfig) -> Result<SimStats>
where
    R: ReplayBufferBase<Config = ReplayBufferConfig, Batch = TransitionBatch<Transition>>
        + ExperienceBufferBase<Item = Transition>
        + Anneal
        + Send
        + 'static,
{
    let shared = SharedReplayBuffer::new(R::build(&config.replay_buffer)?);
    let stop = Arc::new(AtomicBool::new(false));
    let (sender, receiver) = bounded(CHANNEL_CAPACITY);

    let rollout = spawn_rollout(config, sender, stop.clone());
    let shape = TransitionShape::new(config.obs_dim, config.act_dim.max(1));
    let replay_buffer = spawn_replay_buffer(shared.clone(), receiver, shape);

    let result = learn(config, &shared, &rollout);
    stop.store(true, Ordering::SeqCst);

    let env_steps = rollout
        .join()
        .map_err(|_| anyhow!("Rollout thread panicked"))?;
    replay_buffer
        .join()
        .map_err(|_| anyhow!("Replay buffer thread panicked"))??;

    let mut stats = result?;
    stats.env_steps = env_steps;
    stats.buffer_len = shared.lock()?.len();
    log::info!("Finished: {:?}", stats);

    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use replay_core::{PerConfig, ReplayError};
    use test_log::test;

    fn config(per_config: Option<PerConfig>) -> SimConfig {
        SimConfig::default()
            .replay_buffer(
                ReplayBufferConfig::default()
                    .capacity(256)
                    .per_config(per_config),
            )
            .batch_size(16)
            .warmup(32)
            .max_opts(50)
            .record_interval(10)
    }

    #[test]
    fn test_run_uniform() -> Result<()> {
        let stats = run::<UniformReplayBuffer>(&config(None))?;
        assert_eq!(stats.opt_steps, 50);
        assert!(stats.env_steps >= 32);
        assert!(stats.buffer_len >= 32 && stats.buffer_len <= 256);
        assert_eq!(stats.mean_weight, 1.0);
        Ok(())
    }

    #[test]
    fn test_run_prioritized() -> Result<()> {
        let per_config = PerConfig::default().n_opts_final(40);
        let stats = run::<PrioritizedReplayBuffer>(&config(Some(per_config)))?;
        assert_eq!(stats.opt_steps, 50);
        assert!(stats.buffer_len <= 256);
        assert!(stats.mean_weight > 0.0 && stats.mean_weight <= 1.0);
        Ok(())
    }

    #[test]
    fn test_replay_buffer_rejects_wrong_shape() -> Result<()> {
        let config = ReplayBufferConfig::default().capacity(8);
        let shared = SharedReplayBuffer::new(<UniformReplayBuffer as ReplayBufferBase>::build(&config)?);
        let (sender, receiver) = bounded(CHANNEL_CAPACITY);
        let handle = spawn_replay_buffer(shared.clone(), receiver, TransitionShape::new(2, 1));

        let good = Transition::new(vec![0.0; 2], vec![0.0], 0.0, vec![0.0; 2], false);
        let bad = Transition::new(vec![0.0; 3], vec![0.0], 0.0, vec![0.0; 3], false);
        sender.send(PushedItemMessage {
            id: 0,
            pushed_items: vec![good.clone()],
        })?;
        sender.send(PushedItemMessage {
            id: 0,
            pushed_items: vec![good, bad],
        })?;
        drop(sender);

        let err = handle
            .join()
            .map_err(|_| anyhow!("Replay buffer thread panicked"))?
            .unwrap_err();
        assert_eq!(
            err.downcast_ref::<ReplayError>(),
            Some(&ReplayError::ShapeMismatch {
                field: "state",
                expected: 2,
                actual: 3
            })
        );
        // The rejected message is not pushed in part.
        assert_eq!(shared.lock()?.len(), 1);
        Ok(())
    }

    #[test]
    fn test_warmup_is_clamped_to_capacity() -> Result<()> {
        let mut config = config(None).warmup(10_000);
        config.replay_buffer.capacity = 16;
        let stats = run::<UniformReplayBuffer>(&config)?;
        assert_eq!(stats.opt_steps, 50);
        assert_eq!(stats.buffer_len, 16);
        Ok(())
    }
}
