//! Replay buffers with uniform and prioritized sampling.
//!
//! - [`UniformReplayBuffer`] draws distinct transitions uniformly.
//! - [`PrioritizedReplayBuffer`] draws transitions proportionally to
//!   `priority^alpha` and returns importance sampling weights.
//!
//! Both are built from a [`ReplayBufferConfig`] and return
//! [`TransitionBatch`]es.
//!
//! ```rust
//! use replay_core::{PerConfig, PrioritizedReplayBuffer, ReplayBufferConfig, Transition};
//!
//! let config = ReplayBufferConfig::default()
//!     .capacity(1000)
//!     .per_config(Some(PerConfig::default().alpha(0.6).beta_0(0.4)));
//! let mut buffer = PrioritizedReplayBuffer::new(&config).unwrap();
//!
//! for i in 0..100 {
//!     let s = i as f32;
//!     buffer.insert(Transition::new(vec![s], vec![0.0], 1.0, vec![s + 1.0], false));
//! }
//!
//! let batch = buffer.sample(32).unwrap();
//! let td_errs = vec![0.5; batch.len()];
//! let priorities = td_errs.iter().map(|e: &f32| e.abs() + 1e-6).collect::<Vec<_>>();
//! buffer.update_priorities(&batch.ix_sample, &priorities).unwrap();
//! ```
mod batch;
mod config;
mod iw_scheduler;
mod prioritized;
mod uniform;
pub use batch::TransitionBatch;
pub use config::{PerConfig, ReplayBufferConfig};
pub use iw_scheduler::IwScheduler;
pub use prioritized::{PrioritizedReplayBuffer, TD_ERR_EPS};
pub use uniform::UniformReplayBuffer;
