#![warn(missing_docs)]
//! Experience replay for reinforcement learning.
//!
//! Transitions are kept in a fixed-capacity circular [`store`]. Replay
//! buffers sample from it either uniformly ([`UniformReplayBuffer`]) or
//! proportionally to per-transition priorities ([`PrioritizedReplayBuffer`]).
//! Prioritized sampling is backed by a pair of [`segment_tree`]s giving
//! `O(log n)` priority updates and `O(log n)` weighted draws.
//!
//! Buffers are not synchronized. Use [`SharedReplayBuffer`] to share one
//! between a rollout thread and a learner thread.
pub mod error;
pub mod segment_tree;
pub mod store;

mod base;
pub use base::{ExperienceBufferBase, ReplayBufferBase};

mod replay_buffer;
pub use replay_buffer::{
    IwScheduler, PerConfig, PrioritizedReplayBuffer, ReplayBufferConfig, TransitionBatch,
    UniformReplayBuffer, TD_ERR_EPS,
};

mod shared;
pub use shared::SharedReplayBuffer;

mod transition;
pub use transition::{Transition, TransitionShape};

pub use error::ReplayError;
