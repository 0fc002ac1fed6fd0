//! Messages sent from the rollout thread to the replay buffer thread.
use replay_core::Transition;

/// Transitions collected by a rollout thread.
pub struct PushedItemMessage {
    /// Id of the rollout thread.
    pub id: usize,

    /// Transitions, in the order they were collected.
    pub pushed_items: Vec<Transition>,
}
