//! Transition record stored in replay buffers.
use crate::error::{ReplayError, Result};
use serde::{Deserialize, Serialize};

/// One environment step, `(state, action, reward, next_state, done)`.
///
/// A scalar action is represented as a vector of length one. Lengths are
/// not checked on insertion, see [`TransitionShape`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Transition {
    /// Observation before the step.
    pub state: Vec<f32>,

    /// Action taken.
    pub action: Vec<f32>,

    /// Reward received.
    pub reward: f32,

    /// Observation after the step.
    pub next_state: Vec<f32>,

    /// Whether the episode ended with this step.
    pub done: bool,
}

impl Transition {
    /// Creates a transition.
    pub fn new(
        state: Vec<f32>,
        action: Vec<f32>,
        reward: f32,
        next_state: Vec<f32>,
        done: bool,
    ) -> Self {
        Self {
            state,
            action,
            reward,
            next_state,
            done,
        }
    }
}

impl From<(Vec<f32>, Vec<f32>, f32, Vec<f32>, bool)> for Transition {
    fn from(t: (Vec<f32>, Vec<f32>, f32, Vec<f32>, bool)) -> Self {
        let (state, action, reward, next_state, done) = t;
        Self::new(state, action, reward, next_state, done)
    }
}

/// Lengths of the vectors in a [`Transition`].
///
/// Buffers store transitions as opaque payloads and never look at their
/// contents. Producers that need a fixed shape check each transition with
/// [`check`](TransitionShape::check) before inserting it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionShape {
    /// Length of `state` and `next_state`.
    pub obs_dim: usize,

    /// Length of `action`.
    pub act_dim: usize,
}

impl TransitionShape {
    /// Creates a shape.
    pub fn new(obs_dim: usize, act_dim: usize) -> Self {
        Self { obs_dim, act_dim }
    }

    /// Returns the shape of `tr` if `state` and `next_state` agree.
    pub fn of(tr: &Transition) -> Result<Self> {
        let shape = Self::new(tr.state.len(), tr.action.len());
        shape.check(tr)?;
        Ok(shape)
    }

    /// Fails with [`ReplayError::ShapeMismatch`] on the first field whose
    /// length differs from this shape.
    pub fn check(&self, tr: &Transition) -> Result<()> {
        let fields = [
            ("state", self.obs_dim, tr.state.len()),
            ("action", self.act_dim, tr.action.len()),
            ("next_state", self.obs_dim, tr.next_state.len()),
        ];
        for &(field, expected, actual) in fields.iter() {
            if expected != actual {
                return Err(ReplayError::ShapeMismatch {
                    field,
                    expected,
                    actual,
                });
            }
        }
        Ok(())
    }
}
