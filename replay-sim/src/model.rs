//! Linear state-value estimate trained with TD(0).
use replay_core::{Transition, TransitionBatch};

/// A linear state-value function `v(s) = w . s`.
pub struct ValueModel {
    w: Vec<f32>,
    discount_factor: f32,
    lr: f32,
}

impl ValueModel {
    /// Creates a model with zero weights.
    pub fn new(obs_dim: usize, discount_factor: f32, lr: f32) -> Self {
        Self {
            w: vec![0.0; obs_dim],
            discount_factor,
            lr,
        }
    }

    fn value(&self, s: &[f32]) -> f32 {
        self.w.iter().zip(s.iter()).map(|(w, s)| w * s).sum()
    }

    /// Takes a semi-gradient step on the importance-weighted TD errors of
    /// `batch` and returns the TD errors before the step.
    pub fn opt(&mut self, batch: &TransitionBatch<Transition>) -> Vec<f32> {
        let n = batch.len().max(1) as f32;
        let mut grad = vec![0f32; self.w.len()];

        let td_errs = batch
            .iter()
            .map(|(tr, _, weight)| {
                let next_value = if tr.done {
                    0.0
                } else {
                    self.discount_factor * self.value(&tr.next_state)
                };
                let td_err = tr.reward + next_value - self.value(&tr.state);
                for (g, s) in grad.iter_mut().zip(tr.state.iter()) {
                    *g += weight * td_err * s;
                }
                td_err
            })
            .collect::<Vec<_>>();

        for (w, g) in self.w.iter_mut().zip(grad.iter()) {
            *w += self.lr * g / n;
        }

        td_errs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_td_errors() {
        let mut model = ValueModel::new(2, 0.5, 0.1);
        let batch = TransitionBatch {
            transitions: vec![
                Transition::new(vec![1.0, 0.0], vec![0.0], 1.0, vec![0.0, 1.0], false),
                Transition::new(vec![0.0, 1.0], vec![0.0], -2.0, vec![1.0, 1.0], true),
            ],
            ix_sample: vec![0, 1],
            weight: Some(vec![1.0, 0.5]),
        };

        // Zero weights: the TD errors are the rewards.
        assert_eq!(model.opt(&batch), vec![1.0, -2.0]);
        // w = 0.1 * ([1, 0] * 1 * 1 + [0, 1] * 0.5 * -2) / 2 = [0.05, -0.05]
        assert!((model.value(&[1.0, 0.0]) - 0.05).abs() < 1e-6);
        assert!((model.value(&[0.0, 1.0]) + 0.05).abs() < 1e-6);
    }
}
