//! Synthetic environment producing transitions.
use crate::config::SimConfig;
use rand::{rngs::StdRng, Rng, SeedableRng};
use replay_core::Transition;

/// Probability of a step giving a bonus reward.
const BONUS_PROB: f64 = 0.01;

/// A noisy linear system with a quadratic cost.
///
/// Rare bonus rewards produce large TD errors, which prioritized sampling is
/// expected to replay more often.
pub struct Rollout {
    act_dim: usize,
    episode_len: usize,
    t: usize,
    state: Vec<f32>,
    rng: StdRng,
}

impl Rollout {
    /// Creates the environment and samples an initial state.
    pub fn new(config: &SimConfig) -> Self {
        let mut rng = StdRng::seed_from_u64(config.seed);
        let state = Self::initial_state(&mut rng, config.obs_dim);
        Self {
            act_dim: config.act_dim.max(1),
            episode_len: config.episode_len.max(1),
            t: 0,
            state,
            rng,
        }
    }

    fn initial_state(rng: &mut StdRng, obs_dim: usize) -> Vec<f32> {
        (0..obs_dim).map(|_| rng.gen_range(-1.0..1.0)).collect()
    }

    /// Takes a random action and returns the resulting transition.
    pub fn step(&mut self) -> Transition {
        let rng = &mut self.rng;
        let action = (0..self.act_dim)
            .map(|_| rng.gen_range(-1.0f32..1.0))
            .collect::<Vec<_>>();
        let a = action.iter().sum::<f32>() / self.act_dim as f32;

        let next_state = self
            .state
            .iter()
            .map(|s| 0.9 * s + 0.1 * a + 0.05 * rng.gen_range(-1.0f32..1.0))
            .collect::<Vec<_>>();
        let mut reward = -next_state.iter().map(|s| s * s).sum::<f32>();
        if rng.gen_bool(BONUS_PROB) {
            reward += 10.0;
        }

        self.t += 1;
        let done = self.t >= self.episode_len;
        let tr = Transition::new(
            self.state.clone(),
            action,
            reward,
            next_state.clone(),
            done,
        );

        if done {
            self.t = 0;
            self.state = Self::initial_state(&mut self.rng, next_state.len());
        } else {
            self.state = next_state;
        }

        tr
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_episode() {
        let config = SimConfig {
            obs_dim: 3,
            act_dim: 2,
            episode_len: 5,
            ..SimConfig::default()
        };
        let mut rollout = Rollout::new(&config);

        let trs = (0..10).map(|_| rollout.step()).collect::<Vec<_>>();
        for (i, tr) in trs.iter().enumerate() {
            assert_eq!(tr.state.len(), 3);
            assert_eq!(tr.next_state.len(), 3);
            assert_eq!(tr.action.len(), 2);
            assert_eq!(tr.done, i % 5 == 4);
        }

        // Within an episode, states chain.
        assert_eq!(trs[0].next_state, trs[1].state);
    }
}
