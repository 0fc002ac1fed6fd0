//! Annealing of the importance weight exponent.
use super::PerConfig;
use serde::{Deserialize, Serialize};

/// Linear schedule of `beta` over optimization steps.
///
/// The buffer never anneals `beta` on its own. A training loop calls
/// [`add_n_opts`](IwScheduler::add_n_opts) after each optimization step and
/// feeds [`beta`](IwScheduler::beta) into
/// [`PrioritizedReplayBuffer::set_beta`](super::PrioritizedReplayBuffer::set_beta).
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
pub struct IwScheduler {
    /// Value of `beta` at step 0.
    pub beta_0: f32,

    /// Value of `beta` from step `n_opts_final` on.
    pub beta_final: f32,

    /// Step at which `beta` reaches `beta_final`.
    pub n_opts_final: usize,

    /// Optimization steps taken so far.
    pub n_opts: usize,
}

impl IwScheduler {
    /// Creates a scheduler at step 0.
    pub fn new(beta_0: f32, beta_final: f32, n_opts_final: usize) -> Self {
        Self {
            beta_0,
            beta_final,
            n_opts_final,
            n_opts: 0,
        }
    }

    /// Fraction of the schedule done, in `[0, 1]`.
    fn progress(&self) -> f32 {
        if self.n_opts_final == 0 {
            1.0
        } else {
            (self.n_opts as f32 / self.n_opts_final as f32).min(1.0)
        }
    }

    /// Returns `beta` at the current step.
    ///
    /// Exactly `beta_0` at step 0 and exactly `beta_final` once the schedule
    /// is done.
    pub fn beta(&self) -> f32 {
        let t = self.progress();
        self.beta_0 * (1.0 - t) + self.beta_final * t
    }

    /// Advances the schedule by one optimization step.
    pub fn add_n_opts(&mut self) {
        self.n_opts += 1;
    }
}

impl From<&PerConfig> for IwScheduler {
    fn from(config: &PerConfig) -> Self {
        Self::new(config.beta_0, config.beta_final, config.n_opts_final)
    }
}

#[cfg(test)]
mod tests {
    use super::{IwScheduler, PerConfig};

    #[test]
    fn test_linear_schedule() {
        let mut s = IwScheduler::new(0.4, 1.0, 4);
        let mut betas = vec![s.beta()];
        for _ in 0..6 {
            s.add_n_opts();
            betas.push(s.beta());
        }

        let expected = [0.4f32, 0.55, 0.7, 0.85, 1.0, 1.0, 1.0];
        for (b, e) in betas.iter().zip(expected.iter()) {
            assert!((b - e).abs() < 1e-6, "{} != {}", b, e);
        }
        assert_eq!(betas[0], 0.4);
        assert_eq!(betas[6], 1.0);
    }

    #[test]
    fn test_zero_steps() {
        // Without annealing steps beta is final from the start.
        let s = IwScheduler::new(0.4, 1.0, 0);
        assert_eq!(s.beta(), 1.0);
    }

    #[test]
    fn test_from_per_config() {
        let config = PerConfig::default().beta_0(0.2).beta_final(0.8).n_opts_final(3);
        let mut s = IwScheduler::from(&config);
        assert_eq!(s, config.iw_scheduler());
        assert_eq!(s.beta(), 0.2);

        for _ in 0..10 {
            s.add_n_opts();
        }
        assert_eq!(s.n_opts, 10);
        assert_eq!(s.beta(), 0.8);
    }
}
