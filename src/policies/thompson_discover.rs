use super::thompson::sample_all;
use super::{DEFAULT_EPSILON, Policy, argmax, ensure_arms, explore_excluding_best, validate_epsilon};
use crate::error::{BanditError, Result};
use crate::history::PlayHistory;
use rand::Rng;
use tracing::debug;

/// Thompson Sampling with a forced-exploration override
///
/// Samples every arm's posterior like [`ThompsonSampling`](super::ThompsonSampling),
/// then with probability `epsilon` discards the samples and plays a uniformly
/// random arm other than the best by empirical success ratio. Every arm must
/// have been played at least once.
#[derive(Clone, Copy, Debug)]
pub struct ThompsonDiscover {
    epsilon: f64,
}

impl ThompsonDiscover {
    pub fn new(epsilon: f64) -> Result<Self> {
        Ok(Self {
            epsilon: validate_epsilon(epsilon)?,
        })
    }

    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }
}

impl Default for ThompsonDiscover {
    fn default() -> Self {
        Self {
            epsilon: DEFAULT_EPSILON,
        }
    }
}

impl Policy for ThompsonDiscover {
    fn name(&self) -> &'static str {
        "thompson-discover"
    }

    fn select(&self, history: &PlayHistory, rng: &mut dyn rand::RngCore) -> Result<usize> {
        ensure_arms(history)?;
        let ratios = history.success_ratios()?;
        let samples = sample_all(history, rng)?;

        if rng.random::<f64>() < self.epsilon {
            let arm = explore_excluding_best(self.name(), &ratios, rng)?;
            debug!(arm, "thompson-discover overriding posterior sample");
            return Ok(arm);
        }

        argmax(&samples).ok_or_else(|| BanditError::NumericalError {
            message: "no comparable posterior sample".into(),
        })
    }

    fn requires_played_arms(&self) -> bool {
        true
    }

    fn min_arms(&self) -> usize {
        if self.epsilon > 0.0 { 2 } else { 1 }
    }
}
