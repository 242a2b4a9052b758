use super::{DEFAULT_EPSILON, Policy, argmax, ensure_arms, explore_excluding_best, validate_epsilon};
use crate::error::{BanditError, Result};
use crate::history::PlayHistory;
use rand::Rng;
use tracing::debug;

/// Epsilon-greedy policy - explores with probability epsilon, exploits otherwise
///
/// Exploitation plays the arm with the highest empirical success ratio.
/// Exploration plays a uniformly random arm other than that best arm. Every
/// arm must have been played at least once.
#[derive(Clone, Copy, Debug)]
pub struct EpsilonGreedy {
    epsilon: f64,
}

impl EpsilonGreedy {
    /// Creates a new EpsilonGreedy policy with the given epsilon
    pub fn new(epsilon: f64) -> Result<Self> {
        Ok(Self {
            epsilon: validate_epsilon(epsilon)?,
        })
    }

    /// Gets the epsilon value
    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }
}

impl Default for EpsilonGreedy {
    fn default() -> Self {
        Self {
            epsilon: DEFAULT_EPSILON,
        }
    }
}

impl Policy for EpsilonGreedy {
    fn name(&self) -> &'static str {
        "epsilon-greedy"
    }

    fn select(&self, history: &PlayHistory, rng: &mut dyn rand::RngCore) -> Result<usize> {
        ensure_arms(history)?;
        let ratios = history.success_ratios()?;

        // Explore with probability epsilon
        if rng.random::<f64>() < self.epsilon {
            let arm = explore_excluding_best(self.name(), &ratios, rng)?;
            debug!(arm, "epsilon-greedy exploring");
            return Ok(arm);
        }

        argmax(&ratios).ok_or(BanditError::NoArmsAvailable)
    }

    fn requires_played_arms(&self) -> bool {
        true
    }

    fn min_arms(&self) -> usize {
        if self.epsilon > 0.0 { 2 } else { 1 }
    }
}
