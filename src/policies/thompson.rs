use super::{Policy, argmax, ensure_arms};
use crate::error::{BanditError, Result};
use crate::history::PlayHistory;
use rand::Rng;
use rand_distr::{Beta, Distribution};

/// Laplace-smoothed Beta-Bernoulli posterior of one arm
///
/// The posterior after `successes` wins and `failures` losses is
/// `Beta(1 + successes, 1 + failures)`.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BetaPosterior {
    pub successes: u64,
    pub failures: u64,
}

impl BetaPosterior {
    pub fn new(successes: u64, failures: u64) -> Self {
        Self {
            successes,
            failures,
        }
    }

    /// Shape parameters `(alpha, beta)`.
    pub fn shape(&self) -> (f64, f64) {
        (1.0 + self.successes as f64, 1.0 + self.failures as f64)
    }

    /// Posterior mean
    pub fn mean(&self) -> f64 {
        let (alpha, beta) = self.shape();
        alpha / (alpha + beta)
    }

    /// Draws one sample from the posterior
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<f64> {
        let (alpha, beta) = self.shape();
        let dist = Beta::new(alpha, beta).map_err(|e| BanditError::NumericalError {
            message: format!("Beta({alpha}, {beta}): {e}"),
        })?;
        Ok(dist.sample(rng))
    }
}

/// Posteriors of every arm, in arm order.
pub(crate) fn posteriors(history: &PlayHistory) -> Vec<BetaPosterior> {
    history
        .success_counts()
        .iter()
        .zip(history.failure_counts())
        .map(|(&successes, failures)| BetaPosterior::new(successes, failures))
        .collect()
}

/// One posterior sample per arm, drawn in arm order.
pub(crate) fn sample_all(history: &PlayHistory, rng: &mut dyn rand::RngCore) -> Result<Vec<f64>> {
    posteriors(history)
        .iter()
        .map(|posterior| posterior.sample(rng))
        .collect()
}

/// Thompson Sampling policy using Beta distribution
///
/// Draws one sample from each arm's `Beta(1 + successes, 1 + failures)`
/// posterior and plays the arm with the largest sample. Unplayed arms sample
/// from the uniform prior, so no warm-up is needed.
#[derive(Clone, Copy, Debug, Default)]
pub struct ThompsonSampling;

impl ThompsonSampling {
    pub fn new() -> Self {
        Self
    }
}

impl Policy for ThompsonSampling {
    fn name(&self) -> &'static str {
        "thompson"
    }

    fn select(&self, history: &PlayHistory, rng: &mut dyn rand::RngCore) -> Result<usize> {
        ensure_arms(history)?;
        let samples = sample_all(history, rng)?;
        argmax(&samples).ok_or_else(|| BanditError::NumericalError {
            message: "no comparable posterior sample".into(),
        })
    }
}
