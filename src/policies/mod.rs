mod epsilon_greedy;
mod random;
mod thompson;
mod thompson_discover;
mod thompson_uncertainty;
mod ucb;

use rand::Rng;

pub use epsilon_greedy::EpsilonGreedy;
pub use random::Random;
pub use thompson::{BetaPosterior, ThompsonSampling};
pub use thompson_discover::ThompsonDiscover;
pub use thompson_uncertainty::{SampleBuffer, ThompsonUncertainty};
pub use ucb::Ucb;

use crate::error::{BanditError, Result};
use crate::history::PlayHistory;

/// Default exploration threshold for the epsilon-based policies.
pub const DEFAULT_EPSILON: f64 = 0.05;

/// Core trait for arm selection policies
///
/// A policy is a pure function of the play history and a random source: it
/// reads the play and reward tables and returns the index of the arm to pull
/// next. `history.n_arms()` is the number of arms to choose from.
///
/// Note: This trait uses `dyn rand::RngCore` instead of a generic parameter
/// to maintain object-safety, so the simulation can hold a `Box<dyn Policy>`.
pub trait Policy: Send + Sync {
    /// Short name used in logs and comparison reports
    fn name(&self) -> &'static str;

    /// Select the arm to play next
    fn select(&self, history: &PlayHistory, rng: &mut dyn rand::RngCore) -> Result<usize>;

    /// Whether `select` needs every arm to have been played at least once
    fn requires_played_arms(&self) -> bool {
        false
    }

    /// Smallest number of arms the policy can choose among
    fn min_arms(&self) -> usize {
        1
    }
}

impl<P: Policy + ?Sized> Policy for Box<P> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn select(&self, history: &PlayHistory, rng: &mut dyn rand::RngCore) -> Result<usize> {
        (**self).select(history, rng)
    }

    fn requires_played_arms(&self) -> bool {
        (**self).requires_played_arms()
    }

    fn min_arms(&self) -> usize {
        (**self).min_arms()
    }
}

/// Declarative policy choice, used to configure simulations and comparisons.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PolicyKind {
    Random,
    Thompson,
    EpsilonGreedy { epsilon: f64 },
    Ucb { confidence: f64 },
    ThompsonDiscover { epsilon: f64 },
    ThompsonUncertainty { samples: usize, buffer: SampleBuffer },
}

impl PolicyKind {
    /// The six policies with their default parameters.
    pub fn all() -> Vec<PolicyKind> {
        vec![
            PolicyKind::Random,
            PolicyKind::Thompson,
            PolicyKind::EpsilonGreedy {
                epsilon: DEFAULT_EPSILON,
            },
            PolicyKind::Ucb { confidence: 1.0 },
            PolicyKind::ThompsonDiscover {
                epsilon: DEFAULT_EPSILON,
            },
            PolicyKind::ThompsonUncertainty {
                samples: thompson_uncertainty::DEFAULT_SAMPLES,
                buffer: SampleBuffer::PerArm,
            },
        ]
    }

    /// Builds the policy, validating its parameters.
    pub fn build(&self) -> Result<Box<dyn Policy>> {
        Ok(match *self {
            PolicyKind::Random => Box::new(Random),
            PolicyKind::Thompson => Box::new(ThompsonSampling::new()),
            PolicyKind::EpsilonGreedy { epsilon } => Box::new(EpsilonGreedy::new(epsilon)?),
            PolicyKind::Ucb { confidence } => Box::new(Ucb::with_confidence(confidence)?),
            PolicyKind::ThompsonDiscover { epsilon } => Box::new(ThompsonDiscover::new(epsilon)?),
            PolicyKind::ThompsonUncertainty { samples, buffer } => {
                Box::new(ThompsonUncertainty::with_samples(samples, buffer)?)
            }
        })
    }
}

/// Index of the largest value, first occurrence on ties.
///
/// NaN values never win a comparison. Returns `None` for an empty slice.
pub fn argmax(values: &[f64]) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (idx, &value) in values.iter().enumerate() {
        if value.is_nan() {
            continue;
        }
        if best.is_none_or(|(_, current)| value > current) {
            best = Some((idx, value));
        }
    }
    best.map(|(idx, _)| idx)
}

/// Uniformly picks one of `0..n_arms` other than `excluded`.
pub(crate) fn choose_excluding<R: Rng + ?Sized>(
    n_arms: usize,
    excluded: usize,
    rng: &mut R,
) -> Option<usize> {
    if n_arms < 2 || excluded >= n_arms {
        return None;
    }
    let idx = rng.random_range(0..n_arms - 1);
    Some(if idx >= excluded { idx + 1 } else { idx })
}

pub(crate) fn validate_epsilon(epsilon: f64) -> Result<f64> {
    if !(0.0..=1.0).contains(&epsilon) {
        return Err(BanditError::InvalidParameter {
            message: format!("epsilon must be between 0 and 1, got {epsilon}"),
        });
    }
    Ok(epsilon)
}

pub(crate) fn ensure_arms(history: &PlayHistory) -> Result<usize> {
    match history.n_arms() {
        0 => Err(BanditError::NoArmsAvailable),
        n => Ok(n),
    }
}

/// Picks a uniformly random arm other than the best by empirical ratio.
pub(crate) fn explore_excluding_best(
    policy: &'static str,
    ratios: &[f64],
    rng: &mut dyn rand::RngCore,
) -> Result<usize> {
    let best = argmax(ratios).ok_or(BanditError::NoArmsAvailable)?;
    choose_excluding(ratios.len(), best, rng).ok_or(BanditError::NotEnoughArms {
        policy,
        required: 2,
        available: ratios.len(),
    })
}
