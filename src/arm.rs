//! Bandit arm model.
//!
//! Each arm is a slot machine with a fixed, hidden success probability. The
//! arm model is the only place the true probabilities are read: a pull draws
//! a Bernoulli reward and reports the regret of choosing that arm.

use rand::Rng;

use crate::error::{BanditError, Result};

/// Outcome of a single pull.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Pull {
    /// Binary reward, `0` or `1`.
    pub reward: u8,
    /// Gap between the best arm's probability and the pulled arm's probability.
    pub regret: f64,
}

/// Pulls `arm` once against the given true success probabilities.
///
/// The reward is a Bernoulli draw with probability `probabilities[arm]`. The
/// regret is `max(probabilities) - probabilities[arm]` and depends only on the
/// choice, never on the drawn reward.
///
/// # Errors
/// Returns [`BanditError::ArmOutOfRange`] if `arm` is not a valid index and
/// [`BanditError::InvalidProbability`] if any arm's probability is not in
/// `[0, 1]`, since every arm takes part in the regret.
///
/// # Examples
///
/// ```
/// use banditsim::play;
/// use rand::SeedableRng;
///
/// let mut rng = rand::rngs::StdRng::seed_from_u64(7);
/// let pull = play(1, &[0.2, 0.9], &mut rng).unwrap();
/// assert!(pull.reward <= 1);
/// assert_eq!(pull.regret, 0.0);
/// ```
pub fn play<R: Rng + ?Sized>(arm: usize, probabilities: &[f64], rng: &mut R) -> Result<Pull> {
    let p = *probabilities.get(arm).ok_or(BanditError::ArmOutOfRange {
        index: arm,
        n_arms: probabilities.len(),
    })?;
    validate_probabilities(probabilities)?;

    let best = probabilities.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let reward = u8::from(rng.random_bool(p));

    Ok(Pull {
        reward,
        regret: best - p,
    })
}

/// Checks that there is at least one arm and every probability is in `[0, 1]`.
pub fn validate_probabilities(probabilities: &[f64]) -> Result<()> {
    if probabilities.is_empty() {
        return Err(BanditError::NoArmsAvailable);
    }
    // NaN fails `contains` as well
    for (arm, &value) in probabilities.iter().enumerate() {
        if !(0.0..=1.0).contains(&value) {
            return Err(BanditError::InvalidProbability { arm, value });
        }
    }
    Ok(())
}

/// Index of the arm with the highest true probability (first on ties).
pub fn best_arm(probabilities: &[f64]) -> Option<usize> {
    crate::policies::argmax(probabilities)
}
