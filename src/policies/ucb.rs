use super::{Policy, argmax, ensure_arms};
use crate::error::{BanditError, Result};
use crate::history::PlayHistory;

/// Upper Confidence Bound (UCB1) policy
///
/// Scores each arm by its empirical success ratio plus the exploration bonus
/// `confidence * sqrt(2 ln(N) / n)`, where `N` is the number of plays across
/// all arms and `n` the plays of that arm, and plays the best score. The
/// classic UCB1 uses `confidence = 1`. Every arm must have been played once.
#[derive(Clone, Copy, Debug)]
pub struct Ucb {
    confidence: f64,
}

impl Ucb {
    /// Creates a UCB1 policy with the standard bonus
    pub fn new() -> Self {
        Self { confidence: 1.0 }
    }

    /// Creates a UCB1 policy with a scaled exploration bonus
    ///
    /// # Arguments
    /// * `confidence` - Multiplier on the bonus (must be positive).
    ///   Higher values encourage more exploration
    pub fn with_confidence(confidence: f64) -> Result<Self> {
        if !(confidence > 0.0 && confidence.is_finite()) {
            return Err(BanditError::InvalidParameter {
                message: format!("confidence must be positive and finite, got {confidence}"),
            });
        }
        Ok(Self { confidence })
    }

    /// Gets the confidence parameter
    pub fn confidence(&self) -> f64 {
        self.confidence
    }

    /// Upper confidence bound of every arm
    pub fn scores(&self, history: &PlayHistory) -> Result<Vec<f64>> {
        let ratios = history.success_ratios()?;
        let log_total = (history.total_plays() as f64).ln();

        Ok(ratios
            .iter()
            .zip(history.total_counts())
            .map(|(ratio, &pulls)| {
                let exploration = self.confidence * (2.0 * log_total / pulls as f64).sqrt();
                ratio + exploration
            })
            .collect())
    }
}

impl Default for Ucb {
    fn default() -> Self {
        Self::new()
    }
}

impl Policy for Ucb {
    fn name(&self) -> &'static str {
        "ucb"
    }

    fn select(&self, history: &PlayHistory, _rng: &mut dyn rand::RngCore) -> Result<usize> {
        ensure_arms(history)?;
        let scores = self.scores(history)?;
        argmax(&scores).ok_or_else(|| BanditError::NumericalError {
            message: "no comparable confidence bound".into(),
        })
    }

    fn requires_played_arms(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policies::test_support::history_from_counts;
    use approx::assert_abs_diff_eq;
    use rand::SeedableRng;

    #[test]
    fn test_ucb_prefers_less_played_arm_at_equal_ratio() {
        let history = history_from_counts(&[(5, 5), (50, 50)]);
        let mut rng = rand::rngs::StdRng::seed_from_u64(42);

        assert_eq!(Ucb::new().select(&history, &mut rng).unwrap(), 0);

        // reversed order: the less played arm still wins
        let history = history_from_counts(&[(50, 50), (5, 5)]);
        assert_eq!(Ucb::new().select(&history, &mut rng).unwrap(), 1);
    }

    #[test]
    fn test_ucb_scores() {
        let history = history_from_counts(&[(5, 5), (50, 50)]);
        let scores = Ucb::new().scores(&history).unwrap();

        let log_total = 110f64.ln();
        assert_abs_diff_eq!(scores[0], 0.5 + (2.0 * log_total / 10.0).sqrt(), epsilon = 1e-12);
        assert_abs_diff_eq!(scores[1], 0.5 + (2.0 * log_total / 100.0).sqrt(), epsilon = 1e-12);
    }

    #[test]
    fn test_ucb_deterministic_selection() {
        let history = history_from_counts(&[(1, 9), (5, 5), (9, 1)]);
        let mut rng1 = rand::rngs::StdRng::seed_from_u64(1);
        let mut rng2 = rand::rngs::StdRng::seed_from_u64(999);

        // UCB is deterministic - should select same arm regardless of RNG
        let choice1 = Ucb::new().select(&history, &mut rng1).unwrap();
        let choice2 = Ucb::new().select(&history, &mut rng2).unwrap();
        assert_eq!(choice1, choice2);
        assert_eq!(choice1, 2);
    }

    #[test]
    fn test_ucb_single_play_has_zero_bonus() {
        // ln(1) = 0, so the bonus vanishes after the very first play
        let history = history_from_counts(&[(1, 0)]);
        assert_eq!(Ucb::new().scores(&history).unwrap(), vec![1.0]);
    }

    #[test]
    fn test_ucb_requires_played_arms() {
        let history = history_from_counts(&[(3, 2), (0, 0)]);
        let mut rng = rand::rngs::StdRng::seed_from_u64(42);

        assert_eq!(
            Ucb::new().select(&history, &mut rng),
            Err(BanditError::UndefinedArmStatistic { arm: 1 })
        );
    }

    #[test]
    fn test_ucb_confidence_parameter() {
        assert_eq!(Ucb::new().confidence(), 1.0);
        assert_eq!(Ucb::with_confidence(2.0).unwrap().confidence(), 2.0);
        assert!(Ucb::with_confidence(0.0).is_err());
        assert!(Ucb::with_confidence(-1.0).is_err());
        assert!(Ucb::with_confidence(f64::INFINITY).is_err());
    }
}
