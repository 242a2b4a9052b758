//! Play and reward history for one simulation run.
//!
//! The history is two parallel `[arm, round]` tables: a play indicator and a
//! reward. Cells for rounds that have not happened yet are zero. Running
//! per-arm counts are kept alongside the tables so policies can read
//! aggregates without rescanning every round.

use crate::error::{BanditError, Result};

/// Play-indicator and reward tables indexed by `[arm, round]`.
///
/// At most one arm is played per round, and the per-arm counts always equal
/// the table row sums. Deserialized histories are checked against both.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(try_from = "RawPlayHistory")
)]
pub struct PlayHistory {
    n_arms: usize,
    n_rounds: usize,
    /// Row-major `n_arms x n_rounds` play indicators
    plays: Vec<u8>,
    /// Row-major `n_arms x n_rounds` rewards
    rewards: Vec<u8>,
    successes: Vec<u64>,
    totals: Vec<u64>,
}

impl PlayHistory {
    /// Creates an empty history sized for `n_arms` arms and `n_rounds` rounds.
    pub fn new(n_arms: usize, n_rounds: usize) -> Self {
        Self {
            n_arms,
            n_rounds,
            plays: vec![0; n_arms * n_rounds],
            rewards: vec![0; n_arms * n_rounds],
            successes: vec![0; n_arms],
            totals: vec![0; n_arms],
        }
    }

    /// Number of arms (rows).
    pub fn n_arms(&self) -> usize {
        self.n_arms
    }

    /// Number of rounds the tables can hold (columns).
    pub fn n_rounds(&self) -> usize {
        self.n_rounds
    }

    /// Records that `arm` was played in `round` with the given reward.
    ///
    /// Cells are only ever set, never cleared. A round that already has a
    /// recorded play is rejected, whichever arm it was.
    pub fn record(&mut self, arm: usize, round: usize, reward: u8) -> Result<()> {
        if arm >= self.n_arms {
            return Err(BanditError::ArmOutOfRange {
                index: arm,
                n_arms: self.n_arms,
            });
        }
        if round >= self.n_rounds {
            return Err(BanditError::RoundOutOfRange {
                round,
                n_rounds: self.n_rounds,
            });
        }
        if reward > 1 {
            return Err(BanditError::InvalidParameter {
                message: format!("reward must be 0 or 1, got {reward}"),
            });
        }

        if let Some(recorded) = self.arm_played_in(round) {
            return Err(BanditError::InvalidParameter {
                message: format!("round {round} already recorded for arm {recorded}"),
            });
        }

        let cell = arm * self.n_rounds + round;
        self.plays[cell] = 1;
        self.rewards[cell] = reward;
        self.totals[arm] += 1;
        self.successes[arm] += u64::from(reward);
        Ok(())
    }

    /// Play indicator for `(arm, round)`; `0` for cells outside the table.
    pub fn played(&self, arm: usize, round: usize) -> u8 {
        self.cell(&self.plays, arm, round)
    }

    /// Reward for `(arm, round)`; `0` for cells outside the table.
    pub fn reward(&self, arm: usize, round: usize) -> u8 {
        self.cell(&self.rewards, arm, round)
    }

    /// Row of play indicators for one arm.
    pub fn plays_row(&self, arm: usize) -> Option<&[u8]> {
        self.row(&self.plays, arm)
    }

    /// Row of rewards for one arm.
    pub fn rewards_row(&self, arm: usize) -> Option<&[u8]> {
        self.row(&self.rewards, arm)
    }

    /// Sum of rewards per arm.
    pub fn success_counts(&self) -> &[u64] {
        &self.successes
    }

    /// Number of plays per arm.
    pub fn total_counts(&self) -> &[u64] {
        &self.totals
    }

    /// Plays minus successes per arm.
    pub fn failure_counts(&self) -> Vec<u64> {
        self.totals
            .iter()
            .zip(&self.successes)
            .map(|(total, success)| total - success)
            .collect()
    }

    /// Total plays across all arms.
    pub fn total_plays(&self) -> u64 {
        self.totals.iter().sum()
    }

    /// Empirical success ratio `successes / total` of one arm.
    pub fn success_ratio(&self, arm: usize) -> Result<f64> {
        let total = *self.totals.get(arm).ok_or(BanditError::ArmOutOfRange {
            index: arm,
            n_arms: self.n_arms,
        })?;
        if total == 0 {
            return Err(BanditError::UndefinedArmStatistic { arm });
        }
        Ok(self.successes[arm] as f64 / total as f64)
    }

    /// Empirical success ratios of every arm.
    ///
    /// Fails on the first arm that has never been played.
    pub fn success_ratios(&self) -> Result<Vec<f64>> {
        (0..self.n_arms).map(|arm| self.success_ratio(arm)).collect()
    }

    /// First arm that has never been played, if any.
    pub fn first_unplayed(&self) -> Option<usize> {
        self.totals.iter().position(|&total| total == 0)
    }

    /// Arm played in `round`, if the round has been recorded.
    pub fn arm_played_in(&self, round: usize) -> Option<usize> {
        if round >= self.n_rounds {
            return None;
        }
        (0..self.n_arms).find(|&arm| self.plays[arm * self.n_rounds + round] == 1)
    }

    fn cell(&self, table: &[u8], arm: usize, round: usize) -> u8 {
        if arm >= self.n_arms || round >= self.n_rounds {
            return 0;
        }
        table[arm * self.n_rounds + round]
    }

    fn row<'a>(&self, table: &'a [u8], arm: usize) -> Option<&'a [u8]> {
        if arm >= self.n_arms {
            return None;
        }
        let start = arm * self.n_rounds;
        Some(&table[start..start + self.n_rounds])
    }
}

#[cfg(feature = "serde")]
#[derive(serde::Deserialize)]
struct RawPlayHistory {
    n_arms: usize,
    n_rounds: usize,
    plays: Vec<u8>,
    rewards: Vec<u8>,
    successes: Vec<u64>,
    totals: Vec<u64>,
}

#[cfg(feature = "serde")]
impl TryFrom<RawPlayHistory> for PlayHistory {
    type Error = BanditError;

    /// Replays every recorded cell through [`PlayHistory::record`], then
    /// checks the stored counts against the rebuilt ones.
    fn try_from(raw: RawPlayHistory) -> Result<Self> {
        let cells = raw
            .n_arms
            .checked_mul(raw.n_rounds)
            .ok_or_else(|| inconsistent("table size overflows".to_string()))?;
        if raw.plays.len() != cells || raw.rewards.len() != cells {
            return Err(inconsistent(format!(
                "tables must hold {cells} cells, got {} plays and {} rewards",
                raw.plays.len(),
                raw.rewards.len()
            )));
        }
        if raw.successes.len() != raw.n_arms || raw.totals.len() != raw.n_arms {
            return Err(inconsistent(format!(
                "counts must cover {} arms",
                raw.n_arms
            )));
        }

        let mut history = PlayHistory::new(raw.n_arms, raw.n_rounds);
        for arm in 0..raw.n_arms {
            for round in 0..raw.n_rounds {
                let cell = arm * raw.n_rounds + round;
                match (raw.plays[cell], raw.rewards[cell]) {
                    (0, 0) => {}
                    (1, reward) => history.record(arm, round, reward)?,
                    (played, reward) => {
                        return Err(inconsistent(format!(
                            "cell ({arm}, {round}) has play {played} and reward {reward}"
                        )));
                    }
                }
            }
        }

        if history.successes != raw.successes || history.totals != raw.totals {
            return Err(inconsistent(
                "per-arm counts do not match the tables".to_string(),
            ));
        }
        Ok(history)
    }
}

#[cfg(feature = "serde")]
fn inconsistent(message: String) -> BanditError {
    BanditError::InconsistentData { message }
}

/// Append-only log of per-arm success and failure counts, one entry per round.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(try_from = "RawCountLog")
)]
pub struct CountLog {
    n_arms: usize,
    successes: Vec<u64>,
    failures: Vec<u64>,
}

impl CountLog {
    /// Creates an empty log for `n_arms` arms with room for `capacity` rounds.
    pub fn with_capacity(n_arms: usize, capacity: usize) -> Self {
        Self {
            n_arms,
            successes: Vec::with_capacity(n_arms * capacity),
            failures: Vec::with_capacity(n_arms * capacity),
        }
    }

    pub fn n_arms(&self) -> usize {
        self.n_arms
    }

    /// Appends the current counts of `history` as the next round's snapshot.
    pub fn push(&mut self, history: &PlayHistory) {
        debug_assert_eq!(history.n_arms(), self.n_arms);
        self.successes.extend_from_slice(history.success_counts());
        self.failures.extend(history.failure_counts());
    }

    /// Number of rounds logged.
    pub fn len(&self) -> usize {
        if self.n_arms == 0 {
            0
        } else {
            self.successes.len() / self.n_arms
        }
    }

    /// Whether no round has been logged.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Success counts per arm after `round`.
    pub fn successes_at(&self, round: usize) -> Option<&[u64]> {
        Self::slice(&self.successes, self.n_arms, round)
    }

    /// Failure counts per arm after `round`.
    pub fn failures_at(&self, round: usize) -> Option<&[u64]> {
        Self::slice(&self.failures, self.n_arms, round)
    }

    /// Iterates `(successes, failures)` per logged round.
    pub fn iter(&self) -> impl Iterator<Item = (&[u64], &[u64])> {
        let width = self.n_arms.max(1);
        self.successes
            .chunks(width)
            .zip(self.failures.chunks(width))
    }

    fn slice(data: &[u64], n_arms: usize, round: usize) -> Option<&[u64]> {
        let start = round.checked_mul(n_arms)?;
        data.get(start..start.checked_add(n_arms)?)
    }
}

#[cfg(feature = "serde")]
#[derive(serde::Deserialize)]
struct RawCountLog {
    n_arms: usize,
    successes: Vec<u64>,
    failures: Vec<u64>,
}

#[cfg(feature = "serde")]
impl TryFrom<RawCountLog> for CountLog {
    type Error = BanditError;

    fn try_from(raw: RawCountLog) -> Result<Self> {
        if raw.successes.len() != raw.failures.len() {
            return Err(inconsistent(format!(
                "{} success entries but {} failure entries",
                raw.successes.len(),
                raw.failures.len()
            )));
        }
        let ragged = match raw.n_arms {
            0 => !raw.successes.is_empty(),
            n_arms => raw.successes.len() % n_arms != 0,
        };
        if ragged {
            return Err(inconsistent(format!(
                "{} entries do not split into rounds of {} arms",
                raw.successes.len(),
                raw.n_arms
            )));
        }
        Ok(Self {
            n_arms: raw.n_arms,
            successes: raw.successes,
            failures: raw.failures,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_updates_tables_and_counts() {
        let mut history = PlayHistory::new(3, 4);
        history.record(1, 0, 1).unwrap();
        history.record(1, 1, 0).unwrap();
        history.record(2, 2, 1).unwrap();

        assert_eq!(history.played(1, 0), 1);
        assert_eq!(history.reward(1, 0), 1);
        assert_eq!(history.played(0, 0), 0);
        assert_eq!(history.plays_row(1), Some(&[1, 1, 0, 0][..]));
        assert_eq!(history.rewards_row(1), Some(&[1, 0, 0, 0][..]));

        assert_eq!(history.success_counts(), &[0, 1, 1]);
        assert_eq!(history.total_counts(), &[0, 2, 1]);
        assert_eq!(history.failure_counts(), vec![0, 1, 0]);
        assert_eq!(history.total_plays(), 3);
    }

    #[test]
    fn test_record_rejects_out_of_range_and_duplicates() {
        let mut history = PlayHistory::new(2, 2);
        assert!(matches!(
            history.record(2, 0, 1),
            Err(BanditError::ArmOutOfRange { index: 2, n_arms: 2 })
        ));
        assert!(matches!(
            history.record(0, 2, 1),
            Err(BanditError::RoundOutOfRange { round: 2, n_rounds: 2 })
        ));
        assert!(history.record(0, 0, 2).is_err());

        history.record(0, 0, 1).unwrap();
        assert!(history.record(0, 0, 0).is_err());
        // a failed write must not touch the counts
        assert_eq!(history.total_counts(), &[1, 0]);
        assert_eq!(history.reward(0, 0), 1);
    }

    #[test]
    fn test_record_rejects_second_arm_in_same_round() {
        let mut history = PlayHistory::new(3, 2);
        history.record(0, 0, 1).unwrap();

        assert!(matches!(
            history.record(1, 0, 0),
            Err(BanditError::InvalidParameter { .. })
        ));
        let column: u8 = (0..3).map(|arm| history.played(arm, 0)).sum();
        assert_eq!(column, 1);
        assert_eq!(history.total_counts(), &[1, 0, 0]);
        assert_eq!(history.arm_played_in(0), Some(0));

        history.record(2, 1, 0).unwrap();
        assert_eq!(history.arm_played_in(1), Some(2));
        assert_eq!(history.arm_played_in(5), None);
    }

    #[test]
    fn test_success_ratio_undefined_for_unplayed_arm() {
        let mut history = PlayHistory::new(2, 3);
        history.record(0, 0, 1).unwrap();
        history.record(0, 1, 0).unwrap();

        assert_eq!(history.success_ratio(0).unwrap(), 0.5);
        assert_eq!(
            history.success_ratio(1),
            Err(BanditError::UndefinedArmStatistic { arm: 1 })
        );
        assert!(history.success_ratios().is_err());
        assert_eq!(history.first_unplayed(), Some(1));
    }

    #[test]
    fn test_count_log_snapshots() {
        let mut history = PlayHistory::new(2, 3);
        let mut log = CountLog::with_capacity(2, 3);
        assert!(log.is_empty());

        history.record(0, 0, 1).unwrap();
        log.push(&history);
        history.record(1, 1, 0).unwrap();
        log.push(&history);

        assert_eq!(log.len(), 2);
        assert_eq!(log.successes_at(0), Some(&[1, 0][..]));
        assert_eq!(log.failures_at(0), Some(&[0, 0][..]));
        assert_eq!(log.successes_at(1), Some(&[1, 0][..]));
        assert_eq!(log.failures_at(1), Some(&[0, 1][..]));
        assert_eq!(log.successes_at(2), None);
        assert_eq!(log.iter().count(), 2);
    }

    #[test]
    fn test_count_log_lookup_past_usize_range() {
        let mut log = CountLog::with_capacity(3, 1);
        log.push(&PlayHistory::new(3, 1));

        assert_eq!(log.successes_at(usize::MAX / 3), None);
        assert_eq!(log.failures_at(usize::MAX), None);
        assert_eq!(log.successes_at(0), Some(&[0, 0, 0][..]));
    }

    #[cfg(feature = "serde")]
    mod serde_validation {
        use super::*;

        #[test]
        fn test_history_roundtrip_keeps_tables() {
            let mut history = PlayHistory::new(2, 3);
            history.record(1, 0, 1).unwrap();
            history.record(0, 1, 0).unwrap();

            let json = serde_json::to_string(&history).unwrap();
            let back: PlayHistory = serde_json::from_str(&json).unwrap();
            assert_eq!(back, history);
        }

        #[test]
        fn test_history_rejects_short_tables() {
            let json = r#"{"n_arms":2,"n_rounds":100,"plays":[],"rewards":[],"successes":[0,0],"totals":[0,0]}"#;
            assert!(serde_json::from_str::<PlayHistory>(json).is_err());
        }

        #[test]
        fn test_history_rejects_two_arms_in_one_round() {
            let json = r#"{"n_arms":2,"n_rounds":1,"plays":[1,1],"rewards":[0,0],"successes":[0,0],"totals":[1,1]}"#;
            assert!(serde_json::from_str::<PlayHistory>(json).is_err());
        }

        #[test]
        fn test_history_rejects_counts_that_disagree_with_tables() {
            let json = r#"{"n_arms":2,"n_rounds":2,"plays":[1,0,0,1],"rewards":[1,0,0,0],"successes":[0,0],"totals":[1,1]}"#;
            let err = serde_json::from_str::<PlayHistory>(json).unwrap_err();
            assert!(err.to_string().contains("counts do not match"));

            let json = r#"{"n_arms":1,"n_rounds":1,"plays":[0],"rewards":[1],"successes":[0],"totals":[0]}"#;
            assert!(serde_json::from_str::<PlayHistory>(json).is_err());
        }

        #[test]
        fn test_count_log_rejects_ragged_entries() {
            let json = r#"{"n_arms":2,"successes":[1,0,1],"failures":[0,0,1]}"#;
            assert!(serde_json::from_str::<CountLog>(json).is_err());

            let json = r#"{"n_arms":2,"successes":[1,0],"failures":[0]}"#;
            assert!(serde_json::from_str::<CountLog>(json).is_err());

            let json = r#"{"n_arms":2,"successes":[1,0],"failures":[0,0]}"#;
            let log: CountLog = serde_json::from_str(json).unwrap();
            assert_eq!(log.len(), 1);
        }
    }
}
