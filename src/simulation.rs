//! Simulation driver.
//!
//! A [`Simulation`] owns everything one run mutates: the play/reward tables,
//! the regret trace, the per-round choices and the per-round count log. Each
//! round asks the policy for an arm, pulls it, and folds the result back into
//! the history before the next round. Once the last round is played the state
//! is frozen into a read-only [`SimulationReport`].

use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::{debug, info, trace};

use crate::arm::{self, validate_probabilities};
use crate::error::{BanditError, Result};
use crate::history::{CountLog, PlayHistory};
use crate::policies::{BetaPosterior, Policy, PolicyKind, argmax};

/// Caller-side warm-up applied before the policy takes over.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum WarmUp {
    /// The policy chooses from the first round.
    #[default]
    None,
    /// Rounds `0..n_arms` play arms `0..n_arms` in order. These are ordinary
    /// rounds: their rewards are recorded and their regret counts.
    RoundRobin,
}

/// Result of a single round.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RoundOutcome {
    pub round: usize,
    pub arm: usize,
    pub reward: u8,
    pub regret: f64,
    pub cumulative_regret: f64,
}

enum PolicySource {
    Boxed(Box<dyn Policy>),
    Kind(PolicyKind),
}

/// Builder for creating simulations with a fluent API
#[derive(Default)]
pub struct SimulationBuilder {
    probabilities: Option<Vec<f64>>,
    rounds: Option<usize>,
    policy: Option<PolicySource>,
    seed: Option<u64>,
    warm_up: WarmUp,
}

impl SimulationBuilder {
    /// Set the true success probability of every arm
    pub fn probabilities<I>(mut self, probabilities: I) -> Self
    where
        I: IntoIterator<Item = f64>,
    {
        self.probabilities = Some(probabilities.into_iter().collect());
        self
    }

    /// Set the number of rounds to play
    pub fn rounds(mut self, rounds: usize) -> Self {
        self.rounds = Some(rounds);
        self
    }

    /// Set the decision policy
    pub fn policy<P: Policy + 'static>(mut self, policy: P) -> Self {
        self.policy = Some(PolicySource::Boxed(Box::new(policy)));
        self
    }

    /// Set the decision policy declaratively; parameters are checked in `build`
    pub fn policy_kind(mut self, kind: PolicyKind) -> Self {
        self.policy = Some(PolicySource::Kind(kind));
        self
    }

    /// Seed the run's random stream for reproducible results
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Set the warm-up strategy
    pub fn warm_up(mut self, warm_up: WarmUp) -> Self {
        self.warm_up = warm_up;
        self
    }

    /// Build the simulation, validating the whole configuration
    pub fn build(self) -> Result<Simulation> {
        let probabilities = self.probabilities.ok_or_else(|| BanditError::BuilderError {
            message: "Probabilities not specified".into(),
        })?;
        let n_rounds = self.rounds.ok_or_else(|| BanditError::BuilderError {
            message: "Rounds not specified".into(),
        })?;
        let policy = match self.policy {
            Some(PolicySource::Boxed(policy)) => policy,
            Some(PolicySource::Kind(kind)) => kind.build()?,
            None => {
                return Err(BanditError::BuilderError {
                    message: "Policy not specified".into(),
                });
            }
        };

        validate_probabilities(&probabilities)?;
        if n_rounds == 0 {
            return Err(BanditError::NoRounds);
        }

        let n_arms = probabilities.len();
        if n_arms < policy.min_arms() {
            return Err(BanditError::NotEnoughArms {
                policy: policy.name(),
                required: policy.min_arms(),
                available: n_arms,
            });
        }
        if policy.requires_played_arms() && self.warm_up == WarmUp::None {
            return Err(BanditError::WarmUpRequired {
                policy: policy.name(),
            });
        }

        let rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };

        Ok(Simulation {
            policy,
            probabilities,
            n_rounds,
            warm_up: self.warm_up,
            seed: self.seed,
            rng,
            round: 0,
            history: PlayHistory::new(n_arms, n_rounds),
            counts: CountLog::with_capacity(n_arms, n_rounds),
            regrets: Vec::with_capacity(n_rounds),
            regret_trace: Vec::with_capacity(n_rounds),
            chosen_arms: Vec::with_capacity(n_rounds),
            rewards: Vec::with_capacity(n_rounds),
            cumulative_regret: 0.0,
        })
    }
}

/// One simulation run of a policy against a fixed set of arms
pub struct Simulation {
    policy: Box<dyn Policy>,
    probabilities: Vec<f64>,
    n_rounds: usize,
    warm_up: WarmUp,
    seed: Option<u64>,
    rng: StdRng,
    round: usize,
    history: PlayHistory,
    counts: CountLog,
    regrets: Vec<f64>,
    regret_trace: Vec<f64>,
    chosen_arms: Vec<usize>,
    rewards: Vec<u8>,
    cumulative_regret: f64,
}

impl std::fmt::Debug for Simulation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Simulation")
            .field("policy", &self.policy.name())
            .field("probabilities", &self.probabilities)
            .field("n_rounds", &self.n_rounds)
            .field("warm_up", &self.warm_up)
            .field("seed", &self.seed)
            .field("round", &self.round)
            .field("cumulative_regret", &self.cumulative_regret)
            .finish()
    }
}

impl Simulation {
    /// Create a new builder for constructing a simulation
    pub fn builder() -> SimulationBuilder {
        SimulationBuilder::default()
    }

    /// Creates an unseeded simulation without warm-up
    pub fn new<P: Policy + 'static>(
        probabilities: Vec<f64>,
        rounds: usize,
        policy: P,
    ) -> Result<Self> {
        Self::builder()
            .probabilities(probabilities)
            .rounds(rounds)
            .policy(policy)
            .build()
    }

    pub fn policy_name(&self) -> &'static str {
        self.policy.name()
    }

    pub fn n_arms(&self) -> usize {
        self.probabilities.len()
    }

    pub fn n_rounds(&self) -> usize {
        self.n_rounds
    }

    /// Index of the next round to be played
    pub fn round(&self) -> usize {
        self.round
    }

    pub fn is_finished(&self) -> bool {
        self.round >= self.n_rounds
    }

    /// History accumulated so far
    pub fn history(&self) -> &PlayHistory {
        &self.history
    }

    /// Cumulative regret after each round played so far
    pub fn regret_trace(&self) -> &[f64] {
        &self.regret_trace
    }

    /// Plays exactly one round.
    ///
    /// A failing policy or arm pull leaves the state untouched.
    pub fn step(&mut self) -> Result<RoundOutcome> {
        if self.is_finished() {
            return Err(BanditError::SimulationFinished);
        }
        let round = self.round;

        let arm = if self.warm_up == WarmUp::RoundRobin && round < self.n_arms() {
            debug!(round, arm = round, "warm-up round");
            round
        } else {
            self.policy.select(&self.history, &mut self.rng)?
        };

        let pull = arm::play(arm, &self.probabilities, &mut self.rng)?;
        self.history.record(arm, round, pull.reward)?;
        self.counts.push(&self.history);

        self.regrets.push(pull.regret);
        self.cumulative_regret += pull.regret;
        self.regret_trace.push(self.cumulative_regret);
        self.chosen_arms.push(arm);
        self.rewards.push(pull.reward);
        self.round += 1;

        trace!(
            round,
            arm,
            reward = pull.reward,
            cumulative_regret = self.cumulative_regret,
            "round played"
        );

        Ok(RoundOutcome {
            round,
            arm,
            reward: pull.reward,
            regret: pull.regret,
            cumulative_regret: self.cumulative_regret,
        })
    }

    /// Plays every remaining round and returns the frozen results.
    ///
    /// Any failure aborts the run; the partial state is discarded.
    pub fn run(mut self) -> Result<SimulationReport> {
        info!(
            policy = self.policy.name(),
            n_arms = self.n_arms(),
            n_rounds = self.n_rounds,
            seed = ?self.seed,
            "starting simulation"
        );

        while !self.is_finished() {
            self.step()?;
        }

        let report = self.into_report();
        info!(
            policy = %report.policy,
            total_regret = report.total_regret(),
            success_prob = ?report.success_prob,
            "simulation finished"
        );
        Ok(report)
    }

    fn into_report(self) -> SimulationReport {
        let success_prob = self
            .history
            .success_counts()
            .iter()
            .zip(self.history.total_counts())
            .map(|(&successes, &total)| (total > 0).then(|| successes as f64 / total as f64))
            .collect();

        SimulationReport {
            policy: self.policy.name().to_string(),
            probabilities: self.probabilities,
            seed: self.seed,
            history: self.history,
            counts: self.counts,
            regrets: self.regrets,
            regret_trace: self.regret_trace,
            chosen_arms: self.chosen_arms,
            rewards: self.rewards,
            success_prob,
        }
    }
}

/// Read-only results of a finished run, consumed by plotting and animation.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(try_from = "RawSimulationReport")
)]
pub struct SimulationReport {
    policy: String,
    probabilities: Vec<f64>,
    seed: Option<u64>,
    history: PlayHistory,
    counts: CountLog,
    regrets: Vec<f64>,
    regret_trace: Vec<f64>,
    chosen_arms: Vec<usize>,
    rewards: Vec<u8>,
    success_prob: Vec<Option<f64>>,
}

impl SimulationReport {
    /// Name of the policy that produced the run
    pub fn policy(&self) -> &str {
        &self.policy
    }

    /// True success probabilities the run was played against
    pub fn probabilities(&self) -> &[f64] {
        &self.probabilities
    }

    pub fn seed(&self) -> Option<u64> {
        self.seed
    }

    pub fn n_arms(&self) -> usize {
        self.probabilities.len()
    }

    pub fn n_rounds(&self) -> usize {
        self.regret_trace.len()
    }

    /// Final play and reward tables
    pub fn history(&self) -> &PlayHistory {
        &self.history
    }

    /// Success/failure counts per arm after each round
    pub fn counts(&self) -> &CountLog {
        &self.counts
    }

    /// Regret of each round's choice
    pub fn regrets(&self) -> &[f64] {
        &self.regrets
    }

    /// Cumulative regret after each round
    pub fn regret_trace(&self) -> &[f64] {
        &self.regret_trace
    }

    pub fn total_regret(&self) -> f64 {
        self.regret_trace.last().copied().unwrap_or(0.0)
    }

    /// Arm chosen in each round
    pub fn chosen_arms(&self) -> &[usize] {
        &self.chosen_arms
    }

    /// Reward drawn in each round
    pub fn rewards(&self) -> &[u8] {
        &self.rewards
    }

    /// Final `successes / plays` per arm; `None` for arms never played.
    pub fn success_prob(&self) -> &[Option<f64>] {
        &self.success_prob
    }

    /// Number of plays per arm
    pub fn play_counts(&self) -> &[u64] {
        self.history.total_counts()
    }

    /// Arm with the highest estimated success rate, ignoring unplayed arms
    pub fn estimated_best_arm(&self) -> Option<usize> {
        let estimates: Vec<f64> = self
            .success_prob
            .iter()
            .map(|p| p.unwrap_or(f64::NAN))
            .collect();
        argmax(&estimates)
    }

    /// Beta posterior of `arm` as it stood after `round`
    pub fn posterior(&self, arm: usize, round: usize) -> Option<BetaPosterior> {
        let successes = *self.counts.successes_at(round)?.get(arm)?;
        let failures = *self.counts.failures_at(round)?.get(arm)?;
        Some(BetaPosterior::new(successes, failures))
    }
}

#[cfg(feature = "serde")]
#[derive(serde::Deserialize)]
struct RawSimulationReport {
    policy: String,
    probabilities: Vec<f64>,
    seed: Option<u64>,
    history: PlayHistory,
    counts: CountLog,
    regrets: Vec<f64>,
    regret_trace: Vec<f64>,
    chosen_arms: Vec<usize>,
    rewards: Vec<u8>,
    success_prob: Vec<Option<f64>>,
}

#[cfg(feature = "serde")]
impl TryFrom<RawSimulationReport> for SimulationReport {
    type Error = BanditError;

    /// Checks that every per-round list covers the whole run and agrees with
    /// the history tables. Float values are taken as stored.
    fn try_from(raw: RawSimulationReport) -> Result<Self> {
        let inconsistent = |message: String| BanditError::InconsistentData { message };

        validate_probabilities(&raw.probabilities)?;
        let n_arms = raw.probabilities.len();
        let n_rounds = raw.history.n_rounds();
        if raw.history.n_arms() != n_arms
            || raw.counts.n_arms() != n_arms
            || raw.success_prob.len() != n_arms
        {
            return Err(inconsistent(format!(
                "history, count log and estimates must cover {n_arms} arms"
            )));
        }
        let lengths = [
            raw.counts.len(),
            raw.regrets.len(),
            raw.regret_trace.len(),
            raw.chosen_arms.len(),
            raw.rewards.len(),
        ];
        if lengths.iter().any(|&len| len != n_rounds) {
            return Err(inconsistent(format!(
                "per-round lists must cover {n_rounds} rounds, got {lengths:?}"
            )));
        }
        for (round, (&arm, &reward)) in raw.chosen_arms.iter().zip(&raw.rewards).enumerate() {
            if raw.history.arm_played_in(round) != Some(arm)
                || raw.history.reward(arm, round) != reward
            {
                return Err(inconsistent(format!(
                    "round {round} does not match the history tables"
                )));
            }
        }

        Ok(Self {
            policy: raw.policy,
            probabilities: raw.probabilities,
            seed: raw.seed,
            history: raw.history,
            counts: raw.counts,
            regrets: raw.regrets,
            regret_trace: raw.regret_trace,
            chosen_arms: raw.chosen_arms,
            rewards: raw.rewards,
            success_prob: raw.success_prob,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policies::{EpsilonGreedy, Random, ThompsonSampling, Ucb};

    const PROBS: [f64; 5] = [0.1, 0.4, 0.45, 0.6, 0.61];

    #[test]
    fn test_builder_requires_fields() {
        let result = Simulation::builder().rounds(10).policy(Random).build();
        assert!(matches!(result, Err(BanditError::BuilderError { .. })));

        let result = Simulation::builder()
            .probabilities(PROBS)
            .policy(Random)
            .build();
        assert!(matches!(result, Err(BanditError::BuilderError { .. })));

        let result = Simulation::builder().probabilities(PROBS).rounds(10).build();
        assert!(matches!(result, Err(BanditError::BuilderError { .. })));
    }

    #[test]
    fn test_builder_rejects_degenerate_inputs() {
        assert!(matches!(
            Simulation::new(vec![], 10, Random),
            Err(BanditError::NoArmsAvailable)
        ));
        assert!(matches!(
            Simulation::new(PROBS.to_vec(), 0, Random),
            Err(BanditError::NoRounds)
        ));
        assert!(matches!(
            Simulation::new(vec![0.5, -0.2], 10, Random),
            Err(BanditError::InvalidProbability { arm: 1, .. })
        ));
    }

    #[test]
    fn test_builder_enforces_policy_preconditions() {
        assert!(matches!(
            Simulation::new(PROBS.to_vec(), 10, Ucb::new()),
            Err(BanditError::WarmUpRequired { policy: "ucb" })
        ));
        assert!(matches!(
            Simulation::builder()
                .probabilities([0.5])
                .rounds(10)
                .policy(EpsilonGreedy::new(0.1).unwrap())
                .warm_up(WarmUp::RoundRobin)
                .build(),
            Err(BanditError::NotEnoughArms { required: 2, available: 1, .. })
        ));
        assert!(matches!(
            Simulation::builder()
                .probabilities(PROBS)
                .rounds(10)
                .policy_kind(PolicyKind::EpsilonGreedy { epsilon: 2.0 })
                .warm_up(WarmUp::RoundRobin)
                .build(),
            Err(BanditError::InvalidParameter { .. })
        ));
    }

    #[test]
    fn test_step_records_one_arm_per_round() {
        let mut sim = Simulation::builder()
            .probabilities(PROBS)
            .rounds(20)
            .policy(ThompsonSampling)
            .seed(42)
            .build()
            .unwrap();

        for expected_round in 0..20 {
            let outcome = sim.step().unwrap();
            assert_eq!(outcome.round, expected_round);
            let column: u8 = (0..PROBS.len())
                .map(|arm| sim.history().played(arm, expected_round))
                .sum();
            assert_eq!(column, 1);
            assert_eq!(sim.history().played(outcome.arm, expected_round), 1);
        }
        assert!(sim.is_finished());
        assert_eq!(sim.step(), Err(BanditError::SimulationFinished));
    }

    #[test]
    fn test_round_robin_warm_up() {
        let report = Simulation::builder()
            .probabilities(PROBS)
            .rounds(12)
            .policy(Ucb::new())
            .warm_up(WarmUp::RoundRobin)
            .seed(1)
            .build()
            .unwrap()
            .run()
            .unwrap();

        assert_eq!(&report.chosen_arms()[..5], &[0, 1, 2, 3, 4]);
        assert!(report.play_counts().iter().all(|&plays| plays >= 1));
        // warm-up rounds count toward regret
        assert!((report.regret_trace()[0] - 0.51).abs() < 1e-12);
    }

    #[test]
    fn test_report_consistency() {
        let report = Simulation::builder()
            .probabilities(PROBS)
            .rounds(200)
            .policy(ThompsonSampling)
            .seed(7)
            .build()
            .unwrap()
            .run()
            .unwrap();

        assert_eq!(report.n_rounds(), 200);
        assert_eq!(report.regret_trace().len(), 200);
        assert_eq!(report.chosen_arms().len(), 200);
        assert_eq!(report.rewards().len(), 200);
        assert_eq!(report.counts().len(), 200);
        assert!(report.regret_trace().windows(2).all(|w| w[0] <= w[1]));

        let regret_sum: f64 = report.regrets().iter().sum();
        assert!((regret_sum - report.total_regret()).abs() < 1e-9);

        let plays: u64 = report.play_counts().iter().sum();
        assert_eq!(plays, 200);

        let last = report.counts().successes_at(199).unwrap();
        assert_eq!(last, report.history().success_counts());
        let reward_sum: u64 = report.rewards().iter().map(|&r| u64::from(r)).sum();
        assert_eq!(last.iter().sum::<u64>(), reward_sum);

        for (arm, prob) in report.success_prob().iter().enumerate() {
            if let Some(p) = prob {
                let expected = report.history().success_counts()[arm] as f64
                    / report.history().total_counts()[arm] as f64;
                assert_eq!(*p, expected);
            } else {
                assert_eq!(report.play_counts()[arm], 0);
            }
        }
    }

    #[test]
    fn test_unplayed_arm_has_no_estimate() {
        // Two rounds cannot cover five arms
        let report = Simulation::builder()
            .probabilities(PROBS)
            .rounds(2)
            .policy(Random)
            .seed(3)
            .build()
            .unwrap()
            .run()
            .unwrap();

        let unplayed = report.success_prob().iter().filter(|p| p.is_none()).count();
        assert!(unplayed >= 3);
        assert!(report.estimated_best_arm().is_some());
    }

    #[test]
    fn test_posterior_view() {
        let report = Simulation::builder()
            .probabilities([0.0, 1.0])
            .rounds(4)
            .policy(Ucb::new())
            .warm_up(WarmUp::RoundRobin)
            .seed(3)
            .build()
            .unwrap()
            .run()
            .unwrap();

        // arm 0 always fails, arm 1 always succeeds
        assert_eq!(report.posterior(0, 0), Some(BetaPosterior::new(0, 1)));
        assert_eq!(report.posterior(1, 1), Some(BetaPosterior::new(1, 0)));
        assert_eq!(report.posterior(2, 0), None);
        assert_eq!(report.posterior(0, 4), None);
        assert_eq!(report.estimated_best_arm(), Some(1));
    }
}
