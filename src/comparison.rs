//! Side-by-side runs of several policies against the same machines.
//!
//! Each policy gets its own [`Simulation`] with its own history and its own
//! random stream, seeded identically, so runs share no mutable state.

use tracing::info;

use crate::error::Result;
use crate::policies::PolicyKind;
use crate::simulation::{Simulation, SimulationReport, WarmUp};

/// Shared setup for a policy comparison.
#[derive(Clone, Debug)]
pub struct Comparison {
    probabilities: Vec<f64>,
    rounds: usize,
    seed: Option<u64>,
    warm_up: WarmUp,
}

impl Comparison {
    /// Compares policies over `rounds` rounds, with a round-robin warm-up so
    /// every policy can run.
    pub fn new<I>(probabilities: I, rounds: usize) -> Self
    where
        I: IntoIterator<Item = f64>,
    {
        Self {
            probabilities: probabilities.into_iter().collect(),
            rounds,
            seed: None,
            warm_up: WarmUp::RoundRobin,
        }
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn warm_up(mut self, warm_up: WarmUp) -> Self {
        self.warm_up = warm_up;
        self
    }

    /// Runs every policy in order, one report per policy.
    ///
    /// Every simulation is configured before the first one runs, so a bad
    /// configuration fails before any work is done. The first failing run
    /// aborts the comparison.
    pub fn run(&self, policies: &[PolicyKind]) -> Result<Vec<SimulationReport>> {
        let simulations = policies
            .iter()
            .map(|kind| self.simulation(kind))
            .collect::<Result<Vec<_>>>()?;

        info!(
            policies = simulations.len(),
            n_arms = self.probabilities.len(),
            rounds = self.rounds,
            "comparing policies"
        );

        simulations.into_iter().map(Simulation::run).collect()
    }

    fn simulation(&self, kind: &PolicyKind) -> Result<Simulation> {
        let mut builder = Simulation::builder()
            .probabilities(self.probabilities.iter().copied())
            .rounds(self.rounds)
            .policy_kind(kind.clone())
            .warm_up(self.warm_up);
        if let Some(seed) = self.seed {
            builder = builder.seed(seed);
        }
        builder.build()
    }
}
