//! banditsim: a multi-armed bandit simulator.
//!
//! Repeatedly chooses among slot machines with fixed, hidden success
//! probabilities using a decision policy, and records cumulative regret and
//! per-arm success-rate estimates for every round. Policies included:
//! random choice, Thompson sampling, epsilon-greedy, UCB1 and two Thompson
//! variants (forced exploration and averaged posterior samples).
//!
//! # Quick Start
//!
//! ```
//! use banditsim::prelude::*;
//!
//! let report = Simulation::builder()
//!     .probabilities([0.1, 0.4, 0.45, 0.6, 0.61])
//!     .rounds(500)
//!     .policy(ThompsonSampling::new())
//!     .seed(42)
//!     .build()
//!     .unwrap()
//!     .run()
//!     .unwrap();
//!
//! assert_eq!(report.regret_trace().len(), 500);
//! println!("total regret: {:.2}", report.total_regret());
//!
//! // Ratio-based policies need every arm played once first
//! let report = Simulation::builder()
//!     .probabilities([0.1, 0.4, 0.45, 0.6, 0.61])
//!     .rounds(500)
//!     .policy(Ucb::new())
//!     .warm_up(WarmUp::RoundRobin)
//!     .seed(42)
//!     .build()
//!     .unwrap()
//!     .run()
//!     .unwrap();
//! assert!(report.success_prob().iter().all(Option::is_some));
//! ```
//!
//! The library emits [`tracing`] events (run start/finish at `info`,
//! exploration overrides and warm-up at `debug`, every round at `trace`)
//! and never installs a subscriber itself.

mod arm;
mod comparison;
mod error;
mod history;
pub mod policies;
mod simulation;

// Re-export main types
pub use arm::{Pull, best_arm, play, validate_probabilities};
pub use comparison::Comparison;
pub use error::{BanditError, Result};
pub use history::{CountLog, PlayHistory};
pub use simulation::{RoundOutcome, Simulation, SimulationBuilder, SimulationReport, WarmUp};

/// Prelude module for convenient imports.
///
/// # Examples
///
/// ```
/// use banditsim::prelude::*;
/// ```
pub mod prelude {
    pub use crate::policies::{
        BetaPosterior, EpsilonGreedy, Policy, PolicyKind, Random, SampleBuffer, ThompsonDiscover,
        ThompsonSampling, ThompsonUncertainty, Ucb,
    };
    pub use crate::{
        BanditError, Comparison, PlayHistory, Result, Simulation, SimulationReport, WarmUp,
    };
}
