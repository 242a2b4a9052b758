//! Error types for the banditsim library.

use thiserror::Error;

/// Result type alias for bandit operations.
pub type Result<T> = std::result::Result<T, BanditError>;

/// Errors that can occur while configuring or running a simulation.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BanditError {
    /// The arm index does not name one of the configured machines.
    #[error("arm index {index} out of range for {n_arms} arms")]
    ArmOutOfRange { index: usize, n_arms: usize },

    /// A success ratio was requested for an arm that has never been played.
    #[error("undefined statistic: arm {arm} has not been played yet")]
    UndefinedArmStatistic { arm: usize },

    /// No arms are available.
    #[error("no arms available")]
    NoArmsAvailable,

    /// The simulation was configured with zero rounds.
    #[error("number of rounds must be positive")]
    NoRounds,

    /// A true success probability is outside `[0, 1]`.
    #[error("invalid probability for arm {arm}: {value} is not in [0, 1]")]
    InvalidProbability { arm: usize, value: f64 },

    /// Invalid parameter value.
    #[error("invalid parameter: {message}")]
    InvalidParameter { message: String },

    /// The policy needs more arms than were configured.
    #[error("policy {policy} needs at least {required} arms, got {available}")]
    NotEnoughArms {
        policy: &'static str,
        required: usize,
        available: usize,
    },

    /// The policy needs every arm played once but no warm-up was configured.
    #[error("policy {policy} requires every arm to be played once; enable a round-robin warm-up")]
    WarmUpRequired { policy: &'static str },

    /// A history write targeted a round past the end of the table.
    #[error("round {round} out of range for {n_rounds} rounds")]
    RoundOutOfRange { round: usize, n_rounds: usize },

    /// `step` was called after the last round was played.
    #[error("simulation already finished")]
    SimulationFinished,

    /// Numerical computation error.
    #[error("numerical error: {message}")]
    NumericalError { message: String },

    /// Deserialized data breaks an invariant of the type it was read into.
    #[error("inconsistent data: {message}")]
    InconsistentData { message: String },

    /// Builder configuration error.
    #[error("builder error: {message}")]
    BuilderError { message: String },
}
