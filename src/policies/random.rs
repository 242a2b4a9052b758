use super::{Policy, ensure_arms};
use crate::error::Result;
use crate::history::PlayHistory;
use rand::Rng;

/// Random selection policy - selects arms uniformly at random, ignoring history
#[derive(Clone, Copy, Debug, Default)]
pub struct Random;

impl Policy for Random {
    fn name(&self) -> &'static str {
        "random"
    }

    fn select(&self, history: &PlayHistory, rng: &mut dyn rand::RngCore) -> Result<usize> {
        let n_arms = ensure_arms(history)?;
        Ok(rng.random_range(0..n_arms))
    }
}
