use super::thompson::posteriors;
use super::{Policy, argmax, ensure_arms};
use crate::error::{BanditError, Result};
use crate::history::PlayHistory;

pub(crate) const DEFAULT_SAMPLES: usize = 10;

/// How posterior samples are pooled when averaging
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SampleBuffer {
    /// Each arm averages only its own samples.
    #[default]
    PerArm,
    /// One pool is kept across arms, so arm `i` averages the samples of arms
    /// `0..=i`. Reproduces results recorded with the legacy notebook.
    Shared,
}

/// Thompson Sampling on an averaged posterior estimate
///
/// Draws `samples` values from each arm's posterior and plays the arm with
/// the highest average, trading extra draws for a lower-variance estimate.
#[derive(Clone, Copy, Debug)]
pub struct ThompsonUncertainty {
    samples: usize,
    buffer: SampleBuffer,
}

impl ThompsonUncertainty {
    /// Ten samples per arm, isolated per-arm buffer
    pub fn new() -> Self {
        Self {
            samples: DEFAULT_SAMPLES,
            buffer: SampleBuffer::PerArm,
        }
    }

    pub fn with_samples(samples: usize, buffer: SampleBuffer) -> Result<Self> {
        if samples == 0 {
            return Err(BanditError::InvalidParameter {
                message: "samples per arm must be positive".into(),
            });
        }
        Ok(Self { samples, buffer })
    }

    pub fn samples(&self) -> usize {
        self.samples
    }

    pub fn buffer(&self) -> SampleBuffer {
        self.buffer
    }

    /// Averaged posterior estimate of every arm, in arm order
    pub fn estimates(&self, history: &PlayHistory, rng: &mut dyn rand::RngCore) -> Result<Vec<f64>> {
        let posteriors = posteriors(history);
        let mut estimates = Vec::with_capacity(posteriors.len());
        let mut pool_sum = 0.0;
        let mut pool_len = 0usize;

        for posterior in &posteriors {
            if self.buffer == SampleBuffer::PerArm {
                pool_sum = 0.0;
                pool_len = 0;
            }
            for _ in 0..self.samples {
                pool_sum += posterior.sample(rng)?;
                pool_len += 1;
            }
            estimates.push(pool_sum / pool_len as f64);
        }
        Ok(estimates)
    }
}

impl Default for ThompsonUncertainty {
    fn default() -> Self {
        Self::new()
    }
}

impl Policy for ThompsonUncertainty {
    fn name(&self) -> &'static str {
        "thompson-uncertainty"
    }

    fn select(&self, history: &PlayHistory, rng: &mut dyn rand::RngCore) -> Result<usize> {
        ensure_arms(history)?;
        let estimates = self.estimates(history, rng)?;
        argmax(&estimates).ok_or_else(|| BanditError::NumericalError {
            message: "no comparable posterior estimate".into(),
        })
    }
}
