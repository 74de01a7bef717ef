//! Prediction engine configuration.

use std::time::Duration;

/// Tuning knobs for [`super::PredictionEngine`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PredictionConfig {
    /// How long a prediction may stay unconfirmed before it is rolled back.
    ///
    /// Values above [`PredictionConfig::MAX_TIMEOUT`] are clamped to it.
    pub timeout: Duration,
    /// Maximum entries kept in each of the rollback and confirmation
    /// histories.
    pub max_history: usize,
    /// Default age limit for [`super::PredictionEngine::prune_rollbacks`].
    pub rollback_max_age: Duration,
}

impl PredictionConfig {
    /// Upper bound applied to `timeout` so deadlines stay representable.
    pub const MAX_TIMEOUT: Duration = Duration::from_secs(24 * 60 * 60);

    /// `timeout`, clamped to [`Self::MAX_TIMEOUT`].
    pub fn effective_timeout(&self) -> Duration {
        self.timeout.min(Self::MAX_TIMEOUT)
    }
}

impl Default for PredictionConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_millis(5000),
            max_history: 50,
            rollback_max_age: Duration::from_millis(10_000),
        }
    }
}
