use serde::{Deserialize, Serialize};

use super::allocation::CapacityConfig;
use super::ranking::DEFAULT_RANKING_SIZE;
use super::scoring::NullScorePolicy;

/// Program rules the service is built with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgramSettings {
    pub capacity: CapacityConfig,
    pub ranking_size: usize,
    /// Null-score handling for the ranking report only; every other view excludes nulls.
    pub ranking_null_scores: NullScorePolicy,
}

impl Default for ProgramSettings {
    fn default() -> Self {
        Self {
            capacity: CapacityConfig::default(),
            ranking_size: DEFAULT_RANKING_SIZE,
            ranking_null_scores: NullScorePolicy::Exclude,
        }
    }
}
