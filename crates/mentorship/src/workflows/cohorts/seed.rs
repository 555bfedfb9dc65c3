use std::io::Read;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::domain::{Entrepreneurship, EvaluationRecord, QuotaAssignment};

/// Full dump of the program tables, as exported from the backing store.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProgramSnapshot {
    #[serde(default)]
    pub entrepreneurships: Vec<Entrepreneurship>,
    #[serde(default)]
    pub evaluations: Vec<EvaluationRecord>,
    #[serde(default)]
    pub assignments: Vec<QuotaAssignment>,
}

#[derive(Debug, thiserror::Error)]
pub enum SeedError {
    #[error("failed to read program snapshot: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid program snapshot: {0}")]
    Json(#[from] serde_json::Error),
}

impl ProgramSnapshot {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, SeedError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, SeedError> {
        Ok(serde_json::from_reader(reader)?)
    }
}
