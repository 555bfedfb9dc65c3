use serde::{Deserialize, Serialize};

use super::super::domain::Tier;

/// Seat limits for one tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierCapacity {
    pub total: usize,
    /// `None` for tiers that are not split into cohorts.
    pub per_cohort: Option<usize>,
}

/// Static ceilings for the whole program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapacityConfig {
    pub starter: TierCapacity,
    pub growth: TierCapacity,
    pub scale: TierCapacity,
}

impl CapacityConfig {
    pub fn for_tier(&self, tier: Tier) -> TierCapacity {
        match tier {
            Tier::Starter => self.starter,
            Tier::Growth => self.growth,
            Tier::Scale => self.scale,
        }
    }

    pub fn with_tier(mut self, tier: Tier, capacity: TierCapacity) -> Self {
        match tier {
            Tier::Starter => self.starter = capacity,
            Tier::Growth => self.growth = capacity,
            Tier::Scale => self.scale = capacity,
        }
        self
    }
}

impl Default for CapacityConfig {
    fn default() -> Self {
        Self {
            starter: TierCapacity {
                total: 100,
                per_cohort: Some(50),
            },
            growth: TierCapacity {
                total: 60,
                per_cohort: Some(30),
            },
            scale: TierCapacity {
                total: 45,
                per_cohort: None,
            },
        }
    }
}
