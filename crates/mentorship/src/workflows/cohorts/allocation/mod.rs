//! Capacity-limited approval of entrepreneurships into tiers and cohorts.
//!
//! Everything here is pure: callers hand in the current assignment snapshot and
//! get back either a row to persist or the reason the request was refused. The
//! repository runs [`QuotaAllocator::check_approval`] while holding its write lock
//! so the count it sees is the count it commits against.

mod capacity;

pub use capacity::{CapacityConfig, TierCapacity};

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::domain::{
    ActorId, Cohort, DecisionState, EntrepreneurshipId, QuotaAssignment, Tier,
};

/// Reasons an approval cannot be recorded.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AllocationError {
    #[error("{tier} tier is full ({ceiling} approved)")]
    CapacityExceeded { tier: Tier, ceiling: usize },
    #[error("{tier} cohort {cohort} is full ({ceiling} approved)")]
    CohortCapacityExceeded {
        tier: Tier,
        cohort: Cohort,
        ceiling: usize,
    },
    #[error("{tier} approvals must name cohort 1 or 2")]
    MissingCohort { tier: Tier },
    #[error("already approved into the {held} tier; reject it there first")]
    AlreadyPlaced { held: Tier },
}

/// Seat usage for one cohort of a tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CohortUsage {
    pub cohort: Cohort,
    pub ceiling: usize,
    pub approved: usize,
}

/// Seat usage for a tier, computed from an assignment snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TierUsage {
    pub tier: Tier,
    pub ceiling: usize,
    pub approved: usize,
    pub remaining: usize,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub cohorts: Vec<CohortUsage>,
}

/// Outcome of a reject request.
#[derive(Debug, Clone, PartialEq)]
pub enum Rejection {
    /// The pair was already rejected; nothing to write.
    Unchanged(QuotaAssignment),
    Record(QuotaAssignment),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct QuotaAllocator {
    capacity: CapacityConfig,
}

impl QuotaAllocator {
    pub fn new(capacity: CapacityConfig) -> Self {
        Self { capacity }
    }

    pub fn capacity(&self) -> &CapacityConfig {
        &self.capacity
    }

    /// Cohort to store for a tier: required for cohort-bearing tiers, dropped otherwise.
    pub fn resolve_cohort(
        &self,
        tier: Tier,
        cohort: Option<Cohort>,
    ) -> Result<Option<Cohort>, AllocationError> {
        if !tier.has_cohorts() {
            return Ok(None);
        }
        cohort
            .map(Some)
            .ok_or(AllocationError::MissingCohort { tier })
    }

    /// Builds the approved row for `entrepreneurship`, replacing any previous decision.
    pub fn approval(
        &self,
        entrepreneurship_id: &EntrepreneurshipId,
        tier: Tier,
        cohort: Option<Cohort>,
        actor: &ActorId,
        decided_at: DateTime<Utc>,
    ) -> Result<QuotaAssignment, AllocationError> {
        let cohort = self.resolve_cohort(tier, cohort)?;
        Ok(QuotaAssignment {
            entrepreneurship_id: entrepreneurship_id.clone(),
            tier,
            cohort,
            state: DecisionState::Approved,
            decided_by: actor.clone(),
            decided_at,
        })
    }

    /// Builds the rejected row; a rejection never needs a seat.
    pub fn rejection(
        &self,
        existing: Option<&QuotaAssignment>,
        entrepreneurship_id: &EntrepreneurshipId,
        tier: Tier,
        actor: &ActorId,
        decided_at: DateTime<Utc>,
    ) -> Rejection {
        match existing {
            Some(row) if row.state == DecisionState::Rejected => Rejection::Unchanged(row.clone()),
            Some(row) => Rejection::Record(QuotaAssignment {
                state: DecisionState::Rejected,
                decided_by: actor.clone(),
                decided_at,
                ..row.clone()
            }),
            None => Rejection::Record(QuotaAssignment {
                entrepreneurship_id: entrepreneurship_id.clone(),
                tier,
                // placeholder, cohort carries no meaning for a rejection
                cohort: tier.has_cohorts().then_some(Cohort::First),
                state: DecisionState::Rejected,
                decided_by: actor.clone(),
                decided_at,
            }),
        }
    }

    /// Verifies that `candidate` fits in its tier and cohort.
    ///
    /// `current` is the program's assignment snapshot. The candidate's own stored row
    /// is ignored so re-approving (for example to move cohorts) never counts twice.
    /// An entrepreneurship holds at most one approved seat across all tiers.
    pub fn check_approval(
        &self,
        candidate: &QuotaAssignment,
        current: &[QuotaAssignment],
    ) -> Result<(), AllocationError> {
        let tier = candidate.tier;
        let limits = self.capacity.for_tier(tier);
        let candidate_id = &candidate.entrepreneurship_id;

        if let Some(held) = current.iter().find(|row| {
            row.is_approved() && row.tier != tier && &row.entrepreneurship_id == candidate_id
        }) {
            return Err(AllocationError::AlreadyPlaced { held: held.tier });
        }

        let others = move || {
            current.iter().filter(move |row| {
                row.tier == tier && row.is_approved() && &row.entrepreneurship_id != candidate_id
            })
        };

        if others().count() >= limits.total {
            return Err(AllocationError::CapacityExceeded {
                tier,
                ceiling: limits.total,
            });
        }

        if let (Some(per_cohort), Some(cohort)) = (limits.per_cohort, candidate.cohort) {
            let in_cohort = others().filter(|row| row.cohort == Some(cohort)).count();
            if in_cohort >= per_cohort {
                return Err(AllocationError::CohortCapacityExceeded {
                    tier,
                    cohort,
                    ceiling: per_cohort,
                });
            }
        }

        Ok(())
    }

    pub fn usage(&self, tier: Tier, assignments: &[QuotaAssignment]) -> TierUsage {
        let limits = self.capacity.for_tier(tier);
        let approved: Vec<&QuotaAssignment> = assignments
            .iter()
            .filter(|row| row.tier == tier && row.is_approved())
            .collect();

        let cohorts = match limits.per_cohort {
            Some(ceiling) => Cohort::ALL
                .iter()
                .map(|&cohort| CohortUsage {
                    cohort,
                    ceiling,
                    approved: approved
                        .iter()
                        .filter(|row| row.cohort == Some(cohort))
                        .count(),
                })
                .collect(),
            None => Vec::new(),
        };

        TierUsage {
            tier,
            ceiling: limits.total,
            approved: approved.len(),
            remaining: limits.total.saturating_sub(approved.len()),
            cohorts,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 4, 2, 15, 30, 0)
            .single()
            .expect("valid timestamp")
    }

    fn admin() -> ActorId {
        ActorId("admin-1".to_string())
    }

    fn row(index: usize, tier: Tier, cohort: Option<Cohort>) -> QuotaAssignment {
        QuotaAssignment {
            entrepreneurship_id: EntrepreneurshipId(format!("e-{index}")),
            tier,
            cohort,
            state: DecisionState::Approved,
            decided_by: admin(),
            decided_at: at(),
        }
    }

    #[test]
    fn full_scale_tier_refuses_the_next_approval() {
        let allocator = QuotaAllocator::default();
        let current: Vec<_> = (0..45).map(|i| row(i, Tier::Scale, None)).collect();
        let candidate = allocator
            .approval(
                &EntrepreneurshipId("e-new".to_string()),
                Tier::Scale,
                Some(Cohort::Second),
                &admin(),
                at(),
            )
            .expect("scale ignores cohort");
        assert_eq!(candidate.cohort, None);

        assert_eq!(
            allocator.check_approval(&candidate, &current),
            Err(AllocationError::CapacityExceeded {
                tier: Tier::Scale,
                ceiling: 45
            })
        );
        assert_eq!(allocator.usage(Tier::Scale, &current).remaining, 0);
    }

    #[test]
    fn full_cohort_refuses_while_other_cohort_accepts() {
        let allocator = QuotaAllocator::default();
        let mut current: Vec<_> = (0..50)
            .map(|i| row(i, Tier::Starter, Some(Cohort::First)))
            .collect();
        current.extend((50..60).map(|i| row(i, Tier::Starter, Some(Cohort::Second))));

        let id = EntrepreneurshipId("e-new".to_string());
        let first = allocator
            .approval(&id, Tier::Starter, Some(Cohort::First), &admin(), at())
            .expect("cohort provided");
        assert_eq!(
            allocator.check_approval(&first, &current),
            Err(AllocationError::CohortCapacityExceeded {
                tier: Tier::Starter,
                cohort: Cohort::First,
                ceiling: 50
            })
        );

        let second = allocator
            .approval(&id, Tier::Starter, Some(Cohort::Second), &admin(), at())
            .expect("cohort provided");
        assert_eq!(allocator.check_approval(&second, &current), Ok(()));

        let usage = allocator.usage(Tier::Starter, &current);
        assert_eq!(usage.approved, 60);
        assert_eq!(usage.cohorts[0].approved, 50);
        assert_eq!(usage.cohorts[1].approved, 10);
    }

    #[test]
    fn reapproving_an_existing_row_does_not_count_itself() {
        let allocator = QuotaAllocator::new(CapacityConfig::default().with_tier(
            Tier::Growth,
            TierCapacity {
                total: 1,
                per_cohort: Some(1),
            },
        ));
        let current = vec![row(0, Tier::Growth, Some(Cohort::First))];
        let moved = row(0, Tier::Growth, Some(Cohort::Second));
        assert_eq!(allocator.check_approval(&moved, &current), Ok(()));
    }

    #[test]
    fn rejected_rows_do_not_hold_seats() {
        let allocator = QuotaAllocator::new(CapacityConfig::default().with_tier(
            Tier::Scale,
            TierCapacity {
                total: 1,
                per_cohort: None,
            },
        ));
        let mut held = row(0, Tier::Scale, None);
        held.state = DecisionState::Rejected;
        let candidate = row(1, Tier::Scale, None);
        assert_eq!(allocator.check_approval(&candidate, &[held]), Ok(()));
    }

    #[test]
    fn approval_in_another_tier_blocks_a_second_seat() {
        let allocator = QuotaAllocator::default();
        let held = row(0, Tier::Starter, Some(Cohort::First));
        let candidate = row(0, Tier::Scale, None);
        assert_eq!(
            allocator.check_approval(&candidate, std::slice::from_ref(&held)),
            Err(AllocationError::AlreadyPlaced { held: Tier::Starter })
        );

        let mut released = held;
        released.state = DecisionState::Rejected;
        assert_eq!(allocator.check_approval(&candidate, &[released]), Ok(()));
    }

    #[test]
    fn cohort_is_required_below_scale() {
        let allocator = QuotaAllocator::default();
        let err = allocator
            .approval(
                &EntrepreneurshipId("e-1".to_string()),
                Tier::Growth,
                None,
                &admin(),
                at(),
            )
            .expect_err("cohort missing");
        assert_eq!(err, AllocationError::MissingCohort { tier: Tier::Growth });
    }

    #[test]
    fn rejection_is_idempotent_and_keeps_cohort() {
        let allocator = QuotaAllocator::default();
        let id = EntrepreneurshipId("e-1".to_string());

        let fresh = allocator.rejection(None, &id, Tier::Growth, &admin(), at());
        let Rejection::Record(fresh) = fresh else {
            panic!("first rejection writes a row");
        };
        assert_eq!(fresh.cohort, Some(Cohort::First));
        assert_eq!(fresh.state, DecisionState::Rejected);

        assert_eq!(
            allocator.rejection(Some(&fresh), &id, Tier::Growth, &admin(), at()),
            Rejection::Unchanged(fresh.clone())
        );

        let approved = row(1, Tier::Starter, Some(Cohort::Second));
        match allocator.rejection(
            Some(&approved),
            &approved.entrepreneurship_id,
            Tier::Starter,
            &admin(),
            at(),
        ) {
            Rejection::Record(updated) => {
                assert_eq!(updated.cohort, Some(Cohort::Second));
                assert_eq!(updated.state, DecisionState::Rejected);
            }
            other => panic!("expected a write, got {other:?}"),
        }
    }
}
