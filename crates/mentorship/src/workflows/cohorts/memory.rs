use std::sync::{Arc, Mutex, MutexGuard};

use super::domain::{
    Entrepreneurship, EntrepreneurshipId, EvaluationRecord, QuotaAssignment, Tier,
};
use super::repository::{CohortRepository, CommitError, CommitGuard, RepositoryError};
use super::seed::ProgramSnapshot;

/// Mutex-backed store used by the CLI, the demo server, and tests.
///
/// Rows keep insertion order so reports built on top of it are reproducible.
#[derive(Default, Clone)]
pub struct InMemoryCohortRepository {
    tables: Arc<Mutex<ProgramSnapshot>>,
}

impl InMemoryCohortRepository {
    pub fn from_snapshot(snapshot: ProgramSnapshot) -> Self {
        Self {
            tables: Arc::new(Mutex::new(snapshot)),
        }
    }

    pub fn snapshot(&self) -> Result<ProgramSnapshot, RepositoryError> {
        Ok(self.lock()?.clone())
    }

    pub fn insert_entrepreneurship(
        &self,
        entrepreneurship: Entrepreneurship,
    ) -> Result<(), RepositoryError> {
        let mut tables = self.lock()?;
        if tables
            .entrepreneurships
            .iter()
            .any(|existing| existing.id == entrepreneurship.id)
        {
            return Err(RepositoryError::Constraint(format!(
                "entrepreneurship {} already exists",
                entrepreneurship.id
            )));
        }
        tables.entrepreneurships.push(entrepreneurship);
        Ok(())
    }

    pub fn insert_evaluation(&self, record: EvaluationRecord) -> Result<(), RepositoryError> {
        self.lock()?.evaluations.push(record);
        Ok(())
    }

    fn lock(&self) -> Result<MutexGuard<'_, ProgramSnapshot>, RepositoryError> {
        self.tables
            .lock()
            .map_err(|_| RepositoryError::Unavailable("store lock poisoned".to_string()))
    }
}

/// Writes `assignment` and keeps the entrepreneurship's explicit tier in step with it.
fn apply(
    tables: &mut ProgramSnapshot,
    assignment: QuotaAssignment,
) -> Result<QuotaAssignment, RepositoryError> {
    let owner = tables
        .entrepreneurships
        .iter_mut()
        .find(|entrepreneurship| entrepreneurship.id == assignment.entrepreneurship_id)
        .ok_or_else(|| {
            RepositoryError::Constraint(format!(
                "assignment references unknown entrepreneurship {}",
                assignment.entrepreneurship_id
            ))
        })?;

    if assignment.is_approved() {
        owner.tier = Some(assignment.tier);
    } else if owner.tier == Some(assignment.tier) {
        owner.tier = None;
    }

    match tables
        .assignments
        .iter_mut()
        .find(|row| row.key() == assignment.key())
    {
        Some(row) => *row = assignment.clone(),
        None => tables.assignments.push(assignment.clone()),
    }

    Ok(assignment)
}

impl CohortRepository for InMemoryCohortRepository {
    fn entrepreneurships(
        &self,
        tier: Option<Tier>,
    ) -> Result<Vec<Entrepreneurship>, RepositoryError> {
        let tables = self.lock()?;
        Ok(tables
            .entrepreneurships
            .iter()
            .filter(|entrepreneurship| tier.is_none() || entrepreneurship.tier == tier)
            .cloned()
            .collect())
    }

    fn entrepreneurship(
        &self,
        id: &EntrepreneurshipId,
    ) -> Result<Option<Entrepreneurship>, RepositoryError> {
        let tables = self.lock()?;
        Ok(tables
            .entrepreneurships
            .iter()
            .find(|entrepreneurship| &entrepreneurship.id == id)
            .cloned())
    }

    fn evaluations(
        &self,
        ids: &[EntrepreneurshipId],
    ) -> Result<Vec<EvaluationRecord>, RepositoryError> {
        let tables = self.lock()?;
        Ok(tables
            .evaluations
            .iter()
            .filter(|record| ids.contains(&record.entrepreneurship_id))
            .cloned()
            .collect())
    }

    fn assignments(&self, tier: Option<Tier>) -> Result<Vec<QuotaAssignment>, RepositoryError> {
        let tables = self.lock()?;
        Ok(tables
            .assignments
            .iter()
            .filter(|row| tier.map_or(true, |tier| row.tier == tier))
            .cloned()
            .collect())
    }

    fn upsert_assignment(
        &self,
        assignment: QuotaAssignment,
    ) -> Result<QuotaAssignment, RepositoryError> {
        let mut tables = self.lock()?;
        apply(&mut tables, assignment)
    }

    fn commit_guarded(
        &self,
        assignment: QuotaAssignment,
        guard: &CommitGuard<'_>,
    ) -> Result<QuotaAssignment, CommitError> {
        let mut tables = self.lock()?;
        guard(&tables.assignments)?;
        Ok(apply(&mut tables, assignment)?)
    }
}
