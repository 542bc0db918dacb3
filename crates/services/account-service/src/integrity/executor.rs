//! Deletion plan execution.

use sea_orm::{ConnectionTrait, DbErr, SqlErr};

use super::graph::Table;
use super::plan::{DeletionPlan, Selection};
use common::{AppError, AppResult};

/// Rows removed by one plan step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepOutcome {
    pub table: Table,
    pub rows: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeletionReport {
    pub steps: Vec<StepOutcome>,
}

impl DeletionReport {
    /// Whether the final step removed the root row.
    pub fn root_deleted(&self) -> bool {
        self.steps.last().is_some_and(|step| step.rows == 1)
    }

    pub fn dependents_removed(&self) -> u64 {
        let dependents = self.steps.len().saturating_sub(1);
        self.steps[..dependents].iter().map(|step| step.rows).sum()
    }
}

/// Run every step of `plan` in order on `conn`.
///
/// Meant for a transaction connection: a failing step leaves earlier
/// deletes for the caller to roll back.
pub async fn execute<C: ConnectionTrait>(conn: &C, plan: &DeletionPlan) -> AppResult<DeletionReport> {
    let backend = conn.get_database_backend();
    let mut steps = Vec::with_capacity(plan.steps().len());

    for (index, selection) in plan.steps().iter().enumerate() {
        let statement = backend.build(&selection.delete_statement());
        let rows = conn
            .execute(statement)
            .await
            .map_err(|err| step_error(err, selection))?
            .rows_affected();

        tracing::debug!(
            step = index + 1,
            table = %selection.table(),
            predicate = %selection,
            rows,
            "Deletion step applied"
        );
        steps.push(StepOutcome {
            table: selection.table(),
            rows,
        });
    }

    Ok(DeletionReport { steps })
}

fn step_error(err: DbErr, selection: &Selection) -> AppError {
    match foreign_key_detail(&err) {
        Some(detail) => AppError::integrity(format!(
            "delete from {} where {} was blocked: {}",
            selection.table(),
            selection,
            detail
        )),
        None => AppError::Database(err),
    }
}

/// Foreign key violation detail, if `err` is one.
///
/// SQLite reports a blocked delete under extended code 1811, which
/// `sql_err` leaves unclassified; its message is stable.
fn foreign_key_detail(err: &DbErr) -> Option<String> {
    if let Some(SqlErr::ForeignKeyConstraintViolation(detail)) = err.sql_err() {
        return Some(detail);
    }
    let message = err.to_string();
    message
        .contains("FOREIGN KEY constraint failed")
        .then_some(message)
}
