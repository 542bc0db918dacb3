//! Integrity resolver for account deletion.
//!
//! Foreign keys from the account's dependents are declared once in
//! [`graph::DEPENDENCY_GRAPH`]. The planner walks that graph and produces
//! the ordered deletes that must precede removing the user row; the
//! executor runs them on a transaction.

mod executor;
pub mod graph;
mod plan;

pub use executor::{execute, DeletionReport, StepOutcome};
pub use graph::{Edge, OnDelete, Table, DEPENDENCY_GRAPH};
pub use plan::{plan_deletion, plan_deletion_in, DeletionPlan, Selection};
