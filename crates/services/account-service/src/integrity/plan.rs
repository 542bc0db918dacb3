//! Deletion planning.

use std::fmt;

use sea_orm::sea_query::{Alias, DeleteStatement, Expr, Query, SimpleExpr};

use super::graph::{edges_into, Edge, OnDelete, Table, DEPENDENCY_GRAPH};
use common::{AppError, AppResult};

/// A set of rows, described relative to the row being deleted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    /// The row of `table` with primary key `id`
    Key { table: Table, id: i32 },
    /// Rows of `table` whose `column` points at a row in `parent`
    Referencing {
        table: Table,
        column: &'static str,
        parent: Box<Selection>,
    },
}

impl Selection {
    pub fn table(&self) -> Table {
        match self {
            Selection::Key { table, .. } | Selection::Referencing { table, .. } => *table,
        }
    }

    /// SQL predicate over `self.table()` selecting these rows.
    pub fn condition(&self) -> SimpleExpr {
        match self {
            Selection::Key { id, .. } => Expr::col(Alias::new("id")).eq(*id),
            Selection::Referencing { column, parent, .. } => match parent.as_ref() {
                // A key parent needs no subquery
                Selection::Key { id, .. } => Expr::col(Alias::new(*column)).eq(*id),
                nested => Expr::col(Alias::new(*column)).in_subquery(
                    Query::select()
                        .column(Alias::new("id"))
                        .from(Alias::new(nested.table().name()))
                        .and_where(nested.condition())
                        .to_owned(),
                ),
            },
        }
    }

    pub fn delete_statement(&self) -> DeleteStatement {
        Query::delete()
            .from_table(Alias::new(self.table().name()))
            .cond_where(self.condition())
            .to_owned()
    }
}

impl fmt::Display for Selection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Selection::Key { id, .. } => write!(f, "id = {}", id),
            Selection::Referencing { column, parent, .. } => match parent.as_ref() {
                Selection::Key { id, .. } => write!(f, "{} = {}", column, id),
                nested => write!(
                    f,
                    "{} IN (SELECT id FROM {} WHERE {})",
                    column,
                    nested.table(),
                    nested
                ),
            },
        }
    }
}

/// Ordered deletes; the last step removes the root row itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeletionPlan {
    steps: Vec<Selection>,
}

impl DeletionPlan {
    /// Steps in execution order; the root row is always last.
    pub fn steps(&self) -> &[Selection] {
        &self.steps
    }
}

/// Plan the deletion of user `user_id` over [`DEPENDENCY_GRAPH`].
pub fn plan_deletion(user_id: i32) -> AppResult<DeletionPlan> {
    plan_deletion_in(DEPENDENCY_GRAPH, Table::Users, user_id)
}

/// Plan the deletion of row `id` of `table` over an arbitrary graph.
///
/// RESTRICT dependents are deleted explicitly once their own dependents are
/// cleared. CASCADE dependents are left to the store, but anything that
/// would block their removal is cleared first. SET NULL dependents need
/// nothing. A cycle reachable from `table` is an integrity violation.
pub fn plan_deletion_in(graph: &[Edge], table: Table, id: i32) -> AppResult<DeletionPlan> {
    let root = Selection::Key { table, id };
    let mut steps = Vec::new();
    let mut path = vec![table];

    clear_blockers(graph, &root, &mut path, &mut steps)?;
    steps.push(root);

    Ok(DeletionPlan { steps })
}

fn clear_blockers(
    graph: &[Edge],
    target: &Selection,
    path: &mut Vec<Table>,
    steps: &mut Vec<Selection>,
) -> AppResult<()> {
    for edge in edges_into(graph, target.table()) {
        if edge.on_delete == OnDelete::SetNull {
            continue;
        }
        if path.contains(&edge.child) {
            return Err(AppError::integrity(format!(
                "dependency cycle through {}.{}",
                edge.child, edge.column
            )));
        }

        let dependents = Selection::Referencing {
            table: edge.child,
            column: edge.column,
            parent: Box::new(target.clone()),
        };

        path.push(edge.child);
        clear_blockers(graph, &dependents, path, steps)?;
        path.pop();

        if edge.on_delete == OnDelete::Restrict {
            steps.push(dependents);
        }
    }
    Ok(())
}
