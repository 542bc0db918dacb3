//! Infrastructure layer - database, cache and transactions.

mod cache;
mod db;
pub mod migrations;
mod unit_of_work;

pub use cache::Cache;
pub use db::Database;
pub use migrations::Migrator;
pub use unit_of_work::{Persistence, TransactionContext, TxFuture, TxUserRepository, UnitOfWork};
