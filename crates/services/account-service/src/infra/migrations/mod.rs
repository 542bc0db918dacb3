//! Database migrations.
//!
//! Each migration is a separate module following SeaORM conventions.
//! Migration names follow the pattern: m{YYYYMMDD}_{NNNNNN}_{description}
//!
//! Foreign keys carry the on-delete policy the integrity resolver's
//! dependency graph declares for the same column.

use sea_orm_migration::prelude::*;

mod m20260120_000001_create_account_tables;
mod m20260120_000002_create_activity_tables;
mod m20260125_000003_add_pet_walks_and_stats_columns;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20260120_000001_create_account_tables::Migration),
            Box::new(m20260120_000002_create_activity_tables::Migration),
            Box::new(m20260125_000003_add_pet_walks_and_stats_columns::Migration),
        ]
    }
}
