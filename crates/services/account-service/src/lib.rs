//! Account Service Library
//!
//! Account lifecycle for the pet-care marketplace: registration, local and
//! federated login, password reset, slugs, messaging and the orchestrated
//! deletion of an account together with everything that references it.

pub mod api;
pub mod config;
pub mod infra;
pub mod integrity;
pub mod repository;
pub mod service;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use tracing::info;

use crate::api::{create_router, AppState};
use crate::config::AccountServiceConfig;
use crate::infra::{Cache, Database};

/// Migration action type.
#[derive(Debug, Clone, Copy)]
pub enum MigrateAction {
    Up,
    Down,
    Status,
    Fresh,
}

/// Build the HTTP application over an already connected database.
pub fn build_app(
    database: Database,
    cache: Option<Cache>,
    config: &AccountServiceConfig,
) -> Router {
    let state = AppState::from_config(Arc::new(database), cache, config);
    create_router(state)
}

/// Connect to storage and serve HTTP until the process is stopped.
pub async fn run_server(config: AccountServiceConfig) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::connect(&config.database).await?;

    let cache = match &config.cache {
        Some(cache_config) => Some(Cache::connect(cache_config).await?),
        None => {
            tracing::warn!("REDIS_URL not set - /auth is not rate limited");
            None
        }
    };

    let app = build_app(db, cache, &config);

    let addr: SocketAddr = format!("{}:{}", config.service.host, config.service.port).parse()?;
    info!("{} listening on {}", config.service.service_name, addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}

/// Run migrations (for CLI commands).
pub async fn run_migrations(
    config: &AccountServiceConfig,
    action: MigrateAction,
) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::connect_without_migrations(&config.database).await?;

    match action {
        MigrateAction::Up => {
            db.run_migrations().await?;
            info!("Migrations applied successfully");
        }
        MigrateAction::Down => {
            db.rollback_migration().await?;
            info!("Rolled back last migration");
        }
        MigrateAction::Status => {
            let status = db.migration_status().await?;
            for (name, applied) in status {
                let marker = if applied { "[x]" } else { "[ ]" };
                println!("{} {}", marker, name);
            }
        }
        MigrateAction::Fresh => {
            db.fresh_migrations().await?;
            info!("Database reset and migrations applied");
        }
    }

    Ok(())
}
