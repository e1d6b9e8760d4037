//! services/api/src/web/state.rs
//!
//! Defines the application's shared state and how it is assembled from the
//! configuration.

use crate::adapters::{connect, DbAdapter, InMemorySessionStore, SqliteSessionStore};
use crate::config::{Config, SessionBackend};
use crate::error::ApiError;
use book_catalog_core::ports::{DatabaseService, SessionService};
use chrono::Duration;
use std::sync::Arc;
use tracing::info;

//=========================================================================================
// AppState (Shared Across All Requests)
//=========================================================================================

/// The shared application state, created once at startup and passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<dyn DatabaseService>,
    pub sessions: Arc<dyn SessionService>,
    pub config: Arc<Config>,
}

impl AppState {
    /// Opens the store named by `config.database_url`, creates any missing
    /// tables and picks the configured session backend.
    pub async fn from_config(config: Config) -> Result<Arc<Self>, ApiError> {
        info!("Connecting to database...");
        let pool = connect(&config.database_url).await?;

        let db_adapter = DbAdapter::new(pool.clone());
        db_adapter.init_schema().await?;

        let ttl = Duration::days(config.session_ttl_days);
        let sessions: Arc<dyn SessionService> = match config.session_backend {
            SessionBackend::Sqlite => {
                let store = SqliteSessionStore::new(pool, ttl);
                store.init_schema().await?;
                Arc::new(store)
            }
            SessionBackend::Memory => Arc::new(InMemorySessionStore::new(ttl)),
        };
        info!(backend = ?config.session_backend, "Database ready.");

        Ok(Arc::new(Self {
            db: Arc::new(db_adapter),
            sessions,
            config: Arc::new(config),
        }))
    }
}
