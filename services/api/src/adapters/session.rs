//! services/api/src/adapters/session.rs
//!
//! Implementations of the `SessionService` port. The server uses the SQLite
//! store; the in-memory store is for tests and throwaway deployments.

use async_trait::async_trait;
use book_catalog_core::domain::AuthSession;
use book_catalog_core::ports::{PortError, PortResult, SessionService};
use chrono::{DateTime, Duration, Utc};
use sqlx::{FromRow, SqlitePool};
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

fn new_session(account_id: Uuid, ttl: Duration) -> AuthSession {
    let created_at = Utc::now();
    AuthSession {
        token: Uuid::new_v4().to_string(),
        account_id,
        created_at,
        expires_at: created_at + ttl,
    }
}

//=========================================================================================
// SQLite-backed Sessions
//=========================================================================================

/// Stores sessions in the `auth_sessions` table of the catalog database.
#[derive(Clone)]
pub struct SqliteSessionStore {
    pool: SqlitePool,
    ttl: Duration,
}

#[derive(FromRow)]
struct SessionRecord {
    account_id: Uuid,
    expires_at: DateTime<Utc>,
}

impl SqliteSessionStore {
    pub fn new(pool: SqlitePool, ttl: Duration) -> Self {
        Self { pool, ttl }
    }

    pub async fn init_schema(&self) -> Result<(), sqlx::Error> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS auth_sessions (
                token TEXT PRIMARY KEY NOT NULL,
                account_id BLOB NOT NULL,
                created_at TEXT NOT NULL,
                expires_at TEXT NOT NULL
            )",
        )
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

#[async_trait]
impl SessionService for SqliteSessionStore {
    async fn create_session(&self, account_id: Uuid) -> PortResult<AuthSession> {
        let session = new_session(account_id, self.ttl);
        sqlx::query(
            "INSERT INTO auth_sessions (token, account_id, created_at, expires_at) VALUES (?1, ?2, ?3, ?4)",
        )
        .bind(&session.token)
        .bind(session.account_id)
        .bind(session.created_at)
        .bind(session.expires_at)
        .execute(&self.pool)
        .await
        .map_err(|e| PortError::Unexpected(e.to_string()))?;

        Ok(session)
    }

    async fn validate_session(&self, token: &str) -> PortResult<Option<Uuid>> {
        let record = sqlx::query_as::<_, SessionRecord>(
            "SELECT account_id, expires_at FROM auth_sessions WHERE token = ?1",
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| PortError::Unexpected(e.to_string()))?;

        match record {
            Some(r) if r.expires_at > Utc::now() => Ok(Some(r.account_id)),
            Some(_) => {
                // Expired rows are removed the first time they are presented.
                self.destroy_session(token).await?;
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn destroy_session(&self, token: &str) -> PortResult<bool> {
        let result = sqlx::query("DELETE FROM auth_sessions WHERE token = ?1")
            .bind(token)
            .execute(&self.pool)
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        Ok(result.rows_affected() > 0)
    }
}

//=========================================================================================
// In-memory Sessions
//=========================================================================================

/// Keeps sessions in a process-local map.
///
/// Expired sessions are dropped when validated. A session that expires and is
/// never presented again stays in the map until the process exits.
pub struct InMemorySessionStore {
    sessions: RwLock<HashMap<String, AuthSession>>,
    ttl: Duration,
}

impl InMemorySessionStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    #[cfg(test)]
    pub(crate) async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }
}

#[async_trait]
impl SessionService for InMemorySessionStore {
    async fn create_session(&self, account_id: Uuid) -> PortResult<AuthSession> {
        let session = new_session(account_id, self.ttl);
        self.sessions
            .write()
            .await
            .insert(session.token.clone(), session.clone());
        Ok(session)
    }

    async fn validate_session(&self, token: &str) -> PortResult<Option<Uuid>> {
        let now = Utc::now();
        let mut sessions = self.sessions.write().await;
        let account_id = match sessions.get(token) {
            None => return Ok(None),
            Some(session) if !session.is_expired_at(now) => return Ok(Some(session.account_id)),
            Some(session) => session.account_id,
        };

        // Expired entries leave the map as soon as they are presented.
        sessions.remove(token);
        tracing::debug!(%account_id, "Dropped expired session");
        Ok(None)
    }

    async fn destroy_session(&self, token: &str) -> PortResult<bool> {
        Ok(self.sessions.write().await.remove(token).is_some())
    }
}
