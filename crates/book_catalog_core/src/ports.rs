//! crates/book_catalog_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, keeping the
//! handlers independent of the concrete store and session mechanism.

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{Account, AccountCredentials, AuthSession, Book, BookPatch, NewBook};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from the underlying store.
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

/// Persistence for accounts and books.
///
/// Every method is a single statement against the store: it either succeeds
/// completely or leaves the store unchanged.
#[async_trait]
pub trait DatabaseService: Send + Sync {
    // --- Accounts ---
    async fn find_account_by_email(&self, email: &str) -> PortResult<Option<AccountCredentials>>;

    /// Fails with [`PortError::Conflict`] when the email is already taken.
    async fn insert_account(&self, email: &str, password_hash: &str) -> PortResult<Account>;

    // --- Books ---
    async fn insert_book(&self, book: NewBook) -> PortResult<Book>;

    /// All books in insertion order.
    async fn list_books(&self) -> PortResult<Vec<Book>>;

    async fn find_book_by_id(&self, id: Uuid) -> PortResult<Option<Book>>;

    async fn update_book(&self, id: Uuid, patch: BookPatch) -> PortResult<Option<Book>>;

    /// Returns `true` if a book existed and was removed.
    async fn delete_book(&self, id: Uuid) -> PortResult<bool>;
}

/// Server-side login sessions keyed by an opaque token.
#[async_trait]
pub trait SessionService: Send + Sync {
    async fn create_session(&self, account_id: Uuid) -> PortResult<AuthSession>;

    /// Resolves a token to its account. Unknown and expired tokens yield `None`.
    async fn validate_session(&self, token: &str) -> PortResult<Option<Uuid>>;

    /// Returns `true` if a session was removed.
    async fn destroy_session(&self, token: &str) -> PortResult<bool>;
}
