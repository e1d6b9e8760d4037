//! services/api/src/adapters/db.rs
//!
//! This module contains the database adapter, which is the concrete implementation
//! of the `DatabaseService` port from the `core` crate. It handles all interactions
//! with the embedded SQLite store using `sqlx`.

use async_trait::async_trait;
use book_catalog_core::domain::{Account, AccountCredentials, Book, BookPatch, NewBook};
use book_catalog_core::ports::{DatabaseService, PortError, PortResult};
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{FromRow, SqlitePool};
use std::str::FromStr;
use tracing::debug;
use uuid::Uuid;

/// Opens a pool on `database_url`, creating the database file if needed.
///
/// In-memory databases are private to a single connection and die with it, so
/// the pool keeps exactly one connection open for its whole life.
pub async fn connect(database_url: &str) -> Result<SqlitePool, sqlx::Error> {
    let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
    let in_memory = database_url.contains(":memory:") || database_url.contains("mode=memory");

    let pool_options = if in_memory {
        SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
    } else {
        SqlitePoolOptions::new().max_connections(5)
    };
    pool_options.connect_with(options).await
}

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements the `DatabaseService` port.
#[derive(Clone)]
pub struct DbAdapter {
    pool: SqlitePool,
}

const SCHEMA: [&str; 2] = [
    "CREATE TABLE IF NOT EXISTS accounts (
        id BLOB PRIMARY KEY NOT NULL,
        email TEXT NOT NULL UNIQUE,
        password_hash TEXT NOT NULL,
        created_at TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS books (
        id BLOB PRIMARY KEY NOT NULL,
        title TEXT NOT NULL,
        author TEXT NOT NULL,
        published_year INTEGER
    )",
];

impl DbAdapter {
    /// Creates a new `DbAdapter`.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Creates the `accounts` and `books` tables if they do not exist yet.
    pub async fn init_schema(&self) -> Result<(), sqlx::Error> {
        for statement in SCHEMA {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        Ok(())
    }
}

fn unexpected(e: sqlx::Error) -> PortError {
    PortError::Unexpected(e.to_string())
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

#[derive(FromRow)]
struct AccountRecord {
    id: Uuid,
    email: String,
    created_at: DateTime<Utc>,
}
impl AccountRecord {
    fn to_domain(self) -> Account {
        Account {
            id: self.id,
            email: self.email,
            created_at: self.created_at,
        }
    }
}

#[derive(FromRow)]
struct CredentialsRecord {
    id: Uuid,
    email: String,
    password_hash: String,
}
impl CredentialsRecord {
    fn to_domain(self) -> AccountCredentials {
        AccountCredentials {
            id: self.id,
            email: self.email,
            password_hash: self.password_hash,
        }
    }
}

#[derive(FromRow)]
struct BookRecord {
    id: Uuid,
    title: String,
    author: String,
    published_year: Option<i64>,
}
impl BookRecord {
    fn to_domain(self) -> Book {
        Book {
            id: self.id,
            title: self.title,
            author: self.author,
            published_year: self.published_year,
        }
    }
}

//=========================================================================================
// `DatabaseService` Trait Implementation
//=========================================================================================

#[async_trait]
impl DatabaseService for DbAdapter {
    async fn find_account_by_email(&self, email: &str) -> PortResult<Option<AccountCredentials>> {
        let record = sqlx::query_as::<_, CredentialsRecord>(
            "SELECT id, email, password_hash FROM accounts WHERE email = ?1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?;

        Ok(record.map(CredentialsRecord::to_domain))
    }

    async fn insert_account(&self, email: &str, password_hash: &str) -> PortResult<Account> {
        let record = sqlx::query_as::<_, AccountRecord>(
            "INSERT INTO accounts (id, email, password_hash, created_at) VALUES (?1, ?2, ?3, ?4) \
             RETURNING id, email, created_at",
        )
        .bind(Uuid::new_v4())
        .bind(email)
        .bind(password_hash)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
                PortError::Conflict(format!("Account {} already exists", email))
            }
            _ => unexpected(e),
        })?;

        debug!(account_id = %record.id, "Inserted account");
        Ok(record.to_domain())
    }

    async fn insert_book(&self, book: NewBook) -> PortResult<Book> {
        let record = sqlx::query_as::<_, BookRecord>(
            "INSERT INTO books (id, title, author, published_year) VALUES (?1, ?2, ?3, ?4) \
             RETURNING id, title, author, published_year",
        )
        .bind(Uuid::new_v4())
        .bind(book.title)
        .bind(book.author)
        .bind(book.published_year)
        .fetch_one(&self.pool)
        .await
        .map_err(unexpected)?;

        Ok(record.to_domain())
    }

    async fn list_books(&self) -> PortResult<Vec<Book>> {
        let records = sqlx::query_as::<_, BookRecord>(
            "SELECT id, title, author, published_year FROM books ORDER BY rowid ASC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;

        Ok(records.into_iter().map(BookRecord::to_domain).collect())
    }

    async fn find_book_by_id(&self, id: Uuid) -> PortResult<Option<Book>> {
        let record = sqlx::query_as::<_, BookRecord>(
            "SELECT id, title, author, published_year FROM books WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?;

        Ok(record.map(BookRecord::to_domain))
    }

    async fn update_book(&self, id: Uuid, patch: BookPatch) -> PortResult<Option<Book>> {
        if patch.is_empty() {
            return self.find_book_by_id(id).await;
        }

        // One statement: NULL keeps a text column, ?3 says whether the year was sent.
        let (year_present, year) = match patch.published_year {
            Some(year) => (true, year),
            None => (false, None),
        };
        let record = sqlx::query_as::<_, BookRecord>(
            "UPDATE books SET \
                title = COALESCE(?1, title), \
                author = COALESCE(?2, author), \
                published_year = CASE WHEN ?3 THEN ?4 ELSE published_year END \
             WHERE id = ?5 \
             RETURNING id, title, author, published_year",
        )
        .bind(patch.title)
        .bind(patch.author)
        .bind(year_present)
        .bind(year)
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?;

        Ok(record.map(BookRecord::to_domain))
    }

    async fn delete_book(&self, id: Uuid) -> PortResult<bool> {
        let result = sqlx::query("DELETE FROM books WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;

        Ok(result.rows_affected() > 0)
    }
}
