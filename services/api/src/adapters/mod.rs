pub mod db;
pub mod session;

pub use db::{connect, DbAdapter};
pub use session::{InMemorySessionStore, SqliteSessionStore};
