pub mod domain;
pub mod ports;

pub use domain::{Account, AccountCredentials, AuthSession, Book, BookPatch, NewBook};
pub use ports::{DatabaseService, PortError, PortResult, SessionService};
