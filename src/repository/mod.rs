//! Repository Layer
//!
//! Data access abstractions and their SQLite implementations.

mod db;
mod item_repo;
mod match_repo;
mod traits;
mod user_repo;


pub use db::{init_db, DbOptions, DbPool, PooledConnection};
pub use item_repo::ItemRepository;
pub use match_repo::MatchRegistry;
pub use traits::{ItemStore, MatchStore, UserStore};
pub use user_repo::UserRepository;

use rusqlite::ffi;

use crate::domain::DomainError;

/// Classify a SQLite error. Constraint violations keep their meaning so
/// callers can tell a bad reference from an outage; everything else is
/// `Internal`.
pub(crate) fn storage_err(e: rusqlite::Error) -> DomainError {
    if let rusqlite::Error::SqliteFailure(err, _) = &e {
        match err.extended_code {
            ffi::SQLITE_CONSTRAINT_FOREIGNKEY => return DomainError::InvalidInput(e.to_string()),
            ffi::SQLITE_CONSTRAINT_UNIQUE | ffi::SQLITE_CONSTRAINT_PRIMARYKEY => {
                return DomainError::Conflict(e.to_string())
            }
            _ => {}
        }
    }
    DomainError::Internal(e.to_string())
}
