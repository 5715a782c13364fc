//! Domain Layer
//!
//! Contains the lost-and-found entities and the domain error type.
//! This layer has NO storage or transport dependencies.

mod error;
mod item;
mod matching;
mod user;

pub use error::{DomainError, DomainResult};
pub use item::{FoundItem, Item, ItemKind, ItemStatus, LostItem, NewFoundItem, NewLostItem};
pub use matching::{Match, MatchView, NewMatch};
pub use user::{NewUser, User};
