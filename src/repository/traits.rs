//! Repository Layer - Core Traits
//!
//! Defines the abstract interfaces for data access.
//! The HTTP layer only sees these traits; SQLite lives behind them.

use async_trait::async_trait;

use crate::domain::{
    DomainResult, FoundItem, Item, ItemKind, ItemStatus, LostItem, Match, MatchView, NewFoundItem,
    NewLostItem, NewMatch, NewUser, User,
};

/// Storage for lost and found item records
#[async_trait]
pub trait ItemStore: Send + Sync {
    async fn get_item(&self, kind: ItemKind, id: i64) -> DomainResult<Option<Item>>;

    /// Overwrite an item's status. Fails with `NotFound` if there is no such item.
    async fn set_status(&self, kind: ItemKind, id: i64, status: ItemStatus) -> DomainResult<()>;

    /// Newest first, optionally restricted to one status
    async fn list_items(&self, kind: ItemKind, status: Option<ItemStatus>) -> DomainResult<Vec<Item>>;

    async fn create_lost(&self, item: &NewLostItem) -> DomainResult<LostItem>;

    async fn create_found(&self, item: &NewFoundItem) -> DomainResult<FoundItem>;

    async fn delete_item(&self, kind: ItemKind, id: i64) -> DomainResult<()>;
}

/// Profiles of the people who post items and make matches
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Fails with `Conflict` when the email is already registered
    async fn create_user(&self, user: &NewUser) -> DomainResult<User>;

    async fn find_user(&self, id: i64) -> DomainResult<Option<User>>;
}

/// Match lifecycle with item status kept in lockstep
///
/// `create_match` and `delete_match` are all-or-nothing: either the match
/// row and both item statuses change together or nothing changes.
#[async_trait]
pub trait MatchStore: Send + Sync {
    /// All matches, most recent first, joined with display names
    async fn list_matches(&self) -> DomainResult<Vec<MatchView>>;

    async fn find_match(&self, id: i64) -> DomainResult<Option<Match>>;

    async fn create_match(&self, new_match: NewMatch) -> DomainResult<Match>;

    /// Remove a match and return both items to `pending`.
    /// Returns the removed record.
    async fn delete_match(&self, id: i64) -> DomainResult<Match>;
}
