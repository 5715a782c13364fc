//! Match Registry
//!
//! Owns the `matches` table and keeps the denormalized item statuses in
//! lockstep with it. Create and delete each run as one `BEGIN IMMEDIATE`
//! transaction on a single pooled connection: the match row and both status
//! updates commit together, or the transaction is dropped and rolled back.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row, TransactionBehavior};
use tracing::{info, warn};

use super::db::DbPool;
use super::item_repo::set_status_on;
use super::storage_err;
use super::traits::MatchStore;
use crate::domain::{DomainError, DomainResult, ItemKind, ItemStatus, Match, MatchView, NewMatch};

/// SQLite implementation of the match registry
#[derive(Clone)]
pub struct MatchRegistry {
    pool: DbPool,
}

impl MatchRegistry {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MatchStore for MatchRegistry {
    async fn list_matches(&self) -> DomainResult<Vec<MatchView>> {
        self.pool
            .interact(|conn| {
                let mut stmt = conn
                    .prepare(
                        "SELECT m.id, m.lost_item_id, m.found_item_id, m.matched_by, m.matched_at,
                                li.name AS lost_name,
                                fi.name AS found_name,
                                u.first_name || ' ' || u.second_name AS matched_by_name
                         FROM matches m
                         JOIN lost_items li ON li.id = m.lost_item_id
                         JOIN found_items fi ON fi.id = m.found_item_id
                         JOIN users u ON u.id = m.matched_by
                         ORDER BY m.matched_at DESC, m.id DESC",
                    )
                    .map_err(storage_err)?;

                let rows = stmt
                    .query_map([], |row| {
                        Ok(MatchView {
                            record: row_to_match(row)?,
                            lost_name: row.get(5)?,
                            found_name: row.get(6)?,
                            matched_by_name: row.get(7)?,
                        })
                    })
                    .map_err(storage_err)?;
                rows.collect::<Result<Vec<_>, _>>().map_err(storage_err)
            })
            .await
    }

    async fn find_match(&self, id: i64) -> DomainResult<Option<Match>> {
        self.pool.interact(move |conn| find_match_on(conn, id)).await
    }

    async fn create_match(&self, new_match: NewMatch) -> DomainResult<Match> {
        let result = self
            .pool
            .interact(move |conn| {
                let tx = conn
                    .transaction_with_behavior(TransactionBehavior::Immediate)
                    .map_err(storage_err)?;

                let matched_at = Utc::now().timestamp_millis();
                tx.execute(
                    "INSERT INTO matches (lost_item_id, found_item_id, matched_by, matched_at)
                     VALUES (?1, ?2, ?3, ?4)",
                    params![
                        new_match.lost_item_id,
                        new_match.found_item_id,
                        new_match.matched_by,
                        matched_at
                    ],
                )
                .map_err(storage_err)?;
                let id = tx.last_insert_rowid();

                set_status_on(&tx, ItemKind::Lost, new_match.lost_item_id, ItemStatus::Matched)?;
                set_status_on(&tx, ItemKind::Found, new_match.found_item_id, ItemStatus::Matched)?;

                tx.commit().map_err(storage_err)?;

                Ok(Match {
                    id,
                    lost_item_id: new_match.lost_item_id,
                    found_item_id: new_match.found_item_id,
                    matched_by: new_match.matched_by,
                    matched_at: millis_to_datetime(matched_at)?,
                })
            })
            .await;

        match &result {
            Ok(created) => info!(
                match_id = created.id,
                lost_item_id = created.lost_item_id,
                found_item_id = created.found_item_id,
                matched_by = created.matched_by,
                "Match created"
            ),
            Err(e) => warn!(
                error = %e,
                lost_item_id = new_match.lost_item_id,
                found_item_id = new_match.found_item_id,
                "Match creation rolled back"
            ),
        }
        result
    }

    async fn delete_match(&self, id: i64) -> DomainResult<Match> {
        let result = self
            .pool
            .interact(move |conn| {
                let tx = conn
                    .transaction_with_behavior(TransactionBehavior::Immediate)
                    .map_err(storage_err)?;

                let existing = find_match_on(&tx, id)?
                    .ok_or_else(|| DomainError::NotFound(format!("Match {} not found", id)))?;

                tx.execute("DELETE FROM matches WHERE id = ?1", params![id])
                    .map_err(storage_err)?;
                set_status_on(&tx, ItemKind::Lost, existing.lost_item_id, ItemStatus::Pending)?;
                set_status_on(&tx, ItemKind::Found, existing.found_item_id, ItemStatus::Pending)?;

                tx.commit().map_err(storage_err)?;
                Ok(existing)
            })
            .await;

        match &result {
            Ok(removed) => info!(
                match_id = removed.id,
                lost_item_id = removed.lost_item_id,
                found_item_id = removed.found_item_id,
                "Match deleted"
            ),
            Err(e) if e.is_not_found() => info!(match_id = id, "Match to delete not found"),
            Err(e) => warn!(error = %e, match_id = id, "Match deletion rolled back"),
        }
        result
    }
}

fn find_match_on(conn: &Connection, id: i64) -> DomainResult<Option<Match>> {
    conn.query_row(
        "SELECT id, lost_item_id, found_item_id, matched_by, matched_at FROM matches WHERE id = ?1",
        params![id],
        row_to_match,
    )
    .optional()
    .map_err(storage_err)
}

fn millis_to_datetime(millis: i64) -> DomainResult<DateTime<Utc>> {
    DateTime::from_timestamp_millis(millis)
        .ok_or_else(|| DomainError::Internal(format!("Timestamp {} out of range", millis)))
}

/// Convert the first five columns of a row to a Match
fn row_to_match(row: &Row<'_>) -> rusqlite::Result<Match> {
    let millis: i64 = row.get(4)?;
    let matched_at = DateTime::from_timestamp_millis(millis).ok_or_else(|| {
        rusqlite::Error::IntegralValueOutOfRange(4, millis)
    })?;
    Ok(Match {
        id: row.get(0)?,
        lost_item_id: row.get(1)?,
        found_item_id: row.get(2)?,
        matched_by: row.get(3)?,
        matched_at,
    })
}
