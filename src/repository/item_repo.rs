//! Item Repository Implementation
//!
//! SQLite-backed implementation of `ItemStore` for both item tables.
//! The statement helpers at the bottom take a plain `&Connection` so the
//! match registry can run them inside its own transaction.

use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension, Row};

use super::db::DbPool;
use super::storage_err;
use super::traits::ItemStore;
use crate::domain::{
    DomainError, DomainResult, FoundItem, Item, ItemKind, ItemStatus, LostItem, NewFoundItem,
    NewLostItem,
};

const LOST_COLUMNS: &str =
    "id, name, category, place, date_lost, description, mobile, image_url, posted_by, avatar_url, status";
const FOUND_COLUMNS: &str = "id, name, category, place, date_found, image_url, submitted_by, status";

/// SQLite implementation of the item store
#[derive(Clone)]
pub struct ItemRepository {
    pool: DbPool,
}

impl ItemRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ItemStore for ItemRepository {
    async fn get_item(&self, kind: ItemKind, id: i64) -> DomainResult<Option<Item>> {
        self.pool.interact(move |conn| get_item_on(conn, kind, id)).await
    }

    async fn set_status(&self, kind: ItemKind, id: i64, status: ItemStatus) -> DomainResult<()> {
        self.pool
            .interact(move |conn| set_status_on(conn, kind, id, status))
            .await
    }

    async fn list_items(&self, kind: ItemKind, status: Option<ItemStatus>) -> DomainResult<Vec<Item>> {
        self.pool
            .interact(move |conn| {
                let columns = match kind {
                    ItemKind::Lost => LOST_COLUMNS,
                    ItemKind::Found => FOUND_COLUMNS,
                };
                let query = format!(
                    "SELECT {} FROM {} WHERE (?1 IS NULL OR status = ?1) ORDER BY id DESC",
                    columns,
                    kind.table()
                );
                let mut stmt = conn.prepare(&query).map_err(storage_err)?;
                let filter = status.map(|s| s.as_str());
                let rows = stmt
                    .query_map(params![filter], |row| row_to_item(kind, row))
                    .map_err(storage_err)?;
                rows.collect::<Result<Vec<_>, _>>().map_err(storage_err)
            })
            .await
    }

    async fn create_lost(&self, item: &NewLostItem) -> DomainResult<LostItem> {
        item.validate().map_err(DomainError::InvalidInput)?;
        let item = item.clone();
        self.pool
            .interact(move |conn| {
                conn.execute(
                    "INSERT INTO lost_items
                        (name, category, place, date_lost, description, mobile, image_url, posted_by, avatar_url)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                    params![
                        item.name,
                        item.category,
                        item.place,
                        item.date_lost,
                        item.description,
                        item.mobile,
                        item.image_url,
                        item.posted_by,
                        item.avatar_url
                    ],
                )
                .map_err(storage_err)?;

                let id = conn.last_insert_rowid();
                Ok(LostItem {
                    id,
                    name: item.name,
                    category: item.category,
                    place: item.place,
                    date_lost: item.date_lost,
                    description: item.description,
                    mobile: item.mobile,
                    image_url: item.image_url,
                    posted_by: item.posted_by,
                    avatar_url: item.avatar_url,
                    status: ItemStatus::Pending,
                })
            })
            .await
    }

    async fn create_found(&self, item: &NewFoundItem) -> DomainResult<FoundItem> {
        let item = item.clone();
        self.pool
            .interact(move |conn| {
                conn.execute(
                    "INSERT INTO found_items
                        (name, category, place, date_found, image_url, status, submitted_by)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                    params![
                        item.name,
                        item.category,
                        item.place,
                        item.date_found,
                        item.image_url,
                        ItemStatus::Pending.as_str(),
                        item.submitted_by
                    ],
                )
                .map_err(storage_err)?;

                Ok(FoundItem {
                    id: conn.last_insert_rowid(),
                    name: item.name,
                    category: item.category,
                    place: item.place,
                    date_found: item.date_found,
                    image_url: item.image_url,
                    submitted_by: item.submitted_by,
                    status: ItemStatus::Pending,
                })
            })
            .await
    }

    async fn delete_item(&self, kind: ItemKind, id: i64) -> DomainResult<()> {
        self.pool
            .interact(move |conn| {
                // Matches are not cascaded; a matched item must be unmatched first.
                conn.execute(&format!("DELETE FROM {} WHERE id = ?1", kind.table()), params![id])
                    .map_err(|e| match storage_err(e) {
                        DomainError::InvalidInput(_) => {
                            DomainError::Conflict(format!("{} {} is referenced by a match", kind, id))
                        }
                        other => other,
                    })?;
                Ok(())
            })
            .await
    }
}

/// Read one item on an existing connection
pub(super) fn get_item_on(conn: &Connection, kind: ItemKind, id: i64) -> DomainResult<Option<Item>> {
    let columns = match kind {
        ItemKind::Lost => LOST_COLUMNS,
        ItemKind::Found => FOUND_COLUMNS,
    };
    conn.query_row(
        &format!("SELECT {} FROM {} WHERE id = ?1", columns, kind.table()),
        params![id],
        |row| row_to_item(kind, row),
    )
    .optional()
    .map_err(storage_err)
}

/// Set an item's status on an existing connection (or open transaction)
pub(super) fn set_status_on(
    conn: &Connection,
    kind: ItemKind,
    id: i64,
    status: ItemStatus,
) -> DomainResult<()> {
    let changed = conn
        .execute(
            &format!("UPDATE {} SET status = ?1 WHERE id = ?2", kind.table()),
            params![status.as_str(), id],
        )
        .map_err(storage_err)?;

    if changed == 0 {
        return Err(DomainError::NotFound(format!("{} {} not found", kind, id)));
    }
    Ok(())
}

fn parse_status(row: &Row<'_>, idx: usize) -> rusqlite::Result<ItemStatus> {
    let raw: String = row.get(idx)?;
    ItemStatus::from_str(&raw).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            idx,
            rusqlite::types::Type::Text,
            format!("unknown item status '{}'", raw).into(),
        )
    })
}

/// Convert a database row to an Item of the given kind
fn row_to_item(kind: ItemKind, row: &Row<'_>) -> rusqlite::Result<Item> {
    match kind {
        ItemKind::Lost => Ok(Item::Lost(LostItem {
            id: row.get(0)?,
            name: row.get(1)?,
            category: row.get(2)?,
            place: row.get(3)?,
            date_lost: row.get(4)?,
            description: row.get(5)?,
            mobile: row.get(6)?,
            image_url: row.get(7)?,
            posted_by: row.get(8)?,
            avatar_url: row.get(9)?,
            status: parse_status(row, 10)?,
        })),
        ItemKind::Found => Ok(Item::Found(FoundItem {
            id: row.get(0)?,
            name: row.get(1)?,
            category: row.get(2)?,
            place: row.get(3)?,
            date_found: row.get(4)?,
            image_url: row.get(5)?,
            submitted_by: row.get(6)?,
            status: parse_status(row, 7)?,
        })),
    }
}
