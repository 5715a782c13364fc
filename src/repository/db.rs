//! Database Connection Pool and Setup
//!
//! Manages a bounded pool of SQLite connections and the schema migrations.
//! The pool is created once at startup and handed to every repository;
//! dropping the last handle (or calling [`DbPool::close`]) releases it.

use rusqlite::Connection;
use std::ops::{Deref, DerefMut};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tracing::{debug, info};

use crate::domain::{DomainError, DomainResult};

/// Pool sizing and lock-wait settings
#[derive(Debug, Clone)]
pub struct DbOptions {
    pub pool_size: usize,
    pub busy_timeout: Duration,
}

impl Default for DbOptions {
    fn default() -> Self {
        Self {
            pool_size: 8,
            busy_timeout: Duration::from_secs(5),
        }
    }
}

struct PoolInner {
    path: PathBuf,
    busy_timeout: Duration,
    max_size: usize,
    idle: Mutex<Vec<Connection>>,
    permits: Arc<Semaphore>,
}

/// Bounded SQLite connection pool
#[derive(Clone)]
pub struct DbPool {
    inner: Arc<PoolInner>,
}

/// A connection checked out of the pool; returned on drop.
pub struct PooledConnection {
    conn: Option<Connection>,
    pool: Arc<PoolInner>,
    _permit: OwnedSemaphorePermit,
}

impl Deref for PooledConnection {
    type Target = Connection;

    fn deref(&self) -> &Connection {
        self.conn.as_ref().expect("connection present until drop")
    }
}

impl DerefMut for PooledConnection {
    fn deref_mut(&mut self) -> &mut Connection {
        self.conn.as_mut().expect("connection present until drop")
    }
}

impl Drop for PooledConnection {
    fn drop(&mut self) {
        if let Some(conn) = self.conn.take() {
            if self.pool.permits.is_closed() {
                return;
            }
            // A transaction left open by a panicking closure must not leak
            // into the next borrower.
            if !conn.is_autocommit() {
                let _ = conn.execute_batch("ROLLBACK");
            }
            self.pool
                .idle
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(conn);
        }
    }
}

impl DbPool {
    fn new(path: PathBuf, options: &DbOptions) -> Self {
        let max_size = options.pool_size.max(1);
        Self {
            inner: Arc::new(PoolInner {
                path,
                busy_timeout: options.busy_timeout,
                max_size,
                idle: Mutex::new(Vec::with_capacity(max_size)),
                permits: Arc::new(Semaphore::new(max_size)),
            }),
        }
    }

    pub fn max_size(&self) -> usize {
        self.inner.max_size
    }

    /// Connections currently opened and not checked out
    pub fn idle_count(&self) -> usize {
        self.inner
            .idle
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Wait for a free slot and check out a connection, opening a new one
    /// if none is idle.
    pub async fn acquire(&self) -> DomainResult<PooledConnection> {
        let permit = Arc::clone(&self.inner.permits)
            .acquire_owned()
            .await
            .map_err(|_| DomainError::Internal("Database pool is closed".to_string()))?;

        let idle = self
            .inner
            .idle
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop();

        let conn = match idle {
            Some(conn) => conn,
            None => {
                debug!(path = %self.inner.path.display(), "Opening pooled connection");
                open_connection(&self.inner.path, self.inner.busy_timeout)?
            }
        };

        Ok(PooledConnection {
            conn: Some(conn),
            pool: Arc::clone(&self.inner),
            _permit: permit,
        })
    }

    /// Run blocking SQLite work on a pooled connection.
    ///
    /// The closure executes on the blocking thread pool. Once started it
    /// runs to completion even if the awaiting future is dropped, so a
    /// transaction inside it always ends in commit or rollback.
    pub async fn interact<F, R>(&self, f: F) -> DomainResult<R>
    where
        F: FnOnce(&mut Connection) -> DomainResult<R> + Send + 'static,
        R: Send + 'static,
    {
        let mut conn = self.acquire().await?;
        tokio::task::spawn_blocking(move || f(&mut *conn))
            .await
            .map_err(|e| DomainError::Internal(format!("Storage task failed: {}", e)))?
    }

    /// Stop handing out connections and drop the idle ones.
    pub fn close(&self) {
        self.inner.permits.close();
        self.inner
            .idle
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
        info!(path = %self.inner.path.display(), "Database pool closed");
    }
}

fn open_connection(path: &Path, busy_timeout: Duration) -> DomainResult<Connection> {
    let conn = Connection::open(path)
        .map_err(|e| DomainError::Internal(format!("Failed to open database: {}", e)))?;
    conn.busy_timeout(busy_timeout)
        .map_err(|e| DomainError::Internal(e.to_string()))?;
    conn.pragma_update(None, "foreign_keys", true)
        .map_err(|e| DomainError::Internal(e.to_string()))?;
    conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get::<_, String>(0))
        .map_err(|e| DomainError::Internal(format!("Failed to enable WAL: {}", e)))?;
    Ok(conn)
}

/// Open the database at `db_path`, run migrations and build the pool.
pub async fn init_db(db_path: &Path, options: DbOptions) -> DomainResult<DbPool> {
    if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .map_err(|e| DomainError::Internal(format!("Failed to create database dir: {}", e)))?;
    }

    let pool = DbPool::new(db_path.to_path_buf(), &options);
    pool.interact(run_migrations).await?;

    info!(
        path = %db_path.display(),
        pool_size = pool.max_size(),
        "Database initialized"
    );
    Ok(pool)
}

/// Check if a column exists in a table
fn column_exists(conn: &Connection, table: &str, column: &str) -> DomainResult<bool> {
    let mut stmt = conn
        .prepare(&format!("PRAGMA table_info({})", table))
        .map_err(|e| DomainError::Internal(e.to_string()))?;
    let names = stmt
        .query_map([], |row| row.get::<_, String>(1))
        .map_err(|e| DomainError::Internal(e.to_string()))?;
    for name in names {
        if name.map_err(|e| DomainError::Internal(e.to_string()))? == column {
            return Ok(true);
        }
    }
    Ok(false)
}

/// Run database migrations
fn run_migrations(conn: &mut Connection) -> DomainResult<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS users (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            first_name TEXT NOT NULL,
            second_name TEXT NOT NULL,
            email TEXT NOT NULL UNIQUE,
            role TEXT NOT NULL DEFAULT 'student'
        );

        CREATE TABLE IF NOT EXISTS lost_items (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            category TEXT NOT NULL,
            place TEXT NOT NULL,
            date_lost TEXT NOT NULL,
            description TEXT NOT NULL DEFAULT '',
            mobile INTEGER,
            image_url TEXT NOT NULL,
            posted_by INTEGER NOT NULL REFERENCES users(id),
            status TEXT NOT NULL DEFAULT 'pending' CHECK (status IN ('pending', 'matched'))
        );

        CREATE TABLE IF NOT EXISTS found_items (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            category TEXT NOT NULL,
            place INTEGER NOT NULL DEFAULT 1,
            date_found TEXT NOT NULL,
            image_url TEXT NOT NULL,
            submitted_by INTEGER NOT NULL REFERENCES users(id),
            status TEXT NOT NULL DEFAULT 'pending' CHECK (status IN ('pending', 'matched'))
        );

        CREATE TABLE IF NOT EXISTS matches (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            lost_item_id INTEGER NOT NULL REFERENCES lost_items(id),
            found_item_id INTEGER NOT NULL REFERENCES found_items(id),
            matched_by INTEGER NOT NULL REFERENCES users(id),
            matched_at INTEGER NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_matches_matched_at ON matches(matched_at);
        CREATE INDEX IF NOT EXISTS idx_lost_items_status ON lost_items(status);
        CREATE INDEX IF NOT EXISTS idx_found_items_status ON found_items(status);",
    )
    .map_err(|e| DomainError::Internal(format!("Migration failed: {}", e)))?;

    // Profile pictures arrived after the first release
    if !column_exists(conn, "lost_items", "avatar_url")? {
        conn.execute("ALTER TABLE lost_items ADD COLUMN avatar_url TEXT NOT NULL DEFAULT ''", [])
            .map_err(|e| DomainError::Internal(format!("Failed to add avatar_url: {}", e)))?;
    }

    Ok(())
}
