//! User Repository
//!
//! Profile records for the people who post items and make matches.

use async_trait::async_trait;
use rusqlite::{params, OptionalExtension};

use super::db::DbPool;
use super::storage_err;
use super::traits::UserStore;
use crate::domain::{DomainError, DomainResult, NewUser, User};

#[derive(Clone)]
pub struct UserRepository {
    pool: DbPool,
}

impl UserRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for UserRepository {
    async fn create_user(&self, user: &NewUser) -> DomainResult<User> {
        if user.first_name.trim().is_empty() || user.second_name.trim().is_empty() || user.email.trim().is_empty() {
            return Err(DomainError::InvalidInput("Missing required fields".to_string()));
        }

        let user = user.clone();
        self.pool
            .interact(move |conn| {
                let role = user.role().to_string();
                conn.execute(
                    "INSERT INTO users (first_name, second_name, email, role) VALUES (?1, ?2, ?3, ?4)",
                    params![user.first_name, user.second_name, user.email, role],
                )
                .map_err(|e| match storage_err(e) {
                    DomainError::Conflict(_) => DomainError::Conflict("Email already in use".to_string()),
                    other => other,
                })?;

                Ok(User {
                    id: conn.last_insert_rowid(),
                    first_name: user.first_name,
                    second_name: user.second_name,
                    email: user.email,
                    role,
                })
            })
            .await
    }

    async fn find_user(&self, id: i64) -> DomainResult<Option<User>> {
        self.pool
            .interact(move |conn| {
                conn.query_row(
                    "SELECT id, first_name, second_name, email, role FROM users WHERE id = ?1",
                    params![id],
                    |row| {
                        Ok(User {
                            id: row.get(0)?,
                            first_name: row.get(1)?,
                            second_name: row.get(2)?,
                            email: row.get(3)?,
                            role: row.get(4)?,
                        })
                    },
                )
                .optional()
                .map_err(storage_err)
            })
            .await
    }
}
