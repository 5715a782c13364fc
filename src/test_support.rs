//! Shared fixtures for unit and router tests.

use chrono::NaiveDate;
use jsonwebtoken::jwk::JwkSet;
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use serde_json::json;
use std::sync::Arc;
use tempfile::TempDir;

use crate::auth::{AuthSettings, JwksCache, JwtVerifier};
use crate::domain::{
    DomainError, FoundItem, Item, ItemKind, ItemStatus, LostItem, Match, NewFoundItem, NewLostItem,
    NewUser, User,
};
use crate::repository::{init_db, DbOptions, DbPool, ItemRepository, ItemStore, MatchRegistry, MatchStore, UserRepository, UserStore};

pub const TEST_DOMAIN: &str = "foundit-test.eu.auth0.com";
pub const TEST_AUDIENCE: &str = "https://api.foundit.test";
pub const TEST_KID: &str = "test-key-1";
pub const ROLES_CLAIM: &str = "http://foundit.example.com/roles";

const TEST_PRIVATE_KEY: &str = include_str!("auth/testdata/test_rsa_key.pem");
const TEST_JWKS: &str = include_str!("auth/testdata/jwks.json");

/// A fresh on-disk database with every repository wired to it
pub struct Fixture {
    _dir: TempDir,
    pub pool: DbPool,
    pub items: ItemRepository,
    pub users: UserRepository,
    pub matches: MatchRegistry,
}

/// Everything observable in the store, for before/after comparisons
#[derive(Debug, PartialEq)]
pub struct Snapshot {
    pub lost: Vec<Item>,
    pub found: Vec<Item>,
    pub matches: Vec<Match>,
}

impl Fixture {
    pub async fn new() -> Self {
        let dir = tempfile::tempdir().expect("tempdir");
        let pool = init_db(&dir.path().join("foundit.db"), DbOptions::default())
            .await
            .expect("init test db");
        Self {
            _dir: dir,
            items: ItemRepository::new(pool.clone()),
            users: UserRepository::new(pool.clone()),
            matches: MatchRegistry::new(pool.clone()),
            pool,
        }
    }

    pub async fn user(&self, first: &str, second: &str) -> User {
        let email = format!("{}.{}@example.com", first, second).to_lowercase();
        self.users
            .create_user(&NewUser::new(first, second, &email))
            .await
            .expect("create user")
    }

    pub async fn lost(&self, name: &str, posted_by: i64) -> LostItem {
        self.items
            .create_lost(&NewLostItem {
                name: name.to_string(),
                category: "personal".to_string(),
                place: "Library".to_string(),
                date_lost: NaiveDate::from_ymd_opt(2024, 5, 2).unwrap(),
                description: String::new(),
                mobile: None,
                image_url: format!("/uploads/1714600000-{}.jpg", name.to_lowercase()),
                posted_by,
                avatar_url: String::new(),
            })
            .await
            .expect("create lost item")
    }

    pub async fn found(&self, name: &str, submitted_by: i64) -> FoundItem {
        self.items
            .create_found(&NewFoundItem {
                name: name.to_string(),
                category: "personal".to_string(),
                place: 3,
                date_found: NaiveDate::from_ymd_opt(2024, 5, 3).unwrap(),
                image_url: format!("/uploads/found-1714700000-{}.jpg", name.to_lowercase()),
                submitted_by,
            })
            .await
            .expect("create found item")
    }

    /// Run raw SQL, for seeding explicit ids or installing fault triggers
    pub async fn exec(&self, sql: &'static str) {
        self.pool
            .interact(move |conn| {
                conn.execute_batch(sql)
                    .map_err(|e| DomainError::Internal(e.to_string()))
            })
            .await
            .expect("raw sql");
    }

    pub async fn status(&self, kind: ItemKind, id: i64) -> ItemStatus {
        self.items
            .get_item(kind, id)
            .await
            .expect("get item")
            .expect("item exists")
            .status()
    }

    pub async fn snapshot(&self) -> Snapshot {
        let lost = self.items.list_items(ItemKind::Lost, None).await.expect("list lost");
        let found = self.items.list_items(ItemKind::Found, None).await.expect("list found");
        let matches = self
            .pool
            .interact(|conn| {
                let mut stmt = conn
                    .prepare("SELECT id, lost_item_id, found_item_id, matched_by, matched_at FROM matches ORDER BY id")
                    .map_err(|e| DomainError::Internal(e.to_string()))?;
                let rows = stmt
                    .query_map([], |row| {
                        Ok(Match {
                            id: row.get(0)?,
                            lost_item_id: row.get(1)?,
                            found_item_id: row.get(2)?,
                            matched_by: row.get(3)?,
                            matched_at: chrono::DateTime::from_timestamp_millis(row.get(4)?)
                                .unwrap_or_default(),
                        })
                    })
                    .map_err(|e| DomainError::Internal(e.to_string()))?;
                rows.collect::<Result<Vec<_>, _>>()
                    .map_err(|e| DomainError::Internal(e.to_string()))
            })
            .await
            .expect("list raw matches");
        Snapshot { lost, found, matches }
    }

    pub fn match_store(&self) -> Arc<dyn MatchStore> {
        Arc::new(self.matches.clone())
    }
}

pub fn auth_settings() -> AuthSettings {
    AuthSettings {
        issuer: format!("https://{}/", TEST_DOMAIN),
        audience: TEST_AUDIENCE.to_string(),
        roles_claim: ROLES_CLAIM.to_string(),
    }
}

pub fn test_key_set() -> JwkSet {
    serde_json::from_str(TEST_JWKS).expect("test jwks")
}

/// Verifier backed by the static test key set
pub fn test_verifier() -> JwtVerifier {
    JwtVerifier::new(JwksCache::from_static(test_key_set()), auth_settings())
}

/// Sign an RS256 token with the test key
pub fn sign_token(claims: &serde_json::Value) -> String {
    let mut header = Header::new(Algorithm::RS256);
    header.kid = Some(TEST_KID.to_string());
    let key = EncodingKey::from_rsa_pem(TEST_PRIVATE_KEY.as_bytes()).expect("test key");
    jsonwebtoken::encode(&header, claims, &key).expect("sign token")
}

/// Standard claims for `sub` carrying `roles`, valid for an hour
pub fn claims_with_roles(sub: &str, roles: &[&str]) -> serde_json::Value {
    let now = chrono::Utc::now().timestamp();
    json!({
        "sub": sub,
        "iss": format!("https://{}/", TEST_DOMAIN),
        "aud": TEST_AUDIENCE,
        "iat": now,
        "exp": now + 3600,
        ROLES_CLAIM: roles,
    })
}

pub fn admin_token() -> String {
    sign_token(&claims_with_roles("auth0|admin", &["admin"]))
}

pub fn student_token() -> String {
    sign_token(&claims_with_roles("auth0|student", &["student"]))
}
