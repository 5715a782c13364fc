//! User Entity
//!
//! Actors referenced by items and matches. Credentials live with the
//! external identity provider, so only profile fields are stored here.

use serde::{Deserialize, Serialize};

pub const DEFAULT_ROLE: &str = "student";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub first_name: String,
    pub second_name: String,
    pub email: String,
    pub role: String,
}

impl User {
    /// Name shown in match listings
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.second_name)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewUser {
    pub first_name: String,
    pub second_name: String,
    pub email: String,
    #[serde(default)]
    pub role: Option<String>,
}

impl NewUser {
    pub fn new(first_name: &str, second_name: &str, email: &str) -> Self {
        Self {
            first_name: first_name.to_string(),
            second_name: second_name.to_string(),
            email: email.to_string(),
            role: None,
        }
    }

    pub fn role(&self) -> &str {
        self.role.as_deref().unwrap_or(DEFAULT_ROLE)
    }
}
