//! Typed token claims
//!
//! The provider puts roles under a namespaced custom claim. That key is
//! resolved once, while building [`Claims`], so nothing downstream depends
//! on the namespace string.

use serde_json::{Map, Value};
use std::collections::BTreeSet;

pub const ADMIN_ROLE: &str = "admin";

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Claims {
    /// Provider user id (`sub`)
    pub subject: Option<String>,
    pub roles: BTreeSet<String>,
}

impl Claims {
    pub fn new(subject: Option<String>, roles: impl IntoIterator<Item = String>) -> Self {
        Self {
            subject,
            roles: roles.into_iter().collect(),
        }
    }

    /// Build claims from a decoded token body. A missing or non-array role
    /// claim yields no roles; non-string entries are ignored.
    pub fn from_raw(raw: &Map<String, Value>, roles_claim: &str) -> Self {
        let subject = raw.get("sub").and_then(Value::as_str).map(str::to_string);
        let roles = raw
            .get(roles_claim)
            .and_then(Value::as_array)
            .map(|values| {
                values
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();
        Self { subject, roles }
    }

    pub fn has_role(&self, role: &str) -> bool {
        self.roles.contains(role)
    }

    pub fn is_admin(&self) -> bool {
        self.has_role(ADMIN_ROLE)
    }
}
