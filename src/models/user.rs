use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{de, text, timestamp, EntityKind, Record};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    #[serde(deserialize_with = "de::id")]
    pub id: String,
    pub email: String,
    #[serde(default, alias = "name")]
    pub full_name: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub is_active: Option<bool>,
    #[serde(default, deserialize_with = "de::opt_id")]
    pub organization_id: Option<String>,
    #[serde(default, deserialize_with = "de::datetime")]
    pub last_login: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "de::datetime")]
    pub created_at: Option<DateTime<Utc>>,
}

impl User {
    /// Explicit `status`, else derived from `is_active`
    pub fn effective_status(&self) -> Option<String> {
        self.status.clone().or_else(|| {
            self.is_active
                .map(|active| if active { "active" } else { "inactive" }.to_string())
        })
    }
}

impl Record for User {
    const KIND: EntityKind = EntityKind::Users;

    fn id(&self) -> &str {
        &self.id
    }

    fn field(&self, name: &str) -> Option<String> {
        match name {
            "id" => Some(self.id.clone()),
            "email" => Some(self.email.clone()),
            "full_name" | "name" => text(&self.full_name),
            "role" => text(&self.role),
            "status" => self.effective_status(),
            "organization_id" => text(&self.organization_id),
            "last_login" => timestamp(&self.last_login),
            "created_at" => timestamp(&self.created_at),
            _ => None,
        }
    }
}
