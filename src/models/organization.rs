use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{de, text, timestamp, EntityKind, Record};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Organization {
    #[serde(deserialize_with = "de::id")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub tier: Option<String>,
    #[serde(default)]
    pub user_count: Option<u64>,
    #[serde(default)]
    pub contact_email: Option<String>,
    #[serde(default, deserialize_with = "de::datetime")]
    pub created_at: Option<DateTime<Utc>>,
}

impl Record for Organization {
    const KIND: EntityKind = EntityKind::Organizations;

    fn id(&self) -> &str {
        &self.id
    }

    fn field(&self, name: &str) -> Option<String> {
        match name {
            "id" => Some(self.id.clone()),
            "name" => Some(self.name.clone()),
            "slug" => text(&self.slug),
            "status" => text(&self.status),
            "tier" => text(&self.tier),
            "user_count" => text(&self.user_count),
            "contact_email" => text(&self.contact_email),
            "created_at" => timestamp(&self.created_at),
            _ => None,
        }
    }
}
