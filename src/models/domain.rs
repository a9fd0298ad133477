use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{de, text, timestamp, EntityKind, Record};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Domain {
    #[serde(deserialize_with = "de::id")]
    pub id: String,
    #[serde(alias = "domain_name")]
    pub domain: String,
    #[serde(default, deserialize_with = "de::opt_id")]
    pub organization_id: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub verified: Option<bool>,
    #[serde(default, deserialize_with = "de::datetime")]
    pub created_at: Option<DateTime<Utc>>,
}

impl Record for Domain {
    const KIND: EntityKind = EntityKind::Domains;

    fn id(&self) -> &str {
        &self.id
    }

    fn field(&self, name: &str) -> Option<String> {
        match name {
            "id" => Some(self.id.clone()),
            "domain" => Some(self.domain.clone()),
            "organization_id" => text(&self.organization_id),
            "status" => text(&self.status),
            "verified" => text(&self.verified),
            "created_at" => timestamp(&self.created_at),
            _ => None,
        }
    }
}
