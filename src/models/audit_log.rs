use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{de, text, timestamp, EntityKind, Record};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditLogEntry {
    #[serde(deserialize_with = "de::id")]
    pub id: String,
    pub action: String,
    #[serde(default)]
    pub entity_type: Option<String>,
    #[serde(default, deserialize_with = "de::opt_id")]
    pub entity_id: Option<String>,
    #[serde(default, deserialize_with = "de::opt_id")]
    pub user_id: Option<String>,
    #[serde(default)]
    pub user_email: Option<String>,
    #[serde(default)]
    pub ip_address: Option<String>,
    #[serde(default)]
    pub details: Option<Value>,
    #[serde(default, alias = "created_at", deserialize_with = "de::datetime")]
    pub timestamp: Option<DateTime<Utc>>,
}

impl Record for AuditLogEntry {
    const KIND: EntityKind = EntityKind::AuditLog;

    fn id(&self) -> &str {
        &self.id
    }

    fn field(&self, name: &str) -> Option<String> {
        match name {
            "id" => Some(self.id.clone()),
            "action" => Some(self.action.clone()),
            "entity_type" => text(&self.entity_type),
            "entity_id" => text(&self.entity_id),
            "user_id" => text(&self.user_id),
            "user_email" => text(&self.user_email),
            "ip_address" => text(&self.ip_address),
            "details" => self.details.as_ref().map(Value::to_string),
            "timestamp" | "created_at" => timestamp(&self.timestamp),
            _ => None,
        }
    }
}
