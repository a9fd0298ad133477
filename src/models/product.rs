use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{de, text, timestamp, EntityKind, Record};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    #[serde(deserialize_with = "de::id")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub price: Option<Decimal>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "de::datetime")]
    pub created_at: Option<DateTime<Utc>>,
}

impl Record for Product {
    const KIND: EntityKind = EntityKind::Products;

    fn id(&self) -> &str {
        &self.id
    }

    fn field(&self, name: &str) -> Option<String> {
        match name {
            "id" => Some(self.id.clone()),
            "name" => Some(self.name.clone()),
            "code" => text(&self.code),
            "category" => text(&self.category),
            "status" => text(&self.status),
            "price" => text(&self.price),
            "description" => text(&self.description),
            "created_at" => timestamp(&self.created_at),
            _ => None,
        }
    }
}
