use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{de, text, timestamp, EntityKind, Record};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subscription {
    #[serde(deserialize_with = "de::id")]
    pub id: String,
    #[serde(default, deserialize_with = "de::opt_id")]
    pub organization_id: Option<String>,
    #[serde(default, deserialize_with = "de::opt_id")]
    pub product_id: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub tier: Option<String>,
    #[serde(default)]
    pub price: Option<Decimal>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default, deserialize_with = "de::datetime")]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "de::datetime")]
    pub end_date: Option<DateTime<Utc>>,
}

impl Record for Subscription {
    const KIND: EntityKind = EntityKind::Subscriptions;

    fn id(&self) -> &str {
        &self.id
    }

    fn field(&self, name: &str) -> Option<String> {
        match name {
            "id" => Some(self.id.clone()),
            "organization_id" => text(&self.organization_id),
            "product_id" => text(&self.product_id),
            "status" => text(&self.status),
            "tier" => text(&self.tier),
            "price" => self.price.map(|p| match &self.currency {
                Some(currency) => format!("{} {}", p, currency),
                None => p.to_string(),
            }),
            "start_date" => timestamp(&self.start_date),
            "end_date" => timestamp(&self.end_date),
            _ => None,
        }
    }
}
