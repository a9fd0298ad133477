// Records shown by the entity screens

pub mod audit_log;
pub mod de;
pub mod domain;
pub mod organization;
pub mod product;
pub mod subscription;
pub mod user;

pub use audit_log::AuditLogEntry;
pub use domain::Domain;
pub use organization::Organization;
pub use product::Product;
pub use subscription::Subscription;
pub use user::User;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Entity types that have a list screen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Organizations,
    Users,
    Subscriptions,
    Products,
    Domains,
    AuditLog,
}

impl EntityKind {
    pub const ALL: [EntityKind; 6] = [
        EntityKind::Organizations,
        EntityKind::Users,
        EntityKind::Subscriptions,
        EntityKind::Products,
        EntityKind::Domains,
        EntityKind::AuditLog,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            EntityKind::Organizations => "organizations",
            EntityKind::Users => "users",
            EntityKind::Subscriptions => "subscriptions",
            EntityKind::Products => "products",
            EntityKind::Domains => "domains",
            EntityKind::AuditLog => "audit log",
        }
    }
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// A row of an entity screen.
///
/// `field` exposes values by their API field name; it backs both table cells and
/// local filtering when the server refuses a filter.
pub trait Record: DeserializeOwned + Serialize + Clone + Send + Sync + 'static {
    const KIND: EntityKind;

    fn id(&self) -> &str;

    fn field(&self, name: &str) -> Option<String>;

    /// Table columns, in display order
    fn columns() -> &'static [&'static str] {
        crate::screens::screen(Self::KIND).columns
    }
}

pub(crate) fn text<T: ToString>(value: &Option<T>) -> Option<String> {
    value.as_ref().map(ToString::to_string)
}

pub(crate) fn timestamp(value: &Option<DateTime<Utc>>) -> Option<String> {
    value.map(|dt| dt.format("%Y-%m-%d %H:%M").to_string())
}
