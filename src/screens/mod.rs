// Entity screens: which endpoint, filters, and columns each list view uses

use std::sync::Arc;

use serde_json::Value;

use crate::api::ApiClient;
use crate::config::{config, ConsoleConfig};
use crate::entity::{EndpointSource, EntityData, FilterDowngrade, PaginationStore};
use crate::error::FetchError;
use crate::models::{EntityKind, Record};
use crate::navigation::Route;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilterField {
    pub name: &'static str,
    /// Text input committed after the search debounce
    pub debounced: bool,
    /// May be refused by the server; filtered locally instead
    pub downgradable: bool,
}

const fn select(name: &'static str) -> FilterField {
    FilterField { name, debounced: false, downgradable: false }
}

const fn search(name: &'static str) -> FilterField {
    FilterField { name, debounced: true, downgradable: false }
}

const fn downgradable(name: &'static str) -> FilterField {
    FilterField { name, debounced: false, downgradable: true }
}

#[derive(Debug)]
pub struct ScreenLayout {
    pub kind: EntityKind,
    pub path: &'static str,
    pub route: Route,
    pub filters: &'static [FilterField],
    pub columns: &'static [&'static str],
}

impl ScreenLayout {
    pub fn filter_names(&self) -> Vec<&'static str> {
        self.filters.iter().map(|f| f.name).collect()
    }

    pub fn debounced_fields(&self) -> Vec<&'static str> {
        self.filters.iter().filter(|f| f.debounced).map(|f| f.name).collect()
    }

    pub fn downgradable_fields(&self) -> Vec<&'static str> {
        self.filters.iter().filter(|f| f.downgradable).map(|f| f.name).collect()
    }

    pub fn has_filter(&self, name: &str) -> bool {
        self.filters.iter().any(|f| f.name == name)
    }
}

static SCREENS: [ScreenLayout; 6] = [
    ScreenLayout {
        kind: EntityKind::Organizations,
        path: "/organizations",
        route: Route::Organizations,
        filters: &[search("search"), select("status")],
        columns: &["id", "name", "slug", "status", "tier", "user_count", "created_at"],
    },
    ScreenLayout {
        kind: EntityKind::Users,
        path: "/users",
        route: Route::Users,
        filters: &[
            search("search"),
            downgradable("organization_id"),
            downgradable("role"),
            select("status"),
        ],
        columns: &["id", "email", "full_name", "role", "status", "organization_id", "last_login"],
    },
    ScreenLayout {
        kind: EntityKind::Subscriptions,
        path: "/subscriptions",
        route: Route::Subscriptions,
        filters: &[select("organization_id"), select("product_id"), downgradable("status")],
        columns: &["id", "organization_id", "product_id", "status", "tier", "price", "start_date", "end_date"],
    },
    ScreenLayout {
        kind: EntityKind::Products,
        path: "/products",
        route: Route::Products,
        filters: &[search("search"), select("status"), select("category")],
        columns: &["id", "name", "code", "category", "status", "price"],
    },
    ScreenLayout {
        kind: EntityKind::Domains,
        path: "/domains",
        route: Route::Domains,
        filters: &[search("search"), select("organization_id"), select("status")],
        columns: &["id", "domain", "organization_id", "status", "verified", "created_at"],
    },
    ScreenLayout {
        kind: EntityKind::AuditLog,
        path: "/audit-logs",
        route: Route::AuditLog,
        filters: &[
            search("search"),
            select("action"),
            select("entity_type"),
            select("user_id"),
            select("start_date"),
            select("end_date"),
        ],
        columns: &["timestamp", "user_email", "action", "entity_type", "entity_id", "ip_address"],
    },
];

pub fn screen(kind: EntityKind) -> &'static ScreenLayout {
    let index = match kind {
        EntityKind::Organizations => 0,
        EntityKind::Users => 1,
        EntityKind::Subscriptions => 2,
        EntityKind::Products => 3,
        EntityKind::Domains => 4,
        EntityKind::AuditLog => 5,
    };
    &SCREENS[index]
}

pub fn screens() -> &'static [ScreenLayout] {
    &SCREENS
}

/// A mounted entity screen: its fetcher plus the mutations that refresh it
#[derive(Debug)]
pub struct EntityScreen<T> {
    layout: &'static ScreenLayout,
    client: ApiClient,
    data: Arc<EntityData<T>>,
}

/// Mount the screen for `T` with the global configuration
pub fn open<T: Record>(client: &ApiClient) -> EntityScreen<T> {
    open_with(client, config())
}

pub fn open_with<T: Record>(client: &ApiClient, config: &ConsoleConfig) -> EntityScreen<T> {
    let layout = screen(T::KIND);
    let store = PaginationStore::new(config.list.default_page_size, layout.filter_names().as_slice());
    let source = EndpointSource::<T>::new(client.clone(), layout.path);

    let mut builder = EntityData::builder(source, client.session().clone(), store)
        .debounce(layout.debounced_fields().as_slice(), config.list.search_debounce());
    let downgradable = layout.downgradable_fields();
    if !downgradable.is_empty() {
        builder = builder.downgrade(
            FilterDowngrade::by_record_field(downgradable.as_slice()),
            config.list.fallback_fetch_limit,
        );
    }

    EntityScreen { layout, client: client.clone(), data: builder.build() }
}

impl<T: Record> EntityScreen<T> {
    pub fn layout(&self) -> &'static ScreenLayout {
        self.layout
    }

    pub fn data(&self) -> &Arc<EntityData<T>> {
        &self.data
    }

    pub async fn create(&self, body: &Value) -> Result<T, FetchError> {
        let created = self.client.create(self.layout.path, body).await?;
        // refresh even when the echoed body does not map
        self.data.fetch().await;
        Ok(serde_json::from_value(created)?)
    }

    pub async fn update(&self, id: &str, body: &Value) -> Result<T, FetchError> {
        let updated = self.client.update(self.layout.path, id, body).await?;
        // refresh even when the echoed body does not map
        self.data.fetch().await;
        Ok(serde_json::from_value(updated)?)
    }

    pub async fn delete(&self, id: &str) -> Result<(), FetchError> {
        self.client.delete(self.layout.path, id).await?;
        self.data.fetch().await;
        Ok(())
    }

    pub async fn close(self) {
        self.data.unmount().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_kind_has_its_own_screen() {
        for kind in EntityKind::ALL {
            assert_eq!(screen(kind).kind, kind);
        }
        assert_eq!(screens().len(), EntityKind::ALL.len());
    }

    #[test]
    fn users_downgrade_org_and_role() {
        let users = screen(EntityKind::Users);
        assert_eq!(users.downgradable_fields(), vec!["organization_id", "role"]);
        assert_eq!(users.debounced_fields(), vec!["search"]);
    }

    #[test]
    fn subscriptions_have_no_search() {
        let subs = screen(EntityKind::Subscriptions);
        assert!(subs.debounced_fields().is_empty());
        assert!(!subs.has_filter("search"));
        assert_eq!(subs.downgradable_fields(), vec!["status"]);
    }

    #[test]
    fn audit_log_path() {
        assert_eq!(screen(EntityKind::AuditLog).path, "/audit-logs");
    }
}
