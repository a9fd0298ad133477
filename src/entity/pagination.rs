use std::collections::BTreeMap;

use serde::Serialize;

use crate::api::ListQuery;
use crate::config::PAGE_SIZE_OPTIONS;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PaginationState {
    /// Zero-based
    pub page: u32,
    pub page_size: u32,
    /// Last reported match count; only drives page controls
    pub total: u64,
}

/// Flat field -> value filter criteria. An empty value means "no constraint".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FilterState {
    fields: BTreeMap<String, String>,
}

impl FilterState {
    /// Declare the filter fields of a screen, all empty
    pub fn with_fields<S: AsRef<str>>(fields: &[S]) -> Self {
        Self {
            fields: fields.iter().map(|f| (f.as_ref().to_string(), String::new())).collect(),
        }
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.fields.get(field).map(String::as_str)
    }

    /// Merge a patch. Undeclared fields are ignored when the screen declared any.
    pub fn merge<K, V, I>(&mut self, patch: I)
    where
        K: Into<String>,
        V: Into<String>,
        I: IntoIterator<Item = (K, V)>,
    {
        let open = self.fields.is_empty();
        for (field, value) in patch {
            let field = field.into();
            match self.fields.get_mut(&field) {
                Some(slot) => *slot = value.into(),
                None if open => {
                    self.fields.insert(field, value.into());
                }
                None => tracing::warn!("Ignoring unknown filter field '{}'", field),
            }
        }
    }

    pub fn clear(&mut self) {
        self.fields.values_mut().for_each(String::clear);
    }

    /// Fields with a non-empty value
    pub fn active(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields
            .iter()
            .filter(|(_, v)| !v.trim().is_empty())
            .map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.active().next().is_none()
    }
}

/// Page, page size, total and filters of one screen.
///
/// Any filter change and any page size change resets the page to 0.
#[derive(Debug, Clone)]
pub struct PaginationStore {
    pagination: PaginationState,
    filters: FilterState,
}

impl PaginationStore {
    pub fn new<S: AsRef<str>>(page_size: u32, filter_fields: &[S]) -> Self {
        let page_size = if PAGE_SIZE_OPTIONS.contains(&page_size) {
            page_size
        } else {
            tracing::warn!("Page size {} not offered, using {}", page_size, PAGE_SIZE_OPTIONS[1]);
            PAGE_SIZE_OPTIONS[1]
        };
        Self {
            pagination: PaginationState { page: 0, page_size, total: 0 },
            filters: FilterState::with_fields(filter_fields),
        }
    }

    pub fn pagination(&self) -> PaginationState {
        self.pagination
    }

    pub fn filters(&self) -> &FilterState {
        &self.filters
    }

    pub fn on_page_change(&mut self, page: u32) {
        self.pagination.page = page;
    }

    /// Returns false (and changes nothing) for a size outside the offered set
    pub fn on_page_size_change(&mut self, page_size: u32) -> bool {
        if !PAGE_SIZE_OPTIONS.contains(&page_size) {
            return false;
        }
        self.pagination.page_size = page_size;
        self.pagination.page = 0;
        true
    }

    pub fn on_filter_change<K, V, I>(&mut self, patch: I)
    where
        K: Into<String>,
        V: Into<String>,
        I: IntoIterator<Item = (K, V)>,
    {
        self.filters.merge(patch);
        self.pagination.page = 0;
    }

    pub fn on_clear_filters(&mut self) {
        self.filters.clear();
        self.pagination.page = 0;
    }

    pub fn set_total(&mut self, total: u64) {
        self.pagination.total = total;
    }

    pub fn page_count(&self) -> u64 {
        let size = u64::from(self.pagination.page_size.max(1));
        self.pagination.total.div_ceil(size)
    }

    /// Outgoing parameters for the current page and active filters
    pub fn query(&self) -> ListQuery {
        ListQuery::new(self.pagination.page, self.pagination.page_size, self.filters.active())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> PaginationStore {
        PaginationStore::new(25, &["status", "search"])
    }

    #[test]
    fn filter_change_resets_page() {
        let mut store = store();
        store.on_page_change(3);
        store.on_filter_change([("status", "active")]);
        assert_eq!(store.pagination().page, 0);
        assert_eq!(store.filters().get("status"), Some("active"));
    }

    #[test]
    fn page_size_change_always_resets_page() {
        let mut store = store();
        assert!(store.on_page_size_change(25));
        store.on_page_change(2);
        assert!(store.on_page_size_change(50));
        assert_eq!(store.pagination().page, 0);
        assert_eq!(store.pagination().page_size, 50);
    }

    #[test]
    fn page_change_keeps_filters_and_size() {
        let mut store = store();
        store.on_filter_change([("search", "acme")]);
        store.on_page_change(4);
        assert_eq!(store.pagination().page, 4);
        assert_eq!(store.pagination().page_size, 25);
        assert_eq!(store.filters().get("search"), Some("acme"));
    }

    #[test]
    fn rejects_unoffered_page_size() {
        let mut store = store();
        store.on_page_change(1);
        assert!(!store.on_page_size_change(30));
        assert_eq!(store.pagination().page_size, 25);
        assert_eq!(store.pagination().page, 1);
        assert_eq!(PaginationStore::new(7, &["x"]).pagination().page_size, 25);
    }

    #[test]
    fn clear_filters_empties_every_field() {
        let mut store = store();
        store.on_filter_change([("status", "active"), ("search", "x")]);
        store.on_page_change(2);
        store.on_clear_filters();
        assert!(store.filters().is_empty());
        assert_eq!(store.filters().get("status"), Some(""));
        assert_eq!(store.pagination().page, 0);
    }

    #[test]
    fn query_omits_empty_filters() {
        let mut store = store();
        store.on_filter_change([("status", ""), ("search", "new")]);
        let query = store.query();
        assert_eq!(query.filter("search"), Some("new"));
        assert_eq!(query.filter("status"), None);
        assert_eq!(query.page, 1);
    }

    #[test]
    fn unknown_fields_are_ignored_for_declared_screens() {
        let mut store = store();
        store.on_filter_change([("colour", "red")]);
        assert_eq!(store.filters().get("colour"), None);
    }

    #[test]
    fn page_count_rounds_up() {
        let mut store = PaginationStore::new(10, &["status"]);
        store.set_total(21);
        assert_eq!(store.page_count(), 3);
        store.set_total(0);
        assert_eq!(store.page_count(), 0);
    }
}
