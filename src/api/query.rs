use std::collections::BTreeMap;

/// Outgoing parameters of a list request.
///
/// `page` is one-based here (API convention); the stores keep it zero-based.
/// Filter fields with an empty value are never part of a query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListQuery {
    pub page: u32,
    pub page_size: u32,
    filters: BTreeMap<String, String>,
}

impl ListQuery {
    pub fn new<K, V, I>(zero_based_page: u32, page_size: u32, filters: I) -> Self
    where
        K: Into<String>,
        V: AsRef<str>,
        I: IntoIterator<Item = (K, V)>,
    {
        let filters = filters
            .into_iter()
            .filter_map(|(k, v)| {
                let value = v.as_ref().trim();
                (!value.is_empty()).then(|| (k.into(), value.to_string()))
            })
            .collect();
        Self { page: zero_based_page.saturating_add(1), page_size, filters }
    }

    pub fn filter(&self, field: &str) -> Option<&str> {
        self.filters.get(field).map(String::as_str)
    }

    pub fn filters(&self) -> impl Iterator<Item = (&str, &str)> {
        self.filters.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn has_any<S: AsRef<str>>(&self, fields: &[S]) -> bool {
        fields.iter().any(|f| self.filters.contains_key(f.as_ref()))
    }

    /// Copy without the given fields; returns the removed `(field, value)` pairs too
    pub fn without<S: AsRef<str>>(&self, fields: &[S]) -> (Self, Vec<(String, String)>) {
        let mut relaxed = self.clone();
        let removed = fields
            .iter()
            .filter_map(|f| relaxed.filters.remove_entry(f.as_ref()))
            .collect();
        (relaxed, removed)
    }

    pub fn with_page(mut self, one_based_page: u32, page_size: u32) -> Self {
        self.page = one_based_page.max(1);
        self.page_size = page_size;
        self
    }

    /// `page`, `page_size`, then filters in field order
    pub fn to_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = vec![
            ("page".to_string(), self.page.to_string()),
            ("page_size".to_string(), self.page_size.to_string()),
        ];
        pairs.extend(self.filters.iter().map(|(k, v)| (k.clone(), v.clone())));
        pairs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converts_page_and_drops_empty_filters() {
        let query = ListQuery::new(0, 25, [("status", ""), ("search", "new")]);
        assert_eq!(
            query.to_pairs(),
            vec![
                ("page".to_string(), "1".to_string()),
                ("page_size".to_string(), "25".to_string()),
                ("search".to_string(), "new".to_string()),
            ]
        );
        assert_eq!(query.filter("status"), None);
    }

    #[test]
    fn whitespace_only_counts_as_empty() {
        let query = ListQuery::new(2, 10, [("search", "   ")]);
        assert_eq!(query.page, 3);
        assert_eq!(query.filters().count(), 0);
    }

    #[test]
    fn last_page_index_does_not_overflow() {
        let query = ListQuery::new(u32::MAX, 10, [("search", "x")]);
        assert_eq!(query.page, u32::MAX);
    }

    #[test]
    fn without_strips_and_reports_fields() {
        let query = ListQuery::new(0, 10, [("role", "admin"), ("organization_id", "o1"), ("search", "x")]);
        assert!(query.has_any(&["role"]));
        let (relaxed, removed) = query.without(&["role", "status"]);
        assert!(!relaxed.has_any(&["role"]));
        assert_eq!(relaxed.filter("search"), Some("x"));
        assert_eq!(removed, vec![("role".to_string(), "admin".to_string())]);
    }
}
