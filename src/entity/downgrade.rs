use std::sync::Arc;

use crate::api::ListQuery;
use crate::models::Record;

type Matcher<T> = dyn Fn(&T, &str, &str) -> bool + Send + Sync;

/// Filter fields the server may refuse to combine.
///
/// When a request carrying one of them fails server-side, the fetcher retries
/// once without them and filters the result locally with `matcher`.
pub struct FilterDowngrade<T> {
    fields: Vec<String>,
    matcher: Arc<Matcher<T>>,
}

impl<T> Clone for FilterDowngrade<T> {
    fn clone(&self) -> Self {
        Self { fields: self.fields.clone(), matcher: Arc::clone(&self.matcher) }
    }
}

impl<T> FilterDowngrade<T> {
    pub fn new<S, M>(fields: &[S], matcher: M) -> Self
    where
        S: AsRef<str>,
        M: Fn(&T, &str, &str) -> bool + Send + Sync + 'static,
    {
        Self {
            fields: fields.iter().map(|f| f.as_ref().to_string()).collect(),
            matcher: Arc::new(matcher),
        }
    }

    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    pub fn applies_to(&self, query: &ListQuery) -> bool {
        query.has_any(self.fields.as_slice())
    }

    /// First `fetch_limit` records without the downgradable filters, plus the
    /// `(field, value)` pairs that now have to be applied locally
    pub fn relax(&self, query: &ListQuery, fetch_limit: u32) -> (ListQuery, Vec<(String, String)>) {
        let (relaxed, removed) = query.without(self.fields.as_slice());
        (relaxed.with_page(1, fetch_limit), removed)
    }

    pub fn apply_locally(&self, records: Vec<T>, removed: &[(String, String)]) -> Vec<T> {
        records
            .into_iter()
            .filter(|record| removed.iter().all(|(field, value)| (self.matcher)(record, field, value)))
            .collect()
    }
}

impl<T: Record> FilterDowngrade<T> {
    /// Case-insensitive exact match on [`Record::field`]
    pub fn by_record_field<S: AsRef<str>>(fields: &[S]) -> Self {
        Self::new(fields, |record: &T, field, value| {
            record.field(field).is_some_and(|actual| actual.eq_ignore_ascii_case(value))
        })
    }
}

impl<T> std::fmt::Debug for FilterDowngrade<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FilterDowngrade").field("fields", &self.fields).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::User;
    use serde_json::json;

    fn user(id: u32, role: &str, org: &str) -> User {
        serde_json::from_value(json!({
            "id": id, "email": format!("u{}@example.com", id), "role": role, "organization_id": org
        }))
        .unwrap()
    }

    #[test]
    fn relax_strips_fields_and_widens_page() {
        let downgrade: FilterDowngrade<User> = FilterDowngrade::by_record_field(&["role", "organization_id"]);
        let query = ListQuery::new(2, 10, [("role", "admin"), ("search", "bob")]);
        assert!(downgrade.applies_to(&query));

        let (relaxed, removed) = downgrade.relax(&query, 1000);
        assert_eq!(relaxed.page, 1);
        assert_eq!(relaxed.page_size, 1000);
        assert_eq!(relaxed.filter("role"), None);
        assert_eq!(relaxed.filter("search"), Some("bob"));
        assert_eq!(removed, vec![("role".to_string(), "admin".to_string())]);
    }

    #[test]
    fn local_filter_matches_every_removed_field() {
        let downgrade: FilterDowngrade<User> = FilterDowngrade::by_record_field(&["role", "organization_id"]);
        let users = vec![user(1, "admin", "o1"), user(2, "Admin", "o2"), user(3, "viewer", "o1")];
        let removed = vec![
            ("role".to_string(), "admin".to_string()),
            ("organization_id".to_string(), "o1".to_string()),
        ];
        let kept = downgrade.apply_locally(users, &removed);
        assert_eq!(kept.iter().map(|u| u.id.as_str()).collect::<Vec<_>>(), vec!["1"]);
    }

    #[test]
    fn does_not_apply_without_its_fields() {
        let downgrade: FilterDowngrade<User> = FilterDowngrade::by_record_field(&["role"]);
        assert!(!downgrade.applies_to(&ListQuery::new(0, 10, [("role", "")])));
    }
}
