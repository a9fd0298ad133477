use serde_json::Value;

/// One page of records plus the server-reported match count
#[derive(Debug, Clone, PartialEq)]
pub struct ListPage<T> {
    pub records: Vec<T>,
    pub total: u64,
}

impl<T> ListPage<T> {
    pub fn empty() -> Self {
        Self { records: Vec::new(), total: 0 }
    }
}

/// Shapes list endpoints are known to answer with
#[derive(Debug, Clone, PartialEq)]
pub enum ListResponse {
    /// `[ ... ]`
    Array(Vec<Value>),
    /// `{ items: [...], total?, page?, page_size? }`, possibly inside a `{ data: ... }` envelope
    Paginated { items: Vec<Value>, total: Option<u64> },
    /// Anything else
    Unknown(Value),
}

impl ListResponse {
    pub fn classify(body: Value) -> Self {
        match body {
            Value::Array(items) => ListResponse::Array(items),
            Value::Object(mut map) => {
                if matches!(map.get("items"), Some(Value::Array(_))) {
                    let total = map.get("total").and_then(Value::as_u64);
                    match map.remove("items") {
                        Some(Value::Array(items)) => ListResponse::Paginated { items, total },
                        _ => ListResponse::Unknown(Value::Object(map)),
                    }
                } else if let Some(data) = map.remove("data") {
                    match Self::classify(data) {
                        ListResponse::Unknown(_) => ListResponse::Unknown(Value::Object(map)),
                        known => known,
                    }
                } else {
                    ListResponse::Unknown(Value::Object(map))
                }
            }
            other => ListResponse::Unknown(other),
        }
    }

    pub fn shape(&self) -> &'static str {
        match self {
            ListResponse::Array(_) => "array",
            ListResponse::Paginated { .. } => "paginated",
            ListResponse::Unknown(_) => "unknown",
        }
    }

    /// Unknown shapes yield an empty page with a warning instead of an error
    pub fn into_page(self, entity: &str) -> ListPage<Value> {
        match self {
            ListResponse::Array(items) => {
                let total = items.len() as u64;
                ListPage { records: items, total }
            }
            ListResponse::Paginated { items, total } => {
                let total = total.unwrap_or(items.len() as u64);
                ListPage { records: items, total }
            }
            ListResponse::Unknown(body) => {
                let keys: Vec<String> = body
                    .as_object()
                    .map(|m| m.keys().cloned().collect())
                    .unwrap_or_default();
                tracing::warn!(
                    "Unexpected {} list response shape (keys: {:?}), showing no records",
                    entity, keys
                );
                ListPage::empty()
            }
        }
    }
}

/// Classify and flatten in one step
pub fn normalize(entity: &str, body: Value) -> ListPage<Value> {
    ListResponse::classify(body).into_page(entity)
}
