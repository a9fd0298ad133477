// Fetch error taxonomy shared by the transport, the fetcher, and the console
use serde_json::Value;
use thiserror::Error;

/// Everything that can go wrong while loading or mutating entity data.
///
/// `Cancelled` never reaches the rendering layer: the fetcher absorbs it.
/// `ServerRejectedFilter` is produced by the fetcher (not the transport) when a
/// server-side failure hits a request carrying downgradable filter fields.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("No valid authentication credential")]
    NoCredential,

    #[error("Request cancelled")]
    Cancelled,

    // 401
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    // 403
    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Server rejected filter combination (HTTP {status}): {detail}")]
    ServerRejectedFilter { status: u16, detail: String },

    #[error("Network error: {0}")]
    NetworkOrTimeout(String),

    #[error("Unexpected error (status {status:?}): {detail}")]
    Unknown { status: Option<u16>, detail: String },
}

impl FetchError {
    /// Classify a non-success HTTP response
    pub fn from_status(status: u16, body: &str) -> Self {
        let detail = extract_detail(body);
        match status {
            401 => FetchError::Unauthorized(detail),
            403 => FetchError::Forbidden(detail),
            _ => FetchError::Unknown { status: Some(status), detail },
        }
    }

    pub fn unknown(detail: impl Into<String>) -> Self {
        FetchError::Unknown { status: None, detail: detail.into() }
    }

    /// HTTP status behind this error, when there was a response at all
    pub fn status_code(&self) -> Option<u16> {
        match self {
            FetchError::Unauthorized(_) => Some(401),
            FetchError::Forbidden(_) => Some(403),
            FetchError::ServerRejectedFilter { status, .. } => Some(*status),
            FetchError::Unknown { status, .. } => *status,
            FetchError::NoCredential | FetchError::Cancelled | FetchError::NetworkOrTimeout(_) => None,
        }
    }

    /// Stable code for machine-readable output
    pub fn error_code(&self) -> &'static str {
        match self {
            FetchError::NoCredential => "NO_CREDENTIAL",
            FetchError::Cancelled => "CANCELLED",
            FetchError::Unauthorized(_) => "UNAUTHORIZED",
            FetchError::Forbidden(_) => "FORBIDDEN",
            FetchError::ServerRejectedFilter { .. } => "SERVER_REJECTED_FILTER",
            FetchError::NetworkOrTimeout(_) => "NETWORK_OR_TIMEOUT",
            FetchError::Unknown { .. } => "UNKNOWN",
        }
    }

    /// Short message for the screen's error slot. Never contains server payloads.
    pub fn user_message(&self) -> &'static str {
        match self {
            FetchError::NoCredential => "Authentication required. Please log in.",
            FetchError::Cancelled => "Request cancelled.",
            FetchError::Unauthorized(_) => "Your session has expired. Please log in again.",
            FetchError::Forbidden(_) => "You do not have permission to view this data.",
            FetchError::ServerRejectedFilter { .. } => {
                "The server could not apply these filters. Please adjust them and try again."
            }
            FetchError::NetworkOrTimeout(_) => {
                "Unable to reach the server. Check your connection and try again."
            }
            FetchError::Unknown { .. } => "Something went wrong while loading data. Please try again.",
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, FetchError::Cancelled)
    }

    /// Server-side failure that may be caused by an unsupported filter combination
    pub fn is_server_rejection(&self) -> bool {
        match self {
            FetchError::ServerRejectedFilter { .. } => true,
            FetchError::Unknown { status: Some(status), .. } => {
                matches!(*status, 400 | 422) || (500..600).contains(status)
            }
            _ => false,
        }
    }

    /// Promote a server-side failure into the filter-rejection kind
    pub fn into_filter_rejection(self) -> Self {
        match self {
            FetchError::Unknown { status: Some(status), detail } => {
                FetchError::ServerRejectedFilter { status, detail }
            }
            other => other,
        }
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() || err.is_connect() {
            FetchError::NetworkOrTimeout(err.to_string())
        } else if let Some(status) = err.status() {
            FetchError::from_status(status.as_u16(), "")
        } else if err.is_decode() {
            FetchError::unknown(format!("Invalid response body: {}", err))
        } else if err.is_request() {
            FetchError::NetworkOrTimeout(err.to_string())
        } else {
            FetchError::unknown(err.to_string())
        }
    }
}

impl From<serde_json::Error> for FetchError {
    fn from(err: serde_json::Error) -> Self {
        FetchError::unknown(format!("Invalid JSON: {}", err))
    }
}

/// Pull a human-oriented detail out of an error body (`detail`, `message`, or `error`)
fn extract_detail(body: &str) -> String {
    let parsed: Option<Value> = serde_json::from_str(body).ok();
    let from_json = parsed.as_ref().and_then(|v| {
        ["detail", "message", "error"]
            .iter()
            .find_map(|key| v.get(*key).and_then(Value::as_str))
            .map(str::to_string)
    });

    match from_json {
        Some(detail) => detail,
        None => body.chars().take(200).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_auth_statuses() {
        assert_eq!(
            FetchError::from_status(401, r#"{"detail":"Token expired"}"#),
            FetchError::Unauthorized("Token expired".into())
        );
        assert_eq!(
            FetchError::from_status(403, r#"{"message":"nope"}"#),
            FetchError::Forbidden("nope".into())
        );
        assert_eq!(
            FetchError::from_status(500, "boom").status_code(),
            Some(500)
        );
    }

    #[test]
    fn server_rejection_covers_bad_request_and_server_errors() {
        assert!(FetchError::from_status(400, "").is_server_rejection());
        assert!(FetchError::from_status(422, "").is_server_rejection());
        assert!(FetchError::from_status(503, "").is_server_rejection());
        assert!(!FetchError::from_status(404, "").is_server_rejection());
        assert!(!FetchError::from_status(401, "").is_server_rejection());
        assert!(!FetchError::NetworkOrTimeout("down".into()).is_server_rejection());
    }

    #[test]
    fn promotes_to_filter_rejection() {
        let err = FetchError::from_status(500, r#"{"error":"bad combo"}"#).into_filter_rejection();
        assert_eq!(
            err,
            FetchError::ServerRejectedFilter { status: 500, detail: "bad combo".into() }
        );
        assert_eq!(err.error_code(), "SERVER_REJECTED_FILTER");
    }

    #[test]
    fn user_message_hides_server_payload() {
        let err = FetchError::from_status(500, r#"{"detail":"psql: relation users does not exist"}"#);
        assert!(!err.user_message().contains("psql"));
    }

    #[test]
    fn long_plain_bodies_are_truncated() {
        let body = "x".repeat(1000);
        match FetchError::from_status(502, &body) {
            FetchError::Unknown { detail, .. } => assert_eq!(detail.len(), 200),
            other => panic!("unexpected {:?}", other),
        }
    }
}
