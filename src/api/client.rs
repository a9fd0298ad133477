use reqwest::header::{AUTHORIZATION, USER_AGENT};
use reqwest::{Method, RequestBuilder};
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use url::Url;
use uuid::Uuid;

use crate::config::ConsoleConfig;
use crate::error::FetchError;
use crate::session::{LogoutReason, Session};

use super::query::ListQuery;

/// HTTP transport for the CRM backend.
///
/// Every request can be cancelled through a token; a cancelled request resolves
/// to [`FetchError::Cancelled`] and nothing else. A 401 on an authenticated
/// request clears the session here, once, for every screen.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    session: Session,
    user_agent: String,
    debug_requests: bool,
}

impl ApiClient {
    pub fn new(config: &ConsoleConfig, session: Session) -> Result<Self, FetchError> {
        let http = reqwest::Client::builder()
            .timeout(config.api.request_timeout())
            .build()
            .map_err(|e| FetchError::unknown(format!("Failed to build HTTP client: {}", e)))?;
        let mut client = Self::with_http(http, &config.api.base_url, session)?;
        client.debug_requests = config.logging.debug_requests;
        client.user_agent = config.api.user_agent.clone();
        Ok(client)
    }

    pub fn with_http(http: reqwest::Client, base_url: &str, session: Session) -> Result<Self, FetchError> {
        let base_url = base_url.trim_end_matches('/').to_string();
        Url::parse(&base_url)
            .map_err(|e| FetchError::unknown(format!("Invalid API base URL '{}': {}", base_url, e)))?;
        Ok(Self {
            http,
            base_url,
            session,
            user_agent: concat!("crm-console/", env!("CARGO_PKG_VERSION")).to_string(),
            debug_requests: false,
        })
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn url(&self, path: &str) -> Result<Url, FetchError> {
        let path = path.trim_start_matches('/');
        Url::parse(&format!("{}/{}", self.base_url, path))
            .map_err(|e| FetchError::unknown(format!("Invalid request path '{}': {}", path, e)))
    }

    /// GET a list endpoint with pagination and filter parameters
    pub async fn list(
        &self,
        path: &str,
        query: &ListQuery,
        cancel: &CancellationToken,
    ) -> Result<Value, FetchError> {
        let mut url = self.url(path)?;
        url.query_pairs_mut().extend_pairs(query.to_pairs());
        let body = self.send(Method::GET, url, None, cancel, true).await?;
        Ok(body.unwrap_or(Value::Null))
    }

    pub async fn create(&self, path: &str, body: &Value) -> Result<Value, FetchError> {
        let url = self.url(path)?;
        let body = self.send(Method::POST, url, Some(body), &CancellationToken::new(), true).await?;
        Ok(body.unwrap_or(Value::Null))
    }

    pub async fn update(&self, path: &str, id: &str, body: &Value) -> Result<Value, FetchError> {
        let url = self.url(&format!("{}/{}", path.trim_end_matches('/'), id))?;
        let body = self.send(Method::PUT, url, Some(body), &CancellationToken::new(), true).await?;
        Ok(body.unwrap_or(Value::Null))
    }

    /// Delete endpoints may answer 204 with no body
    pub async fn delete(&self, path: &str, id: &str) -> Result<(), FetchError> {
        let url = self.url(&format!("{}/{}", path.trim_end_matches('/'), id))?;
        self.send(Method::DELETE, url, None, &CancellationToken::new(), true).await?;
        Ok(())
    }

    /// POST without a credential (login)
    pub async fn post_public(&self, path: &str, body: &Value) -> Result<Value, FetchError> {
        let url = self.url(path)?;
        let body = self.send(Method::POST, url, Some(body), &CancellationToken::new(), false).await?;
        Ok(body.unwrap_or(Value::Null))
    }

    async fn send(
        &self,
        method: Method,
        url: Url,
        body: Option<&Value>,
        cancel: &CancellationToken,
        authenticated: bool,
    ) -> Result<Option<Value>, FetchError> {
        let request_id = Uuid::new_v4();
        let mut builder: RequestBuilder = self
            .http
            .request(method.clone(), url.clone())
            .header("X-Request-Id", request_id.to_string())
            .header(USER_AGENT, self.user_agent.as_str());

        if authenticated {
            let credential = self.session.credential().ok_or(FetchError::NoCredential)?;
            builder = builder.header(AUTHORIZATION, credential.authorization_header());
        }
        if let Some(body) = body {
            builder = builder.json(body);
        }

        if self.debug_requests {
            tracing::debug!("[{}] {} {}", request_id, method, url);
        }

        let response = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                tracing::trace!("[{}] cancelled before response", request_id);
                return Err(FetchError::Cancelled);
            }
            result = builder.send() => result?,
        };

        let status = response.status();
        let text = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(FetchError::Cancelled),
            text = response.text() => text?,
        };

        if status.is_success() {
            if text.trim().is_empty() {
                return Ok(None);
            }
            return Ok(Some(serde_json::from_str(&text)?));
        }

        // Raw payloads are for the log only
        tracing::error!("[{}] {} {} failed with {}: {}", request_id, method, url.path(), status, text);
        let err = FetchError::from_status(status.as_u16(), &text);

        if authenticated && matches!(err, FetchError::Unauthorized(_)) {
            if let Err(e) = self.session.logout(LogoutReason::Unauthorized) {
                tracing::error!("Failed to clear session after 401: {}", e);
            }
        }

        Err(err)
    }
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient").field("base_url", &self.base_url).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(base: &str) -> ApiClient {
        ApiClient::with_http(reqwest::Client::new(), base, Session::in_memory()).unwrap()
    }

    #[test]
    fn joins_paths_onto_base() {
        let c = client("http://localhost:8000/api/v1/");
        assert_eq!(c.url("/users").unwrap().as_str(), "http://localhost:8000/api/v1/users");
        assert_eq!(c.url("audit-logs").unwrap().as_str(), "http://localhost:8000/api/v1/audit-logs");
    }

    #[test]
    fn rejects_invalid_base() {
        assert!(ApiClient::with_http(reqwest::Client::new(), "not a url", Session::in_memory()).is_err());
    }

    #[tokio::test]
    async fn refuses_to_send_without_credential() {
        // unroutable port: a network attempt would fail differently
        let c = client("http://127.0.0.1:9");
        let err = c
            .list("/users", &ListQuery::new(0, 10, Vec::<(String, String)>::new()), &CancellationToken::new())
            .await
            .unwrap_err();
        assert_eq!(err, FetchError::NoCredential);
    }

    #[tokio::test]
    async fn cancelled_token_short_circuits() {
        let session = Session::in_memory();
        session.establish("tok", "bearer", None).unwrap();
        let c = ApiClient::with_http(reqwest::Client::new(), "http://127.0.0.1:9", session).unwrap();
        let cancel = CancellationToken::new();
        cancel.cancel();
        let err = c
            .list("/users", &ListQuery::new(0, 10, Vec::<(String, String)>::new()), &cancel)
            .await
            .unwrap_err();
        assert_eq!(err, FetchError::Cancelled);
    }
}
