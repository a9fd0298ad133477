use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::error::FetchError;
use crate::session::{LogoutReason, Session, SessionError, UserIdentity};

use super::client::ApiClient;

/// Body of a successful `POST /auth/login`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub access_token: String,
    #[serde(default = "default_token_type")]
    pub token_type: String,
    #[serde(default)]
    pub user: Option<UserIdentity>,
    /// Anything else the server sends (expiry, refresh token, ...)
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn default_token_type() -> String {
    "bearer".to_string()
}

/// Login/logout against the authentication endpoint
pub struct AuthApi<'a> {
    client: &'a ApiClient,
}

impl<'a> AuthApi<'a> {
    pub const LOGIN_PATH: &'static str = "/auth/login";

    pub fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    /// Exchange credentials for a token and establish the session
    pub async fn login(&self, email: &str, password: &str) -> Result<LoginResponse, FetchError> {
        let body = json!({ "email": email, "password": password });
        let raw = self.client.post_public(Self::LOGIN_PATH, &body).await?;
        let response: LoginResponse = serde_json::from_value(raw)?;

        self.client
            .session()
            .establish(&response.access_token, &response.token_type, response.user.clone())
            .map_err(session_failure)?;
        Ok(response)
    }

    pub fn logout(&self) -> Result<bool, FetchError> {
        self.session().logout(LogoutReason::UserRequested).map_err(session_failure)
    }

    pub fn whoami(&self) -> Option<UserIdentity> {
        self.session().identity()
    }

    fn session(&self) -> &Session {
        self.client.session()
    }
}

fn session_failure(err: SessionError) -> FetchError {
    tracing::error!("Session storage failure: {}", err);
    FetchError::unknown(err.to_string())
}
