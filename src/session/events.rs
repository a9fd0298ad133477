use serde::{Deserialize, Serialize};

use super::UserIdentity;

/// Broadcast to every mounted screen whenever the credential appears or disappears
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SessionEvent {
    LoggedIn { user: Option<UserIdentity> },
    LoggedOut { reason: LogoutReason },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogoutReason {
    /// Explicit logout
    UserRequested,
    /// The server answered 401
    Unauthorized,
    /// The stored token was unusable (sentinel value or expired)
    CredentialInvalid,
}

impl SessionEvent {
    /// Screens reset on any logout, whatever the reason
    pub fn is_logout(&self) -> bool {
        matches!(self, SessionEvent::LoggedOut { .. })
    }
}
