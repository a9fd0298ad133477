// Process-wide authentication state: persisted credential + login/logout broadcast

pub mod credential;
pub mod events;
pub mod storage;

pub use credential::Credential;
pub use events::{LogoutReason, SessionEvent};
pub use storage::{FileStorage, MemoryStorage, SessionStorage};

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::broadcast;

use crate::config::ConsoleConfig;
use storage::keys;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Session storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Session storage is corrupt: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("HOME environment variable not set")]
    NoHome,
}

/// Minimal identity kept next to the credential
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserIdentity {
    #[serde(deserialize_with = "crate::models::de::id")]
    pub id: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
}

/// Cloneable handle on the single credential store of the process.
///
/// Screens only read the credential and react to [`SessionEvent`]s; writes go
/// through [`Session::establish`] (login) and [`Session::logout`].
#[derive(Clone)]
pub struct Session {
    inner: Arc<SessionInner>,
}

struct SessionInner {
    storage: Box<dyn SessionStorage>,
    events: broadcast::Sender<SessionEvent>,
}

impl Session {
    const EVENT_CAPACITY: usize = 32;

    pub fn new(storage: impl SessionStorage + 'static) -> Self {
        let (events, _) = broadcast::channel(Self::EVENT_CAPACITY);
        Self {
            inner: Arc::new(SessionInner { storage: Box::new(storage), events }),
        }
    }

    pub fn in_memory() -> Self {
        Self::new(MemoryStorage::new())
    }

    /// File-backed session in the configured console directory
    pub fn from_config(config: &ConsoleConfig) -> Result<Self, SessionError> {
        let dir = FileStorage::default_dir(config.session.storage_dir.as_deref())?;
        Ok(Self::new(FileStorage::in_dir(dir)?))
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.inner.events.subscribe()
    }

    /// Usable credential, if any. Storage failures read as "no credential".
    pub fn credential(&self) -> Option<Credential> {
        let entries = match self.inner.storage.load() {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!("Failed to read session storage: {}", e);
                return None;
            }
        };
        let token = entries.get(keys::TOKEN)?;
        Credential::parse(token, entries.get(keys::TOKEN_TYPE).map(String::as_str))
    }

    /// Like [`Session::credential`], but an unusable stored token (sentinel or
    /// expired) is cleared with a `CredentialInvalid` logout.
    pub fn require_credential(&self) -> Option<Credential> {
        let credential = self.credential();
        if credential.is_none() && self.has_stored_token() {
            if let Err(e) = self.logout(LogoutReason::CredentialInvalid) {
                tracing::error!("Failed to clear unusable credential: {}", e);
            }
        }
        credential
    }

    fn has_stored_token(&self) -> bool {
        self.inner
            .storage
            .load()
            .map(|entries| entries.contains_key(keys::TOKEN))
            .unwrap_or(false)
    }

    pub fn identity(&self) -> Option<UserIdentity> {
        let entries = self.inner.storage.load().ok()?;
        Some(UserIdentity {
            id: entries.get(keys::USER_ID)?.clone(),
            email: entries.get(keys::USER_EMAIL).cloned().unwrap_or_default(),
            name: entries.get(keys::USER_NAME).cloned(),
            role: entries.get(keys::USER_ROLE).cloned(),
        })
    }

    /// Persist a fresh login and notify every subscriber
    pub fn establish(
        &self,
        token: &str,
        token_type: &str,
        user: Option<UserIdentity>,
    ) -> Result<(), SessionError> {
        let mut entries = BTreeMap::new();
        entries.insert(keys::TOKEN.to_string(), token.to_string());
        entries.insert(keys::TOKEN_TYPE.to_string(), token_type.to_string());
        entries.insert(keys::LOGGED_IN_AT.to_string(), Utc::now().to_rfc3339());
        if let Some(user) = &user {
            entries.insert(keys::USER_ID.to_string(), user.id.clone());
            entries.insert(keys::USER_EMAIL.to_string(), user.email.clone());
            if let Some(name) = &user.name {
                entries.insert(keys::USER_NAME.to_string(), name.clone());
            }
            if let Some(role) = &user.role {
                entries.insert(keys::USER_ROLE.to_string(), role.clone());
            }
        }
        self.inner.storage.replace(entries)?;

        tracing::info!(
            "Session established for {}",
            user.as_ref().map(|u| u.email.as_str()).unwrap_or("<unknown user>")
        );
        self.broadcast(SessionEvent::LoggedIn { user });
        Ok(())
    }

    /// Clear every persisted key at once.
    ///
    /// Only the call that actually removed a stored token broadcasts, so a burst
    /// of 401s from several screens produces a single `LoggedOut` event.
    pub fn logout(&self, reason: LogoutReason) -> Result<bool, SessionError> {
        let had_token = self.inner.storage.clear()?;

        if had_token {
            tracing::info!("Session cleared ({:?})", reason);
            self.broadcast(SessionEvent::LoggedOut { reason });
        }
        Ok(had_token)
    }

    fn broadcast(&self, event: SessionEvent) {
        // no receivers is fine: nothing is mounted
        let _ = self.inner.events.send(event);
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("receivers", &self.inner.events.receiver_count())
            .finish()
    }
}
