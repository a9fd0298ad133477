use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;

use crate::session::{Session, SessionEvent};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Route {
    Login,
    Dashboard,
    Organizations,
    Users,
    Subscriptions,
    Products,
    Domains,
    AuditLog,
}

impl Route {
    /// Every route except the login screen needs a session
    pub fn requires_auth(&self) -> bool {
        !matches!(self, Route::Login)
    }
}

/// Current route of the console, observable by whoever renders it
#[derive(Clone)]
pub struct Navigator {
    current: Arc<watch::Sender<Route>>,
}

impl Navigator {
    pub fn new(initial: Route) -> Self {
        let (tx, _) = watch::channel(initial);
        Self { current: Arc::new(tx) }
    }

    /// Start on the login screen unless a usable credential is already stored
    pub fn for_session(session: &Session) -> Self {
        match session.credential() {
            Some(_) => Self::new(Route::Dashboard),
            None => Self::new(Route::Login),
        }
    }

    pub fn current(&self) -> Route {
        *self.current.borrow()
    }

    pub fn navigate(&self, route: Route) {
        let previous = self.current.send_replace(route);
        if previous != route {
            tracing::debug!("Navigate {:?} -> {:?}", previous, route);
        }
    }

    pub fn watch(&self) -> watch::Receiver<Route> {
        self.current.subscribe()
    }

    /// Redirect on session changes: any logout lands on the login screen,
    /// a login from the login screen lands on the dashboard.
    pub fn follow(&self, session: &Session) -> JoinHandle<()> {
        let mut events = session.subscribe();
        let navigator = self.clone();
        tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(SessionEvent::LoggedOut { reason }) => {
                        if navigator.current().requires_auth() {
                            tracing::info!("Logged out ({:?}), redirecting to login", reason);
                            navigator.navigate(Route::Login);
                        }
                    }
                    Ok(SessionEvent::LoggedIn { .. }) => {
                        if navigator.current() == Route::Login {
                            navigator.navigate(Route::Dashboard);
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!("Navigator skipped {} session events", skipped);
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        })
    }
}

impl std::fmt::Debug for Navigator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Navigator").field("current", &self.current()).finish()
    }
}
