use serde::Serialize;
use tokio_util::sync::CancellationToken;

/// Request lifecycle of one screen as seen by the rendering layer.
///
/// There is no `Cancelled` phase: a cancelled request leaves whatever the
/// superseding request sets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FetchPhase {
    Idle,
    Loading,
    Success,
    Error,
}

/// Ownership handle of one in-flight request
#[derive(Debug, Clone)]
pub struct RequestHandle {
    id: u64,
    token: CancellationToken,
}

impl RequestHandle {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }
}

/// Current page of records and request bookkeeping for one entity screen.
///
/// Invariant: `loading` implies an in-flight handle. Installing a new handle
/// cancels the previous one, so at most one request per screen can commit.
#[derive(Debug)]
pub struct EntityState<T> {
    data: Vec<T>,
    loading: bool,
    error: Option<String>,
    in_flight: Option<RequestHandle>,
    phase: FetchPhase,
    next_id: u64,
}

impl<T> Default for EntityState<T> {
    fn default() -> Self {
        Self {
            data: Vec::new(),
            loading: false,
            error: None,
            in_flight: None,
            phase: FetchPhase::Idle,
            next_id: 0,
        }
    }
}

impl<T> EntityState<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn data(&self) -> &[T] {
        &self.data
    }

    pub fn loading(&self) -> bool {
        self.loading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn phase(&self) -> FetchPhase {
        self.phase
    }

    pub fn in_flight(&self) -> Option<&RequestHandle> {
        self.in_flight.as_ref()
    }

    /// Cancel the previous request (if any) and install a fresh handle
    pub fn set_loading(&mut self) -> RequestHandle {
        if let Some(previous) = self.in_flight.take() {
            previous.token.cancel();
            tracing::trace!("Request #{} superseded", previous.id);
        }
        self.next_id += 1;
        let handle = RequestHandle { id: self.next_id, token: CancellationToken::new() };
        self.in_flight = Some(handle.clone());
        self.loading = true;
        self.error = None;
        self.phase = FetchPhase::Loading;
        handle
    }

    /// True when `handle` is still the live request of this screen
    pub fn owns(&self, handle: &RequestHandle) -> bool {
        !handle.is_cancelled() && self.in_flight.as_ref().is_some_and(|h| h.id == handle.id)
    }

    /// Commit records. A no-op returning false for a request that no longer owns the state.
    pub fn set_success(&mut self, handle: &RequestHandle, data: Vec<T>) -> bool {
        if !self.owns(handle) {
            return false;
        }
        self.data = data;
        self.error = None;
        self.finish(FetchPhase::Success);
        true
    }

    /// Commit an error message; previous records stay in place
    pub fn set_error(&mut self, handle: &RequestHandle, message: impl Into<String>) -> bool {
        if !self.owns(handle) {
            return false;
        }
        self.error = Some(message.into());
        self.finish(FetchPhase::Error);
        true
    }

    /// Cancel whatever is in flight without committing anything
    pub fn cancel_in_flight(&mut self) -> bool {
        match self.in_flight.take() {
            Some(handle) => {
                handle.token.cancel();
                self.loading = false;
                if self.phase == FetchPhase::Loading {
                    self.phase = FetchPhase::Idle;
                }
                true
            }
            None => false,
        }
    }

    /// Back to a freshly mounted screen
    pub fn reset(&mut self) {
        self.cancel_in_flight();
        self.data.clear();
        self.error = None;
        self.phase = FetchPhase::Idle;
    }

    fn finish(&mut self, phase: FetchPhase) {
        self.loading = false;
        self.in_flight = None;
        self.phase = phase;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loading_installs_handle_and_clears_error() {
        let mut state: EntityState<u32> = EntityState::new();
        let first = state.set_loading();
        assert!(state.set_error(&first, "boom"));
        assert_eq!(state.error(), Some("boom"));

        let second = state.set_loading();
        assert!(state.loading());
        assert!(state.in_flight().is_some());
        assert_eq!(state.error(), None);
        assert_eq!(state.phase(), FetchPhase::Loading);
        assert!(state.owns(&second));
    }

    #[test]
    fn superseded_handle_cannot_commit() {
        let mut state = EntityState::new();
        let stale = state.set_loading();
        let fresh = state.set_loading();

        assert!(stale.is_cancelled());
        assert!(!state.set_success(&stale, vec![1, 2, 3]));
        assert!(!state.set_error(&stale, "late failure"));
        // the superseding request is still loading
        assert!(state.loading());
        assert_eq!(state.error(), None);

        assert!(state.set_success(&fresh, vec![7]));
        assert_eq!(state.data(), &[7]);
        assert!(!state.loading());
        assert!(state.in_flight().is_none());
    }

    #[test]
    fn error_keeps_previous_records() {
        let mut state = EntityState::new();
        let h = state.set_loading();
        state.set_success(&h, vec!["a"]);
        let h = state.set_loading();
        state.set_error(&h, "nope");
        assert_eq!(state.data(), &["a"]);
        assert_eq!(state.phase(), FetchPhase::Error);
    }

    #[test]
    fn reset_cancels_and_clears() {
        let mut state: EntityState<u32> = EntityState::new();
        let h = state.set_loading();
        state.reset();
        assert!(h.is_cancelled());
        assert!(!state.loading());
        assert!(state.data().is_empty());
        assert_eq!(state.phase(), FetchPhase::Idle);
    }
}
