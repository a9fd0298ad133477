use std::future::Future;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Delays a commit until input pauses for `delay`.
///
/// Scheduling again (or cancelling) drops the pending commit. A commit that
/// already started runs to completion.
#[derive(Debug)]
pub struct SearchDebouncer {
    delay: Duration,
    pending: Option<Pending>,
}

#[derive(Debug)]
struct Pending {
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl SearchDebouncer {
    pub fn new(delay: Duration) -> Self {
        Self { delay, pending: None }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    pub fn schedule<F>(&mut self, commit: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.cancel();
        let cancel = CancellationToken::new();
        let token = cancel.clone();
        let delay = self.delay;
        let task = tokio::spawn(async move {
            tokio::select! {
                biased;
                _ = token.cancelled() => {}
                _ = tokio::time::sleep(delay) => commit.await,
            }
        });
        self.pending = Some(Pending { cancel, task });
    }

    /// Drop the pending commit; true if one was still waiting
    pub fn cancel(&mut self) -> bool {
        match self.pending.take() {
            Some(pending) => {
                let waiting = !pending.task.is_finished();
                pending.cancel.cancel();
                waiting
            }
            None => false,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending
            .as_ref()
            .is_some_and(|p| !p.cancel.is_cancelled() && !p.task.is_finished())
    }
}

impl Drop for SearchDebouncer {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tokio::sync::Mutex;

    #[tokio::test(start_paused = true)]
    async fn only_the_last_value_commits() {
        let committed = Arc::new(Mutex::new(Vec::new()));
        let mut debouncer = SearchDebouncer::new(Duration::from_millis(500));

        for value in ["a", "ab", "abc"] {
            let committed = committed.clone();
            debouncer.schedule(async move { committed.lock().await.push(value) });
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
        assert!(debouncer.is_pending());

        tokio::time::sleep(Duration::from_millis(600)).await;
        assert_eq!(*committed.lock().await, vec!["abc"]);
        assert!(!debouncer.is_pending());
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_drops_pending_commit() {
        let committed = Arc::new(Mutex::new(0));
        let mut debouncer = SearchDebouncer::new(Duration::from_millis(500));
        let c = committed.clone();
        debouncer.schedule(async move { *c.lock().await += 1 });

        assert!(debouncer.cancel());
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(*committed.lock().await, 0);
        assert!(!debouncer.cancel());
    }
}
