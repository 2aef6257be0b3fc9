//! Outcome callbacks - exactly one of the three runs per session

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::mpsc;

use crate::messages::{Outcome, TimeoutInfo};
use crate::models::StatusReport;

type Callback<T> = Box<dyn FnOnce(T) + Send + 'static>;

/// The three ways a watch session can end
pub struct WatchCallbacks {
    on_success: Callback<StatusReport>,
    on_error: Callback<StatusReport>,
    on_timeout: Callback<TimeoutInfo>,
}

impl WatchCallbacks {
    pub fn new(
        on_success: impl FnOnce(StatusReport) + Send + 'static,
        on_error: impl FnOnce(StatusReport) + Send + 'static,
        on_timeout: impl FnOnce(TimeoutInfo) + Send + 'static,
    ) -> Self {
        WatchCallbacks {
            on_success: Box::new(on_success),
            on_error: Box::new(on_error),
            on_timeout: Box::new(on_timeout),
        }
    }

    /// Callbacks that forward the outcome into a channel.
    ///
    /// The receiver yields the outcome once, then `None`. It yields only `None`
    /// if the session was stopped before reaching an outcome.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<Outcome>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let (error_tx, timeout_tx) = (tx.clone(), tx.clone());
        let callbacks = WatchCallbacks::new(
            move |report| {
                let _ = tx.send(Outcome::Succeeded(report));
            },
            move |report| {
                let _ = error_tx.send(Outcome::Failed(report));
            },
            move |info| {
                let _ = timeout_tx.send(Outcome::TimedOut(info));
            },
        );
        (callbacks, rx)
    }

    /// Consumes the callbacks, so a second delivery cannot compile
    fn deliver(self, outcome: Outcome) {
        match outcome {
            Outcome::Succeeded(report) => (self.on_success)(report),
            Outcome::Failed(report) => (self.on_error)(report),
            Outcome::TimedOut(info) => (self.on_timeout)(info),
        }
    }
}

/// Callbacks shared by the handle and its session. Whichever side takes them
/// first decides: the session delivers them, or `stop` revokes them.
#[derive(Clone)]
pub(crate) struct CallbackSlot(Arc<Mutex<Option<WatchCallbacks>>>);

impl CallbackSlot {
    pub(crate) fn new(callbacks: WatchCallbacks) -> Self {
        CallbackSlot(Arc::new(Mutex::new(Some(callbacks))))
    }

    /// Run `publish` then the matching callback, both under the claim.
    /// Returns false if the callbacks were already revoked.
    pub(crate) fn deliver(&self, outcome: Outcome, publish: impl FnOnce()) -> bool {
        let mut slot = self.lock();
        let Some(callbacks) = slot.take() else {
            return false;
        };
        publish();
        callbacks.deliver(outcome);
        true
    }

    /// Take the callbacks without running them. Blocks while a delivery is
    /// in progress; returns false if one already happened.
    pub(crate) fn revoke(&self) -> bool {
        let revoked = self.lock().take();
        revoked.is_some()
    }

    fn lock(&self) -> MutexGuard<'_, Option<WatchCallbacks>> {
        // a panicking callback poisons the lock; the slot is still usable
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for WatchCallbacks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatchCallbacks").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PaymentState;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counted(calls: &Arc<AtomicUsize>) -> WatchCallbacks {
        let (s, e, t) = (calls.clone(), calls.clone(), calls.clone());
        WatchCallbacks::new(
            move |_| {
                s.fetch_add(1, Ordering::SeqCst);
            },
            move |_| {
                e.fetch_add(1, Ordering::SeqCst);
            },
            move |_| {
                t.fetch_add(1, Ordering::SeqCst);
            },
        )
    }

    #[test]
    fn test_revoked_slot_never_delivers() {
        let calls = Arc::new(AtomicUsize::new(0));
        let slot = CallbackSlot::new(counted(&calls));
        let session_side = slot.clone();

        assert!(slot.revoke());
        let report = StatusReport::new("ref_1", PaymentState::Success);
        let delivered = session_side.deliver(Outcome::Succeeded(report), || {
            panic!("nothing is published after a revoke")
        });
        assert!(!delivered);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_delivered_slot_cannot_be_revoked() {
        let calls = Arc::new(AtomicUsize::new(0));
        let slot = CallbackSlot::new(counted(&calls));
        let published = AtomicUsize::new(0);

        let report = StatusReport::new("ref_1", PaymentState::Failed);
        assert!(slot.deliver(Outcome::Failed(report), || {
            published.fetch_add(1, Ordering::SeqCst);
        }));
        assert!(!slot.revoke());
        assert_eq!(published.load(Ordering::SeqCst), 1);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
