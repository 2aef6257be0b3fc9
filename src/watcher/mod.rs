//! Watcher layer - payment confirmation after a gateway redirect
//!
//! `PaymentWatcher` is the handle a screen holds. Each `start` spawns a fresh
//! session task owning the poll interval, the deadline and the lifecycle
//! listener; exactly one of the three callbacks fires when it ends.

pub mod actor;
pub mod callbacks;
pub mod state;

pub use callbacks::WatchCallbacks;
pub use state::{Progress, WatchState};

use std::sync::Arc;
use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;

use crate::config::{WatchConfig, WatchOverrides};
use crate::deeplink::LinkClassifier;
use crate::messages::Outcome;
use crate::network::StatusSource;
use crate::platform::LifecyclePlatform;
use actor::WatchSession;
use callbacks::CallbackSlot;

/// Watches one payment reference at a time
pub struct PaymentWatcher {
    source: Arc<dyn StatusSource>,
    platform: Arc<dyn LifecyclePlatform>,
    classifier: LinkClassifier,
    defaults: WatchConfig,
    progress: Arc<watch::Sender<Progress>>,
    reference: Option<String>,
    callbacks: Option<CallbackSlot>,
    cancel_tx: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl PaymentWatcher {
    pub fn new(
        source: Arc<dyn StatusSource>,
        platform: Arc<dyn LifecyclePlatform>,
        classifier: LinkClassifier,
    ) -> Self {
        PaymentWatcher {
            source,
            platform,
            classifier,
            defaults: WatchConfig::default(),
            progress: Arc::new(watch::channel(Progress::default()).0),
            reference: None,
            callbacks: None,
            cancel_tx: None,
            task: None,
        }
    }

    /// Limits used when `start` gets no overrides
    pub fn with_defaults(mut self, defaults: WatchConfig) -> Self {
        self.defaults = defaults;
        self
    }

    /// Start watching `reference`, stopping any session already running.
    ///
    /// Must be called from within a tokio runtime. The lifecycle listener is
    /// registered before this returns.
    pub fn start(
        &mut self,
        reference: impl Into<String>,
        callbacks: WatchCallbacks,
        overrides: Option<WatchOverrides>,
    ) {
        self.stop();

        let reference = reference.into();
        let config = self.defaults.with_overrides(overrides).normalized();
        let progress = Arc::new(watch::channel(Progress::polling()).0);
        let subscription = self.platform.subscribe();
        let (cancel_tx, cancel_rx) = oneshot::channel();

        tracing::info!(
            reference = %reference,
            max_attempts = config.max_attempts,
            interval_ms = config.poll_interval.as_millis() as u64,
            timeout_ms = config.timeout.as_millis() as u64,
            lifecycle = subscription.is_some(),
            "Watching payment"
        );

        let session = WatchSession {
            reference: reference.clone(),
            config,
            source: self.source.clone(),
            classifier: self.classifier.clone(),
            progress: progress.clone(),
        };

        let callbacks = CallbackSlot::new(callbacks);
        self.task = Some(tokio::spawn(session.run(subscription, cancel_rx, callbacks.clone())));
        self.callbacks = Some(callbacks);
        self.cancel_tx = Some(cancel_tx);
        self.progress = progress;
        self.reference = Some(reference);
    }

    /// Stop the current session. Safe to call any number of times.
    ///
    /// No callback runs once this returns. If the session is delivering its
    /// outcome at that moment, this waits for the delivery and keeps its state.
    pub fn stop(&mut self) {
        let Some(cancel_tx) = self.cancel_tx.take() else {
            return;
        };
        let _ = cancel_tx.send(());
        if let Some(task) = &self.task {
            task.abort();
        }
        let revoked = self.callbacks.take().is_some_and(|slot| slot.revoke());
        if revoked {
            self.progress.send_modify(|p| p.state = WatchState::Idle);
        }
        tracing::debug!(reference = ?self.reference, "Stop requested");
    }

    /// Wait for the session task to end (outcome delivered or stopped)
    pub async fn finished(&mut self) {
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }

    /// Start and wait for the outcome; `None` if the session was stopped
    pub async fn watch(
        &mut self,
        reference: impl Into<String>,
        overrides: Option<WatchOverrides>,
    ) -> Option<Outcome> {
        let (callbacks, mut rx) = WatchCallbacks::channel();
        self.start(reference, callbacks, overrides);
        rx.recv().await
    }

    pub fn state(&self) -> WatchState {
        self.progress.borrow().state
    }

    /// Status checks issued by the current session
    pub fn attempts(&self) -> u32 {
        self.progress.borrow().attempts
    }

    pub fn is_active(&self) -> bool {
        self.state() == WatchState::Polling
    }

    /// Reference of the current or last session
    pub fn reference(&self) -> Option<&str> {
        self.reference.as_deref()
    }
}

impl Drop for PaymentWatcher {
    fn drop(&mut self) {
        self.stop();
    }
}
