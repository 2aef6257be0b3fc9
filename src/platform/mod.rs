//! Platform layer - app lifecycle events behind a capability trait
//!
//! Web hosts have no lifecycle events and use `NoopPlatform`. Mobile hosts
//! (and the CLI, which reads events from stdin) use `ChannelPlatform`.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::broadcast;

use crate::messages::LifecycleEvent;

/// Buffered events per listener before it starts lagging
const EVENT_BUFFER: usize = 32;

/// Source of lifecycle events
pub trait LifecyclePlatform: Send + Sync {
    /// Register a listener; `None` when the platform has no lifecycle events
    fn subscribe(&self) -> Option<LifecycleSubscription>;
}

/// A registered listener. Dropping it deregisters.
pub struct LifecycleSubscription {
    rx: broadcast::Receiver<LifecycleEvent>,
    listeners: Arc<AtomicUsize>,
}

impl LifecycleSubscription {
    /// Next event, or `None` once the platform is gone
    pub async fn recv(&mut self) -> Option<LifecycleEvent> {
        loop {
            match self.rx.recv().await {
                Ok(event) => return Some(event),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Lifecycle listener lagged, events dropped");
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}

impl Drop for LifecycleSubscription {
    fn drop(&mut self) {
        self.listeners.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Platform without lifecycle events
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopPlatform;

impl LifecyclePlatform for NoopPlatform {
    fn subscribe(&self) -> Option<LifecycleSubscription> {
        None
    }
}

/// Platform whose host pushes events through `emit`
#[derive(Debug, Clone)]
pub struct ChannelPlatform {
    tx: broadcast::Sender<LifecycleEvent>,
    listeners: Arc<AtomicUsize>,
}

impl ChannelPlatform {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(EVENT_BUFFER);
        ChannelPlatform {
            tx,
            listeners: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Deliver an event to all listeners, returns how many received it
    pub fn emit(&self, event: LifecycleEvent) -> usize {
        tracing::debug!(?event, "Lifecycle event");
        self.tx.send(event).unwrap_or(0)
    }

    /// Listeners currently registered
    pub fn listener_count(&self) -> usize {
        self.listeners.load(Ordering::SeqCst)
    }
}

impl Default for ChannelPlatform {
    fn default() -> Self {
        Self::new()
    }
}

impl LifecyclePlatform for ChannelPlatform {
    fn subscribe(&self) -> Option<LifecycleSubscription> {
        self.listeners.fetch_add(1, Ordering::SeqCst);
        Some(LifecycleSubscription {
            rx: self.tx.subscribe(),
            listeners: self.listeners.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_noop_has_no_listeners() {
        assert!(NoopPlatform.subscribe().is_none());
    }

    #[test]
    fn test_drop_deregisters() {
        let platform = ChannelPlatform::new();
        let first = platform.subscribe().unwrap();
        let second = platform.subscribe().unwrap();
        assert_eq!(platform.listener_count(), 2);
        drop(first);
        assert_eq!(platform.listener_count(), 1);
        drop(second);
        assert_eq!(platform.listener_count(), 0);
    }

    #[tokio::test]
    async fn test_emit_reaches_subscriber() {
        let platform = ChannelPlatform::new();
        assert_eq!(platform.emit(LifecycleEvent::Resumed { url: None }), 0);

        let mut sub = platform.subscribe().unwrap();
        let delivered = platform.emit(LifecycleEvent::UrlOpened {
            url: "surebank://payment".into(),
        });
        assert_eq!(delivered, 1);
        assert_eq!(
            sub.recv().await,
            Some(LifecycleEvent::UrlOpened { url: "surebank://payment".into() })
        );
    }
}
