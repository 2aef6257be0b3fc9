//! # SureBank Watch
//!
//! Payment confirmation for the SureBank savings client. After the user is
//! sent to the external payment gateway, a `PaymentWatcher` works out when the
//! payment has resolved, without a server push channel.
//!
//! ## Features
//! - Status polling with an attempt budget and a wall-clock deadline
//! - Out-of-band checks on app resume and deep-link open
//! - Deep-link parsing, routing and failure short-circuit
//! - Exactly one of success / error / timeout per watch session
//!
//! ## Architecture
//! Actor-based with channels:
//! - Platform Layer - lifecycle events behind a capability trait
//! - Network Layer - status lookups against the REST API
//! - Watcher Layer - one spawned session task per watched reference

pub mod constants;
pub mod models;
pub mod error;
pub mod config;
pub mod deeplink;
pub mod messages;
pub mod platform;
pub mod network;
pub mod watcher;

// Re-export commonly used types
pub use models::{PaymentState, StatusReport, AuthType};
pub use error::{WatchError, Result};
pub use config::{Settings, WatchConfig, WatchOverrides};
pub use deeplink::{DeepLink, LinkClassifier, LinkSignal, callback_url};
pub use messages::{LifecycleEvent, Outcome, TimeoutInfo, TimeoutReason};
pub use platform::{LifecyclePlatform, ChannelPlatform, NoopPlatform};
pub use network::{HttpStatusSource, StatusSource};
pub use watcher::{PaymentWatcher, WatchCallbacks, WatchState};
