//! Message types flowing between the platform, network and watcher layers.

pub mod lifecycle;
pub mod outcome;

pub use lifecycle::LifecycleEvent;
pub use outcome::{CheckTrigger, Outcome, TimeoutInfo, TimeoutReason};
