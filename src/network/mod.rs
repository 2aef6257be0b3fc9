//! Network layer - payment status lookups
//!
//! The watcher only sees the `StatusSource` trait; `HttpStatusSource` is the
//! reqwest implementation talking to the backend payment service.

pub mod client;

pub use client::{create_client, HttpStatusSource, StatusSource};
