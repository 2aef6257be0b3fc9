//! Outcome messages - the single result a watch session reports

use serde::Serialize;
use std::time::Duration;

use crate::models::StatusReport;

/// What caused a status check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckTrigger {
    Initial,
    Interval,
    Resumed,
    UrlOpened,
}

impl CheckTrigger {
    pub fn as_str(&self) -> &str {
        match self {
            CheckTrigger::Initial => "initial",
            CheckTrigger::Interval => "interval",
            CheckTrigger::Resumed => "resumed",
            CheckTrigger::UrlOpened => "url_opened",
        }
    }
}

/// Which limit ended the session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeoutReason {
    AttemptsExhausted,
    DeadlineElapsed,
}

/// Passed to `on_timeout`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimeoutInfo {
    pub reference: String,
    pub attempts: u32,
    #[serde(rename = "elapsed_ms", serialize_with = "serialize_millis")]
    pub elapsed: Duration,
    pub reason: TimeoutReason,
}

fn serialize_millis<S: serde::Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_u64(d.as_millis() as u64)
}

/// Terminal result of a watch session
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Outcome {
    Succeeded(StatusReport),
    Failed(StatusReport),
    TimedOut(TimeoutInfo),
}

impl Outcome {
    pub fn reference(&self) -> &str {
        match self {
            Outcome::Succeeded(report) | Outcome::Failed(report) => &report.reference,
            Outcome::TimedOut(info) => &info.reference,
        }
    }
}
