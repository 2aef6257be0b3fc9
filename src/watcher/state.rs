//! Watch state - pure data shared between the watcher handle and its session task

use serde::Serialize;

use crate::messages::Outcome;

/// Lifecycle of one watch session
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WatchState {
    #[default]
    Idle,
    Polling,
    Succeeded,
    Failed,
    TimedOut,
}

impl WatchState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, WatchState::Succeeded | WatchState::Failed | WatchState::TimedOut)
    }
}

impl From<&Outcome> for WatchState {
    fn from(outcome: &Outcome) -> Self {
        match outcome {
            Outcome::Succeeded(_) => WatchState::Succeeded,
            Outcome::Failed(_) => WatchState::Failed,
            Outcome::TimedOut(_) => WatchState::TimedOut,
        }
    }
}

/// Published by the session task after every check and on exit
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Progress {
    pub state: WatchState,
    pub attempts: u32,
}

impl Progress {
    pub fn polling() -> Self {
        Progress {
            state: WatchState::Polling,
            attempts: 0,
        }
    }
}
