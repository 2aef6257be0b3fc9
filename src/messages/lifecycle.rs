//! Lifecycle messages - sent by the host runtime to every active listener

/// Signal from the host runtime
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LifecycleEvent {
    /// App came back to the foreground, with its launch URL if known
    Resumed { url: Option<String> },
    /// App was opened through a deep link
    UrlOpened { url: String },
}

impl LifecycleEvent {
    /// URL carried by the event, if any
    pub fn url(&self) -> Option<&str> {
        match self {
            LifecycleEvent::Resumed { url } => url.as_deref(),
            LifecycleEvent::UrlOpened { url } => Some(url),
        }
    }

    /// Parse one line of host input: `resume` or a URL
    pub fn from_line(line: &str) -> Option<LifecycleEvent> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }
        if line.eq_ignore_ascii_case("resume") {
            return Some(LifecycleEvent::Resumed { url: None });
        }
        Some(LifecycleEvent::UrlOpened { url: line.to_string() })
    }
}
