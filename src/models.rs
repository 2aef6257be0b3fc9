use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Payment status as reported by the backend payment service
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PaymentState {
    #[default]
    Pending,
    Success,
    Failed,
    Abandoned,
    /// Anything the server sends that we do not know about
    #[serde(other)]
    Unknown,
}

impl PaymentState {
    pub fn as_str(&self) -> &str {
        match self {
            PaymentState::Pending => "pending",
            PaymentState::Success => "success",
            PaymentState::Failed => "failed",
            PaymentState::Abandoned => "abandoned",
            PaymentState::Unknown => "unknown",
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, PaymentState::Success)
    }

    /// Failed and abandoned both end the watch with an error
    pub fn is_failure(&self) -> bool {
        matches!(self, PaymentState::Failed | PaymentState::Abandoned)
    }

    pub fn is_terminal(&self) -> bool {
        self.is_success() || self.is_failure()
    }
}

/// Status of one payment attempt
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StatusReport {
    /// Gateway reference; filled from the request when the server omits it
    #[serde(default)]
    pub reference: String,
    pub status: PaymentState,
    /// Amount in minor units (kobo)
    #[serde(default)]
    pub amount: Option<i64>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub gateway_response: Option<String>,
    /// Payment channel, e.g. `card` or `bank_transfer`
    #[serde(default)]
    pub channel: Option<String>,
    #[serde(default)]
    pub paid_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl StatusReport {
    pub fn new(reference: impl Into<String>, status: PaymentState) -> Self {
        StatusReport {
            reference: reference.into(),
            status,
            amount: None,
            currency: None,
            gateway_response: None,
            channel: None,
            paid_at: None,
            created_at: None,
        }
    }

    /// Report built locally when a deep link carries the failure, no server round trip
    pub fn synthesized_failure(
        reference: impl Into<String>,
        status: PaymentState,
        message: Option<String>,
    ) -> Self {
        let mut report = StatusReport::new(reference, status);
        let message = message
            .unwrap_or_else(|| format!("Payment {} (reported by deep link)", status.as_str()));
        report.gateway_response = Some(message);
        report.created_at = Some(Utc::now());
        report
    }
}

/// Authentication applied to status requests
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AuthType {
    #[default]
    None,
    Bearer(String),
    Basic {
        username: String,
        password: String,
    },
}
