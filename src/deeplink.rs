//! Deep links - parse, build and classify `surebank://` URLs
//!
//! The payment gateway redirects to a custom-scheme URL carrying an action,
//! a target route and the payment reference as query parameters.

use regex::Regex;
use serde::Serialize;
use url::Url;

use crate::config::DeepLinkSettings;
use crate::constants::{ACTION_OPEN_PACKAGE, ACTION_PAYMENT_CALLBACK};
use crate::error::{Result, WatchError};
use crate::models::{PaymentState, StatusReport};

/// A parsed deep link
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DeepLink {
    pub scheme: String,
    pub host: Option<String>,
    pub action: Option<String>,
    pub route: Option<String>,
    pub reference: Option<String>,
    pub status: Option<String>,
    pub message: Option<String>,
}

impl DeepLink {
    /// Parse a URL, which must use `scheme`
    pub fn parse(input: &str, scheme: &str) -> Result<DeepLink> {
        let url = Url::parse(input.trim())?;
        if !url.scheme().eq_ignore_ascii_case(scheme) {
            return Err(WatchError::DeepLink(format!(
                "expected {}:// link, got {}://",
                scheme,
                url.scheme()
            )));
        }

        let mut link = DeepLink {
            scheme: url.scheme().to_string(),
            host: url.host_str().filter(|h| !h.is_empty()).map(str::to_string),
            action: None,
            route: None,
            reference: None,
            status: None,
            message: None,
        };

        for (key, value) in url.query_pairs() {
            let value = value.trim();
            if value.is_empty() {
                continue;
            }
            let slot = match &*key {
                "action" => &mut link.action,
                "route" => &mut link.route,
                // gateways send their own name for the reference
                "reference" | "trxref" => &mut link.reference,
                "status" => &mut link.status,
                "message" => &mut link.message,
                _ => continue,
            };
            if slot.is_none() {
                *slot = Some(value.to_string());
            }
        }

        Ok(link)
    }

    /// Link the gateway should redirect to after checkout
    pub fn payment_callback(settings: &DeepLinkSettings, reference: &str) -> DeepLink {
        DeepLink {
            scheme: settings.scheme.clone(),
            host: Some(settings.host.clone()),
            action: Some(ACTION_PAYMENT_CALLBACK.to_string()),
            route: Some(format!("/payments/{}", reference)),
            reference: Some(reference.to_string()),
            status: None,
            message: None,
        }
    }

    pub fn to_url(&self) -> Result<Url> {
        let base = match &self.host {
            Some(host) => format!("{}://{}", self.scheme, host),
            None => format!("{}://", self.scheme),
        };
        let mut url = Url::parse(&base)?;
        {
            let mut query = url.query_pairs_mut();
            let fields = [
                ("action", &self.action),
                ("route", &self.route),
                ("reference", &self.reference),
                ("status", &self.status),
                ("message", &self.message),
            ];
            for (key, value) in fields {
                if let Some(value) = value {
                    query.append_pair(key, value);
                }
            }
        }
        Ok(url)
    }

    /// In-app route this link should open
    pub fn route(&self) -> String {
        if let Some(route) = self.route.as_deref().filter(|r| r.starts_with('/')) {
            return route.to_string();
        }
        match (self.action.as_deref(), self.reference.as_deref()) {
            (Some(ACTION_PAYMENT_CALLBACK), Some(reference)) => format!("/payments/{}", reference),
            (Some(ACTION_PAYMENT_CALLBACK), None) => "/payments".to_string(),
            (Some(ACTION_OPEN_PACKAGE), _) => "/packages".to_string(),
            _ => "/".to_string(),
        }
    }
}

/// Redirect URL handed to the payment gateway
pub fn callback_url(settings: &DeepLinkSettings, reference: &str) -> Result<String> {
    Ok(DeepLink::payment_callback(settings, reference).to_url()?.to_string())
}

/// How a lifecycle URL affects the watched payment
#[derive(Clone, Debug, PartialEq)]
pub enum LinkSignal {
    /// Check status now instead of waiting for the next poll
    CheckNow,
    /// Gateway reported a terminal failure in the URL itself
    Fail(StatusReport),
    /// Nothing to do with this payment
    Ignore,
}

/// Reads gateway redirect URLs using configured markers
#[derive(Clone, Debug)]
pub struct LinkClassifier {
    success: Option<Regex>,
    error: Option<Regex>,
    cancel: Option<Regex>,
}

impl LinkClassifier {
    pub fn new(settings: &DeepLinkSettings) -> Result<Self> {
        Ok(LinkClassifier {
            success: marker_regex(&settings.success_markers)?,
            error: marker_regex(&settings.error_markers)?,
            cancel: marker_regex(&settings.cancel_markers)?,
        })
    }

    /// Classify a URL against the tracked reference. Failure markers win,
    /// unless the link names a different payment in `reference`/`trxref`.
    pub fn classify(&self, url: &str, reference: &str) -> LinkSignal {
        let parsed = Url::parse(url.trim()).ok();
        let haystack = haystack(url, parsed.as_ref());
        let hit = |re: &Option<Regex>| re.as_ref().is_some_and(|re| re.is_match(&haystack));

        if hit(&self.cancel) || hit(&self.error) {
            let linked = query_param(parsed.as_ref(), &["reference", "trxref"]);
            if linked.is_some_and(|linked| !reference.is_empty() && linked != reference) {
                return LinkSignal::Ignore;
            }
            let state = if hit(&self.error) {
                PaymentState::Failed
            } else {
                PaymentState::Abandoned
            };
            let message = query_param(parsed.as_ref(), &["message"]);
            let report = StatusReport::synthesized_failure(reference, state, message);
            return LinkSignal::Fail(report);
        }

        if hit(&self.success) || (!reference.is_empty() && haystack.contains(reference)) {
            return LinkSignal::CheckNow;
        }

        LinkSignal::Ignore
    }
}

impl Default for LinkClassifier {
    fn default() -> Self {
        // built-in markers are plain words, escaping makes them valid patterns
        LinkClassifier::new(&DeepLinkSettings::default())
            .unwrap_or(LinkClassifier { success: None, error: None, cancel: None })
    }
}

fn marker_regex(markers: &[String]) -> Result<Option<Regex>> {
    let words: Vec<String> = markers
        .iter()
        .map(|m| m.trim())
        .filter(|m| !m.is_empty())
        .map(regex::escape)
        .collect();
    if words.is_empty() {
        return Ok(None);
    }
    let pattern = format!(r"(?i)\b(?:{})\b", words.join("|"));
    Regex::new(&pattern)
        .map(Some)
        .map_err(|e| WatchError::Config(format!("invalid marker: {}", e)))
}

/// First non-empty value of any of `keys`
fn query_param(url: Option<&Url>, keys: &[&str]) -> Option<String> {
    url?.query_pairs()
        .find(|(k, v)| keys.contains(&&**k) && !v.trim().is_empty())
        .map(|(_, v)| v.trim().to_string())
}

/// Raw URL plus its decoded path and query values
fn haystack(url: &str, parsed: Option<&Url>) -> String {
    let mut text = url.trim().to_string();
    if let Some(parsed) = parsed {
        text.push(' ');
        text.push_str(parsed.path());
        for (_, value) in parsed.query_pairs() {
            text.push(' ');
            text.push_str(&value);
        }
    }
    text
}
