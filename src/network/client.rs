//! HTTP status client - queries the payment service by reference

use std::time::{Duration, Instant};
use base64::Engine;
use futures_util::future::BoxFuture;
use serde::Deserialize;
use url::Url;

use crate::config::Settings;
use crate::constants::REFERENCE_PLACEHOLDER;
use crate::error::{Result, WatchError};
use crate::models::{AuthType, StatusReport};

/// Anything that can report the status of a payment reference
pub trait StatusSource: Send + Sync {
    fn check<'a>(&'a self, reference: &'a str) -> BoxFuture<'a, Result<StatusReport>>;
}

/// Response body: either wrapped in the API envelope or a bare report
#[derive(Deserialize)]
#[serde(untagged)]
enum StatusBody {
    Envelope {
        data: StatusReport,
        #[serde(default)]
        message: Option<String>,
    },
    Bare(StatusReport),
}

/// Status source backed by the REST API
pub struct HttpStatusSource {
    client: reqwest::Client,
    base_url: String,
    status_path: String,
    auth: AuthType,
}

impl HttpStatusSource {
    pub fn new(settings: &Settings) -> Self {
        HttpStatusSource {
            client: create_client(settings.request_timeout()),
            base_url: settings.api_base_url.clone(),
            status_path: settings.status_path.clone(),
            auth: settings.auth.clone(),
        }
    }

    /// Full status URL; the reference is percent-encoded as a path segment
    pub fn status_url(&self, reference: &str) -> Result<Url> {
        let mut url = Url::parse(&self.base_url)?;
        {
            let mut segments = url.path_segments_mut().map_err(|_| {
                WatchError::Config(format!("api_base_url cannot take a path: {}", self.base_url))
            })?;
            segments.pop_if_empty();
            for segment in self.status_path.split('/').filter(|s| !s.is_empty()) {
                segments.push(&segment.replace(REFERENCE_PLACEHOLDER, reference));
            }
        }
        Ok(url)
    }

    async fn fetch(&self, reference: &str) -> Result<StatusReport> {
        let start = Instant::now();
        let url = self.status_url(reference)?;

        let mut req_builder = self
            .client
            .get(url)
            .header("Accept", "application/json");
        if let Some(value) = authorization_header(&self.auth) {
            req_builder = req_builder.header("Authorization", value);
        }

        let resp = req_builder.send().await?;
        let status = resp.status().as_u16();
        let body = resp.text().await?;
        let elapsed = start.elapsed().as_millis() as u64;

        if !(200..300).contains(&status) {
            tracing::debug!(reference, status, elapsed, "Status endpoint error");
            return Err(WatchError::Status { status, body });
        }

        let mut report = match serde_json::from_str::<StatusBody>(&body)? {
            StatusBody::Envelope { data, message } => {
                if let Some(message) = message {
                    tracing::trace!(reference, %message, "Status envelope message");
                }
                data
            }
            StatusBody::Bare(report) => report,
        };
        if report.reference.is_empty() {
            report.reference = reference.to_string();
        }

        tracing::debug!(reference, status = report.status.as_str(), elapsed, "Status fetched");
        Ok(report)
    }
}

impl StatusSource for HttpStatusSource {
    fn check<'a>(&'a self, reference: &'a str) -> BoxFuture<'a, Result<StatusReport>> {
        Box::pin(self.fetch(reference))
    }
}

/// `Authorization` header value for the configured auth
fn authorization_header(auth: &AuthType) -> Option<String> {
    match auth {
        AuthType::Bearer(token) => Some(format!("Bearer {}", token)),
        AuthType::Basic { username, password } => {
            let credentials = format!("{}:{}", username, password);
            let encoded = base64::engine::general_purpose::STANDARD.encode(credentials);
            Some(format!("Basic {}", encoded))
        }
        AuthType::None => None,
    }
}

/// Create an HTTP client with the given request timeout
pub fn create_client(timeout: Duration) -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .unwrap_or_else(|_| reqwest::Client::new())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PaymentState;
    use axum::extract::Path;
    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::get;
    use axum::{Json, Router};
    use serde_json::json;

    async fn spawn_server(app: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}/api", addr)
    }

    fn source_for(base_url: String, auth: AuthType) -> HttpStatusSource {
        let settings = Settings {
            api_base_url: base_url,
            auth,
            request_timeout_secs: 5,
            ..Settings::default()
        };
        HttpStatusSource::new(&settings)
    }

    #[test]
    fn test_status_url_encodes_reference() {
        let source = source_for("https://api.example.com/api/v1/".into(), AuthType::None);
        let url = source.status_url("ref 1/2").unwrap();
        assert_eq!(url.as_str(), "https://api.example.com/api/v1/payments/verify/ref%201%2F2");
    }

    #[test]
    fn test_basic_auth_header() {
        let auth = AuthType::Basic {
            username: "user".into(),
            password: "pass".into(),
        };
        assert_eq!(authorization_header(&auth).as_deref(), Some("Basic dXNlcjpwYXNz"));
        assert_eq!(authorization_header(&AuthType::None), None);
    }

    #[tokio::test]
    async fn test_envelope_response_with_bearer() {
        let app = Router::new().route(
            "/api/payments/verify/{reference}",
            get(|Path(reference): Path<String>, headers: HeaderMap| async move {
                let authorized = headers
                    .get("authorization")
                    .and_then(|v| v.to_str().ok())
                    == Some("Bearer secret");
                if !authorized {
                    return (StatusCode::UNAUTHORIZED, Json(json!({"message": "no"})));
                }
                (
                    StatusCode::OK,
                    Json(json!({
                        "status": true,
                        "message": "Verification successful",
                        "data": {
                            "status": "success",
                            "amount": 250000,
                            "currency": "NGN",
                            "gateway_response": reference
                        }
                    })),
                )
            }),
        );
        let base = spawn_server(app).await;

        let source = source_for(base, AuthType::Bearer("secret".into()));
        let report = source.check("ref 123").await.unwrap();
        assert_eq!(report.status, PaymentState::Success);
        assert_eq!(report.reference, "ref 123");
        assert_eq!(report.amount, Some(250000));
        // server saw the decoded reference
        assert_eq!(report.gateway_response.as_deref(), Some("ref 123"));
    }

    #[tokio::test]
    async fn test_bare_response() {
        let app = Router::new().route(
            "/api/payments/verify/{reference}",
            get(|Path(reference): Path<String>| async move {
                Json(json!({ "reference": reference, "status": "abandoned" }))
            }),
        );
        let source = source_for(spawn_server(app).await, AuthType::None);
        let report = source.check("ref_9").await.unwrap();
        assert_eq!(report.status, PaymentState::Abandoned);
        assert_eq!(report.reference, "ref_9");
    }

    #[tokio::test]
    async fn test_error_status_and_bad_body() {
        let app = Router::new()
            .route(
                "/api/payments/verify/missing",
                get(|| async { (StatusCode::NOT_FOUND, "no such payment") }),
            )
            .route("/api/payments/verify/garbled", get(|| async { "<html>oops</html>" }));
        let source = source_for(spawn_server(app).await, AuthType::None);

        match source.check("missing").await.unwrap_err() {
            WatchError::Status { status, body } => {
                assert_eq!(status, 404);
                assert_eq!(body, "no such payment");
            }
            other => panic!("expected Status error, got {:?}", other),
        }

        let err = source.check("garbled").await.unwrap_err();
        assert!(matches!(err, WatchError::Decode(_)));
        assert!(err.is_transient());
    }

    #[tokio::test]
    async fn test_connection_refused_is_transient() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let source = source_for(format!("http://{}", addr), AuthType::None);
        let err = source.check("ref_1").await.unwrap_err();
        assert!(matches!(err, WatchError::Transport(_)));
        assert!(err.is_transient());
    }
}
