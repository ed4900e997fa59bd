//! Form intake client
//!
//! Posts the draft as JSON and turns the response into either success or a
//! list of human-readable rejection reasons. No retries: a failed attempt is
//! reported as-is and the visitor decides whether to send again.

use std::time::Duration;

use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::Client;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use super::FormIntake;
use crate::config::{Config, IntakeConfig};

const DEFAULT_ENDPOINT: &str = "https://formspree.io/f/deepvision";

/// Intake errors
#[derive(Error, Debug)]
pub enum IntakeError {
    #[error("intake rejected submission with status {status}")]
    Rejected { status: u16, errors: Vec<String> },

    #[error("Network error: {0}")]
    Transport(#[from] reqwest::Error),
}

/// Client for the form intake endpoint
#[derive(Debug, Clone)]
pub struct IntakeClient {
    client: Client,
    endpoint: String,
}

impl IntakeClient {
    /// Create a client from the loaded configuration and environment overrides
    pub fn from_config(config: &Config) -> Self {
        let endpoint = std::env::var("DEEPVISION_CONTACT_INTAKE_URL")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| config.intake.endpoint.clone());

        let timeout_seconds = std::env::var("DEEPVISION_CONTACT_INTAKE_TIMEOUT_SECONDS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .filter(|v| *v > 0)
            .or(config.intake.timeout_seconds);

        let verify_ssl =
            parse_bool_env("DEEPVISION_CONTACT_VERIFY_SSL").unwrap_or(config.intake.verify_ssl);

        Self::with_settings(&IntakeConfig {
            endpoint,
            timeout_seconds,
            verify_ssl,
        })
    }

    /// Create with a custom endpoint and transport defaults
    #[allow(dead_code)]
    pub fn with_endpoint(endpoint: impl Into<String>) -> Self {
        Self::with_settings(&IntakeConfig {
            endpoint: endpoint.into(),
            ..IntakeConfig::default()
        })
    }

    fn with_settings(settings: &IntakeConfig) -> Self {
        let mut builder = Client::builder().danger_accept_invalid_certs(!settings.verify_ssl);
        if let Some(seconds) = settings.timeout_seconds {
            builder = builder.timeout(Duration::from_secs(seconds.max(1)));
        }
        let client = builder.build().unwrap_or_else(|_| Client::new());

        IntakeClient {
            client,
            endpoint: normalize_endpoint(&settings.endpoint),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn post(&self, payload: &Value) -> Result<(), IntakeError> {
        let response = self
            .client
            .post(&self.endpoint)
            .header(ACCEPT, "application/json")
            .header(CONTENT_TYPE, "application/json")
            .json(payload)
            .send()
            .await?;

        let status = response.status();
        debug!(status = %status, "intake response received");

        if status.is_success() {
            return Ok(());
        }

        let errors = match response.text().await {
            Ok(body) => parse_error_body(&body),
            Err(err) => {
                warn!(error = %err, "could not read intake error body");
                Vec::new()
            }
        };

        Err(IntakeError::Rejected {
            status: status.as_u16(),
            errors,
        })
    }
}

impl FormIntake for IntakeClient {
    async fn submit(&self, payload: &Value) -> Result<(), IntakeError> {
        self.post(payload).await
    }
}

/// Pull human-readable reasons out of an error response body.
///
/// Accepts `{"errors": ["..."]}`, `{"errors": [{"message": "..."}]}` and
/// `{"error": "..."}`. Anything else yields an empty list.
pub fn parse_error_body(body: &str) -> Vec<String> {
    let Ok(value) = serde_json::from_str::<Value>(body) else {
        return Vec::new();
    };

    if let Some(entries) = value.get("errors").and_then(Value::as_array) {
        let reasons = entries
            .iter()
            .filter_map(|entry| match entry {
                Value::String(text) => Some(text.as_str()),
                Value::Object(obj) => obj
                    .get("message")
                    .or_else(|| obj.get("error"))
                    .and_then(Value::as_str),
                _ => None,
            })
            .map(str::trim)
            .filter(|text| !text.is_empty())
            .map(str::to_string)
            .collect::<Vec<_>>();
        if !reasons.is_empty() {
            return reasons;
        }
    }

    value
        .get("error")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(|text| vec![text.to_string()])
        .unwrap_or_default()
}

fn normalize_endpoint(endpoint: &str) -> String {
    let trimmed = endpoint.trim();
    if trimmed.is_empty() {
        return DEFAULT_ENDPOINT.to_string();
    }
    trimmed.to_string()
}

fn parse_bool_env(key: &str) -> Option<bool> {
    let value = std::env::var(key).ok()?;
    parse_bool_value(&value)
}

fn parse_bool_value(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use axum::routing::post;
    use axum::{Json, Router};
    use std::net::SocketAddr;
    use std::sync::Arc;
    use tokio::net::TcpListener;
    use tokio::sync::Mutex;

    async fn spawn_server(app: Router) -> (SocketAddr, tokio::task::JoinHandle<()>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        (addr, handle)
    }

    fn sample_payload() -> Value {
        serde_json::json!({
            "name": "John Doe",
            "email": "john@x.com",
            "subject": "Test",
            "message": "Hello",
        })
    }

    #[test]
    fn test_parse_error_strings() {
        assert_eq!(
            parse_error_body(r#"{"errors":["X","Y"]}"#),
            vec!["X".to_string(), "Y".to_string()]
        );
    }

    #[test]
    fn test_parse_error_objects() {
        let body = r#"{"error":"Validation errors","errors":[{"code":"TYPE_EMAIL","field":"email","message":"should be an email"}]}"#;
        assert_eq!(parse_error_body(body), vec!["should be an email".to_string()]);
    }

    #[test]
    fn test_parse_error_single_message() {
        assert_eq!(
            parse_error_body(r#"{"error":"Form not found"}"#),
            vec!["Form not found".to_string()]
        );
    }

    #[test]
    fn test_parse_error_fallbacks() {
        assert!(parse_error_body("<html>Bad Gateway</html>").is_empty());
        assert!(parse_error_body("").is_empty());
        assert!(parse_error_body(r#"{"errors":[]}"#).is_empty());
        assert!(parse_error_body(r#"{"errors":["  ", 4]}"#).is_empty());
        assert!(parse_error_body(r#"["X"]"#).is_empty());
    }

    #[test]
    fn test_normalize_endpoint() {
        assert_eq!(
            normalize_endpoint("  https://intake.example.com/f/abc "),
            "https://intake.example.com/f/abc"
        );
        assert_eq!(normalize_endpoint(""), DEFAULT_ENDPOINT);
    }

    #[test]
    fn test_parse_bool_variants() {
        assert_eq!(parse_bool_value("true"), Some(true));
        assert_eq!(parse_bool_value("1"), Some(true));
        assert_eq!(parse_bool_value("no"), Some(false));
        assert_eq!(parse_bool_value("maybe"), None);
    }

    #[tokio::test]
    async fn posts_json_payload_to_endpoint() {
        let captured: Arc<Mutex<Option<(Option<String>, Value)>>> = Arc::new(Mutex::new(None));
        let captured_for_route = Arc::clone(&captured);
        let backend = Router::new().route(
            "/f/abc",
            post(
                move |headers: axum::http::HeaderMap, Json(payload): Json<Value>| {
                    let captured = Arc::clone(&captured_for_route);
                    async move {
                        let content_type = headers
                            .get("content-type")
                            .and_then(|v| v.to_str().ok())
                            .map(str::to_string);
                        *captured.lock().await = Some((content_type, payload));
                        (StatusCode::OK, Json(serde_json::json!({"ok": true})))
                    }
                },
            ),
        );
        let (addr, handle) = spawn_server(backend).await;

        let client = IntakeClient::with_endpoint(format!("http://{addr}/f/abc"));
        client.submit(&sample_payload()).await.unwrap();

        let (content_type, payload) = captured.lock().await.clone().expect("payload captured");
        assert_eq!(content_type.as_deref(), Some("application/json"));
        assert_eq!(payload, sample_payload());

        handle.abort();
    }

    #[tokio::test]
    async fn rejection_carries_status_and_reasons() {
        let backend = Router::new().route(
            "/f/abc",
            post(|| async {
                (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    Json(serde_json::json!({"errors": ["Invalid email"]})),
                )
            }),
        );
        let (addr, handle) = spawn_server(backend).await;

        let client = IntakeClient::with_endpoint(format!("http://{addr}/f/abc"));
        match client.submit(&sample_payload()).await {
            Err(IntakeError::Rejected { status, errors }) => {
                assert_eq!(status, 422);
                assert_eq!(errors, vec!["Invalid email".to_string()]);
            }
            other => panic!("expected rejection, got {other:?}"),
        }

        handle.abort();
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_transport_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = IntakeClient::with_endpoint(format!("http://{addr}/f/abc"));
        let result = client.submit(&sample_payload()).await;
        assert!(matches!(result, Err(IntakeError::Transport(_))));
    }
}
