//! Sending envelopes to an `mgate.exe` endpoint.
//!
//! [`Transport`] is the seam between the query engine and the network.
//! [`HttpTransport`] POSTs the envelope as JSON, signing the body when the
//! profile asks for it; tests and the binary can swap in
//! [`super::fixture::FixtureTransport`] instead.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use reqwest::header::{ACCEPT, CONTENT_TYPE, HeaderMap, HeaderValue};
use serde_json::Value;
use tokio::sync::Semaphore;
use tracing::debug;

use crate::profile::Profile;

use super::envelope::Envelope;
use super::error::{HafasError, TransportError};
use super::types::RawResponse;

/// Default user agent sent with every request.
const DEFAULT_USER_AGENT: &str = concat!("hafas-client/", env!("CARGO_PKG_VERSION"));

/// Default maximum concurrent requests.
const DEFAULT_MAX_CONCURRENT: usize = 5;

/// Sends one envelope to the profile's endpoint and returns the decoded
/// response body.
pub trait Transport: Send + Sync {
    fn send(
        &self,
        profile: &Profile,
        envelope: &Envelope,
    ) -> impl Future<Output = Result<Value, TransportError>> + Send;
}

/// Configuration for [`HttpTransport`].
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Sent as the `User-Agent` header
    pub user_agent: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Maximum concurrent requests
    pub max_concurrent: usize,
    /// Overrides the profile's endpoint (for testing).
    pub endpoint: Option<String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout_secs: 30,
            max_concurrent: DEFAULT_MAX_CONCURRENT,
            endpoint: None,
        }
    }
}

impl ClientConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    pub fn with_max_concurrent(mut self, n: usize) -> Self {
        self.max_concurrent = n;
        self
    }

    /// Send every request here instead of the profile's endpoint.
    pub fn with_endpoint(mut self, url: impl Into<String>) -> Self {
        self.endpoint = Some(url.into());
        self
    }
}

/// HTTP transport over `reqwest`.
///
/// Uses a semaphore to limit concurrent requests.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    http: reqwest::Client,
    endpoint: Option<String>,
    semaphore: Arc<Semaphore>,
}

impl HttpTransport {
    pub fn new(config: ClientConfig) -> Result<Self, TransportError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(
            CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .user_agent(config.user_agent)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            endpoint: config.endpoint,
            semaphore: Arc::new(Semaphore::new(config.max_concurrent.max(1))),
        })
    }
}

impl Transport for HttpTransport {
    async fn send(&self, profile: &Profile, envelope: &Envelope) -> Result<Value, TransportError> {
        let _permit = self.semaphore.acquire().await?;

        let url = self.endpoint.as_deref().unwrap_or(&profile.endpoint);
        debug!(method = envelope.method(), url, "Sending request");

        let body = serde_json::to_vec(envelope).map_err(|e| TransportError::Json {
            message: e.to_string(),
            body: None,
        })?;
        let mut request = self.http.post(url);
        if let Some(signer) = &profile.signing {
            request = request.query(&signer.sign(&body));
        }

        let response = request.body(body).send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TransportError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| TransportError::Json {
            message: e.to_string(),
            body: Some(body.chars().take(500).collect()),
        })
    }
}

/// Checks the error codes of a response and returns the `res` object of its
/// first service result.
pub fn extract_result(body: Value) -> Result<Value, HafasError> {
    let response: RawResponse = serde_json::from_value(body)
        .map_err(|e| HafasError::shape(format!("response envelope: {e}")))?;

    if let Some(code) = response.err.filter(|c| c != "OK") {
        return Err(HafasError::Protocol {
            code,
            message: response.err_txt.unwrap_or_default(),
        });
    }

    let first = response
        .svc_res_l
        .and_then(|l| l.into_iter().next())
        .ok_or_else(|| HafasError::shape("svcResL[0] missing"))?;

    if let Some(code) = first.err.filter(|c| c != "OK") {
        return Err(HafasError::Protocol {
            code,
            message: first.err_txt.unwrap_or_default(),
        });
    }

    first.res.ok_or_else(|| HafasError::shape("svcResL[0].res missing"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn config_builder() {
        let config = ClientConfig::new()
            .with_user_agent("my-app")
            .with_timeout(5)
            .with_max_concurrent(2)
            .with_endpoint("http://localhost:1234/mgate.exe");
        assert_eq!(config.user_agent, "my-app");
        assert_eq!(config.timeout_secs, 5);
        assert_eq!(config.max_concurrent, 2);
        assert_eq!(
            config.endpoint.as_deref(),
            Some("http://localhost:1234/mgate.exe")
        );
        assert!(ClientConfig::default().user_agent.starts_with("hafas-client/"));
    }

    #[tokio::test]
    async fn closed_limiter_has_its_own_error() {
        let semaphore = Semaphore::new(1);
        semaphore.close();
        let err: TransportError = semaphore.acquire().await.unwrap_err().into();
        assert!(matches!(err, TransportError::Closed(_)));
        assert_eq!(err.to_string(), "request limiter closed");
    }

    #[test]
    fn result_of_first_service() {
        let res = extract_result(json!({
            "err": "OK",
            "svcResL": [{"meth": "LocDetails", "err": "OK", "res": {"locL": []}}]
        }))
        .unwrap();
        assert_eq!(res, json!({"locL": []}));
    }

    #[test]
    fn top_level_error_code() {
        let err = extract_result(json!({"err": "AUTH", "errTxt": "invalid aid"})).unwrap_err();
        match err {
            HafasError::Protocol { code, message } => {
                assert_eq!(code, "AUTH");
                assert_eq!(message, "invalid aid");
            }
            other => panic!("expected protocol error, got {other:?}"),
        }
    }

    #[test]
    fn service_error_code() {
        let err = extract_result(json!({
            "svcResL": [{"err": "H890", "errTxt": "no connections found"}]
        }))
        .unwrap_err();
        assert!(matches!(err, HafasError::Protocol { code, .. } if code == "H890"));
    }

    #[test]
    fn missing_parts_are_shape_errors() {
        assert!(matches!(
            extract_result(json!({"err": "OK"})),
            Err(HafasError::Shape { .. })
        ));
        assert!(matches!(
            extract_result(json!({"svcResL": [{"err": "OK"}]})),
            Err(HafasError::Shape { .. })
        ));
        assert!(matches!(
            extract_result(json!([1, 2])),
            Err(HafasError::Shape { .. })
        ));
    }
}
