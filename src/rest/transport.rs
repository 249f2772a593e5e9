//! HTTP transport for the REST API.

use std::time::Duration;

use serde_json::Value;
use tracing::debug;

use crate::error::{ApiError, ErrorKind};

use super::request::RestRequest;

/// Sends REST requests with the platform headers attached. The `Api-Key` and
/// `SiteId` headers go on every call, token issuance included; business calls
/// additionally carry the bearer token.
#[derive(Debug, Clone)]
pub(crate) struct RestTransport {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    site_id: i32,
}

impl RestTransport {
    pub(crate) fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        site_id: i32,
        timeout: Duration,
    ) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ApiError::new(ErrorKind::Build, format!("http client: {e}")))?;
        Ok(Self {
            client,
            base_url: base_url.into(),
            api_key: api_key.into(),
            site_id,
        })
    }

    pub(crate) async fn execute(
        &self,
        req: &RestRequest,
        bearer: Option<&str>,
    ) -> Result<Value, ApiError> {
        let url = format!("{}{}", self.base_url, req.path);
        debug!(method = %req.method, url = %url, "rest request");

        let mut builder = self
            .client
            .request(req.method.clone(), &url)
            .header("Api-Key", &self.api_key)
            .header("SiteId", self.site_id.to_string());
        if !req.query.is_empty() {
            builder = builder.query(&req.query);
        }
        if let Some(token) = bearer {
            builder = builder.bearer_auth(token);
        }
        if let Some(body) = &req.body {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(categorize_transport_error)?;
        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| ApiError::new(ErrorKind::Protocol, format!("reading body: {e}")))?;

        if !status.is_success() {
            return Err(status_error(status, &text));
        }
        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&text)
            .map_err(|e| ApiError::new(ErrorKind::Protocol, format!("malformed JSON: {e}")))
    }
}

fn categorize_transport_error(e: reqwest::Error) -> ApiError {
    if e.is_timeout() {
        ApiError::new(ErrorKind::Timeout, format!("request timed out: {e}"))
    } else if e.is_connect() {
        ApiError::new(ErrorKind::Connection, format!("connect failed: {e}"))
    } else {
        ApiError::new(ErrorKind::Network, format!("network error: {e}"))
    }
}

fn status_error(status: http::StatusCode, body: &str) -> ApiError {
    let kind = match status {
        http::StatusCode::UNAUTHORIZED => ErrorKind::Auth,
        http::StatusCode::FORBIDDEN => ErrorKind::Forbidden,
        http::StatusCode::NOT_FOUND => ErrorKind::NotFound,
        http::StatusCode::TOO_MANY_REQUESTS => ErrorKind::RateLimit,
        // The platform answers rejected writes (duplicate email included)
        // with a plain 400.
        http::StatusCode::BAD_REQUEST => ErrorKind::Conflict,
        s if s.is_server_error() => ErrorKind::Server,
        _ => ErrorKind::Protocol,
    };
    let detail = body.chars().take(200).collect::<String>();
    ApiError::new(kind, format!("unexpected status {status}: {detail}"))
}
