//! HTTP transport for the legacy SOAP API.

use std::time::Duration;

use tracing::debug;

use crate::error::{ApiError, ErrorKind};

use super::request::{mask_credentials, SoapRequest};

/// Posts SOAP envelopes to the legacy `.asmx` services and returns the raw
/// response body. One instance per facade; the underlying reqwest client
/// pools connections across requests.
#[derive(Debug, Clone)]
pub(crate) struct SoapTransport {
    client: reqwest::Client,
    base_url: String,
}

impl SoapTransport {
    pub(crate) fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ApiError::new(ErrorKind::Build, format!("http client: {e}")))?;
        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }

    pub(crate) async fn execute(&self, req: &SoapRequest) -> Result<String, ApiError> {
        let url = format!("{}{}", self.base_url, req.service_path);
        debug!(
            url = %url,
            soap_action = %req.soap_action,
            envelope = %mask_credentials(&req.envelope),
            "legacy request"
        );

        let response = self
            .client
            .post(&url)
            .header(http::header::CONTENT_TYPE, "text/xml; charset=utf-8")
            .header("SOAPAction", &req.soap_action)
            .body(req.envelope.clone())
            .send()
            .await
            .map_err(categorize_transport_error)?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ApiError::new(ErrorKind::Protocol, format!("reading body: {e}")))?;

        if status.is_success() {
            return Ok(body);
        }
        Err(status_error(status))
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

fn status_error(status: http::StatusCode) -> ApiError {
    let kind = match status {
        http::StatusCode::UNAUTHORIZED => ErrorKind::Auth,
        http::StatusCode::FORBIDDEN => ErrorKind::Forbidden,
        http::StatusCode::NOT_FOUND => ErrorKind::NotFound,
        http::StatusCode::TOO_MANY_REQUESTS => ErrorKind::RateLimit,
        http::StatusCode::BAD_REQUEST => ErrorKind::Conflict,
        s if s.is_server_error() => ErrorKind::Server,
        _ => ErrorKind::Protocol,
    };
    ApiError::new(kind, format!("unexpected status {status}"))
}
