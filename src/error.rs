use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::backend::Backend;

/// Machine-checkable category for every failure the bridge can surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// DNS failure or otherwise unreachable network.
    Network,
    /// TCP connect failed (refused, reset).
    Connection,
    /// A single request exceeded its transport timeout.
    Timeout,
    /// Bad credentials, expired or invalid token (HTTP 401).
    Auth,
    /// Valid credentials but insufficient permissions (HTTP 403).
    Forbidden,
    /// Missing resource or endpoint (HTTP 404).
    NotFound,
    /// Backend rejected the write as conflicting (duplicate email).
    Conflict,
    /// Email-conflict retry gave up after the maximum attempt count.
    ConflictRetriesExhausted,
    /// HTTP 429.
    RateLimit,
    /// Backend 5xx.
    Server,
    /// Malformed or unparseable response, or an expected wrapper node absent.
    Protocol,
    /// The request could not be constructed (bad configuration or parameters).
    Build,
}

/// Transport/normalizer-level failure, before backend and action context is attached.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct ApiError {
    pub kind: ErrorKind,
    pub message: String,
}

impl ApiError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Failure surfaced by the bridge, carrying enough context to distinguish
/// "backend unreachable" from "backend rejected this specific operation".
#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("{backend} backend, {action}: {source}")]
    Backend {
        backend: Backend,
        action: &'static str,
        #[source]
        source: ApiError,
    },

    #[error("configuration error: {0}")]
    Config(String),

    #[error("invocation exceeded the {0:?} ceiling timeout")]
    DeadlineExceeded(Duration),
}

impl BridgeError {
    pub(crate) fn backend(backend: Backend, action: &'static str, source: ApiError) -> Self {
        BridgeError::Backend {
            backend,
            action,
            source,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            BridgeError::Backend { source, .. } => source.kind,
            BridgeError::Config(_) => ErrorKind::Build,
            BridgeError::DeadlineExceeded(_) => ErrorKind::Timeout,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backend_error_keeps_kind_and_context() {
        let err = BridgeError::backend(
            Backend::Legacy,
            "GetClients",
            ApiError::new(ErrorKind::Protocol, "missing Clients node"),
        );
        assert_eq!(err.kind(), ErrorKind::Protocol);
        let text = err.to_string();
        assert!(text.contains("legacy"));
        assert!(text.contains("GetClients"));
        assert!(text.contains("missing Clients node"));
    }

    #[test]
    fn deadline_exceeded_maps_to_timeout_kind() {
        let err = BridgeError::DeadlineExceeded(Duration::from_secs(25));
        assert_eq!(err.kind(), ErrorKind::Timeout);
    }

    #[test]
    fn error_kind_serializes_snake_case() {
        let json = serde_json::to_string(&ErrorKind::ConflictRetriesExhausted).unwrap();
        assert_eq!(json, "\"conflict_retries_exhausted\"");
    }
}
