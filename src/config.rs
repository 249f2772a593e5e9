use std::time::Duration;

use crate::error::BridgeError;

/// Production endpoints for the two API generations.
pub const DEFAULT_SOAP_BASE_URL: &str = "https://api.fitsuite.com/0_5";
pub const DEFAULT_REST_BASE_URL: &str = "https://api.fitsuite.com/public/v6";

const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
/// Ceiling over an entire dispatched invocation; the caller is always
/// answered within this bound.
const DEFAULT_CEILING_TIMEOUT: Duration = Duration::from_secs(25);
const DEFAULT_MAX_CACHED_FACADES: usize = 8;

/// Credentials for both backends. The source name/password pair is the
/// legacy API's source-level credential, distinct from the user credential;
/// the API key is REST-only.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub site_id: i32,
    pub username: String,
    pub password: String,
    pub api_key: String,
    pub source_name: String,
    pub source_password: String,
}

/// Bridge-wide configuration, passed by value into each facade at construction.
#[derive(Debug, Clone)]
pub struct BridgeConfig {
    pub credentials: Credentials,
    pub soap_base_url: String,
    pub rest_base_url: String,
    /// Per-request transport timeout.
    pub request_timeout: Duration,
    /// Deadline for a whole dispatched invocation, regardless of mode.
    pub ceiling_timeout: Duration,
    /// Capacity of the per-(site, backend) facade cache.
    pub max_cached_facades: usize,
}

impl BridgeConfig {
    pub fn new(credentials: Credentials) -> Self {
        Self {
            credentials,
            soap_base_url: DEFAULT_SOAP_BASE_URL.to_string(),
            rest_base_url: DEFAULT_REST_BASE_URL.to_string(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            ceiling_timeout: DEFAULT_CEILING_TIMEOUT,
            max_cached_facades: DEFAULT_MAX_CACHED_FACADES,
        }
    }

    /// Create configuration from environment variables.
    ///
    /// Required: `SCHED_SITE_ID`, `SCHED_USERNAME`, `SCHED_PASSWORD`,
    /// `SCHED_API_KEY`, `SCHED_SOURCE_NAME`, `SCHED_SOURCE_PASSWORD`.
    /// Optional: `SCHED_SOAP_BASE_URL`, `SCHED_REST_BASE_URL` (defaults to
    /// the production endpoints).
    pub fn from_env() -> Result<Self, BridgeError> {
        let site_id = required("SCHED_SITE_ID")?;
        let site_id: i32 = site_id
            .trim()
            .parse()
            .map_err(|_| BridgeError::Config(format!("SCHED_SITE_ID is not an integer: {site_id}")))?;

        let credentials = Credentials {
            site_id,
            username: required("SCHED_USERNAME")?,
            password: required("SCHED_PASSWORD")?,
            api_key: required("SCHED_API_KEY")?,
            source_name: required("SCHED_SOURCE_NAME")?,
            source_password: required("SCHED_SOURCE_PASSWORD")?,
        };

        let mut config = Self::new(credentials);
        if let Ok(url) = std::env::var("SCHED_SOAP_BASE_URL") {
            config.soap_base_url = url;
        }
        if let Ok(url) = std::env::var("SCHED_REST_BASE_URL") {
            config.rest_base_url = url;
        }
        Ok(config)
    }

    pub fn with_soap_base_url(mut self, url: impl Into<String>) -> Self {
        self.soap_base_url = url.into();
        self
    }

    pub fn with_rest_base_url(mut self, url: impl Into<String>) -> Self {
        self.rest_base_url = url.into();
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_ceiling_timeout(mut self, timeout: Duration) -> Self {
        self.ceiling_timeout = timeout;
        self
    }
}

fn required(name: &'static str) -> Result<String, BridgeError> {
    std::env::var(name).map_err(|_| BridgeError::Config(format!("{name} not set")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_credentials() -> Credentials {
        Credentials {
            site_id: -99,
            username: "owner".into(),
            password: "secret".into(),
            api_key: "key".into(),
            source_name: "source".into(),
            source_password: "source-secret".into(),
        }
    }

    #[test]
    fn defaults_point_at_production() {
        let config = BridgeConfig::new(test_credentials());
        assert_eq!(config.soap_base_url, DEFAULT_SOAP_BASE_URL);
        assert_eq!(config.rest_base_url, DEFAULT_REST_BASE_URL);
        assert_eq!(config.ceiling_timeout, Duration::from_secs(25));
    }

    #[test]
    fn builders_override_urls_and_timeouts() {
        let config = BridgeConfig::new(test_credentials())
            .with_soap_base_url("http://localhost:1234")
            .with_rest_base_url("http://localhost:5678")
            .with_ceiling_timeout(Duration::from_millis(100));
        assert_eq!(config.soap_base_url, "http://localhost:1234");
        assert_eq!(config.rest_base_url, "http://localhost:5678");
        assert_eq!(config.ceiling_timeout, Duration::from_millis(100));
    }

    #[test]
    fn from_env_reads_all_required_variables() {
        temp_env::with_vars(
            [
                ("SCHED_SITE_ID", Some("123")),
                ("SCHED_USERNAME", Some("owner")),
                ("SCHED_PASSWORD", Some("secret")),
                ("SCHED_API_KEY", Some("key")),
                ("SCHED_SOURCE_NAME", Some("source")),
                ("SCHED_SOURCE_PASSWORD", Some("source-secret")),
            ],
            || {
                let config = BridgeConfig::from_env().unwrap();
                assert_eq!(config.credentials.site_id, 123);
                assert_eq!(config.credentials.username, "owner");
                assert_eq!(config.soap_base_url, DEFAULT_SOAP_BASE_URL);
            },
        );
    }

    #[test]
    fn from_env_fails_without_api_key() {
        temp_env::with_vars(
            [
                ("SCHED_SITE_ID", Some("123")),
                ("SCHED_USERNAME", Some("owner")),
                ("SCHED_PASSWORD", Some("secret")),
                ("SCHED_API_KEY", None),
                ("SCHED_SOURCE_NAME", Some("source")),
                ("SCHED_SOURCE_PASSWORD", Some("source-secret")),
            ],
            || {
                let err = BridgeConfig::from_env().unwrap_err();
                assert!(err.to_string().contains("SCHED_API_KEY"));
            },
        );
    }
}
