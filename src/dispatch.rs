//! Dispatch and comparison across backends.
//!
//! The dispatcher routes one logical call to one or both facades, captures
//! each backend's outcome independently (one side failing never suppresses
//! the other's result), and races the whole invocation against a ceiling
//! timeout so the caller is always answered within a bound.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use futures::Future;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::debug;

use crate::backend::Backend;
use crate::config::BridgeConfig;
use crate::error::{BridgeError, ErrorKind};
use crate::params::ActionCall;
use crate::records::ActionOutput;
use crate::rest::RestFacade;
use crate::soap::SoapFacade;

/// Which backend(s) a dispatched call runs against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Legacy,
    Rest,
    Both,
}

impl Mode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Legacy => "legacy",
            Mode::Rest => "rest",
            Mode::Both => "both",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mode {
    type Err = BridgeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "legacy" => Ok(Mode::Legacy),
            "rest" => Ok(Mode::Rest),
            "both" => Ok(Mode::Both),
            other => Err(BridgeError::Config(format!("unknown mode: {other}"))),
        }
    }
}

/// Serializable error detail inside a comparison.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutcomeError {
    pub kind: ErrorKind,
    pub message: String,
}

/// What one backend produced for one dispatched call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum BackendOutcome {
    Ok { value: ActionOutput, elapsed_ms: u64 },
    Error { error: OutcomeError, elapsed_ms: u64 },
}

impl BackendOutcome {
    pub fn is_ok(&self) -> bool {
        matches!(self, BackendOutcome::Ok { .. })
    }
}

/// The comparison envelope: per-backend outcomes plus echoed request context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comparison {
    pub mode: Mode,
    #[serde(flatten)]
    pub request: ActionCall,
    pub per_backend: BTreeMap<Backend, BackendOutcome>,
    pub elapsed_ms: u64,
    pub timestamp: DateTime<Utc>,
}

type CacheSlot<F> = (i32, Arc<F>);

/// Routes logical calls to per-site facades. Facades are kept in a bounded
/// FIFO cache per backend, keyed by site id; the oldest entry is evicted when
/// a new site pushes past the capacity.
pub struct Dispatcher {
    config: BridgeConfig,
    soap_cache: Mutex<Vec<CacheSlot<SoapFacade>>>,
    rest_cache: Mutex<Vec<CacheSlot<RestFacade>>>,
}

impl Dispatcher {
    pub fn new(config: BridgeConfig) -> Self {
        Self {
            config,
            soap_cache: Mutex::new(Vec::new()),
            rest_cache: Mutex::new(Vec::new()),
        }
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    async fn soap_facade(&self, site_id: i32) -> Result<Arc<SoapFacade>, BridgeError> {
        let mut cache = self.soap_cache.lock().await;
        if let Some((_, facade)) = cache.iter().find(|(site, _)| *site == site_id) {
            return Ok(facade.clone());
        }
        let facade = Arc::new(SoapFacade::new(&self.config, site_id)?);
        if cache.len() >= self.config.max_cached_facades {
            cache.remove(0);
        }
        cache.push((site_id, facade.clone()));
        Ok(facade)
    }

    async fn rest_facade(&self, site_id: i32) -> Result<Arc<RestFacade>, BridgeError> {
        let mut cache = self.rest_cache.lock().await;
        if let Some((_, facade)) = cache.iter().find(|(site, _)| *site == site_id) {
            return Ok(facade.clone());
        }
        let facade = Arc::new(RestFacade::new(&self.config, site_id)?);
        if cache.len() >= self.config.max_cached_facades {
            cache.remove(0);
        }
        cache.push((site_id, facade.clone()));
        Ok(facade)
    }

    /// Runs `action` against the backends selected by `mode`, bounded by the
    /// configured ceiling timeout. A ceiling hit fails the whole invocation
    /// with [`BridgeError::DeadlineExceeded`]; in-flight requests are dropped.
    pub async fn dispatch(
        &self,
        action: &ActionCall,
        mode: Mode,
    ) -> Result<Comparison, BridgeError> {
        let ceiling = self.config.ceiling_timeout;
        tokio::time::timeout(ceiling, self.run(action, mode))
            .await
            .map_err(|_| BridgeError::DeadlineExceeded(ceiling))?
    }

    async fn run(&self, action: &ActionCall, mode: Mode) -> Result<Comparison, BridgeError> {
        let started = Instant::now();
        let site_id = action
            .site_override()
            .unwrap_or(self.config.credentials.site_id);
        debug!(action = action.name(), %mode, site_id, "dispatching");

        let mut per_backend = BTreeMap::new();
        match mode {
            Mode::Legacy => {
                let facade = self.soap_facade(site_id).await?;
                per_backend.insert(Backend::Legacy, timed(facade.call(action)).await);
            }
            Mode::Rest => {
                let facade = self.rest_facade(site_id).await?;
                per_backend.insert(Backend::Rest, timed(facade.call(action)).await);
            }
            Mode::Both => {
                let soap = self.soap_facade(site_id).await?;
                let rest = self.rest_facade(site_id).await?;
                let (legacy, rest_outcome) =
                    futures::join!(timed(soap.call(action)), timed(rest.call(action)));
                per_backend.insert(Backend::Legacy, legacy);
                per_backend.insert(Backend::Rest, rest_outcome);
            }
        }

        Ok(Comparison {
            mode,
            request: action.clone(),
            per_backend,
            elapsed_ms: started.elapsed().as_millis() as u64,
            timestamp: Utc::now(),
        })
    }
}

async fn timed<F>(fut: F) -> BackendOutcome
where
    F: Future<Output = Result<ActionOutput, BridgeError>>,
{
    let started = Instant::now();
    let result = fut.await;
    let elapsed_ms = started.elapsed().as_millis() as u64;
    match result {
        Ok(value) => BackendOutcome::Ok { value, elapsed_ms },
        Err(e) => BackendOutcome::Error {
            error: OutcomeError {
                kind: e.kind(),
                message: e.to_string(),
            },
            elapsed_ms,
        },
    }
}
