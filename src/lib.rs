//! Bridge over two generations of a scheduling/CRM platform API.
//!
//! The platform exposes the same business operations through a legacy
//! SOAP/XML API and a newer REST/JSON API, with different endpoints, auth
//! schemes, and payload shapes. This crate normalizes both behind one typed
//! action surface ([`ActionCall`] in, [`ActionOutput`] out) and a
//! [`Dispatcher`] that can invoke either backend or both concurrently,
//! isolating partial failures and answering within a ceiling timeout.
//!
//! ```no_run
//! use sched_bridge::{ActionCall, BridgeConfig, Dispatcher, GetClientsParams, Mode};
//!
//! # async fn run() -> anyhow::Result<()> {
//! let config = BridgeConfig::from_env()?;
//! let dispatcher = Dispatcher::new(config);
//!
//! let call = ActionCall::GetClients(GetClientsParams {
//!     email: Some("member@example.com".into()),
//!     site_id: None,
//! });
//! let comparison = dispatcher.dispatch(&call, Mode::Both).await?;
//! println!("{}", serde_json::to_string_pretty(&comparison)?);
//! # Ok(())
//! # }
//! ```
//!
//! Single-backend callers can skip the dispatcher and use [`SoapFacade`] or
//! [`RestFacade`] directly; each exposes one async method per action.

mod backend;
mod config;
mod conflict;
mod dispatch;
mod error;
mod filter;
mod params;
mod records;
mod rest;
mod soap;

pub use backend::Backend;
pub use config::{BridgeConfig, Credentials, DEFAULT_REST_BASE_URL, DEFAULT_SOAP_BASE_URL};
pub use conflict::{next_conflict_email, MAX_EMAIL_CONFLICT_ATTEMPTS};
pub use dispatch::{BackendOutcome, Comparison, Dispatcher, Mode, OutcomeError};
pub use error::{ApiError, BridgeError, ErrorKind};
pub use filter::{FilterOp, ServiceField, ServiceFilter, ServiceMatcher};
pub use params::{
    ActionCall, CheckoutParams, ClassRosterParams, ClientParams, GetClassSchedulesParams,
    GetClassVisitsParams, GetClassesParams, GetClientServicesParams, GetClientsParams,
    GetLocationsParams, GetServicesParams, GetSitesParams, UpdateClientServiceParams,
    VoidClientServiceParams,
};
pub use records::{
    ActionOutput, ClassRecord, ClassScheduleRecord, ClassVisitRecord, ClientRecord,
    ClientServiceRecord, LocationRecord, ServiceRecord, SiteRecord, StaffRecord,
};
pub use rest::RestFacade;
pub use soap::SoapFacade;
