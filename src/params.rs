//! Caller-supplied parameters, one struct per logical action, plus the closed
//! [`ActionCall`] union binding each action to its parameter shape at compile
//! time (no stringly-typed dispatch).

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::filter::ServiceFilter;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GetClientsParams {
    /// Search text; the platform matches it against client emails.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub site_id: Option<i32>,
}

/// Parameters for AddOrUpdateClients. `id` present means update, absent means add.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClientParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub fname: String,
    pub lname: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub birthdate: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub street1: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zip: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    /// Platform-assigned mobile provider id; carrier-name lookup is the caller's concern.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mobile_provider_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emergency_contact_email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emergency_contact_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emergency_contact_phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emergency_contact_relationship: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub referred_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub site_id: Option<i32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GetServicesParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub site_id: Option<i32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GetClientServicesParams {
    pub client_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub site_id: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateClientServiceParams {
    pub client_service_id: i64,
    pub active_date: NaiveDate,
    pub expiration_date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub site_id: Option<i32>,
}

/// Parameters for the void-service helper; the dates are computed at call time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VoidClientServiceParams {
    pub client_service_id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub site_id: Option<i32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CheckoutParams {
    pub client_id: String,
    pub service_id: i64,
    pub amount: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub site_id: Option<i32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GetClassesParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location_ids: Option<Vec<i64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class_ids: Option<Vec<i64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDateTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDateTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub site_id: Option<i32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GetClassSchedulesParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location_ids: Option<Vec<i64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDateTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDateTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub site_id: Option<i32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GetClassVisitsParams {
    pub class_id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub site_id: Option<i32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GetSitesParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub site_ids: Option<Vec<i32>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GetLocationsParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub site_id: Option<i32>,
}

/// Parameters for adding clients to / removing clients from classes.
/// `late_cancel` only applies to removal.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClassRosterParams {
    pub client_ids: Vec<String>,
    pub class_ids: Vec<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_service_id: Option<i64>,
    #[serde(default)]
    pub late_cancel: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub site_id: Option<i32>,
}

/// A logical action bound to its parameter shape. This is the dispatcher's
/// input: each variant maps to exactly one request-builder/normalizer pair
/// per backend, checked exhaustively at compile time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", content = "params")]
pub enum ActionCall {
    GetClients(GetClientsParams),
    AddOrUpdateClients(ClientParams),
    GetServices(GetServicesParams),
    GetClientServices(GetClientServicesParams),
    UpdateClientServices(UpdateClientServiceParams),
    CheckoutShoppingCart(CheckoutParams),
    GetClasses(GetClassesParams),
    GetClassSchedules(GetClassSchedulesParams),
    GetClassVisits(GetClassVisitsParams),
    GetSites(GetSitesParams),
    GetLocations(GetLocationsParams),
    AddClientsToClasses(ClassRosterParams),
    RemoveClientsFromClasses(ClassRosterParams),
    /// Derived helper: linear scan over GetServices with a data-described filter.
    FindService {
        #[serde(flatten)]
        params: GetServicesParams,
        filter: ServiceFilter,
    },
    /// Derived helper: retroactively expire a purchased service.
    VoidClientService(VoidClientServiceParams),
}

impl ActionCall {
    pub fn name(&self) -> &'static str {
        match self {
            ActionCall::GetClients(_) => "GetClients",
            ActionCall::AddOrUpdateClients(_) => "AddOrUpdateClients",
            ActionCall::GetServices(_) => "GetServices",
            ActionCall::GetClientServices(_) => "GetClientServices",
            ActionCall::UpdateClientServices(_) => "UpdateClientServices",
            ActionCall::CheckoutShoppingCart(_) => "CheckoutShoppingCart",
            ActionCall::GetClasses(_) => "GetClasses",
            ActionCall::GetClassSchedules(_) => "GetClassSchedules",
            ActionCall::GetClassVisits(_) => "GetClassVisits",
            ActionCall::GetSites(_) => "GetSites",
            ActionCall::GetLocations(_) => "GetLocations",
            ActionCall::AddClientsToClasses(_) => "AddClientsToClasses",
            ActionCall::RemoveClientsFromClasses(_) => "RemoveClientsFromClasses",
            ActionCall::FindService { .. } => "FindService",
            ActionCall::VoidClientService(_) => "VoidClientService",
        }
    }

    /// Per-call site override; when present the dispatcher binds a fresh
    /// facade to that site instead of the configured default.
    pub fn site_override(&self) -> Option<i32> {
        match self {
            ActionCall::GetClients(p) => p.site_id,
            ActionCall::AddOrUpdateClients(p) => p.site_id,
            ActionCall::GetServices(p) => p.site_id,
            ActionCall::GetClientServices(p) => p.site_id,
            ActionCall::UpdateClientServices(p) => p.site_id,
            ActionCall::CheckoutShoppingCart(p) => p.site_id,
            ActionCall::GetClasses(p) => p.site_id,
            ActionCall::GetClassSchedules(p) => p.site_id,
            ActionCall::GetClassVisits(p) => p.site_id,
            ActionCall::GetSites(p) => p.site_ids.as_ref().and_then(|ids| ids.first().copied()),
            ActionCall::GetLocations(p) => p.site_id,
            ActionCall::AddClientsToClasses(p) => p.site_id,
            ActionCall::RemoveClientsFromClasses(p) => p.site_id,
            ActionCall::FindService { params, .. } => params.site_id,
            ActionCall::VoidClientService(p) => p.site_id,
        }
    }
}
