//! Normalized result records — the backend-agnostic output contract.
//!
//! Field names and types are fixed per action: both the SOAP and the REST
//! normalizer must produce exactly these shapes, regardless of how the source
//! payload spells them.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClientRecord {
    pub id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServiceRecord {
    pub id: String,
    pub name: String,
    /// Kept as the backend's decimal string; callers decide how to parse money.
    pub price: String,
    pub count: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClientServiceRecord {
    pub id: String,
    pub name: String,
}

/// Instructor attached to a class. Empty record when the backend omits staff info.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StaffRecord {
    pub fname: String,
    pub lname: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClassRecord {
    pub max_capacity: i64,
    pub web_capacity: i64,
    pub total_booked: i64,
    pub total_booked_wait_list: i64,
    pub web_booked: i64,
    pub is_cancelled: bool,
    pub active: bool,
    pub id: String,
    pub class_schedule_id: String,
    pub is_available: bool,
    pub start_date_time: String,
    pub end_date_time: String,
    pub name: String,
    pub description: String,
    pub staff: StaffRecord,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClassScheduleRecord {
    pub id: String,
    pub day_sunday: bool,
    pub day_monday: bool,
    pub day_tuesday: bool,
    pub day_wednesday: bool,
    pub day_thursday: bool,
    pub day_friday: bool,
    pub day_saturday: bool,
    pub start_time: String,
    pub end_time: String,
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClassVisitRecord {
    pub id: i64,
    pub class_id: i64,
    pub checked_in: bool,
    pub client: ClientRecord,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SiteRecord {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LocationRecord {
    pub id: String,
    pub name: String,
}

/// Union of every action's normalized result, so the dispatcher can return
/// one type for any logical call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum ActionOutput {
    Clients(Vec<ClientRecord>),
    Services(Vec<ServiceRecord>),
    ClientServices(Vec<ClientServiceRecord>),
    Classes(Vec<ClassRecord>),
    ClassSchedules(Vec<ClassScheduleRecord>),
    ClassVisits(Vec<ClassVisitRecord>),
    Sites(Vec<SiteRecord>),
    Locations(Vec<LocationRecord>),
    /// Status-only operations (checkout, roster changes, service updates).
    Success(bool),
    /// Result of the find-service helper; `None` is "not found", never an error.
    Service(Option<ServiceRecord>),
}
