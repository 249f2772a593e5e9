//! Normalizers turning REST JSON payloads into the shared record types.
//!
//! Field access is tolerant: ids arrive as either numbers or strings
//! depending on the endpoint, optional sub-objects may be absent, and a
//! missing list normalizes to empty. The output shapes are identical to the
//! legacy normalizers'.

use serde_json::Value;

use crate::records::{
    ClassRecord, ClassScheduleRecord, ClassVisitRecord, ClientRecord, ClientServiceRecord,
    LocationRecord, ServiceRecord, SiteRecord, StaffRecord,
};

fn text(v: &Value, field: &str) -> String {
    match v.get(field) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        _ => String::new(),
    }
}

fn int(v: &Value, field: &str) -> i64 {
    match v.get(field) {
        Some(Value::Number(n)) => n.as_i64().unwrap_or(0),
        Some(Value::String(s)) => s.trim().parse().unwrap_or(0),
        _ => 0,
    }
}

fn boolean(v: &Value, field: &str) -> bool {
    match v.get(field) {
        Some(Value::Bool(b)) => *b,
        Some(Value::String(s)) => s.trim().eq_ignore_ascii_case("true"),
        _ => false,
    }
}

fn list<'a>(v: &'a Value, field: &str) -> impl Iterator<Item = &'a Value> {
    v.get(field)
        .and_then(Value::as_array)
        .map(|a| a.iter())
        .unwrap_or_default()
}

pub(crate) fn clients(json: &Value) -> Vec<ClientRecord> {
    list(json, "Clients")
        .map(|c| ClientRecord { id: text(c, "Id") })
        .collect()
}

/// Add/update responses wrap the saved record in a singular `Client` object.
pub(crate) fn saved_client(json: &Value) -> Vec<ClientRecord> {
    match json.get("Client") {
        Some(client) => vec![ClientRecord {
            id: text(client, "Id"),
        }],
        None => Vec::new(),
    }
}

pub(crate) fn services(json: &Value) -> Vec<ServiceRecord> {
    list(json, "Services")
        .map(|s| ServiceRecord {
            id: text(s, "Id"),
            name: text(s, "Name"),
            price: text(s, "Price"),
            count: int(s, "Count"),
        })
        .collect()
}

pub(crate) fn client_services(json: &Value) -> Vec<ClientServiceRecord> {
    list(json, "ClientServices")
        .map(|s| ClientServiceRecord {
            id: text(s, "Id"),
            name: text(s, "Name"),
        })
        .collect()
}

pub(crate) fn classes(json: &Value) -> Vec<ClassRecord> {
    list(json, "Classes").map(class_record).collect()
}

fn class_record(v: &Value) -> ClassRecord {
    let description = v.get("ClassDescription");
    let staff = v.get("Staff");
    ClassRecord {
        max_capacity: int(v, "MaxCapacity"),
        web_capacity: int(v, "WebCapacity"),
        total_booked: int(v, "TotalBooked"),
        total_booked_wait_list: int(v, "TotalBookedWaitlist"),
        web_booked: int(v, "WebBooked"),
        is_cancelled: boolean(v, "IsCanceled"),
        active: boolean(v, "Active"),
        id: text(v, "Id"),
        class_schedule_id: text(v, "ClassScheduleId"),
        is_available: boolean(v, "IsAvailable"),
        start_date_time: text(v, "StartDateTime"),
        end_date_time: text(v, "EndDateTime"),
        name: description.map(|d| text(d, "Name")).unwrap_or_default(),
        description: description
            .map(|d| text(d, "Description"))
            .unwrap_or_default(),
        staff: staff
            .map(|s| StaffRecord {
                fname: text(s, "FirstName"),
                lname: text(s, "LastName"),
            })
            .unwrap_or_default(),
    }
}

pub(crate) fn class_schedules(json: &Value) -> Vec<ClassScheduleRecord> {
    list(json, "ClassSchedules")
        .map(|s| ClassScheduleRecord {
            id: text(s, "Id"),
            day_sunday: boolean(s, "DaySunday"),
            day_monday: boolean(s, "DayMonday"),
            day_tuesday: boolean(s, "DayTuesday"),
            day_wednesday: boolean(s, "DayWednesday"),
            day_thursday: boolean(s, "DayThursday"),
            day_friday: boolean(s, "DayFriday"),
            day_saturday: boolean(s, "DaySaturday"),
            start_time: text(s, "StartTime"),
            end_time: text(s, "EndTime"),
            name: s
                .get("ClassDescription")
                .map(|d| text(d, "Name"))
                .unwrap_or_default(),
        })
        .collect()
}

pub(crate) fn class_visits(json: &Value) -> Vec<ClassVisitRecord> {
    let Some(class) = json.get("Class") else {
        return Vec::new();
    };
    list(class, "Visits")
        .map(|v| ClassVisitRecord {
            id: int(v, "Id"),
            class_id: int(v, "ClassId"),
            checked_in: boolean(v, "SignedIn"),
            client: ClientRecord {
                id: text(v, "ClientId"),
            },
        })
        .collect()
}

pub(crate) fn sites(json: &Value) -> Vec<SiteRecord> {
    list(json, "Sites")
        .map(|s| SiteRecord {
            id: text(s, "Id"),
            name: text(s, "Name"),
        })
        .collect()
}

pub(crate) fn locations(json: &Value) -> Vec<LocationRecord> {
    list(json, "Locations")
        .map(|l| LocationRecord {
            id: text(l, "Id"),
            name: text(l, "Name"),
        })
        .collect()
}

/// Roster removal reports partial failures in an `Errors` array; empty or
/// absent means every class was processed.
pub(crate) fn removal_errors(json: &Value) -> Vec<String> {
    list(json, "Errors")
        .map(|e| text(e, "Message"))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn numeric_ids_normalize_to_strings() {
        let json = json!({ "Clients": [{ "Id": 100000123 }, { "Id": "100000124" }] });
        let clients = clients(&json);
        assert_eq!(clients[0].id, "100000123");
        assert_eq!(clients[1].id, "100000124");
    }

    #[test]
    fn missing_list_normalizes_to_empty() {
        assert!(clients(&json!({})).is_empty());
        assert!(classes(&json!({})).is_empty());
        assert!(class_visits(&json!({})).is_empty());
    }

    #[test]
    fn class_record_fields_match_the_legacy_shape() {
        let json = json!({ "Classes": [{
            "MaxCapacity": 20, "WebCapacity": 15, "TotalBooked": 7,
            "TotalBookedWaitlist": 1, "WebBooked": 5, "IsCanceled": false,
            "Active": true, "Id": 9001, "ClassScheduleId": 17,
            "IsAvailable": true,
            "StartDateTime": "2025-06-01T09:00:00",
            "EndDateTime": "2025-06-01T10:00:00",
            "ClassDescription": { "Name": "Vinyasa", "Description": "All levels" },
            "Staff": { "FirstName": "Jo", "LastName": "Smith" },
        }]});
        let classes = classes(&json);
        assert_eq!(classes.len(), 1);
        let class = &classes[0];
        assert_eq!(class.id, "9001");
        assert_eq!(class.class_schedule_id, "17");
        assert_eq!(class.name, "Vinyasa");
        assert_eq!(class.staff.lname, "Smith");
    }

    #[test]
    fn missing_staff_yields_empty_record() {
        let json = json!({ "Classes": [{ "Id": 1 }] });
        assert_eq!(classes(&json)[0].staff, StaffRecord::default());
    }

    #[test]
    fn saved_client_unwraps_singular_object() {
        let json = json!({ "Client": { "Id": 100000125 } });
        let clients = saved_client(&json);
        assert_eq!(clients.len(), 1);
        assert_eq!(clients[0].id, "100000125");
    }

    #[test]
    fn removal_errors_collects_messages() {
        let json = json!({ "Errors": [{ "Message": "not booked" }] });
        assert_eq!(removal_errors(&json), vec!["not booked"]);
        assert!(removal_errors(&json!({ "Errors": [] })).is_empty());
        assert!(removal_errors(&json!({})).is_empty());
    }

    #[test]
    fn visits_map_signed_in_and_client_id() {
        let json = json!({ "Class": { "Visits": [
            { "Id": 55, "ClassId": 9001, "SignedIn": true, "ClientId": 100000123 },
        ]}});
        let visits = class_visits(&json);
        assert_eq!(visits[0].id, 55);
        assert!(visits[0].checked_in);
        assert_eq!(visits[0].client.id, "100000123");
    }
}
