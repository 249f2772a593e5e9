//! Builders turning logical parameters into REST requests.
//!
//! Same contract as the envelope builders on the legacy side: pure
//! transforms, unset optionals omit the query pair or JSON field entirely,
//! and array-valued ids join with commas. Empty-string client fields are
//! dropped, the platform rejects them.

use chrono::NaiveDateTime;
use serde_json::{json, Map, Value};

use crate::params::{
    CheckoutParams, ClassRosterParams, ClientParams, GetClassSchedulesParams, GetClassesParams,
    GetClientServicesParams, GetClientsParams, GetServicesParams, UpdateClientServiceParams,
};

const DATETIME_FMT: &str = "%Y-%m-%dT%H:%M:%S";

/// A fully built REST request; the transport adds base URL, auth, and the
/// platform headers.
#[derive(Debug, Clone)]
pub struct RestRequest {
    pub method: http::Method,
    pub path: &'static str,
    pub query: Vec<(&'static str, String)>,
    pub body: Option<Value>,
}

impl RestRequest {
    fn get(path: &'static str) -> Self {
        Self {
            method: http::Method::GET,
            path,
            query: Vec::new(),
            body: None,
        }
    }

    fn post(path: &'static str, body: Value) -> Self {
        Self {
            method: http::Method::POST,
            path,
            query: Vec::new(),
            body: Some(body),
        }
    }

    fn query_opt(mut self, name: &'static str, value: Option<String>) -> Self {
        if let Some(value) = value {
            self.query.push((name, value));
        }
        self
    }
}

fn join_ids<T: ToString>(ids: &[T]) -> String {
    ids.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(",")
}

fn fmt_datetime(dt: NaiveDateTime) -> String {
    dt.format(DATETIME_FMT).to_string()
}

pub(crate) fn issue_token(username: &str, password: &str) -> RestRequest {
    RestRequest::post(
        "/usertoken/issue",
        json!({ "Username": username, "Password": password }),
    )
}

pub(crate) fn get_clients(p: &GetClientsParams) -> RestRequest {
    RestRequest::get("/client/clients").query_opt("searchText", p.email.clone())
}

fn set_if_present(map: &mut Map<String, Value>, name: &str, value: Option<&str>) {
    if let Some(v) = value {
        if !v.is_empty() {
            map.insert(name.to_string(), Value::String(v.to_string()));
        }
    }
}

fn client_payload(p: &ClientParams, email: &str) -> Value {
    let mut client = Map::new();
    client.insert("FirstName".into(), Value::String(p.fname.clone()));
    client.insert("LastName".into(), Value::String(p.lname.clone()));
    client.insert("Email".into(), Value::String(email.to_string()));
    if let Some(birthdate) = p.birthdate {
        client.insert(
            "BirthDate".into(),
            Value::String(format!("{}T00:00:00", birthdate.format("%Y-%m-%d"))),
        );
    }
    set_if_present(&mut client, "AddressLine1", p.street1.as_deref());
    set_if_present(&mut client, "City", p.city.as_deref());
    set_if_present(&mut client, "State", p.state.as_deref());
    set_if_present(&mut client, "PostalCode", p.zip.as_deref());
    set_if_present(&mut client, "MobilePhone", p.phone.as_deref());
    set_if_present(&mut client, "Gender", p.gender.as_deref());
    set_if_present(&mut client, "ReferredBy", p.referred_by.as_deref());
    set_if_present(
        &mut client,
        "EmergencyContactInfoEmail",
        p.emergency_contact_email.as_deref(),
    );
    set_if_present(
        &mut client,
        "EmergencyContactInfoName",
        p.emergency_contact_name.as_deref(),
    );
    set_if_present(
        &mut client,
        "EmergencyContactInfoPhone",
        p.emergency_contact_phone.as_deref(),
    );
    set_if_present(
        &mut client,
        "EmergencyContactInfoRelationship",
        p.emergency_contact_relationship.as_deref(),
    );
    Value::Object(client)
}

/// Update when an id is present, add otherwise; the two endpoints take
/// differently shaped payloads.
pub(crate) fn add_or_update_clients(p: &ClientParams, email: &str) -> RestRequest {
    match p.id.as_deref() {
        Some(id) => {
            let mut client = client_payload(p, email);
            if let Value::Object(map) = &mut client {
                map.insert("Id".into(), Value::String(id.to_string()));
            }
            RestRequest::post(
                "/client/updateclient",
                json!({ "Client": client, "CrossRegionalUpdate": false }),
            )
        }
        None => RestRequest::post("/client/addclient", client_payload(p, email)),
    }
}

pub(crate) fn get_services(p: &GetServicesParams) -> RestRequest {
    RestRequest::get("/sale/services")
        .query_opt("classIds", p.class_id.map(|id| id.to_string()))
}

pub(crate) fn get_client_services(p: &GetClientServicesParams) -> RestRequest {
    let mut req = RestRequest::get("/client/clientservices");
    req.query.push(("clientId", p.client_id.clone()));
    req.query_opt("classIds", p.class_id.map(|id| id.to_string()))
}

pub(crate) fn update_client_service(p: &UpdateClientServiceParams) -> RestRequest {
    RestRequest::post(
        "/client/updateclientservice",
        json!({
            "ClientServiceId": p.client_service_id,
            "ActiveDate": format!("{}T00:00:00", p.active_date.format("%Y-%m-%d")),
            "ExpirationDate": format!("{}T00:00:00", p.expiration_date.format("%Y-%m-%d")),
        }),
    )
}

/// `location_id` is resolved by the caller beforehand; the REST checkout
/// endpoint requires one.
pub(crate) fn checkout_shopping_cart(p: &CheckoutParams, location_id: i64) -> RestRequest {
    RestRequest::post(
        "/sale/checkoutshoppingcart",
        json!({
            "ClientId": p.client_id,
            "Test": false,
            "LocationId": location_id,
            "InStore": false,
            "SendEmail": false,
            "Items": [{
                "Item": { "Type": "Service", "Metadata": { "Id": p.service_id } },
                "Quantity": 1,
            }],
            "Payments": [{
                "Type": "Comp",
                "Metadata": { "Amount": p.amount },
            }],
        }),
    )
}

pub(crate) fn get_classes(p: &GetClassesParams) -> RestRequest {
    RestRequest::get("/class/classes")
        .query_opt("locationIds", p.location_ids.as_deref().map(join_ids))
        .query_opt("classIds", p.class_ids.as_deref().map(join_ids))
        .query_opt("startDateTime", p.start_date.map(fmt_datetime))
        .query_opt("endDateTime", p.end_date.map(fmt_datetime))
}

pub(crate) fn get_class_schedules(p: &GetClassSchedulesParams) -> RestRequest {
    RestRequest::get("/class/classschedules")
        .query_opt("locationIds", p.location_ids.as_deref().map(join_ids))
        .query_opt("startDate", p.start_date.map(fmt_datetime))
        .query_opt("endDate", p.end_date.map(fmt_datetime))
}

pub(crate) fn get_class_visits(class_id: i64) -> RestRequest {
    let mut req = RestRequest::get("/class/classvisits");
    req.query.push(("classId", class_id.to_string()));
    req
}

pub(crate) fn get_sites() -> RestRequest {
    RestRequest::get("/site/sites")
}

pub(crate) fn get_locations() -> RestRequest {
    RestRequest::get("/site/locations")
}

/// The REST endpoint is singular; the facade fans out over every
/// (client, class) pair.
pub(crate) fn add_client_to_class(client_id: &str, class_id: i64) -> RestRequest {
    RestRequest::post(
        "/class/addclienttoclass",
        json!({
            "ClientId": client_id,
            "ClassId": class_id,
            "Test": false,
            "RequirePayment": false,
            "Waitlist": false,
            "SendEmail": false,
        }),
    )
}

pub(crate) fn remove_clients_from_classes(p: &ClassRosterParams) -> RestRequest {
    let details: Vec<Value> = p
        .class_ids
        .iter()
        .map(|class_id| {
            json!({
                "ClassId": class_id,
                "ClientIds": p.client_ids,
            })
        })
        .collect();
    RestRequest::post(
        "/class/removeclientsfromclasses",
        json!({
            "Details": details,
            "Test": false,
            "SendEmail": false,
            "LateCancel": p.late_cancel,
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unset_optionals_omit_query_pairs() {
        let req = get_classes(&GetClassesParams::default());
        assert_eq!(req.method, http::Method::GET);
        assert_eq!(req.path, "/class/classes");
        assert!(req.query.is_empty());
    }

    #[test]
    fn array_ids_join_with_commas() {
        let req = get_classes(&GetClassesParams {
            location_ids: Some(vec![1, 2, 3]),
            ..Default::default()
        });
        assert_eq!(req.query, vec![("locationIds", "1,2,3".to_string())]);
    }

    #[test]
    fn add_and_update_use_different_endpoints_and_shapes() {
        let mut params = ClientParams {
            fname: "Ada".into(),
            lname: "Lovelace".into(),
            email: "ada@b.com".into(),
            ..Default::default()
        };
        let add = add_or_update_clients(&params, "ada@b.com");
        assert_eq!(add.path, "/client/addclient");
        let body = add.body.unwrap();
        assert_eq!(body["FirstName"], "Ada");
        assert!(body.get("Client").is_none());

        params.id = Some("100000123".into());
        let update = add_or_update_clients(&params, "ada@b.com");
        assert_eq!(update.path, "/client/updateclient");
        let body = update.body.unwrap();
        assert_eq!(body["Client"]["Id"], "100000123");
        assert_eq!(body["CrossRegionalUpdate"], false);
    }

    #[test]
    fn empty_string_client_fields_are_dropped() {
        let params = ClientParams {
            fname: "Ada".into(),
            lname: "Lovelace".into(),
            email: "ada@b.com".into(),
            city: Some(String::new()),
            ..Default::default()
        };
        let req = add_or_update_clients(&params, "ada@b.com");
        let body = req.body.unwrap();
        assert!(body.get("City").is_none());
        assert!(body.get("AddressLine1").is_none());
    }

    #[test]
    fn removal_builds_one_detail_per_class_with_all_clients() {
        let req = remove_clients_from_classes(&ClassRosterParams {
            client_ids: vec!["c1".into(), "c2".into()],
            class_ids: vec![10, 20],
            ..Default::default()
        });
        let body = req.body.unwrap();
        let details = body["Details"].as_array().unwrap();
        assert_eq!(details.len(), 2);
        assert_eq!(details[0]["ClassId"], 10);
        assert_eq!(details[1]["ClassId"], 20);
        assert_eq!(details[0]["ClientIds"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn checkout_carries_resolved_location() {
        let req = checkout_shopping_cart(
            &CheckoutParams {
                client_id: "100000123".into(),
                service_id: 42,
                amount: 25.0,
                site_id: None,
            },
            7,
        );
        let body = req.body.unwrap();
        assert_eq!(body["LocationId"], 7);
        assert_eq!(body["Items"][0]["Item"]["Metadata"]["Id"], 42);
        assert_eq!(body["Payments"][0]["Metadata"]["Amount"], 25.0);
    }
}
