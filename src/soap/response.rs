//! Normalizers turning legacy XML payloads into the shared record types.
//!
//! Every response nests the payload as Envelope > Body > `{Action}Response` >
//! `{Action}Result`; the walk takes the first element at each hop so the
//! per-action names never need spelling out. Tag comparison ignores
//! namespaces on purpose: the payloads mix a default namespace with
//! unqualified children.

use roxmltree::{Document, Node};

use crate::error::{ApiError, ErrorKind};
use crate::records::{
    ClassRecord, ClassScheduleRecord, ClassVisitRecord, ClientRecord, ClientServiceRecord,
    LocationRecord, ServiceRecord, SiteRecord, StaffRecord,
};

/// Error code the legacy API uses for "a client with this email exists".
const DUPLICATE_EMAIL_ERROR_CODE: i64 = 905;

/// Outcome of an AddOrUpdateClients response: the conflict case is not an
/// error at this layer, it feeds the caller's retry loop.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum SaveClientsOutcome {
    Saved(Vec<ClientRecord>),
    EmailConflict,
}

fn parse(body: &str) -> Result<Document<'_>, ApiError> {
    Document::parse(body)
        .map_err(|e| ApiError::new(ErrorKind::Protocol, format!("malformed XML: {e}")))
}

fn child<'a, 'i>(node: Node<'a, 'i>, name: &str) -> Option<Node<'a, 'i>> {
    node.children()
        .find(|c| c.is_element() && c.tag_name().name() == name)
}

fn elements<'a, 'i>(node: Node<'a, 'i>, name: &'a str) -> impl Iterator<Item = Node<'a, 'i>> {
    node.children()
        .filter(move |c| c.is_element() && c.tag_name().name() == name)
}

fn first_element<'a, 'i>(node: Node<'a, 'i>) -> Option<Node<'a, 'i>> {
    node.children().find(|c| c.is_element())
}

fn child_text(node: Node<'_, '_>, name: &str) -> String {
    child(node, name)
        .and_then(|c| c.text())
        .unwrap_or_default()
        .to_string()
}

fn child_i64(node: Node<'_, '_>, name: &str) -> i64 {
    child(node, name)
        .and_then(|c| c.text())
        .and_then(|t| t.trim().parse().ok())
        .unwrap_or(0)
}

fn child_bool(node: Node<'_, '_>, name: &str) -> bool {
    child(node, name)
        .and_then(|c| c.text())
        .map(|t| t.trim().eq_ignore_ascii_case("true"))
        .unwrap_or(false)
}

/// Walks to the `{Action}Result` element inside the SOAP body.
fn result_node<'a, 'i>(doc: &'a Document<'i>) -> Result<Node<'a, 'i>, ApiError> {
    let envelope = doc.root_element();
    let body = child(envelope, "Body")
        .ok_or_else(|| ApiError::new(ErrorKind::Protocol, "no SOAP Body"))?;
    let response = first_element(body)
        .ok_or_else(|| ApiError::new(ErrorKind::Protocol, "empty SOAP Body"))?;
    first_element(response).ok_or_else(|| ApiError::new(ErrorKind::Protocol, "no result element"))
}

fn check_status(result: Node<'_, '_>) -> Result<(), ApiError> {
    let status = child_text(result, "Status");
    if status == "Success" {
        return Ok(());
    }
    let code = child_i64(result, "ErrorCode");
    let message = child_text(result, "Message");
    Err(ApiError::new(
        ErrorKind::Server,
        format!("backend status {status} (code {code}): {message}"),
    ))
}

fn wrapper<'a, 'i>(result: Node<'a, 'i>, name: &str) -> Result<Node<'a, 'i>, ApiError> {
    child(result, name)
        .ok_or_else(|| ApiError::new(ErrorKind::Protocol, format!("missing {name} node")))
}

pub(crate) fn clients(body: &str) -> Result<Vec<ClientRecord>, ApiError> {
    let doc = parse(body)?;
    let result = result_node(&doc)?;
    check_status(result)?;
    let clients = wrapper(result, "Clients")?;
    Ok(elements(clients, "Client")
        .map(|c| ClientRecord {
            id: child_text(c, "ID"),
        })
        .collect())
}

pub(crate) fn add_or_update_clients(body: &str) -> Result<SaveClientsOutcome, ApiError> {
    let doc = parse(body)?;
    let result = result_node(&doc)?;
    let status = child_text(result, "Status");
    if status != "Success" {
        if child_i64(result, "ErrorCode") == DUPLICATE_EMAIL_ERROR_CODE {
            return Ok(SaveClientsOutcome::EmailConflict);
        }
        check_status(result)?;
    }
    let clients = wrapper(result, "Clients")?;
    Ok(SaveClientsOutcome::Saved(
        elements(clients, "Client")
            .map(|c| ClientRecord {
                id: child_text(c, "ID"),
            })
            .collect(),
    ))
}

pub(crate) fn services(body: &str) -> Result<Vec<ServiceRecord>, ApiError> {
    let doc = parse(body)?;
    let result = result_node(&doc)?;
    check_status(result)?;
    let services = wrapper(result, "Services")?;
    Ok(elements(services, "Service")
        .map(|s| ServiceRecord {
            id: child_text(s, "ID"),
            name: child_text(s, "Name"),
            price: child_text(s, "Price"),
            count: child_i64(s, "Count"),
        })
        .collect())
}

pub(crate) fn client_services(body: &str) -> Result<Vec<ClientServiceRecord>, ApiError> {
    let doc = parse(body)?;
    let result = result_node(&doc)?;
    check_status(result)?;
    let services = wrapper(result, "ClientServices")?;
    Ok(elements(services, "ClientService")
        .map(|s| ClientServiceRecord {
            id: child_text(s, "ID"),
            name: child_text(s, "Name"),
        })
        .collect())
}

/// Status-only responses (UpdateClientServices, CheckoutShoppingCart, roster
/// changes): success is the backend's Status field, nothing else.
pub(crate) fn success(body: &str) -> Result<bool, ApiError> {
    let doc = parse(body)?;
    let result = result_node(&doc)?;
    Ok(child_text(result, "Status") == "Success")
}

pub(crate) fn classes(body: &str) -> Result<Vec<ClassRecord>, ApiError> {
    let doc = parse(body)?;
    let result = result_node(&doc)?;
    check_status(result)?;
    // No Classes node is a legitimate empty window, not a protocol fault.
    let Some(classes) = child(result, "Classes") else {
        return Ok(Vec::new());
    };
    Ok(elements(classes, "Class").map(class_record).collect())
}

fn class_record(node: Node<'_, '_>) -> ClassRecord {
    let description = child(node, "ClassDescription");
    let staff = child(node, "Staff");
    ClassRecord {
        max_capacity: child_i64(node, "MaxCapacity"),
        web_capacity: child_i64(node, "WebCapacity"),
        total_booked: child_i64(node, "TotalBooked"),
        total_booked_wait_list: child_i64(node, "TotalBookedWaitlist"),
        web_booked: child_i64(node, "WebBooked"),
        is_cancelled: child_bool(node, "IsCanceled"),
        active: child_bool(node, "Active"),
        id: child_text(node, "ID"),
        class_schedule_id: child_text(node, "ClassScheduleID"),
        is_available: child_bool(node, "IsAvailable"),
        start_date_time: child_text(node, "StartDateTime"),
        end_date_time: child_text(node, "EndDateTime"),
        name: description.map(|d| child_text(d, "Name")).unwrap_or_default(),
        description: description
            .map(|d| child_text(d, "Description"))
            .unwrap_or_default(),
        staff: staff
            .map(|s| StaffRecord {
                fname: child_text(s, "FirstName"),
                lname: child_text(s, "LastName"),
            })
            .unwrap_or_default(),
    }
}

pub(crate) fn class_schedules(body: &str) -> Result<Vec<ClassScheduleRecord>, ApiError> {
    let doc = parse(body)?;
    let result = result_node(&doc)?;
    check_status(result)?;
    let schedules = wrapper(result, "ClassSchedules")?;
    Ok(elements(schedules, "ClassSchedule")
        .map(|s| ClassScheduleRecord {
            id: child_text(s, "ID"),
            day_sunday: child_bool(s, "DaySunday"),
            day_monday: child_bool(s, "DayMonday"),
            day_tuesday: child_bool(s, "DayTuesday"),
            day_wednesday: child_bool(s, "DayWednesday"),
            day_thursday: child_bool(s, "DayThursday"),
            day_friday: child_bool(s, "DayFriday"),
            day_saturday: child_bool(s, "DaySaturday"),
            start_time: child_text(s, "StartTime"),
            end_time: child_text(s, "EndTime"),
            name: child(s, "ClassDescription")
                .map(|d| child_text(d, "Name"))
                .unwrap_or_default(),
        })
        .collect())
}

pub(crate) fn class_visits(body: &str) -> Result<Vec<ClassVisitRecord>, ApiError> {
    let doc = parse(body)?;
    let result = result_node(&doc)?;
    check_status(result)?;
    // A class without visits comes back without the Class/Visits nesting.
    let Some(visits) = child(result, "Class").and_then(|c| child(c, "Visits")) else {
        return Ok(Vec::new());
    };
    Ok(elements(visits, "Visit")
        .map(|v| ClassVisitRecord {
            id: child_i64(v, "ID"),
            class_id: child_i64(v, "ClassID"),
            checked_in: child_bool(v, "SignedIn"),
            client: ClientRecord {
                id: child(v, "Client")
                    .map(|c| child_text(c, "ID"))
                    .unwrap_or_default(),
            },
        })
        .collect())
}

pub(crate) fn sites(body: &str) -> Result<Vec<SiteRecord>, ApiError> {
    let doc = parse(body)?;
    let result = result_node(&doc)?;
    check_status(result)?;
    let sites = wrapper(result, "Sites")?;
    Ok(elements(sites, "Site")
        .map(|s| SiteRecord {
            id: child_text(s, "ID"),
            name: child_text(s, "Name"),
        })
        .collect())
}

pub(crate) fn locations(body: &str) -> Result<Vec<LocationRecord>, ApiError> {
    let doc = parse(body)?;
    let result = result_node(&doc)?;
    check_status(result)?;
    let locations = wrapper(result, "Locations")?;
    Ok(elements(locations, "Location")
        .map(|l| LocationRecord {
            id: child_text(l, "ID"),
            name: child_text(l, "Name"),
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn envelope(action: &str, result_children: &str) -> String {
        format!(
            "<?xml version=\"1.0\" encoding=\"utf-8\"?>\
             <soap:Envelope xmlns:soap=\"http://schemas.xmlsoap.org/soap/envelope/\" \
             xmlns=\"http://clients.fitsuite.com/api/0_5\">\
             <soap:Body><{action}Response><{action}Result>\
             <Status>Success</Status><ErrorCode>200</ErrorCode>\
             {result_children}\
             </{action}Result></{action}Response></soap:Body></soap:Envelope>"
        )
    }

    #[test]
    fn clients_extracts_ids_despite_default_namespace() {
        let body = envelope(
            "GetClients",
            "<Clients><Client><ID>100000123</ID></Client><Client><ID>100000124</ID></Client></Clients>",
        );
        let clients = clients(&body).unwrap();
        assert_eq!(clients.len(), 2);
        assert_eq!(clients[0].id, "100000123");
    }

    #[test]
    fn missing_clients_node_is_a_protocol_error() {
        let body = envelope("GetClients", "");
        let err = clients(&body).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Protocol);
        assert!(err.message.contains("Clients"));
    }

    #[test]
    fn missing_classes_node_is_an_empty_window() {
        let body = envelope("GetClasses", "");
        assert_eq!(classes(&body).unwrap(), Vec::new());
    }

    #[test]
    fn class_record_maps_nested_description_and_staff() {
        let body = envelope(
            "GetClasses",
            "<Classes><Class>\
             <MaxCapacity>20</MaxCapacity><WebCapacity>15</WebCapacity>\
             <TotalBooked>7</TotalBooked><TotalBookedWaitlist>1</TotalBookedWaitlist>\
             <WebBooked>5</WebBooked><IsCanceled>false</IsCanceled>\
             <Active>true</Active><ID>9001</ID><ClassScheduleID>17</ClassScheduleID>\
             <IsAvailable>true</IsAvailable>\
             <StartDateTime>2025-06-01T09:00:00</StartDateTime>\
             <EndDateTime>2025-06-01T10:00:00</EndDateTime>\
             <ClassDescription><Name>Vinyasa</Name><Description>All levels</Description></ClassDescription>\
             <Staff><FirstName>Jo</FirstName><LastName>Smith</LastName></Staff>\
             </Class></Classes>",
        );
        let classes = classes(&body).unwrap();
        assert_eq!(classes.len(), 1);
        let class = &classes[0];
        assert_eq!(class.max_capacity, 20);
        assert_eq!(class.total_booked_wait_list, 1);
        assert!(!class.is_cancelled);
        assert_eq!(class.name, "Vinyasa");
        assert_eq!(class.description, "All levels");
        assert_eq!(class.staff.fname, "Jo");
        assert_eq!(class.staff.lname, "Smith");
    }

    #[test]
    fn duplicate_email_error_code_reports_conflict_outcome() {
        let body = "<soap:Envelope xmlns:soap=\"http://schemas.xmlsoap.org/soap/envelope/\">\
             <soap:Body><AddOrUpdateClientsResponse><AddOrUpdateClientsResult>\
             <Status>FailedAction</Status><ErrorCode>905</ErrorCode>\
             <Message>A client with this email already exists</Message>\
             </AddOrUpdateClientsResult></AddOrUpdateClientsResponse></soap:Body></soap:Envelope>";
        assert_eq!(
            add_or_update_clients(body).unwrap(),
            SaveClientsOutcome::EmailConflict
        );
    }

    #[test]
    fn other_failed_statuses_are_server_errors() {
        let body = "<soap:Envelope xmlns:soap=\"http://schemas.xmlsoap.org/soap/envelope/\">\
             <soap:Body><AddOrUpdateClientsResponse><AddOrUpdateClientsResult>\
             <Status>FailedAction</Status><ErrorCode>500</ErrorCode>\
             <Message>boom</Message>\
             </AddOrUpdateClientsResult></AddOrUpdateClientsResponse></soap:Body></soap:Envelope>";
        let err = add_or_update_clients(body).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Server);
        assert!(err.message.contains("boom"));
    }

    #[test]
    fn visits_without_class_node_are_empty() {
        let body = envelope("GetClassVisits", "");
        assert_eq!(class_visits(&body).unwrap(), Vec::new());
    }

    #[test]
    fn visits_map_checked_in_and_client_id() {
        let body = envelope(
            "GetClassVisits",
            "<Class><Visits>\
             <Visit><ID>55</ID><ClassID>9001</ClassID><SignedIn>true</SignedIn>\
             <Client><ID>100000123</ID></Client></Visit>\
             </Visits></Class>",
        );
        let visits = class_visits(&body).unwrap();
        assert_eq!(visits.len(), 1);
        assert_eq!(visits[0].id, 55);
        assert!(visits[0].checked_in);
        assert_eq!(visits[0].client.id, "100000123");
    }

    #[test]
    fn success_reflects_backend_status() {
        assert!(success(&envelope("CheckoutShoppingCart", "")).unwrap());
        let failed = "<soap:Envelope xmlns:soap=\"http://schemas.xmlsoap.org/soap/envelope/\">\
             <soap:Body><R><Res><Status>FailedAction</Status></Res></R></soap:Body></soap:Envelope>";
        assert!(!success(failed).unwrap());
    }

    #[test]
    fn malformed_xml_is_a_protocol_error() {
        let err = clients("this is not xml").unwrap_err();
        assert_eq!(err.kind, ErrorKind::Protocol);
    }
}
