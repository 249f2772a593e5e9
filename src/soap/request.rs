//! Builders turning logical parameters into SOAP envelopes.
//!
//! Pure transforms: every interpolated value is either a caller-supplied
//! parameter or a credential passed in explicitly. Unset optional parameters
//! emit no element at all — the legacy API rejects empty tags. Array-valued
//! identifiers serialize as repeated `<int>`/`<string>` children.

use std::borrow::Cow;

use chrono::{Days, NaiveDate, NaiveDateTime, Utc};
use quick_xml::escape::escape;

use crate::config::Credentials;
use crate::params::{
    CheckoutParams, ClassRosterParams, ClientParams, GetClassSchedulesParams, GetClassVisitsParams,
    GetClassesParams, GetClientServicesParams, GetClientsParams, GetServicesParams,
    UpdateClientServiceParams,
};

/// XML namespace of the legacy API; also the SOAPAction header prefix.
pub const SOAP_NAMESPACE: &str = "http://clients.fitsuite.com/api/0_5";

const CLIENT_SERVICE: &str = "/ClientService.asmx";
const SALE_SERVICE: &str = "/SaleService.asmx";
const CLASS_SERVICE: &str = "/ClassService.asmx";
const SITE_SERVICE: &str = "/SiteService.asmx";

const DATETIME_FMT: &str = "%Y-%m-%dT%H:%M:%S";
const DATE_FMT: &str = "%Y-%m-%d";

/// A fully built legacy request: which `.asmx` service to POST to, the
/// action-identifying header, and the envelope body.
#[derive(Debug, Clone)]
pub struct SoapRequest {
    pub service_path: &'static str,
    pub soap_action: String,
    pub envelope: String,
}

fn esc(raw: &str) -> Cow<'_, str> {
    escape(raw)
}

fn source_credentials(creds: &Credentials, site_id: i32) -> String {
    format!(
        "<SourceCredentials>\
         <SourceName>{}</SourceName>\
         <Password>{}</Password>\
         <SiteIDs><int>{site_id}</int></SiteIDs>\
         </SourceCredentials>",
        esc(&creds.source_name),
        esc(&creds.source_password),
    )
}

fn user_credentials(creds: &Credentials, site_id: i32) -> String {
    format!(
        "<UserCredentials>\
         <Username>{}</Username>\
         <Password>{}</Password>\
         <SiteIDs><int>{site_id}</int></SiteIDs>\
         </UserCredentials>",
        esc(&creds.username),
        esc(&creds.password),
    )
}

fn envelope(action: &str, request_children: &str) -> String {
    format!(
        "<?xml version=\"1.0\" encoding=\"utf-8\"?>\
         <soap:Envelope \
         xmlns:xsi=\"http://www.w3.org/2001/XMLSchema-instance\" \
         xmlns:xsd=\"http://www.w3.org/2001/XMLSchema\" \
         xmlns:soap=\"http://schemas.xmlsoap.org/soap/envelope/\" \
         xmlns=\"{SOAP_NAMESPACE}\">\
         <soap:Body><{action}><Request>{request_children}</Request></{action}></soap:Body>\
         </soap:Envelope>"
    )
}

struct RequestSpec<'a> {
    action: &'static str,
    service_path: &'static str,
    with_user_credentials: bool,
    body: &'a str,
}

fn build(spec: RequestSpec<'_>, creds: &Credentials, site_id: i32) -> SoapRequest {
    let mut children = source_credentials(creds, site_id);
    if spec.with_user_credentials {
        children.push_str(&user_credentials(creds, site_id));
    }
    children.push_str(spec.body);
    SoapRequest {
        service_path: spec.service_path,
        soap_action: format!("{SOAP_NAMESPACE}/{}", spec.action),
        envelope: envelope(spec.action, &children),
    }
}

fn opt_element(name: &str, value: Option<&str>) -> String {
    match value {
        Some(v) => format!("<{name}>{}</{name}>", esc(v)),
        None => String::new(),
    }
}

fn int_list(wrapper: &str, ids: &[i64]) -> String {
    let items: String = ids.iter().map(|id| format!("<int>{id}</int>")).collect();
    format!("<{wrapper}>{items}</{wrapper}>")
}

fn string_list(wrapper: &str, ids: &[String]) -> String {
    let items: String = ids
        .iter()
        .map(|id| format!("<string>{}</string>", esc(id)))
        .collect();
    format!("<{wrapper}>{items}</{wrapper}>")
}

fn fmt_datetime(dt: NaiveDateTime) -> String {
    dt.format(DATETIME_FMT).to_string()
}

fn fmt_date(d: NaiveDate) -> String {
    d.format(DATE_FMT).to_string()
}

/// Strip both credential blocks before an envelope reaches a log line.
pub fn mask_credentials(envelope: &str) -> String {
    let mut masked = envelope.to_string();
    for tag in ["SourceCredentials", "UserCredentials"] {
        let open = format!("<{tag}>");
        let close = format!("</{tag}>");
        while let Some(start) = masked.find(&open) {
            match masked[start..].find(&close) {
                Some(rel_end) => {
                    masked.replace_range(start..start + rel_end + close.len(), "<CredentialsRemoved />");
                }
                None => break,
            }
        }
    }
    masked
}

pub fn get_clients(p: &GetClientsParams, creds: &Credentials, site_id: i32) -> SoapRequest {
    let body = format!(
        "<XMLDetail>Full</XMLDetail>\
         <PageSize>1500</PageSize>\
         <CurrentPageIndex>0</CurrentPageIndex>\
         {}",
        opt_element("SearchText", p.email.as_deref()),
    );
    build(
        RequestSpec {
            action: "GetClients",
            service_path: CLIENT_SERVICE,
            with_user_credentials: true,
            body: &body,
        },
        creds,
        site_id,
    )
}

/// `email` is passed separately from `p.email` so the conflict-retry loop can
/// substitute suffixed candidates without mutating the caller's parameters.
pub fn add_or_update_clients(
    p: &ClientParams,
    email: &str,
    creds: &Credentials,
    site_id: i32,
) -> SoapRequest {
    let mut client = format!(
        "<FirstName>{}</FirstName><LastName>{}</LastName><Email>{}</Email>",
        esc(&p.fname),
        esc(&p.lname),
        esc(email),
    );
    client.push_str(&opt_element("AddressLine1", p.street1.as_deref()));
    client.push_str(&opt_element("City", p.city.as_deref()));
    client.push_str(&opt_element("State", p.state.as_deref()));
    client.push_str(&opt_element("PostalCode", p.zip.as_deref()));
    client.push_str(&opt_element("ReferredBy", p.referred_by.as_deref()));
    if let Some(birthdate) = p.birthdate {
        client.push_str(&format!(
            "<BirthDate>{}T00:00:00</BirthDate>",
            fmt_date(birthdate)
        ));
    }
    if let Some(phone) = p.phone.as_deref() {
        client.push_str(&format!("<MobilePhone>{}</MobilePhone>", esc(phone)));
        client.push_str(&format!(
            "<MobileProvider>{}</MobileProvider>",
            p.mobile_provider_id.unwrap_or(0)
        ));
    }
    client.push_str(&opt_element("Gender", p.gender.as_deref()));
    client.push_str(&opt_element(
        "EmergencyContactInfoEmail",
        p.emergency_contact_email.as_deref(),
    ));
    client.push_str(&opt_element(
        "EmergencyContactInfoName",
        p.emergency_contact_name.as_deref(),
    ));
    client.push_str(&opt_element(
        "EmergencyContactInfoPhone",
        p.emergency_contact_phone.as_deref(),
    ));
    client.push_str(&opt_element(
        "EmergencyContactInfoRelationship",
        p.emergency_contact_relationship.as_deref(),
    ));
    client.push_str(&opt_element("ID", p.id.as_deref()));
    client.push_str("<PromotionalEmailOptIn>false</PromotionalEmailOptIn>");

    let body = format!(
        "<XMLDetail>Full</XMLDetail>\
         <Test>false</Test>\
         <SendEmail>false</SendEmail>\
         <Clients><Client>{client}</Client></Clients>"
    );
    build(
        RequestSpec {
            action: "AddOrUpdateClients",
            service_path: CLIENT_SERVICE,
            with_user_credentials: false,
            body: &body,
        },
        creds,
        site_id,
    )
}

pub fn get_services(p: &GetServicesParams, creds: &Credentials, site_id: i32) -> SoapRequest {
    let class_id = p.class_id.map(|id| id.to_string());
    let body = format!(
        "<XMLDetail>Full</XMLDetail>\
         <PageSize>1000</PageSize>\
         <SellOnline>false</SellOnline>\
         <CurrentPageIndex>0</CurrentPageIndex>\
         {}",
        opt_element("ClassID", class_id.as_deref()),
    );
    build(
        RequestSpec {
            action: "GetServices",
            service_path: SALE_SERVICE,
            with_user_credentials: true,
            body: &body,
        },
        creds,
        site_id,
    )
}

pub fn get_client_services(
    p: &GetClientServicesParams,
    creds: &Credentials,
    site_id: i32,
) -> SoapRequest {
    let class_id = p.class_id.map(|id| id.to_string());
    let body = format!(
        "<ClientID>{}</ClientID>{}",
        esc(&p.client_id),
        opt_element("ClassID", class_id.as_deref()),
    );
    build(
        RequestSpec {
            action: "GetClientServices",
            service_path: CLIENT_SERVICE,
            with_user_credentials: true,
            body: &body,
        },
        creds,
        site_id,
    )
}

pub fn update_client_services(
    p: &UpdateClientServiceParams,
    creds: &Credentials,
    site_id: i32,
) -> SoapRequest {
    let body = format!(
        "<ClientServices><ClientService>\
         <ID>{}</ID>\
         <ActiveDate>{}</ActiveDate>\
         <ExpirationDate>{}</ExpirationDate>\
         </ClientService></ClientServices>",
        p.client_service_id,
        fmt_date(p.active_date),
        fmt_date(p.expiration_date),
    );
    build(
        RequestSpec {
            action: "UpdateClientServices",
            service_path: CLIENT_SERVICE,
            with_user_credentials: true,
            body: &body,
        },
        creds,
        site_id,
    )
}

pub fn checkout_shopping_cart(p: &CheckoutParams, creds: &Credentials, site_id: i32) -> SoapRequest {
    let body = format!(
        "<XMLDetail>Full</XMLDetail>\
         <ClientID>{}</ClientID>\
         <Test>false</Test>\
         <CartItems><CartItem>\
         <Quantity>1</Quantity>\
         <Item xsi:type=\"Service\"><ID>{}</ID></Item>\
         </CartItem></CartItems>\
         <Payments><PaymentInfo xsi:type=\"CompInfo\"><Amount>{}</Amount></PaymentInfo></Payments>\
         <InStore>false</InStore>\
         <SendEmail>false</SendEmail>\
         <RequirePayment>false</RequirePayment>",
        esc(&p.client_id),
        p.service_id,
        p.amount,
    );
    build(
        RequestSpec {
            action: "CheckoutShoppingCart",
            service_path: SALE_SERVICE,
            with_user_credentials: true,
            body: &body,
        },
        creds,
        site_id,
    )
}

pub fn get_classes(p: &GetClassesParams, creds: &Credentials, site_id: i32) -> SoapRequest {
    // The legacy API requires a date window; default to +/- 100 days around now.
    let now = Utc::now().naive_utc();
    let start = p.start_date.unwrap_or_else(|| now - Days::new(100));
    let end = p.end_date.unwrap_or_else(|| now + Days::new(100));

    let mut body = String::from("<XMLDetail>Full</XMLDetail><PageSize>1000</PageSize>");
    if let Some(ids) = p.location_ids.as_deref() {
        body.push_str(&int_list("LocationIDs", ids));
    }
    if let Some(ids) = p.class_ids.as_deref() {
        body.push_str(&int_list("ClassIDs", ids));
    }
    body.push_str(&format!(
        "<StartDateTime>{}</StartDateTime><EndDateTime>{}</EndDateTime>",
        fmt_datetime(start),
        fmt_datetime(end),
    ));
    build(
        RequestSpec {
            action: "GetClasses",
            service_path: CLASS_SERVICE,
            with_user_credentials: true,
            body: &body,
        },
        creds,
        site_id,
    )
}

pub fn get_class_schedules(
    p: &GetClassSchedulesParams,
    creds: &Credentials,
    site_id: i32,
) -> SoapRequest {
    // Defaults to today's window when the caller gives no dates.
    let today = Utc::now().date_naive();
    let start = p
        .start_date
        .unwrap_or_else(|| today.and_hms_opt(0, 0, 0).unwrap_or_default());
    let end = p
        .end_date
        .unwrap_or_else(|| today.and_hms_opt(23, 59, 59).unwrap_or_default());

    let mut body = String::from("<XMLDetail>Full</XMLDetail><PageSize>100</PageSize>");
    if let Some(ids) = p.location_ids.as_deref() {
        body.push_str(&int_list("LocationIDs", ids));
    }
    body.push_str(&format!(
        "<StartDateTime>{}</StartDateTime><EndDateTime>{}</EndDateTime>",
        fmt_datetime(start),
        fmt_datetime(end),
    ));
    build(
        RequestSpec {
            action: "GetClassSchedules",
            service_path: CLASS_SERVICE,
            with_user_credentials: false,
            body: &body,
        },
        creds,
        site_id,
    )
}

pub fn get_class_visits(p: &GetClassVisitsParams, creds: &Credentials, site_id: i32) -> SoapRequest {
    let body = format!("<ClassID>{}</ClassID>", p.class_id);
    build(
        RequestSpec {
            action: "GetClassVisits",
            service_path: CLASS_SERVICE,
            with_user_credentials: true,
            body: &body,
        },
        creds,
        site_id,
    )
}

pub fn get_sites(creds: &Credentials, site_id: i32) -> SoapRequest {
    build(
        RequestSpec {
            action: "GetSites",
            service_path: SITE_SERVICE,
            with_user_credentials: false,
            body: "<XMLDetail>Full</XMLDetail><PageSize>1000</PageSize><CurrentPageIndex>0</CurrentPageIndex>",
        },
        creds,
        site_id,
    )
}

pub fn get_locations(creds: &Credentials, site_id: i32) -> SoapRequest {
    build(
        RequestSpec {
            action: "GetLocations",
            service_path: SITE_SERVICE,
            with_user_credentials: false,
            body: "<XMLDetail>Full</XMLDetail><PageSize>1000</PageSize><CurrentPageIndex>0</CurrentPageIndex>",
        },
        creds,
        site_id,
    )
}

pub fn add_clients_to_classes(
    p: &ClassRosterParams,
    creds: &Credentials,
    site_id: i32,
) -> SoapRequest {
    let client_service_id = p.client_service_id.map(|id| id.to_string());
    let body = format!(
        "<XMLDetail>Full</XMLDetail>\
         {}{}\
         <SendEmail>false</SendEmail>\
         <Test>false</Test>\
         {}",
        string_list("ClientIDs", &p.client_ids),
        int_list("ClassIDs", &p.class_ids),
        opt_element("ClientServiceID", client_service_id.as_deref()),
    );
    build(
        RequestSpec {
            action: "AddClientsToClasses",
            service_path: CLASS_SERVICE,
            with_user_credentials: true,
            body: &body,
        },
        creds,
        site_id,
    )
}

pub fn remove_clients_from_classes(
    p: &ClassRosterParams,
    creds: &Credentials,
    site_id: i32,
) -> SoapRequest {
    let body = format!(
        "<XMLDetail>Full</XMLDetail>\
         {}{}\
         <SendEmail>false</SendEmail>\
         <LateCancel>{}</LateCancel>\
         <Test>false</Test>",
        string_list("ClientIDs", &p.client_ids),
        int_list("ClassIDs", &p.class_ids),
        p.late_cancel,
    );
    build(
        RequestSpec {
            action: "RemoveClientsFromClasses",
            service_path: CLASS_SERVICE,
            with_user_credentials: true,
            body: &body,
        },
        creds,
        site_id,
    )
}
