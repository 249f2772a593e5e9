//! Typed action surface over the REST backend.

use chrono::{Days, Utc};
use tracing::{info, warn};

use crate::backend::Backend;
use crate::config::BridgeConfig;
use crate::conflict::{next_conflict_email, MAX_EMAIL_CONFLICT_ATTEMPTS};
use crate::error::{ApiError, BridgeError, ErrorKind};
use crate::filter::ServiceMatcher;
use crate::params::{
    ActionCall, CheckoutParams, ClassRosterParams, ClientParams, GetClassSchedulesParams,
    GetClassVisitsParams, GetClassesParams, GetClientServicesParams, GetClientsParams,
    GetServicesParams, UpdateClientServiceParams, VoidClientServiceParams,
};
use crate::records::{
    ActionOutput, ClassRecord, ClassScheduleRecord, ClassVisitRecord, ClientRecord,
    ClientServiceRecord, LocationRecord, ServiceRecord, SiteRecord,
};

use super::request::{self, RestRequest};
use super::response;
use super::token::TokenManager;
use super::transport::RestTransport;

/// One REST-backend facade, bound to a single site. A fresh bearer token is
/// acquired before every business call; token failures short-circuit the call.
#[derive(Debug)]
pub struct RestFacade {
    transport: RestTransport,
    token: TokenManager,
    site_id: i32,
}

impl RestFacade {
    pub fn new(config: &BridgeConfig, site_id: i32) -> Result<Self, BridgeError> {
        let transport = RestTransport::new(
            &config.rest_base_url,
            &config.credentials.api_key,
            site_id,
            config.request_timeout,
        )
        .map_err(|e| BridgeError::Config(e.message))?;
        let token = TokenManager::new(
            transport.clone(),
            &config.credentials.username,
            &config.credentials.password,
        );
        Ok(Self {
            transport,
            token,
            site_id,
        })
    }

    pub fn site_id(&self) -> i32 {
        self.site_id
    }

    fn err(&self, action: &'static str, source: ApiError) -> BridgeError {
        BridgeError::backend(Backend::Rest, action, source)
    }

    /// Token acquisition then the request itself; all business calls funnel
    /// through here.
    async fn authed(
        &self,
        action: &'static str,
        req: &RestRequest,
    ) -> Result<serde_json::Value, BridgeError> {
        let bearer = self.token.ensure().await.map_err(|e| self.err(action, e))?;
        self.transport
            .execute(req, Some(&bearer))
            .await
            .map_err(|e| self.err(action, e))
    }

    pub async fn get_clients(
        &self,
        params: &GetClientsParams,
    ) -> Result<Vec<ClientRecord>, BridgeError> {
        let json = self.authed("GetClients", &request::get_clients(params)).await?;
        Ok(response::clients(&json))
    }

    /// Saves a client, retrying with suffixed email addresses while the
    /// backend answers 400 (its duplicate-email signal). Bounded; exhaustion
    /// surfaces as [`ErrorKind::ConflictRetriesExhausted`].
    pub async fn add_or_update_clients(
        &self,
        params: &ClientParams,
    ) -> Result<Vec<ClientRecord>, BridgeError> {
        let mut email = params.email.clone();
        for attempt in 1..=MAX_EMAIL_CONFLICT_ATTEMPTS {
            let req = request::add_or_update_clients(params, &email);
            match self.authed("AddOrUpdateClients", &req).await {
                Ok(json) => {
                    if attempt > 1 {
                        info!(attempt, email = %email, "client saved with suffixed email");
                    }
                    return Ok(response::saved_client(&json));
                }
                Err(e) if e.kind() == ErrorKind::Conflict => {
                    warn!(attempt, "duplicate email reported, suffixing and retrying");
                    email = next_conflict_email(&email);
                }
                Err(e) => return Err(e),
            }
        }
        Err(self.err(
            "AddOrUpdateClients",
            ApiError::new(
                ErrorKind::ConflictRetriesExhausted,
                format!("email still conflicting after {MAX_EMAIL_CONFLICT_ATTEMPTS} attempts"),
            ),
        ))
    }

    pub async fn get_services(
        &self,
        params: &GetServicesParams,
    ) -> Result<Vec<ServiceRecord>, BridgeError> {
        let json = self
            .authed("GetServices", &request::get_services(params))
            .await?;
        Ok(response::services(&json))
    }

    /// Scans the service catalog in backend order, returning the first match.
    pub async fn find_service<M: ServiceMatcher>(
        &self,
        params: &GetServicesParams,
        matcher: &mut M,
    ) -> Result<Option<ServiceRecord>, BridgeError> {
        let services = self.get_services(params).await?;
        Ok(services.into_iter().find(|s| matcher.matches(s)))
    }

    pub async fn get_client_services(
        &self,
        params: &GetClientServicesParams,
    ) -> Result<Vec<ClientServiceRecord>, BridgeError> {
        let json = self
            .authed("GetClientServices", &request::get_client_services(params))
            .await?;
        Ok(response::client_services(&json))
    }

    pub async fn update_client_services(
        &self,
        params: &UpdateClientServiceParams,
    ) -> Result<bool, BridgeError> {
        self.authed(
            "UpdateClientServices",
            &request::update_client_service(params),
        )
        .await?;
        Ok(true)
    }

    /// Retroactively expires a purchased service by rewriting its active
    /// window to the recent past.
    pub async fn void_client_service(
        &self,
        params: &VoidClientServiceParams,
    ) -> Result<bool, BridgeError> {
        let today = Utc::now().date_naive();
        let update = UpdateClientServiceParams {
            client_service_id: params.client_service_id,
            active_date: today - Days::new(3),
            expiration_date: today - Days::new(2),
            site_id: params.site_id,
        };
        self.update_client_services(&update).await
    }

    /// Checkout needs a location id the caller never supplies; resolve it
    /// from the site's locations, falling back to 1.
    pub async fn checkout_shopping_cart(
        &self,
        params: &CheckoutParams,
    ) -> Result<bool, BridgeError> {
        let locations = self.get_locations().await?;
        let location_id = locations
            .first()
            .and_then(|l| l.id.parse().ok())
            .unwrap_or(1);
        self.authed(
            "CheckoutShoppingCart",
            &request::checkout_shopping_cart(params, location_id),
        )
        .await?;
        Ok(true)
    }

    pub async fn get_classes(
        &self,
        params: &GetClassesParams,
    ) -> Result<Vec<ClassRecord>, BridgeError> {
        let json = self.authed("GetClasses", &request::get_classes(params)).await?;
        Ok(response::classes(&json))
    }

    pub async fn get_class_schedules(
        &self,
        params: &GetClassSchedulesParams,
    ) -> Result<Vec<ClassScheduleRecord>, BridgeError> {
        let json = self
            .authed("GetClassSchedules", &request::get_class_schedules(params))
            .await?;
        Ok(response::class_schedules(&json))
    }

    pub async fn get_class_visits(
        &self,
        params: &GetClassVisitsParams,
    ) -> Result<Vec<ClassVisitRecord>, BridgeError> {
        let json = self
            .authed("GetClassVisits", &request::get_class_visits(params.class_id))
            .await?;
        Ok(response::class_visits(&json))
    }

    pub async fn get_sites(&self) -> Result<Vec<SiteRecord>, BridgeError> {
        let json = self.authed("GetSites", &request::get_sites()).await?;
        Ok(response::sites(&json))
    }

    pub async fn get_locations(&self) -> Result<Vec<LocationRecord>, BridgeError> {
        let json = self.authed("GetLocations", &request::get_locations()).await?;
        Ok(response::locations(&json))
    }

    /// The REST endpoint books one client into one class per call; fan out
    /// over every pair and report success if at least one booking landed.
    pub async fn add_clients_to_classes(
        &self,
        params: &ClassRosterParams,
    ) -> Result<bool, BridgeError> {
        let mut any_succeeded = false;
        let mut last_err = None;
        for client_id in &params.client_ids {
            for class_id in &params.class_ids {
                let req = request::add_client_to_class(client_id, *class_id);
                match self.authed("AddClientsToClasses", &req).await {
                    Ok(_) => any_succeeded = true,
                    Err(e) => {
                        warn!(client_id = %client_id, class_id, error = %e, "booking failed");
                        last_err = Some(e);
                    }
                }
            }
        }
        match (any_succeeded, last_err) {
            (true, _) => Ok(true),
            (false, Some(e)) => Err(e),
            (false, None) => Ok(false),
        }
    }

    pub async fn remove_clients_from_classes(
        &self,
        params: &ClassRosterParams,
    ) -> Result<bool, BridgeError> {
        let json = self
            .authed(
                "RemoveClientsFromClasses",
                &request::remove_clients_from_classes(params),
            )
            .await?;
        let errors = response::removal_errors(&json);
        if !errors.is_empty() {
            warn!(?errors, "removal partially failed");
            return Ok(false);
        }
        Ok(true)
    }

    /// Dispatch entry point: routes a logical call to the matching typed method.
    pub async fn call(&self, action: &ActionCall) -> Result<ActionOutput, BridgeError> {
        match action {
            ActionCall::GetClients(p) => Ok(ActionOutput::Clients(self.get_clients(p).await?)),
            ActionCall::AddOrUpdateClients(p) => {
                Ok(ActionOutput::Clients(self.add_or_update_clients(p).await?))
            }
            ActionCall::GetServices(p) => Ok(ActionOutput::Services(self.get_services(p).await?)),
            ActionCall::GetClientServices(p) => Ok(ActionOutput::ClientServices(
                self.get_client_services(p).await?,
            )),
            ActionCall::UpdateClientServices(p) => {
                Ok(ActionOutput::Success(self.update_client_services(p).await?))
            }
            ActionCall::CheckoutShoppingCart(p) => {
                Ok(ActionOutput::Success(self.checkout_shopping_cart(p).await?))
            }
            ActionCall::GetClasses(p) => Ok(ActionOutput::Classes(self.get_classes(p).await?)),
            ActionCall::GetClassSchedules(p) => Ok(ActionOutput::ClassSchedules(
                self.get_class_schedules(p).await?,
            )),
            ActionCall::GetClassVisits(p) => {
                Ok(ActionOutput::ClassVisits(self.get_class_visits(p).await?))
            }
            ActionCall::GetSites(_) => Ok(ActionOutput::Sites(self.get_sites().await?)),
            ActionCall::GetLocations(_) => Ok(ActionOutput::Locations(self.get_locations().await?)),
            ActionCall::AddClientsToClasses(p) => {
                Ok(ActionOutput::Success(self.add_clients_to_classes(p).await?))
            }
            ActionCall::RemoveClientsFromClasses(p) => Ok(ActionOutput::Success(
                self.remove_clients_from_classes(p).await?,
            )),
            ActionCall::FindService { params, filter } => Ok(ActionOutput::Service(
                self.find_service(params, &mut |s: &ServiceRecord| filter.matches(s))
                    .await?,
            )),
            ActionCall::VoidClientService(p) => {
                Ok(ActionOutput::Success(self.void_client_service(p).await?))
            }
        }
    }
}
