//! Typed action surface over the legacy SOAP backend.

use chrono::{Days, Utc};
use tracing::{info, warn};

use crate::backend::Backend;
use crate::config::{BridgeConfig, Credentials};
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

use super::request;
use super::response::{self, SaveClientsOutcome};
use super::transport::SoapTransport;

/// One legacy-backend facade, bound to a single site. Cheap to clone; the
/// underlying HTTP client is shared.
#[derive(Debug, Clone)]
pub struct SoapFacade {
    transport: SoapTransport,
    credentials: Credentials,
    site_id: i32,
}

impl SoapFacade {
    pub fn new(config: &BridgeConfig, site_id: i32) -> Result<Self, BridgeError> {
        let transport = SoapTransport::new(&config.soap_base_url, config.request_timeout)
            .map_err(|e| BridgeError::Config(e.message))?;
        Ok(Self {
            transport,
            credentials: config.credentials.clone(),
            site_id,
        })
    }

    pub fn site_id(&self) -> i32 {
        self.site_id
    }

    fn err(&self, action: &'static str, source: ApiError) -> BridgeError {
        BridgeError::backend(Backend::Legacy, action, source)
    }

    pub async fn get_clients(
        &self,
        params: &GetClientsParams,
    ) -> Result<Vec<ClientRecord>, BridgeError> {
        let req = request::get_clients(params, &self.credentials, self.site_id);
        let body = self
            .transport
            .execute(&req)
            .await
            .map_err(|e| self.err("GetClients", e))?;
        response::clients(&body).map_err(|e| self.err("GetClients", e))
    }

    /// Saves a client, retrying with suffixed email addresses when the backend
    /// reports a duplicate. The loop is bounded; exhaustion surfaces as
    /// [`ErrorKind::ConflictRetriesExhausted`].
    pub async fn add_or_update_clients(
        &self,
        params: &ClientParams,
    ) -> Result<Vec<ClientRecord>, BridgeError> {
        let mut email = params.email.clone();
        for attempt in 1..=MAX_EMAIL_CONFLICT_ATTEMPTS {
            let req = request::add_or_update_clients(params, &email, &self.credentials, self.site_id);
            let body = self
                .transport
                .execute(&req)
                .await
                .map_err(|e| self.err("AddOrUpdateClients", e))?;
            match response::add_or_update_clients(&body)
                .map_err(|e| self.err("AddOrUpdateClients", e))?
            {
                SaveClientsOutcome::Saved(clients) => {
                    if attempt > 1 {
                        info!(attempt, email = %email, "client saved with suffixed email");
                    }
                    return Ok(clients);
                }
                SaveClientsOutcome::EmailConflict => {
                    warn!(attempt, "duplicate email reported, suffixing and retrying");
                    email = next_conflict_email(&email);
                }
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
        let req = request::get_services(params, &self.credentials, self.site_id);
        let body = self
            .transport
            .execute(&req)
            .await
            .map_err(|e| self.err("GetServices", e))?;
        response::services(&body).map_err(|e| self.err("GetServices", e))
    }

    /// Scans the service catalog in backend order, returning the first match.
    /// `None` means no service matched, never a failure.
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
        let req = request::get_client_services(params, &self.credentials, self.site_id);
        let body = self
            .transport
            .execute(&req)
            .await
            .map_err(|e| self.err("GetClientServices", e))?;
        response::client_services(&body).map_err(|e| self.err("GetClientServices", e))
    }

    pub async fn update_client_services(
        &self,
        params: &UpdateClientServiceParams,
    ) -> Result<bool, BridgeError> {
        let req = request::update_client_services(params, &self.credentials, self.site_id);
        let body = self
            .transport
            .execute(&req)
            .await
            .map_err(|e| self.err("UpdateClientServices", e))?;
        response::success(&body).map_err(|e| self.err("UpdateClientServices", e))
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

    pub async fn checkout_shopping_cart(
        &self,
        params: &CheckoutParams,
    ) -> Result<bool, BridgeError> {
        let req = request::checkout_shopping_cart(params, &self.credentials, self.site_id);
        let body = self
            .transport
            .execute(&req)
            .await
            .map_err(|e| self.err("CheckoutShoppingCart", e))?;
        response::success(&body).map_err(|e| self.err("CheckoutShoppingCart", e))
    }

    pub async fn get_classes(
        &self,
        params: &GetClassesParams,
    ) -> Result<Vec<ClassRecord>, BridgeError> {
        let req = request::get_classes(params, &self.credentials, self.site_id);
        let body = self
            .transport
            .execute(&req)
            .await
            .map_err(|e| self.err("GetClasses", e))?;
        response::classes(&body).map_err(|e| self.err("GetClasses", e))
    }

    pub async fn get_class_schedules(
        &self,
        params: &GetClassSchedulesParams,
    ) -> Result<Vec<ClassScheduleRecord>, BridgeError> {
        let req = request::get_class_schedules(params, &self.credentials, self.site_id);
        let body = self
            .transport
            .execute(&req)
            .await
            .map_err(|e| self.err("GetClassSchedules", e))?;
        response::class_schedules(&body).map_err(|e| self.err("GetClassSchedules", e))
    }

    pub async fn get_class_visits(
        &self,
        params: &GetClassVisitsParams,
    ) -> Result<Vec<ClassVisitRecord>, BridgeError> {
        let req = request::get_class_visits(params, &self.credentials, self.site_id);
        let body = self
            .transport
            .execute(&req)
            .await
            .map_err(|e| self.err("GetClassVisits", e))?;
        response::class_visits(&body).map_err(|e| self.err("GetClassVisits", e))
    }

    pub async fn get_sites(&self) -> Result<Vec<SiteRecord>, BridgeError> {
        let req = request::get_sites(&self.credentials, self.site_id);
        let body = self
            .transport
            .execute(&req)
            .await
            .map_err(|e| self.err("GetSites", e))?;
        response::sites(&body).map_err(|e| self.err("GetSites", e))
    }

    pub async fn get_locations(&self) -> Result<Vec<LocationRecord>, BridgeError> {
        let req = request::get_locations(&self.credentials, self.site_id);
        let body = self
            .transport
            .execute(&req)
            .await
            .map_err(|e| self.err("GetLocations", e))?;
        response::locations(&body).map_err(|e| self.err("GetLocations", e))
    }

    pub async fn add_clients_to_classes(
        &self,
        params: &ClassRosterParams,
    ) -> Result<bool, BridgeError> {
        let req = request::add_clients_to_classes(params, &self.credentials, self.site_id);
        let body = self
            .transport
            .execute(&req)
            .await
            .map_err(|e| self.err("AddClientsToClasses", e))?;
        response::success(&body).map_err(|e| self.err("AddClientsToClasses", e))
    }

    pub async fn remove_clients_from_classes(
        &self,
        params: &ClassRosterParams,
    ) -> Result<bool, BridgeError> {
        let req = request::remove_clients_from_classes(params, &self.credentials, self.site_id);
        let body = self
            .transport
            .execute(&req)
            .await
            .map_err(|e| self.err("RemoveClientsFromClasses", e))?;
        response::success(&body).map_err(|e| self.err("RemoveClientsFromClasses", e))
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
