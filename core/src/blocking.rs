//! Blocking client that performs the HTTP round-trips.
//!
//! # Design
//! `BlockingBossClient` pairs a `BossClient` with a `Transport` and exposes
//! one method per remote operation. Operations on an existing subscriber take
//! a `SubscriberKey` and run in two explicit steps: `resolve` turns the key
//! into a subscriber id (issuing a lookup-by-IMSI only for `SubscriberKey::Imsi`),
//! then the primary request is sent. A failed resolution returns
//! `ApiError::ResolutionError` and the primary request is never issued.

use tracing::{debug, warn};

use crate::client::BossClient;
use crate::error::ApiError;
use crate::http::HttpRequest;
use crate::session::{Credentials, SessionContext, DEFAULT_BASE_URL};
use crate::transport::{Transport, UreqTransport};
use crate::types::{ApiResponse, ServicePlanUpdate, Subscriber, SubscriberKey};

/// Subscriber API client that executes requests on the calling thread.
#[derive(Debug, Clone)]
pub struct BlockingBossClient<T = UreqTransport> {
    client: BossClient,
    transport: T,
}

impl BlockingBossClient<UreqTransport> {
    /// Client for the hosted service, session stamped with the current hour.
    pub fn new(credentials: &Credentials) -> Self {
        Self::with_base_url(credentials, DEFAULT_BASE_URL)
    }

    pub fn with_base_url(credentials: &Credentials, base_url: &str) -> Self {
        Self::with_transport(
            BossClient::new(SessionContext::new(credentials, base_url)),
            UreqTransport::new(),
        )
    }
}

impl<T: Transport> BlockingBossClient<T> {
    pub fn with_transport(client: BossClient, transport: T) -> Self {
        Self { client, transport }
    }

    pub fn client(&self) -> &BossClient {
        &self.client
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Turn a key into a subscriber id.
    ///
    /// `SubId` is returned as-is without any request. `Imsi` costs exactly one
    /// lookup-by-IMSI call. An empty `SubId` identifies nobody and is
    /// `MissingIdentifier`.
    pub fn resolve(&self, key: &SubscriberKey) -> Result<String, ApiError> {
        let imsi = match key {
            SubscriberKey::SubId(sub_id) if sub_id.is_empty() => {
                return Err(ApiError::MissingIdentifier)
            }
            SubscriberKey::SubId(sub_id) => return Ok(sub_id.clone()),
            SubscriberKey::Imsi(imsi) => *imsi,
        };
        let request = self.client.build_query_by_imsi(imsi)?;
        let resolved = self
            .transport
            .execute(request)
            .map_err(|e| ApiError::ResolutionError {
                imsi,
                reason: e.to_string(),
            })
            .and_then(|response| self.client.parse_resolved_sub_id(imsi, response));
        match &resolved {
            Ok(sub_id) => debug!(imsi, sub_id = %sub_id, "resolved subscriber id"),
            Err(e) => warn!(imsi, error = %e, "subscriber resolution failed"),
        }
        resolved
    }

    pub fn query_by_imsi(&self, imsi: u64) -> Result<ApiResponse, ApiError> {
        self.send(self.client.build_query_by_imsi(imsi)?)
    }

    pub fn query_by_sub_id(&self, sub_id: &str) -> Result<ApiResponse, ApiError> {
        self.send(self.client.build_query_by_sub_id(sub_id)?)
    }

    pub fn create_subscriber(&self, sub: &Subscriber) -> Result<ApiResponse, ApiError> {
        self.send(self.client.build_create_subscriber(sub)?)
    }

    pub fn bulk_create_subscribers(
        &self,
        service_plan_id: &str,
        subs: &[Subscriber],
    ) -> Result<ApiResponse, ApiError> {
        self.send(self.client.build_bulk_create_subscribers(service_plan_id, subs)?)
    }

    pub fn bind_service_plan(
        &self,
        key: &SubscriberKey,
        service_plan_id: &str,
    ) -> Result<ApiResponse, ApiError> {
        let sub_id = self.resolve(key)?;
        self.send(self.client.build_bind_service_plan(&sub_id, service_plan_id)?)
    }

    pub fn update_service_plan(
        &self,
        key: &SubscriberKey,
        new_service_plan_id: &str,
    ) -> Result<ApiResponse, ApiError> {
        let sub_id = self.resolve(key)?;
        self.send(self.client.build_update_service_plan(&sub_id, new_service_plan_id)?)
    }

    pub fn bind_imsi(&self, sub_id: &str, imsi: u64) -> Result<ApiResponse, ApiError> {
        self.send(self.client.build_bind_imsi(sub_id, imsi)?)
    }

    pub fn unbind_imsi(&self, key: &SubscriberKey) -> Result<ApiResponse, ApiError> {
        let sub_id = self.resolve(key)?;
        self.send(self.client.build_unbind_imsi(&sub_id)?)
    }

    pub fn activate(&self, key: &SubscriberKey) -> Result<ApiResponse, ApiError> {
        let sub_id = self.resolve(key)?;
        self.send(self.client.build_activate(&sub_id)?)
    }

    pub fn bulk_activate(&self, sub_ids: &[String]) -> Result<ApiResponse, ApiError> {
        self.send(self.client.build_bulk_activate(sub_ids)?)
    }

    pub fn deactivate(&self, key: &SubscriberKey) -> Result<ApiResponse, ApiError> {
        let sub_id = self.resolve(key)?;
        self.send(self.client.build_deactivate(&sub_id)?)
    }

    pub fn bulk_deactivate(&self, sub_ids: &[String]) -> Result<ApiResponse, ApiError> {
        self.send(self.client.build_bulk_deactivate(sub_ids)?)
    }

    /// Modify a subscriber's descriptive fields, resolving through the
    /// record's own IMSI when its `sub_id` is empty.
    pub fn update_subscriber(&self, sub: &Subscriber) -> Result<ApiResponse, ApiError> {
        let sub_id = self.resolve(&sub.key()?)?;
        self.send(self.client.build_update_subscriber(&sub_id, sub)?)
    }

    pub fn delete_subscriber(&self, key: &SubscriberKey) -> Result<ApiResponse, ApiError> {
        let sub_id = self.resolve(key)?;
        self.send(self.client.build_delete_subscriber(&sub_id)?)
    }

    pub fn get_service_plans(&self) -> Result<ApiResponse, ApiError> {
        self.send(self.client.build_get_service_plans())
    }

    pub fn modify_service_plan(&self, plan: &ServicePlanUpdate) -> Result<ApiResponse, ApiError> {
        self.send(self.client.build_modify_service_plan(plan)?)
    }

    fn send(&self, request: HttpRequest) -> Result<ApiResponse, ApiError> {
        debug!(method = request.method.as_str(), path = %request.path, "sending request");
        let response = self.transport.execute(request)?;
        debug!(status = response.status, "received response");
        self.client.parse_response(response)
    }
}
