//! Stateless HTTP request builder and response parser for the subscriber API.
//!
//! # Design
//! `BossClient` holds only the immutable `SessionContext`. Each operation has a
//! `build_*` method that produces an `HttpRequest`; every response goes through
//! the same `parse_response`, because the remote service's status codes are
//! passed back to the caller rather than interpreted here.
//!
//! Operations that act on an existing subscriber take an already-resolved
//! `sub_id`. Turning an IMSI into a `sub_id` is a separate step:
//! `build_query_by_imsi` followed by `parse_resolved_sub_id`.

use serde::Serialize;
use serde_json::Value;

use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::payload::{
    BindImsiBody, BindServiceBody, BulkCreateBody, BulkRecord, ImsiBody, ModifyPlanBody,
    SubIdBody, SubIdListBody, SubscriberBody, SubscriberFields, UpdateServiceBody,
};
use crate::session::SessionContext;
use crate::types::{ApiResponse, ServicePlanUpdate, Subscriber};

/// Endpoint paths relative to the base URL.
pub mod paths {
    pub const QUERY_BY_IMSI: &str = "customers/query";
    pub const QUERY_BY_SUB_ID: &str = "customers/querybyid";
    pub const CREATE: &str = "customers/create";
    pub const BULK_CREATE: &str = "customers/bulkcreate";
    pub const BIND_SERVICE: &str = "customers/bindservice";
    pub const UPDATE_SERVICE: &str = "customers/update";
    pub const BIND_IMSI: &str = "customers/bindimsi";
    pub const UNBIND_IMSI: &str = "customers/unbindimsi";
    pub const ACTIVATE: &str = "customers/activate";
    pub const BULK_ACTIVATE: &str = "customers/bulkactivate";
    pub const DEACTIVATE: &str = "customers/deactivate";
    pub const BULK_DEACTIVATE: &str = "customers/bulkdeactivate";
    pub const MODIFY: &str = "customers/modify";
    pub const DELETE: &str = "customers/delete";
    pub const QUERY_ALL_PLANS: &str = "products/queryallplans";
    pub const MODIFY_PLAN: &str = "products/modify";
}

/// Synchronous, stateless client for the subscriber API.
///
/// Builds `HttpRequest` values and parses `HttpResponse` values without
/// touching the network.
#[derive(Debug, Clone)]
pub struct BossClient {
    session: SessionContext,
}

impl BossClient {
    pub fn new(session: SessionContext) -> Self {
        Self { session }
    }

    pub fn session(&self) -> &SessionContext {
        &self.session
    }

    pub fn build_query_by_imsi(&self, imsi: u64) -> Result<HttpRequest, ApiError> {
        self.post(
            paths::QUERY_BY_IMSI,
            &ImsiBody {
                session_id: self.session.session_id(),
                imsi,
            },
        )
    }

    pub fn build_query_by_sub_id(&self, sub_id: &str) -> Result<HttpRequest, ApiError> {
        self.post(paths::QUERY_BY_SUB_ID, &self.sub_id_body(sub_id))
    }

    /// The record's `imsi` is not sent; bind it with `build_bind_imsi`.
    pub fn build_create_subscriber(&self, sub: &Subscriber) -> Result<HttpRequest, ApiError> {
        self.post(
            paths::CREATE,
            &SubscriberBody {
                session_id: self.session.session_id(),
                sub_id: &sub.sub_id,
                fields: SubscriberFields::of(sub),
            },
        )
    }

    pub fn build_bulk_create_subscribers(
        &self,
        service_plan_id: &str,
        subs: &[Subscriber],
    ) -> Result<HttpRequest, ApiError> {
        self.post(
            paths::BULK_CREATE,
            &BulkCreateBody {
                session_id: self.session.session_id(),
                service_plan_id,
                sub_list: subs.iter().map(BulkRecord::from).collect(),
            },
        )
    }

    pub fn build_bind_service_plan(
        &self,
        sub_id: &str,
        service_plan_id: &str,
    ) -> Result<HttpRequest, ApiError> {
        self.post(
            paths::BIND_SERVICE,
            &BindServiceBody {
                session_id: self.session.session_id(),
                sub_id,
                service_plan_id,
            },
        )
    }

    pub fn build_update_service_plan(
        &self,
        sub_id: &str,
        new_service_plan_id: &str,
    ) -> Result<HttpRequest, ApiError> {
        self.post(
            paths::UPDATE_SERVICE,
            &UpdateServiceBody {
                session_id: self.session.session_id(),
                sub_id,
                new_service_plan_id,
            },
        )
    }

    pub fn build_bind_imsi(&self, sub_id: &str, imsi: u64) -> Result<HttpRequest, ApiError> {
        self.post(
            paths::BIND_IMSI,
            &BindImsiBody {
                session_id: self.session.session_id(),
                sub_id,
                imsi,
            },
        )
    }

    pub fn build_unbind_imsi(&self, sub_id: &str) -> Result<HttpRequest, ApiError> {
        self.post(paths::UNBIND_IMSI, &self.sub_id_body(sub_id))
    }

    pub fn build_activate(&self, sub_id: &str) -> Result<HttpRequest, ApiError> {
        self.post(paths::ACTIVATE, &self.sub_id_body(sub_id))
    }

    pub fn build_bulk_activate(&self, sub_ids: &[String]) -> Result<HttpRequest, ApiError> {
        self.post(paths::BULK_ACTIVATE, &self.sub_id_list_body(sub_ids))
    }

    pub fn build_deactivate(&self, sub_id: &str) -> Result<HttpRequest, ApiError> {
        self.post(paths::DEACTIVATE, &self.sub_id_body(sub_id))
    }

    pub fn build_bulk_deactivate(&self, sub_ids: &[String]) -> Result<HttpRequest, ApiError> {
        self.post(paths::BULK_DEACTIVATE, &self.sub_id_list_body(sub_ids))
    }

    /// `sub_id` is the resolved identifier; the record's own `sub_id` is ignored.
    pub fn build_update_subscriber(
        &self,
        sub_id: &str,
        sub: &Subscriber,
    ) -> Result<HttpRequest, ApiError> {
        self.post(
            paths::MODIFY,
            &SubscriberBody {
                session_id: self.session.session_id(),
                sub_id,
                fields: SubscriberFields::of(sub),
            },
        )
    }

    pub fn build_delete_subscriber(&self, sub_id: &str) -> Result<HttpRequest, ApiError> {
        self.post(paths::DELETE, &self.sub_id_body(sub_id))
    }

    /// Plain GET: no body, so no `session_id` either.
    pub fn build_get_service_plans(&self) -> HttpRequest {
        HttpRequest {
            method: HttpMethod::Get,
            path: self.session.url(paths::QUERY_ALL_PLANS),
            headers: self.session.headers(),
            body: None,
        }
    }

    pub fn build_modify_service_plan(
        &self,
        plan: &ServicePlanUpdate,
    ) -> Result<HttpRequest, ApiError> {
        self.post(
            paths::MODIFY_PLAN,
            &ModifyPlanBody {
                session_id: self.session.session_id(),
                plan,
            },
        )
    }

    /// Decode any response into the `{data, status}` envelope.
    ///
    /// The status code is not inspected. Only a body that is not JSON fails.
    pub fn parse_response(&self, response: HttpResponse) -> Result<ApiResponse, ApiError> {
        let data = serde_json::from_str(&response.body)
            .map_err(|e| ApiError::DeserializationError(e.to_string()))?;
        Ok(ApiResponse {
            data,
            status: response.status,
        })
    }

    /// Extract `sub_id` from a lookup-by-IMSI response.
    ///
    /// Every failure is reported as `ResolutionError` so it cannot be mistaken
    /// for a failure of the request that needed the id.
    pub fn parse_resolved_sub_id(
        &self,
        imsi: u64,
        response: HttpResponse,
    ) -> Result<String, ApiError> {
        let envelope = self
            .parse_response(response)
            .map_err(|e| ApiError::ResolutionError {
                imsi,
                reason: e.to_string(),
            })?;
        let sub_id = match envelope.data.get("sub_id") {
            Some(Value::String(id)) if !id.is_empty() => Some(id.clone()),
            // Integral ids only; `1001.0` is not a subscriber id.
            Some(Value::Number(id)) => id.as_u64().map(|id| id.to_string()),
            _ => None,
        };
        sub_id.ok_or_else(|| ApiError::ResolutionError {
            imsi,
            reason: format!(
                "lookup returned status {} without a sub_id",
                envelope.status
            ),
        })
    }

    fn sub_id_body<'a>(&'a self, sub_id: &'a str) -> SubIdBody<'a> {
        SubIdBody {
            session_id: self.session.session_id(),
            sub_id,
        }
    }

    fn sub_id_list_body<'a>(&'a self, sub_ids: &'a [String]) -> SubIdListBody<'a> {
        SubIdListBody {
            session_id: self.session.session_id(),
            data: sub_ids,
        }
    }

    fn post<T: Serialize>(&self, path: &str, body: &T) -> Result<HttpRequest, ApiError> {
        let body =
            serde_json::to_string(body).map_err(|e| ApiError::SerializationError(e.to_string()))?;
        let mut headers = self.session.headers();
        headers.push(("content-type".to_string(), "application/json".to_string()));
        Ok(HttpRequest {
            method: HttpMethod::Post,
            path: self.session.url(path),
            headers,
            body: Some(body),
        })
    }
}
