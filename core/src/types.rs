//! Domain types for the subscriber API.
//!
//! # Design
//! Optional subscriber attributes are `Option`s so that "not provided" is never
//! confused with a legitimate zero. The remote service still expects every
//! listed field to be present, so absent values go out as `0` or `""` (see
//! `payload`).

use serde::{Deserialize, Serialize};

use crate::error::ApiError;

/// A subscriber as the caller describes it to the remote service.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Subscriber {
    /// Caller-assigned identifier. Must be unique on the remote side.
    pub sub_id: String,
    pub sub_name: String,
    pub imsi: Option<u64>,
    /// External reference number.
    pub id_num: Option<u64>,
    pub phone_number: Option<u64>,
    pub email: Option<String>,
    pub address: Option<String>,
}

impl Subscriber {
    pub fn new(sub_id: &str, sub_name: &str) -> Self {
        Self {
            sub_id: sub_id.to_string(),
            sub_name: sub_name.to_string(),
            ..Self::default()
        }
    }

    pub fn with_imsi(mut self, imsi: u64) -> Self {
        self.imsi = Some(imsi);
        self
    }

    pub fn with_id_num(mut self, id_num: u64) -> Self {
        self.id_num = Some(id_num);
        self
    }

    pub fn with_phone_number(mut self, phone_number: u64) -> Self {
        self.phone_number = Some(phone_number);
        self
    }

    pub fn with_email(mut self, email: &str) -> Self {
        self.email = Some(email.to_string());
        self
    }

    pub fn with_address(mut self, address: &str) -> Self {
        self.address = Some(address.to_string());
        self
    }

    /// The key that identifies this record remotely: its own `sub_id`, or its
    /// IMSI when `sub_id` is empty.
    pub fn key(&self) -> Result<SubscriberKey, ApiError> {
        SubscriberKey::from_parts(Some(&self.sub_id), self.imsi)
    }
}

/// How the caller identifies an existing subscriber.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubscriberKey {
    SubId(String),
    /// Resolved to a subscriber id with a lookup-by-IMSI before use.
    Imsi(u64),
}

impl SubscriberKey {
    /// Pick a key from loosely supplied parts. A non-empty subscriber id always
    /// wins over an IMSI.
    pub fn from_parts(sub_id: Option<&str>, imsi: Option<u64>) -> Result<Self, ApiError> {
        match (sub_id.filter(|id| !id.is_empty()), imsi) {
            (Some(id), _) => Ok(SubscriberKey::SubId(id.to_string())),
            (None, Some(imsi)) => Ok(SubscriberKey::Imsi(imsi)),
            (None, None) => Err(ApiError::MissingIdentifier),
        }
    }
}

impl From<&str> for SubscriberKey {
    fn from(sub_id: &str) -> Self {
        SubscriberKey::SubId(sub_id.to_string())
    }
}

impl From<String> for SubscriberKey {
    fn from(sub_id: String) -> Self {
        SubscriberKey::SubId(sub_id)
    }
}

/// New attributes for an existing service plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServicePlanUpdate {
    pub service_plan_id: String,
    pub service_plan_name: String,
    pub uplink: u64,
    pub downlink: u64,
}

/// What every operation returns: the decoded body and the HTTP status, as-is.
///
/// A 4xx or 5xx from the remote service is still an `Ok(ApiResponse)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiResponse {
    pub data: serde_json::Value,
    pub status: u16,
}

impl ApiResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}
