//! JSON request bodies, one per endpoint.
//!
//! Every POST body starts with `session_id`. Fields borrow from the caller's
//! values, so building a request never clones a subscriber record.

use serde::Serialize;

use crate::types::{ServicePlanUpdate, Subscriber};

#[derive(Serialize)]
pub(crate) struct ImsiBody<'a> {
    pub session_id: &'a str,
    pub imsi: u64,
}

#[derive(Serialize)]
pub(crate) struct SubIdBody<'a> {
    pub session_id: &'a str,
    pub sub_id: &'a str,
}

/// Descriptive fields shared by create and modify.
#[derive(Serialize)]
pub(crate) struct SubscriberFields<'a> {
    pub sub_name: &'a str,
    pub id_num: u64,
    pub phone_number: u64,
    pub email: &'a str,
    pub address: &'a str,
}

impl<'a> SubscriberFields<'a> {
    pub fn of(sub: &'a Subscriber) -> Self {
        Self {
            sub_name: &sub.sub_name,
            id_num: sub.id_num.unwrap_or_default(),
            phone_number: sub.phone_number.unwrap_or_default(),
            email: sub.email.as_deref().unwrap_or_default(),
            address: sub.address.as_deref().unwrap_or_default(),
        }
    }
}

#[derive(Serialize)]
pub(crate) struct SubscriberBody<'a> {
    pub session_id: &'a str,
    pub sub_id: &'a str,
    #[serde(flatten)]
    pub fields: SubscriberFields<'a>,
}

/// One entry of a bulk create; all seven fields, always.
#[derive(Serialize)]
pub(crate) struct BulkRecord<'a> {
    pub sub_id: &'a str,
    pub sub_name: &'a str,
    pub imsi: u64,
    pub id_num: u64,
    pub phone_number: u64,
    pub email: &'a str,
    pub address: &'a str,
}

impl<'a> From<&'a Subscriber> for BulkRecord<'a> {
    fn from(sub: &'a Subscriber) -> Self {
        Self {
            sub_id: &sub.sub_id,
            sub_name: &sub.sub_name,
            imsi: sub.imsi.unwrap_or_default(),
            id_num: sub.id_num.unwrap_or_default(),
            phone_number: sub.phone_number.unwrap_or_default(),
            email: sub.email.as_deref().unwrap_or_default(),
            address: sub.address.as_deref().unwrap_or_default(),
        }
    }
}

#[derive(Serialize)]
pub(crate) struct BulkCreateBody<'a> {
    pub session_id: &'a str,
    pub service_plan_id: &'a str,
    pub sub_list: Vec<BulkRecord<'a>>,
}

#[derive(Serialize)]
pub(crate) struct BindServiceBody<'a> {
    pub session_id: &'a str,
    pub sub_id: &'a str,
    pub service_plan_id: &'a str,
}

#[derive(Serialize)]
pub(crate) struct UpdateServiceBody<'a> {
    pub session_id: &'a str,
    pub sub_id: &'a str,
    pub new_service_plan_id: &'a str,
}

#[derive(Serialize)]
pub(crate) struct BindImsiBody<'a> {
    pub session_id: &'a str,
    pub sub_id: &'a str,
    pub imsi: u64,
}

/// Bulk activate/deactivate put the id list under `data`.
#[derive(Serialize)]
pub(crate) struct SubIdListBody<'a> {
    pub session_id: &'a str,
    pub data: &'a [String],
}

#[derive(Serialize)]
pub(crate) struct ModifyPlanBody<'a> {
    pub session_id: &'a str,
    #[serde(flatten)]
    pub plan: &'a ServicePlanUpdate,
}
