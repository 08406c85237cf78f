//! Client library for a telecom subscriber-management HTTP API.
//!
//! # Overview
//! `BossClient` builds `HttpRequest` values and decodes `HttpResponse` values
//! without touching the network (host-does-IO pattern).
//! `BlockingBossClient` runs those requests through a `Transport`, `ureq` by
//! default, and returns every answer as an `ApiResponse { data, status }`
//! envelope, whatever the status code.
//!
//! # Design
//! - Header values and the `session_id` are derived once into an immutable
//!   `SessionContext` and reused for every call.
//! - Operations on existing subscribers take a `SubscriberKey`. An IMSI key is
//!   resolved to a subscriber id by an explicit lookup before the primary
//!   request; resolution failures are `ApiError::ResolutionError`.
//! - No retries, caching or local validation. Transport and decode failures
//!   surface unchanged.

pub mod blocking;
pub mod client;
pub mod error;
pub mod http;
mod payload;
pub mod session;
pub mod transport;
pub mod types;

pub use blocking::BlockingBossClient;
pub use client::BossClient;
pub use error::ApiError;
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use session::{Credentials, SessionContext, DEFAULT_BASE_URL};
pub use transport::{Transport, UreqTransport};
pub use types::{ApiResponse, ServicePlanUpdate, Subscriber, SubscriberKey};
