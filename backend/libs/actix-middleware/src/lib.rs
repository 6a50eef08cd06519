//! # Actix Middleware Library
//!
//! Middleware components shared by the Tryon Actix services
//!
//! ## Modules
//! - `bearer_auth`: salon-owner access token authentication
//! - `correlation_id`: `X-Correlation-ID` propagation
//! - `metrics`: Prometheus HTTP metrics

pub mod bearer_auth;
pub mod correlation_id;
pub mod metrics;

pub use bearer_auth::{AuthenticatedOwner, BearerAuthMiddleware};
pub use correlation_id::{CorrelationId, CorrelationIdMiddleware, CORRELATION_ID_HEADER};
pub use metrics::MetricsMiddleware;
