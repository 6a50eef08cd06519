//! Try-on service library
//!
//! Backend for a salon "virtual hair try-on" product. Customers get
//! time-boxed sessions with a fixed number of AI generations:
//!
//! - individual users receive a stateless signed token
//! - a salon's kiosk customers receive a stored session whose limits the
//!   salon owner configures
//!
//! Salon owners authenticate through a hosted auth provider, manage their
//! session settings and QR code, and pay through the payment processor.

pub mod clients;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod models;
pub mod routes;
pub mod security;
pub mod services;
pub mod state;

#[cfg(test)]
pub(crate) mod test_support;

pub use config::Config;
pub use error::{Result, TryOnError};
pub use state::{AppState, Providers, Stores};
