//! Outbound HTTP clients
//!
//! Each provider sits behind a trait so handlers can be tested with mocks.
//! All clients share one `reqwest::Client` built with the configured timeout.

pub mod auth_provider;
pub mod image_generation;
pub mod payments;

pub use auth_provider::{AuthProvider, ProviderSession, ProviderUser, RestAuthProvider, SignUpOutcome};
pub use image_generation::{
    build_prompt, GeminiImageClient, GeneratedImage, GenerationRequest, ImageGenerator,
};
pub use payments::{CheckoutSession, PaymentIntent, PaymentProcessor, StripeClient};

use crate::config::Config;
use std::time::Duration;

/// Shared HTTP client for all providers
pub fn build_http_client(config: &Config) -> reqwest::Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(config.http_timeout_secs))
        .user_agent(concat!("tryon-service/", env!("CARGO_PKG_VERSION")))
        .build()
}
