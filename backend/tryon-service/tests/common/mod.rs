#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tryon_service::clients::{
    AuthProvider, CheckoutSession, GeneratedImage, GenerationRequest, ImageGenerator,
    PaymentIntent, PaymentProcessor, ProviderSession, SignUpOutcome,
};
use tryon_service::db::{MemoryClientSessionStore, MemorySalonStore, MemoryStyleStore};
use tryon_service::models::{ClientSession, Salon};
use tryon_service::security::MemoryUsageLedger;
use tryon_service::{AppState, Config, Providers, Result, Stores, TryOnError};
use uuid::Uuid;

pub const SESSION_SECRET: &str = "integration-session-secret-0123456789";
pub const AUTH_SECRET: &str = "integration-provider-secret-0123456789";

/// Providers that are never expected to be called
pub struct Unreachable;

fn unreachable() -> TryOnError {
    TryOnError::Upstream("provider not available in tests".into())
}

#[async_trait]
impl AuthProvider for Unreachable {
    async fn sign_up(&self, _: &str, _: &str, _: &str) -> Result<SignUpOutcome> {
        Err(unreachable())
    }

    async fn sign_in_with_password(&self, _: &str, _: &str) -> Result<ProviderSession> {
        Err(unreachable())
    }

    async fn exchange_code(&self, _: &str, _: &str) -> Result<ProviderSession> {
        Err(unreachable())
    }
}

#[async_trait]
impl PaymentProcessor for Unreachable {
    async fn create_checkout_session(&self, _: &Salon, _: u32) -> Result<CheckoutSession> {
        Err(unreachable())
    }

    async fn create_payment_intent(&self, _: &Salon, _: u64, _: &str) -> Result<PaymentIntent> {
        Err(unreachable())
    }
}

#[async_trait]
impl ImageGenerator for Unreachable {
    async fn generate(&self, _: GenerationRequest) -> Result<GeneratedImage> {
        Err(unreachable())
    }
}

pub struct TestContext {
    pub state: AppState,
    pub ledger: Arc<MemoryUsageLedger>,
    pub salons: Arc<MemorySalonStore>,
    pub client_sessions: Arc<MemoryClientSessionStore>,
}

pub fn config() -> Config {
    Config::from_pairs(vec![
        ("SESSION_TOKEN_SECRET".to_string(), SESSION_SECRET.to_string()),
        ("AUTH_PROVIDER_JWT_SECRET".to_string(), AUTH_SECRET.to_string()),
    ])
    .unwrap()
}

pub fn context() -> TestContext {
    let ledger = Arc::new(MemoryUsageLedger::new());
    let salons = Arc::new(MemorySalonStore::new());
    let client_sessions = Arc::new(MemoryClientSessionStore::new());

    let stores = Stores {
        salons: salons.clone(),
        client_sessions: client_sessions.clone(),
        styles: Arc::new(MemoryStyleStore::with_default_catalog()),
    };
    let providers = Providers {
        auth: Arc::new(Unreachable),
        payments: Arc::new(Unreachable),
        images: Arc::new(Unreachable),
    };

    let state = AppState::new(Arc::new(config()), stores, ledger.clone(), providers).unwrap();
    TestContext {
        state,
        ledger,
        salons,
        client_sessions,
    }
}

pub fn salon(max_ai_uses: Option<i32>, session_duration: Option<i32>) -> Salon {
    let now = Utc::now();
    Salon {
        id: Uuid::new_v4(),
        owner_id: Uuid::new_v4(),
        name: "Studio Nine".into(),
        email: "owner@studio.test".into(),
        max_ai_uses,
        session_duration,
        subscription_status: "active".into(),
        stripe_customer_id: None,
        created_at: now,
        updated_at: now,
    }
}

pub fn client_session(count: i32, max: i32, expires_at: DateTime<Utc>) -> ClientSession {
    ClientSession {
        id: Uuid::new_v4(),
        salon_id: Uuid::new_v4(),
        ai_uses_count: count,
        max_ai_uses: max,
        session_duration_minutes: 15,
        expires_at,
        is_active: true,
        created_at: Utc::now(),
    }
}

#[macro_export]
macro_rules! init_app {
    ($state:expr) => {{
        let state = $state;
        let verifier = state.access_verifier.clone();
        actix_web::test::init_service(
            actix_web::App::new()
                .app_data(actix_web::web::Data::new(state))
                .configure(|cfg| tryon_service::routes::configure(cfg, verifier)),
        )
        .await
    }};
}
