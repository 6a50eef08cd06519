//! Shared fixtures for handler unit tests

use crate::clients::auth_provider::MockAuthProvider;
use crate::clients::image_generation::MockImageGenerator;
use crate::clients::payments::MockPaymentProcessor;
use crate::config::Config;
use crate::db::{MemoryClientSessionStore, MemorySalonStore, MemoryStyleStore};
use crate::models::Salon;
use crate::security::MemoryUsageLedger;
use crate::state::{AppState, Providers, Stores};
use chrono::{Duration, Utc};
use crypto_core::{AccessClaims, JwtKeys};
use std::sync::Arc;
use uuid::Uuid;

pub const SESSION_SECRET: &str = "handler-test-session-secret-0123456789";
pub const AUTH_SECRET: &str = "handler-test-provider-secret-0123456789";

pub struct Harness {
    pub state: AppState,
    pub ledger: Arc<MemoryUsageLedger>,
    pub salons: Arc<MemorySalonStore>,
    pub client_sessions: Arc<MemoryClientSessionStore>,
}

pub struct Mocks {
    pub auth: MockAuthProvider,
    pub payments: MockPaymentProcessor,
    pub images: MockImageGenerator,
}

impl Mocks {
    pub fn new() -> Self {
        Self {
            auth: MockAuthProvider::new(),
            payments: MockPaymentProcessor::new(),
            images: MockImageGenerator::new(),
        }
    }
}

pub fn config() -> Config {
    Config::from_pairs(vec![
        ("SESSION_TOKEN_SECRET".to_string(), SESSION_SECRET.to_string()),
        ("AUTH_PROVIDER_JWT_SECRET".to_string(), AUTH_SECRET.to_string()),
        ("INDIVIDUAL_MAX_AI_USES".to_string(), "3".to_string()),
    ])
    .unwrap()
}

pub fn harness(mocks: Mocks) -> Harness {
    let ledger = Arc::new(MemoryUsageLedger::new());
    let salons = Arc::new(MemorySalonStore::new());
    let client_sessions = Arc::new(MemoryClientSessionStore::new());

    let stores = Stores {
        salons: salons.clone(),
        client_sessions: client_sessions.clone(),
        styles: Arc::new(MemoryStyleStore::with_default_catalog()),
    };
    let providers = Providers {
        auth: Arc::new(mocks.auth),
        payments: Arc::new(mocks.payments),
        images: Arc::new(mocks.images),
    };

    let state = AppState::new(Arc::new(config()), stores, ledger.clone(), providers).unwrap();
    Harness {
        state,
        ledger,
        salons,
        client_sessions,
    }
}

pub fn salon(owner_id: Uuid) -> Salon {
    let now = Utc::now();
    Salon {
        id: Uuid::new_v4(),
        owner_id,
        name: "Studio Nine".into(),
        email: "owner@studio.test".into(),
        max_ai_uses: Some(4),
        session_duration: Some(30),
        subscription_status: "active".into(),
        stripe_customer_id: None,
        created_at: now,
        updated_at: now,
    }
}

pub fn owner_token(user_id: Uuid) -> String {
    let claims = AccessClaims {
        sub: user_id.to_string(),
        exp: (Utc::now() + Duration::hours(1)).timestamp(),
        iat: Some(Utc::now().timestamp()),
        aud: Some("authenticated".into()),
        email: Some("owner@studio.test".into()),
        role: Some("authenticated".into()),
    };
    JwtKeys::from_secret(AUTH_SECRET)
        .unwrap()
        .sign(&claims)
        .unwrap()
}

/// Build the full application for `actix_web::test`
#[macro_export]
macro_rules! test_app {
    ($state:expr) => {{
        let state = $state;
        let verifier = state.access_verifier.clone();
        actix_web::test::init_service(
            actix_web::App::new()
                .app_data(actix_web::web::Data::new(state))
                .configure(|cfg| $crate::routes::configure(cfg, verifier)),
        )
        .await
    }};
}
