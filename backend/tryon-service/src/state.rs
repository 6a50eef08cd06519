use crate::clients::{
    AuthProvider, GeminiImageClient, ImageGenerator, PaymentProcessor, RestAuthProvider,
    StripeClient,
};
use crate::config::Config;
use crate::db::{
    ClientSessionStore, MemoryClientSessionStore, MemorySalonStore, MemoryStyleStore,
    PgClientSessionStore, PgSalonStore, PgStyleStore, SalonStore, StyleStore,
};
use crate::security::UsageLedger;
use crate::services::{ClientSessions, IndividualSessions, SalonQrService, SessionManager};
use crypto_core::{AccessTokenVerifier, JwtError, JwtKeys};
use redis_utils::SharedConnectionManager;
use sqlx::PgPool;
use std::sync::Arc;

/// Persistence backends
#[derive(Clone)]
pub struct Stores {
    pub salons: Arc<dyn SalonStore>,
    pub client_sessions: Arc<dyn ClientSessionStore>,
    pub styles: Arc<dyn StyleStore>,
}

impl Stores {
    pub fn postgres(pool: PgPool) -> Self {
        Self {
            salons: Arc::new(PgSalonStore::new(pool.clone())),
            client_sessions: Arc::new(PgClientSessionStore::new(pool.clone())),
            styles: Arc::new(PgStyleStore::new(pool)),
        }
    }

    pub fn in_memory() -> Self {
        Self {
            salons: Arc::new(MemorySalonStore::new()),
            client_sessions: Arc::new(MemoryClientSessionStore::new()),
            styles: Arc::new(MemoryStyleStore::with_default_catalog()),
        }
    }
}

/// External providers
#[derive(Clone)]
pub struct Providers {
    pub auth: Arc<dyn AuthProvider>,
    pub payments: Arc<dyn PaymentProcessor>,
    pub images: Arc<dyn ImageGenerator>,
}

impl Providers {
    pub fn from_config(config: &Config, http: reqwest::Client) -> Self {
        Self {
            auth: Arc::new(RestAuthProvider::new(
                http.clone(),
                config.auth_provider_url.clone(),
                config.auth_provider_anon_key.clone(),
            )),
            payments: Arc::new(StripeClient::new(
                http.clone(),
                config.stripe_secret_key.clone(),
                config.stripe_api_base.clone(),
                config.stripe_price_id.clone(),
                config.checkout_success_url.clone(),
                config.checkout_cancel_url.clone(),
            )),
            images: Arc::new(GeminiImageClient::new(
                http,
                config.gemini_api_key.clone(),
                config.gemini_api_base.clone(),
                config.gemini_model.clone(),
            )),
        }
    }
}

/// Shared application state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub sessions: SessionManager,
    pub salons: Arc<dyn SalonStore>,
    pub styles: Arc<dyn StyleStore>,
    pub providers: Providers,
    pub qr: SalonQrService,
    pub access_verifier: Arc<AccessTokenVerifier>,
    /// Present when running against PostgreSQL; checked by `/ready`
    pub db: Option<PgPool>,
    /// Present when the usage ledger lives in Redis; checked by `/ready`
    pub redis: Option<SharedConnectionManager>,
}

impl AppState {
    pub fn new(
        config: Arc<Config>,
        stores: Stores,
        ledger: Arc<dyn UsageLedger>,
        providers: Providers,
    ) -> Result<Self, JwtError> {
        let individual = IndividualSessions::new(
            JwtKeys::from_secret(&config.session_token_secret)?,
            ledger,
            config.individual_limits(),
        );
        let client = ClientSessions::new(
            stores.salons.clone(),
            stores.client_sessions.clone(),
            config.default_client_limits(),
        );
        let access_verifier = AccessTokenVerifier::new(
            JwtKeys::from_secret(&config.auth_provider_jwt_secret)?,
            config.auth_audience.clone(),
        );

        Ok(Self {
            sessions: SessionManager::new(Arc::new(individual), Arc::new(client)),
            salons: stores.salons,
            styles: stores.styles,
            providers,
            qr: SalonQrService::new(config.public_base_url.clone()),
            access_verifier: Arc::new(access_verifier),
            db: None,
            redis: None,
            config,
        })
    }

    pub fn with_postgres(mut self, pool: PgPool) -> Self {
        self.db = Some(pool);
        self
    }

    pub fn with_redis(mut self, redis: SharedConnectionManager) -> Self {
        self.redis = Some(redis);
        self
    }
}
