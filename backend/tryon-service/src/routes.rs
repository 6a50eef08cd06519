use crate::error::TryOnError;
use crate::handlers::{auth, generation, health, payments, salons, sessions, styles};
use crate::metrics::serve_metrics;
use actix_middleware::BearerAuthMiddleware;
use actix_web::web;
use crypto_core::AccessTokenVerifier;
use std::sync::Arc;

/// Request body limit; base64 photos are about 4/3 of the decoded size
const JSON_BODY_LIMIT: usize = 16 * 1024 * 1024;

/// Malformed bodies answer with the standard error shape
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .limit(JSON_BODY_LIMIT)
        .error_handler(|err, _req| {
            TryOnError::InvalidArgument(format!("Invalid request body: {err}")).into()
        })
}

pub fn query_config() -> web::QueryConfig {
    web::QueryConfig::default().error_handler(|err, _req| {
        TryOnError::InvalidArgument(format!("Invalid query string: {err}")).into()
    })
}

pub fn configure(cfg: &mut web::ServiceConfig, verifier: Arc<AccessTokenVerifier>) {
    cfg.app_data(json_config())
        .app_data(query_config())
        .route("/health", web::get().to(health::health))
        .route("/ready", web::get().to(health::readiness))
        .route("/metrics", web::get().to(serve_metrics))
        // Sessions
        .route(
            "/api/individual/session/start",
            web::post().to(sessions::start_individual_session),
        )
        .route(
            "/api/individual/session/validate",
            web::post().to(sessions::validate_individual_session),
        )
        .route(
            "/api/client/session/start",
            web::post().to(sessions::start_client_session),
        )
        .route(
            "/api/client/session/validate",
            web::post().to(sessions::validate_client_session),
        )
        .route("/api/session/usage", web::post().to(sessions::record_usage))
        .route("/api/tryon/generate", web::post().to(generation::generate))
        .route("/api/styles", web::get().to(styles::list_styles))
        // Auth
        .service(
            web::scope("/api/auth")
                .route("/signup", web::post().to(auth::sign_up))
                .route("/login", web::post().to(auth::login))
                .route("/oauth/exchange", web::post().to(auth::oauth_exchange)),
        )
        // Salon owner
        .service(
            web::scope("/api/salons/me")
                .wrap(BearerAuthMiddleware::new(verifier.clone()))
                .route("", web::get().to(salons::get_my_salon))
                .route("/settings", web::put().to(salons::update_settings))
                .route("/qr", web::get().to(salons::get_qr_code)),
        )
        .route(
            "/api/salons/{salon_id}/public",
            web::get().to(salons::get_public_salon),
        )
        .service(
            web::scope("/api/payments")
                .wrap(BearerAuthMiddleware::new(verifier))
                .route("/checkout", web::post().to(payments::create_checkout))
                .route("/intent", web::post().to(payments::create_payment_intent)),
        );
}
