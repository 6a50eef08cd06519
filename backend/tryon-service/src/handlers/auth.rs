/// Auth handlers - relay salon-owner credentials to the auth provider
use crate::clients::ProviderSession;
use crate::error::{Result, TryOnError};
use crate::state::AppState;
use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct SignUpRequest {
    #[validate(email(message = "email must be a valid address"))]
    pub email: String,
    #[validate(length(min = 8, max = 128, message = "password must be 8 to 128 characters"))]
    pub password: String,
    #[validate(length(min = 1, max = 100, message = "salon_name must be 1 to 100 characters"))]
    pub salon_name: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "email must be a valid address"))]
    pub email: String,
    #[validate(length(min = 1, message = "password is required"))]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct OAuthExchangeRequest {
    #[validate(length(min = 1, message = "auth_code is required"))]
    pub auth_code: String,
    #[validate(length(min = 43, max = 128, message = "code_verifier must be 43 to 128 characters"))]
    pub code_verifier: String,
}

#[derive(Debug, Serialize)]
pub struct SignUpResponse {
    pub user_id: Uuid,
    pub salon_id: Uuid,
    pub email_confirmation_required: bool,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_in: i64,
    pub user_id: Uuid,
    pub salon_id: Option<Uuid>,
}

impl LoginResponse {
    fn new(session: ProviderSession, salon_id: Option<Uuid>) -> Self {
        Self {
            access_token: session.access_token,
            refresh_token: session.refresh_token,
            expires_in: session.expires_in,
            user_id: session.user.id,
            salon_id,
        }
    }
}

/// Register a salon owner and create their salon
pub async fn sign_up(
    state: web::Data<AppState>,
    req: web::Json<SignUpRequest>,
) -> Result<HttpResponse> {
    req.validate()?;

    let email = req.email.trim().to_lowercase();
    let outcome = state
        .providers
        .auth
        .sign_up(&email, &req.password, req.salon_name.trim())
        .await?;

    let salon = state
        .salons
        .create_for_owner(outcome.user.id, req.salon_name.trim(), &email)
        .await?;

    info!(user_id = %outcome.user.id, salon_id = %salon.id, "Salon owner signed up");

    Ok(HttpResponse::Created().json(SignUpResponse {
        user_id: outcome.user.id,
        salon_id: salon.id,
        email_confirmation_required: outcome.session.is_none(),
    }))
}

pub async fn login(
    state: web::Data<AppState>,
    req: web::Json<LoginRequest>,
) -> Result<HttpResponse> {
    req.validate()?;

    let email = req.email.trim().to_lowercase();
    let session = state
        .providers
        .auth
        .sign_in_with_password(&email, &req.password)
        .await?;

    let salon = state.salons.find_by_owner(session.user.id).await?;
    info!(user_id = %session.user.id, "Salon owner logged in");

    Ok(HttpResponse::Ok().json(LoginResponse::new(session, salon.map(|s| s.id))))
}

/// Complete an OAuth (PKCE) login; first-time owners get a salon
pub async fn oauth_exchange(
    state: web::Data<AppState>,
    req: web::Json<OAuthExchangeRequest>,
) -> Result<HttpResponse> {
    req.validate()?;

    let session = state
        .providers
        .auth
        .exchange_code(&req.auth_code, &req.code_verifier)
        .await?;

    let email = session.user.email.clone().ok_or_else(|| {
        TryOnError::Upstream("auth provider returned a user without email".to_string())
    })?;
    let salon_name = email.split('@').next().unwrap_or("My salon").to_string();
    let salon = state
        .salons
        .create_for_owner(session.user.id, &salon_name, &email)
        .await?;

    info!(user_id = %session.user.id, salon_id = %salon.id, "OAuth login completed");

    Ok(HttpResponse::Ok().json(LoginResponse::new(session, Some(salon.id))))
}
