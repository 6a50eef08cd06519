/// Salon handlers - owner profile, session settings, kiosk QR code
use crate::error::{Result, TryOnError};
use crate::models::{Salon, SalonSettings};
use crate::state::AppState;
use actix_middleware::AuthenticatedOwner;
use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Serialize)]
pub struct SalonResponse {
    #[serde(flatten)]
    pub salon: Salon,
    /// Limits applied to new client sessions, defaults included
    pub effective_max_ai_uses: u32,
    pub effective_session_duration: u32,
}

#[derive(Debug, Serialize)]
pub struct PublicSalonResponse {
    pub id: Uuid,
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct QrQuery {
    pub format: Option<String>,
}

pub(crate) async fn owned_salon(state: &AppState, owner: &AuthenticatedOwner) -> Result<Salon> {
    state
        .salons
        .find_by_owner(owner.user_id)
        .await?
        .ok_or_else(|| TryOnError::NotFound("Salon not found".to_string()))
}

fn salon_response(state: &AppState, salon: Salon) -> SalonResponse {
    let limits = salon.session_limits(state.config.default_client_limits());
    SalonResponse {
        salon,
        effective_max_ai_uses: limits.max_ai_uses,
        effective_session_duration: limits.duration_minutes,
    }
}

pub async fn get_my_salon(
    state: web::Data<AppState>,
    owner: AuthenticatedOwner,
) -> Result<HttpResponse> {
    let salon = owned_salon(&state, &owner).await?;
    Ok(HttpResponse::Ok().json(salon_response(&state, salon)))
}

/// Update the limits applied to future client sessions
pub async fn update_settings(
    state: web::Data<AppState>,
    owner: AuthenticatedOwner,
    req: web::Json<SalonSettings>,
) -> Result<HttpResponse> {
    req.validate()?;

    let salon = state
        .salons
        .update_settings(owner.user_id, req.into_inner())
        .await?
        .ok_or_else(|| TryOnError::NotFound("Salon not found".to_string()))?;

    info!(
        salon_id = %salon.id,
        max_ai_uses = ?salon.max_ai_uses,
        session_duration = ?salon.session_duration,
        "Salon settings updated"
    );

    Ok(HttpResponse::Ok().json(salon_response(&state, salon)))
}

/// Name lookup for the kiosk landing page; no authentication
pub async fn get_public_salon(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    let salon_id = Uuid::parse_str(&path.into_inner())
        .map_err(|_| TryOnError::InvalidArgument("salon id must be a UUID".to_string()))?;

    let salon = state
        .salons
        .find_by_id(salon_id)
        .await?
        .ok_or_else(|| TryOnError::NotFound("Salon not found".to_string()))?;

    Ok(HttpResponse::Ok().json(PublicSalonResponse {
        id: salon.id,
        name: salon.name,
    }))
}

/// QR code pointing kiosk customers at the salon's try-on page
pub async fn get_qr_code(
    state: web::Data<AppState>,
    owner: AuthenticatedOwner,
    query: web::Query<QrQuery>,
) -> Result<HttpResponse> {
    let salon = owned_salon(&state, &owner).await?;
    let qr = state.qr.render(salon.id)?;

    match query.format.as_deref() {
        Some("json") => Ok(HttpResponse::Ok().json(qr)),
        None | Some("svg") => Ok(HttpResponse::Ok()
            .content_type("image/svg+xml")
            .body(qr.svg)),
        Some(other) => Err(TryOnError::InvalidArgument(format!(
            "unsupported format \"{other}\""
        ))),
    }
}
