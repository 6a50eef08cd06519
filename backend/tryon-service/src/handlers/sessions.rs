/// Session handlers - start, validate and consume try-on sessions
use crate::error::{Result, TryOnError};
use crate::models::{SessionKind, SessionOwner, SessionSummary};
use crate::state::AppState;
use actix_web::{web, HttpResponse};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize)]
pub struct StartIndividualSessionRequest {
    pub user_type: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct StartClientSessionRequest {
    pub salon_id: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ValidateSessionRequest {
    #[validate(length(min = 1, message = "session_token is required"))]
    pub session_token: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct RecordUsageRequest {
    #[validate(length(min = 1, message = "session_token is required"))]
    pub session_token: String,
    pub user_type: SessionKind,
}

#[derive(Debug, Serialize)]
pub struct IndividualSessionStarted {
    pub session_token: String,
    pub session_id: Uuid,
    pub max_ai_uses: u32,
    pub session_duration_minutes: u32,
    pub expires_at: DateTime<Utc>,
    pub user_type: SessionKind,
}

#[derive(Debug, Serialize)]
pub struct ClientSessionStarted {
    pub session_token: String,
    pub expires_at: DateTime<Utc>,
    pub max_ai_uses: u32,
    pub session_duration_minutes: u32,
    pub salon_id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct IndividualSessionView {
    pub id: Uuid,
    pub user_type: SessionKind,
    pub ai_uses_remaining: u32,
    pub time_remaining_seconds: i64,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct ClientSessionView {
    pub id: Uuid,
    pub salon_id: Option<Uuid>,
    pub expires_at: DateTime<Utc>,
    pub ai_uses_remaining: u32,
    pub time_remaining_seconds: i64,
}

#[derive(Debug, Serialize)]
pub struct SessionEnvelope<T> {
    pub session: T,
}

#[derive(Debug, Serialize)]
pub struct UsageResponse {
    pub ai_uses_remaining: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_token: Option<String>,
}

impl From<SessionSummary> for IndividualSessionView {
    fn from(summary: SessionSummary) -> Self {
        Self {
            id: summary.id,
            user_type: summary.kind,
            ai_uses_remaining: summary.ai_uses_remaining,
            time_remaining_seconds: summary.time_remaining_seconds,
            expires_at: summary.expires_at,
        }
    }
}

impl From<SessionSummary> for ClientSessionView {
    fn from(summary: SessionSummary) -> Self {
        Self {
            id: summary.id,
            salon_id: summary.salon_id,
            expires_at: summary.expires_at,
            ai_uses_remaining: summary.ai_uses_remaining,
            time_remaining_seconds: summary.time_remaining_seconds,
        }
    }
}

/// Start an anonymous individual session
pub async fn start_individual_session(
    state: web::Data<AppState>,
    req: web::Json<StartIndividualSessionRequest>,
) -> Result<HttpResponse> {
    let user_type = req
        .user_type
        .as_deref()
        .ok_or_else(|| TryOnError::InvalidArgument("user_type is required".to_string()))?;

    if user_type.parse::<SessionKind>().ok() != Some(SessionKind::Individual) {
        return Err(TryOnError::InvalidArgument(
            "user_type must be \"individual\"".to_string(),
        ));
    }

    let started = state.sessions.start(SessionOwner::Individual).await?;

    Ok(HttpResponse::Ok().json(IndividualSessionStarted {
        session_token: started.session_token,
        session_id: started.session_id,
        max_ai_uses: started.max_ai_uses,
        session_duration_minutes: started.session_duration_minutes,
        expires_at: started.expires_at,
        user_type: started.kind,
    }))
}

pub async fn validate_individual_session(
    state: web::Data<AppState>,
    req: web::Json<ValidateSessionRequest>,
) -> Result<HttpResponse> {
    req.validate()?;

    let summary = state
        .sessions
        .validate(SessionKind::Individual, &req.session_token)
        .await?;

    Ok(HttpResponse::Ok().json(SessionEnvelope {
        session: IndividualSessionView::from(summary),
    }))
}

/// Start a kiosk session for a salon's customer
pub async fn start_client_session(
    state: web::Data<AppState>,
    req: web::Json<StartClientSessionRequest>,
) -> Result<HttpResponse> {
    let salon_id = req
        .salon_id
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| TryOnError::InvalidArgument("salon_id is required".to_string()))?;
    let salon_id = Uuid::parse_str(salon_id)
        .map_err(|_| TryOnError::InvalidArgument("salon_id must be a UUID".to_string()))?;

    let started = state.sessions.start(SessionOwner::Salon(salon_id)).await?;

    Ok(HttpResponse::Ok().json(ClientSessionStarted {
        session_token: started.session_token,
        expires_at: started.expires_at,
        max_ai_uses: started.max_ai_uses,
        session_duration_minutes: started.session_duration_minutes,
        salon_id,
    }))
}

pub async fn validate_client_session(
    state: web::Data<AppState>,
    req: web::Json<ValidateSessionRequest>,
) -> Result<HttpResponse> {
    req.validate()?;

    let summary = state
        .sessions
        .validate(SessionKind::SalonClient, &req.session_token)
        .await?;

    Ok(HttpResponse::Ok().json(SessionEnvelope {
        session: ClientSessionView::from(summary),
    }))
}

/// Consume one AI use outside the generation flow
pub async fn record_usage(
    state: web::Data<AppState>,
    req: web::Json<RecordUsageRequest>,
) -> Result<HttpResponse> {
    req.validate()?;

    let receipt = state
        .sessions
        .record_usage(req.user_type, &req.session_token)
        .await?;

    Ok(HttpResponse::Ok().json(UsageResponse {
        ai_uses_remaining: receipt.ai_uses_remaining,
        session_token: receipt.session_token,
    }))
}
