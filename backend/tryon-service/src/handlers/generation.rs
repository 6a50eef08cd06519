/// Try-on generation handler
///
/// Checks the session still has a use left, calls the image model, and only
/// then records the AI use. A failed generation is never charged.
use crate::clients::{build_prompt, GenerationRequest};
use crate::error::{Result, TryOnError};
use crate::metrics;
use crate::models::SessionKind;
use crate::state::AppState;
use actix_web::{web, HttpResponse};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{info, warn};
use uuid::Uuid;
use validator::Validate;

/// Decoded upload limit
pub const MAX_IMAGE_BYTES: usize = 10 * 1024 * 1024;

const SUPPORTED_MIME_TYPES: [&str; 3] = ["image/jpeg", "image/png", "image/webp"];

#[derive(Debug, Deserialize, Validate)]
pub struct GenerateRequest {
    #[validate(length(min = 1, message = "session_token is required"))]
    pub session_token: String,
    pub user_type: SessionKind,
    pub style_id: Option<Uuid>,
    #[validate(length(min = 3, max = 500, message = "style_prompt must be 3 to 500 characters"))]
    pub style_prompt: Option<String>,
    #[validate(length(min = 1, message = "image_base64 is required"))]
    pub image_base64: String,
    pub mime_type: String,
}

#[derive(Debug, Serialize)]
pub struct GenerateResponse {
    pub image_base64: String,
    pub mime_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    pub ai_uses_remaining: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_token: Option<String>,
}

/// Strip an optional `data:<mime>;base64,` prefix and check the payload decodes
fn normalize_image(image_base64: &str) -> Result<String> {
    let payload = match image_base64.split_once(";base64,") {
        Some((prefix, data)) if prefix.starts_with("data:") => data,
        _ => image_base64,
    };
    let payload = payload.trim();

    let decoded = STANDARD
        .decode(payload)
        .map_err(|_| TryOnError::InvalidArgument("image_base64 is not valid base64".to_string()))?;

    if decoded.is_empty() {
        return Err(TryOnError::InvalidArgument("image is empty".to_string()));
    }
    if decoded.len() > MAX_IMAGE_BYTES {
        return Err(TryOnError::InvalidArgument(format!(
            "image exceeds {} MB",
            MAX_IMAGE_BYTES / (1024 * 1024)
        )));
    }

    Ok(payload.to_string())
}

async fn resolve_prompt(state: &AppState, req: &GenerateRequest) -> Result<String> {
    if let Some(style_id) = req.style_id {
        let style = state
            .styles
            .find_by_id(style_id)
            .await?
            .filter(|s| s.is_active)
            .ok_or_else(|| TryOnError::NotFound("Style not found".to_string()))?;
        return Ok(build_prompt(&style.prompt));
    }

    match req.style_prompt.as_deref().map(str::trim) {
        Some(prompt) if !prompt.is_empty() => Ok(build_prompt(prompt)),
        _ => Err(TryOnError::InvalidArgument(
            "style_id or style_prompt is required".to_string(),
        )),
    }
}

pub async fn generate(
    state: web::Data<AppState>,
    req: web::Json<GenerateRequest>,
) -> Result<HttpResponse> {
    req.validate()?;

    let mime_type = req.mime_type.trim().to_ascii_lowercase();
    if !SUPPORTED_MIME_TYPES.contains(&mime_type.as_str()) {
        return Err(TryOnError::InvalidArgument(format!(
            "mime_type must be one of {}",
            SUPPORTED_MIME_TYPES.join(", ")
        )));
    }
    let image_base64 = normalize_image(&req.image_base64)?;

    let summary = state
        .sessions
        .ensure_usable(req.user_type, &req.session_token)
        .await?;

    let prompt = resolve_prompt(&state, &req).await?;

    let started = Instant::now();
    let generated = state
        .providers
        .images
        .generate(GenerationRequest {
            prompt,
            image_base64,
            mime_type,
        })
        .await;
    metrics::observe_generation(started.elapsed().as_secs_f64());

    let generated = generated.map_err(|e| {
        warn!(session_id = %summary.id, error = %e, "Generation failed; use not charged");
        e
    })?;

    let receipt = state
        .sessions
        .record_usage(req.user_type, &req.session_token)
        .await?;

    info!(
        session_id = %summary.id,
        kind = %req.user_type,
        ai_uses_remaining = receipt.ai_uses_remaining,
        "Try-on generated"
    );

    Ok(HttpResponse::Ok().json(GenerateResponse {
        image_base64: generated.image_base64,
        mime_type: generated.mime_type,
        text: generated.text,
        ai_uses_remaining: receipt.ai_uses_remaining,
        session_token: receipt.session_token,
    }))
}
