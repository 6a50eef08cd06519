/// Payment handlers - subscription checkout and one-off payment intents
use super::salons::owned_salon;
use crate::error::{Result, TryOnError};
use crate::state::AppState;
use actix_middleware::AuthenticatedOwner;
use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Default, Deserialize, Validate)]
pub struct CheckoutRequest {
    #[validate(range(min = 1, max = 100))]
    pub quantity: Option<u32>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct PaymentIntentRequest {
    /// Smallest currency unit; the processor's minimum is 50
    #[validate(range(min = 50, max = 99_999_999))]
    pub amount_cents: u64,
    #[validate(length(equal = 3, message = "currency must be a 3-letter ISO code"))]
    pub currency: String,
}

#[derive(Debug, Serialize)]
pub struct CheckoutResponse {
    pub checkout_url: String,
    pub checkout_session_id: String,
}

#[derive(Debug, Serialize)]
pub struct PaymentIntentResponse {
    pub client_secret: String,
    pub payment_intent_id: String,
}

pub async fn create_checkout(
    state: web::Data<AppState>,
    owner: AuthenticatedOwner,
    req: Option<web::Json<CheckoutRequest>>,
) -> Result<HttpResponse> {
    let req = req.map(web::Json::into_inner).unwrap_or_default();
    req.validate()?;

    let salon = owned_salon(&state, &owner).await?;
    let session = state
        .providers
        .payments
        .create_checkout_session(&salon, req.quantity.unwrap_or(1))
        .await?;

    let checkout_url = session.url.ok_or_else(|| {
        TryOnError::Upstream("checkout session has no hosted URL".to_string())
    })?;

    Ok(HttpResponse::Ok().json(CheckoutResponse {
        checkout_url,
        checkout_session_id: session.id,
    }))
}

pub async fn create_payment_intent(
    state: web::Data<AppState>,
    owner: AuthenticatedOwner,
    req: web::Json<PaymentIntentRequest>,
) -> Result<HttpResponse> {
    req.validate()?;
    if !req.currency.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(TryOnError::InvalidArgument(
            "currency must be a 3-letter ISO code".to_string(),
        ));
    }

    let salon = owned_salon(&state, &owner).await?;
    let intent = state
        .providers
        .payments
        .create_payment_intent(&salon, req.amount_cents, &req.currency)
        .await?;

    let client_secret = intent.client_secret.ok_or_else(|| {
        TryOnError::Upstream("payment intent has no client secret".to_string())
    })?;

    Ok(HttpResponse::Ok().json(PaymentIntentResponse {
        client_secret,
        payment_intent_id: intent.id,
    }))
}
