/// Payment processor client (Stripe REST API, form-encoded)
use crate::error::{Result, TryOnError};
use crate::models::Salon;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutSession {
    pub id: String,
    pub url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentIntent {
    pub id: String,
    pub client_secret: Option<String>,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PaymentProcessor: Send + Sync {
    /// Hosted checkout for the salon subscription
    async fn create_checkout_session(&self, salon: &Salon, quantity: u32)
        -> Result<CheckoutSession>;

    async fn create_payment_intent(
        &self,
        salon: &Salon,
        amount_cents: u64,
        currency: &str,
    ) -> Result<PaymentIntent>;
}

#[derive(Deserialize, Default)]
struct StripeErrorEnvelope {
    error: Option<StripeError>,
}

#[derive(Deserialize)]
struct StripeError {
    message: Option<String>,
}

#[derive(Clone)]
pub struct StripeClient {
    client: Client,
    secret_key: Option<String>,
    api_base: String,
    price_id: Option<String>,
    success_url: String,
    cancel_url: String,
}

impl StripeClient {
    pub fn new(
        client: Client,
        secret_key: Option<String>,
        api_base: impl Into<String>,
        price_id: Option<String>,
        success_url: impl Into<String>,
        cancel_url: impl Into<String>,
    ) -> Self {
        Self {
            client,
            secret_key,
            api_base: api_base.into().trim_end_matches('/').to_string(),
            price_id,
            success_url: success_url.into(),
            cancel_url: cancel_url.into(),
        }
    }

    fn secret_key(&self) -> Result<&str> {
        self.secret_key.as_deref().ok_or_else(|| {
            TryOnError::Upstream("payment processor is not configured".to_string())
        })
    }

    fn checkout_form(&self, salon: &Salon, price_id: &str, quantity: u32) -> Vec<(String, String)> {
        let salon_id = salon.id.to_string();
        let mut form = vec![
            ("mode".to_string(), "subscription".to_string()),
            ("line_items[0][price]".to_string(), price_id.to_string()),
            ("line_items[0][quantity]".to_string(), quantity.to_string()),
            ("success_url".to_string(), self.success_url.clone()),
            ("cancel_url".to_string(), self.cancel_url.clone()),
            ("client_reference_id".to_string(), salon_id.clone()),
            ("metadata[salon_id]".to_string(), salon_id),
        ];
        match &salon.stripe_customer_id {
            Some(customer) => form.push(("customer".to_string(), customer.clone())),
            None => form.push(("customer_email".to_string(), salon.email.clone())),
        }
        form
    }

    async fn post_form<T>(&self, path: &str, form: &[(String, String)]) -> Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        let secret_key = self.secret_key()?;
        let response = self
            .client
            .post(format!("{}{}", self.api_base, path))
            .bearer_auth(secret_key)
            .form(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .json::<StripeErrorEnvelope>()
                .await
                .unwrap_or_default()
                .error
                .and_then(|e| e.message)
                .unwrap_or_else(|| "unknown error".to_string());
            warn!(path, status = %status, "Payment processor rejected request");
            return Err(TryOnError::Upstream(format!(
                "payment processor HTTP {status}: {message}"
            )));
        }

        Ok(response.json::<T>().await?)
    }
}

#[async_trait]
impl PaymentProcessor for StripeClient {
    async fn create_checkout_session(
        &self,
        salon: &Salon,
        quantity: u32,
    ) -> Result<CheckoutSession> {
        let price_id = self.price_id.as_deref().ok_or_else(|| {
            TryOnError::Upstream("subscription price is not configured".to_string())
        })?;

        let form = self.checkout_form(salon, price_id, quantity);
        let session: CheckoutSession = self.post_form("/checkout/sessions", &form).await?;

        info!(
            salon_id = %salon.id,
            checkout_session_id = %session.id,
            "Checkout session created"
        );
        Ok(session)
    }

    async fn create_payment_intent(
        &self,
        salon: &Salon,
        amount_cents: u64,
        currency: &str,
    ) -> Result<PaymentIntent> {
        let form = vec![
            ("amount".to_string(), amount_cents.to_string()),
            ("currency".to_string(), currency.to_lowercase()),
            (
                "automatic_payment_methods[enabled]".to_string(),
                "true".to_string(),
            ),
            ("metadata[salon_id]".to_string(), salon.id.to_string()),
        ];
        let intent: PaymentIntent = self.post_form("/payment_intents", &form).await?;

        info!(
            salon_id = %salon.id,
            payment_intent_id = %intent.id,
            amount_cents,
            "Payment intent created"
        );
        Ok(intent)
    }
}
