//! Prometheus metrics for the try-on service
//!
//! Session collectors plus the HTTP handler for the `/metrics` endpoint.

use crate::error::TryOnError;
use crate::models::SessionKind;
use actix_web::HttpResponse;
use prometheus::{
    register_histogram, register_int_counter_vec, Encoder, Histogram, IntCounterVec, TextEncoder,
};

lazy_static::lazy_static! {
    static ref SESSIONS_STARTED_TOTAL: IntCounterVec = register_int_counter_vec!(
        "tryon_sessions_started_total",
        "Sessions started by kind",
        &["kind"]
    ).expect("Prometheus metrics registration should succeed at startup");

    static ref SESSION_VALIDATIONS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "tryon_session_validations_total",
        "Session validations by kind and outcome",
        &["kind", "outcome"]
    ).expect("Prometheus metrics registration should succeed at startup");

    static ref AI_USES_TOTAL: IntCounterVec = register_int_counter_vec!(
        "tryon_ai_uses_total",
        "Usage recording attempts by kind and outcome",
        &["kind", "outcome"]
    ).expect("Prometheus metrics registration should succeed at startup");

    static ref GENERATION_DURATION_SECONDS: Histogram = register_histogram!(
        "tryon_generation_duration_seconds",
        "Latency of image generation calls",
        vec![0.5, 1.0, 2.5, 5.0, 10.0, 20.0, 30.0, 60.0]
    ).expect("Prometheus metrics registration should succeed at startup");
}

fn outcome<T>(result: &Result<T, TryOnError>) -> &'static str {
    match result {
        Ok(_) => "ok",
        Err(TryOnError::InvalidArgument(_)) => "invalid_argument",
        Err(TryOnError::AuthenticationFailure(_)) => "authentication_failed",
        Err(TryOnError::Expired) => "expired",
        Err(TryOnError::QuotaExhausted) => "quota_exhausted",
        Err(TryOnError::NotFound(_)) => "not_found",
        Err(TryOnError::Internal(_)) => "internal",
        Err(TryOnError::Upstream(_)) => "upstream",
    }
}

pub fn record_session_started(kind: SessionKind) {
    SESSIONS_STARTED_TOTAL
        .with_label_values(&[kind.as_str()])
        .inc();
}

pub fn record_validation<T>(kind: SessionKind, result: &Result<T, TryOnError>) {
    SESSION_VALIDATIONS_TOTAL
        .with_label_values(&[kind.as_str(), outcome(result)])
        .inc();
}

pub fn record_usage<T>(kind: SessionKind, result: &Result<T, TryOnError>) {
    AI_USES_TOTAL
        .with_label_values(&[kind.as_str(), outcome(result)])
        .inc();
}

pub fn observe_generation(seconds: f64) {
    GENERATION_DURATION_SECONDS.observe(seconds);
}

/// Actix handler that renders Prometheus metrics in text format.
pub async fn serve_metrics() -> HttpResponse {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();

    let mut buffer = Vec::new();
    if let Err(err) = encoder.encode(&metric_families, &mut buffer) {
        return HttpResponse::InternalServerError().body(err.to_string());
    }

    HttpResponse::Ok()
        .content_type(encoder.format_type())
        .body(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_labels() {
        assert_eq!(outcome::<()>(&Ok(())), "ok");
        assert_eq!(outcome::<()>(&Err(TryOnError::Expired)), "expired");
        assert_eq!(
            outcome::<()>(&Err(TryOnError::QuotaExhausted)),
            "quota_exhausted"
        );
    }

    #[test]
    fn test_usage_counter_increments() {
        let before = AI_USES_TOTAL
            .with_label_values(&["salon_client", "quota_exhausted"])
            .get();
        record_usage::<()>(SessionKind::SalonClient, &Err(TryOnError::QuotaExhausted));
        let after = AI_USES_TOTAL
            .with_label_values(&["salon_client", "quota_exhausted"])
            .get();
        assert!(after > before);
    }
}
