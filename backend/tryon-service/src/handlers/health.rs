use crate::state::AppState;
use actix_web::{web, HttpResponse};
use chrono::Utc;
use serde::Serialize;
use std::collections::HashMap;
use std::time::{Duration, Instant};

const CHECK_TIMEOUT: Duration = Duration::from_secs(2);

#[derive(Serialize, Clone, Copy, PartialEq, Eq, Debug)]
#[serde(rename_all = "lowercase")]
pub enum ComponentStatus {
    Healthy,
    Unhealthy,
    /// Component not configured; the in-memory fallback is in use
    Skipped,
}

#[derive(Serialize, Debug)]
pub struct ComponentCheck {
    pub status: ComponentStatus,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<u64>,
}

#[derive(Serialize, Debug)]
pub struct ReadinessResponse {
    pub ready: bool,
    pub checks: HashMap<String, ComponentCheck>,
    pub timestamp: String,
}

impl ComponentCheck {
    fn skipped(message: &str) -> Self {
        Self {
            status: ComponentStatus::Skipped,
            message: message.to_string(),
            latency_ms: None,
        }
    }

    fn from_result<E: std::fmt::Display>(
        name: &str,
        result: Result<(), E>,
        started: Instant,
    ) -> Self {
        let latency_ms = Some(started.elapsed().as_millis() as u64);
        match result {
            Ok(()) => Self {
                status: ComponentStatus::Healthy,
                message: format!("{name} reachable"),
                latency_ms,
            },
            Err(e) => {
                tracing::warn!(component = name, error = %e, "Readiness check failed");
                Self {
                    status: ComponentStatus::Unhealthy,
                    message: format!("{name} check failed: {e}"),
                    latency_ms,
                }
            }
        }
    }
}

/// Liveness: the process is up and serving
pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "ok",
        "service": "tryon-service",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Readiness: configured backing services answer
pub async fn readiness(state: web::Data<AppState>) -> HttpResponse {
    let mut checks = HashMap::new();

    let postgres = match &state.db {
        Some(pool) => {
            let started = Instant::now();
            let result = db_pool::ping(pool, CHECK_TIMEOUT).await;
            ComponentCheck::from_result("PostgreSQL", result, started)
        }
        None => ComponentCheck::skipped("DATABASE_URL not set; using in-memory stores"),
    };
    checks.insert("postgresql".to_string(), postgres);

    let redis = match &state.redis {
        Some(manager) => {
            let started = Instant::now();
            let result = redis_utils::ping(manager).await;
            ComponentCheck::from_result("Redis", result, started)
        }
        None => ComponentCheck::skipped("REDIS_URL not set; using in-memory usage ledger"),
    };
    checks.insert("redis".to_string(), redis);

    let ready = checks
        .values()
        .all(|c| c.status != ComponentStatus::Unhealthy);

    let response = ReadinessResponse {
        ready,
        checks,
        timestamp: Utc::now().to_rfc3339(),
    };

    if ready {
        HttpResponse::Ok().json(response)
    } else {
        HttpResponse::ServiceUnavailable().json(response)
    }
}
