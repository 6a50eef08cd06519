use actix_cors::Cors;
use actix_middleware::{CorrelationIdMiddleware, MetricsMiddleware};
use actix_web::{web, App, HttpServer};
use anyhow::Context;
use db_pool::{create_pool, DbConfig};
use redis_utils::RedisPool;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use tryon_service::clients::build_http_client;
use tryon_service::security::{MemoryUsageLedger, RedisUsageLedger, UsageLedger};
use tryon_service::{routes, AppState, Config, Providers, Stores};

fn init_tracing(log_format: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,tryon_service=debug,actix_web=info".into());

    let registry = tracing_subscriber::registry().with(filter);
    if log_format.eq_ignore_ascii_case("json") {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_current_span(true))
            .init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

fn build_cors(origins: &[String]) -> Cors {
    let mut cors = Cors::default();
    for origin in origins {
        if origin == "*" {
            cors = cors.allow_any_origin();
        } else {
            cors = cors.allowed_origin(origin);
        }
    }
    cors.allow_any_method().allow_any_header().max_age(3600)
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut terminate) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {},
                    _ = terminate.recv() => {},
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to install SIGTERM handler");
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}

/// Try-on Service
///
/// Issues and enforces time-boxed, usage-limited try-on sessions and serves
/// the salon-owner API.
#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    // .env is optional outside development
    let _ = dotenvy::dotenv();

    let config = Config::from_env().context("Failed to load configuration")?;
    init_tracing(&config.log_format);

    tracing::info!(
        env = %config.app_env,
        host = %config.host,
        port = config.port,
        "Starting tryon-service"
    );
    tracing::debug!(config = ?config, "Loaded configuration");

    let (stores, db) = match &config.database_url {
        Some(url) => {
            let db_config = DbConfig::new("tryon-service", url.clone())
                .with_connections(config.db_max_connections, config.db_min_connections);
            db_config.log_config();
            let pool = create_pool(db_config)
                .await
                .context("Failed to connect to PostgreSQL")?;
            (Stores::postgres(pool.clone()), Some(pool))
        }
        None => {
            if config.is_production() {
                anyhow::bail!("DATABASE_URL is required in production");
            }
            tracing::warn!("DATABASE_URL not set; using in-memory stores (data is not persisted)");
            (Stores::in_memory(), None)
        }
    };

    let (ledger, redis) = match &config.redis_url {
        Some(url) => {
            let pool = RedisPool::connect(url)
                .await
                .context("Failed to connect to Redis")?;
            let manager = pool.manager();
            let ledger: Arc<dyn UsageLedger> = Arc::new(RedisUsageLedger::new(manager.clone()));
            (ledger, Some(manager))
        }
        None => {
            if config.is_production() {
                anyhow::bail!("REDIS_URL is required in production");
            }
            tracing::warn!("REDIS_URL not set; using in-memory usage ledger (single instance only)");
            let ledger: Arc<dyn UsageLedger> = Arc::new(MemoryUsageLedger::new());
            (ledger, None)
        }
    };

    let http = build_http_client(&config).context("Failed to build HTTP client")?;
    let providers = Providers::from_config(&config, http);

    let config = Arc::new(config);
    let mut state = AppState::new(config.clone(), stores, ledger, providers)
        .context("Failed to initialise signing keys")?;
    if let Some(pool) = db {
        state = state.with_postgres(pool);
    }
    if let Some(manager) = redis {
        state = state.with_redis(manager);
    }

    let state = web::Data::new(state);
    let origins = config.cors_origins();
    let bind_address = format!("{}:{}", config.host, config.port);

    let server = HttpServer::new(move || {
        let verifier = state.access_verifier.clone();
        App::new()
            .app_data(state.clone())
            .wrap(MetricsMiddleware)
            .wrap(CorrelationIdMiddleware)
            .wrap(tracing_actix_web::TracingLogger::default())
            .wrap(build_cors(&origins))
            .configure(|cfg| routes::configure(cfg, verifier))
    })
    .bind(&bind_address)
    .with_context(|| format!("Failed to bind {bind_address}"))?
    .shutdown_timeout(30)
    .run();

    tracing::info!(address = %bind_address, "HTTP server is running");

    let handle = server.handle();
    let mut server_task = actix_rt::spawn(server);

    tokio::select! {
        result = &mut server_task => {
            result
                .context("HTTP server task panicked")?
                .context("HTTP server error")?;
        }
        _ = shutdown_signal() => {
            tracing::info!("Shutdown signal received");
            handle.stop(true).await;
            server_task
                .await
                .context("HTTP server task panicked")?
                .context("HTTP server error")?;
        }
    }

    tracing::info!("tryon-service stopped");
    Ok(())
}
