//! Configuration for the try-on service
//!
//! Loaded once at start-up from environment variables (via `envy`) and then
//! injected into every component. Nothing below `main` reads the environment.
use crate::models::SessionLimits;
use serde::Deserialize;
use std::fmt;
use thiserror::Error;

/// Allowed range for a salon's AI uses per client session
pub const MAX_AI_USES_RANGE: std::ops::RangeInclusive<u32> = 1..=100;

/// Allowed range for session durations, in minutes
pub const SESSION_DURATION_RANGE: std::ops::RangeInclusive<u32> = 5..=240;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read environment: {0}")]
    Env(#[from] envy::Error),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Main configuration struct, loaded from environment variables
#[derive(Clone, Deserialize)]
pub struct Config {
    /// Deployment environment (development, staging, production)
    #[serde(default = "default_app_env")]
    pub app_env: String,

    /// HTTP bind host
    #[serde(default = "default_host")]
    pub host: String,

    /// HTTP bind port
    #[serde(default = "default_port")]
    pub port: u16,

    /// `text` or `json`
    #[serde(default = "default_log_format")]
    pub log_format: String,

    /// Comma-separated list of allowed CORS origins
    #[serde(default = "default_cors_allowed_origins")]
    pub cors_allowed_origins: String,

    /// PostgreSQL URL; in-memory stores are used when unset
    #[serde(default)]
    pub database_url: Option<String>,

    #[serde(default = "default_db_max_connections")]
    pub db_max_connections: u32,

    #[serde(default = "default_db_min_connections")]
    pub db_min_connections: u32,

    /// Redis URL backing the usage ledger; in-memory ledger when unset
    #[serde(default)]
    pub redis_url: Option<String>,

    /// HS256 secret for individual session tokens
    pub session_token_secret: String,

    #[serde(default = "default_max_ai_uses")]
    pub individual_max_ai_uses: u32,

    #[serde(default = "default_session_duration_minutes")]
    pub individual_session_duration_minutes: u32,

    /// Used when a salon has not configured its own limits
    #[serde(default = "default_max_ai_uses")]
    pub default_client_max_ai_uses: u32,

    #[serde(default = "default_session_duration_minutes")]
    pub default_client_session_duration_minutes: u32,

    /// Auth provider REST base URL (e.g. `https://<project>.supabase.co`)
    #[serde(default)]
    pub auth_provider_url: String,

    #[serde(default)]
    pub auth_provider_anon_key: String,

    /// HS256 secret the auth provider signs access tokens with
    pub auth_provider_jwt_secret: String,

    #[serde(default = "default_auth_audience")]
    pub auth_audience: String,

    #[serde(default)]
    pub stripe_secret_key: Option<String>,

    #[serde(default = "default_stripe_api_base")]
    pub stripe_api_base: String,

    /// Subscription price used by hosted checkout
    #[serde(default)]
    pub stripe_price_id: Option<String>,

    #[serde(default = "default_checkout_success_url")]
    pub checkout_success_url: String,

    #[serde(default = "default_checkout_cancel_url")]
    pub checkout_cancel_url: String,

    #[serde(default)]
    pub gemini_api_key: Option<String>,

    #[serde(default = "default_gemini_model")]
    pub gemini_model: String,

    #[serde(default = "default_gemini_api_base")]
    pub gemini_api_base: String,

    /// Public URL of the web app, encoded into salon QR codes
    #[serde(default = "default_public_base_url")]
    pub public_base_url: String,

    /// Request timeout for outbound HTTP calls
    #[serde(default = "default_http_timeout_secs")]
    pub http_timeout_secs: u64,
}

fn default_app_env() -> String {
    "development".to_string()
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_log_format() -> String {
    "text".to_string()
}

fn default_cors_allowed_origins() -> String {
    "http://localhost:3000".to_string()
}

fn default_db_max_connections() -> u32 {
    10
}

fn default_db_min_connections() -> u32 {
    2
}

fn default_max_ai_uses() -> u32 {
    5
}

fn default_session_duration_minutes() -> u32 {
    15
}

fn default_auth_audience() -> String {
    "authenticated".to_string()
}

fn default_stripe_api_base() -> String {
    "https://api.stripe.com/v1".to_string()
}

fn default_checkout_success_url() -> String {
    "http://localhost:3000/dashboard?checkout=success".to_string()
}

fn default_checkout_cancel_url() -> String {
    "http://localhost:3000/dashboard?checkout=cancelled".to_string()
}

fn default_gemini_model() -> String {
    "gemini-2.5-flash-image-preview".to_string()
}

fn default_gemini_api_base() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}

fn default_public_base_url() -> String {
    "http://localhost:3000".to_string()
}

fn default_http_timeout_secs() -> u64 {
    60
}

fn redact<T>(value: &Option<T>) -> &'static str {
    if value.is_some() {
        "[REDACTED]"
    } else {
        "<unset>"
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("app_env", &self.app_env)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("log_format", &self.log_format)
            .field("cors_allowed_origins", &self.cors_allowed_origins)
            .field("database_url", &redact(&self.database_url))
            .field("db_max_connections", &self.db_max_connections)
            .field("db_min_connections", &self.db_min_connections)
            .field("redis_url", &redact(&self.redis_url))
            .field("session_token_secret", &"[REDACTED]")
            .field("individual_max_ai_uses", &self.individual_max_ai_uses)
            .field(
                "individual_session_duration_minutes",
                &self.individual_session_duration_minutes,
            )
            .field("default_client_max_ai_uses", &self.default_client_max_ai_uses)
            .field(
                "default_client_session_duration_minutes",
                &self.default_client_session_duration_minutes,
            )
            .field("auth_provider_url", &self.auth_provider_url)
            .field("auth_provider_jwt_secret", &"[REDACTED]")
            .field("auth_audience", &self.auth_audience)
            .field("stripe_secret_key", &redact(&self.stripe_secret_key))
            .field("stripe_price_id", &self.stripe_price_id)
            .field("gemini_api_key", &redact(&self.gemini_api_key))
            .field("gemini_model", &self.gemini_model)
            .field("public_base_url", &self.public_base_url)
            .field("http_timeout_secs", &self.http_timeout_secs)
            .finish()
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let config: Config = envy::from_env()?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from explicit key/value pairs (upper-case keys)
    pub fn from_pairs<I>(pairs: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let config: Config = envy::from_iter(pairs)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.session_token_secret.trim().len() < crypto_core::jwt::MIN_SECRET_LEN {
            return Err(ConfigError::Invalid(format!(
                "SESSION_TOKEN_SECRET must be at least {} bytes",
                crypto_core::jwt::MIN_SECRET_LEN
            )));
        }

        if self.auth_provider_jwt_secret.trim().len() < crypto_core::jwt::MIN_SECRET_LEN {
            return Err(ConfigError::Invalid(format!(
                "AUTH_PROVIDER_JWT_SECRET must be at least {} bytes",
                crypto_core::jwt::MIN_SECRET_LEN
            )));
        }

        for (name, value) in [
            ("INDIVIDUAL_MAX_AI_USES", self.individual_max_ai_uses),
            ("DEFAULT_CLIENT_MAX_AI_USES", self.default_client_max_ai_uses),
        ] {
            if !MAX_AI_USES_RANGE.contains(&value) {
                return Err(ConfigError::Invalid(format!(
                    "{name} must be within {}..={}",
                    MAX_AI_USES_RANGE.start(),
                    MAX_AI_USES_RANGE.end()
                )));
            }
        }

        for (name, value) in [
            (
                "INDIVIDUAL_SESSION_DURATION_MINUTES",
                self.individual_session_duration_minutes,
            ),
            (
                "DEFAULT_CLIENT_SESSION_DURATION_MINUTES",
                self.default_client_session_duration_minutes,
            ),
        ] {
            if !SESSION_DURATION_RANGE.contains(&value) {
                return Err(ConfigError::Invalid(format!(
                    "{name} must be within {}..={}",
                    SESSION_DURATION_RANGE.start(),
                    SESSION_DURATION_RANGE.end()
                )));
            }
        }

        if self.http_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "HTTP_TIMEOUT_SECS must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }

    pub fn is_production(&self) -> bool {
        self.app_env.eq_ignore_ascii_case("production")
    }

    pub fn cors_origins(&self) -> Vec<String> {
        self.cors_allowed_origins
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect()
    }

    pub fn individual_limits(&self) -> SessionLimits {
        SessionLimits {
            max_ai_uses: self.individual_max_ai_uses,
            duration_minutes: self.individual_session_duration_minutes,
        }
    }

    pub fn default_client_limits(&self) -> SessionLimits {
        SessionLimits {
            max_ai_uses: self.default_client_max_ai_uses,
            duration_minutes: self.default_client_session_duration_minutes,
        }
    }
}
