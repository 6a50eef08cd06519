use super::SessionBackend;
use crate::error::{Result, TryOnError};
use crate::models::session::time_remaining_seconds;
use crate::models::{
    IndividualSessionClaims, SessionKind, SessionLimits, SessionOwner, SessionSummary,
    StartedSession, UsageReceipt,
};
use crate::security::UsageLedger;
use async_trait::async_trait;
use chrono::{DateTime, SubsecRound, Utc};
use crypto_core::{token_fingerprint, JwtKeys};
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

/// Stateless sessions for individual (non-salon) users
///
/// All session state lives in an HS256 token. `validate` never touches
/// storage; `ensure_usable` reads the usage ledger and `record_usage`
/// consumes from it.
pub struct IndividualSessions {
    keys: JwtKeys,
    ledger: Arc<dyn UsageLedger>,
    limits: SessionLimits,
}

impl IndividualSessions {
    pub fn new(keys: JwtKeys, ledger: Arc<dyn UsageLedger>, limits: SessionLimits) -> Self {
        Self {
            keys,
            ledger,
            limits,
        }
    }

    pub fn limits(&self) -> SessionLimits {
        self.limits
    }

    fn decode(&self, token: &str) -> Result<IndividualSessionClaims> {
        let claims: IndividualSessionClaims = self.keys.verify(token, None).map_err(|e| {
            debug!(
                token = %token_fingerprint(token),
                error = %e,
                "Individual session token rejected"
            );
            TryOnError::from(e)
        })?;

        if claims.user_type != SessionKind::Individual
            || claims.ai_uses_remaining > claims.max_ai_uses
        {
            return Err(TryOnError::AuthenticationFailure(
                "Invalid session token".to_string(),
            ));
        }

        Ok(claims)
    }

    fn summarize(claims: &IndividualSessionClaims, now: DateTime<Utc>) -> Result<SessionSummary> {
        if now > claims.expires_at {
            return Err(TryOnError::Expired);
        }

        Ok(SessionSummary {
            id: claims.session_id,
            kind: SessionKind::Individual,
            salon_id: None,
            max_ai_uses: claims.max_ai_uses,
            ai_uses_remaining: claims.ai_uses_remaining,
            expires_at: claims.expires_at,
            time_remaining_seconds: time_remaining_seconds(claims.expires_at, now),
        })
    }
}

#[async_trait]
impl SessionBackend for IndividualSessions {
    fn kind(&self) -> SessionKind {
        SessionKind::Individual
    }

    async fn start(&self, owner: SessionOwner) -> Result<StartedSession> {
        if owner != SessionOwner::Individual {
            return Err(TryOnError::InvalidArgument(
                "Individual sessions have no salon owner".to_string(),
            ));
        }

        let now = Utc::now().trunc_subsecs(0);
        let session_id = Uuid::new_v4();
        let expires_at = self.limits.expires_at(now);

        let claims = IndividualSessionClaims {
            session_id,
            user_type: SessionKind::Individual,
            max_ai_uses: self.limits.max_ai_uses,
            ai_uses_remaining: self.limits.max_ai_uses,
            session_duration_minutes: self.limits.duration_minutes,
            expires_at,
            created_at: now,
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        };
        let session_token = self.keys.sign(&claims)?;

        info!(
            session_id = %session_id,
            expires_at = %expires_at,
            max_ai_uses = self.limits.max_ai_uses,
            "Individual session started"
        );

        Ok(StartedSession {
            session_token,
            session_id,
            kind: SessionKind::Individual,
            salon_id: None,
            max_ai_uses: self.limits.max_ai_uses,
            session_duration_minutes: self.limits.duration_minutes,
            expires_at,
        })
    }

    async fn validate(&self, token: &str) -> Result<SessionSummary> {
        let claims = self.decode(token)?;
        Self::summarize(&claims, Utc::now())
    }

    async fn ensure_usable(&self, token: &str) -> Result<SessionSummary> {
        let claims = self.decode(token)?;
        let mut summary = Self::summarize(&claims, Utc::now())?;

        // A replayed older token still shows its old count
        let used = self.ledger.consumed(claims.session_id).await?;
        summary.ai_uses_remaining = claims
            .max_ai_uses
            .saturating_sub(used)
            .min(claims.ai_uses_remaining);
        if summary.ai_uses_remaining == 0 {
            debug!(session_id = %claims.session_id, used, "Individual session quota spent");
            return Err(TryOnError::QuotaExhausted);
        }
        Ok(summary)
    }

    async fn record_usage(&self, token: &str) -> Result<UsageReceipt> {
        let claims = self.decode(token)?;
        let now = Utc::now();
        Self::summarize(&claims, now)?;

        let used = self
            .ledger
            .consume(claims.session_id, claims.max_ai_uses, claims.expires_at)
            .await?
            .ok_or(TryOnError::QuotaExhausted)?;
        let ai_uses_remaining = claims.max_ai_uses.saturating_sub(used);

        let reissued = IndividualSessionClaims {
            ai_uses_remaining,
            iat: now.timestamp(),
            ..claims
        };
        let session_token = self.keys.sign(&reissued)?;

        info!(
            session_id = %reissued.session_id,
            ai_uses_remaining,
            "Individual session use recorded"
        );

        Ok(UsageReceipt {
            session_id: reissued.session_id,
            ai_uses_remaining,
            session_token: Some(session_token),
        })
    }
}
