use super::SessionBackend;
use crate::db::{ClientSessionStore, SalonStore};
use crate::error::{Result, TryOnError};
use crate::models::session::time_remaining_seconds;
use crate::models::{
    ClientSession, NewClientSession, SessionKind, SessionLimits, SessionOwner, SessionSummary,
    StartedSession, UsageReceipt,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

/// Stored sessions for a salon's kiosk customers
///
/// The session token is the row id. Limits are read from the owning salon
/// at start and copied onto the row.
pub struct ClientSessions {
    salons: Arc<dyn SalonStore>,
    sessions: Arc<dyn ClientSessionStore>,
    defaults: SessionLimits,
}

impl ClientSessions {
    pub fn new(
        salons: Arc<dyn SalonStore>,
        sessions: Arc<dyn ClientSessionStore>,
        defaults: SessionLimits,
    ) -> Self {
        Self {
            salons,
            sessions,
            defaults,
        }
    }

    fn parse_token(token: &str) -> Result<Uuid> {
        Uuid::parse_str(token.trim())
            .map_err(|_| TryOnError::AuthenticationFailure("Invalid session".to_string()))
    }

    async fn load(&self, id: Uuid) -> Result<ClientSession> {
        self.sessions
            .find_by_id(id)
            .await?
            .ok_or_else(|| TryOnError::AuthenticationFailure("Invalid session".to_string()))
    }

    /// Apply the validation rules to a loaded row
    ///
    /// Order matters: inactive, then expired (deactivating first), then quota.
    async fn check(&self, session: &ClientSession, now: DateTime<Utc>) -> Result<SessionSummary> {
        if !session.is_active {
            return Err(TryOnError::AuthenticationFailure(
                "Session is no longer active".to_string(),
            ));
        }

        if session.is_expired_at(now) {
            self.sessions.deactivate(session.id).await?;
            info!(session_id = %session.id, "Client session expired and deactivated");
            return Err(TryOnError::Expired);
        }

        if session.quota_exhausted() {
            return Err(TryOnError::QuotaExhausted);
        }

        Ok(SessionSummary {
            id: session.id,
            kind: SessionKind::SalonClient,
            salon_id: Some(session.salon_id),
            max_ai_uses: u32::try_from(session.max_ai_uses).unwrap_or(0),
            ai_uses_remaining: session.ai_uses_remaining(),
            expires_at: session.expires_at,
            time_remaining_seconds: time_remaining_seconds(session.expires_at, now),
        })
    }
}

#[async_trait]
impl SessionBackend for ClientSessions {
    fn kind(&self) -> SessionKind {
        SessionKind::SalonClient
    }

    async fn start(&self, owner: SessionOwner) -> Result<StartedSession> {
        let SessionOwner::Salon(salon_id) = owner else {
            return Err(TryOnError::InvalidArgument(
                "salon_id is required for client sessions".to_string(),
            ));
        };

        let salon = self
            .salons
            .find_by_id(salon_id)
            .await?
            .ok_or_else(|| TryOnError::NotFound("Salon not found".to_string()))?;

        let limits = salon.session_limits(self.defaults);
        let now = Utc::now();
        let session = self
            .sessions
            .create(NewClientSession {
                salon_id,
                limits,
                expires_at: limits.expires_at(now),
            })
            .await?;

        info!(
            session_id = %session.id,
            salon_id = %salon_id,
            max_ai_uses = limits.max_ai_uses,
            duration_minutes = limits.duration_minutes,
            "Client session started"
        );

        Ok(StartedSession {
            session_token: session.id.to_string(),
            session_id: session.id,
            kind: SessionKind::SalonClient,
            salon_id: Some(salon_id),
            max_ai_uses: limits.max_ai_uses,
            session_duration_minutes: limits.duration_minutes,
            expires_at: session.expires_at,
        })
    }

    async fn validate(&self, token: &str) -> Result<SessionSummary> {
        let id = Self::parse_token(token)?;
        let session = self.load(id).await?;
        self.check(&session, Utc::now()).await
    }

    async fn record_usage(&self, token: &str) -> Result<UsageReceipt> {
        let id = Self::parse_token(token)?;
        let now = Utc::now();

        if let Some(updated) = self.sessions.try_consume_use(id, now).await? {
            info!(
                session_id = %id,
                ai_uses_count = updated.ai_uses_count,
                max_ai_uses = updated.max_ai_uses,
                "Client session use recorded"
            );
            return Ok(UsageReceipt {
                session_id: id,
                ai_uses_remaining: updated.ai_uses_remaining(),
                session_token: None,
            });
        }

        // The conditional update refused; report why with the validation rules
        let session = self.load(id).await?;
        self.check(&session, now).await?;

        // Only reachable when now == expires_at: not usable, not yet past expiry
        warn!(session_id = %id, "Client session use refused at expiry boundary");
        Err(TryOnError::Expired)
    }
}
