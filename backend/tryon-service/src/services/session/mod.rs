//! Time-boxed, usage-limited sessions
//!
//! Two variants share one contract:
//!
//! - [`IndividualSessions`]: stateless signed tokens for anonymous users,
//!   with consumption tracked by a usage ledger
//! - [`ClientSessions`]: stored rows for a salon's kiosk customers
//!
//! [`SessionManager`] picks the variant from a [`SessionKind`] tag so callers
//! never branch on the representation.

mod client;
mod individual;

pub use client::ClientSessions;
pub use individual::IndividualSessions;

use crate::error::{Result, TryOnError};
use crate::metrics;
use crate::models::{SessionKind, SessionOwner, SessionSummary, StartedSession, UsageReceipt};
use async_trait::async_trait;
use std::sync::Arc;

#[async_trait]
pub trait SessionBackend: Send + Sync {
    fn kind(&self) -> SessionKind;

    /// Create a session for `owner` with the applicable limits
    async fn start(&self, owner: SessionOwner) -> Result<StartedSession>;

    /// Check a session without consuming anything
    async fn validate(&self, token: &str) -> Result<SessionSummary>;

    /// Check that a session still has a use left before doing paid work
    ///
    /// Stricter than `validate`: the remaining count comes from the
    /// authoritative store, not from whatever the caller presented.
    async fn ensure_usable(&self, token: &str) -> Result<SessionSummary> {
        let summary = self.validate(token).await?;
        if summary.ai_uses_remaining == 0 {
            return Err(TryOnError::QuotaExhausted);
        }
        Ok(summary)
    }

    /// Atomically consume one AI use
    ///
    /// Call only after the guarded operation succeeded, so failures are
    /// never charged.
    async fn record_usage(&self, token: &str) -> Result<UsageReceipt>;
}

/// Dispatches session operations to the backend for each kind
#[derive(Clone)]
pub struct SessionManager {
    individual: Arc<dyn SessionBackend>,
    client: Arc<dyn SessionBackend>,
}

impl SessionManager {
    pub fn new(individual: Arc<dyn SessionBackend>, client: Arc<dyn SessionBackend>) -> Self {
        Self { individual, client }
    }

    pub fn backend(&self, kind: SessionKind) -> &dyn SessionBackend {
        match kind {
            SessionKind::Individual => self.individual.as_ref(),
            SessionKind::SalonClient => self.client.as_ref(),
        }
    }

    pub async fn start(&self, owner: SessionOwner) -> Result<StartedSession> {
        let started = self.backend(owner.kind()).start(owner).await?;
        metrics::record_session_started(started.kind);
        Ok(started)
    }

    pub async fn validate(&self, kind: SessionKind, token: &str) -> Result<SessionSummary> {
        let result = self.backend(kind).validate(token).await;
        metrics::record_validation(kind, &result);
        result
    }

    pub async fn ensure_usable(&self, kind: SessionKind, token: &str) -> Result<SessionSummary> {
        let result = self.backend(kind).ensure_usable(token).await;
        metrics::record_validation(kind, &result);
        result
    }

    pub async fn record_usage(&self, kind: SessionKind, token: &str) -> Result<UsageReceipt> {
        let result = self.backend(kind).record_usage(token).await;
        metrics::record_usage(kind, &result);
        result
    }
}
