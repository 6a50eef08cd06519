use crate::error::TryOnError;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Which session variant a token belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionKind {
    /// Stateless signed token for anonymous users
    Individual,
    /// Stored session for a salon's kiosk customer
    #[serde(alias = "client")]
    SalonClient,
}

impl SessionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionKind::Individual => "individual",
            SessionKind::SalonClient => "salon_client",
        }
    }
}

impl fmt::Display for SessionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SessionKind {
    type Err = TryOnError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "individual" => Ok(SessionKind::Individual),
            "salon_client" | "client" => Ok(SessionKind::SalonClient),
            other => Err(TryOnError::InvalidArgument(format!(
                "Unsupported user_type: {other}"
            ))),
        }
    }
}

/// Who a new session belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionOwner {
    Individual,
    Salon(Uuid),
}

impl SessionOwner {
    pub fn kind(&self) -> SessionKind {
        match self {
            SessionOwner::Individual => SessionKind::Individual,
            SessionOwner::Salon(_) => SessionKind::SalonClient,
        }
    }
}

/// Quota and lifetime applied to a new session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionLimits {
    pub max_ai_uses: u32,
    pub duration_minutes: u32,
}

impl SessionLimits {
    pub fn expires_at(&self, from: DateTime<Utc>) -> DateTime<Utc> {
        from + Duration::minutes(i64::from(self.duration_minutes))
    }
}

/// Seconds left before `expires_at`, never negative
pub fn time_remaining_seconds(expires_at: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    (expires_at - now).num_seconds().max(0)
}

/// Payload of an individual session token
///
/// `exp` mirrors `expires_at` so the signing library enforces expiry too.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndividualSessionClaims {
    pub session_id: Uuid,
    pub user_type: SessionKind,
    pub max_ai_uses: u32,
    pub ai_uses_remaining: u32,
    pub session_duration_minutes: u32,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub iat: i64,
    pub exp: i64,
}

/// Stored client session row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct ClientSession {
    pub id: Uuid,
    pub salon_id: Uuid,
    pub ai_uses_count: i32,
    pub max_ai_uses: i32,
    pub session_duration_minutes: i32,
    pub expires_at: DateTime<Utc>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl ClientSession {
    pub fn ai_uses_remaining(&self) -> u32 {
        u32::try_from(self.max_ai_uses - self.ai_uses_count).unwrap_or(0)
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }

    pub fn quota_exhausted(&self) -> bool {
        self.ai_uses_count >= self.max_ai_uses
    }
}

/// Values for a client session row about to be inserted
#[derive(Debug, Clone)]
pub struct NewClientSession {
    pub salon_id: Uuid,
    pub limits: SessionLimits,
    pub expires_at: DateTime<Utc>,
}

/// Result of starting a session of either kind
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartedSession {
    pub session_token: String,
    pub session_id: Uuid,
    pub kind: SessionKind,
    pub salon_id: Option<Uuid>,
    pub max_ai_uses: u32,
    pub session_duration_minutes: u32,
    pub expires_at: DateTime<Utc>,
}

/// Validated view of a session of either kind
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSummary {
    pub id: Uuid,
    pub kind: SessionKind,
    pub salon_id: Option<Uuid>,
    pub max_ai_uses: u32,
    pub ai_uses_remaining: u32,
    pub expires_at: DateTime<Utc>,
    pub time_remaining_seconds: i64,
}

/// Outcome of consuming one AI use
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UsageReceipt {
    pub session_id: Uuid,
    pub ai_uses_remaining: u32,
    /// Re-signed token carrying the new remaining count (individual sessions)
    pub session_token: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_kind_parse() {
        assert_eq!(
            "individual".parse::<SessionKind>().unwrap(),
            SessionKind::Individual
        );
        assert_eq!(
            "client".parse::<SessionKind>().unwrap(),
            SessionKind::SalonClient
        );
        assert!(matches!(
            "admin".parse::<SessionKind>(),
            Err(TryOnError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_session_kind_serde() {
        let json = serde_json::to_string(&SessionKind::SalonClient).unwrap();
        assert_eq!(json, "\"salon_client\"");
        let kind: SessionKind = serde_json::from_str("\"client\"").unwrap();
        assert_eq!(kind, SessionKind::SalonClient);
    }

    #[test]
    fn test_time_remaining_never_negative() {
        let now = Utc::now();
        assert_eq!(time_remaining_seconds(now - Duration::seconds(30), now), 0);
        assert_eq!(time_remaining_seconds(now + Duration::seconds(90), now), 90);
    }

    #[test]
    fn test_client_session_quota() {
        let now = Utc::now();
        let mut row = ClientSession {
            id: Uuid::new_v4(),
            salon_id: Uuid::new_v4(),
            ai_uses_count: 4,
            max_ai_uses: 5,
            session_duration_minutes: 15,
            expires_at: now + Duration::minutes(15),
            is_active: true,
            created_at: now,
        };
        assert_eq!(row.ai_uses_remaining(), 1);
        assert!(!row.quota_exhausted());

        row.ai_uses_count = 5;
        assert_eq!(row.ai_uses_remaining(), 0);
        assert!(row.quota_exhausted());
        assert!(!row.is_expired_at(now));
        assert!(row.is_expired_at(now + Duration::minutes(16)));
    }
}
