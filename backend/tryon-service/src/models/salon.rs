use crate::models::SessionLimits;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Salon owned by one auth-provider user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct Salon {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub name: String,
    pub email: String,
    pub max_ai_uses: Option<i32>,
    pub session_duration: Option<i32>,
    pub subscription_status: String,
    #[serde(skip_serializing)]
    pub stripe_customer_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Salon {
    /// Effective client-session limits, falling back to `defaults` when unset
    pub fn session_limits(&self, defaults: SessionLimits) -> SessionLimits {
        let max_ai_uses = self
            .max_ai_uses
            .and_then(|v| u32::try_from(v).ok())
            .filter(|v| *v > 0)
            .unwrap_or(defaults.max_ai_uses);
        let duration_minutes = self
            .session_duration
            .and_then(|v| u32::try_from(v).ok())
            .filter(|v| *v > 0)
            .unwrap_or(defaults.duration_minutes);

        SessionLimits {
            max_ai_uses,
            duration_minutes,
        }
    }
}

/// Owner-editable client-session limits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct SalonSettings {
    #[validate(range(min = 1, max = 100))]
    pub max_ai_uses: u32,
    #[validate(range(min = 5, max = 240))]
    pub session_duration: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn salon(max_ai_uses: Option<i32>, session_duration: Option<i32>) -> Salon {
        let now = Utc::now();
        Salon {
            id: Uuid::new_v4(),
            owner_id: Uuid::new_v4(),
            name: "Studio".into(),
            email: "studio@test".into(),
            max_ai_uses,
            session_duration,
            subscription_status: "inactive".into(),
            stripe_customer_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    const DEFAULTS: SessionLimits = SessionLimits {
        max_ai_uses: 5,
        duration_minutes: 15,
    };

    #[test]
    fn test_limits_fall_back_to_defaults() {
        assert_eq!(salon(None, None).session_limits(DEFAULTS), DEFAULTS);
        assert_eq!(salon(Some(0), Some(-3)).session_limits(DEFAULTS), DEFAULTS);
    }

    #[test]
    fn test_limits_use_salon_values() {
        let limits = salon(Some(8), Some(30)).session_limits(DEFAULTS);
        assert_eq!(limits.max_ai_uses, 8);
        assert_eq!(limits.duration_minutes, 30);
    }

    #[test]
    fn test_settings_validation() {
        assert!(SalonSettings {
            max_ai_uses: 10,
            session_duration: 30
        }
        .validate()
        .is_ok());
        assert!(SalonSettings {
            max_ai_uses: 0,
            session_duration: 30
        }
        .validate()
        .is_err());
        assert!(SalonSettings {
            max_ai_uses: 10,
            session_duration: 241
        }
        .validate()
        .is_err());
    }
}
