use super::ClientSessionStore;
use crate::error::Result;
use crate::models::{ClientSession, NewClientSession};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

const CLIENT_SESSION_COLUMNS: &str = "id, salon_id, ai_uses_count, max_ai_uses, \
     session_duration_minutes, expires_at, is_active, created_at";

/// `client_sessions` table
#[derive(Clone)]
pub struct PgClientSessionStore {
    pool: PgPool,
}

impl PgClientSessionStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ClientSessionStore for PgClientSessionStore {
    async fn create(&self, new_session: NewClientSession) -> Result<ClientSession> {
        let row = sqlx::query_as::<_, ClientSession>(&format!(
            r#"
            INSERT INTO client_sessions
                (id, salon_id, ai_uses_count, max_ai_uses, session_duration_minutes,
                 expires_at, is_active)
            VALUES ($1, $2, 0, $3, $4, $5, TRUE)
            RETURNING {CLIENT_SESSION_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(new_session.salon_id)
        .bind(new_session.limits.max_ai_uses as i32)
        .bind(new_session.limits.duration_minutes as i32)
        .bind(new_session.expires_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<ClientSession>> {
        let row = sqlx::query_as::<_, ClientSession>(&format!(
            "SELECT {CLIENT_SESSION_COLUMNS} FROM client_sessions WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    async fn deactivate(&self, id: Uuid) -> Result<()> {
        sqlx::query("UPDATE client_sessions SET is_active = FALSE WHERE id = $1 AND is_active")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn try_consume_use(
        &self,
        id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Option<ClientSession>> {
        let row = sqlx::query_as::<_, ClientSession>(&format!(
            r#"
            UPDATE client_sessions
            SET ai_uses_count = ai_uses_count + 1
            WHERE id = $1
              AND is_active
              AND expires_at > $2
              AND ai_uses_count < max_ai_uses
            RETURNING {CLIENT_SESSION_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(now)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }
}
