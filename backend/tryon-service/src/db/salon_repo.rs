use super::SalonStore;
use crate::error::Result;
use crate::models::{Salon, SalonSettings};
use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

const SALON_COLUMNS: &str = "id, owner_id, name, email, max_ai_uses, session_duration, \
     subscription_status, stripe_customer_id, created_at, updated_at";

/// `salons` table
#[derive(Clone)]
pub struct PgSalonStore {
    pool: PgPool,
}

impl PgSalonStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SalonStore for PgSalonStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Salon>> {
        let salon = sqlx::query_as::<_, Salon>(&format!(
            "SELECT {SALON_COLUMNS} FROM salons WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(salon)
    }

    async fn find_by_owner(&self, owner_id: Uuid) -> Result<Option<Salon>> {
        let salon = sqlx::query_as::<_, Salon>(&format!(
            "SELECT {SALON_COLUMNS} FROM salons WHERE owner_id = $1"
        ))
        .bind(owner_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(salon)
    }

    async fn create_for_owner(&self, owner_id: Uuid, name: &str, email: &str) -> Result<Salon> {
        // owner_id is unique; a concurrent first login just reads the winner's row
        let salon = sqlx::query_as::<_, Salon>(&format!(
            r#"
            INSERT INTO salons (id, owner_id, name, email, subscription_status)
            VALUES ($1, $2, $3, $4, 'inactive')
            ON CONFLICT (owner_id) DO UPDATE SET updated_at = salons.updated_at
            RETURNING {SALON_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(owner_id)
        .bind(name)
        .bind(email)
        .fetch_one(&self.pool)
        .await?;

        Ok(salon)
    }

    async fn update_settings(
        &self,
        owner_id: Uuid,
        settings: SalonSettings,
    ) -> Result<Option<Salon>> {
        let salon = sqlx::query_as::<_, Salon>(&format!(
            r#"
            UPDATE salons
            SET max_ai_uses = $2, session_duration = $3, updated_at = NOW()
            WHERE owner_id = $1
            RETURNING {SALON_COLUMNS}
            "#
        ))
        .bind(owner_id)
        .bind(settings.max_ai_uses as i32)
        .bind(settings.session_duration as i32)
        .fetch_optional(&self.pool)
        .await?;

        Ok(salon)
    }
}
