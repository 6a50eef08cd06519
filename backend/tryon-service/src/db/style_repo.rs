use super::StyleStore;
use crate::error::Result;
use crate::models::{Style, StyleFilter};
use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

/// `styles` table
#[derive(Clone)]
pub struct PgStyleStore {
    pool: PgPool,
}

impl PgStyleStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl StyleStore for PgStyleStore {
    async fn list(&self, filter: &StyleFilter) -> Result<Vec<Style>> {
        let styles = sqlx::query_as::<_, Style>(
            r#"
            SELECT id, name, category, gender, prompt, image_url, is_active
            FROM styles
            WHERE is_active
              AND ($1::text IS NULL OR lower(gender) = lower($1))
              AND ($2::text IS NULL OR lower(category) = lower($2))
            ORDER BY category, name
            "#,
        )
        .bind(filter.gender.as_deref())
        .bind(filter.category.as_deref())
        .fetch_all(&self.pool)
        .await?;

        Ok(styles)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Style>> {
        let style = sqlx::query_as::<_, Style>(
            r#"
            SELECT id, name, category, gender, prompt, image_url, is_active
            FROM styles
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(style)
    }
}
