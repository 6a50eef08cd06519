//! Persistence seams
//!
//! Each table is reached through a trait so the services run against
//! PostgreSQL in deployment and against in-memory maps in tests and local
//! development without a database.

pub mod client_session_repo;
pub mod memory;
pub mod salon_repo;
pub mod style_repo;

use crate::error::Result;
use crate::models::{
    ClientSession, NewClientSession, Salon, SalonSettings, Style, StyleFilter,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

pub use client_session_repo::PgClientSessionStore;
pub use memory::{MemoryClientSessionStore, MemorySalonStore, MemoryStyleStore};
pub use salon_repo::PgSalonStore;
pub use style_repo::PgStyleStore;

#[async_trait]
pub trait SalonStore: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Salon>>;

    async fn find_by_owner(&self, owner_id: Uuid) -> Result<Option<Salon>>;

    /// Create the owner's salon, or return the existing one
    async fn create_for_owner(&self, owner_id: Uuid, name: &str, email: &str) -> Result<Salon>;

    async fn update_settings(
        &self,
        owner_id: Uuid,
        settings: SalonSettings,
    ) -> Result<Option<Salon>>;
}

#[async_trait]
pub trait ClientSessionStore: Send + Sync {
    async fn create(&self, new_session: NewClientSession) -> Result<ClientSession>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<ClientSession>>;

    /// Mark a session inactive; a no-op when it already is
    async fn deactivate(&self, id: Uuid) -> Result<()>;

    /// Increment `ai_uses_count` in one step, only if the session is active,
    /// `now < expires_at` and the count is below `max_ai_uses`
    ///
    /// Returns the updated row, or `None` when the condition did not hold.
    async fn try_consume_use(
        &self,
        id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Option<ClientSession>>;
}

#[async_trait]
pub trait StyleStore: Send + Sync {
    /// Active styles matching the filter
    async fn list(&self, filter: &StyleFilter) -> Result<Vec<Style>>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Style>>;
}
