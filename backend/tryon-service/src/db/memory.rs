//! In-memory stores for tests and local development without PostgreSQL
//!
//! Conditional updates run under the `DashMap` entry lock, so they are atomic
//! with respect to other callers in the same process.

use super::{ClientSessionStore, SalonStore, StyleStore};
use crate::error::{Result, TryOnError};
use crate::models::{
    ClientSession, NewClientSession, Salon, SalonSettings, Style, StyleFilter,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::{mapref::entry::Entry, DashMap};
use uuid::Uuid;

/// Salons keyed by id, with an owner index that enforces one salon per owner
#[derive(Default)]
pub struct MemorySalonStore {
    salons: DashMap<Uuid, Salon>,
    owners: DashMap<Uuid, Uuid>,
}

impl MemorySalonStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, salon: Salon) {
        self.owners.insert(salon.owner_id, salon.id);
        self.salons.insert(salon.id, salon);
    }

    fn salon_id_for(&self, owner_id: Uuid) -> Option<Uuid> {
        self.owners.get(&owner_id).map(|id| *id)
    }
}

#[async_trait]
impl SalonStore for MemorySalonStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Salon>> {
        Ok(self.salons.get(&id).map(|s| s.clone()))
    }

    async fn find_by_owner(&self, owner_id: Uuid) -> Result<Option<Salon>> {
        Ok(self
            .salon_id_for(owner_id)
            .and_then(|id| self.salons.get(&id).map(|s| s.clone())))
    }

    async fn create_for_owner(&self, owner_id: Uuid, name: &str, email: &str) -> Result<Salon> {
        // The owner entry stays locked until the salon row is in place
        match self.owners.entry(owner_id) {
            Entry::Occupied(entry) => {
                let existing = self.salons.get(entry.get()).map(|s| s.clone());
                existing.ok_or_else(|| {
                    TryOnError::Internal(format!("salon index out of sync for owner {owner_id}"))
                })
            }
            Entry::Vacant(entry) => {
                let now = Utc::now();
                let salon = Salon {
                    id: Uuid::new_v4(),
                    owner_id,
                    name: name.to_string(),
                    email: email.to_string(),
                    max_ai_uses: None,
                    session_duration: None,
                    subscription_status: "inactive".to_string(),
                    stripe_customer_id: None,
                    created_at: now,
                    updated_at: now,
                };
                self.salons.insert(salon.id, salon.clone());
                entry.insert(salon.id);
                Ok(salon)
            }
        }
    }

    async fn update_settings(
        &self,
        owner_id: Uuid,
        settings: SalonSettings,
    ) -> Result<Option<Salon>> {
        let Some(id) = self.salon_id_for(owner_id) else {
            return Ok(None);
        };
        let Some(mut salon) = self.salons.get_mut(&id) else {
            return Ok(None);
        };

        salon.max_ai_uses = Some(settings.max_ai_uses as i32);
        salon.session_duration = Some(settings.session_duration as i32);
        salon.updated_at = Utc::now();
        Ok(Some(salon.clone()))
    }
}

#[derive(Default)]
pub struct MemoryClientSessionStore {
    sessions: DashMap<Uuid, ClientSession>,
}

impl MemoryClientSessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, session: ClientSession) {
        self.sessions.insert(session.id, session);
    }
}

#[async_trait]
impl ClientSessionStore for MemoryClientSessionStore {
    async fn create(&self, new_session: NewClientSession) -> Result<ClientSession> {
        let session = ClientSession {
            id: Uuid::new_v4(),
            salon_id: new_session.salon_id,
            ai_uses_count: 0,
            max_ai_uses: new_session.limits.max_ai_uses as i32,
            session_duration_minutes: new_session.limits.duration_minutes as i32,
            expires_at: new_session.expires_at,
            is_active: true,
            created_at: Utc::now(),
        };
        self.sessions.insert(session.id, session.clone());
        Ok(session)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<ClientSession>> {
        Ok(self.sessions.get(&id).map(|s| s.clone()))
    }

    async fn deactivate(&self, id: Uuid) -> Result<()> {
        if let Some(mut session) = self.sessions.get_mut(&id) {
            session.is_active = false;
        }
        Ok(())
    }

    async fn try_consume_use(
        &self,
        id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Option<ClientSession>> {
        let Some(mut session) = self.sessions.get_mut(&id) else {
            return Ok(None);
        };

        if !session.is_active || now >= session.expires_at || session.quota_exhausted() {
            return Ok(None);
        }

        session.ai_uses_count += 1;
        Ok(Some(session.clone()))
    }
}

pub struct MemoryStyleStore {
    styles: Vec<Style>,
}

impl MemoryStyleStore {
    pub fn new(styles: Vec<Style>) -> Self {
        Self { styles }
    }

    /// Small built-in catalog for running without a database
    pub fn with_default_catalog() -> Self {
        let style = |name: &str, category: &str, gender: &str, prompt: &str| Style {
            id: Uuid::new_v4(),
            name: name.to_string(),
            category: category.to_string(),
            gender: gender.to_string(),
            prompt: prompt.to_string(),
            image_url: None,
            is_active: true,
        };

        Self::new(vec![
            style(
                "Classic Bob",
                "short",
                "female",
                "a chin-length classic bob with soft, blunt ends",
            ),
            style(
                "Long Layers",
                "long",
                "female",
                "long hair with face-framing layers and natural movement",
            ),
            style(
                "Textured Crop",
                "short",
                "male",
                "a textured crop with a short fade on the sides",
            ),
            style(
                "Slick Back",
                "medium",
                "male",
                "medium-length hair combed back with a glossy finish",
            ),
        ])
    }
}

#[async_trait]
impl StyleStore for MemoryStyleStore {
    async fn list(&self, filter: &StyleFilter) -> Result<Vec<Style>> {
        Ok(self
            .styles
            .iter()
            .filter(|s| filter.matches(s))
            .cloned()
            .collect())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Style>> {
        Ok(self.styles.iter().find(|s| s.id == id).cloned())
    }
}
