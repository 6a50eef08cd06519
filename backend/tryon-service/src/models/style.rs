use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Hairstyle in the try-on catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct Style {
    pub id: Uuid,
    pub name: String,
    pub category: String,
    pub gender: String,
    /// Prompt sent to the image model
    #[serde(skip_serializing)]
    pub prompt: String,
    pub image_url: Option<String>,
    pub is_active: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StyleFilter {
    pub gender: Option<String>,
    pub category: Option<String>,
}

impl StyleFilter {
    pub fn matches(&self, style: &Style) -> bool {
        let gender_ok = self
            .gender
            .as_deref()
            .map_or(true, |g| style.gender.eq_ignore_ascii_case(g));
        let category_ok = self
            .category
            .as_deref()
            .map_or(true, |c| style.category.eq_ignore_ascii_case(c));
        style.is_active && gender_ok && category_ok
    }
}
