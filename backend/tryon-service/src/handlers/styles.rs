use crate::error::Result;
use crate::models::StyleFilter;
use crate::state::AppState;
use actix_web::{web, HttpResponse};

/// List active catalog styles, optionally filtered by gender and category
pub async fn list_styles(
    state: web::Data<AppState>,
    query: web::Query<StyleFilter>,
) -> Result<HttpResponse> {
    let styles = state.styles.list(&query).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "styles": styles,
        "count": styles.len(),
    })))
}
