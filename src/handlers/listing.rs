use axum::extract::State;
use axum::response::Html;
use axum::{Extension, Json};
use tracing::debug;

use crate::jwt_auth::UserId;
use crate::models::error::AppError;
use crate::models::responses::{HealthStatus, LocationListing};
use crate::state::AppState;
use crate::views;

/// `GET /admin/locations`
pub async fn list_locations(
    State(state): State<AppState>,
    user: Option<Extension<UserId>>,
) -> Result<Json<LocationListing>, AppError> {
    let records = state.store.list_all().await?;
    if let Some(Extension(UserId(sub))) = user {
        debug!("{} listed {} locations", sub, records.len());
    }
    Ok(Json(records.into()))
}

/// `GET /view-locations`
pub async fn view_locations(State(state): State<AppState>) -> Result<Html<String>, AppError> {
    let records = state.store.list_all().await?;
    Ok(Html(views::locations_page(&records)))
}

/// `GET /`
pub async fn landing_page() -> Html<&'static str> {
    Html(views::index_page())
}

/// `GET /healthz`
pub async fn health(State(state): State<AppState>) -> Result<Json<HealthStatus>, AppError> {
    state.store.health_check().await?;
    let count = state.store.count().await?;
    Ok(Json(HealthStatus { status: "ok", count }))
}
