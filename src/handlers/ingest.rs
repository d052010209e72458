use std::net::SocketAddr;

use axum::extract::rejection::JsonRejection;
use axum::extract::{ConnectInfo, State};
use axum::http::StatusCode;
use axum::{Json, TypedHeader};
use tracing::{debug, info};

use crate::models::error::AppError;
use crate::models::location::IncomingLocation;
use crate::models::responses::IngestResponse;
use crate::state::AppState;

/// `POST /api/locations`
pub async fn store_location(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    user_agent: Option<TypedHeader<headers::UserAgent>>,
    payload: Result<Json<IncomingLocation>, JsonRejection>,
) -> Result<(StatusCode, Json<IngestResponse>), AppError> {
    let Json(mut incoming) = payload.map_err(|rejection| {
        debug!("Rejected location payload from {}: {}", addr, rejection);
        AppError::BadRequest(rejection.body_text())
    })?;

    if incoming.user_agent.is_none() {
        incoming.user_agent = user_agent.map(|TypedHeader(ua)| ua.as_str().to_string());
    }

    let guard = state.ingest_lock.lock().await;
    let record = incoming.into_record(state.ingest.policy(), addr.ip(), state.clock.now())?;
    let id = record.id;

    state.store.append(record).await?;
    drop(guard);
    info!("Stored location {} from {}", id, addr.ip());

    Ok((
        StatusCode::CREATED,
        Json(IngestResponse::stored(state.ingest.redirect_url.clone())),
    ))
}
