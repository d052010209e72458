use std::path::Path;

use axum::routing::{get, post};
use axum::{middleware, Router};
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::{DefaultMakeSpan, TraceLayer};

use crate::handlers::ingest::store_location;
use crate::handlers::listing::{health, landing_page, list_locations, view_locations};
use crate::state::AppState;
use crate::{jwt_auth, rate_limit, security_headers};

pub fn build(state: AppState, static_dir: impl AsRef<Path>) -> Router {
    let ingest = Router::new()
        .route("/api/locations", post(store_location))
        .route_layer(middleware::from_fn_with_state(
            state.limiter.clone(),
            rate_limit::enforce,
        ));

    let mut admin = Router::new()
        .route("/admin/locations", get(list_locations))
        .route("/view-locations", get(view_locations));
    if let Some(jwt) = &state.admin_auth {
        admin = admin.route_layer(middleware::from_fn_with_state(jwt.clone(), jwt_auth::auth));
    }

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(landing_page))
        .route("/healthz", get(health))
        .merge(ingest)
        .merge(admin)
        .nest_service("/static", ServeDir::new(static_dir))
        .layer(cors)
        .layer(middleware::from_fn_with_state(
            state.security.clone(),
            security_headers::apply,
        ))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::default().include_headers(true)),
        )
        .with_state(state)
}
