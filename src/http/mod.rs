//! Router assembly: REST endpoints, static card images, CORS, request tracing.

pub mod routes;

use std::path::Path;

use axum::{handler::HandlerWithoutStateExt, routing::{delete, get, post}, Router};
use axum::http::{header, Method};
use tower_http::{cors::{Any, CorsLayer}, services::ServeDir, trace::TraceLayer};

pub use routes::AppState;

pub fn router(state: AppState, images_dir: impl AsRef<Path>) -> Router {
    // Unmatched paths try the images directory before the JSON 404.
    let static_files = ServeDir::new(images_dir.as_ref())
        .call_fallback_on_method_not_allowed(true)
        .not_found_service(routes::not_found.into_service());

    Router::new()
        .route("/healthz", get(routes::healthz))
        .route("/exodia-parts", get(routes::exodia_parts))
        .route("/user-cards", get(routes::user_cards).put(routes::add_user_card))
        .route("/user-cards/:id", delete(routes::remove_user_card))
        .route("/reset-cards", post(routes::reset_cards))
        .fallback_service(static_files)
        .layer(
            CorsLayer::new()
                .allow_methods([Method::GET, Method::PUT, Method::DELETE, Method::POST])
                .allow_headers([header::CONTENT_TYPE])
                .allow_origin(Any),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
