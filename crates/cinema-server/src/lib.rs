//! HTTP surface of the movie catalog: routing, handlers and error mapping.

use axum::{
    http::{HeaderValue, Method},
    routing::get,
    Router,
};
use cinema_db::AppState;
use std::sync::Arc;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    set_header::SetResponseHeaderLayer,
    trace::TraceLayer,
};

pub mod api;
pub mod config;
pub mod error;

pub use config::ServerConfig;
pub use error::ApiError;

/// Movie routes only, without middleware. Mounted under both `/movies` and
/// `/movies/` for the collection.
pub fn movie_routes() -> Router<Arc<AppState>> {
    let collection = get(api::movies::list_movies).post(api::movies::create_movie);

    Router::new()
        .route("/movies", collection.clone())
        .route("/movies/", collection)
        .route(
            "/movies/{id}",
            get(api::movies::get_movie)
                .patch(api::movies::update_movie)
                .put(api::movies::replace_movie)
                .delete(api::movies::delete_movie),
        )
}

/// Full application router with tracing, CORS and response headers.
pub fn build_router(state: Arc<AppState>, config: &ServerConfig) -> Router {
    Router::new()
        .route("/healthz", get(api::healthz))
        .merge(movie_routes())
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(&config.cors_origins))
        .layer(SetResponseHeaderLayer::overriding(
            axum::http::header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .with_state(state)
}

fn cors_layer(origins: &[HeaderValue]) -> CorsLayer {
    let origin = if origins.is_empty() {
        tracing::warn!("CORS_ORIGINS not set, allowing any origin");
        AllowOrigin::any()
    } else {
        tracing::info!("CORS allowed origins: {:?}", origins);
        AllowOrigin::list(origins.iter().cloned())
    };

    CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers(Any)
}
