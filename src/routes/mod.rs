pub mod health;
pub mod listing_images;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

use crate::auth::AuthLayer;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    let max_request = state.config.max_request_bytes as usize;

    // Public routes (no auth): health probe and image delivery.
    let public_routes = Router::new()
        .route("/health", get(health::health))
        .route(
            "/api/listing-images/{user_id_hex}/{listing_code}/{filename}",
            get(listing_images::serve_image),
        )
        .route(
            "/uploads/listings/{filename}",
            get(listing_images::serve_upload_path),
        );

    // Routes behind the upstream-gateway identity headers.
    let api_routes = Router::new()
        .route("/api/status", get(health::status))
        .route(
            "/api/listing-images/upload-multiple",
            post(listing_images::upload_images),
        )
        .route(
            "/api/listing-images/generate-listing-code",
            get(listing_images::generate_code),
        )
        .layer(AuthLayer);

    // CORS
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Request ID
    let x_request_id = http::HeaderName::from_static("x-request-id");

    Router::new()
        .merge(public_routes)
        .merge(api_routes)
        // Multipart reads the body through axum's extractor limit, so the
        // default 2 MiB cap must be raised to the batch ceiling as well.
        .layer(DefaultBodyLimit::max(max_request))
        .layer(cors)
        .layer(RequestBodyLimitLayer::new(max_request))
        .layer(PropagateRequestIdLayer::new(x_request_id.clone()))
        .layer(SetRequestIdLayer::new(x_request_id, MakeRequestUuid))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
