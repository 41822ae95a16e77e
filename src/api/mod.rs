//! API handlers for Bookswap REST endpoints

pub mod books;
pub mod health;
pub mod matches;
pub mod me;
pub mod openapi;
pub mod trades;

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::request::Parts,
    routing::{delete, get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{error::AppError, models::UserId, AppState};

/// Header carrying the caller's identity, set by the upstream session layer
pub const USER_ID_HEADER: &str = "x-user-id";

/// Extractor for the user on whose behalf the request is made.
///
/// Authentication happens upstream; this only reads and validates the id.
pub struct CurrentUser(pub UserId);

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &AppState) -> Result<Self, Self::Rejection> {
        let raw = parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| AppError::InvalidInput("Missing X-User-Id header".to_string()))?;

        Ok(CurrentUser(UserId::parse(raw.trim())?))
    }
}

/// Create the application router with all routes
pub fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // API v1 routes
    let api_v1 = Router::new()
        // Health check
        .route("/health", get(health::health_check))
        .route("/ready", get(health::readiness_check))
        // Catalog
        .route("/books", get(books::list_books))
        .route("/books/search", get(books::search_books))
        .route("/books/:id", get(books::get_book))
        // Current user
        .route("/me", get(me::get_profile))
        .route("/me/wishlist", post(me::add_to_wishlist))
        .route("/me/wishlist/:book_id", delete(me::remove_from_wishlist))
        // Matching
        .route("/matches", get(matches::list_matches))
        .route("/matches/:counterparty_id", get(matches::get_match))
        // Trades
        .route("/trades", post(trades::execute_trade))
        .with_state(state);

    // OpenAPI documentation
    let openapi = openapi::create_openapi_router();

    Router::new()
        .nest("/api/v1", api_v1)
        .merge(openapi)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}
