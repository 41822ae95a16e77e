//! OpenAPI documentation

use axum::Router;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{books, health, matches, me, trades};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Bookswap API",
        version = "0.1.0",
        description = "Book swapping and trade matching REST API",
        license(name = "AGPL-3.0", url = "https://www.gnu.org/licenses/agpl-3.0.html")
    ),
    servers(
        (url = "/api/v1", description = "API v1")
    ),
    paths(
        // Health
        health::health_check,
        health::readiness_check,
        // Books
        books::list_books,
        books::search_books,
        books::get_book,
        // Current user
        me::get_profile,
        me::add_to_wishlist,
        me::remove_from_wishlist,
        // Matching
        matches::list_matches,
        matches::get_match,
        // Trades
        trades::execute_trade,
    ),
    components(
        schemas(
            crate::models::Book,
            crate::models::BookId,
            crate::models::UserId,
            crate::models::UserProfile,
            crate::models::AddWishlistEntry,
            crate::models::Match,
            crate::models::TradeMode,
            crate::models::TradeRequest,
            crate::models::TradeReceipt,
            matches::MatchesResponse,
            health::HealthResponse,
            crate::error::ErrorResponse,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "books", description = "Book catalog"),
        (name = "me", description = "Current user's profile and wishlist"),
        (name = "matches", description = "Two-party swap discovery"),
        (name = "trades", description = "Trade execution")
    )
)]
pub struct ApiDoc;

/// Create the OpenAPI documentation router
pub fn create_openapi_router() -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
