//! Endpoints acting on the current user's profile and wishlist

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use validator::Validate;

use crate::{
    error::AppResult,
    models::{AddWishlistEntry, BookId, UserProfile},
};

use super::CurrentUser;

/// Get the current user's profile with resolved books
#[utoipa::path(
    get,
    path = "/me",
    tag = "me",
    params(
        ("X-User-Id" = String, Header, description = "Current user ID")
    ),
    responses(
        (status = 200, description = "Profile with inventory and wishlist", body = UserProfile),
        (status = 404, description = "User not found")
    )
)]
pub async fn get_profile(
    State(state): State<crate::AppState>,
    CurrentUser(user_id): CurrentUser,
) -> AppResult<Json<UserProfile>> {
    let profile = state.services.catalog.user_profile(&user_id).await?;
    Ok(Json(profile))
}

/// Add a book to the current user's wishlist
#[utoipa::path(
    post,
    path = "/me/wishlist",
    tag = "me",
    params(
        ("X-User-Id" = String, Header, description = "Current user ID")
    ),
    request_body = AddWishlistEntry,
    responses(
        (status = 204, description = "Book is on the wishlist"),
        (status = 400, description = "Invalid book id"),
        (status = 404, description = "User or book not found")
    )
)]
pub async fn add_to_wishlist(
    State(state): State<crate::AppState>,
    CurrentUser(user_id): CurrentUser,
    Json(request): Json<AddWishlistEntry>,
) -> AppResult<StatusCode> {
    request.validate()?;
    let book_id = BookId::parse(request.book_id)?;

    state.services.catalog.add_to_wishlist(&user_id, &book_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Remove a book from the current user's wishlist
#[utoipa::path(
    delete,
    path = "/me/wishlist/{book_id}",
    tag = "me",
    params(
        ("X-User-Id" = String, Header, description = "Current user ID"),
        ("book_id" = String, Path, description = "Book ID")
    ),
    responses(
        (status = 204, description = "Book is not on the wishlist"),
        (status = 404, description = "User not found")
    )
)]
pub async fn remove_from_wishlist(
    State(state): State<crate::AppState>,
    CurrentUser(user_id): CurrentUser,
    Path(book_id): Path<String>,
) -> AppResult<StatusCode> {
    let book_id = BookId::parse(book_id)?;

    state.services.catalog.remove_from_wishlist(&user_id, &book_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use axum::{body::Body, http::{Request, StatusCode}};
    use serde_json::json;

    use crate::api::test_support::{app, get, json, send};

    #[tokio::test]
    async fn test_profile_requires_identity() {
        let (app, _) = app();
        let (status, body) = send(&app, get("/api/v1/me", None)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "BadValue");

        let (status, _) = send(&app, get("/api/v1/me", Some("ghost"))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_profile_lists_books() {
        let (app, _) = app();
        let (status, body) = send(&app, get("/api/v1/me", Some("alice"))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["inventory"].as_array().unwrap().len(), 2);
        assert_eq!(body["wishlist"][0]["title"], "Ulysses");
    }

    #[tokio::test]
    async fn test_wishlist_add_and_remove() {
        let (app, _) = app();
        let request = json("POST", "/api/v1/me/wishlist", "alice", json!({ "book_id": "6" }));
        let (status, _) = send(&app, request).await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (_, body) = send(&app, get("/api/v1/me", Some("alice"))).await;
        assert_eq!(body["wishlist"].as_array().unwrap().len(), 2);

        let request = Request::delete("/api/v1/me/wishlist/6")
            .header("X-User-Id", "alice")
            .body(Body::empty())
            .unwrap();
        let (status, _) = send(&app, request).await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let request = json("POST", "/api/v1/me/wishlist", "alice", json!({ "book_id": "" }));
        let (status, _) = send(&app, request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
