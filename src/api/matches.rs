//! Match finder endpoints

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    error::{AppError, AppResult},
    models::{Match, UserId},
};

use super::CurrentUser;

/// Matches for the current user
#[derive(Serialize, ToSchema)]
pub struct MatchesResponse {
    pub user_id: UserId,
    /// One entry per counterparty, ordered by counterparty id
    pub matches: Vec<Match>,
}

/// List every possible two-party swap for the current user
#[utoipa::path(
    get,
    path = "/matches",
    tag = "matches",
    params(
        ("X-User-Id" = String, Header, description = "Current user ID")
    ),
    responses(
        (status = 200, description = "Swap candidates (possibly empty)", body = MatchesResponse),
        (status = 404, description = "User not found"),
        (status = 503, description = "Catalog store unavailable, retry later")
    )
)]
pub async fn list_matches(
    State(state): State<crate::AppState>,
    CurrentUser(user_id): CurrentUser,
) -> AppResult<Json<MatchesResponse>> {
    let matches = state.services.matching.find_matches(&user_id).await?;
    Ok(Json(MatchesResponse { user_id, matches }))
}

/// Get the swap between the current user and one counterparty
#[utoipa::path(
    get,
    path = "/matches/{counterparty_id}",
    tag = "matches",
    params(
        ("X-User-Id" = String, Header, description = "Current user ID"),
        ("counterparty_id" = String, Path, description = "Counterparty user ID")
    ),
    responses(
        (status = 200, description = "Swap with this counterparty", body = Match),
        (status = 404, description = "User not found or no swap possible")
    )
)]
pub async fn get_match(
    State(state): State<crate::AppState>,
    CurrentUser(user_id): CurrentUser,
    Path(counterparty_id): Path<String>,
) -> AppResult<Json<Match>> {
    let counterparty_id = UserId::parse(counterparty_id)?;

    state
        .services
        .matching
        .find_match_with(&user_id, &counterparty_id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::match_not_found(&user_id, &counterparty_id))
}
