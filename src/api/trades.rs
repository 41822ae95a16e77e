//! Trade execution endpoint

use axum::{extract::State, Json};
use validator::Validate;

use crate::{
    error::AppResult,
    models::{TradeReceipt, TradeRequest, UserId},
};

use super::CurrentUser;

/// Execute a trade with a counterparty.
///
/// `mode = "wishlist"` (default) adds each party's whole wishlist to the
/// other's inventory without removing anything. `mode = "scoped"` moves only
/// the currently matched books and removes them from the giver's inventory
/// and the receiver's wishlist.
#[utoipa::path(
    post,
    path = "/trades",
    tag = "trades",
    params(
        ("X-User-Id" = String, Header, description = "Current user ID")
    ),
    request_body = TradeRequest,
    responses(
        (status = 200, description = "Trade applied", body = TradeReceipt),
        (status = 400, description = "Invalid counterparty"),
        (status = 404, description = "User or counterparty not found"),
        (status = 409, description = "A traded book changed hands meanwhile, nothing was applied"),
        (status = 503, description = "Catalog store unavailable, nothing was applied")
    )
)]
pub async fn execute_trade(
    State(state): State<crate::AppState>,
    CurrentUser(user_id): CurrentUser,
    Json(request): Json<TradeRequest>,
) -> AppResult<Json<TradeReceipt>> {
    request.validate()?;
    let counterparty_id = UserId::parse(request.counterparty_id)?;

    let receipt = state
        .services
        .trades
        .execute_trade(&user_id, &counterparty_id, request.mode)
        .await?;
    Ok(Json(receipt))
}
