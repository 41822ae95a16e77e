//! User model and related types

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use super::{Book, BookId, UserId};
use crate::error::{AppError, AppResult};

/// A swapper with the books they own and the books they want.
///
/// Inventory and wishlist are sets: inserting a book twice is a no-op.
/// They are not required to be disjoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: String,
    #[serde(default)]
    #[schema(value_type = Vec<String>)]
    pub inventory: BTreeSet<BookId>,
    #[serde(default)]
    #[schema(value_type = Vec<String>)]
    pub wishlist: BTreeSet<BookId>,
}

/// User row from database, with inventory and wishlist aggregated into arrays
#[derive(Debug, Clone, FromRow)]
pub struct UserRow {
    pub id: String,
    pub name: String,
    pub email: Option<String>,
    pub inventory: Vec<String>,
    pub wishlist: Vec<String>,
}

impl TryFrom<UserRow> for User {
    type Error = AppError;

    fn try_from(row: UserRow) -> AppResult<Self> {
        Ok(User {
            id: UserId::parse(row.id)?,
            name: row.name,
            email: row.email.unwrap_or_default(),
            inventory: row
                .inventory
                .into_iter()
                .map(BookId::parse)
                .collect::<AppResult<_>>()?,
            wishlist: row
                .wishlist
                .into_iter()
                .map(BookId::parse)
                .collect::<AppResult<_>>()?,
        })
    }
}

/// User with inventory and wishlist resolved to catalog entries
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct UserProfile {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub inventory: Vec<Book>,
    pub wishlist: Vec<Book>,
}

/// Add-to-wishlist request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct AddWishlistEntry {
    #[validate(length(min = 1, max = 64, message = "Book id must be 1-64 characters"))]
    pub book_id: String,
}
