//! Book catalog model

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

use super::BookId;
use crate::error::AppResult;

/// Catalog entry referenced by id from user inventories and wishlists
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Book {
    pub id: BookId,
    pub title: String,
    pub author: String,
    pub description: String,
}

/// Book row from database
#[derive(Debug, Clone, FromRow)]
pub struct BookRow {
    pub id: String,
    pub title: String,
    pub author: Option<String>,
    pub description: Option<String>,
}

impl TryFrom<BookRow> for Book {
    type Error = crate::error::AppError;

    fn try_from(row: BookRow) -> AppResult<Self> {
        Ok(Book {
            id: BookId::parse(row.id)?,
            title: row.title,
            author: row.author.unwrap_or_default(),
            description: row.description.unwrap_or_default(),
        })
    }
}
