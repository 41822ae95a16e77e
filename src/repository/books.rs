//! Books repository for database operations

use std::collections::BTreeSet;

use sqlx::{Pool, Postgres};

use crate::{
    error::AppResult,
    models::{book::BookRow, Book, BookId},
};

#[derive(Clone)]
pub struct BooksRepository {
    pool: Pool<Postgres>,
}

impl BooksRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get books by a set of IDs
    pub async fn get_by_ids(&self, ids: &BTreeSet<BookId>) -> AppResult<Vec<Book>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<&str> = ids.iter().map(BookId::as_str).collect();
        let rows = sqlx::query_as::<_, BookRow>(
            r#"
            SELECT id, title, author, description
            FROM books
            WHERE id = ANY($1)
            ORDER BY id
            "#,
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Book::try_from).collect()
    }

    /// List the whole catalog
    pub async fn list(&self) -> AppResult<Vec<Book>> {
        let rows = sqlx::query_as::<_, BookRow>(
            "SELECT id, title, author, description FROM books ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Book::try_from).collect()
    }

    /// Case-insensitive substring match on title or author
    pub async fn search(&self, needle: &str) -> AppResult<Vec<Book>> {
        let pattern = format!("%{}%", escape_like(needle));
        let rows = sqlx::query_as::<_, BookRow>(
            r#"
            SELECT id, title, author, description
            FROM books
            WHERE title ILIKE $1 ESCAPE '\' OR author ILIKE $1 ESCAPE '\'
            ORDER BY id
            "#,
        )
        .bind(pattern)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Book::try_from).collect()
    }
}

fn escape_like(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
