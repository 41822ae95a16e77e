//! Catalog store: the persistence boundary for books and users

pub mod books;
pub mod memory;
pub mod users;

use std::collections::BTreeSet;
use std::pin::Pin;

use async_trait::async_trait;
use sqlx::{Pool, Postgres};
use tokio_stream::Stream;

use crate::{
    error::{AppError, AppResult, Resource},
    models::{Book, BookId, TransferPlan, User, UserId},
};

pub use memory::{MemoryCatalogStore, Seed};

/// Lazy, finite sequence of users. Each call to `list_users` starts a fresh one.
pub type UserStream = Pin<Box<dyn Stream<Item = AppResult<User>> + Send + 'static>>;

/// Read/write operations the matching engine needs from persistence.
///
/// Implementations must give `apply_transfer` all-or-nothing semantics and
/// serialize concurrent transfers touching the same user.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// Check the store is reachable
    async fn ping(&self) -> AppResult<()>;

    /// Get user by ID
    async fn get_user(&self, id: &UserId) -> AppResult<User>;

    /// Stream every user except `exclude`, ordered by id
    async fn list_users(&self, exclude: &UserId) -> AppResult<UserStream>;

    /// Get the books whose ids are in `ids`, ordered by id. Unknown ids are skipped.
    async fn get_books_by_ids(&self, ids: &BTreeSet<BookId>) -> AppResult<Vec<Book>>;

    /// All books ordered by id
    async fn list_books(&self) -> AppResult<Vec<Book>>;

    /// Books whose title or author contains `needle`, case-insensitively
    async fn search_books(&self, needle: &str) -> AppResult<Vec<Book>>;

    /// Union `book_ids` into the user's inventory
    async fn append_to_inventory(&self, user_id: &UserId, book_ids: &BTreeSet<BookId>) -> AppResult<()>;

    async fn add_to_wishlist(&self, user_id: &UserId, book_id: &BookId) -> AppResult<()>;

    async fn remove_from_wishlist(&self, user_id: &UserId, book_id: &BookId) -> AppResult<()>;

    /// Apply both sides of a trade atomically.
    ///
    /// Fails with `Conflict` and writes nothing when a party no longer owns
    /// a book listed in its `remove_from_inventory`.
    async fn apply_transfer(&self, plan: &TransferPlan) -> AppResult<()>;
}

/// PostgreSQL catalog store
#[derive(Clone)]
pub struct Repository {
    pub pool: Pool<Postgres>,
    pub books: books::BooksRepository,
    pub users: users::UsersRepository,
}

impl Repository {
    /// Create a new repository with the given database pool
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self {
            books: books::BooksRepository::new(pool.clone()),
            users: users::UsersRepository::new(pool.clone()),
            pool,
        }
    }
}

#[async_trait]
impl CatalogStore for Repository {
    async fn ping(&self) -> AppResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn get_user(&self, id: &UserId) -> AppResult<User> {
        self.users.get_by_id(id).await
    }

    async fn list_users(&self, exclude: &UserId) -> AppResult<UserStream> {
        Ok(self.users.stream_except(exclude))
    }

    async fn get_books_by_ids(&self, ids: &BTreeSet<BookId>) -> AppResult<Vec<Book>> {
        self.books.get_by_ids(ids).await
    }

    async fn list_books(&self) -> AppResult<Vec<Book>> {
        self.books.list().await
    }

    async fn search_books(&self, needle: &str) -> AppResult<Vec<Book>> {
        self.books.search(needle).await
    }

    async fn append_to_inventory(&self, user_id: &UserId, book_ids: &BTreeSet<BookId>) -> AppResult<()> {
        self.users.append_to_inventory(user_id, book_ids).await
    }

    async fn add_to_wishlist(&self, user_id: &UserId, book_id: &BookId) -> AppResult<()> {
        self.users.add_to_wishlist(user_id, book_id).await
    }

    async fn remove_from_wishlist(&self, user_id: &UserId, book_id: &BookId) -> AppResult<()> {
        self.users.remove_from_wishlist(user_id, book_id).await
    }

    async fn apply_transfer(&self, plan: &TransferPlan) -> AppResult<()> {
        self.users.apply_transfer(plan).await
    }
}

/// Turn a foreign key violation on a book reference into `NotFound`
pub(crate) fn map_book_reference(e: sqlx::Error) -> AppError {
    let is_fk_violation = e
        .as_database_error()
        .and_then(|db| db.code())
        .map(|code| code == "23503")
        .unwrap_or(false);

    if is_fk_violation {
        AppError::NotFound {
            resource: Resource::Book,
            message: "Book referenced by the request not found".to_string(),
        }
    } else {
        AppError::Database(e)
    }
}
