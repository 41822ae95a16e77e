//! Catalog service: books, profiles and wishlists

use std::collections::BTreeSet;

use super::StoreHandle;
use crate::{
    error::{AppError, AppResult},
    models::{Book, BookId, UserId, UserProfile},
};

/// Longest accepted search string
const MAX_QUERY_LEN: usize = 200;

#[derive(Clone)]
pub struct CatalogService {
    store: StoreHandle,
}

impl CatalogService {
    pub fn new(store: StoreHandle) -> Self {
        Self { store }
    }

    /// Whole catalog ordered by id
    pub async fn list_books(&self) -> AppResult<Vec<Book>> {
        self.store.call("list_books", self.store.list_books()).await
    }

    /// Substring search on title and author
    pub async fn search_books(&self, query: &str) -> AppResult<Vec<Book>> {
        let query = query.trim();
        if query.is_empty() {
            return Err(AppError::InvalidInput("Search query must not be empty".to_string()));
        }
        if query.chars().count() > MAX_QUERY_LEN {
            return Err(AppError::InvalidInput(format!(
                "Search query must be at most {} characters",
                MAX_QUERY_LEN
            )));
        }

        self.store.call("search_books", self.store.search_books(query)).await
    }

    /// Get book by ID
    pub async fn get_book(&self, id: &BookId) -> AppResult<Book> {
        let ids: BTreeSet<BookId> = [id.clone()].into_iter().collect();
        self.store
            .call("get_books_by_ids", self.store.get_books_by_ids(&ids))
            .await?
            .pop()
            .ok_or_else(|| AppError::book_not_found(id))
    }

    /// User with inventory and wishlist resolved to books
    pub async fn user_profile(&self, user_id: &UserId) -> AppResult<UserProfile> {
        let user = self.store.call("get_user", self.store.get_user(user_id)).await?;
        let inventory = self
            .store
            .call("get_books_by_ids", self.store.get_books_by_ids(&user.inventory))
            .await?;
        let wishlist = self
            .store
            .call("get_books_by_ids", self.store.get_books_by_ids(&user.wishlist))
            .await?;

        Ok(UserProfile {
            id: user.id,
            name: user.name,
            email: user.email,
            inventory,
            wishlist,
        })
    }

    pub async fn add_to_wishlist(&self, user_id: &UserId, book_id: &BookId) -> AppResult<()> {
        self.store
            .call("add_to_wishlist", self.store.add_to_wishlist(user_id, book_id))
            .await?;
        tracing::debug!("Book {} added to wishlist of {}", book_id, user_id);
        Ok(())
    }

    /// Removing a book that is not wished for is a no-op
    pub async fn remove_from_wishlist(&self, user_id: &UserId, book_id: &BookId) -> AppResult<()> {
        self.store
            .call("remove_from_wishlist", self.store.remove_from_wishlist(user_id, book_id))
            .await?;
        tracing::debug!("Book {} removed from wishlist of {}", book_id, user_id);
        Ok(())
    }
}
