//! In-memory catalog store for development and tests

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::sync::RwLock;

use super::{CatalogStore, UserStream};
use crate::{
    error::{AppError, AppResult},
    models::{Book, BookId, PartyChanges, TransferPlan, User, UserId},
};

/// Initial catalog contents, as loaded from a JSON seed file
#[derive(Debug, Default, Deserialize)]
pub struct Seed {
    #[serde(default)]
    pub books: Vec<Book>,
    #[serde(default)]
    pub users: Vec<User>,
}

#[derive(Debug, Default)]
struct State {
    books: BTreeMap<BookId, Book>,
    users: BTreeMap<UserId, User>,
}

impl State {
    fn user(&self, id: &UserId) -> AppResult<&User> {
        self.users.get(id).ok_or_else(|| AppError::user_not_found(id))
    }

    fn user_mut(&mut self, id: &UserId) -> AppResult<&mut User> {
        self.users.get_mut(id).ok_or_else(|| AppError::user_not_found(id))
    }

    fn check_books<'a>(&self, ids: impl IntoIterator<Item = &'a BookId>) -> AppResult<()> {
        match ids.into_iter().find(|id| !self.books.contains_key(*id)) {
            Some(missing) => Err(AppError::book_not_found(missing)),
            None => Ok(()),
        }
    }
}

/// Catalog store kept behind a single lock.
///
/// Writers hold the lock for the whole operation, which makes every transfer
/// atomic and serializes trades on overlapping users.
#[derive(Clone, Default)]
pub struct MemoryCatalogStore {
    state: Arc<RwLock<State>>,
}

impl MemoryCatalogStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from seed data, rejecting dangling book references
    pub fn from_seed(seed: Seed) -> AppResult<Self> {
        let mut state = State::default();
        for book in seed.books {
            state.books.insert(book.id.clone(), book);
        }
        for user in seed.users {
            state.check_books(user.inventory.iter().chain(user.wishlist.iter()))?;
            if state.users.insert(user.id.clone(), user).is_some() {
                return Err(AppError::InvalidInput("Duplicate user id in seed".to_string()));
            }
        }

        tracing::info!(
            "Memory catalog seeded with {} books and {} users",
            state.books.len(),
            state.users.len()
        );

        Ok(Self {
            state: Arc::new(RwLock::new(state)),
        })
    }

    /// Load a JSON seed file
    pub fn from_seed_file(path: impl AsRef<Path>) -> AppResult<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            AppError::Internal(format!("Failed to read seed file {}: {}", path.display(), e))
        })?;
        let seed: Seed = serde_json::from_str(&raw)
            .map_err(|e| AppError::InvalidInput(format!("Invalid seed file {}: {}", path.display(), e)))?;
        Self::from_seed(seed)
    }
}

fn apply_party(user: &mut User, party: &PartyChanges) {
    for id in &party.remove_from_inventory {
        user.inventory.remove(id);
    }
    for id in &party.remove_from_wishlist {
        user.wishlist.remove(id);
    }
    user.inventory.extend(party.add_to_inventory.iter().cloned());
}

#[async_trait]
impl CatalogStore for MemoryCatalogStore {
    async fn ping(&self) -> AppResult<()> {
        Ok(())
    }

    async fn get_user(&self, id: &UserId) -> AppResult<User> {
        let state = self.state.read().await;
        state.user(id).cloned()
    }

    async fn list_users(&self, exclude: &UserId) -> AppResult<UserStream> {
        let state = self.state.read().await;
        let users: Vec<AppResult<User>> = state
            .users
            .values()
            .filter(|user| &user.id != exclude)
            .cloned()
            .map(Ok)
            .collect();
        let stream: UserStream = Box::pin(tokio_stream::iter(users));
        Ok(stream)
    }

    async fn get_books_by_ids(&self, ids: &BTreeSet<BookId>) -> AppResult<Vec<Book>> {
        let state = self.state.read().await;
        Ok(ids.iter().filter_map(|id| state.books.get(id)).cloned().collect())
    }

    async fn list_books(&self) -> AppResult<Vec<Book>> {
        let state = self.state.read().await;
        Ok(state.books.values().cloned().collect())
    }

    async fn search_books(&self, needle: &str) -> AppResult<Vec<Book>> {
        let needle = needle.to_lowercase();
        let state = self.state.read().await;
        Ok(state
            .books
            .values()
            .filter(|book| {
                book.title.to_lowercase().contains(&needle)
                    || book.author.to_lowercase().contains(&needle)
            })
            .cloned()
            .collect())
    }

    async fn append_to_inventory(&self, user_id: &UserId, book_ids: &BTreeSet<BookId>) -> AppResult<()> {
        let mut state = self.state.write().await;
        state.user(user_id)?;
        state.check_books(book_ids)?;
        state.user_mut(user_id)?.inventory.extend(book_ids.iter().cloned());
        Ok(())
    }

    async fn add_to_wishlist(&self, user_id: &UserId, book_id: &BookId) -> AppResult<()> {
        let mut state = self.state.write().await;
        state.user(user_id)?;
        state.check_books([book_id])?;
        state.user_mut(user_id)?.wishlist.insert(book_id.clone());
        Ok(())
    }

    async fn remove_from_wishlist(&self, user_id: &UserId, book_id: &BookId) -> AppResult<()> {
        let mut state = self.state.write().await;
        state.user_mut(user_id)?.wishlist.remove(book_id);
        Ok(())
    }

    async fn apply_transfer(&self, plan: &TransferPlan) -> AppResult<()> {
        let mut state = self.state.write().await;

        // Validate everything before the first write
        for party in &plan.parties {
            let user = state.user(&party.user_id)?;
            if !party.remove_from_inventory.is_subset(&user.inventory) {
                return Err(AppError::inventory_conflict(&party.user_id));
            }
            state.check_books(&party.add_to_inventory)?;
        }

        for party in &plan.parties {
            apply_party(state.user_mut(&party.user_id)?, party);
        }
        Ok(())
    }
}
