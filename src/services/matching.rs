//! Match finder: bilateral swap discovery

use std::collections::{BTreeMap, BTreeSet};

use tokio_stream::StreamExt;

use super::StoreHandle;
use crate::{
    error::{AppError, AppResult},
    models::{Book, BookId, Match, SwapCandidate, User, UserId},
};

/// Compute the swap between `current` and `other`, if any.
///
/// `give` is `current.inventory ∩ other.wishlist` and `receive` is
/// `current.wishlist ∩ other.inventory`. Both are cut to the length of the
/// shorter one, keeping the lowest book ids.
pub fn match_pair(current: &User, other: &User) -> Option<SwapCandidate> {
    if current.id == other.id {
        return None;
    }

    let give = current.inventory.intersection(&other.wishlist);
    let receive = current.wishlist.intersection(&other.inventory);
    let size = give.clone().count().min(receive.clone().count());
    if size == 0 {
        return None;
    }

    // BTreeSet intersections iterate in ascending order
    Some(SwapCandidate {
        counterparty_id: other.id.clone(),
        give: give.take(size).cloned().collect(),
        receive: receive.take(size).cloned().collect(),
    })
}

#[derive(Clone)]
pub struct MatchingService {
    store: StoreHandle,
}

impl MatchingService {
    pub fn new(store: StoreHandle) -> Self {
        Self { store }
    }

    /// Find every counterparty the user can swap with.
    ///
    /// An empty list means the user exists but nobody matches.
    pub async fn find_matches(&self, user_id: &UserId) -> AppResult<Vec<Match>> {
        let current = self.store.call("get_user", self.store.get_user(user_id)).await?;
        let mut others = self.store.call("list_users", self.store.list_users(user_id)).await?;

        let mut candidates = Vec::new();
        let mut scanned = 0usize;
        while let Some(other) = self.store.deadline("list_users", others.next()).await? {
            scanned += 1;
            if let Some(candidate) = match_pair(&current, &other?) {
                candidates.push(candidate);
            }
        }
        candidates.sort_by(|a, b| a.counterparty_id.cmp(&b.counterparty_id));

        tracing::debug!(
            "User {} matched {} of {} counterparties",
            user_id,
            candidates.len(),
            scanned
        );

        self.resolve(candidates).await
    }

    /// Swap candidate between two given users, without resolving books
    pub async fn candidate_between(&self, user_id: &UserId, counterparty_id: &UserId) -> AppResult<Option<SwapCandidate>> {
        if user_id == counterparty_id {
            return Err(AppError::InvalidInput(
                "A user cannot be their own counterparty".to_string(),
            ));
        }

        let current = self.store.call("get_user", self.store.get_user(user_id)).await?;
        let other = self.store.call("get_user", self.store.get_user(counterparty_id)).await?;
        Ok(match_pair(&current, &other))
    }

    /// Match between the user and one specific counterparty
    pub async fn find_match_with(&self, user_id: &UserId, counterparty_id: &UserId) -> AppResult<Option<Match>> {
        match self.candidate_between(user_id, counterparty_id).await? {
            Some(candidate) => Ok(self.resolve(vec![candidate]).await?.pop()),
            None => Ok(None),
        }
    }

    /// Replace book ids with catalog entries, preserving order
    async fn resolve(&self, candidates: Vec<SwapCandidate>) -> AppResult<Vec<Match>> {
        if candidates.is_empty() {
            return Ok(Vec::new());
        }

        let ids: BTreeSet<BookId> = candidates
            .iter()
            .flat_map(|c| c.give.iter().chain(c.receive.iter()))
            .cloned()
            .collect();
        let books: BTreeMap<BookId, Book> = self
            .store
            .call("get_books_by_ids", self.store.get_books_by_ids(&ids))
            .await?
            .into_iter()
            .map(|book| (book.id.clone(), book))
            .collect();

        let lookup = |ids: &[BookId]| -> AppResult<Vec<Book>> {
            ids.iter()
                .map(|id| books.get(id).cloned().ok_or_else(|| AppError::book_not_found(id)))
                .collect()
        };

        candidates
            .into_iter()
            .map(|c| {
                Ok(Match {
                    give_books: lookup(&c.give)?,
                    receive_books: lookup(&c.receive)?,
                    counterparty_id: c.counterparty_id,
                })
            })
            .collect()
    }
}
