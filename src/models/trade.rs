//! Match and trade types

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use super::{Book, BookId, UserId};

/// Id-level swap between the requesting user and one counterparty.
///
/// `give` are books the requester owns and the counterparty wants;
/// `receive` are books the counterparty owns and the requester wants.
/// Both are sorted ascending and have the same length.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwapCandidate {
    pub counterparty_id: UserId,
    pub give: Vec<BookId>,
    pub receive: Vec<BookId>,
}

/// Swap candidate with its books resolved from the catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct Match {
    pub counterparty_id: UserId,
    pub give_books: Vec<Book>,
    pub receive_books: Vec<Book>,
}

/// How a trade moves books between the two parties
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum TradeMode {
    /// Each party's entire wishlist is added to the other party's inventory.
    /// Nothing is removed from either side.
    #[default]
    Wishlist,
    /// Only the currently matched books move. Traded books leave the giver's
    /// inventory and the receiver's wishlist.
    Scoped,
}

impl std::fmt::Display for TradeMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TradeMode::Wishlist => f.write_str("wishlist"),
            TradeMode::Scoped => f.write_str("scoped"),
        }
    }
}

/// Changes applied to one user by a transfer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartyChanges {
    pub user_id: UserId,
    pub add_to_inventory: BTreeSet<BookId>,
    pub remove_from_inventory: BTreeSet<BookId>,
    pub remove_from_wishlist: BTreeSet<BookId>,
}

impl PartyChanges {
    pub fn for_user(user_id: UserId) -> Self {
        Self {
            user_id,
            add_to_inventory: BTreeSet::new(),
            remove_from_inventory: BTreeSet::new(),
            remove_from_wishlist: BTreeSet::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.add_to_inventory.is_empty()
            && self.remove_from_inventory.is_empty()
            && self.remove_from_wishlist.is_empty()
    }
}

/// Both sides of a trade, applied by the store as a single atomic unit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferPlan {
    pub parties: [PartyChanges; 2],
}

impl TransferPlan {
    pub fn is_noop(&self) -> bool {
        self.parties.iter().all(PartyChanges::is_empty)
    }

    /// Parties ordered by user id, the order in which stores take locks
    pub fn lock_order(&self) -> [&PartyChanges; 2] {
        let [a, b] = &self.parties;
        if a.user_id <= b.user_id {
            [a, b]
        } else {
            [b, a]
        }
    }
}

/// Execute trade request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct TradeRequest {
    #[validate(length(min = 1, max = 64, message = "Counterparty id must be 1-64 characters"))]
    pub counterparty_id: String,
    #[serde(default)]
    pub mode: TradeMode,
}

/// Outcome of an executed trade. Not persisted.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TradeReceipt {
    pub trade_id: Uuid,
    pub mode: TradeMode,
    pub user_id: UserId,
    pub counterparty_id: UserId,
    /// Books added to the requesting user's inventory
    pub received: Vec<BookId>,
    /// Books added to the counterparty's inventory
    pub given: Vec<BookId>,
    pub executed_at: DateTime<Utc>,
}
