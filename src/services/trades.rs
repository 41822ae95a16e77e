//! Trade executor

use std::collections::BTreeSet;

use chrono::Utc;
use uuid::Uuid;

use super::{matching::MatchingService, StoreHandle};
use crate::{
    error::{AppError, AppResult},
    models::{BookId, PartyChanges, TradeMode, TradeReceipt, TransferPlan, User, UserId},
};

#[derive(Clone)]
pub struct TradesService {
    store: StoreHandle,
    matching: MatchingService,
}

impl TradesService {
    pub fn new(store: StoreHandle, matching: MatchingService) -> Self {
        Self { store, matching }
    }

    /// Execute a trade between the user and a counterparty.
    ///
    /// The store applies both sides in one atomic call and the call is never
    /// retried here. Trades where nothing would move are accepted as no-ops.
    pub async fn execute_trade(
        &self,
        user_id: &UserId,
        counterparty_id: &UserId,
        mode: TradeMode,
    ) -> AppResult<TradeReceipt> {
        if user_id == counterparty_id {
            return Err(AppError::InvalidInput(
                "A user cannot trade with themselves".to_string(),
            ));
        }

        let plan = match mode {
            TradeMode::Wishlist => self.wishlist_plan(user_id, counterparty_id).await?,
            TradeMode::Scoped => self.scoped_plan(user_id, counterparty_id).await?,
        };

        let trade_id = Uuid::new_v4();
        if plan.is_noop() {
            tracing::info!(
                "Trade {} ({}) between {} and {} moves no books",
                trade_id,
                mode,
                user_id,
                counterparty_id
            );
        } else {
            self.store
                .call("apply_transfer", self.store.apply_transfer(&plan))
                .await?;
            tracing::info!(
                "Trade {} ({}) executed between {} and {}",
                trade_id,
                mode,
                user_id,
                counterparty_id
            );
        }

        let [mine, theirs] = plan.parties;
        Ok(TradeReceipt {
            trade_id,
            mode,
            user_id: mine.user_id,
            counterparty_id: theirs.user_id,
            received: mine.add_to_inventory.into_iter().collect(),
            given: theirs.add_to_inventory.into_iter().collect(),
            executed_at: Utc::now(),
        })
    }

    /// Each party's whole wishlist lands in the other's inventory. Nothing is removed.
    async fn wishlist_plan(&self, user_id: &UserId, counterparty_id: &UserId) -> AppResult<TransferPlan> {
        let current: User = self.store.call("get_user", self.store.get_user(user_id)).await?;
        let other: User = self
            .store
            .call("get_user", self.store.get_user(counterparty_id))
            .await?;

        let mut mine = PartyChanges::for_user(current.id);
        mine.add_to_inventory = other.wishlist;
        let mut theirs = PartyChanges::for_user(other.id);
        theirs.add_to_inventory = current.wishlist;

        Ok(TransferPlan {
            parties: [mine, theirs],
        })
    }

    /// Only the currently matched books move, and they leave the giver's
    /// inventory and the receiver's wishlist.
    async fn scoped_plan(&self, user_id: &UserId, counterparty_id: &UserId) -> AppResult<TransferPlan> {
        let mut mine = PartyChanges::for_user(user_id.clone());
        let mut theirs = PartyChanges::for_user(counterparty_id.clone());

        if let Some(candidate) = self.matching.candidate_between(user_id, counterparty_id).await? {
            let give: BTreeSet<BookId> = candidate.give.into_iter().collect();
            let receive: BTreeSet<BookId> = candidate.receive.into_iter().collect();

            mine.add_to_inventory = receive.clone();
            mine.remove_from_wishlist = receive.clone();
            mine.remove_from_inventory = give.clone();

            theirs.add_to_inventory = give.clone();
            theirs.remove_from_wishlist = give;
            theirs.remove_from_inventory = receive;
        }

        Ok(TransferPlan {
            parties: [mine, theirs],
        })
    }
}
