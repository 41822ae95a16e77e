//! Data models for Bookswap

pub mod book;
pub mod ids;
pub mod trade;
pub mod user;

// Re-export commonly used types
pub use book::Book;
pub use ids::{BookId, UserId};
pub use trade::{Match, PartyChanges, SwapCandidate, TradeMode, TradeReceipt, TradeRequest, TransferPlan};
pub use user::{AddWishlistEntry, User, UserProfile};
