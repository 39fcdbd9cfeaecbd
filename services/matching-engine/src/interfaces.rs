//! External collaborators of the core
//!
//! Persistence backends, deviation policy, wallet ledger and the
//! order-book safety checker live outside this crate; the core only sees
//! these traits and the data shapes handed across them.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use types::errors::{PersistenceError, WalletError};
use types::ids::AssetPairId;
use types::mid_price::MidPrice;
use types::order::{Order, Side};

use crate::mid_price::RefMidPriceDangerousChangeEvent;

/// Persisted mid-price samples, read once at startup
pub trait ReadOnlyMidPriceStore: Send + Sync {
    /// All persisted samples per asset pair, oldest first
    fn load_all(&self) -> Result<HashMap<AssetPairId, Vec<MidPrice>>, PersistenceError>;
}

/// Writes the effects of a committed transaction
pub trait PersistenceManager: Send + Sync {
    fn persist(&self, data: &PersistenceData) -> Result<(), PersistenceError>;
}

/// Per-pair mid-price deviation policy
pub trait DeviationPolicyLookup: Send + Sync {
    /// Configured threshold; `None` means mid prices of the pair are not tracked
    fn mid_price_deviation_threshold(&self, asset_pair_id: &AssetPairId) -> Option<Decimal>;
}

/// Receives reference-price notifications
///
/// Implementations must not block the caller.
pub trait DangerousChangeSink: Send + Sync {
    fn check_order_book(&self, event: RefMidPriceDangerousChangeEvent);
}

/// Transaction-local view over client balances
pub trait WalletOperations: Send {
    /// Independent view layered on this one's uncommitted state
    fn nested(&self) -> Box<dyn WalletOperations>;

    /// Check the staged operations can be applied
    fn validate(&self) -> Result<(), WalletError>;

    /// Make the staged operations visible; called inside the commit step
    fn apply(&mut self);
}

/// Creates a fresh wallet-operations view for a new request
pub trait WalletOperationsFactory: Send + Sync {
    fn create(&self) -> Box<dyn WalletOperations>;
}

/// Orders of one side of a changed book
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderBookPersistenceData {
    pub asset_pair_id: AssetPairId,
    pub side: Side,
    pub orders: Vec<Order>,
}

/// Staged mid prices of a transaction
///
/// `remove_all` means every persisted sample must be deleted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MidPricePersistenceData {
    pub mid_prices: Vec<MidPrice>,
    pub remove_all: bool,
}

impl MidPricePersistenceData {
    pub fn is_empty(&self) -> bool {
        self.mid_prices.is_empty() && !self.remove_all
    }
}

/// Everything a committed transaction hands to persistence
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PersistenceData {
    pub order_books: Vec<OrderBookPersistenceData>,
    pub stop_order_books: Vec<OrderBookPersistenceData>,
    pub mid_prices: MidPricePersistenceData,
}

impl PersistenceData {
    pub fn is_empty(&self) -> bool {
        self.order_books.is_empty() && self.stop_order_books.is_empty() && self.mid_prices.is_empty()
    }
}
