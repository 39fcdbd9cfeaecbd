//! Limit order types

use crate::ids::{AssetPairId, ClientId, OrderId};
use crate::numeric::{Price, Volume};
use crate::time::TimestampMs;
use serde::{Deserialize, Serialize};

/// Order side (buyer or seller)
///
/// Decided once when the order is constructed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Side {
    /// Buy order (bid)
    Buy,
    /// Sell order (ask)
    Sell,
}

impl Side {
    /// Get the opposite side
    pub fn opposite(&self) -> Self {
        match self {
            Side::Buy => Side::Sell,
            Side::Sell => Side::Buy,
        }
    }
}

/// Order status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    /// Accepted and awaiting processing
    Pending,

    /// Resting in the order book
    InOrderBook,

    /// Partially matched, remainder resting
    PartiallyMatched,

    /// Completely matched (terminal)
    Matched,

    /// Canceled by user or system (terminal)
    Cancelled,

    /// Failed validation (terminal)
    Rejected,
}

/// Limit order
///
/// Immutable once placed in a book except for status and remaining volume.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub asset_pair_id: AssetPairId,
    pub client_id: ClientId,
    pub side: Side,
    pub price: Price,
    pub volume: Volume,
    pub remaining_volume: Volume,
    pub status: OrderStatus,
    pub created_at: TimestampMs,
    pub updated_at: TimestampMs,
}

impl Order {
    /// Create a new pending order
    pub fn new(
        asset_pair_id: AssetPairId,
        client_id: ClientId,
        side: Side,
        price: Price,
        volume: Volume,
        timestamp: TimestampMs,
    ) -> Self {
        Self {
            id: OrderId::new(),
            asset_pair_id,
            client_id,
            side,
            price,
            volume,
            remaining_volume: volume,
            status: OrderStatus::Pending,
            created_at: timestamp,
            updated_at: timestamp,
        }
    }
}
