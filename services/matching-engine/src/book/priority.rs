//! Price-time priority key
//!
//! Orders on one side of a book are kept in a strict total order:
//! best price first (lowest ask, highest bid), then earliest creation time,
//! then insertion sequence so identical price and timestamp still order
//! deterministically.

use std::cmp::Ordering;
use types::numeric::Price;
use types::order::Side;
use types::time::TimestampMs;

/// Position of an order within one side of a book
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PriorityKey {
    side: Side,
    price: Price,
    created_at: TimestampMs,
    sequence: u64,
}

impl PriorityKey {
    pub fn new(side: Side, price: Price, created_at: TimestampMs, sequence: u64) -> Self {
        Self {
            side,
            price,
            created_at,
            sequence,
        }
    }

    pub fn price(&self) -> Price {
        self.price
    }

    pub fn sequence(&self) -> u64 {
        self.sequence
    }
}

impl Ord for PriorityKey {
    fn cmp(&self, other: &Self) -> Ordering {
        // Keys from different sides never share a map.
        debug_assert_eq!(self.side, other.side);
        let by_price = match self.side {
            Side::Sell => self.price.cmp(&other.price),
            Side::Buy => other.price.cmp(&self.price),
        };
        by_price
            .then_with(|| self.created_at.cmp(&other.created_at))
            .then_with(|| self.sequence.cmp(&other.sequence))
    }
}

impl PartialOrd for PriorityKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
