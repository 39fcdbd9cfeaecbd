//! Order book of a single asset pair
//!
//! Holds the ask and bid sides and answers the negative-spread questions
//! asked before matching. Cloning a book is a structural copy: both sides
//! are rebuilt from shared order handles, so a copy can be mutated without
//! affecting the original.

use std::sync::Arc;
use types::ids::{AssetPairId, OrderId};
use types::numeric::{Price, Volume};
use types::order::{Order, Side};

use super::side_book::SideBook;

#[derive(Debug, Clone)]
pub struct AssetOrderBook {
    asset_pair_id: AssetPairId,
    asks: SideBook,
    bids: SideBook,
    /// Insertion counter, final tie-break of the priority order
    next_sequence: u64,
}

impl AssetOrderBook {
    pub fn new(asset_pair_id: AssetPairId) -> Self {
        Self {
            asset_pair_id,
            asks: SideBook::new(Side::Sell),
            bids: SideBook::new(Side::Buy),
            next_sequence: 0,
        }
    }

    pub fn asset_pair_id(&self) -> &AssetPairId {
        &self.asset_pair_id
    }

    /// Insert an order into the side matching its own side
    pub fn add_order(&mut self, order: impl Into<Arc<Order>>) {
        let order = order.into();
        debug_assert_eq!(order.asset_pair_id, self.asset_pair_id);
        let sequence = self.next_sequence;
        self.next_sequence += 1;
        self.side_mut(order.side).insert(order, sequence);
    }

    /// Remove an order by identity
    ///
    /// Returns true if the order was found and removed; absent orders are a no-op
    pub fn remove_order(&mut self, order: &Order) -> bool {
        self.side_mut(order.side).remove(&order.id).is_some()
    }

    pub fn contains(&self, order_id: &OrderId) -> bool {
        self.asks.contains(order_id) || self.bids.contains(order_id)
    }

    /// Lowest ask price, zero if there are no asks
    pub fn ask_price(&self) -> Price {
        self.asks.best_price().unwrap_or(Price::ZERO)
    }

    /// Highest bid price, zero if there are no bids
    pub fn bid_price(&self) -> Price {
        self.bids.best_price().unwrap_or(Price::ZERO)
    }

    /// Would `order` execute against the best opposite price
    pub fn lead_to_negative_spread(&self, order: &Order) -> bool {
        match self.side(order.side.opposite()).best_price() {
            Some(best_price) => crosses(order.side, order.price, best_price),
            None => false,
        }
    }

    /// Would `order` cross a resting order of the same client
    pub fn lead_to_negative_spread_for_client(&self, order: &Order) -> bool {
        self.crosses_order_matching(order, |resting| resting.client_id == order.client_id)
    }

    /// Would `order` cross a resting order of any other client
    pub fn lead_to_negative_spread_by_other_client(&self, order: &Order) -> bool {
        self.crosses_order_matching(order, |resting| resting.client_id != order.client_id)
    }

    /// Walk a copy of the opposite side from the best price outward while
    /// prices still cross, looking for a resting order accepted by `predicate`.
    fn crosses_order_matching(&self, order: &Order, predicate: impl Fn(&Order) -> bool) -> bool {
        let opposite = self.copy_of_side(order.side.opposite());
        for resting in opposite {
            if !crosses(order.side, order.price, resting.price) {
                return false;
            }
            if predicate(&resting) {
                return true;
            }
        }
        false
    }

    /// Independent copy of one side
    pub fn copy_of_side(&self, side: Side) -> SideBook {
        self.side(side).clone()
    }

    /// Fully independent copy of the whole book
    pub fn copy(&self) -> AssetOrderBook {
        self.clone()
    }

    /// Orders of one side in priority order
    pub fn orders(&self, side: Side) -> Vec<Arc<Order>> {
        self.side(side).iter().cloned().collect()
    }

    /// Aggregated top `depth` levels of one side
    pub fn depth(&self, side: Side, depth: usize) -> Vec<(Price, Volume)> {
        self.side(side).depth_snapshot(depth)
    }

    pub fn len(&self) -> usize {
        self.asks.len() + self.bids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.asks.is_empty() && self.bids.is_empty()
    }

    fn side(&self, side: Side) -> &SideBook {
        match side {
            Side::Buy => &self.bids,
            Side::Sell => &self.asks,
        }
    }

    fn side_mut(&mut self, side: Side) -> &mut SideBook {
        match side {
            Side::Buy => &mut self.bids,
            Side::Sell => &mut self.asks,
        }
    }
}

/// Would an incoming order at `price` execute against `resting_price`
fn crosses(incoming_side: Side, price: Price, resting_price: Price) -> bool {
    match incoming_side {
        Side::Buy => price >= resting_price,
        Side::Sell => price <= resting_price,
    }
}
