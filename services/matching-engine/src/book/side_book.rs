//! One side (asks or bids) of an asset pair's order book
//!
//! Orders are held as shared `Arc<Order>` handles in a BTreeMap keyed by
//! [`PriorityKey`], so iteration is always in priority order and cloning the
//! side copies handles rather than orders.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use types::ids::OrderId;
use types::numeric::{Price, Volume};
use types::order::{Order, Side};

use super::priority::PriorityKey;

#[derive(Debug, Clone)]
pub struct SideBook {
    side: Side,
    /// Orders in priority order (best first)
    orders: BTreeMap<PriorityKey, Arc<Order>>,
    /// Reverse index for removal by identity
    keys: HashMap<OrderId, PriorityKey>,
}

impl SideBook {
    /// Create a new empty side
    pub fn new(side: Side) -> Self {
        Self {
            side,
            orders: BTreeMap::new(),
            keys: HashMap::new(),
        }
    }

    pub fn side(&self) -> Side {
        self.side
    }

    /// Insert an order, replacing any earlier entry with the same id
    pub fn insert(&mut self, order: Arc<Order>, sequence: u64) {
        debug_assert_eq!(order.side, self.side);
        self.remove(&order.id);
        let key = PriorityKey::new(self.side, order.price, order.created_at, sequence);
        self.keys.insert(order.id, key);
        self.orders.insert(key, order);
    }

    /// Remove an order by id
    ///
    /// Returns the removed order, or None if it was not on this side
    pub fn remove(&mut self, order_id: &OrderId) -> Option<Arc<Order>> {
        let key = self.keys.remove(order_id)?;
        self.orders.remove(&key)
    }

    pub fn contains(&self, order_id: &OrderId) -> bool {
        self.keys.contains_key(order_id)
    }

    /// Best order (lowest ask or highest bid)
    pub fn best(&self) -> Option<&Arc<Order>> {
        self.orders.values().next()
    }

    /// Best price, if any order rests on this side
    pub fn best_price(&self) -> Option<Price> {
        self.orders.keys().next().map(|key| key.price())
    }

    /// Orders in priority order
    pub fn iter(&self) -> impl Iterator<Item = &Arc<Order>> {
        self.orders.values()
    }

    /// Aggregated volume of the top `depth` price levels
    pub fn depth_snapshot(&self, depth: usize) -> Vec<(Price, Volume)> {
        let mut levels: Vec<(Price, Volume)> = Vec::new();
        for order in self.orders.values() {
            match levels.last_mut() {
                Some((price, volume)) if *price == order.price => {
                    *volume = *volume + order.remaining_volume;
                }
                _ => {
                    if levels.len() == depth {
                        break;
                    }
                    levels.push((order.price, order.remaining_volume));
                }
            }
        }
        levels
    }

    pub fn len(&self) -> usize {
        self.orders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }
}

impl IntoIterator for SideBook {
    type Item = Arc<Order>;
    type IntoIter = std::collections::btree_map::IntoValues<PriorityKey, Arc<Order>>;

    fn into_iter(self) -> Self::IntoIter {
        self.orders.into_values()
    }
}
