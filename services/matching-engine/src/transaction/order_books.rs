//! Copy-on-write view of order books for one transaction
//!
//! The first touch of an asset pair copies its shared book into the
//! transaction. Mutations go to the copy only; on apply, every changed copy
//! replaces the shared book wholesale.

use std::collections::hash_map::Entry;
use std::collections::{BTreeSet, HashMap};
use types::ids::AssetPairId;
use types::order::{Order, Side};

use crate::book::{AssetOrderBook, OrderBooks};
use crate::interfaces::OrderBookPersistenceData;

use super::state::{SharedMatchingState, SharedState};

/// Which shared book map a view is taken from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookKind {
    Limit,
    Stop,
}

impl BookKind {
    fn source(self, state: &SharedMatchingState) -> &OrderBooks {
        match self {
            BookKind::Limit => &state.order_books,
            BookKind::Stop => &state.stop_order_books,
        }
    }
}

#[derive(Clone)]
pub struct CurrentTransactionOrderBooks {
    shared: SharedState,
    kind: BookKind,
    books: HashMap<AssetPairId, AssetOrderBook>,
    changed: BTreeSet<AssetPairId>,
}

impl CurrentTransactionOrderBooks {
    pub fn new(shared: SharedState, kind: BookKind) -> Self {
        Self {
            shared,
            kind,
            books: HashMap::new(),
            changed: BTreeSet::new(),
        }
    }

    pub fn kind(&self) -> BookKind {
        self.kind
    }

    fn copy_on_touch(&mut self, asset_pair_id: &AssetPairId) -> &mut AssetOrderBook {
        match self.books.entry(asset_pair_id.clone()) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => {
                let copy = self.kind.source(&self.shared.read()).copy_of(asset_pair_id);
                entry.insert(copy)
            }
        }
    }

    /// Transaction view of a pair's book
    pub fn order_book(&mut self, asset_pair_id: &AssetPairId) -> &AssetOrderBook {
        self.copy_on_touch(asset_pair_id)
    }

    /// Mutable transaction view; the book will replace the shared one on apply
    pub fn order_book_mut(&mut self, asset_pair_id: &AssetPairId) -> &mut AssetOrderBook {
        self.changed.insert(asset_pair_id.clone());
        self.copy_on_touch(asset_pair_id)
    }

    pub fn add_order(&mut self, order: Order) {
        let asset_pair_id = order.asset_pair_id.clone();
        self.order_book_mut(&asset_pair_id).add_order(order);
    }

    pub fn remove_order(&mut self, order: &Order) -> bool {
        self.order_book_mut(&order.asset_pair_id).remove_order(order)
    }

    /// Independent holder starting from this one's uncommitted books
    pub fn fork(&self) -> Self {
        self.clone()
    }

    pub fn changed_asset_pairs(&self) -> impl Iterator<Item = &AssetPairId> {
        self.changed.iter()
    }

    pub fn has_changes(&self) -> bool {
        !self.changed.is_empty()
    }

    /// Orders of every changed book, per side
    pub fn persistence_data(&self) -> Vec<OrderBookPersistenceData> {
        self.changed
            .iter()
            .filter_map(|asset_pair_id| self.books.get(asset_pair_id))
            .flat_map(|book| {
                [Side::Buy, Side::Sell].map(|side| OrderBookPersistenceData {
                    asset_pair_id: book.asset_pair_id().clone(),
                    side,
                    orders: book.orders(side).iter().map(|order| (**order).clone()).collect(),
                })
            })
            .collect()
    }

    /// Replace the changed books in `target`
    pub fn apply(&self, target: &mut OrderBooks) {
        for asset_pair_id in &self.changed {
            if let Some(book) = self.books.get(asset_pair_id) {
                target.set_order_book(book.clone());
            }
        }
    }
}
