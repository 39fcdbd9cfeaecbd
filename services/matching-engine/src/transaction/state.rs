//! Shared state mutated only by the commit step

use parking_lot::RwLock;
use std::sync::Arc;

use crate::book::OrderBooks;
use crate::mid_price::ReferenceMidPriceEngine;

/// Order books, stop-order books and reference mid prices of the process
///
/// Kept behind a single lock so a commit is one write-critical section:
/// readers see either all of a transaction's effects or none.
#[derive(Debug)]
pub struct SharedMatchingState {
    pub order_books: OrderBooks,
    pub stop_order_books: OrderBooks,
    pub mid_prices: ReferenceMidPriceEngine,
}

/// Reference-counted handle to the shared state
pub type SharedState = Arc<RwLock<SharedMatchingState>>;

impl SharedMatchingState {
    pub fn new(mid_prices: ReferenceMidPriceEngine) -> Self {
        Self {
            order_books: OrderBooks::new(),
            stop_order_books: OrderBooks::new(),
            mid_prices,
        }
    }

    pub fn into_shared(self) -> SharedState {
        Arc::new(RwLock::new(self))
    }
}
