//! Matching Engine Core
//!
//! Transactional core of the limit-order matching engine: per-asset-pair
//! order books, the time-windowed reference mid price, and the execution
//! contexts through which a request's effects reach shared state.
//!
//! **Key Invariants:**
//! - Price-time priority strictly enforced within each book side
//! - Uncommitted transaction state is invisible to other transactions
//! - A context is applied completely or not at all
//! - Reference mid price is the mean of samples inside the rolling window

pub mod book;
pub mod config;
pub mod interfaces;
pub mod mid_price;
pub mod transaction;

#[cfg(test)]
mod test_support;

pub use book::{AssetOrderBook, OrderBooks};
pub use config::{EngineConfig, MidPriceConfig};
pub use mid_price::{ReferenceMidPriceEngine, TransactionMidPriceStage};
pub use transaction::{ExecutionContext, ExecutionContextFactory, RequestInfo};
