//! Transactional layer
//!
//! An [`ExecutionContext`] gives one request private views over the shared
//! order books and reference mid prices; [`ExecutionContextFactory::apply`]
//! commits them atomically.

pub mod context;
pub mod factory;
pub mod order_books;
pub mod state;

pub use context::{ExecutionContext, MessageType, ProcessedMessage, RequestInfo};
pub use factory::{ExecutionContextBuilder, ExecutionContextFactory};
pub use order_books::{BookKind, CurrentTransactionOrderBooks};
pub use state::{SharedMatchingState, SharedState};
