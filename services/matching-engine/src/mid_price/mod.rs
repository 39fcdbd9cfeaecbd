//! Reference mid-price tracking
//!
//! The process-wide [`ReferenceMidPriceEngine`], the per-transaction
//! [`TransactionMidPriceStage`] and the notifications they raise.

pub mod engine;
pub mod events;
pub mod stage;

pub use engine::ReferenceMidPriceEngine;
pub use events::{ChannelDangerousChangeSink, RefMidPriceDangerousChangeEvent};
pub use stage::TransactionMidPriceStage;
