//! Execution context of one inbound request
//!
//! Holds the request identity and private, transaction-local views over
//! every piece of shared mutable state the request may touch. Business logic
//! works on these views only; dropping a context that was never applied
//! leaves shared state untouched.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::Span;
use types::asset_pair::AssetPair;
use types::ids::AssetPairId;
use types::time::{now_millis, TimestampMs};

use crate::interfaces::WalletOperations;
use crate::mid_price::TransactionMidPriceStage;

use super::order_books::CurrentTransactionOrderBooks;

/// Kind of inbound request a context was created for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MessageType {
    LimitOrder,
    MultiLimitOrder,
    LimitOrderCancel,
    MultiLimitOrderCancel,
    LimitOrderMassCancel,
}

impl MessageType {
    /// Mid prices committed by a cancellation may raise a dangerous change
    pub fn is_cancel(&self) -> bool {
        matches!(
            self,
            MessageType::LimitOrderCancel
                | MessageType::MultiLimitOrderCancel
                | MessageType::LimitOrderMassCancel
        )
    }
}

/// Deduplication record of the message being processed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessedMessage {
    pub message_id: String,
    pub timestamp: TimestampMs,
}

/// Identity of a request, shared by a context and its nested contexts
#[derive(Debug, Clone)]
pub struct RequestInfo {
    pub message_id: String,
    pub request_id: String,
    pub message_type: MessageType,
    pub processed_message: Option<ProcessedMessage>,
    pub asset_pairs_by_id: Arc<HashMap<AssetPairId, AssetPair>>,
    /// Effective timestamp of the transaction
    pub date: TimestampMs,
}

impl RequestInfo {
    /// Request stamped with the current time
    pub fn new(
        message_id: impl Into<String>,
        request_id: impl Into<String>,
        message_type: MessageType,
        asset_pairs_by_id: Arc<HashMap<AssetPairId, AssetPair>>,
    ) -> Self {
        Self {
            message_id: message_id.into(),
            request_id: request_id.into(),
            message_type,
            processed_message: None,
            asset_pairs_by_id,
            date: now_millis(),
        }
    }

    pub fn with_date(mut self, date: TimestampMs) -> Self {
        self.date = date;
        self
    }

    pub fn with_processed_message(mut self, processed_message: ProcessedMessage) -> Self {
        self.processed_message = Some(processed_message);
        self
    }
}

pub struct ExecutionContext {
    pub(super) request: RequestInfo,
    pub(super) wallet_operations: Box<dyn WalletOperations>,
    pub(super) order_books: CurrentTransactionOrderBooks,
    pub(super) stop_order_books: CurrentTransactionOrderBooks,
    pub(super) mid_prices: TransactionMidPriceStage,
    pub(super) span: Span,
}

impl ExecutionContext {
    pub fn request(&self) -> &RequestInfo {
        &self.request
    }

    pub fn message_id(&self) -> &str {
        &self.request.message_id
    }

    pub fn date(&self) -> TimestampMs {
        self.request.date
    }

    pub fn asset_pair(&self, asset_pair_id: &AssetPairId) -> Option<&AssetPair> {
        self.request.asset_pairs_by_id.get(asset_pair_id)
    }

    pub fn wallet_operations(&mut self) -> &mut dyn WalletOperations {
        self.wallet_operations.as_mut()
    }

    pub fn order_books(&mut self) -> &mut CurrentTransactionOrderBooks {
        &mut self.order_books
    }

    pub fn stop_order_books(&mut self) -> &mut CurrentTransactionOrderBooks {
        &mut self.stop_order_books
    }

    pub fn mid_prices(&mut self) -> &mut TransactionMidPriceStage {
        &mut self.mid_prices
    }

    /// Tracing span covering work done for this request
    pub fn span(&self) -> &Span {
        &self.span
    }

    /// Reference mid price including this transaction's staged samples
    ///
    /// Zero for asset pairs the request carries no metadata for.
    pub fn reference_mid_price(&self, asset_pair_id: &AssetPairId) -> Decimal {
        match self.asset_pair(asset_pair_id) {
            Some(asset_pair) => self
                .mid_prices
                .provisional_reference_mid_price(asset_pair, self.request.date),
            None => Decimal::ZERO,
        }
    }
}

impl std::fmt::Debug for ExecutionContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExecutionContext")
            .field("request", &self.request)
            .finish_non_exhaustive()
    }
}
