//! Reference mid-price notifications
//!
//! Emitted when a pair's reference price first becomes available and when a
//! cancellation moves the mid price down.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};
use tracing::warn;
use types::ids::AssetPairId;

use crate::interfaces::DangerousChangeSink;

/// Order book check request raised by the reference mid-price engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RefMidPriceDangerousChangeEvent {
    pub asset_pair_id: AssetPairId,
    pub ref_mid_price: Decimal,
    /// True when the change was triggered by an order cancellation
    pub cancel: bool,
}

/// Sink forwarding events over an unbounded channel
///
/// Sending never blocks; events sent after the receiver is dropped are
/// logged and discarded.
#[derive(Debug, Clone)]
pub struct ChannelDangerousChangeSink {
    sender: UnboundedSender<RefMidPriceDangerousChangeEvent>,
}

impl ChannelDangerousChangeSink {
    pub fn new() -> (Self, UnboundedReceiver<RefMidPriceDangerousChangeEvent>) {
        let (sender, receiver) = unbounded_channel();
        (Self { sender }, receiver)
    }
}

impl DangerousChangeSink for ChannelDangerousChangeSink {
    fn check_order_book(&self, event: RefMidPriceDangerousChangeEvent) {
        if let Err(err) = self.sender.send(event) {
            warn!(
                asset_pair_id = %err.0.asset_pair_id,
                "Order book checker is gone, dropping mid price event"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event() -> RefMidPriceDangerousChangeEvent {
        RefMidPriceDangerousChangeEvent {
            asset_pair_id: AssetPairId::new("BTCUSD"),
            ref_mid_price: Decimal::from(100),
            cancel: true,
        }
    }

    #[test]
    fn test_channel_sink_forwards_events() {
        let (sink, mut receiver) = ChannelDangerousChangeSink::new();
        sink.check_order_book(event());

        assert_eq!(receiver.try_recv().unwrap(), event());
    }

    #[test]
    fn test_channel_sink_survives_closed_receiver() {
        let (sink, receiver) = ChannelDangerousChangeSink::new();
        drop(receiver);
        sink.check_order_book(event());
    }

    #[test]
    fn test_event_serialization() {
        let json = serde_json::to_string(&event()).unwrap();
        let deserialized: RefMidPriceDangerousChangeEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(deserialized, event());
    }
}
