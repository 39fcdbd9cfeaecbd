//! Observed mid-price samples

use crate::ids::AssetPairId;
use crate::time::TimestampMs;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One observed midpoint price of an asset pair at a point in time
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MidPrice {
    pub asset_pair_id: AssetPairId,
    pub mid_price: Decimal,
    pub timestamp: TimestampMs,
}

impl MidPrice {
    pub fn new(asset_pair_id: AssetPairId, mid_price: Decimal, timestamp: TimestampMs) -> Self {
        Self {
            asset_pair_id,
            mid_price,
            timestamp,
        }
    }
}
