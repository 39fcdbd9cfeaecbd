//! Asset pair metadata

use crate::ids::AssetPairId;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// Tradable asset pair with its price accuracy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetPair {
    pub asset_pair_id: AssetPairId,
    pub base_asset_id: String,
    pub quoting_asset_id: String,
    /// Number of decimal places prices are quoted with
    pub accuracy: u32,
}

impl AssetPair {
    pub fn new(
        asset_pair_id: impl Into<AssetPairId>,
        base_asset_id: impl Into<String>,
        quoting_asset_id: impl Into<String>,
        accuracy: u32,
    ) -> Self {
        Self {
            asset_pair_id: asset_pair_id.into(),
            base_asset_id: base_asset_id.into(),
            quoting_asset_id: quoting_asset_id.into(),
            accuracy,
        }
    }

    /// Round a price up (away from zero) to this pair's accuracy
    pub fn round_up(&self, value: Decimal) -> Decimal {
        value.round_dp_with_strategy(self.accuracy, RoundingStrategy::AwayFromZero)
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn prop_round_up_never_decreases(mantissa in 1i64..1_000_000_000, scale in 0u32..8, accuracy in 0u32..6) {
            let pair = AssetPair::new("BTCUSD", "BTC", "USD", accuracy);
            let value = Decimal::new(mantissa, scale);
            let rounded = pair.round_up(value);

            prop_assert!(rounded >= value);
            prop_assert!(rounded.scale() <= accuracy);
            prop_assert!(rounded - value < Decimal::new(1, accuracy));
        }
    }
}
