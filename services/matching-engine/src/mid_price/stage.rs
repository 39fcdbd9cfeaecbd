//! Per-transaction staging of mid-price samples
//!
//! Samples recorded while a request is processed stay invisible to other
//! transactions until the execution context is applied, at which point
//! [`TransactionMidPriceStage::commit`] feeds them to the shared engine in
//! arrival order.

use rust_decimal::Decimal;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;
use types::asset_pair::AssetPair;
use types::ids::AssetPairId;
use types::mid_price::MidPrice;
use types::time::TimestampMs;

use crate::interfaces::{DeviationPolicyLookup, MidPricePersistenceData};
use crate::transaction::SharedState;

use super::engine::ReferenceMidPriceEngine;

pub struct TransactionMidPriceStage {
    shared: SharedState,
    deviation_policy: Arc<dyn DeviationPolicyLookup>,
    /// Staged prices per pair, in arrival order
    mid_prices: BTreeMap<AssetPairId, Vec<Decimal>>,
    /// Running sum of `mid_prices` per pair
    sums: BTreeMap<AssetPairId, Decimal>,
    remove_all: bool,
}

impl TransactionMidPriceStage {
    pub fn new(shared: SharedState, deviation_policy: Arc<dyn DeviationPolicyLookup>) -> Self {
        Self {
            shared,
            deviation_policy,
            mid_prices: BTreeMap::new(),
            sums: BTreeMap::new(),
            remove_all: false,
        }
    }

    /// Fresh, empty stage bound to the same engine and policy
    pub fn new_empty(&self) -> Self {
        Self::new(self.shared.clone(), self.deviation_policy.clone())
    }

    fn is_tracked(&self, asset_pair_id: &AssetPairId) -> bool {
        !self.remove_all
            && self
                .deviation_policy
                .mid_price_deviation_threshold(asset_pair_id)
                .is_some()
    }

    /// Stage one sample; dropped when the pair has no deviation threshold
    pub fn add_sample(&mut self, asset_pair_id: &AssetPairId, mid_price: Decimal) {
        self.add_samples(asset_pair_id, std::iter::once(mid_price));
    }

    /// Stage several samples of one pair, keeping their order
    pub fn add_samples(
        &mut self,
        asset_pair_id: &AssetPairId,
        mid_prices: impl IntoIterator<Item = Decimal>,
    ) {
        let mut mid_prices = mid_prices.into_iter().peekable();
        if mid_prices.peek().is_none() || !self.is_tracked(asset_pair_id) {
            return;
        }
        let staged = self.mid_prices.entry(asset_pair_id.clone()).or_default();
        let sum = self.sums.entry(asset_pair_id.clone()).or_default();
        for mid_price in mid_prices {
            staged.push(mid_price);
            *sum += mid_price;
        }
    }

    /// Asset pairs with staged samples
    pub fn staged_asset_pairs(&self) -> impl Iterator<Item = &AssetPairId> {
        self.mid_prices.keys()
    }

    /// Staged samples of a pair, in arrival order
    pub fn staged(&self, asset_pair_id: &AssetPairId) -> &[Decimal] {
        self.mid_prices
            .get(asset_pair_id)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Reference price as it would be with this transaction's samples committed
    pub fn provisional_reference_mid_price(&self, asset_pair: &AssetPair, now: TimestampMs) -> Decimal {
        let staged_sum = self
            .sums
            .get(&asset_pair.asset_pair_id)
            .copied()
            .unwrap_or_default();
        let staged_count = self.staged(&asset_pair.asset_pair_id).len();

        self.shared
            .read()
            .mid_prices
            .provisional_reference_mid_price(asset_pair, now, staged_sum, staged_count)
    }

    /// Discard staged samples; commit will clear the whole engine instead
    pub fn mark_reset_all(&mut self) {
        self.mid_prices.clear();
        self.sums.clear();
        self.remove_all = true;
    }

    pub fn is_reset_all(&self) -> bool {
        self.remove_all
    }

    pub fn is_empty(&self) -> bool {
        self.mid_prices.is_empty() && !self.remove_all
    }

    /// Merge the staged state into `engine`
    pub fn commit(&self, engine: &mut ReferenceMidPriceEngine, now: TimestampMs, cancel: bool) {
        if self.remove_all {
            engine.clear();
            return;
        }
        for (asset_pair_id, mid_prices) in &self.mid_prices {
            debug!(
                asset_pair_id = %asset_pair_id,
                count = mid_prices.len(),
                "Committing staged mid prices"
            );
            for mid_price in mid_prices {
                engine.add_mid_price(asset_pair_id, *mid_price, now, cancel);
            }
        }
    }

    /// Staged samples for persistence
    ///
    /// Each pair's samples get timestamps `as_of`, `as_of + 1`, ... so their
    /// arrival order survives storage.
    pub fn snapshot_for_persistence(&self, as_of: TimestampMs) -> MidPricePersistenceData {
        let mid_prices = self
            .mid_prices
            .iter()
            .flat_map(|(asset_pair_id, prices)| {
                prices.iter().enumerate().map(move |(index, price)| {
                    MidPrice::new(asset_pair_id.clone(), *price, as_of + index as i64)
                })
            })
            .collect();

        MidPricePersistenceData {
            mid_prices,
            remove_all: self.remove_all,
        }
    }
}
