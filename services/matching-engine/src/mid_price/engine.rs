//! Reference mid-price engine
//!
//! Keeps, per asset pair, the mid-price samples observed within a sliding
//! retention window and their running mean (the reference mid price).
//!
//! The mean is maintained incrementally: adding a sample re-weights the
//! current mean by one more observation, evicting samples removes their
//! contribution analytically. Each incremental step bumps a counter shared
//! by all pairs; once it reaches `max_recalculation_count` the next step
//! resums the live samples instead, bounding the accumulated division error.
//!
//! A pair is "ready" once a full window has elapsed since its first sample.
//! Until then its reference price reads as zero. Readiness is never lost
//! except through [`ReferenceMidPriceEngine::clear`].

use rust_decimal::{Decimal, RoundingStrategy};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};
use types::asset_pair::AssetPair;
use types::errors::PersistenceError;
use types::ids::AssetPairId;
use types::mid_price::MidPrice;
use types::time::TimestampMs;

use crate::config::MidPriceConfig;
use crate::interfaces::{DangerousChangeSink, ReadOnlyMidPriceStore};

use super::events::RefMidPriceDangerousChangeEvent;

/// Extra decimal places kept when the running reference is rounded before
/// the final round-up, absorbing the residue of incremental division
const GUARD_DIGITS: u32 = 8;

/// Live samples and running reference of one asset pair
#[derive(Debug, Default)]
struct PairState {
    /// (timestamp, mid price), oldest first
    samples: VecDeque<(TimestampMs, Decimal)>,
    reference: Decimal,
    /// Last non-zero reference before the most recent update
    previous_reference: Decimal,
    first_sample_at: Option<TimestampMs>,
    /// Set by the first read that finds the pair ready; that read notifies
    /// the checker. Atomic so shared-lock reads can set it.
    ready: AtomicBool,
}

impl PairState {
    fn set_reference(&mut self, value: Decimal) {
        if !self.reference.is_zero() {
            self.previous_reference = self.reference;
        }
        self.reference = value;
    }

    fn is_ready_at(&self, now: TimestampMs, period: i64) -> bool {
        self.ready.load(Ordering::Relaxed)
            || self
                .first_sample_at
                .map_or(false, |first| now >= first.saturating_add(period))
    }

    fn last_sample_price(&self) -> Option<Decimal> {
        self.samples.back().map(|(_, price)| *price)
    }

    /// Recompute the reference from all live samples and reset the counter
    fn full_recalculation(&mut self, counter: &mut usize) {
        *counter = 0;
        if self.samples.is_empty() {
            return;
        }
        let sum: Decimal = self.samples.iter().map(|(_, price)| *price).sum();
        let count = Decimal::from(self.samples.len());
        self.set_reference(sum / count);
    }

    fn evict_older_than(&mut self, cutoff: TimestampMs, counter: &mut usize, max: usize) {
        let initial_count = self.samples.len();
        let mut removed_sum = Decimal::ZERO;
        while let Some(&(timestamp, price)) = self.samples.front() {
            if timestamp >= cutoff {
                break;
            }
            removed_sum += price;
            self.samples.pop_front();
        }

        let remaining_count = self.samples.len();
        if remaining_count == 0 {
            self.set_reference(Decimal::ZERO);
            return;
        }
        if remaining_count == initial_count || self.reference.is_zero() {
            return;
        }
        if *counter >= max {
            self.full_recalculation(counter);
            return;
        }

        let initial = Decimal::from(initial_count);
        let without_removed = self.reference - removed_sum / initial;
        let remaining_share = Decimal::from(remaining_count) / initial;
        self.set_reference(without_removed / remaining_share);
        *counter += 1;
    }

    fn push(&mut self, timestamp: TimestampMs, price: Decimal, counter: &mut usize, max: usize) {
        self.samples.push_back((timestamp, price));

        if *counter >= max {
            self.full_recalculation(counter);
            return;
        }

        let previous_count = self.samples.len() - 1;
        let result = if self.reference.is_zero() || previous_count == 0 {
            price
        } else {
            let k = Decimal::from(previous_count);
            let with_new_sample = self.reference + price / k;
            let new_share = Decimal::from(previous_count + 1) / k;
            with_new_sample / new_share
        };
        self.set_reference(result);
        *counter += 1;
    }

    /// Sum and count of samples that would survive eviction at `cutoff`
    fn live_totals(&self, cutoff: TimestampMs) -> (Decimal, usize) {
        let (stale_sum, stale_count) = self
            .samples
            .iter()
            .take_while(|(timestamp, _)| *timestamp < cutoff)
            .fold((Decimal::ZERO, 0usize), |(sum, count), (_, price)| (sum + *price, count + 1));
        let live_count = self.samples.len() - stale_count;
        if live_count == 0 {
            return (Decimal::ZERO, 0);
        }
        let total = self.reference * Decimal::from(self.samples.len());
        (total - stale_sum, live_count)
    }
}

/// Process-wide reference mid-price state
pub struct ReferenceMidPriceEngine {
    config: MidPriceConfig,
    checker: Arc<dyn DangerousChangeSink>,
    pairs: HashMap<AssetPairId, PairState>,
    /// Incremental updates since the last full recomputation, across all pairs
    recalculation_count: usize,
}

impl ReferenceMidPriceEngine {
    /// Create an empty engine
    pub fn new(config: MidPriceConfig, checker: Arc<dyn DangerousChangeSink>) -> Self {
        Self {
            config,
            checker,
            pairs: HashMap::new(),
            recalculation_count: 0,
        }
    }

    /// Create an engine seeded from persisted samples
    ///
    /// Each pair's first-sample timestamp is its oldest persisted sample and
    /// its reference price is computed by one full recomputation.
    pub fn load(
        config: MidPriceConfig,
        store: &dyn ReadOnlyMidPriceStore,
        checker: Arc<dyn DangerousChangeSink>,
    ) -> Result<Self, PersistenceError> {
        let mut engine = Self::new(config, checker);
        let persisted = store.load_all()?;

        let mut sample_count = 0;
        for (asset_pair_id, mid_prices) in persisted {
            if mid_prices.is_empty() {
                continue;
            }
            sample_count += mid_prices.len();
            let mut state = PairState {
                first_sample_at: mid_prices.first().map(|m| m.timestamp),
                samples: mid_prices.iter().map(|m| (m.timestamp, m.mid_price)).collect(),
                ..PairState::default()
            };
            state.full_recalculation(&mut engine.recalculation_count);
            engine.pairs.insert(asset_pair_id, state);
        }

        info!(
            asset_pairs = engine.pairs.len(),
            samples = sample_count,
            "Reference mid prices loaded"
        );
        Ok(engine)
    }

    pub fn config(&self) -> &MidPriceConfig {
        &self.config
    }

    fn period(&self) -> i64 {
        self.config.reference_mid_price_period_ms
    }

    fn lower_time_bound(&self, now: TimestampMs) -> TimestampMs {
        now.saturating_sub(self.period())
    }

    /// Reference mid price of `asset_pair` at `now`, rounded up to its accuracy
    ///
    /// Zero until the pair is ready. Falls back to the previous reference
    /// when every live sample has aged out. The first read after the pair
    /// becomes ready notifies the order book checker.
    pub fn reference_mid_price(&mut self, asset_pair: &AssetPair, now: TimestampMs) -> Decimal {
        let period = self.period();
        let cutoff = self.lower_time_bound(now);
        let max = self.config.max_recalculation_count;

        let Some(state) = self.pairs.get_mut(&asset_pair.asset_pair_id) else {
            return Decimal::ZERO;
        };
        if !state.is_ready_at(now, period) {
            return Decimal::ZERO;
        }
        let first_time_ready = !state.ready.swap(true, Ordering::Relaxed);

        state.evict_older_than(cutoff, &mut self.recalculation_count, max);

        let result = if !state.reference.is_zero() {
            state.reference
        } else {
            state.previous_reference
        };
        let scaled = scale_reference(asset_pair, result);

        if first_time_ready {
            self.notify_ready(asset_pair, scaled);
        }

        scaled
    }

    fn notify_ready(&self, asset_pair: &AssetPair, ref_mid_price: Decimal) {
        info!(
            asset_pair_id = %asset_pair.asset_pair_id,
            ref_mid_price = %ref_mid_price,
            "Reference mid price is ready"
        );
        self.checker.check_order_book(RefMidPriceDangerousChangeEvent {
            asset_pair_id: asset_pair.asset_pair_id.clone(),
            ref_mid_price,
            cancel: false,
        });
    }

    /// Record a new mid-price sample of `asset_pair_id` observed at `now`
    ///
    /// A sample below the last live sample raised by a cancellation is a
    /// dangerous change: the checker receives the updated reference price.
    pub fn add_mid_price(
        &mut self,
        asset_pair_id: &AssetPairId,
        mid_price: Decimal,
        now: TimestampMs,
        cancel: bool,
    ) {
        let cutoff = self.lower_time_bound(now);
        let max = self.config.max_recalculation_count;

        let state = self.pairs.entry(asset_pair_id.clone()).or_default();
        state.first_sample_at.get_or_insert(now);
        state.evict_older_than(cutoff, &mut self.recalculation_count, max);

        let dangerous = cancel && state.last_sample_price().map_or(false, |last| last > mid_price);

        state.push(now, mid_price, &mut self.recalculation_count, max);

        if dangerous {
            warn!(
                asset_pair_id = %asset_pair_id,
                mid_price = %mid_price,
                ref_mid_price = %state.reference,
                "Dangerous mid price change on cancel"
            );
            self.checker.check_order_book(RefMidPriceDangerousChangeEvent {
                asset_pair_id: asset_pair_id.clone(),
                ref_mid_price: state.reference,
                cancel,
            });
        }
        if self.recalculation_count == 0 {
            debug!(asset_pair_id = %asset_pair_id, "Reference mid price fully recalculated");
        }
    }

    /// Whether `mid_price` is below the last live sample of the pair
    pub fn is_mid_price_change_dangerous(&self, asset_pair_id: &AssetPairId, mid_price: Decimal) -> bool {
        self.pairs
            .get(asset_pair_id)
            .and_then(PairState::last_sample_price)
            .map_or(false, |last| last > mid_price)
    }

    /// Reference price blending committed samples with uncommitted ones
    ///
    /// Does not touch samples or references: stale samples are excluded from
    /// the committed totals instead of being evicted. Zero until the pair is
    /// ready; the first read that finds it ready notifies the checker.
    pub fn provisional_reference_mid_price(
        &self,
        asset_pair: &AssetPair,
        now: TimestampMs,
        staged_sum: Decimal,
        staged_count: usize,
    ) -> Decimal {
        let Some(state) = self.pairs.get(&asset_pair.asset_pair_id) else {
            return Decimal::ZERO;
        };
        if !state.is_ready_at(now, self.period()) {
            return Decimal::ZERO;
        }

        let (committed_sum, committed_count) = state.live_totals(self.lower_time_bound(now));
        let total_count = committed_count + staged_count;
        let blended = if total_count == 0 {
            Decimal::ZERO
        } else {
            (committed_sum + staged_sum) / Decimal::from(total_count)
        };

        let result = if !blended.is_zero() {
            blended
        } else if !state.reference.is_zero() {
            state.reference
        } else {
            state.previous_reference
        };
        let scaled = scale_reference(asset_pair, result);

        if !state.ready.swap(true, Ordering::Relaxed) {
            self.notify_ready(asset_pair, scaled);
        }

        scaled
    }

    /// Drop all samples, references, readiness and the recalculation counter
    pub fn clear(&mut self) {
        info!(asset_pairs = self.pairs.len(), "Reference mid prices cleared");
        self.pairs.clear();
        self.recalculation_count = 0;
    }

    pub fn recalculation_count(&self) -> usize {
        self.recalculation_count
    }

    /// Number of live samples currently held for the pair
    pub fn sample_count(&self, asset_pair_id: &AssetPairId) -> usize {
        self.pairs.get(asset_pair_id).map_or(0, |state| state.samples.len())
    }

    /// Unrounded running reference price of the pair
    pub fn raw_reference(&self, asset_pair_id: &AssetPairId) -> Decimal {
        self.pairs.get(asset_pair_id).map_or(Decimal::ZERO, |state| state.reference)
    }

    /// Live samples of the pair, oldest first
    pub fn mid_prices(&self, asset_pair_id: &AssetPairId) -> Vec<MidPrice> {
        self.pairs
            .get(asset_pair_id)
            .map(|state| {
                state
                    .samples
                    .iter()
                    .map(|(timestamp, price)| MidPrice::new(asset_pair_id.clone(), *price, *timestamp))
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// Round a running reference up to the pair's accuracy, ignoring residue
/// below `accuracy + GUARD_DIGITS` places
fn scale_reference(asset_pair: &AssetPair, value: Decimal) -> Decimal {
    let guarded = value.round_dp_with_strategy(
        asset_pair.accuracy + GUARD_DIGITS,
        RoundingStrategy::MidpointNearestEven,
    );
    asset_pair.round_up(guarded)
}

impl std::fmt::Debug for ReferenceMidPriceEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReferenceMidPriceEngine")
            .field("config", &self.config)
            .field("asset_pairs", &self.pairs.len())
            .field("recalculation_count", &self.recalculation_count)
            .finish()
    }
}
