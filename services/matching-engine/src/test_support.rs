//! In-memory collaborators shared by unit tests

use parking_lot::Mutex;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Arc;
use types::errors::{PersistenceError, WalletError};
use types::ids::AssetPairId;
use types::mid_price::MidPrice;

use crate::interfaces::{
    DangerousChangeSink, DeviationPolicyLookup, PersistenceData, PersistenceManager,
    ReadOnlyMidPriceStore, WalletOperations, WalletOperationsFactory,
};
use crate::mid_price::RefMidPriceDangerousChangeEvent;

#[derive(Default)]
pub struct RecordingSink {
    pub events: Mutex<Vec<RefMidPriceDangerousChangeEvent>>,
}

impl RecordingSink {
    pub fn events(&self) -> Vec<RefMidPriceDangerousChangeEvent> {
        self.events.lock().clone()
    }
}

impl DangerousChangeSink for RecordingSink {
    fn check_order_book(&self, event: RefMidPriceDangerousChangeEvent) {
        self.events.lock().push(event);
    }
}

pub struct FixedDeviationPolicy(pub HashMap<AssetPairId, Decimal>);

impl FixedDeviationPolicy {
    pub fn tracking(pairs: &[&str]) -> Self {
        Self(
            pairs
                .iter()
                .map(|pair| (AssetPairId::new(*pair), Decimal::new(5, 2)))
                .collect(),
        )
    }
}

impl DeviationPolicyLookup for FixedDeviationPolicy {
    fn mid_price_deviation_threshold(&self, asset_pair_id: &AssetPairId) -> Option<Decimal> {
        self.0.get(asset_pair_id).copied()
    }
}

#[derive(Default)]
pub struct InMemoryStore(pub HashMap<AssetPairId, Vec<MidPrice>>);

impl ReadOnlyMidPriceStore for InMemoryStore {
    fn load_all(&self) -> Result<HashMap<AssetPairId, Vec<MidPrice>>, PersistenceError> {
        Ok(self.0.clone())
    }
}

#[derive(Default)]
pub struct RecordingPersistence {
    pub persisted: Mutex<Vec<PersistenceData>>,
    pub fail: Mutex<bool>,
}

impl PersistenceManager for RecordingPersistence {
    fn persist(&self, data: &PersistenceData) -> Result<(), PersistenceError> {
        if *self.fail.lock() {
            return Err(PersistenceError::Write {
                what: "transaction".to_string(),
                reason: "backend unavailable".to_string(),
            });
        }
        self.persisted.lock().push(data.clone());
        Ok(())
    }
}

/// Wallet view counting how many times it was applied
#[derive(Clone, Default)]
pub struct CountingWallet {
    pub applied: Arc<Mutex<usize>>,
    pub invalid: bool,
}

impl WalletOperations for CountingWallet {
    fn nested(&self) -> Box<dyn WalletOperations> {
        Box::new(self.clone())
    }

    fn validate(&self) -> Result<(), WalletError> {
        if self.invalid {
            return Err(WalletError::InvalidOperation {
                reason: "negative balance".to_string(),
            });
        }
        Ok(())
    }

    fn apply(&mut self) {
        *self.applied.lock() += 1;
    }
}

#[derive(Default)]
pub struct CountingWalletFactory {
    pub wallet: CountingWallet,
}

impl WalletOperationsFactory for CountingWalletFactory {
    fn create(&self) -> Box<dyn WalletOperations> {
        Box::new(self.wallet.clone())
    }
}
