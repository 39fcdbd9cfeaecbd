//! Creation and commit of execution contexts
//!
//! [`ExecutionContextFactory::apply`] is the only path by which a request's
//! effects reach shared state. It validates and persists first, then swaps
//! books and commits staged mid prices under one write lock, so a failure
//! leaves shared state exactly as it was.

use std::sync::Arc;
use tracing::{error, info, info_span, warn};
use types::errors::CommitError;

use crate::interfaces::{
    DeviationPolicyLookup, PersistenceData, PersistenceManager, WalletOperations,
    WalletOperationsFactory,
};
use crate::mid_price::TransactionMidPriceStage;

use super::context::{ExecutionContext, RequestInfo};
use super::order_books::{BookKind, CurrentTransactionOrderBooks};
use super::state::SharedState;

pub struct ExecutionContextFactory {
    shared: SharedState,
    wallet_factory: Arc<dyn WalletOperationsFactory>,
    deviation_policy: Arc<dyn DeviationPolicyLookup>,
    persistence: Arc<dyn PersistenceManager>,
}

impl ExecutionContextFactory {
    pub fn new(
        shared: SharedState,
        wallet_factory: Arc<dyn WalletOperationsFactory>,
        deviation_policy: Arc<dyn DeviationPolicyLookup>,
        persistence: Arc<dyn PersistenceManager>,
    ) -> Self {
        Self {
            shared,
            wallet_factory,
            deviation_policy,
            persistence,
        }
    }

    pub fn shared_state(&self) -> &SharedState {
        &self.shared
    }

    /// Builder for a context of a new request, with default collaborators
    pub fn builder(&self, request: RequestInfo) -> ExecutionContextBuilder<'_> {
        ExecutionContextBuilder {
            factory: self,
            request,
            wallet_operations: None,
            order_books: None,
            stop_order_books: None,
            mid_prices: None,
        }
    }

    /// Context of a new request with default collaborators
    pub fn create(&self, request: RequestInfo) -> ExecutionContext {
        self.builder(request).build()
    }

    /// Context sharing `baseline`'s identity over independent copies of its
    /// transaction state
    ///
    /// Books start from `baseline`'s uncommitted views; the mid-price stage
    /// starts empty.
    pub fn create_nested(&self, baseline: &ExecutionContext) -> ExecutionContext {
        let span = info_span!(parent: &baseline.span, "nested_execution_context");
        ExecutionContext {
            request: baseline.request.clone(),
            wallet_operations: baseline.wallet_operations.nested(),
            order_books: baseline.order_books.fork(),
            stop_order_books: baseline.stop_order_books.fork(),
            mid_prices: baseline.mid_prices.new_empty(),
            span,
        }
    }

    /// Commit `context` to shared state
    ///
    /// On error nothing has been applied and the context is consumed. Staging
    /// mid prices for a pair missing from the request's asset pair metadata
    /// is a caller bug and rejects the whole context.
    pub fn apply(&self, context: ExecutionContext) -> Result<(), CommitError> {
        let ExecutionContext {
            request,
            mut wallet_operations,
            order_books,
            stop_order_books,
            mid_prices,
            span,
        } = context;
        let _entered = span.enter();

        if let Err(err) = wallet_operations.validate() {
            warn!(error = %err, "Wallet operations rejected, context not applied");
            return Err(err.into());
        }
        if let Some(asset_pair_id) = mid_prices
            .staged_asset_pairs()
            .find(|asset_pair_id| !request.asset_pairs_by_id.contains_key(*asset_pair_id))
        {
            error!(asset_pair_id = %asset_pair_id, "Mid prices staged for unknown asset pair");
            return Err(CommitError::UnknownAssetPair {
                asset_pair_id: asset_pair_id.to_string(),
            });
        }

        let data = PersistenceData {
            order_books: order_books.persistence_data(),
            stop_order_books: stop_order_books.persistence_data(),
            mid_prices: mid_prices.snapshot_for_persistence(request.date),
        };
        if !data.is_empty() {
            if let Err(err) = self.persistence.persist(&data) {
                error!(error = %err, "Unable to persist execution context");
                return Err(err.into());
            }
        }

        {
            let mut guard = self.shared.write();
            let state = &mut *guard;
            order_books.apply(&mut state.order_books);
            stop_order_books.apply(&mut state.stop_order_books);
            mid_prices.commit(&mut state.mid_prices, request.date, request.message_type.is_cancel());
            wallet_operations.apply();
        }

        info!(
            order_books = data.order_books.len() / 2,
            stop_order_books = data.stop_order_books.len() / 2,
            mid_prices = data.mid_prices.mid_prices.len(),
            reset_mid_prices = data.mid_prices.remove_all,
            "Execution context applied"
        );
        Ok(())
    }
}

/// Context builder; unset collaborators fall back to the factory defaults
pub struct ExecutionContextBuilder<'a> {
    factory: &'a ExecutionContextFactory,
    request: RequestInfo,
    wallet_operations: Option<Box<dyn WalletOperations>>,
    order_books: Option<CurrentTransactionOrderBooks>,
    stop_order_books: Option<CurrentTransactionOrderBooks>,
    mid_prices: Option<TransactionMidPriceStage>,
}

impl ExecutionContextBuilder<'_> {
    pub fn with_wallet_operations(mut self, wallet_operations: Box<dyn WalletOperations>) -> Self {
        self.wallet_operations = Some(wallet_operations);
        self
    }

    pub fn with_order_books(mut self, order_books: CurrentTransactionOrderBooks) -> Self {
        self.order_books = Some(order_books);
        self
    }

    pub fn with_stop_order_books(mut self, stop_order_books: CurrentTransactionOrderBooks) -> Self {
        self.stop_order_books = Some(stop_order_books);
        self
    }

    pub fn with_mid_prices(mut self, mid_prices: TransactionMidPriceStage) -> Self {
        self.mid_prices = Some(mid_prices);
        self
    }

    pub fn build(self) -> ExecutionContext {
        let factory = self.factory;
        let span = info_span!(
            "execution_context",
            message_id = %self.request.message_id,
            request_id = %self.request.request_id,
            message_type = ?self.request.message_type,
        );

        ExecutionContext {
            wallet_operations: self
                .wallet_operations
                .unwrap_or_else(|| factory.wallet_factory.create()),
            order_books: self.order_books.unwrap_or_else(|| {
                CurrentTransactionOrderBooks::new(factory.shared.clone(), BookKind::Limit)
            }),
            stop_order_books: self.stop_order_books.unwrap_or_else(|| {
                CurrentTransactionOrderBooks::new(factory.shared.clone(), BookKind::Stop)
            }),
            mid_prices: self.mid_prices.unwrap_or_else(|| {
                TransactionMidPriceStage::new(factory.shared.clone(), factory.deviation_policy.clone())
            }),
            request: self.request,
            span,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MidPriceConfig;
    use crate::mid_price::{RefMidPriceDangerousChangeEvent, ReferenceMidPriceEngine};
    use crate::test_support::{
        CountingWallet, CountingWalletFactory, FixedDeviationPolicy, RecordingPersistence,
        RecordingSink,
    };
    use crate::transaction::{MessageType, SharedMatchingState};
    use rust_decimal::Decimal;
    use std::collections::HashMap;
    use types::asset_pair::AssetPair;
    use types::errors::{PersistenceError, WalletError};
    use types::ids::{AssetPairId, ClientId};
    use types::numeric::{Price, Volume};
    use types::order::{Order, Side};

    struct Fixture {
        factory: ExecutionContextFactory,
        persistence: Arc<RecordingPersistence>,
        wallet: CountingWallet,
        sink: Arc<RecordingSink>,
    }

    fn fixture() -> Fixture {
        let sink = Arc::new(RecordingSink::default());
        let config = MidPriceConfig {
            reference_mid_price_period_ms: 60_000,
            max_recalculation_count: 1000,
        };
        let shared = SharedMatchingState::new(ReferenceMidPriceEngine::new(config, sink.clone()))
            .into_shared();
        let persistence = Arc::new(RecordingPersistence::default());
        let wallet = CountingWallet::default();
        let factory = ExecutionContextFactory::new(
            shared,
            Arc::new(CountingWalletFactory {
                wallet: wallet.clone(),
            }),
            Arc::new(FixedDeviationPolicy::tracking(&["BTCUSD"])),
            persistence.clone(),
        );
        Fixture {
            factory,
            persistence,
            wallet,
            sink,
        }
    }

    fn pair() -> AssetPairId {
        AssetPairId::new("BTCUSD")
    }

    fn request(message_type: MessageType, date: i64) -> RequestInfo {
        let asset_pairs = HashMap::from([(pair(), AssetPair::new("BTCUSD", "BTC", "USD", 2))]);
        RequestInfo::new("message-1", "request-1", message_type, Arc::new(asset_pairs)).with_date(date)
    }

    fn order(side: Side, price: u64) -> Order {
        Order::new(
            pair(),
            ClientId::new(),
            side,
            Price::from_u64(price),
            Volume::from_str("1").unwrap(),
            1,
        )
    }

    #[test]
    fn test_apply_commits_books_and_mid_prices() {
        let fx = fixture();
        let mut context = fx.factory.create(request(MessageType::LimitOrder, 1_000));
        context.order_books().add_order(order(Side::Sell, 101));
        context.stop_order_books().add_order(order(Side::Buy, 90));
        context.mid_prices().add_sample(&pair(), Decimal::from(100));

        fx.factory.apply(context).unwrap();

        let state = fx.factory.shared_state().read();
        assert_eq!(state.order_books.get(&pair()).unwrap().ask_price(), Price::from_u64(101));
        assert_eq!(state.stop_order_books.get(&pair()).unwrap().len(), 1);
        assert_eq!(state.mid_prices.sample_count(&pair()), 1);
        assert_eq!(*fx.wallet.applied.lock(), 1);

        let persisted = fx.persistence.persisted.lock();
        assert_eq!(persisted.len(), 1);
        assert_eq!(persisted[0].order_books.len(), 2);
        assert_eq!(persisted[0].stop_order_books.len(), 2);
        assert_eq!(persisted[0].mid_prices.mid_prices[0].timestamp, 1_000);
    }

    #[test]
    fn test_persistence_failure_leaves_shared_state_untouched() {
        let fx = fixture();
        *fx.persistence.fail.lock() = true;
        let mut context = fx.factory.create(request(MessageType::LimitOrder, 1_000));
        context.order_books().add_order(order(Side::Sell, 101));
        context.mid_prices().add_sample(&pair(), Decimal::from(100));

        let result = fx.factory.apply(context);

        assert!(matches!(
            result,
            Err(CommitError::Persistence(PersistenceError::Write { .. }))
        ));
        let state = fx.factory.shared_state().read();
        assert!(state.order_books.get(&pair()).is_none());
        assert_eq!(state.mid_prices.sample_count(&pair()), 0);
        assert_eq!(*fx.wallet.applied.lock(), 0);
    }

    #[test]
    fn test_invalid_wallet_operations_abort_before_persisting() {
        let fx = fixture();
        let mut context = fx
            .factory
            .builder(request(MessageType::LimitOrder, 1_000))
            .with_wallet_operations(Box::new(CountingWallet {
                invalid: true,
                ..CountingWallet::default()
            }))
            .build();
        context.order_books().add_order(order(Side::Buy, 99));

        let result = fx.factory.apply(context);

        assert!(matches!(
            result,
            Err(CommitError::Wallet(WalletError::InvalidOperation { .. }))
        ));
        assert!(fx.persistence.persisted.lock().is_empty());
        assert!(fx.factory.shared_state().read().order_books.is_empty());
    }

    #[test]
    fn test_dropped_context_has_no_effect() {
        let fx = fixture();
        {
            let mut context = fx.factory.create(request(MessageType::LimitOrder, 1_000));
            context.order_books().add_order(order(Side::Sell, 101));
            context.mid_prices().add_sample(&pair(), Decimal::from(100));
        }

        let state = fx.factory.shared_state().read();
        assert!(state.order_books.is_empty());
        assert_eq!(state.mid_prices.sample_count(&pair()), 0);
        assert!(fx.persistence.persisted.lock().is_empty());
    }

    #[test]
    fn test_empty_context_skips_persistence() {
        let fx = fixture();
        let context = fx.factory.create(request(MessageType::LimitOrder, 1_000));

        fx.factory.apply(context).unwrap();

        assert!(fx.persistence.persisted.lock().is_empty());
        assert_eq!(*fx.wallet.applied.lock(), 1);
    }

    #[test]
    fn test_nested_context_forks_books_with_empty_stage() {
        let fx = fixture();
        let mut parent = fx.factory.create(request(MessageType::MultiLimitOrder, 1_000));
        let resting = order(Side::Sell, 101);
        parent.order_books().add_order(resting.clone());
        parent.mid_prices().add_sample(&pair(), Decimal::from(100));

        let mut child = fx.factory.create_nested(&parent);

        assert_eq!(child.message_id(), parent.message_id());
        assert_eq!(child.date(), parent.date());
        assert!(child.order_books().order_book(&pair()).contains(&resting.id));
        assert!(child.mid_prices().is_empty());

        child.order_books().remove_order(&resting);
        assert!(parent.order_books().order_book(&pair()).contains(&resting.id));
    }

    #[test]
    fn test_builder_uses_supplied_holders() {
        let fx = fixture();
        let mut books = CurrentTransactionOrderBooks::new(fx.factory.shared_state().clone(), BookKind::Limit);
        books.add_order(order(Side::Buy, 99));

        let mut context = fx
            .factory
            .builder(request(MessageType::LimitOrder, 1_000))
            .with_order_books(books)
            .build();

        assert_eq!(context.order_books().order_book(&pair()).bid_price(), Price::from_u64(99));
    }

    #[test]
    fn test_cancel_commit_reports_dangerous_change() {
        let fx = fixture();
        let mut first = fx.factory.create(request(MessageType::LimitOrder, 1_000));
        first.mid_prices().add_sample(&pair(), Decimal::from(100));
        fx.factory.apply(first).unwrap();

        let mut cancel = fx.factory.create(request(MessageType::LimitOrderCancel, 2_000));
        cancel.mid_prices().add_sample(&pair(), Decimal::from(80));
        fx.factory.apply(cancel).unwrap();

        assert_eq!(
            fx.sink.events(),
            vec![RefMidPriceDangerousChangeEvent {
                asset_pair_id: pair(),
                ref_mid_price: Decimal::from(90),
                cancel: true,
            }]
        );
    }

    #[test]
    fn test_mid_prices_for_pair_without_metadata_reject_context() {
        let fx = fixture();
        let stage = TransactionMidPriceStage::new(
            fx.factory.shared_state().clone(),
            Arc::new(FixedDeviationPolicy::tracking(&["BTCUSD", "XRPUSD"])),
        );
        let mut context = fx
            .factory
            .builder(request(MessageType::LimitOrder, 1_000))
            .with_mid_prices(stage)
            .build();
        context.order_books().add_order(order(Side::Buy, 99));
        context.mid_prices().add_sample(&pair(), Decimal::from(100));
        context.mid_prices().add_sample(&AssetPairId::new("XRPUSD"), Decimal::from(1));

        let result = fx.factory.apply(context);

        assert_eq!(
            result,
            Err(CommitError::UnknownAssetPair {
                asset_pair_id: "XRPUSD".to_string(),
            })
        );
        assert!(fx.persistence.persisted.lock().is_empty());
        let state = fx.factory.shared_state().read();
        assert!(state.order_books.is_empty());
        assert_eq!(state.mid_prices.sample_count(&pair()), 0);
        assert_eq!(state.mid_prices.sample_count(&AssetPairId::new("XRPUSD")), 0);
        assert_eq!(*fx.wallet.applied.lock(), 0);
    }

    #[test]
    fn test_reset_all_clears_committed_mid_prices() {
        let fx = fixture();
        let mut first = fx.factory.create(request(MessageType::LimitOrder, 1_000));
        first.mid_prices().add_sample(&pair(), Decimal::from(100));
        fx.factory.apply(first).unwrap();

        let mut reset = fx.factory.create(request(MessageType::LimitOrderMassCancel, 2_000));
        reset.mid_prices().mark_reset_all();
        fx.factory.apply(reset).unwrap();

        assert_eq!(fx.factory.shared_state().read().mid_prices.sample_count(&pair()), 0);
        assert!(fx.persistence.persisted.lock()[1].mid_prices.remove_all);
    }
}
