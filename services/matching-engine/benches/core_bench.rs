use criterion::{black_box, criterion_group, criterion_main, Criterion};
use matching_engine::interfaces::DangerousChangeSink;
use matching_engine::mid_price::RefMidPriceDangerousChangeEvent;
use matching_engine::{AssetOrderBook, MidPriceConfig, ReferenceMidPriceEngine};
use rust_decimal::Decimal;
use std::sync::Arc;
use types::asset_pair::AssetPair;
use types::ids::{AssetPairId, ClientId};
use types::numeric::{Price, Volume};
use types::order::{Order, Side};

struct DiscardSink;

impl DangerousChangeSink for DiscardSink {
    fn check_order_book(&self, _event: RefMidPriceDangerousChangeEvent) {}
}

fn create_order(client_id: ClientId, side: Side, price: u64, timestamp: i64) -> Order {
    Order::new(
        AssetPairId::new("BTCUSD"),
        client_id,
        side,
        Price::from_u64(price),
        Volume::from_str("1").unwrap(),
        timestamp,
    )
}

fn deep_book(levels: u64) -> AssetOrderBook {
    let mut book = AssetOrderBook::new(AssetPairId::new("BTCUSD"));
    let maker = ClientId::new();
    for i in 0..levels {
        book.add_order(create_order(maker, Side::Buy, 10_000 - i, i as i64));
        book.add_order(create_order(maker, Side::Sell, 10_001 + i, i as i64));
    }
    book
}

fn bench_book_copy(c: &mut Criterion) {
    let book = deep_book(1000);
    c.bench_function("asset_order_book_copy_2000_orders", |b| {
        b.iter(|| black_box(book.copy()));
    });
}

fn bench_negative_spread_by_other_client(c: &mut Criterion) {
    let book = deep_book(1000);
    let taker = create_order(ClientId::new(), Side::Buy, 10_050, 0);
    c.bench_function("lead_to_negative_spread_by_other_client", |b| {
        b.iter(|| black_box(book.lead_to_negative_spread_by_other_client(&taker)));
    });
}

fn bench_add_mid_price(c: &mut Criterion) {
    let config = MidPriceConfig {
        reference_mid_price_period_ms: 60_000,
        max_recalculation_count: 1000,
    };
    let pair = AssetPair::new("BTCUSD", "BTC", "USD", 2);
    c.bench_function("add_mid_price_rolling_window", |b| {
        b.iter_with_setup(
            || ReferenceMidPriceEngine::new(config.clone(), Arc::new(DiscardSink)),
            |mut engine| {
                for i in 0..5_000i64 {
                    let price = Decimal::from(10_000 + i % 17);
                    engine.add_mid_price(&pair.asset_pair_id, price, i * 50, false);
                }
                black_box(engine.reference_mid_price(&pair, 250_000));
            },
        );
    });
}

criterion_group!(
    benches,
    bench_book_copy,
    bench_negative_spread_by_other_client,
    bench_add_mid_price
);
criterion_main!(benches);
