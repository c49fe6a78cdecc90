//! Latency benchmarks for the position state machine's hot paths.
//!
//! Run with: `cargo bench --bench latency`

use alloy_primitives::{b256, U256};
use chrono::Utc;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use polymarket_core::types::{Leg, Market, Position};
use rust_decimal::Decimal;
use risk_manager::profit_floor;

fn sample_market(slot_seconds: i64) -> Market {
    Market {
        asset: "btc".to_string(),
        condition_id: b256!("111111111111111111111111111111111111111111111111111111111111110a"),
        question: "Will BTC be up?".to_string(),
        open_time: Utc::now(),
        end_time: Utc::now() + chrono::Duration::seconds(slot_seconds),
        yes_token_id: U256::from(1u64),
        no_token_id: U256::from(2u64),
        tick_size: Decimal::new(1, 2),
        neg_risk: false,
    }
}

/// Benchmark constructing a fresh position from a split (§4.5 step 1).
fn bench_position_new(c: &mut Criterion) {
    let market = sample_market(300);

    c.bench_function("position_new", |b| {
        b.iter(|| black_box(Position::new(black_box(market.clone()), black_box(Decimal::new(5, 0)))))
    });
}

/// Benchmark the fill-check predicates run every monitor tick.
fn bench_fill_predicates(c: &mut Criterion) {
    let market = sample_market(300);
    let mut group = c.benchmark_group("fill_predicates");

    for filled in [(false, false), (true, false), (true, true)] {
        let mut pos = Position::new(market.clone(), Decimal::new(5, 0));
        if filled.0 {
            pos.yes.mark_filled(Decimal::new(6, 1));
        }
        if filled.1 {
            pos.no.mark_filled(Decimal::new(6, 1));
        }

        group.throughput(Throughput::Elements(1));
        group.bench_with_input(
            BenchmarkId::new("both_filled", format!("{filled:?}")),
            &pos,
            |b, pos| b.iter(|| black_box(pos.both_filled())),
        );
        group.bench_with_input(
            BenchmarkId::new("exactly_one_filled", format!("{filled:?}")),
            &pos,
            |b, pos| b.iter(|| black_box(pos.exactly_one_filled())),
        );
    }

    group.finish();
}

/// Benchmark lifetime-remaining, evaluated once per monitor tick per asset.
fn bench_lifetime_remaining(c: &mut Criterion) {
    let market = sample_market(300);
    c.bench_function("lifetime_remaining_secs", |b| {
        let now = Utc::now();
        b.iter(|| black_box(market.lifetime_remaining_secs(black_box(now))))
    });
}

/// Benchmark the leg P&L calculation (§4.5 step 2).
fn bench_leg_pnl(c: &mut Criterion) {
    let mut leg = Leg::new(U256::from(1u64), Decimal::new(5, 0), Decimal::new(5, 1));
    leg.mark_filled(Decimal::new(62, 2));

    c.bench_function("leg_pnl", |b| {
        b.iter(|| black_box(leg.pnl()))
    });
}

/// Benchmark the adaptive cut-loss profit-floor calculation, evaluated once
/// per monitor tick while a position is cutting (§4.6).
fn bench_profit_floor(c: &mut Criterion) {
    c.bench_function("adaptive_profit_floor", |b| {
        b.iter(|| {
            black_box(profit_floor(
                black_box(Decimal::new(120, 2)),
                black_box(Decimal::new(58, 2)),
            ))
        })
    });
}

/// Benchmark `Decimal` arithmetic, the unit every price/P&L calculation in
/// the engine runs through.
fn bench_decimal_arithmetic(c: &mut Criterion) {
    let mut group = c.benchmark_group("decimal_arithmetic");

    let val_a = Decimal::new(12345, 4);
    let val_b = Decimal::new(67890, 4);

    group.bench_function("addition", |b| {
        b.iter(|| black_box(black_box(val_a) + black_box(val_b)))
    });
    group.bench_function("multiplication", |b| {
        b.iter(|| black_box(black_box(val_a) * black_box(val_b)))
    });
    group.bench_function("comparison", |b| {
        b.iter(|| black_box(black_box(val_a) > black_box(val_b)))
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_position_new,
    bench_fill_predicates,
    bench_lifetime_remaining,
    bench_leg_pnl,
    bench_profit_floor,
    bench_decimal_arithmetic,
);

criterion_main!(benches);
