//! Throughput benchmarks for bulk per-tick scans across many positions.
//!
//! Run with: `cargo bench --bench throughput`

use alloy_primitives::{b256, U256};
use chrono::Utc;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use polymarket_core::types::{Market, Position};
use rust_decimal::Decimal;
use risk_manager::profit_floor;

fn market_for(i: usize) -> Market {
    Market {
        asset: format!("asset-{i}"),
        condition_id: b256!("111111111111111111111111111111111111111111111111111111111111110a"),
        question: "Will it be up?".to_string(),
        open_time: Utc::now(),
        end_time: Utc::now() + chrono::Duration::seconds(300),
        yes_token_id: U256::from(i as u64 * 2 + 1),
        no_token_id: U256::from(i as u64 * 2 + 2),
        tick_size: Decimal::new(1, 2),
        neg_risk: false,
    }
}

fn generate_positions(count: usize) -> Vec<Position> {
    (0..count)
        .map(|i| {
            let mut pos = Position::new(market_for(i), Decimal::new(5, 0));
            if i % 3 == 0 {
                pos.yes.mark_filled(Decimal::new(6, 1));
            }
            pos
        })
        .collect()
}

/// Benchmark scanning many concurrently-open positions for their terminal
/// branch on one dispatcher tick (§4.5 step 2, §5).
fn bench_monitor_tick_scan(c: &mut Criterion) {
    let mut group = c.benchmark_group("monitor_tick_scan");

    for count in [10, 50, 200, 1000].iter() {
        let positions = generate_positions(*count);
        let now = Utc::now();

        group.throughput(Throughput::Elements(*count as u64));
        group.bench_with_input(
            BenchmarkId::new("scan", count),
            &positions,
            |b, positions| {
                b.iter(|| {
                    let mut cutting = Vec::new();
                    for pos in positions {
                        let remaining = pos.lifetime_remaining_secs(now);
                        if pos.both_filled() {
                            continue;
                        }
                        if remaining <= 60 && pos.exactly_one_filled() {
                            cutting.push(pos.market.asset.clone());
                        }
                    }
                    black_box(cutting)
                })
            },
        );
    }

    group.finish();
}

/// Benchmark computing the adaptive profit floor across many simultaneously
/// cutting positions (§4.6).
fn bench_bulk_profit_floor(c: &mut Criterion) {
    let mut group = c.benchmark_group("bulk_profit_floor");

    for count in [10, 100, 1000, 5000].iter() {
        let fills: Vec<Decimal> = (0..*count)
            .map(|i| Decimal::new(40 + (i as i64 % 30), 2))
            .collect();
        let min_combined = Decimal::new(120, 2);

        group.throughput(Throughput::Elements(*count as u64));
        group.bench_with_input(
            BenchmarkId::new("compute", count),
            &fills,
            |b, fills| {
                b.iter(|| {
                    let floors: Vec<Decimal> = fills
                        .iter()
                        .map(|p_f| profit_floor(min_combined, *p_f))
                        .collect();
                    black_box(floors)
                })
            },
        );
    }

    group.finish();
}

/// Benchmark bulk `Decimal` P&L summation, the shape of a status report
/// rollup across every open position.
fn bench_bulk_pnl_sum(c: &mut Criterion) {
    let mut group = c.benchmark_group("bulk_pnl_sum");

    for count in [10, 100, 1000, 5000].iter() {
        let positions = generate_positions(*count);

        group.throughput(Throughput::Elements(*count as u64));
        group.bench_with_input(
            BenchmarkId::new("sum", count),
            &positions,
            |b, positions| {
                b.iter(|| {
                    let total: Decimal = positions
                        .iter()
                        .filter_map(|p| p.total_pnl())
                        .sum();
                    black_box(total)
                })
            },
        );
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_monitor_tick_scan,
    bench_bulk_profit_floor,
    bench_bulk_pnl_sum,
);

criterion_main!(benches);
