use criterion::{criterion_group, criterion_main, Criterion};
use funnel_optimizer::models::{PlatformSnapshot, StandardizedMetrics};
use funnel_optimizer::services::fees;
use funnel_optimizer::services::TemplateService;
use serde_json::json;
use std::hint::black_box;

fn snapshot(revenue: f64, orders: u64, conversion_rate: f64) -> PlatformSnapshot {
    serde_json::from_value(json!({
        "platform": "shopify",
        "period_days": 30,
        "metrics": {
            "total_orders": orders,
            "total_revenue": revenue,
            "average_order_value": revenue / orders as f64,
            "abandoned_checkouts": orders / 2
        },
        "baseline_data": { "conversion_rate": conversion_rate }
    }))
    .expect("Failed to build snapshot")
}

fn benchmark_fee_calculation(c: &mut Criterion) {
    let baseline_snapshot = snapshot(50_000.0, 400, 2.1);
    let current_snapshot = snapshot(68_000.0, 480, 2.9);
    let baseline: StandardizedMetrics = fees::standardize(&baseline_snapshot);
    let current = fees::standardize(&current_snapshot);

    let mut group = c.benchmark_group("performance_fees");

    group.bench_function("standardize_shopify", |b| {
        b.iter(|| fees::standardize(black_box(&current_snapshot)))
    });

    group.bench_function("improvements_and_tiered_fees", |b| {
        b.iter(|| {
            let improvements =
                fees::calculate_improvements(black_box(&baseline), black_box(&current));
            fees::tiered_fees(&improvements, &current, 0.07)
        })
    });

    group.finish();
}

fn benchmark_recommendations(c: &mut Criterion) {
    let service = TemplateService::load_from_file("data/vertical_templates.json")
        .expect("Failed to load templates");

    c.bench_function("recommend_templates", |b| {
        b.iter(|| {
            service.recommendations(
                black_box(Some("roofing contractor")),
                black_box(Some("$2M-$20M")),
            )
        })
    });
}

criterion_group!(benches, benchmark_fee_calculation, benchmark_recommendations);
criterion_main!(benches);
