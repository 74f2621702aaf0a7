//! Per-flow link-selection latency benchmarks.
//!
//! Measures the strategy layer's decision cost on a warm fabric:
//! - select_link() for every strategy over 8 links
//! - a full arrival dispatch (selection + enqueue) via the kernel
//!
//! Run with: cargo bench --package fabsim-core

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rand::rngs::StdRng;
use rand::SeedableRng;

use fabsim_core::config::{LinkConfig, SimConfig};
use fabsim_core::dist::FlowSizeDist;
use fabsim_core::flow::Flow;
use fabsim_core::link::Link;
use fabsim_core::metrics::{Collector, MetricsTracker};
use fabsim_core::strategy::{build_strategy, FabricView};
use fabsim_core::Simulator;

fn bench_config(strategy: &str, num_links: usize) -> SimConfig {
    SimConfig {
        duration: 1.0,
        seed: 42,
        sample_interval: 0.1,
        strategy: strategy.into(),
        links: (0..num_links)
            .map(|i| LinkConfig {
                id: format!("link-{i}"),
                capacity: 1e9,
                time_window_duration: 1.0,
                target_utilization: 1.0 / num_links as f64,
            })
            .collect(),
        buffer_links: Some(2),
        large_flow_percentile: 95.0,
        arrival_rate: 1000.0,
        flow_size: FlowSizeDist::BoundedPareto {
            lower: 100.0,
            upper: 1e6,
            alpha: 0.5,
        },
    }
}

/// A fabric with staggered busy horizons and one utilization sample per link.
fn warm_fabric(num_links: usize) -> (Vec<Link>, MetricsTracker) {
    let mut links: Vec<Link> = (0..num_links)
        .map(|i| Link::new(format!("link-{i}"), 1e9, 1.0))
        .collect();
    let mut tracker = MetricsTracker::new(0.1).unwrap();
    for (i, link) in links.iter_mut().enumerate() {
        tracker.register_link(&Collector::ALL);
        link.enqueue(Flow::new(i as u64, 0.0, (i as u64 + 1) * 100_000), 0.0);
    }
    tracker.sample(&links, 0.15);
    (links, tracker)
}

fn bench_select_link(c: &mut Criterion) {
    let mut group = c.benchmark_group("select_link_8links");
    let (links, tracker) = warm_fabric(8);

    for name in [
        "ecmp",
        "wcmp",
        "least_congested",
        "most_under_target",
        "percentile_based",
        "uneven",
    ] {
        let config = bench_config(name, 8);
        let strategy = build_strategy(&config, &config.flow_size).unwrap();
        let mut rng = StdRng::seed_from_u64(0xFAB);
        let flow = Flow::new(99, 0.2, 50_000);

        group.bench_function(name, |b| {
            b.iter(|| {
                let view = FabricView {
                    links: &links,
                    metrics: &tracker,
                };
                black_box(strategy.select_link(black_box(&flow), &view, &mut rng))
            });
        });
    }
    group.finish();
}

fn bench_full_run(c: &mut Criterion) {
    let mut group = c.benchmark_group("kernel_run");
    group.sample_size(20);

    for name in ["ecmp", "least_congested"] {
        group.bench_function(format!("{name}_1k_flows"), |b| {
            b.iter(|| {
                let mut sim = Simulator::from_config(bench_config(name, 8)).unwrap();
                black_box(sim.run())
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_select_link, bench_full_run);
criterion_main!(benches);
