use rand::rngs::StdRng;

use crate::dist::FlowSizeDist;
use crate::error::Result;
use crate::flow::Flow;
use crate::metrics::Collector;
use crate::strategy::{weighted_pick, FabricView, LoadBalancer};

/// Number of evenly spaced quantile points sampled at construction.
const QUANTILE_POINTS: usize = 100;
/// Fraction of total sampled bytes accumulated below the large-flow cutoff.
const SMALL_TAIL_FRACTION: f64 = 0.05;

/// Size-aware routing derived from the flow-size CDF.
///
/// At construction the strategy samples the distribution at 100 evenly
/// spaced quantiles and derives two things from the cumulative byte curve:
///
/// - the **large-flow threshold**: the size below which only ~5% of total
///   bytes accumulate, separating the heavy-tail minority that dominates
///   total bytes;
/// - **per-link weights**: the curve is walked in equal byte slabs, one per
///   link; each slab's upper quantile `u` sets its link's weight to
///   `1 − u`, then the weights are normalized to sum to one.
///
/// Per flow: heavy flows (`size ≥ threshold`) go to the link with the
/// lowest sampled utilization; the rest are spread weighted-random.
pub struct PercentileBased {
    weights: Vec<f64>,
    large_flow_threshold: u64,
}

impl PercentileBased {
    pub fn new(num_links: usize, dist: &FlowSizeDist) -> Result<Self> {
        let mut sizes = Vec::with_capacity(QUANTILE_POINTS);
        for i in 0..QUANTILE_POINTS {
            let u = i as f64 / (QUANTILE_POINTS - 1) as f64;
            sizes.push(dist.quantile(u)?);
        }

        let total: f64 = sizes.iter().map(|&s| s as f64).sum();
        let mut cumulative = Vec::with_capacity(sizes.len());
        let mut acc = 0.0;
        for &size in &sizes {
            acc += size as f64;
            cumulative.push(acc);
        }

        let cut = cumulative
            .iter()
            .position(|&c| c / total >= SMALL_TAIL_FRACTION)
            .unwrap_or(sizes.len());
        let k = cut.saturating_sub(1).min(sizes.len() - 1);
        let large_flow_threshold = sizes[k];

        // One S/N-byte slab per link; the slab's upper quantile u maps to
        // weight 1 - u, so links fed from the head of the curve (small
        // flows) end up weighted heavier.
        let per_link = total / num_links as f64;
        let mut weights = vec![0.0; num_links];
        let mut threshold = per_link;
        let mut link_idx = 0;
        for (i, &c) in cumulative.iter().enumerate() {
            let u = i as f64 / (QUANTILE_POINTS - 1) as f64;
            while link_idx < num_links && c >= threshold {
                weights[link_idx] = 1.0 - u;
                threshold += per_link;
                link_idx += 1;
            }
            if link_idx >= num_links {
                break;
            }
        }

        if weights.iter().sum::<f64>() == 0.0 {
            weights.iter_mut().for_each(|w| *w = 1.0);
        }
        let sum: f64 = weights.iter().sum();
        weights.iter_mut().for_each(|w| *w /= sum);

        Ok(Self {
            weights,
            large_flow_threshold,
        })
    }

    pub fn large_flow_threshold(&self) -> u64 {
        self.large_flow_threshold
    }

    pub fn weights(&self) -> &[f64] {
        &self.weights
    }
}

impl LoadBalancer for PercentileBased {
    fn name(&self) -> &'static str {
        "percentile_based"
    }

    fn select_link(&self, flow: &Flow, fabric: &FabricView<'_>, rng: &mut StdRng) -> usize {
        if flow.flow_size >= self.large_flow_threshold {
            coldest_link(fabric)
        } else {
            weighted_pick(&self.weights, rng)
        }
    }
}

/// First-index argmin of the latest sampled utilization. Links without a
/// sample count as 0.0 utilization.
pub(crate) fn coldest_link(fabric: &FabricView<'_>) -> usize {
    let mut best_idx = 0;
    let mut best_utilization = f64::INFINITY;
    for idx in 0..fabric.links.len() {
        let utilization = fabric
            .metrics
            .latest(idx, Collector::LinkUtilization.name())
            .unwrap_or(0.0);
        if utilization < best_utilization {
            best_idx = idx;
            best_utilization = utilization;
        }
    }
    best_idx
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::link::Link;
    use crate::metrics::MetricsTracker;
    use rand::SeedableRng;

    fn heavy_tail() -> FlowSizeDist {
        FlowSizeDist::bounded_pareto(100.0, 1_000_000.0, 0.5).unwrap()
    }

    #[test]
    fn weights_are_normalized() {
        let strategy = PercentileBased::new(4, &heavy_tail()).unwrap();
        let sum: f64 = strategy.weights().iter().sum();
        assert!((sum - 1.0).abs() < 1e-9);
        assert!(strategy.weights().iter().all(|w| *w >= 0.0));
    }

    #[test]
    fn threshold_lies_within_distribution_bounds() {
        let strategy = PercentileBased::new(4, &heavy_tail()).unwrap();
        let threshold = strategy.large_flow_threshold();
        assert!((100..=1_000_000).contains(&threshold));
    }

    #[test]
    fn constant_distribution_still_normalizes() {
        let dist = FlowSizeDist::constant(1000).unwrap();
        let strategy = PercentileBased::new(2, &dist).unwrap();
        let sum: f64 = strategy.weights().iter().sum();
        assert!((sum - 1.0).abs() < 1e-9);
        assert!(strategy.weights().iter().all(|w| (0.0..=1.0).contains(w)));
    }

    #[test]
    fn large_flows_route_to_lowest_utilization_link() {
        let strategy = PercentileBased::new(2, &heavy_tail()).unwrap();

        // Link 0 hot (utilization 0.9 at the sampled grid point), link 1 cold.
        let mut links = vec![
            Link::new("l0", 1000.0, 1.0),
            Link::new("l1", 1000.0, 1.0),
        ];
        let mut tracker = MetricsTracker::new(1.0).unwrap();
        tracker.register_link(&[Collector::LinkUtilization]);
        tracker.register_link(&[Collector::LinkUtilization]);
        links[0].enqueue(Flow::new(0, 0.0, 900), 0.0);
        links[1].enqueue(Flow::new(1, 0.0, 100), 0.0);
        tracker.sample(&links, 1.5);

        let view = FabricView {
            links: &links,
            metrics: &tracker,
        };
        let mut rng = StdRng::seed_from_u64(0);

        // A flow at the distribution's upper bound is unquestionably large.
        let big = Flow::new(9, 2.0, 1_000_001);
        assert!(big.flow_size >= strategy.large_flow_threshold());
        assert_eq!(strategy.select_link(&big, &view, &mut rng), 1);
    }

    #[test]
    fn small_flows_spread_by_weights() {
        let strategy = PercentileBased::new(2, &heavy_tail()).unwrap();
        let links = vec![
            Link::new("l0", 1000.0, 1.0),
            Link::new("l1", 1000.0, 1.0),
        ];
        let tracker = MetricsTracker::new(1.0).unwrap();
        let view = FabricView {
            links: &links,
            metrics: &tracker,
        };
        let mut rng = StdRng::seed_from_u64(3);

        let small = Flow::new(0, 0.0, 1);
        assert!(small.flow_size < strategy.large_flow_threshold());
        let mut counts = vec![0u32; 2];
        for _ in 0..10_000 {
            counts[strategy.select_link(&small, &view, &mut rng)] += 1;
        }
        let share = counts[0] as f64 / 10_000.0;
        let expected = strategy.weights()[0];
        assert!(
            (share - expected).abs() < 0.03,
            "share {share} vs weight {expected}"
        );
    }

    #[test]
    fn missing_samples_count_as_cold() {
        let links = vec![
            Link::new("l0", 1000.0, 1.0),
            Link::new("l1", 1000.0, 1.0),
        ];
        let tracker = MetricsTracker::new(1.0).unwrap();
        let view = FabricView {
            links: &links,
            metrics: &tracker,
        };
        // No samples anywhere: everything ties at 0.0, first index wins.
        assert_eq!(coldest_link(&view), 0);
    }
}
