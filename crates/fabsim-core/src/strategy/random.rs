use rand::rngs::StdRng;
use rand::RngExt as _;

use crate::error::{Result, SimError};
use crate::flow::Flow;
use crate::strategy::{weighted_pick, FabricView, LoadBalancer};

/// Equal-cost multi-path: uniform random choice across all links.
pub struct Ecmp;

impl LoadBalancer for Ecmp {
    fn name(&self) -> &'static str {
        "ecmp"
    }

    fn select_link(&self, _flow: &Flow, fabric: &FabricView<'_>, rng: &mut StdRng) -> usize {
        rng.random_range(0..fabric.links.len())
    }
}

/// Weighted multi-path: random choice weighted by the configured per-link
/// target utilizations.
pub struct Wcmp {
    weights: Vec<f64>,
}

impl Wcmp {
    /// Fails unless every weight is positive.
    pub fn new(weights: Vec<f64>) -> Result<Self> {
        if weights.is_empty() || weights.iter().any(|w| *w <= 0.0) {
            return Err(SimError::InvalidParameters(
                "wcmp requires a positive target utilization on every link".into(),
            ));
        }
        Ok(Self { weights })
    }
}

impl LoadBalancer for Wcmp {
    fn name(&self) -> &'static str {
        "wcmp"
    }

    fn select_link(&self, _flow: &Flow, _fabric: &FabricView<'_>, rng: &mut StdRng) -> usize {
        weighted_pick(&self.weights, rng)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::link::Link;
    use crate::metrics::MetricsTracker;
    use rand::SeedableRng;

    fn fabric(n: usize) -> (Vec<Link>, MetricsTracker) {
        let links = (0..n)
            .map(|i| Link::new(format!("l{i}"), 1000.0, 1.0))
            .collect();
        (links, MetricsTracker::new(0.1).unwrap())
    }

    #[test]
    fn ecmp_spreads_roughly_evenly() {
        let (links, tracker) = fabric(2);
        let view = FabricView {
            links: &links,
            metrics: &tracker,
        };
        let mut rng = StdRng::seed_from_u64(0);
        let flow = Flow::new(0, 0.0, 100);

        let mut counts = [0u32; 2];
        for _ in 0..10_000 {
            counts[Ecmp.select_link(&flow, &view, &mut rng)] += 1;
        }
        let ratio = counts[0] as f64 / counts[1] as f64;
        assert!(
            (0.9..1.1).contains(&ratio),
            "ecmp split should be near even: {counts:?}"
        );
    }

    #[test]
    fn wcmp_rejects_non_positive_weights() {
        assert!(Wcmp::new(vec![]).is_err());
        assert!(Wcmp::new(vec![0.5, 0.0]).is_err());
        assert!(Wcmp::new(vec![0.5, -0.1]).is_err());
        assert!(Wcmp::new(vec![0.5, 0.5]).is_ok());
    }

    #[test]
    fn wcmp_honours_weight_ratio() {
        let (links, tracker) = fabric(2);
        let view = FabricView {
            links: &links,
            metrics: &tracker,
        };
        let strategy = Wcmp::new(vec![0.75, 0.25]).unwrap();
        let mut rng = StdRng::seed_from_u64(1);
        let flow = Flow::new(0, 0.0, 100);

        let mut counts = [0u32; 2];
        for _ in 0..10_000 {
            counts[strategy.select_link(&flow, &view, &mut rng)] += 1;
        }
        let share = counts[0] as f64 / 10_000.0;
        assert!(
            (0.72..0.78).contains(&share),
            "expected ~75% on link 0, got {share}"
        );
    }
}
