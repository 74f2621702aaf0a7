use rand::rngs::StdRng;

use crate::flow::Flow;
use crate::metrics::Collector;
use crate::strategy::{least_busy, FabricView, LoadBalancer};

/// Routes every flow to the link whose busy horizon is earliest.
pub struct LeastCongested;

impl LoadBalancer for LeastCongested {
    fn name(&self) -> &'static str {
        "least_congested"
    }

    fn select_link(&self, _flow: &Flow, fabric: &FabricView<'_>, _rng: &mut StdRng) -> usize {
        least_busy(fabric.links, 0..fabric.links.len())
    }
}

/// Prefers the link furthest below its configured target utilization.
///
/// Live utilization trails the target, so the link with the greatest slack
/// absorbs traffic first. Links without a utilization sample yet are
/// skipped; when no link is under target, falls back to least-congested.
pub struct MostUnderTarget {
    targets: Vec<f64>,
}

impl MostUnderTarget {
    pub fn new(targets: Vec<f64>) -> Self {
        Self { targets }
    }
}

impl LoadBalancer for MostUnderTarget {
    fn name(&self) -> &'static str {
        "most_under_target"
    }

    fn select_link(&self, _flow: &Flow, fabric: &FabricView<'_>, _rng: &mut StdRng) -> usize {
        let mut best: Option<(usize, f64)> = None;
        for (idx, target) in self.targets.iter().enumerate() {
            let Some(utilization) = fabric
                .metrics
                .latest(idx, Collector::LinkUtilization.name())
            else {
                continue;
            };
            let gap = target - utilization;
            if gap <= 0.0 {
                continue;
            }
            if best.is_none_or(|(_, best_gap)| gap > best_gap) {
                best = Some((idx, gap));
            }
        }

        match best {
            Some((idx, _)) => idx,
            None => least_busy(fabric.links, 0..fabric.links.len()),
        }
    }
}
