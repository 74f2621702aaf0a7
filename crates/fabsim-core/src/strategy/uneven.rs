use rand::rngs::StdRng;

use crate::config::SimConfig;
use crate::dist::FlowSizeDist;
use crate::error::{Result, SimError};
use crate::flow::Flow;
use crate::strategy::{least_busy, weighted_pick, FabricView, LoadBalancer};

/// Buffer-carving: a small subset of the links is reserved to absorb heavy
/// flows.
///
/// The first `⌊N/5⌋` links are buffer links unless the config overrides the
/// count. Flows above the distribution's configured large-flow percentile
/// go to the least-congested buffer link; everything else is spread
/// weighted-random over all links by their configured target utilizations.
pub struct Uneven {
    weights: Vec<f64>,
    buffer_links: Vec<usize>,
    large_flow_threshold: u64,
}

impl Uneven {
    pub fn new(config: &SimConfig, dist: &FlowSizeDist) -> Result<Self> {
        let num_links = config.links.len();
        let weights: Vec<f64> = config
            .links
            .iter()
            .map(|link| link.target_utilization)
            .collect();
        if weights.iter().any(|w| *w <= 0.0) {
            return Err(SimError::InvalidParameters(
                "uneven requires a positive target utilization on every link".into(),
            ));
        }

        let buffer_count = config.buffer_links.unwrap_or(num_links / 5).min(num_links);
        let buffer_links: Vec<usize> = (0..buffer_count).collect();
        let large_flow_threshold = dist.percentile(config.large_flow_percentile)?;

        Ok(Self {
            weights,
            buffer_links,
            large_flow_threshold,
        })
    }

    pub fn buffer_links(&self) -> &[usize] {
        &self.buffer_links
    }

    pub fn large_flow_threshold(&self) -> u64 {
        self.large_flow_threshold
    }
}

impl LoadBalancer for Uneven {
    fn name(&self) -> &'static str {
        "uneven"
    }

    fn select_link(&self, flow: &Flow, fabric: &FabricView<'_>, rng: &mut StdRng) -> usize {
        if flow.flow_size > self.large_flow_threshold {
            if self.buffer_links.is_empty() {
                least_busy(fabric.links, 0..fabric.links.len())
            } else {
                least_busy(fabric.links, self.buffer_links.iter().copied())
            }
        } else {
            weighted_pick(&self.weights, rng)
        }
    }
}
