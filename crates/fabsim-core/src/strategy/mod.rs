//! Load-balancing strategies for assigning arriving flows to links.
//!
//! Every strategy implements the single [`LoadBalancer::select_link`]
//! contract: given the arriving flow and a read-only view of live fabric
//! state, return the index of the chosen link. Construction is table-driven
//! from the config strategy name:
//! - `ecmp` / `wcmp`: stateless random spreading
//! - `least_congested` / `most_under_target`: congestion- and
//!   metrics-aware picks
//! - `percentile_based` / `uneven`: size-aware routing derived from the
//!   flow-size distribution

mod congestion;
mod percentile;
mod random;
mod uneven;

pub use congestion::{LeastCongested, MostUnderTarget};
pub use percentile::PercentileBased;
pub use random::{Ecmp, Wcmp};
pub use uneven::Uneven;

use rand::rngs::StdRng;
use rand::RngExt as _;

use crate::config::SimConfig;
use crate::dist::FlowSizeDist;
use crate::error::{Result, SimError};
use crate::flow::Flow;
use crate::link::Link;
use crate::metrics::MetricsTracker;

/// Read-only view of live fabric state offered to a strategy per decision.
pub struct FabricView<'a> {
    pub links: &'a [Link],
    pub metrics: &'a MetricsTracker,
}

/// Picks an output link for each arriving flow.
///
/// Implementations only read the fabric; the kernel performs the enqueue.
/// `fabric.links` is never empty.
pub trait LoadBalancer {
    fn name(&self) -> &'static str;
    fn select_link(&self, flow: &Flow, fabric: &FabricView<'_>, rng: &mut StdRng) -> usize;
}

/// Builds the strategy named in the config. Strategies that weight by
/// configured target utilizations or precompute from the flow-size
/// distribution validate their inputs here, before the event loop starts.
pub fn build_strategy(
    config: &SimConfig,
    size_dist: &FlowSizeDist,
) -> Result<Box<dyn LoadBalancer>> {
    let targets: Vec<f64> = config
        .links
        .iter()
        .map(|link| link.target_utilization)
        .collect();

    match config.strategy.as_str() {
        "ecmp" => Ok(Box::new(Ecmp)),
        "wcmp" => Ok(Box::new(Wcmp::new(targets)?)),
        "least_congested" => Ok(Box::new(LeastCongested)),
        "most_under_target" => Ok(Box::new(MostUnderTarget::new(targets))),
        "percentile_based" => Ok(Box::new(PercentileBased::new(
            config.links.len(),
            size_dist,
        )?)),
        "uneven" => Ok(Box::new(Uneven::new(config, size_dist)?)),
        other => Err(SimError::UnknownStrategy(other.to_string())),
    }
}

/// First-index argmin of `busy_until` over `candidates`. Callers pass a
/// non-empty candidate set.
pub(crate) fn least_busy<I>(links: &[Link], candidates: I) -> usize
where
    I: IntoIterator<Item = usize>,
{
    let mut best_idx = 0;
    let mut best_busy = f64::INFINITY;
    let mut found = false;
    for idx in candidates {
        let busy = links[idx].busy_until();
        if !found || busy < best_busy {
            best_idx = idx;
            best_busy = busy;
            found = true;
        }
    }
    best_idx
}

/// Weighted random index over non-negative weights with a positive total.
pub(crate) fn weighted_pick(weights: &[f64], rng: &mut StdRng) -> usize {
    let total: f64 = weights.iter().sum();
    let mut mark = rng.random::<f64>() * total;
    for (idx, weight) in weights.iter().enumerate() {
        if mark < *weight {
            return idx;
        }
        mark -= weight;
    }
    weights.len() - 1
}
