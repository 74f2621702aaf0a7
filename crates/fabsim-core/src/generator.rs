//! Poisson flow arrival generation.

use rand::Rng;
use rand::RngExt as _;
use tracing::debug;

use crate::dist::FlowSizeDist;
use crate::error::{Result, SimError};
use crate::flow::Flow;

/// Emits a finite, time-ordered sequence of flows with exponential
/// inter-arrival times at rate `λ`.
///
/// The generator keeps its own copy of every emitted flow (`all_flows`) for
/// post-run analysis; the emitted flows themselves are handed to the caller.
#[derive(Debug)]
pub struct PoissonFlowGenerator {
    rate: f64,
    size_dist: FlowSizeDist,
    next_flow_id: u64,
    clock: f64,
    all_flows: Vec<Flow>,
}

impl PoissonFlowGenerator {
    pub fn new(rate: f64, size_dist: FlowSizeDist) -> Result<Self> {
        if rate <= 0.0 {
            return Err(SimError::InvalidParameters(format!(
                "arrival rate must be positive, got {rate}"
            )));
        }
        Ok(Self {
            rate,
            size_dist,
            next_flow_id: 0,
            clock: 0.0,
            all_flows: Vec::new(),
        })
    }

    pub fn rate(&self) -> f64 {
        self.rate
    }

    /// Accumulates inter-arrivals until the next one would land at or past
    /// `end_time`. Ids are monotonic from zero and every emitted arrival
    /// time falls in `[0, end_time)`.
    pub fn generate_until(&mut self, end_time: f64, rng: &mut impl Rng) -> Vec<Flow> {
        let mut flows = Vec::new();
        loop {
            let u: f64 = rng.random();
            self.clock += -(1.0 - u).ln() / self.rate;
            if self.clock >= end_time {
                break;
            }
            let size = self.size_dist.sample(rng);
            let flow = Flow::new(self.next_flow_id, self.clock, size);
            self.next_flow_id += 1;
            self.all_flows.push(flow.clone());
            flows.push(flow);
        }
        debug!(count = flows.len(), end_time, "generated flow arrivals");
        flows
    }

    /// Every flow this generator has ever emitted, in arrival order.
    pub fn all_flows(&self) -> &[Flow] {
        &self.all_flows
    }
}

/// Arrival rate that drives the fabric to `target_utilization` on average:
/// `λ = target × Σ capacity / E[flow size]`.
pub fn dynamic_arrival_rate(
    dist: &FlowSizeDist,
    capacities: &[f64],
    target_utilization: f64,
) -> f64 {
    let total_capacity: f64 = capacities.iter().sum();
    target_utilization * total_capacity / dist.mean()
}
