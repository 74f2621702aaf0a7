//! Config surface: serde input structs mirroring the on-disk shape, resolved
//! into a validated runtime configuration.
//!
//! Every semantic violation is reported as [`SimError::InvalidParameters`]
//! (or `UnknownDistribution` for an unrecognized flow-size type) before any
//! simulation component is built.

use serde::Deserialize;

use crate::dist::FlowSizeDist;
use crate::error::{Result, SimError};

pub const DEFAULT_SEED: u64 = 42;
pub const DEFAULT_LARGE_FLOW_PERCENTILE: f64 = 99.0;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SimConfigInput {
    pub simulation: SimulationInput,
    pub network: NetworkInput,
    pub traffic: TrafficInput,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SimulationInput {
    pub duration: Option<f64>,
    pub seed: Option<u64>,
    pub metrics: MetricsInput,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct MetricsInput {
    pub sample_interval: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct NetworkInput {
    pub strategy: Option<String>,
    pub links: Vec<LinkInput>,
    /// How many leading links the `uneven` strategy reserves as buffers.
    pub buffer_links: Option<usize>,
    pub large_flow_percentile: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LinkInput {
    pub id: Option<String>,
    pub capacity: Option<f64>,
    pub time_window_duration: Option<f64>,
    pub target_utilization: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TrafficInput {
    pub flow_arrival: FlowArrivalInput,
    pub flow_size: FlowSizeInput,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct FlowArrivalInput {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub rate: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct FlowSizeInput {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub params: FlowSizeParamsInput,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct FlowSizeParamsInput {
    pub lower: Option<f64>,
    pub upper: Option<f64>,
    pub alpha: Option<f64>,
    pub min: Option<u64>,
    pub max: Option<u64>,
    pub size: Option<u64>,
}

/// Validated runtime configuration consumed by the simulator.
#[derive(Debug, Clone)]
pub struct SimConfig {
    pub duration: f64,
    pub seed: u64,
    pub sample_interval: f64,
    pub strategy: String,
    pub links: Vec<LinkConfig>,
    pub buffer_links: Option<usize>,
    pub large_flow_percentile: f64,
    pub arrival_rate: f64,
    pub flow_size: FlowSizeDist,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LinkConfig {
    pub id: String,
    pub capacity: f64,
    pub time_window_duration: f64,
    pub target_utilization: f64,
}

impl SimConfigInput {
    pub fn resolve(self) -> Result<SimConfig> {
        let duration = require(self.simulation.duration, "simulation.duration")?;
        if duration <= 0.0 {
            return invalid("simulation.duration must be positive");
        }
        let sample_interval = require(
            self.simulation.metrics.sample_interval,
            "simulation.metrics.sample_interval",
        )?;
        if sample_interval <= 0.0 {
            return invalid("simulation.metrics.sample_interval must be positive");
        }
        let seed = self.simulation.seed.unwrap_or(DEFAULT_SEED);

        let strategy = require(self.network.strategy, "network.strategy")?;
        if self.network.links.is_empty() {
            return invalid("network.links must not be empty");
        }
        let mut links = Vec::with_capacity(self.network.links.len());
        for (idx, link) in self.network.links.into_iter().enumerate() {
            let id = link.id.unwrap_or_else(|| format!("link-{idx}"));
            let capacity = require(link.capacity, "network.links.capacity")?;
            if capacity <= 0.0 {
                return invalid(&format!("link {id}: capacity must be positive"));
            }
            let time_window_duration = require(
                link.time_window_duration,
                "network.links.time_window_duration",
            )?;
            if time_window_duration <= 0.0 {
                return invalid(&format!("link {id}: time_window_duration must be positive"));
            }
            let target_utilization = require(
                link.target_utilization,
                "network.links.target_utilization",
            )?;
            if !(0.0..=1.0).contains(&target_utilization) {
                return invalid(&format!("link {id}: target_utilization must be in [0, 1]"));
            }
            links.push(LinkConfig {
                id,
                capacity,
                time_window_duration,
                target_utilization,
            });
        }

        let large_flow_percentile = self
            .network
            .large_flow_percentile
            .unwrap_or(DEFAULT_LARGE_FLOW_PERCENTILE);
        if large_flow_percentile <= 0.0 || large_flow_percentile > 100.0 {
            return invalid("network.large_flow_percentile must be in (0, 100]");
        }

        let arrival_kind = self
            .traffic
            .flow_arrival
            .kind
            .unwrap_or_else(|| "poisson".to_string());
        if arrival_kind != "poisson" {
            return invalid(&format!(
                "unsupported flow_arrival type: {arrival_kind}"
            ));
        }
        let arrival_rate = require(self.traffic.flow_arrival.rate, "traffic.flow_arrival.rate")?;
        if arrival_rate <= 0.0 {
            return invalid("traffic.flow_arrival.rate must be positive");
        }

        let flow_size = resolve_flow_size(self.traffic.flow_size)?;

        Ok(SimConfig {
            duration,
            seed,
            sample_interval,
            strategy,
            links,
            buffer_links: self.network.buffer_links,
            large_flow_percentile,
            arrival_rate,
            flow_size,
        })
    }
}

fn resolve_flow_size(input: FlowSizeInput) -> Result<FlowSizeDist> {
    let kind = require(input.kind, "traffic.flow_size.type")?;
    let params = input.params;
    match kind.as_str() {
        "bounded_pareto" => FlowSizeDist::bounded_pareto(
            require(params.lower, "traffic.flow_size.params.lower")?,
            require(params.upper, "traffic.flow_size.params.upper")?,
            require(params.alpha, "traffic.flow_size.params.alpha")?,
        ),
        "uniform" => FlowSizeDist::uniform(
            require(params.min, "traffic.flow_size.params.min")?,
            require(params.max, "traffic.flow_size.params.max")?,
        ),
        "constant" => FlowSizeDist::constant(require(params.size, "traffic.flow_size.params.size")?),
        other => Err(SimError::UnknownDistribution(other.to_string())),
    }
}

fn require<T>(value: Option<T>, field: &str) -> Result<T> {
    value.ok_or_else(|| SimError::InvalidParameters(format!("{field} is required")))
}

fn invalid<T>(message: &str) -> Result<T> {
    Err(SimError::InvalidParameters(message.to_string()))
}

impl SimConfig {
    pub fn from_toml_str(input: &str) -> Result<Self> {
        let parsed: SimConfigInput = toml::from_str(input)
            .map_err(|e| SimError::InvalidParameters(format!("invalid config TOML: {e}")))?;
        parsed.resolve()
    }
}

/// A minimal valid config with `n` identical links, for tests.
#[cfg(test)]
pub(crate) fn test_config(n: usize) -> SimConfig {
    SimConfig {
        duration: 1.0,
        seed: DEFAULT_SEED,
        sample_interval: 0.1,
        strategy: "ecmp".into(),
        links: (0..n)
            .map(|i| LinkConfig {
                id: format!("link-{i}"),
                capacity: 1_000_000.0,
                time_window_duration: 1.0,
                target_utilization: 0.5,
            })
            .collect(),
        buffer_links: None,
        large_flow_percentile: DEFAULT_LARGE_FLOW_PERCENTILE,
        arrival_rate: 100.0,
        flow_size: FlowSizeDist::Constant { size: 1000 },
    }
}
