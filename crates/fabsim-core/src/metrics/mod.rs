//! Metrics pipeline: pure per-link collectors, the grid-sampling tracker,
//! and the utilization-error reductions derived from its samples.

pub mod collector;
pub mod mse;
pub mod tracker;

pub use collector::Collector;
pub use tracker::{MetricSample, MetricsTracker};
