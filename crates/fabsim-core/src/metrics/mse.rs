//! Utilization-error reductions over tracker samples.

use std::collections::HashMap;

use crate::metrics::collector::Collector;
use crate::metrics::tracker::MetricsTracker;

/// Mean squared error between each link's latest sampled utilization and
/// its configured target. Links without a sample yet are excluded; returns
/// 0.0 when no link has one.
pub fn mean_squared_error(tracker: &MetricsTracker, targets: &[f64]) -> f64 {
    let mut sum = 0.0;
    let mut count = 0usize;
    for (idx, target) in targets.iter().enumerate() {
        if let Some(utilization) = tracker.latest(idx, Collector::LinkUtilization.name()) {
            let error = utilization - target;
            sum += error * error;
            count += 1;
        }
    }
    if count == 0 {
        0.0
    } else {
        sum / count as f64
    }
}

/// Squared error per link id; 0.0 for links without a sample.
pub fn per_link_errors(
    tracker: &MetricsTracker,
    ids: &[String],
    targets: &[f64],
) -> HashMap<String, f64> {
    ids.iter()
        .zip(targets)
        .enumerate()
        .map(|(idx, (id, target))| {
            let error = tracker
                .latest(idx, Collector::LinkUtilization.name())
                .map(|utilization| (utilization - target) * (utilization - target))
                .unwrap_or(0.0);
            (id.clone(), error)
        })
        .collect()
}

/// Jain's fairness index over per-link loads: `(Σx)² / (n · Σx²)`.
/// 1.0 for an empty or all-zero load vector.
pub fn jains_fairness(loads: &[f64]) -> f64 {
    if loads.is_empty() {
        return 1.0;
    }
    let sum: f64 = loads.iter().sum();
    let sum_sq: f64 = loads.iter().map(|x| x * x).sum();
    if sum_sq == 0.0 {
        return 1.0;
    }
    (sum * sum) / (loads.len() as f64 * sum_sq)
}
