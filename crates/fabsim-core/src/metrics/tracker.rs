use std::collections::HashMap;

use serde::Serialize;

use crate::error::{Result, SimError};
use crate::link::Link;
use crate::metrics::collector::Collector;

/// One `(time, value)` observation in a named series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MetricSample {
    pub time: f64,
    pub value: f64,
}

/// Samples every registered collector for every registered link on a fixed
/// simulated-time grid.
///
/// Each link carries a `last_sample_time` cursor; a `sample(now)` call
/// collects at every grid point the cursor has fallen behind and then
/// advances it. Sampling only happens on the grid, never at event times, so
/// all links share the same cadence, repeated calls with an equal or
/// smaller `now` are no-ops, and per-series timestamps are strictly
/// increasing.
#[derive(Debug)]
pub struct MetricsTracker {
    sample_interval: f64,
    links: Vec<LinkSeries>,
}

#[derive(Debug)]
struct LinkSeries {
    last_sample_time: f64,
    collectors: Vec<Collector>,
    series: HashMap<&'static str, Vec<MetricSample>>,
}

impl MetricsTracker {
    pub fn new(sample_interval: f64) -> Result<Self> {
        if sample_interval <= 0.0 {
            return Err(SimError::InvalidParameters(format!(
                "sample interval must be positive, got {sample_interval}"
            )));
        }
        Ok(Self {
            sample_interval,
            links: Vec::new(),
        })
    }

    pub fn sample_interval(&self) -> f64 {
        self.sample_interval
    }

    /// Registers the next link; registration order must match the
    /// simulator's link order. Returns the link's tracker index.
    pub fn register_link(&mut self, collectors: &[Collector]) -> usize {
        let mut series = HashMap::with_capacity(collectors.len());
        for collector in collectors {
            series.insert(collector.name(), Vec::new());
        }
        self.links.push(LinkSeries {
            last_sample_time: 0.0,
            collectors: collectors.to_vec(),
            series,
        });
        self.links.len() - 1
    }

    pub fn link_count(&self) -> usize {
        self.links.len()
    }

    /// Advances every link's cursor along the grid up to `now`, collecting
    /// each registered collector at each grid point.
    pub fn sample(&mut self, links: &[Link], now: f64) {
        for (idx, entry) in self.links.iter_mut().enumerate() {
            let Some(link) = links.get(idx) else {
                continue;
            };
            while entry.last_sample_time < now {
                let at = entry.last_sample_time;
                for collector in &entry.collectors {
                    let value = collector.collect(link, at);
                    if let Some(series) = entry.series.get_mut(collector.name()) {
                        series.push(MetricSample { time: at, value });
                    }
                }
                entry.last_sample_time += self.sample_interval;
            }
        }
    }

    /// The recorded series for `(link, metric)`; empty when either is
    /// unknown.
    pub fn samples(&self, link: usize, name: &str) -> &[MetricSample] {
        self.links
            .get(link)
            .and_then(|entry| entry.series.get(name))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Latest sampled value for `(link, metric)`.
    pub fn latest(&self, link: usize, name: &str) -> Option<f64> {
        self.samples(link, name).last().map(|sample| sample.value)
    }
}
