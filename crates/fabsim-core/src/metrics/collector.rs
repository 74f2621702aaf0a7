use crate::error::{Result, SimError};
use crate::link::Link;

/// Pure reductions over link state, identified by a stable name.
///
/// Collectors never mutate the link; the tracker evaluates them at grid
/// timestamps that may lag the live simulation clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Collector {
    /// Fraction of `[0, now]` the link spent transmitting.
    LinkUtilization,
    /// Bits still queued or in transit at `now`.
    BufferOccupancy,
    /// Mean arrival-to-completion time over scheduled flows.
    FlowCompletionTime,
    /// Utilization over the link's trailing time window.
    WindowedUtilization,
}

impl Collector {
    pub const ALL: [Collector; 4] = [
        Collector::LinkUtilization,
        Collector::BufferOccupancy,
        Collector::FlowCompletionTime,
        Collector::WindowedUtilization,
    ];

    pub fn from_name(name: &str) -> Result<Self> {
        match name {
            "link_utilization" => Ok(Self::LinkUtilization),
            "buffer_occupancy" => Ok(Self::BufferOccupancy),
            "flow_completion_time" => Ok(Self::FlowCompletionTime),
            "windowed_utilization" => Ok(Self::WindowedUtilization),
            other => Err(SimError::UnknownMetric(other.to_string())),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::LinkUtilization => "link_utilization",
            Self::BufferOccupancy => "buffer_occupancy",
            Self::FlowCompletionTime => "flow_completion_time",
            Self::WindowedUtilization => "windowed_utilization",
        }
    }

    pub fn collect(self, link: &Link, now: f64) -> f64 {
        match self {
            Self::LinkUtilization => utilization_between(link, 0.0, now),
            Self::BufferOccupancy => buffer_occupancy(link, now),
            Self::FlowCompletionTime => flow_completion_time(link),
            Self::WindowedUtilization => {
                utilization_between(link, (now - link.time_window()).max(0.0), now)
            }
        }
    }
}

/// Busy fraction of `[start, now]`: summed transmission overlap divided by
/// the window length. FIFO scheduling keeps the intervals disjoint, so the
/// result lies in `[0, 1]`.
fn utilization_between(link: &Link, start: f64, now: f64) -> f64 {
    if start >= now {
        return 0.0;
    }
    let busy: f64 = link
        .flows()
        .iter()
        .filter(|f| f.end_time > start && f.start_time < now)
        .map(|f| f.end_time.min(now) - f.start_time.max(start))
        .sum();
    busy / (now - start)
}

fn buffer_occupancy(link: &Link, now: f64) -> f64 {
    link.queued_flows()
        .filter(|f| f.end_time > now)
        .map(|f| link.remaining_size(f, now))
        .sum()
}

fn flow_completion_time(link: &Link) -> f64 {
    let mut sum = 0.0;
    let mut count = 0u64;
    for flow in link.flows().iter().filter(|f| f.end_time > 0.0) {
        sum += flow.completion_time();
        count += 1;
    }
    if count == 0 {
        0.0
    } else {
        sum / count as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flow::Flow;

    fn loaded_link() -> Link {
        // 1000 bps link, two back-to-back 500-bit flows: busy over [0, 1].
        let mut link = Link::new("l0", 1000.0, 0.5);
        link.enqueue(Flow::new(0, 0.0, 500), 0.0);
        link.enqueue(Flow::new(1, 0.0, 500), 0.0);
        link
    }

    // ─── Registry ───────────────────────────────────────────────────────

    #[test]
    fn from_name_resolves_every_collector() {
        for collector in Collector::ALL {
            assert_eq!(Collector::from_name(collector.name()).unwrap(), collector);
        }
    }

    #[test]
    fn from_name_rejects_unknown_metric() {
        assert!(matches!(
            Collector::from_name("packet_jitter"),
            Err(SimError::UnknownMetric(_))
        ));
    }

    // ─── Utilization ────────────────────────────────────────────────────

    #[test]
    fn utilization_is_zero_at_time_zero() {
        let link = loaded_link();
        assert_eq!(Collector::LinkUtilization.collect(&link, 0.0), 0.0);
    }

    #[test]
    fn utilization_over_busy_interval_is_one() {
        let link = loaded_link();
        let u = Collector::LinkUtilization.collect(&link, 1.0);
        assert!((u - 1.0).abs() < 1e-9);
    }

    #[test]
    fn utilization_dilutes_after_transmissions_end() {
        let link = loaded_link();
        let u = Collector::LinkUtilization.collect(&link, 2.0);
        assert!((u - 0.5).abs() < 1e-9);
    }

    #[test]
    fn utilization_stays_within_unit_interval() {
        let link = loaded_link();
        for step in 1..=40 {
            let now = step as f64 * 0.1;
            let u = Collector::LinkUtilization.collect(&link, now);
            assert!((0.0..=1.0).contains(&u), "utilization {u} at {now}");
        }
    }

    #[test]
    fn windowed_utilization_forgets_old_traffic() {
        let link = loaded_link(); // window = 0.5s
        let recent = Collector::WindowedUtilization.collect(&link, 1.0);
        assert!((recent - 1.0).abs() < 1e-9);
        let later = Collector::WindowedUtilization.collect(&link, 2.0);
        assert_eq!(later, 0.0);
    }

    // ─── Buffer occupancy ───────────────────────────────────────────────

    #[test]
    fn buffer_occupancy_counts_remaining_bits() {
        let link = loaded_link();
        // At t=0.25 the first flow is half done, the second untouched.
        let bits = Collector::BufferOccupancy.collect(&link, 0.25);
        assert!((bits - 750.0).abs() < 1e-9);
    }

    #[test]
    fn buffer_occupancy_empty_when_drained() {
        let link = loaded_link();
        assert_eq!(Collector::BufferOccupancy.collect(&link, 1.5), 0.0);
    }

    // ─── Flow completion time ───────────────────────────────────────────

    #[test]
    fn completion_time_averages_scheduled_flows() {
        let link = loaded_link();
        // Flow 0: 0.5 - 0.0, flow 1: 1.0 - 0.0 → mean 0.75.
        let fct = Collector::FlowCompletionTime.collect(&link, 1.0);
        assert!((fct - 0.75).abs() < 1e-9);
    }

    #[test]
    fn completion_time_zero_without_flows() {
        let link = Link::new("idle", 1000.0, 1.0);
        assert_eq!(Collector::FlowCompletionTime.collect(&link, 5.0), 0.0);
    }
}
