use serde::Serialize;

/// A unit of work requiring exclusive use of one link for
/// `flow_size / capacity` seconds.
///
/// `start_time` and `end_time` stay at zero until the flow is scheduled by
/// [`crate::link::Link::enqueue`], which writes them exactly once.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Flow {
    /// Unique id, assigned in arrival order.
    pub id: u64,
    pub arrival_time: f64,
    /// Flow size in bits.
    pub flow_size: u64,
    pub start_time: f64,
    pub end_time: f64,
}

impl Flow {
    pub fn new(id: u64, arrival_time: f64, flow_size: u64) -> Self {
        Self {
            id,
            arrival_time,
            flow_size,
            start_time: 0.0,
            end_time: 0.0,
        }
    }

    /// Time between arrival and transmission completion. Meaningful only
    /// once the flow has been scheduled.
    pub fn completion_time(&self) -> f64 {
        self.end_time - self.arrival_time
    }
}
