use std::collections::VecDeque;

use crate::flow::Flow;

/// A single output channel with fixed capacity, serving flows FIFO without
/// preemption.
///
/// `busy_until` is the scheduled end time of the most recently enqueued
/// flow; it collapses the FIFO into an O(1) scheduling decision. The full
/// `flows` history is kept because the metrics collectors integrate over
/// closed transmission intervals.
#[derive(Debug)]
pub struct Link {
    id: String,
    capacity_bps: f64,
    time_window: f64,
    /// Indices into `flows` for entries still waiting or in transit.
    queue: VecDeque<usize>,
    busy_until: f64,
    /// Append-only history of every admitted flow, in assignment order.
    flows: Vec<Flow>,
}

impl Link {
    pub fn new(id: impl Into<String>, capacity_bps: f64, time_window: f64) -> Self {
        Self {
            id: id.into(),
            capacity_bps,
            time_window,
            queue: VecDeque::new(),
            busy_until: 0.0,
            flows: Vec::new(),
        }
    }

    /// Schedules `flow` for transmission and returns its end time.
    ///
    /// If the link is idle the flow starts at `now`, otherwise it starts at
    /// the current busy horizon. No preemption: `busy_until` and per-flow
    /// end times are non-decreasing in enqueue order.
    pub fn enqueue(&mut self, mut flow: Flow, now: f64) -> f64 {
        let transmission_time = flow.flow_size as f64 / self.capacity_bps;

        if self.queue.is_empty() && now >= self.busy_until {
            flow.start_time = now;
        } else {
            flow.start_time = self.busy_until;
        }
        flow.end_time = flow.start_time + transmission_time;
        self.busy_until = flow.end_time;

        self.queue.push_back(self.flows.len());
        self.flows.push(flow);
        self.busy_until
    }

    /// Removes and returns the head of the queue if its transmission has
    /// completed by `now`. An empty queue or an unfinished head returns
    /// `None`; neither is an error.
    pub fn dequeue(&mut self, now: f64) -> Option<&Flow> {
        let head = *self.queue.front()?;
        if self.flows[head].end_time <= now {
            self.queue.pop_front();
            Some(&self.flows[head])
        } else {
            None
        }
    }

    /// Bits of `flow` not yet transmitted at `now`.
    pub fn remaining_size(&self, flow: &Flow, now: f64) -> f64 {
        if flow.start_time >= now {
            flow.flow_size as f64
        } else {
            flow.flow_size as f64 - (now - flow.start_time) * self.capacity_bps
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn capacity_bps(&self) -> f64 {
        self.capacity_bps
    }

    /// Width of the sliding window used by the windowed-utilization metric.
    pub fn time_window(&self) -> f64 {
        self.time_window
    }

    pub fn busy_until(&self) -> f64 {
        self.busy_until
    }

    /// Every flow ever admitted, in assignment order.
    pub fn flows(&self) -> &[Flow] {
        &self.flows
    }

    /// Flows still waiting or in transit, in FIFO order.
    pub fn queued_flows(&self) -> impl Iterator<Item = &Flow> {
        self.queue.iter().map(|&idx| &self.flows[idx])
    }

    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    /// Total bits admitted onto this link.
    pub fn admitted_bits(&self) -> u64 {
        self.flows.iter().map(|f| f.flow_size).sum()
    }
}
