//! The event-driven simulation kernel.

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::config::SimConfig;
use crate::error::Result;
use crate::event::{Event, EventQueue};
use crate::generator::PoissonFlowGenerator;
use crate::link::Link;
use crate::metrics::collector::Collector;
use crate::metrics::mse::{jains_fairness, mean_squared_error, per_link_errors};
use crate::metrics::tracker::{MetricSample, MetricsTracker};
use crate::strategy::{build_strategy, FabricView, LoadBalancer};

/// Priority-ordered event loop coordinating flow arrivals and completions.
///
/// The simulator is the sole owner of the event queue, the links, the
/// metrics tracker, the flow generator, and the seeded RNG. Strategies only
/// ever see borrowed views of that state, which keeps ownership acyclic.
pub struct Simulator {
    config: SimConfig,
    targets: Vec<f64>,
    links: Vec<Link>,
    tracker: MetricsTracker,
    strategy: Box<dyn LoadBalancer>,
    generator: PoissonFlowGenerator,
    rng: StdRng,
    events: EventQueue,
    time: f64,
    mse_series: Vec<MetricSample>,
    flows_completed: u64,
    precondition_failures: u64,
}

impl Simulator {
    /// Builds every component from a validated config. All parameter errors
    /// surface here, before the event loop starts.
    pub fn from_config(config: SimConfig) -> Result<Self> {
        let generator = PoissonFlowGenerator::new(config.arrival_rate, config.flow_size.clone())?;
        let strategy = build_strategy(&config, &config.flow_size)?;
        let mut tracker = MetricsTracker::new(config.sample_interval)?;

        let links: Vec<Link> = config
            .links
            .iter()
            .map(|link| Link::new(link.id.clone(), link.capacity, link.time_window_duration))
            .collect();
        for _ in &links {
            tracker.register_link(&Collector::ALL);
        }
        let targets = config
            .links
            .iter()
            .map(|link| link.target_utilization)
            .collect();

        let rng = StdRng::seed_from_u64(config.seed);

        Ok(Self {
            config,
            targets,
            links,
            tracker,
            strategy,
            generator,
            rng,
            events: EventQueue::new(),
            time: 0.0,
            mse_series: Vec::new(),
            flows_completed: 0,
            precondition_failures: 0,
        })
    }

    /// Runs the simulation to completion and returns the summary report.
    ///
    /// Arrivals are pre-generated in one pass (they do not depend on
    /// simulator state), then the loop pops events in `(time, seq)` order.
    /// The tracker is sampled before each dispatch so strategies observe
    /// utilization as of the grid point at or before `now`; one MSE sample
    /// is recorded per dispatched event.
    pub fn run(&mut self) -> SimReport {
        let flows = self
            .generator
            .generate_until(self.config.duration, &mut self.rng);
        let flows_generated = flows.len() as u64;
        info!(
            strategy = self.strategy.name(),
            links = self.links.len(),
            flows = flows_generated,
            duration = self.config.duration,
            seed = self.config.seed,
            "starting simulation"
        );
        for flow in flows {
            self.events.push(flow.arrival_time, Event::FlowArrival { flow });
        }

        while let Some((time, event)) = self.events.pop() {
            if time < self.time {
                // Still processed: the heap ordering makes this unreachable
                // unless an event was constructed with a stale timestamp.
                self.precondition_failures += 1;
                error!(
                    event_time = time,
                    now = self.time,
                    "event timestamp regressed behind the simulation clock"
                );
            }
            self.time = time;
            self.tracker.sample(&self.links, self.time);
            self.dispatch(event);

            let mse = mean_squared_error(&self.tracker, &self.targets);
            self.mse_series.push(MetricSample {
                time: self.time,
                value: mse,
            });
        }

        // Final grid catch-up so the series reflect the end state.
        self.tracker.sample(&self.links, self.time);

        let report = self.report(flows_generated);
        info!(
            completed = report.flows_completed,
            final_mse = report.final_mse,
            fairness = report.fairness,
            "simulation finished"
        );
        report
    }

    fn dispatch(&mut self, event: Event) {
        match event {
            Event::FlowArrival { flow } => {
                let view = FabricView {
                    links: &self.links,
                    metrics: &self.tracker,
                };
                let idx = self.strategy.select_link(&flow, &view, &mut self.rng);
                debug!(flow = flow.id, link = idx, size = flow.flow_size, "flow assigned");

                let flow_id = flow.id;
                let end_time = self.links[idx].enqueue(flow, self.time);
                self.events.push(
                    end_time,
                    Event::FlowCompletion {
                        link: idx,
                        flow_id,
                    },
                );
            }
            Event::FlowCompletion { link, flow_id } => {
                match self.links[link].dequeue(self.time) {
                    Some(flow) => {
                        if flow.id != flow_id {
                            warn!(
                                expected = flow_id,
                                dequeued = flow.id,
                                link,
                                "completion order mismatch"
                            );
                        }
                        self.flows_completed += 1;
                    }
                    None => warn!(link, flow_id, "completion event found no finished flow"),
                }
            }
        }
    }

    fn report(&self, flows_generated: u64) -> SimReport {
        let ids: Vec<String> = self.config.links.iter().map(|l| l.id.clone()).collect();
        let errors = per_link_errors(&self.tracker, &ids, &self.targets);
        let total_bits: u64 = self.links.iter().map(Link::admitted_bits).sum();
        let loads: Vec<f64> = self
            .links
            .iter()
            .map(|link| link.admitted_bits() as f64)
            .collect();

        let links = self
            .links
            .iter()
            .zip(&self.config.links)
            .enumerate()
            .map(|(idx, (link, cfg))| LinkReport {
                id: cfg.id.clone(),
                capacity_bps: cfg.capacity,
                target_utilization: cfg.target_utilization,
                flows_admitted: link.flows().len() as u64,
                bits_admitted: link.admitted_bits(),
                load_share: if total_bits == 0 {
                    0.0
                } else {
                    link.admitted_bits() as f64 / total_bits as f64
                },
                utilization: self
                    .tracker
                    .latest(idx, Collector::LinkUtilization.name())
                    .unwrap_or(0.0),
                squared_error: errors.get(&cfg.id).copied().unwrap_or(0.0),
            })
            .collect();

        SimReport {
            strategy: self.strategy.name().to_string(),
            duration: self.config.duration,
            seed: self.config.seed,
            flows_generated,
            flows_completed: self.flows_completed,
            final_time: self.time,
            final_mse: mean_squared_error(&self.tracker, &self.targets),
            fairness: jains_fairness(&loads),
            precondition_failures: self.precondition_failures,
            links,
        }
    }

    pub fn links(&self) -> &[Link] {
        &self.links
    }

    pub fn tracker(&self) -> &MetricsTracker {
        &self.tracker
    }

    pub fn mse_series(&self) -> &[MetricSample] {
        &self.mse_series
    }

    /// Every flow the generator emitted, in arrival order.
    pub fn all_flows(&self) -> &[crate::flow::Flow] {
        self.generator.all_flows()
    }

    pub fn current_time(&self) -> f64 {
        self.time
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }
}

/// Post-run summary, serializable for the CLI report output.
#[derive(Debug, Clone, Serialize)]
pub struct SimReport {
    pub strategy: String,
    pub duration: f64,
    pub seed: u64,
    pub flows_generated: u64,
    pub flows_completed: u64,
    pub final_time: f64,
    pub final_mse: f64,
    /// Jain's fairness index over per-link bit loads.
    pub fairness: f64,
    pub precondition_failures: u64,
    pub links: Vec<LinkReport>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LinkReport {
    pub id: String,
    pub capacity_bps: f64,
    pub target_utilization: f64,
    pub flows_admitted: u64,
    pub bits_admitted: u64,
    /// This link's fraction of all admitted bits.
    pub load_share: f64,
    /// Latest sampled utilization, 0.0 when no sample exists.
    pub utilization: f64,
    pub squared_error: f64,
}
