//! Queue scheduler: generates demand for each cycle, hands out green phases
//! largest-queue-first, and serves at most one batch per phase so a heavy
//! approach cannot starve the others.

use super::{
    Activation, Approach, CycleReport, Delay, DemandSource, PhaseRecord, ServiceStats,
    ShutdownSignal, SignalController, SignalError,
};
use crate::config::{DemandConfig, TimingConfig};
use crate::output::OutputBackend;
use std::collections::{BTreeMap, VecDeque};
use std::ops::ControlFlow;
use std::time::Duration;

/// Order in which approaches receive the green next.
///
/// Built once per cycle by descending queue length. An approach with demand
/// left after its batch goes to the back; the order is never re-sorted
/// mid-cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServiceOrder {
    order: VecDeque<Approach>,
}

impl ServiceOrder {
    pub fn by_demand(queues: &BTreeMap<Approach, u32>) -> Self {
        let mut ranked: Vec<(Approach, u32)> = queues
            .iter()
            .filter(|(_, len)| **len > 0)
            .map(|(approach, len)| (*approach, *len))
            .collect();

        // Map iteration is ascending by approach and the sort is stable,
        // so equal queues stay in approach order
        ranked.sort_by(|a, b| b.1.cmp(&a.1));

        Self {
            order: ranked.into_iter().map(|(approach, _)| approach).collect(),
        }
    }

    pub fn pop_front(&mut self) -> Option<Approach> {
        self.order.pop_front()
    }

    pub fn push_back(&mut self, approach: Approach) {
        self.order.push_back(approach);
    }

    pub fn iter(&self) -> impl Iterator<Item = Approach> + '_ {
        self.order.iter().copied()
    }

    pub fn to_vec(&self) -> Vec<Approach> {
        self.iter().collect()
    }
}

/// Demand and progress of the cycle currently being served.
#[derive(Debug, Clone)]
pub struct Cycle {
    number: u64,
    initial: BTreeMap<Approach, u32>,
    queues: BTreeMap<Approach, u32>,
    served: BTreeMap<Approach, u32>,
    order: ServiceOrder,
    phases: Vec<PhaseRecord>,
}

impl Cycle {
    pub fn number(&self) -> u64 {
        self.number
    }

    pub fn initial_queues(&self) -> &BTreeMap<Approach, u32> {
        &self.initial
    }

    pub fn queue_len(&self, approach: Approach) -> u32 {
        self.queues.get(&approach).copied().unwrap_or(0)
    }

    pub fn order(&self) -> &ServiceOrder {
        &self.order
    }

    pub fn phases(&self) -> &[PhaseRecord] {
        &self.phases
    }

    pub fn is_complete(&self) -> bool {
        self.queues.values().all(|len| *len == 0)
    }

    fn into_report(self) -> CycleReport {
        CycleReport {
            number: self.number,
            initial_queues: self.initial,
            served: self.served,
            phases: self.phases,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub cycles_completed: u64,
    pub interrupted: bool,
}

pub struct QueueScheduler<O: OutputBackend, D: Delay + Clone, R: DemandSource> {
    controller: SignalController<O, D>,
    demand: R,
    clock: D,
    shutdown: ShutdownSignal,
    min_queue: u32,
    max_queue: u32,
    batch_size: u32,
    service_interval: Duration,
    cycle_pause: Duration,
    cycle: Option<Cycle>,
    cycles_started: u64,
    stats: ServiceStats,
}

impl<O: OutputBackend, D: Delay + Clone, R: DemandSource> QueueScheduler<O, D, R> {
    /// The scheduler shares the controller's clock and shutdown signal.
    pub fn new(
        controller: SignalController<O, D>,
        demand: R,
        timing: &TimingConfig,
        demand_config: &DemandConfig,
    ) -> Self {
        let clock = controller.clock().clone();
        let shutdown = controller.shutdown_signal().clone();

        Self {
            controller,
            demand,
            clock,
            shutdown,
            min_queue: demand_config.min_queue,
            max_queue: demand_config.max_queue,
            batch_size: demand_config.batch_size,
            service_interval: timing.service_interval(),
            cycle_pause: timing.cycle_pause(),
            cycle: None,
            cycles_started: 0,
            stats: ServiceStats::default(),
        }
    }

    /// Draws fresh queues for every approach and orders them for service.
    pub fn start_cycle(&mut self) -> &Cycle {
        self.cycles_started += 1;

        let mut queues = BTreeMap::new();
        for approach in self.controller.approaches() {
            let len = self.demand.uniform_int(self.min_queue, self.max_queue);
            queues.insert(approach, len);
        }
        let order = ServiceOrder::by_demand(&queues);

        let sizes: Vec<String> = queues.iter().map(|(a, len)| format!("{}={}", a, len)).collect();
        log::info!("Starting cycle {} with queues: {}", self.cycles_started, sizes.join(", "));

        self.cycle.insert(Cycle {
            number: self.cycles_started,
            initial: queues.clone(),
            served: queues.keys().map(|a| (*a, 0)).collect(),
            queues,
            order,
            phases: Vec::new(),
        })
    }

    /// Gives the green to the next approach in the service order and serves
    /// one batch. `Continue(None)` means the cycle has no demand left.
    pub fn serve_next_phase(&mut self) -> Result<ControlFlow<(), Option<PhaseRecord>>, SignalError> {
        let Some(cycle) = self.cycle.as_mut() else {
            return Ok(ControlFlow::Continue(None));
        };
        let Some(current) = cycle.order.pop_front() else {
            return Ok(ControlFlow::Continue(None));
        };

        let switched_from = match self.controller.activate(current)? {
            ControlFlow::Break(()) => return Ok(ControlFlow::Break(())),
            ControlFlow::Continue(Activation::Switched { from }) => Some(from),
            ControlFlow::Continue(_) => None,
        };

        let queue = cycle.queues.entry(current).or_default();
        let mut served = 0;
        while served < self.batch_size && *queue > 0 {
            *queue -= 1;
            served += 1;
            *cycle.served.entry(current).or_default() += 1;
            log::info!("  {}: served car #{}", current, served);

            if self.shutdown.is_requested() {
                return Ok(ControlFlow::Break(()));
            }
            self.clock.sleep(self.service_interval);
        }

        let remaining = *queue;
        if remaining > 0 {
            cycle.order.push_back(current);
        }

        let record = PhaseRecord {
            cycle: cycle.number,
            approach: current,
            served,
            remaining,
            switched_from,
        };
        cycle.phases.push(record);
        log::debug!("Phase {} done: served {}, {} waiting, next order {:?}",
                    current, served, remaining, cycle.order.to_vec());

        Ok(ControlFlow::Continue(Some(record)))
    }

    /// Darkens the signals, records the cycle and pauses before the next one.
    pub fn finish_cycle(&mut self) -> Result<ControlFlow<(), Option<CycleReport>>, SignalError> {
        self.controller.clear_all()?;

        let report = self.cycle.take().map(Cycle::into_report);
        if let Some(report) = &report {
            log::info!("=== CYCLE {} COMPLETE: {} vehicles in {} phases ===",
                       report.number, report.total_served(), report.phases.len());
            self.stats.record(report);
        }

        if self.shutdown.is_requested() {
            return Ok(ControlFlow::Break(()));
        }
        self.clock.sleep(self.cycle_pause);

        Ok(ControlFlow::Continue(report))
    }

    pub fn run_cycle(&mut self) -> Result<ControlFlow<(), Option<CycleReport>>, SignalError> {
        self.start_cycle();

        loop {
            match self.serve_next_phase()? {
                ControlFlow::Break(()) => return Ok(ControlFlow::Break(())),
                ControlFlow::Continue(Some(_)) => {}
                ControlFlow::Continue(None) => break,
            }
        }

        self.finish_cycle()
    }

    /// Runs cycles until shutdown is requested or `max_cycles` have completed.
    pub fn run(&mut self, max_cycles: Option<u64>) -> Result<RunSummary, SignalError> {
        let mut cycles_completed = 0;

        loop {
            if max_cycles.is_some_and(|max| cycles_completed >= max) {
                return Ok(RunSummary { cycles_completed, interrupted: false });
            }
            if self.shutdown.is_requested() {
                return Ok(RunSummary { cycles_completed, interrupted: true });
            }

            match self.run_cycle()? {
                ControlFlow::Continue(_) => cycles_completed += 1,
                ControlFlow::Break(()) => {
                    log::info!("Shutdown requested, stopping after {} cycles", cycles_completed);
                    return Ok(RunSummary { cycles_completed, interrupted: true });
                }
            }
        }
    }

    pub fn cycle(&self) -> Option<&Cycle> {
        self.cycle.as_ref()
    }

    pub fn service_order(&self) -> Option<&ServiceOrder> {
        self.cycle.as_ref().map(|c| &c.order)
    }

    pub fn queue_len(&self, approach: Approach) -> u32 {
        self.cycle.as_ref().map(|c| c.queue_len(approach)).unwrap_or(0)
    }

    pub fn stats(&self) -> &ServiceStats {
        &self.stats
    }

    pub fn controller(&self) -> &SignalController<O, D> {
        &self.controller
    }

    pub fn into_controller(self) -> SignalController<O, D> {
        self.controller
    }
}
