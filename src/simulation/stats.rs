use super::Approach;
use std::collections::{BTreeMap, VecDeque};

/// One green phase as it was served.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhaseRecord {
    pub cycle: u64,
    pub approach: Approach,
    pub served: u32,
    pub remaining: u32,
    /// Set when the phase began with a yellow dwell on this approach.
    pub switched_from: Option<Approach>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleReport {
    pub number: u64,
    pub initial_queues: BTreeMap<Approach, u32>,
    pub served: BTreeMap<Approach, u32>,
    pub phases: Vec<PhaseRecord>,
}

impl CycleReport {
    pub fn yellow_transitions(&self) -> usize {
        self.phases.iter().filter(|p| p.switched_from.is_some()).count()
    }

    pub fn phase_order(&self) -> Vec<Approach> {
        self.phases.iter().map(|p| p.approach).collect()
    }

    pub fn total_served(&self) -> u32 {
        self.served.values().sum()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ApproachTotals {
    pub vehicles: u64,
    pub phases: u64,
}

/// Running totals across cycles plus a bounded window of recent reports.
#[derive(Debug, Clone)]
pub struct ServiceStats {
    cycles: u64,
    yellow_transitions: u64,
    totals: BTreeMap<Approach, ApproachTotals>,
    recent: VecDeque<CycleReport>,
    max_recent: usize,
}

impl ServiceStats {
    pub fn new(max_recent: usize) -> Self {
        Self {
            cycles: 0,
            yellow_transitions: 0,
            totals: BTreeMap::new(),
            recent: VecDeque::with_capacity(max_recent),
            max_recent,
        }
    }

    pub fn record(&mut self, report: &CycleReport) {
        self.cycles += 1;
        self.yellow_transitions += report.yellow_transitions() as u64;

        for phase in &report.phases {
            let totals = self.totals.entry(phase.approach).or_default();
            totals.vehicles += u64::from(phase.served);
            totals.phases += 1;
        }

        if self.max_recent == 0 {
            return;
        }
        if self.recent.len() >= self.max_recent {
            self.recent.pop_front();
        }
        self.recent.push_back(report.clone());
    }

    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    pub fn yellow_transitions(&self) -> u64 {
        self.yellow_transitions
    }

    pub fn totals(&self, approach: Approach) -> ApproachTotals {
        self.totals.get(&approach).copied().unwrap_or_default()
    }

    pub fn vehicles_served(&self) -> u64 {
        self.totals.values().map(|t| t.vehicles).sum()
    }

    pub fn average_phases_per_cycle(&self) -> f64 {
        if self.cycles == 0 {
            return 0.0;
        }
        let phases: u64 = self.totals.values().map(|t| t.phases).sum();
        phases as f64 / self.cycles as f64
    }

    pub fn recent(&self) -> impl Iterator<Item = &CycleReport> {
        self.recent.iter()
    }

    pub fn last(&self) -> Option<&CycleReport> {
        self.recent.back()
    }
}

impl Default for ServiceStats {
    fn default() -> Self {
        Self::new(16)
    }
}
