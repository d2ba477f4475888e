//! Fixed maintenance intervals and rough cost estimates.

use chrono::{DateTime, Utc};

use buckled_core::{CostRange, DueTrigger, MaintenanceItem, Priority};

pub struct ScheduleSeed {
    pub service: &'static str,
    /// Miles between services.
    pub interval: u32,
    pub priority: Priority,
}

/// Schedule given to every newly created vehicle profile.
pub const SEED_SCHEDULE: &[ScheduleSeed] = &[
    ScheduleSeed { service: "Oil Change", interval: 5000, priority: Priority::Medium },
    ScheduleSeed { service: "Tire Rotation", interval: 7500, priority: Priority::Low },
    ScheduleSeed { service: "Air Filter", interval: 15000, priority: Priority::Low },
    ScheduleSeed { service: "Brake Inspection", interval: 20000, priority: Priority::Medium },
    ScheduleSeed { service: "Transmission Service", interval: 50000, priority: Priority::High },
];

/// Matched by substring against the lower-cased service name, first hit wins.
const COST_TABLE: &[(&str, CostRange)] = &[
    ("oil change", CostRange::new(30.0, 80.0)),
    ("brake", CostRange::new(150.0, 400.0)),
    ("tire", CostRange::new(100.0, 300.0)),
    ("battery", CostRange::new(100.0, 200.0)),
    ("transmission", CostRange::new(200.0, 800.0)),
    ("engine", CostRange::new(300.0, 1500.0)),
    ("air filter", CostRange::new(20.0, 60.0)),
    ("alignment", CostRange::new(80.0, 150.0)),
];

const DEFAULT_COST: CostRange = CostRange::new(50.0, 300.0);

pub fn estimate_cost(service: &str) -> CostRange {
    let lower = service.to_lowercase();
    COST_TABLE
        .iter()
        .find(|(key, _)| lower.contains(key))
        .map(|(_, cost)| *cost)
        .unwrap_or(DEFAULT_COST)
}

/// Interval of a seeded schedule item, by exact (case-insensitive) name.
pub fn seed_interval(service: &str) -> Option<u32> {
    SEED_SCHEDULE
        .iter()
        .find(|s| s.service.eq_ignore_ascii_case(service.trim()))
        .map(|s| s.interval)
}

/// The initial schedule relative to `mileage` (0 when unknown). An item whose
/// name equals the primary service is marked performed at `performed_at`.
pub fn seed_schedule(
    mileage: Option<u32>,
    primary_service: &str,
    performed_at: DateTime<Utc>,
) -> Vec<MaintenanceItem> {
    let base = mileage.unwrap_or(0);
    SEED_SCHEDULE
        .iter()
        .map(|seed| MaintenanceItem {
            service: seed.service.to_string(),
            due_at: DueTrigger::Mileage,
            due_mileage: Some(base.saturating_add(seed.interval)),
            due_date: None,
            priority: seed.priority,
            estimated_cost: Some(estimate_cost(seed.service)),
            last_performed: (seed.service == primary_service).then_some(performed_at),
        })
        .collect()
}
