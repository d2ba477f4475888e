//! Aggregations over stored extractions.

use chrono::{DateTime, Duration, Utc};

use buckled_core::tally::top_by_count;
use buckled_core::ExtractedServiceData;

use crate::types::{QuickStats, ServiceCount, ServiceStats, ShopCount};

/// Totals, average cost and the five most common services and shops.
pub fn service_stats(records: &[ExtractedServiceData]) -> ServiceStats {
    let costs: Vec<f64> = records.iter().filter_map(|r| r.cost()).collect();
    let total_spent: f64 = costs.iter().sum();
    let average_service_cost = if costs.is_empty() {
        0.0
    } else {
        total_spent / costs.len() as f64
    };

    let top_services = top_by_count(
        records.iter().map(|r| r.service_info.primary_service.as_str()),
        5,
    )
    .into_iter()
    .map(|(service, count)| ServiceCount { service, count })
    .collect();

    let top_shops = top_by_count(
        records.iter().filter_map(|r| r.shop_info.name.as_deref()),
        5,
    )
    .into_iter()
    .map(|(shop, count)| ShopCount { shop, count })
    .collect();

    ServiceStats {
        total_services: records.len(),
        total_spent,
        average_service_cost,
        top_services,
        top_shops,
    }
}

/// Counters for the last 30 days relative to `now`.
pub fn quick_stats(
    records: &[ExtractedServiceData],
    active_vehicles: usize,
    now: DateTime<Utc>,
) -> QuickStats {
    let cutoff = now - Duration::days(30);
    QuickStats {
        total_services: records.len(),
        recent_services: records.iter().filter(|r| r.timestamp >= cutoff).count(),
        vehicles: active_vehicles,
        pending_actions: records.iter().filter(|r| r.needs_attention()).count(),
        last_service_date: records.iter().map(|r| r.timestamp).max(),
    }
}
