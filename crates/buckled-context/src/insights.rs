//! Per-vehicle insights: upcoming services, spending, habits and alerts.

use std::collections::HashSet;

use chrono::{DateTime, Datelike, Utc};

use buckled_core::tally::top_values;
use buckled_core::{
    Alert, AlertKind, AlertSeverity, CategoryCost, CostTrends, DueTrigger, ExtractedServiceData,
    Patterns, SeasonalPattern, ServiceRecommendation, SmartInsights, UrgencyLevel, VehicleProfile,
};

use crate::catalog::estimate_cost;

const UPCOMING_MILES: i64 = 2000;
const UPCOMING_DAYS: i64 = 30;
const EXPENSIVE_SERVICE: f64 = 200.0;

/// Build insights for `profile` from the extractions that belong to it.
pub fn build_insights(
    profile: &VehicleProfile,
    vehicle_data: &[ExtractedServiceData],
    now: DateTime<Utc>,
) -> SmartInsights {
    SmartInsights {
        vehicle_id: profile.id.clone(),
        generated_at: now,
        upcoming_services: upcoming_services(profile, now),
        cost_trends: cost_trends(vehicle_data),
        patterns: patterns(vehicle_data),
        alerts: alerts(profile, vehicle_data),
    }
}

/// Schedule items within 2000 miles or 30 days, highest priority first.
pub fn upcoming_services(profile: &VehicleProfile, now: DateTime<Utc>) -> Vec<ServiceRecommendation> {
    let current = profile.specifications.mileage.unwrap_or(0) as i64;

    let mut upcoming: Vec<ServiceRecommendation> = profile
        .maintenance_schedule
        .iter()
        .filter_map(|item| {
            let reason = match item.due_at {
                DueTrigger::Mileage => {
                    let until = item.due_mileage? as i64 - current;
                    if until > UPCOMING_MILES {
                        return None;
                    }
                    due_reason(until, "miles")
                }
                DueTrigger::Time => {
                    let due = item.due_date?;
                    let secs = (due - now).num_seconds();
                    // whole days, rounded up
                    let days = secs.div_euclid(86_400) + i64::from(secs.rem_euclid(86_400) > 0);
                    if days > UPCOMING_DAYS {
                        return None;
                    }
                    due_reason(days, "days")
                }
                DueTrigger::Condition => return None,
            };
            Some(ServiceRecommendation {
                service: item.service.clone(),
                reason,
                urgency: UrgencyLevel::from(item.priority),
                estimated_cost: item.estimated_cost.unwrap_or_else(|| estimate_cost(&item.service)),
                due_by: item.due_date,
                due_mileage: item.due_mileage,
                confidence: 90,
                sources: vec!["Maintenance schedule".into()],
            })
        })
        .collect();

    upcoming.sort_by(|a, b| b.urgency.rank().cmp(&a.urgency.rank()));
    upcoming
}

fn due_reason(remaining: i64, unit: &str) -> String {
    if remaining <= 0 {
        "Overdue".into()
    } else {
        format!("Due in {} {}", remaining, unit)
    }
}

pub fn cost_trends(vehicle_data: &[ExtractedServiceData]) -> CostTrends {
    let costs: Vec<(f64, &str)> = vehicle_data
        .iter()
        .filter_map(|d| d.cost().map(|c| (c, d.service_info.category.as_str())))
        .collect();
    let total: f64 = costs.iter().map(|(c, _)| c).sum();

    let mut by_category: Vec<CategoryCost> = Vec::new();
    for (cost, category) in &costs {
        match by_category.iter_mut().find(|c| c.category == *category) {
            Some(entry) => entry.total += cost,
            None => by_category.push(CategoryCost {
                category: category.to_string(),
                total: *cost,
                percentage: 0,
            }),
        }
    }
    for entry in by_category.iter_mut() {
        entry.percentage = ((entry.total / total) * 100.0).round() as u32;
    }
    by_category.sort_by(|a, b| b.total.total_cmp(&a.total));

    CostTrends {
        average_monthly_spend: total / vehicle_data.len().max(1) as f64,
        cost_by_category: by_category,
        savings_opportunities: savings_opportunities(vehicle_data),
    }
}

pub fn savings_opportunities(vehicle_data: &[ExtractedServiceData]) -> Vec<String> {
    let mut tips = Vec::new();

    let expensive = vehicle_data
        .iter()
        .filter(|d| d.cost().is_some_and(|c| c > EXPENSIVE_SERVICE))
        .count();
    if expensive > 2 {
        tips.push("Consider bundling services to save on labor costs".to_string());
    }

    let shops: HashSet<&str> = vehicle_data
        .iter()
        .filter_map(|d| d.shop_info.name.as_deref())
        .collect();
    if shops.len() > 3 {
        tips.push("Using fewer shops may lead to loyalty discounts".to_string());
    }

    tips
}

pub fn patterns(vehicle_data: &[ExtractedServiceData]) -> Patterns {
    Patterns {
        preferred_shops: top_values(vehicle_data.iter().filter_map(|d| d.shop_info.name.as_ref()), 3),
        common_services: top_values(vehicle_data.iter().map(|d| &d.service_info.primary_service), 5),
        seasonal_patterns: seasonal_patterns(vehicle_data),
        cost_patterns: cost_patterns(vehicle_data),
    }
}

pub fn cost_patterns(vehicle_data: &[ExtractedServiceData]) -> Vec<String> {
    let costs: Vec<f64> = vehicle_data.iter().filter_map(|d| d.cost()).collect();
    if costs.is_empty() {
        return Vec::new();
    }

    let mut found = Vec::new();
    let average = costs.iter().sum::<f64>() / costs.len() as f64;
    let expensive = costs.iter().filter(|c| **c > average * 1.5).count();
    if expensive as f64 / costs.len() as f64 > 0.3 {
        found.push("Tends to require expensive repairs".to_string());
    }
    if costs.iter().all(|c| *c < EXPENSIVE_SERVICE) {
        found.push("Mostly routine maintenance".to_string());
    }
    found
}

const SEASONS: [&str; 4] = ["Winter", "Spring", "Summer", "Fall"];

/// Meteorological season (northern hemisphere) of a timestamp.
pub fn season_of(ts: DateTime<Utc>) -> &'static str {
    match ts.month() {
        12 | 1 | 2 => "Winter",
        3..=5 => "Spring",
        6..=8 => "Summer",
        _ => "Fall",
    }
}

/// Most frequent services per season, seasons without services omitted.
pub fn seasonal_patterns(vehicle_data: &[ExtractedServiceData]) -> Vec<SeasonalPattern> {
    SEASONS
        .iter()
        .filter_map(|season| {
            let services = top_values(
                vehicle_data
                    .iter()
                    .filter(|d| season_of(d.timestamp) == *season)
                    .map(|d| &d.service_info.primary_service),
                3,
            );
            (!services.is_empty()).then(|| SeasonalPattern {
                season: season.to_string(),
                services,
            })
        })
        .collect()
}

pub fn alerts(profile: &VehicleProfile, vehicle_data: &[ExtractedServiceData]) -> Vec<Alert> {
    let mut alerts = Vec::new();
    let current = profile.specifications.mileage.unwrap_or(0);

    let overdue = profile
        .maintenance_schedule
        .iter()
        .filter(|item| item.due_at == DueTrigger::Mileage)
        .filter(|item| item.due_mileage.is_some_and(|due| current > due))
        .count();
    if overdue > 0 {
        alerts.push(Alert {
            kind: AlertKind::MaintenanceDue,
            message: format!("{} maintenance item(s) overdue", overdue),
            severity: AlertSeverity::Warning,
            action_required: true,
        });
    }

    if vehicle_data
        .iter()
        .any(|d| d.service_info.urgency_level.is_urgent())
    {
        alerts.push(Alert {
            kind: AlertKind::UrgentService,
            message: "Urgent service required based on recent analysis".into(),
            severity: AlertSeverity::Error,
            action_required: true,
        });
    }

    alerts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::new_profile;
    use crate::profile::tests::{civic, extraction};
    use buckled_core::{MaintenanceItem, Priority};
    use chrono::{Duration, TimeZone};

    fn priced(service: &str, category: &str, cost: f64, shop: &str) -> ExtractedServiceData {
        let mut d = extraction(service, civic(None));
        d.service_info.category = category.into();
        d.pricing.final_total = Some(cost);
        d.shop_info.name = Some(shop.into());
        d
    }

    #[test]
    fn test_cost_trends_and_savings() {
        let data = vec![
            priced("Brake Service", "Repair", 450.0, "A"),
            priced("Oil Change", "Maintenance", 50.0, "B"),
            priced("Transmission Service", "Repair", 300.0, "C"),
            priced("Alternator", "Repair", 200.0, "D"),
            priced("Timing Belt", "Repair", 250.0, "E"),
        ];
        let trends = cost_trends(&data);
        assert_eq!(trends.average_monthly_spend, 250.0);
        assert_eq!(trends.cost_by_category[0].category, "Repair");
        assert_eq!(trends.cost_by_category[0].percentage, 96);
        assert_eq!(trends.cost_by_category[1].percentage, 4);
        assert_eq!(
            trends.savings_opportunities,
            vec![
                "Consider bundling services to save on labor costs",
                "Using fewer shops may lead to loyalty discounts"
            ]
        );
    }

    #[test]
    fn test_cost_patterns() {
        let routine = vec![
            priced("Oil Change", "Maintenance", 50.0, "A"),
            priced("Wipers", "Maintenance", 30.0, "A"),
        ];
        assert_eq!(cost_patterns(&routine), vec!["Mostly routine maintenance"]);

        let spiky = vec![
            priced("Oil Change", "Maintenance", 50.0, "A"),
            priced("Engine Rebuild", "Repair", 4000.0, "A"),
        ];
        assert_eq!(cost_patterns(&spiky), vec!["Tends to require expensive repairs"]);
        assert!(cost_patterns(&[]).is_empty());
    }

    #[test]
    fn test_upcoming_and_overdue() {
        let now = Utc::now();
        let data = extraction("Oil Change", civic(Some(10_000)));
        let mut profile = new_profile(&data, now);
        profile.specifications.mileage = Some(15_500);
        profile.maintenance_schedule.push(MaintenanceItem {
            service: "State Inspection".into(),
            due_at: DueTrigger::Time,
            due_mileage: None,
            due_date: Some(now + Duration::days(10)),
            priority: Priority::High,
            estimated_cost: None,
            last_performed: None,
        });

        let upcoming = upcoming_services(&profile, now);
        let names: Vec<&str> = upcoming.iter().map(|r| r.service.as_str()).collect();
        // Oil Change overdue at 15_000, Tire Rotation due in 2000 at 17_500
        assert_eq!(names, vec!["State Inspection", "Oil Change", "Tire Rotation"]);
        assert_eq!(upcoming[0].reason, "Due in 10 days");
        assert_eq!(upcoming[1].reason, "Overdue");
        assert_eq!(upcoming[2].reason, "Due in 2000 miles");

        let alerts = alerts(&profile, &[data]);
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].kind, AlertKind::MaintenanceDue);
        assert_eq!(alerts[0].message, "1 maintenance item(s) overdue");
    }

    #[test]
    fn test_urgent_alert() {
        let data = extraction("Oil Change", civic(Some(10_000)));
        let profile = new_profile(&data, Utc::now());
        let mut urgent = data.clone();
        urgent.service_info.urgency_level = UrgencyLevel::High;

        let alerts = alerts(&profile, &[data, urgent]);
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].kind, AlertKind::UrgentService);
        assert_eq!(alerts[0].severity, AlertSeverity::Error);
    }

    #[test]
    fn test_seasons() {
        let mut jan = extraction("Battery Replacement", civic(None));
        jan.timestamp = Utc.with_ymd_and_hms(2024, 1, 15, 12, 0, 0).unwrap();
        let mut jul = extraction("AC Service", civic(None));
        jul.timestamp = Utc.with_ymd_and_hms(2024, 7, 4, 12, 0, 0).unwrap();

        let seasonal = seasonal_patterns(&[jan, jul]);
        assert_eq!(seasonal.len(), 2);
        assert_eq!(seasonal[0].season, "Winter");
        assert_eq!(seasonal[0].services, vec!["Battery Replacement"]);
        assert_eq!(seasonal[1].season, "Summer");
    }
}
