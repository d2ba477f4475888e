//! Service recommendations after an extraction.
//!
//! Four sources contribute: the technician's own maintenance suggestions,
//! schedule items coming due, an urgent follow-up for high/emergency
//! extractions, and secondary services that keep showing up alongside the
//! same primary service. The merged list is ranked by urgency then
//! confidence and cut to five.

use buckled_core::tally::top_by_count;
use buckled_core::{
    CostRange, DueTrigger, ExtractedServiceData, ServiceRecommendation, UrgencyLevel,
    VehicleProfile,
};

use crate::catalog::estimate_cost;

pub const MAX_RECOMMENDATIONS: usize = 5;
/// Schedule items this many miles out or fewer are recommended.
pub const DUE_SOON_MILES: i64 = 1000;
const DUE_VERY_SOON_MILES: i64 = 500;

pub fn recommend(
    data: &ExtractedServiceData,
    profile: Option<&VehicleProfile>,
    history: &[ExtractedServiceData],
) -> Vec<ServiceRecommendation> {
    let mut recs = technician_recommendations(data);
    if let Some(profile) = profile {
        recs.extend(mileage_recommendations(profile));
    }
    recs.extend(urgent_recommendation(data));
    recs.extend(pattern_recommendations(data, history));
    rank(recs)
}

pub fn technician_recommendations(data: &ExtractedServiceData) -> Vec<ServiceRecommendation> {
    let tech = &data.technical_info;
    let shop = data.shop_info.name.as_deref().unwrap_or("service provider");
    tech.recommended_maintenance
        .iter()
        .map(|service| ServiceRecommendation {
            service: service.clone(),
            reason: "Recommended by service technician".into(),
            urgency: tech.severity.to_urgency(),
            estimated_cost: estimate_cost(service),
            due_by: None,
            due_mileage: None,
            confidence: tech.confidence.value,
            sources: vec![format!("Technical recommendation from {}", shop)],
        })
        .collect()
}

/// Schedule items due within 1000 miles of the profile's current mileage.
pub fn mileage_recommendations(profile: &VehicleProfile) -> Vec<ServiceRecommendation> {
    let Some(current) = profile.specifications.mileage.filter(|m| *m > 0) else {
        return Vec::new();
    };

    profile
        .maintenance_schedule
        .iter()
        .filter(|item| item.due_at == DueTrigger::Mileage)
        .filter_map(|item| {
            let due = item.due_mileage?;
            let until = due as i64 - current as i64;
            if until <= 0 || until > DUE_SOON_MILES {
                return None;
            }
            Some(ServiceRecommendation {
                service: item.service.clone(),
                reason: format!("Due in {} miles", until),
                urgency: if until <= DUE_VERY_SOON_MILES {
                    UrgencyLevel::Medium
                } else {
                    UrgencyLevel::Low
                },
                estimated_cost: item.estimated_cost.unwrap_or_else(|| estimate_cost(&item.service)),
                due_by: None,
                due_mileage: Some(due),
                confidence: 85,
                sources: vec!["Maintenance schedule".into()],
            })
        })
        .collect()
}

/// A follow-up for high/emergency extractions, priced at ±20% of the final
/// total when one is known.
pub fn urgent_recommendation(data: &ExtractedServiceData) -> Option<ServiceRecommendation> {
    let urgency = data.service_info.urgency_level;
    if !urgency.is_urgent() {
        return None;
    }
    let estimated_cost = match data.pricing.final_total.filter(|t| *t > 0.0) {
        Some(total) => CostRange::new(total * 0.8, total * 1.2),
        None => CostRange::new(100.0, 500.0),
    };
    Some(ServiceRecommendation {
        service: data.service_info.primary_service.clone(),
        reason: "Urgent service required based on symptoms".into(),
        urgency,
        estimated_cost,
        due_by: None,
        due_mileage: None,
        confidence: data.service_info.confidence.value,
        sources: vec!["User symptoms and service analysis".into()],
    })
}

/// Secondary services seen at least twice with the same primary service.
pub fn pattern_recommendations(
    data: &ExtractedServiceData,
    history: &[ExtractedServiceData],
) -> Vec<ServiceRecommendation> {
    let primary = &data.service_info.primary_service;
    let related = history
        .iter()
        .filter(|d| &d.service_info.primary_service == primary)
        .flat_map(|d| d.service_info.secondary_services.iter());

    top_by_count(related, usize::MAX)
        .into_iter()
        .filter(|(_, count)| *count >= 2)
        .take(2)
        .map(|(service, _)| ServiceRecommendation {
            estimated_cost: estimate_cost(&service),
            service,
            reason: "Often performed together with this service".into(),
            urgency: UrgencyLevel::Low,
            due_by: None,
            due_mileage: None,
            confidence: 60,
            sources: vec!["Service pattern analysis".into()],
        })
        .collect()
}

/// Urgency rank descending, then confidence descending; top five.
pub fn rank(mut recs: Vec<ServiceRecommendation>) -> Vec<ServiceRecommendation> {
    recs.sort_by(|a, b| {
        b.urgency
            .rank()
            .cmp(&a.urgency.rank())
            .then(b.confidence.cmp(&a.confidence))
    });
    recs.truncate(MAX_RECOMMENDATIONS);
    recs
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::new_profile;
    use crate::profile::tests::{civic, extraction};
    use buckled_core::{ConfidenceScore, Severity};
    use chrono::Utc;

    fn rec(service: &str, urgency: UrgencyLevel, confidence: u8) -> ServiceRecommendation {
        ServiceRecommendation {
            service: service.into(),
            reason: String::new(),
            urgency,
            estimated_cost: CostRange::new(0.0, 0.0),
            due_by: None,
            due_mileage: None,
            confidence,
            sources: Vec::new(),
        }
    }

    #[test]
    fn test_ordering_and_truncation() {
        let ranked = rank(vec![
            rec("a", UrgencyLevel::Low, 99),
            rec("b", UrgencyLevel::Emergency, 10),
            rec("c", UrgencyLevel::Medium, 50),
            rec("d", UrgencyLevel::Medium, 70),
            rec("e", UrgencyLevel::High, 20),
            rec("f", UrgencyLevel::Low, 5),
        ]);
        let order: Vec<&str> = ranked.iter().map(|r| r.service.as_str()).collect();
        assert_eq!(order, vec!["b", "e", "d", "c", "a"]);
    }

    #[test]
    fn test_mileage_boundary() {
        let data = extraction("Oil Change", civic(Some(10_000)));
        let mut profile = new_profile(&data, Utc::now());
        // Oil Change due at 15_000, Tire Rotation at 17_500
        profile.specifications.mileage = Some(14_000);
        let recs = mileage_recommendations(&profile);
        assert_eq!(recs.len(), 1);
        assert_eq!(recs[0].service, "Oil Change");
        assert_eq!(recs[0].reason, "Due in 1000 miles");
        assert_eq!(recs[0].urgency, UrgencyLevel::Low);
        assert_eq!(recs[0].due_mileage, Some(15_000));

        profile.specifications.mileage = Some(13_999);
        assert!(mileage_recommendations(&profile).is_empty());

        profile.specifications.mileage = Some(14_500);
        assert_eq!(mileage_recommendations(&profile)[0].urgency, UrgencyLevel::Medium);

        profile.specifications.mileage = Some(15_000);
        assert!(mileage_recommendations(&profile).is_empty());
    }

    #[test]
    fn test_urgent_cost_band() {
        let mut data = extraction("Brake Line Repair", civic(None));
        data.service_info.urgency_level = UrgencyLevel::Emergency;
        data.service_info.confidence = ConfidenceScore::ai(77);
        data.pricing.final_total = Some(500.0);

        let rec = urgent_recommendation(&data).unwrap();
        assert_eq!(rec.urgency, UrgencyLevel::Emergency);
        assert!((rec.estimated_cost.min - 400.0).abs() < 1e-9);
        assert!((rec.estimated_cost.max - 600.0).abs() < 1e-9);
        assert_eq!(rec.confidence, 77);

        data.pricing.final_total = None;
        let rec = urgent_recommendation(&data).unwrap();
        assert_eq!(rec.estimated_cost, CostRange::new(100.0, 500.0));

        data.service_info.urgency_level = UrgencyLevel::Medium;
        assert!(urgent_recommendation(&data).is_none());
    }

    #[test]
    fn test_technician_recommendations() {
        let mut data = extraction("Inspection", civic(None));
        data.technical_info.recommended_maintenance = vec!["Coolant Flush".into(), "Brake Fluid".into()];
        data.technical_info.severity = Severity::Critical;
        data.technical_info.confidence = ConfidenceScore::ai(66);
        data.shop_info.name = Some("Main St Auto".into());

        let recs = technician_recommendations(&data);
        assert_eq!(recs.len(), 2);
        assert_eq!(recs[0].urgency, UrgencyLevel::High);
        assert_eq!(recs[0].confidence, 66);
        assert_eq!(recs[1].estimated_cost, CostRange::new(150.0, 400.0));
        assert_eq!(recs[0].sources, vec!["Technical recommendation from Main St Auto"]);
    }

    #[test]
    fn test_pattern_needs_two_occurrences() {
        let mut a = extraction("Oil Change", civic(None));
        a.service_info.secondary_services = vec!["Tire Rotation".into(), "Wiper Blades".into()];
        let mut b = extraction("Oil Change", civic(None));
        b.service_info.secondary_services = vec!["Tire Rotation".into()];
        let mut c = extraction("Brake Service", civic(None));
        c.service_info.secondary_services = vec!["Wiper Blades".into()];

        let history = vec![a.clone(), b, c];
        let recs = pattern_recommendations(&a, &history);
        assert_eq!(recs.len(), 1);
        assert_eq!(recs[0].service, "Tire Rotation");
        assert_eq!(recs[0].confidence, 60);
    }
}
