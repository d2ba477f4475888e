//! Scoring how well an extraction's vehicle details fit a stored profile.

use buckled_core::{ExtractedServiceData, VehicleIdentity, VehicleInfo, VehicleProfile};

/// Above this the extraction updates the matched profile.
pub const UPDATE_THRESHOLD: f64 = 0.7;
/// Above this an extraction counts toward a profile's insights.
pub const RELATED_THRESHOLD: f64 = 0.5;

#[derive(Debug, Clone)]
pub struct VehicleMatch<'a> {
    pub profile: &'a VehicleProfile,
    pub score: f64,
    pub reasons: Vec<&'static str>,
}

/// Average over the fields present on both sides: VIN 1.0, make 0.8,
/// model 0.8, year 0.6 exact or 0.4 one year off. Mismatches add 0.
pub fn match_score(info: &VehicleInfo, identity: &VehicleIdentity) -> f64 {
    let mut score = 0.0;
    let mut factors = 0u32;

    if let (Some(a), Some(b)) = (&info.vin, &identity.vin) {
        factors += 1;
        if vin_eq(a, b) {
            score += 1.0;
        }
    }
    if let (Some(a), Some(b)) = (&info.make, &identity.make) {
        factors += 1;
        if text_eq(a, b) {
            score += 0.8;
        }
    }
    if let (Some(a), Some(b)) = (&info.model, &identity.model) {
        factors += 1;
        if text_eq(a, b) {
            score += 0.8;
        }
    }
    if let (Some(a), Some(b)) = (info.year, identity.year) {
        factors += 1;
        score += match (a - b).abs() {
            0 => 0.6,
            1 => 0.4,
            _ => 0.0,
        };
    }

    if factors == 0 {
        0.0
    } else {
        score / factors as f64
    }
}

pub fn match_reasons(info: &VehicleInfo, identity: &VehicleIdentity) -> Vec<&'static str> {
    let mut reasons = Vec::new();
    if let (Some(a), Some(b)) = (&info.vin, &identity.vin) {
        if vin_eq(a, b) {
            reasons.push("VIN match");
        }
    }
    if let (Some(a), Some(b)) = (&info.make, &identity.make) {
        if text_eq(a, b) {
            reasons.push("Make match");
        }
    }
    if let (Some(a), Some(b)) = (&info.model, &identity.model) {
        if text_eq(a, b) {
            reasons.push("Model match");
        }
    }
    if let (Some(a), Some(b)) = (info.year, identity.year) {
        match (a - b).abs() {
            0 => reasons.push("Exact year match"),
            1 => reasons.push("Similar year"),
            _ => {}
        }
    }
    reasons
}

/// The highest-scoring profile; the earliest wins ties. `None` only when
/// there are no profiles.
pub fn best_match<'a>(info: &VehicleInfo, profiles: &'a [VehicleProfile]) -> Option<VehicleMatch<'a>> {
    let mut best: Option<VehicleMatch<'a>> = None;
    for profile in profiles {
        let score = match_score(info, &profile.identity);
        if best.as_ref().map_or(true, |b| score > b.score) {
            best = Some(VehicleMatch {
                profile,
                score,
                reasons: match_reasons(info, &profile.identity),
            });
        }
    }
    best
}

/// Whether an extraction is about this profile's vehicle.
pub fn belongs_to(data: &ExtractedServiceData, profile: &VehicleProfile) -> bool {
    match_score(&data.vehicle_info, &profile.identity) > RELATED_THRESHOLD
}

fn vin_eq(a: &str, b: &str) -> bool {
    a.trim().eq_ignore_ascii_case(b.trim())
}

fn text_eq(a: &str, b: &str) -> bool {
    a.trim().to_lowercase() == b.trim().to_lowercase()
}
