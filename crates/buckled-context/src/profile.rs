//! Building and updating vehicle profiles from extractions.

use chrono::{DateTime, Utc};

use buckled_core::{
    generate_id, ExtractedServiceData, KnownIssue, Severity, ServiceHistoryEntry, VehicleIdentity,
    VehicleProfile, VehicleSpecifications,
};

use crate::catalog::{seed_interval, seed_schedule};
use crate::merge::{merge_confidence, merge_field, ReliabilityTable};

/// Mileage is only taken from extractions more confident than this.
const MILEAGE_CONFIDENCE_FLOOR: u8 = 50;

/// A fresh profile for a vehicle seen for the first time.
pub fn new_profile(data: &ExtractedServiceData, now: DateTime<Utc>) -> VehicleProfile {
    let v = &data.vehicle_info;
    let mut profile = VehicleProfile {
        id: generate_id("vehicle"),
        created_at: now,
        last_updated: now,
        identity: VehicleIdentity {
            year: v.year,
            make: v.make.clone(),
            model: v.model.clone(),
            trim: None,
            vin: v.vin.clone(),
            license_plate: v.license_plate.clone(),
            color: v.color.clone(),
            nickname: None,
            confidence: v.confidence,
        },
        specifications: VehicleSpecifications {
            engine_type: v.engine_type.clone(),
            engine_size: None,
            transmission: v.transmission.clone(),
            drivetrain: None,
            fuel_type: None,
            mileage: v.mileage,
            last_mileage_update: now,
            confidence: v.confidence,
        },
        service_history: vec![history_entry(data)],
        maintenance_schedule: seed_schedule(
            v.mileage,
            &data.service_info.primary_service,
            data.timestamp,
        ),
        known_issues: Vec::new(),
        user_notes: String::new(),
        tags: Vec::new(),
        is_active: true,
    };
    add_tag(&mut profile, &data.service_info.category);
    record_known_issue(&mut profile, data);
    profile
}

/// Fold a matched extraction into an existing profile.
pub fn apply_extraction(
    profile: &mut VehicleProfile,
    data: &ExtractedServiceData,
    table: &ReliabilityTable,
    now: DateTime<Utc>,
) {
    let v = &data.vehicle_info;

    let mileage_merged = v.mileage.is_some() && v.confidence.value > MILEAGE_CONFIDENCE_FLOOR;
    if mileage_merged {
        let specs = &mut profile.specifications;
        let (mileage, confidence) =
            merge_field(specs.mileage, specs.confidence, v.mileage, v.confidence, table);
        specs.mileage = mileage;
        specs.confidence = confidence;
        specs.last_mileage_update = now;
    }

    // Fill gaps only; a block's confidence moves when the extraction
    // contributed to it.
    let identity = &mut profile.identity;
    let filled = [
        fill_gap(&mut identity.vin, &v.vin),
        fill_gap(&mut identity.license_plate, &v.license_plate),
        fill_gap(&mut identity.color, &v.color),
    ];
    if filled.contains(&true) {
        identity.confidence = merge_confidence(identity.confidence, v.confidence, table);
    }

    let specs = &mut profile.specifications;
    let filled = [
        fill_gap(&mut specs.engine_type, &v.engine_type),
        fill_gap(&mut specs.transmission, &v.transmission),
    ];
    if filled.contains(&true) && !mileage_merged {
        specs.confidence = merge_confidence(specs.confidence, v.confidence, table);
    }

    profile.service_history.push(history_entry(data));
    update_schedule(profile, data);
    record_known_issue(profile, data);
    add_tag(profile, &data.service_info.category);
    profile.last_updated = now;
}

fn fill_gap<T: Clone>(slot: &mut Option<T>, incoming: &Option<T>) -> bool {
    if slot.is_some() || incoming.is_none() {
        return false;
    }
    *slot = incoming.clone();
    true
}

fn history_entry(data: &ExtractedServiceData) -> ServiceHistoryEntry {
    ServiceHistoryEntry {
        date: data.timestamp,
        service: data.service_info.primary_service.clone(),
        mileage: data.vehicle_info.mileage,
        shop_name: data.shop_info.name.clone(),
        cost: data.cost(),
        extracted_data_id: data.id.clone(),
    }
}

/// Mark schedule items covered by this service as performed and, when the
/// mileage is known, move their next due point one interval ahead.
fn update_schedule(profile: &mut VehicleProfile, data: &ExtractedServiceData) {
    let performed = data.service_info.primary_service.trim().to_lowercase();
    if performed.is_empty() {
        return;
    }

    for item in profile.maintenance_schedule.iter_mut() {
        let name = item.service.to_lowercase();
        if !(name.contains(&performed) || performed.contains(&name)) {
            continue;
        }
        item.last_performed = Some(data.timestamp);
        if let (Some(mileage), Some(interval)) = (data.vehicle_info.mileage, seed_interval(&item.service)) {
            item.due_mileage = Some(mileage.saturating_add(interval));
        }
    }
}

fn record_known_issue(profile: &mut VehicleProfile, data: &ExtractedServiceData) {
    let serious = data.service_info.urgency_level.is_urgent()
        || matches!(data.technical_info.severity, Severity::Needed | Severity::Critical);
    if !serious {
        return;
    }

    let issue = &data.service_info.primary_service;
    let existing = profile
        .known_issues
        .iter_mut()
        .find(|k| !k.resolved && k.issue.eq_ignore_ascii_case(issue));

    match existing {
        Some(known) => {
            known.frequency += 1;
            known.last_reported = data.timestamp;
            if let Some(cost) = data.cost() {
                known.cost = Some(cost);
            }
        }
        None => profile.known_issues.push(KnownIssue {
            issue: issue.clone(),
            first_reported: data.timestamp,
            last_reported: data.timestamp,
            frequency: 1,
            resolved: false,
            cost: data.cost(),
        }),
    }
}

fn add_tag(profile: &mut VehicleProfile, tag: &str) {
    let tag = tag.trim();
    if !tag.is_empty() && !profile.tags.iter().any(|t| t == tag) {
        profile.tags.push(tag.to_string());
    }
}
