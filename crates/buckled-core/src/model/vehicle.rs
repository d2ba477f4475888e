//! Vehicle profiles inferred from accumulated extractions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::confidence::ConfidenceScore;
use super::extraction::UrgencyLevel;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VehicleIdentity {
    pub year: Option<i32>,
    pub make: Option<String>,
    pub model: Option<String>,
    pub trim: Option<String>,
    pub vin: Option<String>,
    pub license_plate: Option<String>,
    pub color: Option<String>,
    /// User-given name.
    pub nickname: Option<String>,
    pub confidence: ConfidenceScore,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VehicleSpecifications {
    pub engine_type: Option<String>,
    pub engine_size: Option<String>,
    pub transmission: Option<String>,
    pub drivetrain: Option<String>,
    pub fuel_type: Option<String>,
    pub mileage: Option<u32>,
    pub last_mileage_update: DateTime<Utc>,
    pub confidence: ConfidenceScore,
}

/// One serviced visit. `extracted_data_id` refers back to the extraction
/// that produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceHistoryEntry {
    pub date: DateTime<Utc>,
    pub service: String,
    pub mileage: Option<u32>,
    pub shop_name: Option<String>,
    pub cost: Option<f64>,
    pub extracted_data_id: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DueTrigger {
    Mileage,
    Time,
    Condition,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    Medium,
    High,
}

impl From<Priority> for UrgencyLevel {
    fn from(p: Priority) -> Self {
        match p {
            Priority::Low => UrgencyLevel::Low,
            Priority::Medium => UrgencyLevel::Medium,
            Priority::High => UrgencyLevel::High,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CostRange {
    pub min: f64,
    pub max: f64,
}

impl CostRange {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MaintenanceItem {
    pub service: String,
    pub due_at: DueTrigger,
    pub due_mileage: Option<u32>,
    pub due_date: Option<DateTime<Utc>>,
    pub priority: Priority,
    pub estimated_cost: Option<CostRange>,
    pub last_performed: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KnownIssue {
    pub issue: String,
    pub first_reported: DateTime<Utc>,
    pub last_reported: DateTime<Utc>,
    pub frequency: u32,
    pub resolved: bool,
    pub cost: Option<f64>,
}

/// A physical vehicle as inferred from the user's service records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VehicleProfile {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
    pub identity: VehicleIdentity,
    pub specifications: VehicleSpecifications,
    #[serde(default)]
    pub service_history: Vec<ServiceHistoryEntry>,
    #[serde(default)]
    pub maintenance_schedule: Vec<MaintenanceItem>,
    #[serde(default)]
    pub known_issues: Vec<KnownIssue>,
    #[serde(default)]
    pub user_notes: String,
    #[serde(default)]
    pub tags: Vec<String>,
    pub is_active: bool,
}

impl VehicleProfile {
    /// Short label such as "2019 Honda Civic" or the nickname if one is set.
    pub fn display_name(&self) -> String {
        if let Some(nick) = &self.identity.nickname {
            return nick.clone();
        }
        let parts: Vec<String> = [
            self.identity.year.map(|y| y.to_string()),
            self.identity.make.clone(),
            self.identity.model.clone(),
        ]
        .into_iter()
        .flatten()
        .collect();
        if parts.is_empty() {
            "Unknown vehicle".into()
        } else {
            parts.join(" ")
        }
    }
}

/// User edits to a stored profile. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VehicleProfileEdit {
    pub nickname: Option<String>,
    pub trim: Option<String>,
    pub color: Option<String>,
    pub license_plate: Option<String>,
    pub mileage: Option<u32>,
    pub user_notes: Option<String>,
    pub tags: Option<Vec<String>>,
}

impl VehicleProfileEdit {
    /// Apply the edit and bump `last_updated`.
    pub fn apply(&self, profile: &mut VehicleProfile, now: DateTime<Utc>) {
        if let Some(v) = &self.nickname {
            profile.identity.nickname = Some(v.clone());
        }
        if let Some(v) = &self.trim {
            profile.identity.trim = Some(v.clone());
        }
        if let Some(v) = &self.color {
            profile.identity.color = Some(v.clone());
        }
        if let Some(v) = &self.license_plate {
            profile.identity.license_plate = Some(v.clone());
        }
        if let Some(m) = self.mileage {
            profile.specifications.mileage = Some(m);
            profile.specifications.last_mileage_update = now;
        }
        if let Some(notes) = &self.user_notes {
            profile.user_notes = notes.clone();
        }
        if let Some(tags) = &self.tags {
            profile.tags = tags.clone();
        }
        profile.last_updated = now;
    }
}
