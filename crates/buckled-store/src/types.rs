//! Store-level types: collections, deletion policy, stats and backups.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use buckled_core::{ExtractedServiceData, UserSessionData, VehicleProfile};

/// Version string written into every export.
pub const EXPORT_VERSION: &str = "1.0";

/// How a collection removes records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeletionPolicy {
    /// Row is removed.
    Hard,
    /// Row is kept with `is_active = 0` and hidden from listings.
    Soft,
}

/// The three persisted collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Collection {
    Extractions,
    VehicleProfiles,
    UserSession,
}

impl Collection {
    pub const ALL: [Collection; 3] = [
        Collection::Extractions,
        Collection::VehicleProfiles,
        Collection::UserSession,
    ];

    pub fn table(&self) -> &'static str {
        match self {
            Collection::Extractions => "extracted_data",
            Collection::VehicleProfiles => "vehicle_profiles",
            Collection::UserSession => "user_session",
        }
    }

    pub fn key_column(&self) -> &'static str {
        match self {
            Collection::UserSession => "session_id",
            _ => "id",
        }
    }

    pub fn deletion_policy(&self) -> DeletionPolicy {
        match self {
            Collection::VehicleProfiles => DeletionPolicy::Soft,
            Collection::Extractions | Collection::UserSession => DeletionPolicy::Hard,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceCount {
    pub service: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShopCount {
    pub shop: String,
    pub count: usize,
}

/// Aggregate spending statistics over all extractions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceStats {
    pub total_services: usize,
    pub total_spent: f64,
    pub average_service_cost: f64,
    pub top_services: Vec<ServiceCount>,
    pub top_shops: Vec<ShopCount>,
}

/// Dashboard counters.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuickStats {
    pub total_services: usize,
    pub recent_services: usize,
    pub vehicles: usize,
    pub pending_actions: usize,
    pub last_service_date: Option<DateTime<Utc>>,
}

/// Full JSON backup.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportBundle {
    pub export_date: DateTime<Utc>,
    pub version: String,
    pub extracted_data: Vec<ExtractedServiceData>,
    pub vehicle_profiles: Vec<VehicleProfile>,
    pub user_session: Option<UserSessionData>,
}

/// Import input. Items are kept as raw JSON so one malformed record does not
/// reject the whole file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportBundle {
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub extracted_data: Vec<serde_json::Value>,
    #[serde(default)]
    pub vehicle_profiles: Vec<serde_json::Value>,
    #[serde(default)]
    pub user_session: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportSummary {
    pub extractions: usize,
    pub vehicle_profiles: usize,
    pub session_restored: bool,
    pub skipped: usize,
}
