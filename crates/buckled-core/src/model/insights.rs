//! Recommendations and per-vehicle insights.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::extraction::UrgencyLevel;
use super::vehicle::CostRange;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceRecommendation {
    pub service: String,
    pub reason: String,
    pub urgency: UrgencyLevel,
    pub estimated_cost: CostRange,
    pub due_by: Option<DateTime<Utc>>,
    pub due_mileage: Option<u32>,
    pub confidence: u8,
    /// What data led to this recommendation.
    pub sources: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryCost {
    pub category: String,
    pub total: f64,
    pub percentage: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CostTrends {
    pub average_monthly_spend: f64,
    pub cost_by_category: Vec<CategoryCost>,
    pub savings_opportunities: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeasonalPattern {
    pub season: String,
    pub services: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Patterns {
    pub preferred_shops: Vec<String>,
    pub common_services: Vec<String>,
    pub seasonal_patterns: Vec<SeasonalPattern>,
    pub cost_patterns: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
    MaintenanceDue,
    PriceAlert,
    PatternDetected,
    UrgentService,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertSeverity {
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Alert {
    #[serde(rename = "type")]
    pub kind: AlertKind,
    pub message: String,
    pub severity: AlertSeverity,
    pub action_required: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SmartInsights {
    pub vehicle_id: String,
    pub generated_at: DateTime<Utc>,
    pub upcoming_services: Vec<ServiceRecommendation>,
    pub cost_trends: CostTrends,
    pub patterns: Patterns,
    pub alerts: Vec<Alert>,
}
