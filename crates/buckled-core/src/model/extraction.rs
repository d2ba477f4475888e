//! The record produced by one extraction (a document upload or a typed
//! description).

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::confidence::ConfidenceScore;
use crate::error::Error;

/// How the record entered the system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionSource {
    DocumentUpload,
    TextInput,
    ManualEntry,
}

impl ExtractionSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExtractionSource::DocumentUpload => "document_upload",
            ExtractionSource::TextInput => "text_input",
            ExtractionSource::ManualEntry => "manual_entry",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UrgencyLevel {
    Low,
    #[default]
    Medium,
    High,
    Emergency,
}

impl UrgencyLevel {
    /// Sort rank: emergency 4, high 3, medium 2, low 1.
    pub fn rank(&self) -> u8 {
        match self {
            UrgencyLevel::Emergency => 4,
            UrgencyLevel::High => 3,
            UrgencyLevel::Medium => 2,
            UrgencyLevel::Low => 1,
        }
    }

    pub fn is_urgent(&self) -> bool {
        matches!(self, UrgencyLevel::High | UrgencyLevel::Emergency)
    }
}

impl FromStr for UrgencyLevel {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "low" => Ok(UrgencyLevel::Low),
            "medium" | "moderate" => Ok(UrgencyLevel::Medium),
            "high" => Ok(UrgencyLevel::High),
            "emergency" | "critical" => Ok(UrgencyLevel::Emergency),
            other => Err(Error::Validation(format!("Unknown urgency level: {}", other))),
        }
    }
}

impl fmt::Display for UrgencyLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            UrgencyLevel::Low => "low",
            UrgencyLevel::Medium => "medium",
            UrgencyLevel::High => "high",
            UrgencyLevel::Emergency => "emergency",
        };
        f.write_str(s)
    }
}

/// Technician-assessed severity of the work.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    #[default]
    Routine,
    Recommended,
    Needed,
    Critical,
}

impl Severity {
    /// Urgency of a technician recommendation with this severity.
    pub fn to_urgency(&self) -> UrgencyLevel {
        match self {
            Severity::Critical => UrgencyLevel::High,
            Severity::Needed => UrgencyLevel::Medium,
            Severity::Recommended | Severity::Routine => UrgencyLevel::Low,
        }
    }
}

impl FromStr for Severity {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "routine" => Ok(Severity::Routine),
            "recommended" => Ok(Severity::Recommended),
            "needed" | "required" => Ok(Severity::Needed),
            "critical" => Ok(Severity::Critical),
            other => Err(Error::Validation(format!("Unknown severity: {}", other))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BreakdownCategory {
    Parts,
    Labor,
    Fee,
    Tax,
    Discount,
}

impl FromStr for BreakdownCategory {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "parts" | "part" => Ok(BreakdownCategory::Parts),
            "labor" | "labour" => Ok(BreakdownCategory::Labor),
            "fee" | "fees" => Ok(BreakdownCategory::Fee),
            "tax" | "taxes" => Ok(BreakdownCategory::Tax),
            "discount" | "discounts" => Ok(BreakdownCategory::Discount),
            other => Err(Error::Validation(format!("Unknown line item category: {}", other))),
        }
    }
}

// ---------------------------------------------------------------
// Blocks
// ---------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceInfo {
    pub primary_service: String,
    #[serde(default)]
    pub secondary_services: Vec<String>,
    pub category: String,
    #[serde(default)]
    pub urgency_level: UrgencyLevel,
    #[serde(default)]
    pub recommended_action: String,
    pub confidence: ConfidenceScore,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VehicleInfo {
    pub year: Option<i32>,
    pub make: Option<String>,
    pub model: Option<String>,
    pub vin: Option<String>,
    pub mileage: Option<u32>,
    pub engine_type: Option<String>,
    pub transmission: Option<String>,
    pub color: Option<String>,
    pub license_plate: Option<String>,
    pub confidence: ConfidenceScore,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    pub item: String,
    pub quantity: Option<f64>,
    pub unit_price: Option<f64>,
    pub total: f64,
    pub category: BreakdownCategory,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pricing {
    pub parts_total: Option<f64>,
    pub labor_total: Option<f64>,
    pub subtotal: Option<f64>,
    pub taxes: Option<f64>,
    pub discounts: Option<f64>,
    pub final_total: Option<f64>,
    pub currency: String,
    #[serde(default)]
    pub breakdown: Vec<LineItem>,
    pub confidence: ConfidenceScore,
}

impl Pricing {
    /// The amount paid: the final total, else the subtotal. Zero counts as
    /// absent.
    pub fn effective_total(&self) -> Option<f64> {
        self.final_total
            .filter(|v| *v > 0.0)
            .or(self.subtotal.filter(|v| *v > 0.0))
    }
}

impl Default for Pricing {
    fn default() -> Self {
        Self {
            parts_total: None,
            labor_total: None,
            subtotal: None,
            taxes: None,
            discounts: None,
            final_total: None,
            currency: "USD".into(),
            breakdown: Vec::new(),
            confidence: ConfidenceScore::failed(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShopInfo {
    pub name: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip_code: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub website: Option<String>,
    pub technician_name: Option<String>,
    pub shop_license: Option<String>,
    pub confidence: ConfidenceScore,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TechnicalInfo {
    #[serde(default)]
    pub diagnostic_codes: Vec<String>,
    #[serde(default)]
    pub part_numbers: Vec<String>,
    /// Miles or months, as reported.
    pub service_intervals: Option<u32>,
    pub warranty_info: Option<String>,
    #[serde(default)]
    pub recommended_maintenance: Vec<String>,
    #[serde(default)]
    pub severity: Severity,
    pub confidence: ConfidenceScore,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Timeline {
    /// Free text such as "2-3 hours".
    pub estimated_completion_time: Option<String>,
    pub scheduled_date: Option<DateTime<Utc>>,
    pub preferred_date: Option<DateTime<Utc>>,
    pub due_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub is_urgent: bool,
    pub next_service_date: Option<DateTime<Utc>>,
    pub confidence: ConfidenceScore,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Budget {
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub preferred: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserContext {
    #[serde(default)]
    pub symptoms: Vec<String>,
    pub duration: Option<String>,
    pub frequency: Option<String>,
    #[serde(default)]
    pub driving_conditions: Vec<String>,
    #[serde(default)]
    pub recent_services: Vec<String>,
    #[serde(default)]
    pub concerns: Vec<String>,
    pub budget: Option<Budget>,
    pub confidence: ConfidenceScore,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageMetadata {
    pub file_name: String,
    pub file_size: u64,
    pub mime_type: String,
    pub upload_time: DateTime<Utc>,
    /// SHA-256 of the uploaded bytes, hex encoded.
    #[serde(default)]
    pub content_hash: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawData {
    pub original_text: Option<String>,
    pub extracted_text: Option<String>,
    pub image_metadata: Option<ImageMetadata>,
    #[serde(default)]
    pub ai_response: String,
    /// Wall-clock milliseconds spent producing the record.
    #[serde(default)]
    pub processing_time: u64,
}

// ---------------------------------------------------------------
// Record
// ---------------------------------------------------------------

/// One extraction. Immutable once stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedServiceData {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub source: ExtractionSource,
    pub service_info: ServiceInfo,
    pub vehicle_info: VehicleInfo,
    pub pricing: Pricing,
    pub shop_info: ShopInfo,
    pub technical_info: TechnicalInfo,
    pub timeline: Timeline,
    pub user_context: Option<UserContext>,
    pub raw_data: RawData,
}

impl ExtractedServiceData {
    /// True when any identifying vehicle field is present or the vehicle block
    /// was extracted with confidence above 30.
    pub fn has_vehicle_info(&self) -> bool {
        let v = &self.vehicle_info;
        v.make.is_some()
            || v.model.is_some()
            || v.year.is_some()
            || v.vin.is_some()
            || v.confidence.value > 30
    }

    /// The amount paid for this service, if known.
    pub fn cost(&self) -> Option<f64> {
        self.pricing.effective_total()
    }

    /// High/emergency urgency or an urgent timeline.
    pub fn needs_attention(&self) -> bool {
        self.service_info.urgency_level.is_urgent() || self.timeline.is_urgent
    }
}
