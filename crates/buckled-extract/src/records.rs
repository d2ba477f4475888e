//! Assembly of `ExtractedServiceData` from decoded replies, including the
//! per-block defaults and the degraded records used when the collaborator
//! fails.

use chrono::{DateTime, Utc};
use serde_json::json;
use tracing::warn;

use buckled_core::{
    generate_id, Budget, ConfidenceScore, ConfidenceSource, ExtractedServiceData, ExtractionSource,
    ImageMetadata, Pricing, RawData, ServiceInfo, Severity, ShopInfo, TechnicalInfo, Timeline,
    UrgencyLevel, UserContext, VehicleInfo,
};

use crate::decode::{Fields, ModelExtraction};
use crate::normalize::{clean_user_input, Normalized};

/// Services looked for in a reply that carried no JSON, in priority order.
const SERVICE_KEYWORDS: &[&str] = &[
    "oil change",
    "brake",
    "battery",
    "tire",
    "engine",
    "transmission",
    "air filter",
    "spark plug",
    "coolant",
    "alignment",
    "exhaust",
    "ac",
];

const DOCUMENT_FAILED_ACTION: &str =
    "Please try uploading the document again or enter service information manually.";

/// Timing shared by every record built for one call.
#[derive(Debug, Clone, Copy)]
pub struct Stamp {
    pub timestamp: DateTime<Utc>,
    pub processing_time: u64,
}

// ---------------------------------------------------------------
// Document records
// ---------------------------------------------------------------

/// Build the record for a document reply, falling back to a keyword scan
/// when the reply holds no JSON object.
pub fn document_record(reply: &str, metadata: ImageMetadata, stamp: Stamp) -> ExtractedServiceData {
    let parsed = ModelExtraction::parse(reply).unwrap_or_else(|| {
        warn!("No JSON object in document reply; scanning for service keywords");
        document_fallback(reply)
    });

    let service = parsed.block("serviceInfo");
    let vehicle = parsed.block("vehicleInfo");
    let pricing = parsed.block("pricing");
    let shop = parsed.block("shopInfo");
    let technical = parsed.block("technicalInfo");
    let timeline = parsed.block("timeline");

    ExtractedServiceData {
        id: generate_id("extract"),
        timestamp: stamp.timestamp,
        source: ExtractionSource::DocumentUpload,
        service_info: service_info(service, "Unknown Service".into(), "", 50),
        vehicle_info: vehicle_info(vehicle, 40),
        pricing: pricing_info(pricing, 30),
        shop_info: shop_info(shop, 40),
        technical_info: technical_info(technical, 35),
        timeline: timeline_info(timeline, 40),
        user_context: None,
        raw_data: RawData {
            original_text: None,
            extracted_text: Some(parsed.text("extractedText").unwrap_or_else(|| reply.to_string())),
            image_metadata: Some(metadata),
            ai_response: reply.to_string(),
            processing_time: stamp.processing_time,
        },
    }
}

/// The record returned when a document could not be analyzed at all.
pub fn document_failure_record(
    metadata: ImageMetadata,
    reason: &str,
    stamp: Stamp,
) -> ExtractedServiceData {
    ExtractedServiceData {
        id: generate_id("extract"),
        timestamp: stamp.timestamp,
        source: ExtractionSource::DocumentUpload,
        service_info: ServiceInfo {
            primary_service: "Document Analysis Failed".into(),
            secondary_services: Vec::new(),
            category: "Error".into(),
            urgency_level: UrgencyLevel::Medium,
            recommended_action: DOCUMENT_FAILED_ACTION.into(),
            confidence: ConfidenceScore::failed(),
        },
        vehicle_info: VehicleInfo::default(),
        pricing: Pricing::default(),
        shop_info: ShopInfo::default(),
        technical_info: TechnicalInfo::default(),
        timeline: Timeline::default(),
        user_context: None,
        raw_data: RawData {
            original_text: None,
            extracted_text: None,
            image_metadata: Some(metadata),
            ai_response: format!("Error: {}", reason),
            processing_time: stamp.processing_time,
        },
    }
}

fn document_fallback(reply: &str) -> ModelExtraction {
    let root = json!({
        "serviceInfo": { "primaryService": service_keyword(reply), "confidence": 30 },
        "extractedText": reply,
    });
    match root {
        serde_json::Value::Object(map) => map.into(),
        _ => ModelExtraction::default(),
    }
}

/// First known service mentioned in `text`, capitalized; else "General Service".
pub fn service_keyword(text: &str) -> String {
    let lower = text.to_lowercase();
    SERVICE_KEYWORDS
        .iter()
        .find(|k| lower.contains(*k))
        .map(|k| {
            let mut chars = k.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .unwrap_or_else(|| "General Service".to_string())
}

// ---------------------------------------------------------------
// Text records
// ---------------------------------------------------------------

/// Build the record for a text reply. Without JSON the cleaned input becomes
/// the primary service and the input itself the reported symptom.
pub fn text_record(input: &str, reply: &str, stamp: Stamp) -> ExtractedServiceData {
    let parsed = ModelExtraction::parse(reply).unwrap_or_else(|| {
        warn!("No JSON object in text reply; using cleaned input");
        text_fallback(input)
    });

    let service = parsed.block("serviceInfo");
    let vehicle = parsed.block("vehicleInfo");
    let technical = parsed.block("technicalInfo");
    let timeline = parsed.block("timeline");
    let context = parsed.block("userContext");

    let vehicle_info = VehicleInfo {
        year: vehicle.and_then(|v| v.year("year")),
        make: vehicle.and_then(|v| v.text("make")),
        model: vehicle.and_then(|v| v.text("model")),
        mileage: vehicle.and_then(|v| v.count("mileage")),
        confidence: confidence_or(vehicle, 20),
        ..Default::default()
    };

    let technical_info = TechnicalInfo {
        diagnostic_codes: list_or_empty(technical, "diagnosticCodes"),
        part_numbers: Vec::new(),
        service_intervals: None,
        warranty_info: None,
        recommended_maintenance: list_or_empty(technical, "recommendedMaintenance"),
        severity: technical
            .and_then(|t| t.parsed::<Severity>("severity"))
            .unwrap_or_default(),
        confidence: confidence_or(technical, 50),
    };

    let timeline = Timeline {
        is_urgent: timeline.map(|t| t.flag("isUrgent")).unwrap_or(false),
        estimated_completion_time: timeline.and_then(|t| t.text("estimatedCompletionTime")),
        confidence: confidence_or(timeline, 45),
        ..Default::default()
    };

    ExtractedServiceData {
        id: generate_id("extract"),
        timestamp: stamp.timestamp,
        source: ExtractionSource::TextInput,
        service_info: service_info(
            service,
            clean_user_input(input),
            "Get professional diagnosis",
            60,
        ),
        vehicle_info,
        pricing: Pricing::default(),
        shop_info: ShopInfo::default(),
        technical_info,
        timeline,
        user_context: Some(user_context(context, 70)),
        raw_data: RawData {
            original_text: Some(input.to_string()),
            extracted_text: Some(reply.to_string()),
            image_metadata: None,
            ai_response: reply.to_string(),
            processing_time: stamp.processing_time,
        },
    }
}

/// The record returned when the collaborator could not be reached: built
/// from the local normalizer alone.
pub fn text_degraded_record(
    input: &str,
    normalized: &Normalized,
    reason: &str,
    stamp: Stamp,
) -> ExtractedServiceData {
    ExtractedServiceData {
        id: generate_id("extract"),
        timestamp: stamp.timestamp,
        source: ExtractionSource::TextInput,
        service_info: ServiceInfo {
            primary_service: normalized.standardized.clone(),
            secondary_services: Vec::new(),
            category: "General".into(),
            urgency_level: UrgencyLevel::Medium,
            recommended_action: "Get professional consultation".into(),
            confidence: ConfidenceScore::new(
                normalized.confidence as u32,
                ConfidenceSource::PatternMatch,
            ),
        },
        vehicle_info: VehicleInfo::default(),
        pricing: Pricing::default(),
        shop_info: ShopInfo::default(),
        technical_info: TechnicalInfo::default(),
        timeline: Timeline::default(),
        user_context: Some(UserContext {
            symptoms: vec![input.to_string()],
            confidence: ConfidenceScore::new(50, ConfidenceSource::UserInput),
            ..Default::default()
        }),
        raw_data: RawData {
            original_text: Some(input.to_string()),
            extracted_text: None,
            image_metadata: None,
            ai_response: format!("Error: {}", reason),
            processing_time: stamp.processing_time,
        },
    }
}

fn text_fallback(input: &str) -> ModelExtraction {
    let root = json!({
        "serviceInfo": { "primaryService": clean_user_input(input), "confidence": 40 },
        "userContext": { "symptoms": [input], "confidence": 60 },
    });
    match root {
        serde_json::Value::Object(map) => map.into(),
        _ => ModelExtraction::default(),
    }
}

// ---------------------------------------------------------------
// Blocks
// ---------------------------------------------------------------

fn confidence_or(block: Option<Fields<'_>>, default: u32) -> ConfidenceScore {
    block
        .map(|b| b.confidence(default))
        .unwrap_or_else(|| ConfidenceScore::ai(default))
}

fn list_or_empty(block: Option<Fields<'_>>, key: &str) -> Vec<String> {
    block.map(|b| b.list(key)).unwrap_or_default()
}

fn service_info(
    block: Option<Fields<'_>>,
    default_primary: String,
    default_action: &str,
    default_confidence: u32,
) -> ServiceInfo {
    let text = |key: &str| block.and_then(|b| b.text(key));
    ServiceInfo {
        primary_service: text("primaryService").unwrap_or(default_primary),
        secondary_services: list_or_empty(block, "secondaryServices"),
        category: text("category").unwrap_or_else(|| "General".into()),
        urgency_level: block
            .and_then(|b| b.parsed::<UrgencyLevel>("urgencyLevel"))
            .unwrap_or_default(),
        recommended_action: text("recommendedAction").unwrap_or_else(|| default_action.into()),
        confidence: confidence_or(block, default_confidence),
    }
}

fn vehicle_info(block: Option<Fields<'_>>, default_confidence: u32) -> VehicleInfo {
    let Some(b) = block else {
        return VehicleInfo {
            confidence: ConfidenceScore::ai(default_confidence),
            ..Default::default()
        };
    };
    VehicleInfo {
        year: b.year("year"),
        make: b.text("make"),
        model: b.text("model"),
        vin: b.text("vin").map(|v| v.to_uppercase()),
        mileage: b.count("mileage"),
        engine_type: b.text("engineType"),
        transmission: b.text("transmission"),
        color: b.text("color"),
        license_plate: b.text("licensePlate"),
        confidence: b.confidence(default_confidence),
    }
}

fn pricing_info(block: Option<Fields<'_>>, default_confidence: u32) -> Pricing {
    let Some(b) = block else {
        return Pricing {
            confidence: ConfidenceScore::ai(default_confidence),
            ..Default::default()
        };
    };
    Pricing {
        parts_total: b.number("partsTotal"),
        labor_total: b.number("laborTotal"),
        subtotal: b.number("subtotal"),
        taxes: b.number("taxes"),
        discounts: b.number("discounts"),
        final_total: b.number("finalTotal"),
        currency: b.text("currency").unwrap_or_else(|| "USD".into()),
        breakdown: b.line_items("breakdown"),
        confidence: b.confidence(default_confidence),
    }
}

fn shop_info(block: Option<Fields<'_>>, default_confidence: u32) -> ShopInfo {
    let Some(b) = block else {
        return ShopInfo {
            confidence: ConfidenceScore::ai(default_confidence),
            ..Default::default()
        };
    };
    ShopInfo {
        name: b.text("name"),
        address: b.text("address"),
        city: b.text("city"),
        state: b.text("state"),
        zip_code: b.text("zipCode"),
        phone: b.text("phone"),
        email: b.text("email"),
        website: b.text("website"),
        technician_name: b.text("technicianName"),
        shop_license: b.text("shopLicense"),
        confidence: b.confidence(default_confidence),
    }
}

fn technical_info(block: Option<Fields<'_>>, default_confidence: u32) -> TechnicalInfo {
    let Some(b) = block else {
        return TechnicalInfo {
            confidence: ConfidenceScore::ai(default_confidence),
            ..Default::default()
        };
    };
    TechnicalInfo {
        diagnostic_codes: b.list("diagnosticCodes"),
        part_numbers: b.list("partNumbers"),
        service_intervals: b.count("serviceIntervals"),
        warranty_info: b.text("warrantyInfo"),
        recommended_maintenance: b.list("recommendedMaintenance"),
        severity: b.parsed::<Severity>("severity").unwrap_or_default(),
        confidence: b.confidence(default_confidence),
    }
}

fn timeline_info(block: Option<Fields<'_>>, default_confidence: u32) -> Timeline {
    let Some(b) = block else {
        return Timeline {
            confidence: ConfidenceScore::ai(default_confidence),
            ..Default::default()
        };
    };
    Timeline {
        estimated_completion_time: b.text("estimatedCompletionTime"),
        scheduled_date: b.date("scheduledDate"),
        preferred_date: b.date("preferredDate"),
        due_date: b.date("dueDate"),
        is_urgent: b.flag("isUrgent"),
        next_service_date: b.date("nextServiceDate"),
        confidence: b.confidence(default_confidence),
    }
}

fn user_context(block: Option<Fields<'_>>, default_confidence: u32) -> UserContext {
    let Some(b) = block else {
        return UserContext {
            confidence: ConfidenceScore::ai(default_confidence),
            ..Default::default()
        };
    };
    UserContext {
        symptoms: b.list("symptoms"),
        duration: b.text("duration"),
        frequency: b.text("frequency"),
        driving_conditions: b.list("drivingConditions"),
        recent_services: b.list("recentServices"),
        concerns: b.list("concerns"),
        budget: b.object("budget").map(|budget| Budget {
            min: budget.number("min"),
            max: budget.number("max"),
            preferred: budget.number("preferred"),
        }),
        confidence: b.confidence(default_confidence),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::normalize;

    fn stamp() -> Stamp {
        Stamp {
            timestamp: Utc::now(),
            processing_time: 12,
        }
    }

    fn metadata() -> ImageMetadata {
        ImageMetadata {
            file_name: "invoice.png".into(),
            file_size: 1024,
            mime_type: "image/png".into(),
            upload_time: Utc::now(),
            content_hash: None,
        }
    }

    #[test]
    fn test_document_defaults_when_blocks_missing() {
        let reply = r#"{"serviceInfo": {"primaryService": "Brake Pad Replacement", "urgencyLevel": "high"},
                        "pricing": {"finalTotal": 412.75}}"#;
        let record = document_record(reply, metadata(), stamp());

        assert_eq!(record.source, ExtractionSource::DocumentUpload);
        assert_eq!(record.service_info.primary_service, "Brake Pad Replacement");
        assert_eq!(record.service_info.urgency_level, UrgencyLevel::High);
        assert_eq!(record.service_info.category, "General");
        assert_eq!(record.service_info.confidence.value, 50);
        assert_eq!(record.vehicle_info.confidence.value, 40);
        assert_eq!(record.pricing.confidence.value, 30);
        assert_eq!(record.pricing.final_total, Some(412.75));
        assert_eq!(record.shop_info.confidence.value, 40);
        assert_eq!(record.technical_info.confidence.value, 35);
        assert_eq!(record.timeline.confidence.value, 40);
        assert_eq!(record.raw_data.extracted_text.as_deref(), Some(reply));
        assert_eq!(record.raw_data.processing_time, 12);
    }

    #[test]
    fn test_document_without_json_uses_keyword() {
        let record = document_record("This invoice covers brake work.", metadata(), stamp());
        assert_eq!(record.service_info.primary_service, "Brake");
        assert_eq!(record.service_info.confidence.value, 30);
        assert_eq!(record.vehicle_info.confidence.value, 40);

        let record = document_record("Nothing recognizable", metadata(), stamp());
        assert_eq!(record.service_info.primary_service, "General Service");
    }

    #[test]
    fn test_document_failure_record() {
        let record = document_failure_record(metadata(), "timed out", stamp());
        assert_eq!(record.service_info.primary_service, "Document Analysis Failed");
        assert_eq!(record.service_info.category, "Error");
        assert_eq!(record.service_info.recommended_action, DOCUMENT_FAILED_ACTION);
        assert!(record.service_info.confidence.is_failed());
        assert!(record.vehicle_info.confidence.is_failed());
        assert!(record.pricing.confidence.is_failed());
        assert_eq!(record.raw_data.ai_response, "Error: timed out");
        assert!(record.raw_data.image_metadata.is_some());
    }

    #[test]
    fn test_text_record_defaults() {
        let reply = r#"{"serviceInfo": {"primaryService": "Brake Inspection"},
                        "vehicleInfo": {"year": 2018, "make": "Toyota", "vin": "IGNORED"},
                        "userContext": {"symptoms": ["squeal when stopping"]}}"#;
        let record = text_record("brakes squeal", reply, stamp());

        assert_eq!(record.source, ExtractionSource::TextInput);
        assert_eq!(record.service_info.primary_service, "Brake Inspection");
        assert_eq!(record.service_info.recommended_action, "Get professional diagnosis");
        assert_eq!(record.service_info.confidence.value, 60);
        assert_eq!(record.vehicle_info.make.as_deref(), Some("Toyota"));
        assert_eq!(record.vehicle_info.vin, None);
        assert_eq!(record.vehicle_info.confidence.value, 20);
        assert!(record.pricing.confidence.is_failed());
        assert!(record.shop_info.confidence.is_failed());
        assert_eq!(record.technical_info.confidence.value, 50);
        assert_eq!(record.timeline.confidence.value, 45);

        let ctx = record.user_context.unwrap();
        assert_eq!(ctx.symptoms, vec!["squeal when stopping"]);
        assert_eq!(ctx.confidence.value, 70);
        assert_eq!(record.raw_data.original_text.as_deref(), Some("brakes squeal"));
    }

    #[test]
    fn test_text_without_json_uses_cleaned_input() {
        let record = text_record("weird noise!!", "I think it's the belt.", stamp());
        assert_eq!(record.service_info.primary_service, "Weird Noise");
        assert_eq!(record.service_info.confidence.value, 40);
        let ctx = record.user_context.unwrap();
        assert_eq!(ctx.symptoms, vec!["weird noise!!"]);
        assert_eq!(ctx.confidence.value, 60);
    }

    #[test]
    fn test_text_degraded_record() {
        let input = "my braek pads are squeeking";
        let n = normalize(input);
        let record = text_degraded_record(input, &n, "connection refused", stamp());

        assert_eq!(record.service_info.primary_service, "Brake Pad Replacement");
        assert_eq!(record.service_info.confidence.source, ConfidenceSource::PatternMatch);
        assert_eq!(record.service_info.confidence.value, n.confidence);
        assert_eq!(record.service_info.recommended_action, "Get professional consultation");
        assert!(record.vehicle_info.confidence.is_failed());

        let ctx = record.user_context.unwrap();
        assert_eq!(ctx.symptoms, vec![input]);
        assert_eq!(ctx.confidence.source, ConfidenceSource::UserInput);
        assert_eq!(record.raw_data.ai_response, "Error: connection refused");
    }
}
