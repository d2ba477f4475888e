//! Prompt text and request builders for the collaborator.

use buckled_core::UserSessionData;

use crate::backend::{ChatMessage, CompletionRequest};
use crate::normalize::Normalized;

const DOCUMENT_MAX_TOKENS: u32 = 2000;
const TEXT_MAX_TOKENS: u32 = 1000;
const PING_MAX_TOKENS: u32 = 50;
const TEMPERATURE: f32 = 0.1;

const DOCUMENT_SCHEMA: &str = r#"{
  "serviceInfo": {
    "primaryService": "main service performed or recommended",
    "secondaryServices": ["additional services"],
    "category": "Maintenance | Repair | Inspection | Diagnostic | General",
    "urgencyLevel": "low | medium | high | emergency",
    "recommendedAction": "what the owner should do next",
    "confidence": 0-100
  },
  "vehicleInfo": {
    "year": number, "make": "string", "model": "string", "vin": "string",
    "mileage": number, "engineType": "string", "transmission": "string",
    "color": "string", "licensePlate": "string", "confidence": 0-100
  },
  "pricing": {
    "partsTotal": number, "laborTotal": number, "subtotal": number,
    "taxes": number, "discounts": number, "finalTotal": number,
    "currency": "USD",
    "breakdown": [{"item": "string", "quantity": number, "unitPrice": number,
                   "total": number, "category": "parts | labor | fee | tax | discount"}],
    "confidence": 0-100
  },
  "shopInfo": {
    "name": "string", "address": "string", "city": "string", "state": "string",
    "zipCode": "string", "phone": "string", "email": "string", "website": "string",
    "technicianName": "string", "shopLicense": "string", "confidence": 0-100
  },
  "technicalInfo": {
    "diagnosticCodes": ["OBD codes"], "partNumbers": ["string"],
    "serviceIntervals": number, "warrantyInfo": "string",
    "recommendedMaintenance": ["future services the technician suggested"],
    "severity": "routine | recommended | needed | critical",
    "confidence": 0-100
  },
  "timeline": {
    "estimatedCompletionTime": "string", "scheduledDate": "YYYY-MM-DD",
    "dueDate": "YYYY-MM-DD", "isUrgent": boolean,
    "nextServiceDate": "YYYY-MM-DD", "confidence": 0-100
  },
  "extractedText": "all legible text from the document"
}"#;

const TEXT_SCHEMA: &str = r#"{
  "serviceInfo": {
    "primaryService": "most likely service needed",
    "secondaryServices": ["related services"],
    "category": "Maintenance | Repair | Inspection | Diagnostic | General",
    "urgencyLevel": "low | medium | high | emergency",
    "recommendedAction": "what the owner should do next",
    "confidence": 0-100
  },
  "vehicleInfo": {"year": number, "make": "string", "model": "string", "mileage": number},
  "technicalInfo": {
    "diagnosticCodes": ["OBD codes if mentioned"],
    "recommendedMaintenance": ["string"],
    "severity": "routine | recommended | needed | critical"
  },
  "timeline": {"isUrgent": boolean, "estimatedCompletionTime": "string"},
  "userContext": {
    "symptoms": ["string"], "duration": "string", "frequency": "string",
    "drivingConditions": ["string"], "recentServices": ["string"],
    "concerns": ["string"],
    "budget": {"min": number, "max": number, "preferred": number}
  }
}"#;

/// Request for reading an uploaded service document.
pub fn document_request(
    model: &str,
    data_url: String,
    session: Option<&UserSessionData>,
) -> CompletionRequest {
    let context = session.map(session_context).unwrap_or_default();
    let prompt = format!(
        "You are an automotive service document analyst. Read this invoice, \
         estimate or inspection report and extract every detail you can find.\n{}\n\
         Respond with a single JSON object using exactly this structure. Use null \
         for anything that is not on the document and report a 0-100 confidence \
         for each block:\n{}\n\nRespond with JSON only.",
        context, DOCUMENT_SCHEMA
    );

    CompletionRequest {
        model: model.to_string(),
        messages: vec![ChatMessage::user_with_image(prompt, data_url)],
        max_tokens: DOCUMENT_MAX_TOKENS,
        temperature: Some(TEMPERATURE),
    }
}

/// Request for interpreting a typed description of a problem or service.
pub fn text_request(
    model: &str,
    input: &str,
    normalized: &Normalized,
    session: Option<&UserSessionData>,
) -> CompletionRequest {
    let context = session.map(session_context).unwrap_or_default();
    let prompt = format!(
        "You are an automotive service advisor. A car owner described their \
         situation in their own words.\n\n\
         Original input: \"{}\"\n\
         Spell-corrected input: \"{}\"\n\
         Suggested service: \"{}\"\n{}\n\
         Work out the service they most likely need, any vehicle details they \
         mentioned, and their symptoms. Respond with a single JSON object using \
         this structure, with null for anything not mentioned:\n{}\n\n\
         Respond with JSON only.",
        input, normalized.corrected, normalized.standardized, context, TEXT_SCHEMA
    );

    CompletionRequest {
        model: model.to_string(),
        messages: vec![ChatMessage::user_text(prompt)],
        max_tokens: TEXT_MAX_TOKENS,
        temperature: Some(TEMPERATURE),
    }
}

/// Minimal request used to check connectivity and credentials.
pub fn ping_request(model: &str) -> CompletionRequest {
    CompletionRequest {
        model: model.to_string(),
        messages: vec![ChatMessage::user_text(
            "Respond with \"OK\" if you can read this message.",
        )],
        max_tokens: PING_MAX_TOKENS,
        temperature: None,
    }
}

fn session_context(session: &UserSessionData) -> String {
    let mut lines = vec!["\nOwner context:".to_string()];

    let place: Vec<&str> = [&session.location.city, &session.location.state]
        .into_iter()
        .filter_map(|s| s.as_deref())
        .collect();
    if !place.is_empty() {
        lines.push(format!("- Location: {}", place.join(", ")));
    }

    let budget = &session.preferences.budget_range;
    lines.push(format!("- Budget: ${:.0}-${:.0}", budget.min, budget.max));
    lines.push(format!(
        "- Service radius: {} miles",
        session.preferences.service_radius
    ));

    let favorites = &session.service_history.favorite_categories;
    if !favorites.is_empty() {
        lines.push(format!("- Usual service categories: {}", favorites.join(", ")));
    }

    lines.join("\n")
}
