//! Lenient decoding of collaborator replies.
//!
//! Models wrap their JSON in prose, code fences or reasoning traces, and
//! fill fields with strings where numbers belong ("$1,234.50"), so every
//! accessor here tolerates the common variations and yields `None` rather
//! than failing the whole reply.

use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde_json::{Map, Value};

use buckled_core::{BreakdownCategory, ConfidenceScore, ConfidenceSource, LineItem};

/// Find the first balanced `{...}` span that parses as a JSON object.
pub fn find_json_object(text: &str) -> Option<Map<String, Value>> {
    for (start, _) in text.match_indices('{') {
        let Some(end) = balanced_end(&text[start..]) else {
            continue;
        };
        if let Ok(Value::Object(map)) = serde_json::from_str(&text[start..start + end]) {
            return Some(map);
        }
    }
    None
}

/// Byte length of the balanced object starting at `s[0] == '{'`.
fn balanced_end(s: &str) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, c) in s.char_indices() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(i + 1);
                }
            }
            _ => {}
        }
    }
    None
}

/// The decoded reply: top-level blocks keyed by the prompt's schema names.
#[derive(Debug, Clone, Default)]
pub struct ModelExtraction {
    root: Map<String, Value>,
}

impl ModelExtraction {
    pub fn parse(text: &str) -> Option<Self> {
        find_json_object(text).map(|root| Self { root })
    }

    /// A block such as `serviceInfo`. Non-object values count as absent.
    pub fn block(&self, name: &str) -> Option<Fields<'_>> {
        match self.root.get(name) {
            Some(Value::Object(map)) => Some(Fields(map)),
            _ => None,
        }
    }

    pub fn text(&self, name: &str) -> Option<String> {
        self.root.get(name).and_then(as_text)
    }
}

impl From<Map<String, Value>> for ModelExtraction {
    fn from(root: Map<String, Value>) -> Self {
        Self { root }
    }
}

/// Typed, forgiving access to one block's fields.
#[derive(Debug, Clone, Copy)]
pub struct Fields<'a>(&'a Map<String, Value>);

impl<'a> Fields<'a> {
    pub fn text(&self, key: &str) -> Option<String> {
        self.0.get(key).and_then(as_text)
    }

    pub fn number(&self, key: &str) -> Option<f64> {
        self.0.get(key).and_then(as_number)
    }

    /// Non-negative whole number, e.g. mileage. Rounded.
    pub fn count(&self, key: &str) -> Option<u32> {
        self.number(key)
            .filter(|n| *n >= 0.0 && *n <= u32::MAX as f64)
            .map(|n| n.round() as u32)
    }

    pub fn year(&self, key: &str) -> Option<i32> {
        self.number(key)
            .filter(|n| (1886.0..=2100.0).contains(n))
            .map(|n| n as i32)
    }

    pub fn flag(&self, key: &str) -> bool {
        match self.0.get(key) {
            Some(Value::Bool(b)) => *b,
            Some(Value::String(s)) => matches!(s.trim().to_lowercase().as_str(), "true" | "yes"),
            _ => false,
        }
    }

    /// Array of strings, or a single string as a one-element list.
    pub fn list(&self, key: &str) -> Vec<String> {
        match self.0.get(key) {
            Some(Value::Array(items)) => items.iter().filter_map(as_text).collect(),
            Some(other) => as_text(other).into_iter().collect(),
            None => Vec::new(),
        }
    }

    /// RFC 3339 timestamp or a bare `YYYY-MM-DD` date (midnight UTC).
    pub fn date(&self, key: &str) -> Option<DateTime<Utc>> {
        let raw = self.text(key)?;
        if let Ok(dt) = DateTime::parse_from_rfc3339(&raw) {
            return Some(dt.with_timezone(&Utc));
        }
        NaiveDate::parse_from_str(&raw, "%Y-%m-%d")
            .ok()
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .map(|dt| dt.and_utc())
    }

    pub fn parsed<T: FromStr>(&self, key: &str) -> Option<T> {
        self.text(key).and_then(|s| s.parse().ok())
    }

    pub fn object(&self, key: &str) -> Option<Fields<'a>> {
        match self.0.get(key) {
            Some(Value::Object(map)) => Some(Fields(map)),
            _ => None,
        }
    }

    /// The block's `confidence`, or `default` when the model omitted it.
    /// Accepts a bare number (fractions are read as percentages) or an
    /// object with a `value`.
    pub fn confidence(&self, default: u32) -> ConfidenceScore {
        let raw = match self.0.get("confidence") {
            Some(Value::Object(map)) => map.get("value").and_then(as_number),
            Some(other) => as_number(other),
            None => None,
        };
        match raw {
            Some(v) if v > 0.0 && v < 1.0 => ConfidenceScore::ai((v * 100.0).round() as u32),
            Some(v) if v >= 0.0 => ConfidenceScore::ai(v.round() as u32),
            _ => ConfidenceScore::new(default, ConfidenceSource::AiExtraction),
        }
    }

    /// Pricing line items. Entries without a name or an amount are skipped.
    pub fn line_items(&self, key: &str) -> Vec<LineItem> {
        let Some(Value::Array(items)) = self.0.get(key) else {
            return Vec::new();
        };
        items
            .iter()
            .filter_map(|item| match item {
                Value::Object(map) => line_item(Fields(map)),
                _ => None,
            })
            .collect()
    }
}

fn line_item(f: Fields<'_>) -> Option<LineItem> {
    let item = f.text("item").or_else(|| f.text("description"))?;
    let quantity = f.number("quantity");
    let unit_price = f.number("unitPrice");
    let total = f
        .number("total")
        .or_else(|| quantity.zip(unit_price).map(|(q, p)| q * p))?;
    let category = f
        .parsed::<BreakdownCategory>("category")
        .unwrap_or_else(|| guess_category(&item));
    Some(LineItem {
        item,
        quantity,
        unit_price,
        total,
        category,
    })
}

fn guess_category(item: &str) -> BreakdownCategory {
    let lower = item.to_lowercase();
    if lower.contains("labor") || lower.contains("labour") {
        BreakdownCategory::Labor
    } else if lower.contains("tax") {
        BreakdownCategory::Tax
    } else if lower.contains("discount") || lower.contains("coupon") {
        BreakdownCategory::Discount
    } else if lower.contains("fee") || lower.contains("disposal") || lower.contains("supplies") {
        BreakdownCategory::Fee
    } else {
        BreakdownCategory::Parts
    }
}

fn as_text(v: &Value) -> Option<String> {
    let s = match v {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        _ => return None,
    };
    match s.to_lowercase().as_str() {
        "" | "null" | "none" | "n/a" | "unknown" => None,
        _ => Some(s),
    }
}

fn as_number(v: &Value) -> Option<f64> {
    match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => {
            let cleaned: String = s
                .chars()
                .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
                .collect();
            cleaned.parse().ok()
        }
        _ => None,
    }
}
