//! Data model for extractions, vehicle profiles, the user session and the
//! derived recommendations/insights.
//!
//! All records serialize with camelCase keys. Optional fields are written as
//! explicit `null` so that exported backups keep a stable shape.

pub mod confidence;
pub mod extraction;
pub mod insights;
pub mod session;
pub mod vehicle;

pub use confidence::{ConfidenceScore, ConfidenceSource};
pub use extraction::*;
pub use insights::*;
pub use session::*;
pub use vehicle::*;

/// Generate a record id such as `vehicle_1718035200000_3f9a2c1de`.
pub fn generate_id(prefix: &str) -> String {
    let suffix = uuid::Uuid::new_v4().simple().to_string();
    format!(
        "{}_{}_{}",
        prefix,
        chrono::Utc::now().timestamp_millis(),
        &suffix[..9]
    )
}
