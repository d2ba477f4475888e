//! Buckled Context: turns stored extractions into vehicle profiles, session
//! aggregates, ranked service recommendations and per-vehicle insights.

pub mod catalog;
pub mod insights;
pub mod manager;
pub mod matcher;
pub mod merge;
pub mod profile;
pub mod recommend;
pub mod session;

pub use manager::{ProcessOutcome, SmartContext};
pub use matcher::{best_match, match_score, VehicleMatch};
pub use merge::{merge_confidence, merge_field, ReliabilityTable};
