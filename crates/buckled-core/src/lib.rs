//! Buckled Core: data model, configuration, validation and errors shared by
//! the extraction, storage and context crates.

pub mod config;
pub mod error;
pub mod model;
pub mod tally;
pub mod validate;

pub use config::{BuckledConfig, DataPaths};
pub use error::{Error, Result};
pub use model::*;
