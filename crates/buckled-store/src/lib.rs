//! Buckled Store: SQLite persistence for extractions, vehicle profiles and
//! the user session, plus a JSON mirror of the session's preferences.

pub mod cache;
pub mod schema;
pub mod sqlite;
pub mod stats;
pub mod types;

pub use cache::{CachedSession, SessionCache};
pub use sqlite::ServiceStore;
pub use types::*;
