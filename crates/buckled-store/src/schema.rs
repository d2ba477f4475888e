//! Database schema SQL.
//!
//! Each record is stored whole in `body_json`; the scalar columns beside it
//! exist for ordering, filtering and the lookup indexes.

/// Extraction records. `timestamp` is epoch milliseconds.
pub const EXTRACTIONS_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS extracted_data (
    id TEXT PRIMARY KEY,
    timestamp INTEGER NOT NULL,
    source TEXT NOT NULL,
    primary_service TEXT NOT NULL,
    category TEXT NOT NULL,
    vehicle_make TEXT,
    body_json TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_extracted_timestamp ON extracted_data(timestamp);
CREATE INDEX IF NOT EXISTS idx_extracted_source ON extracted_data(source);
CREATE INDEX IF NOT EXISTS idx_extracted_primary_service ON extracted_data(primary_service);
CREATE INDEX IF NOT EXISTS idx_extracted_category ON extracted_data(category);
CREATE INDEX IF NOT EXISTS idx_extracted_vehicle_make ON extracted_data(vehicle_make);
"#;

/// Vehicle profiles. Soft-deleted rows keep `is_active = 0`.
pub const VEHICLES_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS vehicle_profiles (
    id TEXT PRIMARY KEY,
    make TEXT,
    model TEXT,
    year INTEGER,
    vin TEXT,
    is_active INTEGER NOT NULL DEFAULT 1,
    last_updated INTEGER NOT NULL,
    body_json TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_vehicle_make ON vehicle_profiles(make);
CREATE INDEX IF NOT EXISTS idx_vehicle_model ON vehicle_profiles(model);
CREATE INDEX IF NOT EXISTS idx_vehicle_year ON vehicle_profiles(year);
CREATE INDEX IF NOT EXISTS idx_vehicle_vin ON vehicle_profiles(vin);
CREATE INDEX IF NOT EXISTS idx_vehicle_active ON vehicle_profiles(is_active);
"#;

/// User session rows. Only the most recently active one is read back.
pub const SESSION_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS user_session (
    session_id TEXT PRIMARY KEY,
    last_active INTEGER NOT NULL,
    body_json TEXT NOT NULL
);
"#;
