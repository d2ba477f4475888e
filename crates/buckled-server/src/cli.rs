//! Backup subcommands: `export [file]` and `import <file>`.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use tracing::info;

use buckled_core::Result;
use buckled_store::{ImportSummary, ServiceStore};

/// Counts written by an export.
#[derive(Debug)]
pub struct ExportReport {
    pub path: PathBuf,
    pub extractions: usize,
    pub vehicle_profiles: usize,
    pub has_session: bool,
}

/// `exports/buckled-export-YYYYMMDD-HHMMSS.json`
pub fn default_export_path(exports_dir: &Path, now: DateTime<Utc>) -> PathBuf {
    exports_dir.join(format!("buckled-export-{}.json", now.format("%Y%m%d-%H%M%S")))
}

pub fn export_to(store: &ServiceStore, path: &Path) -> Result<ExportReport> {
    let bundle = store.export_all()?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, serde_json::to_string_pretty(&bundle)?)?;
    info!("Exported backup to {}", path.display());

    Ok(ExportReport {
        path: path.to_path_buf(),
        extractions: bundle.extracted_data.len(),
        vehicle_profiles: bundle.vehicle_profiles.len(),
        has_session: bundle.user_session.is_some(),
    })
}

pub fn import_from(store: &ServiceStore, path: &Path) -> Result<ImportSummary> {
    let json = std::fs::read_to_string(path)?;
    store.import_json(&json)
}

pub fn print_export(report: &ExportReport) {
    println!("=== Buckled Export ===");
    println!();
    println!("File:              {}", report.path.display());
    println!("Extractions:       {}", report.extractions);
    println!("Vehicle profiles:  {}", report.vehicle_profiles);
    println!("Session:           {}", if report.has_session { "included" } else { "none" });
}

pub fn print_import(summary: &ImportSummary) {
    println!("=== Buckled Import ===");
    println!();
    println!("Extractions:       {}", summary.extractions);
    println!("Vehicle profiles:  {}", summary.vehicle_profiles);
    println!("Session:           {}", if summary.session_restored { "restored" } else { "not restored" });
    if summary.skipped > 0 {
        println!("Skipped:           {}", summary.skipped);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_default_export_name() {
        let now = Utc.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap();
        let path = default_export_path(Path::new("data/exports"), now);
        assert_eq!(path, PathBuf::from("data/exports/buckled-export-20240309-140507.json"));
    }

    #[test]
    fn test_export_then_import_into_fresh_store() {
        let src = tempfile::tempdir().unwrap();
        let dst = tempfile::tempdir().unwrap();

        let store = ServiceStore::open(src.path().join("db"), src.path().join("session-cache.json")).unwrap();
        let mut session = store.get_user_session().unwrap();
        session.preferences.service_radius = 60;
        store.save_user_session(&session).unwrap();

        let file = src.path().join("backups/out.json");
        let report = export_to(&store, &file).unwrap();
        assert!(file.exists());
        assert_eq!(report.extractions, 0);
        assert!(report.has_session);

        let fresh = ServiceStore::open(dst.path().join("db"), dst.path().join("session-cache.json")).unwrap();
        let summary = import_from(&fresh, &file).unwrap();
        assert!(summary.session_restored);
        assert_eq!(fresh.get_user_session().unwrap().preferences.service_radius, 60);
    }

    #[test]
    fn test_import_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = ServiceStore::open(dir.path().join("db"), dir.path().join("session-cache.json")).unwrap();
        assert!(import_from(&store, &dir.path().join("nope.json")).is_err());
    }
}
