//! SQLite-backed store for extractions, vehicle profiles and the user session.
//!
//! The connection is opened on first use; schema creation is idempotent.
//! Every operation takes the connection lock for the duration of a single
//! statement or transaction.

use std::path::{Path, PathBuf};

use chrono::{DateTime, SecondsFormat, Utc};
use once_cell::sync::OnceCell;
use parking_lot::{Mutex, MutexGuard};
use rusqlite::{params, Connection, OptionalExtension};
use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};

use buckled_core::validate::validate_zip_code;
use buckled_core::{
    Error, ExtractedServiceData, LocationUpdate, PreferencesUpdate, Result, UserSessionData,
    VehicleProfile, VehicleProfileEdit,
};

use crate::cache::{CachedSession, SessionCache};
use crate::schema::{EXTRACTIONS_SQL, SESSION_SQL, VEHICLES_SQL};
use crate::stats;
use crate::types::*;

pub struct ServiceStore {
    db_path: PathBuf,
    conn: OnceCell<Mutex<Connection>>,
    cache: SessionCache,
}

impl ServiceStore {
    /// Prepare the store. The file will be `db_dir/buckled.db`; it is not
    /// opened until the first operation.
    pub fn open(db_dir: impl AsRef<Path>, cache_file: impl AsRef<Path>) -> Result<Self> {
        let db_dir = db_dir.as_ref();
        std::fs::create_dir_all(db_dir).map_err(|e| Error::Storage(e.to_string()))?;

        Ok(Self {
            db_path: db_dir.join("buckled.db"),
            conn: OnceCell::new(),
            cache: SessionCache::load(cache_file),
        })
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        let cell = self.conn.get_or_try_init(|| -> Result<Mutex<Connection>> {
            let conn = Self::create_connection(&self.db_path)?;
            Self::init_schema(&conn)?;
            info!("ServiceStore initialized: path={}", self.db_path.display());
            Ok(Mutex::new(conn))
        })?;
        Ok(cell.lock())
    }

    fn create_connection(db_path: &Path) -> Result<Connection> {
        let conn = Connection::open(db_path).map_err(|e| Error::Database(e.to_string()))?;
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA foreign_keys = ON;
             PRAGMA synchronous = NORMAL;",
        )
        .map_err(|e| Error::Database(e.to_string()))?;
        Ok(conn)
    }

    fn init_schema(conn: &Connection) -> Result<()> {
        let full_schema = format!("{}\n{}\n{}", EXTRACTIONS_SQL, VEHICLES_SQL, SESSION_SQL);
        conn.execute_batch(&full_schema)
            .map_err(|e| Error::Database(format!("Schema init failed: {}", e)))?;
        Ok(())
    }

    // ---------------------------------------------------------------
    // Extractions
    // ---------------------------------------------------------------

    /// Insert or replace an extraction by id.
    pub fn save_extraction(&self, data: &ExtractedServiceData) -> Result<()> {
        let body = serde_json::to_string(data)?;
        let conn = self.conn()?;
        conn.prepare_cached(
            "INSERT INTO extracted_data
                (id, timestamp, source, primary_service, category, vehicle_make, body_json)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
             ON CONFLICT(id) DO UPDATE SET
                timestamp = excluded.timestamp,
                source = excluded.source,
                primary_service = excluded.primary_service,
                category = excluded.category,
                vehicle_make = excluded.vehicle_make,
                body_json = excluded.body_json",
        )
        .map_err(|e| Error::Database(e.to_string()))?
        .execute(params![
            data.id,
            data.timestamp.timestamp_millis(),
            data.source.as_str(),
            data.service_info.primary_service,
            data.service_info.category,
            data.vehicle_info.make,
            body,
        ])
        .map_err(|e| Error::Database(e.to_string()))?;
        debug!("Saved extraction {}", data.id);
        Ok(())
    }

    pub fn get_extraction(&self, id: &str) -> Result<Option<ExtractedServiceData>> {
        let conn = self.conn()?;
        let body: Option<String> = conn
            .prepare_cached("SELECT body_json FROM extracted_data WHERE id = ?1")
            .map_err(|e| Error::Database(e.to_string()))?
            .query_row(params![id], |row| row.get(0))
            .optional()
            .map_err(|e| Error::Database(e.to_string()))?;
        match body {
            Some(b) => Ok(Some(serde_json::from_str(&b)?)),
            None => Ok(None),
        }
    }

    /// All extractions, newest first.
    pub fn get_all_extractions(&self) -> Result<Vec<ExtractedServiceData>> {
        self.load_bodies(
            "SELECT body_json FROM extracted_data ORDER BY timestamp DESC, id DESC",
        )
    }

    pub fn count_extractions(&self) -> Result<i64> {
        let conn = self.conn()?;
        conn.query_row("SELECT COUNT(*) FROM extracted_data", [], |row| row.get(0))
            .map_err(|e| Error::Database(e.to_string()))
    }

    /// Hard delete. Returns false if the id was unknown.
    pub fn delete_extraction(&self, id: &str) -> Result<bool> {
        self.delete_record(Collection::Extractions, id)
    }

    /// Case-insensitive substring search across the text fields of every
    /// extraction. Results are newest first.
    pub fn search_extractions(&self, query: &str) -> Result<Vec<ExtractedServiceData>> {
        let needle = query.trim().to_lowercase();
        let all = self.get_all_extractions()?;
        if needle.is_empty() {
            return Ok(all);
        }
        Ok(all
            .into_iter()
            .filter(|d| Self::matches_query(d, &needle))
            .collect())
    }

    fn matches_query(data: &ExtractedServiceData, needle: &str) -> bool {
        let contains = |s: &str| s.to_lowercase().contains(needle);

        let singles = [
            Some(data.service_info.primary_service.as_str()),
            Some(data.service_info.category.as_str()),
            data.vehicle_info.make.as_deref(),
            data.vehicle_info.model.as_deref(),
            data.shop_info.name.as_deref(),
            data.raw_data.original_text.as_deref(),
            data.raw_data.extracted_text.as_deref(),
        ];
        if singles.into_iter().flatten().any(contains) {
            return true;
        }

        let symptoms = data
            .user_context
            .as_ref()
            .map(|c| c.symptoms.as_slice())
            .unwrap_or_default();

        data.service_info
            .secondary_services
            .iter()
            .chain(symptoms)
            .chain(&data.technical_info.recommended_maintenance)
            .any(|s| contains(s))
    }

    // ---------------------------------------------------------------
    // Vehicle Profiles
    // ---------------------------------------------------------------

    /// Insert or replace a profile by id.
    pub fn save_vehicle_profile(&self, profile: &VehicleProfile) -> Result<()> {
        let body = serde_json::to_string(profile)?;
        let conn = self.conn()?;
        conn.prepare_cached(
            "INSERT INTO vehicle_profiles
                (id, make, model, year, vin, is_active, last_updated, body_json)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
             ON CONFLICT(id) DO UPDATE SET
                make = excluded.make,
                model = excluded.model,
                year = excluded.year,
                vin = excluded.vin,
                is_active = excluded.is_active,
                last_updated = excluded.last_updated,
                body_json = excluded.body_json",
        )
        .map_err(|e| Error::Database(e.to_string()))?
        .execute(params![
            profile.id,
            profile.identity.make,
            profile.identity.model,
            profile.identity.year,
            profile.identity.vin,
            profile.is_active,
            profile.last_updated.timestamp_millis(),
            body,
        ])
        .map_err(|e| Error::Database(e.to_string()))?;
        debug!("Saved vehicle profile {}", profile.id);
        Ok(())
    }

    /// Fetch a profile by id, including soft-deleted ones.
    pub fn get_vehicle_profile(&self, id: &str) -> Result<Option<VehicleProfile>> {
        let conn = self.conn()?;
        let body: Option<String> = conn
            .prepare_cached("SELECT body_json FROM vehicle_profiles WHERE id = ?1")
            .map_err(|e| Error::Database(e.to_string()))?
            .query_row(params![id], |row| row.get(0))
            .optional()
            .map_err(|e| Error::Database(e.to_string()))?;
        match body {
            Some(b) => Ok(Some(serde_json::from_str(&b)?)),
            None => Ok(None),
        }
    }

    /// Active profiles, most recently updated first.
    pub fn get_all_vehicle_profiles(&self) -> Result<Vec<VehicleProfile>> {
        self.load_bodies(
            "SELECT body_json FROM vehicle_profiles WHERE is_active = 1
             ORDER BY last_updated DESC, id DESC",
        )
    }

    fn get_every_vehicle_profile(&self) -> Result<Vec<VehicleProfile>> {
        self.load_bodies("SELECT body_json FROM vehicle_profiles ORDER BY last_updated DESC, id DESC")
    }

    pub fn count_active_vehicles(&self) -> Result<i64> {
        let conn = self.conn()?;
        conn.query_row(
            "SELECT COUNT(*) FROM vehicle_profiles WHERE is_active = 1",
            [],
            |row| row.get(0),
        )
        .map_err(|e| Error::Database(e.to_string()))
    }

    /// Apply a user edit. Fails with `NotFound` for an unknown id.
    pub fn update_vehicle_profile(
        &self,
        id: &str,
        edit: &VehicleProfileEdit,
    ) -> Result<VehicleProfile> {
        let mut profile = self
            .get_vehicle_profile(id)?
            .ok_or_else(|| Error::NotFound(format!("Vehicle profile {}", id)))?;
        edit.apply(&mut profile, Utc::now());
        self.save_vehicle_profile(&profile)?;
        Ok(profile)
    }

    /// Soft delete: the profile stays stored but drops out of listings.
    pub fn delete_vehicle_profile(&self, id: &str) -> Result<bool> {
        self.delete_record(Collection::VehicleProfiles, id)
    }

    // ---------------------------------------------------------------
    // User Session
    // ---------------------------------------------------------------

    /// The most recently active stored session, if any.
    pub fn latest_user_session(&self) -> Result<Option<UserSessionData>> {
        let conn = self.conn()?;
        let body: Option<String> = conn
            .prepare_cached(
                "SELECT body_json FROM user_session ORDER BY last_active DESC LIMIT 1",
            )
            .map_err(|e| Error::Database(e.to_string()))?
            .query_row([], |row| row.get(0))
            .optional()
            .map_err(|e| Error::Database(e.to_string()))?;
        match body {
            Some(b) => Ok(Some(serde_json::from_str(&b)?)),
            None => Ok(None),
        }
    }

    /// The stored session, or a fresh unsaved default.
    pub fn get_user_session(&self) -> Result<UserSessionData> {
        Ok(self
            .latest_user_session()?
            .unwrap_or_else(|| UserSessionData::new_default(Utc::now())))
    }

    /// Upsert the session and refresh the preferences mirror.
    pub fn save_user_session(&self, session: &UserSessionData) -> Result<()> {
        let body = serde_json::to_string(session)?;
        {
            let conn = self.conn()?;
            conn.prepare_cached(
                "INSERT INTO user_session (session_id, last_active, body_json)
                 VALUES (?1, ?2, ?3)
                 ON CONFLICT(session_id) DO UPDATE SET
                    last_active = excluded.last_active,
                    body_json = excluded.body_json",
            )
            .map_err(|e| Error::Database(e.to_string()))?
            .execute(params![
                session.session_id,
                session.last_active.timestamp_millis(),
                body,
            ])
            .map_err(|e| Error::Database(e.to_string()))?;
        }
        self.cache.store(session);
        debug!("Saved user session {}", session.session_id);
        Ok(())
    }

    pub fn update_user_preferences(&self, update: &PreferencesUpdate) -> Result<UserSessionData> {
        let mut session = self.get_user_session()?;
        update.apply(&mut session.preferences);
        session.last_active = Utc::now();
        self.save_user_session(&session)?;
        Ok(session)
    }

    /// Update the user's location. A ZIP code must look like `12345` or
    /// `12345-6789`; nothing is written otherwise.
    pub fn update_user_location(&self, update: &LocationUpdate) -> Result<UserSessionData> {
        if let Some(zip) = &update.zip_code {
            validate_zip_code(zip)?;
        }

        let mut session = self.get_user_session()?;
        let now = Utc::now();
        let loc = &mut session.location;
        if let Some(zip) = &update.zip_code {
            loc.zip_code = Some(zip.trim().to_string());
        }
        if let Some(city) = &update.city {
            loc.city = Some(city.clone());
        }
        if let Some(state) = &update.state {
            loc.state = Some(state.clone());
        }
        if let Some(coords) = update.coordinates {
            loc.coordinates = Some(coords);
        }
        loc.last_updated = now;
        session.last_active = now;

        self.save_user_session(&session)?;
        Ok(session)
    }

    /// Preferences and location of the last saved session, without a
    /// database round trip.
    pub fn cached_session(&self) -> Option<CachedSession> {
        self.cache.get()
    }

    // ---------------------------------------------------------------
    // Stats
    // ---------------------------------------------------------------

    pub fn service_stats(&self) -> Result<ServiceStats> {
        Ok(stats::service_stats(&self.get_all_extractions()?))
    }

    pub fn quick_stats(&self, now: DateTime<Utc>) -> Result<QuickStats> {
        let records = self.get_all_extractions()?;
        let vehicles = self.count_active_vehicles()? as usize;
        Ok(stats::quick_stats(&records, vehicles, now))
    }

    // ---------------------------------------------------------------
    // Backup
    // ---------------------------------------------------------------

    /// Snapshot of every collection. Soft-deleted profiles are included.
    pub fn export_all(&self) -> Result<ExportBundle> {
        Ok(ExportBundle {
            export_date: Utc::now(),
            version: EXPORT_VERSION.to_string(),
            extracted_data: self.get_all_extractions()?,
            vehicle_profiles: self.get_every_vehicle_profile()?,
            user_session: self.latest_user_session()?,
        })
    }

    pub fn export_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.export_all()?)?)
    }

    /// Upsert every record in the bundle. Records that fail to decode or
    /// save are skipped and counted; earlier writes are not rolled back.
    pub fn import_bundle(&self, bundle: ImportBundle) -> Result<ImportSummary> {
        match bundle.version.as_deref() {
            Some(EXPORT_VERSION) => {}
            other => warn!("Importing backup with unexpected version {:?}", other),
        }

        let mut summary = ImportSummary::default();

        for value in bundle.extracted_data {
            if self.import_one::<ExtractedServiceData, _>(value, |d| self.save_extraction(d)) {
                summary.extractions += 1;
            } else {
                summary.skipped += 1;
            }
        }

        for value in bundle.vehicle_profiles {
            if self.import_one::<VehicleProfile, _>(value, |p| self.save_vehicle_profile(p)) {
                summary.vehicle_profiles += 1;
            } else {
                summary.skipped += 1;
            }
        }

        if let Some(value) = bundle.user_session {
            if self.import_one::<UserSessionData, _>(value, |s| self.save_user_session(s)) {
                summary.session_restored = true;
            } else {
                summary.skipped += 1;
            }
        }

        info!(
            "Import complete: {} extractions, {} vehicles, session={}, skipped={}",
            summary.extractions, summary.vehicle_profiles, summary.session_restored, summary.skipped
        );
        Ok(summary)
    }

    pub fn import_json(&self, json: &str) -> Result<ImportSummary> {
        let bundle: ImportBundle = serde_json::from_str(json)?;
        self.import_bundle(bundle)
    }

    fn import_one<T, F>(&self, value: serde_json::Value, save: F) -> bool
    where
        T: DeserializeOwned,
        F: FnOnce(&T) -> Result<()>,
    {
        let record: T = match serde_json::from_value(value) {
            Ok(r) => r,
            Err(e) => {
                warn!("Skipping malformed {}: {}", std::any::type_name::<T>(), e);
                return false;
            }
        };
        match save(&record) {
            Ok(()) => true,
            Err(e) => {
                warn!("Failed to import {}: {}", std::any::type_name::<T>(), e);
                false
            }
        }
    }

    /// Remove every record from every collection and drop the mirror.
    pub fn clear_all(&self) -> Result<()> {
        {
            let mut conn = self.conn()?;
            let tx = conn
                .transaction()
                .map_err(|e| Error::Database(e.to_string()))?;
            for collection in Collection::ALL {
                tx.execute(&format!("DELETE FROM {}", collection.table()), [])
                    .map_err(|e| Error::Database(e.to_string()))?;
            }
            tx.commit().map_err(|e| Error::Database(e.to_string()))?;
        }
        self.cache.clear();
        info!("Cleared all stored data");
        Ok(())
    }

    // ---------------------------------------------------------------
    // Helpers
    // ---------------------------------------------------------------

    fn delete_record(&self, collection: Collection, id: &str) -> Result<bool> {
        let conn = self.conn()?;
        let count = match collection.deletion_policy() {
            DeletionPolicy::Hard => conn
                .execute(
                    &format!(
                        "DELETE FROM {} WHERE {} = ?1",
                        collection.table(),
                        collection.key_column()
                    ),
                    params![id],
                )
                .map_err(|e| Error::Database(e.to_string()))?,
            DeletionPolicy::Soft => {
                let now = Utc::now();
                conn.execute(
                    &format!(
                        "UPDATE {} SET is_active = 0, last_updated = ?2,
                            body_json = json_set(body_json, '$.isActive', json('false'), '$.lastUpdated', ?3)
                         WHERE {} = ?1 AND is_active = 1",
                        collection.table(),
                        collection.key_column()
                    ),
                    params![
                        id,
                        now.timestamp_millis(),
                        now.to_rfc3339_opts(SecondsFormat::Millis, true)
                    ],
                )
                .map_err(|e| Error::Database(e.to_string()))?
            }
        };
        if count > 0 {
            info!("Deleted {} from {} ({:?})", id, collection.table(), collection.deletion_policy());
        }
        Ok(count > 0)
    }

    /// Decode `body_json` rows, skipping any that no longer parse.
    fn load_bodies<T: DeserializeOwned>(&self, sql: &str) -> Result<Vec<T>> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare_cached(sql)
            .map_err(|e| Error::Database(e.to_string()))?;
        let bodies = stmt
            .query_map([], |row| row.get::<_, String>(0))
            .map_err(|e| Error::Database(e.to_string()))?
            .filter_map(|r| match r {
                Ok(body) => Some(body),
                Err(e) => {
                    warn!("Skipping unreadable row: {}", e);
                    None
                }
            })
            .collect::<Vec<_>>();

        Ok(bodies
            .into_iter()
            .filter_map(|b| match serde_json::from_str(&b) {
                Ok(v) => Some(v),
                Err(e) => {
                    warn!("Skipping unreadable row: {}", e);
                    None
                }
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use buckled_core::*;
    use chrono::{Duration, TimeZone};
    use tempfile::TempDir;

    fn test_store() -> (ServiceStore, TempDir) {
        let dir = TempDir::new().unwrap();
        let store =
            ServiceStore::open(dir.path().join("db"), dir.path().join("session-cache.json"))
                .unwrap();
        (store, dir)
    }

    fn extraction(id: &str, service: &str, ts: DateTime<Utc>) -> ExtractedServiceData {
        ExtractedServiceData {
            id: id.into(),
            timestamp: ts,
            source: ExtractionSource::TextInput,
            service_info: ServiceInfo {
                primary_service: service.into(),
                secondary_services: vec![],
                category: "Maintenance".into(),
                urgency_level: UrgencyLevel::Medium,
                recommended_action: "Schedule service".into(),
                confidence: ConfidenceScore::ai(80),
            },
            vehicle_info: VehicleInfo::default(),
            pricing: Pricing::default(),
            shop_info: ShopInfo::default(),
            technical_info: TechnicalInfo::default(),
            timeline: Timeline::default(),
            user_context: None,
            raw_data: RawData::default(),
        }
    }

    fn profile(id: &str, updated: DateTime<Utc>) -> VehicleProfile {
        VehicleProfile {
            id: id.into(),
            created_at: updated,
            last_updated: updated,
            identity: VehicleIdentity {
                make: Some("Toyota".into()),
                model: Some("Camry".into()),
                year: Some(2018),
                confidence: ConfidenceScore::ai(70),
                ..Default::default()
            },
            specifications: VehicleSpecifications {
                engine_type: None,
                engine_size: None,
                transmission: None,
                drivetrain: None,
                fuel_type: None,
                mileage: Some(42_000),
                last_mileage_update: updated,
                confidence: ConfidenceScore::ai(70),
            },
            service_history: vec![],
            maintenance_schedule: vec![],
            known_issues: vec![],
            user_notes: String::new(),
            tags: vec![],
            is_active: true,
        }
    }

    fn at(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, day, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_save_and_get_extraction() {
        let (store, _dir) = test_store();
        let data = extraction("e1", "Oil Change", at(1));
        store.save_extraction(&data).unwrap();

        let loaded = store.get_extraction("e1").unwrap().unwrap();
        assert_eq!(loaded, data);
        assert!(store.get_extraction("missing").unwrap().is_none());
    }

    #[test]
    fn test_save_is_upsert() {
        let (store, _dir) = test_store();
        let mut data = extraction("e1", "Oil Change", at(1));
        store.save_extraction(&data).unwrap();
        data.service_info.primary_service = "Brake Service".into();
        store.save_extraction(&data).unwrap();

        assert_eq!(store.count_extractions().unwrap(), 1);
        let loaded = store.get_extraction("e1").unwrap().unwrap();
        assert_eq!(loaded.service_info.primary_service, "Brake Service");
    }

    #[test]
    fn test_extractions_newest_first() {
        let (store, _dir) = test_store();
        store.save_extraction(&extraction("old", "Oil Change", at(1))).unwrap();
        store.save_extraction(&extraction("new", "Tire Rotation", at(9))).unwrap();
        store.save_extraction(&extraction("mid", "Brake Service", at(5))).unwrap();

        let ids: Vec<String> = store
            .get_all_extractions()
            .unwrap()
            .into_iter()
            .map(|d| d.id)
            .collect();
        assert_eq!(ids, vec!["new", "mid", "old"]);
    }

    #[test]
    fn test_extraction_delete_is_hard() {
        let (store, _dir) = test_store();
        store.save_extraction(&extraction("e1", "Oil Change", at(1))).unwrap();

        assert!(store.delete_extraction("e1").unwrap());
        assert!(!store.delete_extraction("e1").unwrap());
        assert!(store.get_extraction("e1").unwrap().is_none());
        assert_eq!(store.count_extractions().unwrap(), 0);
    }

    #[test]
    fn test_vehicle_delete_is_soft() {
        let (store, _dir) = test_store();
        store.save_vehicle_profile(&profile("v1", at(1))).unwrap();
        store.save_vehicle_profile(&profile("v2", at(2))).unwrap();

        assert!(store.delete_vehicle_profile("v1").unwrap());
        assert!(!store.delete_vehicle_profile("v1").unwrap());

        let active = store.get_all_vehicle_profiles().unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].id, "v2");

        let hidden = store.get_vehicle_profile("v1").unwrap().unwrap();
        assert!(!hidden.is_active);
        assert!(hidden.last_updated > at(1));
    }

    #[test]
    fn test_vehicle_profiles_sorted_by_last_updated() {
        let (store, _dir) = test_store();
        store.save_vehicle_profile(&profile("a", at(3))).unwrap();
        store.save_vehicle_profile(&profile("b", at(7))).unwrap();

        let ids: Vec<String> = store
            .get_all_vehicle_profiles()
            .unwrap()
            .into_iter()
            .map(|p| p.id)
            .collect();
        assert_eq!(ids, vec!["b", "a"]);
    }

    #[test]
    fn test_update_vehicle_profile() {
        let (store, _dir) = test_store();
        store.save_vehicle_profile(&profile("v1", at(1))).unwrap();

        let edit = VehicleProfileEdit {
            nickname: Some("Daily driver".into()),
            mileage: Some(45_000),
            ..Default::default()
        };
        let updated = store.update_vehicle_profile("v1", &edit).unwrap();
        assert_eq!(updated.identity.nickname.as_deref(), Some("Daily driver"));
        assert_eq!(updated.specifications.mileage, Some(45_000));
        assert_eq!(updated.display_name(), "Daily driver");

        let missing = store.update_vehicle_profile("nope", &edit);
        assert!(matches!(missing, Err(Error::NotFound(_))));
    }

    #[test]
    fn test_search_matches_nested_fields() {
        let (store, _dir) = test_store();
        let mut a = extraction("a", "Brake Pad Replacement", at(1));
        a.user_context = Some(UserContext {
            symptoms: vec!["Squealing when stopping".into()],
            confidence: ConfidenceScore::ai(60),
            ..Default::default()
        });
        let mut b = extraction("b", "Oil Change", at(2));
        b.shop_info.name = Some("Main Street Auto".into());
        b.technical_info.recommended_maintenance = vec!["Replace wiper blades".into()];
        store.save_extraction(&a).unwrap();
        store.save_extraction(&b).unwrap();

        let ids = |q: &str| -> Vec<String> {
            store
                .search_extractions(q)
                .unwrap()
                .into_iter()
                .map(|d| d.id)
                .collect()
        };
        assert_eq!(ids("SQUEAL"), vec!["a"]);
        assert_eq!(ids("main street"), vec!["b"]);
        assert_eq!(ids("wiper"), vec!["b"]);
        assert_eq!(ids("maintenance"), vec!["b", "a"]);
        assert!(ids("transmission").is_empty());
    }

    #[test]
    fn test_session_default_and_cache_mirror() {
        let (store, _dir) = test_store();
        assert!(store.latest_user_session().unwrap().is_none());
        assert!(store.cached_session().is_none());

        let session = store
            .update_user_preferences(&PreferencesUpdate {
                service_radius: Some(15),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(session.preferences.service_radius, 15);

        let stored = store.latest_user_session().unwrap().unwrap();
        assert_eq!(stored.session_id, session.session_id);
        assert_eq!(store.cached_session().unwrap().preferences.service_radius, 15);
    }

    #[test]
    fn test_location_update_validates_zip() {
        let (store, _dir) = test_store();
        let bad = store.update_user_location(&LocationUpdate {
            zip_code: Some("12AB".into()),
            ..Default::default()
        });
        assert!(matches!(bad, Err(Error::Validation(_))));
        assert!(store.latest_user_session().unwrap().is_none());

        let ok = store
            .update_user_location(&LocationUpdate {
                zip_code: Some("60614-1234".into()),
                city: Some("Chicago".into()),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(ok.location.zip_code.as_deref(), Some("60614-1234"));
        assert_eq!(ok.location.city.as_deref(), Some("Chicago"));
    }

    #[test]
    fn test_service_and_quick_stats() {
        let (store, _dir) = test_store();
        let now = at(20);

        let mut a = extraction("a", "Oil Change", now - Duration::days(2));
        a.pricing.final_total = Some(60.0);
        a.shop_info.name = Some("Quick Lube".into());
        let mut b = extraction("b", "Oil Change", now - Duration::days(40));
        b.pricing.subtotal = Some(40.0);
        b.shop_info.name = Some("Quick Lube".into());
        let mut c = extraction("c", "Brake Service", now - Duration::days(1));
        c.service_info.urgency_level = UrgencyLevel::High;

        for d in [&a, &b, &c] {
            store.save_extraction(d).unwrap();
        }
        store.save_vehicle_profile(&profile("v1", now)).unwrap();

        let stats = store.service_stats().unwrap();
        assert_eq!(stats.total_services, 3);
        assert!((stats.total_spent - 100.0).abs() < 1e-9);
        assert!((stats.average_service_cost - 50.0).abs() < 1e-9);
        assert_eq!(stats.top_services[0], ServiceCount { service: "Oil Change".into(), count: 2 });
        assert_eq!(stats.top_shops, vec![ShopCount { shop: "Quick Lube".into(), count: 2 }]);

        let quick = store.quick_stats(now).unwrap();
        assert_eq!(quick.total_services, 3);
        assert_eq!(quick.recent_services, 2);
        assert_eq!(quick.vehicles, 1);
        assert_eq!(quick.pending_actions, 1);
    }

    #[test]
    fn test_export_clear_import_round_trip() {
        let (store, _dir) = test_store();
        store.save_extraction(&extraction("e1", "Oil Change", at(1))).unwrap();
        store.save_extraction(&extraction("e2", "Tire Rotation", at(2))).unwrap();
        store.save_vehicle_profile(&profile("v1", at(2))).unwrap();
        store.save_vehicle_profile(&profile("v2", at(3))).unwrap();
        store.delete_vehicle_profile("v2").unwrap();
        store
            .save_user_session(&UserSessionData::new_default(at(4)))
            .unwrap();

        let before = store.export_all().unwrap();
        assert_eq!(before.version, "1.0");
        assert_eq!(before.vehicle_profiles.len(), 2);
        let json = store.export_json().unwrap();

        store.clear_all().unwrap();
        assert_eq!(store.count_extractions().unwrap(), 0);
        assert!(store.get_vehicle_profile("v2").unwrap().is_none());
        assert!(store.latest_user_session().unwrap().is_none());
        assert!(store.cached_session().is_none());

        let summary = store.import_json(&json).unwrap();
        assert_eq!(summary.extractions, 2);
        assert_eq!(summary.vehicle_profiles, 2);
        assert!(summary.session_restored);
        assert_eq!(summary.skipped, 0);

        let after = store.export_all().unwrap();
        assert_eq!(after.extracted_data, before.extracted_data);
        assert_eq!(after.vehicle_profiles, before.vehicle_profiles);
        assert_eq!(after.user_session, before.user_session);
        assert_eq!(store.get_all_vehicle_profiles().unwrap().len(), 1);
    }

    #[test]
    fn test_import_skips_malformed_items() {
        let (store, _dir) = test_store();
        let good = serde_json::to_value(extraction("ok", "Oil Change", at(1))).unwrap();
        let json = serde_json::json!({
            "exportDate": "2024-03-01T00:00:00Z",
            "version": "0.9",
            "extractedData": [good, {"id": "broken"}],
            "vehicleProfiles": [],
            "userSession": null,
        });

        let summary = store.import_json(&json.to_string()).unwrap();
        assert_eq!(summary.extractions, 1);
        assert_eq!(summary.skipped, 1);
        assert!(!summary.session_restored);
        assert!(store.get_extraction("ok").unwrap().is_some());
    }

    #[test]
    fn test_unreadable_rows_are_skipped() {
        let (store, _dir) = test_store();
        store.save_extraction(&extraction("ok", "Oil Change", at(2))).unwrap();
        store
            .conn()
            .unwrap()
            .execute_batch(
                "INSERT INTO extracted_data (id, timestamp, source, primary_service, category, body_json)
                 VALUES ('blob', 0, 'text_input', 'x', 'x', X'FF00');
                 INSERT INTO extracted_data (id, timestamp, source, primary_service, category, body_json)
                 VALUES ('garbled', 1, 'text_input', 'x', 'x', '{not json');",
            )
            .unwrap();

        let all = store.get_all_extractions().unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].id, "ok");
    }

    #[test]
    fn test_lazy_init_creates_file_on_first_use() {
        let (store, _dir) = test_store();
        assert!(!store.db_path().exists());
        store.count_extractions().unwrap();
        assert!(store.db_path().exists());
    }
}
