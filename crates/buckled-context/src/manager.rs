//! `SmartContext`: stores an extraction, attaches it to a vehicle profile,
//! refreshes the session and produces recommendations.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, error, info, warn};

use buckled_core::{
    ExtractedServiceData, Result, ServiceRecommendation, SmartInsights, UserSessionData,
    VehicleProfile,
};
use buckled_store::ServiceStore;

use crate::matcher::{best_match, belongs_to, UPDATE_THRESHOLD};
use crate::merge::ReliabilityTable;
use crate::{insights, profile, recommend, session};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessOutcome {
    pub vehicle_profile: Option<VehicleProfile>,
    pub updated_session: UserSessionData,
    pub recommendations: Vec<ServiceRecommendation>,
}

pub struct SmartContext {
    store: Arc<ServiceStore>,
    reliability: ReliabilityTable,
}

impl SmartContext {
    pub fn new(store: Arc<ServiceStore>) -> Self {
        Self {
            store,
            reliability: ReliabilityTable::default(),
        }
    }

    pub fn store(&self) -> &Arc<ServiceStore> {
        &self.store
    }

    /// Store `data` and derive everything that follows from it. Never fails:
    /// on an internal error the current session is returned unchanged with
    /// no recommendations.
    pub fn process_extraction(&self, data: &ExtractedServiceData) -> ProcessOutcome {
        let now = Utc::now();
        match self.try_process(data, now) {
            Ok(outcome) => outcome,
            Err(e) => {
                error!("Processing extraction {} failed: {}", data.id, e);
                let updated_session = self
                    .store
                    .get_user_session()
                    .unwrap_or_else(|_| UserSessionData::new_default(now));
                ProcessOutcome {
                    vehicle_profile: None,
                    updated_session,
                    recommendations: Vec::new(),
                }
            }
        }
    }

    fn try_process(&self, data: &ExtractedServiceData, now: DateTime<Utc>) -> Result<ProcessOutcome> {
        self.store.save_extraction(data)?;

        let vehicle_profile = match self.find_or_create_profile(data, now) {
            Ok(p) => p,
            Err(e) => {
                warn!("Vehicle profile not updated for {}: {}", data.id, e);
                None
            }
        };

        let history = self.store.get_all_extractions()?;

        let current = self.store.get_user_session()?;
        let updated_session = session::refresh_session(current, data, &history, now);
        self.store.save_user_session(&updated_session)?;

        let recommendations = recommend::recommend(data, vehicle_profile.as_ref(), &history);
        debug!(
            "Extraction {} produced {} recommendation(s)",
            data.id,
            recommendations.len()
        );

        Ok(ProcessOutcome {
            vehicle_profile,
            updated_session,
            recommendations,
        })
    }

    /// Update the best-matching profile, or create one. Extractions without
    /// vehicle details touch no profile.
    fn find_or_create_profile(
        &self,
        data: &ExtractedServiceData,
        now: DateTime<Utc>,
    ) -> Result<Option<VehicleProfile>> {
        if !data.has_vehicle_info() {
            return Ok(None);
        }

        let profiles = self.store.get_all_vehicle_profiles()?;
        let matched = best_match(&data.vehicle_info, &profiles)
            .filter(|m| m.score > UPDATE_THRESHOLD)
            .map(|m| {
                debug!("Matched {} ({:.2}: {:?})", m.profile.id, m.score, m.reasons);
                m.profile.clone()
            });

        let profile = match matched {
            Some(mut existing) => {
                profile::apply_extraction(&mut existing, data, &self.reliability, now);
                info!("Updated vehicle profile {} ({})", existing.id, existing.display_name());
                existing
            }
            None => {
                let created = profile::new_profile(data, now);
                info!("Created vehicle profile {} ({})", created.id, created.display_name());
                created
            }
        };

        self.store.save_vehicle_profile(&profile)?;
        Ok(Some(profile))
    }

    /// Insights for one vehicle; `None` if the profile does not exist or the
    /// data could not be read.
    pub fn generate_smart_insights(&self, vehicle_id: &str) -> Option<SmartInsights> {
        let load = || -> Result<Option<SmartInsights>> {
            let Some(profile) = self.store.get_vehicle_profile(vehicle_id)? else {
                return Ok(None);
            };
            let vehicle_data: Vec<ExtractedServiceData> = self
                .store
                .get_all_extractions()?
                .into_iter()
                .filter(|d| belongs_to(d, &profile))
                .collect();
            Ok(Some(insights::build_insights(&profile, &vehicle_data, Utc::now())))
        };

        match load() {
            Ok(insights) => insights,
            Err(e) => {
                error!("Insights for {} failed: {}", vehicle_id, e);
                None
            }
        }
    }
}
