//! The single user session: preferences, location and spending aggregates.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommunicationMethod {
    #[default]
    Email,
    Phone,
    Text,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UrgencyPreference {
    Cost,
    #[default]
    Quality,
    Speed,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BudgetRange {
    pub min: f64,
    pub max: f64,
}

impl Default for BudgetRange {
    fn default() -> Self {
        Self { min: 50.0, max: 1000.0 }
    }
}

impl BudgetRange {
    /// Widen the range so that a service of `cost` sits comfortably inside.
    pub fn widen_for(&self, cost: f64) -> Self {
        Self {
            min: self.min.min(cost * 0.8),
            max: self.max.max(cost * 1.2),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Preferences {
    #[serde(default)]
    pub preferred_shops: Vec<String>,
    #[serde(default)]
    pub budget_range: BudgetRange,
    /// Miles.
    pub service_radius: u32,
    #[serde(default)]
    pub preferred_brands: Vec<String>,
    #[serde(default)]
    pub communication_method: CommunicationMethod,
    #[serde(default)]
    pub urgency_preference: UrgencyPreference,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            preferred_shops: Vec::new(),
            budget_range: BudgetRange::default(),
            service_radius: 25,
            preferred_brands: Vec::new(),
            communication_method: CommunicationMethod::Email,
            urgency_preference: UrgencyPreference::Quality,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    pub zip_code: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub coordinates: Option<Coordinates>,
    pub last_updated: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionServiceHistory {
    pub total_services: usize,
    pub last_service_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub favorite_categories: Vec<String>,
    pub average_spending: f64,
    #[serde(default)]
    pub frequent_shops: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSessionData {
    pub session_id: String,
    pub created_at: DateTime<Utc>,
    pub last_active: DateTime<Utc>,
    pub preferences: Preferences,
    pub location: Location,
    pub service_history: SessionServiceHistory,
}

impl UserSessionData {
    /// A fresh session: budget 50-1000, radius 25 miles, email, quality.
    pub fn new_default(now: DateTime<Utc>) -> Self {
        Self {
            session_id: super::generate_id("session"),
            created_at: now,
            last_active: now,
            preferences: Preferences::default(),
            location: Location {
                zip_code: None,
                city: None,
                state: None,
                coordinates: None,
                last_updated: now,
            },
            service_history: SessionServiceHistory::default(),
        }
    }
}

/// Partial preference update.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreferencesUpdate {
    pub preferred_shops: Option<Vec<String>>,
    pub budget_range: Option<BudgetRange>,
    pub service_radius: Option<u32>,
    pub preferred_brands: Option<Vec<String>>,
    pub communication_method: Option<CommunicationMethod>,
    pub urgency_preference: Option<UrgencyPreference>,
}

impl PreferencesUpdate {
    pub fn apply(&self, prefs: &mut Preferences) {
        if let Some(v) = &self.preferred_shops {
            prefs.preferred_shops = v.clone();
        }
        if let Some(v) = self.budget_range {
            prefs.budget_range = v;
        }
        if let Some(v) = self.service_radius {
            prefs.service_radius = v;
        }
        if let Some(v) = &self.preferred_brands {
            prefs.preferred_brands = v.clone();
        }
        if let Some(v) = self.communication_method {
            prefs.communication_method = v;
        }
        if let Some(v) = self.urgency_preference {
            prefs.urgency_preference = v;
        }
    }
}

/// Location change requested by the user.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationUpdate {
    pub zip_code: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub coordinates: Option<Coordinates>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_session() {
        let s = UserSessionData::new_default(Utc::now());
        assert!(s.session_id.starts_with("session_"));
        assert_eq!(s.preferences.budget_range, BudgetRange { min: 50.0, max: 1000.0 });
        assert_eq!(s.preferences.service_radius, 25);
        assert_eq!(s.preferences.communication_method, CommunicationMethod::Email);
        assert_eq!(s.preferences.urgency_preference, UrgencyPreference::Quality);
        assert_eq!(s.service_history.total_services, 0);
    }

    #[test]
    fn test_budget_widening() {
        let b = BudgetRange::default();
        assert_eq!(b.widen_for(500.0), b);

        let wide = b.widen_for(2000.0);
        assert_eq!(wide.min, 50.0);
        assert!((wide.max - 2400.0).abs() < 1e-9);

        let low = b.widen_for(40.0);
        assert!((low.min - 32.0).abs() < 1e-9);
    }

    #[test]
    fn test_preferences_update_partial() {
        let mut prefs = Preferences::default();
        PreferencesUpdate {
            service_radius: Some(10),
            communication_method: Some(CommunicationMethod::Text),
            ..Default::default()
        }
        .apply(&mut prefs);

        assert_eq!(prefs.service_radius, 10);
        assert_eq!(prefs.communication_method, CommunicationMethod::Text);
        assert_eq!(prefs.budget_range, BudgetRange::default());
    }
}
