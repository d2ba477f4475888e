//! Recomputing the session's service-history aggregates.

use chrono::{DateTime, Utc};

use buckled_core::tally::top_values;
use buckled_core::{ExtractedServiceData, SessionServiceHistory, UserSessionData};

/// Refresh `session` after `data` was stored. `history` is every stored
/// extraction, `data` included; aggregates are rebuilt from it in full.
pub fn refresh_session(
    mut session: UserSessionData,
    data: &ExtractedServiceData,
    history: &[ExtractedServiceData],
    now: DateTime<Utc>,
) -> UserSessionData {
    session.last_active = now;
    session.service_history = summarize(history, data.timestamp);

    let shop = &data.shop_info;
    if let (Some(city), Some(state), Some(zip)) = (&shop.city, &shop.state, &shop.zip_code) {
        session.location.city = Some(city.clone());
        session.location.state = Some(state.clone());
        session.location.zip_code = Some(zip.clone());
        session.location.last_updated = now;
    }

    if let Some(cost) = data.cost() {
        let budget = &mut session.preferences.budget_range;
        *budget = budget.widen_for(cost);
    }

    session
}

fn summarize(history: &[ExtractedServiceData], last_service: DateTime<Utc>) -> SessionServiceHistory {
    let costs: Vec<f64> = history.iter().filter_map(|d| d.cost()).collect();
    let average_spending = if costs.is_empty() {
        0.0
    } else {
        costs.iter().sum::<f64>() / costs.len() as f64
    };

    SessionServiceHistory {
        total_services: history.len(),
        last_service_date: Some(last_service),
        favorite_categories: top_values(history.iter().map(|d| &d.service_info.category), 3),
        average_spending,
        frequent_shops: top_values(history.iter().filter_map(|d| d.shop_info.name.as_ref()), 3),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::tests::{civic, extraction};
    use buckled_core::BudgetRange;

    #[test]
    fn test_aggregates_rebuilt_from_history() {
        let mut a = extraction("Oil Change", civic(None));
        a.pricing.final_total = Some(60.0);
        a.shop_info.name = Some("Quick Lube".into());
        let mut b = extraction("Brake Service", civic(None));
        b.service_info.category = "Repair".into();
        b.pricing.subtotal = Some(340.0);
        b.shop_info.name = Some("Main St Auto".into());
        let mut c = extraction("Oil Change", civic(None));
        c.shop_info.name = Some("Quick Lube".into());

        let history = vec![a, b, c.clone()];
        let session = refresh_session(UserSessionData::new_default(Utc::now()), &c, &history, Utc::now());

        let h = &session.service_history;
        assert_eq!(h.total_services, 3);
        assert_eq!(h.last_service_date, Some(c.timestamp));
        assert_eq!(h.favorite_categories, vec!["Maintenance", "Repair"]);
        assert_eq!(h.frequent_shops, vec!["Quick Lube", "Main St Auto"]);
        assert_eq!(h.average_spending, 200.0);
    }

    #[test]
    fn test_location_needs_city_state_and_zip() {
        let mut data = extraction("Oil Change", civic(None));
        data.shop_info.city = Some("Austin".into());
        data.shop_info.state = Some("TX".into());

        let session = refresh_session(
            UserSessionData::new_default(Utc::now()),
            &data,
            std::slice::from_ref(&data),
            Utc::now(),
        );
        assert_eq!(session.location.city, None);

        data.shop_info.zip_code = Some("78701".into());
        let session = refresh_session(session, &data, std::slice::from_ref(&data), Utc::now());
        assert_eq!(session.location.city.as_deref(), Some("Austin"));
        assert_eq!(session.location.zip_code.as_deref(), Some("78701"));
    }

    #[test]
    fn test_budget_widens_for_expensive_service() {
        let mut data = extraction("Transmission Rebuild", civic(None));
        data.pricing.final_total = Some(2500.0);
        let session = refresh_session(
            UserSessionData::new_default(Utc::now()),
            &data,
            std::slice::from_ref(&data),
            Utc::now(),
        );
        let BudgetRange { min, max } = session.preferences.budget_range;
        assert_eq!(min, 50.0);
        assert!((max - 3000.0).abs() < 1e-6);
    }
}
