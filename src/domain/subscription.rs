use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{normalize_month, Cents};

pub type SubscriptionId = Uuid;
pub type UserId = Uuid;

/// Default page size for subscription listings.
pub const DEFAULT_PAGE_LIMIT: i64 = 50;

/// A user's recurring subscription to a paid service.
///
/// `start_date` and `end_date` always hold the first day of a month.
/// A missing `end_date` means the subscription is still running.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subscription {
    pub id: SubscriptionId,
    pub user_id: UserId,
    pub service_name: String,
    pub price: Cents,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
}

impl Subscription {
    /// Create a subscription with a fresh id. Dates are normalized to month starts.
    pub fn new(
        user_id: UserId,
        service_name: String,
        price: Cents,
        start_date: NaiveDate,
        end_date: Option<NaiveDate>,
    ) -> Self {
        Self::with_id(Uuid::new_v4(), user_id, service_name, price, start_date, end_date)
    }

    /// Build a subscription for an existing id, as used by full-replacement updates.
    pub fn with_id(
        id: SubscriptionId,
        user_id: UserId,
        service_name: String,
        price: Cents,
        start_date: NaiveDate,
        end_date: Option<NaiveDate>,
    ) -> Self {
        Self {
            id,
            user_id,
            service_name,
            price,
            start_date: normalize_month(start_date),
            end_date: end_date.map(normalize_month),
        }
    }
}

/// Optional owner / service name restriction shared by listing and cost queries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubscriptionFilter {
    pub user_id: Option<UserId>,
    pub service_name: Option<String>,
}

impl SubscriptionFilter {
    pub fn for_user(user_id: UserId) -> Self {
        Self {
            user_id: Some(user_id),
            service_name: None,
        }
    }

    pub fn with_service_name(mut self, service_name: impl Into<String>) -> Self {
        self.service_name = Some(service_name.into());
        self
    }
}

/// Limit/offset window for listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub limit: i64,
    pub offset: i64,
}

impl Page {
    /// Build a page, falling back to defaults for a non-positive limit or negative offset.
    pub fn new(limit: Option<i64>, offset: Option<i64>) -> Self {
        Self {
            limit: limit.filter(|l| *l > 0).unwrap_or(DEFAULT_PAGE_LIMIT),
            offset: offset.filter(|o| *o >= 0).unwrap_or(0),
        }
    }
}

impl Default for Page {
    fn default() -> Self {
        Self::new(None, None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_normalizes_dates() {
        let sub = Subscription::new(
            Uuid::new_v4(),
            "Netflix".to_string(),
            999,
            NaiveDate::from_ymd_opt(2023, 5, 17).unwrap(),
            Some(NaiveDate::from_ymd_opt(2023, 9, 30).unwrap()),
        );

        assert_eq!(sub.start_date, NaiveDate::from_ymd_opt(2023, 5, 1).unwrap());
        assert_eq!(sub.end_date, NaiveDate::from_ymd_opt(2023, 9, 1));
    }

    #[test]
    fn test_page_defaults() {
        assert_eq!(Page::default(), Page { limit: 50, offset: 0 });
        assert_eq!(Page::new(Some(0), Some(-3)), Page { limit: 50, offset: 0 });
        assert_eq!(Page::new(Some(10), Some(20)), Page { limit: 10, offset: 20 });
    }
}
