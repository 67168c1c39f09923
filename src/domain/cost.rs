use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::{months_between_inclusive, normalize_month, Cents, Subscription};

/// An inclusive month range used for cost queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BillingPeriod {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

impl BillingPeriod {
    /// Build a period from any two dates; both are truncated to their month.
    pub fn new(from: NaiveDate, to: NaiveDate) -> Self {
        Self {
            from: normalize_month(from),
            to: normalize_month(to),
        }
    }

    /// A period whose end precedes its start covers no months.
    pub fn is_empty(&self) -> bool {
        self.to < self.from
    }

    /// Clip a subscription's active interval to this period.
    /// An open-ended subscription runs until the end of the period.
    pub fn effective_bounds(&self, subscription: &Subscription) -> (NaiveDate, NaiveDate) {
        let left = subscription.start_date.max(self.from);
        let right = subscription.end_date.unwrap_or(self.to).min(self.to);
        (left, right)
    }

    /// Months of `subscription` that fall inside this period.
    pub fn overlap_months(&self, subscription: &Subscription) -> i64 {
        let (left, right) = self.effective_bounds(subscription);
        months_between_inclusive(left, right)
    }
}

/// What a single subscription costs within `period`.
pub fn subscription_cost(subscription: &Subscription, period: &BillingPeriod) -> Cents {
    subscription
        .price
        .saturating_mul(period.overlap_months(subscription))
}

/// Total spend of all `subscriptions` within `period`.
///
/// Subscriptions without overlap contribute nothing. The sum saturates at
/// `Cents::MAX` rather than wrapping.
pub fn total_cost(subscriptions: &[Subscription], period: &BillingPeriod) -> Cents {
    subscriptions
        .iter()
        .map(|sub| subscription_cost(sub, period))
        .filter(|cost| *cost > 0)
        .fold(0, Cents::saturating_add)
}
