use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::config::DatabaseConfig;
use crate::domain::{
    total_cost, BillingPeriod, Cents, Page, Subscription, SubscriptionFilter, SubscriptionId,
    UserId,
};
use crate::storage::Repository;

use super::AppError;

/// Application service for subscription bookkeeping and cost queries.
/// This is the interface shared by the HTTP API and the CLI.
#[derive(Clone)]
pub struct SubscriptionService {
    repo: Repository,
}

/// Caller-supplied fields of a subscription, used by both create and full-replacement update.
#[derive(Debug, Clone)]
pub struct SubscriptionInput {
    pub user_id: UserId,
    pub service_name: String,
    pub price: Cents,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
}

/// Aggregated spend over a billing period
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CostReport {
    pub period: BillingPeriod,
    pub total: Cents,
    /// Subscriptions returned by the overlap query, including ones that contributed nothing.
    pub subscription_count: usize,
}

impl SubscriptionService {
    /// Create a new service with the given repository.
    pub fn new(repo: Repository) -> Self {
        Self { repo }
    }

    /// Connect to the configured database and run migrations.
    pub async fn init(config: &DatabaseConfig) -> Result<Self, AppError> {
        let repo = Repository::init(config).await?;
        Ok(Self::new(repo))
    }

    /// Access the underlying repository.
    pub fn repository(&self) -> &Repository {
        &self.repo
    }

    /// Check that the backing store is reachable.
    pub async fn health(&self) -> Result<(), AppError> {
        Ok(self.repo.ping().await?)
    }

    // ========================
    // Record access
    // ========================

    /// Record a new subscription and return its generated id.
    pub async fn create_subscription(
        &self,
        input: SubscriptionInput,
    ) -> Result<SubscriptionId, AppError> {
        validate_input(&input)?;

        let subscription = Subscription::new(
            input.user_id,
            input.service_name,
            input.price,
            input.start_date,
            input.end_date,
        );
        self.repo.save_subscription(&subscription).await?;

        tracing::info!(
            id = %subscription.id,
            user_id = %subscription.user_id,
            service = %subscription.service_name,
            "Subscription created"
        );
        Ok(subscription.id)
    }

    /// Get a subscription by id.
    pub async fn get_subscription(&self, id: SubscriptionId) -> Result<Subscription, AppError> {
        self.repo
            .get_subscription(id)
            .await?
            .ok_or(AppError::SubscriptionNotFound(id))
    }

    /// Replace all mutable fields of an existing subscription.
    /// Never creates a row when `id` is unknown.
    pub async fn update_subscription(
        &self,
        id: SubscriptionId,
        input: SubscriptionInput,
    ) -> Result<(), AppError> {
        validate_input(&input)?;

        let subscription = Subscription::with_id(
            id,
            input.user_id,
            input.service_name,
            input.price,
            input.start_date,
            input.end_date,
        );

        if !self.repo.update_subscription(&subscription).await? {
            return Err(AppError::SubscriptionNotFound(id));
        }

        tracing::info!(id = %id, "Subscription updated");
        Ok(())
    }

    /// Delete a subscription by id.
    pub async fn delete_subscription(&self, id: SubscriptionId) -> Result<(), AppError> {
        if !self.repo.delete_subscription(id).await? {
            return Err(AppError::SubscriptionNotFound(id));
        }

        tracing::info!(id = %id, "Subscription deleted");
        Ok(())
    }

    /// List subscriptions matching `filter`, one page at a time.
    pub async fn list_subscriptions(
        &self,
        filter: &SubscriptionFilter,
        page: Page,
    ) -> Result<Vec<Subscription>, AppError> {
        Ok(self.repo.list_subscriptions(filter, page).await?)
    }

    // ========================
    // Cost aggregation
    // ========================

    /// Total spend of the matching subscriptions between `from` and `to`, both months included.
    ///
    /// Dates are truncated to their month first. An inverted range yields a total of 0.
    pub async fn total_cost(
        &self,
        filter: &SubscriptionFilter,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<CostReport, AppError> {
        let period = BillingPeriod::new(from, to);
        let subscriptions = self.repo.find_active_in_period(filter, &period).await?;
        let total = total_cost(&subscriptions, &period);

        tracing::debug!(
            from = %period.from,
            to = %period.to,
            matched = subscriptions.len(),
            total,
            "Computed total cost"
        );

        Ok(CostReport {
            period,
            total,
            subscription_count: subscriptions.len(),
        })
    }
}

fn validate_input(input: &SubscriptionInput) -> Result<(), AppError> {
    if input.service_name.trim().is_empty() {
        return Err(AppError::validation("service_name must not be empty"));
    }

    if input.price < 0 {
        return Err(AppError::validation(format!(
            "price must be non-negative, got {}",
            input.price
        )));
    }

    // Compared at month granularity, same as storage.
    if let Some(end) = input.end_date {
        let span = BillingPeriod::new(input.start_date, end);
        if span.is_empty() {
            return Err(AppError::validation(
                "end_date must not be earlier than start_date",
            ));
        }
    }

    Ok(())
}
