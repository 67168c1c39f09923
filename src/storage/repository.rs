use std::time::Duration;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteRow};
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use crate::config::DatabaseConfig;
use crate::domain::{BillingPeriod, Page, Subscription, SubscriptionFilter, SubscriptionId};

use super::MIGRATION_001_SUBSCRIPTIONS;

const SUBSCRIPTION_COLUMNS: &str = "id, user_id, service_name, price, start_date, end_date";

/// Dates are stored as ISO `YYYY-MM-DD` text so that string comparison in SQL
/// matches chronological order.
const DATE_FORMAT: &str = "%Y-%m-%d";

/// Repository for persisting and querying subscriptions.
#[derive(Clone)]
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    /// Create a new repository with the given SQLite connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Open a pool against the configured database file.
    /// Creates the database file if it doesn't exist.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        let options = SqliteConnectOptions::new()
            .filename(&config.path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal);

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.acquire_timeout_seconds))
            .connect_with(options)
            .await
            .with_context(|| format!("Failed to connect to database at {}", config.path))?;

        tracing::info!(path = %config.path, "Connected to subscription database");
        Ok(Self::new(pool))
    }

    /// Run database migrations. Safe to call on every start.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::query(MIGRATION_001_SUBSCRIPTIONS)
            .execute(&self.pool)
            .await
            .context("Failed to run migration 001")?;
        Ok(())
    }

    /// Initialize the database (connect + migrate).
    pub async fn init(config: &DatabaseConfig) -> Result<Self> {
        let repo = Self::connect(config).await?;
        repo.migrate().await?;
        Ok(repo)
    }

    /// Check that a connection can be checked out and used.
    pub async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .context("Database ping failed")?;
        Ok(())
    }

    /// Close all pooled connections.
    pub async fn close(&self) {
        self.pool.close().await;
    }

    pub fn is_closed(&self) -> bool {
        self.pool.is_closed()
    }

    // ========================
    // Subscription operations
    // ========================

    /// Save a new subscription.
    #[tracing::instrument(name = "Insert subscription", skip(self, subscription), fields(id = %subscription.id))]
    pub async fn save_subscription(&self, subscription: &Subscription) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO subscriptions (id, user_id, service_name, price, start_date, end_date)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(subscription.id.to_string())
        .bind(subscription.user_id.to_string())
        .bind(&subscription.service_name)
        .bind(subscription.price)
        .bind(format_date(subscription.start_date))
        .bind(subscription.end_date.map(format_date))
        .execute(&self.pool)
        .await
        .context("Failed to save subscription")?;
        Ok(())
    }

    /// Get a subscription by ID.
    #[tracing::instrument(name = "Fetch subscription", skip(self))]
    pub async fn get_subscription(&self, id: SubscriptionId) -> Result<Option<Subscription>> {
        let query = format!("SELECT {SUBSCRIPTION_COLUMNS} FROM subscriptions WHERE id = ?");
        let row = sqlx::query(&query)
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .context("Failed to fetch subscription")?;

        row.as_ref().map(Self::row_to_subscription).transpose()
    }

    /// Replace every mutable field of a stored subscription.
    /// Returns false when no row has the subscription's id.
    #[tracing::instrument(name = "Update subscription", skip(self, subscription), fields(id = %subscription.id))]
    pub async fn update_subscription(&self, subscription: &Subscription) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE subscriptions
            SET user_id = ?, service_name = ?, price = ?, start_date = ?, end_date = ?
            WHERE id = ?
            "#,
        )
        .bind(subscription.user_id.to_string())
        .bind(&subscription.service_name)
        .bind(subscription.price)
        .bind(format_date(subscription.start_date))
        .bind(subscription.end_date.map(format_date))
        .bind(subscription.id.to_string())
        .execute(&self.pool)
        .await
        .context("Failed to update subscription")?;

        Ok(result.rows_affected() > 0)
    }

    /// Delete a subscription. Returns false when nothing was deleted.
    #[tracing::instrument(name = "Delete subscription", skip(self))]
    pub async fn delete_subscription(&self, id: SubscriptionId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM subscriptions WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .context("Failed to delete subscription")?;

        Ok(result.rows_affected() > 0)
    }

    /// List subscriptions, newest start month first, ties broken by service name.
    #[tracing::instrument(name = "List subscriptions", skip(self))]
    pub async fn list_subscriptions(
        &self,
        filter: &SubscriptionFilter,
        page: Page,
    ) -> Result<Vec<Subscription>> {
        let mut query = format!("SELECT {SUBSCRIPTION_COLUMNS} FROM subscriptions WHERE 1=1");
        push_filter_clauses(&mut query, filter);
        query.push_str(" ORDER BY start_date DESC, service_name ASC, id ASC LIMIT ? OFFSET ?");

        let user_id_str = filter.user_id.map(|id| id.to_string());
        let mut sql_query = sqlx::query(&query);
        if let Some(ref uid) = user_id_str {
            sql_query = sql_query.bind(uid);
        }
        if let Some(ref name) = filter.service_name {
            sql_query = sql_query.bind(name);
        }

        let rows = sql_query
            .bind(page.limit)
            .bind(page.offset)
            .fetch_all(&self.pool)
            .await
            .context("Failed to list subscriptions")?;

        rows.iter().map(Self::row_to_subscription).collect()
    }

    /// Find subscriptions whose active interval overlaps `period`.
    ///
    /// A subscription overlaps when it starts no later than `period.to` and is
    /// either open-ended or ends no earlier than `period.from`.
    #[tracing::instrument(name = "Find subscriptions active in period", skip(self))]
    pub async fn find_active_in_period(
        &self,
        filter: &SubscriptionFilter,
        period: &BillingPeriod,
    ) -> Result<Vec<Subscription>> {
        let mut query = format!(
            "SELECT {SUBSCRIPTION_COLUMNS} FROM subscriptions WHERE start_date <= ? AND (end_date IS NULL OR end_date >= ?)"
        );
        push_filter_clauses(&mut query, filter);
        query.push_str(" ORDER BY start_date ASC, service_name ASC");

        let user_id_str = filter.user_id.map(|id| id.to_string());
        let mut sql_query = sqlx::query(&query)
            .bind(format_date(period.to))
            .bind(format_date(period.from));
        if let Some(ref uid) = user_id_str {
            sql_query = sql_query.bind(uid);
        }
        if let Some(ref name) = filter.service_name {
            sql_query = sql_query.bind(name);
        }

        let rows = sql_query
            .fetch_all(&self.pool)
            .await
            .context("Failed to find active subscriptions")?;

        rows.iter().map(Self::row_to_subscription).collect()
    }

    /// Count all stored subscriptions.
    pub async fn count_subscriptions(&self) -> Result<i64> {
        let count: i64 = sqlx::query("SELECT COUNT(*) as count FROM subscriptions")
            .fetch_one(&self.pool)
            .await
            .context("Failed to count subscriptions")?
            .get("count");
        Ok(count)
    }

    fn row_to_subscription(row: &SqliteRow) -> Result<Subscription> {
        let id_str: String = row.get("id");
        let user_id_str: String = row.get("user_id");
        let start_date_str: String = row.get("start_date");
        let end_date_str: Option<String> = row.get("end_date");

        Ok(Subscription {
            id: Uuid::parse_str(&id_str).context("Invalid subscription ID")?,
            user_id: Uuid::parse_str(&user_id_str).context("Invalid user ID")?,
            service_name: row.get("service_name"),
            price: row.get("price"),
            start_date: parse_date(&start_date_str).context("Invalid start_date")?,
            end_date: end_date_str
                .map(|s| parse_date(&s))
                .transpose()
                .context("Invalid end_date")?,
        })
    }
}

/// Append the optional owner / service name conditions. Bind order is user_id, then service_name.
fn push_filter_clauses(query: &mut String, filter: &SubscriptionFilter) {
    if filter.user_id.is_some() {
        query.push_str(" AND user_id = ?");
    }
    if filter.service_name.is_some() {
        query.push_str(" AND service_name = ?");
    }
}

fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

fn parse_date(s: &str) -> Result<NaiveDate> {
    Ok(NaiveDate::parse_from_str(s, DATE_FORMAT)?)
}
