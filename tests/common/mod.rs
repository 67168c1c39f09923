// Allow dead_code because these helpers are used across different test files
// which are compiled separately
#![allow(dead_code)]

use anyhow::Result;
use chrono::NaiveDate;
use subtally::application::{SubscriptionInput, SubscriptionService};
use subtally::config::DatabaseConfig;
use subtally::domain::parse_month_year;
use tempfile::TempDir;
use uuid::Uuid;

/// Helper to create a test service with a temporary database
pub async fn test_service() -> Result<(SubscriptionService, TempDir)> {
    let temp_dir = TempDir::new()?;
    let db_path = temp_dir.path().join("test.db");
    let config = DatabaseConfig {
        path: db_path.to_string_lossy().into_owned(),
        ..DatabaseConfig::default()
    };
    let service = SubscriptionService::init(&config).await?;
    Ok((service, temp_dir))
}

/// Helper to parse an MM-YYYY string
pub fn month(s: &str) -> NaiveDate {
    parse_month_year(s).unwrap()
}

/// Build create/update input from wire-style months
pub fn input(
    user_id: Uuid,
    service_name: &str,
    price: i64,
    start: &str,
    end: Option<&str>,
) -> SubscriptionInput {
    SubscriptionInput {
        user_id,
        service_name: service_name.to_string(),
        price,
        start_date: month(start),
        end_date: end.map(month),
    }
}

/// Test fixture: the four subscriptions used by the Q1 2023 cost scenarios
pub struct Scenarios;

impl Scenarios {
    pub async fn create(service: &SubscriptionService, user_id: Uuid) -> Result<()> {
        // A: open-ended, starts at the beginning of the period
        service
            .create_subscription(input(user_id, "Netflix", 100, "01-2023", None))
            .await?;
        // B: ended before the period
        service
            .create_subscription(input(user_id, "Spotify", 50, "06-2022", Some("08-2022")))
            .await?;
        // C: single month inside the period
        service
            .create_subscription(input(user_id, "Kinopoisk", 200, "02-2023", Some("02-2023")))
            .await?;
        // D: started before the period, ends inside it
        service
            .create_subscription(input(user_id, "Yandex Plus", 10, "12-2022", Some("02-2023")))
            .await?;
        Ok(())
    }
}
