mod repository;

pub use repository::*;

/// SQL migration for the subscriptions table
pub const MIGRATION_001_SUBSCRIPTIONS: &str = include_str!("migrations/001_subscriptions.sql");
