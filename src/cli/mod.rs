use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use crate::application::SubscriptionService;
use crate::config::{load_config, Config};
use crate::domain::{
    format_cents, format_month_year, parse_month_year, Page, Subscription, SubscriptionFilter,
};
use crate::server::start_server;

/// subtally - subscription tracking service
#[derive(Parser)]
#[command(name = "subtally")]
#[command(about = "Track recurring subscriptions and what they cost over time")]
#[command(version)]
pub struct Cli {
    /// Configuration file (defaults to ./subtally.{toml,yaml,json} when present)
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run migrations and start the HTTP API
    Serve,

    /// Create or upgrade the database schema
    Migrate,

    /// Total cost of subscriptions over a range of months
    Total {
        /// First month, inclusive (MM-YYYY)
        #[arg(long)]
        from: String,

        /// Last month, inclusive (MM-YYYY)
        #[arg(long)]
        to: String,

        /// Only count subscriptions of this user
        #[arg(long)]
        user_id: Option<String>,

        /// Only count subscriptions to this service
        #[arg(long)]
        service_name: Option<String>,

        /// Output format: table, json
        #[arg(long, default_value = "table")]
        format: String,
    },

    /// List stored subscriptions
    List {
        /// Filter by user id
        #[arg(long)]
        user_id: Option<String>,

        /// Filter by service name
        #[arg(long)]
        service_name: Option<String>,

        /// Maximum number of subscriptions to show
        #[arg(short, long)]
        limit: Option<i64>,

        /// Number of subscriptions to skip
        #[arg(long)]
        offset: Option<i64>,
    },
}

impl Cli {
    /// Resolve configuration for this invocation.
    pub fn load_config(&self) -> Result<Config> {
        load_config(self.config.as_deref()).context("Failed to load configuration")
    }

    pub async fn run(self, config: Config) -> Result<()> {
        match self.command {
            Commands::Serve => {
                start_server(config).await?;
            }

            Commands::Migrate => {
                SubscriptionService::init(&config.database).await?;
                println!("Database migrated: {}", config.database.path);
            }

            Commands::Total {
                from,
                to,
                user_id,
                service_name,
                format,
            } => {
                let service = SubscriptionService::init(&config.database).await?;
                let from = parse_month_year(from.trim()).context("Invalid --from")?;
                let to = parse_month_year(to.trim()).context("Invalid --to")?;
                let filter = parse_filter(user_id, service_name)?;

                let report = service.total_cost(&filter, from, to).await?;

                if format == "json" {
                    println!("{}", serde_json::to_string_pretty(&report)?);
                } else {
                    println!(
                        "Period:        {} to {}",
                        format_month_year(report.period.from),
                        format_month_year(report.period.to)
                    );
                    println!("Subscriptions: {}", report.subscription_count);
                    println!("Total:         {}", format_cents(report.total));
                }
            }

            Commands::List {
                user_id,
                service_name,
                limit,
                offset,
            } => {
                let service = SubscriptionService::init(&config.database).await?;
                let filter = parse_filter(user_id, service_name)?;
                let subscriptions = service
                    .list_subscriptions(&filter, Page::new(limit, offset))
                    .await?;
                print_subscriptions(&subscriptions);
            }
        }

        Ok(())
    }
}

fn parse_filter(user_id: Option<String>, service_name: Option<String>) -> Result<SubscriptionFilter> {
    let user_id = user_id
        .map(|id| uuid::Uuid::parse_str(&id))
        .transpose()
        .context("Invalid user ID format (expected UUID)")?;

    Ok(SubscriptionFilter {
        user_id,
        service_name,
    })
}

fn print_subscriptions(subscriptions: &[Subscription]) {
    if subscriptions.is_empty() {
        println!("No subscriptions found.");
        return;
    }

    println!(
        "{:<36}  {:<20} {:>10} {:>8} {:>8}",
        "ID", "SERVICE", "PRICE", "START", "END"
    );
    println!("{}", "-".repeat(88));
    for sub in subscriptions {
        println!(
            "{:<36}  {:<20} {:>10} {:>8} {:>8}",
            sub.id,
            truncate(&sub.service_name, 20),
            format_cents(sub.price),
            format_month_year(sub.start_date),
            sub.end_date
                .map(format_month_year)
                .unwrap_or_else(|| "-".to_string())
        );
    }
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", cut)
    }
}
