// ABOUTME: Operator command-line tool over the Ascend progression store
// ABOUTME: Inspects level tables, awards XP, records logins and prints history as JSON
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Ascend Contributors

//! Usage:
//! ```bash
//! # Print the configured level table
//! cargo run --bin ascend-cli -- levels
//!
//! # Show a user's progression
//! cargo run --bin ascend-cli -- status 6f1c2a9e-4b1d-4c55-9a39-0f3e2d1b7c10
//!
//! # Award a rule-table activity or a raw amount
//! cargo run --bin ascend-cli -- award 6f1c... --activity workout_complete
//! cargo run --bin ascend-cli -- award 6f1c... --amount 40
//!
//! # Record today's login and show the streak
//! cargo run --bin ascend-cli -- login 6f1c...
//!
//! # Recent awards and today's total
//! cargo run --bin ascend-cli -- history 6f1c... --limit 10
//! ```

use anyhow::{anyhow, Context, Result};
use ascend::config::environment::{DatabaseUrl, LevelingPolicyKind, ProgressionConfig};
use ascend::constants::persistence::DEFAULT_HISTORY_LIMIT;
use ascend::logging::LoggingConfig;
use ascend::models::XpActivity;
use ascend::progression::{EngineDeps, SessionRegistry};
use ascend::storage::SqliteStore;
use chrono::{NaiveDate, Utc};
use clap::{Parser, Subcommand};
use serde::Serialize;
use serde_json::json;
use uuid::Uuid;

#[derive(Parser)]
#[command(
    name = "ascend-cli",
    about = "Ascend XP progression operator tool",
    long_about = "Inspect and adjust XP progression stored in the Ascend database. All output is JSON on stdout."
)]
struct CliArgs {
    #[command(subcommand)]
    command: CliCommand,

    /// Database URL override
    #[arg(long, global = true)]
    database_url: Option<String>,

    /// Leveling policy override (tiered or geometric)
    #[arg(long, global = true)]
    policy: Option<String>,

    /// Enable debug logging
    #[arg(long, short = 'v', global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum CliCommand {
    /// Print every tier of the active leveling policy
    Levels,

    /// Show a user's level, title and streak
    Status {
        /// User ID
        user_id: Uuid,
    },

    /// Award XP to a user
    Award {
        /// User ID
        user_id: Uuid,

        /// Rule-table activity (e.g. `workout_complete`)
        #[arg(long, conflicts_with = "amount")]
        activity: Option<String>,

        /// Raw XP amount
        #[arg(long)]
        amount: Option<i64>,
    },

    /// Record a daily login
    Login {
        /// User ID
        user_id: Uuid,

        /// Day of the login (defaults to today, UTC)
        #[arg(long)]
        date: Option<NaiveDate>,
    },

    /// Show recent awards and today's total
    History {
        /// User ID
        user_id: Uuid,

        /// Number of awards to show
        #[arg(long, default_value_t = DEFAULT_HISTORY_LIMIT)]
        limit: u32,
    },

    /// List stored profiles, highest XP first
    Profiles {
        /// Number of profiles to show
        #[arg(long, default_value_t = DEFAULT_HISTORY_LIMIT)]
        limit: u32,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = CliArgs::parse();
    LoggingConfig::for_cli(args.verbose).init()?;

    let mut config = ProgressionConfig::from_env()?;
    if let Some(url) = &args.database_url {
        config.database_url = DatabaseUrl::parse_url(url)?;
    }
    if let Some(policy) = &args.policy {
        config.leveling_policy = LevelingPolicyKind::parse(policy)?;
    }

    match args.command {
        CliCommand::Levels => {
            let policy = config.build_policy()?;
            print_json(&json!({
                "policy": policy.name(),
                "tiers": policy.tiers(),
            }))
        }
        CliCommand::Profiles { limit } => {
            let store = SqliteStore::connect(&config.database_url).await?;
            print_json(&store.list_profiles(limit).await?)
        }
        command => run_session_command(&config, command).await,
    }
}

async fn run_session_command(config: &ProgressionConfig, command: CliCommand) -> Result<()> {
    let deps = EngineDeps::from_config(config)
        .await
        .context("Failed to open progression stores")?;
    let registry = SessionRegistry::new(deps);

    let result = execute_session_command(&registry, command).await;

    // Drain durable writes even when the command failed
    registry.shutdown_all().await;
    result
}

async fn execute_session_command(registry: &SessionRegistry, command: CliCommand) -> Result<()> {
    match command {
        CliCommand::Status { user_id } => {
            let engine = registry.get_or_start(user_id).await;
            let (streak_days, last_active_on) = engine.streak().await;
            print_json(&json!({
                "user_id": user_id,
                "policy": engine.policy_name(),
                "state": engine.state(),
                "streak_days": streak_days,
                "last_active_on": last_active_on,
            }))
        }
        CliCommand::Award {
            user_id,
            activity,
            amount,
        } => {
            let engine = registry.get_or_start(user_id).await;
            let outcome = match (activity, amount) {
                (Some(name), _) => {
                    let activity = XpActivity::parse(&name)
                        .ok_or_else(|| anyhow!("Unknown activity '{name}'"))?;
                    engine.award_activity(activity).await?
                }
                (None, Some(amount)) => engine.award_xp(amount, None).await?,
                (None, None) => return Err(anyhow!("Pass --activity or --amount")),
            };
            print_json(&outcome)
        }
        CliCommand::Login { user_id, date } => {
            let engine = registry.get_or_start(user_id).await;
            let today = date.unwrap_or_else(|| Utc::now().date_naive());
            match engine.record_daily_login(today).await? {
                Some(outcome) => print_json(&outcome),
                None => print_json(&json!({
                    "already_recorded": today,
                    "streak_days": engine.streak().await.0,
                })),
            }
        }
        CliCommand::History { user_id, limit } => {
            let engine = registry.get_or_start(user_id).await;
            print_json(&json!({
                "user_id": user_id,
                "xp_today": engine.xp_today(Utc::now()).await?,
                "recent": engine.recent_history(limit).await?,
            }))
        }
        CliCommand::Levels | CliCommand::Profiles { .. } => Ok(()),
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
