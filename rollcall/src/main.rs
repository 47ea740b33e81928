//! rollcall - command-line entry point
//!
//! `run` performs one reconciliation pass, `daemon` runs one pass at startup
//! and then once a day at the configured hour. The remaining subcommands
//! seed and inspect the SQLite store.

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::Local;
use clap::{Parser, Subcommand};
use rollcall::gateway::{Gateway, LogGateway, TwilioGateway};
use rollcall::schedule::{next_run_after, ordinal, within_collection_window};
use rollcall::store::SqliteStore;
use rollcall::{EngineConfig, Metric, Reconciler, SubmissionRecord};
use rollcall_common::config::{self, GatewayKind, ScheduleSection, TomlConfig};
use rollcall_common::db::RosterRow;
use tokio::signal;
use tracing::{info, warn};

/// Command-line arguments for rollcall
#[derive(Parser, Debug)]
#[command(name = "rollcall")]
#[command(about = "Reconciles expected reporters against received submissions")]
#[command(version)]
struct Args {
    /// Path to TOML config file
    #[arg(short, long, env = "ROLLCALL_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run one reconciliation pass now
    Run,
    /// Run at startup, then daily at the configured hour
    Daemon,
    /// Show the current period's gaps and planned reminders without writing
    Status,
    /// Manage roster entries
    Roster {
        #[command(subcommand)]
        command: RosterCommand,
    },
    /// Manage reporting periods
    Period {
        #[command(subcommand)]
        command: PeriodCommand,
    },
    /// Record a received submission
    Submit {
        /// Period key, e.g. 2026-10
        period: String,
        /// Name as submitted
        name: String,
        /// Submission timestamp (defaults to now)
        #[arg(long)]
        at: Option<String>,
        /// Metric as name=value, repeatable
        #[arg(short, long = "metric", value_parser = parse_metric)]
        metrics: Vec<Metric>,
    },
}

#[derive(Subcommand, Debug)]
enum RosterCommand {
    /// Add or replace a roster entry
    Add {
        id: i64,
        first_name: String,
        #[arg(default_value = "")]
        last_name: String,
        /// Contact address (phone number)
        #[arg(long, default_value = "")]
        address: String,
        /// Send reminders to this roster id instead
        #[arg(long)]
        delegate: Option<i64>,
        /// Keep in the roster but exclude from reminders
        #[arg(long)]
        inactive: bool,
    },
}

#[derive(Subcommand, Debug)]
enum PeriodCommand {
    /// Open a period; the newest opened period is the current one
    Open {
        period: String,
        /// Report form link sent in reminders
        form_link: String,
        #[arg(long)]
        response_link: Option<String>,
    },
}

fn parse_metric(raw: &str) -> std::result::Result<Metric, String> {
    let (name, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected name=value, got {:?}", raw))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("metric name missing in {:?}", raw));
    }
    // "NaN" and "inf" parse as f64 but have no JSON form; keep them as text
    Ok(match value.trim().parse::<f64>() {
        Ok(number) if number.is_finite() => Metric::number(name, number),
        _ => Metric::text(name, value.trim()),
    })
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = config::load_config(args.config.as_deref()).context("Failed to load config")?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.logging.level)),
        )
        .init();

    info!("Starting rollcall v{}", env!("CARGO_PKG_VERSION"));

    let db_path = config.database_path();
    info!("Database path: {}", db_path.display());

    let store = SqliteStore::open(&db_path)
        .await
        .context("Failed to open database")?;

    match args.command {
        Command::Run => {
            let reconciler = build_reconciler(store, &config)?;
            let result = reconciler.run().await;
            reconciler.report_outcome(&result).await;
            result?;
        }
        Command::Daemon => {
            let reconciler = build_reconciler(store, &config)?;
            run_daemon(&reconciler, &config.schedule).await?;
        }
        Command::Status => {
            let reconciler = Reconciler::new(
                store,
                Gateway::DryRun(LogGateway),
                EngineConfig::from_section(&config.engine),
            );
            print_status(&reconciler).await?;
        }
        Command::Roster {
            command:
                RosterCommand::Add {
                    id,
                    first_name,
                    last_name,
                    address,
                    delegate,
                    inactive,
                },
        } => {
            let row = RosterRow {
                id,
                first_name,
                last_name,
                active: !inactive,
                direct_contact: delegate.is_none(),
                delegate_id: delegate,
                contact_address: address,
            };
            store.upsert_roster_entry(&row).await?;
            println!("Saved roster entry {}", id);
        }
        Command::Period {
            command:
                PeriodCommand::Open {
                    period,
                    form_link,
                    response_link,
                },
        } => {
            store
                .open_period(&period, &form_link, response_link.as_deref())
                .await?;
            println!("Opened period {}", period);
        }
        Command::Submit {
            period,
            name,
            at,
            metrics,
        } => {
            let submitted_at =
                at.unwrap_or_else(|| Local::now().format("%Y-%m-%d %H:%M:%S").to_string());
            let mut submission = SubmissionRecord::new(name, submitted_at);
            submission.metrics = metrics;
            let id = store.record_submission(&period, &submission).await?;
            println!("Recorded submission {} for {}", id, period);
        }
    }

    Ok(())
}

fn build_reconciler(store: SqliteStore, config: &TomlConfig) -> Result<Reconciler<SqliteStore, Gateway>> {
    let gateway = match config.gateway.kind {
        GatewayKind::Log => {
            warn!("Gateway kind is \"log\": reminders are logged, not sent");
            Gateway::DryRun(LogGateway)
        }
        GatewayKind::Twilio => {
            let auth_token = config::gateway_auth_token().with_context(|| {
                format!("{} must be set for the twilio gateway", config::ENV_GATEWAY_AUTH_TOKEN)
            })?;
            let gateway = TwilioGateway::new(
                config.gateway.base_url.clone(),
                config.gateway.account_sid.clone().unwrap_or_default(),
                auth_token,
                config.gateway.from_address.clone().unwrap_or_default(),
            )
            .map_err(|e| anyhow::anyhow!("Failed to build gateway client: {}", e))?;
            Gateway::Twilio(gateway)
        }
    };

    Ok(Reconciler::new(
        store,
        gateway,
        EngineConfig::from_section(&config.engine),
    ))
}

async fn print_status(reconciler: &Reconciler<SqliteStore, Gateway>) -> Result<()> {
    let preview = reconciler.preview().await?;

    println!(
        "Period {} [{}]",
        preview.period.period_key, preview.period.status
    );
    if preview.gaps.is_empty() {
        println!("No missing reports");
    }
    for (gap, job) in preview.gaps.iter().zip(preview.jobs.iter()) {
        println!("  missing: {} -> {}", gap.full_name, job.target_contact_address);
    }
    if !preview.duplicates.is_empty() {
        println!("Duplicate submissions: {}", preview.duplicates.join(", "));
    }

    Ok(())
}

/// One scheduled pass, skipped outside the collection window
async fn scheduled_pass(reconciler: &Reconciler<SqliteStore, Gateway>, schedule: &ScheduleSection) {
    let today = Local::now().date_naive();
    if schedule.enforce_window && !within_collection_window(today, schedule.stop_day) {
        info!(
            "It's past the {} - manual follow-up required, skipping run",
            ordinal(schedule.stop_day)
        );
        return;
    }

    let result = reconciler.run().await;
    reconciler.report_outcome(&result).await;
}

async fn run_daemon(
    reconciler: &Reconciler<SqliteStore, Gateway>,
    schedule: &ScheduleSection,
) -> Result<()> {
    info!("Running upon startup");
    scheduled_pass(reconciler, schedule).await;

    loop {
        let now = Local::now().naive_local();
        let next = next_run_after(now, schedule.hour)
            .with_context(|| format!("Invalid schedule hour {}", schedule.hour))?;
        let wait = (next - now).to_std().unwrap_or_default();
        info!("Next run at {}", next);

        tokio::select! {
            _ = tokio::time::sleep(wait) => {
                scheduled_pass(reconciler, schedule).await;
            }
            _ = shutdown_signal() => {
                info!("Scheduler stopped");
                return Ok(());
            }
        }
    }
}

/// Resolves on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
