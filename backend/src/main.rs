//! Zaiko - operator CLI
//!
//! Every command prints its result as JSON on stdout; logs go to stderr.

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use serde::Serialize;
use shared::{CreateOrderInput, DateRange, ExpiryMode, HistoryFilter};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

use zaiko_backend::services::alerts::PURCHASE_CANDIDATES_PREFIX;
use zaiko_backend::services::orders::SUMMARY_RANKING_LIMIT;
use zaiko_backend::services::reporting::DEFAULT_NEAR_EXPIRY_DAYS;
use zaiko_backend::{db, AppState, Config};

#[derive(Parser)]
#[command(name = "zaiko")]
#[command(about = "Inventory feed reconciliation and order settlement", long_about = None)]
struct Cli {
    /// Evaluate dates as of this day (YYYY-MM-DD) instead of today
    #[arg(long, global = true)]
    today: Option<NaiveDate>,

    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply database migrations
    Migrate,

    /// Rebuild the lot store from the inventory feed
    Reload,

    /// List lots after a reload
    Lots,

    /// Order intake and listings
    Order {
        #[command(subcommand)]
        cmd: OrderCmd,
    },

    /// Confirm every pending order and settle stock
    Confirm,

    /// Per-item stock summary with alert levels
    Summary,

    /// Items below their refill threshold
    Candidates,

    /// Write CSV artifacts
    Export {
        #[command(subcommand)]
        cmd: ExportCmd,
    },

    /// Freeze current lot quantities for a month (default: previous month)
    Snapshot {
        /// Month label, YYYY-MM
        #[arg(long)]
        month: Option<String>,
    },

    /// Previous month's snapshot against current stock
    Carryover,

    /// Feed modification times
    SyncStatus,
}

#[derive(Subcommand)]
enum OrderCmd {
    /// Submit a pending order
    Create {
        #[arg(long)]
        name: String,
        #[arg(long, default_value = "")]
        okazu: String,
        #[arg(long, default_value = "")]
        okazu_expiry: String,
        #[arg(long, default_value = "")]
        gohan: String,
        #[arg(long, default_value = "")]
        gohan_expiry: String,
    },

    /// Cancel a pending order
    Cancel {
        #[arg(long)]
        id: Uuid,
    },

    /// Pending orders, newest first
    Pending,

    /// Confirmed orders, newest first
    History {
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        start: Option<NaiveDate>,
        #[arg(long)]
        end: Option<NaiveDate>,
    },

    /// Consumption ranking of confirmed orders
    Ranking {
        #[arg(long)]
        start: Option<NaiveDate>,
        #[arg(long)]
        end: Option<NaiveDate>,
        #[arg(long, default_value_t = SUMMARY_RANKING_LIMIT)]
        limit: i64,
    },

    /// Names, items, expiries and quantities offered to intake
    Options,
}

#[derive(Subcommand)]
enum ExportCmd {
    /// purchase_candidates_<timestamp>.csv
    Candidates,

    /// Latest export with the given prefix
    Latest {
        #[arg(long, default_value = PURCHASE_CANDIDATES_PREFIX)]
        prefix: String,

        /// Generate a purchase-candidate export when none exists
        #[arg(long, default_value_t = false)]
        generate: bool,
    },

    /// order_history_<date>.csv
    History {
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        start: Option<NaiveDate>,
        #[arg(long)]
        end: Option<NaiveDate>,
    },

    /// ranking_<date>.csv
    Ranking {
        #[arg(long)]
        start: Option<NaiveDate>,
        #[arg(long)]
        end: Option<NaiveDate>,
    },

    /// expiry_<mode>_<date>.csv
    Expiry {
        /// near | expired
        #[arg(long, default_value = "near")]
        mode: ExpiryMode,
        #[arg(long, default_value_t = DEFAULT_NEAR_EXPIRY_DAYS)]
        days: i64,
    },
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[derive(Serialize)]
struct PathOutput {
    path: Option<String>,
}

impl PathOutput {
    fn of(path: Option<std::path::PathBuf>) -> Self {
        Self {
            path: path.map(|p| p.display().to_string()),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "zaiko=info,zaiko_backend=info,sqlx=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    // Load configuration
    dotenvy::dotenv().ok();
    let config = Config::load().context("loading configuration")?;
    tracing::debug!("Environment: {}", config.environment);

    let pool = db::connect(&config.database)
        .await
        .context("connecting to database")?;

    if matches!(cli.cmd, Commands::Migrate) || config.environment == "development" {
        tracing::info!("Running database migrations...");
        db::migrate(&pool).await?;
    }

    let today = cli.today.unwrap_or_else(|| Local::now().date_naive());
    let state = AppState::new(pool, config);

    match cli.cmd {
        Commands::Migrate => print_json(&serde_json::json!({ "migrated": true }))?,
        Commands::Reload => print_json(&state.inventory().reload().await?)?,
        Commands::Lots => print_json(&state.inventory().list_lots().await?)?,
        Commands::Order { cmd } => run_order(&state, cmd).await?,
        Commands::Confirm => print_json(&state.settlement().confirm_all().await?)?,
        Commands::Summary => print_json(&state.alerts().summarize(today).await?)?,
        Commands::Candidates => print_json(&state.alerts().purchase_candidates(today).await?)?,
        Commands::Export { cmd } => run_export(&state, cmd, today).await?,
        Commands::Snapshot { month } => {
            print_json(&state.carryover().snapshot(month.as_deref(), today).await?)?
        }
        Commands::Carryover => print_json(&state.carryover().report(today).await?)?,
        Commands::SyncStatus => print_json(&state.sync().status())?,
    }

    Ok(())
}

async fn run_order(state: &AppState, cmd: OrderCmd) -> Result<()> {
    let orders = state.orders();
    match cmd {
        OrderCmd::Create {
            name,
            okazu,
            okazu_expiry,
            gohan,
            gohan_expiry,
        } => {
            let input = CreateOrderInput {
                name,
                okazu,
                okazu_expiry,
                gohan,
                gohan_expiry,
            };
            print_json(&orders.create(input).await?)
        }
        OrderCmd::Cancel { id } => print_json(&orders.cancel(id).await?),
        OrderCmd::Pending => print_json(&orders.pending().await?),
        OrderCmd::History { name, start, end } => {
            print_json(&orders.history(&HistoryFilter { name, start, end }).await?)
        }
        OrderCmd::Ranking { start, end, limit } => {
            print_json(&orders.ranking(&DateRange { start, end }, limit).await?)
        }
        OrderCmd::Options => print_json(&orders.options().await?),
    }
}

async fn run_export(state: &AppState, cmd: ExportCmd, today: NaiveDate) -> Result<()> {
    let path = match cmd {
        ExportCmd::Candidates => Some(state.alerts().export_purchase_candidates_csv(today).await?),
        ExportCmd::Latest { prefix, generate } => {
            let alerts = state.alerts();
            if generate && prefix == PURCHASE_CANDIDATES_PREFIX {
                Some(alerts.latest_or_export(today).await?)
            } else {
                alerts.latest_export(&prefix)
            }
        }
        ExportCmd::History { name, start, end } => Some(
            state
                .reporting()
                .export_history(&HistoryFilter { name, start, end }, today)
                .await?,
        ),
        ExportCmd::Ranking { start, end } => {
            Some(state.reporting().export_ranking(&DateRange { start, end }, today).await?)
        }
        ExportCmd::Expiry { mode, days } => {
            Some(state.reporting().export_expiry(mode, days, today).await?)
        }
    };
    print_json(&PathOutput::of(path))
}
