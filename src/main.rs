use analytics::{Facet, ViewFilters};
use anyhow::Context;
use api_client::{HistorySource, HttpClient, HttpHistorySource, Session, SessionState};
use clap::{Args, Parser, Subcommand};
use configuration::{load_config_from, Config, LogFormat};
use engine::{ApiSnapshotSource, RefreshScheduler, SnapshotReceiver, ViewKind};
use std::path::PathBuf;
use std::sync::Arc;

mod render;

/// The main entry point for the Vantage dashboard.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env file is fine; the token may come from the flag or the shell.
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let mut config = load_config_from(&cli.config)
        .with_context(|| format!("Failed to load configuration from {}", cli.config.display()))?;
    if let Some(format) = cli.log_format {
        config.logging.format = format;
    }
    let _log_guard = configuration::init_tracing(&config.logging).context("Failed to initialise logging")?;

    let session = match &cli.token {
        Some(token) => Session::with_token(token.clone()),
        None => {
            tracing::warn!("No API token supplied; requests are sent unauthenticated.");
            Session::new()
        }
    };
    let scheduler = build_scheduler(&config, session.clone())?;

    match cli.command {
        Commands::Snapshot(args) => handle_snapshot(&scheduler, args, cli.json).await,
        Commands::Watch(args) => handle_watch(&scheduler, &session, args, cli.json).await,
    }
}

// ==============================================================================
// CLI Structure
// ==============================================================================

/// Live analytics over the trading backend: portfolio, positions, trades,
/// strategies, agents and review reports.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to the TOML configuration file. It may be absent.
    #[arg(long, global = true, default_value = "config.toml")]
    config: PathBuf,

    /// API token sent in the Authorization header.
    #[arg(long, global = true, env = "VANTAGE_API_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Overrides `logging.format` from the configuration file.
    #[arg(long, global = true, value_enum)]
    log_format: Option<LogFormat>,

    /// Print snapshots as JSON instead of tables.
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch and print one view once.
    Snapshot(SnapshotArgs),
    /// Keep views refreshed on their configured intervals until Ctrl-C.
    Watch(WatchArgs),
}

#[derive(Args)]
struct SnapshotArgs {
    /// One of: dashboard, agents, portfolio, positions, trades, strategies, reports.
    view: ViewKind,

    #[command(flatten)]
    filters: FilterArgs,
}

#[derive(Args)]
struct WatchArgs {
    /// The views to keep refreshed.
    #[arg(default_values_t = [ViewKind::Dashboard, ViewKind::Agents])]
    views: Vec<ViewKind>,

    #[command(flatten)]
    filters: FilterArgs,
}

/// Filter values as typed by the user. "all" or an empty value disables a facet.
#[derive(Args)]
struct FilterArgs {
    /// Case-insensitive substring of the symbol.
    #[arg(long, default_value = "")]
    symbol: String,

    /// Trade direction, e.g. BUY or SELL.
    #[arg(long, default_value = "all")]
    action: String,

    /// Status for the view: trade status, strategy status or agent state.
    #[arg(long, default_value = "all")]
    status: String,

    /// real or simulation.
    #[arg(long, default_value = "all")]
    account_type: String,

    /// daily, weekly or monthly.
    #[arg(long, default_value = "all")]
    report_type: String,
}

impl FilterArgs {
    /// Maps `--status` onto the status dimension the view actually has.
    fn for_view(&self, view: ViewKind) -> ViewFilters {
        let mut filters = ViewFilters {
            symbol: self.symbol.clone(),
            action: Facet::parse(&self.action),
            account_type: Facet::parse(&self.account_type),
            report_type: Facet::parse(&self.report_type),
            ..Default::default()
        };
        match view {
            ViewKind::Trades => filters.trade_status = Facet::parse(&self.status),
            ViewKind::Strategies => filters.strategy_status = Facet::parse(&self.status),
            ViewKind::Agents => filters.agent_state = Facet::parse(&self.status),
            _ => {}
        }
        filters
    }
}

// ==============================================================================
// Wiring
// ==============================================================================

fn build_scheduler(config: &Config, session: Session) -> anyhow::Result<RefreshScheduler> {
    let client = HttpClient::new(&config.api, session).context("Failed to build the HTTP client")?;

    let history = config.history.equity_path.as_ref().map(|path| {
        tracing::info!(path = %path, "Equity history source configured.");
        Arc::new(HttpHistorySource::new(client.clone(), path.clone())) as Arc<dyn HistorySource>
    });

    let source = ApiSnapshotSource::new(Arc::new(client), history, config.dashboard.clone());
    Ok(RefreshScheduler::new(Arc::new(source), config))
}

// ==============================================================================
// Command Handlers
// ==============================================================================

async fn handle_snapshot(scheduler: &RefreshScheduler, args: SnapshotArgs, json: bool) -> anyhow::Result<()> {
    let filters = args.filters.for_view(args.view);
    let snapshot = scheduler
        .snapshot_once(args.view, &filters)
        .await
        .with_context(|| format!("Failed to build the {} view", args.view))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
    } else {
        println!("{}", render::render(&snapshot));
    }
    Ok(())
}

/// Prints every snapshot a view publishes until its channel closes.
async fn print_updates(mut rx: SnapshotReceiver, json: bool) {
    while rx.changed().await.is_ok() {
        let Some(published) = rx.borrow_and_update().clone() else {
            continue;
        };
        if json {
            match serde_json::to_string(&published.snapshot) {
                Ok(text) => println!("{text}"),
                Err(e) => tracing::error!(view = %published.view, error = %e, "Failed to serialise snapshot."),
            }
        } else {
            println!("{}\n{}", render::heading(&published), render::render(&published.snapshot));
        }
    }
}

async fn handle_watch(
    scheduler: &RefreshScheduler,
    session: &Session,
    args: WatchArgs,
    json: bool,
) -> anyhow::Result<()> {
    let mut printers = Vec::new();
    for view in args.views {
        let rx = scheduler.start(view, args.filters.for_view(view));
        printers.push(tokio::spawn(print_updates(rx, json)));
    }

    // An expired session cannot recover without a new token, so stop like Ctrl-C would.
    let mut session_rx = session.subscribe();
    tokio::select! {
        signal = tokio::signal::ctrl_c() => {
            signal.context("Failed to listen for Ctrl-C")?;
            tracing::info!("Shutting down.");
        }
        _ = session_rx.wait_for(|state| matches!(state, SessionState::Expired)) => {
            tracing::error!("Session expired; supply a fresh token to continue.");
        }
    }

    scheduler.cancel_all();
    for printer in printers {
        printer.await.ok();
    }
    Ok(())
}
