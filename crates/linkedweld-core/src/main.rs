//! LinkedWeld CLI
//!
//! Command-line interface for the LinkedWeld workforce service.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use metrics_exporter_prometheus::PrometheusBuilder;
use serde::Serialize;
use tracing::{info, warn};

use linkedweld::alerting::AlertEvaluator;
use linkedweld::api::{AppState, HttpServer};
use linkedweld::config::{Config, LogFormat, StorageBackend};
use linkedweld::db::{self, Store};
use linkedweld::models::Alert;
use linkedweld::tui::App;

/// LinkedWeld - Workforce management for welding subcontractors
#[derive(Parser)]
#[command(name = "linkedweld")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, global = true, env = "LINKEDWELD_CONFIG")]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output format (for commands that support it)
    #[arg(long, global = true, default_value = "text")]
    format: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum)]
enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the API server and the alert sweep loop
    Serve {
        /// HTTP API port (overrides server.port)
        #[arg(long, env = "LINKEDWELD_HTTP_PORT")]
        port: Option<u16>,

        /// Directory containing the dashboard bundle
        #[arg(long)]
        static_dir: Option<String>,

        /// Do not run the periodic alert sweep
        #[arg(long)]
        no_alerts: bool,
    },

    /// Launch the TUI dashboard
    Dashboard {
        /// Refresh rate in milliseconds (overrides tui.refresh_rate_ms)
        #[arg(long)]
        refresh: Option<u64>,
    },

    /// Inspect and run alerts
    Alerts {
        #[command(subcommand)]
        command: AlertsCommands,
    },

    /// Database management
    Db {
        #[command(subcommand)]
        command: DbCommands,
    },

    /// Show system health status
    Health,

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[derive(Subcommand)]
enum AlertsCommands {
    /// List current document and budget alerts
    List,

    /// Run one sweep: store new notifications and deliver them
    Sweep,
}

#[derive(Subcommand)]
enum DbCommands {
    /// Run database migrations
    Migrate,

    /// Seed an empty database with demo data
    Seed,

    /// Show database statistics
    Stats,

    /// Reset database (WARNING: deletes all data)
    Reset {
        /// Skip confirmation prompt
        #[arg(long)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    // Parse CLI arguments
    let cli = Cli::parse();

    if let Err(e) = dotenvy::dotenv() {
        if !e.not_found() {
            eprintln!("Error reading .env: {e}");
            return ExitCode::FAILURE;
        }
    }

    // Load configuration
    let config = match Config::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error loading configuration: {e}");
            return ExitCode::FAILURE;
        }
    };

    // The dashboard owns the terminal, so it gets no log output
    if !matches!(cli.command, Commands::Dashboard { .. }) {
        init_logging(&config, cli.verbose);
    }

    // Execute command
    let result = match cli.command {
        Commands::Serve {
            port,
            static_dir,
            no_alerts,
        } => run_serve(config, port, static_dir, no_alerts).await,
        Commands::Dashboard { refresh } => run_dashboard(config, refresh).await,
        Commands::Alerts { command } => run_alerts(config, command, cli.format).await,
        Commands::Db { command } => run_db(config, command, cli.format).await,
        Commands::Health => run_health(config, cli.format).await,
        Commands::Completions { shell } => {
            generate_completions(shell);
            Ok(())
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn init_logging(config: &Config, verbose: bool) {
    let log_level = if verbose { "debug" } else { config.logging.level.as_str() };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level));

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match config.logging.format {
        LogFormat::Pretty => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

async fn open(config: &Config) -> anyhow::Result<(Arc<dyn Store>, Arc<AlertEvaluator>)> {
    let store = db::open_store(&config.database)
        .await
        .context("failed to open store")?;
    let evaluator = Arc::new(AlertEvaluator::new(store.clone(), &config.alerting)?);
    Ok((store, evaluator))
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn run_serve(
    mut config: Config,
    port: Option<u16>,
    static_dir: Option<String>,
    no_alerts: bool,
) -> anyhow::Result<()> {
    if let Some(port) = port {
        config.server.port = port;
    }
    if static_dir.is_some() {
        config.server.static_dir = static_dir;
    }

    let (store, evaluator) = open(&config).await?;

    let metrics = if config.server.metrics_enabled {
        Some(
            PrometheusBuilder::new()
                .install_recorder()
                .context("failed to install metrics recorder")?,
        )
    } else {
        None
    };

    if config.alerting.enabled && !no_alerts {
        let sweeper = evaluator.clone();
        tokio::spawn(async move { sweeper.start().await });
    } else {
        info!("Alert sweep disabled");
    }

    let mut server = HttpServer::new(AppState {
        store,
        evaluator,
        metrics,
    });
    if let Some(dir) = &config.server.static_dir {
        info!(dir = %dir, "Serving dashboard bundle");
        server = server.with_static_dir(dir);
    }

    let addr = config.server.bind_addr();
    info!("Starting LinkedWeld on http://{}", addr);

    server
        .serve(&addr, async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!(error = %e, "Failed to listen for shutdown signal");
            }
            info!("Shutting down...");
        })
        .await?;

    Ok(())
}

async fn run_dashboard(config: Config, refresh: Option<u64>) -> anyhow::Result<()> {
    let (store, evaluator) = open(&config).await?;

    let mut app = App::new().with_refresh_rate(refresh.unwrap_or(config.tui.refresh_rate_ms));
    app.run(store, evaluator).await?;

    Ok(())
}

async fn run_alerts(
    config: Config,
    command: AlertsCommands,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let (_, evaluator) = open(&config).await?;

    match command {
        AlertsCommands::List => {
            let alerts = evaluator.current_alerts().await?;
            if format == OutputFormat::Json {
                return print_json(&alerts);
            }
            print_alerts(&alerts);
        }
        AlertsCommands::Sweep => {
            let report = evaluator.sweep().await?;
            if format == OutputFormat::Json {
                return print_json(&report);
            }
            println!(
                "Evaluated {} alert(s), created {} notification(s), {} delivery(ies) succeeded",
                report.evaluated, report.created, report.delivered
            );
        }
    }
    Ok(())
}

fn print_alerts(alerts: &[Alert]) {
    if alerts.is_empty() {
        println!("✅ Nothing needs attention");
        return;
    }

    println!("{:<10} {}", "SEVERITY", "ALERT");
    println!("{}", "─".repeat(60));
    for alert in alerts {
        println!("{:<10} {}", alert.severity.as_str(), alert.message);
    }
}

async fn run_db(config: Config, command: DbCommands, format: OutputFormat) -> anyhow::Result<()> {
    // Seeding is explicit here, never a side effect of opening
    let mut database = config.database.clone();
    database.seed_demo_data = false;

    match command {
        DbCommands::Migrate => {
            if database.backend != StorageBackend::Sqlite {
                println!("In-memory store has no migrations to run");
                return Ok(());
            }
            // open_store migrates on connect
            db::open_store(&database).await?;
            println!("Migrations applied to {}", database.url);
        }
        DbCommands::Seed => {
            let store = db::open_store(&database).await?;
            if db::seed_demo_data(store.as_ref()).await? {
                println!("Demo data inserted");
            } else {
                println!("Store already has workers, seed skipped");
            }
        }
        DbCommands::Stats => {
            let store = db::open_store(&database).await?;
            let evaluator = AlertEvaluator::new(store.clone(), &config.alerting)?;
            let stats = linkedweld::dashboard::build_stats(store.as_ref(), &evaluator).await?;
            if format == OutputFormat::Json {
                return print_json(&stats);
            }
            println!("Database statistics:");
            println!(
                "  Workers:       {} ({} active, {} on leave)",
                stats.total_workers, stats.active_workers, stats.workers_on_leave
            );
            println!("  Projects:      {} active", stats.active_projects);
            println!(
                "  Budget:        {:.2} spent of {:.2}",
                stats.total_spent, stats.total_budget
            );
            println!("  Expiring docs: {}", stats.expiring_documents);
            for (stage, count) in &stats.pipeline {
                println!("  Pipeline {stage:<10} {count}");
            }
            println!("  Unread notifications: {}", stats.unread_notifications);
        }
        DbCommands::Reset { force } => {
            if !force {
                println!("WARNING: This will delete all data!");
                println!("Use --force to confirm.");
                return Ok(());
            }
            let store = db::open_store(&database).await?;
            let removed = db::clear_store(store.as_ref()).await?;
            println!("Removed {removed} record(s)");
        }
    }
    Ok(())
}

#[derive(Serialize)]
struct HealthReport {
    status: &'static str,
    version: &'static str,
    backend: StorageBackend,
    store: String,
}

async fn run_health(config: Config, format: OutputFormat) -> anyhow::Result<()> {
    let mut database = config.database.clone();
    database.seed_demo_data = false;

    let store_status = match db::open_store(&database).await {
        Ok(store) => store.health_check().await.map(|()| "connected".to_string()),
        Err(e) => Err(e),
    };

    let report = HealthReport {
        status: if store_status.is_ok() { "healthy" } else { "degraded" },
        version: env!("CARGO_PKG_VERSION"),
        backend: database.backend,
        store: match &store_status {
            Ok(status) => status.clone(),
            Err(e) => e.to_string(),
        },
    };

    if format == OutputFormat::Json {
        print_json(&report)?;
    } else {
        println!("🏥 System Health Check");
        println!("─────────────────────");
        println!("Version:   {}", report.version);
        match &store_status {
            Ok(_) => println!("Store:     ✅ Connected ({:?})", report.backend),
            Err(e) => println!("Store:     ❌ {e}"),
        }
    }

    if store_status.is_err() {
        anyhow::bail!("store is unhealthy");
    }
    Ok(())
}

fn generate_completions(shell: clap_complete::Shell) {
    use clap::CommandFactory;
    use clap_complete::generate;
    use std::io;

    let mut cmd = Cli::command();
    generate(shell, &mut cmd, "linkedweld", &mut io::stdout());
}
