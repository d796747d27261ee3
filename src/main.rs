use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use indicatif::ProgressBar;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use league_roster::api::client::RiotApiClient;
use league_roster::cache::{AggregateCache, CacheSettings};
use league_roster::config::Config;
use league_roster::display::output::{display_error, display_info, display_roster};
use league_roster::roster::RosterReconciler;
use league_roster::server::{build_router, AppState};
use league_roster::store::AggregateStore;

#[derive(Parser, Debug)]
#[command(name = "league_roster")]
#[command(about = "Track ranked stats for a fixed roster of players", long_about = None)]
#[command(version)]
struct Cli {
    /// Cache file path (overrides CACHE_FILE)
    #[arg(long)]
    cache_file: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the HTTP server
    Serve {
        /// Bind address
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Port number
        #[arg(long, default_value = "3000")]
        port: u16,

        /// Directory holding the front end
        #[arg(long, default_value = "public")]
        public_dir: PathBuf,
    },

    /// Reconcile the roster once and print the stats
    Stats,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&cli.log_level));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    if let Err(e) = run(cli).await {
        display_error(&format!("{:#}", e));
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let mut config = Config::from_env()?;
    if let Some(path) = cli.cache_file {
        config.cache_file = path;
    }

    let source = Arc::new(RiotApiClient::new(&config));
    let store = AggregateStore::open(&config.cache_file);
    let cache = Arc::new(AggregateCache::new(
        source,
        CacheSettings::from_config(&config),
        store,
    ));
    let roster = Arc::new(RosterReconciler::new(
        Arc::clone(&cache),
        config.roster.clone(),
        config.max_concurrent_players,
    ));

    match cli.command {
        Commands::Serve {
            host,
            port,
            public_dir,
        } => {
            let public_dir = public_dir.is_dir().then_some(public_dir);
            if public_dir.is_none() {
                tracing::warn!("No front end directory found, serving the API only");
            }

            let app = build_router(AppState { roster }, public_dir);
            let addr = format!("{}:{}", host, port);
            let listener = tokio::net::TcpListener::bind(&addr)
                .await
                .with_context(|| format!("binding {}", addr))?;

            tracing::info!(
                "Tracking {} players, serving on http://{}",
                config.roster.len(),
                addr
            );
            axum::serve(listener, app)
                .with_graceful_shutdown(shutdown_signal())
                .await?;

            tracing::info!("Shutting down, flushing cache to {:?}", config.cache_file);
            cache.flush()?;
        }
        Commands::Stats => {
            display_info(&format!(
                "Reconciling {} players in region {}",
                config.roster.len(),
                config.region
            ));

            let spinner = ProgressBar::new_spinner();
            spinner.set_message("Fetching match history");
            spinner.enable_steady_tick(Duration::from_millis(120));
            let results = roster.reconcile_all().await;
            spinner.finish_and_clear();

            display_roster(&results, roster.roster());
        }
    }

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Could not listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}
