//! Dojo bracket server.
//!
//! Serves the bracket API over HTTP, persisting brackets in PostgreSQL when
//! a database is configured and in process memory otherwise.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Error};
use ctrlc::set_handler;
use dojo_brackets::{
    BracketManager, BracketStore, InMemoryBracketStore, ParticipantSource, PgBracketStore,
    db::{Database, PgRegistrationRepository, StaticParticipantSource},
};
use dojo_server::{api, config::ServerConfig, logging, metrics};
use log::info;
use pico_args::Arguments;
use tokio::sync::Notify;

const HELP: &str = "\
Run the dojo bracket server

USAGE:
  dojo_server [OPTIONS]

OPTIONS:
  --bind       IP:PORT     Server socket bind address  [default: env SERVER_BIND or 127.0.0.1:6969]
  --db-url     URL         Database connection string  [default: env DATABASE_URL, in-memory if unset]

FLAGS:
  -h, --help               Print help information

ENVIRONMENT:
  SERVER_BIND              Server bind address (e.g., 0.0.0.0:8080)
  DATABASE_URL             PostgreSQL connection string
  BRACKET_STORAGE          memory | postgres
  METRICS_BIND             Prometheus listener address (e.g., 127.0.0.1:9090)
  BRACKET_RNG_SEED         Fixed seed for reproducible draws
  (See .env file for all configuration options)
";

#[tokio::main]
async fn main() -> Result<(), Error> {
    // Load .env file if it exists
    let _ = dotenvy::dotenv();

    let mut pargs = Arguments::from_env();

    // Help has a higher priority and should be handled separately.
    if pargs.contains(["-h", "--help"]) {
        print!("{HELP}");
        std::process::exit(0);
    }

    let bind: Option<SocketAddr> = pargs.opt_value_from_str("--bind")?;
    let database_url: Option<String> = pargs.opt_value_from_str("--db-url")?;

    let config = ServerConfig::from_env(bind, database_url)?;
    config.validate()?;

    // SIGINT/SIGTERM trigger a graceful shutdown.
    let shutdown = Arc::new(Notify::new());
    let notifier = shutdown.clone();
    set_handler(move || notifier.notify_one())?;

    logging::init();
    info!("Starting dojo bracket server at {}", config.bind);

    if let Some(metrics_bind) = config.metrics_bind {
        metrics::init_metrics(metrics_bind).map_err(anyhow::Error::msg)?;
        info!("Prometheus metrics at http://{}/metrics", metrics_bind);
    }

    let (store, participants, database) = match &config.database {
        Some(db_config) => {
            let db = Database::new(db_config)
                .await
                .context("Failed to connect to database")?;
            db.apply_schema()
                .await
                .context("Failed to create bracket schema")?;
            info!("Database connected successfully");

            let pool = db.shared_pool();
            let store: Arc<dyn BracketStore> = Arc::new(PgBracketStore::new(pool.clone()));
            let participants: Arc<dyn ParticipantSource> =
                Arc::new(PgRegistrationRepository::new(pool));
            (store, participants, Some(db))
        }
        None => {
            log::warn!("No DATABASE_URL configured, brackets are kept in memory only");
            let store: Arc<dyn BracketStore> = Arc::new(InMemoryBracketStore::new());
            let participants: Arc<dyn ParticipantSource> =
                Arc::new(StaticParticipantSource::new());
            (store, participants, None)
        }
    };

    let bracket_manager = match config.rng_seed {
        Some(seed) => {
            info!("Drawing brackets with fixed seed {}", seed);
            BracketManager::with_seed(store, seed)
        }
        None => BracketManager::new(store),
    };

    let api_state = api::AppState {
        bracket_manager: Arc::new(bracket_manager),
        participants,
        database: database.clone(),
    };

    let app = api::create_router(api_state);

    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .with_context(|| format!("Failed to bind to {}", config.bind))?;

    info!(
        "Server is running at http://{}. Press Ctrl+C to stop.",
        config.bind
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(async move { shutdown.notified().await })
        .await
        .context("Server error")?;

    info!("Shutting down server...");
    if let Some(db) = database {
        db.close().await;
    }

    Ok(())
}
