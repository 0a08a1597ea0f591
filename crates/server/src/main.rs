use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tracing::{info, warn};

use puremeds_engine::EngineBuilder;
use puremeds_ledger::{DynLedgerClient, HttpLedgerClient, HttpLedgerConfig, MemoryLedger};
use puremeds_server::api::{self, AppState};
use puremeds_server::config::{PuremedsConfig, StoreConfig};
use puremeds_server::error::ServerError;
use puremeds_server::telemetry;
use puremeds_store::ProductStore;
use puremeds_store_memory::MemoryProductStore;

/// PureMeds verification backend HTTP server.
#[derive(Parser, Debug)]
#[command(name = "puremeds-server", about = "HTTP server for the PureMeds backend")]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long, default_value = "puremeds.toml")]
    config: String,

    /// Override the bind host.
    #[arg(long)]
    host: Option<String>,

    /// Override the bind port.
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Load configuration from TOML file, or use defaults if the file does
    // not exist.
    let config: PuremedsConfig = if Path::new(&cli.config).exists() {
        let contents = std::fs::read_to_string(&cli.config)?;
        toml::from_str(&contents)?
    } else {
        PuremedsConfig::default()
    };

    telemetry::init();

    if !Path::new(&cli.config).exists() {
        info!(path = %cli.config, "config file not found, using defaults");
    }

    // Product store backend.
    let store = build_store(&config.store).await?;
    info!(backend = %config.store.backend, "product store ready");

    // Ledger client: constructed once, injected everywhere.
    let ledger: Arc<dyn DynLedgerClient> = if config.ledger.enabled {
        let client = HttpLedgerClient::new(HttpLedgerConfig {
            endpoint: config.ledger.endpoint.clone(),
            api_key: config.ledger.api_key.clone(),
            contract_address: config.ledger.contract_address.clone(),
            timeout: Duration::from_secs(config.ledger.timeout_seconds),
        })?;
        Arc::new(client)
    } else {
        warn!("ledger disabled, using in-process ledger (development only)");
        Arc::new(MemoryLedger::new())
    };

    // Startup probe: a down ledger degrades verification but should be
    // visible in the logs from the first second.
    match ledger.health_check().await {
        Ok(()) => info!("ledger reachable"),
        Err(e) => warn!(error = %e, "ledger not reachable at startup"),
    }

    let engine = EngineBuilder::new()
        .store(store.clone())
        .ledger(ledger)
        .build()?;

    let state = AppState {
        engine: Arc::new(engine),
        store,
        max_upload_bytes: config.server.max_upload_bytes,
    };
    let app = api::router(state);

    let addr = format!("{}:{}",
        cli.host.unwrap_or(config.server.host),
        cli.port.unwrap_or(config.server.port));
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(%addr, "puremeds-server listening");

    // Serve with graceful shutdown on SIGINT / SIGTERM.
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("puremeds-server shut down");
    Ok(())
}

/// Build the configured product store backend.
async fn build_store(config: &StoreConfig) -> Result<Arc<dyn ProductStore>, ServerError> {
    match config.backend.as_str() {
        "memory" => Ok(Arc::new(MemoryProductStore::new())),
        #[cfg(feature = "postgres")]
        "postgres" => {
            let url = config.url.clone().ok_or_else(|| {
                ServerError::Config("store.url is required for the postgres backend".into())
            })?;
            let mut pg = puremeds_store_postgres::PostgresConfig {
                url,
                ..puremeds_store_postgres::PostgresConfig::default()
            };
            if let Some(pool_size) = config.pool_size {
                pg.pool_size = pool_size;
            }
            if let Some(schema) = config.schema.clone() {
                pg.schema = schema;
            }
            if let Some(prefix) = config.table_prefix.clone() {
                pg.table_prefix = prefix;
            }
            let store = puremeds_store_postgres::PostgresProductStore::new(pg)
                .await
                .map_err(|e| ServerError::Config(format!("postgres store: {e}")))?;
            Ok(Arc::new(store))
        }
        #[cfg(not(feature = "postgres"))]
        "postgres" => Err(ServerError::Config(
            "server built without postgres support".into(),
        )),
        other => Err(ServerError::Config(format!(
            "unknown store backend {other:?} (expected \"memory\" or \"postgres\")"
        ))),
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    info!("shutdown signal received");
}
