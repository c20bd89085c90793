use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use sha2::{Digest, Sha256};
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use quickeats_core::{
    create_audit_system, create_authenticator, create_messenger, load_config, validate_config,
    AccessControl, AuditEvent, AuditStore, Authenticator, ChefLedger, SqliteAuditStore,
    SqliteChefLedger, SqliteTicketStore, StaticAccessControl, TicketEngine, TicketStore,
};
use quickeats_server::{api::create_router, state::AppState};

/// Application version
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Buffer size for audit event channel
const AUDIT_BUFFER_SIZE: usize = 1000;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config_path = std::env::var("QUICKEATS_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config.toml"));

    info!("Loading configuration from {:?}", config_path);
    let config = load_config(&config_path)
        .with_context(|| format!("Failed to load config from {:?}", config_path))?;
    validate_config(&config).context("Configuration validation failed")?;

    info!("Configuration loaded successfully");
    info!("Auth method: {:?}", config.auth.method);
    info!("Database path: {:?}", config.database.path);

    // Compute config hash for audit
    let config_json = serde_json::to_string(&config).unwrap_or_default();
    let config_hash = format!("{:x}", Sha256::digest(config_json.as_bytes()));
    let config_hash_short = &config_hash[..16];

    let authenticator: Arc<dyn Authenticator> = Arc::from(
        create_authenticator(&config.auth).context("Failed to create authenticator")?,
    );
    info!("Using authenticator: {}", authenticator.method_name());

    // All stores share one SQLite file
    let audit_store: Arc<dyn AuditStore> = Arc::new(
        SqliteAuditStore::new(&config.database.path).context("Failed to create audit store")?,
    );
    let ticket_store: Arc<dyn TicketStore> = Arc::new(
        SqliteTicketStore::new(&config.database.path).context("Failed to create ticket store")?,
    );
    let ledger: Arc<dyn ChefLedger> = Arc::new(
        SqliteChefLedger::new(&config.database.path).context("Failed to create chef ledger")?,
    );
    info!("Stores initialized");

    let (audit_handle, audit_writer) =
        create_audit_system(Arc::clone(&audit_store), AUDIT_BUFFER_SIZE);
    let writer_handle = tokio::spawn(audit_writer.run());

    audit_handle
        .emit(AuditEvent::ServiceStarted {
            version: VERSION.to_string(),
            config_hash: config_hash_short.to_string(),
        })
        .await;

    let messenger =
        create_messenger(&config.messaging).context("Failed to create messaging backend")?;
    let access: Arc<dyn AccessControl> = Arc::new(StaticAccessControl::new(&config.access));
    info!(
        "Messaging backend: {:?}, {} admins, {} chefs",
        config.messaging.backend,
        config.access.admins.len(),
        config.access.chefs.len()
    );

    let engine = TicketEngine::new(
        ticket_store,
        ledger,
        messenger,
        access,
        config.orders.clone(),
        config.tickets.clone(),
    )
    .context("Failed to create ticket engine")?
    .with_audit(audit_handle.clone());

    match engine.recover().await {
        Ok(0) => {}
        Ok(n) => info!("Finalized {} completed tickets left by the previous run", n),
        Err(e) => warn!("Startup recovery failed: {}", e),
    }
    let status = engine.status().context("Failed to read chef status")?;
    info!(
        "Loaded {} chefs ({} open)",
        status.total, status.open
    );

    let state = Arc::new(AppState::new(
        config.clone(),
        authenticator,
        engine,
        audit_handle.clone(),
        audit_store,
    ));
    let app = create_router(state);

    let addr = SocketAddr::new(config.server.host, config.server.port);
    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutting down...");
    audit_handle
        .emit(AuditEvent::ServiceStopped {
            reason: "graceful_shutdown".to_string(),
        })
        .await;

    // The router (and every engine clone with its handle) is gone by now;
    // dropping the last handle lets the writer drain and exit.
    drop(audit_handle);
    let _ = writer_handle.await;
    info!("Audit writer stopped");

    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
