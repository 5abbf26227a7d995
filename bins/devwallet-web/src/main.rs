//! devwallet-web: wallet session UI served over HTTP.
//!
//! Serves a single page at `/` plus a JSON API: `GET /api/session` returns
//! the current session snapshot and `POST /api/commands` runs one session
//! command. The wallet provider is a Solana CLI keypair file guarded by a
//! terminal approval prompt.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};

mod config;
mod routes;

use config::Args;
use devwallet_ledger::LedgerClient;
use devwallet_provider::{
    Approval, FixedApproval, KeypairFileProvider, ProviderGateway, TerminalApproval, WalletProvider,
};
use devwallet_session::{spawn_session, SessionController, SessionHandle};

/// Shared application state passed to every Axum handler.
#[derive(Clone)]
pub struct AppState {
    /// Queue into the single session task.
    pub session: SessionHandle,
}

fn init_tracing(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    if json {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

fn detect_provider(args: &Args) -> ProviderGateway {
    let approval: Arc<dyn Approval> = if args.auto_approve {
        Arc::new(FixedApproval::allow())
    } else {
        Arc::new(TerminalApproval::default())
    };

    let mut candidates: Vec<Arc<dyn WalletProvider>> = Vec::new();
    match args.keypair_path() {
        Some(path) => match KeypairFileProvider::discover(&path, approval) {
            Some(provider) => candidates.push(Arc::new(provider)),
            None => warn!(path = %path.display(), "Keypair file missing or unreadable"),
        },
        None => warn!("No home directory; pass --keypair to enable the wallet provider"),
    }

    let gateway = ProviderGateway::detect(candidates);
    if !gateway.is_available() {
        warn!("No wallet provider found; Connect Wallet will report it as unavailable");
    }
    gateway
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.log_json);

    let ledger_config = args.ledger_config();
    let session_config = args.session_config();

    info!(
        cluster = %args.cluster,
        rpc = %ledger_config.rpc_url,
        commitment = %ledger_config.commitment,
        bind = %args.bind,
        airdrop_lamports = session_config.airdrop_lamports,
        reserve_lamports = session_config.transfer.reserve_lamports,
        "Starting devwallet-web"
    );

    let ledger = LedgerClient::connect_rpc(ledger_config)
        .with_context(|| format!("Failed to create RPC client for {}", args.rpc_url()))?;
    let gateway = detect_provider(&args);

    let controller = SessionController::new(gateway, ledger, session_config);
    let (session, session_task) = spawn_session(controller);

    let app = routes::router(AppState { session });

    let listener = tokio::net::TcpListener::bind(&args.bind)
        .await
        .with_context(|| format!("Failed to bind to {}", args.bind))?;

    info!("Listening on http://{}", args.bind);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!(error = %e, "Failed to listen for shutdown signal");
            }
            info!("Shutting down");
        })
        .await
        .context("HTTP server error")?;

    // The router held the last session handle; the task now drains and exits.
    session_task.await.context("Session task panicked")?;

    Ok(())
}
