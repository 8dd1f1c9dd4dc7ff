//! Server initialization for the HTTP API and the MCP stdio transport.
//!
//! Provides [`serve_http`] and [`serve_mcp_stdio`] entry points that wire up
//! the database, the AI gateway client and the request handlers.

use crate::ai::GatewayClient;
use crate::api::{self, AppState};
use crate::config::MurmurConfig;
use crate::db;
use crate::tools::MurmurTools;
use anyhow::Result;
use rmcp::ServiceExt;
use std::sync::{Arc, Mutex};

/// Shared setup: open DB and build the AI client if a key is configured.
fn setup_shared_state(config: MurmurConfig) -> Result<AppState> {
    let db_path = config.resolved_db_path();
    let conn = db::open_database(&db_path)?;
    tracing::info!(db = %db_path.display(), "database ready");

    let ai = GatewayClient::from_config(&config.ai)?.map(Arc::new);
    if ai.is_some() {
        tracing::info!(url = %config.ai.gateway_url, "AI gateway ready");
    } else {
        tracing::warn!("no AI key configured, transcription and analysis are disabled");
    }

    Ok(AppState {
        db: Arc::new(Mutex::new(conn)),
        ai,
        config: Arc::new(config),
    })
}

/// Start the HTTP API.
pub async fn serve_http(config: MurmurConfig) -> Result<()> {
    let bind_addr = format!("{}:{}", config.server.host, config.server.port);

    let state = setup_shared_state(config)?;
    let router = api::router(state);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!(addr = %bind_addr, "murmur listening at http://{bind_addr}");

    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "failed to listen for ctrl-c");
            }
            tracing::info!("shutting down HTTP server");
        })
        .await?;

    Ok(())
}

/// Start the MCP server over stdio transport.
pub async fn serve_mcp_stdio(config: MurmurConfig) -> Result<()> {
    tracing::info!("starting murmur MCP server on stdio");

    let state = setup_shared_state(config)?;

    let tools = MurmurTools::new(state.db, state.config);
    let transport = rmcp::transport::stdio();

    let server = tools.serve(transport).await?;
    tracing::info!("MCP server running, waiting for client");

    server.waiting().await?;
    tracing::info!("MCP server shut down");

    Ok(())
}
