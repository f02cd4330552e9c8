//! dynsec MCP Server - Entry point
//!
//! Parses CLI arguments, validates configuration, starts the MCP server
//! on stdio transport, and handles graceful shutdown.

use clap::Parser;
use rmcp::service::ServiceExt;
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

use dynsec_mcp::config::{Args, Config};
use dynsec_mcp::error::Result;
use dynsec_mcp::server::DynsecMcpServer;

#[tokio::main]
async fn main() -> Result<()> {
    // Log to stderr; stdout carries MCP JSON-RPC
    FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    // Parse CLI arguments
    let args = Args::parse();

    // Validate and create config
    let config = Config::from_args(args)?;

    info!("dynsec MCP Server v{} starting...", env!("CARGO_PKG_VERSION"));
    info!(
        "Managing dynsec as '{}' via {}@{}:{}",
        config.admin_user, config.user, config.host, config.port
    );
    info!(
        "Control binary: {}, timeout: {}",
        config.ctrl_binary,
        config
            .timeout_ms
            .map_or("unlimited".to_string(), |ms| format!("{}ms", ms))
    );

    // Create MCP server
    let server = DynsecMcpServer::new(config).await?;

    info!("dynsec MCP Server running on stdio");

    // Create a clone for the shutdown handler
    let server_for_shutdown = server.clone();

    // Spawn a task to handle shutdown signals
    let shutdown_handle = tokio::spawn(async move {
        // Wait for Ctrl+C or SIGTERM
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Received SIGINT (Ctrl+C), shutting down...");
            }
            _ = async {
                #[cfg(unix)]
                {
                    match tokio::signal::unix::signal(
                        tokio::signal::unix::SignalKind::terminate()
                    ) {
                        Ok(mut sigterm) => {
                            sigterm.recv().await;
                        }
                        Err(e) => {
                            error!("Failed to register SIGTERM handler: {}", e);
                            std::future::pending::<()>().await;
                        }
                    }
                }
                #[cfg(not(unix))]
                {
                    std::future::pending::<()>().await;
                }
            } => {
                info!("Received SIGTERM, shutting down...");
            }
        }

        // Cleanup
        server_for_shutdown.shutdown().await;
    });

    // Start the MCP server on stdio transport
    match server.serve(rmcp::transport::io::stdio()).await {
        Ok(running_server) => {
            // Wait for the server to finish (it will run until the transport closes)
            info!("MCP server is serving...");
            if let Err(e) = running_server.waiting().await {
                error!("Server error: {}", e);
            }
        }
        Err(e) => {
            error!("Failed to start MCP server: {}", e);
            return Err(dynsec_mcp::DynsecError::connection(e.to_string()));
        }
    }

    // Cancel the shutdown handler if we exit normally
    shutdown_handle.abort();

    info!("dynsec MCP Server stopped");

    Ok(())
}
