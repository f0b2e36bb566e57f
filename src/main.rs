#![cfg_attr(not(test), deny(clippy::panic))]

use std::net::SocketAddr;
use std::sync::Arc;

use clap::Parser;
use nightward_engine::config;
use nightward_engine::logging;
use nightward_engine::server::GameEngine;
use nightward_engine::websocket;

/// Nightward -- authoritative game-state engine for a night-phase social-deduction party game
#[derive(Parser, Debug)]
#[command(name = "nightward-engine")]
#[command(about = "An in-memory, authoritative game-state engine for night-phase party games")]
#[command(version)]
struct Cli {
    /// Validate configuration and exit without starting the server.
    /// Useful for CI/CD pipelines and pre-deployment checks.
    #[arg(long, short = 'c', conflicts_with = "print_config")]
    validate_config: bool,

    /// Print the loaded configuration to stdout (as JSON) and exit.
    /// Useful for debugging configuration loading from multiple sources.
    #[arg(long, conflicts_with = "validate_config")]
    print_config: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration from config.json if present; otherwise use code defaults.
    let cfg = config::load();

    // Handle --print-config: output the loaded configuration as JSON
    if cli.print_config {
        let json = serde_json::to_string_pretty(&cfg)
            .map_err(|e| anyhow::anyhow!("failed to serialize config: {e}"))?;
        println!("{json}");
        return Ok(());
    }

    let validation_result = config::validate_server_config(&cfg);

    // Handle --validate-config: exit after validation
    if cli.validate_config {
        match validation_result {
            Ok(()) => {
                println!("Configuration validation passed");
                println!();
                println!("Configuration summary:");
                println!("  Port: {}", cfg.port);
                println!("  Max players per room: {}", cfg.server.max_players_per_room);
                println!("  Max concurrent rooms: {}", cfg.server.max_rooms);
                println!("  Room code length: {}", cfg.protocol.room_code_length);
                println!("  Reconnection enabled: {}", cfg.server.enable_reconnection);
                println!(
                    "  Production mode: {}",
                    config::is_production_mode()
                );
                return Ok(());
            }
            Err(e) => {
                eprintln!("Configuration validation failed:\n{e}");
                std::process::exit(1);
            }
        }
    }

    // In normal operation, propagate validation errors
    validation_result?;

    // Initialize logging from config.
    logging::init_with_config(&cfg.logging);

    let port = cfg.port;
    let addr = SocketAddr::from(([0, 0, 0, 0], port));

    tracing::info!(%addr, "starting nightward engine");

    let engine = GameEngine::new(&cfg);
    let router = websocket::create_router(Arc::clone(&engine));

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "listening for connections");

    axum::serve(
        listener,
        router.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
