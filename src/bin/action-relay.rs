// ABOUTME: Server binary for the action relay
// ABOUTME: Loads environment configuration, seeds tokens, and runs the unified listener
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Action Relay Contributors

//! # Action Relay Server Binary
//!
//! Starts the HTTP/WebSocket relay with configuration taken from the
//! environment. `--http-port` overrides the `PORT` variable.

use action_relay::{
    config::ServerConfig,
    logging,
    server::{RelayServer, ServerResources},
};
use anyhow::Result;
use clap::Parser;
use std::sync::Arc;
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "action-relay")]
#[command(about = "HTTP/WebSocket relay for operator bot actions")]
pub struct Args {
    /// Override HTTP port
    #[arg(long)]
    http_port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = ServerConfig::from_env()?;
    if let Some(http_port) = args.http_port {
        config.http_port = http_port;
    }

    logging::init_from_env()?;

    info!("starting action relay");
    info!("{}", config.summary());
    if config.seed_tokens.is_empty() {
        info!("no seed tokens configured; every request will be rejected until tokens are added");
    }

    let port = config.http_port;
    let resources = Arc::new(ServerResources::new(config));
    let server = RelayServer::new(resources);

    if let Err(e) = server.run(port).await {
        error!("server error: {e}");
        return Err(e);
    }

    Ok(())
}
