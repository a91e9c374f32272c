//! Messenger Webhook - Main Entry Point
//!
//! Serves the Messenger Platform webhook and replies through the Send API.

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use messenger_webhook::webhook;
use messenger_webhook::{Bot, MessengerConfig, SendDispatcher, WebhookState};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,messenger_webhook=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("🚀 Messenger webhook starting...");

    // Load configuration
    let config = MessengerConfig::from_env()?;
    info!("📋 Configuration loaded");

    // Sending is impossible without a page access token, so fail here
    let dispatcher = Arc::new(SendDispatcher::from_config(&config)?);
    let bot = Arc::new(Bot::new(dispatcher, config.send_typing_indicators));

    let addr: SocketAddr = config.webhook_addr.parse()?;
    let state = WebhookState {
        config: Arc::new(config),
        bot,
    };

    info!("🌐 Webhook server listening on {}", addr);
    webhook::run_server(addr, state, shutdown_signal()).await?;

    info!("✅ Messenger webhook stopped");
    Ok(())
}

async fn shutdown_signal() {
    match signal::ctrl_c().await {
        Ok(()) => info!("📢 Shutdown signal received"),
        Err(err) => tracing::error!("Unable to listen for shutdown signal: {}", err),
    }
}
