//! Configuration management

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::types::NotificationType;

/// Default Send API endpoint
pub const DEFAULT_SEND_API_URL: &str = "https://graph.facebook.com/v2.6/me/messages";

/// Webhook service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessengerConfig {
    // =========================================================================
    // Platform Credentials
    // =========================================================================
    /// Token the platform echoes back during the subscription handshake
    pub verify_token: String,

    /// Page access token for Send API calls
    ///
    /// Optional here; components that send messages refuse to start without it.
    #[serde(default)]
    pub page_access_token: Option<String>,

    // =========================================================================
    // Server & Outbound
    // =========================================================================
    /// Webhook server bind address
    #[serde(default = "default_webhook_addr")]
    pub webhook_addr: String,

    /// Send API endpoint
    #[serde(default = "default_send_api_url")]
    pub send_api_url: String,

    /// Timeout for a single outbound call
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Notification type stamped on every outbound payload
    #[serde(default)]
    pub notification_type: NotificationType,

    /// Mark inbound messages seen and show typing before replying
    #[serde(default)]
    pub send_typing_indicators: bool,

    /// Enable debug mode (log raw webhook bodies)
    #[serde(default)]
    pub debug_mode: bool,
}

fn default_webhook_addr() -> String {
    "0.0.0.0:5000".to_string()
}

fn default_send_api_url() -> String {
    DEFAULT_SEND_API_URL.to_string()
}

fn default_request_timeout() -> u64 {
    10
}

impl MessengerConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let verify_token = std::env::var("VERIFY_TOKEN").context("VERIFY_TOKEN is required")?;

        Ok(Self {
            verify_token,
            page_access_token: std::env::var("PAGE_ACCESS_TOKEN")
                .ok()
                .filter(|token| !token.is_empty()),
            webhook_addr: std::env::var("WEBHOOK_ADDR").unwrap_or_else(|_| default_webhook_addr()),
            send_api_url: std::env::var("SEND_API_URL")
                .unwrap_or_else(|_| default_send_api_url()),
            request_timeout_secs: std::env::var("REQUEST_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or_else(default_request_timeout),
            notification_type: std::env::var("NOTIFICATION_TYPE")
                .map(|s| NotificationType::from_setting(&s))
                .unwrap_or_default(),
            send_typing_indicators: std::env::var("SEND_TYPING_INDICATORS").is_ok(),
            debug_mode: std::env::var("DEBUG_MODE").is_ok(),
        })
    }

    /// Configuration with defaults for everything but the two secrets
    pub fn new(verify_token: impl Into<String>, page_access_token: Option<String>) -> Self {
        Self {
            verify_token: verify_token.into(),
            page_access_token,
            webhook_addr: default_webhook_addr(),
            send_api_url: default_send_api_url(),
            request_timeout_secs: default_request_timeout(),
            notification_type: NotificationType::default(),
            send_typing_indicators: false,
            debug_mode: false,
        }
    }
}
