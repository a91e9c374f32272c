//! Send API dispatcher
//!
//! Serializes outbound payloads and POSTs them to the platform's messages
//! endpoint, with the page access token carried as a query parameter.
//! Delivery failures are logged and reported as an absent result; they never
//! propagate to the caller.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

use crate::config::MessengerConfig;
use crate::error::MessengerError;
use crate::types::{NotificationType, OutboundPayload, SendResponse};

// =============================================================================
// Transport
// =============================================================================

/// Raw HTTP response as seen by the dispatcher
#[derive(Debug, Clone, Default)]
pub struct TransportResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl TransportResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Outbound HTTP seam
#[async_trait]
pub trait Transport: Send + Sync {
    /// POST `body` as JSON to `url` with `access_token` in the query string
    async fn post_json(
        &self,
        url: &str,
        access_token: &str,
        body: &Value,
    ) -> anyhow::Result<TransportResponse>;
}

/// `reqwest` transport with a bounded per-call timeout
#[derive(Clone)]
pub struct ReqwestTransport {
    http_client: Client,
}

impl ReqwestTransport {
    pub fn new(timeout: Duration) -> Result<Self, MessengerError> {
        Ok(Self {
            http_client: Client::builder().timeout(timeout).build()?,
        })
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn post_json(
        &self,
        url: &str,
        access_token: &str,
        body: &Value,
    ) -> anyhow::Result<TransportResponse> {
        let response = self
            .http_client
            .post(url)
            .query(&[("access_token", access_token)])
            .json(body)
            .send()
            .await?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .map(|(name, value)| {
                (
                    name.to_string(),
                    String::from_utf8_lossy(value.as_bytes()).into_owned(),
                )
            })
            .collect();
        let body = response.text().await?;

        Ok(TransportResponse {
            status,
            headers,
            body,
        })
    }
}

// =============================================================================
// Dispatcher
// =============================================================================

/// Send API client shared by every outbound message
#[derive(Clone)]
pub struct SendDispatcher {
    access_token: String,
    endpoint: String,
    notification_type: NotificationType,
    transport: Arc<dyn Transport>,
}

impl std::fmt::Debug for SendDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SendDispatcher")
            .field("endpoint", &self.endpoint)
            .field("notification_type", &self.notification_type)
            .finish_non_exhaustive()
    }
}

impl SendDispatcher {
    /// Create a dispatcher over an explicit transport
    ///
    /// `access_token` takes precedence over the configured page access token.
    /// Fails with [`MessengerError::NoPageAccessToken`] when neither is set.
    pub fn new(
        config: &MessengerConfig,
        access_token: Option<String>,
        transport: Arc<dyn Transport>,
    ) -> Result<Self, MessengerError> {
        let access_token = access_token
            .or_else(|| config.page_access_token.clone())
            .filter(|token| !token.is_empty())
            .ok_or(MessengerError::NoPageAccessToken)?;

        Ok(Self {
            access_token,
            endpoint: config.send_api_url.clone(),
            notification_type: config.notification_type,
            transport,
        })
    }

    /// Create a dispatcher backed by `reqwest` from configuration alone
    pub fn from_config(config: &MessengerConfig) -> Result<Self, MessengerError> {
        let transport =
            ReqwestTransport::new(Duration::from_secs(config.request_timeout_secs))?;
        Self::new(config, None, Arc::new(transport))
    }

    /// Notification type applied to payloads built through this dispatcher
    pub fn notification_type(&self) -> NotificationType {
        self.notification_type
    }

    /// Send a payload, returning the parsed response on success
    pub async fn dispatch(&self, payload: &OutboundPayload) -> Option<SendResponse> {
        let body = match serde_json::to_value(payload) {
            Ok(body) => body,
            Err(e) => {
                error!("Failed to serialize outbound payload: {}", e);
                return None;
            }
        };

        debug!(
            "Sending payload to recipient {}: {}",
            payload.recipient.id, body
        );

        let response = match self
            .transport
            .post_json(&self.endpoint, &self.access_token, &body)
            .await
        {
            Ok(response) => response,
            Err(e) => {
                error!("Unable to send message: {:#}", e);
                return None;
            }
        };

        if !response.is_success() {
            error!("Unable to send message.");
            error!(
                "Send API responded with status {}, headers: {:?}",
                response.status, response.headers
            );
            error!("Send API response body: {}", response.body);
            return None;
        }

        match serde_json::from_str::<SendResponse>(&response.body) {
            Ok(result) => {
                info!(
                    "Successfully sent message with id {:?} to recipient {:?}",
                    result.message_id, result.recipient_id
                );
                Some(result)
            }
            Err(e) => {
                warn!(
                    "Send API returned status {} with an unreadable body ({}): {}",
                    response.status, e, response.body
                );
                None
            }
        }
    }
}

// =============================================================================
// Test Support
// =============================================================================


// =============================================================================
// Tests
// =============================================================================
