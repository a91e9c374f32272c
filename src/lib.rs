//! Messenger Webhook Library
//!
//! Receives Messenger Platform webhooks and answers through the Send API.
//!
//! # Architecture
//!
//! ```text
//! Messenger ──HTTPS──▶ /webhook (this) ──▶ Bot ──▶ Message ──▶ SendDispatcher ──HTTPS──▶ Send API
//! ```
//!
//! # Usage
//!
//! ```bash
//! export VERIFY_TOKEN=your_verify_token
//! export PAGE_ACCESS_TOKEN=your_page_access_token
//! export WEBHOOK_ADDR=0.0.0.0:5000          # optional
//! export NOTIFICATION_TYPE=silent_push      # optional
//!
//! messenger-webhook
//! ```

pub mod bot;
pub mod config;
pub mod error;
pub mod message;
pub mod send_api;
pub mod sender_action;
pub mod types;
pub mod webhook;

pub use bot::{Bot, ReplyStrategy};
pub use config::MessengerConfig;
pub use error::MessengerError;
pub use message::{Button, GenericElement, Message, Template};
pub use send_api::{ReqwestTransport, SendDispatcher, Transport, TransportResponse};
pub use sender_action::{SenderActionState, SenderActions};
pub use types::*;
pub use webhook::WebhookState;
