//! Messenger webhook HTTP handlers

use axum::{
    Router,
    body::{Body, Bytes},
    extract::{Query, State},
    http::Request,
    middleware::{self, Next},
    response::Response,
    routing::get,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::bot::Bot;
use crate::config::MessengerConfig;
use crate::error::MessengerError;
use crate::types::{Entry, InboundEvent, VerifyParams, WebhookBatch};

/// Body returned for every POST
pub const ACKNOWLEDGEMENT: &str = "all good!";

/// Webhook server state
#[derive(Clone)]
pub struct WebhookState {
    pub config: Arc<MessengerConfig>,
    pub bot: Arc<Bot>,
}

/// Build the webhook router
pub fn router(state: WebhookState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/webhook", get(verify).post(handle_batch))
        .layer(middleware::from_fn(log_request))
        .with_state(state)
}

/// Run the webhook HTTP server until `shutdown` resolves
pub async fn run_server(
    addr: SocketAddr,
    state: WebhookState,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await?;

    Ok(())
}

/// Index page
async fn index() -> &'static str {
    "Hello, World!"
}

/// Middleware to log all incoming HTTP requests
async fn log_request(req: Request<Body>, next: Next) -> Response {
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    info!("🌐 HTTP {} {}", method, path);

    let response = next.run(req).await;

    info!("📤 Response status: {}", response.status());

    response
}

/// Subscription handshake (GET request)
async fn verify(
    State(state): State<WebhookState>,
    Query(params): Query<VerifyParams>,
) -> Result<String, MessengerError> {
    let verified = params.mode.as_deref() == Some("subscribe")
        && params.verify_token.as_deref() == Some(state.config.verify_token.as_str());

    let challenge = match params.challenge {
        Some(challenge) if verified => challenge,
        _ => {
            error!("Failed validation. Make sure the validation tokens match.");
            return Err(MessengerError::Verification);
        }
    };

    info!("✅ Validating webhook");
    Ok(challenge)
}

/// Event batch (POST request)
async fn handle_batch(State(state): State<WebhookState>, body: Bytes) -> &'static str {
    if state.config.debug_mode {
        debug!("Raw webhook body: {}", String::from_utf8_lossy(&body));
    }

    let handled = process_batch(&state.bot, &body).await;
    debug!("Handled {} webhook events", handled);

    ACKNOWLEDGEMENT
}

/// Dispatch every event of a page batch in order
///
/// Returns how many events were handled without error. Nothing here fails the
/// request: unreadable bodies, non-page objects, malformed entries and failing
/// events are logged and skipped.
pub async fn process_batch(bot: &Bot, body: &[u8]) -> usize {
    let batch: WebhookBatch = match serde_json::from_slice(body) {
        Ok(batch) => batch,
        Err(e) => {
            warn!("Ignoring unreadable webhook body: {}", e);
            return 0;
        }
    };

    if !batch.is_page() {
        info!("Ignoring webhook for object {:?}", batch.object);
        return 0;
    }

    info!("📥 Received webhook batch with {} entries", batch.entry.len());

    let mut handled = 0;
    for raw_entry in batch.entry {
        let entry: Entry = match serde_json::from_value(raw_entry) {
            Ok(entry) => entry,
            Err(e) => {
                warn!("Skipping malformed webhook entry: {}", e);
                continue;
            }
        };

        for raw_event in entry.messaging {
            let event: InboundEvent = match serde_json::from_value(raw_event) {
                Ok(event) => event,
                Err(e) => {
                    warn!("Skipping malformed webhook event: {}", e);
                    continue;
                }
            };

            match bot.handle_event(&event).await {
                Ok(()) => handled += 1,
                Err(e) => error!("Failed to handle webhook event: {}", e),
            }
        }
    }

    info!("no more entries...");
    handled
}
