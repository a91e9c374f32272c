//! Error types

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

/// Errors raised by the webhook and the outbound message model.
#[derive(Debug, Error)]
pub enum MessengerError {
    /// Subscription handshake did not match mode or verify token.
    #[error("Failed validation. Make sure the validation tokens match.")]
    Verification,

    /// A message was created without the content it requires.
    #[error("No content has been set for this message")]
    NoContent,

    /// A send was attempted before any recipient was set.
    #[error("No recipient set for this message, set one before trying to send a message")]
    NoRecipient,

    /// Text and attachment were both set, or neither was.
    #[error("Content conflict: {0}")]
    ContentConflict(&'static str),

    /// No page access token was provided to make API calls.
    #[error("No access token provided to make API calls")]
    NoPageAccessToken,

    /// The outbound HTTP client could not be built.
    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),
}

impl IntoResponse for MessengerError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::Verification => StatusCode::FORBIDDEN,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, self.to_string()).into_response()
    }
}
