//! Sender-action tracker
//!
//! Holds the typing/seen indicator for one recipient. Switching an indicator
//! on sends it immediately.

use tracing::debug;

use crate::send_api::SendDispatcher;
use crate::types::{OutboundPayload, SendResponse, SenderAction};

/// Current indicator; at most one is active
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SenderActionState {
    #[default]
    None,
    MarkSeen,
    TypingOn,
    TypingOff,
}

impl From<SenderAction> for SenderActionState {
    fn from(action: SenderAction) -> Self {
        match action {
            SenderAction::MarkSeen => Self::MarkSeen,
            SenderAction::TypingOn => Self::TypingOn,
            SenderAction::TypingOff => Self::TypingOff,
        }
    }
}

/// Sender actions for a single recipient
#[derive(Debug)]
pub struct SenderActions<'a> {
    dispatcher: &'a SendDispatcher,
    recipient_id: String,
    state: SenderActionState,
}

impl<'a> SenderActions<'a> {
    pub fn new(dispatcher: &'a SendDispatcher, recipient_id: impl Into<String>) -> Self {
        Self {
            dispatcher,
            recipient_id: recipient_id.into(),
            state: SenderActionState::None,
        }
    }

    pub fn state(&self) -> SenderActionState {
        self.state
    }

    pub fn mark_seen(&self) -> bool {
        self.state == SenderActionState::MarkSeen
    }

    pub fn typing_on(&self) -> bool {
        self.state == SenderActionState::TypingOn
    }

    pub fn typing_off(&self) -> bool {
        self.state == SenderActionState::TypingOff
    }

    pub async fn set_mark_seen(&mut self, value: bool) -> Option<SendResponse> {
        self.set(SenderAction::MarkSeen, value).await
    }

    pub async fn set_typing_on(&mut self, value: bool) -> Option<SendResponse> {
        self.set(SenderAction::TypingOn, value).await
    }

    pub async fn set_typing_off(&mut self, value: bool) -> Option<SendResponse> {
        self.set(SenderAction::TypingOff, value).await
    }

    /// Switch `action` on (sending it) or off (sending nothing)
    ///
    /// Switching an action on clears the other two; switching it off only
    /// clears that action.
    pub async fn set(&mut self, action: SenderAction, value: bool) -> Option<SendResponse> {
        let target = SenderActionState::from(action);
        if !value {
            if self.state == target {
                self.state = SenderActionState::None;
            }
            return None;
        }

        self.state = target;
        debug!(
            "Sender action {} for recipient {}",
            action.as_str(),
            self.recipient_id
        );
        let payload = OutboundPayload::sender_action(
            &self.recipient_id,
            self.dispatcher.notification_type(),
            action,
        );
        self.dispatcher.dispatch(&payload).await
    }
}
