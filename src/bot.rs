//! Reply logic for inbound messaging events

use std::sync::Arc;
use tracing::{info, warn};

use crate::error::MessengerError;
use crate::message::{Button, GenericElement, Message};
use crate::send_api::SendDispatcher;
use crate::sender_action::SenderActions;
use crate::types::{EventKind, InboundEvent, InboundMessage, Postback};

/// Reply to any text without a keyword match
pub const FALLBACK_REPLY: &str = "Message received";
/// Reply to a message that only carries attachments
pub const ATTACHMENT_REPLY: &str = "Message with attachment received";
/// Reply to a postback
pub const POSTBACK_REPLY: &str = "Postback called";

/// How to answer an inbound text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyStrategy {
    /// Generic template showcase
    GenericTemplate,
    /// Fixed text reply ([`FALLBACK_REPLY`])
    FixedText,
}

/// Exact-match keywords; anything else gets [`ReplyStrategy::FixedText`]
const KEYWORD_REPLIES: &[(&str, ReplyStrategy)] = &[("generic", ReplyStrategy::GenericTemplate)];

impl ReplyStrategy {
    pub fn for_text(text: &str) -> Self {
        KEYWORD_REPLIES
            .iter()
            .find(|(keyword, _)| *keyword == text)
            .map(|(_, strategy)| *strategy)
            .unwrap_or(Self::FixedText)
    }

    fn build(self) -> Result<Message, MessengerError> {
        match self {
            Self::GenericTemplate => Message::generic_template(showcase_elements()),
            Self::FixedText => Message::text(FALLBACK_REPLY),
        }
    }
}

fn showcase_elements() -> Vec<GenericElement> {
    vec![
        GenericElement {
            title: "rift".to_string(),
            subtitle: Some("Next-generation virtual reality".to_string()),
            item_url: Some("https://www.oculus.com/en-us/rift/".to_string()),
            image_url: Some("http://messengerdemo.parseapp.com/img/rift.png".to_string()),
            buttons: vec![
                Button::web_url("https://www.oculus.com/en-us/rift/", "Open Web URL"),
                Button::postback("Call Postback", "Payload for first bubble"),
            ],
        },
        GenericElement {
            title: "touch".to_string(),
            subtitle: Some("Your Hands, Now in VR".to_string()),
            item_url: Some("https://www.oculus.com/en-us/touch/".to_string()),
            image_url: Some("http://messengerdemo.parseapp.com/img/touch.png".to_string()),
            buttons: vec![
                Button::web_url("https://www.oculus.com/en-us/touch/", "Open Web URL"),
                Button::postback("Call Postback", "Payload for second bubble"),
            ],
        },
    ]
}

/// Routes events to the message and postback handlers
pub struct Bot {
    dispatcher: Arc<SendDispatcher>,
    send_typing_indicators: bool,
}

impl Bot {
    pub fn new(dispatcher: Arc<SendDispatcher>, send_typing_indicators: bool) -> Self {
        Self {
            dispatcher,
            send_typing_indicators,
        }
    }

    /// Handle one event; unknown kinds are logged and skipped
    pub async fn handle_event(&self, event: &InboundEvent) -> Result<(), MessengerError> {
        match event.kind() {
            EventKind::Message(message) => self.received_message(event, message).await,
            EventKind::Postback(postback) => self.received_postback(event, postback).await,
            EventKind::Unknown => {
                warn!("Webhook received unknown event: {:?}", event);
                Ok(())
            }
        }
    }

    async fn received_message(
        &self,
        event: &InboundEvent,
        message: &InboundMessage,
    ) -> Result<(), MessengerError> {
        let sender_id = event.sender_id();
        info!(
            "Received message for user {:?} and page {:?} at {:?}",
            sender_id,
            event.recipient_id(),
            event.received_at()
        );

        let mut reply = if let Some(text) = message.text() {
            let strategy = ReplyStrategy::for_text(text);
            info!("Replying to text with {:?}", strategy);
            strategy.build()?
        } else if message.has_attachments() {
            Message::text(ATTACHMENT_REPLY)?
        } else {
            info!("Message has neither text nor attachments, skipping");
            return Ok(());
        };

        if self.send_typing_indicators
            && let Some(sender_id) = sender_id
        {
            let mut actions = SenderActions::new(&self.dispatcher, sender_id);
            actions.set_mark_seen(true).await;
            actions.set_typing_on(true).await;
        }

        reply.send(&self.dispatcher, sender_id).await?;
        Ok(())
    }

    async fn received_postback(
        &self,
        event: &InboundEvent,
        postback: &Postback,
    ) -> Result<(), MessengerError> {
        let sender_id = event.sender_id();
        info!(
            "Received postback for user {:?} and page {:?} with payload {:?} at {:?}",
            sender_id,
            event.recipient_id(),
            postback.payload,
            event.received_at()
        );

        let mut reply = Message::text(POSTBACK_REPLY)?;
        reply.send(&self.dispatcher, sender_id).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::send_api::testing::{RecordingTransport, dispatcher};
    use serde_json::json;

    fn event(value: serde_json::Value) -> InboundEvent {
        serde_json::from_value(value).unwrap()
    }

    fn bot(transport: Arc<RecordingTransport>, typing: bool) -> Bot {
        Bot::new(Arc::new(dispatcher(transport)), typing)
    }

    #[test]
    fn test_keyword_table() {
        assert_eq!(ReplyStrategy::for_text("generic"), ReplyStrategy::GenericTemplate);
        assert_eq!(ReplyStrategy::for_text("Generic"), ReplyStrategy::FixedText);
        assert_eq!(ReplyStrategy::for_text("hello"), ReplyStrategy::FixedText);
    }

    #[tokio::test]
    async fn test_generic_keyword_sends_template() {
        let transport = RecordingTransport::ok();
        let bot = bot(transport.clone(), false);

        bot.handle_event(&event(json!({
            "sender": {"id": "7"},
            "message": {"text": "generic"}
        })))
        .await
        .unwrap();

        let bodies = transport.bodies();
        assert_eq!(bodies.len(), 1);
        assert_eq!(bodies[0]["recipient"]["id"], "7");
        let payload = &bodies[0]["message"]["attachment"]["payload"];
        assert_eq!(payload["template_type"], "generic");
        assert_eq!(payload["elements"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_other_text_gets_fixed_reply() {
        let transport = RecordingTransport::ok();
        let bot = bot(transport.clone(), false);

        bot.handle_event(&event(json!({
            "sender": {"id": "7"},
            "message": {"text": "what's up"}
        })))
        .await
        .unwrap();

        let bodies = transport.bodies();
        assert_eq!(bodies.len(), 1);
        assert_eq!(bodies[0]["message"], json!({"text": FALLBACK_REPLY}));
    }

    #[tokio::test]
    async fn test_typing_indicators_precede_reply() {
        let transport = RecordingTransport::ok();
        let bot = bot(transport.clone(), true);

        bot.handle_event(&event(json!({
            "sender": {"id": "7"},
            "message": {"attachments": [{"type": "image", "payload": {"url": "https://x/y.png"}}]}
        })))
        .await
        .unwrap();

        let bodies = transport.bodies();
        assert_eq!(bodies.len(), 3);
        assert_eq!(bodies[0]["sender_action"], "mark_seen");
        assert_eq!(bodies[1]["sender_action"], "typing_on");
        assert_eq!(bodies[2]["message"], json!({"text": ATTACHMENT_REPLY}));
    }

    #[tokio::test]
    async fn test_empty_message_is_skipped() {
        let transport = RecordingTransport::ok();
        let bot = bot(transport.clone(), true);

        bot.handle_event(&event(json!({"sender": {"id": "7"}, "message": {}})))
            .await
            .unwrap();
        assert!(transport.bodies().is_empty());
    }

    #[tokio::test]
    async fn test_postback_without_payload_is_confirmed() {
        let transport = RecordingTransport::ok();
        let bot = bot(transport.clone(), false);

        bot.handle_event(&event(json!({"sender": {"id": "7"}, "postback": {}})))
            .await
            .unwrap();

        let bodies = transport.bodies();
        assert_eq!(bodies.len(), 1);
        assert_eq!(bodies[0]["message"], json!({"text": POSTBACK_REPLY}));
    }

    #[tokio::test]
    async fn test_missing_sender_is_reported() {
        let transport = RecordingTransport::ok();
        let bot = bot(transport.clone(), false);

        let result = bot
            .handle_event(&event(json!({"message": {"text": "hi"}})))
            .await;
        assert!(matches!(result, Err(MessengerError::NoRecipient)));
        assert!(transport.bodies().is_empty());
    }
}
