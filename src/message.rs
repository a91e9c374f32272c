//! Outbound message model
//!
//! A [`Message`] holds either text or a single attachment for one recipient.
//! Content is checked when the message is created and again when it is sent:
//!
//! ```no_run
//! # async fn demo(dispatcher: &messenger_webhook::SendDispatcher) -> Result<(), messenger_webhook::MessengerError> {
//! use messenger_webhook::Message;
//!
//! let mut message = Message::text("Hello world")?;
//! message.send(dispatcher, Some("1254459154682919")).await?;
//! # Ok(())
//! # }
//! ```

use serde::Serialize;
use serde_json::{Value, json};
use tracing::debug;

use crate::error::MessengerError;
use crate::send_api::SendDispatcher;
use crate::types::{
    Attachment, AttachmentSource, AttachmentType, MessageBody, NotificationType, OutboundPayload,
    SendResponse,
};

// =============================================================================
// Templates
// =============================================================================

/// Button shown on a template
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Button {
    WebUrl { url: String, title: String },
    Postback { title: String, payload: String },
}

impl Button {
    pub fn web_url(url: impl Into<String>, title: impl Into<String>) -> Self {
        Self::WebUrl {
            url: url.into(),
            title: title.into(),
        }
    }

    pub fn postback(title: impl Into<String>, payload: impl Into<String>) -> Self {
        Self::Postback {
            title: title.into(),
            payload: payload.into(),
        }
    }
}

/// One bubble of a generic template
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct GenericElement {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub item_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub buttons: Vec<Button>,
}

/// Structured template payloads
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(tag = "template_type", rename_all = "snake_case")]
pub enum Template {
    Generic { elements: Vec<GenericElement> },
    Button { text: String, buttons: Vec<Button> },
}

impl Template {
    fn is_empty(&self) -> bool {
        match self {
            Self::Generic { elements } => elements.is_empty(),
            Self::Button { text, buttons } => text.is_empty() || buttons.is_empty(),
        }
    }
}

impl From<Template> for Value {
    fn from(template: Template) -> Self {
        json!(template)
    }
}

// =============================================================================
// Message
// =============================================================================

/// Outbound message awaiting a send
#[derive(Debug, Clone, Default)]
pub struct Message {
    text: Option<String>,
    attachment: Option<Attachment>,
    recipient: Option<String>,
    notification_type: Option<NotificationType>,
    response: Option<SendResponse>,
}

impl Message {
    /// Text message; empty text is rejected
    pub fn text(text: impl Into<String>) -> Result<Self, MessengerError> {
        let text = text.into();
        if text.is_empty() {
            return Err(MessengerError::NoContent);
        }
        Ok(Self {
            text: Some(text),
            ..Self::default()
        })
    }

    /// Attachment message of the given type
    ///
    /// A plain string is a reusable attachment id; a JSON object is sent inline.
    pub fn attachment(
        kind: AttachmentType,
        payload: impl Into<AttachmentSource>,
    ) -> Result<Self, MessengerError> {
        let payload = payload.into();
        if payload.is_empty() {
            return Err(MessengerError::NoContent);
        }
        Ok(Self {
            attachment: Some(Attachment { kind, payload }),
            ..Self::default()
        })
    }

    pub fn image(payload: impl Into<AttachmentSource>) -> Result<Self, MessengerError> {
        Self::attachment(AttachmentType::Image, payload)
    }

    pub fn video(payload: impl Into<AttachmentSource>) -> Result<Self, MessengerError> {
        Self::attachment(AttachmentType::Video, payload)
    }

    pub fn audio(payload: impl Into<AttachmentSource>) -> Result<Self, MessengerError> {
        Self::attachment(AttachmentType::Audio, payload)
    }

    pub fn file(payload: impl Into<AttachmentSource>) -> Result<Self, MessengerError> {
        Self::attachment(AttachmentType::File, payload)
    }

    /// Template attachment; a template with no elements or buttons is rejected
    pub fn template(template: Template) -> Result<Self, MessengerError> {
        if template.is_empty() {
            return Err(MessengerError::NoContent);
        }
        Self::attachment(AttachmentType::Template, AttachmentSource::Inline(template.into()))
    }

    pub fn button_template(
        text: impl Into<String>,
        buttons: Vec<Button>,
    ) -> Result<Self, MessengerError> {
        Self::template(Template::Button {
            text: text.into(),
            buttons,
        })
    }

    pub fn generic_template(elements: Vec<GenericElement>) -> Result<Self, MessengerError> {
        Self::template(Template::Generic { elements })
    }

    pub fn recipient(&self) -> Option<&str> {
        self.recipient.as_deref()
    }

    pub fn set_recipient(&mut self, recipient_id: impl Into<String>) -> &mut Self {
        self.recipient = Some(recipient_id.into());
        self
    }

    pub fn set_text(&mut self, text: impl Into<String>) -> &mut Self {
        self.text = Some(text.into());
        self
    }

    pub fn set_attachment(&mut self, attachment: Attachment) -> &mut Self {
        self.attachment = Some(attachment);
        self
    }

    /// Override the dispatcher's notification type for this message
    pub fn set_notification_type(&mut self, notification_type: NotificationType) -> &mut Self {
        self.notification_type = Some(notification_type);
        self
    }

    /// Response from the most recent successful send
    pub fn response(&self) -> Option<&SendResponse> {
        self.response.as_ref()
    }

    /// Resolve the content into exactly one of text or attachment
    pub fn body(&self) -> Result<MessageBody, MessengerError> {
        match (&self.text, &self.attachment) {
            (Some(text), None) => Ok(MessageBody::Text(text.clone())),
            (None, Some(attachment)) => Ok(MessageBody::Attachment(attachment.clone())),
            (Some(_), Some(_)) => Err(MessengerError::ContentConflict(
                "text and attachment are mutually exclusive, please specify only one",
            )),
            (None, None) => Err(MessengerError::ContentConflict(
                "please specify either text or an attachment in the message",
            )),
        }
    }

    /// Send the message, optionally replacing its recipient first
    ///
    /// Delivery failures are not errors; check [`Message::response`] to see
    /// whether the platform accepted the message.
    pub async fn send(
        &mut self,
        dispatcher: &SendDispatcher,
        recipient: Option<&str>,
    ) -> Result<&mut Self, MessengerError> {
        if let Some(recipient_id) = recipient {
            self.set_recipient(recipient_id);
        }

        let recipient_id = self
            .recipient
            .as_deref()
            .filter(|id| !id.is_empty())
            .ok_or(MessengerError::NoRecipient)?;
        let body = self.body()?;
        let notification_type = self
            .notification_type
            .unwrap_or_else(|| dispatcher.notification_type());
        let payload = OutboundPayload::message(recipient_id, notification_type, body);

        debug!("Sending message to recipient {}", recipient_id);
        self.response = dispatcher.dispatch(&payload).await;
        Ok(self)
    }
}
