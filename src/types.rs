//! Wire types for the Messenger webhook and Send API

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, de::DeserializeOwned};
use serde_json::{Map, Value};

// =============================================================================
// Webhook Inbound Types (from the platform)
// =============================================================================

/// Subscription handshake parameters (GET request)
///
/// Every field is optional so that a missing parameter becomes a failed
/// handshake rather than a rejected request.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct VerifyParams {
    #[serde(rename = "hub.mode", default)]
    pub mode: Option<String>,
    #[serde(rename = "hub.verify_token", default)]
    pub verify_token: Option<String>,
    #[serde(rename = "hub.challenge", default)]
    pub challenge: Option<String>,
}

/// Webhook POST body
///
/// Entries stay as raw JSON so a malformed entry can be skipped without
/// losing the rest of the batch.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WebhookBatch {
    #[serde(default, deserialize_with = "lenient_string")]
    pub object: Option<String>,
    #[serde(default, deserialize_with = "lenient_list")]
    pub entry: Vec<Value>,
}

impl WebhookBatch {
    /// Only page subscriptions carry messaging events
    pub fn is_page(&self) -> bool {
        self.object.as_deref() == Some("page")
    }
}

/// One entry of a batch
///
/// Events stay as raw JSON so a malformed event can be skipped without
/// losing the rest of the entry.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Entry {
    #[serde(default, deserialize_with = "lenient_list")]
    pub messaging: Vec<Value>,
}

/// Sender or recipient reference
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Party {
    #[serde(default, deserialize_with = "string_or_number")]
    pub id: Option<String>,
}

/// One messaging event
///
/// Fields of the wrong type fall back to their defaults; a `message` or
/// `postback` key of the wrong shape still classifies the event.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct InboundEvent {
    #[serde(default, deserialize_with = "lenient_struct")]
    pub sender: Party,
    #[serde(default, deserialize_with = "lenient_struct")]
    pub recipient: Party,
    #[serde(default, deserialize_with = "lenient_i64")]
    pub timestamp: Option<i64>,
    #[serde(default, deserialize_with = "lenient_present")]
    pub message: Option<InboundMessage>,
    #[serde(default, deserialize_with = "lenient_present")]
    pub postback: Option<Postback>,
}

/// Classification of an inbound event
#[derive(Debug, Clone, Copy)]
pub enum EventKind<'a> {
    Message(&'a InboundMessage),
    Postback(&'a Postback),
    Unknown,
}

impl InboundEvent {
    pub fn sender_id(&self) -> Option<&str> {
        self.sender.id.as_deref()
    }

    pub fn recipient_id(&self) -> Option<&str> {
        self.recipient.id.as_deref()
    }

    /// Event time as a UTC date-time, if the timestamp is present and valid
    pub fn received_at(&self) -> Option<DateTime<Utc>> {
        self.timestamp.and_then(DateTime::from_timestamp_millis)
    }

    /// A message wins over a postback when both are present
    pub fn kind(&self) -> EventKind<'_> {
        match (&self.message, &self.postback) {
            (Some(message), _) => EventKind::Message(message),
            (None, Some(postback)) => EventKind::Postback(postback),
            (None, None) => EventKind::Unknown,
        }
    }
}

/// Message body of an inbound event
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InboundMessage {
    #[serde(
        default,
        deserialize_with = "lenient_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub mid: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub text: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient_present",
        skip_serializing_if = "Option::is_none"
    )]
    pub attachments: Option<Vec<InboundAttachment>>,
}

impl InboundMessage {
    /// Text, treating an empty string as absent
    pub fn text(&self) -> Option<&str> {
        self.text.as_deref().filter(|text| !text.is_empty())
    }

    pub fn has_attachments(&self) -> bool {
        self.attachments
            .as_ref()
            .is_some_and(|attachments| !attachments.is_empty())
    }
}

/// Attachment descriptor on an inbound message
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InboundAttachment {
    #[serde(rename = "type", default, deserialize_with = "lenient_string")]
    pub kind: Option<String>,
    #[serde(default)]
    pub payload: Value,
}

/// Button click event
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Postback {
    #[serde(default, deserialize_with = "lenient_string")]
    pub title: Option<String>,
    /// Developer-defined value set on the postback button
    #[serde(default, deserialize_with = "lenient_string")]
    pub payload: Option<String>,
}

// Inbound fields are read leniently: a value of the wrong type becomes the
// field's default instead of failing the whole event.

fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(s)) => Some(s),
        _ => None,
    })
}

fn lenient_i64<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Value>::deserialize(deserializer)?.and_then(|value| value.as_i64()))
}

fn lenient_list<'de, D>(deserializer: D) -> Result<Vec<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Array(items)) => items,
        _ => Vec::new(),
    })
}

fn lenient_struct<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    Ok(Option::<Value>::deserialize(deserializer)?
        .and_then(|value| serde_json::from_value(value).ok())
        .unwrap_or_default())
}

/// Null means absent; any other value means present, parsed or defaulted
fn lenient_present<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    Ok(Option::<Value>::deserialize(deserializer)?
        .map(|value| serde_json::from_value(value).unwrap_or_default()))
}

// =============================================================================
// Send API Outbound Types (to the platform)
// =============================================================================

/// Push notification behaviour for the recipient
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationType {
    #[default]
    Regular,
    SilentPush,
    NoPush,
}

impl NotificationType {
    /// Parse a lowercase setting name; unknown names fall back to `Regular`
    pub fn from_setting(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "silent_push" => Self::SilentPush,
            "no_push" => Self::NoPush,
            _ => Self::Regular,
        }
    }
}

/// Recipient of an outbound payload
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Recipient {
    pub id: String,
}

/// Typing and seen indicators
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SenderAction {
    MarkSeen,
    TypingOn,
    TypingOff,
}

impl SenderAction {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::MarkSeen => "mark_seen",
            Self::TypingOn => "typing_on",
            Self::TypingOff => "typing_off",
        }
    }
}

/// Attachment type tag
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AttachmentType {
    Image,
    Video,
    Audio,
    File,
    Template,
}

/// Attachment payload: a reusable upload id or an inline object
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum AttachmentSource {
    Reusable { attachment_id: String },
    Inline(Value),
}

impl AttachmentSource {
    /// An empty id, or anything inline but a non-empty object, carries
    /// nothing to send
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Reusable { attachment_id } => attachment_id.is_empty(),
            Self::Inline(value) => value.as_object().is_none_or(Map::is_empty),
        }
    }
}

impl From<&str> for AttachmentSource {
    fn from(id: &str) -> Self {
        Self::Reusable {
            attachment_id: id.to_string(),
        }
    }
}

impl From<String> for AttachmentSource {
    fn from(attachment_id: String) -> Self {
        Self::Reusable { attachment_id }
    }
}

impl From<Value> for AttachmentSource {
    fn from(value: Value) -> Self {
        match value {
            Value::String(attachment_id) => Self::Reusable { attachment_id },
            other => Self::Inline(other),
        }
    }
}

/// Outbound attachment
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Attachment {
    #[serde(rename = "type")]
    pub kind: AttachmentType,
    pub payload: AttachmentSource,
}

/// Message content: text or attachment, never both
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum MessageBody {
    Text(String),
    Attachment(Attachment),
}

/// What an outbound payload carries: a message or a sender action
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum OutboundContent {
    Message(MessageBody),
    SenderAction(SenderAction),
}

/// Body of a Send API call
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct OutboundPayload {
    pub recipient: Recipient,
    pub notification_type: NotificationType,
    #[serde(flatten)]
    pub content: OutboundContent,
}

impl OutboundPayload {
    pub fn message(recipient_id: &str, notification_type: NotificationType, body: MessageBody) -> Self {
        Self {
            recipient: Recipient {
                id: recipient_id.to_string(),
            },
            notification_type,
            content: OutboundContent::Message(body),
        }
    }

    pub fn sender_action(
        recipient_id: &str,
        notification_type: NotificationType,
        action: SenderAction,
    ) -> Self {
        Self {
            recipient: Recipient {
                id: recipient_id.to_string(),
            },
            notification_type,
            content: OutboundContent::SenderAction(action),
        }
    }
}

/// Successful Send API response
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SendResponse {
    #[serde(default)]
    pub recipient_id: Option<String>,
    #[serde(default)]
    pub message_id: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}
