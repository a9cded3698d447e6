//! LINE webhook payload types.

use serde::Deserialize;
use shared::ChatSource;

/// Webhook request body
#[derive(Debug, Deserialize)]
pub struct WebhookBody {
    #[serde(default)]
    pub events: Vec<WebhookEvent>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookEvent {
    #[serde(rename = "type")]
    pub event_type: String,
    pub reply_token: Option<String>,
    pub source: Option<EventSource>,
    pub message: Option<EventMessage>,
}

impl WebhookEvent {
    /// Text of a text-message event.
    pub fn text(&self) -> Option<&str> {
        if self.event_type != "message" {
            return None;
        }
        let message = self.message.as_ref()?;
        if message.message_type != "text" {
            return None;
        }
        message.text.as_deref()
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventSource {
    #[serde(rename = "type")]
    pub source_type: String,
    pub user_id: Option<String>,
    pub group_id: Option<String>,
    pub room_id: Option<String>,
}

impl EventSource {
    /// `None` for unknown source types, or when LINE withholds the sender.
    pub fn chat_source(&self) -> Option<ChatSource> {
        let user_id = self.user_id.clone()?;
        match self.source_type.as_str() {
            "group" => Some(ChatSource::Group {
                group_id: self.group_id.clone()?,
                user_id,
            }),
            "room" => Some(ChatSource::Room {
                room_id: self.room_id.clone()?,
                user_id,
            }),
            "user" => Some(ChatSource::User { user_id }),
            _ => None,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct EventMessage {
    #[serde(rename = "type")]
    pub message_type: String,
    pub text: Option<String>,
}
