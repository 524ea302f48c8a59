use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;
use uuid::Uuid;
use validator::Validate;

use crate::modules::reaction::model::ReactionResponse;

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct SendTextModel {
    #[validate(length(
        min = 1,
        max = 1000,
        message = "Message content must be between 1 and 1000 characters"
    ))]
    pub content: String,
    pub reply_to_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct ForwardMessageModel {
    pub conversation_id: Uuid,
}

/// Body of a message about to be sent: exactly one of `content` or `photo_url`.
#[derive(Debug, Clone, Default)]
pub struct NewMessage {
    pub content: Option<String>,
    pub photo_url: Option<String>,
    pub reply_to_id: Option<Uuid>,
}

impl NewMessage {
    pub fn text(content: impl Into<String>) -> Self {
        NewMessage { content: Some(content.into()), ..Default::default() }
    }

    pub fn photo(photo_url: impl Into<String>) -> Self {
        NewMessage { photo_url: Some(photo_url.into()), ..Default::default() }
    }

    pub fn reply_to(mut self, message_id: Uuid) -> Self {
        self.reply_to_id = Some(message_id);
        self
    }
}

pub struct InsertMessage {
    pub conversation_id: Uuid,
    pub sender_id: Uuid,
    pub content: Option<String>,
    pub photo_url: Option<String>,
    pub reply_to_id: Option<Uuid>,
    pub forwarded: bool,
}

#[derive(Debug, Clone, FromRow)]
pub struct MessageRow {
    pub id: Uuid,
    pub conversation_id: Uuid,
    pub sender_id: Uuid,
    pub sender_username: String,
    pub content: Option<String>,
    pub photo_url: Option<String>,
    pub reply_to_id: Option<Uuid>,
    pub forwarded: bool,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    pub id: Uuid,
    pub conversation_id: Uuid,
    pub sender_id: Uuid,
    pub sender_username: String,
    pub content: Option<String>,
    pub photo_url: Option<String>,
    pub reply_to_id: Option<Uuid>,
    pub forwarded: bool,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub reactions: Vec<ReactionResponse>,
}

impl MessageResponse {
    pub fn from_row(row: MessageRow, reactions: Vec<ReactionResponse>) -> Self {
        MessageResponse {
            id: row.id,
            conversation_id: row.conversation_id,
            sender_id: row.sender_id,
            sender_username: row.sender_username,
            content: row.content,
            photo_url: row.photo_url,
            reply_to_id: row.reply_to_id,
            forwarded: row.forwarded,
            created_at: row.created_at,
            reactions,
        }
    }
}
