use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;
use uuid::Uuid;
use validator::Validate;

use crate::modules::conversation::schema::ConversationType;
use crate::modules::message::model::MessageResponse;

#[derive(Debug, Deserialize)]
pub struct NewDirectConversation {
    pub user_id: Uuid,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewGroup {
    #[validate(length(min = 1, max = 50, message = "Group name must be between 1 and 50 characters"))]
    pub name: String,
    #[serde(default)]
    pub members: Vec<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct AddMemberModel {
    pub user_id: Uuid,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct GroupNameModel {
    #[validate(length(min = 1, max = 50, message = "Group name must be between 1 and 50 characters"))]
    pub name: String,
}

#[derive(Debug, Clone, FromRow)]
pub struct ParticipantRow {
    pub user_id: Uuid,
    pub username: String,
    pub photo_url: Option<String>,
    pub joined_at: chrono::DateTime<chrono::Utc>,
    pub last_read_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemberResponse {
    pub id: Uuid,
    pub username: String,
    pub photo_url: Option<String>,
    pub joined_at: chrono::DateTime<chrono::Utc>,
    pub last_read_at: chrono::DateTime<chrono::Utc>,
}

impl From<ParticipantRow> for MemberResponse {
    fn from(row: ParticipantRow) -> Self {
        MemberResponse {
            id: row.user_id,
            username: row.username,
            photo_url: row.photo_url,
            joined_at: row.joined_at,
            last_read_at: row.last_read_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessagePreview {
    pub id: Uuid,
    pub content: Option<String>,
    pub has_photo: bool,
    pub sender_id: Uuid,
    pub sender_username: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationPreview {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub _type: ConversationType,
    pub name: String,
    pub photo_url: Option<String>,
    pub other_participant: Option<MemberResponse>,
    pub last_message: Option<MessagePreview>,
    pub unread_count: i64,
    pub last_message_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationDetail {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub _type: ConversationType,
    pub name: String,
    pub photo_url: Option<String>,
    pub created_by: Uuid,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub last_message_at: chrono::DateTime<chrono::Utc>,
    pub participants: Vec<MemberResponse>,
    pub unread_count: i64,
}

/// Conversation opened by a participant: metadata plus the full chronological history.
#[derive(Debug, Serialize)]
pub struct ConversationView {
    #[serde(flatten)]
    pub conversation: ConversationDetail,
    pub messages: Vec<MessageResponse>,
}
