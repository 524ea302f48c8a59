use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ReactModel {
    #[validate(length(min = 1, max = 10, message = "Emoticon must be between 1 and 10 characters"))]
    pub emoticon: String,
}

#[derive(Debug, Clone, FromRow)]
pub struct ReactionRow {
    pub id: Uuid,
    pub message_id: Uuid,
    pub user_id: Uuid,
    pub username: String,
    pub emoticon: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReactionResponse {
    pub id: Uuid,
    pub message_id: Uuid,
    pub user_id: Uuid,
    pub username: String,
    pub emoticon: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl From<ReactionRow> for ReactionResponse {
    fn from(row: ReactionRow) -> Self {
        ReactionResponse {
            id: row.id,
            message_id: row.message_id,
            user_id: row.user_id,
            username: row.username,
            emoticon: row.emoticon,
            created_at: row.created_at,
        }
    }
}
