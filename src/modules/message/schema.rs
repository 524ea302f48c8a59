use sqlx::prelude::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, FromRow)]
pub struct MessageEntity {
    pub id: Uuid,
    pub conversation_id: Uuid,
    pub sender_id: Uuid,
    pub content: Option<String>,
    pub photo_url: Option<String>,
    pub reply_to_id: Option<Uuid>,
    pub forwarded: bool,
    pub created_at: chrono::DateTime<chrono::Utc>,
}
