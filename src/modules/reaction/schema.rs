use sqlx::prelude::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, FromRow)]
pub struct ReactionEntity {
    pub id: Uuid,
    pub message_id: Uuid,
    pub user_id: Uuid,
    pub emoticon: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
}
