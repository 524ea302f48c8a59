use uuid::Uuid;

use crate::{
    api::error,
    modules::message::{
        model::{InsertMessage, MessageRow},
        repository::MessageRepository,
        schema::MessageEntity,
    },
};

const MESSAGE_ROW_SELECT: &str = r#"
    SELECT
        m.id,
        m.conversation_id,
        m.sender_id,
        u.username AS sender_username,
        m.content,
        m.photo_url,
        m.reply_to_id,
        m.forwarded,
        m.created_at
    FROM messages m
    JOIN users u ON u.id = m.sender_id
"#;

#[derive(Clone)]
pub struct MessageRepositoryPg {
    pool: sqlx::PgPool,
}

impl MessageRepositoryPg {
    pub fn new(pool: sqlx::PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl MessageRepository for MessageRepositoryPg {
    async fn create(&self, message: &InsertMessage) -> Result<MessageEntity, error::SystemError> {
        let mut tx = self.pool.begin().await?;

        let entity = sqlx::query_as::<_, MessageEntity>(
            r#"
            INSERT INTO messages
                (id, conversation_id, sender_id, content, photo_url, reply_to_id, forwarded)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING
                id, conversation_id, sender_id, content, photo_url, reply_to_id, forwarded, created_at
            "#,
        )
        .bind(Uuid::now_v7())
        .bind(message.conversation_id)
        .bind(message.sender_id)
        .bind(&message.content)
        .bind(&message.photo_url)
        .bind(message.reply_to_id)
        .bind(message.forwarded)
        .fetch_one(tx.as_mut())
        .await?;

        sqlx::query(
            r#"
            UPDATE conversations
            SET last_message_at = GREATEST(last_message_at, $2)
            WHERE id = $1
            "#,
        )
        .bind(entity.conversation_id)
        .bind(entity.created_at)
        .execute(tx.as_mut())
        .await?;

        tx.commit().await?;
        Ok(entity)
    }

    async fn find_by_id(
        &self,
        message_id: &Uuid,
    ) -> Result<Option<MessageEntity>, error::SystemError> {
        let message = sqlx::query_as::<_, MessageEntity>(
            r#"
            SELECT id, conversation_id, sender_id, content, photo_url, reply_to_id, forwarded, created_at
            FROM messages
            WHERE id = $1
            "#,
        )
        .bind(message_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(message)
    }

    async fn find_detail_by_id(
        &self,
        message_id: &Uuid,
    ) -> Result<Option<MessageRow>, error::SystemError> {
        let message =
            sqlx::query_as::<_, MessageRow>(&format!("{MESSAGE_ROW_SELECT} WHERE m.id = $1"))
                .bind(message_id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(message)
    }

    async fn find_by_conversation(
        &self,
        conversation_id: &Uuid,
    ) -> Result<Vec<MessageRow>, error::SystemError> {
        let messages = sqlx::query_as::<_, MessageRow>(&format!(
            "{MESSAGE_ROW_SELECT} WHERE m.conversation_id = $1 ORDER BY m.created_at ASC, m.seq ASC"
        ))
        .bind(conversation_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(messages)
    }

    async fn find_last_by_conversation(
        &self,
        conversation_id: &Uuid,
    ) -> Result<Option<MessageRow>, error::SystemError> {
        let message = sqlx::query_as::<_, MessageRow>(&format!(
            "{MESSAGE_ROW_SELECT} WHERE m.conversation_id = $1 ORDER BY m.created_at DESC, m.seq DESC LIMIT 1"
        ))
        .bind(conversation_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(message)
    }

    async fn delete(&self, message_id: &Uuid) -> Result<bool, error::SystemError> {
        let mut tx = self.pool.begin().await?;

        // blocks reactions and replies that reference the row until the cascade commits
        let locked = sqlx::query("SELECT id FROM messages WHERE id = $1 FOR UPDATE")
            .bind(message_id)
            .fetch_optional(tx.as_mut())
            .await?;
        if locked.is_none() {
            return Ok(false);
        }

        sqlx::query("DELETE FROM reactions WHERE message_id = $1")
            .bind(message_id)
            .execute(tx.as_mut())
            .await?;

        sqlx::query("UPDATE messages SET reply_to_id = NULL WHERE reply_to_id = $1")
            .bind(message_id)
            .execute(tx.as_mut())
            .await?;

        let rows = sqlx::query("DELETE FROM messages WHERE id = $1")
            .bind(message_id)
            .execute(tx.as_mut())
            .await?
            .rows_affected();

        tx.commit().await?;
        Ok(rows > 0)
    }
}
