use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::modules::conversation::model::ParticipantRow;
use crate::modules::conversation::repository::{ConversationRepository, ParticipantRepository};
use crate::modules::conversation::schema::{ConversationType, ParticipantEntity};
use crate::{api::error, modules::conversation::schema::ConversationEntity};

const CONVERSATION_COLUMNS: &str =
    "c.id, c.type, c.name, c.photo_url, c.created_by, c.created_at, c.last_message_at";

/// Stored order of an unordered user pair.
fn ordered_pair(user_a: &Uuid, user_b: &Uuid) -> (Uuid, Uuid) {
    if user_a < user_b {
        (*user_a, *user_b)
    } else {
        (*user_b, *user_a)
    }
}

#[derive(Clone)]
pub struct ConversationPgRepository {
    pool: sqlx::PgPool,
}

impl ConversationPgRepository {
    pub fn new(pool: sqlx::PgPool) -> Self {
        Self { pool }
    }

    async fn insert_participants(
        conversation_id: &Uuid,
        user_ids: &[Uuid],
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    ) -> Result<(), error::SystemError> {
        sqlx::query(
            r#"
            INSERT INTO participants (conversation_id, user_id)
            SELECT $1, unnest($2::uuid[])
            "#,
        )
        .bind(conversation_id)
        .bind(user_ids)
        .execute(tx.as_mut())
        .await?;

        Ok(())
    }
}

#[async_trait::async_trait]
impl ConversationRepository for ConversationPgRepository {
    async fn find_by_id(
        &self,
        conversation_id: &Uuid,
    ) -> Result<Option<ConversationEntity>, error::SystemError> {
        let conversation = sqlx::query_as::<_, ConversationEntity>(&format!(
            "SELECT {CONVERSATION_COLUMNS} FROM conversations c WHERE c.id = $1"
        ))
        .bind(conversation_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(conversation)
    }

    async fn find_direct_between_users(
        &self,
        user_a: &Uuid,
        user_b: &Uuid,
    ) -> Result<Option<ConversationEntity>, error::SystemError> {
        let (low, high) = ordered_pair(user_a, user_b);
        let conversation = sqlx::query_as::<_, ConversationEntity>(&format!(
            r#"
            SELECT {CONVERSATION_COLUMNS}
            FROM conversations c
            WHERE c.type = 'direct'
            AND c.direct_user_low = $1
            AND c.direct_user_high = $2
            "#
        ))
        .bind(low)
        .bind(high)
        .fetch_optional(&self.pool)
        .await?;

        Ok(conversation)
    }

    async fn create_direct_conversation(
        &self,
        creator_id: &Uuid,
        other_id: &Uuid,
    ) -> Result<ConversationEntity, error::SystemError> {
        let (low, high) = ordered_pair(creator_id, other_id);
        let mut tx = self.pool.begin().await?;

        let conversation = sqlx::query_as::<_, ConversationEntity>(
            r#"
            INSERT INTO conversations (id, type, created_by, direct_user_low, direct_user_high)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, type, name, photo_url, created_by, created_at, last_message_at
            "#,
        )
        .bind(Uuid::now_v7())
        .bind(ConversationType::Direct)
        .bind(creator_id)
        .bind(low)
        .bind(high)
        .fetch_one(tx.as_mut())
        .await?;

        Self::insert_participants(&conversation.id, &[*creator_id, *other_id], &mut tx).await?;

        tx.commit().await?;
        Ok(conversation)
    }

    async fn create_group_conversation(
        &self,
        name: &str,
        creator_id: &Uuid,
        member_ids: &[Uuid],
    ) -> Result<ConversationEntity, error::SystemError> {
        let mut tx = self.pool.begin().await?;

        let conversation = sqlx::query_as::<_, ConversationEntity>(
            r#"
            INSERT INTO conversations (id, type, name, created_by)
            VALUES ($1, $2, $3, $4)
            RETURNING id, type, name, photo_url, created_by, created_at, last_message_at
            "#,
        )
        .bind(Uuid::now_v7())
        .bind(ConversationType::Group)
        .bind(name)
        .bind(creator_id)
        .fetch_one(tx.as_mut())
        .await?;

        let mut user_ids = Vec::with_capacity(member_ids.len() + 1);
        user_ids.push(*creator_id);
        user_ids.extend_from_slice(member_ids);
        Self::insert_participants(&conversation.id, &user_ids, &mut tx).await?;

        tx.commit().await?;
        Ok(conversation)
    }

    async fn find_all_by_user(
        &self,
        user_id: &Uuid,
    ) -> Result<Vec<ConversationEntity>, error::SystemError> {
        let conversations = sqlx::query_as::<_, ConversationEntity>(&format!(
            r#"
            SELECT {CONVERSATION_COLUMNS}
            FROM conversations c
            JOIN participants p
                ON p.conversation_id = c.id
            AND p.user_id = $1
            ORDER BY c.last_message_at DESC, c.id DESC
            "#
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(conversations)
    }

    async fn update_name(
        &self,
        conversation_id: &Uuid,
        name: &str,
    ) -> Result<Option<ConversationEntity>, error::SystemError> {
        let conversation = sqlx::query_as::<_, ConversationEntity>(
            r#"
            UPDATE conversations
            SET name = $2
            WHERE id = $1 AND type = 'group'
            RETURNING id, type, name, photo_url, created_by, created_at, last_message_at
            "#,
        )
        .bind(conversation_id)
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;

        Ok(conversation)
    }

    async fn update_photo(
        &self,
        conversation_id: &Uuid,
        photo_url: &str,
    ) -> Result<Option<ConversationEntity>, error::SystemError> {
        let conversation = sqlx::query_as::<_, ConversationEntity>(
            r#"
            UPDATE conversations
            SET photo_url = $2
            WHERE id = $1 AND type = 'group'
            RETURNING id, type, name, photo_url, created_by, created_at, last_message_at
            "#,
        )
        .bind(conversation_id)
        .bind(photo_url)
        .fetch_optional(&self.pool)
        .await?;

        Ok(conversation)
    }
}

#[derive(Clone)]
pub struct ParticipantPgRepository {
    pool: sqlx::PgPool,
}

impl ParticipantPgRepository {
    pub fn new(pool: sqlx::PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl ParticipantRepository for ParticipantPgRepository {
    async fn is_participant(
        &self,
        conversation_id: &Uuid,
        user_id: &Uuid,
    ) -> Result<bool, error::SystemError> {
        let exists = sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM participants
                WHERE conversation_id = $1 AND user_id = $2
            )
            "#,
        )
        .bind(conversation_id)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    async fn find_participants(
        &self,
        conversation_id: &Uuid,
    ) -> Result<Vec<ParticipantRow>, error::SystemError> {
        let participants = sqlx::query_as::<_, ParticipantRow>(
            r#"
            SELECT
                p.user_id,
                u.username,
                u.photo_url,
                p.joined_at,
                p.last_read_at
            FROM participants p
            JOIN users u ON u.id = p.user_id
            WHERE p.conversation_id = $1
            ORDER BY p.joined_at, u.username
            "#,
        )
        .bind(conversation_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(participants)
    }

    async fn add_participant(
        &self,
        conversation_id: &Uuid,
        user_id: &Uuid,
        max_participants: i64,
    ) -> Result<Option<ParticipantEntity>, error::SystemError> {
        let mut tx = self.pool.begin().await?;

        // serialises concurrent joins so the cap cannot be overshot
        sqlx::query("SELECT id FROM conversations WHERE id = $1 FOR UPDATE")
            .bind(conversation_id)
            .fetch_optional(tx.as_mut())
            .await?
            .ok_or_else(|| error::SystemError::not_found("Conversation not found"))?;

        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM participants WHERE conversation_id = $1",
        )
        .bind(conversation_id)
        .fetch_one(tx.as_mut())
        .await?;

        if count >= max_participants {
            return Ok(None);
        }

        let participant = sqlx::query_as::<_, ParticipantEntity>(
            r#"
            INSERT INTO participants (conversation_id, user_id)
            VALUES ($1, $2)
            RETURNING conversation_id, user_id, joined_at, last_read_at
            "#,
        )
        .bind(conversation_id)
        .bind(user_id)
        .fetch_one(tx.as_mut())
        .await?;

        tx.commit().await?;
        Ok(Some(participant))
    }

    async fn remove_participant(
        &self,
        conversation_id: &Uuid,
        user_id: &Uuid,
    ) -> Result<bool, error::SystemError> {
        let rows =
            sqlx::query("DELETE FROM participants WHERE conversation_id = $1 AND user_id = $2")
                .bind(conversation_id)
                .bind(user_id)
                .execute(&self.pool)
                .await?
                .rows_affected();

        Ok(rows > 0)
    }

    async fn mark_as_read(
        &self,
        conversation_id: &Uuid,
        user_id: &Uuid,
        up_to: Option<DateTime<Utc>>,
    ) -> Result<bool, error::SystemError> {
        let rows = sqlx::query(
            r#"
            UPDATE participants
            SET last_read_at = GREATEST(last_read_at, COALESCE($3, NOW()))
            WHERE conversation_id = $1 AND user_id = $2
            "#,
        )
        .bind(conversation_id)
        .bind(user_id)
        .bind(up_to)
        .execute(&self.pool)
        .await?
        .rows_affected();

        Ok(rows > 0)
    }

    async fn count_unread(
        &self,
        conversation_id: &Uuid,
        user_id: &Uuid,
    ) -> Result<i64, error::SystemError> {
        let count = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*)
            FROM messages m
            JOIN participants p
                ON p.conversation_id = m.conversation_id
            AND p.user_id = $2
            WHERE m.conversation_id = $1
            AND m.sender_id <> $2
            AND m.created_at > p.last_read_at
            "#,
        )
        .bind(conversation_id)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }
}
