use uuid::Uuid;

use crate::{
    api::error,
    modules::reaction::{
        model::ReactionRow, repository::ReactionRepository, schema::ReactionEntity,
    },
};

#[derive(Clone)]
pub struct ReactionRepositoryPg {
    pool: sqlx::PgPool,
}

impl ReactionRepositoryPg {
    pub fn new(pool: sqlx::PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl ReactionRepository for ReactionRepositoryPg {
    async fn upsert(
        &self,
        message_id: &Uuid,
        user_id: &Uuid,
        emoticon: &str,
    ) -> Result<ReactionRow, error::SystemError> {
        let reaction = sqlx::query_as::<_, ReactionRow>(
            r#"
            WITH upserted AS (
                INSERT INTO reactions (id, message_id, user_id, emoticon)
                VALUES ($1, $2, $3, $4)
                ON CONFLICT ON CONSTRAINT uq_reactions_message_user DO UPDATE
                SET emoticon = EXCLUDED.emoticon,
                    created_at = NOW()
                RETURNING id, message_id, user_id, emoticon, created_at
            )
            SELECT r.id, r.message_id, r.user_id, u.username, r.emoticon, r.created_at
            FROM upserted r
            JOIN users u ON u.id = r.user_id
            "#,
        )
        .bind(Uuid::now_v7())
        .bind(message_id)
        .bind(user_id)
        .bind(emoticon)
        .fetch_one(&self.pool)
        .await?;

        Ok(reaction)
    }

    async fn find_by_id(
        &self,
        reaction_id: &Uuid,
    ) -> Result<Option<ReactionEntity>, error::SystemError> {
        let reaction = sqlx::query_as::<_, ReactionEntity>(
            "SELECT id, message_id, user_id, emoticon, created_at FROM reactions WHERE id = $1",
        )
        .bind(reaction_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(reaction)
    }

    async fn find_by_message_ids(
        &self,
        message_ids: &[Uuid],
    ) -> Result<Vec<ReactionRow>, error::SystemError> {
        if message_ids.is_empty() {
            return Ok(Vec::new());
        }

        let reactions = sqlx::query_as::<_, ReactionRow>(
            r#"
            SELECT r.id, r.message_id, r.user_id, u.username, r.emoticon, r.created_at
            FROM reactions r
            JOIN users u ON u.id = r.user_id
            WHERE r.message_id = ANY($1)
            ORDER BY r.created_at ASC
            "#,
        )
        .bind(message_ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(reactions)
    }

    async fn delete(&self, reaction_id: &Uuid) -> Result<bool, error::SystemError> {
        let rows = sqlx::query("DELETE FROM reactions WHERE id = $1")
            .bind(reaction_id)
            .execute(&self.pool)
            .await?
            .rows_affected();

        Ok(rows > 0)
    }
}
