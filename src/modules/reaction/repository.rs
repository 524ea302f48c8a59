use uuid::Uuid;

use crate::{
    api::error,
    modules::reaction::{model::ReactionRow, schema::ReactionEntity},
};

#[async_trait::async_trait]
pub trait ReactionRepository {
    /// Inserts the reaction, or replaces emoticon and timestamp of the user's
    /// existing one on that message while keeping its id.
    async fn upsert(
        &self,
        message_id: &Uuid,
        user_id: &Uuid,
        emoticon: &str,
    ) -> Result<ReactionRow, error::SystemError>;

    async fn find_by_id(
        &self,
        reaction_id: &Uuid,
    ) -> Result<Option<ReactionEntity>, error::SystemError>;

    /// Reactions of every listed message, oldest first.
    async fn find_by_message_ids(
        &self,
        message_ids: &[Uuid],
    ) -> Result<Vec<ReactionRow>, error::SystemError>;

    async fn delete(&self, reaction_id: &Uuid) -> Result<bool, error::SystemError>;
}
