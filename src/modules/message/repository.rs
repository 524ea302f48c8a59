use uuid::Uuid;

use crate::{
    api::error,
    modules::message::{
        model::{InsertMessage, MessageRow},
        schema::MessageEntity,
    },
};

#[async_trait::async_trait]
pub trait MessageRepository {
    /// Inserts the message and bumps the conversation's `last_message_at` together.
    async fn create(&self, message: &InsertMessage) -> Result<MessageEntity, error::SystemError>;

    async fn find_by_id(&self, message_id: &Uuid)
        -> Result<Option<MessageEntity>, error::SystemError>;

    async fn find_detail_by_id(
        &self,
        message_id: &Uuid,
    ) -> Result<Option<MessageRow>, error::SystemError>;

    /// Oldest first, insertion order breaking timestamp ties.
    async fn find_by_conversation(
        &self,
        conversation_id: &Uuid,
    ) -> Result<Vec<MessageRow>, error::SystemError>;

    async fn find_last_by_conversation(
        &self,
        conversation_id: &Uuid,
    ) -> Result<Option<MessageRow>, error::SystemError>;

    /// Removes the message with its reactions and detaches replies pointing at it.
    async fn delete(&self, message_id: &Uuid) -> Result<bool, error::SystemError>;
}
