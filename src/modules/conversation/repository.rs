use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
    api::error,
    modules::conversation::{
        model::ParticipantRow,
        schema::{ConversationEntity, ParticipantEntity},
    },
};

#[async_trait::async_trait]
pub trait ConversationRepository {
    async fn find_by_id(
        &self,
        conversation_id: &Uuid,
    ) -> Result<Option<ConversationEntity>, error::SystemError>;

    async fn find_direct_between_users(
        &self,
        user_a: &Uuid,
        user_b: &Uuid,
    ) -> Result<Option<ConversationEntity>, error::SystemError>;

    /// Conversation row and both participant rows, all or nothing.
    /// A second direct conversation for the same pair fails with `Conflict`.
    async fn create_direct_conversation(
        &self,
        creator_id: &Uuid,
        other_id: &Uuid,
    ) -> Result<ConversationEntity, error::SystemError>;

    /// Conversation row, the creator and every member, all or nothing.
    async fn create_group_conversation(
        &self,
        name: &str,
        creator_id: &Uuid,
        member_ids: &[Uuid],
    ) -> Result<ConversationEntity, error::SystemError>;

    /// Conversations `user_id` participates in, most recently active first.
    async fn find_all_by_user(
        &self,
        user_id: &Uuid,
    ) -> Result<Vec<ConversationEntity>, error::SystemError>;

    async fn update_name(
        &self,
        conversation_id: &Uuid,
        name: &str,
    ) -> Result<Option<ConversationEntity>, error::SystemError>;

    async fn update_photo(
        &self,
        conversation_id: &Uuid,
        photo_url: &str,
    ) -> Result<Option<ConversationEntity>, error::SystemError>;
}

#[async_trait::async_trait]
pub trait ParticipantRepository {
    async fn is_participant(
        &self,
        conversation_id: &Uuid,
        user_id: &Uuid,
    ) -> Result<bool, error::SystemError>;

    /// Members with their profile, in join order.
    async fn find_participants(
        &self,
        conversation_id: &Uuid,
    ) -> Result<Vec<ParticipantRow>, error::SystemError>;

    /// Returns `None` when the conversation already holds `max_participants` members.
    async fn add_participant(
        &self,
        conversation_id: &Uuid,
        user_id: &Uuid,
        max_participants: i64,
    ) -> Result<Option<ParticipantEntity>, error::SystemError>;

    async fn remove_participant(
        &self,
        conversation_id: &Uuid,
        user_id: &Uuid,
    ) -> Result<bool, error::SystemError>;

    /// Moves the read cursor to `up_to` (now when `None`), never backwards.
    async fn mark_as_read(
        &self,
        conversation_id: &Uuid,
        user_id: &Uuid,
        up_to: Option<DateTime<Utc>>,
    ) -> Result<bool, error::SystemError>;

    /// Messages from other senders newer than the member's read cursor.
    async fn count_unread(
        &self,
        conversation_id: &Uuid,
        user_id: &Uuid,
    ) -> Result<i64, error::SystemError>;
}
