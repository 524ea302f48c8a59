use std::sync::Arc;
use uuid::Uuid;

use crate::api::error;
use crate::modules::conversation::repository::ParticipantRepository;
use crate::modules::message::repository::MessageRepository;
use crate::modules::reaction::repository::ReactionRepository;

/// Membership and ownership gates shared by the conversation, message and
/// reaction services. Every check reads the store.
#[derive(Clone)]
pub struct AccessPolicy {
    participant_repo: Arc<dyn ParticipantRepository + Send + Sync>,
    message_repo: Arc<dyn MessageRepository + Send + Sync>,
    reaction_repo: Arc<dyn ReactionRepository + Send + Sync>,
}

impl AccessPolicy {
    pub fn with_dependencies(
        participant_repo: Arc<dyn ParticipantRepository + Send + Sync>,
        message_repo: Arc<dyn MessageRepository + Send + Sync>,
        reaction_repo: Arc<dyn ReactionRepository + Send + Sync>,
    ) -> Self {
        AccessPolicy { participant_repo, message_repo, reaction_repo }
    }

    pub async fn is_participant(
        &self,
        conversation_id: &Uuid,
        user_id: &Uuid,
    ) -> Result<bool, error::SystemError> {
        self.participant_repo.is_participant(conversation_id, user_id).await
    }

    pub async fn is_sender(
        &self,
        message_id: &Uuid,
        user_id: &Uuid,
    ) -> Result<bool, error::SystemError> {
        let message = self.message_repo.find_by_id(message_id).await?;
        Ok(message.is_some_and(|m| m.sender_id == *user_id))
    }

    pub async fn is_reaction_owner(
        &self,
        reaction_id: &Uuid,
        user_id: &Uuid,
    ) -> Result<bool, error::SystemError> {
        let reaction = self.reaction_repo.find_by_id(reaction_id).await?;
        Ok(reaction.is_some_and(|r| r.user_id == *user_id))
    }

    /// Non-members get `Forbidden` whether or not the conversation exists.
    pub async fn require_participant(
        &self,
        conversation_id: &Uuid,
        user_id: &Uuid,
    ) -> Result<(), error::SystemError> {
        if !self.is_participant(conversation_id, user_id).await? {
            return Err(error::SystemError::forbidden(
                "You are not a participant of this conversation",
            ));
        }
        Ok(())
    }

    pub async fn require_sender(
        &self,
        message_id: &Uuid,
        user_id: &Uuid,
    ) -> Result<(), error::SystemError> {
        if !self.is_sender(message_id, user_id).await? {
            return Err(error::SystemError::forbidden("Only the sender can delete this message"));
        }
        Ok(())
    }

    pub async fn require_reaction_owner(
        &self,
        reaction_id: &Uuid,
        user_id: &Uuid,
    ) -> Result<(), error::SystemError> {
        if !self.is_reaction_owner(reaction_id, user_id).await? {
            return Err(error::SystemError::forbidden("You can only remove your own reaction"));
        }
        Ok(())
    }
}
