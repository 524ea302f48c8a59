use log::info;
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use crate::api::error;
use crate::modules::access::service::AccessPolicy;
use crate::modules::message::repository::MessageRepository;
use crate::modules::reaction::model::{ReactModel, ReactionResponse};
use crate::modules::reaction::repository::ReactionRepository;

#[derive(Clone)]
pub struct ReactionService {
    reaction_repo: Arc<dyn ReactionRepository + Send + Sync>,
    message_repo: Arc<dyn MessageRepository + Send + Sync>,
    policy: AccessPolicy,
}

impl ReactionService {
    pub fn with_dependencies(
        reaction_repo: Arc<dyn ReactionRepository + Send + Sync>,
        message_repo: Arc<dyn MessageRepository + Send + Sync>,
        policy: AccessPolicy,
    ) -> Self {
        info!("ReactionService initialized with dependencies");
        ReactionService { reaction_repo, message_repo, policy }
    }

    /// At most one reaction per user and message: reacting again replaces
    /// the emoticon and keeps the reaction id.
    pub async fn react(
        &self,
        message_id: Uuid,
        user_id: Uuid,
        emoticon: String,
    ) -> Result<ReactionResponse, error::SystemError> {
        let model = ReactModel { emoticon };
        model.validate()?;

        let message = self
            .message_repo
            .find_by_id(&message_id)
            .await?
            .ok_or_else(|| error::SystemError::not_found("Message not found"))?;

        self.policy.require_participant(&message.conversation_id, &user_id).await?;

        let reaction = self.reaction_repo.upsert(&message_id, &user_id, &model.emoticon).await?;
        info!("User {} reacted {} to message {}", user_id, reaction.emoticon, message_id);
        Ok(reaction.into())
    }

    /// Existence is checked before ownership so a stranger's reaction reports
    /// `Forbidden` and a missing one `NotFound`.
    pub async fn unreact(
        &self,
        message_id: Uuid,
        reaction_id: Uuid,
        user_id: Uuid,
    ) -> Result<(), error::SystemError> {
        let reaction = self
            .reaction_repo
            .find_by_id(&reaction_id)
            .await?
            .filter(|r| r.message_id == message_id)
            .ok_or_else(|| error::SystemError::not_found("Reaction not found"))?;

        self.policy.require_reaction_owner(&reaction.id, &user_id).await?;

        if !self.reaction_repo.delete(&reaction.id).await? {
            return Err(error::SystemError::not_found("Reaction not found"));
        }

        info!("Reaction {} removed by {}", reaction_id, user_id);
        Ok(())
    }
}
