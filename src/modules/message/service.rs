use log::info;
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

use crate::api::error;
use crate::modules::access::service::AccessPolicy;
use crate::modules::message::model::{InsertMessage, MessageResponse, MessageRow, NewMessage};
use crate::modules::message::repository::MessageRepository;
use crate::modules::message::schema::MessageEntity;
use crate::modules::reaction::model::ReactionResponse;
use crate::modules::reaction::repository::ReactionRepository;

const MAX_CONTENT_CHARS: usize = 1000;

#[derive(Clone)]
pub struct MessageService {
    message_repo: Arc<dyn MessageRepository + Send + Sync>,
    reaction_repo: Arc<dyn ReactionRepository + Send + Sync>,
    policy: AccessPolicy,
}

impl MessageService {
    pub fn with_dependencies(
        message_repo: Arc<dyn MessageRepository + Send + Sync>,
        reaction_repo: Arc<dyn ReactionRepository + Send + Sync>,
        policy: AccessPolicy,
    ) -> Self {
        info!("MessageService initialized with dependencies");
        MessageService { message_repo, reaction_repo, policy }
    }

    fn validate_body(message: &NewMessage) -> Result<(), error::SystemError> {
        match (&message.content, &message.photo_url) {
            (Some(_), Some(_)) => Err(error::SystemError::bad_request(
                "A message carries either text content or a photo, not both",
            )),
            (None, None) => {
                Err(error::SystemError::bad_request("A message needs text content or a photo"))
            }
            (Some(content), None) => {
                let len = content.chars().count();
                if len == 0 || len > MAX_CONTENT_CHARS {
                    return Err(error::SystemError::bad_request(
                        "Message content must be between 1 and 1000 characters",
                    ));
                }
                Ok(())
            }
            (None, Some(photo_url)) if photo_url.trim().is_empty() => {
                Err(error::SystemError::bad_request("Photo URL must not be empty"))
            }
            (None, Some(_)) => Ok(()),
        }
    }

    pub async fn get(&self, message_id: Uuid) -> Result<MessageEntity, error::SystemError> {
        self.message_repo
            .find_by_id(&message_id)
            .await?
            .ok_or_else(|| error::SystemError::not_found("Message not found"))
    }

    async fn load_response(&self, message_id: &Uuid) -> Result<MessageResponse, error::SystemError> {
        let row = self
            .message_repo
            .find_detail_by_id(message_id)
            .await?
            .ok_or_else(|| error::SystemError::not_found("Message not found"))?;
        let mut responses = self.attach_reactions(vec![row]).await?;
        responses.pop().ok_or_else(|| error::SystemError::internal("Message row lost"))
    }

    async fn attach_reactions(
        &self,
        rows: Vec<MessageRow>,
    ) -> Result<Vec<MessageResponse>, error::SystemError> {
        let ids: Vec<Uuid> = rows.iter().map(|r| r.id).collect();
        let reactions = self.reaction_repo.find_by_message_ids(&ids).await?;

        let mut by_message: HashMap<Uuid, Vec<ReactionResponse>> = HashMap::new();
        for reaction in reactions {
            by_message.entry(reaction.message_id).or_default().push(reaction.into());
        }

        Ok(rows
            .into_iter()
            .map(|row| {
                let reactions = by_message.remove(&row.id).unwrap_or_default();
                MessageResponse::from_row(row, reactions)
            })
            .collect())
    }

    /// Sends a text or photo message.
    ///
    /// Flow:
    /// 1. Exactly one of content or photo must be set
    /// 2. Sender must be a participant
    /// 3. A reply target must exist in the same conversation
    /// 4. Insert and bump `last_message_at` atomically
    pub async fn send(
        &self,
        conversation_id: Uuid,
        sender_id: Uuid,
        message: NewMessage,
    ) -> Result<MessageResponse, error::SystemError> {
        Self::validate_body(&message)?;
        self.policy.require_participant(&conversation_id, &sender_id).await?;

        if let Some(reply_to_id) = message.reply_to_id {
            let target = self
                .message_repo
                .find_by_id(&reply_to_id)
                .await?
                .ok_or_else(|| error::SystemError::not_found("Replied message not found"))?;
            if target.conversation_id != conversation_id {
                return Err(error::SystemError::bad_request(
                    "Cannot reply to a message from another conversation",
                ));
            }
        }

        let entity = self
            .message_repo
            .create(&InsertMessage {
                conversation_id,
                sender_id,
                content: message.content,
                photo_url: message.photo_url,
                reply_to_id: message.reply_to_id,
                forwarded: false,
            })
            .await?;

        info!("Message {} sent to conversation {}", entity.id, conversation_id);
        self.load_response(&entity.id).await
    }

    /// Copies the message body into `target_conversation_id` as a new message
    /// owned by the forwarder. The original is left untouched.
    pub async fn forward(
        &self,
        message_id: Uuid,
        target_conversation_id: Uuid,
        forwarder_id: Uuid,
    ) -> Result<MessageResponse, error::SystemError> {
        let source = self.get(message_id).await?;

        self.policy.require_participant(&source.conversation_id, &forwarder_id).await?;
        self.policy.require_participant(&target_conversation_id, &forwarder_id).await?;

        let entity = self
            .message_repo
            .create(&InsertMessage {
                conversation_id: target_conversation_id,
                sender_id: forwarder_id,
                content: source.content,
                photo_url: source.photo_url,
                reply_to_id: None,
                forwarded: true,
            })
            .await?;

        info!(
            "Message {} forwarded to conversation {} as {}",
            message_id, target_conversation_id, entity.id
        );
        self.load_response(&entity.id).await
    }

    pub async fn delete(&self, message_id: Uuid, user_id: Uuid) -> Result<(), error::SystemError> {
        self.get(message_id).await?;
        self.policy.require_sender(&message_id, &user_id).await?;

        if !self.message_repo.delete(&message_id).await? {
            return Err(error::SystemError::not_found("Message not found"));
        }

        info!("Message {} deleted by {}", message_id, user_id);
        Ok(())
    }

    /// Chronological history with each message's current reactions.
    pub async fn get_conversation_messages(
        &self,
        conversation_id: Uuid,
        user_id: Uuid,
    ) -> Result<Vec<MessageResponse>, error::SystemError> {
        self.policy.require_participant(&conversation_id, &user_id).await?;
        let rows = self.message_repo.find_by_conversation(&conversation_id).await?;
        self.attach_reactions(rows).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test::{fixture, services, MemoryStore};

    #[tokio::test]
    async fn exactly_one_of_content_or_photo() {
        let svc = services(MemoryStore::new());
        let (alice, bob) = fixture::pair(&svc).await;
        let (c, _) = svc.conversations.get_or_create_direct(alice.id, bob.id).await.unwrap();

        let both = NewMessage {
            content: Some("hi".into()),
            photo_url: Some("/uploads/messages/a.png".into()),
            reply_to_id: None,
        };
        let neither = NewMessage::default();
        for body in [both, neither, NewMessage::text(""), NewMessage::text("x".repeat(1001))] {
            let err = svc.messages.send(c.id, alice.id, body).await.unwrap_err();
            assert!(matches!(err, error::SystemError::BadRequest(_)));
        }

        let text = svc.messages.send(c.id, alice.id, NewMessage::text("x".repeat(1000))).await;
        assert!(text.is_ok());
        let photo =
            svc.messages.send(c.id, bob.id, NewMessage::photo("/uploads/messages/a.png")).await;
        assert_eq!(photo.unwrap().photo_url.as_deref(), Some("/uploads/messages/a.png"));
    }

    #[tokio::test]
    async fn send_requires_participation() {
        let svc = services(MemoryStore::new());
        let (alice, bob) = fixture::pair(&svc).await;
        let carol = fixture::user(&svc, "carol").await;
        let (c, _) = svc.conversations.get_or_create_direct(alice.id, bob.id).await.unwrap();

        let err = svc.messages.send(c.id, carol.id, NewMessage::text("hey")).await.unwrap_err();
        assert!(matches!(err, error::SystemError::Forbidden(_)));
        assert!(svc.messages.get_conversation_messages(c.id, alice.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn send_bumps_last_message_at() {
        let svc = services(MemoryStore::new());
        let (alice, bob) = fixture::pair(&svc).await;
        let (c, _) = svc.conversations.get_or_create_direct(alice.id, bob.id).await.unwrap();

        let sent = svc.messages.send(c.id, alice.id, NewMessage::text("hi")).await.unwrap();
        let after = svc.conversations.get_conversation(c.id, alice.id).await.unwrap();

        assert!(after.last_message_at > c.last_message_at);
        assert_eq!(after.last_message_at, sent.created_at);
    }

    #[tokio::test]
    async fn replies_must_stay_in_conversation() {
        let svc = services(MemoryStore::new());
        let (alice, bob) = fixture::pair(&svc).await;
        let carol = fixture::user(&svc, "carol").await;
        let (ab, _) = svc.conversations.get_or_create_direct(alice.id, bob.id).await.unwrap();
        let (ac, _) = svc.conversations.get_or_create_direct(alice.id, carol.id).await.unwrap();

        let original = svc.messages.send(ab.id, bob.id, NewMessage::text("q?")).await.unwrap();

        let reply = svc
            .messages
            .send(ab.id, alice.id, NewMessage::text("a!").reply_to(original.id))
            .await
            .unwrap();
        assert_eq!(reply.reply_to_id, Some(original.id));

        let cross = svc
            .messages
            .send(ac.id, alice.id, NewMessage::text("a!").reply_to(original.id))
            .await
            .unwrap_err();
        assert!(matches!(cross, error::SystemError::BadRequest(_)));

        let missing = svc
            .messages
            .send(ab.id, alice.id, NewMessage::text("a!").reply_to(Uuid::now_v7()))
            .await
            .unwrap_err();
        assert!(matches!(missing, error::SystemError::NotFound(_)));
    }

    #[tokio::test]
    async fn forward_copies_into_target() {
        let svc = services(MemoryStore::new());
        let (alice, bob) = fixture::pair(&svc).await;
        let carol = fixture::user(&svc, "carol").await;
        let (ab, _) = svc.conversations.get_or_create_direct(alice.id, bob.id).await.unwrap();
        let (bc, _) = svc.conversations.get_or_create_direct(bob.id, carol.id).await.unwrap();

        let first = svc.messages.send(ab.id, alice.id, NewMessage::text("first")).await.unwrap();
        let original = svc
            .messages
            .send(ab.id, alice.id, NewMessage::text("news").reply_to(first.id))
            .await
            .unwrap();

        let copy = svc.messages.forward(original.id, bc.id, bob.id).await.unwrap();
        assert_ne!(copy.id, original.id);
        assert_eq!(copy.conversation_id, bc.id);
        assert_eq!(copy.sender_id, bob.id);
        assert_eq!(copy.content.as_deref(), Some("news"));
        assert!(copy.forwarded);
        assert_eq!(copy.reply_to_id, None);

        let untouched = svc.messages.get(original.id).await.unwrap();
        assert_eq!(untouched.conversation_id, ab.id);
        assert!(!untouched.forwarded);

        // alice is not part of bob and carol's conversation
        let err = svc.messages.forward(original.id, bc.id, alice.id).await.unwrap_err();
        assert!(matches!(err, error::SystemError::Forbidden(_)));
        // carol cannot see the source
        let err = svc.messages.forward(original.id, bc.id, carol.id).await.unwrap_err();
        assert!(matches!(err, error::SystemError::Forbidden(_)));
        let err = svc.messages.forward(Uuid::now_v7(), bc.id, bob.id).await.unwrap_err();
        assert!(matches!(err, error::SystemError::NotFound(_)));
    }

    #[tokio::test]
    async fn delete_detaches_replies_and_drops_reactions() {
        let svc = services(MemoryStore::new());
        let (alice, bob) = fixture::pair(&svc).await;
        let (c, _) = svc.conversations.get_or_create_direct(alice.id, bob.id).await.unwrap();

        let m1 = svc.messages.send(c.id, alice.id, NewMessage::text("hi")).await.unwrap();
        let m2 =
            svc.messages.send(c.id, bob.id, NewMessage::text("yo").reply_to(m1.id)).await.unwrap();
        svc.reactions.react(m1.id, bob.id, "👍".into()).await.unwrap();

        let err = svc.messages.delete(m1.id, bob.id).await.unwrap_err();
        assert!(matches!(err, error::SystemError::Forbidden(_)));

        svc.messages.delete(m1.id, alice.id).await.unwrap();

        let history = svc.messages.get_conversation_messages(c.id, bob.id).await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].id, m2.id);
        assert_eq!(history[0].reply_to_id, None);

        let err = svc.messages.delete(m1.id, alice.id).await.unwrap_err();
        assert!(matches!(err, error::SystemError::NotFound(_)));
    }

    #[tokio::test]
    async fn history_is_chronological_with_reactions() {
        let svc = services(MemoryStore::new());
        let (alice, bob) = fixture::pair(&svc).await;
        let (c, _) = svc.conversations.get_or_create_direct(alice.id, bob.id).await.unwrap();

        let mut sent = Vec::new();
        for i in 0..5 {
            let sender = if i % 2 == 0 { alice.id } else { bob.id };
            sent.push(
                svc.messages.send(c.id, sender, NewMessage::text(format!("m{i}"))).await.unwrap(),
            );
        }
        svc.reactions.react(sent[2].id, alice.id, "😂".into()).await.unwrap();

        let history = svc.messages.get_conversation_messages(c.id, alice.id).await.unwrap();
        let ids: Vec<_> = history.iter().map(|m| m.id).collect();
        assert_eq!(ids, sent.iter().map(|m| m.id).collect::<Vec<_>>());
        assert!(history.windows(2).all(|w| w[0].created_at <= w[1].created_at));
        assert_eq!(history[2].reactions.len(), 1);
        assert_eq!(history[2].reactions[0].username, "alice");
        assert!(history[0].reactions.is_empty());
    }
}
