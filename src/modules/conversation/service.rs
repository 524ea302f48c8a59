use chrono::{DateTime, Utc};
use futures_util::future::try_join_all;
use log::info;
use std::collections::HashSet;
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use crate::api::error;
use crate::constants::{MAX_GROUP_PARTICIPANTS, PREVIEW_MAX_CHARS};
use crate::modules::access::service::AccessPolicy;
use crate::modules::conversation::model::{
    ConversationDetail, ConversationPreview, GroupNameModel, MemberResponse, MessagePreview,
    NewGroup, ParticipantRow,
};
use crate::modules::conversation::repository::{ConversationRepository, ParticipantRepository};
use crate::modules::conversation::schema::ConversationEntity;
use crate::modules::message::repository::MessageRepository;
use crate::modules::user::repository::UserRepository;
use crate::utils::truncate_chars;

#[derive(Clone)]
pub struct ConversationService {
    conversation_repo: Arc<dyn ConversationRepository + Send + Sync>,
    participant_repo: Arc<dyn ParticipantRepository + Send + Sync>,
    message_repo: Arc<dyn MessageRepository + Send + Sync>,
    user_repo: Arc<dyn UserRepository + Send + Sync>,
    policy: AccessPolicy,
}

/// Name and photo as seen by `viewer`: groups use their own, direct
/// conversations borrow the other participant's.
fn display_identity(
    conversation: &ConversationEntity,
    participants: &[ParticipantRow],
    viewer: &Uuid,
) -> (String, Option<String>, Option<MemberResponse>) {
    if conversation.is_group() {
        let name = conversation.name.clone().unwrap_or_default();
        return (name, conversation.photo_url.clone(), None);
    }

    let other =
        participants.iter().find(|p| p.user_id != *viewer).cloned().map(MemberResponse::from);
    let name = other.as_ref().map(|o| o.username.clone()).unwrap_or_default();
    let photo_url = conversation
        .photo_url
        .clone()
        .or_else(|| other.as_ref().and_then(|o| o.photo_url.clone()));
    (name, photo_url, other)
}

impl ConversationService {
    pub fn with_dependencies(
        conversation_repo: Arc<dyn ConversationRepository + Send + Sync>,
        participant_repo: Arc<dyn ParticipantRepository + Send + Sync>,
        message_repo: Arc<dyn MessageRepository + Send + Sync>,
        user_repo: Arc<dyn UserRepository + Send + Sync>,
        policy: AccessPolicy,
    ) -> Self {
        info!("ConversationService initialized with dependencies");
        ConversationService { conversation_repo, participant_repo, message_repo, user_repo, policy }
    }

    async fn find_conversation(
        &self,
        conversation_id: &Uuid,
    ) -> Result<ConversationEntity, error::SystemError> {
        self.conversation_repo
            .find_by_id(conversation_id)
            .await?
            .ok_or_else(|| error::SystemError::not_found("Conversation not found"))
    }

    /// Conversation the caller belongs to, required to be a group.
    async fn find_member_group(
        &self,
        group_id: &Uuid,
        user_id: &Uuid,
    ) -> Result<ConversationEntity, error::SystemError> {
        self.policy.require_participant(group_id, user_id).await?;

        let conversation = self.find_conversation(group_id).await?;
        if !conversation.is_group() {
            return Err(error::SystemError::bad_request("Conversation is not a group"));
        }
        Ok(conversation)
    }

    async fn assemble_detail(
        &self,
        conversation: ConversationEntity,
        viewer: &Uuid,
    ) -> Result<ConversationDetail, error::SystemError> {
        let (participants, unread_count) = tokio::try_join!(
            self.participant_repo.find_participants(&conversation.id),
            self.participant_repo.count_unread(&conversation.id, viewer),
        )?;

        let (name, photo_url, _) = display_identity(&conversation, &participants, viewer);

        Ok(ConversationDetail {
            id: conversation.id,
            _type: conversation._type,
            name,
            photo_url,
            created_by: conversation.created_by,
            created_at: conversation.created_at,
            last_message_at: conversation.last_message_at,
            participants: participants.into_iter().map(MemberResponse::from).collect(),
            unread_count,
        })
    }

    /// Builds one list entry: display identity, last message and unread count.
    async fn assemble_preview(
        &self,
        conversation: ConversationEntity,
        viewer: &Uuid,
    ) -> Result<ConversationPreview, error::SystemError> {
        let (participants, last_message, unread_count) = tokio::try_join!(
            self.participant_repo.find_participants(&conversation.id),
            self.message_repo.find_last_by_conversation(&conversation.id),
            self.participant_repo.count_unread(&conversation.id, viewer),
        )?;

        let (name, photo_url, other_participant) =
            display_identity(&conversation, &participants, viewer);

        let last_message = last_message.map(|m| MessagePreview {
            id: m.id,
            content: m.content.map(|c| truncate_chars(&c, PREVIEW_MAX_CHARS)),
            has_photo: m.photo_url.is_some(),
            sender_id: m.sender_id,
            sender_username: m.sender_username,
            created_at: m.created_at,
        });

        Ok(ConversationPreview {
            id: conversation.id,
            _type: conversation._type,
            name,
            photo_url,
            other_participant,
            last_message,
            unread_count,
            last_message_at: conversation.last_message_at,
        })
    }

    /// Returns the direct conversation of the pair and whether this call created it.
    ///
    /// Flow:
    /// 1. Reject self-conversations and unknown users
    /// 2. Reuse the pair's conversation when it exists
    /// 3. Otherwise create it; losing a creation race falls back to reading the winner
    pub async fn get_or_create_direct(
        &self,
        user_id: Uuid,
        other_user_id: Uuid,
    ) -> Result<(ConversationDetail, bool), error::SystemError> {
        if user_id == other_user_id {
            return Err(error::SystemError::bad_request("Cannot start a conversation with yourself"));
        }

        self.user_repo
            .find_by_id(&other_user_id)
            .await?
            .ok_or_else(|| error::SystemError::not_found("User not found"))?;

        if let Some(existing) =
            self.conversation_repo.find_direct_between_users(&user_id, &other_user_id).await?
        {
            return Ok((self.assemble_detail(existing, &user_id).await?, false));
        }

        let (conversation, created) =
            match self.conversation_repo.create_direct_conversation(&user_id, &other_user_id).await
            {
                Ok(conversation) => {
                    info!("Direct conversation {} created by {}", conversation.id, user_id);
                    (conversation, true)
                }
                Err(error::SystemError::Conflict(_)) => {
                    let winner = self
                        .conversation_repo
                        .find_direct_between_users(&user_id, &other_user_id)
                        .await?
                        .ok_or_else(|| {
                            error::SystemError::internal("Direct conversation vanished after conflict")
                        })?;
                    (winner, false)
                }
                Err(e) => return Err(e),
            };

        Ok((self.assemble_detail(conversation, &user_id).await?, created))
    }

    pub async fn create_group(
        &self,
        creator_id: Uuid,
        group: NewGroup,
    ) -> Result<ConversationDetail, error::SystemError> {
        group.validate()?;

        let name = group.name.trim();
        if name.is_empty() {
            return Err(error::SystemError::bad_request("Group name is required"));
        }

        let mut seen = HashSet::new();
        let members: Vec<Uuid> = group.members.into_iter().filter(|id| seen.insert(*id)).collect();

        if members.contains(&creator_id) {
            return Err(error::SystemError::bad_request(
                "The creator is added automatically and must not be listed as a member",
            ));
        }
        if members.is_empty() {
            return Err(error::SystemError::bad_request("A group needs at least one other member"));
        }
        if members.len() + 1 > MAX_GROUP_PARTICIPANTS {
            return Err(error::SystemError::bad_request(format!(
                "A group cannot have more than {MAX_GROUP_PARTICIPANTS} participants"
            )));
        }

        let found = self.user_repo.find_by_ids(&members).await?;
        if found.len() != members.len() {
            return Err(error::SystemError::not_found("One or more members do not exist"));
        }

        let conversation =
            self.conversation_repo.create_group_conversation(name, &creator_id, &members).await?;
        info!(
            "Group {} created by {} with {} members",
            conversation.id,
            creator_id,
            members.len() + 1
        );

        self.assemble_detail(conversation, &creator_id).await
    }

    pub async fn get_conversation(
        &self,
        conversation_id: Uuid,
        user_id: Uuid,
    ) -> Result<ConversationDetail, error::SystemError> {
        self.policy.require_participant(&conversation_id, &user_id).await?;
        let conversation = self.find_conversation(&conversation_id).await?;
        self.assemble_detail(conversation, &user_id).await
    }

    pub async fn list_for_user(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<ConversationPreview>, error::SystemError> {
        let conversations = self.conversation_repo.find_all_by_user(&user_id).await?;

        let mut previews =
            try_join_all(conversations.into_iter().map(|c| self.assemble_preview(c, &user_id)))
                .await?;

        // stable: keeps the store's tiebreak for equal timestamps
        previews.sort_by(|a, b| b.last_message_at.cmp(&a.last_message_at));
        Ok(previews)
    }

    pub async fn mark_as_read(
        &self,
        conversation_id: Uuid,
        user_id: Uuid,
    ) -> Result<(), error::SystemError> {
        self.policy.require_participant(&conversation_id, &user_id).await?;
        self.participant_repo.mark_as_read(&conversation_id, &user_id, None).await?;
        Ok(())
    }

    /// Marks read only what the member was shown: messages created after
    /// `seen_until` stay unread.
    pub async fn mark_read_through(
        &self,
        conversation_id: Uuid,
        user_id: Uuid,
        seen_until: DateTime<Utc>,
    ) -> Result<(), error::SystemError> {
        self.policy.require_participant(&conversation_id, &user_id).await?;
        self.participant_repo.mark_as_read(&conversation_id, &user_id, Some(seen_until)).await?;
        Ok(())
    }

    pub async fn add_member(
        &self,
        group_id: Uuid,
        actor_id: Uuid,
        target_id: Uuid,
    ) -> Result<ConversationDetail, error::SystemError> {
        let group = self.find_member_group(&group_id, &actor_id).await?;

        self.user_repo
            .find_by_id(&target_id)
            .await?
            .ok_or_else(|| error::SystemError::not_found("User not found"))?;

        if self.participant_repo.is_participant(&group_id, &target_id).await? {
            return Err(error::SystemError::conflict_msg("User is already a member of this group"));
        }

        self.participant_repo
            .add_participant(&group_id, &target_id, MAX_GROUP_PARTICIPANTS as i64)
            .await?
            .ok_or_else(|| {
                error::SystemError::conflict_msg(&format!(
                    "Group already has {MAX_GROUP_PARTICIPANTS} participants"
                ))
            })?;

        info!("User {} added to group {} by {}", target_id, group_id, actor_id);
        self.assemble_detail(group, &actor_id).await
    }

    /// Self-leave when `actor_id == target_id`, otherwise creator-only removal.
    pub async fn remove_member(
        &self,
        group_id: Uuid,
        actor_id: Uuid,
        target_id: Uuid,
    ) -> Result<(), error::SystemError> {
        let group = self.find_member_group(&group_id, &actor_id).await?;

        if actor_id != target_id && group.created_by != actor_id {
            return Err(error::SystemError::forbidden(
                "Only the group creator can remove other members",
            ));
        }

        if !self.participant_repo.remove_participant(&group_id, &target_id).await? {
            return Err(error::SystemError::not_found("User is not a member of this group"));
        }

        if actor_id == target_id {
            info!("User {} left group {}", actor_id, group_id);
        } else {
            info!("User {} removed from group {} by {}", target_id, group_id, actor_id);
        }
        Ok(())
    }

    pub async fn update_group_name(
        &self,
        group_id: Uuid,
        user_id: Uuid,
        model: GroupNameModel,
    ) -> Result<ConversationDetail, error::SystemError> {
        model.validate()?;
        let name = model.name.trim();
        if name.is_empty() {
            return Err(error::SystemError::bad_request("Group name is required"));
        }

        self.find_member_group(&group_id, &user_id).await?;

        let group = self
            .conversation_repo
            .update_name(&group_id, name)
            .await?
            .ok_or_else(|| error::SystemError::not_found("Group not found"))?;

        info!("Group {} renamed by {}", group_id, user_id);
        self.assemble_detail(group, &user_id).await
    }

    pub async fn update_group_photo(
        &self,
        group_id: Uuid,
        user_id: Uuid,
        photo_url: &str,
    ) -> Result<ConversationDetail, error::SystemError> {
        self.find_member_group(&group_id, &user_id).await?;

        let group = self
            .conversation_repo
            .update_photo(&group_id, photo_url)
            .await?
            .ok_or_else(|| error::SystemError::not_found("Group not found"))?;

        self.assemble_detail(group, &user_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::conversation::schema::ConversationType;
    use crate::modules::message::model::NewMessage;
    use crate::test::memory::RendezvousLookups;
    use crate::test::{fixture, services, MemoryStore};

    fn group(name: &str, members: &[Uuid]) -> NewGroup {
        NewGroup { name: name.to_string(), members: members.to_vec() }
    }

    #[tokio::test]
    async fn direct_conversation_is_idempotent() {
        let store = MemoryStore::new();
        let svc = services(store.clone());
        let (alice, bob) = fixture::pair(&svc).await;

        let (first, created) =
            svc.conversations.get_or_create_direct(alice.id, bob.id).await.unwrap();
        assert!(created);
        let (second, created) =
            svc.conversations.get_or_create_direct(bob.id, alice.id).await.unwrap();
        assert!(!created);

        assert_eq!(first.id, second.id);
        assert_eq!(second.participants.len(), 2);
        assert_eq!(second.last_message_at, first.last_message_at);
        assert_eq!(store.direct_conversation_count(alice.id, bob.id).await, 1);
    }

    #[tokio::test]
    async fn concurrent_direct_creation_yields_one_conversation() {
        let store = MemoryStore::new();
        let svc = services(store.clone());
        let (alice, bob) = fixture::pair(&svc).await;

        // both callers see no conversation before either inserts
        let shared = Arc::new(store.clone());
        let racing = ConversationService::with_dependencies(
            Arc::new(RendezvousLookups::new(store.clone(), 2)),
            shared.clone(),
            shared.clone(),
            shared,
            svc.policy.clone(),
        );

        let (a, b) = tokio::join!(
            racing.get_or_create_direct(alice.id, bob.id),
            racing.get_or_create_direct(bob.id, alice.id),
        );
        let ((a, a_created), (b, b_created)) = (a.unwrap(), b.unwrap());

        assert_eq!(a.id, b.id);
        assert!(a_created != b_created);
        assert_eq!(store.direct_conversation_count(alice.id, bob.id).await, 1);
    }

    #[tokio::test]
    async fn direct_conversation_needs_two_existing_users() {
        let svc = services(MemoryStore::new());
        let alice = fixture::user(&svc, "alice").await;

        let err = svc.conversations.get_or_create_direct(alice.id, alice.id).await.unwrap_err();
        assert!(matches!(err, error::SystemError::BadRequest(_)));
        let err =
            svc.conversations.get_or_create_direct(alice.id, Uuid::now_v7()).await.unwrap_err();
        assert!(matches!(err, error::SystemError::NotFound(_)));
    }

    #[tokio::test]
    async fn direct_conversation_takes_name_of_other_participant() {
        let svc = services(MemoryStore::new());
        let (alice, bob) = fixture::pair(&svc).await;
        let (c, _) = svc.conversations.get_or_create_direct(alice.id, bob.id).await.unwrap();

        assert_eq!(c._type, ConversationType::Direct);
        assert_eq!(c.name, "bob");
        assert_eq!(svc.conversations.get_conversation(c.id, bob.id).await.unwrap().name, "alice");

        // renames show up without touching the conversation
        svc.users
            .update_username(bob.id, crate::modules::user::model::UsernameModel {
                name: "robert".into(),
            })
            .await
            .unwrap();
        let previews = svc.conversations.list_for_user(alice.id).await.unwrap();
        assert_eq!(previews[0].name, "robert");
        assert_eq!(previews[0].other_participant.as_ref().map(|o| o.id), Some(bob.id));
    }

    #[tokio::test]
    async fn non_participant_is_forbidden() {
        let svc = services(MemoryStore::new());
        let (alice, bob) = fixture::pair(&svc).await;
        let carol = fixture::user(&svc, "carol").await;
        let (c, _) = svc.conversations.get_or_create_direct(alice.id, bob.id).await.unwrap();

        let err = svc.conversations.get_conversation(c.id, carol.id).await.unwrap_err();
        assert!(matches!(err, error::SystemError::Forbidden(_)));
        let err = svc.conversations.mark_as_read(c.id, carol.id).await.unwrap_err();
        assert!(matches!(err, error::SystemError::Forbidden(_)));
        let err = svc.messages.get_conversation_messages(c.id, carol.id).await.unwrap_err();
        assert!(matches!(err, error::SystemError::Forbidden(_)));

        // unknown ids look the same as foreign ones
        let err = svc.conversations.get_conversation(Uuid::now_v7(), carol.id).await.unwrap_err();
        assert!(matches!(err, error::SystemError::Forbidden(_)));
    }

    #[tokio::test]
    async fn unread_count_resets_and_counts_others_messages() {
        let svc = services(MemoryStore::new());
        let (alice, bob) = fixture::pair(&svc).await;
        let (c, _) = svc.conversations.get_or_create_direct(alice.id, bob.id).await.unwrap();

        svc.messages.send(c.id, alice.id, NewMessage::text("one")).await.unwrap();
        svc.messages.send(c.id, alice.id, NewMessage::text("two")).await.unwrap();
        assert_eq!(svc.conversations.get_conversation(c.id, bob.id).await.unwrap().unread_count, 2);
        // own messages never count
        assert_eq!(
            svc.conversations.get_conversation(c.id, alice.id).await.unwrap().unread_count,
            0
        );

        svc.conversations.mark_as_read(c.id, bob.id).await.unwrap();
        assert_eq!(svc.conversations.get_conversation(c.id, bob.id).await.unwrap().unread_count, 0);

        svc.messages.send(c.id, alice.id, NewMessage::text("three")).await.unwrap();
        assert_eq!(svc.conversations.get_conversation(c.id, bob.id).await.unwrap().unread_count, 1);
    }

    #[tokio::test]
    async fn read_cursor_stops_at_the_last_message_shown() {
        let svc = services(MemoryStore::new());
        let (alice, bob) = fixture::pair(&svc).await;
        let (c, _) = svc.conversations.get_or_create_direct(alice.id, bob.id).await.unwrap();

        svc.messages.send(c.id, alice.id, NewMessage::text("one")).await.unwrap();
        let shown = svc.messages.get_conversation_messages(c.id, bob.id).await.unwrap();
        // arrives after bob loaded the history
        svc.messages.send(c.id, alice.id, NewMessage::text("two")).await.unwrap();

        let seen_until = shown.last().unwrap().created_at;
        svc.conversations.mark_read_through(c.id, bob.id, seen_until).await.unwrap();
        let detail = svc.conversations.get_conversation(c.id, bob.id).await.unwrap();
        assert_eq!(detail.unread_count, 1);
        let cursor = detail.participants.iter().find(|p| p.id == bob.id).unwrap().last_read_at;
        assert_eq!(cursor, seen_until);

        // an older cursor never moves it back
        svc.conversations.mark_as_read(c.id, bob.id).await.unwrap();
        svc.conversations.mark_read_through(c.id, bob.id, seen_until).await.unwrap();
        assert_eq!(svc.conversations.get_conversation(c.id, bob.id).await.unwrap().unread_count, 0);

        let carol = fixture::user(&svc, "carol").await;
        let err =
            svc.conversations.mark_read_through(c.id, carol.id, seen_until).await.unwrap_err();
        assert!(matches!(err, error::SystemError::Forbidden(_)));
    }

    #[tokio::test]
    async fn list_is_ordered_by_recent_activity() {
        let svc = services(MemoryStore::new());
        let (alice, bob) = fixture::pair(&svc).await;
        let carol = fixture::user(&svc, "carol").await;
        let dave = fixture::user(&svc, "dave").await;

        let (ab, _) = svc.conversations.get_or_create_direct(alice.id, bob.id).await.unwrap();
        let (ac, _) = svc.conversations.get_or_create_direct(alice.id, carol.id).await.unwrap();
        let team = svc.conversations.create_group(alice.id, group("Team", &[dave.id])).await.unwrap();

        svc.messages.send(ac.id, carol.id, NewMessage::text("x".repeat(150))).await.unwrap();
        svc.messages.send(ab.id, bob.id, NewMessage::photo("/uploads/messages/p.png")).await.unwrap();

        let previews = svc.conversations.list_for_user(alice.id).await.unwrap();
        let ids: Vec<_> = previews.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![ab.id, ac.id, team.id]);
        assert!(previews.windows(2).all(|w| w[0].last_message_at >= w[1].last_message_at));

        let photo = previews[0].last_message.as_ref().unwrap();
        assert!(photo.has_photo);
        assert_eq!(photo.content, None);
        assert_eq!(photo.sender_username, "bob");

        let text = previews[1].last_message.as_ref().unwrap();
        assert_eq!(text.content.as_ref().map(|c| c.chars().count()), Some(PREVIEW_MAX_CHARS));
        assert_eq!(previews[1].unread_count, 1);

        assert!(previews[2].last_message.is_none());
        assert_eq!(previews[2].name, "Team");

        // bob sees only his conversation
        assert_eq!(svc.conversations.list_for_user(bob.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn create_group_validates_members() {
        let svc = services(MemoryStore::new());
        let (alice, bob) = fixture::pair(&svc).await;

        let err = svc.conversations.create_group(alice.id, group("", &[bob.id])).await.unwrap_err();
        assert!(matches!(err, error::SystemError::BadRequest(_)));
        let err = svc
            .conversations
            .create_group(alice.id, group(&"n".repeat(51), &[bob.id]))
            .await
            .unwrap_err();
        assert!(matches!(err, error::SystemError::BadRequest(_)));
        let err = svc.conversations.create_group(alice.id, group("Team", &[])).await.unwrap_err();
        assert!(matches!(err, error::SystemError::BadRequest(_)));
        let err = svc
            .conversations
            .create_group(alice.id, group("Team", &[bob.id, alice.id]))
            .await
            .unwrap_err();
        assert!(matches!(err, error::SystemError::BadRequest(_)));
        let err = svc
            .conversations
            .create_group(alice.id, group("Team", &[bob.id, Uuid::now_v7()]))
            .await
            .unwrap_err();
        assert!(matches!(err, error::SystemError::NotFound(_)));

        // nothing was created by the failed attempts
        assert!(svc.conversations.list_for_user(bob.id).await.unwrap().is_empty());

        let team = svc
            .conversations
            .create_group(alice.id, group("Team", &[bob.id, bob.id]))
            .await
            .unwrap();
        assert_eq!(team.participants.len(), 2);
        assert_eq!(team.created_by, alice.id);
    }

    #[tokio::test]
    async fn group_size_is_capped() {
        let svc = services(MemoryStore::new());
        let creator = fixture::user(&svc, "creator").await;
        let mut members = Vec::new();
        for i in 0..MAX_GROUP_PARTICIPANTS {
            members.push(fixture::user(&svc, &format!("member{i}")).await.id);
        }

        let err = svc
            .conversations
            .create_group(creator.id, group("Big", &members))
            .await
            .unwrap_err();
        assert!(matches!(err, error::SystemError::BadRequest(_)));

        let last = members.pop().unwrap();
        let full = svc.conversations.create_group(creator.id, group("Big", &members)).await.unwrap();
        assert_eq!(full.participants.len(), MAX_GROUP_PARTICIPANTS);

        let err = svc.conversations.add_member(full.id, creator.id, last).await.unwrap_err();
        assert!(matches!(err, error::SystemError::Conflict(_)));
    }

    #[tokio::test]
    async fn leave_and_rejoin_group() {
        let svc = services(MemoryStore::new());
        let (u1, u2) = fixture::pair(&svc).await;
        let u3 = fixture::user(&svc, "carol").await;

        let team = svc.conversations.create_group(u1.id, group("Team", &[u2.id, u3.id])).await.unwrap();
        assert_eq!(team.participants.len(), 3);

        svc.conversations.remove_member(team.id, u2.id, u2.id).await.unwrap();
        let after = svc.conversations.get_conversation(team.id, u1.id).await.unwrap();
        assert_eq!(after.participants.len(), 2);
        let err = svc.conversations.get_conversation(team.id, u2.id).await.unwrap_err();
        assert!(matches!(err, error::SystemError::Forbidden(_)));

        let rejoined = svc.conversations.add_member(team.id, u1.id, u2.id).await.unwrap();
        assert_eq!(rejoined.participants.len(), 3);

        let err = svc.conversations.add_member(team.id, u1.id, u2.id).await.unwrap_err();
        assert!(matches!(err, error::SystemError::Conflict(_)));
    }

    #[tokio::test]
    async fn membership_changes_follow_group_rules() {
        let svc = services(MemoryStore::new());
        let (u1, u2) = fixture::pair(&svc).await;
        let u3 = fixture::user(&svc, "carol").await;
        let outsider = fixture::user(&svc, "dave").await;

        let team = svc.conversations.create_group(u1.id, group("Team", &[u2.id, u3.id])).await.unwrap();
        let (direct, _) = svc.conversations.get_or_create_direct(u1.id, u2.id).await.unwrap();

        // only members may add, only the creator may remove others
        let err = svc.conversations.add_member(team.id, outsider.id, outsider.id).await.unwrap_err();
        assert!(matches!(err, error::SystemError::Forbidden(_)));
        let err = svc.conversations.remove_member(team.id, u2.id, u3.id).await.unwrap_err();
        assert!(matches!(err, error::SystemError::Forbidden(_)));
        let err = svc.conversations.remove_member(team.id, u1.id, outsider.id).await.unwrap_err();
        assert!(matches!(err, error::SystemError::NotFound(_)));
        let err = svc.conversations.add_member(team.id, u1.id, Uuid::now_v7()).await.unwrap_err();
        assert!(matches!(err, error::SystemError::NotFound(_)));

        // direct conversations have fixed membership
        let err = svc.conversations.add_member(direct.id, u1.id, u3.id).await.unwrap_err();
        assert!(matches!(err, error::SystemError::BadRequest(_)));
        let err = svc.conversations.remove_member(direct.id, u1.id, u1.id).await.unwrap_err();
        assert!(matches!(err, error::SystemError::BadRequest(_)));

        svc.conversations.remove_member(team.id, u1.id, u3.id).await.unwrap();
        let detail = svc.conversations.get_conversation(team.id, u2.id).await.unwrap();
        assert!(detail.participants.iter().all(|p| p.id != u3.id));
    }

    #[tokio::test]
    async fn empty_group_persists() {
        let svc = services(MemoryStore::new());
        let (u1, u2) = fixture::pair(&svc).await;
        let team = svc.conversations.create_group(u1.id, group("Team", &[u2.id])).await.unwrap();

        svc.conversations.remove_member(team.id, u2.id, u2.id).await.unwrap();
        svc.conversations.remove_member(team.id, u1.id, u1.id).await.unwrap();

        assert!(svc.conversations.list_for_user(u1.id).await.unwrap().is_empty());
        let err = svc.conversations.add_member(team.id, u1.id, u1.id).await.unwrap_err();
        assert!(matches!(err, error::SystemError::Forbidden(_)));
    }

    #[tokio::test]
    async fn group_name_and_photo_updates() {
        let svc = services(MemoryStore::new());
        let (u1, u2) = fixture::pair(&svc).await;
        let outsider = fixture::user(&svc, "carol").await;
        let team = svc.conversations.create_group(u1.id, group("Team", &[u2.id])).await.unwrap();

        let renamed = svc
            .conversations
            .update_group_name(team.id, u2.id, GroupNameModel { name: "Crew".into() })
            .await
            .unwrap();
        assert_eq!(renamed.name, "Crew");

        let err = svc
            .conversations
            .update_group_name(team.id, outsider.id, GroupNameModel { name: "Mine".into() })
            .await
            .unwrap_err();
        assert!(matches!(err, error::SystemError::Forbidden(_)));
        let err = svc
            .conversations
            .update_group_name(team.id, u1.id, GroupNameModel { name: "   ".into() })
            .await
            .unwrap_err();
        assert!(matches!(err, error::SystemError::BadRequest(_)));

        let photo = svc
            .conversations
            .update_group_photo(team.id, u1.id, "/uploads/groups/t.png")
            .await
            .unwrap();
        assert_eq!(photo.photo_url.as_deref(), Some("/uploads/groups/t.png"));

        let (direct, _) = svc.conversations.get_or_create_direct(u1.id, u2.id).await.unwrap();
        let err = svc
            .conversations
            .update_group_photo(direct.id, u1.id, "/uploads/groups/t.png")
            .await
            .unwrap_err();
        assert!(matches!(err, error::SystemError::BadRequest(_)));
    }

    #[tokio::test]
    async fn alice_and_bob_scenario() {
        let svc = services(MemoryStore::new());
        let (u1, u2) = fixture::pair(&svc).await;

        let (c1, _) = svc.conversations.get_or_create_direct(u1.id, u2.id).await.unwrap();
        let m1 = svc.messages.send(c1.id, u1.id, NewMessage::text("hi")).await.unwrap();
        let after = svc.conversations.get_conversation(c1.id, u1.id).await.unwrap();
        assert!(after.last_message_at > c1.last_message_at);

        let r1 = svc.reactions.react(m1.id, u2.id, "👍".into()).await.unwrap();
        assert_eq!(r1.emoticon, "👍");
        let r1b = svc.reactions.react(m1.id, u2.id, "❤".into()).await.unwrap();
        assert_eq!((r1b.id, r1b.emoticon.as_str()), (r1.id, "❤"));

        let err = svc.messages.delete(m1.id, u2.id).await.unwrap_err();
        assert!(matches!(err, error::SystemError::Forbidden(_)));
        svc.messages.delete(m1.id, u1.id).await.unwrap();

        let err = svc.reactions.unreact(m1.id, r1.id, u2.id).await.unwrap_err();
        assert!(matches!(err, error::SystemError::NotFound(_)));
    }
}
