use actix_multipart::Multipart;
use actix_web::{delete, get, post, put, web, HttpRequest};
use uuid::Uuid;

use crate::{
    api::{error, success},
    middlewares::get_auth_user,
    modules::{
        conversation::{model, service::ConversationService},
        media::{handle::read_photo_form, model::PhotoCategory, service::MediaService},
        message::service::MessageService,
    },
    utils::ValidatedJson,
};

#[get("")]
pub async fn list_conversations(
    conversation_service: web::Data<ConversationService>,
    req: HttpRequest,
) -> Result<success::Success<Vec<model::ConversationPreview>>, error::Error> {
    let user_id = get_auth_user(&req)?.id;
    let conversations = conversation_service.list_for_user(user_id).await?;
    Ok(success::Success::ok(Some(conversations)).message("Conversations retrieved successfully"))
}

#[post("")]
pub async fn create_direct_conversation(
    conversation_service: web::Data<ConversationService>,
    body: web::Json<model::NewDirectConversation>,
    req: HttpRequest,
) -> Result<success::Success<model::ConversationDetail>, error::Error> {
    let user_id = get_auth_user(&req)?.id;
    let (conversation, created) =
        conversation_service.get_or_create_direct(user_id, body.user_id).await?;

    if created {
        Ok(success::Success::created(Some(conversation)).message("Conversation created"))
    } else {
        Ok(success::Success::ok(Some(conversation)).message("Conversation retrieved successfully"))
    }
}

#[get("/{id:[0-9a-fA-F-]{36}}")]
pub async fn get_conversation(
    conversation_service: web::Data<ConversationService>,
    message_service: web::Data<MessageService>,
    conversation_id: web::Path<Uuid>,
    req: HttpRequest,
) -> Result<success::Success<model::ConversationView>, error::Error> {
    let user_id = get_auth_user(&req)?.id;
    let conversation_id = conversation_id.into_inner();

    let conversation = conversation_service.get_conversation(conversation_id, user_id).await?;
    let messages = message_service.get_conversation_messages(conversation_id, user_id).await?;

    if let Some(seen_until) = messages.iter().map(|m| m.created_at).max() {
        if let Err(e) =
            conversation_service.mark_read_through(conversation_id, user_id, seen_until).await
        {
            log::warn!("Failed to mark conversation {} as read: {}", conversation_id, e);
        }
    }

    Ok(success::Success::ok(Some(model::ConversationView { conversation, messages }))
        .message("Conversation retrieved successfully"))
}

#[post("/{id:[0-9a-fA-F-]{36}}/read")]
pub async fn mark_as_read(
    conversation_service: web::Data<ConversationService>,
    conversation_id: web::Path<Uuid>,
    req: HttpRequest,
) -> Result<success::Success<()>, error::Error> {
    let user_id = get_auth_user(&req)?.id;
    conversation_service.mark_as_read(conversation_id.into_inner(), user_id).await?;
    Ok(success::Success::no_content())
}

#[post("")]
pub async fn create_group(
    conversation_service: web::Data<ConversationService>,
    body: ValidatedJson<model::NewGroup>,
    req: HttpRequest,
) -> Result<success::Success<model::ConversationDetail>, error::Error> {
    let user_id = get_auth_user(&req)?.id;
    let group = conversation_service.create_group(user_id, body.0).await?;
    Ok(success::Success::created(Some(group)).message("Group created"))
}

#[post("/{id:[0-9a-fA-F-]{36}}/members")]
pub async fn add_member(
    conversation_service: web::Data<ConversationService>,
    group_id: web::Path<Uuid>,
    body: web::Json<model::AddMemberModel>,
    req: HttpRequest,
) -> Result<success::Success<model::ConversationDetail>, error::Error> {
    let user_id = get_auth_user(&req)?.id;
    let group = conversation_service.add_member(group_id.into_inner(), user_id, body.user_id).await?;
    Ok(success::Success::ok(Some(group)).message("Member added"))
}

#[delete("/{id:[0-9a-fA-F-]{36}}/members/me")]
pub async fn leave_group(
    conversation_service: web::Data<ConversationService>,
    group_id: web::Path<Uuid>,
    req: HttpRequest,
) -> Result<success::Success<()>, error::Error> {
    let user_id = get_auth_user(&req)?.id;
    conversation_service.remove_member(group_id.into_inner(), user_id, user_id).await?;
    Ok(success::Success::no_content())
}

#[delete("/{id:[0-9a-fA-F-]{36}}/members/{user_id:[0-9a-fA-F-]{36}}")]
pub async fn remove_member(
    conversation_service: web::Data<ConversationService>,
    path: web::Path<(Uuid, Uuid)>,
    req: HttpRequest,
) -> Result<success::Success<()>, error::Error> {
    let actor_id = get_auth_user(&req)?.id;
    let (group_id, target_id) = path.into_inner();
    conversation_service.remove_member(group_id, actor_id, target_id).await?;
    Ok(success::Success::no_content())
}

#[put("/{id:[0-9a-fA-F-]{36}}/name")]
pub async fn set_group_name(
    conversation_service: web::Data<ConversationService>,
    group_id: web::Path<Uuid>,
    body: ValidatedJson<model::GroupNameModel>,
    req: HttpRequest,
) -> Result<success::Success<model::ConversationDetail>, error::Error> {
    let user_id = get_auth_user(&req)?.id;
    let group =
        conversation_service.update_group_name(group_id.into_inner(), user_id, body.0).await?;
    Ok(success::Success::ok(Some(group)).message("Group name updated"))
}

#[put("/{id:[0-9a-fA-F-]{36}}/photo")]
pub async fn set_group_photo(
    conversation_service: web::Data<ConversationService>,
    media_service: web::Data<MediaService>,
    group_id: web::Path<Uuid>,
    payload: Multipart,
    req: HttpRequest,
) -> Result<success::Success<model::ConversationDetail>, error::Error> {
    let user_id = get_auth_user(&req)?.id;
    let form = read_photo_form(payload, media_service.max_file_size()).await?;
    let conversations = conversation_service.get_ref();
    let group_id = group_id.into_inner();
    let group = media_service
        .save_photo_with(PhotoCategory::Groups, form.photo, |url| async move {
            conversations.update_group_photo(group_id, user_id, &url).await
        })
        .await?;
    Ok(success::Success::ok(Some(group)).message("Group photo updated"))
}
