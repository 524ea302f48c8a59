use actix_multipart::Multipart;
use actix_web::{delete, guard::GuardContext, http::header, post, web, HttpRequest};
use uuid::Uuid;

use crate::{
    api::{error, success},
    middlewares::get_auth_user,
    modules::{
        media::{handle::read_photo_form, model::PhotoCategory, service::MediaService},
        message::{model, service::MessageService},
    },
    utils::ValidatedJson,
};

fn is_multipart(ctx: &GuardContext) -> bool {
    ctx.header::<header::ContentType>()
        .is_some_and(|ct| ct.0.essence_str() == "multipart/form-data")
}

#[post("/conversations/{id:[0-9a-fA-F-]{36}}/messages", guard = "is_multipart")]
pub async fn send_photo_message(
    message_service: web::Data<MessageService>,
    media_service: web::Data<MediaService>,
    conversation_id: web::Path<Uuid>,
    payload: Multipart,
    req: HttpRequest,
) -> Result<success::Success<model::MessageResponse>, error::Error> {
    let user_id = get_auth_user(&req)?.id;
    let form = read_photo_form(payload, media_service.max_file_size()).await?;

    let reply_to_id = form
        .field("reply_to_id")
        .map(Uuid::parse_str)
        .transpose()
        .map_err(|_| error::Error::bad_request("reply_to_id must be a valid id"))?;

    let messages = message_service.get_ref();
    let conversation_id = conversation_id.into_inner();
    let message = media_service
        .save_photo_with(PhotoCategory::Messages, form.photo, |url| async move {
            let new_message = model::NewMessage { reply_to_id, ..model::NewMessage::photo(&url) };
            messages.send(conversation_id, user_id, new_message).await
        })
        .await?;
    Ok(success::Success::created(Some(message)).message("Message sent"))
}

#[post("/conversations/{id:[0-9a-fA-F-]{36}}/messages")]
pub async fn send_text_message(
    message_service: web::Data<MessageService>,
    conversation_id: web::Path<Uuid>,
    body: ValidatedJson<model::SendTextModel>,
    req: HttpRequest,
) -> Result<success::Success<model::MessageResponse>, error::Error> {
    let user_id = get_auth_user(&req)?.id;
    let body = body.0;
    let new_message =
        model::NewMessage { reply_to_id: body.reply_to_id, ..model::NewMessage::text(body.content) };

    let message = message_service.send(conversation_id.into_inner(), user_id, new_message).await?;
    Ok(success::Success::created(Some(message)).message("Message sent"))
}

#[post("/messages/{id:[0-9a-fA-F-]{36}}/forward")]
pub async fn forward_message(
    message_service: web::Data<MessageService>,
    message_id: web::Path<Uuid>,
    body: web::Json<model::ForwardMessageModel>,
    req: HttpRequest,
) -> Result<success::Success<model::MessageResponse>, error::Error> {
    let user_id = get_auth_user(&req)?.id;
    let message =
        message_service.forward(message_id.into_inner(), body.conversation_id, user_id).await?;
    Ok(success::Success::created(Some(message)).message("Message forwarded"))
}

#[delete("/messages/{id:[0-9a-fA-F-]{36}}")]
pub async fn delete_message(
    message_service: web::Data<MessageService>,
    message_id: web::Path<Uuid>,
    req: HttpRequest,
) -> Result<success::Success<()>, error::Error> {
    let user_id = get_auth_user(&req)?.id;
    message_service.delete(message_id.into_inner(), user_id).await?;
    Ok(success::Success::no_content())
}
