use actix_web::{delete, post, web, HttpRequest};
use uuid::Uuid;

use crate::{
    api::{error, success},
    middlewares::get_auth_user,
    modules::reaction::{model, service::ReactionService},
    utils::ValidatedJson,
};

#[post("/messages/{id:[0-9a-fA-F-]{36}}/comments")]
pub async fn react(
    reaction_service: web::Data<ReactionService>,
    message_id: web::Path<Uuid>,
    body: ValidatedJson<model::ReactModel>,
    req: HttpRequest,
) -> Result<success::Success<model::ReactionResponse>, error::Error> {
    let user_id = get_auth_user(&req)?.id;
    let reaction = reaction_service.react(message_id.into_inner(), user_id, body.0.emoticon).await?;
    Ok(success::Success::ok(Some(reaction)).message("Reaction saved"))
}

#[delete("/messages/{id:[0-9a-fA-F-]{36}}/comments/{reaction_id:[0-9a-fA-F-]{36}}")]
pub async fn unreact(
    reaction_service: web::Data<ReactionService>,
    path: web::Path<(Uuid, Uuid)>,
    req: HttpRequest,
) -> Result<success::Success<()>, error::Error> {
    let user_id = get_auth_user(&req)?.id;
    let (message_id, reaction_id) = path.into_inner();
    reaction_service.unreact(message_id, reaction_id, user_id).await?;
    Ok(success::Success::no_content())
}
