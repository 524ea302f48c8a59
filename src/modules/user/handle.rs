use actix_multipart::Multipart;
use actix_web::{delete, get, post, put, web, HttpRequest};

use crate::api::{error, success};
use crate::middlewares::get_auth_user;
use crate::modules::media::{handle::read_photo_form, model::PhotoCategory, service::MediaService};
use crate::modules::user::{model, service::UserService};
use crate::utils::{ValidatedJson, ValidatedQuery};

#[post("/session")]
pub async fn login(
    user_service: web::Data<UserService>,
    body: ValidatedJson<model::UsernameModel>,
) -> Result<success::Success<model::LoginResponse>, error::Error> {
    let session = user_service.login(body.0.name).await?;
    Ok(success::Success::created(Some(session)).message("Login successful"))
}

#[delete("/session")]
pub async fn logout(
    user_service: web::Data<UserService>,
    req: HttpRequest,
) -> Result<success::Success<()>, error::Error> {
    let auth = get_auth_user(&req)?;
    user_service.logout(&auth.token).await?;
    Ok(success::Success::no_content())
}

#[get("")]
pub async fn search_users(
    user_service: web::Data<UserService>,
    query: ValidatedQuery<model::SearchQuery>,
    req: HttpRequest,
) -> Result<success::Success<Vec<model::UserResponse>>, error::Error> {
    let auth = get_auth_user(&req)?;
    let users = user_service.search(query.0, auth.id).await?;
    Ok(success::Success::ok(Some(users)).message("Users retrieved successfully"))
}

#[get("/me")]
pub async fn get_profile(
    user_service: web::Data<UserService>,
    req: HttpRequest,
) -> Result<success::Success<model::UserResponse>, error::Error> {
    let id = get_auth_user(&req)?.id;
    let user = user_service.get_by_id(id).await?;
    Ok(success::Success::ok(Some(user)).message("Profile retrieved successfully"))
}

#[put("/me/username")]
pub async fn set_username(
    user_service: web::Data<UserService>,
    body: ValidatedJson<model::UsernameModel>,
    req: HttpRequest,
) -> Result<success::Success<model::UserResponse>, error::Error> {
    let id = get_auth_user(&req)?.id;
    let user = user_service.update_username(id, body.0).await?;
    Ok(success::Success::ok(Some(user)).message("Username updated successfully"))
}

#[put("/me/photo")]
pub async fn set_photo(
    user_service: web::Data<UserService>,
    media_service: web::Data<MediaService>,
    payload: Multipart,
    req: HttpRequest,
) -> Result<success::Success<model::UserResponse>, error::Error> {
    let id = get_auth_user(&req)?.id;
    let form = read_photo_form(payload, media_service.max_file_size()).await?;
    let users = user_service.get_ref();
    let user = media_service
        .save_photo_with(PhotoCategory::Profiles, form.photo, |url| async move {
            users.update_photo(id, &url).await
        })
        .await?;
    Ok(success::Success::ok(Some(user)).message("Photo updated successfully"))
}
