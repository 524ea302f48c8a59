use actix_web::{
    body::MessageBody,
    dev::{ServiceRequest, ServiceResponse},
    middleware::Next,
    web, Error, HttpMessage, HttpRequest,
};
use uuid::Uuid;

use crate::{api::error, modules::user::service::UserService};

/// Caller resolved from the bearer token, attached to the request extensions.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: Uuid,
    pub token: String,
}

pub async fn authentication<B>(
    req: ServiceRequest,
    next: Next<B>,
) -> Result<ServiceResponse<B>, Error>
where
    B: MessageBody + 'static,
{
    let auth = req.headers().get("Authorization").and_then(|h| h.to_str().ok());
    let token = match auth.and_then(|h| h.strip_prefix("Bearer ")).map(str::trim) {
        Some(t) if !t.is_empty() => t.to_string(),
        _ => {
            return Err(error::Error::unauthorized("Missing or invalid Authorization header").into());
        }
    };

    let user_service = req
        .app_data::<web::Data<UserService>>()
        .cloned()
        .ok_or(error::Error::InternalServer)?;

    let user = user_service.authenticate(&token).await.map_err(error::Error::from)?;

    req.extensions_mut().insert(AuthUser { id: user.id, token });

    next.call(req).await
}

pub fn get_extensions<T: Clone + 'static>(req: &HttpRequest) -> Result<T, error::Error> {
    let extensions = req.extensions();

    let value = extensions
        .get::<T>()
        .ok_or_else(|| error::Error::unauthorized("Unauthorized"))?
        .clone();

    Ok(value)
}

pub fn get_auth_user(req: &HttpRequest) -> Result<AuthUser, error::Error> {
    get_extensions::<AuthUser>(req)
}
