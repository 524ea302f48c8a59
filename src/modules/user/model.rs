use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::modules::user::schema::UserEntity;

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UsernameModel {
    #[validate(
        length(min = 3, max = 16, message = "Username must be between 3 and 16 characters"),
        custom(function = "crate::utils::validate_name_charset")
    )]
    pub name: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct SearchQuery {
    #[validate(
        length(min = 1, max = 50, message = "Search query must be between 1 and 50 characters"),
        custom(function = "crate::utils::validate_name_charset")
    )]
    pub q: String,
}

pub struct InsertUser {
    pub username: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub identifier: String,
    pub user: UserResponse,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct UserResponse {
    pub id: uuid::Uuid,
    pub username: String,
    pub photo_url: Option<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl From<UserEntity> for UserResponse {
    fn from(entity: UserEntity) -> Self {
        UserResponse {
            id: entity.id,
            username: entity.username,
            photo_url: entity.photo_url,
            created_at: entity.created_at,
        }
    }
}
