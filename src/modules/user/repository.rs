use uuid::Uuid;

use crate::{
    api::error,
    modules::user::{
        model::InsertUser,
        schema::{SessionEntity, UserEntity},
    },
};

#[async_trait::async_trait]
pub trait UserRepository {
    async fn find_by_id(&self, id: &Uuid) -> Result<Option<UserEntity>, error::SystemError>;

    async fn find_by_ids(&self, ids: &[Uuid]) -> Result<Vec<UserEntity>, error::SystemError>;

    async fn find_by_username(
        &self,
        username: &str,
    ) -> Result<Option<UserEntity>, error::SystemError>;

    /// Fails with `Conflict` when the username is taken.
    async fn create(&self, user: &InsertUser) -> Result<UserEntity, error::SystemError>;

    async fn update_username(
        &self,
        id: &Uuid,
        username: &str,
    ) -> Result<Option<UserEntity>, error::SystemError>;

    async fn update_photo(
        &self,
        id: &Uuid,
        photo_url: &str,
    ) -> Result<Option<UserEntity>, error::SystemError>;

    /// Case-insensitive substring match on username, ordered by username.
    async fn search_users(
        &self,
        query: &str,
        exclude_user_id: &Uuid,
        limit: i64,
    ) -> Result<Vec<UserEntity>, error::SystemError>;
}

#[async_trait::async_trait]
pub trait SessionRepository {
    async fn create(
        &self,
        user_id: &Uuid,
        token: &str,
    ) -> Result<SessionEntity, error::SystemError>;

    async fn find_user_by_token(
        &self,
        token: &str,
    ) -> Result<Option<UserEntity>, error::SystemError>;

    async fn delete(&self, token: &str) -> Result<bool, error::SystemError>;
}
