use log::info;
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use crate::api::error;
use crate::constants::SEARCH_RESULT_LIMIT;
use crate::modules::user::model::{
    InsertUser, LoginResponse, SearchQuery, UserResponse, UsernameModel,
};
use crate::modules::user::repository::{SessionRepository, UserRepository};
use crate::utils::generate_session_token;

#[derive(Clone)]
pub struct UserService {
    repo: Arc<dyn UserRepository + Send + Sync>,
    sessions: Arc<dyn SessionRepository + Send + Sync>,
}

impl UserService {
    pub fn with_dependencies(
        repo: Arc<dyn UserRepository + Send + Sync>,
        sessions: Arc<dyn SessionRepository + Send + Sync>,
    ) -> Self {
        info!("UserService initialized with dependencies");
        UserService { repo, sessions }
    }

    /// Reuses the user named `username` or registers it, then opens a new session.
    pub async fn login(&self, username: String) -> Result<LoginResponse, error::SystemError> {
        let model = UsernameModel { name: username };
        model.validate()?;

        let user = match self.repo.find_by_username(&model.name).await? {
            Some(user) => user,
            None => match self.repo.create(&InsertUser { username: model.name.clone() }).await {
                Ok(user) => {
                    info!("Registered user {} ({})", user.username, user.id);
                    user
                }
                // lost a registration race for the same name
                Err(error::SystemError::Conflict(_)) => self
                    .repo
                    .find_by_username(&model.name)
                    .await?
                    .ok_or_else(|| error::SystemError::internal("User vanished after conflict"))?,
                Err(e) => return Err(e),
            },
        };

        let token = generate_session_token();
        let session = self.sessions.create(&user.id, &token).await?;
        info!("Session opened for user {}", user.id);

        Ok(LoginResponse { identifier: session.token, user: user.into() })
    }

    pub async fn authenticate(&self, token: &str) -> Result<UserResponse, error::SystemError> {
        self.sessions
            .find_user_by_token(token)
            .await?
            .map(UserResponse::from)
            .ok_or_else(|| error::SystemError::unauthorized("Invalid or expired session"))
    }

    pub async fn logout(&self, token: &str) -> Result<(), error::SystemError> {
        if !self.sessions.delete(token).await? {
            return Err(error::SystemError::not_found("Session not found"));
        }
        Ok(())
    }

    pub async fn get_by_id(&self, id: Uuid) -> Result<UserResponse, error::SystemError> {
        self.repo
            .find_by_id(&id)
            .await?
            .map(UserResponse::from)
            .ok_or_else(|| error::SystemError::not_found("User not found"))
    }

    pub async fn update_username(
        &self,
        id: Uuid,
        model: UsernameModel,
    ) -> Result<UserResponse, error::SystemError> {
        model.validate()?;

        let user = self
            .repo
            .update_username(&id, &model.name)
            .await?
            .ok_or_else(|| error::SystemError::not_found("User not found"))?;

        info!("User {} renamed to {}", id, user.username);
        Ok(user.into())
    }

    pub async fn update_photo(
        &self,
        id: Uuid,
        photo_url: &str,
    ) -> Result<UserResponse, error::SystemError> {
        let user = self
            .repo
            .update_photo(&id, photo_url)
            .await?
            .ok_or_else(|| error::SystemError::not_found("User not found"))?;
        Ok(user.into())
    }

    pub async fn search(
        &self,
        query: SearchQuery,
        exclude_user_id: Uuid,
    ) -> Result<Vec<UserResponse>, error::SystemError> {
        query.validate()?;

        let users = self.repo.search_users(&query.q, &exclude_user_id, SEARCH_RESULT_LIMIT).await?;
        Ok(users.into_iter().map(UserResponse::from).collect())
    }
}
