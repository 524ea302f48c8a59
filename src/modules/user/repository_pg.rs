use uuid::Uuid;

use crate::{
    api::error,
    modules::user::{
        model::InsertUser,
        repository::{SessionRepository, UserRepository},
        schema::{SessionEntity, UserEntity},
    },
};

#[derive(Clone)]
pub struct UserRepositoryPg {
    pool: sqlx::PgPool,
}

impl UserRepositoryPg {
    pub fn new(pool: sqlx::PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl UserRepository for UserRepositoryPg {
    async fn find_by_id(&self, id: &Uuid) -> Result<Option<UserEntity>, error::SystemError> {
        let user = sqlx::query_as::<_, UserEntity>(
            "SELECT id, username, photo_url, created_at FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn find_by_ids(&self, ids: &[Uuid]) -> Result<Vec<UserEntity>, error::SystemError> {
        let users = sqlx::query_as::<_, UserEntity>(
            "SELECT id, username, photo_url, created_at FROM users WHERE id = ANY($1)",
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;
        Ok(users)
    }

    async fn find_by_username(
        &self,
        username: &str,
    ) -> Result<Option<UserEntity>, error::SystemError> {
        let user = sqlx::query_as::<_, UserEntity>(
            "SELECT id, username, photo_url, created_at FROM users WHERE username = $1",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn create(&self, user: &InsertUser) -> Result<UserEntity, error::SystemError> {
        let id = Uuid::now_v7();
        let user = sqlx::query_as::<_, UserEntity>(
            r#"
            INSERT INTO users (id, username)
            VALUES ($1, $2)
            RETURNING id, username, photo_url, created_at
            "#,
        )
        .bind(id)
        .bind(&user.username)
        .fetch_one(&self.pool)
        .await?;
        Ok(user)
    }

    async fn update_username(
        &self,
        id: &Uuid,
        username: &str,
    ) -> Result<Option<UserEntity>, error::SystemError> {
        let user = sqlx::query_as::<_, UserEntity>(
            r#"
            UPDATE users
            SET username = $2
            WHERE id = $1
            RETURNING id, username, photo_url, created_at
            "#,
        )
        .bind(id)
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn update_photo(
        &self,
        id: &Uuid,
        photo_url: &str,
    ) -> Result<Option<UserEntity>, error::SystemError> {
        let user = sqlx::query_as::<_, UserEntity>(
            r#"
            UPDATE users
            SET photo_url = $2
            WHERE id = $1
            RETURNING id, username, photo_url, created_at
            "#,
        )
        .bind(id)
        .bind(photo_url)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn search_users(
        &self,
        query: &str,
        exclude_user_id: &Uuid,
        limit: i64,
    ) -> Result<Vec<UserEntity>, error::SystemError> {
        let search_pattern = format!("%{}%", query.replace('%', "\\%").replace('_', "\\_"));
        let users = sqlx::query_as::<_, UserEntity>(
            r#"
            SELECT id, username, photo_url, created_at
            FROM users
            WHERE username ILIKE $1
            AND id <> $2
            ORDER BY username
            LIMIT $3
            "#,
        )
        .bind(&search_pattern)
        .bind(exclude_user_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(users)
    }
}

#[derive(Clone)]
pub struct SessionRepositoryPg {
    pool: sqlx::PgPool,
}

impl SessionRepositoryPg {
    pub fn new(pool: sqlx::PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl SessionRepository for SessionRepositoryPg {
    async fn create(
        &self,
        user_id: &Uuid,
        token: &str,
    ) -> Result<SessionEntity, error::SystemError> {
        let session = sqlx::query_as::<_, SessionEntity>(
            r#"
            INSERT INTO sessions (token, user_id)
            VALUES ($1, $2)
            RETURNING token, user_id
            "#,
        )
        .bind(token)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(session)
    }

    async fn find_user_by_token(
        &self,
        token: &str,
    ) -> Result<Option<UserEntity>, error::SystemError> {
        let user = sqlx::query_as::<_, UserEntity>(
            r#"
            SELECT u.id, u.username, u.photo_url, u.created_at
            FROM sessions s
            JOIN users u ON u.id = s.user_id
            WHERE s.token = $1
            "#,
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn delete(&self, token: &str) -> Result<bool, error::SystemError> {
        let rows = sqlx::query("DELETE FROM sessions WHERE token = $1")
            .bind(token)
            .execute(&self.pool)
            .await?
            .rows_affected();

        Ok(rows > 0)
    }
}
