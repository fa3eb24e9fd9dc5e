//! Users repository: public profiles and the follow graph

use sqlx::{Pool, Postgres};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::user::{Follow, Organizer},
    search::PageRequest,
};

/// Public user columns; the password hash is never selected
pub(crate) const PUBLIC_USER_SELECT: &str = r#"
    SELECT u.id, u.email, u.user_type, p.first_name, p.last_name,
           p.company_name, p.avatar, u.is_verified
    FROM users u
    LEFT JOIN profiles p ON p.user_id = u.id
"#;

#[derive(Clone)]
pub struct UsersRepository {
    pool: Pool<Postgres>,
}

impl UsersRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    pub async fn exists(&self, id: Uuid) -> AppResult<bool> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE id = $1)")
            .bind(id)
            .fetch_one(&self.pool)
            .await?;
        Ok(exists)
    }

    /// Public views of the given users, in no particular order
    pub async fn public_many(&self, ids: &[Uuid]) -> AppResult<Vec<Organizer>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let users = sqlx::query_as::<_, Organizer>(&format!(
            "{} WHERE u.id = ANY($1)",
            PUBLIC_USER_SELECT
        ))
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;
        Ok(users)
    }

    /// Users followed by `user_id`
    pub async fn following_ids(&self, user_id: Uuid) -> AppResult<Vec<Uuid>> {
        let ids = sqlx::query_scalar::<_, Uuid>(
            "SELECT following_id FROM follows WHERE follower_id = $1",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(ids)
    }

    pub async fn is_following(&self, follower_id: Uuid, following_id: Uuid) -> AppResult<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM follows WHERE follower_id = $1 AND following_id = $2)",
        )
        .bind(follower_id)
        .bind(following_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    pub async fn follow(&self, follower_id: Uuid, following_id: Uuid) -> AppResult<Follow> {
        let result = sqlx::query_as::<_, Follow>(
            r#"
            INSERT INTO follows (follower_id, following_id)
            VALUES ($1, $2)
            RETURNING follower_id, following_id, created_at
            "#,
        )
        .bind(follower_id)
        .bind(following_id)
        .fetch_one(&self.pool)
        .await;

        match result {
            Ok(follow) => Ok(follow),
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => Err(AppError::Conflict(
                "Already following this user".to_string(),
            )),
            Err(e) => Err(e.into()),
        }
    }

    /// Returns false when there was nothing to remove
    pub async fn unfollow(&self, follower_id: Uuid, following_id: Uuid) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM follows WHERE follower_id = $1 AND following_id = $2")
            .bind(follower_id)
            .bind(following_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Users following `user_id`, most recent first
    pub async fn followers(
        &self,
        user_id: Uuid,
        page: PageRequest,
    ) -> AppResult<(Vec<Organizer>, i64)> {
        self.follow_page("f.following_id", "f.follower_id", user_id, page)
            .await
    }

    /// Users `user_id` follows, most recent first
    pub async fn following(
        &self,
        user_id: Uuid,
        page: PageRequest,
    ) -> AppResult<(Vec<Organizer>, i64)> {
        self.follow_page("f.follower_id", "f.following_id", user_id, page)
            .await
    }

    async fn follow_page(
        &self,
        key: &str,
        other: &str,
        user_id: Uuid,
        page: PageRequest,
    ) -> AppResult<(Vec<Organizer>, i64)> {
        let total: i64 = sqlx::query_scalar(&format!(
            "SELECT COUNT(*) FROM follows f WHERE {} = $1",
            key
        ))
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        let users = sqlx::query_as::<_, Organizer>(&format!(
            r#"
            {}
            JOIN follows f ON u.id = {}
            WHERE {} = $1
            ORDER BY f.created_at DESC
            LIMIT $2 OFFSET $3
            "#,
            PUBLIC_USER_SELECT, other, key
        ))
        .bind(user_id)
        .bind(page.limit)
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;

        Ok((users, total))
    }
}
