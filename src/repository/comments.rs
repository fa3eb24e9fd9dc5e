//! Event comments repository

use sqlx::{Pool, Postgres};
use uuid::Uuid;

use crate::{error::AppResult, models::comment::Comment, search::PageRequest};

#[derive(Clone)]
pub struct CommentsRepository {
    pool: Pool<Postgres>,
}

impl CommentsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    pub async fn find(&self, id: Uuid) -> AppResult<Option<Comment>> {
        let comment = sqlx::query_as::<_, Comment>("SELECT * FROM event_comments WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(comment)
    }

    /// Top-level comments of an event, newest first
    pub async fn top_level(
        &self,
        event_id: Uuid,
        page: PageRequest,
    ) -> AppResult<(Vec<Comment>, i64)> {
        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM event_comments WHERE event_id = $1 AND parent_id IS NULL",
        )
        .bind(event_id)
        .fetch_one(&self.pool)
        .await?;

        let rows = sqlx::query_as::<_, Comment>(
            r#"
            SELECT * FROM event_comments
            WHERE event_id = $1 AND parent_id IS NULL
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(event_id)
        .bind(page.limit)
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;

        Ok((rows, total))
    }

    /// Replies to any of `parent_ids`, oldest first
    pub async fn replies_to(&self, parent_ids: &[Uuid]) -> AppResult<Vec<Comment>> {
        if parent_ids.is_empty() {
            return Ok(Vec::new());
        }
        let rows = sqlx::query_as::<_, Comment>(
            "SELECT * FROM event_comments WHERE parent_id = ANY($1) ORDER BY created_at",
        )
        .bind(parent_ids)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Like counters; comments without likes are left out
    pub async fn like_counts(&self, comment_ids: &[Uuid]) -> AppResult<Vec<(Uuid, i64)>> {
        if comment_ids.is_empty() {
            return Ok(Vec::new());
        }
        let rows = sqlx::query_as::<_, (Uuid, i64)>(
            r#"
            SELECT comment_id, COUNT(*) FROM event_comment_likes
            WHERE comment_id = ANY($1)
            GROUP BY comment_id
            "#,
        )
        .bind(comment_ids)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Which of `comment_ids` the user liked
    pub async fn liked_by(&self, user_id: Uuid, comment_ids: &[Uuid]) -> AppResult<Vec<Uuid>> {
        if comment_ids.is_empty() {
            return Ok(Vec::new());
        }
        let ids = sqlx::query_scalar::<_, Uuid>(
            "SELECT comment_id FROM event_comment_likes WHERE user_id = $1 AND comment_id = ANY($2)",
        )
        .bind(user_id)
        .bind(comment_ids)
        .fetch_all(&self.pool)
        .await?;
        Ok(ids)
    }

    pub async fn create(
        &self,
        user_id: Uuid,
        event_id: Uuid,
        parent_id: Option<Uuid>,
        content: &str,
    ) -> AppResult<Comment> {
        let comment = sqlx::query_as::<_, Comment>(
            r#"
            INSERT INTO event_comments (event_id, user_id, parent_id, content)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(event_id)
        .bind(user_id)
        .bind(parent_id)
        .bind(content)
        .fetch_one(&self.pool)
        .await?;
        Ok(comment)
    }

    pub async fn update_content(&self, id: Uuid, content: &str) -> AppResult<Comment> {
        let comment = sqlx::query_as::<_, Comment>(
            "UPDATE event_comments SET content = $2, updated_at = NOW() WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(content)
        .fetch_one(&self.pool)
        .await?;
        Ok(comment)
    }

    /// Delete a comment; its replies and likes cascade
    pub async fn delete(&self, id: Uuid) -> AppResult<()> {
        sqlx::query("DELETE FROM event_comments WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Flip the user's like on a comment. Returns whether it is now liked.
    pub async fn toggle_like(&self, user_id: Uuid, comment_id: Uuid) -> AppResult<bool> {
        let mut tx = self.pool.begin().await?;

        let removed = sqlx::query(
            "DELETE FROM event_comment_likes WHERE user_id = $1 AND comment_id = $2",
        )
        .bind(user_id)
        .bind(comment_id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        if removed == 0 {
            sqlx::query(
                r#"
                INSERT INTO event_comment_likes (user_id, comment_id)
                VALUES ($1, $2)
                ON CONFLICT DO NOTHING
                "#,
            )
            .bind(user_id)
            .bind(comment_id)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(removed == 0)
    }
}
