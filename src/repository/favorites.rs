//! Favorites repository

use sqlx::{Pool, Postgres};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::favorite::Favorite,
    search::PageRequest,
};

#[derive(Clone)]
pub struct FavoritesRepository {
    pool: Pool<Postgres>,
}

impl FavoritesRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Every favorite of a user
    pub async fn for_user(&self, user_id: Uuid) -> AppResult<Vec<Favorite>> {
        let rows = sqlx::query_as::<_, Favorite>(
            "SELECT * FROM favorites WHERE user_id = $1 ORDER BY created_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Favorites of a user, newest first
    pub async fn page(&self, user_id: Uuid, page: PageRequest) -> AppResult<(Vec<Favorite>, i64)> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM favorites WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await?;

        let rows = sqlx::query_as::<_, Favorite>(
            r#"
            SELECT * FROM favorites
            WHERE user_id = $1
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(user_id)
        .bind(page.limit)
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;

        Ok((rows, total))
    }

    /// Whether the exact (user, event, date) favorite exists. A `None` date
    /// matches only the whole-event favorite.
    pub async fn exists(
        &self,
        user_id: Uuid,
        event_id: Uuid,
        event_date_id: Option<Uuid>,
    ) -> AppResult<bool> {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM favorites
                WHERE user_id = $1 AND event_id = $2
                  AND event_date_id IS NOT DISTINCT FROM $3
            )
            "#,
        )
        .bind(user_id)
        .bind(event_id)
        .bind(event_date_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    pub async fn create(
        &self,
        user_id: Uuid,
        event_id: Uuid,
        event_date_id: Option<Uuid>,
    ) -> AppResult<Favorite> {
        let result = sqlx::query_as::<_, Favorite>(
            r#"
            INSERT INTO favorites (user_id, event_id, event_date_id)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(event_id)
        .bind(event_date_id)
        .fetch_one(&self.pool)
        .await;

        result.map_err(insert_error)
    }

    /// Delete a favorite owned by `user_id`. Returns false when nothing matched.
    pub async fn delete_owned(&self, id: Uuid, user_id: Uuid) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM favorites WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Delete every favorite of `user_id` on an event, whole-event and per date
    pub async fn delete_for_event(&self, user_id: Uuid, event_id: Uuid) -> AppResult<u64> {
        let result = sqlx::query("DELETE FROM favorites WHERE user_id = $1 AND event_id = $2")
            .bind(user_id)
            .bind(event_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}

/// A concurrent insert that lost the race against the unique indexes is a
/// duplicate, not a server error
fn insert_error(error: sqlx::Error) -> AppError {
    match error {
        sqlx::Error::Database(e) if e.is_unique_violation() => {
            AppError::Conflict("Event already in favorites".to_string())
        }
        e => e.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::error::{DatabaseError, ErrorKind};
    use std::{error::Error as StdError, fmt};

    /// Database error that is either a unique violation or a foreign key one
    #[derive(Debug)]
    struct PgError {
        unique: bool,
    }

    impl fmt::Display for PgError {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str(self.message())
        }
    }

    impl StdError for PgError {}

    impl DatabaseError for PgError {
        fn message(&self) -> &str {
            if self.unique {
                "duplicate key value violates unique constraint"
            } else {
                "insert or update violates foreign key constraint"
            }
        }

        fn as_error(&self) -> &(dyn StdError + Send + Sync + 'static) {
            self
        }

        fn as_error_mut(&mut self) -> &mut (dyn StdError + Send + Sync + 'static) {
            self
        }

        fn into_error(self: Box<Self>) -> Box<dyn StdError + Send + Sync + 'static> {
            self
        }

        fn kind(&self) -> ErrorKind {
            if self.unique {
                ErrorKind::UniqueViolation
            } else {
                ErrorKind::ForeignKeyViolation
            }
        }
    }

    #[test]
    fn test_unique_violation_is_conflict() {
        let error = sqlx::Error::Database(Box::new(PgError { unique: true }));
        assert!(matches!(insert_error(error), AppError::Conflict(_)));
    }

    #[test]
    fn test_other_database_errors_pass_through() {
        let error = sqlx::Error::Database(Box::new(PgError { unique: false }));
        assert!(matches!(insert_error(error), AppError::Database(_)));
        assert!(matches!(insert_error(sqlx::Error::PoolTimedOut), AppError::Database(_)));
    }
}
