//! Event comments (one level of replies) and likes

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use super::user::Organizer;

/// Stored comment. `parent_id` is set on replies and always points to a
/// top-level comment of the same event.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: Uuid,
    pub event_id: Uuid,
    pub user_id: Uuid,
    pub parent_id: Option<Uuid>,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Comment as shown under an event
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CommentView {
    #[serde(flatten)]
    pub comment: Comment,
    pub user: Option<Organizer>,
    pub likes_count: i64,
    /// Whether the requesting user liked it; always false for anonymous callers
    pub is_liked: bool,
    pub replies_count: i64,
    /// Oldest first; always empty on replies
    pub replies: Vec<CommentView>,
}

fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        Err(ValidationError::new("comment cannot be blank"))
    } else {
        Ok(())
    }
}

/// New comment, or a reply when `parent_id` is given
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateComment {
    #[validate(
        length(max = 2000, message = "Comment is too long"),
        custom(function = "validate_not_blank")
    )]
    pub content: String,
    pub parent_id: Option<Uuid>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct UpdateComment {
    #[validate(
        length(max = 2000, message = "Comment is too long"),
        custom(function = "validate_not_blank")
    )]
    pub content: String,
}

/// Like state after a toggle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LikeState {
    pub is_liked: bool,
}
