//! Favorite model (user bookmarks on events or single event dates)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use super::event::{Event, EventDate};

/// Favorite record.
///
/// `event_date_id = None` bookmarks the event as a whole; a favorite on a
/// specific date is an independent record.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Favorite {
    pub id: Uuid,
    pub user_id: Uuid,
    pub event_id: Uuid,
    pub event_date_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

/// Favorite with the bookmarked event, as listed in "my favorites"
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FavoriteDetails {
    #[serde(flatten)]
    pub favorite: Favorite,
    pub event: Event,
    pub event_date: Option<EventDate>,
}

/// Add favorite request
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateFavorite {
    pub event_id: Uuid,
    /// Bookmark only this date of the event
    pub event_date_id: Option<Uuid>,
}
