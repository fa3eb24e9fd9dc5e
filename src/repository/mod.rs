//! Repository layer for database operations

pub mod comments;
pub mod complaints;
pub mod events;
pub mod favorites;
pub mod users;

use async_trait::async_trait;
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::{
        comment::Comment,
        event::Event,
        favorite::Favorite,
        user::{Follow, Organizer},
    },
    search::{CandidateSource, CoarseFilter, PageRequest},
    services::{comments::CommentStore, favorites::FavoriteStore, follows::FollowStore},
};

/// Main repository struct holding database connection pool
#[derive(Clone)]
pub struct Repository {
    pub pool: Pool<Postgres>,
    pub events: events::EventsRepository,
    pub favorites: favorites::FavoritesRepository,
    pub comments: comments::CommentsRepository,
    pub users: users::UsersRepository,
    pub complaints: complaints::ComplaintsRepository,
}

impl Repository {
    /// Create a new repository with the given database pool
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self {
            events: events::EventsRepository::new(pool.clone()),
            favorites: favorites::FavoritesRepository::new(pool.clone()),
            comments: comments::CommentsRepository::new(pool.clone()),
            users: users::UsersRepository::new(pool.clone()),
            complaints: complaints::ComplaintsRepository::new(pool.clone()),
            pool,
        }
    }

    /// Round-trip to the database, used by the readiness check
    pub async fn ping(&self) -> AppResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

#[async_trait]
impl CandidateSource for Repository {
    async fn candidates(&self, filter: &CoarseFilter) -> AppResult<Vec<Event>> {
        self.events.candidates(filter).await
    }

    async fn favorites_of(&self, user_id: Uuid) -> AppResult<Vec<Favorite>> {
        self.favorites.for_user(user_id).await
    }
}

#[async_trait]
impl FavoriteStore for Repository {
    async fn event_exists(&self, event_id: Uuid) -> AppResult<bool> {
        Ok(self.events.find(event_id).await?.is_some())
    }

    async fn date_belongs_to(&self, event_id: Uuid, date_id: Uuid) -> AppResult<bool> {
        Ok(self.events.date_of(event_id, date_id).await?.is_some())
    }

    async fn favorite_exists(
        &self,
        user_id: Uuid,
        event_id: Uuid,
        event_date_id: Option<Uuid>,
    ) -> AppResult<bool> {
        self.favorites.exists(user_id, event_id, event_date_id).await
    }

    async fn insert_favorite(
        &self,
        user_id: Uuid,
        event_id: Uuid,
        event_date_id: Option<Uuid>,
    ) -> AppResult<Favorite> {
        self.favorites.create(user_id, event_id, event_date_id).await
    }
}

#[async_trait]
impl CommentStore for Repository {
    async fn event_exists(&self, event_id: Uuid) -> AppResult<bool> {
        Ok(self.events.find(event_id).await?.is_some())
    }

    async fn find_comment(&self, id: Uuid) -> AppResult<Option<Comment>> {
        self.comments.find(id).await
    }

    async fn top_level(&self, event_id: Uuid, page: PageRequest) -> AppResult<(Vec<Comment>, i64)> {
        self.comments.top_level(event_id, page).await
    }

    async fn replies_to(&self, parent_ids: &[Uuid]) -> AppResult<Vec<Comment>> {
        self.comments.replies_to(parent_ids).await
    }

    async fn authors(&self, user_ids: &[Uuid]) -> AppResult<Vec<Organizer>> {
        self.users.public_many(user_ids).await
    }

    async fn like_counts(&self, comment_ids: &[Uuid]) -> AppResult<Vec<(Uuid, i64)>> {
        self.comments.like_counts(comment_ids).await
    }

    async fn liked_by(&self, user_id: Uuid, comment_ids: &[Uuid]) -> AppResult<Vec<Uuid>> {
        self.comments.liked_by(user_id, comment_ids).await
    }

    async fn insert_comment(
        &self,
        user_id: Uuid,
        event_id: Uuid,
        parent_id: Option<Uuid>,
        content: &str,
    ) -> AppResult<Comment> {
        self.comments.create(user_id, event_id, parent_id, content).await
    }

    async fn update_content(&self, id: Uuid, content: &str) -> AppResult<Comment> {
        self.comments.update_content(id, content).await
    }

    async fn delete_comment(&self, id: Uuid) -> AppResult<()> {
        self.comments.delete(id).await
    }

    async fn toggle_like(&self, user_id: Uuid, comment_id: Uuid) -> AppResult<bool> {
        self.comments.toggle_like(user_id, comment_id).await
    }
}

#[async_trait]
impl FollowStore for Repository {
    async fn user_exists(&self, user_id: Uuid) -> AppResult<bool> {
        self.users.exists(user_id).await
    }

    async fn is_following(&self, follower_id: Uuid, following_id: Uuid) -> AppResult<bool> {
        self.users.is_following(follower_id, following_id).await
    }

    async fn insert_follow(&self, follower_id: Uuid, following_id: Uuid) -> AppResult<Follow> {
        self.users.follow(follower_id, following_id).await
    }

    async fn delete_follow(&self, follower_id: Uuid, following_id: Uuid) -> AppResult<bool> {
        self.users.unfollow(follower_id, following_id).await
    }
}
