//! Follow graph between users

use async_trait::async_trait;
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{
        event::Paginated,
        user::{Follow, Organizer},
    },
    repository::Repository,
    search::PageRequest,
};

/// Storage behind follows
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait FollowStore: Send + Sync {
    async fn user_exists(&self, user_id: Uuid) -> AppResult<bool>;

    async fn is_following(&self, follower_id: Uuid, following_id: Uuid) -> AppResult<bool>;

    /// Insert, reporting a lost uniqueness race as `Conflict`
    async fn insert_follow(&self, follower_id: Uuid, following_id: Uuid) -> AppResult<Follow>;

    /// Returns false when there was nothing to remove
    async fn delete_follow(&self, follower_id: Uuid, following_id: Uuid) -> AppResult<bool>;
}

pub async fn follow<S>(store: &S, follower_id: Uuid, following_id: Uuid) -> AppResult<Follow>
where
    S: FollowStore + ?Sized,
{
    if follower_id == following_id {
        return Err(AppError::Validation("You cannot follow yourself".to_string()));
    }
    if !store.user_exists(following_id).await? {
        return Err(AppError::NotFound(format!("User {} not found", following_id)));
    }
    if store.is_following(follower_id, following_id).await? {
        return Err(AppError::Conflict("Already following this user".to_string()));
    }
    store.insert_follow(follower_id, following_id).await
}

pub async fn unfollow<S>(store: &S, follower_id: Uuid, following_id: Uuid) -> AppResult<()>
where
    S: FollowStore + ?Sized,
{
    if !store.delete_follow(follower_id, following_id).await? {
        return Err(AppError::NotFound(format!(
            "Not following user {}",
            following_id
        )));
    }
    Ok(())
}

#[derive(Clone)]
pub struct FollowsService {
    repository: Repository,
}

impl FollowsService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    pub async fn follow(&self, follower_id: Uuid, following_id: Uuid) -> AppResult<Follow> {
        let follow = follow(&self.repository, follower_id, following_id).await?;
        tracing::debug!(follower_id = %follower_id, following_id = %following_id, "user followed");
        Ok(follow)
    }

    pub async fn unfollow(&self, follower_id: Uuid, following_id: Uuid) -> AppResult<()> {
        unfollow(&self.repository, follower_id, following_id).await
    }

    pub async fn followers(&self, user_id: Uuid, page: PageRequest) -> AppResult<Paginated<Organizer>> {
        let (users, total) = self.repository.users.followers(user_id, page).await?;
        Ok(Paginated::from_page(users, total, page))
    }

    pub async fn following(&self, user_id: Uuid, page: PageRequest) -> AppResult<Paginated<Organizer>> {
        let (users, total) = self.repository.users.following(user_id, page).await?;
        Ok(Paginated::from_page(users, total, page))
    }
}
