//! Event comments service

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{
        comment::{Comment, CommentView, CreateComment, LikeState, UpdateComment},
        event::Paginated,
        user::Organizer,
    },
    repository::Repository,
    search::PageRequest,
};

/// Storage behind event comments
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CommentStore: Send + Sync {
    async fn event_exists(&self, event_id: Uuid) -> AppResult<bool>;

    async fn find_comment(&self, id: Uuid) -> AppResult<Option<Comment>>;

    /// Top-level comments, newest first, with their total
    async fn top_level(&self, event_id: Uuid, page: PageRequest) -> AppResult<(Vec<Comment>, i64)>;

    /// Replies to the given comments, oldest first
    async fn replies_to(&self, parent_ids: &[Uuid]) -> AppResult<Vec<Comment>>;

    async fn authors(&self, user_ids: &[Uuid]) -> AppResult<Vec<Organizer>>;

    async fn like_counts(&self, comment_ids: &[Uuid]) -> AppResult<Vec<(Uuid, i64)>>;

    async fn liked_by(&self, user_id: Uuid, comment_ids: &[Uuid]) -> AppResult<Vec<Uuid>>;

    async fn insert_comment(
        &self,
        user_id: Uuid,
        event_id: Uuid,
        parent_id: Option<Uuid>,
        content: &str,
    ) -> AppResult<Comment>;

    async fn update_content(&self, id: Uuid, content: &str) -> AppResult<Comment>;

    async fn delete_comment(&self, id: Uuid) -> AppResult<()>;

    /// Returns whether the comment is liked after the flip
    async fn toggle_like(&self, user_id: Uuid, comment_id: Uuid) -> AppResult<bool>;
}

/// Counters and lookups used to render comments
#[derive(Debug, Default)]
pub struct CommentContext {
    pub authors: HashMap<Uuid, Organizer>,
    pub likes: HashMap<Uuid, i64>,
    /// Comments liked by the requesting user
    pub liked: HashSet<Uuid>,
}

impl CommentContext {
    fn view(&self, comment: Comment, replies: Vec<CommentView>) -> CommentView {
        CommentView {
            user: self.authors.get(&comment.user_id).cloned(),
            likes_count: self.likes.get(&comment.id).copied().unwrap_or(0),
            is_liked: self.liked.contains(&comment.id),
            replies_count: replies.len() as i64,
            replies,
            comment,
        }
    }
}

/// Attach replies to their top-level comment, keeping both orders as given
pub fn assemble(top: Vec<Comment>, replies: Vec<Comment>, ctx: &CommentContext) -> Vec<CommentView> {
    let mut by_parent: HashMap<Uuid, Vec<CommentView>> = HashMap::new();
    for reply in replies {
        if let Some(parent_id) = reply.parent_id {
            by_parent
                .entry(parent_id)
                .or_default()
                .push(ctx.view(reply, Vec::new()));
        }
    }

    top.into_iter()
        .map(|comment| {
            let replies = by_parent.remove(&comment.id).unwrap_or_default();
            ctx.view(comment, replies)
        })
        .collect()
}

/// One page of an event's comments with replies, like counters and the
/// caller's likes
pub async fn list_comments<S>(
    store: &S,
    event_id: Uuid,
    page: PageRequest,
    caller: Option<Uuid>,
) -> AppResult<Paginated<CommentView>>
where
    S: CommentStore + ?Sized,
{
    if !store.event_exists(event_id).await? {
        return Err(AppError::NotFound(format!("Event {} not found", event_id)));
    }

    let (top, total) = store.top_level(event_id, page).await?;
    let top_ids: Vec<Uuid> = top.iter().map(|c| c.id).collect();
    let replies = store.replies_to(&top_ids).await?;

    let comment_ids: Vec<Uuid> = top.iter().chain(&replies).map(|c| c.id).collect();
    let mut author_ids: Vec<Uuid> = top.iter().chain(&replies).map(|c| c.user_id).collect();
    author_ids.sort_unstable();
    author_ids.dedup();

    let liked = match caller {
        Some(user_id) => store.liked_by(user_id, &comment_ids).await?,
        None => Vec::new(),
    };
    let ctx = CommentContext {
        authors: store
            .authors(&author_ids)
            .await?
            .into_iter()
            .map(|a| (a.id, a))
            .collect(),
        likes: store.like_counts(&comment_ids).await?.into_iter().collect(),
        liked: liked.into_iter().collect(),
    };

    Ok(Paginated::from_page(assemble(top, replies, &ctx), total, page))
}

/// Comment on an event, or reply to one of its comments. A reply to a reply
/// is attached to the top-level comment of that thread.
pub async fn add_comment<S>(
    store: &S,
    user_id: Uuid,
    event_id: Uuid,
    data: &CreateComment,
) -> AppResult<CommentView>
where
    S: CommentStore + ?Sized,
{
    if !store.event_exists(event_id).await? {
        return Err(AppError::NotFound(format!("Event {} not found", event_id)));
    }

    let parent_id = match data.parent_id {
        Some(parent_id) => {
            let parent = store
                .find_comment(parent_id)
                .await?
                .filter(|p| p.event_id == event_id)
                .ok_or_else(|| AppError::NotFound(format!("Comment {} not found", parent_id)))?;
            Some(parent.parent_id.unwrap_or(parent.id))
        }
        None => None,
    };

    let comment = store
        .insert_comment(user_id, event_id, parent_id, data.content.trim())
        .await?;
    let authors = store.authors(&[user_id]).await?;
    let ctx = CommentContext {
        authors: authors.into_iter().map(|a| (a.id, a)).collect(),
        ..Default::default()
    };
    Ok(ctx.view(comment, Vec::new()))
}

/// Load a comment the caller wrote
async fn authored<S>(store: &S, user_id: Uuid, comment_id: Uuid) -> AppResult<Comment>
where
    S: CommentStore + ?Sized,
{
    let comment = store
        .find_comment(comment_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Comment {} not found", comment_id)))?;
    if comment.user_id != user_id {
        return Err(AppError::Authorization(
            "You can only change your own comments".to_string(),
        ));
    }
    Ok(comment)
}

pub async fn edit_comment<S>(
    store: &S,
    user_id: Uuid,
    comment_id: Uuid,
    data: &UpdateComment,
) -> AppResult<Comment>
where
    S: CommentStore + ?Sized,
{
    authored(store, user_id, comment_id).await?;
    store.update_content(comment_id, data.content.trim()).await
}

pub async fn delete_comment<S>(store: &S, user_id: Uuid, comment_id: Uuid) -> AppResult<()>
where
    S: CommentStore + ?Sized,
{
    authored(store, user_id, comment_id).await?;
    store.delete_comment(comment_id).await
}

pub async fn toggle_like<S>(store: &S, user_id: Uuid, comment_id: Uuid) -> AppResult<LikeState>
where
    S: CommentStore + ?Sized,
{
    if store.find_comment(comment_id).await?.is_none() {
        return Err(AppError::NotFound(format!("Comment {} not found", comment_id)));
    }
    let is_liked = store.toggle_like(user_id, comment_id).await?;
    Ok(LikeState { is_liked })
}

#[derive(Clone)]
pub struct CommentsService {
    repository: Repository,
}

impl CommentsService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    pub async fn list(
        &self,
        event_id: Uuid,
        page: PageRequest,
        caller: Option<Uuid>,
    ) -> AppResult<Paginated<CommentView>> {
        list_comments(&self.repository, event_id, page, caller).await
    }

    pub async fn add(
        &self,
        user_id: Uuid,
        event_id: Uuid,
        data: &CreateComment,
    ) -> AppResult<CommentView> {
        let view = add_comment(&self.repository, user_id, event_id, data).await?;
        tracing::debug!(comment_id = %view.comment.id, event_id = %event_id, "comment added");
        Ok(view)
    }

    pub async fn edit(
        &self,
        user_id: Uuid,
        comment_id: Uuid,
        data: &UpdateComment,
    ) -> AppResult<Comment> {
        edit_comment(&self.repository, user_id, comment_id, data).await
    }

    pub async fn delete(&self, user_id: Uuid, comment_id: Uuid) -> AppResult<()> {
        delete_comment(&self.repository, user_id, comment_id).await?;
        tracing::info!(comment_id = %comment_id, user_id = %user_id, "comment deleted");
        Ok(())
    }

    pub async fn toggle_like(&self, user_id: Uuid, comment_id: Uuid) -> AppResult<LikeState> {
        toggle_like(&self.repository, user_id, comment_id).await
    }
}
