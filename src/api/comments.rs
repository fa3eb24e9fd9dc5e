//! Event comments API endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    error::AppResult,
    models::{
        comment::{Comment, CommentView, CreateComment, LikeState, UpdateComment},
        event::{CommentPage, PageQuery, Paginated},
    },
    search::PageRequest,
    AppState,
};

use super::{AuthenticatedUser, MaybeUser};

/// Comments of an event with their replies
///
/// Top-level comments newest first, replies oldest first. `isLiked` reflects
/// the caller when a token is sent.
#[utoipa::path(
    get,
    path = "/events/{id}/comments",
    tag = "comments",
    params(("id" = Uuid, Path, description = "Event ID"), PageQuery),
    responses(
        (status = 200, description = "Comments", body = CommentPage),
        (status = 404, description = "Event not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn list_comments(
    State(state): State<AppState>,
    caller: MaybeUser,
    Path(id): Path<Uuid>,
    Query(query): Query<PageQuery>,
) -> AppResult<Json<Paginated<CommentView>>> {
    let page = PageRequest::from_params(query.page.as_deref(), query.limit.as_deref())?;
    let comments = state
        .services
        .comments
        .list(id, page, caller.user_id())
        .await?;
    Ok(Json(comments))
}

/// Comment on an event, or reply with `parentId`
#[utoipa::path(
    post,
    path = "/events/{id}/comments",
    tag = "comments",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Event ID")),
    request_body = CreateComment,
    responses(
        (status = 201, description = "Comment created", body = CommentView),
        (status = 400, description = "Empty comment", body = crate::error::ErrorResponse),
        (status = 404, description = "Event or parent comment not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn add_comment(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(data): Json<CreateComment>,
) -> AppResult<(StatusCode, Json<CommentView>)> {
    data.validate()?;
    let comment = state
        .services
        .comments
        .add(claims.user_id(), id, &data)
        .await?;
    Ok((StatusCode::CREATED, Json(comment)))
}

/// Edit one of my comments
#[utoipa::path(
    patch,
    path = "/events/comments/{comment_id}",
    tag = "comments",
    security(("bearer_auth" = [])),
    params(("comment_id" = Uuid, Path, description = "Comment ID")),
    request_body = UpdateComment,
    responses(
        (status = 200, description = "Comment updated", body = Comment),
        (status = 403, description = "Not the author", body = crate::error::ErrorResponse),
        (status = 404, description = "Comment not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn edit_comment(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(comment_id): Path<Uuid>,
    Json(data): Json<UpdateComment>,
) -> AppResult<Json<Comment>> {
    data.validate()?;
    let comment = state
        .services
        .comments
        .edit(claims.user_id(), comment_id, &data)
        .await?;
    Ok(Json(comment))
}

/// Delete one of my comments, with its replies
#[utoipa::path(
    delete,
    path = "/events/comments/{comment_id}",
    tag = "comments",
    security(("bearer_auth" = [])),
    params(("comment_id" = Uuid, Path, description = "Comment ID")),
    responses(
        (status = 204, description = "Comment deleted"),
        (status = 403, description = "Not the author", body = crate::error::ErrorResponse),
        (status = 404, description = "Comment not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn delete_comment(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(comment_id): Path<Uuid>,
) -> AppResult<StatusCode> {
    state
        .services
        .comments
        .delete(claims.user_id(), comment_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Like a comment, or remove my like
#[utoipa::path(
    post,
    path = "/events/comments/{comment_id}/like",
    tag = "comments",
    security(("bearer_auth" = [])),
    params(("comment_id" = Uuid, Path, description = "Comment ID")),
    responses(
        (status = 200, description = "Like state after the toggle", body = LikeState),
        (status = 404, description = "Comment not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn toggle_comment_like(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(comment_id): Path<Uuid>,
) -> AppResult<Json<LikeState>> {
    let like = state
        .services
        .comments
        .toggle_like(claims.user_id(), comment_id)
        .await?;
    Ok(Json(like))
}
