//! Follow graph API endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::{
        event::{PageQuery, Paginated, UserPage},
        user::{Follow, Organizer},
    },
    search::PageRequest,
    AppState,
};

use super::AuthenticatedUser;

/// Follow a user; their events then show up in my feed
#[utoipa::path(
    post,
    path = "/users/{id}/follow",
    tag = "users",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "User to follow")),
    responses(
        (status = 201, description = "Now following", body = Follow),
        (status = 400, description = "Cannot follow yourself", body = crate::error::ErrorResponse),
        (status = 404, description = "User not found", body = crate::error::ErrorResponse),
        (status = 409, description = "Already following", body = crate::error::ErrorResponse)
    )
)]
pub async fn follow_user(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> AppResult<(StatusCode, Json<Follow>)> {
    let follow = state.services.follows.follow(claims.user_id(), id).await?;
    Ok((StatusCode::CREATED, Json(follow)))
}

/// Stop following a user
#[utoipa::path(
    delete,
    path = "/users/{id}/follow",
    tag = "users",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "User to unfollow")),
    responses(
        (status = 204, description = "No longer following"),
        (status = 404, description = "Not following this user", body = crate::error::ErrorResponse)
    )
)]
pub async fn unfollow_user(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    state.services.follows.unfollow(claims.user_id(), id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Users following a user
#[utoipa::path(
    get,
    path = "/users/{id}/followers",
    tag = "users",
    params(("id" = Uuid, Path, description = "User ID"), PageQuery),
    responses(
        (status = 200, description = "Followers, most recent first", body = UserPage)
    )
)]
pub async fn list_followers(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(query): Query<PageQuery>,
) -> AppResult<Json<Paginated<Organizer>>> {
    let page = PageRequest::from_params(query.page.as_deref(), query.limit.as_deref())?;
    let users = state.services.follows.followers(id, page).await?;
    Ok(Json(users))
}

/// Users a user follows
#[utoipa::path(
    get,
    path = "/users/{id}/following",
    tag = "users",
    params(("id" = Uuid, Path, description = "User ID"), PageQuery),
    responses(
        (status = 200, description = "Followed users, most recent first", body = UserPage)
    )
)]
pub async fn list_following(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(query): Query<PageQuery>,
) -> AppResult<Json<Paginated<Organizer>>> {
    let page = PageRequest::from_params(query.page.as_deref(), query.limit.as_deref())?;
    let users = state.services.follows.following(id, page).await?;
    Ok(Json(users))
}
