//! Favorites API endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::{
        event::{FavoritePage, PageQuery, Paginated},
        favorite::{CreateFavorite, Favorite, FavoriteDetails},
    },
    search::PageRequest,
    AppState,
};

use super::AuthenticatedUser;

/// Result of removing an event from favorites
#[derive(Serialize, ToSchema)]
pub struct RemovedFavorites {
    pub removed: u64,
}

/// Add an event, or a single date of it, to favorites
#[utoipa::path(
    post,
    path = "/favorites",
    tag = "favorites",
    security(("bearer_auth" = [])),
    request_body = CreateFavorite,
    responses(
        (status = 201, description = "Favorite created", body = Favorite),
        (status = 404, description = "Event or date not found", body = crate::error::ErrorResponse),
        (status = 409, description = "Already in favorites", body = crate::error::ErrorResponse)
    )
)]
pub async fn add_favorite(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(data): Json<CreateFavorite>,
) -> AppResult<(StatusCode, Json<Favorite>)> {
    let favorite = state.services.favorites.add(claims.user_id(), &data).await?;
    Ok((StatusCode::CREATED, Json(favorite)))
}

/// List my favorites
#[utoipa::path(
    get,
    path = "/favorites",
    tag = "favorites",
    security(("bearer_auth" = [])),
    params(PageQuery),
    responses(
        (status = 200, description = "Favorites with their events", body = FavoritePage)
    )
)]
pub async fn list_favorites(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Query(query): Query<PageQuery>,
) -> AppResult<Json<Paginated<FavoriteDetails>>> {
    let page = PageRequest::from_params(query.page.as_deref(), query.limit.as_deref())?;
    let favorites = state.services.favorites.list(claims.user_id(), page).await?;
    Ok(Json(favorites))
}

/// Remove a favorite
#[utoipa::path(
    delete,
    path = "/favorites/{id}",
    tag = "favorites",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Favorite ID")),
    responses(
        (status = 204, description = "Favorite removed"),
        (status = 404, description = "Favorite not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn remove_favorite(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    state.services.favorites.remove(claims.user_id(), id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Remove every favorite of mine on an event
#[utoipa::path(
    delete,
    path = "/favorites/event/{event_id}",
    tag = "favorites",
    security(("bearer_auth" = [])),
    params(("event_id" = Uuid, Path, description = "Event ID")),
    responses(
        (status = 200, description = "Favorites removed", body = RemovedFavorites),
        (status = 404, description = "No favorites for this event", body = crate::error::ErrorResponse)
    )
)]
pub async fn remove_event_favorites(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(event_id): Path<Uuid>,
) -> AppResult<Json<RemovedFavorites>> {
    let removed = state
        .services
        .favorites
        .remove_for_event(claims.user_id(), event_id)
        .await?;
    Ok(Json(RemovedFavorites { removed }))
}
