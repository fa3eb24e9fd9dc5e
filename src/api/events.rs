//! Events API endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    error::AppResult,
    models::event::{
        CategoryStats, CreateEvent, Event, EventCard, EventCardPage, EventDate, EventSearchQuery,
        ListingQuery, PageQuery, Paginated, RelatedQuery, TextSearchQuery, UpdateEvent,
    },
    search::{filter::parse_flag, PageRequest},
    AppState,
};

use super::{AuthenticatedUser, MaybeUser};

fn page_of(query: &PageQuery) -> AppResult<PageRequest> {
    PageRequest::from_params(query.page.as_deref(), query.limit.as_deref())
}

fn exclude_featured(query: &RelatedQuery) -> AppResult<bool> {
    Ok(parse_flag("excludeFeatured", query.exclude_featured.as_deref())?.unwrap_or(false))
}

/// Search upcoming event dates
///
/// Rows are event dates (or events with `expandDates=false`) sorted by the
/// next matching date. `favorite` holds the caller's favorite id, or `false`.
#[utoipa::path(
    get,
    path = "/events/public/search",
    tag = "events",
    params(EventSearchQuery),
    responses(
        (status = 200, description = "Matching events", body = EventCardPage),
        (status = 400, description = "Invalid parameter", body = crate::error::ErrorResponse)
    )
)]
pub async fn search_events(
    State(state): State<AppState>,
    caller: MaybeUser,
    Query(query): Query<EventSearchQuery>,
) -> AppResult<Json<Paginated<EventCard>>> {
    let page = state.services.events.search(&query, caller.user_id()).await?;
    Ok(Json(page))
}

/// List events by publication status, newest first
#[utoipa::path(
    get,
    path = "/events",
    tag = "events",
    params(ListingQuery),
    responses(
        (status = 200, description = "Events", body = EventCardPage),
        (status = 400, description = "Invalid parameter", body = crate::error::ErrorResponse)
    )
)]
pub async fn list_events(
    State(state): State<AppState>,
    caller: MaybeUser,
    Query(query): Query<ListingQuery>,
) -> AppResult<Json<Paginated<EventCard>>> {
    let page = state.services.events.list(&query, caller.user_id()).await?;
    Ok(Json(page))
}

/// Search upcoming events by title or venue name
#[utoipa::path(
    get,
    path = "/events/search",
    tag = "events",
    params(TextSearchQuery),
    responses(
        (status = 200, description = "Matching events, soonest first", body = EventCardPage),
        (status = 400, description = "Invalid parameter", body = crate::error::ErrorResponse)
    )
)]
pub async fn text_search_events(
    State(state): State<AppState>,
    caller: MaybeUser,
    Query(query): Query<TextSearchQuery>,
) -> AppResult<Json<Paginated<EventCard>>> {
    let page = PageRequest::from_params(query.page.as_deref(), query.limit.as_deref())?;
    let results = state
        .services
        .events
        .text_search(query.q.as_deref(), page, caller.user_id())
        .await?;
    Ok(Json(results))
}

/// Active events of a category, newest first
#[utoipa::path(
    get,
    path = "/events/category/{category}",
    tag = "events",
    params(("category" = String, Path, description = "Category name"), PageQuery),
    responses(
        (status = 200, description = "Events of the category", body = EventCardPage)
    )
)]
pub async fn events_by_category(
    State(state): State<AppState>,
    caller: MaybeUser,
    Path(category): Path<String>,
    Query(query): Query<PageQuery>,
) -> AppResult<Json<Paginated<EventCard>>> {
    let page = state
        .services
        .events
        .by_category(&category, page_of(&query)?, caller.user_id())
        .await?;
    Ok(Json(page))
}

/// Featured events with upcoming dates
#[utoipa::path(
    get,
    path = "/events/featured",
    tag = "events",
    responses(
        (status = 200, description = "Featured events", body = EventCardPage)
    )
)]
pub async fn featured_events(
    State(state): State<AppState>,
    caller: MaybeUser,
) -> AppResult<Json<Paginated<EventCard>>> {
    let page = state.services.events.featured(caller.user_id()).await?;
    Ok(Json(page))
}

/// Active events published by an organizer
#[utoipa::path(
    get,
    path = "/events/user/{user_id}",
    tag = "events",
    params(("user_id" = Uuid, Path, description = "Organizer ID"), PageQuery),
    responses(
        (status = 200, description = "Organizer events", body = EventCardPage)
    )
)]
pub async fn list_user_events(
    State(state): State<AppState>,
    caller: MaybeUser,
    Path(user_id): Path<Uuid>,
    Query(query): Query<PageQuery>,
) -> AppResult<Json<Paginated<EventCard>>> {
    let page = state
        .services
        .events
        .list_by_user(user_id, page_of(&query)?, caller.user_id())
        .await?;
    Ok(Json(page))
}

/// Personalized feed
#[utoipa::path(
    get,
    path = "/events/feed",
    tag = "events",
    security(("bearer_auth" = [])),
    params(PageQuery),
    responses(
        (status = 200, description = "Feed", body = EventCardPage)
    )
)]
pub async fn feed(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Query(query): Query<PageQuery>,
) -> AppResult<Json<Paginated<EventCard>>> {
    let page = state
        .services
        .events
        .feed(claims.user_id(), page_of(&query)?)
        .await?;
    Ok(Json(page))
}

/// Events of the authenticated organizer, any status
#[utoipa::path(
    get,
    path = "/events/my",
    tag = "events",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Own events", body = Vec<Event>)
    )
)]
pub async fn my_events(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<Vec<Event>>> {
    let events = state.services.events.my_events(claims.user_id()).await?;
    Ok(Json(events))
}

/// Get event by ID
#[utoipa::path(
    get,
    path = "/events/{id}",
    tag = "events",
    params(("id" = Uuid, Path, description = "Event ID")),
    responses(
        (status = 200, description = "Event details", body = Event),
        (status = 404, description = "Event not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_event(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Event>> {
    let event = state.services.events.get_by_id(id).await?;
    Ok(Json(event))
}

/// Dates of an event
#[utoipa::path(
    get,
    path = "/events/{id}/dates",
    tag = "events",
    params(("id" = Uuid, Path, description = "Event ID")),
    responses(
        (status = 200, description = "Event dates", body = Vec<EventDate>)
    )
)]
pub async fn get_event_dates(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Vec<EventDate>>> {
    let dates = state.services.events.dates(id).await?;
    Ok(Json(dates))
}

/// Event detail opened from a listing row, upcoming dates only
#[utoipa::path(
    get,
    path = "/events/detail/{event_id}/{date_id}",
    tag = "events",
    params(
        ("event_id" = Uuid, Path, description = "Event ID"),
        ("date_id" = Uuid, Path, description = "Event date ID")
    ),
    responses(
        (status = 200, description = "Event details", body = EventCard),
        (status = 404, description = "Event or date not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_event_detail_by_date(
    State(state): State<AppState>,
    caller: MaybeUser,
    Path((event_id, date_id)): Path<(Uuid, Uuid)>,
) -> AppResult<Json<EventCard>> {
    let card = state
        .services
        .events
        .detail_by_date(event_id, date_id, caller.user_id())
        .await?;
    Ok(Json(card))
}

/// Events of the same category
#[utoipa::path(
    get,
    path = "/events/related/{event_id}",
    tag = "events",
    params(("event_id" = Uuid, Path, description = "Event ID"), RelatedQuery),
    responses(
        (status = 200, description = "Related events", body = Vec<Event>)
    )
)]
pub async fn related_events(
    State(state): State<AppState>,
    Path(event_id): Path<Uuid>,
    Query(query): Query<RelatedQuery>,
) -> AppResult<Json<Vec<Event>>> {
    let events = state
        .services
        .events
        .related(event_id, exclude_featured(&query)?)
        .await?;
    Ok(Json(events))
}

/// Events of a category
#[utoipa::path(
    get,
    path = "/events/related/category/{category}",
    tag = "events",
    params(("category" = String, Path, description = "Category name"), RelatedQuery),
    responses(
        (status = 200, description = "Events of the category", body = Vec<Event>)
    )
)]
pub async fn related_by_category(
    State(state): State<AppState>,
    Path(category): Path<String>,
    Query(query): Query<RelatedQuery>,
) -> AppResult<Json<Vec<Event>>> {
    let events = state
        .services
        .events
        .related_by_category(&category, exclude_featured(&query)?)
        .await?;
    Ok(Json(events))
}

/// Active categories with their event counts
#[utoipa::path(
    get,
    path = "/events/stats/by-category",
    tag = "events",
    responses(
        (status = 200, description = "Category counters", body = Vec<CategoryStats>)
    )
)]
pub async fn stats_by_category(
    State(state): State<AppState>,
) -> AppResult<Json<Vec<CategoryStats>>> {
    let stats = state.services.events.category_stats().await?;
    Ok(Json(stats))
}

/// Create an event (company accounts only)
#[utoipa::path(
    post,
    path = "/events",
    tag = "events",
    security(("bearer_auth" = [])),
    request_body = CreateEvent,
    responses(
        (status = 201, description = "Event created", body = Event),
        (status = 403, description = "Not a company account", body = crate::error::ErrorResponse)
    )
)]
pub async fn create_event(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(data): Json<CreateEvent>,
) -> AppResult<(StatusCode, Json<Event>)> {
    data.validate()?;
    let event = state.services.events.create(&claims, &data).await?;
    Ok((StatusCode::CREATED, Json(event)))
}

/// Update an event
#[utoipa::path(
    patch,
    path = "/events/{id}",
    tag = "events",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Event ID")),
    request_body = UpdateEvent,
    responses(
        (status = 200, description = "Event updated", body = Event),
        (status = 403, description = "Not the owner", body = crate::error::ErrorResponse)
    )
)]
pub async fn update_event(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(data): Json<UpdateEvent>,
) -> AppResult<Json<Event>> {
    data.validate()?;
    let event = state
        .services
        .events
        .update(claims.user_id(), id, &data)
        .await?;
    Ok(Json(event))
}

/// Publish or unpublish an event
#[utoipa::path(
    patch,
    path = "/events/{id}/toggle-status",
    tag = "events",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Event ID")),
    responses(
        (status = 200, description = "Event with its new status", body = Event)
    )
)]
pub async fn toggle_event_status(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Event>> {
    let event = state
        .services
        .events
        .toggle_status(claims.user_id(), id)
        .await?;
    Ok(Json(event))
}

/// Delete an event
#[utoipa::path(
    delete,
    path = "/events/{id}",
    tag = "events",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Event ID")),
    responses(
        (status = 204, description = "Event deleted")
    )
)]
pub async fn delete_event(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    state.services.events.delete(claims.user_id(), id).await?;
    Ok(StatusCode::NO_CONTENT)
}
