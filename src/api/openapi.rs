//! OpenAPI documentation

use axum::Router;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{comments, complaints, events, favorites, health, users};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Injoyplan API",
        version = "1.0.0",
        description = "Events discovery platform REST API",
        license(name = "AGPL-3.0", url = "https://www.gnu.org/licenses/agpl-3.0.html")
    ),
    servers(
        (url = "/api/v1", description = "API v1")
    ),
    paths(
        // Health
        health::health_check,
        health::readiness_check,
        // Events
        events::list_events,
        events::text_search_events,
        events::events_by_category,
        events::search_events,
        events::featured_events,
        events::list_user_events,
        events::feed,
        events::my_events,
        events::get_event,
        events::get_event_dates,
        events::get_event_detail_by_date,
        events::related_events,
        events::related_by_category,
        events::stats_by_category,
        events::create_event,
        events::update_event,
        events::toggle_event_status,
        events::delete_event,
        // Comments
        comments::list_comments,
        comments::add_comment,
        comments::edit_comment,
        comments::delete_comment,
        comments::toggle_comment_like,
        // Follows
        users::follow_user,
        users::unfollow_user,
        users::list_followers,
        users::list_following,
        // Favorites
        favorites::add_favorite,
        favorites::list_favorites,
        favorites::remove_favorite,
        favorites::remove_event_favorites,
        // Complaints
        complaints::create_complaint,
    ),
    components(
        schemas(
            // Events
            crate::models::event::Event,
            crate::models::event::EventDate,
            crate::models::event::Location,
            crate::models::event::TicketUrl,
            crate::models::event::EventCard,
            crate::models::event::EventCardPage,
            crate::models::event::CategoryStats,
            crate::models::event::CreateEvent,
            crate::models::event::CreateEventDate,
            crate::models::event::UpdateEvent,
            crate::models::user::Organizer,
            crate::models::user::UserType,
            // Comments
            crate::models::comment::Comment,
            crate::models::comment::CommentView,
            crate::models::comment::CreateComment,
            crate::models::comment::UpdateComment,
            crate::models::comment::LikeState,
            crate::models::event::CommentPage,
            // Follows
            crate::models::user::Follow,
            crate::models::event::UserPage,
            // Favorites
            crate::models::favorite::Favorite,
            crate::models::favorite::FavoriteDetails,
            crate::models::favorite::CreateFavorite,
            crate::models::event::FavoritePage,
            favorites::RemovedFavorites,
            // Complaints
            crate::models::complaint::Complaint,
            crate::models::complaint::CreateComplaint,
            crate::models::complaint::ComplaintReceipt,
            // Health
            health::HealthResponse,
            // Errors
            crate::error::ErrorResponse,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "events", description = "Event search and publishing"),
        (name = "comments", description = "Event comments and likes"),
        (name = "users", description = "Follow graph"),
        (name = "favorites", description = "User favorites"),
        (name = "complaints", description = "Consumer complaints book")
    )
)]
pub struct ApiDoc;

/// Create the OpenAPI documentation router
pub fn create_openapi_router() -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
