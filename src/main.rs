//! Injoyplan Server - events platform REST API

use axum::{
    routing::{delete, get, patch, post},
    Router,
};
use sqlx::postgres::PgPoolOptions;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use injoyplan_server::{
    api,
    config::AppConfig,
    repository::Repository,
    services::Services,
    AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    let config = AppConfig::load()?;

    // Initialize tracing
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!("injoyplan_server={},tower_http=debug", config.logging.level).into()
    });

    let registry = tracing_subscriber::registry().with(filter);
    if config.logging.format == "json" {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }

    tracing::info!("Starting Injoyplan Server v{}", env!("CARGO_PKG_VERSION"));

    // Create database connection pool
    let pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .min_connections(config.database.min_connections)
        .connect(&config.database.url)
        .await?;

    tracing::info!("Connected to database");

    sqlx::migrate!("./migrations").run(&pool).await?;

    tracing::info!("Database migrations completed");

    let addr = SocketAddr::new(config.server.host.parse()?, config.server.port);

    let repository = Repository::new(pool);
    let services = Services::new(repository, config.email.clone(), config.search.clone());

    let state = AppState {
        config: Arc::new(config),
        services: Arc::new(services),
    };

    let app = create_router(state);

    tracing::info!("Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Create the application router with all routes
fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // API v1 routes
    let api_v1 = Router::new()
        // Health check
        .route("/health", get(api::health::health_check))
        .route("/ready", get(api::health::readiness_check))
        // Events
        .route(
            "/events",
            get(api::events::list_events).post(api::events::create_event),
        )
        .route("/events/search", get(api::events::text_search_events))
        .route("/events/category/:category", get(api::events::events_by_category))
        .route("/events/public/search", get(api::events::search_events))
        .route("/events/featured", get(api::events::featured_events))
        .route("/events/feed", get(api::events::feed))
        .route("/events/my", get(api::events::my_events))
        .route("/events/stats/by-category", get(api::events::stats_by_category))
        .route("/events/user/:user_id", get(api::events::list_user_events))
        .route(
            "/events/detail/:event_id/:date_id",
            get(api::events::get_event_detail_by_date),
        )
        .route("/events/related/:event_id", get(api::events::related_events))
        .route(
            "/events/related/category/:category",
            get(api::events::related_by_category),
        )
        .route(
            "/events/:id",
            get(api::events::get_event)
                .patch(api::events::update_event)
                .delete(api::events::delete_event),
        )
        .route("/events/:id/dates", get(api::events::get_event_dates))
        .route("/events/:id/toggle-status", patch(api::events::toggle_event_status))
        // Comments
        .route(
            "/events/:id/comments",
            get(api::comments::list_comments).post(api::comments::add_comment),
        )
        .route(
            "/events/comments/:comment_id",
            patch(api::comments::edit_comment).delete(api::comments::delete_comment),
        )
        .route(
            "/events/comments/:comment_id/like",
            post(api::comments::toggle_comment_like),
        )
        // Favorites
        .route(
            "/favorites",
            get(api::favorites::list_favorites).post(api::favorites::add_favorite),
        )
        .route(
            "/favorites/event/:event_id",
            delete(api::favorites::remove_event_favorites),
        )
        .route("/favorites/:id", delete(api::favorites::remove_favorite))
        // Follows
        .route(
            "/users/:id/follow",
            post(api::users::follow_user).delete(api::users::unfollow_user),
        )
        .route("/users/:id/followers", get(api::users::list_followers))
        .route("/users/:id/following", get(api::users::list_following))
        // Complaints
        .route("/complaints", post(api::complaints::create_complaint))
        .with_state(state);

    // OpenAPI documentation
    let openapi = api::openapi::create_openapi_router();

    Router::new()
        .nest("/api/v1", api_v1)
        .merge(openapi)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}
