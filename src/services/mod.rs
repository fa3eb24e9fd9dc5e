//! Business logic services

pub mod comments;
pub mod complaints;
pub mod email;
pub mod events;
pub mod favorites;
pub mod follows;

use crate::{
    config::{EmailConfig, SearchConfig},
    repository::Repository,
};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub events: events::EventsService,
    pub favorites: favorites::FavoritesService,
    pub comments: comments::CommentsService,
    pub follows: follows::FollowsService,
    pub complaints: complaints::ComplaintsService,
    pub repository: Repository,
}

impl Services {
    /// Create all services with the given repository
    pub fn new(repository: Repository, email_config: EmailConfig, search_config: SearchConfig) -> Self {
        let email = email::EmailService::new(email_config);
        Self {
            events: events::EventsService::new(repository.clone(), search_config.clone()),
            favorites: favorites::FavoritesService::new(repository.clone(), search_config),
            comments: comments::CommentsService::new(repository.clone()),
            follows: follows::FollowsService::new(repository.clone()),
            complaints: complaints::ComplaintsService::new(repository.clone(), email),
            repository,
        }
    }
}
