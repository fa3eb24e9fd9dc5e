//! Events service

use uuid::Uuid;

use crate::{
    config::SearchConfig,
    error::{AppError, AppResult},
    models::{
        event::{
            CategoryStats, CreateEvent, Event, EventCard, EventDate, EventSearchQuery,
            ListingQuery, Paginated, UpdateEvent,
        },
        user::UserClaims,
    },
    repository::Repository,
    search::{self, matcher, DateFilter, FavoriteIndex, PageRequest, SearchRequest},
};

/// Maximum number of related events returned
const RELATED_LIMIT: i64 = 10;

#[derive(Clone)]
pub struct EventsService {
    repository: Repository,
    search: SearchConfig,
}

impl EventsService {
    pub fn new(repository: Repository, search: SearchConfig) -> Self {
        Self { repository, search }
    }

    /// Public search over event dates
    pub async fn search(
        &self,
        query: &EventSearchQuery,
        caller: Option<Uuid>,
    ) -> AppResult<Paginated<EventCard>> {
        let request = SearchRequest::from_query(query)?;
        search::execute(&self.repository, &request, caller, self.search.today()).await
    }

    pub async fn featured(&self, caller: Option<Uuid>) -> AppResult<Paginated<EventCard>> {
        search::featured(&self.repository, caller, self.search.today()).await
    }

    /// Upcoming events whose title or venue contains `text`, soonest first
    pub async fn text_search(
        &self,
        text: Option<&str>,
        page: PageRequest,
        caller: Option<Uuid>,
    ) -> AppResult<Paginated<EventCard>> {
        let request = SearchRequest::text(text, page);
        search::execute(&self.repository, &request, caller, self.search.today()).await
    }

    /// General listing by publication status, newest first
    pub async fn list(
        &self,
        query: &ListingQuery,
        caller: Option<Uuid>,
    ) -> AppResult<Paginated<EventCard>> {
        let filter = query.filter()?;
        let page = PageRequest::from_params(query.page.as_deref(), query.limit.as_deref())?;
        let (events, total) = self.repository.events.list(filter, page).await?;
        let cards = self.overlay(events, caller).await?;
        Ok(Paginated::from_page(cards, total, page))
    }

    /// Active events of a category, newest first
    pub async fn by_category(
        &self,
        category: &str,
        page: PageRequest,
        caller: Option<Uuid>,
    ) -> AppResult<Paginated<EventCard>> {
        let (events, total) = self.repository.events.by_category(category, page).await?;
        let cards = self.overlay(events, caller).await?;
        Ok(Paginated::from_page(cards, total, page))
    }

    /// Mark rows with the caller's favorites
    async fn overlay(&self, events: Vec<Event>, caller: Option<Uuid>) -> AppResult<Vec<EventCard>> {
        let index = match caller {
            Some(user_id) => FavoriteIndex::new(self.repository.favorites.for_user(user_id).await?),
            None => FavoriteIndex::anonymous(),
        };
        Ok(index.apply(events))
    }

    /// Active events of an organizer. Favorites are those of the caller,
    /// not of the organizer being viewed.
    pub async fn list_by_user(
        &self,
        user_id: Uuid,
        page: PageRequest,
        caller: Option<Uuid>,
    ) -> AppResult<Paginated<EventCard>> {
        let (events, total) = self.repository.events.list_by_user(user_id, page).await?;
        let cards = self.overlay(events, caller).await?;
        Ok(Paginated::from_page(cards, total, page))
    }

    pub async fn feed(&self, caller: Uuid, page: PageRequest) -> AppResult<Paginated<EventCard>> {
        let mut authors = self.repository.users.following_ids(caller).await?;
        let (events, total) = if authors.is_empty() {
            self.repository.events.feed(None, page).await?
        } else {
            authors.push(caller);
            self.repository.events.feed(Some(&authors), page).await?
        };
        let cards = self.overlay(events, Some(caller)).await?;
        Ok(Paginated::from_page(cards, total, page))
    }

    pub async fn get_by_id(&self, id: Uuid) -> AppResult<Event> {
        self.repository.events.get_by_id(id).await
    }

    pub async fn dates(&self, id: Uuid) -> AppResult<Vec<EventDate>> {
        if self.repository.events.find(id).await?.is_none() {
            return Err(AppError::NotFound(format!("Event {} not found", id)));
        }
        self.repository.events.dates_of(id).await
    }

    /// Event page reached from a listing row: only upcoming dates are kept
    pub async fn detail_by_date(
        &self,
        event_id: Uuid,
        date_id: Uuid,
        caller: Option<Uuid>,
    ) -> AppResult<EventCard> {
        let event = self.repository.events.get_by_id(event_id).await?;
        if event.dates.is_empty() {
            return Err(AppError::NotFound(format!("Event date {} not found", date_id)));
        }
        let upcoming = matcher::retain_matching(event, &DateFilter::upcoming(self.search.today()));
        let mut cards = self.overlay(vec![upcoming], caller).await?;
        cards
            .pop()
            .ok_or_else(|| AppError::NotFound(format!("Event {} not found", event_id)))
    }

    /// Other active events of the same category
    pub async fn related(&self, event_id: Uuid, exclude_featured: bool) -> AppResult<Vec<Event>> {
        let event = self
            .repository
            .events
            .find(event_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Event {} not found", event_id)))?;
        self.repository
            .events
            .related(&event.category, Some(event_id), exclude_featured, RELATED_LIMIT)
            .await
    }

    pub async fn related_by_category(
        &self,
        category: &str,
        exclude_featured: bool,
    ) -> AppResult<Vec<Event>> {
        self.repository
            .events
            .related(category, None, exclude_featured, RELATED_LIMIT)
            .await
    }

    pub async fn category_stats(&self) -> AppResult<Vec<CategoryStats>> {
        self.repository.events.category_stats().await
    }

    pub async fn my_events(&self, user_id: Uuid) -> AppResult<Vec<Event>> {
        self.repository.events.owned_by(user_id).await
    }

    pub async fn create(&self, claims: &UserClaims, data: &CreateEvent) -> AppResult<Event> {
        claims.require_company()?;
        let event = self.repository.events.create(claims.user_id(), data).await?;
        tracing::info!(event_id = %event.id, user_id = %claims.user_id(), "event created");
        Ok(event)
    }

    pub async fn update(&self, user_id: Uuid, id: Uuid, data: &UpdateEvent) -> AppResult<Event> {
        let existing = self.owned(user_id, id).await?;
        self.repository.events.update(&existing, data).await
    }

    pub async fn toggle_status(&self, user_id: Uuid, id: Uuid) -> AppResult<Event> {
        let existing = self.owned(user_id, id).await?;
        self.repository.events.set_active(id, !existing.is_active).await?;
        self.repository.events.get_by_id(id).await
    }

    pub async fn delete(&self, user_id: Uuid, id: Uuid) -> AppResult<()> {
        self.owned(user_id, id).await?;
        self.repository.events.delete(id).await?;
        tracing::info!(event_id = %id, user_id = %user_id, "event deleted");
        Ok(())
    }

    /// Load an event the caller is allowed to modify
    async fn owned(&self, user_id: Uuid, id: Uuid) -> AppResult<Event> {
        let event = self
            .repository
            .events
            .find(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Event {} not found", id)))?;
        ensure_owner(&event, user_id)?;
        Ok(event)
    }
}

fn ensure_owner(event: &Event, user_id: Uuid) -> AppResult<()> {
    if event.user_id == user_id {
        Ok(())
    } else {
        Err(AppError::Authorization(
            "You can only modify your own events".to_string(),
        ))
    }
}
