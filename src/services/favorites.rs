//! Favorites service

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::NaiveDate;
use uuid::Uuid;

use crate::{
    config::SearchConfig,
    error::{AppError, AppResult},
    models::{
        event::{Event, EventDate, Paginated},
        favorite::{CreateFavorite, Favorite, FavoriteDetails},
    },
    repository::Repository,
    search::PageRequest,
};

/// Lookups and the insert behind adding a favorite
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait FavoriteStore: Send + Sync {
    async fn event_exists(&self, event_id: Uuid) -> AppResult<bool>;

    /// Whether `date_id` is one of the dates of `event_id`
    async fn date_belongs_to(&self, event_id: Uuid, date_id: Uuid) -> AppResult<bool>;

    /// Exact (user, event, date) match; `None` only matches the whole-event favorite
    async fn favorite_exists(
        &self,
        user_id: Uuid,
        event_id: Uuid,
        event_date_id: Option<Uuid>,
    ) -> AppResult<bool>;

    /// Insert, reporting a lost uniqueness race as `Conflict`
    async fn insert_favorite(
        &self,
        user_id: Uuid,
        event_id: Uuid,
        event_date_id: Option<Uuid>,
    ) -> AppResult<Favorite>;
}

/// Bookmark an event, or one of its dates.
///
/// A whole-event favorite and per-date favorites of the same event coexist;
/// only the exact same (user, event, date) pair is a duplicate.
pub async fn add_favorite<S>(store: &S, user_id: Uuid, data: &CreateFavorite) -> AppResult<Favorite>
where
    S: FavoriteStore + ?Sized,
{
    if !store.event_exists(data.event_id).await? {
        return Err(AppError::NotFound(format!("Event {} not found", data.event_id)));
    }
    if let Some(date_id) = data.event_date_id {
        if !store.date_belongs_to(data.event_id, date_id).await? {
            return Err(AppError::NotFound(format!(
                "Event date {} not found for event {}",
                date_id, data.event_id
            )));
        }
    }
    if store
        .favorite_exists(user_id, data.event_id, data.event_date_id)
        .await?
    {
        return Err(AppError::Conflict("Event already in favorites".to_string()));
    }

    store
        .insert_favorite(user_id, data.event_id, data.event_date_id)
        .await
}

#[derive(Clone)]
pub struct FavoritesService {
    repository: Repository,
    search: SearchConfig,
}

impl FavoritesService {
    pub fn new(repository: Repository, search: SearchConfig) -> Self {
        Self { repository, search }
    }

    pub async fn add(&self, user_id: Uuid, data: &CreateFavorite) -> AppResult<Favorite> {
        let favorite = add_favorite(&self.repository, user_id, data).await?;
        tracing::debug!(favorite_id = %favorite.id, event_id = %favorite.event_id, "favorite added");
        Ok(favorite)
    }

    /// The caller's favorites with their events, newest first
    pub async fn list(&self, user_id: Uuid, page: PageRequest) -> AppResult<Paginated<FavoriteDetails>> {
        let (favorites, total) = self.repository.favorites.page(user_id, page).await?;

        let mut event_ids: Vec<Uuid> = favorites.iter().map(|f| f.event_id).collect();
        event_ids.sort_unstable();
        event_ids.dedup();
        let events: HashMap<Uuid, Event> = self
            .repository
            .events
            .find_many(&event_ids)
            .await?
            .into_iter()
            .map(|e| (e.id, e))
            .collect();

        let today = self.search.today();
        let results = favorites
            .into_iter()
            .filter_map(|favorite| {
                let event = events.get(&favorite.event_id)?.clone();
                Some(scope_to_favorite(favorite, event, today))
            })
            .collect();

        Ok(Paginated::from_page(results, total, page))
    }

    pub async fn remove(&self, user_id: Uuid, id: Uuid) -> AppResult<()> {
        if !self.repository.favorites.delete_owned(id, user_id).await? {
            return Err(AppError::NotFound(format!("Favorite {} not found", id)));
        }
        Ok(())
    }

    /// Remove every favorite of the caller on an event. Returns how many were removed.
    pub async fn remove_for_event(&self, user_id: Uuid, event_id: Uuid) -> AppResult<u64> {
        let removed = self
            .repository
            .favorites
            .delete_for_event(user_id, event_id)
            .await?;
        if removed == 0 {
            return Err(AppError::NotFound(format!(
                "No favorites found for event {}",
                event_id
            )));
        }
        Ok(removed)
    }
}

/// Dates shown for a favorite: the bookmarked date alone, or for a
/// whole-event favorite the upcoming dates (all dates when none are left).
fn scope_to_favorite(favorite: Favorite, mut event: Event, today: NaiveDate) -> FavoriteDetails {
    let event_date: Option<EventDate> = favorite
        .event_date_id
        .and_then(|date_id| event.dates.iter().find(|d| d.id == date_id).cloned());

    match (&favorite.event_date_id, &event_date) {
        (Some(_), Some(date)) => event.dates = vec![date.clone()],
        (Some(_), None) => event.dates.clear(),
        (None, _) => {
            if event.dates.iter().any(|d| d.date >= today) {
                event.dates.retain(|d| d.date >= today);
            }
        }
    }

    FavoriteDetails {
        favorite,
        event,
        event_date,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::testing::{date_on, event_with, ymd};
    use chrono::Utc;

    fn favorite(event: &Event, event_date_id: Option<Uuid>) -> Favorite {
        Favorite {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            event_id: event.id,
            event_date_id,
            created_at: Utc::now(),
        }
    }

    fn request(event_id: Uuid, event_date_id: Option<Uuid>) -> CreateFavorite {
        CreateFavorite {
            event_id,
            event_date_id,
        }
    }

    /// Store holding one event with one date and the given favorites
    fn store_with(event_id: Uuid, date_id: Uuid, existing: Vec<Favorite>) -> MockFavoriteStore {
        let mut store = MockFavoriteStore::new();
        store
            .expect_event_exists()
            .returning(move |id| Ok(id == event_id));
        store
            .expect_date_belongs_to()
            .returning(move |e, d| Ok(e == event_id && d == date_id));
        store.expect_favorite_exists().returning(move |u, e, d| {
            Ok(existing
                .iter()
                .any(|f| f.user_id == u && f.event_id == e && f.event_date_id == d))
        });
        store
    }

    fn stored(user_id: Uuid, event_id: Uuid, event_date_id: Option<Uuid>) -> Favorite {
        Favorite {
            id: Uuid::new_v4(),
            user_id,
            event_id,
            event_date_id,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_add_unknown_event_is_not_found() {
        let mut store = store_with(Uuid::new_v4(), Uuid::new_v4(), vec![]);
        store.expect_insert_favorite().never();

        let result = add_favorite(&store, Uuid::new_v4(), &request(Uuid::new_v4(), None)).await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_add_date_of_another_event_is_not_found() {
        let (event_id, date_id) = (Uuid::new_v4(), Uuid::new_v4());
        let mut store = store_with(event_id, date_id, vec![]);
        store.expect_insert_favorite().never();

        let foreign_date = Uuid::new_v4();
        let result =
            add_favorite(&store, Uuid::new_v4(), &request(event_id, Some(foreign_date))).await;
        match result {
            Err(AppError::NotFound(msg)) => assert!(msg.contains(&foreign_date.to_string())),
            other => panic!("unexpected: {:?}", other.map(|f| f.id)),
        }
    }

    #[tokio::test]
    async fn test_duplicate_whole_event_favorite_conflicts() {
        let (user, event_id, date_id) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        let mut store = store_with(event_id, date_id, vec![stored(user, event_id, None)]);
        store.expect_insert_favorite().never();

        let result = add_favorite(&store, user, &request(event_id, None)).await;
        assert!(matches!(result, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_duplicate_date_favorite_conflicts() {
        let (user, event_id, date_id) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        let mut store = store_with(event_id, date_id, vec![stored(user, event_id, Some(date_id))]);
        store.expect_insert_favorite().never();

        let result = add_favorite(&store, user, &request(event_id, Some(date_id))).await;
        assert!(matches!(result, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_date_favorite_coexists_with_whole_event_favorite() {
        let (user, event_id, date_id) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        let mut store = store_with(event_id, date_id, vec![stored(user, event_id, None)]);
        store
            .expect_insert_favorite()
            .withf(move |u, e, d| *u == user && *e == event_id && *d == Some(date_id))
            .times(1)
            .returning(|u, e, d| Ok(stored(u, e, d)));

        let favorite = add_favorite(&store, user, &request(event_id, Some(date_id)))
            .await
            .unwrap();
        assert_eq!(favorite.event_date_id, Some(date_id));
    }

    #[tokio::test]
    async fn test_whole_event_favorite_coexists_with_date_favorite() {
        let (user, event_id, date_id) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        let mut store = store_with(event_id, date_id, vec![stored(user, event_id, Some(date_id))]);
        store
            .expect_insert_favorite()
            .times(1)
            .returning(|u, e, d| Ok(stored(u, e, d)));

        let favorite = add_favorite(&store, user, &request(event_id, None)).await.unwrap();
        assert_eq!(favorite.event_date_id, None);
    }

    #[tokio::test]
    async fn test_other_users_favorite_is_not_a_duplicate() {
        let (event_id, date_id) = (Uuid::new_v4(), Uuid::new_v4());
        let mut store = store_with(event_id, date_id, vec![stored(Uuid::new_v4(), event_id, None)]);
        store
            .expect_insert_favorite()
            .times(1)
            .returning(|u, e, d| Ok(stored(u, e, d)));

        assert!(add_favorite(&store, Uuid::new_v4(), &request(event_id, None)).await.is_ok());
    }

    #[tokio::test]
    async fn test_lost_insert_race_is_conflict() {
        let (user, event_id, date_id) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        let mut store = store_with(event_id, date_id, vec![]);
        store
            .expect_insert_favorite()
            .returning(|_, _, _| Err(AppError::Conflict("Event already in favorites".into())));

        let result = add_favorite(&store, user, &request(event_id, None)).await;
        assert!(matches!(result, Err(AppError::Conflict(_))));
    }

    #[test]
    fn test_date_favorite_shows_only_its_date() {
        let event = event_with(vec![
            date_on(ymd(2025, 1, 10), None, None),
            date_on(ymd(2025, 2, 5), None, None),
        ]);
        let feb = event.dates[1].id;
        let details = scope_to_favorite(favorite(&event, Some(feb)), event, ymd(2025, 1, 1));
        assert_eq!(details.event.dates.len(), 1);
        assert_eq!(details.event.dates[0].id, feb);
        assert_eq!(details.event_date.map(|d| d.id), Some(feb));
    }

    #[test]
    fn test_event_favorite_shows_upcoming_dates() {
        let event = event_with(vec![
            date_on(ymd(2024, 12, 1), None, None),
            date_on(ymd(2025, 2, 5), None, None),
        ]);
        let details = scope_to_favorite(favorite(&event, None), event, ymd(2025, 1, 1));
        assert_eq!(details.event.dates.len(), 1);
        assert_eq!(details.event.dates[0].date, ymd(2025, 2, 5));
        assert!(details.event_date.is_none());
    }

    #[test]
    fn test_event_favorite_keeps_past_dates_when_nothing_upcoming() {
        let event = event_with(vec![
            date_on(ymd(2024, 11, 1), None, None),
            date_on(ymd(2024, 12, 1), None, None),
        ]);
        let details = scope_to_favorite(favorite(&event, None), event, ymd(2025, 1, 1));
        assert_eq!(details.event.dates.len(), 2);
    }
}
