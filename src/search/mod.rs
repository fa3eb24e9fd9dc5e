//! Public event search
//!
//! Candidates are fetched in bulk with a coarse event-level filter, then
//! narrowed per date, shaped (one row per date or per event), marked with the
//! caller's favorites, sorted by next date and paginated, in that order.
//! Pagination happens last because the sort key depends on which dates
//! survived filtering.

pub mod filter;
pub mod matcher;
pub mod overlay;
pub mod page;
pub mod shape;

use async_trait::async_trait;
use chrono::NaiveDate;
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::{
        event::{Event, EventCard, Paginated},
        favorite::Favorite,
    },
};

pub use filter::{CoarseFilter, DateFilter, Layout, SearchRequest, TimeWindow};
pub use overlay::FavoriteIndex;
pub use page::PageRequest;

/// Data needed by a search
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CandidateSource: Send + Sync {
    /// Every active event matching the coarse filter, with all its dates,
    /// venue and organizer, newest first. Not paginated.
    async fn candidates(&self, filter: &CoarseFilter) -> AppResult<Vec<Event>>;

    /// All favorites of a user
    async fn favorites_of(&self, user_id: Uuid) -> AppResult<Vec<Favorite>>;
}

/// Narrow, shape, mark and sort candidates. No I/O.
pub fn rank(
    candidates: Vec<Event>,
    dates: &DateFilter,
    layout: Layout,
    favorites: &FavoriteIndex,
) -> Vec<EventCard> {
    let narrowed = candidates
        .into_iter()
        .map(|event| matcher::retain_matching(event, dates));
    let rows = shape::shape(narrowed, layout);
    let mut cards = favorites.apply(rows);
    page::sort_by_next_date(&mut cards);
    cards
}

/// Run the whole pipeline for `request` as seen on `today`.
///
/// `caller` selects whose favorites are overlaid; anonymous requests skip the
/// favorites fetch entirely.
pub async fn execute<S>(
    source: &S,
    request: &SearchRequest,
    caller: Option<Uuid>,
    today: NaiveDate,
) -> AppResult<Paginated<EventCard>>
where
    S: CandidateSource + ?Sized,
{
    let cards = collect(source, request, caller, today).await?;
    Ok(page::paginate(cards, request.page))
}

/// Featured events with at least one upcoming date, one row per event,
/// soonest first, as a single page
pub async fn featured<S>(
    source: &S,
    caller: Option<Uuid>,
    today: NaiveDate,
) -> AppResult<Paginated<EventCard>>
where
    S: CandidateSource + ?Sized,
{
    let request = SearchRequest {
        featured_only: true,
        layout: Layout::Grouped,
        ..Default::default()
    };
    let cards = collect(source, &request, caller, today).await?;
    Ok(Paginated::single_page(cards))
}

async fn collect<S>(
    source: &S,
    request: &SearchRequest,
    caller: Option<Uuid>,
    today: NaiveDate,
) -> AppResult<Vec<EventCard>>
where
    S: CandidateSource + ?Sized,
{
    let (coarse, dates) = request.compile(today);

    let (candidates, favorites) = match caller {
        Some(user_id) => {
            let (candidates, favorites) =
                tokio::try_join!(source.candidates(&coarse), source.favorites_of(user_id))?;
            (candidates, FavoriteIndex::new(favorites))
        }
        None => (source.candidates(&coarse).await?, FavoriteIndex::anonymous()),
    };

    let fetched = candidates.len();
    let cards = rank(candidates, &dates, request.layout, &favorites);
    tracing::debug!(
        fetched,
        rows = cards.len(),
        layout = ?request.layout,
        from = %dates.from,
        "event search ranked"
    );

    Ok(cards)
}

#[cfg(test)]
pub(crate) mod testing {
    use chrono::{NaiveDate, Utc};
    use rust_decimal::Decimal;
    use uuid::Uuid;

    use crate::models::event::{Event, EventDate};

    pub fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    pub fn date_on(date: NaiveDate, start_time: Option<&str>, price: Option<Decimal>) -> EventDate {
        EventDate {
            id: Uuid::new_v4(),
            event_id: Uuid::nil(),
            date,
            start_time: start_time.map(str::to_string),
            end_time: None,
            price,
            capacity: None,
        }
    }

    pub fn event_with(dates: Vec<EventDate>) -> Event {
        let id = Uuid::new_v4();
        let now = Utc::now();
        Event {
            id,
            title: "Festival".to_string(),
            description: None,
            category: "Música".to_string(),
            image_url: None,
            banner_url: None,
            website_url: None,
            ticket_urls: None,
            is_active: true,
            is_featured: false,
            is_banner: false,
            user_id: Uuid::new_v4(),
            location_id: None,
            created_at: now,
            updated_at: now,
            dates: dates
                .into_iter()
                .map(|d| EventDate { event_id: id, ..d })
                .collect(),
            location: None,
            user: None,
        }
    }
}
