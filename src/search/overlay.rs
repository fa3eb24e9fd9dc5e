//! Favorite overlay for the requesting user

use std::collections::HashMap;

use uuid::Uuid;

use crate::models::{
    event::{Event, EventCard, FavoriteMark},
    favorite::Favorite,
};

/// The requesting user's favorites, indexed by event
#[derive(Debug, Default)]
pub struct FavoriteIndex {
    by_event: HashMap<Uuid, Vec<Favorite>>,
}

impl FavoriteIndex {
    /// Index for an anonymous caller: nothing is ever marked
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// `favorites` must all belong to the same user
    pub fn new(favorites: Vec<Favorite>) -> Self {
        let mut by_event: HashMap<Uuid, Vec<Favorite>> = HashMap::new();
        for favorite in favorites {
            by_event.entry(favorite.event_id).or_default().push(favorite);
        }
        Self { by_event }
    }

    /// Any favorite on the event marks the row. When several exist, one
    /// scoped to a date shown in the row wins, then the whole-event one.
    pub fn mark(&self, event: &Event) -> FavoriteMark {
        let Some(favorites) = self.by_event.get(&event.id) else {
            return FavoriteMark::None;
        };

        let on_shown_date = favorites.iter().find(|f| {
            f.event_date_id
                .is_some_and(|date_id| event.dates.iter().any(|d| d.id == date_id))
        });
        let whole_event = || favorites.iter().find(|f| f.event_date_id.is_none());

        on_shown_date
            .or_else(whole_event)
            .or_else(|| favorites.first())
            .map_or(FavoriteMark::None, |f| FavoriteMark::Id(f.id))
    }

    pub fn apply(&self, rows: Vec<Event>) -> Vec<EventCard> {
        rows.into_iter()
            .map(|event| EventCard {
                favorite: self.mark(&event),
                event,
            })
            .collect()
    }
}
