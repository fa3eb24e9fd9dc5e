//! Result shaping: one row per date, or one row per event

use super::filter::Layout;
use crate::models::event::Event;

/// Shape already-narrowed events into result rows
pub fn shape<I>(events: I, layout: Layout) -> Vec<Event>
where
    I: IntoIterator<Item = Event>,
{
    match layout {
        Layout::Expanded => expand(events),
        Layout::Grouped => group(events),
    }
}

/// One row per remaining date, each carrying exactly that date.
/// Events without dates contribute nothing.
pub fn expand<I>(events: I) -> Vec<Event>
where
    I: IntoIterator<Item = Event>,
{
    events
        .into_iter()
        .flat_map(|mut event| {
            let dates = std::mem::take(&mut event.dates);
            dates.into_iter().map(move |date| Event {
                dates: vec![date],
                ..event.clone()
            })
        })
        .collect()
}

/// One row per event with all remaining dates; events left without any
/// date are dropped.
pub fn group<I>(events: I) -> Vec<Event>
where
    I: IntoIterator<Item = Event>,
{
    events
        .into_iter()
        .filter(|event| !event.dates.is_empty())
        .collect()
}
