//! Chronological sort and in-memory pagination

use chrono::NaiveDate;

use crate::{
    error::{AppError, AppResult},
    models::event::{EventCard, Paginated},
};

pub const DEFAULT_PAGE: i64 = 1;
pub const DEFAULT_LIMIT: i64 = 20;

/// Validated 1-based page request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: i64,
    pub limit: i64,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            limit: DEFAULT_LIMIT,
        }
    }
}

impl PageRequest {
    /// Parse `page` and `limit` query values; both must be positive integers
    pub fn from_params(page: Option<&str>, limit: Option<&str>) -> AppResult<Self> {
        Ok(Self {
            page: positive("page", page)?.unwrap_or(DEFAULT_PAGE),
            limit: positive("limit", limit)?.unwrap_or(DEFAULT_LIMIT),
        })
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.limit)
    }

    pub fn total_pages(&self, total: i64) -> i64 {
        if total <= 0 {
            0
        } else {
            (total - 1) / self.limit + 1
        }
    }
}

fn positive(name: &str, value: Option<&str>) -> AppResult<Option<i64>> {
    let Some(raw) = value.map(str::trim).filter(|v| !v.is_empty()) else {
        return Ok(None);
    };
    match raw.parse::<i64>() {
        Ok(n) if n > 0 => Ok(Some(n)),
        _ => Err(AppError::Validation(format!(
            "{} must be a positive integer",
            name
        ))),
    }
}

impl<T> Paginated<T> {
    /// Wrap a page fetched with LIMIT/OFFSET together with its total count
    pub fn from_page(results: Vec<T>, total: i64, request: PageRequest) -> Self {
        Self {
            results,
            total,
            page: request.page,
            total_pages: request.total_pages(total),
        }
    }

    /// Whole list as a single page
    pub fn single_page(results: Vec<T>) -> Self {
        let total = results.len() as i64;
        Self {
            results,
            total,
            page: 1,
            total_pages: 1,
        }
    }
}

/// Earliest retained date of a row
pub fn next_date(card: &EventCard) -> Option<NaiveDate> {
    card.event.dates.iter().map(|d| d.date).min()
}

/// Stable ascending sort on the earliest retained date. Rows that compare
/// equal keep their incoming order.
pub fn sort_by_next_date(cards: &mut [EventCard]) {
    cards.sort_by_key(|card| {
        let next = next_date(card);
        (next.is_none(), next)
    });
}

/// Slice the final, fully filtered and sorted list. `total` is its length.
pub fn paginate<T>(rows: Vec<T>, request: PageRequest) -> Paginated<T> {
    let total = rows.len() as i64;
    let start = usize::try_from(request.offset()).unwrap_or(usize::MAX);
    let limit = usize::try_from(request.limit).unwrap_or(usize::MAX);

    let results: Vec<T> = rows.into_iter().skip(start).take(limit).collect();
    Paginated::from_page(results, total, request)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::event::FavoriteMark;
    use crate::search::testing::{date_on, event_with, ymd};

    fn page(page: i64, limit: i64) -> PageRequest {
        PageRequest { page, limit }
    }

    #[test]
    fn test_pagination_windows() {
        let rows: Vec<i32> = (1..=25).collect();

        let p2 = paginate(rows.clone(), page(2, 10));
        assert_eq!(p2.results, (11..=20).collect::<Vec<_>>());
        assert_eq!(p2.total, 25);
        assert_eq!(p2.total_pages, 3);

        let p3 = paginate(rows.clone(), page(3, 10));
        assert_eq!(p3.results, (21..=25).collect::<Vec<_>>());

        let p4 = paginate(rows, page(4, 10));
        assert!(p4.results.is_empty());
        assert_eq!(p4.total, 25);
        assert_eq!(p4.total_pages, 3);
    }

    #[test]
    fn test_empty_result_is_not_an_error() {
        let p = paginate(Vec::<i32>::new(), PageRequest::default());
        assert_eq!(p.total, 0);
        assert_eq!(p.total_pages, 0);
        assert_eq!(p.page, 1);
    }

    #[test]
    fn test_huge_page_does_not_overflow() {
        let p = paginate(vec![1, 2, 3], page(i64::MAX, i64::MAX));
        assert!(p.results.is_empty());
        assert_eq!(p.total, 3);
    }

    #[test]
    fn test_page_params() {
        assert_eq!(PageRequest::from_params(None, None).unwrap(), page(1, 20));
        assert_eq!(PageRequest::from_params(Some("3"), Some("5")).unwrap(), page(3, 5));

        for bad in ["0", "-2", "abc", "1.5"] {
            match PageRequest::from_params(Some(bad), None) {
                Err(AppError::Validation(msg)) => assert!(msg.starts_with("page")),
                _ => panic!("page={} should be rejected", bad),
            }
            match PageRequest::from_params(None, Some(bad)) {
                Err(AppError::Validation(msg)) => assert!(msg.starts_with("limit")),
                _ => panic!("limit={} should be rejected", bad),
            }
        }
    }

    #[test]
    fn test_sort_is_stable_on_ties() {
        let first = event_with(vec![date_on(ymd(2025, 1, 10), None, None)]);
        let second = event_with(vec![date_on(ymd(2025, 1, 10), None, None)]);
        let earlier = event_with(vec![date_on(ymd(2025, 1, 8), None, None)]);
        let (a, b, c) = (first.id, second.id, earlier.id);

        let mut cards: Vec<EventCard> = vec![first, second, earlier]
            .into_iter()
            .map(|event| EventCard {
                event,
                favorite: FavoriteMark::None,
            })
            .collect();
        sort_by_next_date(&mut cards);

        let order: Vec<_> = cards.iter().map(|c| c.event.id).collect();
        assert_eq!(order, vec![c, a, b]);
    }

    #[test]
    fn test_grouped_rows_sort_by_earliest_date() {
        let late = event_with(vec![
            date_on(ymd(2025, 3, 1), None, None),
            date_on(ymd(2025, 2, 20), None, None),
        ]);
        let soon = event_with(vec![
            date_on(ymd(2025, 4, 1), None, None),
            date_on(ymd(2025, 2, 1), None, None),
        ]);
        let soon_id = soon.id;
        let mut cards: Vec<EventCard> = vec![late, soon]
            .into_iter()
            .map(|event| EventCard {
                event,
                favorite: FavoriteMark::None,
            })
            .collect();
        sort_by_next_date(&mut cards);
        assert_eq!(cards[0].event.id, soon_id);
    }
}
