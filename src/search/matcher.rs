//! Per-date matching

use super::filter::{DateFilter, TimeWindow};
use crate::models::event::{Event, EventDate};

impl DateFilter {
    /// Whether a single scheduled date passes every active condition
    pub fn matches(&self, date: &EventDate) -> bool {
        if date.date < self.from {
            return false;
        }
        if matches!(self.to, Some(to) if date.date > to) {
            return false;
        }
        if self.free_only && !date.is_free() {
            return false;
        }
        self.time.admits(date.start_time.as_deref())
    }
}

impl TimeWindow {
    pub fn is_open(&self) -> bool {
        self.from.is_none() && self.to.is_none()
    }

    /// A missing start time only passes when no bound is set.
    pub fn admits(&self, start: Option<&str>) -> bool {
        if self.is_open() {
            return true;
        }
        let Some(start) = start else {
            return false;
        };
        match (self.from.as_deref(), self.to.as_deref()) {
            // Wraps past midnight, e.g. 22:00 -> 02:00
            (Some(from), Some(to)) if from > to => start >= from || start <= to,
            (Some(from), Some(to)) => from <= start && start <= to,
            (Some(from), None) => start >= from,
            (None, Some(to)) => start <= to,
            (None, None) => true,
        }
    }
}

/// Keep only the dates of `event` that match, in chronological order
pub fn retain_matching(mut event: Event, filter: &DateFilter) -> Event {
    event.dates.retain(|d| filter.matches(d));
    event
        .dates
        .sort_by(|a, b| a.date.cmp(&b.date).then_with(|| a.start_time.cmp(&b.start_time)));
    event
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::testing::{date_on, event_with, ymd};
    use rust_decimal::Decimal;

    fn window(from: Option<&str>, to: Option<&str>) -> TimeWindow {
        TimeWindow {
            from: from.map(str::to_string),
            to: to.map(str::to_string),
        }
    }

    #[test]
    fn test_midnight_crossing_window() {
        let w = window(Some("22:00"), Some("02:00"));
        assert!(w.admits(Some("23:30")));
        assert!(w.admits(Some("01:00")));
        assert!(w.admits(Some("22:00")));
        assert!(w.admits(Some("02:00")));
        assert!(!w.admits(Some("10:00")));
    }

    #[test]
    fn test_plain_window() {
        let w = window(Some("18:00"), Some("21:00"));
        assert!(w.admits(Some("18:00")));
        assert!(w.admits(Some("20:30")));
        assert!(!w.admits(Some("21:30")));
        assert!(!w.admits(Some("09:00")));
    }

    #[test]
    fn test_single_bound() {
        assert!(window(Some("18:00"), None).admits(Some("23:00")));
        assert!(!window(Some("18:00"), None).admits(Some("17:59")));
        assert!(window(None, Some("12:00")).admits(Some("08:00")));
        assert!(!window(None, Some("12:00")).admits(Some("12:01")));
    }

    #[test]
    fn test_missing_start_time() {
        assert!(TimeWindow::default().admits(None));
        assert!(!window(Some("18:00"), None).admits(None));
        assert!(!window(Some("22:00"), Some("02:00")).admits(None));
    }

    #[test]
    fn test_date_bounds() {
        let filter = DateFilter {
            from: ymd(2025, 1, 5),
            to: Some(ymd(2025, 1, 31)),
            free_only: false,
            time: TimeWindow::default(),
        };
        assert!(!filter.matches(&date_on(ymd(2025, 1, 4), None, None)));
        assert!(filter.matches(&date_on(ymd(2025, 1, 5), None, None)));
        assert!(filter.matches(&date_on(ymd(2025, 1, 31), None, None)));
        assert!(!filter.matches(&date_on(ymd(2025, 2, 1), None, None)));
    }

    #[test]
    fn test_free_only() {
        let filter = DateFilter {
            free_only: true,
            ..DateFilter::upcoming(ymd(2025, 1, 1))
        };
        assert!(filter.matches(&date_on(ymd(2025, 1, 10), None, Some(Decimal::ZERO))));
        assert!(filter.matches(&date_on(ymd(2025, 1, 10), None, None)));
        assert!(!filter.matches(&date_on(ymd(2025, 1, 10), None, Some(Decimal::from(15)))));
    }

    #[test]
    fn test_retain_matching_sorts_dates() {
        let event = event_with(vec![
            date_on(ymd(2025, 3, 1), Some("20:00"), None),
            date_on(ymd(2024, 12, 1), Some("20:00"), None),
            date_on(ymd(2025, 2, 1), Some("21:00"), None),
            date_on(ymd(2025, 2, 1), Some("18:00"), None),
        ]);
        let kept = retain_matching(event, &DateFilter::upcoming(ymd(2025, 1, 1)));
        let got: Vec<_> = kept
            .dates
            .iter()
            .map(|d| (d.date, d.start_time.clone().unwrap()))
            .collect();
        assert_eq!(
            got,
            vec![
                (ymd(2025, 2, 1), "18:00".to_string()),
                (ymd(2025, 2, 1), "21:00".to_string()),
                (ymd(2025, 3, 1), "20:00".to_string()),
            ]
        );
    }
}
