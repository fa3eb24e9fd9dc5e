//! Search request parsing and filter compilation
//!
//! A request is split into a coarse predicate the database can evaluate per
//! event, and a per-date predicate evaluated in memory by the matcher.

use chrono::NaiveDate;

use super::page::PageRequest;
use crate::{
    error::{AppError, AppResult},
    models::event::EventSearchQuery,
};

/// Typed, validated search request
#[derive(Debug, Clone, Default)]
pub struct SearchRequest {
    pub category: Option<String>,
    pub department: Option<String>,
    pub province: Option<String>,
    pub district: Option<String>,
    pub text: Option<String>,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
    pub free_only: bool,
    pub in_progress: bool,
    pub time_from: Option<String>,
    pub time_to: Option<String>,
    pub exclude_featured: bool,
    pub featured_only: bool,
    pub layout: Layout,
    pub page: PageRequest,
}

/// Output shape of a search
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Layout {
    /// One row per matching date
    #[default]
    Expanded,
    /// One row per event holding all its matching dates
    Grouped,
}

/// Event-level predicate pushed down to the repository
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CoarseFilter {
    pub category: Option<String>,
    pub department: Option<String>,
    pub province: Option<String>,
    pub district: Option<String>,
    /// Substring of the title or of the venue name
    pub text: Option<String>,
    pub exclude_featured: bool,
    pub featured_only: bool,
}

/// Per-date predicate
#[derive(Debug, Clone, PartialEq)]
pub struct DateFilter {
    /// Inclusive lower bound, always set
    pub from: NaiveDate,
    /// Inclusive upper bound
    pub to: Option<NaiveDate>,
    pub free_only: bool,
    pub time: TimeWindow,
}

impl DateFilter {
    /// Only upcoming dates, nothing else
    pub fn upcoming(today: NaiveDate) -> Self {
        Self {
            from: today,
            to: None,
            free_only: false,
            time: TimeWindow::default(),
        }
    }
}

/// Start-time window on `HH:MM` strings.
///
/// `from > to` describes a window that wraps past midnight.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TimeWindow {
    pub from: Option<String>,
    pub to: Option<String>,
}

impl SearchRequest {
    /// Plain text search: upcoming events whose title or venue name contains
    /// `text`, one row per event. Blank text matches everything.
    pub fn text(text: Option<&str>, page: PageRequest) -> Self {
        Self {
            text: text
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(str::to_string),
            layout: Layout::Grouped,
            page,
            ..Default::default()
        }
    }

    /// Validate raw query parameters
    pub fn from_query(query: &EventSearchQuery) -> AppResult<Self> {
        Ok(Self {
            category: clean(&query.category),
            department: clean(&query.department),
            province: clean(&query.province),
            district: clean(&query.district),
            text: clean(&query.text),
            date_from: parse_date("fechaInicio", query.date_from.as_deref())?,
            date_to: parse_date("fechaFin", query.date_to.as_deref())?,
            free_only: parse_flag("esGratis", query.free_only.as_deref())?.unwrap_or(false),
            in_progress: parse_flag("enCurso", query.in_progress.as_deref())?.unwrap_or(false),
            time_from: parse_time("horaInicio", query.time_from.as_deref())?,
            time_to: parse_time("horaFin", query.time_to.as_deref())?,
            exclude_featured: parse_flag("excludeFeatured", query.exclude_featured.as_deref())?
                .unwrap_or(false),
            featured_only: false,
            layout: match parse_flag("expandDates", query.expand_dates.as_deref())? {
                Some(false) => Layout::Grouped,
                _ => Layout::Expanded,
            },
            page: PageRequest::from_params(query.page.as_deref(), query.limit.as_deref())?,
        })
    }

    /// Split the request into its event-level and date-level parts.
    ///
    /// The lower date bound is `fechaInicio` when given, otherwise `today`.
    /// With `enCurso` the bound is never earlier than `today`.
    pub fn compile(&self, today: NaiveDate) -> (CoarseFilter, DateFilter) {
        let mut from = self.date_from.unwrap_or(today);
        if self.in_progress && from < today {
            from = today;
        }

        let coarse = CoarseFilter {
            category: self.category.clone(),
            department: self.department.clone(),
            province: self.province.clone(),
            district: self.district.clone(),
            text: self.text.clone(),
            exclude_featured: self.exclude_featured,
            featured_only: self.featured_only,
        };

        let dates = DateFilter {
            from,
            to: self.date_to,
            free_only: self.free_only,
            time: TimeWindow {
                from: self.time_from.clone(),
                to: self.time_to.clone(),
            },
        };

        (coarse, dates)
    }
}

fn clean(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Parse a boolean query flag (`true`/`false`, `1`/`0`)
pub fn parse_flag(name: &str, value: Option<&str>) -> AppResult<Option<bool>> {
    match value.map(|v| v.trim().to_lowercase()) {
        None => Ok(None),
        Some(v) if v.is_empty() => Ok(None),
        Some(v) if v == "true" || v == "1" => Ok(Some(true)),
        Some(v) if v == "false" || v == "0" => Ok(Some(false)),
        Some(_) => Err(AppError::Validation(format!("{} must be true or false", name))),
    }
}

fn parse_date(name: &str, value: Option<&str>) -> AppResult<Option<NaiveDate>> {
    let Some(raw) = value.map(str::trim).filter(|v| !v.is_empty()) else {
        return Ok(None);
    };
    // Accept full ISO timestamps as sent by some clients, keep the date part only
    let day = raw.get(..10).unwrap_or(raw);
    NaiveDate::parse_from_str(day, "%Y-%m-%d")
        .map(Some)
        .map_err(|_| AppError::Validation(format!("{} must be a date (YYYY-MM-DD)", name)))
}

/// Normalize a time bound to zero-padded `HH:MM` so that string order is
/// chronological order.
fn parse_time(name: &str, value: Option<&str>) -> AppResult<Option<String>> {
    let Some(raw) = value.map(str::trim).filter(|v| !v.is_empty()) else {
        return Ok(None);
    };
    let invalid = || AppError::Validation(format!("{} must be a time (HH:MM)", name));

    // H:MM, HH:MM or HH:MM:SS; seconds are dropped
    let mut parts = raw.split(':');
    let (Some(h), Some(m)) = (parts.next(), parts.next()) else {
        return Err(invalid());
    };
    let secs = parts.next();
    let digits = |p: &str, len: std::ops::RangeInclusive<usize>| {
        len.contains(&p.len()) && p.bytes().all(|b| b.is_ascii_digit())
    };
    if !digits(h, 1..=2) || !digits(m, 2..=2) || !secs.map_or(true, |s| digits(s, 2..=2)) {
        return Err(invalid());
    }
    if parts.next().is_some() {
        return Err(invalid());
    }
    let hours: u32 = h.parse().map_err(|_| invalid())?;
    let minutes: u32 = m.parse().map_err(|_| invalid())?;
    if hours > 23 || minutes > 59 {
        return Err(invalid());
    }
    Ok(Some(format!("{:02}:{:02}", hours, minutes)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_defaults() {
        let req = SearchRequest::from_query(&EventSearchQuery::default()).unwrap();
        assert_eq!(req.layout, Layout::Expanded);
        assert_eq!(req.page, PageRequest { page: 1, limit: 20 });
        assert!(!req.free_only);

        let (coarse, dates) = req.compile(ymd(2025, 1, 5));
        assert_eq!(coarse, CoarseFilter::default());
        assert_eq!(dates, DateFilter::upcoming(ymd(2025, 1, 5)));
    }

    #[test]
    fn test_explicit_start_replaces_today() {
        let query = EventSearchQuery {
            date_from: Some("2025-03-01".into()),
            date_to: Some("2025-03-31T00:00:00.000Z".into()),
            ..Default::default()
        };
        let (_, dates) = SearchRequest::from_query(&query).unwrap().compile(ymd(2025, 1, 5));
        assert_eq!(dates.from, ymd(2025, 3, 1));
        assert_eq!(dates.to, Some(ymd(2025, 3, 31)));
    }

    #[test]
    fn test_in_progress_never_goes_back_in_time() {
        let query = EventSearchQuery {
            date_from: Some("2024-12-01".into()),
            in_progress: Some("true".into()),
            ..Default::default()
        };
        let (_, dates) = SearchRequest::from_query(&query).unwrap().compile(ymd(2025, 1, 5));
        assert_eq!(dates.from, ymd(2025, 1, 5));
    }

    #[test]
    fn test_text_request() {
        let page = PageRequest { page: 2, limit: 5 };
        let req = SearchRequest::text(Some("  jazz "), page);
        assert_eq!(req.layout, Layout::Grouped);
        assert_eq!(req.page, page);

        let (coarse, dates) = req.compile(ymd(2025, 1, 5));
        assert_eq!(coarse.text.as_deref(), Some("jazz"));
        assert!(!coarse.exclude_featured && !coarse.featured_only);
        assert_eq!(dates, DateFilter::upcoming(ymd(2025, 1, 5)));

        assert_eq!(SearchRequest::text(Some("   "), page).text, None);
    }

    #[test]
    fn test_grouped_layout() {
        let query = EventSearchQuery {
            expand_dates: Some("false".into()),
            ..Default::default()
        };
        assert_eq!(SearchRequest::from_query(&query).unwrap().layout, Layout::Grouped);
    }

    #[test]
    fn test_blank_text_fields_are_dropped() {
        let query = EventSearchQuery {
            category: Some("  Teatro ".into()),
            text: Some("   ".into()),
            ..Default::default()
        };
        let (coarse, _) = SearchRequest::from_query(&query).unwrap().compile(ymd(2025, 1, 5));
        assert_eq!(coarse.category.as_deref(), Some("Teatro"));
        assert_eq!(coarse.text, None);
    }

    #[test]
    fn test_time_bounds_are_zero_padded() {
        assert_eq!(parse_time("horaInicio", Some("9:05")).unwrap().as_deref(), Some("09:05"));
        assert_eq!(parse_time("horaInicio", Some("22:00:00")).unwrap().as_deref(), Some("22:00"));
        assert!(parse_time("horaInicio", Some("25:00")).is_err());
        assert!(parse_time("horaFin", Some("noche")).is_err());
    }

    #[test]
    fn test_time_bounds_reject_trailing_text_and_signs() {
        assert!(parse_time("horaInicio", Some("22:00xyz")).is_err());
        assert!(parse_time("horaInicio", Some("+9:00")).is_err());
        assert!(parse_time("horaInicio", Some("9:+5")).is_err());
        assert!(parse_time("horaInicio", Some("9:5")).is_err());
        assert!(parse_time("horaInicio", Some("09:00:00:00")).is_err());
        assert!(parse_time("horaInicio", Some("09:00:0x")).is_err());
        assert!(parse_time("horaInicio", Some("123:00")).is_err());
    }

    #[test]
    fn test_invalid_values_name_the_parameter() {
        let query = EventSearchQuery {
            free_only: Some("quizas".into()),
            ..Default::default()
        };
        match SearchRequest::from_query(&query) {
            Err(AppError::Validation(msg)) => assert!(msg.contains("esGratis")),
            other => panic!("unexpected: {:?}", other.map(|_| ())),
        }

        let query = EventSearchQuery {
            date_from: Some("mañana".into()),
            ..Default::default()
        };
        match SearchRequest::from_query(&query) {
            Err(AppError::Validation(msg)) => assert!(msg.contains("fechaInicio")),
            other => panic!("unexpected: {:?}", other.map(|_| ())),
        }
    }
}
