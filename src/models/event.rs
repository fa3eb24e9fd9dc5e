//! Event model (published events, their scheduled dates and venues)

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, NoneAsEmptyString};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use super::user::Organizer;
use crate::{
    error::{AppError, AppResult},
    search::filter::parse_flag,
};

/// Event record with its nested aggregate
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    /// Free-text category label
    pub category: String,
    pub image_url: Option<String>,
    pub banner_url: Option<String>,
    pub website_url: Option<String>,
    /// Ticket links as `[{ "name": ..., "url": ... }]`
    #[schema(value_type = Option<Vec<TicketUrl>>)]
    pub ticket_urls: Option<serde_json::Value>,
    pub is_active: bool,
    pub is_featured: bool,
    pub is_banner: bool,
    pub user_id: Uuid,
    pub location_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[sqlx(skip)]
    pub dates: Vec<EventDate>,
    #[sqlx(skip)]
    pub location: Option<Location>,
    #[sqlx(skip)]
    pub user: Option<Organizer>,
}

/// One scheduled occurrence of an event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EventDate {
    pub id: Uuid,
    pub event_id: Uuid,
    /// Calendar date, time of day is kept separately
    pub date: NaiveDate,
    /// Start time (HH:MM, zero-padded 24h)
    pub start_time: Option<String>,
    /// End time (HH:MM, zero-padded 24h)
    pub end_time: Option<String>,
    /// Absent or zero means free
    #[schema(value_type = Option<f64>)]
    pub price: Option<Decimal>,
    pub capacity: Option<i32>,
}

impl EventDate {
    pub fn is_free(&self) -> bool {
        self.price.map_or(true, |p| p.is_zero())
    }
}

/// Venue of an event
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    pub id: Uuid,
    pub name: Option<String>,
    pub department: String,
    pub province: String,
    pub district: String,
    pub address: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TicketUrl {
    pub name: String,
    pub url: String,
}

/// Event as returned by listings: the event plus the caller's favorite mark
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct EventCard {
    #[serde(flatten)]
    pub event: Event,
    /// `false`, or the id of the caller's favorite for this event
    #[schema(value_type = Object)]
    pub favorite: FavoriteMark,
}

/// Favorite state of a listed event for the requesting user.
///
/// Serialized as `false` when unset and as the favorite id otherwise, which
/// clients use as the handle to delete it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FavoriteMark {
    #[default]
    None,
    Id(Uuid),
}

impl FavoriteMark {
    pub fn is_set(&self) -> bool {
        matches!(self, FavoriteMark::Id(_))
    }
}

impl Serialize for FavoriteMark {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            FavoriteMark::None => serializer.serialize_bool(false),
            FavoriteMark::Id(id) => id.serialize(serializer),
        }
    }
}

/// Page of results
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
#[aliases(
    EventCardPage = Paginated<EventCard>,
    FavoritePage = Paginated<super::favorite::FavoriteDetails>,
    CommentPage = Paginated<super::comment::CommentView>,
    UserPage = Paginated<super::user::Organizer>
)]
pub struct Paginated<T> {
    pub results: Vec<T>,
    pub total: i64,
    pub page: i64,
    pub total_pages: i64,
}

/// Per-category counters shown on the home page
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CategoryStats {
    pub id: Uuid,
    pub name: String,
    pub icon: Option<String>,
    pub count: i64,
    pub is_active: bool,
}

fn validate_hhmm(value: &str) -> Result<(), ValidationError> {
    let bytes = value.as_bytes();
    let ok = bytes.len() == 5
        && bytes[2] == b':'
        && bytes[..2].iter().chain(&bytes[3..]).all(u8::is_ascii_digit)
        && &value[..2] < "24"
        && &value[3..] < "60";
    if ok {
        Ok(())
    } else {
        Err(ValidationError::new("time must be HH:MM (24h, zero-padded)"))
    }
}

fn validate_iso_date(value: &str) -> Result<(), ValidationError> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map(|_| ())
        .map_err(|_| ValidationError::new("date must be YYYY-MM-DD"))
}

fn validate_non_negative(value: &Decimal) -> Result<(), ValidationError> {
    if value.is_sign_negative() {
        Err(ValidationError::new("price cannot be negative"))
    } else {
        Ok(())
    }
}

/// Scheduled date in a create/update request
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateEventDate {
    /// Date (YYYY-MM-DD)
    #[validate(custom(function = "validate_iso_date"))]
    pub date: String,
    /// Start time (HH:MM)
    #[validate(custom(function = "validate_hhmm"))]
    pub start_time: Option<String>,
    /// End time (HH:MM)
    #[validate(custom(function = "validate_hhmm"))]
    pub end_time: Option<String>,
    #[validate(custom(function = "validate_non_negative"))]
    #[schema(value_type = Option<f64>)]
    pub price: Option<Decimal>,
    #[validate(range(min = 0))]
    pub capacity: Option<i32>,
}

impl CreateEventDate {
    /// Calendar date, already checked by validation
    pub fn parsed_date(&self) -> Option<NaiveDate> {
        NaiveDate::parse_from_str(&self.date, "%Y-%m-%d").ok()
    }
}

/// Create event request
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateEvent {
    #[validate(length(min = 1, message = "Title is required"))]
    pub title: String,
    #[validate(length(min = 1, message = "Description is required"))]
    pub description: String,
    #[validate(length(min = 1, message = "Category is required"))]
    pub category: String,
    pub image_url: Option<String>,
    pub banner_url: Option<String>,
    pub website_url: Option<String>,
    pub ticket_urls: Option<Vec<TicketUrl>>,
    pub is_featured: Option<bool>,
    pub is_banner: Option<bool>,
    #[validate(nested)]
    pub dates: Vec<CreateEventDate>,
    pub location_name: Option<String>,
    pub department: Option<String>,
    pub province: Option<String>,
    pub district: Option<String>,
    pub address: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

/// Update event request
#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateEvent {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub image_url: Option<String>,
    pub banner_url: Option<String>,
    pub website_url: Option<String>,
    pub ticket_urls: Option<Vec<TicketUrl>>,
    pub is_featured: Option<bool>,
    pub is_banner: Option<bool>,
    /// When non-empty, replaces every existing date
    #[validate(nested)]
    pub dates: Option<Vec<CreateEventDate>>,
    pub location_name: Option<String>,
    pub department: Option<String>,
    pub province: Option<String>,
    pub district: Option<String>,
    pub address: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl UpdateEvent {
    pub fn touches_location(&self) -> bool {
        self.department.is_some()
            || self.province.is_some()
            || self.district.is_some()
            || self.location_name.is_some()
            || self.address.is_some()
    }
}

/// Query parameters of the public event search.
///
/// Names follow the public web client. Everything arrives as text so that
/// malformed values can be reported with the parameter name.
#[serde_as]
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct EventSearchQuery {
    /// Category label (case-insensitive exact match)
    #[serde(rename = "categoria", default)]
    #[serde_as(as = "NoneAsEmptyString")]
    pub category: Option<String>,
    #[serde(rename = "departamento", default)]
    #[serde_as(as = "NoneAsEmptyString")]
    pub department: Option<String>,
    #[serde(rename = "provincia", default)]
    #[serde_as(as = "NoneAsEmptyString")]
    pub province: Option<String>,
    #[serde(rename = "distrito", default)]
    #[serde_as(as = "NoneAsEmptyString")]
    pub district: Option<String>,
    /// Earliest date (YYYY-MM-DD), defaults to today
    #[serde(rename = "fechaInicio", default)]
    #[serde_as(as = "NoneAsEmptyString")]
    pub date_from: Option<String>,
    /// Latest date (YYYY-MM-DD)
    #[serde(rename = "fechaFin", default)]
    #[serde_as(as = "NoneAsEmptyString")]
    pub date_to: Option<String>,
    /// Free text matched against title and venue name
    #[serde(rename = "busqueda", default)]
    #[serde_as(as = "NoneAsEmptyString")]
    pub text: Option<String>,
    /// Only free dates
    #[serde(rename = "esGratis", default)]
    #[serde_as(as = "NoneAsEmptyString")]
    pub free_only: Option<String>,
    /// Only dates from today on
    #[serde(rename = "enCurso", default)]
    #[serde_as(as = "NoneAsEmptyString")]
    pub in_progress: Option<String>,
    /// Earliest start time (HH:MM)
    #[serde(rename = "horaInicio", default)]
    #[serde_as(as = "NoneAsEmptyString")]
    pub time_from: Option<String>,
    /// Latest start time (HH:MM); earlier than `horaInicio` wraps past midnight
    #[serde(rename = "horaFin", default)]
    #[serde_as(as = "NoneAsEmptyString")]
    pub time_to: Option<String>,
    #[serde(rename = "excludeFeatured", default)]
    #[serde_as(as = "NoneAsEmptyString")]
    pub exclude_featured: Option<String>,
    /// One row per date (default) or one row per event
    #[serde(rename = "expandDates", default)]
    #[serde_as(as = "NoneAsEmptyString")]
    pub expand_dates: Option<String>,
    /// Page number (1-based)
    #[serde(default)]
    #[serde_as(as = "NoneAsEmptyString")]
    pub page: Option<String>,
    /// Items per page
    #[serde(default)]
    #[serde_as(as = "NoneAsEmptyString")]
    pub limit: Option<String>,
}

/// Plain pagination parameters
#[serde_as]
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PageQuery {
    #[serde(default)]
    #[serde_as(as = "NoneAsEmptyString")]
    pub page: Option<String>,
    #[serde(default)]
    #[serde_as(as = "NoneAsEmptyString")]
    pub limit: Option<String>,
}

/// `excludeFeatured` flag of the related-events listings
#[serde_as]
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct RelatedQuery {
    #[serde(rename = "excludeFeatured", default)]
    #[serde_as(as = "NoneAsEmptyString")]
    pub exclude_featured: Option<String>,
}

/// Publication status selector of the general listing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusFilter {
    #[default]
    Active,
    Inactive,
    All,
}

/// Event-level filter of the general listing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ListingFilter {
    pub status: StatusFilter,
    /// `Some(false)` hides featured events, `Some(true)` keeps only them
    pub featured: Option<bool>,
}

/// Query parameters of the general event listing
#[serde_as]
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListingQuery {
    /// `active` (default), `inactive` or `all`
    #[serde(default)]
    #[serde_as(as = "NoneAsEmptyString")]
    pub status: Option<String>,
    #[serde(rename = "isFeatured", default)]
    #[serde_as(as = "NoneAsEmptyString")]
    pub is_featured: Option<String>,
    /// Older clients: `true` lists every status when `status` is absent
    #[serde(rename = "includeInactive", default)]
    #[serde_as(as = "NoneAsEmptyString")]
    pub include_inactive: Option<String>,
    /// Older clients: `true` hides featured events when `isFeatured` is absent
    #[serde(rename = "excludeFeatured", default)]
    #[serde_as(as = "NoneAsEmptyString")]
    pub exclude_featured: Option<String>,
    #[serde(default)]
    #[serde_as(as = "NoneAsEmptyString")]
    pub page: Option<String>,
    #[serde(default)]
    #[serde_as(as = "NoneAsEmptyString")]
    pub limit: Option<String>,
}

impl ListingQuery {
    pub fn filter(&self) -> AppResult<ListingFilter> {
        let status = match self.status.as_deref().map(str::trim) {
            None | Some("") => {
                if parse_flag("includeInactive", self.include_inactive.as_deref())?
                    .unwrap_or(false)
                {
                    StatusFilter::All
                } else {
                    StatusFilter::Active
                }
            }
            Some(value) => match value.to_lowercase().as_str() {
                "active" => StatusFilter::Active,
                "inactive" => StatusFilter::Inactive,
                "all" => StatusFilter::All,
                _ => {
                    return Err(AppError::Validation(
                        "status must be one of active, inactive, all".to_string(),
                    ))
                }
            },
        };

        let featured = match parse_flag("isFeatured", self.is_featured.as_deref())? {
            Some(flag) => Some(flag),
            None => parse_flag("excludeFeatured", self.exclude_featured.as_deref())?
                .filter(|exclude| *exclude)
                .map(|_| false),
        };

        Ok(ListingFilter { status, featured })
    }
}

/// Query of the plain text search
#[serde_as]
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct TextSearchQuery {
    /// Matched against title and venue name; empty lists everything upcoming
    #[serde(default)]
    #[serde_as(as = "NoneAsEmptyString")]
    pub q: Option<String>,
    #[serde(default)]
    #[serde_as(as = "NoneAsEmptyString")]
    pub page: Option<String>,
    #[serde(default)]
    #[serde_as(as = "NoneAsEmptyString")]
    pub limit: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(price: Option<Decimal>) -> EventDate {
        EventDate {
            id: Uuid::new_v4(),
            event_id: Uuid::new_v4(),
            date: NaiveDate::from_ymd_opt(2025, 1, 10).unwrap(),
            start_time: Some("20:00".to_string()),
            end_time: None,
            price,
            capacity: None,
        }
    }

    #[test]
    fn test_is_free() {
        assert!(date(None).is_free());
        assert!(date(Some(Decimal::ZERO)).is_free());
        assert!(!date(Some(Decimal::from(15))).is_free());
    }

    #[test]
    fn test_favorite_mark_serialization() {
        assert_eq!(serde_json::to_value(FavoriteMark::None).unwrap(), serde_json::json!(false));
        let id = Uuid::new_v4();
        assert_eq!(
            serde_json::to_value(FavoriteMark::Id(id)).unwrap(),
            serde_json::json!(id.to_string())
        );
    }

    #[test]
    fn test_hhmm_validation() {
        assert!(validate_hhmm("09:30").is_ok());
        assert!(validate_hhmm("23:59").is_ok());
        assert!(validate_hhmm("9:30").is_err());
        assert!(validate_hhmm("24:00").is_err());
        assert!(validate_hhmm("12:60").is_err());
        assert!(validate_hhmm("ab:cd").is_err());
    }

    #[test]
    fn test_create_event_validation() {
        let mut dto = CreateEvent {
            title: "Concierto".into(),
            description: "Rock en vivo".into(),
            category: "Música".into(),
            image_url: None,
            banner_url: None,
            website_url: None,
            ticket_urls: None,
            is_featured: None,
            is_banner: None,
            dates: vec![CreateEventDate {
                date: "2025-02-05".into(),
                start_time: Some("21:00".into()),
                end_time: None,
                price: Some(Decimal::from(20)),
                capacity: Some(300),
            }],
            location_name: None,
            department: None,
            province: None,
            district: None,
            address: None,
            latitude: None,
            longitude: None,
        };
        assert!(dto.validate().is_ok());

        dto.dates[0].date = "05/02/2025".into();
        assert!(dto.validate().is_err());
    }

    #[test]
    fn test_search_query_empty_strings_are_absent() {
        let query: EventSearchQuery =
            serde_json::from_value(serde_json::json!({ "categoria": "", "busqueda": "jazz" })).unwrap();
        assert_eq!(query.category, None);
        assert_eq!(query.text.as_deref(), Some("jazz"));
    }

    #[test]
    fn test_listing_filter_defaults_to_active() {
        let filter = ListingQuery::default().filter().unwrap();
        assert_eq!(filter.status, StatusFilter::Active);
        assert_eq!(filter.featured, None);
    }

    #[test]
    fn test_listing_filter_legacy_flags() {
        let query = ListingQuery {
            include_inactive: Some("true".into()),
            exclude_featured: Some("true".into()),
            ..Default::default()
        };
        let filter = query.filter().unwrap();
        assert_eq!(filter.status, StatusFilter::All);
        assert_eq!(filter.featured, Some(false));

        // Explicit values win over the legacy ones
        let query = ListingQuery {
            status: Some("INACTIVE".into()),
            is_featured: Some("true".into()),
            include_inactive: Some("true".into()),
            exclude_featured: Some("true".into()),
            ..Default::default()
        };
        let filter = query.filter().unwrap();
        assert_eq!(filter.status, StatusFilter::Inactive);
        assert_eq!(filter.featured, Some(true));
    }

    #[test]
    fn test_listing_filter_rejects_unknown_status() {
        let query = ListingQuery {
            status: Some("archived".into()),
            ..Default::default()
        };
        match query.filter() {
            Err(AppError::Validation(msg)) => assert!(msg.contains("status")),
            other => panic!("unexpected: {:?}", other),
        }
    }
}
