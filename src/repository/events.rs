//! Events repository

use std::collections::{HashMap, HashSet};

use sqlx::{Pool, Postgres, Transaction};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{
        event::{
            CategoryStats, CreateEvent, CreateEventDate, Event, EventDate, ListingFilter,
            Location, StatusFilter, TicketUrl, UpdateEvent,
        },
        user::Organizer,
    },
    search::{CoarseFilter, PageRequest},
};

use super::users::PUBLIC_USER_SELECT;

const EVENT_DATE_COLUMNS: &str =
    "id, event_id, date, start_time, end_time, price, capacity";

#[derive(Clone)]
pub struct EventsRepository {
    pool: Pool<Postgres>,
}

/// Escape LIKE wildcards in user input
fn like_pattern(text: &str) -> String {
    let escaped = text
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

impl EventsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Active events matching the event-level filter, newest first, fully
    /// loaded with dates, venue and organizer. No pagination: the date-level
    /// filter runs in memory afterwards.
    pub async fn candidates(&self, filter: &CoarseFilter) -> AppResult<Vec<Event>> {
        let mut conditions = vec!["e.is_active = TRUE".to_string()];
        let mut binds: Vec<String> = Vec::new();

        macro_rules! add_eq {
            ($field:expr, $column:expr) => {
                if let Some(ref value) = $field {
                    binds.push(value.clone());
                    conditions.push(format!("LOWER({}) = LOWER(${})", $column, binds.len()));
                }
            };
        }

        add_eq!(filter.category, "e.category");
        add_eq!(filter.department, "l.department");
        add_eq!(filter.province, "l.province");
        add_eq!(filter.district, "l.district");

        if let Some(ref text) = filter.text {
            binds.push(like_pattern(text));
            let idx = binds.len();
            conditions.push(format!("(e.title ILIKE ${idx} OR l.name ILIKE ${idx})"));
        }
        if filter.exclude_featured {
            conditions.push("e.is_featured = FALSE".to_string());
        }
        if filter.featured_only {
            conditions.push("e.is_featured = TRUE".to_string());
        }

        let query = format!(
            r#"
            SELECT e.* FROM events e
            LEFT JOIN locations l ON l.id = e.location_id
            WHERE {}
            ORDER BY e.created_at DESC
            "#,
            conditions.join(" AND ")
        );

        let mut builder = sqlx::query_as::<_, Event>(&query);
        for value in &binds {
            builder = builder.bind(value);
        }
        let events = builder.fetch_all(&self.pool).await?;

        self.hydrate(events).await
    }

    /// Attach dates (ascending), venue and organizer to each event
    pub async fn hydrate(&self, mut events: Vec<Event>) -> AppResult<Vec<Event>> {
        if events.is_empty() {
            return Ok(events);
        }

        let event_ids: Vec<Uuid> = events.iter().map(|e| e.id).collect();
        let location_ids: Vec<Uuid> = events
            .iter()
            .filter_map(|e| e.location_id)
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();
        let user_ids: Vec<Uuid> = events
            .iter()
            .map(|e| e.user_id)
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();

        let dates = sqlx::query_as::<_, EventDate>(&format!(
            "SELECT {} FROM event_dates WHERE event_id = ANY($1) ORDER BY date, start_time",
            EVENT_DATE_COLUMNS
        ))
        .bind(&event_ids)
        .fetch_all(&self.pool)
        .await?;

        let locations = sqlx::query_as::<_, Location>("SELECT * FROM locations WHERE id = ANY($1)")
            .bind(&location_ids)
            .fetch_all(&self.pool)
            .await?;

        let organizers = sqlx::query_as::<_, Organizer>(&format!(
            "{} WHERE u.id = ANY($1)",
            PUBLIC_USER_SELECT
        ))
        .bind(&user_ids)
        .fetch_all(&self.pool)
        .await?;

        let mut dates_by_event: HashMap<Uuid, Vec<EventDate>> = HashMap::new();
        for date in dates {
            dates_by_event.entry(date.event_id).or_default().push(date);
        }
        let locations: HashMap<Uuid, Location> =
            locations.into_iter().map(|l| (l.id, l)).collect();
        let organizers: HashMap<Uuid, Organizer> =
            organizers.into_iter().map(|o| (o.id, o)).collect();

        for event in &mut events {
            event.dates = dates_by_event.remove(&event.id).unwrap_or_default();
            event.location = event.location_id.and_then(|id| locations.get(&id).cloned());
            event.user = organizers.get(&event.user_id).cloned();
        }

        Ok(events)
    }

    /// Event row without its aggregate
    pub async fn find(&self, id: Uuid) -> AppResult<Option<Event>> {
        let event = sqlx::query_as::<_, Event>("SELECT * FROM events WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(event)
    }

    /// Fully loaded event, any status
    pub async fn get_by_id(&self, id: Uuid) -> AppResult<Event> {
        let event = self
            .find(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Event {} not found", id)))?;
        let mut loaded = self.hydrate(vec![event]).await?;
        loaded
            .pop()
            .ok_or_else(|| AppError::NotFound(format!("Event {} not found", id)))
    }

    /// Fully loaded events by id, in no particular order; unknown ids are skipped
    pub async fn find_many(&self, ids: &[Uuid]) -> AppResult<Vec<Event>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let rows = sqlx::query_as::<_, Event>("SELECT * FROM events WHERE id = ANY($1)")
            .bind(ids)
            .fetch_all(&self.pool)
            .await?;
        self.hydrate(rows).await
    }

    /// Dates of an event in chronological order
    pub async fn dates_of(&self, event_id: Uuid) -> AppResult<Vec<EventDate>> {
        let dates = sqlx::query_as::<_, EventDate>(&format!(
            "SELECT {} FROM event_dates WHERE event_id = $1 ORDER BY date, start_time",
            EVENT_DATE_COLUMNS
        ))
        .bind(event_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(dates)
    }

    /// A date, only when it belongs to `event_id`
    pub async fn date_of(&self, event_id: Uuid, date_id: Uuid) -> AppResult<Option<EventDate>> {
        let date = sqlx::query_as::<_, EventDate>(&format!(
            "SELECT {} FROM event_dates WHERE id = $1 AND event_id = $2",
            EVENT_DATE_COLUMNS
        ))
        .bind(date_id)
        .bind(event_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(date)
    }

    /// Active events of one organizer, newest first
    pub async fn list_by_user(
        &self,
        user_id: Uuid,
        page: PageRequest,
    ) -> AppResult<(Vec<Event>, i64)> {
        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM events WHERE user_id = $1 AND is_active = TRUE",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        let rows = sqlx::query_as::<_, Event>(
            r#"
            SELECT * FROM events
            WHERE user_id = $1 AND is_active = TRUE
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(user_id)
        .bind(page.limit)
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;

        Ok((self.hydrate(rows).await?, total))
    }

    /// General listing, newest first
    pub async fn list(
        &self,
        filter: ListingFilter,
        page: PageRequest,
    ) -> AppResult<(Vec<Event>, i64)> {
        let mut conditions: Vec<&str> = Vec::new();
        match filter.status {
            StatusFilter::Active => conditions.push("is_active = TRUE"),
            StatusFilter::Inactive => conditions.push("is_active = FALSE"),
            StatusFilter::All => {}
        }
        match filter.featured {
            Some(true) => conditions.push("is_featured = TRUE"),
            Some(false) => conditions.push("is_featured = FALSE"),
            None => {}
        }
        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };

        let total: i64 =
            sqlx::query_scalar(&format!("SELECT COUNT(*) FROM events {}", where_clause))
                .fetch_one(&self.pool)
                .await?;

        let rows = sqlx::query_as::<_, Event>(&format!(
            "SELECT * FROM events {} ORDER BY created_at DESC LIMIT $1 OFFSET $2",
            where_clause
        ))
        .bind(page.limit)
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;

        Ok((self.hydrate(rows).await?, total))
    }

    /// Active events of a category (case-insensitive), newest first
    pub async fn by_category(
        &self,
        category: &str,
        page: PageRequest,
    ) -> AppResult<(Vec<Event>, i64)> {
        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM events WHERE is_active = TRUE AND LOWER(category) = LOWER($1)",
        )
        .bind(category)
        .fetch_one(&self.pool)
        .await?;

        let rows = sqlx::query_as::<_, Event>(
            r#"
            SELECT * FROM events
            WHERE is_active = TRUE AND LOWER(category) = LOWER($1)
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(category)
        .bind(page.limit)
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;

        Ok((self.hydrate(rows).await?, total))
    }

    /// Personalized feed: with `authors`, events by those organizers plus
    /// featured ones; without, every active event. Featured first.
    pub async fn feed(
        &self,
        authors: Option<&[Uuid]>,
        page: PageRequest,
    ) -> AppResult<(Vec<Event>, i64)> {
        let authors: Vec<Uuid> = authors.map(<[Uuid]>::to_vec).unwrap_or_default();
        let scope = if authors.is_empty() {
            "is_active = TRUE"
        } else {
            "is_active = TRUE AND (user_id = ANY($1) OR is_featured = TRUE)"
        };

        let count_q = format!("SELECT COUNT(*) FROM events WHERE {}", scope);
        let mut count_builder = sqlx::query_scalar::<_, i64>(&count_q);
        if !authors.is_empty() {
            count_builder = count_builder.bind(&authors);
        }
        let total = count_builder.fetch_one(&self.pool).await?;

        let (limit_idx, offset_idx) = if authors.is_empty() { (1, 2) } else { (2, 3) };
        let select_q = format!(
            "SELECT * FROM events WHERE {} ORDER BY is_featured DESC, created_at DESC LIMIT ${} OFFSET ${}",
            scope, limit_idx, offset_idx
        );
        let mut builder = sqlx::query_as::<_, Event>(&select_q);
        if !authors.is_empty() {
            builder = builder.bind(&authors);
        }
        let rows = builder
            .bind(page.limit)
            .bind(page.offset())
            .fetch_all(&self.pool)
            .await?;

        Ok((self.hydrate(rows).await?, total))
    }

    /// Active events of a category, newest first
    pub async fn related(
        &self,
        category: &str,
        exclude: Option<Uuid>,
        exclude_featured: bool,
        limit: i64,
    ) -> AppResult<Vec<Event>> {
        let rows = sqlx::query_as::<_, Event>(
            r#"
            SELECT * FROM events
            WHERE is_active = TRUE
              AND LOWER(category) = LOWER($1)
              AND ($2::uuid IS NULL OR id <> $2)
              AND (NOT $3 OR is_featured = FALSE)
            ORDER BY created_at DESC
            LIMIT $4
            "#,
        )
        .bind(category)
        .bind(exclude)
        .bind(exclude_featured)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        self.hydrate(rows).await
    }

    /// Every event of an organizer, any status
    pub async fn owned_by(&self, user_id: Uuid) -> AppResult<Vec<Event>> {
        let rows = sqlx::query_as::<_, Event>(
            "SELECT * FROM events WHERE user_id = $1 ORDER BY created_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        self.hydrate(rows).await
    }

    /// Active categories with their number of active events
    pub async fn category_stats(&self) -> AppResult<Vec<CategoryStats>> {
        let rows = sqlx::query_as::<_, CategoryStats>(
            r#"
            SELECT c.id, c.name, c.icon, c.is_active, COUNT(e.id) AS count
            FROM categories c
            LEFT JOIN events e
                   ON LOWER(e.category) = LOWER(c.name) AND e.is_active = TRUE
            WHERE c.is_active = TRUE
            GROUP BY c.id, c.name, c.icon, c.is_active, c.sort_order
            ORDER BY c.sort_order, c.name
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Create an event with its venue and dates
    pub async fn create(&self, user_id: Uuid, data: &CreateEvent) -> AppResult<Event> {
        let mut tx = self.pool.begin().await?;

        let location_id = match (&data.department, &data.province, &data.district) {
            (Some(department), Some(province), Some(district)) => Some(
                sqlx::query_scalar::<_, Uuid>(
                    r#"
                    INSERT INTO locations (name, department, province, district, address, latitude, longitude)
                    VALUES ($1, $2, $3, $4, $5, $6, $7)
                    RETURNING id
                    "#,
                )
                .bind(&data.location_name)
                .bind(department)
                .bind(province)
                .bind(district)
                .bind(&data.address)
                .bind(data.latitude)
                .bind(data.longitude)
                .fetch_one(&mut *tx)
                .await?,
            ),
            _ => None,
        };

        let event_id = sqlx::query_scalar::<_, Uuid>(
            r#"
            INSERT INTO events (
                title, description, category, image_url, banner_url, website_url,
                ticket_urls, is_featured, is_banner, user_id, location_id
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING id
            "#,
        )
        .bind(&data.title)
        .bind(&data.description)
        .bind(&data.category)
        .bind(&data.image_url)
        .bind(&data.banner_url)
        .bind(&data.website_url)
        .bind(ticket_urls_json(data.ticket_urls.as_deref())?)
        .bind(data.is_featured.unwrap_or(false))
        .bind(data.is_banner.unwrap_or(false))
        .bind(user_id)
        .bind(location_id)
        .fetch_one(&mut *tx)
        .await?;

        insert_dates(&mut tx, event_id, &data.dates).await?;
        tx.commit().await?;

        self.get_by_id(event_id).await
    }

    /// Partial update. A non-empty `dates` list replaces every existing date.
    pub async fn update(&self, existing: &Event, data: &UpdateEvent) -> AppResult<Event> {
        let mut tx = self.pool.begin().await?;

        let mut location_id = existing.location_id;
        if data.touches_location() {
            match existing.location_id {
                Some(id) => {
                    sqlx::query(
                        r#"
                        UPDATE locations SET
                            name = COALESCE($2, name),
                            department = COALESCE($3, department),
                            province = COALESCE($4, province),
                            district = COALESCE($5, district),
                            address = COALESCE($6, address),
                            latitude = COALESCE($7, latitude),
                            longitude = COALESCE($8, longitude)
                        WHERE id = $1
                        "#,
                    )
                    .bind(id)
                    .bind(&data.location_name)
                    .bind(&data.department)
                    .bind(&data.province)
                    .bind(&data.district)
                    .bind(&data.address)
                    .bind(data.latitude)
                    .bind(data.longitude)
                    .execute(&mut *tx)
                    .await?;
                }
                None => {
                    if let (Some(department), Some(province), Some(district)) =
                        (&data.department, &data.province, &data.district)
                    {
                        let id = sqlx::query_scalar::<_, Uuid>(
                            r#"
                            INSERT INTO locations (name, department, province, district, address, latitude, longitude)
                            VALUES ($1, $2, $3, $4, $5, $6, $7)
                            RETURNING id
                            "#,
                        )
                        .bind(&data.location_name)
                        .bind(department)
                        .bind(province)
                        .bind(district)
                        .bind(&data.address)
                        .bind(data.latitude)
                        .bind(data.longitude)
                        .fetch_one(&mut *tx)
                        .await?;
                        location_id = Some(id);
                    }
                }
            }
        }

        let mut sets = vec!["updated_at = NOW()".to_string()];
        let mut idx = 2;

        macro_rules! add_f {
            ($field:expr, $name:expr) => {
                if $field.is_some() { sets.push(format!("{} = ${}", $name, idx)); idx += 1; }
            };
        }

        add_f!(data.title, "title");
        add_f!(data.description, "description");
        add_f!(data.category, "category");
        add_f!(data.image_url, "image_url");
        add_f!(data.banner_url, "banner_url");
        add_f!(data.website_url, "website_url");
        add_f!(data.ticket_urls, "ticket_urls");
        add_f!(data.is_featured, "is_featured");
        add_f!(data.is_banner, "is_banner");
        if location_id != existing.location_id {
            sets.push(format!("location_id = ${}", idx));
        }

        let query = format!("UPDATE events SET {} WHERE id = $1", sets.join(", "));
        let ticket_urls = ticket_urls_json(data.ticket_urls.as_deref())?;

        let mut builder = sqlx::query(&query).bind(existing.id);

        macro_rules! bind_f {
            ($field:expr) => {
                if let Some(ref val) = $field { builder = builder.bind(val); }
            };
        }

        bind_f!(data.title);
        bind_f!(data.description);
        bind_f!(data.category);
        bind_f!(data.image_url);
        bind_f!(data.banner_url);
        bind_f!(data.website_url);
        bind_f!(ticket_urls);
        bind_f!(data.is_featured);
        bind_f!(data.is_banner);
        if location_id != existing.location_id {
            builder = builder.bind(location_id);
        }
        builder.execute(&mut *tx).await?;

        if let Some(dates) = data.dates.as_ref().filter(|d| !d.is_empty()) {
            sqlx::query("DELETE FROM event_dates WHERE event_id = $1")
                .bind(existing.id)
                .execute(&mut *tx)
                .await?;
            insert_dates(&mut tx, existing.id, dates).await?;
        }

        tx.commit().await?;
        self.get_by_id(existing.id).await
    }

    pub async fn set_active(&self, id: Uuid, is_active: bool) -> AppResult<()> {
        let result = sqlx::query("UPDATE events SET is_active = $2, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .bind(is_active)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Event {} not found", id)));
        }
        Ok(())
    }

    /// Delete an event; dates and favorites cascade
    pub async fn delete(&self, id: Uuid) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM events WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Event {} not found", id)));
        }
        Ok(())
    }
}

fn ticket_urls_json(urls: Option<&[TicketUrl]>) -> AppResult<Option<serde_json::Value>> {
    urls.map(serde_json::to_value)
        .transpose()
        .map_err(|e| AppError::Internal(format!("Failed to encode ticket urls: {}", e)))
}

async fn insert_dates(
    tx: &mut Transaction<'_, Postgres>,
    event_id: Uuid,
    dates: &[CreateEventDate],
) -> AppResult<()> {
    for date in dates {
        let day = date
            .parsed_date()
            .ok_or_else(|| AppError::Validation(format!("Invalid date: {}", date.date)))?;
        sqlx::query(
            r#"
            INSERT INTO event_dates (event_id, date, start_time, end_time, price, capacity)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(event_id)
        .bind(day)
        .bind(&date.start_time)
        .bind(&date.end_time)
        .bind(date.price)
        .bind(date.capacity)
        .execute(&mut **tx)
        .await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("jazz"), "%jazz%");
        assert_eq!(like_pattern("100%"), "%100\\%%");
        assert_eq!(like_pattern("a_b"), "%a\\_b%");
    }

    #[test]
    fn test_ticket_urls_json() {
        assert_eq!(ticket_urls_json(None).unwrap(), None);
        let urls = vec![TicketUrl {
            name: "Teleticket".into(),
            url: "https://teleticket.com.pe/x".into(),
        }];
        let value = ticket_urls_json(Some(&urls)).unwrap().unwrap();
        assert_eq!(value[0]["name"], "Teleticket");
    }
}
