use crate::{
    error::{AppError, AppResult},
    models::{
        event, event_registration, Event, EventModel, EventRegistration, EventRegistrationModel,
        RegistrationStatus, User, UserModel,
    },
    services::contains_ci,
};
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ActiveValue::Set, ColumnTrait, Condition, ConnectionTrait,
    DatabaseConnection, DbErr, EntityTrait, FromQueryResult, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, TransactionTrait,
};
use std::collections::HashMap;

#[derive(Debug, Clone)]
pub struct EventInput {
    pub title: String,
    pub description: String,
    pub location: String,
    pub event_date: chrono::NaiveDateTime,
    pub registration_deadline: Option<chrono::NaiveDateTime>,
    pub max_participants: Option<i32>,
    pub image_url: Option<String>,
    pub is_published: bool,
}

impl EventInput {
    fn check(&self) -> AppResult<()> {
        if let Some(deadline) = self.registration_deadline {
            if deadline > self.event_date {
                return Err(AppError::Validation(
                    "registration_deadline must not be after event_date".to_string(),
                ));
            }
        }
        if matches!(self.max_participants, Some(max) if max < 1) {
            return Err(AppError::Validation(
                "max_participants must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum EventScope {
    #[default]
    All,
    Upcoming,
    Past,
}

impl EventScope {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "all" => Some(EventScope::All),
            "upcoming" => Some(EventScope::Upcoming),
            "past" => Some(EventScope::Past),
            _ => None,
        }
    }
}

#[derive(Debug, Default, Clone)]
pub struct EventFilter {
    pub scope: EventScope,
    pub search: Option<String>,
    /// Admin listings include drafts.
    pub include_unpublished: bool,
}

#[derive(Debug, FromQueryResult)]
struct RegistrationCount {
    event_id: i32,
    count: i64,
}

pub struct EventService {
    db: DatabaseConnection,
}

impl EventService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn create(&self, created_by: i32, input: EventInput) -> AppResult<EventModel> {
        input.check()?;
        let now = chrono::Utc::now().naive_utc();

        let event = event::ActiveModel {
            title: Set(input.title.trim().to_string()),
            description: Set(input.description),
            location: Set(input.location.trim().to_string()),
            event_date: Set(input.event_date),
            registration_deadline: Set(input.registration_deadline),
            max_participants: Set(input.max_participants),
            image_url: Set(input.image_url),
            is_published: Set(input.is_published),
            created_by: Set(created_by),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&self.db)
        .await?;

        tracing::info!(event_id = event.id, created_by, "Event created");
        Ok(event)
    }

    /// Capacity cannot be lowered below the registrations already held.
    pub async fn update(&self, id: i32, input: EventInput) -> AppResult<EventModel> {
        input.check()?;

        let txn = self.db.begin().await?;
        let existing = Event::find_by_id(id)
            .lock_exclusive()
            .one(&txn)
            .await?
            .ok_or(AppError::NotFound)?;

        if let Some(max) = input.max_participants {
            let active = count_active(&txn, id).await?;
            if active > max as u64 {
                return Err(AppError::Conflict(format!(
                    "Event already has {} active registrations",
                    active
                )));
            }
        }

        let mut active: event::ActiveModel = existing.into();
        active.title = Set(input.title.trim().to_string());
        active.description = Set(input.description);
        active.location = Set(input.location.trim().to_string());
        active.event_date = Set(input.event_date);
        active.registration_deadline = Set(input.registration_deadline);
        active.max_participants = Set(input.max_participants);
        active.image_url = Set(input.image_url);
        active.is_published = Set(input.is_published);
        active.updated_at = Set(chrono::Utc::now().naive_utc());
        let updated = active.update(&txn).await?;

        txn.commit().await?;
        Ok(updated)
    }

    pub async fn delete(&self, id: i32) -> AppResult<()> {
        let result = Event::delete_by_id(id).exec(&self.db).await?;
        if result.rows_affected == 0 {
            return Err(AppError::NotFound);
        }
        tracing::info!(event_id = id, "Event deleted");
        Ok(())
    }

    pub async fn toggle_published(&self, id: i32) -> AppResult<EventModel> {
        let existing = Event::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or(AppError::NotFound)?;

        let published = !existing.is_published;
        let mut active: event::ActiveModel = existing.into();
        active.is_published = Set(published);
        active.updated_at = Set(chrono::Utc::now().naive_utc());
        Ok(active.update(&self.db).await?)
    }

    /// Unpublished events are invisible to members.
    pub async fn get(&self, id: i32, include_unpublished: bool) -> AppResult<EventModel> {
        let mut query = Event::find_by_id(id);
        if !include_unpublished {
            query = query.filter(event::Column::IsPublished.eq(true));
        }
        query.one(&self.db).await?.ok_or(AppError::NotFound)
    }

    pub async fn list(
        &self,
        filter: &EventFilter,
        page: u64,
        per_page: u64,
    ) -> AppResult<(Vec<EventModel>, u64)> {
        let now = chrono::Utc::now().naive_utc();
        let mut query = Event::find();

        if !filter.include_unpublished {
            query = query.filter(event::Column::IsPublished.eq(true));
        }
        if let Some(term) = filter.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            query = query.filter(
                Condition::any()
                    .add(contains_ci::<Event>(event::Column::Title, term))
                    .add(contains_ci::<Event>(event::Column::Location, term)),
            );
        }

        query = match filter.scope {
            EventScope::Upcoming => query
                .filter(event::Column::EventDate.gte(now))
                .order_by_asc(event::Column::EventDate),
            EventScope::Past => query
                .filter(event::Column::EventDate.lt(now))
                .order_by_desc(event::Column::EventDate),
            EventScope::All => query.order_by_desc(event::Column::EventDate),
        };

        let paginator = query
            .order_by_asc(event::Column::Id)
            .paginate(&self.db, per_page);
        let total = paginator.num_items().await?;
        let events = paginator.fetch_page(page.saturating_sub(1)).await?;
        Ok((events, total))
    }

    /// Active registrations per event, for the listed ids only.
    pub async fn registration_counts(&self, event_ids: &[i32]) -> AppResult<HashMap<i32, u64>> {
        if event_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows = EventRegistration::find()
            .select_only()
            .column(event_registration::Column::EventId)
            .column_as(Expr::col(event_registration::Column::Id).count(), "count")
            .filter(event_registration::Column::EventId.is_in(event_ids.iter().copied()))
            .filter(event_registration::Column::Status.ne(RegistrationStatus::Cancelled))
            .group_by(event_registration::Column::EventId)
            .into_model::<RegistrationCount>()
            .all(&self.db)
            .await?;

        Ok(rows
            .into_iter()
            .map(|row| (row.event_id, row.count.max(0) as u64))
            .collect())
    }

    pub async fn registration_for(
        &self,
        event_id: i32,
        user_id: i32,
    ) -> AppResult<Option<EventRegistrationModel>> {
        Ok(EventRegistration::find()
            .filter(event_registration::Column::EventId.eq(event_id))
            .filter(event_registration::Column::UserId.eq(user_id))
            .one(&self.db)
            .await?)
    }

    /// Registers `user_id` for a published event.
    ///
    /// The event row is locked (`SELECT ... FOR UPDATE`) for the whole
    /// transaction, so the capacity check and the write are serialized
    /// against every other registration for the same event.
    pub async fn register(&self, event_id: i32, user_id: i32) -> AppResult<EventRegistrationModel> {
        let txn = self.db.begin().await?;

        let event = Event::find_by_id(event_id)
            .filter(event::Column::IsPublished.eq(true))
            .lock_exclusive()
            .one(&txn)
            .await?
            .ok_or(AppError::NotFound)?;

        let now = chrono::Utc::now().naive_utc();
        if !event.is_registration_open(now) {
            return Err(AppError::Validation(
                "Registration for this event is closed".to_string(),
            ));
        }

        let existing = EventRegistration::find()
            .filter(event_registration::Column::EventId.eq(event_id))
            .filter(event_registration::Column::UserId.eq(user_id))
            .one(&txn)
            .await?;

        if existing.as_ref().is_some_and(|r| r.status.is_active()) {
            return Err(AppError::Conflict(
                "You are already registered for this event".to_string(),
            ));
        }

        if event.is_full(count_active(&txn, event_id).await?) {
            return Err(AppError::EventFull);
        }

        let registration = match existing {
            Some(previous) => {
                ensure_transition(previous.status, RegistrationStatus::Registered)?;
                let mut active: event_registration::ActiveModel = previous.into();
                active.status = Set(RegistrationStatus::Registered);
                active.registered_at = Set(now);
                active.cancelled_at = Set(None);
                active.updated_at = Set(now);
                active.update(&txn).await?
            }
            None => {
                event_registration::ActiveModel {
                    event_id: Set(event_id),
                    user_id: Set(user_id),
                    status: Set(RegistrationStatus::Registered),
                    registered_at: Set(now),
                    cancelled_at: Set(None),
                    updated_at: Set(now),
                    ..Default::default()
                }
                .insert(&txn)
                .await?
            }
        };

        txn.commit().await?;
        tracing::info!(event_id, user_id, "Registered for event");
        Ok(registration)
    }

    /// Cancels the caller's own registration, freeing the slot.
    pub async fn cancel(&self, event_id: i32, user_id: i32) -> AppResult<EventRegistrationModel> {
        let event = Event::find_by_id(event_id)
            .one(&self.db)
            .await?
            .ok_or(AppError::NotFound)?;

        if event.has_started(chrono::Utc::now().naive_utc()) {
            return Err(AppError::Validation(
                "Registrations cannot be cancelled after the event has started".to_string(),
            ));
        }

        let txn = self.db.begin().await?;

        let registration = EventRegistration::find()
            .filter(event_registration::Column::EventId.eq(event_id))
            .filter(event_registration::Column::UserId.eq(user_id))
            .lock_exclusive()
            .one(&txn)
            .await?
            .filter(|r| r.status.is_active())
            .ok_or(AppError::NotFound)?;

        let cancelled = apply_status(&txn, registration, RegistrationStatus::Cancelled).await?;
        txn.commit().await?;
        tracing::info!(event_id, user_id, "Cancelled event registration");
        Ok(cancelled)
    }

    /// Admin attendance bookkeeping: only `registered -> attended | cancelled`.
    pub async fn set_registration_status(
        &self,
        registration_id: i32,
        next: RegistrationStatus,
    ) -> AppResult<(EventRegistrationModel, EventModel)> {
        let txn = self.db.begin().await?;

        let registration = EventRegistration::find_by_id(registration_id)
            .lock_exclusive()
            .one(&txn)
            .await?
            .ok_or(AppError::NotFound)?;

        if registration.status != RegistrationStatus::Registered {
            return Err(AppError::transition(
                "registration",
                registration.status,
                next,
            ));
        }

        let event = Event::find_by_id(registration.event_id)
            .one(&txn)
            .await?
            .ok_or(AppError::NotFound)?;

        let updated = apply_status(&txn, registration, next).await?;
        txn.commit().await?;
        Ok((updated, event))
    }

    pub async fn list_registrations(
        &self,
        event_id: i32,
        status: Option<RegistrationStatus>,
        page: u64,
        per_page: u64,
    ) -> AppResult<(Vec<(EventRegistrationModel, Option<UserModel>)>, u64)> {
        Event::find_by_id(event_id)
            .one(&self.db)
            .await?
            .ok_or(AppError::NotFound)?;

        let mut query = EventRegistration::find()
            .find_also_related(User)
            .filter(event_registration::Column::EventId.eq(event_id));
        if let Some(status) = status {
            query = query.filter(event_registration::Column::Status.eq(status));
        }

        let paginator = query
            .order_by_asc(event_registration::Column::RegisteredAt)
            .order_by_asc(event_registration::Column::Id)
            .paginate(&self.db, per_page);
        let total = paginator.num_items().await?;
        let rows = paginator.fetch_page(page.saturating_sub(1)).await?;
        Ok((rows, total))
    }

    /// Events the member currently holds an active registration for,
    /// soonest first.
    pub async fn my_events(
        &self,
        user_id: i32,
        page: u64,
        per_page: u64,
    ) -> AppResult<(Vec<(EventRegistrationModel, EventModel)>, u64)> {
        let paginator = EventRegistration::find()
            .find_also_related(Event)
            .filter(event_registration::Column::UserId.eq(user_id))
            .filter(event_registration::Column::Status.ne(RegistrationStatus::Cancelled))
            .order_by_asc(event::Column::EventDate)
            .order_by_asc(event_registration::Column::Id)
            .paginate(&self.db, per_page);

        let total = paginator.num_items().await?;
        let rows = paginator
            .fetch_page(page.saturating_sub(1))
            .await?
            .into_iter()
            .filter_map(|(registration, event)| event.map(|e| (registration, e)))
            .collect();
        Ok((rows, total))
    }
}

async fn apply_status<C: ConnectionTrait>(
    conn: &C,
    registration: EventRegistrationModel,
    next: RegistrationStatus,
) -> AppResult<EventRegistrationModel> {
    ensure_transition(registration.status, next)?;

    let now = chrono::Utc::now().naive_utc();
    let mut active: event_registration::ActiveModel = registration.into();
    active.status = Set(next);
    if next == RegistrationStatus::Cancelled {
        active.cancelled_at = Set(Some(now));
    }
    active.updated_at = Set(now);
    Ok(active.update(conn).await?)
}

fn ensure_transition(from: RegistrationStatus, to: RegistrationStatus) -> AppResult<()> {
    if from.can_transition_to(to) {
        Ok(())
    } else {
        Err(AppError::transition("registration", from, to))
    }
}

async fn count_active<C: ConnectionTrait>(conn: &C, event_id: i32) -> Result<u64, DbErr> {
    EventRegistration::find()
        .filter(event_registration::Column::EventId.eq(event_id))
        .filter(event_registration::Column::Status.ne(RegistrationStatus::Cancelled))
        .count(conn)
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn input() -> EventInput {
        let date = NaiveDate::from_ymd_opt(2030, 6, 1)
            .and_then(|d| d.and_hms_opt(18, 0, 0))
            .unwrap();
        EventInput {
            title: "Reuni Akbar".into(),
            description: String::new(),
            location: "Aula".into(),
            event_date: date,
            registration_deadline: None,
            max_participants: None,
            image_url: None,
            is_published: true,
        }
    }

    #[test]
    fn deadline_after_event_is_rejected() {
        let mut e = input();
        e.registration_deadline = Some(e.event_date + chrono::Duration::hours(1));
        assert!(matches!(e.check(), Err(AppError::Validation(_))));
    }

    #[test]
    fn capacity_must_be_positive() {
        let mut e = input();
        e.max_participants = Some(0);
        assert!(e.check().is_err());
        e.max_participants = Some(1);
        assert!(e.check().is_ok());
    }

    #[test]
    fn scope_parsing() {
        assert_eq!(EventScope::parse("Upcoming"), Some(EventScope::Upcoming));
        assert_eq!(EventScope::parse("past"), Some(EventScope::Past));
        assert_eq!(EventScope::parse("soon"), None);
    }

    #[test]
    fn attended_cannot_be_reopened() {
        let err = ensure_transition(RegistrationStatus::Attended, RegistrationStatus::Registered)
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidTransition { .. }));
    }
}
