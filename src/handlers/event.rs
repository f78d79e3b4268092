use crate::error::{AppError, AppResult};
use crate::handlers::member::MemberSummary;
use crate::middleware::{AuthUser, MaybeAuthUser};
use crate::models::{EventModel, EventRegistrationModel, RegistrationStatus, UserModel};
use crate::response::{resolve_page, ApiResponse, PaginatedResponse, PaginationQuery};
use crate::services::event::{EventFilter, EventInput, EventScope, EventService};
use crate::services::notification::{NotificationKind, NotificationService, NotificationTarget};
use crate::utils::render_markdown;
use crate::websocket::NotificationHub;
use axum::{
    extract::{Path, Query},
    response::IntoResponse,
    Extension, Json,
};
use chrono::NaiveDateTime;
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct EventRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    /// Markdown
    pub description: String,
    #[validate(length(min = 1, max = 255))]
    pub location: String,
    #[schema(value_type = String, example = "2030-06-01T18:00:00")]
    pub event_date: NaiveDateTime,
    /// Defaults to the start of the event
    #[schema(value_type = Option<String>)]
    pub registration_deadline: Option<NaiveDateTime>,
    /// Omit for unlimited capacity
    #[validate(range(min = 1))]
    pub max_participants: Option<i32>,
    #[validate(length(max = 500))]
    pub image_url: Option<String>,
    #[serde(default)]
    pub is_published: bool,
}

impl From<EventRequest> for EventInput {
    fn from(req: EventRequest) -> Self {
        Self {
            title: req.title,
            description: req.description,
            location: req.location,
            event_date: req.event_date,
            registration_deadline: req.registration_deadline,
            max_participants: req.max_participants,
            image_url: req.image_url,
            is_published: req.is_published,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct EventResponse {
    pub id: i32,
    pub title: String,
    pub description: String,
    pub description_html: String,
    pub location: String,
    pub event_date: String,
    pub registration_deadline: Option<String>,
    pub max_participants: Option<i32>,
    /// Active (non-cancelled) registrations
    pub registered_count: u64,
    /// `None` when capacity is unlimited
    pub spots_left: Option<u64>,
    pub registration_open: bool,
    pub image_url: Option<String>,
    pub is_published: bool,
    /// The viewer's own registration status, if any
    pub my_registration: Option<RegistrationStatus>,
    pub created_at: String,
}

impl EventResponse {
    fn new(
        event: EventModel,
        registered_count: u64,
        my_registration: Option<RegistrationStatus>,
    ) -> Self {
        let now = chrono::Utc::now().naive_utc();
        let spots_left = event
            .max_participants
            .map(|max| (max.max(0) as u64).saturating_sub(registered_count));
        let registration_open =
            event.is_registration_open(now) && !event.is_full(registered_count);
        Self {
            id: event.id,
            description_html: render_markdown(&event.description),
            title: event.title,
            description: event.description,
            location: event.location,
            event_date: event.event_date.to_string(),
            registration_deadline: event.registration_deadline.map(|d| d.to_string()),
            max_participants: event.max_participants,
            registered_count,
            spots_left,
            registration_open,
            image_url: event.image_url,
            is_published: event.is_published,
            my_registration,
            created_at: event.created_at.to_string(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RegistrationResponse {
    pub id: i32,
    pub event_id: i32,
    pub status: RegistrationStatus,
    pub registered_at: String,
    pub cancelled_at: Option<String>,
    pub member: Option<MemberSummary>,
}

impl RegistrationResponse {
    fn new(reg: EventRegistrationModel, member: Option<UserModel>) -> Self {
        Self {
            id: reg.id,
            event_id: reg.event_id,
            status: reg.status,
            registered_at: reg.registered_at.to_string(),
            cancelled_at: reg.cancelled_at.map(|d| d.to_string()),
            member: member.map(MemberSummary::from),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MyEventResponse {
    pub registration: RegistrationResponse,
    pub event: EventResponse,
}

#[derive(Debug, Deserialize)]
pub struct EventListQuery {
    /// `upcoming`, `past` or `all` (default)
    pub scope: Option<String>,
    /// Matches title or location
    pub search: Option<String>,
    pub page: Option<u64>,
    pub per_page: Option<u64>,
}

impl EventListQuery {
    fn filter(&self, include_unpublished: bool) -> AppResult<EventFilter> {
        let scope = match self.scope.as_deref() {
            None => EventScope::All,
            Some(raw) => EventScope::parse(raw)
                .ok_or_else(|| AppError::Validation(format!("Unknown scope '{raw}'")))?,
        };
        Ok(EventFilter {
            scope,
            search: self.search.clone(),
            include_unpublished,
        })
    }
}

async fn list_events_page(
    service: &EventService,
    filter: EventFilter,
    page: u64,
    per_page: u64,
    viewer_id: Option<i32>,
) -> AppResult<PaginatedResponse<EventResponse>> {
    let (events, total) = service.list(&filter, page, per_page).await?;
    let ids: Vec<i32> = events.iter().map(|e| e.id).collect();
    let counts = service.registration_counts(&ids).await?;

    let mut mine: HashMap<i32, RegistrationStatus> = HashMap::new();
    if let Some(user_id) = viewer_id {
        for id in &ids {
            if let Some(reg) = service.registration_for(*id, user_id).await? {
                mine.insert(*id, reg.status);
            }
        }
    }

    let items = events
        .into_iter()
        .map(|e| {
            let count = counts.get(&e.id).copied().unwrap_or(0);
            let status = mine.get(&e.id).copied();
            EventResponse::new(e, count, status)
        })
        .collect();
    Ok(PaginatedResponse::new(items, total, page, per_page))
}

#[utoipa::path(
    get,
    path = "/api/v1/events",
    params(
        ("scope" = Option<String>, Query, description = "upcoming, past or all"),
        ("search" = Option<String>, Query, description = "Title or location"),
        ("page" = Option<u64>, Query, description = "Page number"),
        ("per_page" = Option<u64>, Query, description = "Items per page"),
    ),
    responses(
        (status = 200, description = "Published events", body = PaginatedResponse<EventResponse>),
        (status = 400, description = "Unknown scope", body = AppError),
    ),
    tag = "events"
)]
pub async fn list_events(
    Extension(db): Extension<DatabaseConnection>,
    viewer: MaybeAuthUser,
    Query(query): Query<EventListQuery>,
) -> AppResult<impl IntoResponse> {
    let (page, per_page) = resolve_page(query.page, query.per_page);
    let filter = query.filter(false)?;
    let service = EventService::new(db);
    let response = list_events_page(&service, filter, page, per_page, viewer.user_id()).await?;
    Ok(ApiResponse::ok(response))
}

#[utoipa::path(
    get,
    path = "/api/v1/events/{id}",
    params(("id" = i32, Path, description = "Event ID")),
    responses(
        (status = 200, description = "Event details", body = EventResponse),
        (status = 404, description = "Event not found", body = AppError),
    ),
    tag = "events"
)]
pub async fn get_event(
    Extension(db): Extension<DatabaseConnection>,
    viewer: MaybeAuthUser,
    Path(id): Path<i32>,
) -> AppResult<impl IntoResponse> {
    let service = EventService::new(db);
    let event = service.get(id, viewer.is_admin()).await?;
    let count = service
        .registration_counts(&[id])
        .await?
        .get(&id)
        .copied()
        .unwrap_or(0);
    let mine = match viewer.user_id() {
        Some(user_id) => service.registration_for(id, user_id).await?.map(|r| r.status),
        None => None,
    };
    Ok(ApiResponse::ok(EventResponse::new(event, count, mine)))
}

#[utoipa::path(
    post,
    path = "/api/v1/events/{id}/register",
    security(("jwt_token" = [])),
    params(("id" = i32, Path, description = "Event ID")),
    responses(
        (status = 200, description = "Registered", body = RegistrationResponse),
        (status = 400, description = "Registration closed", body = AppError),
        (status = 404, description = "Event not found", body = AppError),
        (status = 409, description = "Already registered or event full", body = AppError),
    ),
    tag = "events"
)]
pub async fn register_for_event(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    Path(id): Path<i32>,
) -> AppResult<impl IntoResponse> {
    let registration = EventService::new(db).register(id, auth_user.user_id).await?;
    Ok(ApiResponse::with_message(
        RegistrationResponse::new(registration, None),
        "Registration successful",
    ))
}

#[utoipa::path(
    post,
    path = "/api/v1/events/{id}/cancel",
    security(("jwt_token" = [])),
    params(("id" = i32, Path, description = "Event ID")),
    responses(
        (status = 200, description = "Registration cancelled", body = RegistrationResponse),
        (status = 400, description = "Event already started", body = AppError),
        (status = 404, description = "No active registration", body = AppError),
    ),
    tag = "events"
)]
pub async fn cancel_registration(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    Path(id): Path<i32>,
) -> AppResult<impl IntoResponse> {
    let registration = EventService::new(db).cancel(id, auth_user.user_id).await?;
    Ok(ApiResponse::with_message(
        RegistrationResponse::new(registration, None),
        "Registration cancelled",
    ))
}

#[utoipa::path(
    get,
    path = "/api/v1/my/events",
    security(("jwt_token" = [])),
    params(
        ("page" = Option<u64>, Query, description = "Page number"),
        ("per_page" = Option<u64>, Query, description = "Items per page"),
    ),
    responses(
        (status = 200, description = "Events the member is registered for", body = PaginatedResponse<MyEventResponse>),
    ),
    tag = "events"
)]
pub async fn my_events(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    Query(pagination): Query<PaginationQuery>,
) -> AppResult<impl IntoResponse> {
    let (page, per_page) = pagination.resolve();
    let service = EventService::new(db);
    let (rows, total) = service.my_events(auth_user.user_id, page, per_page).await?;

    let ids: Vec<i32> = rows.iter().map(|(_, e)| e.id).collect();
    let counts = service.registration_counts(&ids).await?;

    let items = rows
        .into_iter()
        .map(|(reg, event)| {
            let count = counts.get(&event.id).copied().unwrap_or(0);
            let status = reg.status;
            MyEventResponse {
                registration: RegistrationResponse::new(reg, None),
                event: EventResponse::new(event, count, Some(status)),
            }
        })
        .collect();

    Ok(ApiResponse::ok(PaginatedResponse::new(
        items, total, page, per_page,
    )))
}

// Admin

#[utoipa::path(
    get,
    path = "/api/v1/admin/events",
    security(("jwt_token" = [])),
    params(
        ("scope" = Option<String>, Query, description = "upcoming, past or all"),
        ("search" = Option<String>, Query, description = "Title or location"),
        ("page" = Option<u64>, Query, description = "Page number"),
        ("per_page" = Option<u64>, Query, description = "Items per page"),
    ),
    responses(
        (status = 200, description = "All events including drafts", body = PaginatedResponse<EventResponse>),
        (status = 403, description = "Admin only", body = AppError),
    ),
    tag = "events"
)]
pub async fn admin_list_events(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    Query(query): Query<EventListQuery>,
) -> AppResult<impl IntoResponse> {
    auth_user.require_admin()?;
    let (page, per_page) = resolve_page(query.page, query.per_page);
    let filter = query.filter(true)?;
    let service = EventService::new(db);
    let response = list_events_page(&service, filter, page, per_page, None).await?;
    Ok(ApiResponse::ok(response))
}

#[utoipa::path(
    post,
    path = "/api/v1/admin/events",
    security(("jwt_token" = [])),
    request_body = EventRequest,
    responses(
        (status = 200, description = "Event created", body = EventResponse),
        (status = 400, description = "Validation error", body = AppError),
        (status = 403, description = "Admin only", body = AppError),
    ),
    tag = "events"
)]
pub async fn create_event(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    Json(payload): Json<EventRequest>,
) -> AppResult<impl IntoResponse> {
    let admin_id = auth_user.require_admin()?;
    payload
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let event = EventService::new(db).create(admin_id, payload.into()).await?;
    Ok(ApiResponse::ok(EventResponse::new(event, 0, None)))
}

#[utoipa::path(
    put,
    path = "/api/v1/admin/events/{id}",
    security(("jwt_token" = [])),
    params(("id" = i32, Path, description = "Event ID")),
    request_body = EventRequest,
    responses(
        (status = 200, description = "Event updated", body = EventResponse),
        (status = 400, description = "Validation error", body = AppError),
        (status = 404, description = "Event not found", body = AppError),
        (status = 409, description = "Capacity below current registrations", body = AppError),
    ),
    tag = "events"
)]
pub async fn update_event(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    Path(id): Path<i32>,
    Json(payload): Json<EventRequest>,
) -> AppResult<impl IntoResponse> {
    auth_user.require_admin()?;
    payload
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let service = EventService::new(db);
    let event = service.update(id, payload.into()).await?;
    let count = service
        .registration_counts(&[id])
        .await?
        .get(&id)
        .copied()
        .unwrap_or(0);
    Ok(ApiResponse::ok(EventResponse::new(event, count, None)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/admin/events/{id}",
    security(("jwt_token" = [])),
    params(("id" = i32, Path, description = "Event ID")),
    responses(
        (status = 200, description = "Event deleted", body = String),
        (status = 404, description = "Event not found", body = AppError),
    ),
    tag = "events"
)]
pub async fn delete_event(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    Path(id): Path<i32>,
) -> AppResult<impl IntoResponse> {
    auth_user.require_admin()?;
    EventService::new(db).delete(id).await?;
    Ok(ApiResponse::ok("Event deleted"))
}

#[utoipa::path(
    put,
    path = "/api/v1/admin/events/{id}/publish",
    security(("jwt_token" = [])),
    params(("id" = i32, Path, description = "Event ID")),
    responses(
        (status = 200, description = "Publish flag toggled", body = EventResponse),
        (status = 404, description = "Event not found", body = AppError),
    ),
    tag = "events"
)]
pub async fn toggle_publish_event(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    Path(id): Path<i32>,
) -> AppResult<impl IntoResponse> {
    auth_user.require_admin()?;
    let service = EventService::new(db);
    let event = service.toggle_published(id).await?;
    let count = service
        .registration_counts(&[id])
        .await?
        .get(&id)
        .copied()
        .unwrap_or(0);
    Ok(ApiResponse::ok(EventResponse::new(event, count, None)))
}

#[derive(Debug, Deserialize)]
pub struct RegistrationListQuery {
    /// `registered`, `attended` or `cancelled`
    pub status: Option<RegistrationStatus>,
    pub page: Option<u64>,
    pub per_page: Option<u64>,
}

#[utoipa::path(
    get,
    path = "/api/v1/admin/events/{id}/registrations",
    security(("jwt_token" = [])),
    params(
        ("id" = i32, Path, description = "Event ID"),
        ("status" = Option<RegistrationStatus>, Query, description = "registered, attended or cancelled"),
        ("page" = Option<u64>, Query, description = "Page number"),
        ("per_page" = Option<u64>, Query, description = "Items per page"),
    ),
    responses(
        (status = 200, description = "Registrations for the event", body = PaginatedResponse<RegistrationResponse>),
        (status = 404, description = "Event not found", body = AppError),
    ),
    tag = "events"
)]
pub async fn list_registrations(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    Path(id): Path<i32>,
    Query(query): Query<RegistrationListQuery>,
) -> AppResult<impl IntoResponse> {
    auth_user.require_admin()?;
    let (page, per_page) = resolve_page(query.page, query.per_page);
    let (rows, total) = EventService::new(db)
        .list_registrations(id, query.status, page, per_page)
        .await?;

    let items = rows
        .into_iter()
        .map(|(reg, member)| RegistrationResponse::new(reg, member))
        .collect();
    Ok(ApiResponse::ok(PaginatedResponse::new(
        items, total, page, per_page,
    )))
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateRegistrationRequest {
    /// `attended` or `cancelled`
    pub status: RegistrationStatus,
}

#[utoipa::path(
    patch,
    path = "/api/v1/admin/registrations/{id}",
    security(("jwt_token" = [])),
    params(("id" = i32, Path, description = "Registration ID")),
    request_body = UpdateRegistrationRequest,
    responses(
        (status = 200, description = "Registration updated", body = RegistrationResponse),
        (status = 400, description = "Invalid status transition", body = AppError),
        (status = 404, description = "Registration not found", body = AppError),
    ),
    tag = "events"
)]
pub async fn update_registration_status(
    Extension(db): Extension<DatabaseConnection>,
    Extension(hub): Extension<NotificationHub>,
    auth_user: AuthUser,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateRegistrationRequest>,
) -> AppResult<impl IntoResponse> {
    let admin_id = auth_user.require_admin()?;
    let (registration, event) = EventService::new(db.clone())
        .set_registration_status(id, payload.status)
        .await?;

    let message = match registration.status {
        RegistrationStatus::Attended => format!("Kehadiran Anda di \"{}\" telah dicatat", event.title),
        _ => format!("Pendaftaran Anda untuk \"{}\" dibatalkan oleh admin", event.title),
    };
    NotificationService::new(db, hub)
        .notify_quietly(
            registration.user_id,
            Some(admin_id),
            NotificationKind::RegistrationUpdated,
            NotificationTarget::event(event.id),
            &message,
        )
        .await;

    Ok(ApiResponse::ok(RegistrationResponse::new(registration, None)))
}
