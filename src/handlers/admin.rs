use crate::error::{AppError, AppResult};
use crate::middleware::AuthUser;
use crate::models::{UserModel, UserRole};
use crate::response::{resolve_page, ApiResponse, PaginatedResponse};
use crate::services::admin::{AdminService, AdminStats};
use axum::{extract::Path, extract::Query, response::IntoResponse, Extension, Json};
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateRoleRequest {
    /// `admin`, `alumni` or `banned`
    pub role: UserRole,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct StatsResponse {
    /// Members that are not banned
    pub members: u64,
    pub published_events: u64,
    pub upcoming_events: u64,
    pub active_registrations: u64,
    pub pending_gallery_items: u64,
    pub pending_reports: u64,
    pub discussions: u64,
    pub published_articles: u64,
}

impl From<AdminStats> for StatsResponse {
    fn from(s: AdminStats) -> Self {
        Self {
            members: s.members,
            published_events: s.published_events,
            upcoming_events: s.upcoming_events,
            active_registrations: s.active_registrations,
            pending_gallery_items: s.pending_gallery_items,
            pending_reports: s.pending_reports,
            discussions: s.discussions,
            published_articles: s.published_articles,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AdminUserResponse {
    pub id: i32,
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub batch: Option<i32>,
    pub major: Option<String>,
    pub role: UserRole,
    pub created_at: String,
}

impl From<UserModel> for AdminUserResponse {
    fn from(u: UserModel) -> Self {
        Self {
            id: u.id,
            username: u.username,
            email: u.email,
            full_name: u.full_name,
            batch: u.batch,
            major: u.major,
            role: u.role,
            created_at: u.created_at.to_string(),
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/v1/admin/stats",
    security(("jwt_token" = [])),
    responses(
        (status = 200, description = "Dashboard counters", body = StatsResponse),
        (status = 403, description = "Admin only", body = AppError),
    ),
    tag = "admin"
)]
pub async fn get_stats(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
) -> AppResult<impl IntoResponse> {
    auth_user.require_admin()?;
    let stats = AdminService::new(db).get_stats().await?;
    Ok(ApiResponse::ok(StatsResponse::from(stats)))
}

#[derive(Debug, Deserialize)]
pub struct UserListQuery {
    pub role: Option<UserRole>,
    pub search: Option<String>,
    pub page: Option<u64>,
    pub per_page: Option<u64>,
}

#[utoipa::path(
    get,
    path = "/api/v1/admin/users",
    security(("jwt_token" = [])),
    params(
        ("role" = Option<UserRole>, Query, description = "Filter by role"),
        ("search" = Option<String>, Query, description = "Username, email or name"),
        ("page" = Option<u64>, Query, description = "Page number"),
        ("per_page" = Option<u64>, Query, description = "Items per page"),
    ),
    responses(
        (status = 200, description = "List of users", body = PaginatedResponse<AdminUserResponse>),
        (status = 403, description = "Admin only", body = AppError),
    ),
    tag = "admin"
)]
pub async fn list_users(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    Query(params): Query<UserListQuery>,
) -> AppResult<impl IntoResponse> {
    auth_user.require_admin()?;
    let (page, per_page) = resolve_page(params.page, params.per_page);

    let (users, total) = AdminService::new(db)
        .list_users(params.role, params.search.as_deref(), page, per_page)
        .await?;
    let items = users.into_iter().map(AdminUserResponse::from).collect();

    Ok(ApiResponse::ok(PaginatedResponse::new(
        items, total, page, per_page,
    )))
}

#[utoipa::path(
    put,
    path = "/api/v1/admin/users/{id}/role",
    security(("jwt_token" = [])),
    params(("id" = i32, Path, description = "User ID")),
    request_body = UpdateRoleRequest,
    responses(
        (status = 200, description = "Role updated", body = AdminUserResponse),
        (status = 400, description = "Cannot change own role", body = AppError),
        (status = 403, description = "Admin only", body = AppError),
        (status = 404, description = "User not found", body = AppError),
    ),
    tag = "admin"
)]
pub async fn update_user_role(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateRoleRequest>,
) -> AppResult<impl IntoResponse> {
    let admin_id = auth_user.require_admin()?;
    let user = AdminService::new(db)
        .update_user_role(admin_id, id, payload.role)
        .await?;
    Ok(ApiResponse::ok(AdminUserResponse::from(user)))
}
