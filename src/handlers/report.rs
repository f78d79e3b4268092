use crate::error::{AppError, AppResult};
use crate::middleware::AuthUser;
use crate::models::{ForumReportModel, ForumTarget, ReportStatus};
use crate::response::{resolve_page, ApiResponse, PaginatedResponse};
use crate::services::report::{ReportService, Resolution, REPORT_REASONS};
use axum::{extract::Path, extract::Query, response::IntoResponse, Extension, Json};
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateReportRequest {
    /// `discussion` or `reply`
    pub target_type: ForumTarget,
    pub target_id: i32,
    /// One of: spam, harassment, inappropriate, misinformation, other
    #[validate(length(min = 1, max = 50))]
    pub reason: String,
    /// Detailed description
    #[validate(length(max = 2000))]
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ListReportsQuery {
    pub status: Option<ReportStatus>,
    pub page: Option<u64>,
    pub per_page: Option<u64>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ResolveReportRequest {
    /// `reviewed`, `resolved` or `rejected`
    pub status: ReportStatus,
    #[validate(length(max = 2000))]
    pub admin_notes: Option<String>,
    /// Delete the reported content; only with `resolved`
    #[serde(default)]
    pub delete_content: bool,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ReportResponse {
    pub id: i32,
    pub reporter_id: i32,
    pub target_type: ForumTarget,
    pub target_id: i32,
    pub reason: String,
    pub description: Option<String>,
    pub status: ReportStatus,
    pub admin_notes: Option<String>,
    pub content_deleted: bool,
    pub reviewed_by: Option<i32>,
    pub reviewed_at: Option<String>,
    pub created_at: String,
}

impl From<ForumReportModel> for ReportResponse {
    fn from(r: ForumReportModel) -> Self {
        Self {
            id: r.id,
            reporter_id: r.reporter_id,
            target_type: r.target_type,
            target_id: r.target_id,
            reason: r.reason,
            description: r.description,
            status: r.status,
            admin_notes: r.admin_notes,
            content_deleted: r.content_deleted,
            reviewed_by: r.reviewed_by,
            reviewed_at: r.reviewed_at.map(|t| t.to_string()),
            created_at: r.created_at.to_string(),
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/v1/reports/reasons",
    responses(
        (status = 200, description = "Accepted report reasons", body = Vec<String>),
    ),
    tag = "reports"
)]
pub async fn list_report_reasons() -> impl IntoResponse {
    ApiResponse::ok(REPORT_REASONS.to_vec())
}

#[utoipa::path(
    post,
    path = "/api/v1/reports",
    security(("jwt_token" = [])),
    request_body = CreateReportRequest,
    responses(
        (status = 200, description = "Report filed", body = ReportResponse),
        (status = 400, description = "Unknown reason", body = AppError),
        (status = 404, description = "Reported content not found", body = AppError),
        (status = 409, description = "Already reported", body = AppError),
    ),
    tag = "reports"
)]
pub async fn create_report(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    Json(payload): Json<CreateReportRequest>,
) -> AppResult<impl IntoResponse> {
    payload
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let report = ReportService::new(db)
        .create(
            auth_user.user_id,
            payload.target_type,
            payload.target_id,
            &payload.reason,
            payload.description.as_deref(),
        )
        .await?;
    Ok(ApiResponse::with_message(
        ReportResponse::from(report),
        "Report submitted",
    ))
}

#[utoipa::path(
    get,
    path = "/api/v1/admin/reports",
    security(("jwt_token" = [])),
    params(
        ("status" = Option<ReportStatus>, Query, description = "Filter by status"),
        ("page" = Option<u64>, Query, description = "Page number"),
        ("per_page" = Option<u64>, Query, description = "Items per page"),
    ),
    responses(
        (status = 200, description = "Reports", body = PaginatedResponse<ReportResponse>),
        (status = 403, description = "Admin only", body = AppError),
    ),
    tag = "reports"
)]
pub async fn list_reports(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    Query(query): Query<ListReportsQuery>,
) -> AppResult<impl IntoResponse> {
    auth_user.require_admin()?;
    let (page, per_page) = resolve_page(query.page, query.per_page);
    let (reports, total) = ReportService::new(db)
        .list(query.status, page, per_page)
        .await?;

    let items = reports.into_iter().map(ReportResponse::from).collect();
    Ok(ApiResponse::ok(PaginatedResponse::new(
        items, total, page, per_page,
    )))
}

#[utoipa::path(
    patch,
    path = "/api/v1/admin/reports/{id}",
    security(("jwt_token" = [])),
    params(("id" = i32, Path, description = "Report ID")),
    request_body = ResolveReportRequest,
    responses(
        (status = 200, description = "Report updated", body = ReportResponse),
        (status = 400, description = "Invalid transition", body = AppError),
        (status = 404, description = "Report not found", body = AppError),
    ),
    tag = "reports"
)]
pub async fn resolve_report(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    Path(id): Path<i32>,
    Json(payload): Json<ResolveReportRequest>,
) -> AppResult<impl IntoResponse> {
    let admin_id = auth_user.require_admin()?;
    payload
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let report = ReportService::new(db)
        .resolve(
            id,
            admin_id,
            Resolution {
                status: payload.status,
                admin_notes: payload.admin_notes,
                delete_content: payload.delete_content,
            },
        )
        .await?;
    Ok(ApiResponse::ok(ReportResponse::from(report)))
}
