use crate::error::{AppError, AppResult};
use crate::models::{UserModel, UserRole};
use crate::response::{ApiResponse, PaginatedResponse, resolve_page};
use crate::services::member::{MemberFilter, MemberService};
use axum::{
    extract::{Path, Query},
    response::IntoResponse,
    Extension,
};
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Directory card. Email and role are never exposed here.
#[derive(Debug, Serialize, ToSchema)]
pub struct MemberResponse {
    pub id: i32,
    pub username: String,
    pub full_name: String,
    pub batch: Option<i32>,
    pub major: Option<String>,
    pub occupation: Option<String>,
    pub company: Option<String>,
    pub city: Option<String>,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
}

impl From<UserModel> for MemberResponse {
    fn from(user: UserModel) -> Self {
        Self {
            id: user.id,
            username: user.username,
            full_name: user.full_name,
            batch: user.batch,
            major: user.major,
            occupation: user.occupation,
            company: user.company,
            city: user.city,
            bio: user.bio,
            avatar_url: user.avatar_url,
        }
    }
}

/// Short author/participant reference embedded in other responses.
#[derive(Debug, Serialize, ToSchema)]
pub struct MemberSummary {
    pub id: i32,
    pub username: String,
    pub full_name: String,
    pub avatar_url: Option<String>,
}

impl From<UserModel> for MemberSummary {
    fn from(user: UserModel) -> Self {
        Self {
            id: user.id,
            username: user.username,
            full_name: user.full_name,
            avatar_url: user.avatar_url,
        }
    }
}

/// The signed-in member's own profile.
#[derive(Debug, Serialize, ToSchema)]
pub struct ProfileResponse {
    pub id: i32,
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub batch: Option<i32>,
    pub major: Option<String>,
    pub occupation: Option<String>,
    pub company: Option<String>,
    pub city: Option<String>,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
    pub role: UserRole,
    pub created_at: String,
}

impl From<UserModel> for ProfileResponse {
    fn from(user: UserModel) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            full_name: user.full_name,
            batch: user.batch,
            major: user.major,
            occupation: user.occupation,
            company: user.company,
            city: user.city,
            bio: user.bio,
            avatar_url: user.avatar_url,
            role: user.role,
            created_at: user.created_at.to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct MemberListQuery {
    /// Graduation cohort
    pub batch: Option<i32>,
    /// Major, matched case-insensitively
    pub major: Option<String>,
    /// Matches name or username
    pub search: Option<String>,
    pub page: Option<u64>,
    pub per_page: Option<u64>,
}

#[utoipa::path(
    get,
    path = "/api/v1/members",
    params(
        ("batch" = Option<i32>, Query, description = "Graduation cohort"),
        ("major" = Option<String>, Query, description = "Major"),
        ("search" = Option<String>, Query, description = "Name or username"),
        ("page" = Option<u64>, Query, description = "Page number"),
        ("per_page" = Option<u64>, Query, description = "Items per page"),
    ),
    responses(
        (status = 200, description = "Alumni directory", body = PaginatedResponse<MemberResponse>),
    ),
    tag = "members"
)]
pub async fn list_members(
    Extension(db): Extension<DatabaseConnection>,
    Query(query): Query<MemberListQuery>,
) -> AppResult<impl IntoResponse> {
    let (page, per_page) = resolve_page(query.page, query.per_page);
    let filter = MemberFilter {
        batch: query.batch,
        major: query.major,
        search: query.search,
    };

    let (members, total) = MemberService::new(db).list(&filter, page, per_page).await?;
    let items = members.into_iter().map(MemberResponse::from).collect();

    Ok(ApiResponse::ok(PaginatedResponse::new(
        items, total, page, per_page,
    )))
}

#[utoipa::path(
    get,
    path = "/api/v1/members/{id}",
    params(("id" = i32, Path, description = "Member ID")),
    responses(
        (status = 200, description = "Member profile", body = MemberResponse),
        (status = 404, description = "Member not found", body = AppError),
    ),
    tag = "members"
)]
pub async fn get_member(
    Extension(db): Extension<DatabaseConnection>,
    Path(id): Path<i32>,
) -> AppResult<impl IntoResponse> {
    let member = MemberService::new(db).get_profile(id).await?;
    Ok(ApiResponse::ok(MemberResponse::from(member)))
}
