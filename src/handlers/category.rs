use crate::error::{AppError, AppResult};
use crate::middleware::AuthUser;
use crate::models::CategoryModel;
use crate::response::ApiResponse;
use crate::services::cache::CacheService;
use crate::services::category::{CategoryInput, CategoryService};
use axum::{extract::Path, response::IntoResponse, Extension, Json};
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CategoryRequest {
    /// Category name (1-100 characters)
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    /// URL slug; derived from the name when omitted
    #[validate(length(min = 1, max = 100))]
    pub slug: Option<String>,
    /// Category description (max 500 characters)
    #[validate(length(max = 500))]
    #[serde(default)]
    pub description: String,
    /// Display sort order
    pub sort_order: Option<i32>,
}

impl From<CategoryRequest> for CategoryInput {
    fn from(req: CategoryRequest) -> Self {
        Self {
            name: req.name,
            slug: req.slug,
            description: req.description,
            sort_order: req.sort_order.unwrap_or(0),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CategoryResponse {
    pub id: i32,
    pub name: String,
    pub slug: String,
    pub description: String,
    pub sort_order: i32,
    pub created_at: String,
}

impl From<CategoryModel> for CategoryResponse {
    fn from(c: CategoryModel) -> Self {
        Self {
            id: c.id,
            name: c.name,
            slug: c.slug,
            description: c.description,
            sort_order: c.sort_order,
            created_at: c.created_at.to_string(),
        }
    }
}

fn category_service(db: DatabaseConnection, cache: Option<Extension<CacheService>>) -> CategoryService {
    CategoryService::new(db).with_cache(cache.map(|c| c.0))
}

#[utoipa::path(
    get,
    path = "/api/v1/categories",
    responses(
        (status = 200, description = "Forum categories", body = Vec<CategoryResponse>),
    ),
    tag = "forum"
)]
pub async fn list_categories(
    Extension(db): Extension<DatabaseConnection>,
    cache: Option<Extension<CacheService>>,
) -> AppResult<impl IntoResponse> {
    let categories = category_service(db, cache).list().await?;
    let response: Vec<CategoryResponse> =
        categories.into_iter().map(CategoryResponse::from).collect();
    Ok(ApiResponse::ok(response))
}

#[utoipa::path(
    post,
    path = "/api/v1/admin/categories",
    security(("jwt_token" = [])),
    request_body = CategoryRequest,
    responses(
        (status = 200, description = "Category created", body = CategoryResponse),
        (status = 400, description = "Validation error", body = AppError),
        (status = 403, description = "Admin only", body = AppError),
        (status = 409, description = "Name or slug taken", body = AppError),
    ),
    tag = "forum"
)]
pub async fn create_category(
    Extension(db): Extension<DatabaseConnection>,
    cache: Option<Extension<CacheService>>,
    auth_user: AuthUser,
    Json(payload): Json<CategoryRequest>,
) -> AppResult<impl IntoResponse> {
    auth_user.require_admin()?;
    payload
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let category = category_service(db, cache).create(payload.into()).await?;
    Ok(ApiResponse::ok(CategoryResponse::from(category)))
}

#[utoipa::path(
    put,
    path = "/api/v1/admin/categories/{id}",
    security(("jwt_token" = [])),
    params(("id" = i32, Path, description = "Category ID")),
    request_body = CategoryRequest,
    responses(
        (status = 200, description = "Category updated", body = CategoryResponse),
        (status = 404, description = "Category not found", body = AppError),
        (status = 409, description = "Name or slug taken", body = AppError),
    ),
    tag = "forum"
)]
pub async fn update_category(
    Extension(db): Extension<DatabaseConnection>,
    cache: Option<Extension<CacheService>>,
    auth_user: AuthUser,
    Path(id): Path<i32>,
    Json(payload): Json<CategoryRequest>,
) -> AppResult<impl IntoResponse> {
    auth_user.require_admin()?;
    payload
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let category = category_service(db, cache).update(id, payload.into()).await?;
    Ok(ApiResponse::ok(CategoryResponse::from(category)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/admin/categories/{id}",
    security(("jwt_token" = [])),
    params(("id" = i32, Path, description = "Category ID")),
    responses(
        (status = 200, description = "Category deleted", body = String),
        (status = 404, description = "Category not found", body = AppError),
        (status = 409, description = "Category still has discussions", body = AppError),
    ),
    tag = "forum"
)]
pub async fn delete_category(
    Extension(db): Extension<DatabaseConnection>,
    cache: Option<Extension<CacheService>>,
    auth_user: AuthUser,
    Path(id): Path<i32>,
) -> AppResult<impl IntoResponse> {
    auth_user.require_admin()?;
    category_service(db, cache).delete(id).await?;
    Ok(ApiResponse::ok("Category deleted"))
}
