use crate::error::{AppError, AppResult};
use crate::handlers::member::MemberSummary;
use crate::middleware::AuthUser;
use crate::models::{ArticleModel, ArticleStatus, UserModel};
use crate::response::{resolve_page, ApiResponse, PaginatedResponse};
use crate::services::article::{ArticleInput, ArticleService};
use crate::services::member::MemberService;
use crate::utils::render_markdown;
use axum::{
    extract::{Path, Query},
    response::IntoResponse,
    Extension, Json,
};
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Serialize, ToSchema)]
pub struct ArticleSummary {
    pub id: i32,
    pub title: String,
    pub slug: String,
    pub excerpt: Option<String>,
    pub cover_image_url: Option<String>,
    pub status: ArticleStatus,
    pub published_at: Option<String>,
    pub views_count: i32,
}

impl From<ArticleModel> for ArticleSummary {
    fn from(a: ArticleModel) -> Self {
        Self {
            id: a.id,
            title: a.title,
            slug: a.slug,
            excerpt: a.excerpt,
            cover_image_url: a.cover_image_url,
            status: a.status,
            published_at: a.published_at.map(|t| t.to_string()),
            views_count: a.views_count,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ArticleResponse {
    pub id: i32,
    pub title: String,
    pub slug: String,
    pub excerpt: Option<String>,
    /// Raw Markdown
    pub content: String,
    /// Sanitized HTML
    pub content_html: String,
    pub cover_image_url: Option<String>,
    pub status: ArticleStatus,
    pub author: Option<MemberSummary>,
    pub published_at: Option<String>,
    pub views_count: i32,
    pub created_at: String,
    pub updated_at: String,
}

impl ArticleResponse {
    fn new(a: ArticleModel, author: Option<UserModel>) -> Self {
        Self {
            id: a.id,
            title: a.title,
            slug: a.slug,
            excerpt: a.excerpt,
            content_html: render_markdown(&a.content),
            content: a.content,
            cover_image_url: a.cover_image_url,
            status: a.status,
            author: author.map(MemberSummary::from),
            published_at: a.published_at.map(|t| t.to_string()),
            views_count: a.views_count,
            created_at: a.created_at.to_string(),
            updated_at: a.updated_at.to_string(),
        }
    }
}

async fn with_author(db: DatabaseConnection, article: ArticleModel) -> AppResult<ArticleResponse> {
    let author_id = article.author_id;
    let author = MemberService::new(db)
        .find_many(&[author_id])
        .await?
        .remove(&author_id);
    Ok(ArticleResponse::new(article, author))
}

#[derive(Debug, Deserialize)]
pub struct ArticleListQuery {
    pub search: Option<String>,
    pub status: Option<ArticleStatus>,
    pub page: Option<u64>,
    pub per_page: Option<u64>,
}

#[utoipa::path(
    get,
    path = "/api/v1/articles",
    params(
        ("search" = Option<String>, Query, description = "Title contains"),
        ("page" = Option<u64>, Query, description = "Page number"),
        ("per_page" = Option<u64>, Query, description = "Items per page"),
    ),
    responses(
        (status = 200, description = "Published articles, newest first", body = PaginatedResponse<ArticleSummary>),
    ),
    tag = "articles"
)]
pub async fn list_articles(
    Extension(db): Extension<DatabaseConnection>,
    Query(query): Query<ArticleListQuery>,
) -> AppResult<impl IntoResponse> {
    let (page, per_page) = resolve_page(query.page, query.per_page);
    let (articles, total) = ArticleService::new(db)
        .list(
            Some(ArticleStatus::Published),
            query.search.as_deref(),
            page,
            per_page,
        )
        .await?;

    let items = articles.into_iter().map(ArticleSummary::from).collect();
    Ok(ApiResponse::ok(PaginatedResponse::new(
        items, total, page, per_page,
    )))
}

#[utoipa::path(
    get,
    path = "/api/v1/articles/{slug}",
    params(("slug" = String, Path, description = "Article slug")),
    responses(
        (status = 200, description = "Published article", body = ArticleResponse),
        (status = 404, description = "Article not found", body = AppError),
    ),
    tag = "articles"
)]
pub async fn get_article(
    Extension(db): Extension<DatabaseConnection>,
    Path(slug): Path<String>,
) -> AppResult<impl IntoResponse> {
    let article = ArticleService::new(db.clone()).view_published(&slug).await?;
    Ok(ApiResponse::ok(with_author(db, article).await?))
}

// Admin

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ArticleRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    /// Derived from the title when omitted
    #[validate(length(min = 1, max = 200))]
    pub slug: Option<String>,
    /// Derived from the content when omitted
    #[validate(length(max = 500))]
    pub excerpt: Option<String>,
    /// Markdown body
    #[validate(length(min = 1))]
    pub content: String,
    #[validate(length(max = 500))]
    pub cover_image_url: Option<String>,
}

impl From<ArticleRequest> for ArticleInput {
    fn from(req: ArticleRequest) -> Self {
        Self {
            title: req.title,
            slug: req.slug,
            excerpt: req.excerpt,
            content: req.content,
            cover_image_url: req.cover_image_url,
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/v1/admin/articles",
    security(("jwt_token" = [])),
    params(
        ("status" = Option<ArticleStatus>, Query, description = "draft or published"),
        ("search" = Option<String>, Query, description = "Title contains"),
        ("page" = Option<u64>, Query, description = "Page number"),
        ("per_page" = Option<u64>, Query, description = "Items per page"),
    ),
    responses(
        (status = 200, description = "All articles", body = PaginatedResponse<ArticleSummary>),
        (status = 403, description = "Admin only", body = AppError),
    ),
    tag = "articles"
)]
pub async fn admin_list_articles(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    Query(query): Query<ArticleListQuery>,
) -> AppResult<impl IntoResponse> {
    auth_user.require_admin()?;
    let (page, per_page) = resolve_page(query.page, query.per_page);
    let (articles, total) = ArticleService::new(db)
        .list(query.status, query.search.as_deref(), page, per_page)
        .await?;

    let items = articles.into_iter().map(ArticleSummary::from).collect();
    Ok(ApiResponse::ok(PaginatedResponse::new(
        items, total, page, per_page,
    )))
}

#[utoipa::path(
    post,
    path = "/api/v1/admin/articles",
    security(("jwt_token" = [])),
    request_body = ArticleRequest,
    responses(
        (status = 200, description = "Draft created", body = ArticleResponse),
        (status = 400, description = "Validation error", body = AppError),
    ),
    tag = "articles"
)]
pub async fn create_article(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    Json(payload): Json<ArticleRequest>,
) -> AppResult<impl IntoResponse> {
    let admin_id = auth_user.require_admin()?;
    payload
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let article = ArticleService::new(db.clone())
        .create(admin_id, payload.into())
        .await?;
    Ok(ApiResponse::ok(with_author(db, article).await?))
}

#[utoipa::path(
    put,
    path = "/api/v1/admin/articles/{id}",
    security(("jwt_token" = [])),
    params(("id" = i32, Path, description = "Article ID")),
    request_body = ArticleRequest,
    responses(
        (status = 200, description = "Article updated", body = ArticleResponse),
        (status = 404, description = "Article not found", body = AppError),
    ),
    tag = "articles"
)]
pub async fn update_article(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    Path(id): Path<i32>,
    Json(payload): Json<ArticleRequest>,
) -> AppResult<impl IntoResponse> {
    auth_user.require_admin()?;
    payload
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let article = ArticleService::new(db.clone())
        .update(id, payload.into())
        .await?;
    Ok(ApiResponse::ok(with_author(db, article).await?))
}

#[utoipa::path(
    put,
    path = "/api/v1/admin/articles/{id}/publish",
    security(("jwt_token" = [])),
    params(("id" = i32, Path, description = "Article ID")),
    responses(
        (status = 200, description = "Publish state toggled", body = ArticleResponse),
        (status = 404, description = "Article not found", body = AppError),
    ),
    tag = "articles"
)]
pub async fn toggle_publish_article(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    Path(id): Path<i32>,
) -> AppResult<impl IntoResponse> {
    auth_user.require_admin()?;
    let article = ArticleService::new(db.clone()).toggle_published(id).await?;
    Ok(ApiResponse::ok(with_author(db, article).await?))
}

#[utoipa::path(
    delete,
    path = "/api/v1/admin/articles/{id}",
    security(("jwt_token" = [])),
    params(("id" = i32, Path, description = "Article ID")),
    responses(
        (status = 200, description = "Article deleted", body = String),
        (status = 404, description = "Article not found", body = AppError),
    ),
    tag = "articles"
)]
pub async fn delete_article(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    Path(id): Path<i32>,
) -> AppResult<impl IntoResponse> {
    auth_user.require_admin()?;
    ArticleService::new(db).delete(id).await?;
    Ok(ApiResponse::ok("Article deleted"))
}
