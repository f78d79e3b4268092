use crate::error::{AppError, AppResult};
use crate::handlers::member::MemberSummary;
use crate::middleware::AuthUser;
use crate::models::{DiscussionModel, ForumTarget, ReplyModel, UserModel};
use crate::response::{resolve_page, ApiResponse, PaginatedResponse, PaginationQuery};
use crate::services::category::CategoryService;
use crate::services::discussion::DiscussionService;
use crate::services::like::{LikeOutcome, LikeService};
use crate::services::member::MemberService;
use crate::services::notification::{NotificationKind, NotificationService, NotificationTarget};
use crate::services::reply::ReplyService;
use crate::utils::{render_markdown, render_plain_excerpt};
use crate::websocket::NotificationHub;
use axum::{
    extract::{Path, Query},
    response::IntoResponse,
    Extension, Json,
};
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use utoipa::ToSchema;
use validator::Validate;

const LIST_EXCERPT_CHARS: usize = 200;

#[derive(Debug, Serialize, ToSchema)]
pub struct DiscussionResponse {
    pub id: i32,
    pub category_id: i32,
    pub title: String,
    /// Raw Markdown
    pub content: String,
    /// Sanitized HTML
    pub content_html: String,
    pub author: Option<MemberSummary>,
    pub is_pinned: bool,
    pub is_locked: bool,
    pub views_count: i32,
    pub likes_count: i32,
    pub replies_count: i32,
    pub last_reply_at: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl DiscussionResponse {
    fn new(d: DiscussionModel, author: Option<UserModel>) -> Self {
        Self {
            id: d.id,
            category_id: d.category_id,
            title: d.title,
            content_html: render_markdown(&d.content),
            content: d.content,
            author: author.map(MemberSummary::from),
            is_pinned: d.is_pinned,
            is_locked: d.is_locked,
            views_count: d.views_count,
            likes_count: d.likes_count,
            replies_count: d.replies_count,
            last_reply_at: d.last_reply_at.map(|t| t.to_string()),
            created_at: d.created_at.to_string(),
            updated_at: d.updated_at.to_string(),
        }
    }
}

/// Listing row: plain-text excerpt instead of the full body.
#[derive(Debug, Serialize, ToSchema)]
pub struct DiscussionSummary {
    pub id: i32,
    pub category_id: i32,
    pub title: String,
    pub excerpt: String,
    pub author: Option<MemberSummary>,
    pub is_pinned: bool,
    pub is_locked: bool,
    pub views_count: i32,
    pub likes_count: i32,
    pub replies_count: i32,
    pub last_reply_at: Option<String>,
    pub created_at: String,
}

impl DiscussionSummary {
    fn new(d: DiscussionModel, author: Option<UserModel>) -> Self {
        Self {
            id: d.id,
            category_id: d.category_id,
            title: d.title,
            excerpt: render_plain_excerpt(&d.content, LIST_EXCERPT_CHARS),
            author: author.map(MemberSummary::from),
            is_pinned: d.is_pinned,
            is_locked: d.is_locked,
            views_count: d.views_count,
            likes_count: d.likes_count,
            replies_count: d.replies_count,
            last_reply_at: d.last_reply_at.map(|t| t.to_string()),
            created_at: d.created_at.to_string(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ReplyResponse {
    pub id: i32,
    pub discussion_id: i32,
    pub content: String,
    pub content_html: String,
    pub author: Option<MemberSummary>,
    pub likes_count: i32,
    pub created_at: String,
    pub updated_at: String,
}

impl ReplyResponse {
    fn new(r: ReplyModel, author: Option<UserModel>) -> Self {
        Self {
            id: r.id,
            discussion_id: r.discussion_id,
            content_html: render_markdown(&r.content),
            content: r.content,
            author: author.map(MemberSummary::from),
            likes_count: r.likes_count,
            created_at: r.created_at.to_string(),
            updated_at: r.updated_at.to_string(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LikeResponse {
    pub liked: bool,
    pub likes_count: i32,
}

impl From<LikeOutcome> for LikeResponse {
    fn from(outcome: LikeOutcome) -> Self {
        Self {
            liked: outcome.liked,
            likes_count: outcome.likes_count,
        }
    }
}

async fn authors(db: &DatabaseConnection, ids: Vec<i32>) -> AppResult<HashMap<i32, UserModel>> {
    let mut ids = ids;
    ids.sort_unstable();
    ids.dedup();
    MemberService::new(db.clone()).find_many(&ids).await
}

async fn author(db: &DatabaseConnection, id: i32) -> AppResult<Option<UserModel>> {
    Ok(authors(db, vec![id]).await?.remove(&id))
}

#[derive(Debug, Deserialize)]
pub struct DiscussionListQuery {
    pub search: Option<String>,
    pub page: Option<u64>,
    pub per_page: Option<u64>,
}

#[utoipa::path(
    get,
    path = "/api/v1/categories/{slug}/discussions",
    params(
        ("slug" = String, Path, description = "Category slug"),
        ("search" = Option<String>, Query, description = "Title contains"),
        ("page" = Option<u64>, Query, description = "Page number"),
        ("per_page" = Option<u64>, Query, description = "Items per page"),
    ),
    responses(
        (status = 200, description = "Discussions, pinned first", body = PaginatedResponse<DiscussionSummary>),
        (status = 404, description = "Category not found", body = AppError),
    ),
    tag = "forum"
)]
pub async fn list_discussions(
    Extension(db): Extension<DatabaseConnection>,
    Path(slug): Path<String>,
    Query(query): Query<DiscussionListQuery>,
) -> AppResult<impl IntoResponse> {
    let (page, per_page) = resolve_page(query.page, query.per_page);
    let category = CategoryService::new(db.clone()).get_by_slug(&slug).await?;

    let (discussions, total) = DiscussionService::new(db.clone())
        .list_by_category(category.id, query.search.as_deref(), page, per_page)
        .await?;

    let users = authors(&db, discussions.iter().map(|d| d.user_id).collect()).await?;
    let items = discussions
        .into_iter()
        .map(|d| {
            let author = users.get(&d.user_id).cloned();
            DiscussionSummary::new(d, author)
        })
        .collect();

    Ok(ApiResponse::ok(PaginatedResponse::new(
        items, total, page, per_page,
    )))
}

#[utoipa::path(
    get,
    path = "/api/v1/discussions/{id}",
    params(("id" = i32, Path, description = "Discussion ID")),
    responses(
        (status = 200, description = "Discussion", body = DiscussionResponse),
        (status = 404, description = "Discussion not found", body = AppError),
    ),
    tag = "forum"
)]
pub async fn get_discussion(
    Extension(db): Extension<DatabaseConnection>,
    Path(id): Path<i32>,
) -> AppResult<impl IntoResponse> {
    let discussion = DiscussionService::new(db.clone()).view(id).await?;
    let author = author(&db, discussion.user_id).await?;
    Ok(ApiResponse::ok(DiscussionResponse::new(discussion, author)))
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateDiscussionRequest {
    pub category_id: i32,
    /// Title (1-200 characters)
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    /// Markdown body
    #[validate(length(min = 1, max = 20000))]
    pub content: String,
}

#[utoipa::path(
    post,
    path = "/api/v1/discussions",
    security(("jwt_token" = [])),
    request_body = CreateDiscussionRequest,
    responses(
        (status = 200, description = "Discussion created", body = DiscussionResponse),
        (status = 400, description = "Validation error or unknown category", body = AppError),
    ),
    tag = "forum"
)]
pub async fn create_discussion(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    Json(payload): Json<CreateDiscussionRequest>,
) -> AppResult<impl IntoResponse> {
    payload
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let discussion = DiscussionService::new(db.clone())
        .create(
            auth_user.user_id,
            payload.category_id,
            &payload.title,
            &payload.content,
        )
        .await?;
    let author = author(&db, discussion.user_id).await?;
    Ok(ApiResponse::ok(DiscussionResponse::new(discussion, author)))
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateDiscussionRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: Option<String>,
    #[validate(length(min = 1, max = 20000))]
    pub content: Option<String>,
}

#[utoipa::path(
    put,
    path = "/api/v1/discussions/{id}",
    security(("jwt_token" = [])),
    params(("id" = i32, Path, description = "Discussion ID")),
    request_body = UpdateDiscussionRequest,
    responses(
        (status = 200, description = "Discussion updated", body = DiscussionResponse),
        (status = 403, description = "Not the author", body = AppError),
        (status = 404, description = "Discussion not found", body = AppError),
    ),
    tag = "forum"
)]
pub async fn update_discussion(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateDiscussionRequest>,
) -> AppResult<impl IntoResponse> {
    payload
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let discussion = DiscussionService::new(db.clone())
        .update(
            id,
            auth_user.user_id,
            payload.title.as_deref(),
            payload.content.as_deref(),
        )
        .await?;
    let author = author(&db, discussion.user_id).await?;
    Ok(ApiResponse::ok(DiscussionResponse::new(discussion, author)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/discussions/{id}",
    security(("jwt_token" = [])),
    params(("id" = i32, Path, description = "Discussion ID")),
    responses(
        (status = 200, description = "Discussion deleted", body = String),
        (status = 403, description = "Not the author", body = AppError),
        (status = 404, description = "Discussion not found", body = AppError),
    ),
    tag = "forum"
)]
pub async fn delete_discussion(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    Path(id): Path<i32>,
) -> AppResult<impl IntoResponse> {
    DiscussionService::new(db)
        .delete(id, auth_user.user_id, auth_user.is_admin())
        .await?;
    Ok(ApiResponse::ok("Discussion deleted"))
}

#[utoipa::path(
    put,
    path = "/api/v1/discussions/{id}/pin",
    security(("jwt_token" = [])),
    params(("id" = i32, Path, description = "Discussion ID")),
    responses(
        (status = 200, description = "Pin toggled", body = DiscussionResponse),
        (status = 403, description = "Admin only", body = AppError),
        (status = 404, description = "Discussion not found", body = AppError),
    ),
    tag = "forum"
)]
pub async fn pin_discussion(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    Path(id): Path<i32>,
) -> AppResult<impl IntoResponse> {
    auth_user.require_admin()?;
    let discussion = DiscussionService::new(db.clone()).toggle_pin(id).await?;
    let author = author(&db, discussion.user_id).await?;
    Ok(ApiResponse::ok(DiscussionResponse::new(discussion, author)))
}

#[utoipa::path(
    put,
    path = "/api/v1/discussions/{id}/lock",
    security(("jwt_token" = [])),
    params(("id" = i32, Path, description = "Discussion ID")),
    responses(
        (status = 200, description = "Lock toggled", body = DiscussionResponse),
        (status = 403, description = "Admin only", body = AppError),
        (status = 404, description = "Discussion not found", body = AppError),
    ),
    tag = "forum"
)]
pub async fn lock_discussion(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    Path(id): Path<i32>,
) -> AppResult<impl IntoResponse> {
    auth_user.require_admin()?;
    let discussion = DiscussionService::new(db.clone()).toggle_lock(id).await?;
    let author = author(&db, discussion.user_id).await?;
    Ok(ApiResponse::ok(DiscussionResponse::new(discussion, author)))
}

// Replies

#[utoipa::path(
    get,
    path = "/api/v1/discussions/{id}/replies",
    params(
        ("id" = i32, Path, description = "Discussion ID"),
        ("page" = Option<u64>, Query, description = "Page number"),
        ("per_page" = Option<u64>, Query, description = "Items per page"),
    ),
    responses(
        (status = 200, description = "Replies, oldest first", body = PaginatedResponse<ReplyResponse>),
        (status = 404, description = "Discussion not found", body = AppError),
    ),
    tag = "forum"
)]
pub async fn list_replies(
    Extension(db): Extension<DatabaseConnection>,
    Path(id): Path<i32>,
    Query(pagination): Query<PaginationQuery>,
) -> AppResult<impl IntoResponse> {
    let (page, per_page) = pagination.resolve();
    let (replies, total) = ReplyService::new(db.clone()).list(id, page, per_page).await?;

    let users = authors(&db, replies.iter().map(|r| r.user_id).collect()).await?;
    let items = replies
        .into_iter()
        .map(|r| {
            let author = users.get(&r.user_id).cloned();
            ReplyResponse::new(r, author)
        })
        .collect();

    Ok(ApiResponse::ok(PaginatedResponse::new(
        items, total, page, per_page,
    )))
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ReplyRequest {
    /// Markdown body
    #[validate(length(min = 1, max = 10000))]
    pub content: String,
}

#[utoipa::path(
    post,
    path = "/api/v1/discussions/{id}/replies",
    security(("jwt_token" = [])),
    params(("id" = i32, Path, description = "Discussion ID")),
    request_body = ReplyRequest,
    responses(
        (status = 200, description = "Reply posted", body = ReplyResponse),
        (status = 404, description = "Discussion not found", body = AppError),
        (status = 409, description = "Discussion is locked", body = AppError),
    ),
    tag = "forum"
)]
pub async fn create_reply(
    Extension(db): Extension<DatabaseConnection>,
    Extension(hub): Extension<NotificationHub>,
    auth_user: AuthUser,
    Path(id): Path<i32>,
    Json(payload): Json<ReplyRequest>,
) -> AppResult<impl IntoResponse> {
    payload
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let (reply, parent) = ReplyService::new(db.clone())
        .create(id, auth_user.user_id, &payload.content)
        .await?;

    let replier = author(&db, reply.user_id).await?;
    let name = replier
        .as_ref()
        .map(|u| u.full_name.as_str())
        .unwrap_or("Seseorang");
    let message = format!("{} membalas diskusi \"{}\"", name, parent.title);
    NotificationService::new(db, hub)
        .notify_quietly(
            parent.user_id,
            Some(auth_user.user_id),
            NotificationKind::Reply,
            NotificationTarget::discussion(parent.id),
            &message,
        )
        .await;

    Ok(ApiResponse::ok(ReplyResponse::new(reply, replier)))
}

#[utoipa::path(
    put,
    path = "/api/v1/replies/{id}",
    security(("jwt_token" = [])),
    params(("id" = i32, Path, description = "Reply ID")),
    request_body = ReplyRequest,
    responses(
        (status = 200, description = "Reply updated", body = ReplyResponse),
        (status = 403, description = "Not the author", body = AppError),
        (status = 404, description = "Reply not found", body = AppError),
    ),
    tag = "forum"
)]
pub async fn update_reply(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    Path(id): Path<i32>,
    Json(payload): Json<ReplyRequest>,
) -> AppResult<impl IntoResponse> {
    payload
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let reply = ReplyService::new(db.clone())
        .update(id, auth_user.user_id, &payload.content)
        .await?;
    let author = author(&db, reply.user_id).await?;
    Ok(ApiResponse::ok(ReplyResponse::new(reply, author)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/replies/{id}",
    security(("jwt_token" = [])),
    params(("id" = i32, Path, description = "Reply ID")),
    responses(
        (status = 200, description = "Reply deleted", body = String),
        (status = 403, description = "Not the author", body = AppError),
        (status = 404, description = "Reply not found", body = AppError),
    ),
    tag = "forum"
)]
pub async fn delete_reply(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    Path(id): Path<i32>,
) -> AppResult<impl IntoResponse> {
    ReplyService::new(db)
        .delete(id, auth_user.user_id, auth_user.is_admin())
        .await?;
    Ok(ApiResponse::ok("Reply deleted"))
}

// Likes

async fn toggle_like(
    db: DatabaseConnection,
    hub: NotificationHub,
    user_id: i32,
    target: ForumTarget,
    target_id: i32,
) -> AppResult<LikeResponse> {
    let outcome = LikeService::new(db.clone())
        .toggle(user_id, target, target_id)
        .await?;

    if outcome.liked {
        let link = match target {
            ForumTarget::Discussion => NotificationTarget::discussion(target_id),
            ForumTarget::Reply => NotificationTarget::reply(target_id),
        };
        let message = match target {
            ForumTarget::Discussion => "Seseorang menyukai diskusi Anda",
            ForumTarget::Reply => "Seseorang menyukai balasan Anda",
        };
        NotificationService::new(db, hub)
            .notify_quietly(
                outcome.owner_id,
                Some(user_id),
                NotificationKind::Like,
                link,
                message,
            )
            .await;
    }

    Ok(LikeResponse::from(outcome))
}

#[utoipa::path(
    post,
    path = "/api/v1/discussions/{id}/like",
    security(("jwt_token" = [])),
    params(("id" = i32, Path, description = "Discussion ID")),
    responses(
        (status = 200, description = "Like toggled", body = LikeResponse),
        (status = 404, description = "Discussion not found", body = AppError),
    ),
    tag = "forum"
)]
pub async fn like_discussion(
    Extension(db): Extension<DatabaseConnection>,
    Extension(hub): Extension<NotificationHub>,
    auth_user: AuthUser,
    Path(id): Path<i32>,
) -> AppResult<impl IntoResponse> {
    let response = toggle_like(db, hub, auth_user.user_id, ForumTarget::Discussion, id).await?;
    Ok(ApiResponse::ok(response))
}

#[utoipa::path(
    post,
    path = "/api/v1/replies/{id}/like",
    security(("jwt_token" = [])),
    params(("id" = i32, Path, description = "Reply ID")),
    responses(
        (status = 200, description = "Like toggled", body = LikeResponse),
        (status = 404, description = "Reply not found", body = AppError),
    ),
    tag = "forum"
)]
pub async fn like_reply(
    Extension(db): Extension<DatabaseConnection>,
    Extension(hub): Extension<NotificationHub>,
    auth_user: AuthUser,
    Path(id): Path<i32>,
) -> AppResult<impl IntoResponse> {
    let response = toggle_like(db, hub, auth_user.user_id, ForumTarget::Reply, id).await?;
    Ok(ApiResponse::ok(response))
}
