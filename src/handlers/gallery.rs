use crate::error::{AppError, AppResult};
use crate::handlers::upload::{read_file_field, UploadedFile};
use crate::middleware::{AuthUser, MaybeAuthUser};
use crate::models::{GalleryItemModel, GalleryKind, GalleryStatus};
use crate::response::{resolve_page, ApiResponse, PaginatedResponse, PaginationQuery};
use crate::services::gallery::{GalleryService, GallerySubmission, GalleryUpdate, Moderation};
use crate::services::notification::{NotificationKind, NotificationService, NotificationTarget};
use crate::services::upload::{UploadConfig, UploadService, UploadTarget};
use crate::websocket::NotificationHub;
use axum::{
    extract::{Multipart, Path, Query},
    response::IntoResponse,
    Extension, Json,
};
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Serialize, ToSchema)]
pub struct GalleryItemResponse {
    pub id: i32,
    pub user_id: i32,
    pub title: String,
    pub description: Option<String>,
    pub image_url: String,
    pub batch: Option<i32>,
    pub kind: GalleryKind,
    pub status: GalleryStatus,
    /// Only set on rejected items
    pub rejection_reason: Option<String>,
    pub approved_at: Option<String>,
    pub created_at: String,
}

impl From<GalleryItemModel> for GalleryItemResponse {
    fn from(item: GalleryItemModel) -> Self {
        Self {
            id: item.id,
            user_id: item.user_id,
            title: item.title,
            description: item.description,
            image_url: item.image_url,
            batch: item.batch,
            kind: item.kind,
            status: item.status,
            rejection_reason: item.rejection_reason,
            approved_at: item.approved_at.map(|d| d.to_string()),
            created_at: item.created_at.to_string(),
        }
    }
}

fn page_of(
    items: Vec<GalleryItemModel>,
    total: u64,
    page: u64,
    per_page: u64,
) -> PaginatedResponse<GalleryItemResponse> {
    let items = items.into_iter().map(GalleryItemResponse::from).collect();
    PaginatedResponse::new(items, total, page, per_page)
}

#[derive(Debug, Deserialize)]
pub struct GalleryListQuery {
    pub batch: Option<i32>,
    pub page: Option<u64>,
    pub per_page: Option<u64>,
}

#[utoipa::path(
    get,
    path = "/api/v1/gallery",
    params(
        ("batch" = Option<i32>, Query, description = "Graduation cohort"),
        ("page" = Option<u64>, Query, description = "Page number"),
        ("per_page" = Option<u64>, Query, description = "Items per page"),
    ),
    responses(
        (status = 200, description = "Approved public gallery", body = PaginatedResponse<GalleryItemResponse>),
    ),
    tag = "gallery"
)]
pub async fn list_gallery(
    Extension(db): Extension<DatabaseConnection>,
    Query(query): Query<GalleryListQuery>,
) -> AppResult<impl IntoResponse> {
    let (page, per_page) = resolve_page(query.page, query.per_page);
    let (items, total) = GalleryService::new(db)
        .list_public(query.batch, page, per_page)
        .await?;
    Ok(ApiResponse::ok(page_of(items, total, page, per_page)))
}

#[utoipa::path(
    get,
    path = "/api/v1/gallery/{id}",
    params(("id" = i32, Path, description = "Gallery item ID")),
    responses(
        (status = 200, description = "Gallery item", body = GalleryItemResponse),
        (status = 404, description = "Not found or not visible", body = AppError),
    ),
    tag = "gallery"
)]
pub async fn get_gallery_item(
    Extension(db): Extension<DatabaseConnection>,
    viewer: MaybeAuthUser,
    Path(id): Path<i32>,
) -> AppResult<impl IntoResponse> {
    let item = GalleryService::new(db)
        .get_visible(id, viewer.user_id(), viewer.is_admin())
        .await?;
    Ok(ApiResponse::ok(GalleryItemResponse::from(item)))
}

#[derive(Default)]
struct SubmissionForm {
    title: Option<String>,
    description: Option<String>,
    batch: Option<i32>,
    kind: Option<GalleryKind>,
    file: Option<UploadedFile>,
}

async fn read_submission(multipart: &mut Multipart) -> AppResult<SubmissionForm> {
    let mut form = SubmissionForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Failed to read upload: {}", e)))?
    {
        let name = field.name().unwrap_or_default().to_string();
        if name == "file" {
            form.file = Some(read_file_field(field).await?);
            continue;
        }

        let value = field
            .text()
            .await
            .map_err(|e| AppError::Validation(format!("Failed to read field '{}': {}", name, e)))?;
        let value = value.trim().to_string();
        match name.as_str() {
            "title" => form.title = Some(value),
            "description" => form.description = Some(value).filter(|v| !v.is_empty()),
            "batch" if !value.is_empty() => {
                let batch = value
                    .parse()
                    .map_err(|_| AppError::Validation("batch must be a year".to_string()))?;
                form.batch = Some(batch);
            }
            "kind" => {
                let kind = GalleryKind::parse(&value).ok_or_else(|| {
                    AppError::Validation("kind must be 'personal' or 'public'".to_string())
                })?;
                form.kind = Some(kind);
            }
            _ => {}
        }
    }

    Ok(form)
}

/// Multipart fields: `title`, `description`, `batch`, `kind`, `file`.
/// Public items wait for moderation; personal items are visible at once.
#[utoipa::path(
    post,
    path = "/api/v1/gallery",
    security(("jwt_token" = [])),
    request_body(content_type = "multipart/form-data", description = "title, description, batch, kind, file"),
    responses(
        (status = 200, description = "Gallery item submitted", body = GalleryItemResponse),
        (status = 400, description = "Validation error", body = AppError),
        (status = 413, description = "File too large", body = AppError),
    ),
    tag = "gallery"
)]
pub async fn submit_gallery_item(
    Extension(db): Extension<DatabaseConnection>,
    Extension(config): Extension<UploadConfig>,
    auth_user: AuthUser,
    mut multipart: Multipart,
) -> AppResult<impl IntoResponse> {
    let form = read_submission(&mut multipart).await?;

    let title = form
        .title
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AppError::Validation("title is required".to_string()))?;
    if title.chars().count() > 200 {
        return Err(AppError::Validation(
            "title must be at most 200 characters".to_string(),
        ));
    }
    let file = form
        .file
        .ok_or_else(|| AppError::Validation("No file provided".to_string()))?;

    let image_url =
        UploadService::save_image(&config, &file.data, &file.content_type, UploadTarget::Gallery)
            .await?;

    let submission = GallerySubmission {
        title,
        description: form.description,
        image_url: image_url.clone(),
        batch: form.batch,
        kind: form.kind.unwrap_or(GalleryKind::Public),
    };
    let item = match GalleryService::new(db).submit(auth_user.user_id, submission).await {
        Ok(item) => item,
        Err(e) => {
            UploadService::remove(&config, &image_url).await;
            return Err(e);
        }
    };

    let message = match item.status {
        GalleryStatus::Pending => "Submitted for review",
        _ => "Added to your gallery",
    };
    Ok(ApiResponse::with_message(
        GalleryItemResponse::from(item),
        message,
    ))
}

#[utoipa::path(
    get,
    path = "/api/v1/my/gallery",
    security(("jwt_token" = [])),
    params(
        ("page" = Option<u64>, Query, description = "Page number"),
        ("per_page" = Option<u64>, Query, description = "Items per page"),
    ),
    responses(
        (status = 200, description = "The member's own items in every status", body = PaginatedResponse<GalleryItemResponse>),
    ),
    tag = "gallery"
)]
pub async fn my_gallery(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    Query(pagination): Query<PaginationQuery>,
) -> AppResult<impl IntoResponse> {
    let (page, per_page) = pagination.resolve();
    let (items, total) = GalleryService::new(db)
        .list_for_owner(auth_user.user_id, page, per_page)
        .await?;
    Ok(ApiResponse::ok(page_of(items, total, page, per_page)))
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateGalleryItemRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: Option<String>,
    #[validate(length(max = 2000))]
    pub description: Option<String>,
    #[validate(range(min = 1950, max = 2100))]
    pub batch: Option<i32>,
    pub kind: Option<GalleryKind>,
}

#[utoipa::path(
    put,
    path = "/api/v1/gallery/{id}",
    security(("jwt_token" = [])),
    params(("id" = i32, Path, description = "Gallery item ID")),
    request_body = UpdateGalleryItemRequest,
    responses(
        (status = 200, description = "Gallery item updated", body = GalleryItemResponse),
        (status = 403, description = "Not the owner", body = AppError),
        (status = 404, description = "Gallery item not found", body = AppError),
    ),
    tag = "gallery"
)]
pub async fn update_gallery_item(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateGalleryItemRequest>,
) -> AppResult<impl IntoResponse> {
    payload
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let item = GalleryService::new(db)
        .update(
            id,
            auth_user.user_id,
            GalleryUpdate {
                title: payload.title,
                description: payload.description,
                batch: payload.batch,
                kind: payload.kind,
            },
        )
        .await?;
    Ok(ApiResponse::ok(GalleryItemResponse::from(item)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/gallery/{id}",
    security(("jwt_token" = [])),
    params(("id" = i32, Path, description = "Gallery item ID")),
    responses(
        (status = 200, description = "Gallery item deleted", body = String),
        (status = 403, description = "Not the owner", body = AppError),
        (status = 404, description = "Gallery item not found", body = AppError),
    ),
    tag = "gallery"
)]
pub async fn delete_gallery_item(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    Path(id): Path<i32>,
) -> AppResult<impl IntoResponse> {
    GalleryService::new(db)
        .delete(id, auth_user.user_id, auth_user.is_admin())
        .await?;
    Ok(ApiResponse::ok("Gallery item deleted"))
}

// Admin

#[derive(Debug, Deserialize)]
pub struct ModerationListQuery {
    pub status: Option<GalleryStatus>,
    pub page: Option<u64>,
    pub per_page: Option<u64>,
}

#[utoipa::path(
    get,
    path = "/api/v1/admin/gallery",
    security(("jwt_token" = [])),
    params(
        ("status" = Option<GalleryStatus>, Query, description = "pending, approved or rejected"),
        ("page" = Option<u64>, Query, description = "Page number"),
        ("per_page" = Option<u64>, Query, description = "Items per page"),
    ),
    responses(
        (status = 200, description = "Moderation queue", body = PaginatedResponse<GalleryItemResponse>),
        (status = 403, description = "Admin only", body = AppError),
    ),
    tag = "gallery"
)]
pub async fn moderation_queue(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    Query(query): Query<ModerationListQuery>,
) -> AppResult<impl IntoResponse> {
    auth_user.require_admin()?;
    let (page, per_page) = resolve_page(query.page, query.per_page);
    let (items, total) = GalleryService::new(db)
        .list_for_moderation(query.status, page, per_page)
        .await?;
    Ok(ApiResponse::ok(page_of(items, total, page, per_page)))
}

#[derive(Debug, Clone, Copy, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ModerationAction {
    Approve,
    Reject,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ModerateGalleryItemRequest {
    pub action: ModerationAction,
    /// Required when rejecting
    pub reason: Option<String>,
}

#[utoipa::path(
    patch,
    path = "/api/v1/admin/gallery/{id}",
    security(("jwt_token" = [])),
    params(("id" = i32, Path, description = "Gallery item ID")),
    request_body = ModerateGalleryItemRequest,
    responses(
        (status = 200, description = "Gallery item moderated", body = GalleryItemResponse),
        (status = 400, description = "Missing reason, personal item or invalid transition", body = AppError),
        (status = 404, description = "Gallery item not found", body = AppError),
    ),
    tag = "gallery"
)]
pub async fn moderate_gallery_item(
    Extension(db): Extension<DatabaseConnection>,
    Extension(hub): Extension<NotificationHub>,
    auth_user: AuthUser,
    Path(id): Path<i32>,
    Json(payload): Json<ModerateGalleryItemRequest>,
) -> AppResult<impl IntoResponse> {
    let admin_id = auth_user.require_admin()?;
    let action = match payload.action {
        ModerationAction::Approve => Moderation::Approve,
        ModerationAction::Reject => Moderation::Reject {
            reason: payload.reason.unwrap_or_default(),
        },
    };

    let item = GalleryService::new(db.clone())
        .moderate(id, admin_id, action)
        .await?;

    let (kind, message) = match item.status {
        GalleryStatus::Approved => (
            NotificationKind::GalleryApproved,
            format!("Foto \"{}\" disetujui dan tampil di galeri", item.title),
        ),
        _ => (
            NotificationKind::GalleryRejected,
            format!(
                "Foto \"{}\" ditolak: {}",
                item.title,
                item.rejection_reason.as_deref().unwrap_or_default()
            ),
        ),
    };
    NotificationService::new(db, hub)
        .notify_quietly(
            item.user_id,
            Some(admin_id),
            kind,
            NotificationTarget::gallery_item(item.id),
            &message,
        )
        .await;

    Ok(ApiResponse::ok(GalleryItemResponse::from(item)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/admin/gallery/{id}",
    security(("jwt_token" = [])),
    params(("id" = i32, Path, description = "Gallery item ID")),
    responses(
        (status = 200, description = "Gallery item removed", body = String),
        (status = 404, description = "Gallery item not found", body = AppError),
    ),
    tag = "gallery"
)]
pub async fn admin_delete_gallery_item(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    Path(id): Path<i32>,
) -> AppResult<impl IntoResponse> {
    let admin_id = auth_user.require_admin()?;
    GalleryService::new(db).delete(id, admin_id, true).await?;
    Ok(ApiResponse::ok("Gallery item removed"))
}
