use crate::error::{AppError, AppResult};
use crate::middleware::AuthUser;
use crate::response::ApiResponse;
use crate::services::member::MemberService;
use crate::services::upload::{UploadConfig, UploadService, UploadTarget};
use axum::{
    body::Bytes,
    extract::{multipart::Field, Multipart},
    response::IntoResponse,
    Extension,
};
use sea_orm::DatabaseConnection;
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Serialize, ToSchema)]
pub struct UploadResponse {
    pub url: String,
}

/// An uploaded file as read from a multipart field.
pub(crate) struct UploadedFile {
    pub content_type: String,
    pub data: Bytes,
}

pub(crate) async fn read_file_field(field: Field<'_>) -> AppResult<UploadedFile> {
    let content_type = field
        .content_type()
        .unwrap_or("application/octet-stream")
        .to_string();

    let data = field
        .bytes()
        .await
        .map_err(|e| AppError::Validation(format!("Failed to read file data: {}", e)))?;

    Ok(UploadedFile { content_type, data })
}

async fn first_file(multipart: &mut Multipart) -> AppResult<UploadedFile> {
    let field = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Failed to read upload: {}", e)))?
        .ok_or_else(|| AppError::Validation("No file provided".to_string()))?;
    read_file_field(field).await
}

/// Upload and set the member's avatar. The previous avatar file is removed.
/// POST /upload/avatar (multipart form: field "file")
#[utoipa::path(
    post,
    path = "/api/v1/upload/avatar",
    security(("jwt_token" = [])),
    request_body(content_type = "multipart/form-data", description = "Image in field `file`"),
    responses(
        (status = 200, description = "Avatar updated", body = UploadResponse),
        (status = 400, description = "Invalid image", body = AppError),
        (status = 413, description = "File too large", body = AppError),
    ),
    tag = "uploads"
)]
pub async fn upload_avatar(
    Extension(db): Extension<DatabaseConnection>,
    Extension(config): Extension<UploadConfig>,
    auth_user: AuthUser,
    mut multipart: Multipart,
) -> AppResult<impl IntoResponse> {
    let file = first_file(&mut multipart).await?;
    let url =
        UploadService::save_image(&config, &file.data, &file.content_type, UploadTarget::Avatar)
            .await?;

    let (_, previous) = MemberService::new(db)
        .update_avatar_url(auth_user.user_id, &url)
        .await?;
    if let Some(previous) = previous {
        UploadService::remove(&config, &previous).await;
    }

    Ok(ApiResponse::ok(UploadResponse { url }))
}

/// Upload an event banner; the returned URL goes into the event's `image_url`.
/// POST /admin/upload/event-image (multipart form: field "file")
#[utoipa::path(
    post,
    path = "/api/v1/admin/upload/event-image",
    security(("jwt_token" = [])),
    request_body(content_type = "multipart/form-data", description = "Image in field `file`"),
    responses(
        (status = 200, description = "Image stored", body = UploadResponse),
        (status = 400, description = "Invalid image", body = AppError),
        (status = 403, description = "Admin only", body = AppError),
    ),
    tag = "uploads"
)]
pub async fn upload_event_image(
    Extension(config): Extension<UploadConfig>,
    auth_user: AuthUser,
    mut multipart: Multipart,
) -> AppResult<impl IntoResponse> {
    auth_user.require_admin()?;
    let file = first_file(&mut multipart).await?;
    let url =
        UploadService::save_image(&config, &file.data, &file.content_type, UploadTarget::Event)
            .await?;
    Ok(ApiResponse::ok(UploadResponse { url }))
}
