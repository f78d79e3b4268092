use crate::middleware::MaybeAuthUser;
use crate::response::ApiResponse;
use crate::services::navigation::{navigation_for, Navigation};
use axum::response::IntoResponse;

#[utoipa::path(
    get,
    path = "/api/v1/navigation",
    responses(
        (status = 200, description = "Menu for the current viewer's role", body = Navigation),
    ),
    tag = "navigation"
)]
pub async fn get_navigation(viewer: MaybeAuthUser) -> impl IntoResponse {
    ApiResponse::ok(navigation_for(viewer.role()))
}
