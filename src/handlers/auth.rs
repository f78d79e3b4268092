use crate::error::{AppError, AppResult};
use crate::handlers::member::ProfileResponse;
use crate::middleware::AuthUser;
use crate::response::ApiResponse;
use crate::services::auth::{AuthService, IssuedTokens, NewMember};
use crate::services::member::{MemberService, ProfileUpdate};
use crate::utils::cookie::{
    build_auth_cookie, build_clear_cookie, extract_cookie, ACCESS_TOKEN_COOKIE,
    REFRESH_TOKEN_COOKIE,
};
use crate::utils::jwt::{access_token_ttl, decode_jwt, refresh_token_ttl, TokenType};
use anyhow::anyhow;
use axum::{
    http::{header, HeaderMap, HeaderValue},
    response::{IntoResponse, Response},
    Extension, Json,
};
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RegisterRequest {
    /// Username (3-50 characters)
    #[validate(length(min = 3, max = 50))]
    pub username: String,
    /// Email address
    #[validate(email)]
    pub email: String,
    /// Password (min 8 characters)
    #[validate(length(min = 8))]
    pub password: String,
    /// Full name as shown in the directory
    #[validate(length(min = 1, max = 100))]
    pub full_name: String,
    /// Graduation cohort
    #[validate(range(min = 1950, max = 2100))]
    pub batch: Option<i32>,
    #[validate(length(max = 100))]
    pub major: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginRequest {
    /// Username or email
    pub login: String,
    /// User password
    pub password: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AuthResponse {
    /// JWT access token
    pub token: String,
    /// JWT refresh token
    pub refresh_token: String,
    pub user: ProfileResponse,
}

#[utoipa::path(
    post,
    path = "/api/v1/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 200, description = "Member registered successfully", body = AuthResponse),
        (status = 400, description = "Validation error", body = AppError),
        (status = 409, description = "Username or email already exists", body = AppError),
    ),
    tag = "auth"
)]
pub async fn register(
    Extension(db): Extension<DatabaseConnection>,
    Json(payload): Json<RegisterRequest>,
) -> AppResult<impl IntoResponse> {
    payload
        .validate()
        .map_err(|e| AppError::Validation(format!("Validation error: {e}")))?;

    let (user, tokens) = AuthService::new(db)
        .register(NewMember {
            username: payload.username,
            email: payload.email,
            password: payload.password,
            full_name: payload.full_name,
            batch: payload.batch,
            major: payload.major,
        })
        .await?;

    auth_response(ProfileResponse::from(user), tokens)
}

#[utoipa::path(
    post,
    path = "/api/v1/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = AuthResponse),
        (status = 401, description = "Invalid credentials", body = AppError),
        (status = 403, description = "Account is banned", body = AppError),
    ),
    tag = "auth"
)]
pub async fn login(
    Extension(db): Extension<DatabaseConnection>,
    Json(payload): Json<LoginRequest>,
) -> AppResult<impl IntoResponse> {
    let (user, tokens) = AuthService::new(db)
        .login(&payload.login, &payload.password)
        .await?;

    auth_response(ProfileResponse::from(user), tokens)
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct RefreshTokenRequest {
    /// Refresh token; falls back to the cookie when omitted
    pub refresh_token: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TokenResponse {
    /// New JWT access token
    pub token: String,
    /// New JWT refresh token
    pub refresh_token: String,
}

#[utoipa::path(
    post,
    path = "/api/v1/auth/refresh",
    request_body = RefreshTokenRequest,
    responses(
        (status = 200, description = "Tokens rotated", body = TokenResponse),
        (status = 401, description = "Invalid or expired refresh token", body = AppError),
    ),
    tag = "auth"
)]
pub async fn refresh_token(
    Extension(db): Extension<DatabaseConnection>,
    headers: HeaderMap,
    payload: Option<Json<RefreshTokenRequest>>,
) -> AppResult<impl IntoResponse> {
    let refresh_token = request_refresh_token(&headers, payload).ok_or(AppError::Unauthorized)?;

    let claims = decode_jwt(&refresh_token).map_err(|_| AppError::Unauthorized)?;
    if claims.token_type != TokenType::Refresh {
        return Err(AppError::Unauthorized);
    }
    let user_id: i32 = claims.sub.parse().map_err(|_| AppError::Unauthorized)?;

    let tokens = AuthService::new(db)
        .rotate_refresh_token(user_id, &refresh_token)
        .await?;

    let mut response = ApiResponse::ok(TokenResponse {
        token: tokens.access_token.clone(),
        refresh_token: tokens.refresh_token.clone(),
    })
    .into_response();
    set_auth_cookies(&mut response, &tokens)?;
    Ok(response)
}

#[utoipa::path(
    post,
    path = "/api/v1/auth/logout",
    request_body = RefreshTokenRequest,
    responses(
        (status = 200, description = "Logout successful", body = String),
    ),
    tag = "auth"
)]
pub async fn logout(
    Extension(db): Extension<DatabaseConnection>,
    headers: HeaderMap,
    payload: Option<Json<RefreshTokenRequest>>,
) -> AppResult<impl IntoResponse> {
    if let Some(token) = request_refresh_token(&headers, payload) {
        AuthService::new(db).revoke_refresh_token(&token).await?;
    }

    let mut response = ApiResponse::ok("Logout successful").into_response();
    append_set_cookie(&mut response, &build_clear_cookie(ACCESS_TOKEN_COOKIE))?;
    append_set_cookie(&mut response, &build_clear_cookie(REFRESH_TOKEN_COOKIE))?;
    Ok(response)
}

#[utoipa::path(
    get,
    path = "/api/v1/auth/me",
    security(("jwt_token" = [])),
    responses(
        (status = 200, description = "Current member", body = ProfileResponse),
        (status = 401, description = "Unauthorized", body = AppError),
    ),
    tag = "auth"
)]
pub async fn get_current_user(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
) -> AppResult<impl IntoResponse> {
    let user = AuthService::new(db).get_user_by_id(auth_user.user_id).await?;
    Ok(ApiResponse::ok(ProfileResponse::from(user)))
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateProfileRequest {
    #[validate(length(min = 1, max = 100))]
    pub full_name: Option<String>,
    #[validate(range(min = 1950, max = 2100))]
    pub batch: Option<i32>,
    #[validate(length(max = 100))]
    pub major: Option<String>,
    #[validate(length(max = 100))]
    pub occupation: Option<String>,
    #[validate(length(max = 100))]
    pub company: Option<String>,
    #[validate(length(max = 100))]
    pub city: Option<String>,
    #[validate(length(max = 1000))]
    pub bio: Option<String>,
}

#[utoipa::path(
    put,
    path = "/api/v1/auth/profile",
    security(("jwt_token" = [])),
    request_body = UpdateProfileRequest,
    responses(
        (status = 200, description = "Profile updated", body = ProfileResponse),
        (status = 400, description = "Validation error", body = AppError),
        (status = 401, description = "Unauthorized", body = AppError),
    ),
    tag = "auth"
)]
pub async fn update_profile(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    Json(payload): Json<UpdateProfileRequest>,
) -> AppResult<impl IntoResponse> {
    payload
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let user = MemberService::new(db)
        .update_profile(
            auth_user.user_id,
            ProfileUpdate {
                full_name: payload.full_name,
                batch: payload.batch,
                major: payload.major,
                occupation: payload.occupation,
                company: payload.company,
                city: payload.city,
                bio: payload.bio,
            },
        )
        .await?;

    Ok(ApiResponse::ok(ProfileResponse::from(user)))
}

fn request_refresh_token(
    headers: &HeaderMap,
    payload: Option<Json<RefreshTokenRequest>>,
) -> Option<String> {
    payload
        .and_then(|Json(body)| body.refresh_token)
        .filter(|t| !t.trim().is_empty())
        .or_else(|| extract_cookie(headers, REFRESH_TOKEN_COOKIE))
}

fn auth_response(user: ProfileResponse, tokens: IssuedTokens) -> AppResult<Response> {
    let mut response = ApiResponse::ok(AuthResponse {
        token: tokens.access_token.clone(),
        refresh_token: tokens.refresh_token.clone(),
        user,
    })
    .into_response();
    set_auth_cookies(&mut response, &tokens)?;
    Ok(response)
}

fn set_auth_cookies(response: &mut Response, tokens: &IssuedTokens) -> AppResult<()> {
    let access_cookie = build_auth_cookie(
        ACCESS_TOKEN_COOKIE,
        &tokens.access_token,
        access_token_ttl()?,
    );
    let refresh_cookie = build_auth_cookie(
        REFRESH_TOKEN_COOKIE,
        &tokens.refresh_token,
        refresh_token_ttl()?,
    );

    append_set_cookie(response, &access_cookie)?;
    append_set_cookie(response, &refresh_cookie)?;
    Ok(())
}

fn append_set_cookie(response: &mut Response, cookie_value: &str) -> AppResult<()> {
    let value = HeaderValue::from_str(cookie_value).map_err(|e| {
        AppError::Internal(anyhow!("Failed to build Set-Cookie header value: {}", e))
    })?;
    response.headers_mut().append(header::SET_COOKIE, value);
    Ok(())
}
