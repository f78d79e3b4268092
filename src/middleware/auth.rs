use crate::{
    error::{AppError, AppResult},
    models::{User, UserRole},
    utils::{
        cookie::{extract_cookie, ACCESS_TOKEN_COOKIE},
        jwt::{decode_jwt, TokenType},
    },
};
use axum::{
    extract::{FromRequestParts, Request},
    http::{header, request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
    Extension,
};
use sea_orm::{DatabaseConnection, EntityTrait};

/// The authenticated member behind a request. Role is read from the
/// database on every request so bans and promotions apply immediately.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: i32,
    pub role: UserRole,
}

impl AuthUser {
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }

    /// Returns the admin's id, or `Forbidden` for everyone else.
    pub fn require_admin(&self) -> AppResult<i32> {
        if self.is_admin() {
            Ok(self.user_id)
        } else {
            Err(AppError::Forbidden)
        }
    }
}

/// Present when the request carries a valid access token, absent otherwise.
/// Used by public routes whose output depends on the viewer's role.
#[derive(Debug, Clone, Default)]
pub struct MaybeAuthUser(pub Option<AuthUser>);

impl MaybeAuthUser {
    pub fn is_admin(&self) -> bool {
        self.0.as_ref().is_some_and(AuthUser::is_admin)
    }

    pub fn user_id(&self) -> Option<i32> {
        self.0.as_ref().map(|u| u.user_id)
    }

    pub fn role(&self) -> Option<UserRole> {
        self.0.as_ref().map(|u| u.role)
    }
}

/// Rejects the request unless it carries a valid access token for a
/// member that is not banned.
pub async fn auth_middleware(
    Extension(db): Extension<DatabaseConnection>,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = extract_token(&headers).ok_or(AppError::Unauthorized)?;
    let auth_user = resolve_user(&db, &token).await?;

    request.extensions_mut().insert(auth_user);
    Ok(next.run(request).await)
}

async fn resolve_user(db: &DatabaseConnection, token: &str) -> AppResult<AuthUser> {
    let claims = decode_jwt(token).map_err(|_| AppError::Unauthorized)?;
    if claims.token_type != TokenType::Access {
        return Err(AppError::Unauthorized);
    }

    let user_id: i32 = claims.sub.parse().map_err(|_| AppError::Unauthorized)?;
    let user = User::find_by_id(user_id)
        .one(db)
        .await?
        .ok_or(AppError::Unauthorized)?;

    if user.role == UserRole::Banned {
        return Err(AppError::Forbidden);
    }

    Ok(AuthUser {
        user_id,
        role: user.role,
    })
}

/// `Authorization: Bearer` first, then the HttpOnly cookie.
fn extract_token(headers: &HeaderMap) -> Option<String> {
    extract_bearer_token(headers).or_else(|| extract_cookie(headers, ACCESS_TOKEN_COOKIE))
}

fn extract_bearer_token(headers: &HeaderMap) -> Option<String> {
    let auth_header = headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())?;

    let token = auth_header.strip_prefix("Bearer ")?.trim();
    if token.is_empty() {
        None
    } else {
        Some(token.to_string())
    }
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .ok_or(AppError::Unauthorized)
    }
}

impl<S> FromRequestParts<S> for MaybeAuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        if let Some(user) = parts.extensions.get::<AuthUser>() {
            return Ok(MaybeAuthUser(Some(user.clone())));
        }

        let Some(token) = extract_token(&parts.headers) else {
            return Ok(MaybeAuthUser(None));
        };
        let Some(db) = parts.extensions.get::<DatabaseConnection>().cloned() else {
            return Ok(MaybeAuthUser(None));
        };

        match resolve_user(&db, &token).await {
            Ok(user) => Ok(MaybeAuthUser(Some(user))),
            Err(AppError::Unauthorized | AppError::Forbidden) => Ok(MaybeAuthUser(None)),
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn bearer_wins_over_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer abc"));
        headers.insert(header::COOKIE, HeaderValue::from_static("access_token=xyz"));
        assert_eq!(extract_token(&headers).as_deref(), Some("abc"));
    }

    #[test]
    fn falls_back_to_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer "));
        headers.insert(header::COOKIE, HeaderValue::from_static("access_token=xyz"));
        assert_eq!(extract_token(&headers).as_deref(), Some("xyz"));
    }

    #[test]
    fn only_admins_pass_require_admin() {
        let admin = AuthUser {
            user_id: 1,
            role: UserRole::Admin,
        };
        let member = AuthUser {
            user_id: 2,
            role: UserRole::Alumni,
        };
        assert_eq!(admin.require_admin().unwrap(), 1);
        assert!(matches!(member.require_admin(), Err(AppError::Forbidden)));
    }
}
