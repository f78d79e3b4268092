use crate::{
    error::{AppError, AppResult},
    models::{refresh_token, user, RefreshToken, User, UserModel, UserRole},
    utils::{
        encode_access_token, encode_refresh_token, hash_password, hash_refresh_token,
        jwt::refresh_token_ttl, verify_password,
    },
};
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, Condition, ConnectionTrait,
    DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, TransactionTrait,
};

/// Fields accepted at sign-up. Profile details beyond these are filled in
/// later through the profile endpoint.
#[derive(Debug, Clone)]
pub struct NewMember {
    pub username: String,
    pub email: String,
    pub password: String,
    pub full_name: String,
    pub batch: Option<i32>,
    pub major: Option<String>,
}

pub struct IssuedTokens {
    pub access_token: String,
    pub refresh_token: String,
}

pub struct AuthService {
    db: DatabaseConnection,
}

impl AuthService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn register(&self, input: NewMember) -> AppResult<(UserModel, IssuedTokens)> {
        let username = input.username.trim().to_string();
        let email = input.email.trim().to_ascii_lowercase();

        if self.user_exists(&username, &email).await? {
            return Err(AppError::Conflict(
                "Username or email already exists".to_string(),
            ));
        }

        let password_hash = hash_password(&input.password)?;
        let now = chrono::Utc::now().naive_utc();

        let new_user = user::ActiveModel {
            username: Set(username),
            email: Set(email),
            password_hash: Set(password_hash),
            full_name: Set(input.full_name.trim().to_string()),
            batch: Set(input.batch),
            major: Set(input.major.map(|m| m.trim().to_string()).filter(|m| !m.is_empty())),
            role: Set(UserRole::Alumni),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        let user = new_user.insert(&self.db).await?;
        let tokens = self.issue_tokens(&self.db, user.id).await?;

        tracing::info!(user_id = user.id, "Member registered");
        Ok((user, tokens))
    }

    /// `login` accepts either the username or the email address.
    pub async fn login(&self, login: &str, password: &str) -> AppResult<(UserModel, IssuedTokens)> {
        let login = login.trim();
        let user = User::find()
            .filter(
                Condition::any()
                    .add(user::Column::Username.eq(login))
                    .add(user::Column::Email.eq(login.to_ascii_lowercase())),
            )
            .one(&self.db)
            .await?
            .ok_or(AppError::Unauthorized)?;

        if !verify_password(password, &user.password_hash)? {
            return Err(AppError::Unauthorized);
        }

        if user.role == UserRole::Banned {
            return Err(AppError::Forbidden);
        }

        let tokens = self.issue_tokens(&self.db, user.id).await?;
        Ok((user, tokens))
    }

    /// Exchanges a stored refresh token for a new pair; the old one is
    /// deleted in the same transaction.
    pub async fn rotate_refresh_token(
        &self,
        user_id: i32,
        current_refresh_token: &str,
    ) -> AppResult<IssuedTokens> {
        let token_hash = hash_refresh_token(current_refresh_token);
        let now = chrono::Utc::now().naive_utc();

        let txn = self.db.begin().await?;
        let existing = RefreshToken::find()
            .filter(refresh_token::Column::UserId.eq(user_id))
            .filter(refresh_token::Column::Token.eq(token_hash))
            .one(&txn)
            .await?
            .ok_or(AppError::Unauthorized)?;

        RefreshToken::delete_by_id(existing.id).exec(&txn).await?;
        if existing.expires_at <= now {
            txn.commit().await?;
            return Err(AppError::Unauthorized);
        }

        let tokens = self.issue_tokens(&txn, user_id).await?;
        txn.commit().await?;
        Ok(tokens)
    }

    pub async fn revoke_refresh_token(&self, refresh_token: &str) -> AppResult<()> {
        RefreshToken::delete_many()
            .filter(refresh_token::Column::Token.eq(hash_refresh_token(refresh_token)))
            .exec(&self.db)
            .await?;
        Ok(())
    }

    /// Used when a member is banned so open sessions cannot be refreshed.
    pub async fn revoke_all_refresh_tokens(&self, user_id: i32) -> AppResult<u64> {
        let result = RefreshToken::delete_many()
            .filter(refresh_token::Column::UserId.eq(user_id))
            .exec(&self.db)
            .await?;
        Ok(result.rows_affected)
    }

    pub async fn get_user_by_id(&self, id: i32) -> AppResult<UserModel> {
        User::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or(AppError::NotFound)
    }

    async fn user_exists(&self, username: &str, email: &str) -> AppResult<bool> {
        let count = User::find()
            .filter(
                Condition::any()
                    .add(user::Column::Username.eq(username))
                    .add(user::Column::Email.eq(email)),
            )
            .count(&self.db)
            .await?;
        Ok(count > 0)
    }

    async fn issue_tokens<C: ConnectionTrait>(
        &self,
        conn: &C,
        user_id: i32,
    ) -> AppResult<IssuedTokens> {
        let subject = user_id.to_string();
        let access_token = encode_access_token(&subject)?;
        let refresh_token = encode_refresh_token(&subject)?;

        let now = chrono::Utc::now().naive_utc();
        let expires_at = now + chrono::Duration::seconds(refresh_token_ttl()? as i64);
        refresh_token::ActiveModel {
            user_id: Set(user_id),
            token: Set(hash_refresh_token(&refresh_token)),
            expires_at: Set(expires_at),
            created_at: Set(now),
            ..Default::default()
        }
        .insert(conn)
        .await?;

        Ok(IssuedTokens {
            access_token,
            refresh_token,
        })
    }
}
