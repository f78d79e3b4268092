use crate::config::parse_bool_env;
use crate::error::AppResult;
use crate::models::{user, User, UserRole};
use crate::utils::hash_password;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, Condition, DatabaseConnection, EntityTrait,
    QueryFilter,
};
use std::env;

#[derive(Debug, Clone)]
pub struct BootstrapAdminConfig {
    pub username: String,
    pub email: String,
    pub password: String,
    pub full_name: String,
}

impl BootstrapAdminConfig {
    pub fn from_env() -> Option<Self> {
        if !parse_bool_env("BOOTSTRAP_ADMIN_ENABLED", false) {
            return None;
        }

        let username = env::var("BOOTSTRAP_ADMIN_USERNAME").ok()?;
        Some(Self {
            email: env::var("BOOTSTRAP_ADMIN_EMAIL").ok()?,
            password: env::var("BOOTSTRAP_ADMIN_PASSWORD").ok()?,
            full_name: env::var("BOOTSTRAP_ADMIN_FULL_NAME")
                .unwrap_or_else(|_| "Portal Administrator".to_string()),
            username,
        })
    }
}

/// Makes sure the portal has at least one admin:
/// - nothing happens when an admin already exists
/// - a member matching the configured email/username is promoted
/// - otherwise a new admin account is created
pub async fn ensure_bootstrap_admin(db: &DatabaseConnection) -> AppResult<()> {
    let Some(cfg) = BootstrapAdminConfig::from_env() else {
        return Ok(());
    };

    let admin_exists = User::find()
        .filter(user::Column::Role.eq(UserRole::Admin))
        .one(db)
        .await?
        .is_some();
    if admin_exists {
        return Ok(());
    }

    let existing = User::find()
        .filter(
            Condition::any()
                .add(user::Column::Email.eq(cfg.email.clone()))
                .add(user::Column::Username.eq(cfg.username.clone())),
        )
        .one(db)
        .await?;

    let now = chrono::Utc::now().naive_utc();

    if let Some(existing) = existing {
        let id = existing.id;
        let mut active: user::ActiveModel = existing.into();
        active.role = Set(UserRole::Admin);
        active.updated_at = Set(now);
        active.update(db).await?;
        tracing::info!(user_id = id, "Promoted existing member to admin");
        return Ok(());
    }

    let admin = user::ActiveModel {
        username: Set(cfg.username),
        email: Set(cfg.email.to_ascii_lowercase()),
        password_hash: Set(hash_password(&cfg.password)?),
        full_name: Set(cfg.full_name),
        role: Set(UserRole::Admin),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await?;

    tracing::info!(user_id = admin.id, "Created bootstrap admin");
    Ok(())
}
