use crate::{
    error::{AppError, AppResult},
    models::{user, User, UserModel, UserRole},
    services::contains_ci,
};
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, Condition, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder,
};
use std::collections::HashMap;

#[derive(Debug, Default, Clone)]
pub struct MemberFilter {
    pub batch: Option<i32>,
    pub major: Option<String>,
    pub search: Option<String>,
}

/// Profile fields a member may change. `None` leaves a field untouched; an
/// empty string clears an optional text field.
#[derive(Debug, Default, Clone)]
pub struct ProfileUpdate {
    pub full_name: Option<String>,
    pub batch: Option<i32>,
    pub major: Option<String>,
    pub occupation: Option<String>,
    pub company: Option<String>,
    pub city: Option<String>,
    pub bio: Option<String>,
}

fn cleared(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

pub struct MemberService {
    db: DatabaseConnection,
}

impl MemberService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Directory listing. Banned accounts are hidden.
    pub async fn list(
        &self,
        filter: &MemberFilter,
        page: u64,
        per_page: u64,
    ) -> AppResult<(Vec<UserModel>, u64)> {
        let mut query = User::find().filter(user::Column::Role.ne(UserRole::Banned));

        if let Some(batch) = filter.batch {
            query = query.filter(user::Column::Batch.eq(batch));
        }
        if let Some(major) = filter.major.as_deref().map(str::trim).filter(|m| !m.is_empty()) {
            query = query.filter(contains_ci::<User>(user::Column::Major, major));
        }
        if let Some(term) = filter.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            query = query.filter(
                Condition::any()
                    .add(contains_ci::<User>(user::Column::FullName, term))
                    .add(contains_ci::<User>(user::Column::Username, term))
                    .add(contains_ci::<User>(user::Column::Company, term)),
            );
        }

        let paginator = query
            .order_by_asc(user::Column::FullName)
            .order_by_asc(user::Column::Id)
            .paginate(&self.db, per_page);

        let total = paginator.num_items().await?;
        let members = paginator.fetch_page(page.saturating_sub(1)).await?;
        Ok((members, total))
    }

    pub async fn get_profile(&self, id: i32) -> AppResult<UserModel> {
        User::find_by_id(id)
            .filter(user::Column::Role.ne(UserRole::Banned))
            .one(&self.db)
            .await?
            .ok_or(AppError::NotFound)
    }

    pub async fn update_profile(&self, user_id: i32, update: ProfileUpdate) -> AppResult<UserModel> {
        let existing = User::find_by_id(user_id)
            .one(&self.db)
            .await?
            .ok_or(AppError::NotFound)?;

        let mut active: user::ActiveModel = existing.into();
        if let Some(full_name) = update.full_name {
            let full_name = full_name.trim().to_string();
            if full_name.is_empty() {
                return Err(AppError::Validation("full_name cannot be empty".to_string()));
            }
            active.full_name = Set(full_name);
        }
        if let Some(batch) = update.batch {
            active.batch = Set(Some(batch));
        }
        if let Some(major) = update.major {
            active.major = Set(cleared(major));
        }
        if let Some(occupation) = update.occupation {
            active.occupation = Set(cleared(occupation));
        }
        if let Some(company) = update.company {
            active.company = Set(cleared(company));
        }
        if let Some(city) = update.city {
            active.city = Set(cleared(city));
        }
        if let Some(bio) = update.bio {
            active.bio = Set(cleared(bio));
        }
        active.updated_at = Set(chrono::Utc::now().naive_utc());

        Ok(active.update(&self.db).await?)
    }

    /// Batch lookup for embedding authors in listings.
    pub async fn find_many(&self, ids: &[i32]) -> AppResult<HashMap<i32, UserModel>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }
        let users = User::find()
            .filter(user::Column::Id.is_in(ids.iter().copied()))
            .all(&self.db)
            .await?;
        Ok(users.into_iter().map(|u| (u.id, u)).collect())
    }

    /// Stores the new avatar URL and returns the previous one so the caller
    /// can remove the old file.
    pub async fn update_avatar_url(
        &self,
        user_id: i32,
        avatar_url: &str,
    ) -> AppResult<(UserModel, Option<String>)> {
        let existing = User::find_by_id(user_id)
            .one(&self.db)
            .await?
            .ok_or(AppError::NotFound)?;
        let previous = existing.avatar_url.clone();

        let mut active: user::ActiveModel = existing.into();
        active.avatar_url = Set(Some(avatar_url.to_string()));
        active.updated_at = Set(chrono::Utc::now().naive_utc());
        let updated = active.update(&self.db).await?;
        Ok((updated, previous))
    }
}

#[cfg(test)]
mod tests {
    use super::cleared;

    #[test]
    fn blank_text_clears_the_field() {
        assert_eq!(cleared("   ".to_string()), None);
        assert_eq!(cleared(" Jakarta ".to_string()), Some("Jakarta".to_string()));
    }
}
