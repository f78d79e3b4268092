use crate::{
    error::{AppError, AppResult},
    models::{
        article, event, event_registration, forum_report, gallery_item, user, Article,
        ArticleStatus, Discussion, Event, EventRegistration, ForumReport, GalleryItem,
        GalleryKind, GalleryStatus, RegistrationStatus, ReportStatus, User, UserModel, UserRole,
    },
    services::{auth::AuthService, contains_ci},
};
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, Condition, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdminStats {
    pub members: u64,
    pub published_events: u64,
    pub upcoming_events: u64,
    pub active_registrations: u64,
    pub pending_gallery_items: u64,
    pub pending_reports: u64,
    pub discussions: u64,
    pub published_articles: u64,
}

pub struct AdminService {
    db: DatabaseConnection,
}

impl AdminService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn get_stats(&self) -> AppResult<AdminStats> {
        let now = chrono::Utc::now().naive_utc();

        let members = User::find()
            .filter(user::Column::Role.ne(UserRole::Banned))
            .count(&self.db)
            .await?;
        let published_events = Event::find()
            .filter(event::Column::IsPublished.eq(true))
            .count(&self.db)
            .await?;
        let upcoming_events = Event::find()
            .filter(event::Column::IsPublished.eq(true))
            .filter(event::Column::EventDate.gte(now))
            .count(&self.db)
            .await?;
        let active_registrations = EventRegistration::find()
            .filter(event_registration::Column::Status.eq(RegistrationStatus::Registered))
            .count(&self.db)
            .await?;
        let pending_gallery_items = GalleryItem::find()
            .filter(gallery_item::Column::DeletedAt.is_null())
            .filter(gallery_item::Column::Kind.eq(GalleryKind::Public))
            .filter(gallery_item::Column::Status.eq(GalleryStatus::Pending))
            .count(&self.db)
            .await?;
        let pending_reports = ForumReport::find()
            .filter(forum_report::Column::Status.eq(ReportStatus::Pending))
            .count(&self.db)
            .await?;
        let discussions = Discussion::find().count(&self.db).await?;
        let published_articles = Article::find()
            .filter(article::Column::Status.eq(ArticleStatus::Published))
            .count(&self.db)
            .await?;

        Ok(AdminStats {
            members,
            published_events,
            upcoming_events,
            active_registrations,
            pending_gallery_items,
            pending_reports,
            discussions,
            published_articles,
        })
    }

    pub async fn list_users(
        &self,
        role: Option<UserRole>,
        search: Option<&str>,
        page: u64,
        per_page: u64,
    ) -> AppResult<(Vec<UserModel>, u64)> {
        let mut query = User::find();
        if let Some(role) = role {
            query = query.filter(user::Column::Role.eq(role));
        }
        if let Some(term) = search.map(str::trim).filter(|s| !s.is_empty()) {
            query = query.filter(
                Condition::any()
                    .add(contains_ci::<User>(user::Column::Username, term))
                    .add(contains_ci::<User>(user::Column::Email, term))
                    .add(contains_ci::<User>(user::Column::FullName, term)),
            );
        }

        let paginator = query
            .order_by_desc(user::Column::CreatedAt)
            .order_by_desc(user::Column::Id)
            .paginate(&self.db, per_page);
        let total = paginator.num_items().await?;
        let users = paginator.fetch_page(page.saturating_sub(1)).await?;
        Ok((users, total))
    }

    /// Admins cannot change their own role. Banning revokes the member's
    /// refresh tokens.
    pub async fn update_user_role(
        &self,
        admin_id: i32,
        user_id: i32,
        role: UserRole,
    ) -> AppResult<UserModel> {
        if admin_id == user_id {
            return Err(AppError::Validation(
                "You cannot change your own role".to_string(),
            ));
        }

        let existing = User::find_by_id(user_id)
            .one(&self.db)
            .await?
            .ok_or(AppError::NotFound)?;

        let mut active: user::ActiveModel = existing.into();
        active.role = Set(role);
        active.updated_at = Set(chrono::Utc::now().naive_utc());
        let updated = active.update(&self.db).await?;

        if role == UserRole::Banned {
            let revoked = AuthService::new(self.db.clone())
                .revoke_all_refresh_tokens(user_id)
                .await?;
            tracing::info!(user_id, revoked, "Member banned");
        }
        Ok(updated)
    }
}
