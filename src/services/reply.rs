use crate::{
    error::{AppError, AppResult},
    models::{discussion, reply, Discussion, DiscussionModel, ForumTarget, Reply, ReplyModel},
    services::discussion::remove_content,
};
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ActiveValue::Set, ColumnTrait, DatabaseConnection,
    EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, TransactionTrait,
};

pub struct ReplyService {
    db: DatabaseConnection,
}

impl ReplyService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn get_by_id(&self, id: i32) -> AppResult<ReplyModel> {
        Reply::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or(AppError::NotFound)
    }

    /// Oldest first, the order a thread is read in.
    pub async fn list(
        &self,
        discussion_id: i32,
        page: u64,
        per_page: u64,
    ) -> AppResult<(Vec<ReplyModel>, u64)> {
        Discussion::find_by_id(discussion_id)
            .one(&self.db)
            .await?
            .ok_or(AppError::NotFound)?;

        let paginator = Reply::find()
            .filter(reply::Column::DiscussionId.eq(discussion_id))
            .order_by_asc(reply::Column::CreatedAt)
            .order_by_asc(reply::Column::Id)
            .paginate(&self.db, per_page);
        let total = paginator.num_items().await?;
        let items = paginator.fetch_page(page.saturating_sub(1)).await?;
        Ok((items, total))
    }

    /// Locked discussions take no new replies from anyone, admins included.
    /// The discussion row is locked while its counters are bumped.
    pub async fn create(
        &self,
        discussion_id: i32,
        user_id: i32,
        content: &str,
    ) -> AppResult<(ReplyModel, DiscussionModel)> {
        let txn = self.db.begin().await?;

        let parent = Discussion::find_by_id(discussion_id)
            .lock_exclusive()
            .one(&txn)
            .await?
            .ok_or(AppError::NotFound)?;
        if parent.is_locked {
            return Err(AppError::Conflict("Discussion is locked".to_string()));
        }

        let now = chrono::Utc::now().naive_utc();
        let created = reply::ActiveModel {
            discussion_id: Set(discussion_id),
            user_id: Set(user_id),
            content: Set(content.to_string()),
            likes_count: Set(0),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        Discussion::update_many()
            .col_expr(
                discussion::Column::RepliesCount,
                Expr::col(discussion::Column::RepliesCount).add(1),
            )
            .col_expr(discussion::Column::LastReplyAt, Expr::value(now))
            .filter(discussion::Column::Id.eq(discussion_id))
            .exec(&txn)
            .await?;

        txn.commit().await?;
        Ok((created, parent))
    }

    pub async fn update(&self, id: i32, user_id: i32, content: &str) -> AppResult<ReplyModel> {
        let existing = self.get_by_id(id).await?;
        if existing.user_id != user_id {
            return Err(AppError::Forbidden);
        }

        let mut active: reply::ActiveModel = existing.into();
        active.content = Set(content.to_string());
        active.updated_at = Set(chrono::Utc::now().naive_utc());
        Ok(active.update(&self.db).await?)
    }

    pub async fn delete(&self, id: i32, user_id: i32, is_admin: bool) -> AppResult<()> {
        let existing = self.get_by_id(id).await?;
        if existing.user_id != user_id && !is_admin {
            return Err(AppError::Forbidden);
        }

        let txn = self.db.begin().await?;
        remove_content(&txn, ForumTarget::Reply, id).await?;
        txn.commit().await?;
        Ok(())
    }
}
