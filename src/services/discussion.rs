use crate::{
    error::{AppError, AppResult},
    models::{
        discussion, forum_like, reply, Category, Discussion, DiscussionModel, ForumLike,
        ForumTarget, Reply,
    },
    services::contains_ci,
};
use sea_orm::{
    sea_query::{Expr, Func, SimpleExpr},
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, ConnectionTrait, DatabaseConnection,
    EntityTrait, Order, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, TransactionTrait,
};

pub struct DiscussionService {
    db: DatabaseConnection,
}

impl DiscussionService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn create(
        &self,
        user_id: i32,
        category_id: i32,
        title: &str,
        content: &str,
    ) -> AppResult<DiscussionModel> {
        Category::find_by_id(category_id)
            .one(&self.db)
            .await?
            .ok_or_else(|| AppError::Validation("Category does not exist".to_string()))?;

        let now = chrono::Utc::now().naive_utc();
        let created = discussion::ActiveModel {
            user_id: Set(user_id),
            category_id: Set(category_id),
            title: Set(title.trim().to_string()),
            content: Set(content.to_string()),
            is_pinned: Set(false),
            is_locked: Set(false),
            views_count: Set(0),
            likes_count: Set(0),
            replies_count: Set(0),
            last_reply_at: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&self.db)
        .await?;

        tracing::info!(discussion_id = created.id, user_id, "Discussion created");
        Ok(created)
    }

    pub async fn get_by_id(&self, id: i32) -> AppResult<DiscussionModel> {
        Discussion::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or(AppError::NotFound)
    }

    /// Fetch for display; counts the view.
    pub async fn view(&self, id: i32) -> AppResult<DiscussionModel> {
        let result = Discussion::update_many()
            .col_expr(
                discussion::Column::ViewsCount,
                Expr::col(discussion::Column::ViewsCount).add(1),
            )
            .filter(discussion::Column::Id.eq(id))
            .exec(&self.db)
            .await?;
        if result.rows_affected == 0 {
            return Err(AppError::NotFound);
        }
        self.get_by_id(id).await
    }

    /// Pinned first, then most recent activity.
    pub async fn list_by_category(
        &self,
        category_id: i32,
        search: Option<&str>,
        page: u64,
        per_page: u64,
    ) -> AppResult<(Vec<DiscussionModel>, u64)> {
        let mut query = Discussion::find().filter(discussion::Column::CategoryId.eq(category_id));
        if let Some(term) = search.map(str::trim).filter(|s| !s.is_empty()) {
            query = query.filter(contains_ci::<Discussion>(discussion::Column::Title, term));
        }

        let last_activity = SimpleExpr::from(Func::coalesce([
            SimpleExpr::from(Expr::col((Discussion, discussion::Column::LastReplyAt))),
            SimpleExpr::from(Expr::col((Discussion, discussion::Column::CreatedAt))),
        ]));

        let paginator = query
            .order_by_desc(discussion::Column::IsPinned)
            .order_by(last_activity, Order::Desc)
            .order_by_desc(discussion::Column::Id)
            .paginate(&self.db, per_page);
        let total = paginator.num_items().await?;
        let items = paginator.fetch_page(page.saturating_sub(1)).await?;
        Ok((items, total))
    }

    /// Only the author edits a discussion.
    pub async fn update(
        &self,
        id: i32,
        user_id: i32,
        title: Option<&str>,
        content: Option<&str>,
    ) -> AppResult<DiscussionModel> {
        let existing = self.get_by_id(id).await?;
        if existing.user_id != user_id {
            return Err(AppError::Forbidden);
        }

        let mut active: discussion::ActiveModel = existing.into();
        if let Some(title) = title {
            active.title = Set(title.trim().to_string());
        }
        if let Some(content) = content {
            active.content = Set(content.to_string());
        }
        active.updated_at = Set(chrono::Utc::now().naive_utc());
        Ok(active.update(&self.db).await?)
    }

    /// The author or an admin may delete.
    pub async fn delete(&self, id: i32, user_id: i32, is_admin: bool) -> AppResult<()> {
        let existing = self.get_by_id(id).await?;
        if existing.user_id != user_id && !is_admin {
            return Err(AppError::Forbidden);
        }

        let txn = self.db.begin().await?;
        remove_content(&txn, ForumTarget::Discussion, id).await?;
        txn.commit().await?;
        Ok(())
    }

    pub async fn toggle_pin(&self, id: i32) -> AppResult<DiscussionModel> {
        let existing = self.get_by_id(id).await?;
        let pinned = !existing.is_pinned;
        let mut active: discussion::ActiveModel = existing.into();
        active.is_pinned = Set(pinned);
        Ok(active.update(&self.db).await?)
    }

    pub async fn toggle_lock(&self, id: i32) -> AppResult<DiscussionModel> {
        let existing = self.get_by_id(id).await?;
        let locked = !existing.is_locked;
        let mut active: discussion::ActiveModel = existing.into();
        active.is_locked = Set(locked);
        Ok(active.update(&self.db).await?)
    }
}

/// Deletes a discussion or reply together with the likes pointing at it.
/// Replies of a deleted discussion go with it (FK cascade), so their likes
/// are removed first. Runs on the caller's connection so it can share a
/// transaction with report resolution.
pub(crate) async fn remove_content<C: ConnectionTrait>(
    conn: &C,
    target: ForumTarget,
    id: i32,
) -> AppResult<()> {
    match target {
        ForumTarget::Discussion => {
            Discussion::find_by_id(id)
                .lock_exclusive()
                .one(conn)
                .await?
                .ok_or(AppError::NotFound)?;

            let reply_ids: Vec<i32> = Reply::find()
                .select_only()
                .column(reply::Column::Id)
                .filter(reply::Column::DiscussionId.eq(id))
                .into_tuple()
                .all(conn)
                .await?;

            if !reply_ids.is_empty() {
                ForumLike::delete_many()
                    .filter(forum_like::Column::TargetType.eq(ForumTarget::Reply))
                    .filter(forum_like::Column::TargetId.is_in(reply_ids))
                    .exec(conn)
                    .await?;
            }
            delete_likes(conn, ForumTarget::Discussion, id).await?;
            Discussion::delete_by_id(id).exec(conn).await?;
        }
        ForumTarget::Reply => {
            let existing = Reply::find_by_id(id)
                .one(conn)
                .await?
                .ok_or(AppError::NotFound)?;

            delete_likes(conn, ForumTarget::Reply, id).await?;
            Reply::delete_by_id(id).exec(conn).await?;

            Discussion::update_many()
                .col_expr(
                    discussion::Column::RepliesCount,
                    Expr::cust("GREATEST(replies_count - 1, 0)"),
                )
                .filter(discussion::Column::Id.eq(existing.discussion_id))
                .exec(conn)
                .await?;
        }
    }

    tracing::info!(target_type = %target, target_id = id, "Forum content removed");
    Ok(())
}

async fn delete_likes<C: ConnectionTrait>(conn: &C, target: ForumTarget, id: i32) -> AppResult<()> {
    ForumLike::delete_many()
        .filter(forum_like::Column::TargetType.eq(target))
        .filter(forum_like::Column::TargetId.eq(id))
        .exec(conn)
        .await?;
    Ok(())
}
