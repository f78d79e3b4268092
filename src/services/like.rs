use crate::{
    error::{AppError, AppResult},
    models::{discussion, forum_like, reply, Discussion, ForumLike, ForumTarget, Reply},
};
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ActiveValue::Set, ColumnTrait, DatabaseConnection,
    DatabaseTransaction, EntityTrait, QueryFilter, QuerySelect, TransactionTrait,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LikeOutcome {
    pub liked: bool,
    pub likes_count: i32,
    /// Author of the liked content.
    pub owner_id: i32,
}

pub struct LikeService {
    db: DatabaseConnection,
}

impl LikeService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Likes the content, or removes an existing like. The counter on the
    /// content row moves in the same transaction.
    pub async fn toggle(
        &self,
        user_id: i32,
        target: ForumTarget,
        target_id: i32,
    ) -> AppResult<LikeOutcome> {
        let txn = self.db.begin().await?;
        let (owner_id, current) = lock_target(&txn, target, target_id).await?;

        let existing = ForumLike::find()
            .filter(forum_like::Column::UserId.eq(user_id))
            .filter(forum_like::Column::TargetType.eq(target))
            .filter(forum_like::Column::TargetId.eq(target_id))
            .one(&txn)
            .await?;

        let (liked, delta) = match existing {
            Some(like) => {
                ForumLike::delete_by_id(like.id).exec(&txn).await?;
                (false, -1)
            }
            None => {
                forum_like::ActiveModel {
                    user_id: Set(user_id),
                    target_type: Set(target),
                    target_id: Set(target_id),
                    created_at: Set(chrono::Utc::now().naive_utc()),
                    ..Default::default()
                }
                .insert(&txn)
                .await?;
                (true, 1)
            }
        };

        let likes_count = (current + delta).max(0);
        match target {
            ForumTarget::Discussion => {
                Discussion::update_many()
                    .col_expr(discussion::Column::LikesCount, Expr::value(likes_count))
                    .filter(discussion::Column::Id.eq(target_id))
                    .exec(&txn)
                    .await?;
            }
            ForumTarget::Reply => {
                Reply::update_many()
                    .col_expr(reply::Column::LikesCount, Expr::value(likes_count))
                    .filter(reply::Column::Id.eq(target_id))
                    .exec(&txn)
                    .await?;
            }
        }

        txn.commit().await?;
        Ok(LikeOutcome {
            liked,
            likes_count,
            owner_id,
        })
    }
}

/// Locks the liked row and returns `(author, likes_count)`.
async fn lock_target(
    txn: &DatabaseTransaction,
    target: ForumTarget,
    id: i32,
) -> AppResult<(i32, i32)> {
    let found = match target {
        ForumTarget::Discussion => Discussion::find_by_id(id)
            .lock_exclusive()
            .one(txn)
            .await?
            .map(|d| (d.user_id, d.likes_count)),
        ForumTarget::Reply => Reply::find_by_id(id)
            .lock_exclusive()
            .one(txn)
            .await?
            .map(|r| (r.user_id, r.likes_count)),
    };
    found.ok_or(AppError::NotFound)
}
