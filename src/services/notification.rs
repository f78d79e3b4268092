use crate::{
    error::{AppError, AppResult},
    models::{notification, Notification, NotificationModel},
    websocket::hub::{NotificationHub, PushMessage},
};
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ActiveValue::Set, ColumnTrait, DatabaseConnection,
    EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    Reply,
    Like,
    GalleryApproved,
    GalleryRejected,
    RegistrationUpdated,
    EventReminder,
}

impl NotificationKind {
    pub fn as_str(self) -> &'static str {
        match self {
            NotificationKind::Reply => "reply",
            NotificationKind::Like => "like",
            NotificationKind::GalleryApproved => "gallery_approved",
            NotificationKind::GalleryRejected => "gallery_rejected",
            NotificationKind::RegistrationUpdated => "registration_updated",
            NotificationKind::EventReminder => "event_reminder",
        }
    }
}

/// What a notification links to, as `(target_type, target_id)`.
#[derive(Debug, Clone, Copy)]
pub struct NotificationTarget {
    pub kind: &'static str,
    pub id: i32,
}

impl NotificationTarget {
    pub fn discussion(id: i32) -> Self {
        Self { kind: "discussion", id }
    }

    pub fn reply(id: i32) -> Self {
        Self { kind: "reply", id }
    }

    pub fn gallery_item(id: i32) -> Self {
        Self {
            kind: "gallery_item",
            id,
        }
    }

    pub fn event(id: i32) -> Self {
        Self { kind: "event", id }
    }
}

fn should_notify(recipient_id: i32, actor_id: Option<i32>) -> bool {
    actor_id != Some(recipient_id)
}

#[derive(Clone)]
pub struct NotificationService {
    db: DatabaseConnection,
    hub: NotificationHub,
}

impl NotificationService {
    pub fn new(db: DatabaseConnection, hub: NotificationHub) -> Self {
        Self { db, hub }
    }

    /// Persists and pushes a notification. Members are never notified about
    /// their own actions; `None` is returned in that case.
    pub async fn notify(
        &self,
        recipient_id: i32,
        actor_id: Option<i32>,
        kind: NotificationKind,
        target: NotificationTarget,
        message: &str,
    ) -> AppResult<Option<NotificationModel>> {
        if !should_notify(recipient_id, actor_id) {
            return Ok(None);
        }

        let saved = notification::ActiveModel {
            user_id: Set(recipient_id),
            actor_id: Set(actor_id),
            kind: Set(kind.as_str().to_string()),
            target_type: Set(target.kind.to_string()),
            target_id: Set(target.id),
            message: Set(message.to_string()),
            is_read: Set(false),
            created_at: Set(chrono::Utc::now().naive_utc()),
            ..Default::default()
        }
        .insert(&self.db)
        .await?;

        self.hub.push(
            recipient_id,
            &PushMessage::Notification {
                id: saved.id,
                kind: saved.kind.clone(),
                message: saved.message.clone(),
                target_type: saved.target_type.clone(),
                target_id: saved.target_id,
                created_at: saved.created_at.to_string(),
            },
        );

        Ok(Some(saved))
    }

    /// Fire-and-forget variant for side effects of another operation: a
    /// failed notification is logged and never fails the caller.
    pub async fn notify_quietly(
        &self,
        recipient_id: i32,
        actor_id: Option<i32>,
        kind: NotificationKind,
        target: NotificationTarget,
        message: &str,
    ) {
        if let Err(e) = self
            .notify(recipient_id, actor_id, kind, target, message)
            .await
        {
            tracing::warn!(
                recipient_id,
                kind = kind.as_str(),
                "Failed to create notification: {}",
                e
            );
        }
    }

    pub async fn list_for_user(
        &self,
        user_id: i32,
        unread_only: bool,
        page: u64,
        per_page: u64,
    ) -> AppResult<(Vec<NotificationModel>, u64)> {
        let mut query = Notification::find().filter(notification::Column::UserId.eq(user_id));
        if unread_only {
            query = query.filter(notification::Column::IsRead.eq(false));
        }
        let paginator = query
            .order_by_desc(notification::Column::CreatedAt)
            .order_by_desc(notification::Column::Id)
            .paginate(&self.db, per_page);

        let total = paginator.num_items().await?;
        let items = paginator.fetch_page(page.saturating_sub(1)).await?;
        Ok((items, total))
    }

    pub async fn unread_count(&self, user_id: i32) -> AppResult<u64> {
        let count = Notification::find()
            .filter(notification::Column::UserId.eq(user_id))
            .filter(notification::Column::IsRead.eq(false))
            .count(&self.db)
            .await?;
        Ok(count)
    }

    pub async fn mark_read(&self, id: i32, user_id: i32) -> AppResult<NotificationModel> {
        let existing = Notification::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or(AppError::NotFound)?;

        // Another member's notification is reported as missing.
        if existing.user_id != user_id {
            return Err(AppError::NotFound);
        }
        if existing.is_read {
            return Ok(existing);
        }

        let mut active: notification::ActiveModel = existing.into();
        active.is_read = Set(true);
        let updated = active.update(&self.db).await?;
        self.push_unread_count(user_id).await;
        Ok(updated)
    }

    pub async fn mark_all_read(&self, user_id: i32) -> AppResult<u64> {
        let result = Notification::update_many()
            .col_expr(notification::Column::IsRead, Expr::value(true))
            .filter(notification::Column::UserId.eq(user_id))
            .filter(notification::Column::IsRead.eq(false))
            .exec(&self.db)
            .await?;
        self.hub
            .push(user_id, &PushMessage::UnreadCount { count: 0 });
        Ok(result.rows_affected)
    }

    async fn push_unread_count(&self, user_id: i32) {
        if !self.hub.is_online(user_id) {
            return;
        }
        if let Ok(count) = self.unread_count(user_id).await {
            self.hub.push(user_id, &PushMessage::UnreadCount { count });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_self_notification() {
        assert!(!should_notify(1, Some(1)));
        assert!(should_notify(1, Some(2)));
    }

    #[test]
    fn system_notifications_always_go_out() {
        assert!(should_notify(1, None));
    }

    #[test]
    fn kinds_are_stable_strings() {
        assert_eq!(NotificationKind::EventReminder.as_str(), "event_reminder");
        assert_eq!(NotificationKind::GalleryRejected.as_str(), "gallery_rejected");
    }
}
