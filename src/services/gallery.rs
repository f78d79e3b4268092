use crate::{
    error::{AppError, AppResult},
    models::{gallery_item, GalleryItem, GalleryItemModel, GalleryKind, GalleryStatus},
};
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, Select,
};

#[derive(Debug, Clone)]
pub struct GallerySubmission {
    pub title: String,
    pub description: Option<String>,
    pub image_url: String,
    pub batch: Option<i32>,
    pub kind: GalleryKind,
}

/// Owner edits; `None` leaves a field as it is.
#[derive(Debug, Default, Clone)]
pub struct GalleryUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub batch: Option<i32>,
    pub kind: Option<GalleryKind>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Moderation {
    Approve,
    Reject { reason: String },
}

impl Moderation {
    fn target(&self) -> GalleryStatus {
        match self {
            Moderation::Approve => GalleryStatus::Approved,
            Moderation::Reject { .. } => GalleryStatus::Rejected,
        }
    }
}

/// Status an item lands in after its owner edits it.
///
/// Public items go back through moderation after an edit that follows a
/// rejection or that turns a personal item public; personal items never
/// wait for moderation.
fn status_after_edit(
    previous_kind: GalleryKind,
    previous_status: GalleryStatus,
    next_kind: GalleryKind,
) -> GalleryStatus {
    match (previous_kind, next_kind) {
        (_, GalleryKind::Personal) => GalleryStatus::Approved,
        (GalleryKind::Personal, GalleryKind::Public) => GalleryStatus::Pending,
        (GalleryKind::Public, GalleryKind::Public) => match previous_status {
            GalleryStatus::Rejected => GalleryStatus::Pending,
            other => other,
        },
    }
}

fn not_deleted() -> Select<GalleryItem> {
    GalleryItem::find().filter(gallery_item::Column::DeletedAt.is_null())
}

pub struct GalleryService {
    db: DatabaseConnection,
}

impl GalleryService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn submit(&self, owner_id: i32, input: GallerySubmission) -> AppResult<GalleryItemModel> {
        let now = chrono::Utc::now().naive_utc();
        let item = gallery_item::ActiveModel {
            user_id: Set(owner_id),
            title: Set(input.title.trim().to_string()),
            description: Set(input.description.filter(|d| !d.trim().is_empty())),
            image_url: Set(input.image_url),
            batch: Set(input.batch),
            kind: Set(input.kind),
            status: Set(input.kind.initial_status()),
            rejection_reason: Set(None),
            approved_by: Set(None),
            approved_at: Set(None),
            deleted_at: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&self.db)
        .await?;

        tracing::info!(item_id = item.id, owner_id, status = %item.status, "Gallery item submitted");
        Ok(item)
    }

    /// Approved public items are visible to everyone; anything else only to
    /// its owner and to admins.
    pub async fn get_visible(
        &self,
        id: i32,
        viewer_id: Option<i32>,
        viewer_is_admin: bool,
    ) -> AppResult<GalleryItemModel> {
        let item = self.find_live(id).await?;
        let is_public = item.kind == GalleryKind::Public && item.status == GalleryStatus::Approved;
        if is_public || viewer_is_admin || viewer_id == Some(item.user_id) {
            Ok(item)
        } else {
            Err(AppError::NotFound)
        }
    }

    pub async fn update(
        &self,
        id: i32,
        owner_id: i32,
        update: GalleryUpdate,
    ) -> AppResult<GalleryItemModel> {
        let item = self.find_live(id).await?;
        if item.user_id != owner_id {
            return Err(AppError::Forbidden);
        }

        let next_kind = update.kind.unwrap_or(item.kind);
        let next_status = status_after_edit(item.kind, item.status, next_kind);
        let reset_moderation = next_status != item.status;

        let mut active: gallery_item::ActiveModel = item.into();
        if let Some(title) = update.title {
            let title = title.trim().to_string();
            if title.is_empty() {
                return Err(AppError::Validation("title cannot be empty".to_string()));
            }
            active.title = Set(title);
        }
        if let Some(description) = update.description {
            active.description = Set(Some(description.trim().to_string()).filter(|d| !d.is_empty()));
        }
        if let Some(batch) = update.batch {
            active.batch = Set(Some(batch));
        }
        active.kind = Set(next_kind);
        if reset_moderation {
            active.status = Set(next_status);
            active.rejection_reason = Set(None);
            active.approved_by = Set(None);
            active.approved_at = Set(None);
        }
        active.updated_at = Set(chrono::Utc::now().naive_utc());

        Ok(active.update(&self.db).await?)
    }

    pub async fn moderate(
        &self,
        id: i32,
        admin_id: i32,
        action: Moderation,
    ) -> AppResult<GalleryItemModel> {
        let item = self.find_live(id).await?;
        if item.kind == GalleryKind::Personal {
            return Err(AppError::Validation(
                "Personal gallery items are not moderated".to_string(),
            ));
        }

        let next = action.target();
        if !item.status.can_transition_to(next) {
            return Err(AppError::transition("gallery item", item.status, next));
        }

        let now = chrono::Utc::now().naive_utc();
        let mut active: gallery_item::ActiveModel = item.into();
        active.status = Set(next);
        active.updated_at = Set(now);
        match action {
            Moderation::Approve => {
                active.rejection_reason = Set(None);
                active.approved_by = Set(Some(admin_id));
                active.approved_at = Set(Some(now));
            }
            Moderation::Reject { reason } => {
                let reason = reason.trim().to_string();
                if reason.is_empty() {
                    return Err(AppError::Validation(
                        "A reason is required when rejecting an item".to_string(),
                    ));
                }
                active.rejection_reason = Set(Some(reason));
                active.approved_by = Set(None);
                active.approved_at = Set(None);
            }
        }

        let updated = active.update(&self.db).await?;
        tracing::info!(item_id = id, admin_id, status = %updated.status, "Gallery item moderated");
        Ok(updated)
    }

    /// Soft delete by the owner or an admin.
    pub async fn delete(&self, id: i32, actor_id: i32, actor_is_admin: bool) -> AppResult<()> {
        let item = self.find_live(id).await?;
        if item.user_id != actor_id && !actor_is_admin {
            return Err(AppError::Forbidden);
        }

        let now = chrono::Utc::now().naive_utc();
        let mut active: gallery_item::ActiveModel = item.into();
        active.deleted_at = Set(Some(now));
        active.updated_at = Set(now);
        active.update(&self.db).await?;
        Ok(())
    }

    pub async fn list_public(
        &self,
        batch: Option<i32>,
        page: u64,
        per_page: u64,
    ) -> AppResult<(Vec<GalleryItemModel>, u64)> {
        let mut query = not_deleted()
            .filter(gallery_item::Column::Kind.eq(GalleryKind::Public))
            .filter(gallery_item::Column::Status.eq(GalleryStatus::Approved));
        if let Some(batch) = batch {
            query = query.filter(gallery_item::Column::Batch.eq(batch));
        }
        self.paginate(query.order_by_desc(gallery_item::Column::ApprovedAt), page, per_page)
            .await
    }

    pub async fn list_for_owner(
        &self,
        owner_id: i32,
        page: u64,
        per_page: u64,
    ) -> AppResult<(Vec<GalleryItemModel>, u64)> {
        let query = not_deleted().filter(gallery_item::Column::UserId.eq(owner_id));
        self.paginate(query, page, per_page).await
    }

    /// Moderation queue: public items, optionally narrowed to one status.
    pub async fn list_for_moderation(
        &self,
        status: Option<GalleryStatus>,
        page: u64,
        per_page: u64,
    ) -> AppResult<(Vec<GalleryItemModel>, u64)> {
        let mut query = not_deleted().filter(gallery_item::Column::Kind.eq(GalleryKind::Public));
        if let Some(status) = status {
            query = query.filter(gallery_item::Column::Status.eq(status));
        }
        self.paginate(query, page, per_page).await
    }

    async fn find_live(&self, id: i32) -> AppResult<GalleryItemModel> {
        not_deleted()
            .filter(gallery_item::Column::Id.eq(id))
            .one(&self.db)
            .await?
            .ok_or(AppError::NotFound)
    }

    async fn paginate(
        &self,
        query: Select<GalleryItem>,
        page: u64,
        per_page: u64,
    ) -> AppResult<(Vec<GalleryItemModel>, u64)> {
        let paginator = query
            .order_by_desc(gallery_item::Column::CreatedAt)
            .order_by_desc(gallery_item::Column::Id)
            .paginate(&self.db, per_page);
        let total = paginator.num_items().await?;
        let items = paginator.fetch_page(page.saturating_sub(1)).await?;
        Ok((items, total))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use GalleryKind::*;
    use GalleryStatus::*;

    #[test]
    fn editing_a_rejected_item_resubmits_it() {
        assert_eq!(status_after_edit(Public, Rejected, Public), Pending);
    }

    #[test]
    fn editing_an_approved_or_pending_public_item_keeps_status() {
        assert_eq!(status_after_edit(Public, Approved, Public), Approved);
        assert_eq!(status_after_edit(Public, Pending, Public), Pending);
    }

    #[test]
    fn switching_kind() {
        assert_eq!(status_after_edit(Personal, Approved, Public), Pending);
        assert_eq!(status_after_edit(Public, Rejected, Personal), Approved);
        assert_eq!(status_after_edit(Public, Pending, Personal), Approved);
    }

    #[test]
    fn moderation_targets() {
        assert_eq!(Moderation::Approve.target(), Approved);
        assert_eq!(
            Moderation::Reject {
                reason: "blurry".into()
            }
            .target(),
            Rejected
        );
    }
}
