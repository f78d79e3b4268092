use crate::{
    error::{AppError, AppResult},
    models::{
        forum_report, Discussion, ForumReport, ForumReportModel, ForumTarget, Reply, ReportStatus,
    },
    services::discussion::remove_content,
};
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ActiveValue::Set, ColumnTrait, DatabaseConnection,
    EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, TransactionTrait,
};

pub const REPORT_REASONS: &[&str] = &[
    "spam",
    "harassment",
    "inappropriate",
    "misinformation",
    "other",
];

/// An admin decision on a report.
#[derive(Debug, Clone)]
pub struct Resolution {
    pub status: ReportStatus,
    pub admin_notes: Option<String>,
    /// Only honoured together with `status = resolved`.
    pub delete_content: bool,
}

impl Resolution {
    fn check(&self, current: ReportStatus) -> AppResult<()> {
        if !current.can_transition_to(self.status) {
            return Err(AppError::transition("report", current, self.status));
        }
        if self.delete_content && self.status != ReportStatus::Resolved {
            return Err(AppError::Validation(
                "Content can only be deleted when resolving a report".to_string(),
            ));
        }
        Ok(())
    }
}

pub struct ReportService {
    db: DatabaseConnection,
}

impl ReportService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn create(
        &self,
        reporter_id: i32,
        target: ForumTarget,
        target_id: i32,
        reason: &str,
        description: Option<&str>,
    ) -> AppResult<ForumReportModel> {
        let reason = reason.trim().to_ascii_lowercase();
        if !REPORT_REASONS.contains(&reason.as_str()) {
            return Err(AppError::Validation(format!(
                "reason must be one of: {}",
                REPORT_REASONS.join(", ")
            )));
        }

        let exists = match target {
            ForumTarget::Discussion => Discussion::find_by_id(target_id)
                .one(&self.db)
                .await?
                .is_some(),
            ForumTarget::Reply => Reply::find_by_id(target_id).one(&self.db).await?.is_some(),
        };
        if !exists {
            return Err(AppError::NotFound);
        }

        let duplicate = ForumReport::find()
            .filter(forum_report::Column::ReporterId.eq(reporter_id))
            .filter(forum_report::Column::TargetType.eq(target))
            .filter(forum_report::Column::TargetId.eq(target_id))
            .count(&self.db)
            .await?;
        if duplicate > 0 {
            return Err(AppError::Conflict(
                "You have already reported this content".to_string(),
            ));
        }

        let report = forum_report::ActiveModel {
            reporter_id: Set(reporter_id),
            target_type: Set(target),
            target_id: Set(target_id),
            reason: Set(reason),
            description: Set(description
                .map(str::trim)
                .filter(|d| !d.is_empty())
                .map(str::to_string)),
            status: Set(ReportStatus::Pending),
            admin_notes: Set(None),
            content_deleted: Set(false),
            reviewed_by: Set(None),
            reviewed_at: Set(None),
            created_at: Set(chrono::Utc::now().naive_utc()),
            ..Default::default()
        }
        .insert(&self.db)
        .await?;

        tracing::info!(report_id = report.id, reporter_id, target_type = %target, target_id, "Report filed");
        Ok(report)
    }

    pub async fn list(
        &self,
        status: Option<ReportStatus>,
        page: u64,
        per_page: u64,
    ) -> AppResult<(Vec<ForumReportModel>, u64)> {
        let mut query = ForumReport::find();
        if let Some(status) = status {
            query = query.filter(forum_report::Column::Status.eq(status));
        }

        let paginator = query
            .order_by_desc(forum_report::Column::CreatedAt)
            .order_by_desc(forum_report::Column::Id)
            .paginate(&self.db, per_page);
        let total = paginator.num_items().await?;
        let items = paginator.fetch_page(page.saturating_sub(1)).await?;
        Ok((items, total))
    }

    /// Moves a report along its workflow. With `delete_content`, the
    /// reported discussion or reply is deleted in the same transaction and
    /// every other open report on it is closed as resolved.
    pub async fn resolve(
        &self,
        id: i32,
        admin_id: i32,
        resolution: Resolution,
    ) -> AppResult<ForumReportModel> {
        let txn = self.db.begin().await?;

        let report = ForumReport::find_by_id(id)
            .lock_exclusive()
            .one(&txn)
            .await?
            .ok_or(AppError::NotFound)?;
        resolution.check(report.status)?;

        let now = chrono::Utc::now().naive_utc();
        let (target, target_id) = (report.target_type, report.target_id);

        if resolution.delete_content && !report.content_deleted {
            match remove_content(&txn, target, target_id).await {
                Ok(()) | Err(AppError::NotFound) => {}
                Err(e) => return Err(e),
            }

            ForumReport::update_many()
                .col_expr(forum_report::Column::Status, Expr::value(ReportStatus::Resolved))
                .col_expr(forum_report::Column::ContentDeleted, Expr::value(true))
                .col_expr(forum_report::Column::ReviewedBy, Expr::value(admin_id))
                .col_expr(forum_report::Column::ReviewedAt, Expr::value(now))
                .filter(forum_report::Column::TargetType.eq(target))
                .filter(forum_report::Column::TargetId.eq(target_id))
                .filter(forum_report::Column::Id.ne(id))
                .filter(
                    forum_report::Column::Status
                        .is_in([ReportStatus::Pending, ReportStatus::Reviewed]),
                )
                .exec(&txn)
                .await?;
        }

        let content_deleted = report.content_deleted || resolution.delete_content;
        let mut active: forum_report::ActiveModel = report.into();
        active.status = Set(resolution.status);
        active.admin_notes = Set(resolution
            .admin_notes
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty()));
        active.content_deleted = Set(content_deleted);
        active.reviewed_by = Set(Some(admin_id));
        active.reviewed_at = Set(Some(now));
        let updated = active.update(&txn).await?;

        txn.commit().await?;
        tracing::info!(report_id = id, admin_id, status = %updated.status, content_deleted, "Report reviewed");
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolution(status: ReportStatus, delete_content: bool) -> Resolution {
        Resolution {
            status,
            admin_notes: None,
            delete_content,
        }
    }

    #[test]
    fn deletion_requires_resolved_status() {
        let err = resolution(ReportStatus::Rejected, true)
            .check(ReportStatus::Pending)
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert!(resolution(ReportStatus::Resolved, true)
            .check(ReportStatus::Pending)
            .is_ok());
    }

    #[test]
    fn closed_reports_stay_closed() {
        let err = resolution(ReportStatus::Reviewed, false)
            .check(ReportStatus::Resolved)
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidTransition { .. }));
    }
}
