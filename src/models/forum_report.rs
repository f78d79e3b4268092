use super::forum_target::ForumTarget;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    EnumIter,
    DeriveActiveEnum,
    Serialize,
    Deserialize,
    ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[serde(rename_all = "snake_case")]
pub enum ReportStatus {
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "reviewed")]
    Reviewed,
    #[sea_orm(string_value = "resolved")]
    Resolved,
    #[sea_orm(string_value = "rejected")]
    Rejected,
}

impl ReportStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ReportStatus::Pending => "pending",
            ReportStatus::Reviewed => "reviewed",
            ReportStatus::Resolved => "resolved",
            ReportStatus::Rejected => "rejected",
        }
    }

    pub fn can_transition_to(self, next: ReportStatus) -> bool {
        use ReportStatus::*;
        match self {
            Pending => matches!(next, Reviewed | Resolved | Rejected),
            Reviewed => matches!(next, Resolved | Rejected),
            Resolved | Rejected => false,
        }
    }
}

impl std::fmt::Display for ReportStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "forum_reports")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub reporter_id: i32,
    pub target_type: ForumTarget,
    pub target_id: i32,
    #[sea_orm(column_type = "String(StringLen::N(50))")]
    pub reason: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,
    pub status: ReportStatus,
    #[sea_orm(column_type = "Text", nullable)]
    pub admin_notes: Option<String>,
    /// Set once the reported content has been removed by a moderator.
    pub content_deleted: bool,
    pub reviewed_by: Option<i32>,
    pub reviewed_at: Option<DateTime>,
    pub created_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::ReporterId",
        to = "super::user::Column::Id"
    )]
    Reporter,
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::ReviewedBy",
        to = "super::user::Column::Id"
    )]
    Reviewer,
}

impl ActiveModelBehavior for ActiveModel {}

#[cfg(test)]
mod tests {
    use super::ReportStatus::{self, *};
    use sea_orm::Iterable;

    #[test]
    fn pending_reports_can_go_anywhere_but_back() {
        assert!(Pending.can_transition_to(Reviewed));
        assert!(Pending.can_transition_to(Resolved));
        assert!(Pending.can_transition_to(Rejected));
        assert!(!Pending.can_transition_to(Pending));
    }

    #[test]
    fn reviewed_reports_must_be_closed() {
        assert!(Reviewed.can_transition_to(Resolved));
        assert!(Reviewed.can_transition_to(Rejected));
        assert!(!Reviewed.can_transition_to(Pending));
        assert!(!Reviewed.can_transition_to(Reviewed));
    }

    #[test]
    fn terminal_states_are_final() {
        for from in [Resolved, Rejected] {
            assert!(ReportStatus::iter().all(|to| !from.can_transition_to(to)));
        }
    }
}
