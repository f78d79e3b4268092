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
pub enum GalleryKind {
    /// Only shown on the owner's profile; never moderated.
    #[sea_orm(string_value = "personal")]
    Personal,
    /// Shown in the shared gallery once an admin approves it.
    #[sea_orm(string_value = "public")]
    Public,
}

impl GalleryKind {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "personal" => Some(GalleryKind::Personal),
            "public" => Some(GalleryKind::Public),
            _ => None,
        }
    }

    /// Status a freshly submitted item of this kind starts in.
    pub fn initial_status(self) -> GalleryStatus {
        match self {
            GalleryKind::Personal => GalleryStatus::Approved,
            GalleryKind::Public => GalleryStatus::Pending,
        }
    }
}

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
pub enum GalleryStatus {
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "approved")]
    Approved,
    #[sea_orm(string_value = "rejected")]
    Rejected,
}

impl GalleryStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            GalleryStatus::Pending => "pending",
            GalleryStatus::Approved => "approved",
            GalleryStatus::Rejected => "rejected",
        }
    }

    /// Moderator transitions. Owners reach `Pending` again only by editing.
    pub fn can_transition_to(self, next: GalleryStatus) -> bool {
        use GalleryStatus::*;
        matches!(
            (self, next),
            (Pending, Approved) | (Pending, Rejected) | (Rejected, Approved) | (Approved, Rejected)
        )
    }
}

impl std::fmt::Display for GalleryStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "gallery_items")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub user_id: i32,
    pub title: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,
    pub image_url: String,
    pub batch: Option<i32>,
    pub kind: GalleryKind,
    pub status: GalleryStatus,
    #[sea_orm(column_type = "Text", nullable)]
    pub rejection_reason: Option<String>,
    pub approved_by: Option<i32>,
    pub approved_at: Option<DateTime>,
    pub deleted_at: Option<DateTime>,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id"
    )]
    Owner,
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::ApprovedBy",
        to = "super::user::Column::Id"
    )]
    Approver,
}

impl ActiveModelBehavior for ActiveModel {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn personal_items_bypass_moderation() {
        assert_eq!(GalleryKind::Personal.initial_status(), GalleryStatus::Approved);
        assert_eq!(GalleryKind::Public.initial_status(), GalleryStatus::Pending);
    }

    #[test]
    fn moderators_cannot_send_items_back_to_pending() {
        use GalleryStatus::*;
        for from in [Pending, Approved, Rejected] {
            assert!(!from.can_transition_to(Pending));
        }
    }

    #[test]
    fn rejected_items_can_still_be_approved() {
        assert!(GalleryStatus::Rejected.can_transition_to(GalleryStatus::Approved));
        assert!(!GalleryStatus::Approved.can_transition_to(GalleryStatus::Approved));
    }

    #[test]
    fn parse_is_case_insensitive() {
        assert_eq!(GalleryKind::parse(" Public"), Some(GalleryKind::Public));
        assert_eq!(GalleryKind::parse("PERSONAL"), Some(GalleryKind::Personal));
        assert_eq!(GalleryKind::parse("shared"), None);
    }
}
