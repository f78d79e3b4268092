use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Forum content that can be liked or reported.
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
pub enum ForumTarget {
    #[sea_orm(string_value = "discussion")]
    Discussion,
    #[sea_orm(string_value = "reply")]
    Reply,
}

impl ForumTarget {
    pub fn as_str(self) -> &'static str {
        match self {
            ForumTarget::Discussion => "discussion",
            ForumTarget::Reply => "reply",
        }
    }
}

impl std::fmt::Display for ForumTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
