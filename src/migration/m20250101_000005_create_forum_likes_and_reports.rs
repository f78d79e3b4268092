use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(DeriveIden)]
enum ForumLikes {
    Table,
    Id,
    UserId,
    TargetType,
    TargetId,
    CreatedAt,
}

#[derive(DeriveIden)]
enum ForumReports {
    Table,
    Id,
    ReporterId,
    TargetType,
    TargetId,
    Reason,
    Description,
    Status,
    AdminNotes,
    ContentDeleted,
    ReviewedBy,
    ReviewedAt,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Users {
    Table,
    Id,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ForumLikes::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ForumLikes::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ForumLikes::UserId).integer().not_null())
                    .col(ColumnDef::new(ForumLikes::TargetType).string_len(20).not_null())
                    .col(ColumnDef::new(ForumLikes::TargetId).integer().not_null())
                    .col(
                        ColumnDef::new(ForumLikes::CreatedAt)
                            .timestamp()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_forum_likes_user_id")
                            .from(ForumLikes::Table, ForumLikes::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_forum_likes_unique")
                    .table(ForumLikes::Table)
                    .col(ForumLikes::UserId)
                    .col(ForumLikes::TargetType)
                    .col(ForumLikes::TargetId)
                    .unique()
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(ForumReports::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ForumReports::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ForumReports::ReporterId).integer().not_null())
                    .col(
                        ColumnDef::new(ForumReports::TargetType)
                            .string_len(20)
                            .not_null(),
                    )
                    .col(ColumnDef::new(ForumReports::TargetId).integer().not_null())
                    .col(ColumnDef::new(ForumReports::Reason).string_len(50).not_null())
                    .col(ColumnDef::new(ForumReports::Description).text().null())
                    .col(
                        ColumnDef::new(ForumReports::Status)
                            .string_len(20)
                            .not_null()
                            .default("pending"),
                    )
                    .col(ColumnDef::new(ForumReports::AdminNotes).text().null())
                    .col(
                        ColumnDef::new(ForumReports::ContentDeleted)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(ForumReports::ReviewedBy).integer().null())
                    .col(ColumnDef::new(ForumReports::ReviewedAt).timestamp().null())
                    .col(
                        ColumnDef::new(ForumReports::CreatedAt)
                            .timestamp()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_forum_reports_reporter_id")
                            .from(ForumReports::Table, ForumReports::ReporterId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_forum_reports_reviewed_by")
                            .from(ForumReports::Table, ForumReports::ReviewedBy)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_forum_reports_status")
                    .table(ForumReports::Table)
                    .col(ForumReports::Status)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_forum_reports_unique")
                    .table(ForumReports::Table)
                    .col(ForumReports::ReporterId)
                    .col(ForumReports::TargetType)
                    .col(ForumReports::TargetId)
                    .unique()
                    .if_not_exists()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ForumReports::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(ForumLikes::Table).to_owned())
            .await
    }
}
