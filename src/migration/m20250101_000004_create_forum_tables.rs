use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(DeriveIden)]
enum Categories {
    Table,
    Id,
    Name,
    Slug,
    Description,
    SortOrder,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Discussions {
    Table,
    Id,
    UserId,
    CategoryId,
    Title,
    Content,
    IsPinned,
    IsLocked,
    ViewsCount,
    LikesCount,
    RepliesCount,
    LastReplyAt,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Replies {
    Table,
    Id,
    DiscussionId,
    UserId,
    Content,
    LikesCount,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Users {
    Table,
    Id,
}

fn counter(col: impl IntoIden) -> ColumnDef {
    ColumnDef::new(col).integer().not_null().default(0).to_owned()
}

fn flag(col: impl IntoIden) -> ColumnDef {
    ColumnDef::new(col).boolean().not_null().default(false).to_owned()
}

fn timestamp_now(col: impl IntoIden) -> ColumnDef {
    ColumnDef::new(col)
        .timestamp()
        .not_null()
        .default(Expr::current_timestamp())
        .to_owned()
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Categories::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Categories::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Categories::Name)
                            .string_len(100)
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(Categories::Slug)
                            .string_len(100)
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Categories::Description).text().not_null().default(""))
                    .col(counter(Categories::SortOrder))
                    .col(timestamp_now(Categories::CreatedAt))
                    .col(timestamp_now(Categories::UpdatedAt))
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Discussions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Discussions::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Discussions::UserId).integer().not_null())
                    .col(ColumnDef::new(Discussions::CategoryId).integer().not_null())
                    .col(ColumnDef::new(Discussions::Title).string_len(200).not_null())
                    .col(ColumnDef::new(Discussions::Content).text().not_null())
                    .col(flag(Discussions::IsPinned))
                    .col(flag(Discussions::IsLocked))
                    .col(counter(Discussions::ViewsCount))
                    .col(counter(Discussions::LikesCount))
                    .col(counter(Discussions::RepliesCount))
                    .col(ColumnDef::new(Discussions::LastReplyAt).timestamp().null())
                    .col(timestamp_now(Discussions::CreatedAt))
                    .col(timestamp_now(Discussions::UpdatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_discussions_user_id")
                            .from(Discussions::Table, Discussions::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_discussions_category_id")
                            .from(Discussions::Table, Discussions::CategoryId)
                            .to(Categories::Table, Categories::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_discussions_category_id")
                    .table(Discussions::Table)
                    .col(Discussions::CategoryId)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Replies::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Replies::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Replies::DiscussionId).integer().not_null())
                    .col(ColumnDef::new(Replies::UserId).integer().not_null())
                    .col(ColumnDef::new(Replies::Content).text().not_null())
                    .col(counter(Replies::LikesCount))
                    .col(timestamp_now(Replies::CreatedAt))
                    .col(timestamp_now(Replies::UpdatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_replies_discussion_id")
                            .from(Replies::Table, Replies::DiscussionId)
                            .to(Discussions::Table, Discussions::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_replies_user_id")
                            .from(Replies::Table, Replies::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_replies_discussion_id")
                    .table(Replies::Table)
                    .col(Replies::DiscussionId)
                    .if_not_exists()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Replies::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Discussions::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Categories::Table).to_owned())
            .await
    }
}
