use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(DeriveIden)]
enum GalleryItems {
    Table,
    Id,
    UserId,
    Title,
    Description,
    ImageUrl,
    Batch,
    Kind,
    Status,
    RejectionReason,
    ApprovedBy,
    ApprovedAt,
    DeletedAt,
    CreatedAt,
    UpdatedAt,
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
                    .table(GalleryItems::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(GalleryItems::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(GalleryItems::UserId).integer().not_null())
                    .col(ColumnDef::new(GalleryItems::Title).string_len(200).not_null())
                    .col(ColumnDef::new(GalleryItems::Description).text().null())
                    .col(ColumnDef::new(GalleryItems::ImageUrl).string().not_null())
                    .col(ColumnDef::new(GalleryItems::Batch).integer().null())
                    .col(
                        ColumnDef::new(GalleryItems::Kind)
                            .string_len(20)
                            .not_null()
                            .default("public"),
                    )
                    .col(
                        ColumnDef::new(GalleryItems::Status)
                            .string_len(20)
                            .not_null()
                            .default("pending"),
                    )
                    .col(ColumnDef::new(GalleryItems::RejectionReason).text().null())
                    .col(ColumnDef::new(GalleryItems::ApprovedBy).integer().null())
                    .col(ColumnDef::new(GalleryItems::ApprovedAt).timestamp().null())
                    .col(ColumnDef::new(GalleryItems::DeletedAt).timestamp().null())
                    .col(
                        ColumnDef::new(GalleryItems::CreatedAt)
                            .timestamp()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(GalleryItems::UpdatedAt)
                            .timestamp()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_gallery_items_user_id")
                            .from(GalleryItems::Table, GalleryItems::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_gallery_items_approved_by")
                            .from(GalleryItems::Table, GalleryItems::ApprovedBy)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        // Moderation queue and public wall both filter live rows by status.
        let db = manager.get_connection();
        db.execute_unprepared(
            "CREATE INDEX IF NOT EXISTS idx_gallery_items_live_status
             ON gallery_items (kind, status, created_at DESC) WHERE deleted_at IS NULL",
        )
        .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_gallery_items_user_id")
                    .table(GalleryItems::Table)
                    .col(GalleryItems::UserId)
                    .if_not_exists()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(GalleryItems::Table).to_owned())
            .await
    }
}
