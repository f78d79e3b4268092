use sea_orm_migration::prelude::*;

mod m20250101_000001_create_users_table;
mod m20250101_000002_create_events_tables;
mod m20250101_000003_create_gallery_items_table;
mod m20250101_000004_create_forum_tables;
mod m20250101_000005_create_forum_likes_and_reports;
mod m20250101_000006_create_articles_table;
mod m20250101_000007_create_notifications_table;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250101_000001_create_users_table::Migration),
            Box::new(m20250101_000002_create_events_tables::Migration),
            Box::new(m20250101_000003_create_gallery_items_table::Migration),
            Box::new(m20250101_000004_create_forum_tables::Migration),
            Box::new(m20250101_000005_create_forum_likes_and_reports::Migration),
            Box::new(m20250101_000006_create_articles_table::Migration),
            Box::new(m20250101_000007_create_notifications_table::Migration),
        ]
    }
}
