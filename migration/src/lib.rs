pub use sea_orm_migration::prelude::*;

mod m20250101_000001_create_schools_table;
mod m20250101_000002_create_users_table;
mod m20250101_000003_create_talents_table;
mod m20250101_000004_create_talent_detail_tables;
mod m20250101_000005_create_notifications_table;
mod m20250101_000006_create_refresh_tokens_table;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250101_000001_create_schools_table::Migration),
            Box::new(m20250101_000002_create_users_table::Migration),
            Box::new(m20250101_000003_create_talents_table::Migration),
            Box::new(m20250101_000004_create_talent_detail_tables::Migration),
            Box::new(m20250101_000005_create_notifications_table::Migration),
            Box::new(m20250101_000006_create_refresh_tokens_table::Migration),
        ]
    }
}
