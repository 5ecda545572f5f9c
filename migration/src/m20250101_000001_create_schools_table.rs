use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Schools::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Schools::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Schools::Name).string_len(255).not_null())
                    .col(
                        ColumnDef::new(Schools::Npsn)
                            .string_len(20)
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Schools::Status).string_len(10).not_null())
                    .col(ColumnDef::new(Schools::Address).text())
                    // 校长引用不建外键：users 表依赖 schools，SQLite 不支持事后追加外键
                    .col(ColumnDef::new(Schools::HeadMasterId).uuid())
                    .col(
                        ColumnDef::new(Schools::CreatedAt)
                            .timestamp()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Schools::UpdatedAt)
                            .timestamp()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_schools_name")
                    .table(Schools::Table)
                    .col(Schools::Name)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Schools::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Schools {
    Table,
    Id,
    Name,
    Npsn,
    Status,
    Address,
    HeadMasterId,
    CreatedAt,
    UpdatedAt,
}
