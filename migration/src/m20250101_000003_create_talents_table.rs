use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Talents::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Talents::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Talents::UserId).uuid().not_null())
                    .col(ColumnDef::new(Talents::TalentType).string_len(30).not_null())
                    .col(
                        ColumnDef::new(Talents::Status)
                            .string_len(20)
                            .not_null()
                            .default("pending"),
                    )
                    .col(ColumnDef::new(Talents::VerifiedBy).uuid())
                    .col(ColumnDef::new(Talents::VerifiedAt).timestamp())
                    .col(ColumnDef::new(Talents::RejectionReason).text())
                    .col(
                        ColumnDef::new(Talents::CreatedAt)
                            .timestamp()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Talents::UpdatedAt)
                            .timestamp()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_talents_user_id")
                            .from(Talents::Table, Talents::UserId)
                            .to(Users::Table, Users::Id)
                            .on_update(ForeignKeyAction::Cascade)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_talents_user_id")
                    .table(Talents::Table)
                    .col(Talents::UserId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_talents_status")
                    .table(Talents::Table)
                    .col(Talents::Status)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Talents::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Talents {
    Table,
    Id,
    UserId,
    TalentType,
    Status,
    VerifiedBy,
    VerifiedAt,
    RejectionReason,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Users {
    Table,
    Id,
}
