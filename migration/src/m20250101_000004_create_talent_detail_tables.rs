//! 四张人才明细表，均以 `talent_id` 一对一挂在 talents 上并级联删除。

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(TalentTrainings::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(TalentTrainings::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(TalentTrainings::TalentId)
                            .uuid()
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(TalentTrainings::ActivityName)
                            .string_len(255)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(TalentTrainings::Organizer)
                            .string_len(255)
                            .not_null(),
                    )
                    .col(ColumnDef::new(TalentTrainings::StartDate).date().not_null())
                    .col(
                        ColumnDef::new(TalentTrainings::DurationDays)
                            .integer()
                            .not_null(),
                    )
                    .foreign_key(&mut talent_fk(
                        "fk_talent_trainings_talent_id",
                        TalentTrainings::Table,
                        TalentTrainings::TalentId,
                    ))
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(TalentCompetitionMentors::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(TalentCompetitionMentors::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(TalentCompetitionMentors::TalentId)
                            .uuid()
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(TalentCompetitionMentors::CompetitionName)
                            .string_len(255)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(TalentCompetitionMentors::Level)
                            .string_len(20)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(TalentCompetitionMentors::Organizer)
                            .string_len(255)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(TalentCompetitionMentors::Field)
                            .string_len(20)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(TalentCompetitionMentors::Achievement)
                            .string_len(255)
                            .not_null(),
                    )
                    .col(ColumnDef::new(TalentCompetitionMentors::CertificateUrl).string_len(512))
                    .foreign_key(&mut talent_fk(
                        "fk_talent_competition_mentors_talent_id",
                        TalentCompetitionMentors::Table,
                        TalentCompetitionMentors::TalentId,
                    ))
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(TalentCompetitionParticipants::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(TalentCompetitionParticipants::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(TalentCompetitionParticipants::TalentId)
                            .uuid()
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(TalentCompetitionParticipants::CompetitionName)
                            .string_len(255)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(TalentCompetitionParticipants::Level)
                            .string_len(20)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(TalentCompetitionParticipants::Organizer)
                            .string_len(255)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(TalentCompetitionParticipants::Field)
                            .string_len(20)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(TalentCompetitionParticipants::StartDate)
                            .date()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(TalentCompetitionParticipants::DurationDays)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(TalentCompetitionParticipants::CompetitionField)
                            .string_len(255)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(TalentCompetitionParticipants::Achievement)
                            .string_len(255)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(TalentCompetitionParticipants::CertificateUrl)
                            .string_len(512),
                    )
                    .foreign_key(&mut talent_fk(
                        "fk_talent_competition_participants_talent_id",
                        TalentCompetitionParticipants::Table,
                        TalentCompetitionParticipants::TalentId,
                    ))
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(TalentInterests::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(TalentInterests::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(TalentInterests::TalentId)
                            .uuid()
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(TalentInterests::InterestName)
                            .string_len(255)
                            .not_null(),
                    )
                    .col(ColumnDef::new(TalentInterests::Description).text().not_null())
                    .col(ColumnDef::new(TalentInterests::CertificateUrl).string_len(512))
                    .foreign_key(&mut talent_fk(
                        "fk_talent_interests_talent_id",
                        TalentInterests::Table,
                        TalentInterests::TalentId,
                    ))
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(TalentInterests::Table).to_owned())
            .await?;
        manager
            .drop_table(
                Table::drop()
                    .table(TalentCompetitionParticipants::Table)
                    .to_owned(),
            )
            .await?;
        manager
            .drop_table(Table::drop().table(TalentCompetitionMentors::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(TalentTrainings::Table).to_owned())
            .await
    }
}

fn talent_fk<T, C>(name: &str, table: T, column: C) -> ForeignKeyCreateStatement
where
    T: IntoIden + 'static,
    C: IntoIden + 'static,
{
    ForeignKey::create()
        .name(name)
        .from(table, column)
        .to(Talents::Table, Talents::Id)
        .on_update(ForeignKeyAction::Cascade)
        .on_delete(ForeignKeyAction::Cascade)
        .to_owned()
}

#[derive(DeriveIden)]
enum TalentTrainings {
    Table,
    Id,
    TalentId,
    ActivityName,
    Organizer,
    StartDate,
    DurationDays,
}

#[derive(DeriveIden)]
enum TalentCompetitionMentors {
    Table,
    Id,
    TalentId,
    CompetitionName,
    Level,
    Organizer,
    Field,
    Achievement,
    CertificateUrl,
}

#[derive(DeriveIden)]
enum TalentCompetitionParticipants {
    Table,
    Id,
    TalentId,
    CompetitionName,
    Level,
    Organizer,
    Field,
    StartDate,
    DurationDays,
    CompetitionField,
    Achievement,
    CertificateUrl,
}

#[derive(DeriveIden)]
enum TalentInterests {
    Table,
    Id,
    TalentId,
    InterestName,
    Description,
    CertificateUrl,
}

#[derive(DeriveIden)]
enum Talents {
    Table,
    Id,
}
