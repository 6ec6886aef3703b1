use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(BackgroundJobs::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(BackgroundJobs::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(BackgroundJobs::ProjectId).string().not_null())
                    .col(ColumnDef::new(BackgroundJobs::JobType).string().not_null())
                    .col(
                        ColumnDef::new(BackgroundJobs::Status)
                            .string()
                            .not_null()
                            .default("queued"),
                    )
                    .col(
                        ColumnDef::new(BackgroundJobs::Total)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(BackgroundJobs::Done)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(BackgroundJobs::Translated)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(BackgroundJobs::Skipped)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(BackgroundJobs::Error).text())
                    .col(
                        ColumnDef::new(BackgroundJobs::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(BackgroundJobs::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_background_jobs_project_id")
                    .table(BackgroundJobs::Table)
                    .col(BackgroundJobs::ProjectId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(BackgroundJobs::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum BackgroundJobs {
    Table,
    Id,
    ProjectId,
    JobType,
    Status,
    Total,
    Done,
    Translated,
    Skipped,
    Error,
    CreatedAt,
    UpdatedAt,
}
