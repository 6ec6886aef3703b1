use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Projects::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Projects::Id).string().not_null().primary_key())
                    .col(ColumnDef::new(Projects::Name).string().not_null())
                    .col(ColumnDef::new(Projects::Description).text())
                    .col(
                        ColumnDef::new(Projects::Archived)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Projects::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Projects::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Nodes::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Nodes::Id).string().not_null().primary_key())
                    .col(ColumnDef::new(Nodes::ProjectId).string().not_null())
                    .col(ColumnDef::new(Nodes::Title).string().not_null())
                    .col(ColumnDef::new(Nodes::Description).text())
                    .col(
                        ColumnDef::new(Nodes::Status)
                            .string()
                            .not_null()
                            .default("planned"),
                    )
                    .col(
                        ColumnDef::new(Nodes::ImportanceScore)
                            .double()
                            .not_null()
                            .default(0.0),
                    )
                    .col(ColumnDef::new(Nodes::PlannedHours).double().not_null().default(0.0))
                    .col(ColumnDef::new(Nodes::ActualHours).double().not_null().default(0.0))
                    .col(ColumnDef::new(Nodes::PlannedCost).double().not_null().default(0.0))
                    .col(ColumnDef::new(Nodes::ActualCost).double().not_null().default(0.0))
                    .col(ColumnDef::new(Nodes::ParentId).string())
                    .col(
                        ColumnDef::new(Nodes::IsGroup)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Nodes::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Nodes::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_nodes_project_id")
                            .from(Nodes::Table, Nodes::ProjectId)
                            .to(Projects::Table, Projects::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_nodes_parent_id")
                            .from(Nodes::Table, Nodes::ParentId)
                            .to(Nodes::Table, Nodes::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_nodes_project_id")
                    .table(Nodes::Table)
                    .col(Nodes::ProjectId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_nodes_parent_id")
                    .table(Nodes::Table)
                    .col(Nodes::ParentId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Edges::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Edges::Id).string().not_null().primary_key())
                    .col(ColumnDef::new(Edges::ProjectId).string().not_null())
                    .col(ColumnDef::new(Edges::SourceNodeId).string().not_null())
                    .col(ColumnDef::new(Edges::TargetNodeId).string().not_null())
                    .col(ColumnDef::new(Edges::Weight).double().not_null().default(1.0))
                    .col(
                        ColumnDef::new(Edges::EdgeType)
                            .string()
                            .not_null()
                            .default("dependency"),
                    )
                    .col(
                        ColumnDef::new(Edges::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_edges_project_id")
                            .from(Edges::Table, Edges::ProjectId)
                            .to(Projects::Table, Projects::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_edges_source_node_id")
                            .from(Edges::Table, Edges::SourceNodeId)
                            .to(Nodes::Table, Nodes::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_edges_target_node_id")
                            .from(Edges::Table, Edges::TargetNodeId)
                            .to(Nodes::Table, Nodes::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Comments::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Comments::Id).string().not_null().primary_key())
                    .col(ColumnDef::new(Comments::NodeId).string().not_null())
                    .col(ColumnDef::new(Comments::Author).string())
                    .col(ColumnDef::new(Comments::Body).text().not_null())
                    .col(
                        ColumnDef::new(Comments::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Comments::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_comments_node_id")
                            .from(Comments::Table, Comments::NodeId)
                            .to(Nodes::Table, Nodes::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(TimeEntries::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(TimeEntries::Id).string().not_null().primary_key())
                    .col(ColumnDef::new(TimeEntries::NodeId).string().not_null())
                    .col(ColumnDef::new(TimeEntries::Hours).double().not_null())
                    .col(ColumnDef::new(TimeEntries::Note).text())
                    .col(
                        ColumnDef::new(TimeEntries::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_time_entries_node_id")
                            .from(TimeEntries::Table, TimeEntries::NodeId)
                            .to(Nodes::Table, Nodes::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(CostEntries::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(CostEntries::Id).string().not_null().primary_key())
                    .col(ColumnDef::new(CostEntries::NodeId).string().not_null())
                    .col(ColumnDef::new(CostEntries::Amount).double().not_null())
                    .col(
                        ColumnDef::new(CostEntries::Currency)
                            .string()
                            .not_null()
                            .default("EUR"),
                    )
                    .col(ColumnDef::new(CostEntries::Note).text())
                    .col(
                        ColumnDef::new(CostEntries::IncurredAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_cost_entries_node_id")
                            .from(CostEntries::Table, CostEntries::NodeId)
                            .to(Nodes::Table, Nodes::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(StatusChanges::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(StatusChanges::Id).string().not_null().primary_key())
                    .col(ColumnDef::new(StatusChanges::NodeId).string().not_null())
                    .col(ColumnDef::new(StatusChanges::OldStatus).string())
                    .col(ColumnDef::new(StatusChanges::NewStatus).string().not_null())
                    .col(
                        ColumnDef::new(StatusChanges::ChangedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_status_changes_node_id")
                            .from(StatusChanges::Table, StatusChanges::NodeId)
                            .to(Nodes::Table, Nodes::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(StatusChanges::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(CostEntries::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(TimeEntries::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Comments::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Edges::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Nodes::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Projects::Table).to_owned())
            .await?;
        Ok(())
    }
}

#[derive(Iden)]
pub enum Projects {
    Table,
    Id,
    Name,
    Description,
    Archived,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
pub enum Nodes {
    Table,
    Id,
    ProjectId,
    Title,
    Description,
    Status,
    ImportanceScore,
    PlannedHours,
    ActualHours,
    PlannedCost,
    ActualCost,
    ParentId,
    IsGroup,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum Edges {
    Table,
    Id,
    ProjectId,
    SourceNodeId,
    TargetNodeId,
    Weight,
    EdgeType,
    CreatedAt,
}

#[derive(Iden)]
pub enum Comments {
    Table,
    Id,
    NodeId,
    Author,
    Body,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum TimeEntries {
    Table,
    Id,
    NodeId,
    Hours,
    Note,
    CreatedAt,
}

#[derive(Iden)]
enum CostEntries {
    Table,
    Id,
    NodeId,
    Amount,
    Currency,
    Note,
    IncurredAt,
}

#[derive(Iden)]
enum StatusChanges {
    Table,
    Id,
    NodeId,
    OldStatus,
    NewStatus,
    ChangedAt,
}
