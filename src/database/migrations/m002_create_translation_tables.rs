use sea_orm_migration::prelude::*;

use super::m001_create_graph_tables::{Comments, Nodes};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(NodeTranslations::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(NodeTranslations::NodeId).string().not_null())
                    .col(ColumnDef::new(NodeTranslations::Lang).string().not_null())
                    .col(ColumnDef::new(NodeTranslations::Text).text().not_null())
                    .col(ColumnDef::new(NodeTranslations::Provider).string().not_null())
                    .col(ColumnDef::new(NodeTranslations::DetectedSourceLang).string())
                    .col(
                        ColumnDef::new(NodeTranslations::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .primary_key(
                        Index::create()
                            .col(NodeTranslations::NodeId)
                            .col(NodeTranslations::Lang),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_node_translations_node_id")
                            .from(NodeTranslations::Table, NodeTranslations::NodeId)
                            .to(Nodes::Table, Nodes::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(CommentTranslations::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(CommentTranslations::CommentId)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(CommentTranslations::Lang).string().not_null())
                    .col(ColumnDef::new(CommentTranslations::Text).text().not_null())
                    .col(
                        ColumnDef::new(CommentTranslations::Provider)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(CommentTranslations::DetectedSourceLang).string())
                    .col(
                        ColumnDef::new(CommentTranslations::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .primary_key(
                        Index::create()
                            .col(CommentTranslations::CommentId)
                            .col(CommentTranslations::Lang),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_comment_translations_comment_id")
                            .from(CommentTranslations::Table, CommentTranslations::CommentId)
                            .to(Comments::Table, Comments::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(CommentTranslations::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(NodeTranslations::Table).to_owned())
            .await?;
        Ok(())
    }
}

#[derive(Iden)]
enum NodeTranslations {
    Table,
    NodeId,
    Lang,
    Text,
    Provider,
    DetectedSourceLang,
    CreatedAt,
}

#[derive(Iden)]
enum CommentTranslations {
    Table,
    CommentId,
    Lang,
    Text,
    Provider,
    DetectedSourceLang,
    CreatedAt,
}
