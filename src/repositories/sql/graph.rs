use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use sea_orm::sea_query::{Expr, Query};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, QueryFilter, QueryOrder,
    TransactionTrait,
};

use super::SqlStore;
use crate::database::entities::{
    comment_translations, comments, cost_entries, edges, node_translations, nodes, projects,
    status_changes, time_entries,
};
use crate::graph::{Comment, CostEntry, Edge, Node, Project, StatusChange, TimeEntry};
use crate::repositories::GraphRepository;

#[async_trait]
impl GraphRepository for SqlStore {
    async fn insert_project(&self, project: Project) -> Result<Project> {
        let model = projects::ActiveModel::from(&project).insert(&self.db).await?;
        Ok(model.into())
    }

    async fn get_project(&self, id: &str) -> Result<Option<Project>> {
        let model = projects::Entity::find_by_id(id.to_string())
            .one(&self.db)
            .await?;
        Ok(model.map(Into::into))
    }

    async fn get_node(&self, id: &str) -> Result<Option<Node>> {
        let model = nodes::Entity::find_by_id(id.to_string()).one(&self.db).await?;
        Ok(model.map(Into::into))
    }

    async fn insert_node(&self, node: Node) -> Result<Node> {
        let model = nodes::ActiveModel::from(&node).insert(&self.db).await?;
        Ok(model.into())
    }

    async fn save_node(&self, node: &Node) -> Result<()> {
        nodes::Entity::update_many()
            .set(nodes::ActiveModel::from(node))
            .filter(nodes::Column::Id.eq(node.id.as_str()))
            .exec(&self.db)
            .await?;
        Ok(())
    }

    async fn update_importance_score(&self, id: &str, score: f64) -> Result<()> {
        nodes::Entity::update_many()
            .col_expr(nodes::Column::ImportanceScore, Expr::value(score))
            .filter(nodes::Column::Id.eq(id))
            .exec(&self.db)
            .await?;
        Ok(())
    }

    async fn update_status(&self, id: &str, status: &str) -> Result<()> {
        nodes::Entity::update_many()
            .col_expr(nodes::Column::Status, Expr::value(status))
            .col_expr(nodes::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(nodes::Column::Id.eq(id))
            .filter(nodes::Column::Status.ne(status))
            .exec(&self.db)
            .await?;
        Ok(())
    }

    async fn delete_node(&self, id: &str) -> Result<bool> {
        let txn = self.db.begin().await?;

        comment_translations::Entity::delete_many()
            .filter(
                comment_translations::Column::CommentId.in_subquery(
                    Query::select()
                        .column(comments::Column::Id)
                        .from(comments::Entity)
                        .and_where(comments::Column::NodeId.eq(id))
                        .to_owned(),
                ),
            )
            .exec(&txn)
            .await?;
        comments::Entity::delete_many()
            .filter(comments::Column::NodeId.eq(id))
            .exec(&txn)
            .await?;
        node_translations::Entity::delete_many()
            .filter(node_translations::Column::NodeId.eq(id))
            .exec(&txn)
            .await?;
        time_entries::Entity::delete_many()
            .filter(time_entries::Column::NodeId.eq(id))
            .exec(&txn)
            .await?;
        cost_entries::Entity::delete_many()
            .filter(cost_entries::Column::NodeId.eq(id))
            .exec(&txn)
            .await?;
        status_changes::Entity::delete_many()
            .filter(status_changes::Column::NodeId.eq(id))
            .exec(&txn)
            .await?;
        edges::Entity::delete_many()
            .filter(
                Condition::any()
                    .add(edges::Column::SourceNodeId.eq(id))
                    .add(edges::Column::TargetNodeId.eq(id)),
            )
            .exec(&txn)
            .await?;
        nodes::Entity::update_many()
            .col_expr(nodes::Column::ParentId, Expr::value(Option::<String>::None))
            .filter(nodes::Column::ParentId.eq(id))
            .exec(&txn)
            .await?;
        let deleted = nodes::Entity::delete_by_id(id.to_string())
            .exec(&txn)
            .await?;

        txn.commit().await?;
        Ok(deleted.rows_affected > 0)
    }

    async fn nodes_for_project(&self, project_id: &str) -> Result<Vec<Node>> {
        let models = nodes::Entity::find()
            .filter(nodes::Column::ProjectId.eq(project_id))
            .order_by_asc(nodes::Column::CreatedAt)
            .order_by_asc(nodes::Column::Id)
            .all(&self.db)
            .await?;
        Ok(models.into_iter().map(Into::into).collect())
    }

    async fn children_of(&self, parent_id: &str) -> Result<Vec<Node>> {
        let models = nodes::Entity::find()
            .filter(nodes::Column::ParentId.eq(parent_id))
            .order_by_asc(nodes::Column::CreatedAt)
            .order_by_asc(nodes::Column::Id)
            .all(&self.db)
            .await?;
        Ok(models.into_iter().map(Into::into).collect())
    }

    async fn get_edge(&self, id: &str) -> Result<Option<Edge>> {
        let model = edges::Entity::find_by_id(id.to_string()).one(&self.db).await?;
        Ok(model.map(Into::into))
    }

    async fn insert_edge(&self, edge: Edge) -> Result<Edge> {
        let model = edges::ActiveModel::from(&edge).insert(&self.db).await?;
        Ok(model.into())
    }

    async fn delete_edge(&self, id: &str) -> Result<bool> {
        let result = edges::Entity::delete_by_id(id.to_string())
            .exec(&self.db)
            .await?;
        Ok(result.rows_affected > 0)
    }

    async fn edges_for_project(&self, project_id: &str) -> Result<Vec<Edge>> {
        let models = edges::Entity::find()
            .filter(edges::Column::ProjectId.eq(project_id))
            .order_by_asc(edges::Column::CreatedAt)
            .order_by_asc(edges::Column::Id)
            .all(&self.db)
            .await?;
        Ok(models.into_iter().map(Into::into).collect())
    }

    async fn edges_for_node(&self, node_id: &str) -> Result<Vec<Edge>> {
        let models = edges::Entity::find()
            .filter(
                Condition::any()
                    .add(edges::Column::SourceNodeId.eq(node_id))
                    .add(edges::Column::TargetNodeId.eq(node_id)),
            )
            .all(&self.db)
            .await?;
        Ok(models.into_iter().map(Into::into).collect())
    }

    async fn insert_status_change(&self, change: StatusChange) -> Result<()> {
        status_changes::Entity::insert(status_changes::ActiveModel::from(&change))
            .exec_without_returning(&self.db)
            .await?;
        Ok(())
    }

    async fn status_changes(&self, node_id: &str) -> Result<Vec<StatusChange>> {
        let models = status_changes::Entity::find()
            .filter(status_changes::Column::NodeId.eq(node_id))
            .order_by_asc(status_changes::Column::ChangedAt)
            .order_by_asc(status_changes::Column::Id)
            .all(&self.db)
            .await?;
        Ok(models.into_iter().map(Into::into).collect())
    }

    async fn get_comment(&self, id: &str) -> Result<Option<Comment>> {
        let model = comments::Entity::find_by_id(id.to_string())
            .one(&self.db)
            .await?;
        Ok(model.map(Into::into))
    }

    async fn insert_comment(&self, comment: Comment) -> Result<Comment> {
        let model = comments::ActiveModel::from(&comment).insert(&self.db).await?;
        Ok(model.into())
    }

    async fn save_comment(&self, comment: &Comment) -> Result<()> {
        comments::Entity::update_many()
            .set(comments::ActiveModel::from(comment))
            .filter(comments::Column::Id.eq(comment.id.as_str()))
            .exec(&self.db)
            .await?;
        Ok(())
    }

    async fn insert_time_entry(&self, entry: TimeEntry) -> Result<TimeEntry> {
        time_entries::Entity::insert(time_entries::ActiveModel::from(&entry))
            .exec_without_returning(&self.db)
            .await?;
        Ok(entry)
    }

    async fn insert_cost_entry(&self, entry: CostEntry) -> Result<CostEntry> {
        cost_entries::Entity::insert(cost_entries::ActiveModel::from(&entry))
            .exec_without_returning(&self.db)
            .await?;
        Ok(entry)
    }
}
