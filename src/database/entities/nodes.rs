use sea_orm::entity::prelude::*;
use sea_orm::Set;
use serde::{Deserialize, Serialize};

use crate::graph::Node;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "nodes")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub project_id: String,
    pub title: String,
    pub description: Option<String>,
    pub status: String,
    pub importance_score: f64,
    pub planned_hours: f64,
    pub actual_hours: f64,
    pub planned_cost: f64,
    pub actual_cost: f64,
    pub parent_id: Option<String>,
    pub is_group: bool,
    pub created_at: ChronoDateTimeUtc,
    pub updated_at: ChronoDateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::projects::Entity",
        from = "Column::ProjectId",
        to = "super::projects::Column::Id"
    )]
    Projects,
    #[sea_orm(has_many = "super::comments::Entity")]
    Comments,
}

impl Related<super::projects::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Projects.def()
    }
}

impl Related<super::comments::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Comments.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for Node {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            project_id: model.project_id,
            title: model.title,
            description: model.description,
            status: model.status,
            importance_score: model.importance_score,
            planned_hours: model.planned_hours,
            actual_hours: model.actual_hours,
            planned_cost: model.planned_cost,
            actual_cost: model.actual_cost,
            parent_id: model.parent_id,
            is_group: model.is_group,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

impl From<&Node> for ActiveModel {
    fn from(node: &Node) -> Self {
        Self {
            id: Set(node.id.clone()),
            project_id: Set(node.project_id.clone()),
            title: Set(node.title.clone()),
            description: Set(node.description.clone()),
            status: Set(node.status.clone()),
            importance_score: Set(node.importance_score),
            planned_hours: Set(node.planned_hours),
            actual_hours: Set(node.actual_hours),
            planned_cost: Set(node.planned_cost),
            actual_cost: Set(node.actual_cost),
            parent_id: Set(node.parent_id.clone()),
            is_group: Set(node.is_group),
            created_at: Set(node.created_at),
            updated_at: Set(node.updated_at),
        }
    }
}
