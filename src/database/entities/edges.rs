use sea_orm::entity::prelude::*;
use sea_orm::Set;
use serde::{Deserialize, Serialize};

use crate::graph::Edge;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "edges")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub project_id: String,
    pub source_node_id: String,
    pub target_node_id: String,
    pub weight: f64,
    pub edge_type: String,
    pub created_at: ChronoDateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::projects::Entity",
        from = "Column::ProjectId",
        to = "super::projects::Column::Id"
    )]
    Projects,
}

impl Related<super::projects::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Projects.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for Edge {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            project_id: model.project_id,
            source_node_id: model.source_node_id,
            target_node_id: model.target_node_id,
            weight: model.weight,
            edge_type: model.edge_type,
            created_at: model.created_at,
        }
    }
}

impl From<&Edge> for ActiveModel {
    fn from(edge: &Edge) -> Self {
        Self {
            id: Set(edge.id.clone()),
            project_id: Set(edge.project_id.clone()),
            source_node_id: Set(edge.source_node_id.clone()),
            target_node_id: Set(edge.target_node_id.clone()),
            weight: Set(edge.weight),
            edge_type: Set(edge.edge_type.clone()),
            created_at: Set(edge.created_at),
        }
    }
}
