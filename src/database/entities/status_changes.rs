use sea_orm::entity::prelude::*;
use sea_orm::Set;
use serde::{Deserialize, Serialize};

use crate::graph::StatusChange;

/// Append-only; rows are never updated.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "status_changes")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub node_id: String,
    pub old_status: Option<String>,
    pub new_status: String,
    pub changed_at: ChronoDateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::nodes::Entity",
        from = "Column::NodeId",
        to = "super::nodes::Column::Id"
    )]
    Nodes,
}

impl Related<super::nodes::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Nodes.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for StatusChange {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            node_id: model.node_id,
            old_status: model.old_status,
            new_status: model.new_status,
            changed_at: model.changed_at,
        }
    }
}

impl From<&StatusChange> for ActiveModel {
    fn from(change: &StatusChange) -> Self {
        Self {
            id: Set(change.id.clone()),
            node_id: Set(change.node_id.clone()),
            old_status: Set(change.old_status.clone()),
            new_status: Set(change.new_status.clone()),
            changed_at: Set(change.changed_at),
        }
    }
}
