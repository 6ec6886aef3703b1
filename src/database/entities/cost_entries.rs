use sea_orm::entity::prelude::*;
use sea_orm::Set;
use serde::{Deserialize, Serialize};

use crate::graph::CostEntry;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "cost_entries")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub node_id: String,
    pub amount: f64,
    pub currency: String,
    pub note: Option<String>,
    pub incurred_at: ChronoDateTimeUtc,
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

impl From<&CostEntry> for ActiveModel {
    fn from(entry: &CostEntry) -> Self {
        Self {
            id: Set(entry.id.clone()),
            node_id: Set(entry.node_id.clone()),
            amount: Set(entry.amount),
            currency: Set(entry.currency.clone()),
            note: Set(entry.note.clone()),
            incurred_at: Set(entry.incurred_at),
        }
    }
}
