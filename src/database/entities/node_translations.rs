use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::repositories::CachedTranslation;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "node_translations")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub node_id: String,
    #[sea_orm(primary_key, auto_increment = false)]
    pub lang: String,
    #[sea_orm(column_type = "Text")]
    pub text: String,
    pub provider: String,
    pub detected_source_lang: Option<String>,
    pub created_at: ChronoDateTimeUtc,
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

impl From<Model> for CachedTranslation {
    fn from(model: Model) -> Self {
        Self {
            item_id: model.node_id,
            lang: model.lang,
            text: model.text,
            provider: model.provider,
            detected_source_lang: model.detected_source_lang,
            created_at: model.created_at,
        }
    }
}
