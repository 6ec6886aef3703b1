use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::repositories::CachedTranslation;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "comment_translations")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub comment_id: String,
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
        belongs_to = "super::comments::Entity",
        from = "Column::CommentId",
        to = "super::comments::Column::Id"
    )]
    Comments,
}

impl Related<super::comments::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Comments.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for CachedTranslation {
    fn from(model: Model) -> Self {
        Self {
            item_id: model.comment_id,
            lang: model.lang,
            text: model.text,
            provider: model.provider,
            detected_source_lang: model.detected_source_lang,
            created_at: model.created_at,
        }
    }
}
