use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::jobs::BackgroundJob;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "background_jobs")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub project_id: String,
    pub job_type: String,
    pub status: String,
    pub total: i64,
    pub done: i64,
    pub translated: i64,
    pub skipped: i64,
    #[sea_orm(column_type = "Text", nullable)]
    pub error: Option<String>,
    pub created_at: ChronoDateTimeUtc,
    pub updated_at: ChronoDateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

fn counter(value: i64) -> u64 {
    u64::try_from(value).unwrap_or(0)
}

impl From<Model> for BackgroundJob {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            project_id: model.project_id,
            job_type: model.job_type,
            status: model.status.into(),
            total: counter(model.total),
            done: counter(model.done),
            translated: counter(model.translated),
            skipped: counter(model.skipped),
            error: model.error,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

impl From<&BackgroundJob> for ActiveModel {
    fn from(job: &BackgroundJob) -> Self {
        use sea_orm::Set;

        let count = |value: u64| i64::try_from(value).unwrap_or(i64::MAX);
        Self {
            id: Set(job.id.clone()),
            project_id: Set(job.project_id.clone()),
            job_type: Set(job.job_type.clone()),
            status: Set(job.status.into()),
            total: Set(count(job.total)),
            done: Set(count(job.done)),
            translated: Set(count(job.translated)),
            skipped: Set(count(job.skipped)),
            error: Set(job.error.clone()),
            created_at: Set(job.created_at),
            updated_at: Set(job.updated_at),
        }
    }
}
