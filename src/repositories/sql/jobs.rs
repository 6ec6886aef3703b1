use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{EntityTrait, TransactionTrait};

use super::SqlStore;
use crate::database::entities::background_jobs;
use crate::graph::new_id;
use crate::jobs::{BackgroundJob, JobStatus, JobType, JobUpdate};
use crate::repositories::JobStore;

#[async_trait]
impl JobStore for SqlStore {
    async fn create_job(&self, project_id: &str, job_type: JobType) -> Result<BackgroundJob> {
        let now = Utc::now();
        let job = BackgroundJob {
            id: new_id(),
            project_id: project_id.to_string(),
            job_type: job_type.as_str().to_string(),
            status: JobStatus::Queued,
            total: 0,
            done: 0,
            translated: 0,
            skipped: 0,
            error: None,
            created_at: now,
            updated_at: now,
        };
        background_jobs::Entity::insert(background_jobs::ActiveModel::from(&job))
            .exec_without_returning(&self.db)
            .await?;
        Ok(job)
    }

    async fn get_job(&self, id: &str) -> Result<Option<BackgroundJob>> {
        let model = background_jobs::Entity::find_by_id(id.to_string())
            .one(&self.db)
            .await?;
        Ok(model.map(Into::into))
    }

    async fn update_job(&self, id: &str, update: JobUpdate) -> Result<()> {
        let txn = self.db.begin().await?;
        let Some(model) = background_jobs::Entity::find_by_id(id.to_string())
            .one(&txn)
            .await?
        else {
            return Ok(());
        };

        let mut job = BackgroundJob::from(model);
        job.apply(&update, Utc::now());
        background_jobs::Entity::update(background_jobs::ActiveModel::from(&job))
            .exec(&txn)
            .await?;
        txn.commit().await?;
        Ok(())
    }
}
