use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Queued,
    Running,
    Finished,
    Failed,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Queued => "queued",
            JobStatus::Running => "running",
            JobStatus::Finished => "finished",
            JobStatus::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Finished | JobStatus::Failed)
    }
}

impl From<JobStatus> for String {
    fn from(status: JobStatus) -> Self {
        status.as_str().to_string()
    }
}

impl From<String> for JobStatus {
    fn from(status: String) -> Self {
        match status.as_str() {
            "queued" => JobStatus::Queued,
            "running" => JobStatus::Running,
            "finished" => JobStatus::Finished,
            "failed" => JobStatus::Failed,
            _ => JobStatus::Queued,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobType {
    Translate,
}

impl JobType {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobType::Translate => "translate",
        }
    }
}

/// Durable record of one background job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackgroundJob {
    pub id: String,
    pub project_id: String,
    pub job_type: String,
    pub status: JobStatus,
    pub total: u64,
    pub done: u64,
    pub translated: u64,
    pub skipped: u64,
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl BackgroundJob {
    pub fn apply(&mut self, update: &JobUpdate, now: DateTime<Utc>) {
        if let Some(status) = update.status {
            self.status = status;
        }
        if let Some(total) = update.total {
            self.total = total;
        }
        if let Some(done) = update.done {
            self.done = done;
        }
        if let Some(translated) = update.translated {
            self.translated = translated;
        }
        if let Some(skipped) = update.skipped {
            self.skipped = skipped;
        }
        if let Some(error) = &update.error {
            self.error = Some(error.clone());
        }
        self.updated_at = now;
    }
}

/// Partial update of a job record; `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JobUpdate {
    pub status: Option<JobStatus>,
    pub total: Option<u64>,
    pub done: Option<u64>,
    pub translated: Option<u64>,
    pub skipped: Option<u64>,
    pub error: Option<String>,
}

impl JobUpdate {
    pub fn status(status: JobStatus) -> Self {
        Self {
            status: Some(status),
            ..Default::default()
        }
    }

    pub fn progress(done: u64, translated: u64) -> Self {
        Self {
            done: Some(done),
            translated: Some(translated),
            ..Default::default()
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            status: Some(JobStatus::Failed),
            error: Some(error.into()),
            ..Default::default()
        }
    }

    pub fn with_total(mut self, total: u64) -> Self {
        self.total = Some(total);
        self
    }

    pub fn with_skipped(mut self, skipped: u64) -> Self {
        self.skipped = Some(skipped);
        self
    }
}

/// Read-only view handed to status pollers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobSnapshot {
    pub id: String,
    pub project_id: String,
    pub job_type: String,
    pub status: JobStatus,
    pub total: u64,
    pub done: u64,
    pub translated: u64,
    pub skipped: u64,
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Wall time so far for running jobs, or until the last update otherwise.
    pub run_ms: i64,
}

impl JobSnapshot {
    pub fn from_job(job: BackgroundJob, now: DateTime<Utc>) -> Self {
        let end = if job.status == JobStatus::Running {
            now
        } else {
            job.updated_at
        };
        let run_ms = (end - job.created_at).num_milliseconds().max(0);
        Self {
            id: job.id,
            project_id: job.project_id,
            job_type: job.job_type,
            status: job.status,
            total: job.total,
            done: job.done,
            translated: job.translated,
            skipped: job.skipped,
            error: job.error,
            created_at: job.created_at,
            updated_at: job.updated_at,
            run_ms,
        }
    }
}
