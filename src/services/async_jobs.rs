use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use anyhow::Result;
use chrono::Utc;
use tokio::sync::Semaphore;
use tokio::task::{JoinError, JoinHandle};
use tracing::{debug, error, info};

use crate::jobs::{JobSnapshot, JobStatus, JobType, JobUpdate};
use crate::repositories::{JobStore, SourceText, TranslationCacheRepository, TranslationRecord};
use crate::services::translation::{TranslatedItem, TranslationClient};

/// Parameters of one project translation job.
#[derive(Debug, Clone, PartialEq)]
pub struct TranslationJobRequest {
    pub project_id: String,
    pub lang: String,
    pub include_nodes: bool,
    pub include_comments: bool,
    pub include_stale: bool,
    pub provider: Option<String>,
    pub force: bool,
}

impl TranslationJobRequest {
    /// Node titles only, missing translations only.
    pub fn new(project_id: impl Into<String>, lang: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            lang: lang.into(),
            include_nodes: true,
            include_comments: false,
            include_stale: false,
            provider: None,
            force: false,
        }
    }

    pub fn nodes(mut self, include: bool) -> Self {
        self.include_nodes = include;
        self
    }

    pub fn comments(mut self, include: bool) -> Self {
        self.include_comments = include;
        self
    }

    pub fn stale(mut self, include: bool) -> Self {
        self.include_stale = include;
        self
    }

    pub fn force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    pub fn provider(mut self, provider: impl Into<String>) -> Self {
        self.provider = Some(provider.into());
        self
    }
}

/// Returned by `enqueue_translation_job` before any work happens.
#[derive(Debug)]
pub struct JobHandle {
    pub job_id: String,
    task: Option<JoinHandle<()>>,
}

impl JobHandle {
    /// True when the job already reached a terminal state inside `enqueue`.
    pub fn completed_inline(&self) -> bool {
        self.task.is_none()
    }

    /// Wait for the job's task to end. The outcome is in the job record.
    pub async fn wait(self) -> Result<()> {
        if let Some(task) = self.task {
            task.await?;
        }
        Ok(())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ItemKind {
    Nodes,
    Comments,
}

impl ItemKind {
    fn label(&self) -> &'static str {
        match self {
            ItemKind::Nodes => "nodes",
            ItemKind::Comments => "comments",
        }
    }
}

/// Items of one kind: the whole corpus and the subset to translate.
#[derive(Default)]
struct WorkSet {
    all: Vec<SourceText>,
    target: Vec<SourceText>,
}

/// Runs translation jobs on a bounded pool of tokio tasks.
#[derive(Clone)]
pub struct AsyncJobRunner {
    jobs: Arc<dyn JobStore>,
    cache: Arc<dyn TranslationCacheRepository>,
    client: Arc<TranslationClient>,
    workers: Arc<Semaphore>,
}

impl AsyncJobRunner {
    pub fn new(
        jobs: Arc<dyn JobStore>,
        cache: Arc<dyn TranslationCacheRepository>,
        client: Arc<TranslationClient>,
        workers: usize,
    ) -> Self {
        Self {
            jobs,
            cache,
            client,
            workers: Arc::new(Semaphore::new(workers.max(1))),
        }
    }

    /// Record a queued job and start it in the background.
    ///
    /// A request for neither nodes nor comments is finished before this
    /// returns, without touching any provider.
    pub async fn enqueue_translation_job(&self, request: TranslationJobRequest) -> Result<JobHandle> {
        let job = self
            .jobs
            .create_job(&request.project_id, JobType::Translate)
            .await?;
        let job_id = job.id;
        info!(
            "[translate job {}] enqueued project={} lang={} nodes={} comments={} stale={} force={} provider={:?}",
            job_id,
            request.project_id,
            request.lang,
            request.include_nodes,
            request.include_comments,
            request.include_stale,
            request.force,
            request.provider
        );

        if !request.include_nodes && !request.include_comments {
            if let Err(err) = self.finish_without_work(&job_id).await {
                error!("[translate job {}] unexpected error in fast path: {:#}", job_id, err);
                self.mark_failed(&job_id, format!("{:#}", err)).await;
            }
            return Ok(JobHandle { job_id, task: None });
        }

        let runner = self.clone();
        let id = job_id.clone();
        let task = tokio::spawn(async move { runner.run_job(id, request).await });
        Ok(JobHandle {
            job_id,
            task: Some(task),
        })
    }

    pub async fn get_job_status(&self, job_id: &str) -> Result<Option<JobSnapshot>> {
        let job = self.jobs.get_job(job_id).await?;
        Ok(job.map(|job| JobSnapshot::from_job(job, Utc::now())))
    }

    async fn finish_without_work(&self, job_id: &str) -> Result<()> {
        self.jobs
            .update_job(job_id, JobUpdate::status(JobStatus::Running).with_total(0))
            .await?;
        self.jobs
            .update_job(job_id, JobUpdate::status(JobStatus::Finished).with_skipped(2))
            .await?;
        info!("[translate job {}] finished (fast path) translated=0 skipped=2", job_id);
        Ok(())
    }

    async fn run_job(self, job_id: String, request: TranslationJobRequest) {
        let permit = match self.workers.clone().acquire_owned().await {
            Ok(permit) => permit,
            Err(err) => {
                self.mark_failed(&job_id, format!("worker pool closed: {}", err))
                    .await;
                return;
            }
        };

        // Nested task so a panic inside the job lands in the record.
        let worker = self.clone();
        let id = job_id.clone();
        let outcome = tokio::spawn(async move { worker.translate_project(&id, &request).await }).await;
        drop(permit);

        let message = match outcome {
            Ok(Ok(())) => return,
            Ok(Err(err)) => format!("{:#}", err),
            Err(join_err) => panic_message(join_err),
        };
        error!("[translate job {}] failed: {}", job_id, message);
        self.mark_failed(&job_id, message).await;
    }

    async fn mark_failed(&self, job_id: &str, message: String) {
        if let Err(err) = self.jobs.update_job(job_id, JobUpdate::failed(message)).await {
            error!("[translate job {}] could not record failure: {:#}", job_id, err);
        }
    }

    async fn translate_project(&self, job_id: &str, request: &TranslationJobRequest) -> Result<()> {
        self.jobs
            .update_job(job_id, JobUpdate::status(JobStatus::Running))
            .await?;
        info!("[translate job {}] running", job_id);

        let nodes = self.work_set(ItemKind::Nodes, request).await?;
        let comments = self.work_set(ItemKind::Comments, request).await?;

        let total = (nodes.all.len() + comments.all.len()) as u64;
        self.jobs
            .update_job(job_id, JobUpdate::default().with_total(total))
            .await?;
        info!(
            "[translate job {}] total items: {} (nodes={}, comments={})",
            job_id,
            total,
            nodes.all.len(),
            comments.all.len()
        );

        let provider = self.client.resolve_provider_name(request.provider.as_deref());
        info!("[translate job {}] provider={}", job_id, provider);

        let mut skipped = 0;
        let mut node_results = HashMap::new();
        let mut comment_results = HashMap::new();
        for (kind, set, results) in [
            (ItemKind::Nodes, &nodes, &mut node_results),
            (ItemKind::Comments, &comments, &mut comment_results),
        ] {
            if set.target.is_empty() {
                skipped += 1;
                continue;
            }
            *results = self.translate_set(&set.target, &request.lang, &provider).await?;
            debug!(
                "[translate job {}] {} translated: {}",
                job_id,
                kind.label(),
                results.len()
            );
        }

        let mut done = 0u64;
        let mut translated = 0u64;
        let mut node_records = Vec::new();
        let mut comment_records = Vec::new();
        for (set, results, records) in [
            (&nodes, &mut node_results, &mut node_records),
            (&comments, &mut comment_results, &mut comment_records),
        ] {
            for (item_id, _) in &set.all {
                if let Some(item) = results.remove(item_id) {
                    records.push(TranslationRecord {
                        item_id: item_id.clone(),
                        lang: request.lang.clone(),
                        text: item.text,
                        provider: provider.clone(),
                        detected_source_lang: item.detected_source_lang,
                    });
                    translated += 1;
                }
                done += 1;
                self.jobs
                    .update_job(job_id, JobUpdate::progress(done, translated))
                    .await?;
                debug!(
                    "[translate job {}] progress {}/{} (translated={})",
                    job_id, done, total, translated
                );
            }
        }

        if !node_records.is_empty() {
            self.cache.upsert_node_translations(&node_records).await?;
        }
        if !comment_records.is_empty() {
            self.cache.upsert_comment_translations(&comment_records).await?;
        }

        self.jobs
            .update_job(
                job_id,
                JobUpdate::status(JobStatus::Finished).with_skipped(skipped),
            )
            .await?;
        info!(
            "[translate job {}] finished translated={} skipped={}",
            job_id, translated, skipped
        );
        Ok(())
    }

    async fn work_set(&self, kind: ItemKind, request: &TranslationJobRequest) -> Result<WorkSet> {
        let requested = match kind {
            ItemKind::Nodes => request.include_nodes,
            ItemKind::Comments => request.include_comments,
        };
        if !requested {
            return Ok(WorkSet::default());
        }

        let project = request.project_id.as_str();
        let lang = request.lang.as_str();
        let all = match kind {
            ItemKind::Nodes => self.cache.node_titles(project).await?,
            ItemKind::Comments => self.cache.comment_bodies(project).await?,
        };
        if request.force {
            return Ok(WorkSet {
                target: all.clone(),
                all,
            });
        }

        let mut candidates = match kind {
            ItemKind::Nodes => self.cache.missing_node_titles(project, lang).await?,
            ItemKind::Comments => self.cache.missing_comment_bodies(project, lang).await?,
        };
        if request.include_stale {
            candidates.extend(match kind {
                ItemKind::Nodes => self.cache.stale_node_titles(project, lang).await?,
                ItemKind::Comments => self.cache.stale_comment_bodies(project, lang).await?,
            });
        }
        Ok(WorkSet {
            all,
            target: dedup_by_id(candidates),
        })
    }

    async fn translate_set(
        &self,
        target: &[SourceText],
        lang: &str,
        provider: &str,
    ) -> Result<HashMap<String, TranslatedItem>> {
        let texts: Vec<String> = target.iter().map(|(_, text)| text.clone()).collect();
        let items = self.client.translate_texts(&texts, lang, provider).await?;
        Ok(target
            .iter()
            .map(|(id, _)| id.clone())
            .zip(items)
            .collect())
    }
}

/// Keep the first occurrence of each item id.
fn dedup_by_id(items: Vec<SourceText>) -> Vec<SourceText> {
    let mut seen = HashSet::new();
    items
        .into_iter()
        .filter(|(id, _)| seen.insert(id.clone()))
        .collect()
}

fn panic_message(err: JoinError) -> String {
    if !err.is_panic() {
        return format!("worker task cancelled: {}", err);
    }
    let payload = err.into_panic();
    if let Some(message) = payload.downcast_ref::<&str>() {
        format!("worker panicked: {}", message)
    } else if let Some(message) = payload.downcast_ref::<String>() {
        format!("worker panicked: {}", message)
    } else {
        "worker panicked".to_string()
    }
}
