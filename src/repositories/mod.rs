//! Storage interfaces consumed by the graph engines and the job runner.
//!
//! The core holds only ids across calls and re-fetches state through these
//! traits on every operation. Two implementations ship with the crate: an
//! in-memory store and a sea-orm backed SQL store.

pub mod memory;
pub mod sql;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::graph::{Comment, CostEntry, Edge, Node, Project, StatusChange, TimeEntry};
use crate::jobs::{BackgroundJob, JobType, JobUpdate};

pub use memory::MemoryStore;
pub use sql::SqlStore;

/// `(item_id, source_text)` pair handed to the translator.
pub type SourceText = (String, String);

/// A translation to persist for one `(item_id, lang)` key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranslationRecord {
    pub item_id: String,
    pub lang: String,
    pub text: String,
    pub provider: String,
    pub detected_source_lang: Option<String>,
}

/// A translation as stored in the cache.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedTranslation {
    pub item_id: String,
    pub lang: String,
    pub text: String,
    pub provider: String,
    pub detected_source_lang: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Node, edge and node-owned record storage.
#[async_trait]
pub trait GraphRepository: Send + Sync {
    async fn insert_project(&self, project: Project) -> Result<Project>;

    async fn get_project(&self, id: &str) -> Result<Option<Project>>;

    async fn get_node(&self, id: &str) -> Result<Option<Node>>;

    async fn insert_node(&self, node: Node) -> Result<Node>;

    /// Overwrite every stored field of an existing node.
    async fn save_node(&self, node: &Node) -> Result<()>;

    async fn update_importance_score(&self, id: &str, score: f64) -> Result<()>;

    /// Set a node's status. `updated_at` moves only when the value changes.
    async fn update_status(&self, id: &str, status: &str) -> Result<()>;

    /// Delete a node with its edges, comments, entries and translations.
    /// Children are detached. Returns false when nothing was deleted.
    async fn delete_node(&self, id: &str) -> Result<bool>;

    /// Project nodes ordered by creation time, then id.
    async fn nodes_for_project(&self, project_id: &str) -> Result<Vec<Node>>;

    async fn children_of(&self, parent_id: &str) -> Result<Vec<Node>>;

    async fn get_edge(&self, id: &str) -> Result<Option<Edge>>;

    async fn insert_edge(&self, edge: Edge) -> Result<Edge>;

    async fn delete_edge(&self, id: &str) -> Result<bool>;

    async fn edges_for_project(&self, project_id: &str) -> Result<Vec<Edge>>;

    /// Incoming and outgoing edges of a node.
    async fn edges_for_node(&self, node_id: &str) -> Result<Vec<Edge>>;

    async fn insert_status_change(&self, change: StatusChange) -> Result<()>;

    /// Status history of a node, oldest first.
    async fn status_changes(&self, node_id: &str) -> Result<Vec<StatusChange>>;

    async fn get_comment(&self, id: &str) -> Result<Option<Comment>>;

    async fn insert_comment(&self, comment: Comment) -> Result<Comment>;

    async fn save_comment(&self, comment: &Comment) -> Result<()>;

    async fn insert_time_entry(&self, entry: TimeEntry) -> Result<TimeEntry>;

    async fn insert_cost_entry(&self, entry: CostEntry) -> Result<CostEntry>;
}

/// Source texts and cached translations for node titles and comment bodies.
#[async_trait]
pub trait TranslationCacheRepository: Send + Sync {
    /// Every node title in the project, in stable order.
    async fn node_titles(&self, project_id: &str) -> Result<Vec<SourceText>>;

    /// Every comment body in the project, in stable order.
    async fn comment_bodies(&self, project_id: &str) -> Result<Vec<SourceText>>;

    async fn missing_node_titles(&self, project_id: &str, lang: &str) -> Result<Vec<SourceText>>;

    async fn stale_node_titles(&self, project_id: &str, lang: &str) -> Result<Vec<SourceText>>;

    async fn missing_comment_bodies(&self, project_id: &str, lang: &str) -> Result<Vec<SourceText>>;

    async fn stale_comment_bodies(&self, project_id: &str, lang: &str) -> Result<Vec<SourceText>>;

    async fn upsert_node_translations(&self, records: &[TranslationRecord]) -> Result<()>;

    async fn upsert_comment_translations(&self, records: &[TranslationRecord]) -> Result<()>;

    async fn node_translation(&self, node_id: &str, lang: &str) -> Result<Option<CachedTranslation>>;

    async fn comment_translation(
        &self,
        comment_id: &str,
        lang: &str,
    ) -> Result<Option<CachedTranslation>>;
}

/// Background job records shared between the worker and status pollers.
#[async_trait]
pub trait JobStore: Send + Sync {
    async fn create_job(&self, project_id: &str, job_type: JobType) -> Result<BackgroundJob>;

    async fn get_job(&self, id: &str) -> Result<Option<BackgroundJob>>;

    /// Apply a partial update atomically; unknown ids are ignored.
    async fn update_job(&self, id: &str, update: JobUpdate) -> Result<()>;
}
