use std::collections::HashMap;

use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use super::{
    CachedTranslation, GraphRepository, JobStore, SourceText, TranslationCacheRepository,
    TranslationRecord,
};
use crate::graph::{new_id, Comment, CostEntry, Edge, Node, Project, StatusChange, TimeEntry};
use crate::jobs::{BackgroundJob, JobStatus, JobType, JobUpdate};

type TranslationKey = (String, String);

#[derive(Default)]
struct MemoryState {
    projects: HashMap<String, Project>,
    nodes: HashMap<String, Node>,
    edges: HashMap<String, Edge>,
    comments: HashMap<String, Comment>,
    time_entries: HashMap<String, TimeEntry>,
    cost_entries: HashMap<String, CostEntry>,
    status_changes: Vec<StatusChange>,
    node_translations: HashMap<TranslationKey, CachedTranslation>,
    comment_translations: HashMap<TranslationKey, CachedTranslation>,
    jobs: HashMap<String, BackgroundJob>,
}

impl MemoryState {
    fn project_nodes(&self, project_id: &str) -> Vec<Node> {
        let mut nodes: Vec<Node> = self
            .nodes
            .values()
            .filter(|node| node.project_id == project_id)
            .cloned()
            .collect();
        nodes.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        nodes
    }

    fn project_comments(&self, project_id: &str) -> Vec<Comment> {
        let mut comments: Vec<Comment> = self
            .comments
            .values()
            .filter(|comment| {
                self.nodes
                    .get(&comment.node_id)
                    .is_some_and(|node| node.project_id == project_id)
            })
            .cloned()
            .collect();
        comments.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        comments
    }
}

fn upsert(
    table: &mut HashMap<TranslationKey, CachedTranslation>,
    records: &[TranslationRecord],
) {
    let now = Utc::now();
    for record in records {
        table.insert(
            (record.item_id.clone(), record.lang.clone()),
            CachedTranslation {
                item_id: record.item_id.clone(),
                lang: record.lang.clone(),
                text: record.text.clone(),
                provider: record.provider.clone(),
                detected_source_lang: record.detected_source_lang.clone(),
                created_at: now,
            },
        );
    }
}

/// Process-local store implementing every repository trait behind one lock.
#[derive(Default)]
pub struct MemoryStore {
    state: RwLock<MemoryState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrite a cached node translation's timestamp. Used to simulate
    /// translations written before the source text changed.
    pub async fn set_node_translation_created_at(
        &self,
        node_id: &str,
        lang: &str,
        created_at: chrono::DateTime<Utc>,
    ) {
        let mut state = self.state.write().await;
        if let Some(record) = state
            .node_translations
            .get_mut(&(node_id.to_string(), lang.to_string()))
        {
            record.created_at = created_at;
        }
    }
}

#[async_trait]
impl GraphRepository for MemoryStore {
    async fn insert_project(&self, project: Project) -> Result<Project> {
        let mut state = self.state.write().await;
        state.projects.insert(project.id.clone(), project.clone());
        Ok(project)
    }

    async fn get_project(&self, id: &str) -> Result<Option<Project>> {
        Ok(self.state.read().await.projects.get(id).cloned())
    }

    async fn get_node(&self, id: &str) -> Result<Option<Node>> {
        Ok(self.state.read().await.nodes.get(id).cloned())
    }

    async fn insert_node(&self, node: Node) -> Result<Node> {
        let mut state = self.state.write().await;
        state.nodes.insert(node.id.clone(), node.clone());
        Ok(node)
    }

    async fn save_node(&self, node: &Node) -> Result<()> {
        let mut state = self.state.write().await;
        if let Some(stored) = state.nodes.get_mut(&node.id) {
            *stored = node.clone();
        }
        Ok(())
    }

    async fn update_importance_score(&self, id: &str, score: f64) -> Result<()> {
        let mut state = self.state.write().await;
        if let Some(node) = state.nodes.get_mut(id) {
            node.importance_score = score;
        }
        Ok(())
    }

    async fn update_status(&self, id: &str, status: &str) -> Result<()> {
        let mut state = self.state.write().await;
        if let Some(node) = state.nodes.get_mut(id) {
            if node.status != status {
                node.status = status.to_string();
                node.updated_at = Utc::now();
            }
        }
        Ok(())
    }

    async fn delete_node(&self, id: &str) -> Result<bool> {
        let mut state = self.state.write().await;
        if state.nodes.remove(id).is_none() {
            return Ok(false);
        }

        state.edges.retain(|_, edge| !edge.touches(id));
        let comment_ids: Vec<String> = state
            .comments
            .values()
            .filter(|comment| comment.node_id == id)
            .map(|comment| comment.id.clone())
            .collect();
        for comment_id in &comment_ids {
            state.comments.remove(comment_id);
        }
        state
            .comment_translations
            .retain(|(item_id, _), _| !comment_ids.contains(item_id));
        state.node_translations.retain(|(item_id, _), _| item_id != id);
        state.time_entries.retain(|_, entry| entry.node_id != id);
        state.cost_entries.retain(|_, entry| entry.node_id != id);
        state.status_changes.retain(|change| change.node_id != id);

        for node in state.nodes.values_mut() {
            if node.parent_id.as_deref() == Some(id) {
                node.parent_id = None;
            }
        }
        Ok(true)
    }

    async fn nodes_for_project(&self, project_id: &str) -> Result<Vec<Node>> {
        Ok(self.state.read().await.project_nodes(project_id))
    }

    async fn children_of(&self, parent_id: &str) -> Result<Vec<Node>> {
        let state = self.state.read().await;
        let mut children: Vec<Node> = state
            .nodes
            .values()
            .filter(|node| node.parent_id.as_deref() == Some(parent_id))
            .cloned()
            .collect();
        children.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(children)
    }

    async fn get_edge(&self, id: &str) -> Result<Option<Edge>> {
        Ok(self.state.read().await.edges.get(id).cloned())
    }

    async fn insert_edge(&self, edge: Edge) -> Result<Edge> {
        let mut state = self.state.write().await;
        state.edges.insert(edge.id.clone(), edge.clone());
        Ok(edge)
    }

    async fn delete_edge(&self, id: &str) -> Result<bool> {
        Ok(self.state.write().await.edges.remove(id).is_some())
    }

    async fn edges_for_project(&self, project_id: &str) -> Result<Vec<Edge>> {
        let state = self.state.read().await;
        let mut edges: Vec<Edge> = state
            .edges
            .values()
            .filter(|edge| edge.project_id == project_id)
            .cloned()
            .collect();
        edges.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(edges)
    }

    async fn edges_for_node(&self, node_id: &str) -> Result<Vec<Edge>> {
        let state = self.state.read().await;
        Ok(state
            .edges
            .values()
            .filter(|edge| edge.touches(node_id))
            .cloned()
            .collect())
    }

    async fn insert_status_change(&self, change: StatusChange) -> Result<()> {
        self.state.write().await.status_changes.push(change);
        Ok(())
    }

    async fn status_changes(&self, node_id: &str) -> Result<Vec<StatusChange>> {
        let state = self.state.read().await;
        Ok(state
            .status_changes
            .iter()
            .filter(|change| change.node_id == node_id)
            .cloned()
            .collect())
    }

    async fn get_comment(&self, id: &str) -> Result<Option<Comment>> {
        Ok(self.state.read().await.comments.get(id).cloned())
    }

    async fn insert_comment(&self, comment: Comment) -> Result<Comment> {
        let mut state = self.state.write().await;
        state.comments.insert(comment.id.clone(), comment.clone());
        Ok(comment)
    }

    async fn save_comment(&self, comment: &Comment) -> Result<()> {
        let mut state = self.state.write().await;
        if let Some(stored) = state.comments.get_mut(&comment.id) {
            *stored = comment.clone();
        }
        Ok(())
    }

    async fn insert_time_entry(&self, entry: TimeEntry) -> Result<TimeEntry> {
        let mut state = self.state.write().await;
        state.time_entries.insert(entry.id.clone(), entry.clone());
        Ok(entry)
    }

    async fn insert_cost_entry(&self, entry: CostEntry) -> Result<CostEntry> {
        let mut state = self.state.write().await;
        state.cost_entries.insert(entry.id.clone(), entry.clone());
        Ok(entry)
    }
}

#[async_trait]
impl TranslationCacheRepository for MemoryStore {
    async fn node_titles(&self, project_id: &str) -> Result<Vec<SourceText>> {
        let state = self.state.read().await;
        Ok(state
            .project_nodes(project_id)
            .into_iter()
            .map(|node| (node.id, node.title))
            .collect())
    }

    async fn comment_bodies(&self, project_id: &str) -> Result<Vec<SourceText>> {
        let state = self.state.read().await;
        Ok(state
            .project_comments(project_id)
            .into_iter()
            .map(|comment| (comment.id, comment.body))
            .collect())
    }

    async fn missing_node_titles(&self, project_id: &str, lang: &str) -> Result<Vec<SourceText>> {
        let state = self.state.read().await;
        Ok(state
            .project_nodes(project_id)
            .into_iter()
            .filter(|node| {
                !state
                    .node_translations
                    .contains_key(&(node.id.clone(), lang.to_string()))
            })
            .map(|node| (node.id, node.title))
            .collect())
    }

    async fn stale_node_titles(&self, project_id: &str, lang: &str) -> Result<Vec<SourceText>> {
        let state = self.state.read().await;
        Ok(state
            .project_nodes(project_id)
            .into_iter()
            .filter(|node| {
                state
                    .node_translations
                    .get(&(node.id.clone(), lang.to_string()))
                    .is_some_and(|record| node.updated_at > record.created_at)
            })
            .map(|node| (node.id, node.title))
            .collect())
    }

    async fn missing_comment_bodies(
        &self,
        project_id: &str,
        lang: &str,
    ) -> Result<Vec<SourceText>> {
        let state = self.state.read().await;
        Ok(state
            .project_comments(project_id)
            .into_iter()
            .filter(|comment| {
                !state
                    .comment_translations
                    .contains_key(&(comment.id.clone(), lang.to_string()))
            })
            .map(|comment| (comment.id, comment.body))
            .collect())
    }

    async fn stale_comment_bodies(&self, project_id: &str, lang: &str) -> Result<Vec<SourceText>> {
        let state = self.state.read().await;
        Ok(state
            .project_comments(project_id)
            .into_iter()
            .filter(|comment| {
                state
                    .comment_translations
                    .get(&(comment.id.clone(), lang.to_string()))
                    .is_some_and(|record| comment.updated_at > record.created_at)
            })
            .map(|comment| (comment.id, comment.body))
            .collect())
    }

    async fn upsert_node_translations(&self, records: &[TranslationRecord]) -> Result<()> {
        let mut state = self.state.write().await;
        upsert(&mut state.node_translations, records);
        Ok(())
    }

    async fn upsert_comment_translations(&self, records: &[TranslationRecord]) -> Result<()> {
        let mut state = self.state.write().await;
        upsert(&mut state.comment_translations, records);
        Ok(())
    }

    async fn node_translation(&self, node_id: &str, lang: &str) -> Result<Option<CachedTranslation>> {
        let state = self.state.read().await;
        Ok(state
            .node_translations
            .get(&(node_id.to_string(), lang.to_string()))
            .cloned())
    }

    async fn comment_translation(
        &self,
        comment_id: &str,
        lang: &str,
    ) -> Result<Option<CachedTranslation>> {
        let state = self.state.read().await;
        Ok(state
            .comment_translations
            .get(&(comment_id.to_string(), lang.to_string()))
            .cloned())
    }
}

#[async_trait]
impl JobStore for MemoryStore {
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
        self.state.write().await.jobs.insert(job.id.clone(), job.clone());
        Ok(job)
    }

    async fn get_job(&self, id: &str) -> Result<Option<BackgroundJob>> {
        Ok(self.state.read().await.jobs.get(id).cloned())
    }

    async fn update_job(&self, id: &str, update: JobUpdate) -> Result<()> {
        let mut state = self.state.write().await;
        if let Some(job) = state.jobs.get_mut(id) {
            job.apply(&update, Utc::now());
        }
        Ok(())
    }
}
