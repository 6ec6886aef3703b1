//! Graph mutations with their derived-state side effects.
//!
//! Every mutation runs to completion in the caller: status change, then
//! history, then ancestor status propagation, then score recompute.

use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::errors::{GraphError, GraphResult};
use crate::graph::{
    new_id, Comment, CostEntry, Edge, Node, Project, StatusChange, TimeEntry,
    DEFAULT_EDGE_TYPE,
};
use crate::repositories::GraphRepository;
use crate::services::graph_analysis_service::{GraphAnalysisService, ProjectMetrics};
use crate::services::node_service::{GraphScoreEngine, GroupStatusPropagator};

const DEFAULT_GROUP_TITLE: &str = "Group";
const DEFAULT_CURRENCY: &str = "EUR";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewNode {
    pub project_id: String,
    pub title: String,
    pub description: Option<String>,
    pub status: Option<String>,
    pub planned_hours: f64,
    pub planned_cost: f64,
    pub parent_id: Option<String>,
    pub is_group: bool,
}

impl NewNode {
    pub fn new(project_id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            title: title.into(),
            description: None,
            status: None,
            planned_hours: 0.0,
            planned_cost: 0.0,
            parent_id: None,
            is_group: false,
        }
    }

    pub fn planned_hours(mut self, hours: f64) -> Self {
        self.planned_hours = hours;
        self
    }

    pub fn status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(status.into());
        self
    }

    pub fn parent(mut self, parent_id: impl Into<String>) -> Self {
        self.parent_id = Some(parent_id.into());
        self
    }

    pub fn group(mut self) -> Self {
        self.is_group = true;
        self
    }
}

/// Partial node update. `parent_id: Some(None)` detaches the node.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<String>,
    pub planned_hours: Option<f64>,
    pub actual_hours: Option<f64>,
    pub planned_cost: Option<f64>,
    pub actual_cost: Option<f64>,
    pub parent_id: Option<Option<String>>,
    pub is_group: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewEdge {
    pub project_id: String,
    pub source_node_id: String,
    pub target_node_id: String,
    pub weight: Option<f64>,
    pub edge_type: Option<String>,
}

impl NewEdge {
    pub fn new(
        project_id: impl Into<String>,
        source_node_id: impl Into<String>,
        target_node_id: impl Into<String>,
    ) -> Self {
        Self {
            project_id: project_id.into(),
            source_node_id: source_node_id.into(),
            target_node_id: target_node_id.into(),
            weight: None,
            edge_type: None,
        }
    }
}

fn ensure_non_negative(field: &str, value: f64) -> GraphResult<()> {
    if !value.is_finite() || value < 0.0 {
        return Err(GraphError::Validation(format!(
            "{} must be a non-negative number",
            field
        )));
    }
    Ok(())
}

fn ensure_text(field: &str, value: &str) -> GraphResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(GraphError::Validation(format!("{} must not be empty", field)));
    }
    Ok(trimmed.to_string())
}

/// Graph mutation operations over a [`GraphRepository`].
#[derive(Clone)]
pub struct GraphMutationService {
    repo: Arc<dyn GraphRepository>,
    scores: GraphScoreEngine,
    groups: GroupStatusPropagator,
    analysis: GraphAnalysisService,
}

impl GraphMutationService {
    pub fn new(repo: Arc<dyn GraphRepository>) -> Self {
        Self {
            scores: GraphScoreEngine::new(repo.clone()),
            groups: GroupStatusPropagator::new(repo.clone()),
            analysis: GraphAnalysisService::new(repo.clone()),
            repo,
        }
    }

    pub async fn create_project(
        &self,
        name: &str,
        description: Option<String>,
    ) -> GraphResult<Project> {
        let mut project = Project::new(ensure_text("name", name)?);
        project.description = description;
        let project = self.repo.insert_project(project).await?;
        info!("Created project {} ({})", project.name, project.id);
        Ok(project)
    }

    pub async fn get_node(&self, id: &str) -> GraphResult<Node> {
        self.repo
            .get_node(id)
            .await?
            .ok_or_else(|| GraphError::NodeNotFound(id.to_string()))
    }

    async fn require_project(&self, project_id: &str) -> GraphResult<()> {
        match self.repo.get_project(project_id).await? {
            Some(_) => Ok(()),
            None => Err(GraphError::ProjectNotFound(project_id.to_string())),
        }
    }

    /// Load `node_id` and check it lives in `project_id`.
    async fn project_node(&self, project_id: &str, node_id: &str) -> GraphResult<Node> {
        let node = self.get_node(node_id).await?;
        if node.project_id != project_id {
            return Err(GraphError::ProjectMismatch {
                node: node_id.to_string(),
                project: project_id.to_string(),
            });
        }
        Ok(node)
    }

    /// Reject placing `child_id` under `parent` when `parent` is the child
    /// itself or one of its descendants.
    async fn ensure_can_attach(&self, child_id: &str, parent: &Node) -> GraphResult<()> {
        let cycle = || GraphError::GroupCycle {
            child: child_id.to_string(),
            parent: parent.id.clone(),
        };
        if parent.id == child_id {
            return Err(cycle());
        }

        let mut seen = HashSet::new();
        let mut current = parent.parent_id.clone();
        while let Some(ancestor_id) = current {
            if ancestor_id == child_id {
                return Err(cycle());
            }
            if !seen.insert(ancestor_id.clone()) {
                break;
            }
            current = self
                .repo
                .get_node(&ancestor_id)
                .await?
                .and_then(|ancestor| ancestor.parent_id);
        }
        Ok(())
    }

    /// Re-derive the chain above a changed child and the parent's score.
    async fn refresh_parent(&self, parent_id: Option<&str>) -> GraphResult<()> {
        if let Some(parent_id) = parent_id {
            self.groups.recompute_group_status(parent_id).await?;
            self.scores.recompute_importance(parent_id).await?;
        }
        Ok(())
    }

    pub async fn create_node(&self, new: NewNode) -> GraphResult<Node> {
        self.require_project(&new.project_id).await?;
        let title = ensure_text("title", &new.title)?;
        ensure_non_negative("planned_hours", new.planned_hours)?;
        ensure_non_negative("planned_cost", new.planned_cost)?;

        let mut node = Node::new(&new.project_id, title);
        node.description = new.description;
        if let Some(status) = new.status {
            node.status = ensure_text("status", &status)?;
        }
        node.planned_hours = new.planned_hours;
        node.planned_cost = new.planned_cost;
        node.is_group = new.is_group;
        if let Some(parent_id) = &new.parent_id {
            self.project_node(&new.project_id, parent_id).await?;
            node.parent_id = Some(parent_id.clone());
        }

        let node = self.repo.insert_node(node).await?;
        debug!("Created node {} in project {}", node.id, node.project_id);

        if node.is_group {
            self.groups.recompute_group_status(&node.id).await?;
        }
        self.refresh_parent(node.parent_id.as_deref()).await?;
        self.scores.recompute_importance(&node.id).await?;
        self.get_node(&node.id).await
    }

    pub async fn update_node(&self, id: &str, update: NodeUpdate) -> GraphResult<Node> {
        let mut node = self.get_node(id).await?;
        let old_status = node.status.clone();
        let old_parent = node.parent_id.clone();
        let old_hours = node.total_hours();
        let old_is_group = node.is_group;

        if let Some(title) = &update.title {
            node.title = ensure_text("title", title)?;
        }
        if let Some(description) = update.description {
            node.description = Some(description);
        }
        for (field, value, slot) in [
            ("planned_hours", update.planned_hours, &mut node.planned_hours),
            ("actual_hours", update.actual_hours, &mut node.actual_hours),
            ("planned_cost", update.planned_cost, &mut node.planned_cost),
            ("actual_cost", update.actual_cost, &mut node.actual_cost),
        ] {
            if let Some(value) = value {
                ensure_non_negative(field, value)?;
                *slot = value;
            }
        }
        if let Some(is_group) = update.is_group {
            node.is_group = is_group;
        }
        if let Some(parent_id) = update.parent_id {
            if let Some(parent_id) = &parent_id {
                let parent = self.project_node(&node.project_id, parent_id).await?;
                self.ensure_can_attach(&node.id, &parent).await?;
            }
            node.parent_id = parent_id;
        }
        if let Some(status) = &update.status {
            let status = ensure_text("status", status)?;
            // Group status is derived from the children.
            if node.is_group || !self.repo.children_of(&node.id).await?.is_empty() {
                debug!("Ignoring direct status {} on group node {}", status, node.id);
            } else {
                node.status = status;
            }
        }

        node.updated_at = Utc::now();
        self.repo.save_node(&node).await?;

        let status_changed = node.status != old_status;
        if status_changed {
            self.repo
                .insert_status_change(StatusChange::new(
                    &node.id,
                    Some(old_status.clone()),
                    node.status.clone(),
                ))
                .await?;
            info!("Node {} status {} -> {}", node.id, old_status, node.status);
        }

        let parent_changed = node.parent_id != old_parent;
        let group_changed = node.is_group != old_is_group;
        if group_changed {
            self.groups.recompute_group_status(&node.id).await?;
        }
        if status_changed || parent_changed || group_changed {
            self.refresh_parent(node.parent_id.as_deref()).await?;
        }
        if parent_changed {
            self.refresh_parent(old_parent.as_deref()).await?;
        }
        if node.total_hours() != old_hours {
            self.scores.recompute_importance(&node.id).await?;
        }

        self.get_node(id).await
    }

    /// Delete a node and everything it owns. Children become roots.
    pub async fn delete_node(&self, id: &str) -> GraphResult<bool> {
        let Some(node) = self.repo.get_node(id).await? else {
            return Ok(false);
        };
        let neighbours: BTreeSet<String> = self
            .repo
            .edges_for_node(id)
            .await?
            .into_iter()
            .map(|edge| {
                if edge.source_node_id == id {
                    edge.target_node_id
                } else {
                    edge.source_node_id
                }
            })
            .filter(|other| other != id)
            .collect();

        if !self.repo.delete_node(id).await? {
            return Ok(false);
        }
        info!("Deleted node {} from project {}", id, node.project_id);

        self.refresh_parent(node.parent_id.as_deref()).await?;
        for neighbour in &neighbours {
            self.scores.recompute_importance(neighbour).await?;
        }
        Ok(true)
    }

    pub async fn create_edge(&self, new: NewEdge) -> GraphResult<Edge> {
        if new.source_node_id == new.target_node_id {
            return Err(GraphError::SelfLoop(new.source_node_id));
        }
        self.require_project(&new.project_id).await?;
        self.project_node(&new.project_id, &new.source_node_id).await?;
        self.project_node(&new.project_id, &new.target_node_id).await?;

        let mut edge = Edge::new(&new.project_id, &new.source_node_id, &new.target_node_id);
        if let Some(weight) = new.weight {
            if !weight.is_finite() {
                return Err(GraphError::Validation("weight must be finite".to_string()));
            }
            edge.weight = weight;
        }
        edge.edge_type = new
            .edge_type
            .map(|kind| kind.trim().to_string())
            .filter(|kind| !kind.is_empty())
            .unwrap_or_else(|| DEFAULT_EDGE_TYPE.to_string());

        let edge = self.repo.insert_edge(edge).await?;
        debug!(
            "Created edge {} ({} -> {})",
            edge.id, edge.source_node_id, edge.target_node_id
        );
        self.scores.recompute_importance(&edge.source_node_id).await?;
        self.scores.recompute_importance(&edge.target_node_id).await?;
        Ok(edge)
    }

    pub async fn delete_edge(&self, id: &str) -> GraphResult<bool> {
        let Some(edge) = self.repo.get_edge(id).await? else {
            return Ok(false);
        };
        if !self.repo.delete_edge(id).await? {
            return Ok(false);
        }
        self.scores.recompute_importance(&edge.source_node_id).await?;
        self.scores.recompute_importance(&edge.target_node_id).await?;
        Ok(true)
    }

    /// Log hours against a node; they accumulate into `actual_hours`.
    pub async fn add_time_entry(
        &self,
        node_id: &str,
        hours: f64,
        note: Option<String>,
    ) -> GraphResult<TimeEntry> {
        ensure_non_negative("hours", hours)?;
        let mut node = self.get_node(node_id).await?;

        let entry = self
            .repo
            .insert_time_entry(TimeEntry {
                id: new_id(),
                node_id: node_id.to_string(),
                hours,
                note,
                created_at: Utc::now(),
            })
            .await?;
        node.actual_hours += hours;
        node.updated_at = Utc::now();
        self.repo.save_node(&node).await?;

        self.refresh_parent(node.parent_id.as_deref()).await?;
        self.scores.recompute_importance(node_id).await?;
        Ok(entry)
    }

    /// Record spend against a node; it accumulates into `actual_cost`.
    pub async fn add_cost_entry(
        &self,
        node_id: &str,
        amount: f64,
        currency: Option<&str>,
        note: Option<String>,
    ) -> GraphResult<CostEntry> {
        ensure_non_negative("amount", amount)?;
        let mut node = self.get_node(node_id).await?;

        let currency = currency
            .map(|code| code.trim().to_uppercase())
            .filter(|code| !code.is_empty())
            .unwrap_or_else(|| DEFAULT_CURRENCY.to_string());
        let entry = self
            .repo
            .insert_cost_entry(CostEntry {
                id: new_id(),
                node_id: node_id.to_string(),
                amount,
                currency,
                note,
                incurred_at: Utc::now(),
            })
            .await?;
        node.actual_cost += amount;
        node.updated_at = Utc::now();
        self.repo.save_node(&node).await?;

        self.refresh_parent(node.parent_id.as_deref()).await?;
        self.scores.recompute_importance(node_id).await?;
        Ok(entry)
    }

    pub async fn add_comment(
        &self,
        node_id: &str,
        author: Option<String>,
        body: &str,
    ) -> GraphResult<Comment> {
        self.get_node(node_id).await?;
        let comment = Comment::new(node_id, author, ensure_text("body", body)?);
        Ok(self.repo.insert_comment(comment).await?)
    }

    /// Replace a comment body. Existing translations of it become stale.
    pub async fn update_comment(&self, id: &str, body: &str) -> GraphResult<Comment> {
        let mut comment = self
            .repo
            .get_comment(id)
            .await?
            .ok_or_else(|| GraphError::CommentNotFound(id.to_string()))?;
        comment.body = ensure_text("body", body)?;
        comment.updated_at = Utc::now();
        self.repo.save_comment(&comment).await?;
        Ok(comment)
    }

    /// Create a group in `project_id` holding the listed nodes. Ids that are
    /// unknown or belong to another project are skipped.
    pub async fn group_nodes(
        &self,
        project_id: &str,
        title: &str,
        node_ids: &[String],
    ) -> GraphResult<Node> {
        if node_ids.is_empty() {
            return Err(GraphError::Validation("node_ids required".to_string()));
        }
        self.require_project(project_id).await?;

        let title = match title.trim() {
            "" => DEFAULT_GROUP_TITLE,
            title => title,
        };
        let mut group = Node::new(project_id, title);
        group.is_group = true;
        let group = self.repo.insert_node(group).await?;
        info!("Created group {} in project {}", group.id, project_id);

        self.add_to_group(&group.id, node_ids).await
    }

    /// Move the listed nodes of the group's project under an existing group.
    pub async fn add_to_group(&self, group_id: &str, node_ids: &[String]) -> GraphResult<Node> {
        let group = self.get_node(group_id).await?;
        if !group.is_group {
            return Err(GraphError::Validation(format!(
                "Node '{}' is not a group",
                group_id
            )));
        }

        let mut members = Vec::new();
        for node_id in node_ids {
            match self.repo.get_node(node_id).await? {
                Some(node) if node.project_id == group.project_id => {
                    self.ensure_can_attach(&node.id, &group).await?;
                    members.push(node);
                }
                _ => debug!("Skipping node {} for group {}", node_id, group_id),
            }
        }

        let mut former_parents = BTreeSet::new();
        for mut node in members {
            if node.parent_id.as_deref() == Some(group_id) {
                continue;
            }
            if let Some(previous) = node.parent_id.take() {
                former_parents.insert(previous);
            }
            node.parent_id = Some(group_id.to_string());
            node.updated_at = Utc::now();
            self.repo.save_node(&node).await?;
        }

        self.groups.recompute_group_status(group_id).await?;
        self.scores.recompute_importance(group_id).await?;
        for previous in &former_parents {
            self.refresh_parent(Some(previous)).await?;
        }
        self.get_node(group_id).await
    }

    /// Detach every child of a group and clear its group flag.
    pub async fn ungroup(&self, group_id: &str) -> GraphResult<Vec<String>> {
        let mut group = self.get_node(group_id).await?;
        if !group.is_group {
            return Err(GraphError::NodeNotFound(group_id.to_string()));
        }

        let mut detached = Vec::new();
        for mut child in self.repo.children_of(group_id).await? {
            child.parent_id = None;
            child.updated_at = Utc::now();
            self.repo.save_node(&child).await?;
            detached.push(child.id);
        }
        group.is_group = false;
        group.updated_at = Utc::now();
        self.repo.save_node(&group).await?;
        info!("Ungrouped {} nodes from {}", detached.len(), group_id);

        self.refresh_parent(group.parent_id.as_deref()).await?;
        self.scores.recompute_importance(group_id).await?;
        Ok(detached)
    }

    pub async fn status_history(&self, node_id: &str) -> GraphResult<Vec<StatusChange>> {
        self.get_node(node_id).await?;
        Ok(self.repo.status_changes(node_id).await?)
    }

    pub async fn project_metrics(&self, project_id: &str) -> GraphResult<ProjectMetrics> {
        self.analysis.project_metrics(project_id).await
    }
}
