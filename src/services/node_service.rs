//! Derived node state: importance score and aggregated group status.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::errors::GraphResult;
use crate::graph::{NodeStatus, StatusChange};
use crate::repositories::GraphRepository;

fn ln_1p_clamped(value: f64) -> f64 {
    value.max(0.0).ln_1p()
}

/// `0.5·ln(1+hours) + 0.2·ln(1+children) + 0.2·ln(1+degree)`, each argument
/// clamped at zero. Costs do not contribute.
pub fn importance_score(total_hours: f64, child_count: usize, degree: usize) -> f64 {
    0.5 * ln_1p_clamped(total_hours)
        + 0.2 * ln_1p_clamped(child_count as f64)
        + 0.2 * ln_1p_clamped(degree as f64)
}

/// Status of a group from its children's statuses.
///
/// blocked beats in-progress; done only when every child is done; an empty
/// group is planned.
pub fn aggregate_group_status<I>(statuses: I) -> NodeStatus
where
    I: IntoIterator<Item = NodeStatus>,
{
    let mut any = false;
    let mut any_in_progress = false;
    let mut all_done = true;
    for status in statuses {
        any = true;
        match status {
            NodeStatus::Blocked => return NodeStatus::Blocked,
            NodeStatus::InProgress => any_in_progress = true,
            NodeStatus::Done => {}
            NodeStatus::Planned => all_done = false,
        }
    }

    if any_in_progress {
        NodeStatus::InProgress
    } else if any && all_done {
        NodeStatus::Done
    } else {
        NodeStatus::Planned
    }
}

/// Recomputes and persists node importance scores.
#[derive(Clone)]
pub struct GraphScoreEngine {
    repo: Arc<dyn GraphRepository>,
}

impl GraphScoreEngine {
    pub fn new(repo: Arc<dyn GraphRepository>) -> Self {
        Self { repo }
    }

    /// Returns the new score, or `None` when the node no longer exists.
    pub async fn recompute_importance(&self, node_id: &str) -> GraphResult<Option<f64>> {
        let Some(node) = self.repo.get_node(node_id).await? else {
            debug!("Skipping score recompute for missing node {}", node_id);
            return Ok(None);
        };

        let child_count = self.repo.children_of(node_id).await?.len();
        let degree = self.repo.edges_for_node(node_id).await?.len();
        let score = importance_score(node.total_hours(), child_count, degree);

        self.repo.update_importance_score(node_id, score).await?;
        debug!(
            "Node {} score {:.4} (hours={}, children={}, degree={})",
            node_id,
            score,
            node.total_hours(),
            child_count,
            degree
        );
        Ok(Some(score))
    }
}

/// Walks a node's ancestor chain re-deriving group statuses.
#[derive(Clone)]
pub struct GroupStatusPropagator {
    repo: Arc<dyn GraphRepository>,
}

impl GroupStatusPropagator {
    pub fn new(repo: Arc<dyn GraphRepository>) -> Self {
        Self { repo }
    }

    /// Recompute `start_node_id` and every ancestor up to the root.
    ///
    /// Groups (nodes flagged `is_group` or with children) take the aggregate
    /// of their direct children and are written even when unchanged. Plain
    /// leaves keep their own status. Returns the ids written, start first.
    pub async fn recompute_group_status(&self, start_node_id: &str) -> GraphResult<Vec<String>> {
        let mut written = Vec::new();
        let mut visited = HashSet::new();
        let mut current = Some(start_node_id.to_string());

        while let Some(node_id) = current.take() {
            if !visited.insert(node_id.clone()) {
                warn!("Parent cycle detected at node {}; stopping status walk", node_id);
                break;
            }
            let Some(node) = self.repo.get_node(&node_id).await? else {
                break;
            };

            let children = self.repo.children_of(&node_id).await?;
            if node.is_group || !children.is_empty() {
                let derived =
                    aggregate_group_status(children.iter().map(|child| child.normalized_status()));
                let derived = derived.as_str();

                self.repo.update_status(&node_id, derived).await?;
                if node.status != derived {
                    self.repo
                        .insert_status_change(StatusChange::new(
                            &node_id,
                            Some(node.status.clone()),
                            derived,
                        ))
                        .await?;
                    debug!("Group {} status {} -> {}", node_id, node.status, derived);
                }
                written.push(node_id);
            }

            current = node.parent_id;
        }

        Ok(written)
    }
}
