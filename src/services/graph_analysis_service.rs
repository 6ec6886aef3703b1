use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::errors::{GraphError, GraphResult};
use crate::graph::{Edge, Node, NodeStatus};
use crate::repositories::GraphRepository;

const TOP_NODE_LIMIT: usize = 5;

/// Longest chain of dependencies weighted by planned hours.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CriticalPath {
    pub node_ids: Vec<String>,
    pub total_planned_hours: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeScore {
    pub id: String,
    pub title: String,
    pub score: f64,
}

/// Project summary: counts, totals, highest-scoring nodes and the critical path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectMetrics {
    pub project_id: String,
    pub count_nodes: usize,
    pub count_edges: usize,
    pub count_groups: usize,
    pub status_counts: BTreeMap<String, usize>,
    pub total_hours: f64,
    pub total_planned_hours: f64,
    pub total_cost: f64,
    pub total_planned_cost: f64,
    pub top_nodes: Vec<NodeScore>,
    pub critical_path_hint: CriticalPath,
}

/// Longest path through the project graph where each node weighs its
/// planned hours.
///
/// Edges whose endpoints are not both in `nodes` are ignored. Nodes are
/// ordered with Kahn's algorithm; nodes stuck in a cycle are appended
/// afterwards. Every iteration runs in ascending node id, distance ties pick
/// the lowest id, and backtracking stops at a node already on the path, so a
/// cyclic graph still yields a finite answer.
pub fn critical_path(nodes: &[Node], edges: &[Edge]) -> CriticalPath {
    let planned: BTreeMap<&str, f64> = nodes
        .iter()
        .map(|node| (node.id.as_str(), node.planned_hours))
        .collect();
    if planned.is_empty() {
        return CriticalPath::default();
    }

    let mut outgoing: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
    let mut indegree: BTreeMap<&str, usize> = planned.keys().map(|id| (*id, 0)).collect();
    for edge in edges {
        let source = edge.source_node_id.as_str();
        let target = edge.target_node_id.as_str();
        if !planned.contains_key(source) || !planned.contains_key(target) {
            continue;
        }
        outgoing.entry(source).or_default().push(target);
        if let Some(count) = indegree.get_mut(target) {
            *count += 1;
        }
    }
    for targets in outgoing.values_mut() {
        targets.sort_unstable();
    }
    let targets_of = |id: &str| outgoing.get(id).map(Vec::as_slice).unwrap_or_default();

    let mut queue: VecDeque<&str> = indegree
        .iter()
        .filter(|(_, count)| **count == 0)
        .map(|(id, _)| *id)
        .collect();
    let mut order = Vec::with_capacity(planned.len());
    let mut placed = HashSet::new();
    while let Some(node) = queue.pop_front() {
        order.push(node);
        placed.insert(node);
        for &target in targets_of(node) {
            if let Some(count) = indegree.get_mut(target) {
                *count -= 1;
                if *count == 0 {
                    queue.push_back(target);
                }
            }
        }
    }
    let leftovers: BTreeSet<&str> = planned
        .keys()
        .copied()
        .filter(|id| !placed.contains(id))
        .collect();
    if !leftovers.is_empty() {
        debug!("Critical path: {} nodes sit on cycles", leftovers.len());
    }
    order.extend(leftovers);

    let mut dist = planned.clone();
    let mut prev: HashMap<&str, &str> = HashMap::new();
    for &node in &order {
        let base = dist[node];
        for &target in targets_of(node) {
            let candidate = base + planned[target];
            if candidate > dist[target] {
                dist.insert(target, candidate);
                prev.insert(target, node);
            }
        }
    }

    let mut end = "";
    let mut best = f64::NEG_INFINITY;
    for (&id, &distance) in &dist {
        if distance > best {
            end = id;
            best = distance;
        }
    }

    let mut path = vec![end];
    let mut on_path = HashSet::from([end]);
    let mut current = end;
    while let Some(&previous) = prev.get(current) {
        if !on_path.insert(previous) {
            break;
        }
        path.push(previous);
        current = previous;
    }
    path.reverse();

    CriticalPath {
        node_ids: path.into_iter().map(str::to_string).collect(),
        total_planned_hours: best,
    }
}

/// Read-only analysis over a project's graph.
#[derive(Clone)]
pub struct GraphAnalysisService {
    repo: Arc<dyn GraphRepository>,
}

impl GraphAnalysisService {
    pub fn new(repo: Arc<dyn GraphRepository>) -> Self {
        Self { repo }
    }

    /// Critical path of a project; an unknown or empty project yields an
    /// empty path of zero hours.
    pub async fn longest_path_by_planned_hours(&self, project_id: &str) -> GraphResult<CriticalPath> {
        let nodes = self.repo.nodes_for_project(project_id).await?;
        let edges = self.repo.edges_for_project(project_id).await?;
        Ok(critical_path(&nodes, &edges))
    }

    pub async fn project_metrics(&self, project_id: &str) -> GraphResult<ProjectMetrics> {
        if self.repo.get_project(project_id).await?.is_none() {
            return Err(GraphError::ProjectNotFound(project_id.to_string()));
        }
        let nodes = self.repo.nodes_for_project(project_id).await?;
        let edges = self.repo.edges_for_project(project_id).await?;

        let mut status_counts = BTreeMap::new();
        for node in &nodes {
            *status_counts
                .entry(NodeStatus::normalize(&node.status).to_string())
                .or_insert(0) += 1;
        }

        let mut ranked: Vec<&Node> = nodes.iter().collect();
        ranked.sort_by(|a, b| {
            b.importance_score
                .total_cmp(&a.importance_score)
                .then_with(|| a.id.cmp(&b.id))
        });
        let top_nodes = ranked
            .into_iter()
            .take(TOP_NODE_LIMIT)
            .map(|node| NodeScore {
                id: node.id.clone(),
                title: node.title.clone(),
                score: node.importance_score,
            })
            .collect();

        Ok(ProjectMetrics {
            project_id: project_id.to_string(),
            count_nodes: nodes.len(),
            count_edges: edges.len(),
            count_groups: nodes.iter().filter(|node| node.is_group).count(),
            status_counts,
            total_hours: nodes.iter().map(|node| node.actual_hours).sum(),
            total_planned_hours: nodes.iter().map(|node| node.planned_hours).sum(),
            total_cost: nodes.iter().map(|node| node.actual_cost).sum(),
            total_planned_cost: nodes.iter().map(|node| node.planned_cost).sum(),
            top_nodes,
            critical_path_hint: critical_path(&nodes, &edges),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(id: &str, hours: f64) -> Node {
        let mut node = Node::new("p1", id);
        node.id = id.to_string();
        node.planned_hours = hours;
        node
    }

    fn edge(source: &str, target: &str) -> Edge {
        Edge::new("p1", source, target)
    }

    #[test]
    fn test_chain() {
        let nodes = vec![node("A", 2.0), node("B", 3.0), node("C", 1.0)];
        let edges = vec![edge("A", "B"), edge("B", "C")];
        let path = critical_path(&nodes, &edges);
        assert_eq!(path.node_ids, vec!["A", "B", "C"]);
        assert_eq!(path.total_planned_hours, 6.0);
    }

    #[test]
    fn test_empty_graph() {
        assert_eq!(critical_path(&[], &[]), CriticalPath::default());
    }

    #[test]
    fn test_heavier_branch_wins() {
        let nodes = vec![node("a", 1.0), node("b", 1.0), node("c", 5.0), node("d", 1.0)];
        let edges = vec![edge("a", "b"), edge("a", "c"), edge("b", "d"), edge("c", "d")];
        let path = critical_path(&nodes, &edges);
        assert_eq!(path.node_ids, vec!["a", "c", "d"]);
        assert_eq!(path.total_planned_hours, 7.0);
    }

    #[test]
    fn test_ties_pick_lowest_id() {
        let nodes = vec![node("y", 2.0), node("x", 2.0)];
        let path = critical_path(&nodes, &[]);
        assert_eq!(path.node_ids, vec!["x"]);
        assert_eq!(path.total_planned_hours, 2.0);
    }

    #[test]
    fn test_foreign_edges_are_ignored() {
        let nodes = vec![node("a", 1.0)];
        let edges = vec![edge("a", "elsewhere")];
        let path = critical_path(&nodes, &edges);
        assert_eq!(path.node_ids, vec!["a"]);
    }

    #[test]
    fn test_two_node_cycle_terminates() {
        let nodes = vec![node("a", 1.0), node("b", 1.0)];
        let edges = vec![edge("a", "b"), edge("b", "a")];
        let path = critical_path(&nodes, &edges);
        assert!(!path.node_ids.is_empty());
        assert!(path.node_ids.len() <= 2);
        assert!(path.total_planned_hours.is_finite());
    }
}
