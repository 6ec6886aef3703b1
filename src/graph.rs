use std::fmt;
use std::str::FromStr;

use anyhow::anyhow;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub fn new_id() -> String {
    Uuid::new_v4().to_string()
}

/// Workflow status of a node.
///
/// Stored statuses are free-form strings (older data carries values such as
/// `todo` or `discuss`); anything outside the four known values is treated as
/// `Planned` when aggregating group status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum NodeStatus {
    #[default]
    Planned,
    InProgress,
    Done,
    Blocked,
}

impl NodeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeStatus::Planned => "planned",
            NodeStatus::InProgress => "in-progress",
            NodeStatus::Done => "done",
            NodeStatus::Blocked => "blocked",
        }
    }

    /// Lenient parse used for aggregation: unknown values become `Planned`.
    pub fn normalize(raw: &str) -> Self {
        raw.parse().unwrap_or(NodeStatus::Planned)
    }
}

impl fmt::Display for NodeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for NodeStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "planned" => Ok(NodeStatus::Planned),
            "in-progress" => Ok(NodeStatus::InProgress),
            "done" => Ok(NodeStatus::Done),
            "blocked" => Ok(NodeStatus::Blocked),
            _ => Err(anyhow!("unknown node status '{s}'")),
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Project {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub archived: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Project {
    pub fn new(name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: new_id(),
            name: name.into(),
            description: None,
            archived: false,
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Node {
    pub id: String,
    pub project_id: String,
    pub title: String,
    pub description: Option<String>,
    pub status: String,
    pub importance_score: f64,
    pub planned_hours: f64,
    pub actual_hours: f64,
    pub planned_cost: f64,
    pub actual_cost: f64,
    pub parent_id: Option<String>,
    pub is_group: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Node {
    pub fn new(project_id: impl Into<String>, title: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: new_id(),
            project_id: project_id.into(),
            title: title.into(),
            description: None,
            status: NodeStatus::Planned.to_string(),
            importance_score: 0.0,
            planned_hours: 0.0,
            actual_hours: 0.0,
            planned_cost: 0.0,
            actual_cost: 0.0,
            parent_id: None,
            is_group: false,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn total_hours(&self) -> f64 {
        self.actual_hours + self.planned_hours
    }

    pub fn normalized_status(&self) -> NodeStatus {
        NodeStatus::normalize(&self.status)
    }
}

pub const DEFAULT_EDGE_TYPE: &str = "dependency";

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Edge {
    pub id: String,
    pub project_id: String,
    pub source_node_id: String,
    pub target_node_id: String,
    pub weight: f64,
    pub edge_type: String,
    pub created_at: DateTime<Utc>,
}

impl Edge {
    pub fn new(
        project_id: impl Into<String>,
        source_node_id: impl Into<String>,
        target_node_id: impl Into<String>,
    ) -> Self {
        Self {
            id: new_id(),
            project_id: project_id.into(),
            source_node_id: source_node_id.into(),
            target_node_id: target_node_id.into(),
            weight: 1.0,
            edge_type: DEFAULT_EDGE_TYPE.to_string(),
            created_at: Utc::now(),
        }
    }

    pub fn touches(&self, node_id: &str) -> bool {
        self.source_node_id == node_id || self.target_node_id == node_id
    }
}

/// Append-only audit record of a node status transition.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct StatusChange {
    pub id: String,
    pub node_id: String,
    pub old_status: Option<String>,
    pub new_status: String,
    pub changed_at: DateTime<Utc>,
}

impl StatusChange {
    pub fn new(node_id: impl Into<String>, old_status: Option<String>, new_status: impl Into<String>) -> Self {
        Self {
            id: new_id(),
            node_id: node_id.into(),
            old_status,
            new_status: new_status.into(),
            changed_at: Utc::now(),
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Comment {
    pub id: String,
    pub node_id: String,
    pub author: Option<String>,
    pub body: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Comment {
    pub fn new(node_id: impl Into<String>, author: Option<String>, body: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: new_id(),
            node_id: node_id.into(),
            author,
            body: body.into(),
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct TimeEntry {
    pub id: String,
    pub node_id: String,
    pub hours: f64,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct CostEntry {
    pub id: String,
    pub node_id: String,
    pub amount: f64,
    pub currency: String,
    pub note: Option<String>,
    pub incurred_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_round_trips_known_values() {
        for status in [
            NodeStatus::Planned,
            NodeStatus::InProgress,
            NodeStatus::Done,
            NodeStatus::Blocked,
        ] {
            assert_eq!(status.as_str().parse::<NodeStatus>().unwrap(), status);
        }
    }

    #[test]
    fn test_unknown_status_normalizes_to_planned() {
        assert_eq!(NodeStatus::normalize("discuss"), NodeStatus::Planned);
        assert_eq!(NodeStatus::normalize("todo"), NodeStatus::Planned);
        assert_eq!(NodeStatus::normalize(""), NodeStatus::Planned);
        assert!("Done".parse::<NodeStatus>().is_err());
    }

    #[test]
    fn test_new_node_defaults() {
        let node = Node::new("p1", "Write docs");
        assert_eq!(node.status, "planned");
        assert_eq!(node.importance_score, 0.0);
        assert!(!node.is_group);
        assert!(node.parent_id.is_none());
        assert_eq!(node.total_hours(), 0.0);
    }

    #[test]
    fn test_new_edge_defaults() {
        let edge = Edge::new("p1", "a", "b");
        assert_eq!(edge.weight, 1.0);
        assert_eq!(edge.edge_type, DEFAULT_EDGE_TYPE);
        assert!(edge.touches("a"));
        assert!(edge.touches("b"));
        assert!(!edge.touches("c"));
    }
}
