//! Graph mutation and recompute errors
//!
//! Validation failures are client errors the request layer maps to 4xx;
//! storage failures are passed through from the repositories.
//!
//! # Examples
//!
//! ```rust
//! use graph_tracker::errors::GraphError;
//!
//! let err = GraphError::SelfLoop("n1".to_string());
//! assert!(err.is_client_error());
//! assert_eq!(err.error_code(), "VALIDATION_FAILED");
//! ```

use thiserror::Error;

/// Graph-related errors
#[derive(Error, Debug)]
pub enum GraphError {
    /// Project not found by ID
    #[error("Project '{0}' not found")]
    ProjectNotFound(String),

    /// Node not found by ID
    #[error("Node '{0}' not found")]
    NodeNotFound(String),

    /// Edge not found by ID
    #[error("Edge '{0}' not found")]
    EdgeNotFound(String),

    /// Comment not found by ID
    #[error("Comment '{0}' not found")]
    CommentNotFound(String),

    /// Edge from a node to itself
    #[error("Edge from node '{0}' to itself is not allowed")]
    SelfLoop(String),

    /// Edge endpoints or grouped nodes span projects
    #[error("Node '{node}' does not belong to project '{project}'")]
    ProjectMismatch {
        /// Offending node identifier
        node: String,
        /// Expected project identifier
        project: String,
    },

    /// Grouping would place a node under itself or one of its descendants
    #[error("Grouping '{child}' under '{parent}' would create a cycle")]
    GroupCycle {
        /// Node being attached
        child: String,
        /// Prospective parent
        parent: String,
    },

    /// Validation failed
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Storage operation failed
    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

impl GraphError {
    /// Check if this is a client error (400-series)
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            GraphError::SelfLoop(_)
                | GraphError::ProjectMismatch { .. }
                | GraphError::GroupCycle { .. }
                | GraphError::Validation(_)
        )
    }

    /// Check if this is a not found error (404)
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            GraphError::ProjectNotFound(_)
                | GraphError::NodeNotFound(_)
                | GraphError::EdgeNotFound(_)
                | GraphError::CommentNotFound(_)
        )
    }

    /// Get error code for API responses
    pub fn error_code(&self) -> &'static str {
        match self {
            GraphError::ProjectNotFound(_)
            | GraphError::NodeNotFound(_)
            | GraphError::EdgeNotFound(_)
            | GraphError::CommentNotFound(_) => "NOT_FOUND",
            GraphError::SelfLoop(_)
            | GraphError::ProjectMismatch { .. }
            | GraphError::Validation(_) => "VALIDATION_FAILED",
            GraphError::GroupCycle { .. } => "CYCLE_DETECTED",
            GraphError::Storage(_) => "STORAGE_ERROR",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_not_found() {
        let err = GraphError::NodeNotFound("n1".to_string());
        assert_eq!(err.to_string(), "Node 'n1' not found");
        assert!(err.is_not_found());
        assert!(!err.is_client_error());
        assert_eq!(err.error_code(), "NOT_FOUND");
    }

    #[test]
    fn test_project_mismatch() {
        let err = GraphError::ProjectMismatch {
            node: "n1".to_string(),
            project: "p2".to_string(),
        };
        assert_eq!(err.to_string(), "Node 'n1' does not belong to project 'p2'");
        assert!(err.is_client_error());
    }

    #[test]
    fn test_group_cycle() {
        let err = GraphError::GroupCycle {
            child: "a".to_string(),
            parent: "b".to_string(),
        };
        assert!(err.is_client_error());
        assert_eq!(err.error_code(), "CYCLE_DETECTED");
    }

    #[test]
    fn test_storage_is_transparent() {
        let err = GraphError::from(anyhow::anyhow!("disk full"));
        assert_eq!(err.to_string(), "disk full");
        assert_eq!(err.error_code(), "STORAGE_ERROR");
    }
}
