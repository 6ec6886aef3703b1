//! Domain-specific error types
//!
//! - **GraphError**: graph mutations, validation and recompute storage failures
//! - **TranslationError**: translation providers and provider selection
//!
//! Repository traits and background jobs use `anyhow`; these types are what
//! callers match on.

pub mod graph;
pub mod translation;

pub use graph::GraphError;
pub use translation::TranslationError;

/// Result type alias for graph operations
pub type GraphResult<T> = Result<T, GraphError>;

/// Result type alias for translation operations
pub type TranslationResult<T> = Result<T, TranslationError>;
