pub mod async_jobs;
pub mod graph_analysis_service;
pub mod graph_service;
pub mod node_service;
pub mod translation;

pub use async_jobs::*;
pub use graph_analysis_service::*;
pub use graph_service::*;
pub use node_service::*;
