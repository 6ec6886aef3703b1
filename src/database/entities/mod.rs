pub mod background_jobs;
pub mod comment_translations;
pub mod comments;
pub mod cost_entries;
pub mod edges;
pub mod node_translations;
pub mod nodes;
pub mod projects;
pub mod status_changes;
pub mod time_entries;
