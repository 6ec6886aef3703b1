pub mod config;
pub mod errors;
pub mod graph;
pub mod jobs;

pub mod database;
pub mod repositories;
pub mod services;
