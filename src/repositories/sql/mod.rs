//! SQLite-backed repositories built on sea-orm.

mod graph;
mod jobs;
mod translations;

use anyhow::{Context, Result};
use sea_orm::DatabaseConnection;
use sea_orm_migration::MigratorTrait;
use tracing::info;

use crate::database::{establish_connection, migrations::Migrator};

#[derive(Clone)]
pub struct SqlStore {
    db: DatabaseConnection,
}

impl SqlStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Connect and bring the schema up to date.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let db = establish_connection(database_url)
            .await
            .with_context(|| format!("failed to connect to {}", database_url))?;
        Migrator::up(&db, None)
            .await
            .context("failed to run migrations")?;
        info!("Database ready at {}", database_url);
        Ok(Self::new(db))
    }

    pub fn connection(&self) -> &DatabaseConnection {
        &self.db
    }
}
