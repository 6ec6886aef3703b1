use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr};
use std::time::Duration;

pub async fn establish_connection(database_url: &str) -> Result<DatabaseConnection, DbErr> {
    let mut opt = ConnectOptions::new(database_url);

    // Each in-memory connection is its own database
    let max_connections = if database_url.contains(":memory:") { 1 } else { 10 };
    opt.max_connections(max_connections)
        .min_connections(1)
        .connect_timeout(Duration::from_secs(5))
        .acquire_timeout(Duration::from_secs(5))
        .idle_timeout(Duration::from_secs(300))
        .max_lifetime(Duration::from_secs(3600))
        .sqlx_logging(true)
        .sqlx_logging_level(tracing::log::LevelFilter::Debug);

    Database::connect(opt).await
}

/// Database URL for a CLI `--database` value: full URLs pass through, file
/// paths are opened read-write-create.
pub fn get_database_url(database_path: Option<&str>) -> String {
    match database_path {
        Some(url) if url.starts_with("sqlite:") => url.to_string(),
        Some(":memory:") => "sqlite::memory:".to_string(),
        Some(path) => format!("sqlite://{}?mode=rwc", path),
        None => crate::config::DEFAULT_DATABASE_URL.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_database_url_forms() {
        assert_eq!(get_database_url(Some(":memory:")), "sqlite::memory:");
        assert_eq!(
            get_database_url(Some("/tmp/x.db")),
            "sqlite:///tmp/x.db?mode=rwc"
        );
        assert_eq!(
            get_database_url(Some("sqlite://a.db?mode=ro")),
            "sqlite://a.db?mode=ro"
        );
        assert_eq!(
            get_database_url(None),
            "sqlite://graph_tracker.db?mode=rwc"
        );
    }
}
