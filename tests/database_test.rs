//! Database functionality tests
//!
//! Tests for migrations, repository operations and cascade integrity on SQLite

use anyhow::Result;
use chrono::{Duration, Utc};
use graph_tracker::database::entities::*;
use graph_tracker::graph::{Comment, Edge, Node, Project, StatusChange, TimeEntry};
use graph_tracker::jobs::{JobStatus, JobType, JobUpdate};
use graph_tracker::repositories::{
    GraphRepository, JobStore, SqlStore, TranslationCacheRepository, TranslationRecord,
};
use sea_orm::sea_query::Expr;
use sea_orm::{EntityTrait, PaginatorTrait, TransactionTrait};
use tempfile::NamedTempFile;

/// Create a migrated store backed by a temporary SQLite file
async fn setup_test_store() -> Result<(SqlStore, NamedTempFile)> {
    let temp_file = NamedTempFile::new()?;
    let db_url = format!("sqlite://{}?mode=rwc", temp_file.path().display());
    let store = SqlStore::connect(&db_url).await?;
    Ok((store, temp_file))
}

async fn seed_project(store: &SqlStore) -> Result<Project> {
    store.insert_project(Project::new("Test Project")).await
}

fn record(item_id: &str, lang: &str, text: &str) -> TranslationRecord {
    TranslationRecord {
        item_id: item_id.to_string(),
        lang: lang.to_string(),
        text: text.to_string(),
        provider: "mock".to_string(),
        detected_source_lang: Some("ru".to_string()),
    }
}

#[tokio::test]
async fn test_database_migrations() -> Result<()> {
    let (store, _temp_file) = setup_test_store().await?;
    let db = store.connection();

    assert_eq!(projects::Entity::find().count(db).await?, 0);
    assert_eq!(nodes::Entity::find().count(db).await?, 0);
    assert_eq!(edges::Entity::find().count(db).await?, 0);
    assert_eq!(comments::Entity::find().count(db).await?, 0);
    assert_eq!(node_translations::Entity::find().count(db).await?, 0);
    assert_eq!(comment_translations::Entity::find().count(db).await?, 0);
    assert_eq!(background_jobs::Entity::find().count(db).await?, 0);

    Ok(())
}

#[tokio::test]
async fn test_node_crud_operations() -> Result<()> {
    let (store, _temp_file) = setup_test_store().await?;
    let project = seed_project(&store).await?;

    let mut node = Node::new(&project.id, "Design");
    node.planned_hours = 3.5;
    let node = store.insert_node(node).await?;

    let found = store.get_node(&node.id).await?.expect("Node should exist");
    assert_eq!(found.title, "Design");
    assert_eq!(found.planned_hours, 3.5);
    assert_eq!(found.status, "planned");

    let mut changed = found.clone();
    changed.title = "Design review".to_string();
    changed.actual_cost = 12.0;
    store.save_node(&changed).await?;
    store.update_importance_score(&node.id, 0.75).await?;
    store.update_status(&node.id, "done").await?;

    let reloaded = store.get_node(&node.id).await?.expect("Node should exist");
    assert_eq!(reloaded.title, "Design review");
    assert_eq!(reloaded.actual_cost, 12.0);
    assert_eq!(reloaded.importance_score, 0.75);
    assert_eq!(reloaded.status, "done");

    // Saving a node that was never inserted is a no-op
    store.save_node(&Node::new(&project.id, "Ghost")).await?;
    assert_eq!(store.nodes_for_project(&project.id).await?.len(), 1);

    Ok(())
}

#[tokio::test]
async fn test_nodes_are_listed_in_creation_order() -> Result<()> {
    let (store, _temp_file) = setup_test_store().await?;
    let project = seed_project(&store).await?;

    let base = Utc::now();
    for (offset, title) in [(2, "third"), (0, "first"), (1, "second")] {
        let mut node = Node::new(&project.id, title);
        node.created_at = base + Duration::seconds(offset);
        store.insert_node(node).await?;
    }

    let titles: Vec<String> = store
        .nodes_for_project(&project.id)
        .await?
        .into_iter()
        .map(|node| node.title)
        .collect();
    assert_eq!(titles, vec!["first", "second", "third"]);

    Ok(())
}

#[tokio::test]
async fn test_delete_node_cascades() -> Result<()> {
    let (store, _temp_file) = setup_test_store().await?;
    let db = store.connection();
    let project = seed_project(&store).await?;

    let parent = store.insert_node(Node::new(&project.id, "Parent")).await?;
    let other = store.insert_node(Node::new(&project.id, "Other")).await?;
    let mut child = Node::new(&project.id, "Child");
    child.parent_id = Some(parent.id.clone());
    let child = store.insert_node(child).await?;

    store.insert_edge(Edge::new(&project.id, &parent.id, &other.id)).await?;
    store.insert_edge(Edge::new(&project.id, &other.id, &parent.id)).await?;
    let comment = store
        .insert_comment(Comment::new(&parent.id, None, "Needs review"))
        .await?;
    store
        .insert_time_entry(TimeEntry {
            id: graph_tracker::graph::new_id(),
            node_id: parent.id.clone(),
            hours: 2.0,
            note: None,
            created_at: Utc::now(),
        })
        .await?;
    store
        .insert_status_change(StatusChange::new(&parent.id, Some("planned".to_string()), "done"))
        .await?;
    store
        .upsert_node_translations(&[record(&parent.id, "en", "Parent")])
        .await?;
    store
        .upsert_comment_translations(&[record(&comment.id, "en", "Needs review")])
        .await?;

    assert!(store.delete_node(&parent.id).await?);
    assert!(!store.delete_node(&parent.id).await?);

    assert!(store.get_node(&parent.id).await?.is_none());
    assert!(store.edges_for_project(&project.id).await?.is_empty());
    assert!(store.get_comment(&comment.id).await?.is_none());
    assert!(store.status_changes(&parent.id).await?.is_empty());
    assert_eq!(time_entries::Entity::find().count(db).await?, 0);
    assert_eq!(node_translations::Entity::find().count(db).await?, 0);
    assert_eq!(comment_translations::Entity::find().count(db).await?, 0);

    let orphan = store.get_node(&child.id).await?.expect("Child should survive");
    assert_eq!(orphan.parent_id, None);
    assert!(store.get_node(&other.id).await?.is_some());

    Ok(())
}

#[tokio::test]
async fn test_missing_and_stale_translations() -> Result<()> {
    let (store, _temp_file) = setup_test_store().await?;
    let db = store.connection();
    let project = seed_project(&store).await?;
    let design = store.insert_node(Node::new(&project.id, "Design")).await?;
    let build = store.insert_node(Node::new(&project.id, "Build")).await?;

    let missing = store.missing_node_titles(&project.id, "en").await?;
    assert_eq!(missing.len(), 2);
    assert!(store.stale_node_titles(&project.id, "en").await?.is_empty());

    store
        .upsert_node_translations(&[record(&design.id, "en", "Design (en)")])
        .await?;
    let missing = store.missing_node_titles(&project.id, "en").await?;
    assert_eq!(missing, vec![(build.id.clone(), "Build".to_string())]);
    assert_eq!(store.missing_node_titles(&project.id, "de").await?.len(), 2);

    // Translation written before the title last changed
    node_translations::Entity::update_many()
        .col_expr(
            node_translations::Column::CreatedAt,
            Expr::value(design.updated_at - Duration::hours(1)),
        )
        .exec(db)
        .await?;
    let stale = store.stale_node_titles(&project.id, "en").await?;
    assert_eq!(stale, vec![(design.id.clone(), "Design".to_string())]);

    store
        .upsert_node_translations(&[record(&design.id, "en", "Design (en, v2)")])
        .await?;
    assert!(store.stale_node_titles(&project.id, "en").await?.is_empty());

    let cached = store
        .node_translation(&design.id, "en")
        .await?
        .expect("Translation should exist");
    assert_eq!(cached.text, "Design (en, v2)");
    assert_eq!(cached.detected_source_lang.as_deref(), Some("ru"));
    assert_eq!(node_translations::Entity::find().count(db).await?, 1);

    Ok(())
}

#[tokio::test]
async fn test_large_project_translation_cache() -> Result<()> {
    const COUNT: usize = 6_000;
    let (store, _temp_file) = setup_test_store().await?;
    let db = store.connection();
    let project = seed_project(&store).await?;

    let tasks: Vec<Node> = (0..COUNT)
        .map(|i| Node::new(&project.id, format!("Task {}", i)))
        .collect();
    let notes: Vec<Comment> = tasks
        .iter()
        .map(|task| Comment::new(&task.id, None, "Готово"))
        .collect();
    let txn = db.begin().await?;
    for chunk in tasks.chunks(500) {
        nodes::Entity::insert_many(chunk.iter().map(nodes::ActiveModel::from))
            .exec_without_returning(&txn)
            .await?;
    }
    for chunk in notes.chunks(500) {
        comments::Entity::insert_many(chunk.iter().map(comments::ActiveModel::from))
            .exec_without_returning(&txn)
            .await?;
    }
    txn.commit().await?;

    assert_eq!(store.missing_node_titles(&project.id, "en").await?.len(), COUNT);
    assert_eq!(store.missing_comment_bodies(&project.id, "en").await?.len(), COUNT);

    let titles: Vec<TranslationRecord> = tasks
        .iter()
        .map(|task| record(&task.id, "en", "Task"))
        .collect();
    let bodies: Vec<TranslationRecord> = notes
        .iter()
        .map(|note| record(&note.id, "en", "Done"))
        .collect();
    // The second pass goes through the conflict update
    for _ in 0..2 {
        store.upsert_node_translations(&titles).await?;
        store.upsert_comment_translations(&bodies).await?;
    }

    assert_eq!(node_translations::Entity::find().count(db).await? as usize, COUNT);
    assert_eq!(comment_translations::Entity::find().count(db).await? as usize, COUNT);
    assert!(store.missing_node_titles(&project.id, "en").await?.is_empty());
    assert!(store.stale_node_titles(&project.id, "en").await?.is_empty());
    assert!(store.missing_comment_bodies(&project.id, "en").await?.is_empty());
    assert!(store.stale_comment_bodies(&project.id, "en").await?.is_empty());

    Ok(())
}

#[tokio::test]
async fn test_unchanged_status_keeps_timestamp() -> Result<()> {
    let (store, _temp_file) = setup_test_store().await?;
    let project = seed_project(&store).await?;
    let node = store.insert_node(Node::new(&project.id, "Docs")).await?;
    store
        .upsert_node_translations(&[record(&node.id, "de", "Doku")])
        .await?;

    store.update_status(&node.id, "planned").await?;
    let same = store.get_node(&node.id).await?.expect("Node should exist");
    assert_eq!(same.updated_at, node.updated_at);
    assert!(store.stale_node_titles(&project.id, "de").await?.is_empty());

    store.update_status(&node.id, "blocked").await?;
    let changed = store.get_node(&node.id).await?.expect("Node should exist");
    assert_eq!(changed.status, "blocked");
    assert!(changed.updated_at > node.updated_at);

    Ok(())
}

#[tokio::test]
async fn test_comment_translations_follow_project() -> Result<()> {
    let (store, _temp_file) = setup_test_store().await?;
    let project = seed_project(&store).await?;
    let other_project = store.insert_project(Project::new("Elsewhere")).await?;

    let node = store.insert_node(Node::new(&project.id, "Design")).await?;
    let foreign = store.insert_node(Node::new(&other_project.id, "Foreign")).await?;
    let comment = store
        .insert_comment(Comment::new(&node.id, Some("ana".to_string()), "Привет"))
        .await?;
    store
        .insert_comment(Comment::new(&foreign.id, None, "Not ours"))
        .await?;

    let bodies = store.comment_bodies(&project.id).await?;
    assert_eq!(bodies, vec![(comment.id.clone(), "Привет".to_string())]);

    store
        .upsert_comment_translations(&[record(&comment.id, "en", "Hello")])
        .await?;
    assert!(store.missing_comment_bodies(&project.id, "en").await?.is_empty());

    let mut edited = store.get_comment(&comment.id).await?.expect("Comment should exist");
    edited.body = "Привет всем".to_string();
    edited.updated_at = Utc::now() + Duration::hours(1);
    store.save_comment(&edited).await?;

    let stale = store.stale_comment_bodies(&project.id, "en").await?;
    assert_eq!(stale, vec![(comment.id.clone(), "Привет всем".to_string())]);

    Ok(())
}

#[tokio::test]
async fn test_job_store_operations() -> Result<()> {
    let (store, _temp_file) = setup_test_store().await?;
    let project = seed_project(&store).await?;

    let job = store.create_job(&project.id, JobType::Translate).await?;
    assert_eq!(job.status, JobStatus::Queued);
    assert_eq!(job.job_type, "translate");

    store
        .update_job(&job.id, JobUpdate::status(JobStatus::Running).with_total(4))
        .await?;
    store.update_job(&job.id, JobUpdate::progress(3, 2)).await?;

    let running = store.get_job(&job.id).await?.expect("Job should exist");
    assert_eq!(running.status, JobStatus::Running);
    assert_eq!(running.total, 4);
    assert_eq!(running.done, 3);
    assert_eq!(running.translated, 2);
    assert!(running.updated_at >= running.created_at);

    store
        .update_job(&job.id, JobUpdate::failed("DeepL error: 456 Quota exceeded"))
        .await?;
    let failed = store.get_job(&job.id).await?.expect("Job should exist");
    assert_eq!(failed.status, JobStatus::Failed);
    assert_eq!(failed.done, 3);
    assert_eq!(failed.error.as_deref(), Some("DeepL error: 456 Quota exceeded"));

    // Unknown ids are ignored
    store
        .update_job("missing", JobUpdate::status(JobStatus::Finished))
        .await?;
    assert!(store.get_job("missing").await?.is_none());

    Ok(())
}
