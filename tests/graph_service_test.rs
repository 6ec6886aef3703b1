//! Graph mutation and analysis tests
//!
//! Exercises derived state (group status, importance score, history) through
//! the mutation service on the in-memory store

use std::sync::Arc;

use anyhow::Result;
use graph_tracker::errors::GraphError;
use graph_tracker::graph::{Node, NodeStatus};
use graph_tracker::repositories::{
    GraphRepository, MemoryStore, TranslationCacheRepository, TranslationRecord,
};
use graph_tracker::services::{
    importance_score, GraphAnalysisService, GraphMutationService, GroupStatusPropagator,
    NewEdge, NewNode, NodeUpdate,
};

struct Fixture {
    store: Arc<MemoryStore>,
    service: GraphMutationService,
    project_id: String,
}

async fn fixture() -> Result<Fixture> {
    let store = Arc::new(MemoryStore::new());
    let service = GraphMutationService::new(store.clone());
    let project = service
        .create_project("Launch", Some("Q3 launch plan".to_string()))
        .await?;
    Ok(Fixture {
        store,
        service,
        project_id: project.id,
    })
}

impl Fixture {
    async fn node(&self, title: &str, planned_hours: f64) -> Result<Node> {
        Ok(self
            .service
            .create_node(NewNode::new(&self.project_id, title).planned_hours(planned_hours))
            .await?)
    }

    async fn group(&self, title: &str) -> Result<Node> {
        Ok(self
            .service
            .create_node(NewNode::new(&self.project_id, title).group())
            .await?)
    }

    async fn child(&self, title: &str, parent_id: &str) -> Result<Node> {
        Ok(self
            .service
            .create_node(NewNode::new(&self.project_id, title).parent(parent_id))
            .await?)
    }

    async fn set_status(&self, node_id: &str, status: &str) -> Result<Node> {
        Ok(self
            .service
            .update_node(
                node_id,
                NodeUpdate {
                    status: Some(status.to_string()),
                    ..Default::default()
                },
            )
            .await?)
    }

    async fn status_of(&self, node_id: &str) -> Result<String> {
        Ok(self.service.get_node(node_id).await?.status)
    }

    async fn score_of(&self, node_id: &str) -> Result<f64> {
        Ok(self.service.get_node(node_id).await?.importance_score)
    }
}

#[tokio::test]
async fn test_group_status_follows_children() -> Result<()> {
    let fx = fixture().await?;
    let group = fx.group("Backend").await?;
    let api = fx.child("API", &group.id).await?;
    let db = fx.child("Schema", &group.id).await?;
    assert_eq!(fx.status_of(&group.id).await?, "planned");

    fx.set_status(&api.id, "in-progress").await?;
    assert_eq!(fx.status_of(&group.id).await?, "in-progress");

    fx.set_status(&db.id, "blocked").await?;
    assert_eq!(fx.status_of(&group.id).await?, "blocked");

    fx.set_status(&db.id, "done").await?;
    fx.set_status(&api.id, "done").await?;
    assert_eq!(fx.status_of(&group.id).await?, "done");

    fx.set_status(&api.id, "needs review").await?;
    assert_eq!(fx.status_of(&group.id).await?, "planned");
    Ok(())
}

#[tokio::test]
async fn test_status_propagates_to_every_ancestor() -> Result<()> {
    let fx = fixture().await?;
    let release = fx.group("Release").await?;
    let backend = fx
        .service
        .create_node(NewNode::new(&fx.project_id, "Backend").group().parent(&release.id))
        .await?;
    let task = fx.child("Migrate", &backend.id).await?;

    fx.set_status(&task.id, "blocked").await?;

    assert_eq!(fx.status_of(&backend.id).await?, "blocked");
    assert_eq!(fx.status_of(&release.id).await?, "blocked");
    Ok(())
}

#[tokio::test]
async fn test_recompute_is_idempotent() -> Result<()> {
    let fx = fixture().await?;
    let group = fx.group("Frontend").await?;
    let page = fx.child("Landing page", &group.id).await?;
    fx.set_status(&page.id, "in-progress").await?;

    let propagator = GroupStatusPropagator::new(fx.store.clone());
    let history_before = fx.service.status_history(&group.id).await?.len();
    let written = propagator.recompute_group_status(&page.id).await?;
    propagator.recompute_group_status(&page.id).await?;

    assert_eq!(written, vec![group.id.clone()]);
    assert_eq!(fx.status_of(&group.id).await?, "in-progress");
    assert_eq!(fx.status_of(&page.id).await?, "in-progress");
    assert_eq!(fx.service.status_history(&group.id).await?.len(), history_before);
    Ok(())
}

#[tokio::test]
async fn test_unchanged_group_keeps_title_translation_fresh() -> Result<()> {
    let fx = fixture().await?;
    let group = fx.group("Docs").await?;
    fx.child("Glossary", &group.id).await?;
    let before = fx.service.get_node(&group.id).await?;

    fx.store
        .upsert_node_translations(&[TranslationRecord {
            item_id: group.id.clone(),
            lang: "de".to_string(),
            text: "Dokumentation".to_string(),
            provider: "mock".to_string(),
            detected_source_lang: None,
        }])
        .await?;
    GroupStatusPropagator::new(fx.store.clone())
        .recompute_group_status(&group.id)
        .await?;

    let after = fx.service.get_node(&group.id).await?;
    assert_eq!(after.status, "planned");
    assert_eq!(after.updated_at, before.updated_at);
    assert!(fx
        .store
        .stale_node_titles(&fx.project_id, "de")
        .await?
        .is_empty());
    Ok(())
}

#[tokio::test]
async fn test_direct_status_on_group_is_ignored() -> Result<()> {
    let fx = fixture().await?;
    let group = fx.group("Release").await?;
    let task = fx.child("Tag", &group.id).await?;
    fx.set_status(&task.id, "done").await?;
    assert_eq!(fx.status_of(&group.id).await?, "done");
    let history_before = fx.service.status_history(&group.id).await?.len();

    let updated = fx.set_status(&group.id, "blocked").await?;
    assert_eq!(updated.status, "done");
    assert_eq!(fx.service.status_history(&group.id).await?.len(), history_before);

    // A parent that is not flagged as a group is derived as well.
    let plain = fx.node("Umbrella", 1.0).await?;
    fx.service
        .update_node(
            &task.id,
            NodeUpdate {
                parent_id: Some(Some(plain.id.clone())),
                ..Default::default()
            },
        )
        .await?;
    assert_eq!(fx.set_status(&plain.id, "blocked").await?.status, "done");
    Ok(())
}

#[tokio::test]
async fn test_history_only_records_real_changes() -> Result<()> {
    let fx = fixture().await?;
    let node = fx.node("Write docs", 1.0).await?;
    assert!(fx.service.status_history(&node.id).await?.is_empty());

    fx.set_status(&node.id, "planned").await?;
    assert!(fx.service.status_history(&node.id).await?.is_empty());

    fx.set_status(&node.id, "done").await?;
    let history = fx.service.status_history(&node.id).await?;
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].old_status.as_deref(), Some("planned"));
    assert_eq!(history[0].new_status, "done");
    Ok(())
}

#[tokio::test]
async fn test_score_grows_with_hours_children_and_edges() -> Result<()> {
    let fx = fixture().await?;
    let node = fx.node("Platform", 2.0).await?;
    let expected = importance_score(2.0, 0, 0);
    assert!((node.importance_score - expected).abs() < 1e-12);

    let mut previous = node.importance_score;
    fx.service.add_time_entry(&node.id, 3.0, None).await?;
    let after_hours = fx.score_of(&node.id).await?;
    assert!(after_hours > previous);
    previous = after_hours;

    let other = fx.node("Monitoring", 1.0).await?;
    fx.service
        .create_edge(NewEdge::new(&fx.project_id, &node.id, &other.id))
        .await?;
    let after_edge = fx.score_of(&node.id).await?;
    assert!(after_edge > previous);
    assert!(fx.score_of(&other.id).await? > importance_score(1.0, 0, 0));
    previous = after_edge;

    fx.service
        .update_node(
            &node.id,
            NodeUpdate {
                is_group: Some(true),
                ..Default::default()
            },
        )
        .await?;
    fx.child("Alerts", &node.id).await?;
    assert!(fx.score_of(&node.id).await? > previous);
    Ok(())
}

#[tokio::test]
async fn test_costs_do_not_move_the_score() -> Result<()> {
    let fx = fixture().await?;
    let node = fx.node("Licences", 4.0).await?;
    let entry = fx.service.add_cost_entry(&node.id, 250.0, None, None).await?;
    assert_eq!(entry.currency, "EUR");

    let updated = fx.service.get_node(&node.id).await?;
    assert_eq!(updated.actual_cost, 250.0);
    assert_eq!(updated.importance_score, node.importance_score);
    Ok(())
}

#[tokio::test]
async fn test_negative_hours_are_rejected() -> Result<()> {
    let fx = fixture().await?;
    let node = fx.node("Estimate", 1.0).await?;
    let err = fx.service.add_time_entry(&node.id, -1.0, None).await.unwrap_err();
    assert!(matches!(err, GraphError::Validation(_)));
    Ok(())
}

#[tokio::test]
async fn test_edge_validation() -> Result<()> {
    let fx = fixture().await?;
    let a = fx.node("A", 1.0).await?;
    let b = fx.node("B", 1.0).await?;

    let err = fx
        .service
        .create_edge(NewEdge::new(&fx.project_id, &a.id, &a.id))
        .await
        .unwrap_err();
    assert!(matches!(err, GraphError::SelfLoop(_)));

    let err = fx
        .service
        .create_edge(NewEdge::new(&fx.project_id, &a.id, "nope"))
        .await
        .unwrap_err();
    assert!(matches!(err, GraphError::NodeNotFound(id) if id == "nope"));

    let other = fx.service.create_project("Other", None).await?;
    let foreign = fx
        .service
        .create_node(NewNode::new(&other.id, "Foreign"))
        .await?;
    let err = fx
        .service
        .create_edge(NewEdge::new(&fx.project_id, &a.id, &foreign.id))
        .await
        .unwrap_err();
    assert!(matches!(err, GraphError::ProjectMismatch { .. }));

    let err = fx
        .service
        .create_edge(NewEdge::new("missing", &a.id, &b.id))
        .await
        .unwrap_err();
    assert!(matches!(err, GraphError::ProjectNotFound(_)));

    let edge = fx
        .service
        .create_edge(NewEdge::new(&fx.project_id, &a.id, &b.id))
        .await?;
    assert_eq!(edge.edge_type, "dependency");
    assert_eq!(edge.weight, 1.0);
    Ok(())
}

#[tokio::test]
async fn test_delete_edge_rescores_endpoints() -> Result<()> {
    let fx = fixture().await?;
    let a = fx.node("A", 1.0).await?;
    let b = fx.node("B", 1.0).await?;
    let edge = fx
        .service
        .create_edge(NewEdge::new(&fx.project_id, &a.id, &b.id))
        .await?;
    let linked_score = fx.score_of(&a.id).await?;

    assert!(fx.service.delete_edge(&edge.id).await?);
    assert!(!fx.service.delete_edge(&edge.id).await?);

    assert!(fx.score_of(&a.id).await? < linked_score);
    assert_eq!(fx.score_of(&b.id).await?, importance_score(1.0, 0, 0));
    Ok(())
}

#[tokio::test]
async fn test_grouping_rejects_cycles() -> Result<()> {
    let fx = fixture().await?;
    let outer = fx.group("Outer").await?;
    let inner = fx
        .service
        .create_node(NewNode::new(&fx.project_id, "Inner").group().parent(&outer.id))
        .await?;

    let err = fx
        .service
        .add_to_group(&inner.id, &[outer.id.clone()])
        .await
        .unwrap_err();
    assert!(matches!(err, GraphError::GroupCycle { .. }));

    let err = fx
        .service
        .update_node(
            &outer.id,
            NodeUpdate {
                parent_id: Some(Some(outer.id.clone())),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, GraphError::GroupCycle { .. }));

    assert_eq!(fx.service.get_node(&outer.id).await?.parent_id, None);
    Ok(())
}

#[tokio::test]
async fn test_group_nodes_and_ungroup() -> Result<()> {
    let fx = fixture().await?;
    let a = fx.node("A", 1.0).await?;
    let b = fx.node("B", 1.0).await?;
    fx.set_status(&a.id, "done").await?;
    fx.set_status(&b.id, "done").await?;

    let other = fx.service.create_project("Other", None).await?;
    let foreign = fx.service.create_node(NewNode::new(&other.id, "X")).await?;

    let group = fx
        .service
        .group_nodes(
            &fx.project_id,
            "  ",
            &[a.id.clone(), b.id.clone(), foreign.id.clone(), "ghost".to_string()],
        )
        .await?;
    assert!(group.is_group);
    assert_eq!(group.title, "Group");
    assert_eq!(group.status, "done");

    let mut children: Vec<String> = fx
        .store
        .children_of(&group.id)
        .await?
        .into_iter()
        .map(|node| node.id)
        .collect();
    children.sort();
    let mut expected = vec![a.id.clone(), b.id.clone()];
    expected.sort();
    assert_eq!(children, expected);
    assert_eq!(fx.service.get_node(&foreign.id).await?.parent_id, None);

    let mut detached = fx.service.ungroup(&group.id).await?;
    detached.sort();
    assert_eq!(detached, expected);
    assert!(!fx.service.get_node(&group.id).await?.is_group);
    assert!(fx.store.children_of(&group.id).await?.is_empty());

    let err = fx.service.ungroup(&a.id).await.unwrap_err();
    assert!(matches!(err, GraphError::NodeNotFound(_)));
    Ok(())
}

#[tokio::test]
async fn test_group_nodes_requires_members() -> Result<()> {
    let fx = fixture().await?;
    let err = fx
        .service
        .group_nodes(&fx.project_id, "Empty", &[])
        .await
        .unwrap_err();
    assert!(matches!(err, GraphError::Validation(_)));
    Ok(())
}

#[tokio::test]
async fn test_delete_node_cleans_up_and_rescores() -> Result<()> {
    let fx = fixture().await?;
    let group = fx.group("Epic").await?;
    let a = fx.child("A", &group.id).await?;
    let b = fx.node("B", 1.0).await?;
    fx.service
        .create_edge(NewEdge::new(&fx.project_id, &a.id, &b.id))
        .await?;
    fx.set_status(&a.id, "blocked").await?;
    fx.service.add_comment(&a.id, None, "waiting on vendor").await?;
    let linked_score = fx.score_of(&b.id).await?;

    assert!(fx.service.delete_node(&a.id).await?);
    assert!(!fx.service.delete_node(&a.id).await?);

    assert!(fx.store.edges_for_project(&fx.project_id).await?.is_empty());
    assert!(fx.score_of(&b.id).await? < linked_score);
    assert_eq!(fx.status_of(&group.id).await?, "planned");
    Ok(())
}

#[tokio::test]
async fn test_update_unknown_comment() -> Result<()> {
    let fx = fixture().await?;
    let err = fx.service.update_comment("nope", "text").await.unwrap_err();
    assert!(matches!(err, GraphError::CommentNotFound(_)));
    Ok(())
}

#[tokio::test]
async fn test_critical_path_through_service() -> Result<()> {
    let fx = fixture().await?;
    let analysis = GraphAnalysisService::new(fx.store.clone());
    assert!(analysis
        .longest_path_by_planned_hours(&fx.project_id)
        .await?
        .node_ids
        .is_empty());

    let a = fx.node("A", 2.0).await?;
    let b = fx.node("B", 3.0).await?;
    let c = fx.node("C", 1.0).await?;
    for (source, target) in [(&a, &b), (&b, &c)] {
        fx.service
            .create_edge(NewEdge::new(&fx.project_id, &source.id, &target.id))
            .await?;
    }

    let path = analysis.longest_path_by_planned_hours(&fx.project_id).await?;
    assert_eq!(path.node_ids, vec![a.id.clone(), b.id.clone(), c.id.clone()]);
    assert_eq!(path.total_planned_hours, 6.0);

    // Closing the loop must still terminate.
    fx.service
        .create_edge(NewEdge::new(&fx.project_id, &c.id, &a.id))
        .await?;
    let path = analysis.longest_path_by_planned_hours(&fx.project_id).await?;
    assert!(!path.node_ids.is_empty() && path.node_ids.len() <= 3);
    Ok(())
}

#[tokio::test]
async fn test_project_metrics() -> Result<()> {
    let fx = fixture().await?;
    let group = fx.group("Epic").await?;
    let a = fx
        .service
        .create_node(
            NewNode::new(&fx.project_id, "A")
                .planned_hours(4.0)
                .parent(&group.id),
        )
        .await?;
    let b = fx.node("B", 1.0).await?;
    fx.service
        .create_edge(NewEdge::new(&fx.project_id, &a.id, &b.id))
        .await?;
    fx.service.add_time_entry(&a.id, 2.0, None).await?;
    fx.service.add_cost_entry(&b.id, 10.0, Some("usd"), None).await?;
    fx.set_status(&b.id, "done").await?;

    let metrics = fx.service.project_metrics(&fx.project_id).await?;
    assert_eq!(metrics.count_nodes, 3);
    assert_eq!(metrics.count_edges, 1);
    assert_eq!(metrics.count_groups, 1);
    assert_eq!(metrics.status_counts.get("planned"), Some(&2));
    assert_eq!(metrics.status_counts.get("done"), Some(&1));
    assert_eq!(metrics.total_hours, 2.0);
    assert_eq!(metrics.total_planned_hours, 5.0);
    assert_eq!(metrics.total_cost, 10.0);
    assert_eq!(metrics.top_nodes[0].id, a.id);
    assert_eq!(metrics.critical_path_hint.node_ids, vec![a.id.clone(), b.id.clone()]);

    let err = fx.service.project_metrics("missing").await.unwrap_err();
    assert!(matches!(err, GraphError::ProjectNotFound(_)));
    Ok(())
}

#[tokio::test]
async fn test_unknown_status_normalizes_to_planned() {
    assert_eq!(NodeStatus::normalize("someday"), NodeStatus::Planned);
    assert_eq!(NodeStatus::normalize("in-progress"), NodeStatus::InProgress);
}
