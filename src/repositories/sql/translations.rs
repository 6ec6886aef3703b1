use std::collections::HashMap;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ColumnTrait, EntityTrait, JoinType, QueryFilter, QueryOrder, QuerySelect, RelationTrait, Set,
    TransactionTrait,
};

use super::SqlStore;
use crate::database::entities::{comment_translations, comments, node_translations, nodes};
use crate::repositories::{
    CachedTranslation, SourceText, TranslationCacheRepository, TranslationRecord,
};

/// Rows per upsert statement. Each row binds six variables and SQLite caps
/// a statement at 32766.
const UPSERT_CHUNK: usize = 500;

/// Source item with the timestamp that drives staleness.
struct SourceItem {
    id: String,
    text: String,
    updated_at: DateTime<Utc>,
}

impl SqlStore {
    async fn node_sources(&self, project_id: &str) -> Result<Vec<SourceItem>> {
        let models = nodes::Entity::find()
            .filter(nodes::Column::ProjectId.eq(project_id))
            .order_by_asc(nodes::Column::CreatedAt)
            .order_by_asc(nodes::Column::Id)
            .all(&self.db)
            .await?;
        Ok(models
            .into_iter()
            .map(|node| SourceItem {
                id: node.id,
                text: node.title,
                updated_at: node.updated_at,
            })
            .collect())
    }

    async fn comment_sources(&self, project_id: &str) -> Result<Vec<SourceItem>> {
        let models = comments::Entity::find()
            .inner_join(nodes::Entity)
            .filter(nodes::Column::ProjectId.eq(project_id))
            .order_by_asc(comments::Column::CreatedAt)
            .order_by_asc(comments::Column::Id)
            .all(&self.db)
            .await?;
        Ok(models
            .into_iter()
            .map(|comment| SourceItem {
                id: comment.id,
                text: comment.body,
                updated_at: comment.updated_at,
            })
            .collect())
    }

    /// Translation timestamps for one project's node titles in one language.
    async fn node_translation_times(
        &self,
        project_id: &str,
        lang: &str,
    ) -> Result<HashMap<String, DateTime<Utc>>> {
        let models = node_translations::Entity::find()
            .inner_join(nodes::Entity)
            .filter(nodes::Column::ProjectId.eq(project_id))
            .filter(node_translations::Column::Lang.eq(lang))
            .all(&self.db)
            .await?;
        Ok(models
            .into_iter()
            .map(|record| (record.node_id, record.created_at))
            .collect())
    }

    async fn comment_translation_times(
        &self,
        project_id: &str,
        lang: &str,
    ) -> Result<HashMap<String, DateTime<Utc>>> {
        let models = comment_translations::Entity::find()
            .inner_join(comments::Entity)
            .join(JoinType::InnerJoin, comments::Relation::Nodes.def())
            .filter(nodes::Column::ProjectId.eq(project_id))
            .filter(comment_translations::Column::Lang.eq(lang))
            .all(&self.db)
            .await?;
        Ok(models
            .into_iter()
            .map(|record| (record.comment_id, record.created_at))
            .collect())
    }
}

fn missing(items: Vec<SourceItem>, times: &HashMap<String, DateTime<Utc>>) -> Vec<SourceText> {
    items
        .into_iter()
        .filter(|item| !times.contains_key(&item.id))
        .map(|item| (item.id, item.text))
        .collect()
}

fn stale(items: Vec<SourceItem>, times: &HashMap<String, DateTime<Utc>>) -> Vec<SourceText> {
    items
        .into_iter()
        .filter(|item| {
            times
                .get(&item.id)
                .is_some_and(|created_at| item.updated_at > *created_at)
        })
        .map(|item| (item.id, item.text))
        .collect()
}

fn texts(items: Vec<SourceItem>) -> Vec<SourceText> {
    items.into_iter().map(|item| (item.id, item.text)).collect()
}

#[async_trait]
impl TranslationCacheRepository for SqlStore {
    async fn node_titles(&self, project_id: &str) -> Result<Vec<SourceText>> {
        Ok(texts(self.node_sources(project_id).await?))
    }

    async fn comment_bodies(&self, project_id: &str) -> Result<Vec<SourceText>> {
        Ok(texts(self.comment_sources(project_id).await?))
    }

    async fn missing_node_titles(&self, project_id: &str, lang: &str) -> Result<Vec<SourceText>> {
        let items = self.node_sources(project_id).await?;
        let times = self.node_translation_times(project_id, lang).await?;
        Ok(missing(items, &times))
    }

    async fn stale_node_titles(&self, project_id: &str, lang: &str) -> Result<Vec<SourceText>> {
        let items = self.node_sources(project_id).await?;
        let times = self.node_translation_times(project_id, lang).await?;
        Ok(stale(items, &times))
    }

    async fn missing_comment_bodies(
        &self,
        project_id: &str,
        lang: &str,
    ) -> Result<Vec<SourceText>> {
        let items = self.comment_sources(project_id).await?;
        let times = self.comment_translation_times(project_id, lang).await?;
        Ok(missing(items, &times))
    }

    async fn stale_comment_bodies(&self, project_id: &str, lang: &str) -> Result<Vec<SourceText>> {
        let items = self.comment_sources(project_id).await?;
        let times = self.comment_translation_times(project_id, lang).await?;
        Ok(stale(items, &times))
    }

    async fn upsert_node_translations(&self, records: &[TranslationRecord]) -> Result<()> {
        if records.is_empty() {
            return Ok(());
        }
        let now = Utc::now();
        let txn = self.db.begin().await?;
        for chunk in records.chunks(UPSERT_CHUNK) {
            let models = chunk.iter().map(|record| node_translations::ActiveModel {
                node_id: Set(record.item_id.clone()),
                lang: Set(record.lang.clone()),
                text: Set(record.text.clone()),
                provider: Set(record.provider.clone()),
                detected_source_lang: Set(record.detected_source_lang.clone()),
                created_at: Set(now),
            });
            node_translations::Entity::insert_many(models)
                .on_conflict(
                    OnConflict::columns([
                        node_translations::Column::NodeId,
                        node_translations::Column::Lang,
                    ])
                    .update_columns([
                        node_translations::Column::Text,
                        node_translations::Column::Provider,
                        node_translations::Column::DetectedSourceLang,
                        node_translations::Column::CreatedAt,
                    ])
                    .to_owned(),
                )
                .exec_without_returning(&txn)
                .await?;
        }
        txn.commit().await?;
        Ok(())
    }

    async fn upsert_comment_translations(&self, records: &[TranslationRecord]) -> Result<()> {
        if records.is_empty() {
            return Ok(());
        }
        let now = Utc::now();
        let txn = self.db.begin().await?;
        for chunk in records.chunks(UPSERT_CHUNK) {
            let models = chunk.iter().map(|record| comment_translations::ActiveModel {
                comment_id: Set(record.item_id.clone()),
                lang: Set(record.lang.clone()),
                text: Set(record.text.clone()),
                provider: Set(record.provider.clone()),
                detected_source_lang: Set(record.detected_source_lang.clone()),
                created_at: Set(now),
            });
            comment_translations::Entity::insert_many(models)
                .on_conflict(
                    OnConflict::columns([
                        comment_translations::Column::CommentId,
                        comment_translations::Column::Lang,
                    ])
                    .update_columns([
                        comment_translations::Column::Text,
                        comment_translations::Column::Provider,
                        comment_translations::Column::DetectedSourceLang,
                        comment_translations::Column::CreatedAt,
                    ])
                    .to_owned(),
                )
                .exec_without_returning(&txn)
                .await?;
        }
        txn.commit().await?;
        Ok(())
    }

    async fn node_translation(&self, node_id: &str, lang: &str) -> Result<Option<CachedTranslation>> {
        let model = node_translations::Entity::find_by_id((node_id.to_string(), lang.to_string()))
            .one(&self.db)
            .await?;
        Ok(model.map(Into::into))
    }

    async fn comment_translation(
        &self,
        comment_id: &str,
        lang: &str,
    ) -> Result<Option<CachedTranslation>> {
        let model =
            comment_translations::Entity::find_by_id((comment_id.to_string(), lang.to_string()))
                .one(&self.db)
                .await?;
        Ok(model.map(Into::into))
    }
}
