use async_trait::async_trait;

use crate::errors::TranslationResult;
use crate::services::translation::{TranslatedItem, TranslationProvider};

/// Offline backend: prefixes every text with the upper-cased target language.
pub struct MockProvider;

#[async_trait]
impl TranslationProvider for MockProvider {
    fn name(&self) -> &str {
        "mock"
    }

    async fn translate(
        &self,
        texts: &[String],
        target_lang: &str,
    ) -> TranslationResult<Vec<TranslatedItem>> {
        let tag = target_lang.to_uppercase();
        Ok(texts
            .iter()
            .map(|text| TranslatedItem::new(format!("[{}] {}", tag, text)))
            .collect())
    }
}
