use std::collections::HashMap;
use std::slice;
use std::sync::Arc;

use tokio::time::sleep;
use tracing::{debug, warn};

use super::{ProviderKind, TranslatedItem, TranslationProvider};
use crate::config::TranslationConfig;
use crate::errors::{TranslationError, TranslationResult};

/// Batching, retrying front end over the translation providers.
///
/// Texts are split into fixed-size batches. Each batch gets up to
/// `max_attempts` tries on provider errors, sleeping `base_delay × attempt`
/// between tries. An exhausted batch aborts the whole call.
pub struct TranslationClient {
    config: TranslationConfig,
    registry: HashMap<String, Arc<dyn TranslationProvider>>,
}

impl TranslationClient {
    pub fn new(config: TranslationConfig) -> Self {
        Self {
            config,
            registry: HashMap::new(),
        }
    }

    /// Make a provider available under `name`, shadowing any built-in
    /// backend of the same name.
    pub fn register(&mut self, name: impl Into<String>, provider: Arc<dyn TranslationProvider>) {
        self.registry.insert(name.into().to_lowercase(), provider);
    }

    pub fn with_provider(
        mut self,
        name: impl Into<String>,
        provider: Arc<dyn TranslationProvider>,
    ) -> Self {
        self.register(name, provider);
        self
    }

    pub fn config(&self) -> &TranslationConfig {
        &self.config
    }

    /// Provider name a job should use when the caller passed `explicit`.
    pub fn resolve_provider_name(&self, explicit: Option<&str>) -> String {
        self.config.resolve_provider(explicit)
    }

    fn provider(&self, name: &str) -> TranslationResult<Arc<dyn TranslationProvider>> {
        let key = name.trim().to_lowercase();
        if let Some(provider) = self.registry.get(&key) {
            return Ok(provider.clone());
        }
        let kind: ProviderKind = key
            .parse()
            .map_err(|_| TranslationError::UnsupportedProvider(key.clone()))?;
        kind.build(&self.config)
    }

    pub async fn translate_texts(
        &self,
        texts: &[String],
        target_lang: &str,
        provider_name: &str,
    ) -> TranslationResult<Vec<TranslatedItem>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let provider = self.provider(provider_name)?;
        let mut results = Vec::with_capacity(texts.len());
        for batch in texts.chunks(self.config.batch_size.max(1)) {
            let items = self.translate_batch(provider.as_ref(), batch, target_lang).await?;
            results.extend(items);
        }
        Ok(results)
    }

    async fn translate_batch(
        &self,
        provider: &dyn TranslationProvider,
        batch: &[String],
        target_lang: &str,
    ) -> TranslationResult<Vec<TranslatedItem>> {
        let max_attempts = self.config.max_attempts.max(1);
        let mut attempt = 0;
        loop {
            attempt += 1;
            match call_provider(provider, batch, target_lang).await {
                Ok(items) => return Ok(items),
                Err(err) if err.is_retryable() && attempt < max_attempts => {
                    let delay = self.config.retry_base_delay * attempt;
                    warn!(
                        "{} batch of {} failed (attempt {}/{}): {}; retrying in {:?}",
                        provider.name(),
                        batch.len(),
                        attempt,
                        max_attempts,
                        err,
                        delay
                    );
                    sleep(delay).await;
                }
                Err(err) => return Err(err),
            }
        }
    }
}

async fn call_provider(
    provider: &dyn TranslationProvider,
    batch: &[String],
    target_lang: &str,
) -> TranslationResult<Vec<TranslatedItem>> {
    let mut items = if provider.supports_batching() {
        provider.translate(batch, target_lang).await?
    } else {
        let mut items = Vec::with_capacity(batch.len());
        for text in batch {
            items.extend(provider.translate(slice::from_ref(text), target_lang).await?);
        }
        items
    };

    if items.len() != batch.len() {
        return Err(TranslationError::provider(
            provider.name(),
            format!("returned {} items for {} texts", items.len(), batch.len()),
        ));
    }

    for (item, source) in items.iter_mut().zip(batch) {
        if item.text.trim().is_empty() && !source.trim().is_empty() {
            warn!(
                "{} returned an empty translation; keeping source text",
                provider.name()
            );
            item.text = source.clone();
        }
    }
    debug!("{} translated {} texts", provider.name(), items.len());
    Ok(items)
}
