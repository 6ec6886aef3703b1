use async_trait::async_trait;
use serde::Deserialize;
use tracing::info;

use super::{check_status, http_client, transport};
use crate::config::TranslationConfig;
use crate::errors::{TranslationError, TranslationResult};
use crate::services::translation::{preview, TranslatedItem, TranslationProvider};

const NAME: &str = "DeepL";

#[derive(Deserialize)]
struct DeepLResponse {
    #[serde(default)]
    translations: Vec<DeepLTranslation>,
}

#[derive(Deserialize)]
struct DeepLTranslation {
    #[serde(default)]
    text: String,
    detected_source_language: Option<String>,
}

/// DeepL REST backend. Batches natively through repeated `text` fields and
/// reports the detected source language.
pub struct DeepLProvider {
    api_key: String,
    api_url: String,
    http: reqwest::Client,
}

impl DeepLProvider {
    pub fn new(config: &TranslationConfig) -> TranslationResult<Self> {
        let api_key = config
            .deepl_api_key
            .clone()
            .ok_or_else(|| TranslationError::NotConfigured {
                provider: "deepl".to_string(),
                reason: "DEEPL_API_KEY is not set".to_string(),
            })?;
        Ok(Self {
            api_key,
            api_url: config.deepl_api_url.clone(),
            http: http_client(NAME, config.request_timeout)?,
        })
    }
}

#[async_trait]
impl TranslationProvider for DeepLProvider {
    fn name(&self) -> &str {
        "deepl"
    }

    async fn translate(
        &self,
        texts: &[String],
        target_lang: &str,
    ) -> TranslationResult<Vec<TranslatedItem>> {
        info!(
            "provider=deepl target={} items={} sample={}",
            target_lang,
            texts.len(),
            preview(texts.first().map(String::as_str).unwrap_or_default())
        );

        let target = target_lang.to_uppercase();
        let mut form: Vec<(&str, &str)> = vec![
            ("auth_key", self.api_key.as_str()),
            ("target_lang", target.as_str()),
        ];
        form.extend(texts.iter().map(|text| ("text", text.as_str())));

        let response = self
            .http
            .post(&self.api_url)
            .form(&form)
            .send()
            .await
            .map_err(transport(NAME))?;
        let body: DeepLResponse = check_status(NAME, response)
            .await?
            .json()
            .await
            .map_err(transport(NAME))?;

        let items: Vec<TranslatedItem> = body
            .translations
            .into_iter()
            .map(|item| TranslatedItem {
                text: item.text,
                detected_source_lang: item.detected_source_language,
            })
            .collect();
        if items.len() != texts.len() {
            return Err(TranslationError::provider(NAME, "returned unexpected count"));
        }
        Ok(items)
    }
}
