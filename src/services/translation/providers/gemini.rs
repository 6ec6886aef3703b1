use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::{info, warn};

use super::{check_status, http_client, transport};
use crate::config::TranslationConfig;
use crate::errors::{TranslationError, TranslationResult};
use crate::services::translation::{preview, TranslatedItem, TranslationProvider};

const NAME: &str = "Gemini";

/// Google Gemini `generateContent` backend, one prompt per text.
pub struct GeminiProvider {
    api_key: String,
    model: String,
    api_url: String,
    http: reqwest::Client,
}

impl GeminiProvider {
    pub fn new(config: &TranslationConfig) -> TranslationResult<Self> {
        let api_key = config
            .gemini_api_key
            .clone()
            .ok_or_else(|| TranslationError::NotConfigured {
                provider: "gemini".to_string(),
                reason: "GEMINI_API_KEY is not set".to_string(),
            })?;
        Ok(Self {
            api_key,
            model: config.gemini_model.clone(),
            api_url: config.gemini_api_url.trim_end_matches('/').to_string(),
            http: http_client(NAME, config.request_timeout)?,
        })
    }

    fn prompt(text: &str, target_lang: &str) -> String {
        format!(
            "Translate the following text into {}. Fix typos, preserve meaning, and return ONLY \
             the translated text (no quotes, no extra words).\n\nText: \n{}",
            target_lang.to_uppercase(),
            text
        )
    }

    async fn translate_one(&self, text: &str, target_lang: &str) -> TranslationResult<String> {
        info!("provider=gemini target={} input={}", target_lang, preview(text));
        let url = format!("{}/models/{}:generateContent", self.api_url, self.model);
        let body = json!({
            "contents": [{ "parts": [{ "text": Self::prompt(text, target_lang) }] }]
        });

        let response = self
            .http
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(&body)
            .send()
            .await
            .map_err(transport(NAME))?;
        let reply: Value = check_status(NAME, response)
            .await?
            .json()
            .await
            .map_err(transport(NAME))?;

        match first_candidate_text(&reply) {
            Some(translated) => Ok(translated),
            None => {
                let reason = reply
                    .pointer("/promptFeedback/blockReason")
                    .and_then(Value::as_str)
                    .unwrap_or("empty response");
                warn!("provider=gemini no usable candidate, reason={}", reason);
                Ok(text.to_string())
            }
        }
    }
}

/// Concatenated text parts of the first candidate that has any.
fn first_candidate_text(reply: &Value) -> Option<String> {
    reply
        .get("candidates")
        .and_then(Value::as_array)?
        .iter()
        .filter_map(|candidate| {
            let parts = candidate.pointer("/content/parts")?.as_array()?;
            let joined: String = parts
                .iter()
                .filter_map(|part| part.get("text").and_then(Value::as_str))
                .collect();
            let trimmed = joined.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        })
        .next()
}

#[async_trait]
impl TranslationProvider for GeminiProvider {
    fn name(&self) -> &str {
        "gemini"
    }

    fn supports_batching(&self) -> bool {
        false
    }

    async fn translate(
        &self,
        texts: &[String],
        target_lang: &str,
    ) -> TranslationResult<Vec<TranslatedItem>> {
        let mut items = Vec::with_capacity(texts.len());
        for text in texts {
            items.push(TranslatedItem::new(self.translate_one(text, target_lang).await?));
        }
        Ok(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_candidate_text() {
        let reply = json!({
            "candidates": [
                { "content": { "parts": [] } },
                { "content": { "parts": [{ "text": " Hallo " }, { "text": "Welt" }] } }
            ]
        });
        assert_eq!(first_candidate_text(&reply).as_deref(), Some("Hallo Welt"));
        assert_eq!(first_candidate_text(&json!({ "candidates": [] })), None);
        assert_eq!(first_candidate_text(&json!({})), None);
    }
}
