use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::info;

use super::{check_status, http_client, transport};
use crate::config::TranslationConfig;
use crate::errors::{TranslationError, TranslationResult};
use crate::services::translation::{preview, TranslatedItem, TranslationProvider};

const NAME: &str = "LibreTranslate";

/// LibreTranslate backend with server-side source detection.
pub struct LibreProvider {
    api_url: String,
    api_key: Option<String>,
    http: reqwest::Client,
}

impl LibreProvider {
    pub fn new(config: &TranslationConfig) -> TranslationResult<Self> {
        Ok(Self {
            api_url: config.libre_api_url.clone(),
            api_key: config.libre_api_key.clone(),
            http: http_client(NAME, config.request_timeout)?,
        })
    }
}

fn translated_text(value: &Value) -> String {
    value
        .get("translatedText")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

/// Deployments reply with a list, a single object, or a `translations` list.
fn parse_reply(reply: &Value) -> Vec<String> {
    match reply {
        Value::Array(items) => items.iter().map(translated_text).collect(),
        Value::Object(map) if map.contains_key("translatedText") => match &map["translatedText"] {
            Value::Array(texts) => texts
                .iter()
                .map(|text| text.as_str().unwrap_or_default().to_string())
                .collect(),
            _ => vec![translated_text(reply)],
        },
        Value::Object(map) => map
            .get("translations")
            .and_then(Value::as_array)
            .map(|items| items.iter().map(translated_text).collect())
            .unwrap_or_default(),
        _ => Vec::new(),
    }
}

#[async_trait]
impl TranslationProvider for LibreProvider {
    fn name(&self) -> &str {
        "libre"
    }

    async fn translate(
        &self,
        texts: &[String],
        target_lang: &str,
    ) -> TranslationResult<Vec<TranslatedItem>> {
        info!(
            "provider=libre target={} items={} sample={}",
            target_lang,
            texts.len(),
            preview(texts.first().map(String::as_str).unwrap_or_default())
        );

        let mut payload = json!({
            "q": texts,
            "source": "auto",
            "target": target_lang.to_lowercase(),
            "format": "text",
        });
        if let Some(key) = &self.api_key {
            payload["api_key"] = json!(key);
        }

        let response = self
            .http
            .post(&self.api_url)
            .json(&payload)
            .send()
            .await
            .map_err(transport(NAME))?;
        let reply: Value = check_status(NAME, response)
            .await?
            .json()
            .await
            .map_err(transport(NAME))?;

        let mut translated = parse_reply(&reply);
        if translated.len() == 1 && texts.len() > 1 {
            translated = vec![translated[0].clone(); texts.len()];
        }
        if translated.len() != texts.len() {
            return Err(TranslationError::provider(NAME, "returned unexpected count"));
        }
        Ok(translated.into_iter().map(TranslatedItem::new).collect())
    }
}
