use async_trait::async_trait;
use serde_json::Value;
use tracing::info;

use super::{check_status, http_client, transport};
use crate::config::TranslationConfig;
use crate::errors::TranslationResult;
use crate::services::translation::detect::guess_source_lang;
use crate::services::translation::{preview, TranslatedItem, TranslationProvider};

const NAME: &str = "MyMemory";
const DISTINCT_LANGUAGES_NOTICE: &str = "PLEASE SELECT TWO DISTINCT LANGUAGES";

/// MyMemory public API. Needs an explicit language pair, so the source is
/// guessed per text.
pub struct MyMemoryProvider {
    api_url: String,
    http: reqwest::Client,
}

impl MyMemoryProvider {
    pub fn new(config: &TranslationConfig) -> TranslationResult<Self> {
        Ok(Self {
            api_url: config.mymemory_api_url.clone(),
            http: http_client(NAME, config.request_timeout)?,
        })
    }

    async fn translate_one(&self, text: &str, target_lang: &str) -> TranslationResult<String> {
        let source = guess_source_lang(text);
        info!(
            "provider=mymemory src={} target={} input={}",
            source,
            target_lang,
            preview(text)
        );
        let langpair = format!("{}|{}", source, target_lang.to_lowercase());

        let response = self
            .http
            .get(&self.api_url)
            .query(&[("q", text), ("langpair", langpair.as_str())])
            .send()
            .await
            .map_err(transport(NAME))?;
        let reply: Value = check_status(NAME, response)
            .await?
            .json()
            .await
            .map_err(transport(NAME))?;

        Ok(accept_reply(&reply, text))
    }
}

/// Pull the translation out of a reply, keeping the source text when the
/// service answers with nothing or with its same-language notice.
fn accept_reply(reply: &Value, source: &str) -> String {
    let translated = reply
        .pointer("/responseData/translatedText")
        .and_then(Value::as_str)
        .unwrap_or_default();
    if translated.is_empty()
        || translated
            .trim()
            .to_uppercase()
            .starts_with(DISTINCT_LANGUAGES_NOTICE)
    {
        source.to_string()
    } else {
        translated.to_string()
    }
}

#[async_trait]
impl TranslationProvider for MyMemoryProvider {
    fn name(&self) -> &str {
        "mymemory"
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
            let translated = self.translate_one(text, target_lang).await?;
            items.push(TranslatedItem {
                text: translated,
                detected_source_lang: Some(guess_source_lang(text).to_string()),
            });
        }
        Ok(items)
    }
}
