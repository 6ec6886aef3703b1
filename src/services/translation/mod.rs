//! Translation providers and the batching client that drives them.

pub mod client;
pub mod detect;
pub mod providers;

use std::{fmt, str::FromStr, sync::Arc};

use anyhow::anyhow;
use async_trait::async_trait;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::config::TranslationConfig;
use crate::errors::TranslationResult;

pub use client::TranslationClient;

/// One translated string, positionally matched to its source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranslatedItem {
    pub text: String,
    pub detected_source_lang: Option<String>,
}

impl TranslatedItem {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            detected_source_lang: None,
        }
    }
}

/// Uniform interface over translation backends.
///
/// `translate` returns one item per input text, in input order.
#[async_trait]
pub trait TranslationProvider: Send + Sync {
    fn name(&self) -> &str;

    /// Whether one call may carry many texts. Non-batching providers are
    /// called with a single text at a time.
    fn supports_batching(&self) -> bool {
        true
    }

    async fn translate(
        &self,
        texts: &[String],
        target_lang: &str,
    ) -> TranslationResult<Vec<TranslatedItem>>;
}

/// Built-in translation backends.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, ValueEnum)]
pub enum ProviderKind {
    Mock,
    #[value(name = "deepl")]
    DeepL,
    Libre,
    #[value(name = "mymemory")]
    MyMemory,
    Gemini,
}

impl Default for ProviderKind {
    fn default() -> Self {
        ProviderKind::Mock
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}",
            match self {
                ProviderKind::Mock => "mock",
                ProviderKind::DeepL => "deepl",
                ProviderKind::Libre => "libre",
                ProviderKind::MyMemory => "mymemory",
                ProviderKind::Gemini => "gemini",
            }
        )
    }
}

impl FromStr for ProviderKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "mock" => Ok(ProviderKind::Mock),
            "deepl" => Ok(ProviderKind::DeepL),
            "libre" | "libretranslate" => Ok(ProviderKind::Libre),
            "mymemory" => Ok(ProviderKind::MyMemory),
            "gemini" => Ok(ProviderKind::Gemini),
            _ => Err(anyhow!("unknown provider '{s}'")),
        }
    }
}

impl ProviderKind {
    pub fn requires_api_key(&self) -> bool {
        matches!(self, ProviderKind::DeepL | ProviderKind::Gemini)
    }

    /// Instantiate the backend from configuration.
    pub fn build(&self, config: &TranslationConfig) -> TranslationResult<Arc<dyn TranslationProvider>> {
        Ok(match self {
            ProviderKind::Mock => Arc::new(providers::MockProvider),
            ProviderKind::DeepL => Arc::new(providers::DeepLProvider::new(config)?),
            ProviderKind::Libre => Arc::new(providers::LibreProvider::new(config)?),
            ProviderKind::MyMemory => Arc::new(providers::MyMemoryProvider::new(config)?),
            ProviderKind::Gemini => Arc::new(providers::GeminiProvider::new(config)?),
        })
    }
}

/// Truncate text for log lines.
pub(crate) fn preview(text: &str) -> String {
    const MAX_CHARS: usize = 160;
    if text.chars().count() <= MAX_CHARS {
        return text.to_string();
    }
    let mut short: String = text.chars().take(MAX_CHARS).collect();
    short.push('…');
    short
}
