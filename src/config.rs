use std::collections::HashMap;
use std::time::Duration;

pub const DEFAULT_DATABASE_URL: &str = "sqlite://graph_tracker.db?mode=rwc";
pub const DEFAULT_BATCH_SIZE: usize = 50;
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Settings for translation providers and the batching client.
#[derive(Clone, Debug)]
pub struct TranslationConfig {
    pub provider: Option<String>,
    pub batch_size: usize,
    pub max_attempts: u32,
    pub retry_base_delay: Duration,
    pub request_timeout: Duration,
    pub deepl_api_key: Option<String>,
    pub deepl_api_url: String,
    pub libre_api_url: String,
    pub libre_api_key: Option<String>,
    pub mymemory_api_url: String,
    pub gemini_api_key: Option<String>,
    pub gemini_model: String,
    pub gemini_api_url: String,
}

impl Default for TranslationConfig {
    fn default() -> Self {
        AppConfig::from_map(&HashMap::new()).translation
    }
}

impl TranslationConfig {
    /// Resolve the provider for a job: explicit name, then the configured
    /// default, then DeepL when a key is present, then the mock backend.
    pub fn resolve_provider(&self, explicit: Option<&str>) -> String {
        explicit
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::to_string)
            .or_else(|| self.provider.clone())
            .unwrap_or_else(|| {
                if self.deepl_api_key.is_some() {
                    "deepl".to_string()
                } else {
                    "mock".to_string()
                }
            })
            .to_lowercase()
    }
}

/// Application configuration loaded from environment variables.
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub database_url: String,
    pub log_level: String,
    pub async_workers: usize,
    pub translation: TranslationConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::from_map(&HashMap::new())
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        let mut values = HashMap::new();
        for key in Self::tracked_keys() {
            if let Ok(value) = std::env::var(key) {
                values.insert(key.to_string(), value);
            }
        }
        Self::from_map(&values)
    }

    pub fn from_map(values: &HashMap<String, String>) -> Self {
        fn optional(values: &HashMap<String, String>, key: &str) -> Option<String> {
            values
                .get(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        }

        fn read(values: &HashMap<String, String>, key: &str, default: &str) -> String {
            optional(values, key).unwrap_or_else(|| default.to_string())
        }

        fn number<T: std::str::FromStr>(values: &HashMap<String, String>, key: &str, default: T) -> T {
            optional(values, key)
                .and_then(|value| value.parse().ok())
                .unwrap_or(default)
        }

        let batch_size = number(values, "TRANSLATION_BATCH_SIZE", DEFAULT_BATCH_SIZE).max(1);
        let retry_delay_ms: u64 = number(values, "TRANSLATION_RETRY_DELAY_MS", 1500);
        let timeout_secs: u64 = number(values, "TRANSLATION_TIMEOUT_SECS", 30);

        let translation = TranslationConfig {
            provider: optional(values, "TRANSLATION_PROVIDER").map(|p| p.to_lowercase()),
            batch_size,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            retry_base_delay: Duration::from_millis(retry_delay_ms),
            request_timeout: Duration::from_secs(timeout_secs),
            deepl_api_key: optional(values, "DEEPL_API_KEY"),
            deepl_api_url: read(
                values,
                "DEEPL_API_URL",
                "https://api-free.deepl.com/v2/translate",
            ),
            libre_api_url: read(values, "LT_API_URL", "https://libretranslate.com/translate"),
            libre_api_key: optional(values, "LT_API_KEY"),
            mymemory_api_url: read(
                values,
                "MM_API_URL",
                "https://api.mymemory.translated.net/get",
            ),
            gemini_api_key: optional(values, "GEMINI_API_KEY"),
            gemini_model: read(values, "GEMINI_MODEL", "gemini-1.5-flash"),
            gemini_api_url: read(
                values,
                "GEMINI_API_URL",
                "https://generativelanguage.googleapis.com/v1beta",
            ),
        };

        Self {
            database_url: read(values, "DATABASE_URL", DEFAULT_DATABASE_URL),
            log_level: read(values, "LOG_LEVEL", "info").to_lowercase(),
            async_workers: number::<usize>(values, "ASYNC_WORKERS", 2).max(1),
            translation,
        }
    }

    fn tracked_keys() -> Vec<&'static str> {
        vec![
            "DATABASE_URL",
            "LOG_LEVEL",
            "ASYNC_WORKERS",
            "TRANSLATION_PROVIDER",
            "TRANSLATION_BATCH_SIZE",
            "TRANSLATION_RETRY_DELAY_MS",
            "TRANSLATION_TIMEOUT_SECS",
            "DEEPL_API_KEY",
            "DEEPL_API_URL",
            "LT_API_URL",
            "LT_API_KEY",
            "MM_API_URL",
            "GEMINI_API_KEY",
            "GEMINI_MODEL",
            "GEMINI_API_URL",
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_defaults() {
        let config = AppConfig::from_map(&HashMap::new());
        assert_eq!(config.database_url, DEFAULT_DATABASE_URL);
        assert_eq!(config.log_level, "info");
        assert_eq!(config.async_workers, 2);
        assert_eq!(config.translation.batch_size, 50);
        assert_eq!(config.translation.max_attempts, 3);
        assert_eq!(config.translation.retry_base_delay, Duration::from_millis(1500));
        assert_eq!(config.translation.request_timeout, Duration::from_secs(30));
        assert!(config.translation.deepl_api_key.is_none());
    }

    #[test]
    fn test_invalid_numbers_fall_back_to_defaults() {
        let config = AppConfig::from_map(&map(&[
            ("TRANSLATION_BATCH_SIZE", "lots"),
            ("ASYNC_WORKERS", "0"),
        ]));
        assert_eq!(config.translation.batch_size, 50);
        assert_eq!(config.async_workers, 1);
    }

    #[test]
    fn test_provider_resolution_order() {
        let bare = AppConfig::from_map(&HashMap::new()).translation;
        assert_eq!(bare.resolve_provider(None), "mock");
        assert_eq!(bare.resolve_provider(Some("  ")), "mock");
        assert_eq!(bare.resolve_provider(Some("Libre")), "libre");

        let with_key = AppConfig::from_map(&map(&[("DEEPL_API_KEY", "k")])).translation;
        assert_eq!(with_key.resolve_provider(None), "deepl");

        let configured = AppConfig::from_map(&map(&[
            ("DEEPL_API_KEY", "k"),
            ("TRANSLATION_PROVIDER", "MyMemory"),
        ]))
        .translation;
        assert_eq!(configured.resolve_provider(None), "mymemory");
        assert_eq!(configured.resolve_provider(Some("gemini")), "gemini");
    }
}
