mod deepl;
mod gemini;
mod libre;
mod mock;
mod mymemory;

use std::time::Duration;

use crate::errors::{TranslationError, TranslationResult};

pub use deepl::DeepLProvider;
pub use gemini::GeminiProvider;
pub use libre::LibreProvider;
pub use mock::MockProvider;
pub use mymemory::MyMemoryProvider;

fn http_client(provider: &str, timeout: Duration) -> TranslationResult<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|err| TranslationError::provider(provider, err.to_string()))
}

/// Turn a non-success HTTP reply into a provider error carrying the body.
async fn check_status(
    provider: &str,
    response: reqwest::Response,
) -> TranslationResult<reqwest::Response> {
    let status = response.status();
    if status.is_client_error() || status.is_server_error() {
        let body = response.text().await.unwrap_or_default();
        return Err(TranslationError::provider(
            provider,
            format!("{} {}", status.as_u16(), body),
        ));
    }
    Ok(response)
}

fn transport(provider: &str) -> impl Fn(reqwest::Error) -> TranslationError + '_ {
    move |err| TranslationError::provider(provider, err.to_string())
}
