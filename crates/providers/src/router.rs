//! Provider selection from configuration.

use std::sync::Arc;

use leadchat_config::AppConfig;
use leadchat_core::error::ProviderError;
use leadchat_core::provider::Provider;

use crate::openai_compat::OpenAiCompatProvider;

/// Build the configured provider.
///
/// Fails with [`ProviderError::NotConfigured`] when no API key is available,
/// so a misconfigured deployment is caught at startup rather than on the
/// first visitor message.
pub fn build_from_config(config: &AppConfig) -> Result<Arc<dyn Provider>, ProviderError> {
    let api_key = config
        .api_key
        .clone()
        .filter(|k| !k.is_empty())
        .ok_or_else(|| {
            ProviderError::NotConfigured(format!(
                "no API key for provider '{}' (set OPENAI_API_KEY)",
                config.provider.name
            ))
        })?;

    Ok(Arc::new(OpenAiCompatProvider::new(
        config.provider.name.clone(),
        config.provider.api_url.clone(),
        api_key,
    )))
}
