//! Provider wiring — builds the concrete backends from configuration.

use std::sync::Arc;

use researchflow_config::{AppConfig, Credentials};
use researchflow_core::provider::Provider;
use researchflow_core::search::SearchClient;

use crate::openai_compat::OpenAiCompatProvider;
use crate::tavily::TavilyClient;

/// The two remote collaborators of a pipeline run.
#[derive(Clone)]
pub struct Providers {
    pub generation: Arc<dyn Provider>,
    pub search: Arc<dyn SearchClient>,
}

/// Build providers from configuration and resolved credentials.
pub fn build_from_config(config: &AppConfig, credentials: &Credentials) -> Providers {
    let generation = OpenAiCompatProvider::new(
        &config.generation.provider_name,
        &config.generation.api_url,
        &credentials.generation_api_key,
    );
    let search = TavilyClient::with_base_url(&config.search.api_url, &credentials.search_api_key);

    tracing::debug!(
        generation = %config.generation.provider_name,
        model = %config.generation.model,
        search = "tavily",
        "Providers configured"
    );

    Providers {
        generation: Arc::new(generation),
        search: Arc::new(search),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_named_providers() {
        let config = AppConfig::default();
        let credentials = Credentials {
            search_api_key: "tvly".into(),
            generation_api_key: "g".into(),
        };
        let providers = build_from_config(&config, &credentials);
        assert_eq!(providers.generation.name(), "gemini");
        assert_eq!(providers.search.name(), "tavily");
    }
}
