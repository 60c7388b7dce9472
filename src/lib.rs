//! LegalMind — AI-driven legal document analysis
//!
//! This crate assembles the immutable service container: store, blob
//! store, document codec, model client, tool registry, and the session
//! orchestrator. Everything is built once at startup and passed
//! explicitly; there are no ambient globals.

use std::sync::Arc;
use std::time::Duration;

use legalmind_agent::SessionOrchestrator;
use legalmind_core::{CoreError, Result, RuntimeConfig};
use legalmind_llm::{GeminiClient, ModelClient, StaticToken};
use legalmind_store::{
    BlobStore, DocumentCodec, MemoryBlobStore, MemoryStore, PlainTextCodec, Store,
};
use legalmind_tools::create_default_registry;

/// The assembled application services.
pub struct App {
    pub config: RuntimeConfig,
    pub store: Arc<dyn Store>,
    pub blobs: Arc<dyn BlobStore>,
    pub codec: Arc<dyn DocumentCodec>,
    pub orchestrator: Arc<SessionOrchestrator>,
}

impl std::fmt::Debug for App {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("App").field("config", &self.config).finish_non_exhaustive()
    }
}

impl App {
    /// Build the container from config, binding the configured model
    /// provider. Configuration problems fail here, at startup.
    pub fn build(config: RuntimeConfig) -> Result<Self> {
        config.validate()?;

        let model: Arc<dyn ModelClient> = match config.model_provider.as_str() {
            "gemini" => {
                let token = std::env::var("LEGALMIND_VERTEX_TOKEN").unwrap_or_default();
                if token.is_empty() && config.use_grounded_backend {
                    return Err(CoreError::Configuration(
                        "grounded backend requires LEGALMIND_VERTEX_TOKEN".into(),
                    ));
                }
                Arc::new(
                    GeminiClient::new(&config, Arc::new(StaticToken(token)))
                        .map_err(|e| CoreError::Configuration(e.to_string()))?,
                )
            }
            other => {
                return Err(CoreError::Configuration(format!(
                    "unknown model_provider: {}",
                    other
                )))
            }
        };

        Ok(Self::with_model(config, model))
    }

    /// Assemble with an explicit model client (tests, alternate bindings).
    pub fn with_model(config: RuntimeConfig, model: Arc<dyn ModelClient>) -> Self {
        let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
        let blobs: Arc<dyn BlobStore> = Arc::new(MemoryBlobStore::new());
        let codec: Arc<dyn DocumentCodec> = Arc::new(PlainTextCodec);
        let registry =
            Arc::new(create_default_registry(Duration::from_secs(config.tool_timeout_seconds)));

        let orchestrator = Arc::new(SessionOrchestrator::new(
            &config,
            store.clone(),
            blobs.clone(),
            codec.clone(),
            model,
            registry,
        ));

        Self { config, store, blobs, codec, orchestrator }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grounded_build_fails_fast_without_binding() {
        let mut config = RuntimeConfig::default();
        config.use_grounded_backend = true;
        config.vertex_project = String::new();
        assert!(App::build(config).is_err());
    }

    #[test]
    fn unknown_provider_is_a_configuration_error() {
        let mut config = RuntimeConfig::default();
        config.use_grounded_backend = false;
        config.vertex_project = "demo".into();
        config.model_provider = "mystery".into();
        let err = App::build(config).unwrap_err();
        assert!(matches!(err, CoreError::Configuration(_)));
    }
}
