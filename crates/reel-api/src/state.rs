//! Application state.

use std::sync::Arc;

use tracing::info;

use reel_clients::{GeminiClient, HttpRenderClient};
use reel_pipeline::{GenerationService, PipelineConfig};
use reel_progress::{JobRegistry, RedisProgressMirror};

use crate::config::ApiConfig;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: ApiConfig,
    pub service: GenerationService,
    pub registry: JobRegistry,
    /// Render service client checked by `/ready`
    pub readiness_renderer: Option<Arc<HttpRenderClient>>,
}

impl AppState {
    /// Wire the production collaborators from the environment.
    pub fn new(config: ApiConfig) -> anyhow::Result<Self> {
        let ai = Arc::new(GeminiClient::from_env()?);
        let renderer = Arc::new(HttpRenderClient::from_env()?);

        let mut registry = JobRegistry::new();
        if let Ok(redis_url) = std::env::var("REDIS_URL") {
            registry = registry.with_mirror(RedisProgressMirror::new(&redis_url)?);
            info!("Mirroring progress events to Redis");
        }

        let pipeline_config = PipelineConfig::from_env();
        info!(
            refinement = pipeline_config.refinement.enabled,
            max_iterations = pipeline_config.refinement.max_iterations,
            "Pipeline configured"
        );

        let service = GenerationService::new(
            ai.clone(),
            ai,
            renderer.clone(),
            registry.clone(),
            pipeline_config,
        );

        Ok(Self {
            config,
            service,
            registry,
            readiness_renderer: Some(renderer),
        })
    }

    /// State around an already built service.
    pub fn with_service(config: ApiConfig, service: GenerationService) -> Self {
        Self {
            config,
            registry: service.registry().clone(),
            service,
            readiness_renderer: None,
        }
    }
}
