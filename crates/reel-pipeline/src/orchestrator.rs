//! Strategist -> Art Director -> Executor pipeline.
//!
//! Each stage is one completion call whose output is parsed and shape-checked
//! before the next stage starts. Artifacts only flow forward: a stage reads
//! earlier artifacts and produces a new one, and no stage is ever re-run.

use std::sync::Arc;
use std::time::Instant;

use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, info, warn};

use reel_clients::{parse_structured, CompletionRequest, TextCompletion};
use reel_models::{ArtDirection, MarketingStrategy, PipelineInput, Scene, VideoSpec};
use reel_progress::ProgressTracker;

use crate::catalog::{self, ThemePreset};
use crate::config::PipelineConfig;
use crate::error::{PipelineStage, PipelineStageError};
use crate::metrics;
use crate::prompts;
use crate::validation;

/// Artifacts of one pipeline run.
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub strategy: MarketingStrategy,
    pub art_direction: ArtDirection,
    pub spec: VideoSpec,
    /// Everything auto-repaired on the way
    pub warnings: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct ExecutorOutput {
    scenes: Vec<Scene>,
}

pub struct PipelineOrchestrator {
    text: Arc<dyn TextCompletion>,
    config: PipelineConfig,
}

impl PipelineOrchestrator {
    pub fn new(text: Arc<dyn TextCompletion>, config: PipelineConfig) -> Self {
        Self { text, config }
    }

    /// Run all three stages.
    ///
    /// Fails on the first stage whose output cannot be used; no partial
    /// result is returned.
    pub async fn execute(
        &self,
        input: &PipelineInput,
        tracker: &ProgressTracker,
    ) -> Result<PipelineOutput, PipelineStageError> {
        let mut warnings = Vec::new();

        tracker.analyzing("Analyzing product and defining strategy");
        let strategy = self.strategist(input).await?;
        debug!(core_promise = %strategy.core_promise, "Strategy ready");

        tracker.generating_plan("Choosing art direction and writing scenes");
        let (art_direction, theme) = self.art_director(input, &strategy, &mut warnings).await?;

        let spec = self
            .executor(input, &strategy, &art_direction, theme, &mut warnings)
            .await?;

        for warning in &warnings {
            warn!("Auto-repaired: {}", warning);
        }
        info!(
            scenes = spec.scenes.len(),
            design_pack = %art_direction.design_pack,
            repairs = warnings.len(),
            "Pipeline produced specification"
        );
        tracker.plan_complete(format!("Plan ready: {} scenes", spec.scenes.len()));

        Ok(PipelineOutput {
            strategy,
            art_direction,
            spec,
            warnings,
        })
    }

    async fn strategist(&self, input: &PipelineInput) -> Result<MarketingStrategy, PipelineStageError> {
        let request = CompletionRequest::new(prompts::strategist::SYSTEM, prompts::strategist::user_message(input))
            .with_max_output_tokens(self.config.strategist_max_tokens);

        let (strategy, _) = self
            .call_stage::<MarketingStrategy>(
                PipelineStage::Strategist,
                &request,
                prompts::strategist::REQUIRED_KEYS,
            )
            .await?;
        Ok(strategy)
    }

    async fn art_director(
        &self,
        input: &PipelineInput,
        strategy: &MarketingStrategy,
        warnings: &mut Vec<String>,
    ) -> Result<(ArtDirection, &'static ThemePreset), PipelineStageError> {
        let suggested = catalog::theme_for_industry(&industry_text(input));
        let request = CompletionRequest::new(
            prompts::art_director::SYSTEM,
            prompts::art_director::user_message(input, strategy, suggested),
        )
        .with_max_output_tokens(self.config.art_director_max_tokens);

        let (mut art_direction, _) = self
            .call_stage::<ArtDirection>(
                PipelineStage::ArtDirector,
                &request,
                prompts::art_director::REQUIRED_KEYS,
            )
            .await?;

        let theme = match catalog::find_theme(&art_direction.design_pack) {
            Some(theme) => theme,
            None => {
                warnings.push(format!(
                    "design pack '{}' is not in the catalog, using '{}'",
                    art_direction.design_pack, suggested.id
                ));
                art_direction.design_pack = suggested.id.to_string();
                suggested
            }
        };

        let fixed = validation::validate_and_fix_output(&art_direction.shots);
        art_direction.shots = fixed.shots;
        warnings.extend(fixed.warnings);

        Ok((art_direction, theme))
    }

    async fn executor(
        &self,
        input: &PipelineInput,
        strategy: &MarketingStrategy,
        art_direction: &ArtDirection,
        theme: &ThemePreset,
        warnings: &mut Vec<String>,
    ) -> Result<VideoSpec, PipelineStageError> {
        let request = CompletionRequest::new(
            prompts::executor::SYSTEM,
            prompts::executor::user_message(input, strategy, art_direction, theme),
        )
        .with_max_output_tokens(self.config.executor_max_tokens);

        let (output, raw) = self
            .call_stage::<ExecutorOutput>(
                PipelineStage::Executor,
                &request,
                prompts::executor::REQUIRED_KEYS,
            )
            .await?;

        let mut spec = VideoSpec::new(input.fps, input.width, input.height, output.scenes);
        spec.strategy = Some(strategy.clone());
        spec.art_direction = Some(art_direction.clone());

        let repaired = validation::repair_scene_defaults(&spec, theme);
        warnings.extend(repaired.warnings);
        let spec = repaired.spec;

        let report = validation::validate(&spec);
        warnings.extend(report.warnings);
        if !report.valid {
            metrics::record_stage_failure(PipelineStage::Executor.as_str());
            return Err(PipelineStageError::new(
                PipelineStage::Executor,
                format!("specification failed validation: {}", report.errors.join("; ")),
            )
            .with_raw_output(&raw));
        }

        Ok(spec)
    }

    /// One completion call plus parsing. Returns the value and the raw text.
    async fn call_stage<T: DeserializeOwned>(
        &self,
        stage: PipelineStage,
        request: &CompletionRequest,
        required_keys: &[&str],
    ) -> Result<(T, String), PipelineStageError> {
        let started = Instant::now();
        debug!(stage = %stage, "Calling completion");

        let result = match self.text.complete(request).await {
            Ok(raw) => match parse_structured::<T>(&raw, required_keys) {
                Ok(value) => Ok((value, raw)),
                Err(e) => Err(PipelineStageError::from_parse(stage, &e)),
            },
            Err(e) => Err(PipelineStageError::from_client(stage, &e)),
        };

        let elapsed = started.elapsed();
        metrics::record_stage_duration(stage.as_str(), elapsed.as_secs_f64());
        match &result {
            Ok(_) => info!(stage = %stage, duration_ms = elapsed.as_millis() as u64, "Stage complete"),
            Err(e) => {
                metrics::record_stage_failure(stage.as_str());
                warn!(stage = %stage, "Stage failed: {}", e.message);
            }
        }
        result
    }
}

/// Text used to pick an industry theme.
fn industry_text(input: &PipelineInput) -> String {
    match &input.product_type {
        Some(product_type) => format!("{} {}", product_type, input.prompt),
        None => input.prompt.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use reel_clients::{ClientError, ClientResult};
    use reel_models::{BackgroundFill, JobStage};
    use reel_progress::JobRegistry;
    use std::collections::VecDeque;

    /// Replays canned completions in order.
    struct Scripted {
        replies: Mutex<VecDeque<ClientResult<String>>>,
        calls: Mutex<Vec<CompletionRequest>>,
    }

    impl Scripted {
        fn new(replies: Vec<ClientResult<String>>) -> Arc<Self> {
            Arc::new(Self {
                replies: Mutex::new(replies.into()),
                calls: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl TextCompletion for Scripted {
        async fn complete(&self, request: &CompletionRequest) -> ClientResult<String> {
            self.calls.lock().push(request.clone());
            self.replies
                .lock()
                .pop_front()
                .unwrap_or_else(|| Err(ClientError::request_failed("script exhausted")))
        }
    }

    const STRATEGY: &str = r#"{"corePromise":"Ship on time","hookIntent":"recognition","emotionalArc":["stress","relief","confidence"],"differentiator":"AI triage"}"#;
    const ART: &str = r##"```json
{"designPack":"clean_saas","palette":{"primary":"#2563EB","secondary":"#0F172A","accent":"#22C55E"},"mood":"calm","shots":[{"shotType":"hook","effects":["confetti"]}]}
```"##;
    const SCENES: &str = r##"{"scenes":[
        {"sceneType":"hook","headline":"Deadlines slipping?","layout":"TEXT_CENTER",
         "background":{"type":"solid","color":"#F8FAFC"},"typography":{"fontFamily":"Inter"},
         "motion":{"entry":"fade_in","exit":"fade_out"},"durationFrames":60},
        {"sceneType":"solution","headline":"Meet Tasky"}
    ]}"##;

    fn orchestrator(text: Arc<Scripted>) -> PipelineOrchestrator {
        PipelineOrchestrator::new(text, PipelineConfig::default())
    }

    #[tokio::test]
    async fn test_happy_path_threads_artifacts_forward() {
        let text = Scripted::new(vec![Ok(STRATEGY.into()), Ok(ART.into()), Ok(SCENES.into())]);
        let output = orchestrator(text.clone())
            .execute(&PipelineInput::new("Project management SaaS"), &ProgressTracker::detached())
            .await
            .unwrap();

        assert_eq!(output.strategy.core_promise, "Ship on time");
        assert_eq!(output.art_direction.shots[0].effects, vec!["kinetic_type"]);
        assert_eq!(output.spec.scenes.len(), 2);
        // scene 1 was repaired from the clean_saas theme
        let bg = output.spec.scenes[1].background.as_ref().unwrap();
        assert!(matches!(&bg.fill, BackgroundFill::Gradient { colors, .. } if colors[0] == "#F8FAFC"));
        assert!(output.warnings.iter().any(|w| w.contains("confetti")));

        let calls = text.calls.lock();
        assert_eq!(calls.len(), 3);
        assert!(calls[1].user.contains("Ship on time"));
        assert!(calls[2].user.contains("\"designPack\": \"clean_saas\""));
    }

    #[tokio::test]
    async fn test_stage_failure_aborts_with_raw_output() {
        let text = Scripted::new(vec![
            Ok(STRATEGY.into()),
            Ok("Sorry, I can only answer in prose.".into()),
            Ok(SCENES.into()),
        ]);
        let err = orchestrator(text.clone())
            .execute(&PipelineInput::new("A kettle"), &ProgressTracker::detached())
            .await
            .unwrap_err();

        assert_eq!(err.stage, PipelineStage::ArtDirector);
        assert_eq!(err.raw_output.as_deref(), Some("Sorry, I can only answer in prose."));
        // executor never ran
        assert_eq!(text.calls.lock().len(), 2);
    }

    #[tokio::test]
    async fn test_missing_keys_is_stage_failure() {
        let text = Scripted::new(vec![Ok(r#"{"corePromise":"x"}"#.into())]);
        let err = orchestrator(text)
            .execute(&PipelineInput::new("A kettle"), &ProgressTracker::detached())
            .await
            .unwrap_err();
        assert_eq!(err.stage, PipelineStage::Strategist);
        assert!(err.message.contains("hookIntent"));
    }

    #[tokio::test]
    async fn test_unrepairable_spec_fails_executor() {
        let text = Scripted::new(vec![
            Ok(STRATEGY.into()),
            Ok(ART.into()),
            Ok(r#"{"scenes":[]}"#.into()),
        ]);
        let err = orchestrator(text)
            .execute(&PipelineInput::new("A kettle"), &ProgressTracker::detached())
            .await
            .unwrap_err();
        assert_eq!(err.stage, PipelineStage::Executor);
        assert!(err.message.contains("no scenes"));
    }

    #[tokio::test]
    async fn test_unknown_design_pack_falls_back_to_industry_theme() {
        let art = r##"{"designPack":"vaporwave","palette":{"primary":"#000","secondary":"#111","accent":"#222"},"mood":"odd"}"##;
        let text = Scripted::new(vec![Ok(STRATEGY.into()), Ok(art.into()), Ok(SCENES.into())]);
        let output = orchestrator(text)
            .execute(&PipelineInput::new("Organic skincare serum"), &ProgressTracker::detached())
            .await
            .unwrap();
        assert_eq!(output.art_direction.design_pack, "health_fresh");
    }

    #[tokio::test]
    async fn test_stages_are_mirrored_into_registry() {
        let registry = JobRegistry::new();
        let id = registry.create(None).unwrap().id;
        let tracker = ProgressTracker::new(registry.clone(), id.clone());

        let text = Scripted::new(vec![Ok(STRATEGY.into()), Ok(ART.into()), Ok(SCENES.into())]);
        orchestrator(text)
            .execute(&PipelineInput::new("SaaS"), &tracker)
            .await
            .unwrap();

        let stages: Vec<JobStage> = registry.get(&id).unwrap().history.iter().map(|e| e.stage).collect();
        assert_eq!(
            stages,
            vec![JobStage::Analyzing, JobStage::GeneratingPlan, JobStage::PlanComplete]
        );
    }
}
