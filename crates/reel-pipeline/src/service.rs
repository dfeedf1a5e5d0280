//! Top-level generation service.
//!
//! Ties the orchestrator, the image pre-check and the feedback loop to a job
//! in the registry. Input errors are rejected before a job exists; anything
//! after that marks the job `error`.

use std::sync::Arc;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::Instrument;

use reel_clients::{RenderedVideo, SceneRenderer, TextCompletion, VisionCompletion};
use reel_models::{ArtDirection, JobId, MarketingStrategy, PipelineInput, ProvidedImage, VideoSpec};
use reel_progress::{JobRegistry, ProgressTracker};

use crate::config::{PipelineConfig, RefinementConfig};
use crate::correction::CorrectionEngine;
use crate::critique::SceneCritic;
use crate::error::{PipelineError, PipelineResult};
use crate::fallback::fallback_scene;
use crate::feedback::{FeedbackLoop, FinalVerdict, RefinementSummary};
use crate::logging::JobLogger;
use crate::metrics;
use crate::orchestrator::PipelineOrchestrator;
use crate::validation::{self, ValidationReport};

pub const MAX_PROMPT_CHARS: usize = 5000;
pub const MAX_IMAGES: usize = 20;
pub const MIN_DIMENSION: u32 = 240;
pub const MAX_DIMENSION: u32 = 4096;
pub const MAX_FPS: u32 = 60;

/// One generation request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateRequest {
    pub input: PipelineInput,
    /// Caller-chosen job id
    #[serde(default)]
    pub job_id: Option<JobId>,
    /// Overrides the configured refinement switch
    #[serde(default)]
    pub refine: Option<bool>,
    /// Overrides the configured iteration budget (capped)
    #[serde(default)]
    pub max_iterations: Option<u32>,
}

impl GenerateRequest {
    pub fn new(input: PipelineInput) -> Self {
        Self {
            input,
            job_id: None,
            refine: None,
            max_iterations: None,
        }
    }

    pub fn with_refinement(mut self, enabled: bool) -> Self {
        self.refine = Some(enabled);
        self
    }

    pub fn with_max_iterations(mut self, max_iterations: u32) -> Self {
        self.max_iterations = Some(max_iterations);
        self
    }

    pub fn with_job_id(mut self, job_id: JobId) -> Self {
        self.job_id = Some(job_id);
        self
    }
}

/// Everything a generation produces.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationOutput {
    pub job_id: JobId,
    pub spec: VideoSpec,
    pub strategy: MarketingStrategy,
    pub art_direction: ArtDirection,
    pub refinement: RefinementSummary,
    pub warnings: Vec<String>,
}

struct Inner {
    orchestrator: PipelineOrchestrator,
    feedback: FeedbackLoop,
    renderer: Arc<dyn SceneRenderer>,
    registry: JobRegistry,
    config: PipelineConfig,
}

/// Generation entry point. Cheap to clone.
#[derive(Clone)]
pub struct GenerationService {
    inner: Arc<Inner>,
}

impl GenerationService {
    pub fn new(
        text: Arc<dyn TextCompletion>,
        vision: Arc<dyn VisionCompletion>,
        renderer: Arc<dyn SceneRenderer>,
        registry: JobRegistry,
        config: PipelineConfig,
    ) -> Self {
        let critic = SceneCritic::new(vision, config.critique_max_tokens);
        let corrector = CorrectionEngine::new(text.clone(), config.correction_max_tokens);
        let feedback = FeedbackLoop::new(
            renderer.clone(),
            critic,
            corrector,
            config.refinement.clone(),
        );
        let orchestrator = PipelineOrchestrator::new(text, config.clone());

        Self {
            inner: Arc::new(Inner {
                orchestrator,
                feedback,
                renderer,
                registry,
                config,
            }),
        }
    }

    pub fn registry(&self) -> &JobRegistry {
        &self.inner.registry
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.inner.config
    }

    /// Reject requests that must not reach any collaborator.
    pub fn validate_request(request: &GenerateRequest) -> PipelineResult<()> {
        let input = &request.input;

        if input.prompt.trim().is_empty() {
            return Err(PipelineError::invalid_input("prompt is required"));
        }
        if input.prompt.chars().count() > MAX_PROMPT_CHARS {
            return Err(PipelineError::invalid_input(format!(
                "prompt exceeds {} characters",
                MAX_PROMPT_CHARS
            )));
        }
        if input.images.len() > MAX_IMAGES {
            return Err(PipelineError::invalid_input(format!(
                "at most {} images are allowed",
                MAX_IMAGES
            )));
        }
        for (i, image) in input.images.iter().enumerate() {
            if image.id.trim().is_empty() {
                return Err(PipelineError::invalid_input(format!("image {} has an empty id", i)));
            }
            if input.images[..i].iter().any(|other| other.id == image.id) {
                return Err(PipelineError::invalid_input(format!(
                    "duplicate image id '{}'",
                    image.id
                )));
            }
        }
        for (name, value) in [("width", input.width), ("height", input.height)] {
            if !(MIN_DIMENSION..=MAX_DIMENSION).contains(&value) {
                return Err(PipelineError::invalid_input(format!(
                    "{} must be between {} and {}",
                    name, MIN_DIMENSION, MAX_DIMENSION
                )));
            }
        }
        if !(1..=MAX_FPS).contains(&input.fps) {
            return Err(PipelineError::invalid_input(format!(
                "fps must be between 1 and {}",
                MAX_FPS
            )));
        }
        Ok(())
    }

    /// Validate the request and register its job.
    pub fn start(&self, request: &GenerateRequest) -> PipelineResult<JobId> {
        Self::validate_request(request)?;
        let record = self.inner.registry.create(request.job_id.clone())?;
        Ok(record.id)
    }

    /// Validate, register and run to completion.
    pub async fn generate(&self, request: GenerateRequest) -> PipelineResult<GenerationOutput> {
        let job_id = self.start(&request)?;
        self.run(job_id, request).await
    }

    /// Run a job created by [`start`](Self::start).
    ///
    /// The job ends `complete` or `error`; if the returned future is dropped
    /// midway the job is marked `error`.
    pub async fn run(&self, job_id: JobId, request: GenerateRequest) -> PipelineResult<GenerationOutput> {
        let logger = JobLogger::new(&job_id, "generate");
        let span = logger.create_span();

        async move {
            let started = Instant::now();
            let tracker = ProgressTracker::new(self.inner.registry.clone(), job_id.clone());
            let mut guard = CancelGuard::new(tracker.clone());
            logger.log_start(&format!("{} images, prompt {} chars", request.input.images.len(), request.input.prompt.len()));

            let result = self.run_stages(&job_id, &request, &tracker, &logger).await;
            guard.disarm();

            match &result {
                Ok(output) => {
                    tracker.complete(format!("Video specification ready ({} scenes)", output.spec.scenes.len()));
                    logger.log_completion("specification delivered", started.elapsed());
                    metrics::record_generation("success", started.elapsed().as_secs_f64());
                }
                Err(e) => {
                    tracker.fail(e.to_string());
                    logger.log_error(&e.to_string(), started.elapsed());
                    metrics::record_generation("error", started.elapsed().as_secs_f64());
                }
            }
            result
        }
        .instrument(span)
        .await
    }

    async fn run_stages(
        &self,
        job_id: &JobId,
        request: &GenerateRequest,
        tracker: &ProgressTracker,
        logger: &JobLogger,
    ) -> PipelineResult<GenerationOutput> {
        tracker.initializing("Starting generation");

        let output = self.inner.orchestrator.execute(&request.input, tracker).await?;

        validation::check_image_references(&output.spec, &request.input.images)
            .map_err(PipelineError::validation)?;

        let refine = request.refine.unwrap_or(self.inner.config.refinement.enabled);
        let planned = output.spec.clone();
        let (mut spec, mut refinement) = if refine {
            let max_iterations = RefinementConfig::effective_iterations(
                request
                    .max_iterations
                    .unwrap_or(self.inner.config.refinement.max_iterations),
            );
            logger.log_progress(&format!("refining with up to {} passes per scene", max_iterations));
            self.inner.feedback.refine(output.spec, max_iterations, tracker).await
        } else {
            (output.spec, RefinementSummary::disabled())
        };

        tracker.finalizing("Finalizing specification");
        let mut warnings = output.warnings;
        let mut report = validation::validate(&spec);
        if !report.valid {
            for note in replace_invalid_refinements(&planned, &mut spec, &mut refinement) {
                logger.log_warning(&note);
                warnings.push(note);
            }
            report = validation::validate(&spec);
            if !report.valid {
                return Err(PipelineError::validation(report.errors));
            }
        }
        for warning in &report.warnings {
            if !warnings.contains(warning) {
                logger.log_warning(warning);
                warnings.push(warning.clone());
            }
        }

        Ok(GenerationOutput {
            job_id: job_id.clone(),
            spec,
            strategy: output.strategy,
            art_direction: output.art_direction,
            refinement,
            warnings,
        })
    }

    /// Schema validation plus image pre-check for a caller-supplied spec.
    pub fn check_renderable(spec: &VideoSpec, images: &[ProvidedImage]) -> PipelineResult<ValidationReport> {
        let report = validation::validate(spec);
        if !report.valid {
            return Err(PipelineError::validation(report.errors));
        }
        validation::check_image_references(spec, images).map_err(PipelineError::validation)?;
        Ok(report)
    }

    /// Hand a checked specification to the renderer's full encode path.
    pub async fn render(&self, spec: &VideoSpec, images: &[ProvidedImage]) -> PipelineResult<RenderedVideo> {
        Self::check_renderable(spec, images)?;
        self.inner
            .renderer
            .render_video(spec)
            .await
            .map_err(|e| PipelineError::Render(e.to_string()))
    }
}

/// Swap every refined scene that no longer validates for the fallback of
/// its planned version. Returns one note per replaced scene.
fn replace_invalid_refinements(
    planned: &VideoSpec,
    spec: &mut VideoSpec,
    refinement: &mut RefinementSummary,
) -> Vec<String> {
    let mut notes = Vec::new();
    for report in refinement.scenes.iter_mut() {
        let index = report.scene_index;
        let (Some(original), Some(scene)) = (planned.scenes.get(index), spec.scenes.get_mut(index)) else {
            continue;
        };
        if scene == original {
            continue;
        }

        let alone = VideoSpec::new(spec.fps, spec.width, spec.height, vec![scene.clone()]);
        let check = validation::validate(&alone);
        if check.valid {
            continue;
        }

        *scene = fallback_scene(original);
        report.final_verdict = FinalVerdict::Fallback;
        report.was_modified = true;
        metrics::record_scene_outcome(FinalVerdict::Fallback.as_str());
        notes.push(format!(
            "scene {}: refined scene failed validation ({}), fallback used",
            index,
            check.errors.join("; ")
        ));
    }
    notes
}

/// Marks the job failed if a run is dropped before it finishes.
struct CancelGuard {
    tracker: ProgressTracker,
    armed: bool,
}

impl CancelGuard {
    fn new(tracker: ProgressTracker) -> Self {
        Self { tracker, armed: true }
    }

    fn disarm(&mut self) {
        self.armed = false;
    }
}

impl Drop for CancelGuard {
    fn drop(&mut self) {
        if self.armed {
            self.tracker.fail("Generation cancelled");
        }
    }
}
