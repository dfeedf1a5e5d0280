//! Visual feedback loop.
//!
//! Per reviewed scene: render a still, critique it, and either accept it,
//! correct it and go again, or give up and substitute the fallback variant.
//! Scenes are reviewed one after another, iterations strictly in order.

use std::sync::Arc;

use serde::Serialize;
use tracing::{info, info_span, warn, Instrument};

use reel_clients::SceneRenderer;
use reel_models::{Scene, SceneType, VideoSpec};
use reel_progress::ProgressTracker;

use crate::config::{RefinementConfig, MAX_REFINEMENT_ITERATIONS};
use crate::correction::CorrectionEngine;
use crate::critique::SceneCritic;
use crate::fallback::fallback_scene;
use crate::metrics;

/// How a scene's loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FinalVerdict {
    /// Critic accepted the (possibly corrected) scene
    Accepted,
    /// Deterministic fallback variant substituted
    Fallback,
    /// Zero iterations requested
    Skipped,
    /// Render or critique unavailable before any correction; scene untouched
    Aborted,
}

impl FinalVerdict {
    pub fn as_str(&self) -> &'static str {
        match self {
            FinalVerdict::Accepted => "accepted",
            FinalVerdict::Fallback => "fallback",
            FinalVerdict::Skipped => "skipped",
            FinalVerdict::Aborted => "aborted",
        }
    }
}

/// Bookkeeping for one reviewed scene.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SceneRefinement {
    pub scene_index: usize,
    pub scene_type: Option<SceneType>,
    /// Render+critique rounds performed
    pub iterations: u32,
    pub final_verdict: FinalVerdict,
    pub was_modified: bool,
    /// Issue count reported by each critique, in order
    pub issue_counts: Vec<usize>,
    pub final_score: Option<f32>,
    /// Fields changed by successful corrections, in order
    pub changes_applied: Vec<String>,
}

/// Result of reviewing one scene.
#[derive(Debug, Clone)]
pub struct SceneOutcome {
    pub scene: Scene,
    pub report: SceneRefinement,
}

/// Summary over all reviewed scenes of a specification.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefinementSummary {
    pub enabled: bool,
    /// Total render+critique rounds across scenes
    pub iterations: u32,
    /// Mean of the last score of each scene that received one
    pub final_score: Option<f32>,
    /// Issue counts of every critique, in review order
    pub issue_counts: Vec<usize>,
    pub scenes: Vec<SceneRefinement>,
}

impl RefinementSummary {
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            iterations: 0,
            final_score: None,
            issue_counts: Vec::new(),
            scenes: Vec::new(),
        }
    }

    fn from_reports(scenes: Vec<SceneRefinement>) -> Self {
        let scores: Vec<f32> = scenes.iter().filter_map(|s| s.final_score).collect();
        let final_score = if scores.is_empty() {
            None
        } else {
            Some(scores.iter().sum::<f32>() / scores.len() as f32)
        };

        Self {
            enabled: true,
            iterations: scenes.iter().map(|s| s.iterations).sum(),
            final_score,
            issue_counts: scenes.iter().flat_map(|s| s.issue_counts.iter().copied()).collect(),
            scenes,
        }
    }
}

pub struct FeedbackLoop {
    renderer: Arc<dyn SceneRenderer>,
    critic: SceneCritic,
    corrector: CorrectionEngine,
    config: RefinementConfig,
}

impl FeedbackLoop {
    pub fn new(
        renderer: Arc<dyn SceneRenderer>,
        critic: SceneCritic,
        corrector: CorrectionEngine,
        config: RefinementConfig,
    ) -> Self {
        Self {
            renderer,
            critic,
            corrector,
            config,
        }
    }

    pub fn config(&self) -> &RefinementConfig {
        &self.config
    }

    /// Indices of the scenes this loop reviews.
    pub fn reviewable_scenes(&self, spec: &VideoSpec) -> Vec<usize> {
        spec.scenes
            .iter()
            .enumerate()
            .filter(|(_, s)| self.config.reviews(s.scene_type))
            .map(|(i, _)| i)
            .collect()
    }

    /// Review every reviewable scene and return the improved specification.
    pub async fn refine(
        &self,
        spec: VideoSpec,
        max_iterations: u32,
        tracker: &ProgressTracker,
    ) -> (VideoSpec, RefinementSummary) {
        let mut spec = spec;
        let mut reports = Vec::new();

        for index in self.reviewable_scenes(&spec) {
            let Some(outcome) = self.refine_scene(&spec, index, max_iterations, tracker).await else {
                continue;
            };
            spec.scenes[index] = outcome.scene;
            reports.push(outcome.report);
        }

        let summary = RefinementSummary::from_reports(reports);
        info!(
            scenes = summary.scenes.len(),
            iterations = summary.iterations,
            final_score = ?summary.final_score,
            "Refinement finished"
        );
        (spec, summary)
    }

    /// Run the loop for scene `scene_index` of `spec`.
    ///
    /// `None` if the index is out of range.
    pub async fn refine_scene(
        &self,
        spec: &VideoSpec,
        scene_index: usize,
        max_iterations: u32,
        tracker: &ProgressTracker,
    ) -> Option<SceneOutcome> {
        let original = spec.scenes.get(scene_index)?;
        let span = info_span!("refine_scene", scene_index, scene_type = ?original.scene_type);
        Some(
            self.run_scene(spec, original, scene_index, max_iterations, tracker)
                .instrument(span)
                .await,
        )
    }

    async fn run_scene(
        &self,
        spec: &VideoSpec,
        original: &Scene,
        scene_index: usize,
        max_iterations: u32,
        tracker: &ProgressTracker,
    ) -> SceneOutcome {
        let max_iterations = max_iterations.min(MAX_REFINEMENT_ITERATIONS);
        let scene_label = original
            .scene_type
            .map(|t| t.as_str())
            .unwrap_or("unknown");

        let mut report = SceneRefinement {
            scene_index,
            scene_type: original.scene_type,
            iterations: 0,
            final_verdict: FinalVerdict::Skipped,
            was_modified: false,
            issue_counts: Vec::new(),
            final_score: None,
            changes_applied: Vec::new(),
        };

        if max_iterations == 0 {
            metrics::record_scene_outcome(FinalVerdict::Skipped.as_str());
            return SceneOutcome {
                scene: original.clone(),
                report,
            };
        }

        let mut working = original.clone();
        let mut corrected = false;
        let mut preview = spec.clone();

        for iteration in 1..=max_iterations {
            preview.scenes[scene_index] = working.clone();

            tracker.rendering_frames(format!(
                "Rendering {} scene (pass {}/{})",
                scene_label, iteration, max_iterations
            ));
            let frame = match self.renderer.render_still(&preview, scene_index).await {
                Ok(frame) => frame,
                Err(e) => {
                    warn!(iteration, "Render failed: {}", e);
                    break;
                }
            };

            report.iterations = iteration;
            metrics::record_refinement_iteration(scene_label);
            tracker.vision_analysis(
                iteration,
                format!("Reviewing {} scene (pass {}/{})", scene_label, iteration, max_iterations),
            );

            let Some(critique) = self.critic.critique(&frame, &working, scene_index).await else {
                warn!(iteration, "No usable critique");
                break;
            };

            metrics::record_verdict(critique.verdict.as_str());
            report.issue_counts.push(critique.issues.len());
            report.final_score = critique.overall_score;

            if critique.is_accepted(self.config.accept_score) {
                info!(iteration, "Scene accepted");
                report.final_verdict = FinalVerdict::Accepted;
                report.was_modified = corrected;
                metrics::record_scene_outcome(FinalVerdict::Accepted.as_str());
                return SceneOutcome {
                    scene: working,
                    report,
                };
            }

            if iteration == max_iterations {
                info!(iteration, "Iteration budget exhausted");
                return self.fallback(original, report);
            }

            tracker.applying_fixes(
                iteration,
                format!(
                    "Applying {} fixes to {} scene",
                    critique.required_fixes.len().max(critique.issues.len()),
                    scene_label
                ),
            );
            let correction = self.corrector.correct_scene(&working, scene_index, &critique).await;
            match correction.corrected_scene {
                Some(scene) if correction.success => {
                    working = scene;
                    corrected = true;
                    report.changes_applied.extend(correction.changes_applied);
                }
                _ => return self.fallback(original, report),
            }
        }

        // render or critique gave out
        if corrected {
            self.fallback(original, report)
        } else {
            report.final_verdict = FinalVerdict::Aborted;
            metrics::record_scene_outcome(FinalVerdict::Aborted.as_str());
            SceneOutcome {
                scene: original.clone(),
                report,
            }
        }
    }

    fn fallback(&self, original: &Scene, mut report: SceneRefinement) -> SceneOutcome {
        report.final_verdict = FinalVerdict::Fallback;
        report.was_modified = true;
        metrics::record_scene_outcome(FinalVerdict::Fallback.as_str());
        SceneOutcome {
            scene: fallback_scene(original),
            report,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use reel_clients::{
        ClientError, ClientResult, CompletionRequest, RenderedVideo, StillFrame, TextCompletion,
        VisionCompletion, VisionRequest,
    };
    use reel_models::{Background, BackgroundFill, JobRecord, JobStage, JobStatus};
    use reel_progress::JobRegistry;
    use std::collections::VecDeque;

    /// Hands out canned results in order, failing once the script runs dry.
    struct Script<T> {
        replies: Mutex<VecDeque<ClientResult<T>>>,
        calls: Mutex<usize>,
    }

    impl<T> Script<T> {
        fn new(replies: Vec<ClientResult<T>>) -> Arc<Self> {
            Arc::new(Self {
                replies: Mutex::new(replies.into()),
                calls: Mutex::new(0),
            })
        }

        fn next(&self) -> ClientResult<T> {
            *self.calls.lock() += 1;
            self.replies
                .lock()
                .pop_front()
                .unwrap_or_else(|| Err(ClientError::request_failed("script exhausted")))
        }

        fn calls(&self) -> usize {
            *self.calls.lock()
        }
    }

    #[async_trait]
    impl SceneRenderer for Script<StillFrame> {
        async fn render_still(&self, _spec: &VideoSpec, _scene_index: usize) -> ClientResult<StillFrame> {
            self.next()
        }

        async fn render_video(&self, _spec: &VideoSpec) -> ClientResult<RenderedVideo> {
            Err(ClientError::request_failed("not scripted"))
        }
    }

    #[async_trait]
    impl VisionCompletion for Script<String> {
        async fn analyze_image(&self, _request: &VisionRequest) -> ClientResult<String> {
            self.next()
        }
    }

    struct Text(Arc<Script<String>>);

    #[async_trait]
    impl TextCompletion for Text {
        async fn complete(&self, _request: &CompletionRequest) -> ClientResult<String> {
            self.0.next()
        }
    }

    const PREMIUM: &str = r#"{"verdict":"premium","issues":[],"confidence":0.9,"overallScore":9}"#;
    const AMATEUR: &str =
        r#"{"verdict":"amateur","issues":["flat background","cramped text"],"requiredFixes":["add depth"],"confidence":0.8,"overallScore":4}"#;
    const CORRECTED: &str = r##"{"correctedScene":{"sceneType":"hook","headline":"Something else","layout":"TEXT_CENTER",
        "background":{"type":"gradient","colors":["#111827","#1F2937"],"angle":135}}}"##;

    fn frame() -> ClientResult<StillFrame> {
        Ok(StillFrame {
            image_data: "iVBORw0KGgo=".to_string(),
        })
    }

    fn spec() -> VideoSpec {
        let mut hook = Scene::new(SceneType::Hook, "Deadlines slipping?");
        hook.background = Some(Background::solid("#FFFFFF"));
        let feature = Scene::new(SceneType::Feature, "Smart triage");
        VideoSpec::new(30, 1080, 1920, vec![hook, feature])
    }

    struct Harness {
        renderer: Arc<Script<StillFrame>>,
        vision: Arc<Script<String>>,
        text: Arc<Script<String>>,
    }

    impl Harness {
        fn new(
            frames: Vec<ClientResult<StillFrame>>,
            critiques: Vec<ClientResult<String>>,
            corrections: Vec<ClientResult<String>>,
        ) -> Self {
            Self {
                renderer: Script::new(frames),
                vision: Script::new(critiques),
                text: Script::new(corrections),
            }
        }

        fn feedback_loop(&self) -> FeedbackLoop {
            let config = RefinementConfig {
                review_scene_types: vec![SceneType::Hook],
                ..RefinementConfig::default()
            };
            FeedbackLoop::new(
                self.renderer.clone(),
                SceneCritic::new(self.vision.clone(), 512),
                CorrectionEngine::new(Arc::new(Text(self.text.clone())), 1024),
                config,
            )
        }
    }

    fn is_fallback(scene: &Scene) -> bool {
        match scene.background.as_ref().map(|b| &b.fill) {
            Some(BackgroundFill::Gradient { colors, .. }) => colors[0] == crate::fallback::FALLBACK_GRADIENT[0],
            _ => false,
        }
    }

    #[tokio::test]
    async fn test_accepted_on_first_pass() {
        let h = Harness::new(vec![frame()], vec![Ok(PREMIUM.into())], vec![]);
        let (out, summary) = h
            .feedback_loop()
            .refine(spec(), 2, &ProgressTracker::detached())
            .await;

        assert_eq!(out, spec());
        assert_eq!(summary.scenes.len(), 1);
        let report = &summary.scenes[0];
        assert_eq!(report.final_verdict, FinalVerdict::Accepted);
        assert_eq!(report.iterations, 1);
        assert!(!report.was_modified);
        assert_eq!(summary.final_score, Some(9.0));
        assert_eq!(h.text.calls(), 0);
    }

    #[tokio::test]
    async fn test_correction_then_accept_keeps_protected_fields() {
        let h = Harness::new(
            vec![frame(), frame()],
            vec![Ok(AMATEUR.into()), Ok(PREMIUM.into())],
            vec![Ok(CORRECTED.into())],
        );
        let (out, summary) = h
            .feedback_loop()
            .refine(spec(), 3, &ProgressTracker::detached())
            .await;

        let hook = &out.scenes[0];
        assert_eq!(hook.headline.as_deref(), Some("Deadlines slipping?"));
        assert!(!is_fallback(hook));
        let report = &summary.scenes[0];
        assert_eq!(report.final_verdict, FinalVerdict::Accepted);
        assert_eq!(report.iterations, 2);
        assert!(report.was_modified);
        assert_eq!(report.issue_counts, vec![2, 0]);
        assert!(report.changes_applied.contains(&"background".to_string()));
        // unreviewed scene untouched
        assert_eq!(out.scenes[1], spec().scenes[1]);
    }

    #[tokio::test]
    async fn test_budget_exhaustion_substitutes_fallback() {
        let h = Harness::new(
            vec![frame(), frame()],
            vec![Ok(AMATEUR.into()), Ok(AMATEUR.into())],
            vec![Ok(CORRECTED.into())],
        );
        let (out, summary) = h
            .feedback_loop()
            .refine(spec(), 2, &ProgressTracker::detached())
            .await;

        let hook = &out.scenes[0];
        assert!(is_fallback(hook));
        assert_eq!(hook.headline.as_deref(), Some("Deadlines slipping?"));
        let report = &summary.scenes[0];
        assert_eq!(report.final_verdict, FinalVerdict::Fallback);
        assert_eq!(report.iterations, 2);
        // no correction after the final critique
        assert_eq!(h.text.calls(), 1);
    }

    #[tokio::test]
    async fn test_requested_iterations_are_capped() {
        let h = Harness::new(
            vec![frame(), frame(), frame(), frame(), frame()],
            (0..5).map(|_| Ok(AMATEUR.to_string())).collect(),
            vec![Ok(CORRECTED.into()), Ok(CORRECTED.into()), Ok(CORRECTED.into())],
        );
        let (_, summary) = h
            .feedback_loop()
            .refine(spec(), 10, &ProgressTracker::detached())
            .await;

        assert_eq!(summary.scenes[0].iterations, MAX_REFINEMENT_ITERATIONS);
        assert_eq!(h.renderer.calls(), MAX_REFINEMENT_ITERATIONS as usize);
    }

    #[tokio::test]
    async fn test_zero_iterations_skips_without_calls() {
        let h = Harness::new(vec![], vec![], vec![]);
        let (out, summary) = h
            .feedback_loop()
            .refine(spec(), 0, &ProgressTracker::detached())
            .await;

        assert_eq!(out, spec());
        assert_eq!(summary.scenes[0].final_verdict, FinalVerdict::Skipped);
        assert_eq!(summary.iterations, 0);
        assert_eq!(h.renderer.calls(), 0);
        assert_eq!(h.vision.calls(), 0);
    }

    #[tokio::test]
    async fn test_render_failure_before_correction_aborts() {
        let h = Harness::new(
            vec![Err(ClientError::request_failed("renderer down"))],
            vec![],
            vec![],
        );
        let (out, summary) = h
            .feedback_loop()
            .refine(spec(), 2, &ProgressTracker::detached())
            .await;

        assert_eq!(out, spec());
        assert_eq!(summary.scenes[0].final_verdict, FinalVerdict::Aborted);
        assert_eq!(summary.scenes[0].iterations, 0);
        assert_eq!(h.vision.calls(), 0);
    }

    #[tokio::test]
    async fn test_render_failure_after_correction_falls_back() {
        let h = Harness::new(
            vec![frame(), Err(ClientError::request_failed("renderer down"))],
            vec![Ok(AMATEUR.into())],
            vec![Ok(CORRECTED.into())],
        );
        let (out, summary) = h
            .feedback_loop()
            .refine(spec(), 3, &ProgressTracker::detached())
            .await;

        assert!(is_fallback(&out.scenes[0]));
        assert_eq!(summary.scenes[0].final_verdict, FinalVerdict::Fallback);
    }

    #[tokio::test]
    async fn test_failed_correction_falls_back() {
        let h = Harness::new(
            vec![frame(), frame()],
            vec![Ok(AMATEUR.into())],
            vec![Ok("I would make the background darker.".into())],
        );
        let (out, summary) = h
            .feedback_loop()
            .refine(spec(), 3, &ProgressTracker::detached())
            .await;

        assert!(is_fallback(&out.scenes[0]));
        assert_eq!(summary.scenes[0].final_verdict, FinalVerdict::Fallback);
        assert_eq!(summary.scenes[0].iterations, 1);
    }

    #[tokio::test]
    async fn test_progress_stages_are_reported_in_order() {
        let registry = JobRegistry::new();
        let record = registry.create(None).unwrap();
        let tracker = ProgressTracker::new(registry.clone(), record.id.clone());

        let h = Harness::new(
            vec![frame(), frame()],
            vec![Ok(AMATEUR.into()), Ok(PREMIUM.into())],
            vec![Ok(CORRECTED.into())],
        );
        h.feedback_loop().refine(spec(), 2, &tracker).await;

        let record: JobRecord = registry.get(&record.id).unwrap();
        let stages: Vec<JobStage> = record.history.iter().map(|e| e.stage).collect();
        assert_eq!(
            stages,
            vec![
                JobStage::RenderingFrames,
                JobStage::VisionAnalysis(1),
                JobStage::ApplyingFixes(1),
                JobStage::RenderingFrames,
                JobStage::VisionAnalysis(2),
            ]
        );
        assert_eq!(record.status, JobStatus::Running);
        assert_eq!(record.progress, 70);
    }
}
