//! Pipeline metrics.

use metrics::{counter, histogram};

/// Metric names.
pub mod names {
    // Stages
    pub const STAGE_DURATION_SECONDS: &str = "promoreel_pipeline_stage_duration_seconds";
    pub const STAGE_FAILURES_TOTAL: &str = "promoreel_pipeline_stage_failures_total";

    // Feedback loop
    pub const REFINEMENT_ITERATIONS_TOTAL: &str = "promoreel_refinement_iterations_total";
    pub const CRITIQUE_VERDICTS_TOTAL: &str = "promoreel_critique_verdicts_total";
    pub const CORRECTIONS_TOTAL: &str = "promoreel_corrections_total";
    pub const SCENE_OUTCOMES_TOTAL: &str = "promoreel_scene_outcomes_total";

    // Whole generations
    pub const GENERATIONS_TOTAL: &str = "promoreel_generations_total";
    pub const GENERATION_DURATION_SECONDS: &str = "promoreel_generation_duration_seconds";
}

/// Record a completed stage call.
pub fn record_stage_duration(stage: &str, duration_secs: f64) {
    let labels = [("stage", stage.to_string())];
    histogram!(names::STAGE_DURATION_SECONDS, &labels).record(duration_secs);
}

/// Record a fatal stage failure.
pub fn record_stage_failure(stage: &str) {
    let labels = [("stage", stage.to_string())];
    counter!(names::STAGE_FAILURES_TOTAL, &labels).increment(1);
}

/// Record one render+critique round.
pub fn record_refinement_iteration(scene_type: &str) {
    let labels = [("scene_type", scene_type.to_string())];
    counter!(names::REFINEMENT_ITERATIONS_TOTAL, &labels).increment(1);
}

/// Record a critic verdict.
pub fn record_verdict(verdict: &str) {
    let labels = [("verdict", verdict.to_string())];
    counter!(names::CRITIQUE_VERDICTS_TOTAL, &labels).increment(1);
}

/// Record a correction attempt.
pub fn record_correction(success: bool) {
    let labels = [("outcome", if success { "applied" } else { "failed" }.to_string())];
    counter!(names::CORRECTIONS_TOTAL, &labels).increment(1);
}

/// Record how a reviewed scene ended (accepted, fallback, skipped, aborted).
pub fn record_scene_outcome(outcome: &str) {
    let labels = [("outcome", outcome.to_string())];
    counter!(names::SCENE_OUTCOMES_TOTAL, &labels).increment(1);
}

/// Record a finished generation.
pub fn record_generation(outcome: &str, duration_secs: f64) {
    let labels = [("outcome", outcome.to_string())];
    counter!(names::GENERATIONS_TOTAL, &labels).increment(1);
    histogram!(names::GENERATION_DURATION_SECONDS, &labels).record(duration_secs);
}
