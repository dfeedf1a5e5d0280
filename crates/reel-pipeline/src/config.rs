//! Pipeline configuration.

use reel_models::SceneType;

/// Hard cap on feedback-loop iterations per scene.
pub const MAX_REFINEMENT_ITERATIONS: u32 = 3;

/// Visual feedback loop settings.
#[derive(Debug, Clone)]
pub struct RefinementConfig {
    /// Run the render/critique/correct loop at all
    pub enabled: bool,
    /// Rounds per scene, capped at [`MAX_REFINEMENT_ITERATIONS`]
    pub max_iterations: u32,
    /// Overall critic score (out of 10) that counts as accepted
    pub accept_score: f32,
    /// Scene types that get reviewed
    pub review_scene_types: Vec<SceneType>,
}

impl Default for RefinementConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_iterations: 2,
            accept_score: 8.0,
            review_scene_types: vec![SceneType::Hook, SceneType::Solution],
        }
    }
}

impl RefinementConfig {
    /// Requested iterations clamped to the hard cap.
    pub fn effective_iterations(requested: u32) -> u32 {
        requested.min(MAX_REFINEMENT_ITERATIONS)
    }

    pub fn reviews(&self, scene_type: Option<SceneType>) -> bool {
        scene_type.is_some_and(|t| self.review_scene_types.contains(&t))
    }
}

/// Pipeline configuration.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub strategist_max_tokens: u32,
    pub art_director_max_tokens: u32,
    pub executor_max_tokens: u32,
    pub correction_max_tokens: u32,
    pub critique_max_tokens: u32,
    pub refinement: RefinementConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            strategist_max_tokens: 2048,
            art_director_max_tokens: 2048,
            executor_max_tokens: 8192, // full scene list
            correction_max_tokens: 4096,
            critique_max_tokens: 1024,
            refinement: RefinementConfig::default(),
        }
    }
}

impl PipelineConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let review_scene_types = std::env::var("REVIEW_SCENE_TYPES")
            .ok()
            .map(|s| {
                s.split(',')
                    .filter_map(|t| t.parse::<SceneType>().ok())
                    .collect::<Vec<_>>()
            })
            .filter(|types| !types.is_empty())
            .unwrap_or(defaults.refinement.review_scene_types);

        Self {
            strategist_max_tokens: std::env::var("STRATEGIST_MAX_TOKENS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.strategist_max_tokens),
            art_director_max_tokens: std::env::var("ART_DIRECTOR_MAX_TOKENS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.art_director_max_tokens),
            executor_max_tokens: std::env::var("EXECUTOR_MAX_TOKENS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.executor_max_tokens),
            correction_max_tokens: std::env::var("CORRECTION_MAX_TOKENS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.correction_max_tokens),
            critique_max_tokens: defaults.critique_max_tokens,
            refinement: RefinementConfig {
                enabled: std::env::var("REFINEMENT_ENABLED")
                    .map(|v| v != "false" && v != "0")
                    .unwrap_or(true),
                max_iterations: RefinementConfig::effective_iterations(
                    std::env::var("REFINEMENT_MAX_ITERATIONS")
                        .ok()
                        .and_then(|s| s.parse().ok())
                        .unwrap_or(2),
                ),
                accept_score: std::env::var("REFINEMENT_ACCEPT_SCORE")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(8.0),
                review_scene_types,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = PipelineConfig::default();
        assert!(config.refinement.enabled);
        assert_eq!(config.refinement.max_iterations, 2);
        assert!(config.refinement.reviews(Some(SceneType::Hook)));
        assert!(!config.refinement.reviews(Some(SceneType::Proof)));
        assert!(!config.refinement.reviews(None));
    }

    #[test]
    fn test_iteration_cap() {
        assert_eq!(RefinementConfig::effective_iterations(0), 0);
        assert_eq!(RefinementConfig::effective_iterations(2), 2);
        assert_eq!(RefinementConfig::effective_iterations(10), MAX_REFINEMENT_ITERATIONS);
    }
}
