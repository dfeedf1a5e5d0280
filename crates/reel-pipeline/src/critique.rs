//! Vision critique of rendered frames.

use std::sync::Arc;

use tracing::{debug, warn};

use reel_clients::{parse_structured, ImageInput, StillFrame, VisionCompletion, VisionRequest};
use reel_models::{Critique, Scene, Verdict};

use crate::prompts;

/// Confidence assigned to a verdict recovered from free text.
pub const COARSE_CONFIDENCE: f32 = 0.3;

/// Turn the critic's raw text into a critique.
///
/// JSON with a `verdict` key is decoded as is. Any other non-empty text
/// yields a coarse verdict: amateur iff the text mentions "amateur".
/// Empty text yields `None`.
pub fn parse_critique(raw: &str) -> Option<Critique> {
    if raw.trim().is_empty() {
        return None;
    }

    match parse_structured::<Critique>(raw, &["verdict"]) {
        Ok(critique) => Some(critique),
        Err(e) => {
            debug!("Critique is not structured ({}), deriving coarse verdict", e);
            let verdict = if raw.to_lowercase().contains("amateur") {
                Verdict::Amateur
            } else {
                Verdict::Premium
            };
            Some(Critique {
                verdict,
                issues: Vec::new(),
                required_fixes: Vec::new(),
                confidence: COARSE_CONFIDENCE,
                overall_score: None,
            })
        }
    }
}

/// Sends frames to the vision collaborator.
pub struct SceneCritic {
    vision: Arc<dyn VisionCompletion>,
    max_output_tokens: u32,
}

impl SceneCritic {
    pub fn new(vision: Arc<dyn VisionCompletion>, max_output_tokens: u32) -> Self {
        Self {
            vision,
            max_output_tokens,
        }
    }

    /// Critique one frame. `None` when the collaborator fails or says nothing.
    pub async fn critique(&self, frame: &StillFrame, scene: &Scene, scene_index: usize) -> Option<Critique> {
        let mut request = VisionRequest::new(
            ImageInput::from_render_output(&frame.image_data),
            prompts::critique::context(scene, scene_index),
        );
        request.max_output_tokens = self.max_output_tokens;

        match self.vision.analyze_image(&request).await {
            Ok(raw) => parse_critique(&raw),
            Err(e) => {
                warn!(scene_index, "Vision critique failed: {}", e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_structured_critique() {
        let critique = parse_critique(
            r#"```json
{"verdict":"amateur","issues":["flat background"],"required_fixes":["add gradient"],"confidence":0.9,"overallScore":5}
```"#,
        )
        .unwrap();
        assert_eq!(critique.verdict, Verdict::Amateur);
        assert_eq!(critique.required_fixes, vec!["add gradient"]);
        assert_eq!(critique.overall_score, Some(5.0));
        assert!(!critique.is_accepted(8.0));
    }

    #[test]
    fn test_amateur_verdict_accepted_by_high_score() {
        let critique = parse_critique(
            r#"{"verdict":"amateur","issues":["slightly tight kerning"],"requiredFixes":[],"confidence":0.6,"overallScore":9}"#,
        )
        .unwrap();
        assert_eq!(critique.verdict, Verdict::Amateur);
        assert_eq!(critique.overall_score, Some(9.0));
        assert!(critique.is_accepted(8.0));
    }

    #[test]
    fn test_coarse_verdict_from_text() {
        let critique = parse_critique("Honestly this looks AMATEUR, the text is cramped.").unwrap();
        assert_eq!(critique.verdict, Verdict::Amateur);
        assert_eq!(critique.confidence, COARSE_CONFIDENCE);

        let critique = parse_critique("Looks great, very polished.").unwrap();
        assert_eq!(critique.verdict, Verdict::Premium);
    }

    #[test]
    fn test_empty_is_none() {
        assert!(parse_critique("   ").is_none());
    }
}
