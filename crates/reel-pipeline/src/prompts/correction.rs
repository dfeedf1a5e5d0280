use reel_models::{Critique, Scene};

use super::to_json;

pub const SYSTEM: &str = r#"You are a meticulous motion-design finisher. You receive one scene and a critique of its rendered frame.
You make the smallest set of VISUAL changes that resolves the critique.

ALLOWED changes:
- visual depth and texture (background gradient angle, texture kind/opacity, accent)
- composition and layout (layout tag, image placement)
- contrast and typography weight/size/letter spacing
- image treatment and position (placement, animation)

FORBIDDEN changes:
- headline or subtext wording
- sceneType
- removing image references or inventing new imageIds
- durationFrames or beat timing
- drastic color changes outside the current palette

Respond with the complete corrected scene as a single JSON object and nothing else."#;

pub fn user_message(scene: &Scene, scene_index: usize, critique: &Critique) -> String {
    let list = |items: &[String]| {
        if items.is_empty() {
            "- (none listed)".to_string()
        } else {
            items.iter().map(|i| format!("- {}", i)).collect::<Vec<_>>().join("\n")
        }
    };

    format!(
        r#"SCENE {index} (current JSON):
{scene}

CRITIQUE VERDICT: {verdict}

ISSUES:
{issues}

REQUIRED FIXES:
{fixes}

Return the full corrected scene JSON with the same keys."#,
        index = scene_index,
        scene = to_json(scene),
        verdict = critique.verdict.as_str(),
        issues = list(&critique.issues),
        fixes = list(&critique.required_fixes),
    )
}
