use reel_models::{MarketingStrategy, PipelineInput, SceneType};

use super::{input_hints, to_json};
use crate::catalog::{self, ThemePreset, THEME_PRESETS};

pub const REQUIRED_KEYS: &[&str] = &["designPack", "palette", "mood"];

pub const SYSTEM: &str = r#"You are the art director of a premium motion-design studio.
Given a marketing strategy you choose ONE design pack, a three-color palette, a mood and a shot plan.
You never change the strategy. Respond with a single JSON object and nothing else."#;

fn design_pack_listing(suggested: &ThemePreset) -> String {
    THEME_PRESETS
        .iter()
        .map(|t| {
            let marker = if t.id == suggested.id { " (suggested for this industry)" } else { "" };
            format!(
                "- \"{}\": {}, mood {}, primary {}, accent {}{}",
                t.id, t.name, t.mood, t.primary, t.accent, marker
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn effect_listing() -> String {
    SceneType::ALL
        .iter()
        .map(|t| format!("- {}: {}", t, catalog::allowed_effects(*t).join(", ")))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn user_message(input: &PipelineInput, strategy: &MarketingStrategy, suggested: &ThemePreset) -> String {
    format!(
        r##"PRODUCT DESCRIPTION:
{prompt}

HINTS:
{hints}

MARKETING STRATEGY (read-only):
{strategy}

AVAILABLE DESIGN PACKS:
{packs}

ALLOWED EFFECTS PER SHOT TYPE (use nothing else):
{effects}

Return ONLY a JSON object with this schema:
{{
  "designPack": "one design pack id from the list",
  "palette": {{"primary": "#RRGGBB", "secondary": "#RRGGBB", "accent": "#RRGGBB"}},
  "mood": "two or three adjectives",
  "shots": [
    {{"shotType": "hook|problem|solution|feature|proof|cta", "effects": ["effect"], "fontRecommendations": ["font family"], "notes": "optional"}}
  ]
}}

Rules:
- One shot per beat of the emotional arc, starting with a hook and ending with a cta.
- Keep the palette coherent with the chosen design pack."##,
        prompt = input.prompt,
        hints = input_hints(input),
        strategy = to_json(strategy),
        packs = design_pack_listing(suggested),
        effects = effect_listing(),
    )
}
