use reel_models::{ArtDirection, MarketingStrategy, PipelineInput};

use super::{image_listing, input_hints, to_json};
use crate::catalog::{ThemePreset, ENTRY_ANIMATIONS, EXIT_ANIMATIONS, HOLD_ANIMATIONS, LAYOUTS};

pub const REQUIRED_KEYS: &[&str] = &["scenes"];

pub const SYSTEM: &str = r#"You are a motion designer who turns a strategy and an art direction into a machine-renderable scene list.
Every scene MUST have sceneType, headline, layout, background, typography, motion and durationFrames.
Only reference images by the ids you are given. Respond with a single JSON object and nothing else."#;

pub fn user_message(
    input: &PipelineInput,
    strategy: &MarketingStrategy,
    art_direction: &ArtDirection,
    theme: &ThemePreset,
) -> String {
    format!(
        r##"PRODUCT DESCRIPTION:
{prompt}

HINTS:
{hints}

MARKETING STRATEGY (read-only):
{strategy}

ART DIRECTION (read-only):
{art}

DESIGN PACK "{theme_id}": background gradient {bg0} -> {bg1}, font {font}, text color {text_color}.
Use this background family on every scene so the video feels consistent.

PROVIDED IMAGES:
{images}

FRAME: {width}x{height} at {fps} fps.

VOCABULARY:
- layout: {layouts}
- motion.entry: {entries}
- motion.exit: {exits}
- motion.hold: {holds}

Return ONLY a JSON object with this schema:
{{
  "scenes": [
    {{
      "sceneType": "hook|problem|solution|feature|proof|cta",
      "headline": "max 7 words",
      "subtext": "optional, max 14 words",
      "layout": "TEXT_CENTER",
      "background": {{"type": "gradient", "colors": ["#RRGGBB", "#RRGGBB"], "angle": 180, "texture": {{"kind": "grain", "opacity": 0.05}}}},
      "typography": {{"fontFamily": "Inter", "headlineSize": 72, "headlineWeight": 700, "subtextSize": 36, "color": "#RRGGBB"}},
      "motion": {{"entry": "fade_in", "exit": "fade_out", "hold": "gentle_float"}},
      "durationFrames": 90,
      "beats": [{{"startFrame": 0, "durationFrames": 45, "text": "optional overlay"}}],
      "images": [{{"imageId": "provided id", "role": "hero|product|logo|background|inset|avatar", "placement": {{"x": 0.5, "y": 0.6, "width": 0.8}}}}],
      "accent": {{"color": "#RRGGBB", "style": "underline"}}
    }}
  ]
}}

Rules:
- 4 to 6 scenes following the shot plan order.
- Beats start at or after frame 0 and end within durationFrames.
- background.type is one of solid, gradient, mesh."##,
        prompt = input.prompt,
        hints = input_hints(input),
        strategy = to_json(strategy),
        art = to_json(art_direction),
        theme_id = theme.id,
        bg0 = theme.background_colors[0],
        bg1 = theme.background_colors[1],
        font = theme.font_family,
        text_color = theme.text_color,
        images = image_listing(input),
        width = input.width,
        height = input.height,
        fps = input.fps,
        layouts = LAYOUTS.join(", "),
        entries = ENTRY_ANIMATIONS.join(", "),
        exits = EXIT_ANIMATIONS.join(", "),
        holds = HOLD_ANIMATIONS.join(", "),
    )
}
