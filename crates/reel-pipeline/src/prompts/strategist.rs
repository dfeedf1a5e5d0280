use reel_models::PipelineInput;

use super::{image_listing, input_hints};

pub const REQUIRED_KEYS: &[&str] = &["corePromise", "hookIntent", "emotionalArc", "differentiator"];

pub const SYSTEM: &str = r#"You are a senior performance-marketing strategist who plans short vertical product videos (15-30 seconds).
You decide WHAT the video must say and in which emotional order. You do not design visuals.
Respond with a single JSON object and nothing else."#;

pub fn user_message(input: &PipelineInput) -> String {
    format!(
        r#"PRODUCT DESCRIPTION:
{prompt}

HINTS:
{hints}

PROVIDED IMAGES:
{images}

Return ONLY a JSON object with this schema:
{{
  "corePromise": "the single promise the viewer must remember",
  "hookIntent": "what the first 2 seconds must achieve",
  "emotionalArc": ["emotion per beat of the story, in order"],
  "differentiator": "why this product over the alternatives",
  "targetAudience": "who this is for",
  "callToAction": "the closing ask"
}}

Rules:
- emotionalArc has 3 to 6 entries.
- Be specific to this product; no generic marketing filler."#,
        prompt = input.prompt,
        hints = input_hints(input),
        images = image_listing(input),
    )
}
