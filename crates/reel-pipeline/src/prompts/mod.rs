//! Stage instructions for the completion collaborators.
//!
//! Each stage gets a fixed system instruction plus a user message built from
//! the caller input and the serialized artifacts of earlier stages.

pub mod art_director;
pub mod correction;
pub mod critique;
pub mod executor;
pub mod strategist;

use reel_models::PipelineInput;

/// Caller hints as bullet lines, skipping the ones not given.
pub(crate) fn input_hints(input: &PipelineInput) -> String {
    let mut lines = Vec::new();
    if let Some(product_type) = &input.product_type {
        lines.push(format!("- Product type: {}", product_type));
    }
    if let Some(audience) = &input.audience {
        lines.push(format!("- Audience: {}", audience));
    }
    if let Some(tone) = &input.tone {
        lines.push(format!("- Tone: {}", tone));
    }
    if let Some(language) = &input.language {
        lines.push(format!("- Write all on-screen text in language: {}", language));
    }
    if lines.is_empty() {
        "- (none)".to_string()
    } else {
        lines.join("\n")
    }
}

/// Provided images as bullet lines.
pub(crate) fn image_listing(input: &PipelineInput) -> String {
    if input.images.is_empty() {
        return "- (no images provided; do not reference any imageId)".to_string();
    }
    input
        .images
        .iter()
        .map(|img| {
            format!(
                "- id \"{}\" ({}){}",
                img.id,
                img.inferred_type.as_str(),
                img.description
                    .as_deref()
                    .map(|d| format!(": {}", d))
                    .unwrap_or_default()
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Pretty JSON of an artifact, `{}` if it cannot be serialized.
pub(crate) fn to_json<T: serde::Serialize>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| "{}".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use reel_models::{ImageKind, ProvidedImage};

    #[test]
    fn test_hints_and_images() {
        let input = PipelineInput::new("A kettle").with_tone("playful");
        assert_eq!(input_hints(&input), "- Tone: playful");
        assert!(image_listing(&input).contains("no images provided"));

        let input = input.with_images(vec![ProvidedImage {
            id: "shot-1".into(),
            inferred_type: ImageKind::Product,
            description: Some("kettle on a counter".into()),
        }]);
        assert_eq!(
            image_listing(&input),
            "- id \"shot-1\" (product): kettle on a counter"
        );
    }

    #[test]
    fn test_stage_messages_carry_color_schemas() {
        let input = PipelineInput::new("Task manager for busy teams");
        let strategy = reel_models::MarketingStrategy {
            core_promise: "Every deadline under control".into(),
            hook_intent: "recognition".into(),
            emotional_arc: vec!["stress".into(), "relief".into()],
            differentiator: "AI triage".into(),
            target_audience: None,
            call_to_action: None,
        };
        let theme = crate::catalog::theme_for_industry(&input.prompt);

        let art_message = art_director::user_message(&input, &strategy, theme);
        assert!(art_message.contains(r##"{"primary": "#RRGGBB", "secondary": "#RRGGBB", "accent": "#RRGGBB"}"##));
        assert!(art_message.ends_with("Keep the palette coherent with the chosen design pack."));

        let art = reel_models::ArtDirection {
            design_pack: theme.id.to_string(),
            palette: reel_models::Palette {
                primary: "#2563EB".into(),
                secondary: "#0F172A".into(),
                accent: "#22C55E".into(),
            },
            mood: "calm".into(),
            shots: Vec::new(),
        };
        let executor_message = executor::user_message(&input, &strategy, &art, theme);
        assert!(executor_message.contains(r##""colors": ["#RRGGBB", "#RRGGBB"]"##));
        assert!(executor_message.contains("#2563EB"));
    }
}
