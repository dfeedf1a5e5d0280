//! Deterministic safe variant of a scene.

use reel_models::{Background, LayoutTag, Motion, Scene, Typography};

pub const FALLBACK_GRADIENT: [&str; 2] = ["#0F0F14", "#1A1A24"];
pub const FALLBACK_GRADIENT_ANGLE: f32 = 180.0;
pub const FALLBACK_TEXTURE: &str = "grain";
pub const FALLBACK_TEXTURE_OPACITY: f32 = 0.04;
pub const FALLBACK_HEADLINE_SIZE: u32 = 96;
pub const FALLBACK_HEADLINE_WEIGHT: u16 = 800;

/// Minimal always-renderable variant of `original`.
///
/// Keeps the content (type, text, duration, beats, images, elements) of the
/// original and replaces every visual field with fixed values, so the result
/// depends only on the original scene.
pub fn fallback_scene(original: &Scene) -> Scene {
    let font_family = original
        .typography
        .as_ref()
        .map(|t| t.font_family.clone())
        .unwrap_or_else(|| Typography::default().font_family);

    Scene {
        scene_type: original.scene_type,
        headline: original.headline.clone(),
        subtext: original.subtext.clone(),
        layout: Some(LayoutTag::TextCenter),
        background: Some(
            Background::gradient(FALLBACK_GRADIENT, Some(FALLBACK_GRADIENT_ANGLE))
                .with_texture(FALLBACK_TEXTURE, FALLBACK_TEXTURE_OPACITY),
        ),
        typography: Some(Typography {
            font_family,
            headline_size: FALLBACK_HEADLINE_SIZE,
            headline_weight: FALLBACK_HEADLINE_WEIGHT,
            color: Some("#FFFFFF".to_string()),
            ..Typography::default()
        }),
        motion: Some(Motion {
            entry: "fade_in".to_string(),
            exit: "fade_out".to_string(),
            hold: Some("gentle_float".to_string()),
            entry_frames: Some(15),
            exit_frames: Some(15),
        }),
        duration_frames: original.duration_frames,
        beats: original.beats.clone(),
        images: original.images.clone(),
        elements: original.elements.clone(),
        accent: None,
        transition: None,
    }
}
