use reel_models::Scene;

/// Instructions sent with each frame to the vision collaborator.
pub fn context(scene: &Scene, scene_index: usize) -> String {
    let scene_type = scene
        .scene_type
        .map(|t| t.as_str())
        .unwrap_or("unknown");
    let headline = scene.headline.as_deref().unwrap_or("");

    format!(
        r#"You are a creative director judging one frame of a short vertical marketing video.
This is scene {index}, a "{scene_type}" scene with the headline "{headline}".

Judge it against premium motion-design standards: visual depth, hierarchy, contrast, composition, polish.
Flat single-color backgrounds, cramped or low-contrast text, and awkward image placement are amateur.

Return ONLY a JSON object:
{{
  "verdict": "premium" or "amateur",
  "issues": ["specific visual problems"],
  "requiredFixes": ["concrete visual changes"],
  "confidence": 0.0-1.0,
  "overallScore": 0-10
}}"#,
        index = scene_index,
        scene_type = scene_type,
        headline = headline,
    )
}
