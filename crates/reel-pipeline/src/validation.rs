//! Schema validation and auto-repair of generated output.
//!
//! Everything here is pure. `validate` reports; the `*_fix*`/`repair_*`
//! functions return a corrected copy plus a note for every change they made.

use std::collections::HashSet;

use serde::Serialize;

use reel_models::{LayoutTag, ProvidedImage, SceneType, Shot, VideoSpec};

use crate::catalog::{self, ThemePreset};

/// Result of [`validate`].
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationReport {
    pub valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    /// Informational findings (e.g. animations that need interpolation)
    pub notes: Vec<String>,
}

/// Check a specification against structural and vocabulary constraints.
///
/// Never fails; `valid` is false iff `errors` is non-empty.
pub fn validate(spec: &VideoSpec) -> ValidationReport {
    let mut report = ValidationReport::default();

    // (1) at least one scene
    if spec.scenes.is_empty() {
        report.errors.push("specification has no scenes".to_string());
    }

    for (i, scene) in spec.scenes.iter().enumerate() {
        let at = format!("scene {}", i);

        // (2) required renderer fields
        match scene.scene_type {
            None => report.errors.push(format!("{}: missing sceneType", at)),
            Some(SceneType::Unknown) => report
                .warnings
                .push(format!("{}: sceneType is not in the catalog vocabulary", at)),
            Some(_) => {}
        }
        if scene.background.is_none() {
            report.errors.push(format!("{}: missing background", at));
        }
        if scene.typography.is_none() {
            report.errors.push(format!("{}: missing typography", at));
        }
        if scene.motion.is_none() {
            report.errors.push(format!("{}: missing motion", at));
        }
        if scene.headline.as_deref().map_or(true, |h| h.trim().is_empty()) {
            report.warnings.push(format!("{}: missing headline", at));
        }
        if scene.duration_frames == 0 {
            report.errors.push(format!("{}: durationFrames must be positive", at));
        }
        if scene.layout == Some(LayoutTag::Other) {
            report.warnings.push(format!("{}: unrecognized layout", at));
        }

        // (3) beats
        let mut previous_start: Option<i64> = None;
        for (j, beat) in scene.beats.iter().enumerate() {
            let at = format!("{} beat {}", at, j);
            let (Some(start), Some(duration)) = (beat.start_frame, beat.duration_frames) else {
                if beat.start_frame.is_none() {
                    report.errors.push(format!("{}: missing startFrame", at));
                }
                if beat.duration_frames.is_none() {
                    report.errors.push(format!("{}: missing durationFrames", at));
                }
                continue;
            };

            if start < 0 {
                report.errors.push(format!("{}: starts before frame 0", at));
            }
            if duration <= 0 {
                report.errors.push(format!("{}: durationFrames must be positive", at));
            }
            match start.checked_add(duration) {
                None => report.errors.push(format!("{}: frame range overflows", at)),
                Some(end) if end > scene.duration_frames as i64 && !beat.allow_overflow => {
                    report.errors.push(format!(
                        "{}: ends at frame {} past scene end {}",
                        at, end, scene.duration_frames
                    ))
                }
                Some(_) => {}
            }
            if previous_start.is_some_and(|p| start < p) {
                report
                    .warnings
                    .push(format!("{}: starts before the preceding beat", at));
            }
            previous_start = Some(start);
        }

        // (4) image references
        for (j, image) in scene.image_refs().enumerate() {
            let at = format!("{} image {}", at, j);
            match image.image_id.as_deref() {
                Some(id) if !id.trim().is_empty() => {}
                _ => report.errors.push(format!("{}: missing imageId", at)),
            }
            if image.animation.as_ref().is_some_and(|a| a.needs_interpolation()) {
                report
                    .notes
                    .push(format!("{}: animation requires position interpolation", at));
            }
        }
    }

    report.valid = report.errors.is_empty();
    report
}

/// Shot list after allow-list enforcement.
#[derive(Debug, Clone, PartialEq)]
pub struct ShotFix {
    pub shots: Vec<Shot>,
    pub warnings: Vec<String>,
}

/// Enforce effect allow-lists and font defaults on AI-authored shots.
///
/// Unknown effects are dropped; an effect list left empty gets the first
/// allowed effect of the shot type. Empty font lists get the type defaults.
/// Never fails.
pub fn validate_and_fix_output(shots: &[Shot]) -> ShotFix {
    let mut warnings = Vec::new();
    let mut fixed = Vec::with_capacity(shots.len());

    for (i, shot) in shots.iter().enumerate() {
        let mut shot = shot.clone();
        let shot_type = shot.shot_type.parse::<SceneType>().unwrap_or(SceneType::Unknown);
        let allowed = catalog::allowed_effects(shot_type);

        if shot_type == SceneType::Unknown {
            warnings.push(format!(
                "shot {}: unknown shot type '{}', effects cleared",
                i, shot.shot_type
            ));
        }

        let mut kept: Vec<String> = Vec::new();
        for effect in &shot.effects {
            let normalized = catalog::normalize_effect(effect);
            if allowed.contains(&normalized.as_str()) {
                if !kept.contains(&normalized) {
                    kept.push(normalized);
                }
            } else if shot_type != SceneType::Unknown {
                warnings.push(format!(
                    "shot {} ({}): effect '{}' is not allowed, dropped",
                    i, shot_type, effect
                ));
            }
        }

        if kept.is_empty() {
            if let Some(first) = allowed.first() {
                if !shot.effects.is_empty() {
                    warnings.push(format!(
                        "shot {} ({}): no allowed effect left, using '{}'",
                        i, shot_type, first
                    ));
                }
                kept.push(first.to_string());
            }
        }
        shot.effects = kept;

        if shot.font_recommendations.iter().all(|f| f.trim().is_empty()) {
            shot.font_recommendations = catalog::default_fonts(shot_type)
                .iter()
                .map(|f| f.to_string())
                .collect();
        }

        fixed.push(shot);
    }

    ShotFix {
        shots: fixed,
        warnings,
    }
}

/// Every image id used in any scene must be one the caller provided.
///
/// Returns one error per dangling reference.
pub fn check_image_references(spec: &VideoSpec, images: &[ProvidedImage]) -> Result<(), Vec<String>> {
    let known: HashSet<&str> = images.iter().map(|img| img.id.as_str()).collect();

    let errors: Vec<String> = spec
        .scenes
        .iter()
        .enumerate()
        .flat_map(|(i, scene)| {
            scene
                .image_ids()
                .filter(|id| !known.contains(id))
                .map(move |id| format!("scene {}: image '{}' was not provided", i, id))
                .collect::<Vec<_>>()
        })
        .collect();

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Specification with defaults filled in.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneRepair {
    pub spec: VideoSpec,
    pub warnings: Vec<String>,
}

/// Fill missing background/typography/motion from `theme` and clamp beats
/// into their scene. One warning per repaired field.
pub fn repair_scene_defaults(spec: &VideoSpec, theme: &ThemePreset) -> SceneRepair {
    let mut spec = spec.clone();
    let mut warnings = Vec::new();

    for (i, scene) in spec.scenes.iter_mut().enumerate() {
        if scene.background.is_none() {
            scene.background = Some(theme.background());
            warnings.push(format!("scene {}: background filled from theme '{}'", i, theme.id));
        }
        if scene.typography.is_none() {
            scene.typography = Some(theme.typography());
            warnings.push(format!("scene {}: typography filled from theme '{}'", i, theme.id));
        }
        if scene.motion.is_none() {
            scene.motion = Some(catalog::default_motion(scene.scene_type));
            warnings.push(format!("scene {}: motion filled with defaults", i));
        }

        let scene_frames = scene.duration_frames as i64;
        for (j, beat) in scene.beats.iter_mut().enumerate() {
            if let Some(start) = beat.start_frame.filter(|s| *s < 0) {
                beat.start_frame = Some(0);
                warnings.push(format!("scene {} beat {}: start {} clamped to 0", i, j, start));
            }
            if let (Some(start), Some(duration)) = (beat.start_frame, beat.duration_frames) {
                let past_end = start.checked_add(duration).map_or(true, |end| end > scene_frames);
                if past_end && !beat.allow_overflow && start < scene_frames {
                    beat.duration_frames = Some(scene_frames - start);
                    warnings.push(format!(
                        "scene {} beat {}: shortened to end at frame {}",
                        i, j, scene_frames
                    ));
                }
            }
        }
    }

    SceneRepair { spec, warnings }
}
