//! Bounded single-scene correction.
//!
//! One completion call per correction. The model may only touch visual
//! fields; everything else is taken from the original scene and image
//! references are checked against the pre-correction scene.

use std::collections::BTreeSet;
use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, info, warn};

use reel_clients::{parse_json_value, CompletionRequest, TextCompletion};
use reel_models::{CorrectionResult, Critique, Scene};

use crate::metrics;
use crate::prompts;

/// Keys a model may wrap the corrected scene in.
const WRAPPER_KEYS: &[&str] = &["correctedScene", "scene"];

/// Scene keys a correction may change.
pub const VISUAL_KEYS: &[&str] = &[
    "background",
    "typography",
    "motion",
    "layout",
    "images",
    "elements",
    "accent",
    "transition",
];

pub struct CorrectionEngine {
    text: Arc<dyn TextCompletion>,
    max_output_tokens: u32,
}

impl CorrectionEngine {
    pub fn new(text: Arc<dyn TextCompletion>, max_output_tokens: u32) -> Self {
        Self {
            text,
            max_output_tokens,
        }
    }

    /// Ask for a visual-only correction of `scene` addressing `critique`.
    ///
    /// Never fails: problems are reported as `success == false` and the
    /// input scene is left alone.
    pub async fn correct_scene(&self, scene: &Scene, scene_index: usize, critique: &Critique) -> CorrectionResult {
        let request = CompletionRequest::new(
            prompts::correction::SYSTEM,
            prompts::correction::user_message(scene, scene_index, critique),
        )
        .with_max_output_tokens(self.max_output_tokens);

        let result = match self.text.complete(&request).await {
            Ok(raw) => apply_correction(scene, &raw),
            Err(e) => CorrectionResult::failed(format!("correction call failed: {}", e)),
        };

        metrics::record_correction(result.success);
        if result.success {
            info!(scene_index, changes = ?result.changes_applied, "Correction applied");
        } else {
            warn!(
                scene_index,
                "Correction rejected: {}",
                result.error.as_deref().unwrap_or("unknown")
            );
        }
        result
    }
}

/// Parse a correction response and enforce the protected-field rules.
///
/// Only [`VISUAL_KEYS`] are taken from the response, merged onto the
/// original scene; everything else (wording, type, duration, beats) is the
/// original's. A key the response omits or sets to null keeps its old value.
pub fn apply_correction(original: &Scene, raw: &str) -> CorrectionResult {
    let reply = match parse_json_value(raw, &[]) {
        Ok(value) => unwrap_scene(value),
        Err(e) => return CorrectionResult::failed(e.to_string()),
    };
    let Value::Object(reply) = reply else {
        return CorrectionResult::failed("corrected scene is not a JSON object");
    };

    let mut merged = match serde_json::to_value(original) {
        Ok(Value::Object(map)) => map,
        Ok(_) => return CorrectionResult::failed("scene did not serialize to an object"),
        Err(e) => return CorrectionResult::failed(format!("scene did not serialize: {}", e)),
    };

    for (key, value) in reply {
        if value.is_null() {
            continue;
        }
        if VISUAL_KEYS.contains(&key.as_str()) {
            merged.insert(key, value);
        } else if merged.get(&key).is_some_and(|old| *old != value) {
            debug!(key = %key, "Correction touched a protected field, keeping original");
        }
    }

    let corrected: Scene = match serde_json::from_value(Value::Object(merged)) {
        Ok(scene) => scene,
        Err(e) => return CorrectionResult::failed(format!("corrected scene has wrong shape: {}", e)),
    };

    let before: BTreeSet<&str> = original.image_ids().collect();
    let after: BTreeSet<&str> = corrected.image_ids().collect();
    if let Some(invented) = after.difference(&before).next() {
        return CorrectionResult::failed(format!("correction introduced unknown image '{}'", invented));
    }
    if let Some(removed) = before.difference(&after).next() {
        return CorrectionResult::failed(format!("correction removed image '{}'", removed));
    }

    let changes = changed_fields(original, &corrected);
    CorrectionResult::applied(corrected, changes)
}

/// Top-level visual fields that differ between two scenes.
pub fn changed_fields(before: &Scene, after: &Scene) -> Vec<String> {
    let mut changes = Vec::new();
    if before.background != after.background {
        changes.push("background".to_string());
    }
    if before.typography != after.typography {
        changes.push("typography".to_string());
    }
    if before.motion != after.motion {
        changes.push("motion".to_string());
    }
    if before.layout != after.layout {
        changes.push("layout".to_string());
    }
    if before.images != after.images {
        changes.push("images".to_string());
    }
    if before.elements != after.elements {
        changes.push("elements".to_string());
    }
    if before.accent != after.accent {
        changes.push("accent".to_string());
    }
    if before.transition != after.transition {
        changes.push("transition".to_string());
    }
    changes
}

fn unwrap_scene(value: Value) -> Value {
    if let Value::Object(map) = &value {
        for key in WRAPPER_KEYS {
            if let Some(inner) = map.get(*key).filter(|v| v.is_object()) {
                return inner.clone();
            }
        }
    }
    value
}
