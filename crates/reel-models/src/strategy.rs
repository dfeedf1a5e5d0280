//! Strategist and art-director artifacts.
//!
//! Both are produced once per job and only ever read by later stages.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Strategist output: what the video has to say and in which order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct MarketingStrategy {
    /// The single promise the viewer should remember
    pub core_promise: String,
    /// What the first seconds must achieve (curiosity, shock, relief...)
    pub hook_intent: String,
    /// Emotional beats in viewing order, e.g. ["frustration", "relief", "confidence"]
    #[serde(default)]
    pub emotional_arc: Vec<String>,
    /// Why this product over the alternatives
    pub differentiator: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_audience: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub call_to_action: Option<String>,
}

/// Three-color palette chosen by the art director.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Palette {
    pub primary: String,
    pub secondary: String,
    pub accent: String,
}

/// One AI-authored shot in the art director's shot plan.
///
/// Effects and font recommendations are free text from the model and must
/// pass the catalog allow-lists before the executor sees them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Shot {
    #[serde(alias = "type", alias = "sceneType")]
    pub shot_type: String,
    #[serde(default)]
    pub effects: Vec<String>,
    #[serde(default, alias = "fonts")]
    pub font_recommendations: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl Shot {
    pub fn new(shot_type: impl Into<String>) -> Self {
        Self {
            shot_type: shot_type.into(),
            effects: Vec::new(),
            font_recommendations: Vec::new(),
            notes: None,
        }
    }

    pub fn with_effects<I, S>(mut self, effects: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.effects = effects.into_iter().map(Into::into).collect();
        self
    }
}

/// Art-director output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ArtDirection {
    /// Identifier of a catalog theme preset
    pub design_pack: String,
    pub palette: Palette,
    pub mood: String,
    #[serde(default)]
    pub shots: Vec<Shot>,
}
