//! Vision critique and correction results.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::spec::Scene;

/// Binary quality classification from the vision critic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    Premium,
    Amateur,
}

impl Verdict {
    pub fn as_str(&self) -> &'static str {
        match self {
            Verdict::Premium => "premium",
            Verdict::Amateur => "amateur",
        }
    }
}

/// Critique of one rendered scene frame.
///
/// Lives only for the duration of a job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Critique {
    pub verdict: Verdict,
    #[serde(default)]
    pub issues: Vec<String>,
    #[serde(default, alias = "required_fixes")]
    pub required_fixes: Vec<String>,
    /// 0.0 - 1.0
    #[serde(default)]
    pub confidence: f32,
    /// Overall score out of 10, when the critic gives one
    #[serde(
        default,
        alias = "overall_score",
        alias = "score",
        skip_serializing_if = "Option::is_none"
    )]
    pub overall_score: Option<f32>,
}

impl Critique {
    pub fn premium() -> Self {
        Self {
            verdict: Verdict::Premium,
            issues: Vec::new(),
            required_fixes: Vec::new(),
            confidence: 1.0,
            overall_score: None,
        }
    }

    pub fn amateur<I, S>(issues: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            verdict: Verdict::Amateur,
            issues: issues.into_iter().map(Into::into).collect(),
            required_fixes: Vec::new(),
            confidence: 1.0,
            overall_score: None,
        }
    }

    /// Accepted when the critic says premium or the score clears the bar.
    pub fn is_accepted(&self, accept_score: f32) -> bool {
        self.verdict == Verdict::Premium || self.overall_score.is_some_and(|s| s >= accept_score)
    }
}

/// Outcome of a single bounded correction call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CorrectionResult {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub corrected_scene: Option<Scene>,
    /// Top-level fields that differ from the input scene
    #[serde(default)]
    pub changes_applied: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CorrectionResult {
    pub fn applied(scene: Scene, changes: Vec<String>) -> Self {
        Self {
            success: true,
            corrected_scene: Some(scene),
            changes_applied: changes,
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            corrected_scene: None,
            changes_applied: Vec::new(),
            error: Some(error.into()),
        }
    }
}
