//! Renderable video specification.
//!
//! The JSON shape (camelCase keys, `type`-tagged unions) is what the external
//! renderer consumes. Fields the renderer needs (background, typography,
//! motion) are optional here so that a model response missing them still
//! parses and can be reported by the validator instead of failing serde.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::input::{DEFAULT_FPS, DEFAULT_HEIGHT, DEFAULT_WIDTH};
use crate::strategy::{ArtDirection, MarketingStrategy};

/// Default scene length when the model omits it (3s at 30fps).
pub const DEFAULT_SCENE_FRAMES: u32 = 90;

/// Marketing role of a scene. Closed vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum SceneType {
    Hook,
    Problem,
    Solution,
    Feature,
    Proof,
    Cta,
    /// Anything outside the vocabulary; flagged by the validator
    #[serde(other)]
    Unknown,
}

impl SceneType {
    pub const ALL: [SceneType; 6] = [
        SceneType::Hook,
        SceneType::Problem,
        SceneType::Solution,
        SceneType::Feature,
        SceneType::Proof,
        SceneType::Cta,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SceneType::Hook => "hook",
            SceneType::Problem => "problem",
            SceneType::Solution => "solution",
            SceneType::Feature => "feature",
            SceneType::Proof => "proof",
            SceneType::Cta => "cta",
            SceneType::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for SceneType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for SceneType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "hook" => Ok(SceneType::Hook),
            "problem" => Ok(SceneType::Problem),
            "solution" => Ok(SceneType::Solution),
            "feature" => Ok(SceneType::Feature),
            "proof" => Ok(SceneType::Proof),
            "cta" => Ok(SceneType::Cta),
            other => Err(format!("unknown scene type: {}", other)),
        }
    }
}

/// Layout of text and media inside the frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LayoutTag {
    TextCenter,
    TextLeft,
    TextBottom,
    SplitLeft,
    SplitRight,
    ImageHero,
    ImageGrid,
    FullBleed,
    #[serde(other)]
    Other,
}

/// Fill part of a background, tagged by `type`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum BackgroundFill {
    Solid {
        color: String,
    },
    Gradient {
        colors: Vec<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        angle: Option<f32>,
    },
    Mesh {
        colors: Vec<String>,
    },
}

impl BackgroundFill {
    pub fn kind(&self) -> &'static str {
        match self {
            BackgroundFill::Solid { .. } => "solid",
            BackgroundFill::Gradient { .. } => "gradient",
            BackgroundFill::Mesh { .. } => "mesh",
        }
    }
}

/// Overlay texture (grain, noise, paper...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Texture {
    pub kind: String,
    /// 0.0 - 1.0
    pub opacity: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Background {
    #[serde(flatten)]
    pub fill: BackgroundFill,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub texture: Option<Texture>,
}

impl Background {
    pub fn solid(color: impl Into<String>) -> Self {
        Self {
            fill: BackgroundFill::Solid {
                color: color.into(),
            },
            texture: None,
        }
    }

    pub fn gradient<I, S>(colors: I, angle: Option<f32>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            fill: BackgroundFill::Gradient {
                colors: colors.into_iter().map(Into::into).collect(),
                angle,
            },
            texture: None,
        }
    }

    pub fn with_texture(mut self, kind: impl Into<String>, opacity: f32) -> Self {
        self.texture = Some(Texture {
            kind: kind.into(),
            opacity,
        });
        self
    }
}

fn default_font_family() -> String {
    "Inter".to_string()
}

fn default_headline_size() -> u32 {
    72
}

fn default_headline_weight() -> u16 {
    700
}

fn default_subtext_size() -> u32 {
    36
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Typography {
    #[serde(default = "default_font_family")]
    pub font_family: String,
    #[serde(default = "default_headline_size")]
    pub headline_size: u32,
    #[serde(default = "default_headline_weight")]
    pub headline_weight: u16,
    #[serde(default = "default_subtext_size")]
    pub subtext_size: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtext_weight: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub letter_spacing: Option<f32>,
}

impl Default for Typography {
    fn default() -> Self {
        Self {
            font_family: default_font_family(),
            headline_size: default_headline_size(),
            headline_weight: default_headline_weight(),
            subtext_size: default_subtext_size(),
            subtext_weight: None,
            color: None,
            letter_spacing: None,
        }
    }
}

/// Entry/exit/hold animation tags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Motion {
    pub entry: String,
    pub exit: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hold: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entry_frames: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exit_frames: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Position {
    pub x: f32,
    pub y: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum ImageRole {
    Hero,
    Product,
    Logo,
    Background,
    Inset,
    Avatar,
    #[default]
    #[serde(other)]
    Other,
}

/// Normalized (0.0 - 1.0) placement in the frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ImagePlacement {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub corner_radius: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shadow: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ImageAnimation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<Position>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<Position>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_scale: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_scale: Option<f32>,
}

impl ImageAnimation {
    /// Both positions are set and differ, so the renderer has to tween.
    pub fn needs_interpolation(&self) -> bool {
        matches!((self.start, self.end), (Some(a), Some(b)) if a != b)
    }
}

/// Reference into the caller-provided image set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ImageRef {
    #[serde(default)]
    pub image_id: Option<String>,
    #[serde(default)]
    pub role: ImageRole,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placement: Option<ImagePlacement>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub animation: Option<ImageAnimation>,
}

impl ImageRef {
    pub fn new(image_id: impl Into<String>, role: ImageRole) -> Self {
        Self {
            image_id: Some(image_id.into()),
            role,
            placement: None,
            animation: None,
        }
    }
}

/// Content element inside a scene or beat, tagged by `type`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SceneElement {
    Text {
        content: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        size: Option<u32>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        weight: Option<u16>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        color: Option<String>,
    },
    Badge {
        label: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        color: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        icon: Option<String>,
    },
    Image(ImageRef),
    Shape {
        shape: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        color: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        size: Option<f32>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        position: Option<Position>,
    },
}

/// Timed overlay inside a scene; frames are relative to the scene start.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Beat {
    #[serde(default)]
    pub start_frame: Option<i64>,
    #[serde(default)]
    pub duration_frames: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub elements: Vec<SceneElement>,
    /// Set when a beat deliberately runs past the scene end
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub allow_overflow: bool,
}

impl Beat {
    pub fn new(start_frame: i64, duration_frames: i64) -> Self {
        Self {
            start_frame: Some(start_frame),
            duration_frames: Some(duration_frames),
            text: None,
            elements: Vec::new(),
            allow_overflow: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Accent {
    pub color: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Transition {
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_frames: Option<u32>,
}

fn default_scene_frames() -> u32 {
    DEFAULT_SCENE_FRAMES
}

/// One timed segment of the output video.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Scene {
    #[serde(default)]
    pub scene_type: Option<SceneType>,
    #[serde(default)]
    pub headline: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtext: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layout: Option<LayoutTag>,
    #[serde(default)]
    pub background: Option<Background>,
    #[serde(default)]
    pub typography: Option<Typography>,
    #[serde(default)]
    pub motion: Option<Motion>,
    #[serde(default = "default_scene_frames", alias = "durationInFrames")]
    pub duration_frames: u32,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub beats: Vec<Beat>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub images: Vec<ImageRef>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub elements: Vec<SceneElement>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accent: Option<Accent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transition: Option<Transition>,
}

impl Scene {
    /// Bare scene of the given type, useful as a starting point.
    pub fn new(scene_type: SceneType, headline: impl Into<String>) -> Self {
        Self {
            scene_type: Some(scene_type),
            headline: Some(headline.into()),
            subtext: None,
            layout: None,
            background: None,
            typography: None,
            motion: None,
            duration_frames: DEFAULT_SCENE_FRAMES,
            beats: Vec::new(),
            images: Vec::new(),
            elements: Vec::new(),
            accent: None,
            transition: None,
        }
    }

    /// All image references in the scene: `images`, image elements, and
    /// image elements nested in beats.
    pub fn image_refs(&self) -> impl Iterator<Item = &ImageRef> {
        let element_images = self
            .elements
            .iter()
            .chain(self.beats.iter().flat_map(|b| b.elements.iter()))
            .filter_map(|el| match el {
                SceneElement::Image(image) => Some(image),
                _ => None,
            });
        self.images.iter().chain(element_images)
    }

    /// Image ids referenced anywhere in the scene.
    pub fn image_ids(&self) -> impl Iterator<Item = &str> {
        self.image_refs().filter_map(|r| r.image_id.as_deref())
    }
}

fn default_fps() -> u32 {
    DEFAULT_FPS
}

fn default_width() -> u32 {
    DEFAULT_WIDTH
}

fn default_height() -> u32 {
    DEFAULT_HEIGHT
}

/// The unit of external delivery.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct VideoSpec {
    #[serde(default = "default_fps")]
    pub fps: u32,
    #[serde(default = "default_width")]
    pub width: u32,
    #[serde(default = "default_height")]
    pub height: u32,
    #[serde(default)]
    pub scenes: Vec<Scene>,
    /// Strategy echo for traceability
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strategy: Option<MarketingStrategy>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub art_direction: Option<ArtDirection>,
}

impl VideoSpec {
    pub fn new(fps: u32, width: u32, height: u32, scenes: Vec<Scene>) -> Self {
        Self {
            fps,
            width,
            height,
            scenes,
            strategy: None,
            art_direction: None,
        }
    }

    pub fn total_frames(&self) -> u64 {
        self.scenes.iter().map(|s| s.duration_frames as u64).sum()
    }

    pub fn duration_secs(&self) -> f64 {
        if self.fps == 0 {
            return 0.0;
        }
        self.total_frames() as f64 / self.fps as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_background_flattened_tag() {
        let bg: Background = serde_json::from_str(
            r##"{"type":"gradient","colors":["#000","#111"],"angle":135,"texture":{"kind":"grain","opacity":0.05}}"##,
        )
        .unwrap();
        assert_eq!(bg.fill.kind(), "gradient");
        assert_eq!(bg.texture.as_ref().unwrap().kind, "grain");

        let json = serde_json::to_value(&bg).unwrap();
        assert_eq!(json["type"], "gradient");
        assert_eq!(json["texture"]["kind"], "grain");
    }

    #[test]
    fn test_scene_missing_visual_fields_still_parses() {
        let scene: Scene =
            serde_json::from_str(r#"{"sceneType":"hook","headline":"Stop juggling tabs"}"#).unwrap();
        assert_eq!(scene.scene_type, Some(SceneType::Hook));
        assert!(scene.background.is_none());
        assert!(scene.typography.is_none());
        assert!(scene.motion.is_none());
        assert_eq!(scene.duration_frames, DEFAULT_SCENE_FRAMES);
    }

    #[test]
    fn test_unknown_scene_type_and_layout() {
        let scene: Scene =
            serde_json::from_str(r#"{"sceneType":"montage","layout":"DIAGONAL"}"#).unwrap();
        assert_eq!(scene.scene_type, Some(SceneType::Unknown));
        assert_eq!(scene.layout, Some(LayoutTag::Other));
    }

    #[test]
    fn test_layout_serializes_screaming_case() {
        let json = serde_json::to_string(&LayoutTag::TextCenter).unwrap();
        assert_eq!(json, "\"TEXT_CENTER\"");
    }

    #[test]
    fn test_image_ids_cover_elements_and_beats() {
        let mut scene = Scene::new(SceneType::Solution, "One board");
        scene.images.push(ImageRef::new("hero", ImageRole::Hero));
        scene
            .elements
            .push(SceneElement::Image(ImageRef::new("logo", ImageRole::Logo)));
        let mut beat = Beat::new(10, 20);
        beat.elements
            .push(SceneElement::Image(ImageRef::new("shot", ImageRole::Inset)));
        scene.beats.push(beat);

        let ids: Vec<&str> = scene.image_ids().collect();
        assert_eq!(ids, vec!["hero", "logo", "shot"]);
    }

    #[test]
    fn test_element_tagging() {
        let el: SceneElement =
            serde_json::from_str(r#"{"type":"image","imageId":"p1","role":"product"}"#).unwrap();
        match el {
            SceneElement::Image(r) => {
                assert_eq!(r.image_id.as_deref(), Some("p1"));
                assert_eq!(r.role, ImageRole::Product);
            }
            other => panic!("Expected image element, got {:?}", other),
        }
    }

    #[test]
    fn test_animation_interpolation() {
        let anim = ImageAnimation {
            kind: Some("slide".into()),
            start: Some(Position { x: 0.0, y: 0.5 }),
            end: Some(Position { x: 0.5, y: 0.5 }),
            start_scale: None,
            end_scale: None,
        };
        assert!(anim.needs_interpolation());

        let still = ImageAnimation {
            end: Some(Position { x: 0.0, y: 0.5 }),
            ..anim
        };
        assert!(!still.needs_interpolation());
    }

    #[test]
    fn test_spec_duration() {
        let spec = VideoSpec::new(
            30,
            1080,
            1920,
            vec![Scene::new(SceneType::Hook, "a"), Scene::new(SceneType::Cta, "b")],
        );
        assert_eq!(spec.total_frames(), 180);
        assert!((spec.duration_secs() - 6.0).abs() < f64::EPSILON);
    }
}
