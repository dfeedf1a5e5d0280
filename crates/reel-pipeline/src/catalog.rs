//! Constraint catalog: closed vocabularies and presets.
//!
//! Read by the prompt builders (to tell the model what it may use) and by
//! the validator (to enforce it). Everything here is static.

use reel_models::{Background, Motion, Palette, SceneType, Typography};

/// Effects each shot type may use, in order of preference.
pub fn allowed_effects(shot_type: SceneType) -> &'static [&'static str] {
    match shot_type {
        SceneType::Hook => &["kinetic_type", "zoom_punch", "glitch_reveal", "split_reveal"],
        SceneType::Problem => &["desaturate", "shake", "slow_push", "red_flash"],
        SceneType::Solution => &["light_sweep", "slide_reveal", "scale_in", "glow_pulse"],
        SceneType::Feature => &["slide_reveal", "highlight_box", "parallax", "scale_in"],
        SceneType::Proof => &["counter_roll", "stagger_in", "star_burst", "fade_up"],
        SceneType::Cta => &["pulse", "scale_in", "shine", "bounce"],
        SceneType::Unknown => &[],
    }
}

/// Fonts recommended when the model gives none.
pub fn default_fonts(shot_type: SceneType) -> &'static [&'static str] {
    match shot_type {
        SceneType::Hook => &["Inter Display", "Montserrat"],
        SceneType::Problem => &["Inter", "IBM Plex Sans"],
        SceneType::Solution => &["Inter", "Manrope"],
        SceneType::Feature => &["Manrope", "Inter"],
        SceneType::Proof => &["IBM Plex Sans", "Inter"],
        SceneType::Cta => &["Montserrat", "Inter Display"],
        SceneType::Unknown => &["Inter"],
    }
}

pub const ENTRY_ANIMATIONS: &[&str] = &[
    "fade_in",
    "slide_up",
    "slide_left",
    "scale_in",
    "blur_in",
    "kinetic_slam",
];

pub const EXIT_ANIMATIONS: &[&str] = &["fade_out", "slide_down", "scale_out", "blur_out"];

pub const HOLD_ANIMATIONS: &[&str] = &["gentle_float", "subtle_zoom", "pulse", "none"];

pub const LAYOUTS: &[&str] = &[
    "TEXT_CENTER",
    "TEXT_LEFT",
    "TEXT_BOTTOM",
    "SPLIT_LEFT",
    "SPLIT_RIGHT",
    "IMAGE_HERO",
    "IMAGE_GRID",
    "FULL_BLEED",
];

/// Motion used when a scene arrives without one.
pub fn default_motion(scene_type: Option<SceneType>) -> Motion {
    let (entry, exit, hold) = match scene_type {
        Some(SceneType::Hook) => ("kinetic_slam", "fade_out", "subtle_zoom"),
        Some(SceneType::Problem) => ("fade_in", "fade_out", "subtle_zoom"),
        Some(SceneType::Solution) => ("slide_up", "fade_out", "gentle_float"),
        Some(SceneType::Feature) => ("slide_left", "slide_down", "gentle_float"),
        Some(SceneType::Proof) => ("scale_in", "fade_out", "none"),
        Some(SceneType::Cta) => ("scale_in", "fade_out", "pulse"),
        _ => ("fade_in", "fade_out", "gentle_float"),
    };
    Motion {
        entry: entry.to_string(),
        exit: exit.to_string(),
        hold: Some(hold.to_string()),
        entry_frames: Some(12),
        exit_frames: Some(10),
    }
}

/// A visual theme ("design pack") the art director picks from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThemePreset {
    pub id: &'static str,
    pub name: &'static str,
    pub mood: &'static str,
    pub primary: &'static str,
    pub secondary: &'static str,
    pub accent: &'static str,
    pub background_colors: [&'static str; 2],
    pub background_angle: f32,
    /// (kind, opacity)
    pub texture: Option<(&'static str, f32)>,
    pub font_family: &'static str,
    pub headline_weight: u16,
    pub text_color: &'static str,
    /// Lowercase words/phrases that select this theme
    pub industry_keywords: &'static [&'static str],
}

impl ThemePreset {
    pub fn palette(&self) -> Palette {
        Palette {
            primary: self.primary.to_string(),
            secondary: self.secondary.to_string(),
            accent: self.accent.to_string(),
        }
    }

    pub fn background(&self) -> Background {
        let background = Background::gradient(self.background_colors, Some(self.background_angle));
        match self.texture {
            Some((kind, opacity)) => background.with_texture(kind, opacity),
            None => background,
        }
    }

    pub fn typography(&self) -> Typography {
        Typography {
            font_family: self.font_family.to_string(),
            headline_weight: self.headline_weight,
            color: Some(self.text_color.to_string()),
            ..Typography::default()
        }
    }
}

pub const DEFAULT_THEME_ID: &str = "clean_saas";

pub const THEME_PRESETS: &[ThemePreset] = &[
    ThemePreset {
        id: "clean_saas",
        name: "Clean SaaS",
        mood: "calm, professional, trustworthy",
        primary: "#2563EB",
        secondary: "#0F172A",
        accent: "#22C55E",
        background_colors: ["#F8FAFC", "#E2E8F0"],
        background_angle: 160.0,
        texture: None,
        font_family: "Inter",
        headline_weight: 700,
        text_color: "#0F172A",
        industry_keywords: &[
            "saas",
            "software",
            "project management",
            "productivity",
            "b2b",
            "crm",
            "dashboard",
            "workflow",
            "team",
            "app",
        ],
    },
    ThemePreset {
        id: "midnight_tech",
        name: "Midnight Tech",
        mood: "confident, futuristic",
        primary: "#6366F1",
        secondary: "#0EA5E9",
        accent: "#F472B6",
        background_colors: ["#0B1020", "#1E1B4B"],
        background_angle: 200.0,
        texture: Some(("grain", 0.05)),
        font_family: "Inter Display",
        headline_weight: 800,
        text_color: "#F8FAFC",
        industry_keywords: &[
            "ai", "developer", "developers", "crypto", "security", "cloud", "api", "gaming", "devtools",
        ],
    },
    ThemePreset {
        id: "warm_lifestyle",
        name: "Warm Lifestyle",
        mood: "warm, inviting",
        primary: "#EA580C",
        secondary: "#7C2D12",
        accent: "#FACC15",
        background_colors: ["#FFF7ED", "#FED7AA"],
        background_angle: 135.0,
        texture: Some(("paper", 0.06)),
        font_family: "DM Serif Display",
        headline_weight: 600,
        text_color: "#431407",
        industry_keywords: &[
            "food", "coffee", "restaurant", "home", "travel", "family", "pet", "bakery", "recipe",
        ],
    },
    ThemePreset {
        id: "bold_retail",
        name: "Bold Retail",
        mood: "energetic, urgent",
        primary: "#DC2626",
        secondary: "#111827",
        accent: "#FBBF24",
        background_colors: ["#111827", "#1F2937"],
        background_angle: 180.0,
        texture: None,
        font_family: "Montserrat",
        headline_weight: 900,
        text_color: "#FFFFFF",
        industry_keywords: &[
            "sale", "retail", "sneaker", "sneakers", "fashion", "ecommerce", "store", "fitness", "gym",
        ],
    },
    ThemePreset {
        id: "luxury_minimal",
        name: "Luxury Minimal",
        mood: "elegant, exclusive",
        primary: "#D4AF37",
        secondary: "#0A0A0A",
        accent: "#F5F5F4",
        background_colors: ["#0A0A0A", "#1C1917"],
        background_angle: 180.0,
        texture: Some(("grain", 0.03)),
        font_family: "Playfair Display",
        headline_weight: 500,
        text_color: "#F5F5F4",
        industry_keywords: &["luxury", "jewelry", "watch", "watches", "perfume", "hotel", "boutique"],
    },
    ThemePreset {
        id: "health_fresh",
        name: "Health Fresh",
        mood: "fresh, reassuring",
        primary: "#10B981",
        secondary: "#064E3B",
        accent: "#38BDF8",
        background_colors: ["#ECFDF5", "#D1FAE5"],
        background_angle: 150.0,
        texture: None,
        font_family: "Nunito",
        headline_weight: 700,
        text_color: "#064E3B",
        industry_keywords: &[
            "health", "wellness", "medical", "clinic", "organic", "skincare", "meditation", "sleep",
        ],
    },
];

/// Look up a theme by id (case-insensitive).
pub fn find_theme(id: &str) -> Option<&'static ThemePreset> {
    let id = id.trim();
    THEME_PRESETS.iter().find(|t| t.id.eq_ignore_ascii_case(id))
}

pub fn default_theme() -> &'static ThemePreset {
    find_theme(DEFAULT_THEME_ID).unwrap_or(&THEME_PRESETS[0])
}

/// Pick the theme whose industry keywords best match `text`.
///
/// Matches whole words/phrases only; ties keep catalog order. Falls back to
/// the default theme when nothing matches.
pub fn theme_for_industry(text: &str) -> &'static ThemePreset {
    let normalized: String = text
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect();
    let padded = format!(" {} ", normalized.split_whitespace().collect::<Vec<_>>().join(" "));

    let mut best: Option<(&'static ThemePreset, usize)> = None;
    for theme in THEME_PRESETS {
        let hits = theme
            .industry_keywords
            .iter()
            .filter(|kw| padded.contains(&format!(" {} ", kw)))
            .count();
        if hits > 0 && best.map_or(true, |(_, b)| hits > b) {
            best = Some((theme, hits));
        }
    }

    best.map(|(theme, _)| theme).unwrap_or_else(default_theme)
}

/// Normalize a model-authored effect name: `"Zoom-Punch "` -> `"zoom_punch"`.
pub fn normalize_effect(effect: &str) -> String {
    effect
        .trim()
        .to_lowercase()
        .replace(['-', ' '], "_")
}
