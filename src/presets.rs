use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};

/// A named visual style applied to the generated cover.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StylePreset {
    pub id: String,
    pub name: String,
    pub thumbnail: String,
    pub prompt: String,
}

/// Built-in entry of the style table. Kept as plain `&'static str` data so the
/// table can live in a `const`.
#[derive(Debug, Clone, Copy)]
pub struct BuiltinStyle {
    pub id: &'static str,
    pub name: &'static str,
    pub thumbnail: &'static str,
    pub prompt: &'static str,
}

impl BuiltinStyle {
    pub fn to_preset(&self) -> StylePreset {
        StylePreset {
            id: self.id.to_string(),
            name: self.name.to_string(),
            thumbnail: self.thumbnail.to_string(),
            prompt: self.prompt.to_string(),
        }
    }
}

pub const STYLE_PRESETS: &[BuiltinStyle] = &[
    BuiltinStyle {
        id: "VOGUE",
        name: "时尚画报",
        thumbnail: "https://images.unsplash.com/photo-1515886657613-9f3515b0c78f?q=80&w=400&h=600&auto=format&fit=crop",
        prompt: "Professional fashion magazine cover, vibrant studio lighting, high saturation, elegant serif fonts, Vogue aesthetic, sharp colors.",
    },
    BuiltinStyle {
        id: "CYBER",
        name: "霓虹幻想",
        thumbnail: "https://images.unsplash.com/photo-1550745165-9bc0b252726f?q=80&w=400&h=600&auto=format&fit=crop",
        prompt: "Vibrant cyberpunk neon, glowing typography, saturated electric blues and pinks, futuristic energy, ultra-vivid colors.",
    },
    BuiltinStyle {
        id: "CINEMA",
        name: "电影质感",
        thumbnail: "https://images.unsplash.com/photo-1485846234645-a62644f84728?q=80&w=400&h=600&auto=format&fit=crop",
        prompt: "Cinematic Hollywood poster, rich warm tones, dramatic vibrant lighting, classic movie titling, high dynamic range.",
    },
    BuiltinStyle {
        id: "LUXURY",
        name: "高级静奢",
        thumbnail: "https://images.unsplash.com/photo-1544450181-29597f6ee557?q=80&w=400&h=600&auto=format&fit=crop",
        prompt: "Luxury brand aesthetic, clean layout with golden accents, premium materials, high-end commercial photography.",
    },
];

pub fn find_builtin_style(id: &str) -> Option<&'static BuiltinStyle> {
    STYLE_PRESETS.iter().find(|style| style.id.eq_ignore_ascii_case(id))
}

/// The style catalog: the built-in table, optionally extended from config.
#[derive(Debug, Clone)]
pub struct StyleCatalog {
    presets: Vec<StylePreset>,
}

impl StyleCatalog {
    /// Catalog with only the built-in styles.
    pub fn builtin() -> Self {
        Self { presets: STYLE_PRESETS.iter().map(BuiltinStyle::to_preset).collect() }
    }

    /// Built-in styles followed by `extra`, in order.
    pub fn with_extra(extra: &[StylePreset]) -> Result<Self> {
        let mut catalog = Self::builtin();
        for preset in extra {
            if preset.id.trim().is_empty() {
                return Err(anyhow!("style preset ids cannot be empty"));
            }
            if catalog.find(&preset.id).is_some() {
                return Err(anyhow!("style preset '{}' is defined more than once", preset.id));
            }
            catalog.presets.push(preset.clone());
        }
        Ok(catalog)
    }

    pub fn presets(&self) -> &[StylePreset] {
        &self.presets
    }

    /// The first entry, used when nothing else is selected.
    pub fn default_preset(&self) -> &StylePreset {
        &self.presets[0]
    }

    pub fn find(&self, id: &str) -> Option<&StylePreset> {
        self.presets.iter().find(|preset| preset.id.eq_ignore_ascii_case(id.trim()))
    }

    /// Resolves an optional id to a preset, falling back to the default.
    pub fn resolve(&self, id: Option<&str>) -> Result<&StylePreset> {
        match id {
            None => Ok(self.default_preset()),
            Some(id) => self.find(id).ok_or_else(|| {
                let available = self.presets.iter().map(|p| p.id.as_str()).collect::<Vec<_>>().join(", ");
                anyhow!("Unknown style '{}'. Available styles: {}", id, available)
            }),
        }
    }
}

impl Default for StyleCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}
