use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::CoverError;
use crate::generate::DEFAULT_TITLE;
use crate::presets::{StyleCatalog, StylePreset};

pub const CONFIG_FILE_NAME: &str = "vcover.json";

/// Environment variables checked for the generation API key, in order.
pub const API_KEY_VARS: &[&str] = &["API_KEY", "GEMINI_API_KEY"];

fn default_model() -> String {
    "gemini-2.5-flash-image".to_string()
}

fn default_api_base_url() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}

fn default_title() -> String {
    DEFAULT_TITLE.to_string()
}

fn default_output_name() -> String {
    "vcover-pro.png".to_string()
}

fn default_jpeg_quality() -> u8 {
    90
}

fn default_ffmpeg() -> String {
    "ffmpeg".to_string()
}

fn default_ffprobe() -> String {
    "ffprobe".to_string()
}

/// Application configuration. Every field is optional in the JSON file.
#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    /// Title used when the user leaves the title empty
    #[serde(default = "default_title")]
    pub default_title: String,
    /// File name of the downloaded cover
    #[serde(default = "default_output_name")]
    pub output_name: String,
    /// JPEG quality (1-100) of the captured frame
    #[serde(default = "default_jpeg_quality")]
    pub jpeg_quality: u8,
    #[serde(default = "default_ffmpeg")]
    pub ffmpeg_path: String,
    #[serde(default = "default_ffprobe")]
    pub ffprobe_path: String,
    /// Styles appended after the built-in ones
    #[serde(default, rename = "presets")]
    pub extra_presets: Vec<StylePreset>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            api_base_url: default_api_base_url(),
            default_title: default_title(),
            output_name: default_output_name(),
            jpeg_quality: default_jpeg_quality(),
            ffmpeg_path: default_ffmpeg(),
            ffprobe_path: default_ffprobe(),
            extra_presets: Vec::new(),
        }
    }
}

impl AppConfig {
    /// Parse and validate a JSON config document.
    pub fn from_json(text: &str) -> Result<Self> {
        let cfg: AppConfig = serde_json::from_str(text).context("parsing config json")?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn from_config_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).with_context(|| format!("reading config {}", path.display()))?;
        Self::from_json(&text).with_context(|| format!("loading config {}", path.display()))
    }

    /// Look for vcover.json in app data, then the current dir, then fall back
    /// to built-in defaults.
    pub fn load() -> Result<Self> {
        for p in config_search_paths() {
            if p.exists() {
                tracing::debug!(path = %p.display(), "loading config");
                return Self::from_config_file(&p);
            }
        }
        Ok(Self::default())
    }

    pub fn validate(&self) -> Result<()> {
        if !(1..=100).contains(&self.jpeg_quality) {
            return Err(anyhow!("jpeg_quality must be between 1 and 100, got {}", self.jpeg_quality));
        }
        if self.default_title.trim().is_empty() {
            return Err(anyhow!("default_title cannot be empty"));
        }
        if self.model.trim().is_empty() {
            return Err(anyhow!("model cannot be empty"));
        }
        self.catalog().map(|_| ())
    }

    /// Built-in styles plus any configured extras.
    pub fn catalog(&self) -> Result<StyleCatalog> {
        StyleCatalog::with_extra(&self.extra_presets)
    }
}

pub fn config_search_paths() -> Vec<PathBuf> {
    let mut tried: Vec<PathBuf> = Vec::new();
    if let Some(mut d) = dirs::data_dir() {
        d.push("vcover");
        d.push(CONFIG_FILE_NAME);
        tried.push(d);
    }
    tried.push(PathBuf::from(CONFIG_FILE_NAME));
    tried
}

/// Read the generation API key from the process environment.
pub fn api_key_from_env() -> Result<String, CoverError> {
    api_key_from(|name| std::env::var(name).ok())
}

pub(crate) fn api_key_from<F>(lookup: F) -> Result<String, CoverError>
where
    F: Fn(&str) -> Option<String>,
{
    API_KEY_VARS
        .iter()
        .filter_map(|name| lookup(name))
        .map(|v| v.trim().to_string())
        .find(|v| !v.is_empty())
        .ok_or(CoverError::MissingApiKey)
}
