//! # vcover - AI video cover designer
//!
//! `vcover` captures a still from a video and asks an image-generation model
//! to redesign it as a 9:16 cover in one of a few styles.
//!
//! ## Features
//!
//! - Capture one frame at a quarter of the video's duration (ffmpeg)
//! - Built-in style catalog, extendable from config
//! - One-shot cover generation through the Gemini `generateContent` API
//! - A session record with explicit transitions for UI integration
//!
//! ## Example
//!
//! ```no_run
//! use vcover::{AppConfig, CoverStudio};
//! use std::path::Path;
//!
//! # async fn run() -> anyhow::Result<()> {
//! let studio = CoverStudio::from_config(AppConfig::default(), "my-api-key")?;
//! let mut session = studio.new_session();
//!
//! let video = std::fs::read("clip.mp4")?;
//! session.upload(studio.extractor(), video).await?;
//! session.select_preset("CYBER");
//! session.set_title("GLOW");
//! session.generate(studio.designer()).await?;
//!
//! if let Some(cover) = session.result() {
//!     cover.save(Path::new("vcover-pro.png"))?;
//! }
//! # Ok(())
//! # }
//! ```

use anyhow::Result;
use std::sync::Arc;

pub mod config;
pub mod error;
pub mod frame;
pub mod generate;
pub mod presets;
pub mod session;

pub use config::{api_key_from_env, AppConfig};
pub use error::{CoverError, CoverResult};
pub use frame::{seek_point, CapturedFrame, FfmpegDecoder, FrameExtractor, MediaDecoder, VideoMetadata};
pub use generate::{
    build_instruction, CoverDesigner, CoverRequest, GeminiClient, GenerateContentResponse, GenerationResult,
    ImageGenerator, InlineData,
};
pub use presets::{StyleCatalog, StylePreset, STYLE_PRESETS};
pub use session::{CoverSession, DisplayImage, Ticket};

/// Wires the configured backends together.
pub struct CoverStudio {
    config: AppConfig,
    catalog: StyleCatalog,
    extractor: FrameExtractor,
    designer: CoverDesigner,
}

impl CoverStudio {
    /// ffmpeg for decoding and Gemini for generation.
    pub fn from_config(config: AppConfig, api_key: impl Into<String>) -> Result<Self> {
        let decoder = FfmpegDecoder::with_commands(&config.ffmpeg_path, &config.ffprobe_path);
        let generator = GeminiClient::new(api_key).with_base_url(&config.api_base_url);
        Self::with_backends(config, Arc::new(decoder), Arc::new(generator))
    }

    /// Use custom backends, e.g. in tests or another UI host.
    pub fn with_backends(
        config: AppConfig,
        decoder: Arc<dyn MediaDecoder>,
        generator: Arc<dyn ImageGenerator>,
    ) -> Result<Self> {
        config.validate()?;
        let catalog = config.catalog()?;
        let extractor = FrameExtractor::new(decoder).with_jpeg_quality(config.jpeg_quality);
        let designer = CoverDesigner::new(generator, &config.model).with_default_title(&config.default_title);
        Ok(Self { config, catalog, extractor, designer })
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn catalog(&self) -> &StyleCatalog {
        &self.catalog
    }

    pub fn extractor(&self) -> &FrameExtractor {
        &self.extractor
    }

    pub fn designer(&self) -> &CoverDesigner {
        &self.designer
    }

    /// A fresh session over this studio's catalog.
    pub fn new_session(&self) -> CoverSession {
        CoverSession::new(self.catalog.clone())
    }
}
