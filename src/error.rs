//! Error types for frame capture and cover generation.

use thiserror::Error;

/// Message shown when a video cannot be decoded.
pub const UNSUPPORTED_FORMAT_MESSAGE: &str = "视频格式不支持";

/// Message shown when the generation service gives nothing usable back.
pub const GENERATION_FAILED_MESSAGE: &str = "AI 暂时休息了，请稍后重试";

/// Errors surfaced by the two user-facing operations.
#[derive(Debug, Error)]
pub enum CoverError {
    /// The upload could not be probed, seeked or decoded.
    #[error("unsupported video format: {reason}")]
    UnsupportedFormat { reason: String },

    /// The generation call failed or returned no image part.
    #[error("cover generation failed: {reason}")]
    GenerationFailed { reason: String },

    /// Neither `API_KEY` nor `GEMINI_API_KEY` is set.
    #[error("no API key found; set API_KEY or GEMINI_API_KEY")]
    MissingApiKey,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl CoverError {
    pub fn unsupported(reason: impl Into<String>) -> Self {
        Self::UnsupportedFormat { reason: reason.into() }
    }

    pub fn generation(reason: impl Into<String>) -> Self {
        Self::GenerationFailed { reason: reason.into() }
    }

    /// The fixed, human-readable message for the UI. Internal details stay in
    /// the `Display` output and the logs.
    pub fn user_message(&self) -> String {
        match self {
            Self::UnsupportedFormat { .. } => UNSUPPORTED_FORMAT_MESSAGE.to_string(),
            Self::GenerationFailed { .. } => GENERATION_FAILED_MESSAGE.to_string(),
            other => other.to_string(),
        }
    }
}

pub type CoverResult<T> = std::result::Result<T, CoverError>;
