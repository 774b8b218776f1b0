//! Cover generation against the Gemini `generateContent` API.

use anyhow::{Context, Result};
use async_trait::async_trait;
use base64::Engine as _;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

use crate::error::{CoverError, CoverResult};
use crate::frame::CapturedFrame;
use crate::presets::StylePreset;

pub const COVER_ASPECT_RATIO: &str = "9:16";
pub const DEFAULT_TITLE: &str = "MUSE";

/// The cover instruction sent alongside the frame. A blank title falls back
/// to `default_title`; any other title and the style prompt go in verbatim.
pub fn build_instruction(title: &str, default_title: &str, preset: &StylePreset) -> String {
    let title = if title.trim().is_empty() { default_title } else { title };
    format!(
        "RECONSTRUCT AS A HIGH-END {ratio} COVER.\n\
         MANDATORY: USE FULL COLOR, VIBRANT SATURATION, NO GRAYSCALE.\n\
         TITLE: \"{title}\" in elegant typography.\n\
         STYLE: {style}.\n\
         Keep the subject person identical but professionally edited.",
        ratio = COVER_ASPECT_RATIO,
        title = title,
        style = preset.prompt,
    )
}

/// Everything one generation call sends.
#[derive(Debug, Clone, PartialEq)]
pub struct CoverRequest {
    pub model: String,
    pub image_mime_type: String,
    /// Base64 of the frame bytes
    pub image_data: String,
    pub instruction: String,
    pub aspect_ratio: String,
}

impl CoverRequest {
    /// Wire body for `models/{model}:generateContent`.
    pub fn to_wire(&self) -> GenerateContentRequest {
        GenerateContentRequest {
            contents: vec![Content {
                role: None,
                parts: vec![
                    Part::image(&self.image_mime_type, &self.image_data),
                    Part::text(&self.instruction),
                ],
            }],
            generation_config: GenerationConfig {
                image_config: ImageConfig { aspect_ratio: self.aspect_ratio.clone() },
            },
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    pub contents: Vec<Content>,
    pub generation_config: GenerationConfig,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    pub image_config: ImageConfig,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageConfig {
    pub aspect_ratio: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default)]
    pub parts: Vec<Part>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inline_data: Option<InlineData>,
}

impl Part {
    pub fn text(text: &str) -> Self {
        Self { text: Some(text.to_string()), inline_data: None }
    }

    pub fn image(mime_type: &str, data: &str) -> Self {
        Self {
            text: None,
            inline_data: Some(InlineData { mime_type: mime_type.to_string(), data: data.to_string() }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InlineData {
    pub mime_type: String,
    /// Base64 payload
    pub data: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Candidate {
    #[serde(default)]
    pub content: Option<Content>,
}

impl GenerateContentResponse {
    /// The first inline-image part of the first candidate, in response order.
    pub fn first_inline_image(&self) -> Option<&InlineData> {
        self.candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .and_then(|content| content.parts.iter().find_map(|p| p.inline_data.as_ref()))
    }
}

/// Image bytes returned by the service, unmodified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationResult {
    pub bytes: Vec<u8>,
    pub mime_type: String,
}

impl GenerationResult {
    pub fn from_inline(data: &InlineData) -> CoverResult<Self> {
        let bytes = base64::engine::general_purpose::STANDARD
            .decode(data.data.trim())
            .map_err(|e| CoverError::generation(format!("invalid image payload: {}", e)))?;
        Ok(Self { bytes, mime_type: data.mime_type.clone() })
    }

    pub fn data_uri(&self) -> String {
        format!(
            "data:{};base64,{}",
            self.mime_type,
            base64::engine::general_purpose::STANDARD.encode(&self.bytes)
        )
    }

    /// Write the bytes verbatim; this is the download action.
    pub fn save(&self, path: &Path) -> Result<()> {
        fs::write(path, &self.bytes).with_context(|| format!("writing {}", path.display()))
    }
}

/// A service that turns a [`CoverRequest`] into a raw response.
#[async_trait]
pub trait ImageGenerator: Send + Sync {
    fn name(&self) -> &str;

    async fn generate(&self, request: &CoverRequest) -> Result<GenerateContentResponse>;
}

/// Gemini REST client.
pub struct GeminiClient {
    client: Client,
    api_key: String,
    base_url: String,
}

impl GeminiClient {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }
}

#[async_trait]
impl ImageGenerator for GeminiClient {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn generate(&self, request: &CoverRequest) -> Result<GenerateContentResponse> {
        let body = request.to_wire();

        debug!(model = %request.model, image_bytes = request.image_data.len(), "Sending request to Gemini");

        let response = self
            .client
            .post(format!("{}/models/{}:generateContent", self.base_url, request.model))
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .context("Gemini HTTP request failed")?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            anyhow::bail!("Gemini returned {}: {}", status, error_body);
        }

        response.json().await.context("Failed to parse Gemini response")
    }
}

/// Builds cover requests and maps responses to results.
#[derive(Clone)]
pub struct CoverDesigner {
    generator: Arc<dyn ImageGenerator>,
    model: String,
    default_title: String,
}

impl CoverDesigner {
    pub fn new(generator: Arc<dyn ImageGenerator>, model: impl Into<String>) -> Self {
        Self { generator, model: model.into(), default_title: DEFAULT_TITLE.to_string() }
    }

    pub fn with_default_title(mut self, title: impl Into<String>) -> Self {
        self.default_title = title.into();
        self
    }

    pub fn request_for(&self, frame: &CapturedFrame, title: &str, preset: &StylePreset) -> CoverRequest {
        CoverRequest {
            model: self.model.clone(),
            image_mime_type: frame.mime_type().to_string(),
            image_data: frame.to_base64(),
            instruction: build_instruction(title, &self.default_title, preset),
            aspect_ratio: COVER_ASPECT_RATIO.to_string(),
        }
    }

    /// Issue exactly one generation call. `None` as the frame is a no-op.
    pub async fn generate_cover(
        &self,
        frame: Option<&CapturedFrame>,
        title: &str,
        preset: &StylePreset,
    ) -> CoverResult<Option<GenerationResult>> {
        let Some(frame) = frame else {
            debug!("no captured frame; skipping generation");
            return Ok(None);
        };

        let request = self.request_for(frame, title, preset);
        let start = Instant::now();

        let response = self.generator.generate(&request).await.map_err(|e| {
            warn!(provider = self.generator.name(), error = %format!("{:#}", e), "generation call failed");
            CoverError::generation(format!("{:#}", e))
        })?;

        let inline = response.first_inline_image().ok_or_else(|| {
            warn!(provider = self.generator.name(), "response carried no image part");
            CoverError::generation("response contained no image part")
        })?;
        let result = GenerationResult::from_inline(inline)?;

        info!(
            style = %preset.id,
            mime = %result.mime_type,
            bytes = result.bytes.len(),
            latency_ms = start.elapsed().as_millis() as u64,
            "cover generated"
        );
        Ok(Some(result))
    }
}
