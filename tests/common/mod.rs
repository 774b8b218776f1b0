#![allow(dead_code)]

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use base64::Engine as _;
use image::{Rgb, RgbImage};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use vcover::{
    AppConfig, CoverRequest, CoverStudio, GenerateContentResponse, ImageGenerator, MediaDecoder, VideoMetadata,
};

/// Decoder that answers from a script and records what it was asked.
pub struct ScriptedDecoder {
    meta: Result<VideoMetadata, String>,
    decode_error: Option<String>,
    pub seeks: Mutex<Vec<f64>>,
    pub paths: Mutex<Vec<PathBuf>>,
}

impl ScriptedDecoder {
    pub fn video(duration: f64, width: u32, height: u32) -> Self {
        Self {
            meta: Ok(VideoMetadata { duration, width, height }),
            decode_error: None,
            seeks: Mutex::new(Vec::new()),
            paths: Mutex::new(Vec::new()),
        }
    }

    pub fn corrupt(reason: &str) -> Self {
        Self {
            meta: Err(reason.to_string()),
            decode_error: None,
            seeks: Mutex::new(Vec::new()),
            paths: Mutex::new(Vec::new()),
        }
    }

    pub fn failing_decode(mut self, reason: &str) -> Self {
        self.decode_error = Some(reason.to_string());
        self
    }

    pub fn seeks(&self) -> Vec<f64> {
        self.seeks.lock().unwrap().clone()
    }

    pub fn paths(&self) -> Vec<PathBuf> {
        self.paths.lock().unwrap().clone()
    }
}

impl MediaDecoder for ScriptedDecoder {
    fn probe(&self, path: &Path) -> Result<VideoMetadata> {
        assert!(path.exists(), "upload must be on disk while probing");
        self.paths.lock().unwrap().push(path.to_path_buf());
        self.meta.clone().map_err(|e| anyhow!(e))
    }

    fn decode_frame(&self, path: &Path, at_seconds: f64) -> Result<RgbImage> {
        assert!(path.exists(), "upload must be on disk while decoding");
        self.seeks.lock().unwrap().push(at_seconds);
        if let Some(reason) = &self.decode_error {
            return Err(anyhow!(reason.clone()));
        }
        let meta = self.meta.clone().map_err(|e| anyhow!(e))?;
        Ok(RgbImage::from_pixel(meta.width, meta.height, Rgb([200, 40, 90])))
    }
}

/// Generator that replays one canned outcome and records every request.
pub struct ScriptedGenerator {
    outcome: Result<GenerateContentResponse, String>,
    pub requests: Mutex<Vec<CoverRequest>>,
}

impl ScriptedGenerator {
    pub fn responding(response: serde_json::Value) -> Self {
        Self {
            outcome: Ok(serde_json::from_value(response).expect("valid response fixture")),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(reason: &str) -> Self {
        Self { outcome: Err(reason.to_string()), requests: Mutex::new(Vec::new()) }
    }

    pub fn requests(&self) -> Vec<CoverRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl ImageGenerator for ScriptedGenerator {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn generate(&self, request: &CoverRequest) -> Result<GenerateContentResponse> {
        self.requests.lock().unwrap().push(request.clone());
        self.outcome.clone().map_err(|e| anyhow!(e))
    }
}

pub fn b64(bytes: &[u8]) -> String {
    base64::engine::general_purpose::STANDARD.encode(bytes)
}

/// A small real PNG.
pub fn png_bytes() -> Vec<u8> {
    let img = RgbImage::from_pixel(9, 16, Rgb([10, 220, 250]));
    let mut out = std::io::Cursor::new(Vec::new());
    img.write_to(&mut out, image::ImageFormat::Png).unwrap();
    out.into_inner()
}

/// A response whose first candidate holds one inline image per payload,
/// preceded by a text part.
pub fn image_response<P: AsRef<[u8]>>(payloads: &[P]) -> serde_json::Value {
    let mut parts = vec![serde_json::json!({"text": "Here is your cover."})];
    for p in payloads {
        parts.push(serde_json::json!({"inlineData": {"mimeType": "image/png", "data": b64(p.as_ref())}}));
    }
    serde_json::json!({"candidates": [{"content": {"role": "model", "parts": parts}}]})
}

pub fn studio(decoder: Arc<ScriptedDecoder>, generator: Arc<ScriptedGenerator>) -> CoverStudio {
    CoverStudio::with_backends(AppConfig::default(), decoder, generator).unwrap()
}
