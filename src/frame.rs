//! Single-frame capture from an uploaded video.
//!
//! The upload is written to a temporary file, probed for its duration and
//! native size, and one frame is decoded at a quarter of the duration. That
//! frame is re-encoded as JPEG and handed back as a [`CapturedFrame`].

use anyhow::{anyhow, Context, Result};
use base64::Engine as _;
use image::codecs::jpeg::JpegEncoder;
use image::{ImageFormat, RgbImage};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command as ProcCommand;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{debug, info, warn};

use crate::error::{CoverError, CoverResult};

pub const FRAME_MIME_TYPE: &str = "image/jpeg";
pub const DEFAULT_JPEG_QUALITY: u8 = 90;

/// Metadata needed to pick and decode the capture point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VideoMetadata {
    /// Duration in seconds
    pub duration: f64,
    pub width: u32,
    pub height: u32,
}

/// The sampling point for a video of `duration` seconds: a quarter of the
/// way in, which skips black intro frames. Unknown durations seek to 0.
pub fn seek_point(duration: f64) -> f64 {
    if duration.is_finite() && duration > 0.0 {
        duration / 4.0
    } else {
        0.0
    }
}

/// Backend that can read video metadata and decode one frame.
pub trait MediaDecoder: Send + Sync {
    fn probe(&self, path: &Path) -> Result<VideoMetadata>;

    /// Decode the frame shown at `at_seconds`, at the video's native size.
    fn decode_frame(&self, path: &Path, at_seconds: f64) -> Result<RgbImage>;
}

/// A JPEG still captured from a video.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedFrame {
    pub bytes: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

impl CapturedFrame {
    pub fn mime_type(&self) -> &'static str {
        FRAME_MIME_TYPE
    }

    pub fn to_base64(&self) -> String {
        base64::engine::general_purpose::STANDARD.encode(&self.bytes)
    }

    /// `data:image/jpeg;base64,...`
    pub fn data_uri(&self) -> String {
        format!("data:{};base64,{}", FRAME_MIME_TYPE, self.to_base64())
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        fs::write(path, &self.bytes).with_context(|| format!("writing {}", path.display()))
    }
}

static UPLOAD_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Temporary file holding the uploaded bytes while they are decoded.
/// Removed when dropped, on every exit path.
pub struct TempVideo {
    path: PathBuf,
}

impl TempVideo {
    pub fn create(bytes: &[u8]) -> std::io::Result<Self> {
        Self::create_in(&std::env::temp_dir(), bytes)
    }

    pub(crate) fn create_in(dir: &Path, bytes: &[u8]) -> std::io::Result<Self> {
        let stamp = SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_nanos();
        let seq = UPLOAD_COUNTER.fetch_add(1, Ordering::Relaxed);
        let upload = Self {
            path: dir.join(format!("vcover_upload_{}_{}_{}.bin", std::process::id(), stamp, seq)),
        };
        // Dropping `upload` on a failed write removes any partial file.
        fs::write(&upload.path, bytes)?;
        Ok(upload)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for TempVideo {
    fn drop(&mut self) {
        match fs::remove_file(&self.path) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "failed to remove temporary upload");
            }
        }
    }
}

/// Captures one still per upload using a [`MediaDecoder`].
#[derive(Clone)]
pub struct FrameExtractor {
    decoder: Arc<dyn MediaDecoder>,
    jpeg_quality: u8,
}

impl FrameExtractor {
    pub fn new(decoder: Arc<dyn MediaDecoder>) -> Self {
        Self { decoder, jpeg_quality: DEFAULT_JPEG_QUALITY }
    }

    pub fn with_jpeg_quality(mut self, quality: u8) -> Self {
        self.jpeg_quality = quality.clamp(1, 100);
        self
    }

    /// Capture the frame at `duration / 4` from the uploaded bytes.
    ///
    /// Decode work runs on the blocking pool; the only await point is its
    /// completion. Any probe or decode failure is `UnsupportedFormat`.
    pub async fn extract(&self, video: Vec<u8>) -> CoverResult<CapturedFrame> {
        let decoder = Arc::clone(&self.decoder);
        let quality = self.jpeg_quality;
        tokio::task::spawn_blocking(move || capture_blocking(decoder.as_ref(), &video, quality))
            .await
            .map_err(|e| CoverError::unsupported(format!("decode task failed: {}", e)))?
    }

    pub async fn extract_from_path(&self, path: &Path) -> CoverResult<CapturedFrame> {
        let bytes = tokio::fs::read(path).await?;
        self.extract(bytes).await
    }
}

fn capture_blocking(decoder: &dyn MediaDecoder, video: &[u8], quality: u8) -> CoverResult<CapturedFrame> {
    if video.is_empty() {
        return Err(CoverError::unsupported("empty upload"));
    }
    let upload = TempVideo::create(video)?;

    let meta = decoder
        .probe(upload.path())
        .map_err(|e| CoverError::unsupported(format!("{:#}", e)))?;
    if meta.width == 0 || meta.height == 0 {
        return Err(CoverError::unsupported("no video stream"));
    }

    let at = seek_point(meta.duration);
    debug!(duration = meta.duration, width = meta.width, height = meta.height, seek = at, "probed upload");

    let img = decoder
        .decode_frame(upload.path(), at)
        .map_err(|e| CoverError::unsupported(format!("{:#}", e)))?;
    if img.dimensions() != (meta.width, meta.height) {
        debug!(decoded = ?img.dimensions(), probed = ?(meta.width, meta.height), "decoded size differs from probe");
    }

    let bytes = encode_jpeg(&img, quality).map_err(|e| CoverError::unsupported(format!("{:#}", e)))?;
    let (width, height) = img.dimensions();
    info!(width, height, bytes = bytes.len(), "captured frame");
    Ok(CapturedFrame { bytes, width, height })
}

pub fn encode_jpeg(img: &RgbImage, quality: u8) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    JpegEncoder::new_with_quality(&mut out, quality)
        .encode_image(img)
        .context("encoding JPEG")?;
    Ok(out)
}

/// [`MediaDecoder`] backed by the ffprobe and ffmpeg binaries.
#[derive(Debug, Clone)]
pub struct FfmpegDecoder {
    ffmpeg: String,
    ffprobe: String,
}

impl FfmpegDecoder {
    pub fn new() -> Self {
        Self { ffmpeg: "ffmpeg".to_string(), ffprobe: "ffprobe".to_string() }
    }

    pub fn with_commands(ffmpeg: impl Into<String>, ffprobe: impl Into<String>) -> Self {
        Self { ffmpeg: ffmpeg.into(), ffprobe: ffprobe.into() }
    }
}

impl Default for FfmpegDecoder {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Deserialize)]
struct ProbeOutput {
    #[serde(default)]
    streams: Vec<ProbeStream>,
    format: Option<ProbeFormat>,
}

#[derive(Deserialize)]
struct ProbeStream {
    width: Option<u32>,
    height: Option<u32>,
    duration: Option<String>,
}

#[derive(Deserialize)]
struct ProbeFormat {
    duration: Option<String>,
}

pub(crate) fn parse_probe_json(text: &str) -> Result<VideoMetadata> {
    let probe: ProbeOutput = serde_json::from_str(text).context("parsing ffprobe output")?;
    let stream = probe.streams.first().ok_or_else(|| anyhow!("no video stream"))?;
    let (width, height) = match (stream.width, stream.height) {
        (Some(w), Some(h)) if w > 0 && h > 0 => (w, h),
        _ => return Err(anyhow!("video stream has no dimensions")),
    };
    // Container duration first; some containers only report it per stream.
    let duration = probe
        .format
        .and_then(|f| f.duration)
        .or_else(|| stream.duration.clone())
        .and_then(|d| d.trim().parse::<f64>().ok())
        .unwrap_or(0.0);
    Ok(VideoMetadata { duration, width, height })
}

impl MediaDecoder for FfmpegDecoder {
    fn probe(&self, path: &Path) -> Result<VideoMetadata> {
        let output = ProcCommand::new(&self.ffprobe)
            .arg("-v")
            .arg("error")
            .arg("-select_streams")
            .arg("v:0")
            .arg("-show_entries")
            .arg("stream=width,height,duration:format=duration")
            .arg("-of")
            .arg("json")
            .arg(path)
            .output()
            .context("running ffprobe")?;

        if !output.status.success() {
            return Err(anyhow!("ffprobe failed: {}", String::from_utf8_lossy(&output.stderr).trim()));
        }
        parse_probe_json(&String::from_utf8_lossy(&output.stdout))
    }

    fn decode_frame(&self, path: &Path, at_seconds: f64) -> Result<RgbImage> {
        let output = ProcCommand::new(&self.ffmpeg)
            .arg("-loglevel")
            .arg("error")
            .arg("-ss")
            .arg(format!("{:.3}", at_seconds))
            .arg("-i")
            .arg(path)
            .arg("-frames:v")
            .arg("1")
            .arg("-f")
            .arg("image2pipe")
            .arg("-vcodec")
            .arg("png")
            .arg("-")
            .output()
            .context("running ffmpeg")?;

        if !output.status.success() {
            return Err(anyhow!("ffmpeg failed: {}", String::from_utf8_lossy(&output.stderr).trim()));
        }
        if output.stdout.is_empty() {
            return Err(anyhow!("no frame decoded at {:.3}s", at_seconds));
        }
        let img = image::load_from_memory_with_format(&output.stdout, ImageFormat::Png).context("reading decoded frame")?;
        Ok(img.to_rgb8())
    }
}
