//! Example: Capture a frame and design a cover using vcover as a library
//!
//! Run with: API_KEY=... cargo run --example cover_from_video

use std::path::Path;
use vcover::{api_key_from_env, AppConfig, CoverStudio};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let input = Path::new("tests/video/input/test.mp4");
    if !input.exists() {
        println!("Note: {} not found.", input.display());
        println!("To use this example, provide a video file at that path.");
        return Ok(());
    }

    let studio = CoverStudio::from_config(AppConfig::default(), api_key_from_env()?)?;
    let mut session = studio.new_session();

    println!("Capturing frame from {}...", input.display());
    session.upload(studio.extractor(), std::fs::read(input)?).await?;
    if let Some(frame) = session.frame() {
        println!("✓ Captured {}x{} frame", frame.width, frame.height);
    }

    session.select_preset("CYBER");
    session.set_title("GLOW");

    println!("Designing cover...");
    session.generate(studio.designer()).await?;

    if let Some(cover) = session.result() {
        let output = Path::new("example_cover.png");
        cover.save(output)?;
        println!("✓ Cover saved to {}", output.display());
    }

    Ok(())
}
