use anyhow::{anyhow, Context, Result};
use clap::Parser;
use dialoguer::theme::ColorfulTheme;
use dialoguer::{Confirm, FuzzySelect, Input, Select};
use indicatif::{ProgressBar, ProgressStyle};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing_subscriber::EnvFilter;
use vcover::{api_key_from_env, AppConfig, CoverError, CoverSession, CoverStudio, StyleCatalog};
use walkdir::WalkDir;

const VIDEO_EXTENSIONS: &[&str] = &["mp4", "mkv", "mov", "avi", "webm", "m4v"];

#[derive(Parser, Debug)]
#[command(version, about = "Design a 9:16 AI cover from a frame of your video.")]
struct Args {
    /// Input video file
    input: Option<PathBuf>,

    /// Output directory for the cover
    out: Option<PathBuf>,

    /// Style preset id (e.g. VOGUE, CYBER)
    #[arg(long)]
    style: Option<String>,

    /// Title rendered on the cover (empty uses the default title)
    #[arg(long)]
    title: Option<String>,

    /// List the available styles and exit
    #[arg(long, default_value_t = false)]
    list_styles: bool,

    /// Only capture the frame, skip generation
    #[arg(long, default_value_t = false)]
    frame_only: bool,

    /// Never prompt; use defaults for anything not given
    #[arg(long, default_value_t = false)]
    batch: bool,

    /// Log details to standard output
    #[arg(long, default_value_t = false)]
    log_details: bool,
}

fn init_logging(log_details: bool) {
    let fallback = if log_details { "vcover=info" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback)))
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let mut args = Args::parse();
    init_logging(args.log_details);
    let is_interactive = !args.batch;

    let cfg = AppConfig::load()?;
    let catalog = cfg.catalog()?;

    if args.list_styles {
        print_styles(&catalog);
        return Ok(());
    }

    // --- Interactive Prompts ---
    if args.input.is_none() {
        if !is_interactive {
            return Err(anyhow!("Input file must be provided with --batch."));
        }
        let files = find_video_files();
        if files.is_empty() {
            return Err(anyhow!("No video files found in current directory."));
        }
        let selection = FuzzySelect::with_theme(&ColorfulTheme::default())
            .with_prompt("Choose a video")
            .default(0)
            .items(&files)
            .interact()?;
        args.input = Some(PathBuf::from(&files[selection]));
    }
    let input_path = args.input.clone().ok_or_else(|| anyhow!("Input file must be provided"))?;
    if !input_path.is_file() {
        return Err(anyhow!("Input path does not exist: {}", input_path.display()));
    }

    let output_dir = args.out.clone().unwrap_or_else(|| PathBuf::from("."));
    fs::create_dir_all(&output_dir).context("creating output dir")?;

    // Frame capture never talks to the service.
    let api_key = if args.frame_only { String::new() } else { api_key_from_env()? };
    let studio = CoverStudio::from_config(cfg.clone(), api_key)?;
    let mut session = studio.new_session();

    // --- Capture ---
    let video = fs::read(&input_path).with_context(|| format!("reading {}", input_path.display()))?;
    let pb = spinner("Capturing frame...")?;
    let uploaded = session.upload(studio.extractor(), video).await;
    pb.finish_and_clear();
    uploaded.map_err(user_facing)?;

    let frame = session.frame().ok_or_else(|| anyhow!("no frame captured"))?;
    println!("Captured {}x{} frame from {}", frame.width, frame.height, input_path.display());

    if args.frame_only {
        let stem = input_path.file_stem().and_then(|s| s.to_str()).unwrap_or("vcover");
        let frame_path = output_dir.join(format!("{}-frame.jpg", stem));
        frame.save(&frame_path)?;
        println!("Frame saved to {}", frame_path.display());
        return Ok(());
    }

    choose_style(&mut session, args.style.as_deref(), is_interactive)?;
    choose_title(&mut session, args.title.take(), is_interactive, &cfg.default_title)?;

    // --- Generation ---
    let pb = spinner(&format!("Designing {} cover...", session.selected_preset().id))?;
    let generated = session.generate(studio.designer()).await;
    pb.finish_and_clear();
    generated.map_err(user_facing)?;

    let result = session.result().ok_or_else(|| anyhow!("no cover generated"))?;
    let out_path = output_dir.join(&cfg.output_name);
    if out_path.exists()
        && is_interactive
        && !Confirm::new()
            .with_prompt(format!("{} already exists. Overwrite?", out_path.display()))
            .default(false)
            .interact()?
    {
        println!("Operation cancelled.");
        return Ok(());
    }
    result.save(&out_path)?;
    println!("Cover saved to {}", out_path.display());

    if args.log_details {
        let title = if session.title().trim().is_empty() { cfg.default_title.as_str() } else { session.title() };
        println!("\n--- Generation Details ---");
        println!(
            "Version: {}\nModel: {}\nStyle: {}\nTitle: {}\nFrame: {}x{}\nCover: {} bytes ({})",
            env!("CARGO_PKG_VERSION"),
            cfg.model,
            session.selected_preset().id,
            title,
            frame_dims(&session).0,
            frame_dims(&session).1,
            result.bytes.len(),
            result.mime_type
        );
    }

    Ok(())
}

fn user_facing(err: CoverError) -> anyhow::Error {
    anyhow!("{} ({})", err.user_message(), err)
}

fn frame_dims(session: &CoverSession) -> (u32, u32) {
    session.frame().map(|f| (f.width, f.height)).unwrap_or((0, 0))
}

fn spinner(message: &str) -> Result<ProgressBar> {
    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} [{elapsed_precise}] {msg}")?);
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(120));
    Ok(pb)
}

fn print_styles(catalog: &StyleCatalog) {
    for (idx, preset) in catalog.presets().iter().enumerate() {
        let marker = if idx == 0 { " (default)" } else { "" };
        println!("{:<8} {}{}", preset.id, preset.name, marker);
        println!("         {}", preset.prompt);
    }
}

fn choose_style(session: &mut CoverSession, style: Option<&str>, is_interactive: bool) -> Result<()> {
    if let Some(id) = style {
        // resolve() gives the list of valid ids in its error
        let preset = session.catalog().resolve(Some(id))?.id.clone();
        session.select_preset(&preset);
        return Ok(());
    }
    if !is_interactive {
        return Ok(());
    }
    let labels: Vec<String> = session
        .catalog()
        .presets()
        .iter()
        .map(|p| format!("{:<8} {}", p.id, p.name))
        .collect();
    let idx = Select::with_theme(&ColorfulTheme::default())
        .with_prompt("Choose a style")
        .default(0)
        .items(&labels)
        .interact()?;
    let id = session.catalog().presets()[idx].id.clone();
    session.select_preset(&id);
    Ok(())
}

fn choose_title(session: &mut CoverSession, title: Option<String>, is_interactive: bool, default_title: &str) -> Result<()> {
    let title = match title {
        Some(t) => t,
        None if is_interactive => Input::<String>::with_theme(&ColorfulTheme::default())
            .with_prompt(format!("Cover title (empty for {})", default_title))
            .allow_empty(true)
            .interact_text()?,
        None => String::new(),
    };
    session.set_title(title);
    Ok(())
}

fn find_video_files() -> Vec<String> {
    WalkDir::new(".")
        .max_depth(1)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.path().is_file() && is_video_path(e.path()))
        .map(|e| e.path().to_str().unwrap_or("").to_string())
        .collect()
}

fn is_video_path(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| VIDEO_EXTENSIONS.iter().any(|v| v.eq_ignore_ascii_case(ext)))
}
