use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use image::{DynamicImage, ImageFormat, RgbaImage};
use tracing::info;
use tracing_subscriber::EnvFilter;

use grada::{BackendPreference, Grader, GraderConfig, ImageBuf, PreviewQuality, SettingsPatch};

/// Grade an image file with a settings file and/or a named preset.
#[derive(Debug, Parser)]
#[command(name = "grada", version, about)]
struct Cli {
    /// Image to grade (PNG, JPEG or TIFF).
    input: PathBuf,

    /// Where to write the result. Format follows the extension.
    output: PathBuf,

    /// JSON settings, applied on top of the preset if both are given.
    /// Fields that are left out keep their current value.
    #[arg(long, value_name = "FILE")]
    settings: Option<PathBuf>,

    /// Start from a preset, by name (e.g. "Teal & Orange").
    #[arg(long, value_name = "NAME")]
    preset: Option<String>,

    /// Grader configuration as JSON.
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Skip GPU initialization.
    #[arg(long)]
    cpu: bool,

    /// Preview quality for large images: low, medium or high.
    #[arg(long)]
    quality: Option<PreviewQuality>,

    /// Print the available presets and exit.
    #[arg(long)]
    list_presets: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => GraderConfig::from_json_file(path)?,
        None => GraderConfig::default(),
    };
    if cli.cpu {
        config.backend = BackendPreference::Cpu;
    }
    if let Some(quality) = cli.quality {
        config.preview_quality = quality;
    }

    let grader = Grader::new(config).await;

    if cli.list_presets {
        for preset in grader.presets() {
            println!("{:<20} {:?}", preset.name, preset.category);
        }
        return Ok(());
    }

    if let Some(name) = &cli.preset {
        let preset = grader.load_preset_by_name(name)?;
        info!(preset = %preset.name, "loaded preset");
    }
    if let Some(path) = &cli.settings {
        let text = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("failed to read settings {}", path.display()))?;
        let patch: SettingsPatch = serde_json::from_str(&text)
            .with_context(|| format!("failed to parse settings {}", path.display()))?;
        grader.update_settings(&patch);
    }

    let source = load_rgba(&cli.input)?;
    info!(
        path = %cli.input.display(),
        width = source.width,
        height = source.height,
        "image loaded"
    );

    let result = grader.process_image(Arc::new(source), None).await?;
    save_rgba(&result.image, &cli.output)?;
    info!(
        path = %cli.output.display(),
        backend = result.backend,
        ms = format!("{:.1}", result.metrics.processing_time_ms),
        "image written"
    );

    grader.dispose();
    Ok(())
}

fn load_rgba(path: &Path) -> Result<ImageBuf> {
    let decoded = image::open(path)
        .with_context(|| format!("failed to decode {}", path.display()))?
        .to_rgba8();
    let (width, height) = decoded.dimensions();
    ImageBuf::from_data(width, height, decoded.into_raw())
}

fn save_rgba(buf: &ImageBuf, path: &Path) -> Result<()> {
    let rgba = RgbaImage::from_raw(buf.width, buf.height, buf.data.clone())
        .context("graded buffer does not match its dimensions")?;
    let image = DynamicImage::ImageRgba8(rgba);
    // JPEG has no alpha channel.
    let image = match ImageFormat::from_path(path) {
        Ok(ImageFormat::Jpeg) => DynamicImage::ImageRgb8(image.to_rgb8()),
        _ => image,
    };
    image
        .save(path)
        .with_context(|| format!("failed to write {}", path.display()))
}
