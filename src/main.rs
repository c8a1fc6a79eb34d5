//! `boxbox` CLI - select, crop, resize and reinsert image regions.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{ArgAction, Args, Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use boxbox::image::{load_image, save_image};
use boxbox::{
    crop, reinsert_with, resize, EffectiveBox, Interpolation, RegionModel, RegionSelector,
    ResizeConfig, ResizeDescriptor, SizePreset,
};

/// Select, crop, resize and reinsert rectangular image regions.
#[derive(Parser, Debug)]
#[command(name = "boxbox")]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable verbose output.
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Resolve the current region, reusing the cached one when none is given.
    Select(SelectArgs),
    /// Crop a region out of an image and print the effective box.
    Crop(CropArgs),
    /// Resize an image to a preset or custom size and print the descriptor.
    Resize(ResizeArgs),
    /// Composite an edited crop back into its original image.
    Reinsert(ReinsertArgs),
    /// List the named resize presets.
    Presets,
}

#[derive(Args, Debug)]
struct SelectArgs {
    /// Image the region belongs to.
    #[arg(value_name = "INPUT")]
    input: PathBuf,

    /// Region JSON, or @FILE to read it from a file.
    #[arg(short, long, value_name = "JSON")]
    region: Option<String>,

    /// File holding the last known region between runs.
    #[arg(long, value_name = "FILE")]
    cache: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct CropArgs {
    /// Input image path.
    #[arg(value_name = "INPUT")]
    input: PathBuf,

    /// Output path for the cropped sub-image.
    #[arg(value_name = "OUTPUT")]
    output: PathBuf,

    /// Region JSON, or @FILE to read it from a file.
    #[arg(short, long, value_name = "JSON")]
    region: String,

    /// Also write the effective box JSON to this file.
    #[arg(long, value_name = "FILE")]
    box_out: Option<PathBuf>,

    /// Output JPEG quality (1-100).
    #[arg(short, long, default_value = "95", value_name = "INT")]
    quality: u8,
}

#[derive(Args, Debug)]
struct ResizeArgs {
    /// Input image path.
    #[arg(value_name = "INPUT")]
    input: PathBuf,

    /// Output image path.
    #[arg(value_name = "OUTPUT")]
    output: PathBuf,

    /// Preset label, WIDTHxHEIGHT of a preset, or "custom".
    #[arg(short, long, default_value = "Custom", value_parser = parse_preset)]
    size: SizePreset,

    /// Custom target width.
    #[arg(long, default_value = "1024", value_name = "INT")]
    width: usize,

    /// Custom target height, ignored while the aspect ratio is kept.
    #[arg(long, default_value = "1024", value_name = "INT")]
    height: usize,

    /// Keep the input aspect ratio, driven by the target width.
    #[arg(long, default_value_t = true, action = ArgAction::Set, value_name = "BOOL")]
    keep_aspect_ratio: bool,

    /// Interpolation mode: bilinear, bicubic or nearest.
    #[arg(short, long, default_value = "bilinear", value_parser = parse_interpolation)]
    interpolation: Interpolation,

    /// Also write the resize descriptor JSON to this file.
    #[arg(long, value_name = "FILE")]
    metadata_out: Option<PathBuf>,

    /// Output JPEG quality (1-100).
    #[arg(short, long, default_value = "95", value_name = "INT")]
    quality: u8,
}

#[derive(Args, Debug)]
struct ReinsertArgs {
    /// The image the crop was taken from.
    #[arg(value_name = "ORIGINAL")]
    original: PathBuf,

    /// The edited crop.
    #[arg(value_name = "EDITED")]
    edited: PathBuf,

    /// Output image path.
    #[arg(value_name = "OUTPUT")]
    output: PathBuf,

    /// Effective box JSON printed by `crop`, or @FILE.
    #[arg(short = 'b', long = "box", value_name = "JSON")]
    effective_box: String,

    /// Resize descriptor JSON printed by `resize`, or @FILE, checked against the edited crop.
    #[arg(long, value_name = "JSON")]
    resize_metadata: Option<String>,

    /// Interpolation used to restore the crop size.
    #[arg(short, long, default_value = "bilinear", value_parser = parse_interpolation)]
    interpolation: Interpolation,

    /// Output JPEG quality (1-100).
    #[arg(short, long, default_value = "95", value_name = "INT")]
    quality: u8,
}

fn parse_preset(s: &str) -> std::result::Result<SizePreset, String> {
    s.parse().map_err(|e: boxbox::Error| e.to_string())
}

fn parse_interpolation(s: &str) -> std::result::Result<Interpolation, String> {
    s.parse().map_err(|e: boxbox::Error| e.to_string())
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("boxbox={log_level}").into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    if let Err(err) = run(cli.command) {
        tracing::error!("{err:#}");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

fn run(command: Command) -> Result<()> {
    match command {
        Command::Select(args) => command_select(&args),
        Command::Crop(args) => command_crop(&args),
        Command::Resize(args) => command_resize(&args),
        Command::Reinsert(args) => command_reinsert(&args),
        Command::Presets => {
            for preset in SizePreset::ALL {
                match preset.dimensions() {
                    Some((w, h)) => println!("{preset:<24} {w}x{h}"),
                    None => println!("{preset:<24} --width/--height"),
                }
            }
            Ok(())
        }
    }
}

fn command_select(args: &SelectArgs) -> Result<()> {
    let image = load_image(&args.input).context("Failed to load input image")?;

    let mut selector = match &args.cache {
        Some(path) if path.exists() => {
            let cached = fs::read_to_string(path)
                .with_context(|| format!("Failed to read region cache {}", path.display()))?;
            RegionSelector::with_region(
                RegionModel::parse(&cached).context("Region cache is corrupt")?,
            )
        }
        _ => RegionSelector::new(),
    };

    let incoming = args.region.as_deref().map(read_metadata).transpose()?;
    let (_, region) = selector
        .select(image, incoming.as_deref())
        .context("Failed to select region")?;

    if let Some(path) = &args.cache {
        write_text(path, &selector.last().to_json())?;
    }

    println!("{}", region.to_json());
    Ok(())
}

fn command_crop(args: &CropArgs) -> Result<()> {
    let image = load_image(&args.input).context("Failed to load input image")?;
    let region = RegionModel::parse(&read_metadata(&args.region)?)?;

    let (sub_image, effective) = crop(&image, &region).context("Failed to crop region")?;

    save_image(&sub_image, 0, &args.output, args.quality).context("Failed to save crop")?;

    let json = effective.to_json();
    if let Some(path) = &args.box_out {
        write_text(path, &json)?;
    }
    println!("{json}");
    Ok(())
}

fn command_resize(args: &ResizeArgs) -> Result<()> {
    let image = load_image(&args.input).context("Failed to load input image")?;

    let config = ResizeConfig {
        preset: args.size,
        width: args.width,
        height: args.height,
        keep_aspect_ratio: args.keep_aspect_ratio,
        interpolation: args.interpolation,
    };

    let (resized, descriptor) = resize(image, &config).context("Failed to resize image")?;

    save_image(&resized, 0, &args.output, args.quality).context("Failed to save resized image")?;

    let json = descriptor.to_json();
    if let Some(path) = &args.metadata_out {
        write_text(path, &json)?;
    }
    println!("{json}");
    Ok(())
}

fn command_reinsert(args: &ReinsertArgs) -> Result<()> {
    let original = load_image(&args.original).context("Failed to load original image")?;
    let edited = load_image(&args.edited).context("Failed to load edited crop")?;
    let effective = EffectiveBox::parse(&read_metadata(&args.effective_box)?)?;

    if let Some(raw) = &args.resize_metadata {
        let descriptor = ResizeDescriptor::parse(&read_metadata(raw)?)?;
        let (_, height, width, _) = edited.dim();
        if (descriptor.resized_width, descriptor.resized_height) != (width, height) {
            tracing::warn!(
                "Edited crop is {width}x{height} but the resize produced {}x{}",
                descriptor.resized_width,
                descriptor.resized_height
            );
        }
        if (descriptor.original_width, descriptor.original_height)
            != (effective.width, effective.height)
        {
            tracing::warn!(
                "Resize started from {}x{} but the box holds {}x{}",
                descriptor.original_width,
                descriptor.original_height,
                effective.width,
                effective.height
            );
        }
    }

    let composited = reinsert_with(&original, &edited, &effective, args.interpolation)
        .context("Failed to reinsert crop")?;

    save_image(&composited, 0, &args.output, args.quality).context("Failed to save output")?;

    println!(
        "Successfully reinserted {} -> {}",
        args.edited.display(),
        args.output.display()
    );
    Ok(())
}

/// Inline JSON, or the contents of a file when prefixed with `@`.
fn read_metadata(arg: &str) -> Result<String> {
    match arg.strip_prefix('@') {
        Some(path) => fs::read_to_string(path)
            .with_context(|| format!("Failed to read metadata file {path}")),
        None => Ok(arg.to_string()),
    }
}

fn write_text(path: &Path, content: &str) -> Result<()> {
    fs::write(path, content).with_context(|| format!("Failed to write {}", path.display()))
}
