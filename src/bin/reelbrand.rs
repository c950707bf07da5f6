use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use reelbrand::encode::capability::{CODEC_CANDIDATES, select_encoder};
use reelbrand::media::ffmpeg::{decode_frame_at, probe_source};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "reelbrand", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Brand a video and re-encode it (requires `ffmpeg` and `ffprobe` on PATH).
    Render(RenderArgs),
    /// Print the codec candidates and which one this host would use.
    Probe,
    /// Brand a single decoded frame and save it as a PNG preview.
    Frame(FrameArgs),
}

#[derive(Parser, Debug)]
struct OverlayArgs {
    /// Overlay config JSON (`addressText`, `mobileText`, `addressScale`, `mobileScale`).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Address text; `\n` starts a new line.
    #[arg(long)]
    address: Option<String>,

    /// Mobile number text.
    #[arg(long)]
    mobile: Option<String>,

    /// Address font scale factor.
    #[arg(long)]
    address_scale: Option<f32>,

    /// Mobile font scale factor.
    #[arg(long)]
    mobile_scale: Option<f32>,

    /// Font file for the medium-weight address text.
    #[arg(long, requires = "font_bold")]
    font_medium: Option<PathBuf>,

    /// Font file for the bold mobile text.
    #[arg(long, requires = "font_medium")]
    font_bold: Option<PathBuf>,

    /// Extra directory searched during font discovery.
    #[arg(long)]
    font_dir: Vec<PathBuf>,
}

#[derive(Parser, Debug)]
struct RenderArgs {
    /// Input video.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Output file.
    #[arg(long)]
    out: PathBuf,

    #[command(flatten)]
    overlay: OverlayArgs,

    /// Encode video only, even when the source has audio.
    #[arg(long, default_value_t = false)]
    no_audio: bool,
}

#[derive(Parser, Debug)]
struct FrameArgs {
    /// Input video.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Media time in seconds.
    #[arg(long, default_value_t = 0.0)]
    at: f64,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,

    #[command(flatten)]
    overlay: OverlayArgs,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Render(args) => cmd_render(args),
        Command::Probe => cmd_probe(),
        Command::Frame(args) => cmd_frame(args),
    }
}

impl OverlayArgs {
    fn overlay_config(&self) -> anyhow::Result<reelbrand::OverlayConfig> {
        let mut cfg = match &self.config {
            Some(path) => reelbrand::OverlayConfig::from_path(path)?,
            None => reelbrand::OverlayConfig::new("", ""),
        };
        if let Some(address) = &self.address {
            cfg.address_text = address.replace("\\n", "\n");
        }
        if let Some(mobile) = &self.mobile {
            cfg.mobile_text = mobile.clone();
        }
        if let Some(s) = self.address_scale {
            cfg.address_scale = s;
        }
        if let Some(s) = self.mobile_scale {
            cfg.mobile_scale = s;
        }
        cfg.validate()?;
        if !cfg.scales_within_recommended_range() {
            tracing::warn!(
                address_scale = cfg.address_scale,
                mobile_scale = cfg.mobile_scale,
                "scales outside the recommended 0.5..=2.0 range"
            );
        }
        Ok(cfg)
    }

    fn fonts(&self) -> anyhow::Result<reelbrand::FontSet> {
        let fonts = match (&self.font_medium, &self.font_bold) {
            (Some(medium), Some(bold)) => reelbrand::FontSet::from_files(medium, bold)?,
            _ => reelbrand::FontSet::discover(&self.font_dir)?,
        };
        Ok(fonts)
    }
}

fn ensure_parent_dir(path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    Ok(())
}

fn cmd_render(args: RenderArgs) -> anyhow::Result<()> {
    let config = args.overlay.overlay_config()?;
    let fonts = args.overlay.fonts()?;
    let mut source = reelbrand::FfmpegSource::open(&args.in_path)
        .with_context(|| format!("open source '{}'", args.in_path.display()))?;

    let capabilities = reelbrand::FfmpegCapabilities::query();
    let recorders = reelbrand::FfmpegRecorderBackend::default();
    let routed = reelbrand::FfmpegAudioRouter::default();
    let audio: &dyn reelbrand::AudioRouter = if args.no_audio {
        &reelbrand::DisabledAudio
    } else {
        &routed
    };

    let mut last = None;
    let mut on_progress = |p: u8| {
        if last != Some(p) {
            last = Some(p);
            eprint!("\rprogress {p:>3}%");
        }
    };
    let mut job = reelbrand::BrandingJob::new(&fonts, &capabilities, &recorders, audio);
    let result = job.run(&mut source, &config, &mut on_progress);
    eprintln!();
    let out = result?;

    ensure_parent_dir(&args.out)?;
    std::fs::write(&args.out, &out.artifact.bytes)
        .with_context(|| format!("write output '{}'", args.out.display()))?;

    let ext = out.artifact.file_extension();
    if args.out.extension().and_then(|e| e.to_str()) != Some(ext) {
        tracing::warn!(
            media_type = %out.artifact.media_type,
            "output extension does not match the encoded container (expected .{ext})"
        );
    }
    eprintln!(
        "wrote {} ({}, {}x{}, {} frames captured, {} dropped, audio: {})",
        args.out.display(),
        out.report.media_type,
        out.report.dimensions.width,
        out.report.dimensions.height,
        out.report.frames_captured,
        out.report.frames_dropped,
        if out.report.audio_attached { "yes" } else { "no" },
    );
    Ok(())
}

fn cmd_probe() -> anyhow::Result<()> {
    let capabilities = reelbrand::FfmpegCapabilities::query();
    for c in &CODEC_CANDIDATES {
        println!(
            "{:<28} {:<10} {:<12} {:<10} {}",
            c.mime,
            c.container,
            c.video_codec.unwrap_or("-"),
            c.audio_codec.unwrap_or("-"),
            if c.is_supported_by(&capabilities) {
                "supported"
            } else {
                "unsupported"
            }
        );
    }
    let selection = select_encoder(
        &capabilities,
        &CODEC_CANDIDATES,
        Some(reelbrand::config::TARGET_BITRATE),
    );
    let id = selection.mime_or_codec_id();
    println!(
        "selected: {} -> {}",
        if id.is_empty() { "(platform default)" } else { id },
        selection.media_type()
    );
    Ok(())
}

fn cmd_frame(args: FrameArgs) -> anyhow::Result<()> {
    let config = args.overlay.overlay_config()?;
    let fonts = args.overlay.fonts()?;
    let info = probe_source(&args.in_path)
        .with_context(|| format!("probe source '{}'", args.in_path.display()))?;
    let frame = decode_frame_at(&info, args.at)?;

    let dims = info.dimensions()?;
    let (_, mut compositor) = reelbrand::FrameCompositor::prepare(dims, &config, &fonts)?;
    compositor.composite(&frame)?;

    ensure_parent_dir(&args.out)?;
    image::save_buffer_with_format(
        &args.out,
        compositor.surface().data(),
        dims.width,
        dims.height,
        image::ColorType::Rgba8,
        image::ImageFormat::Png,
    )
    .with_context(|| format!("write png '{}'", args.out.display()))?;

    eprintln!("wrote {}", args.out.display());
    Ok(())
}
