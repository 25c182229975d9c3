use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use sha2::Digest as _;

#[derive(Parser, Debug)]
#[command(name = "looping", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print image metadata as JSON.
    Info(InfoArgs),
    /// Write one composited frame as a PNG.
    Frame(FrameArgs),
    /// Play an image in real time without a window.
    Play(PlayArgs),
}

#[derive(Parser, Debug)]
struct InfoArgs {
    /// Input GIF, APNG or WebP.
    #[arg(long = "in")]
    in_path: PathBuf,
}

#[derive(Parser, Debug)]
struct FrameArgs {
    /// Input GIF, APNG or WebP.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Frame index (0-based, taken modulo the frame count).
    #[arg(long)]
    frame: i64,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,
}

#[derive(Parser, Debug)]
struct PlayArgs {
    /// Input GIF, APNG or WebP.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Player options JSON.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Playback speed (negative plays backwards).
    #[arg(long, allow_negative_numbers = true)]
    speed: Option<f64>,

    /// Number of loops to play; 0 loops forever.
    #[arg(long)]
    loops: Option<u32>,

    /// Write every displayed frame to this directory.
    #[arg(long)]
    dump_dir: Option<PathBuf>,

    /// Print the SHA-256 of every displayed frame.
    #[arg(long, default_value_t = false)]
    digest: bool,

    /// Give up after this many seconds.
    #[arg(long, default_value_t = 30.0)]
    timeout: f64,
}

#[derive(serde::Serialize)]
struct ImageInfo {
    format: Option<looping::ContainerFormat>,
    canvas: looping::Canvas,
    scale: f64,
    frame_count: usize,
    frame_durations: Vec<f64>,
    duration: f64,
    loop_count: u32,
    loop_mode: looping::LoopMode,
    has_alpha: bool,
    preferred_frames_per_second: u32,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Info(args) => cmd_info(args),
        Command::Frame(args) => cmd_frame(args),
        Command::Play(args) => cmd_play(args),
    }
}

fn open(path: &Path) -> anyhow::Result<(looping::LoopImage, Option<looping::ContainerFormat>)> {
    let bytes = std::fs::read(path).with_context(|| format!("read image '{}'", path.display()))?;
    let format = looping::ContainerFormat::sniff(&bytes);
    let scale = looping::LoopImage::scale_from_path(path);
    let image = looping::LoopImage::from_bytes(&bytes, scale)
        .with_context(|| format!("open image '{}'", path.display()))?;
    Ok((image, format))
}

fn cmd_info(args: InfoArgs) -> anyhow::Result<()> {
    let (image, format) = open(&args.in_path)?;
    let info = ImageInfo {
        format,
        canvas: image.canvas(),
        scale: image.scale(),
        frame_count: image.frame_count(),
        frame_durations: image.frame_durations().to_vec(),
        duration: image.duration(),
        loop_count: image.codec().loop_count(),
        loop_mode: image.loop_mode(),
        has_alpha: image.has_alpha(),
        preferred_frames_per_second: image.preferred_frames_per_second(),
    };
    println!("{}", serde_json::to_string_pretty(&info)?);
    Ok(())
}

fn cmd_frame(args: FrameArgs) -> anyhow::Result<()> {
    let (image, _) = open(&args.in_path)?;
    let raster = image
        .image_at_frame(args.frame)?
        .with_context(|| format!("frame {} could not be decoded", args.frame))?;
    write_png(&args.out, &raster)?;
    eprintln!("wrote {}", args.out.display());
    Ok(())
}

fn cmd_play(args: PlayArgs) -> anyhow::Result<()> {
    let (image, _) = open(&args.in_path)?;
    let mut opts = match args.config.as_deref() {
        Some(p) => looping::PlayerOpts::from_path(p)?,
        None => looping::PlayerOpts::default(),
    };
    if let Some(speed) = args.speed {
        opts.renderer.playback_speed = speed;
    }
    if let Some(dir) = args.dump_dir.as_deref() {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("create dump dir '{}'", dir.display()))?;
    }

    let mut player = looping::Player::new(opts);
    player.set_delegate(Some(Box::new(CliDelegate {
        dump_dir: args.dump_dir.clone(),
        digest: args.digest,
        displayed: 0,
    })));
    player.set_image(Some(image))?;
    player.play(
        args.loops.map(looping::LoopMode::from_amount),
        None,
        Some(Box::new(|finished| {
            tracing::info!(finished, "playback ended");
        })),
    );

    let timeout = Duration::try_from_secs_f64(args.timeout.max(0.0)).unwrap_or(Duration::MAX);
    if !player.run_until_idle(timeout) {
        tracing::info!("timeout reached; stopping");
        player.stop();
        player.pump();
    }
    Ok(())
}

/// Logs playback events and optionally dumps displayed frames.
struct CliDelegate {
    dump_dir: Option<PathBuf>,
    digest: bool,
    displayed: usize,
}

impl looping::PlayerDelegate for CliDelegate {
    fn did_start_playing(&mut self, image: &looping::LoopImage) {
        tracing::info!(image = image.id(), "started");
    }

    fn did_pause_playing(&mut self, image: &looping::LoopImage) {
        tracing::info!(image = image.id(), "paused");
    }

    fn did_stop_playing(&mut self, image: &looping::LoopImage) {
        tracing::info!(image = image.id(), "stopped");
    }

    fn did_finish_playing(&mut self, image: &looping::LoopImage, loop_mode: looping::LoopMode) {
        tracing::info!(image = image.id(), %loop_mode, "finished");
    }

    fn did_render_frame(&mut self, index: usize, from_cache: bool) {
        tracing::debug!(index, from_cache, "rendered");
    }

    fn did_display(&mut self, raster: Option<&looping::Raster>, frame_index: Option<usize>) {
        let (Some(raster), Some(index)) = (raster, frame_index) else {
            return;
        };
        let seq = self.displayed;
        self.displayed += 1;
        if self.digest {
            println!("{seq} {index} {}", sha256_hex(&raster.rgba8_premul));
        }
        if let Some(dir) = self.dump_dir.as_deref() {
            let path = dir.join(format!("{seq:05}_frame{index:03}.png"));
            if let Err(e) = write_png(&path, raster) {
                tracing::warn!(error = %e, "failed to dump frame");
            }
        }
    }
}

fn write_png(path: &Path, raster: &looping::Raster) -> anyhow::Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    image::save_buffer_with_format(
        path,
        &raster.to_straight_rgba8(),
        raster.width,
        raster.height,
        image::ColorType::Rgba8,
        image::ImageFormat::Png,
    )
    .with_context(|| format!("write png '{}'", path.display()))
}

fn sha256_hex(bytes: &[u8]) -> String {
    let digest = sha2::Sha256::digest(bytes);
    let mut out = String::with_capacity(digest.len() * 2);
    for b in digest {
        out.push_str(&format!("{:02x}", b));
    }
    out
}
