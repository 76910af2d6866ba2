use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use reelsmith::{
    CancelToken, CaptionFont, Collaborators, FfmpegClipOpener, FfmpegSink, FfmpegSinkOpts,
    FfmpegTrackLoader, FrameClock, RealtimeClock, RenderConfig, RenderInputs, Script,
    ShortSession, VirtualClock, pipeline::FallbackFootage,
};

#[derive(Parser, Debug)]
#[command(name = "reelsmith", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render a short to MP4 (requires `ffmpeg` on PATH).
    Render(RenderArgs),
    /// Render a single composited frame as a PNG.
    Frame(FrameArgs),
    /// Print the caption timing table as JSON.
    Captions(CaptionArgs),
}

#[derive(Parser, Debug)]
struct InputArgs {
    /// Script JSON.
    #[arg(long)]
    script: PathBuf,

    /// Narration audio, raw s16le mono PCM.
    #[arg(long)]
    narration: PathBuf,

    /// Clip locator (file path or URL), repeatable. Generic fallback footage when omitted.
    #[arg(long = "clip")]
    clips: Vec<String>,

    /// Engine config JSON.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Caption font (TTF/OTF). Overrides the config file. Defaults to the host sans-serif.
    #[arg(long)]
    font: Option<PathBuf>,
}

#[derive(Parser, Debug)]
struct RenderArgs {
    #[command(flatten)]
    input: InputArgs,

    /// Output MP4 path.
    #[arg(long)]
    out: PathBuf,

    /// Pace frames against the wall clock instead of rendering as fast as possible.
    #[arg(long, conflicts_with = "offline")]
    realtime: bool,

    /// Render as fast as possible (default).
    #[arg(long)]
    offline: bool,

    /// Skip background music.
    #[arg(long)]
    no_music: bool,
}

#[derive(Parser, Debug)]
struct FrameArgs {
    #[command(flatten)]
    input: InputArgs,

    /// Elapsed time in seconds.
    #[arg(long)]
    at: f64,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,
}

#[derive(Parser, Debug)]
struct CaptionArgs {
    /// Script JSON.
    #[arg(long)]
    script: PathBuf,

    /// Narration audio, raw s16le mono PCM.
    #[arg(long)]
    narration: PathBuf,

    /// Engine config JSON (narration sample rate).
    #[arg(long)]
    config: Option<PathBuf>,
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
        Command::Frame(args) => cmd_frame(args),
        Command::Captions(args) => cmd_captions(args),
    }
}

fn read_config(path: Option<&Path>) -> anyhow::Result<RenderConfig> {
    match path {
        Some(p) => Ok(RenderConfig::from_json_file(p)?),
        None => Ok(RenderConfig::default()),
    }
}

fn read_script(path: &Path) -> anyhow::Result<Script> {
    let s = std::fs::read_to_string(path)
        .with_context(|| format!("read script '{}'", path.display()))?;
    Ok(Script::from_json_str(&s)?)
}

fn read_narration(path: &Path) -> anyhow::Result<Vec<u8>> {
    std::fs::read(path).with_context(|| format!("read narration '{}'", path.display()))
}

fn load_font(config: &RenderConfig, font: Option<&Path>) -> anyhow::Result<CaptionFont> {
    let font = match font {
        Some(path) => CaptionFont::from_path(Some(path), config.caption.font_size)
            .with_context(|| format!("load caption font '{}'", path.display()))?,
        None => CaptionFont::System,
    };
    if let CaptionFont::Loaded(typesetter) = &font {
        tracing::debug!(family = typesetter.family_name(), "caption font loaded");
    }
    Ok(font)
}

struct Prepared {
    script: Script,
    narration: Vec<u8>,
    clips: Vec<String>,
    config: RenderConfig,
    font: CaptionFont,
}

fn prepare_inputs(input: &InputArgs) -> anyhow::Result<Prepared> {
    let config = read_config(input.config.as_deref())?;
    let clips = if input.clips.is_empty() {
        FallbackFootage::builtin().fallback().to_vec()
    } else {
        input.clips.clone()
    };
    Ok(Prepared {
        script: read_script(&input.script)?,
        narration: read_narration(&input.narration)?,
        clips,
        font: load_font(&config, input.font.as_deref())?,
        config,
    })
}

fn cmd_render(args: RenderArgs) -> anyhow::Result<()> {
    let Prepared {
        script,
        narration,
        clips,
        mut config,
        font,
    } = prepare_inputs(&args.input)?;
    if args.no_music {
        config.music_enabled = false;
    }
    let fps = config.fps()?;

    let opener = FfmpegClipOpener {
        canvas: config.canvas,
        fps,
    };
    let session = ShortSession::prepare(
        RenderInputs {
            script: &script,
            narration_pcm: &narration,
            clip_locators: &clips,
        },
        &config,
        Collaborators {
            clips: &opener,
            music: &FfmpegTrackLoader,
            caption_font: font,
        },
        &mut |m: &str| eprintln!("{m}"),
    )?;

    let mut sink = FfmpegSink::new(FfmpegSinkOpts {
        out_path: Some(args.out.clone()),
        ..FfmpegSinkOpts::default()
    })?;
    let mut realtime;
    let mut offline;
    let clock: &mut dyn FrameClock = if args.realtime {
        realtime = RealtimeClock::new(fps);
        &mut realtime
    } else {
        offline = VirtualClock::new(fps);
        &mut offline
    };

    let output = session.run(
        clock,
        &mut sink,
        &mut |m: &str| eprintln!("{m}"),
        &CancelToken::new(),
    )?;

    let report =
        serde_json::to_string_pretty(&output.report).context("serialize render report")?;
    println!("{report}");
    eprintln!("wrote {}", args.out.display());
    Ok(())
}

fn cmd_frame(args: FrameArgs) -> anyhow::Result<()> {
    let Prepared {
        script,
        narration,
        clips,
        mut config,
        font,
    } = prepare_inputs(&args.input)?;
    config.music_enabled = false;

    let opener = FfmpegClipOpener {
        canvas: config.canvas,
        fps: config.fps()?,
    };
    let mut session = ShortSession::prepare(
        RenderInputs {
            script: &script,
            narration_pcm: &narration,
            clip_locators: &clips,
        },
        &config,
        Collaborators {
            clips: &opener,
            music: &FfmpegTrackLoader,
            caption_font: font,
        },
        &mut reelsmith::NoProgress,
    )?;
    let frame = session.render_frame_at(args.at)?;

    if let Some(parent) = args.out.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }

    image::save_buffer_with_format(
        &args.out,
        &frame.data,
        frame.width,
        frame.height,
        image::ColorType::Rgba8,
        image::ImageFormat::Png,
    )
    .with_context(|| format!("write png '{}'", args.out.display()))?;

    eprintln!("wrote {}", args.out.display());
    Ok(())
}

fn cmd_captions(args: CaptionArgs) -> anyhow::Result<()> {
    let config = read_config(args.config.as_deref())?;
    let script = read_script(&args.script)?;
    let pcm = read_narration(&args.narration)?;
    let narration = reelsmith::audio::pcm::decode_pcm_s16le(&pcm, config.narration_sample_rate)?;
    let captions =
        reelsmith::allocate_captions(&script.narration_text(), narration.duration_secs());
    let json = serde_json::to_string_pretty(&captions).context("serialize captions")?;
    println!("{json}");
    Ok(())
}
