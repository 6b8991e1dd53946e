use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use tracing::level_filters::LevelFilter;

#[derive(Parser, Debug)]
#[command(name = "tachie", version)]
struct Cli {
    /// Log every component and cache decision.
    #[arg(long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Composite a component list and write it as a PNG.
    Frame(FrameArgs),
}

#[derive(Parser, Debug)]
struct FrameArgs {
    /// Assets root containing chara/, background/, shader/, fonts/ and emoji/.
    #[arg(long, default_value = "assets")]
    assets: PathBuf,

    /// Component list JSON.
    #[arg(long)]
    components: PathBuf,

    /// Partial style config JSON merged over the defaults.
    #[arg(long)]
    style: Option<PathBuf>,

    /// Partial GUI settings JSON merged over the defaults.
    #[arg(long)]
    gui: Option<PathBuf>,

    #[arg(long, default_value_t = 2560)]
    width: u32,

    #[arg(long, default_value_t = 1440)]
    height: u32,

    /// Character drawn by components that don't pin their own.
    #[arg(long, default_value = "")]
    character: String,

    #[arg(long, default_value_t = 1)]
    emotion: i64,

    /// Background index used as `c<index>`.
    #[arg(long, default_value_t = 1)]
    background: i64,

    /// Dialogue text drawn over the scene.
    #[arg(long)]
    text: Option<String>,

    /// Emoji descriptor JSON for `--text`.
    #[arg(long)]
    emoji: Option<String>,

    /// Image pasted over the scene.
    #[arg(long)]
    paste: Option<PathBuf>,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(if cli.verbose {
            LevelFilter::DEBUG
        } else {
            LevelFilter::WARN
        })
        .init();

    match cli.cmd {
        Command::Frame(args) => cmd_frame(args),
    }
}

fn read_text(path: &Path, what: &str) -> anyhow::Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("read {what} '{}'", path.display()))
}

fn cmd_frame(args: FrameArgs) -> anyhow::Result<()> {
    let engine = tachie::Engine::with_assets_root(&args.assets);
    if let Some(path) = &args.style {
        engine
            .update_style_config(&read_text(path, "style config")?)
            .context("apply style config")?;
    }
    if let Some(path) = &args.gui {
        engine
            .update_gui_settings(&read_text(path, "gui settings")?)
            .context("apply gui settings")?;
    }

    let components = read_text(&args.components, "components")?;
    let mut frame = engine
        .generate_complete_image(&tachie::FrameRequest {
            width: args.width,
            height: args.height,
            components_json: &components,
            character_name: &args.character,
            emotion_index: args.emotion,
            background_index: args.background,
        })
        .context("render scene")?;

    let paste = match &args.paste {
        Some(path) => Some(
            image::open(path)
                .with_context(|| format!("open pasted image '{}'", path.display()))?
                .to_rgba8(),
        ),
        None => None,
    };
    if args.text.is_some() || paste.is_some() {
        let image = paste.as_ref().map(|img| tachie::ImageInput {
            data: img.as_raw(),
            width: img.width(),
            height: img.height(),
            pitch: img.width() as usize * 4,
        });
        frame = engine
            .draw_content(&tachie::OverlayRequest {
                text: args.text.as_deref().unwrap_or_default(),
                emoji_json: args.emoji.as_deref(),
                image,
            })
            .context("draw overlay")?;
    }

    if let Some(parent) = args.out.parent().filter(|p| !p.as_os_str().is_empty()) {
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
