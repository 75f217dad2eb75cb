use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{Parser, Subcommand, ValueEnum};
use rayon::prelude::*;
use raster_pipeline::{
    Affine, Color, ColorFormat, ColorType, IntRect, Mask, MaskFormat, PaintConfig, Pixmap,
    RasterPipelineBlitter, StageKind, XformConfig,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "rasterpipe", version)]
struct Cli {
    /// Log pipeline construction at debug level.
    #[arg(long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Convert a PNG between color spaces.
    Xform(XformArgs),
    /// Draw a paint into a new PNG.
    Blit(BlitArgs),
    /// List the stage catalog.
    Stages(StagesArgs),
}

#[derive(Parser, Debug)]
struct XformArgs {
    /// Input PNG.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,

    /// Color transform JSON.
    #[arg(long)]
    config: PathBuf,
}

#[derive(Parser, Debug)]
struct BlitArgs {
    /// Paint JSON.
    #[arg(long)]
    config: PathBuf,

    /// Output width in pixels.
    #[arg(long, default_value_t = 256)]
    width: u32,

    /// Output height in pixels.
    #[arg(long, default_value_t = 256)]
    height: u32,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,

    /// Shape to fill.
    #[arg(long, value_enum, default_value_t = Shape::Rect)]
    shape: Shape,
}

#[derive(Parser, Debug)]
struct StagesArgs {
    /// Print the catalog as JSON.
    #[arg(long)]
    json: bool,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Shape {
    /// The middle half of the canvas.
    Rect,
    /// An antialiased disc.
    Circle,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.cmd {
        Command::Xform(args) => cmd_xform(args),
        Command::Blit(args) => cmd_blit(args),
        Command::Stages(args) => cmd_stages(args),
    }
}

fn cmd_xform(args: XformArgs) -> anyhow::Result<()> {
    let config = XformConfig::from_path(&args.config)?;
    config
        .validate()
        .with_context(|| format!("color transform '{}'", args.config.display()))?;

    let input = image::open(&args.in_path)
        .with_context(|| format!("read image '{}'", args.in_path.display()))?
        .to_rgba8();
    let (width, height) = input.dimensions();
    let src = input.into_raw();
    let row_bytes = width as usize * 4;
    let mut out = vec![0u8; src.len()];

    if row_bytes > 0 {
        // Transforms hold `Rc` contexts, so every worker builds its own.
        out.par_chunks_mut(row_bytes)
            .zip(src.par_chunks(row_bytes))
            .try_for_each_init(
                || config.build(),
                |xform, (dst_row, src_row)| -> anyhow::Result<()> {
                    let xform = xform.as_ref().map_err(|e| anyhow::anyhow!("{e}"))?;
                    xform.apply(
                        ColorFormat::Rgba8888,
                        dst_row,
                        ColorFormat::Rgba8888,
                        src_row,
                        width as usize,
                        config.alpha,
                    )?;
                    Ok(())
                },
            )?;
    }

    write_png(&args.out, &out, width, height)
}

fn cmd_blit(args: BlitArgs) -> anyhow::Result<()> {
    let config = PaintConfig::from_path(&args.config)?;
    let paint = config
        .to_paint()
        .with_context(|| format!("paint '{}'", args.config.display()))?;

    let mut canvas = Pixmap::new(args.width, args.height, ColorType::Rgba8888, true)?;
    canvas.fill(Color::WHITE);
    let blitter = RasterPipelineBlitter::new(canvas, &paint, Affine::IDENTITY)?;

    let (w, h) = (args.width, args.height);
    match args.shape {
        Shape::Rect => blitter.blit_rect((w / 4) as i32, (h / 4) as i32, w / 2, h / 2),
        Shape::Circle => {
            let mask = disc_mask(w, h)?;
            blitter.blit_mask(&mask, mask.bounds());
        }
    }

    let canvas = blitter.finish();
    write_png(&args.out, &canvas.into_vec(), w, h)
}

fn cmd_stages(args: StagesArgs) -> anyhow::Result<()> {
    if args.json {
        let entries: Vec<_> = StageKind::ALL
            .iter()
            .map(|k| serde_json::json!({ "name": k, "context": k.context_kind() }))
            .collect();
        println!("{}", serde_json::to_string_pretty(&entries)?);
    } else {
        for kind in StageKind::ALL {
            println!("{:<22} {:?}", kind.name(), kind.context_kind());
        }
    }
    Ok(())
}

/// Coverage of a disc centered in a `w` x `h` canvas, one pixel of antialiasing.
fn disc_mask(w: u32, h: u32) -> anyhow::Result<Mask> {
    let bounds = IntRect::from_xywh(0, 0, w as i32, h as i32)?;
    let mut mask = Mask::new(MaskFormat::A8, bounds)?;
    let (cx, cy) = (w as f32 * 0.5, h as f32 * 0.5);
    let radius = w.min(h) as f32 * 0.4;
    for y in 0..h as i32 {
        for x in 0..w as i32 {
            let d = (x as f32 + 0.5 - cx).hypot(y as f32 + 0.5 - cy);
            let coverage = (radius + 0.5 - d).clamp(0.0, 1.0);
            mask.set_coverage(x, y, (coverage * 255.0).round() as u8);
        }
    }
    Ok(mask)
}

fn write_png(path: &Path, data: &[u8], width: u32, height: u32) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    image::save_buffer_with_format(
        path,
        data,
        width,
        height,
        image::ColorType::Rgba8,
        image::ImageFormat::Png,
    )
    .with_context(|| format!("write png '{}'", path.display()))?;
    eprintln!("wrote {}", path.display());
    Ok(())
}
