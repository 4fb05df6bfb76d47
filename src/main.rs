use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use log::info;

use fractalglass::color::{PRESETS, Preset};
use fractalglass::config::{Params, ParamsPatch};
use fractalglass::driver::{FixedStep, FrameDriver, PngSequence};
use fractalglass::export::{self, EXPORT_FILENAME};
use fractalglass::field::FieldVariant;
use fractalglass::render;
use fractalglass::surface::{LIVE_MAX_PIXEL_RATIO, Viewport};

#[derive(Parser)]
#[command(author, version, about = "Fractal glass background renderer", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct StyleArgs {
    /// JSON file with a full or partial parameter set
    #[arg(long)]
    params: Option<PathBuf>,

    /// Named color preset, applied after the params file
    #[arg(long)]
    preset: Option<String>,

    /// Flow field variant: simple or rich
    #[arg(long)]
    variant: Option<FieldVariant>,
}

impl StyleArgs {
    fn resolve(&self) -> Result<Params> {
        let mut params = Params::default();
        if let Some(path) = &self.params {
            let patch = ParamsPatch::load(path)
                .with_context(|| format!("reading parameters from {}", path.display()))?;
            params.apply(&patch);
        }
        if let Some(name) = &self.preset {
            let Some(preset) = Preset::find(name) else {
                bail!("unknown preset {name:?}; run `fractalglass presets` for the list");
            };
            params.apply_preset(preset);
        }
        if let Some(variant) = self.variant {
            params.variant = variant;
        }
        Ok(params)
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Render frames to PNG files
    Render {
        #[command(flatten)]
        style: StyleArgs,

        /// Viewport width in CSS pixels
        #[arg(long, default_value_t = 800)]
        width: u32,

        /// Viewport height in CSS pixels
        #[arg(long, default_value_t = 600)]
        height: u32,

        /// Device pixel ratio (capped at 2)
        #[arg(long, default_value_t = 1.0)]
        dpr: f64,

        /// Time of the first frame, in seconds
        #[arg(long, default_value_t = 0.0)]
        time: f64,

        /// Number of frames
        #[arg(long, default_value_t = 1)]
        frames: u64,

        /// Frames per second of the time step between frames
        #[arg(long, default_value_t = 30.0)]
        fps: f64,

        /// Also save ridge and field layers of the first frame
        #[arg(long, default_value_t = false)]
        layers: bool,

        /// Output directory
        #[arg(long, default_value = "artifacts")]
        out: PathBuf,
    },
    /// Write a standalone HTML wallpaper
    Export {
        #[command(flatten)]
        style: StyleArgs,

        #[arg(long, default_value = EXPORT_FILENAME)]
        out: PathBuf,
    },
    /// List color presets
    Presets,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Render { style, width, height, dpr, time, frames, fps, layers, out } => {
            let params = style.resolve()?;
            let viewport = Viewport::new(width, height, dpr);
            let surface = viewport.surface(LIVE_MAX_PIXEL_RATIO);
            info!(
                "Rendering {} frame(s) at {}x{} ({} field) from t={time}",
                frames,
                surface.width,
                surface.height,
                params.variant.name()
            );

            if layers {
                std::fs::create_dir_all(&out)
                    .with_context(|| format!("creating {}", out.display()))?;
                let (frame, timings) = fractalglass::generate(surface, time, &params);
                eprintln!("\nTimings:");
                for t in &timings {
                    eprintln!("  {:20} {:8.1} ms", t.name, t.ms);
                }
                let save = |name: &str, rgba: &[u8]| -> Result<()> {
                    let path = out.join(name);
                    render::save_png(&path, rgba, surface)?;
                    info!("Saved {}", path.display());
                    Ok(())
                };
                save("ridge.png", &render::render_scalar(&frame.ridge, -1.3, 1.3))?;
                save("field.png", &render::render_scalar(&frame.field, 0.0, 1.0))?;
                save("composite.png", &frame.rgba)?;
            }

            let mut driver = FrameDriver::new(
                params,
                viewport,
                LIVE_MAX_PIXEL_RATIO,
                FixedStep::new(time, fps),
                PngSequence::new(&out),
            );
            let rendered = driver.run(Some(frames), None)?;
            info!("Done: {rendered} frame(s) in {}", driver.sink().dir().display());
        }
        Commands::Export { style, out } => {
            let params = style.resolve()?;
            export::write_html(&out, &params, params.variant)
                .with_context(|| format!("writing {}", out.display()))?;
        }
        Commands::Presets => {
            for p in &PRESETS {
                println!("{:10} {} {} {} {}", p.name, p.dark, p.mid, p.bright, p.accent);
            }
        }
    }
    Ok(())
}
