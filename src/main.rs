use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use focusblur::models::{BlurConfig, ModelType};
use focusblur::rendering::{DepthSource, DiffusionTable};
use focusblur::services::{load_png, save_png, BlurEngine};

#[derive(Parser)]
#[command(name = "focusblur")]
#[command(about = "Depth-of-field blur with lens-shaped diffusion kernels")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Blur a PNG image
    Render {
        /// Input PNG file path
        #[arg(short, long)]
        input: PathBuf,

        /// Output PNG file path
        #[arg(short, long)]
        output: PathBuf,

        /// Depth map PNG (enables depth-aware blur)
        #[arg(short, long)]
        depth: Option<PathBuf>,

        /// YAML configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Diffusion radius in pixels
        #[arg(short, long)]
        radius: Option<f32>,

        /// Focal depth in percent (0 = near, 100 = far)
        #[arg(short, long)]
        focal_depth: Option<f32>,

        /// Falloff model: flat, ring or concave
        #[arg(short, long)]
        model: Option<ModelType>,
    },
    /// Print the diffusion kernel for one blur level
    Kernel {
        /// Blur level, -127..=127
        #[arg(short, long, allow_hyphen_values = true)]
        level: i32,

        /// YAML configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "focusblur=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().without_time())
        .init();

    match cli.command {
        Some(Commands::Render {
            input,
            output,
            depth,
            config,
            radius,
            focal_depth,
            model,
        }) => {
            let mut config = load_config(config.as_deref())?;
            if let Some(radius) = radius {
                config.model_radius = radius;
            }
            if let Some(model) = model {
                config.model_type = model;
            }
            if let Some(focal_depth) = focal_depth {
                config.focal_depth = focal_depth;
            }
            if depth.is_some() {
                config.enable_depth_map = true;
            }
            run_render_command(&input, &output, depth.as_deref(), &config)
        }
        Some(Commands::Kernel { level, config }) => {
            let config = load_config(config.as_deref())?;
            run_kernel_command(level, &config)
        }
        None => {
            run_status_command();
            Ok(())
        }
    }
}

fn load_config(path: Option<&Path>) -> anyhow::Result<BlurConfig> {
    match path {
        Some(path) => BlurConfig::load(path)
            .with_context(|| format!("Failed to load config {}", path.display())),
        None => Ok(BlurConfig::default()),
    }
}

/// Blur `input` into `output`
fn run_render_command(
    input: &Path,
    output: &Path,
    depth: Option<&Path>,
    config: &BlurConfig,
) -> anyhow::Result<()> {
    let image =
        load_png(input).with_context(|| format!("Failed to read image {}", input.display()))?;
    let depth_image = depth
        .map(|path| {
            load_png(path).with_context(|| format!("Failed to read depth map {}", path.display()))
        })
        .transpose()?;

    let mut engine = BlurEngine::new();
    engine.update(
        config,
        depth_image
            .as_ref()
            .map(|d| d as &dyn DepthSource),
    )?;

    let blurred = engine
        .render(&image, config)
        .context("Blur engine has no diffusion table")?;
    save_png(output, &blurred)
        .with_context(|| format!("Failed to write image {}", output.display()))?;

    println!(
        "Rendered {}x{} image to {}",
        blurred.width(),
        blurred.height(),
        output.display()
    );
    Ok(())
}

/// Print the quarter kernel for `level` as a grid of weights
fn run_kernel_command(level: i32, config: &BlurConfig) -> anyhow::Result<()> {
    config.validate()?;
    anyhow::ensure!(level != 0, "Level 0 is in focus and has no kernel");
    anyhow::ensure!(
        level.abs() <= focusblur::DEPTH_MAX,
        "Level {level} outside -{max}..={max}",
        max = focusblur::DEPTH_MAX
    );

    let mut table = DiffusionTable::new(&config.diffusion_params());
    let kernel = table.kernel_mut(level);

    println!(
        "Level {level}: radius {}, density {:.4}",
        kernel.weights.radius(),
        kernel.density
    );
    for y in 0..kernel.weights.rowstride() {
        let row: Vec<String> = kernel
            .weights
            .row(y)
            .iter()
            .map(|w| format!("{w:.4}"))
            .collect();
        println!("  {}", row.join(" "));
    }
    Ok(())
}

/// Display version and usage
fn run_status_command() {
    const VERSION: &str = env!("CARGO_PKG_VERSION");

    println!("focusblur v{VERSION}");
    println!("Depth-of-field blur with lens-shaped diffusion kernels\n");
    println!("Commands:");
    println!("  focusblur render   Blur a PNG image");
    println!("  focusblur kernel   Print a diffusion kernel");
    println!("\nRun 'focusblur --help' for more details.");
}
