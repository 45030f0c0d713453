use anyhow::Context;
use clap::Parser;
use winit::dpi::LogicalSize;

use rotor_engine::device::WgpuInit;
use rotor_engine::logging::{init_logging, LoggingConfig};
use rotor_engine::window::{Runtime, RuntimeConfig};
use rotor_engine::{run_headless, HeadlessConfig};

#[derive(Parser, Debug)]
#[command(name = "rotor", about = "Spins a colored triangle on the GPU", version)]
struct Cli {
    /// Render off-screen with the in-memory backend instead of opening a window
    #[arg(long)]
    headless: bool,

    /// Frames to render in headless mode
    #[arg(long, default_value_t = 60)]
    frames: u32,

    /// Synthetic time between headless frames, in milliseconds
    #[arg(long, default_value_t = 1000.0 / 60.0)]
    frame_interval_ms: f64,

    /// Drawable width
    #[arg(long, default_value_t = 800)]
    width: u32,

    /// Drawable height
    #[arg(long, default_value_t = 600)]
    height: u32,

    /// Window title
    #[arg(long, default_value = "rotor")]
    title: String,

    /// Log filter, e.g. "rotor_engine=debug" (overrides RUST_LOG)
    #[arg(long)]
    log: Option<String>,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_logging(LoggingConfig {
        env_filter: cli.log.clone(),
        ..LoggingConfig::default()
    });

    if cli.headless {
        let report = run_headless(&HeadlessConfig {
            width: cli.width,
            height: cli.height,
            frames: cli.frames,
            frame_interval_ms: cli.frame_interval_ms,
        })
        .inspect_err(|e| log::error!("{e}"))
        .context("headless run failed")?;

        println!(
            "{} frames on {} context, {} vertices, final angle {:.2} degrees",
            report.frames_rendered,
            report.context_kind.name(),
            report.vertices_drawn,
            report.final_angle_degrees
        );
        return Ok(());
    }

    log::info!("opening {}x{} window", cli.width, cli.height);
    let config = RuntimeConfig {
        title: cli.title,
        initial_size: LogicalSize::new(f64::from(cli.width), f64::from(cli.height)),
    };
    Runtime::run(config, WgpuInit::default())
}
