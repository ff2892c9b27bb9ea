use std::path::PathBuf;

use clap::Parser;
use glam::Vec2;

use boxdrop::config::Overrides;
use boxdrop::App;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// RON configuration file (defaults to ./boxdrop.ron if present)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Seed for box colors
    #[arg(long)]
    seed: Option<u64>,

    /// Maximum number of boxes
    #[arg(long)]
    max_bodies: Option<usize>,

    /// Run without a window for this many frames
    #[arg(long, value_name = "FRAMES")]
    headless: Option<u64>,

    /// Click position for headless runs, repeatable
    #[arg(long, value_name = "X,Y", value_parser = parse_point)]
    click: Vec<Vec2>,
}

fn parse_point(s: &str) -> Result<Vec2, String> {
    let (x, y) = s
        .split_once(',')
        .ok_or_else(|| format!("expected X,Y, got '{}'", s))?;
    let x: f32 = x.trim().parse().map_err(|e| format!("bad x '{}': {}", x, e))?;
    let y: f32 = y.trim().parse().map_err(|e| format!("bad y '{}': {}", y, e))?;
    Ok(Vec2::new(x, y))
}

fn main() -> anyhow::Result<()> {
    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    // Parse command-line arguments
    let args = Args::parse();
    let overrides = Overrides {
        seed: args.seed,
        max_bodies: args.max_bodies,
    };
    let config = boxdrop::config::load(args.config.as_deref(), &overrides)?;

    if let Some(frames) = args.headless {
        let report = boxdrop::headless::run(config, frames, &args.click)?;
        log::info!(
            "Simulated {} frames, {} boxes, {} clicks rejected",
            report.frames,
            report.bodies.len(),
            report.rejected
        );
        for body in &report.bodies {
            match body.position {
                Some(p) => log::info!(
                    "  box {}: ({:.3}, {:.3}) m, rect at ({}, {})",
                    body.index,
                    p.x,
                    p.y,
                    body.rect.x,
                    body.rect.y
                ),
                None => log::warn!("  box {}: body missing", body.index),
            }
        }
        return Ok(());
    }

    log::info!("Starting boxdrop");
    pollster::block_on(run(config))
}

async fn run(config: boxdrop_core::SandboxConfig) -> anyhow::Result<()> {
    let (app, event_loop) = App::new(config).await?;
    App::run(event_loop, app)
}
