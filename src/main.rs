//! Main entry point for the bvh_viewer CLI

use anyhow::{Context, Result};
use bvh_viewer::{load_bvh_from_file, ViewerConfig, ViewerContext};
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "bvh_viewer", version, about = "Play back .bvh motion capture clips")]
struct Cli {
    /// Clip to load
    file: PathBuf,

    /// Blend between frames while playing
    #[arg(short, long)]
    interpolate: bool,

    /// Ignore positional channels so roots stay in place
    #[arg(long)]
    fix_origin: bool,

    /// Frames to play back when running without a window
    #[arg(long, default_value_t = 10)]
    frames: usize,

    /// World units per file unit (e.g. 0.01 for centimetre data)
    #[arg(long, default_value_t = 1.0)]
    scale: f64,

    /// Increase verbosity (can be repeated)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logger; -v / -q take precedence over RUST_LOG
    let mut logger =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"));
    if let Some(level) = log_level(cli.verbose, cli.quiet) {
        logger.filter_level(level);
    }
    logger.init();

    let animation = load_bvh_from_file(&cli.file)
        .with_context(|| format!("failed to load {}", cli.file.display()))?;

    let config = ViewerConfig {
        interpolate: cli.interpolate,
        fix_origin: cli.fix_origin,
        scale: cli.scale,
        ..ViewerConfig::default()
    };

    run(config, animation, cli.frames);
    Ok(())
}

/// Level requested on the command line, if any.
fn log_level(verbose: u8, quiet: bool) -> Option<log::LevelFilter> {
    match verbose {
        0 if quiet => Some(log::LevelFilter::Error),
        0 => None,
        1 => Some(log::LevelFilter::Info),
        2 => Some(log::LevelFilter::Debug),
        _ => Some(log::LevelFilter::Trace),
    }
}

/// Open the window viewer on the loaded clip.
#[cfg(feature = "visualize")]
fn run(config: ViewerConfig, animation: bvh_viewer::Animation, _frames: usize) {
    let mut ctx = ViewerContext::new(config);
    ctx.set_animation(animation);
    bvh_viewer::visualize::run_viewer(ctx);
}

#[cfg(not(feature = "visualize"))]
fn run(config: ViewerConfig, animation: bvh_viewer::Animation, frames: usize) {
    play_headless(config, animation, frames);
}

/// Step through `frames` frames on a manual clock, printing joint positions.
#[cfg(not(feature = "visualize"))]
fn play_headless(config: ViewerConfig, animation: bvh_viewer::Animation, frames: usize) {
    use bvh_viewer::clock::ManualClock;
    use bvh_viewer::PlaybackStep;

    let scale = config.scale;
    let clock = ManualClock::new();
    let mut ctx = ViewerContext::with_clock(config, clock.clone());
    let frame_time = animation.frame_time();
    ctx.set_animation(animation);
    ctx.toggle_playback();
    if let Some(animation) = ctx.animation() {
        println!(
            "{} frames at {:.2} fps ({:.2}s)",
            animation.frame_count(),
            animation.fps(),
            animation.duration()
        );
    }

    for _ in 0..frames {
        clock.advance(frame_time * 1.01);
        if let PlaybackStep::Idle = ctx.tick() {
            println!("clip has no frames");
            return;
        }
        let Some(animation) = ctx.animation() else {
            return;
        };
        println!("frame {}", animation.frame());
        for (joint, position) in animation.joints().iter().zip(animation.world_positions()) {
            let p = position * scale;
            println!("  {:.<30} {:10.4} {:10.4} {:10.4}", joint.name, p.x, p.y, p.z);
        }
    }
}
