//! DTN Log Player CLI Application
//!
//! This is the command-line host for the dtn-log-player library.
//! It adds:
//! - Configuration from config.toml and command-line flags
//! - A real-time (or instant) event loop driving the player's timers
//! - A plain-text renderer for every displayed frame
//! - JSON export of the final node state

use anyhow::{bail, Context, Result};
use clap::Parser;
use dtn_log_player::{Area, NodeTable, Player, TimerQueue};
use serde::Serialize;
use std::path::PathBuf;

mod config;
mod host;
mod render;

use config::AppConfig;
use host::Pacing;
use render::TextRenderer;

/// DTN Log Player - Replay recorded delay-tolerant network simulations
#[derive(Parser, Debug)]
#[command(name = "dtn-log-cli")]
#[command(about = "Replay a recorded DTN simulation log frame by frame", long_about = None)]
#[command(version)]
struct Args {
    /// Path to the simulation log file
    #[arg(short, long, value_name = "FILE")]
    log: Option<PathBuf>,

    /// Path to configuration file (config.toml)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Jump to this frame index, print it and exit
    #[arg(long, value_name = "INDEX", conflicts_with = "at_time")]
    jump: Option<usize>,

    /// Jump to the last frame at or before this simulation time and exit
    #[arg(long, value_name = "TIME")]
    at_time: Option<f64>,

    /// Node to show details for
    #[arg(long, value_name = "NODE")]
    select: Option<String>,

    /// Do not wait between frames
    #[arg(long)]
    instant: bool,

    /// Playback speed factor (overrides config)
    #[arg(long, value_name = "FACTOR")]
    speed: Option<f64>,

    /// Print the final node state as JSON instead of text frames
    #[arg(long)]
    json: bool,

    /// Verbosity level (can be repeated: -v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long)]
    quiet: bool,
}

/// JSON report of where playback ended
#[derive(Serialize)]
struct StateReport<'a> {
    frame: usize,
    time: f64,
    area: Option<Area>,
    nodes: &'a NodeTable,
}

fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Initialize logging
    init_logging(args.verbose, args.quiet);

    log::info!("DTN Log Player CLI v{}", env!("CARGO_PKG_VERSION"));
    log::info!("Using player library v{}", dtn_log_player::VERSION);

    let config = resolve_config(&args)?;
    let Some(log_path) = args.log.clone().or_else(|| config.input.log.clone()) else {
        println!("DTN Log Player - No input specified");
        println!("\nQuick Start:");
        println!("  dtn-log-cli --log run.log");
        println!("  dtn-log-cli --log run.log --jump 120 --select ferry1");
        println!("  dtn-log-cli --config config.toml --instant --json");
        println!("\nUse --help for more options");
        return Ok(());
    };

    let parsed = dtn_log_player::parse_log_file(&log_path)
        .with_context(|| format!("Failed to load log file: {:?}", log_path))?;

    let renderer = TextRenderer::stdout(!args.json && !args.quiet);
    let mut player = Player::new(
        parsed,
        config.playback.player_config(),
        TimerQueue::new(),
        renderer,
    )
    .context("Failed to apply the first frame")?;

    if let Some(nid) = &args.select {
        player
            .select_node(Some(nid))
            .with_context(|| format!("Cannot select node {:?}", nid))?;
    }

    if let Some(index) = args.jump {
        player
            .jump(index)
            .with_context(|| format!("Cannot jump to frame {}", index))?;
    } else if let Some(time) = args.at_time {
        player
            .jump_to_time(time)
            .with_context(|| format!("Cannot jump to time {}", time))?;
    } else {
        let pacing = Pacing {
            instant: config.playback.instant,
            speed: config.playback.speed,
        };
        host::play_to_end(&mut player, pacing)?;
    }

    if args.json {
        let report = StateReport {
            frame: player.displayed_index(),
            time: player.current_time(),
            area: player.area(),
            nodes: player.nodes(),
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
    }

    log::debug!("Rendered {} frame(s)", player.renderer().rendered());
    player.shutdown();
    Ok(())
}

/// Load the config file (if any) and apply command-line overrides
fn resolve_config(args: &Args) -> Result<AppConfig> {
    let mut config = match &args.config {
        Some(path) => {
            log::info!("Loading configuration from: {:?}", path);
            config::load_config(path)?
        }
        None => AppConfig::default(),
    };

    if args.instant {
        config.playback.instant = true;
    }
    if let Some(speed) = args.speed {
        config.playback.speed = speed;
    }

    if let Err(e) = config.validate() {
        bail!("Invalid playback options: {}", e);
    }

    log::debug!("Effective configuration: {:?}", config);
    Ok(config)
}

/// Initialize logging based on verbosity level
fn init_logging(verbose: u8, quiet: bool) {
    use env_logger::Builder;
    use log::LevelFilter;
    use std::io::Write;

    let level = if quiet {
        LevelFilter::Error
    } else {
        match verbose {
            0 => LevelFilter::Info,
            1 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    };

    Builder::new()
        .filter_level(level)
        .format(|buf, record| {
            writeln!(
                buf,
                "[{} {}] {}",
                record.level(),
                record.target(),
                record.args()
            )
        })
        .init();
}
