use anyhow::{bail, Context, Result};
use clap::Parser;
use colored::*;
use maze::prelude::*;
use maze_core::core::grid::{ARENA_LENGTH, ARENA_WIDTH};
use std::path::PathBuf;
use tokio::sync::broadcast::error::RecvError;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "maze_sim")]
#[command(about = "Explore a grid maze, then run the fastest path")]
#[command(version)]
struct Cli {
    /// Map descriptor to load as the arena layout
    #[arg(short = 'd', long = "descriptor", value_name = "FILE")]
    descriptor: Option<PathBuf>,

    /// Seed for a random layout when no descriptor is given
    #[arg(long = "random-seed", default_value = "7")]
    random_seed: u64,

    /// Obstacle density of the random layout
    #[arg(long = "density", default_value = "0.1")]
    density: f64,

    /// Steps per second
    #[arg(short = 's', long = "speed", default_value = "1")]
    speed: String,

    /// Target coverage in percent
    #[arg(short = 'c', long = "coverage")]
    coverage: Option<String>,

    /// Exploration time limit in seconds
    #[arg(long = "explore-limit")]
    explore_limit: Option<String>,

    /// Fastest-path time limit in seconds
    #[arg(long = "ffp-limit")]
    ffp_limit: Option<String>,

    /// Start position, 1-indexed "x,y"
    #[arg(long = "start", default_value = "2,2", value_parser = parse_start)]
    start: (i32, i32),

    /// Connect to a robot at ADDR instead of simulating; sensing reads --descriptor
    #[arg(long = "hardware", value_name = "ADDR")]
    hardware: Option<String>,

    /// Parameter file (defaults to .maze/config/params.yaml)
    #[arg(short = 'p', long = "params", value_name = "YAML")]
    params: Option<PathBuf>,
}

fn parse_start(text: &str) -> std::result::Result<(i32, i32), String> {
    let (x, y) = text
        .split_once(',')
        .ok_or_else(|| format!("expected \"x,y\", got {:?}", text))?;
    let x = x.trim().parse().map_err(|e| format!("bad x: {}", e))?;
    let y = y.trim().parse().map_err(|e| format!("bad y: {}", e))?;
    Ok((x, y))
}

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "maze_sim=info,maze_library=info,maze_core=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    if let Err(e) = run(cli).await {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let params = match &cli.params {
        Some(path) => RuntimeParams::init_from(path)
            .with_context(|| format!("reading parameters from {}", path.display()))?,
        None => RuntimeParams::init().context("reading default parameters")?,
    };
    let mut config = SessionConfig::from_params(&params)?;
    let mode = match &cli.hardware {
        Some(addr) => {
            config.link_address = addr.clone();
            RunMode::Hardware
        }
        None => RunMode::Simulation,
    };

    let canvas = Canvas::new(ARENA_LENGTH, ARENA_WIDTH);
    let ctx = MazeContext::new(config, mode, canvas.clone())?;
    let controller = Arc::new(MazeController::new(ctx));
    let printer = tokio::spawn(print_status(controller.status().clone()));

    match &cli.descriptor {
        Some(path) => controller
            .load_descriptor(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None if mode == RunMode::Simulation => {
            controller.edit_layout(Arena::random(cli.random_seed, cli.density))?;
            controller.load_layout()?;
        }
        None => {}
    }

    controller.set_speed(&cli.speed)?;
    if let Some(coverage) = &cli.coverage {
        controller.set_coverage(coverage)?;
    }
    if let Some(limit) = &cli.explore_limit {
        controller.set_explore_time_limit(limit)?;
    }
    if let Some(limit) = &cli.ffp_limit {
        controller.set_ffp_time_limit(limit)?;
    }

    match mode {
        RunMode::Simulation => {
            let (x, y) = cli.start;
            controller.reset_robot(x, y)?;
            controller.start_exploration()?;
        }
        RunMode::Hardware => {
            controller
                .connect_hardware()?
                .await
                .context("handshake task failed")??;
        }
    }

    let Some(explored) = controller.wait_exploration().await else {
        bail!("exploration ended without an outcome");
    };
    println!(
        "{} {:?}, {} steps, {:.1}% covered",
        "Exploration:".cyan().bold(),
        explored.state,
        explored.steps,
        explored.coverage
    );

    if mode == RunMode::Hardware || controller.status().ffp_enabled() {
        controller.find_fastest_path()?;
        if let Some(outcome) = controller.wait_fastest_path().await {
            match &outcome.path {
                Some(path) => println!(
                    "{} {} ({:?})",
                    "Fastest path:".green().bold(),
                    path.log_summary(),
                    outcome.state
                ),
                None => println!("{} no path found", "Fastest path:".yellow().bold()),
            }
        }
    } else {
        println!(
            "{} goal zone not reached, skipping fastest path",
            "Note:".yellow()
        );
    }

    println!("\n{}", canvas.render_ascii());
    printer.abort();
    Ok(())
}

async fn print_status(status: StatusBoard) {
    let mut events = status.subscribe();
    loop {
        match events.recv().await {
            Ok(StatusEvent::Status(line)) => println!("{} {}", "→".cyan(), line),
            Ok(StatusEvent::Alert(line)) => println!("{} {}", "!".red().bold(), line.red()),
            Ok(StatusEvent::TimerMessage(line)) if !line.is_empty() => {
                println!("{} {}", "⏱".yellow(), line)
            }
            Ok(_) => {}
            Err(RecvError::Lagged(_)) => continue,
            Err(RecvError::Closed) => break,
        }
    }
}
