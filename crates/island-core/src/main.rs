//! Island Simulation
//!
//! Headless runner: seeds an island, plays it forward day by day and reports
//! how the gods fared.

use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use island_core::events::NotificationLogger;
use island_core::output::write_snapshot;
use island_core::{SimConfig, Simulation};

/// Command line arguments for the simulation
#[derive(Parser, Debug)]
#[command(name = "island_sim")]
#[command(about = "A headless island god simulation")]
struct Args {
    /// Random seed for reproducibility (overrides the config file)
    #[arg(long)]
    seed: Option<u64>,

    /// Number of simulated days to run
    #[arg(long, default_value_t = 10)]
    days: u32,

    /// Frames per simulated second
    #[arg(long, default_value_t = 30)]
    fps: u32,

    /// Game speed multiplier (overrides the config file)
    #[arg(long)]
    speed: Option<f32>,

    /// Config file (defaults to island.toml when present)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Write every notification to this JSONL file
    #[arg(long)]
    events: Option<PathBuf>,

    /// Write the final world snapshot to this JSON file
    #[arg(long)]
    snapshot: Option<PathBuf>,

    /// Debug mode: no victory or defeat
    #[arg(long)]
    sandbox: bool,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => match SimConfig::load(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Error: could not load {}: {}", path.display(), e);
                std::process::exit(1);
            }
        },
        None => SimConfig::load_or_default(),
    };
    if let Some(seed) = args.seed {
        config.simulation.seed = seed;
    }
    if let Some(speed) = args.speed {
        config.simulation.game_speed = speed.max(0.0);
    }
    config.simulation.sandbox |= args.sandbox;

    let fps = args.fps.max(1);
    let seconds = (args.days as f32 * config.day_cycle.day_length_secs).ceil() as u64;

    println!("Island Simulation");
    println!("=================");
    println!("Seed: {}", config.simulation.seed);
    println!("Days: {} ({} simulated seconds)", args.days, seconds);
    println!("Frames per second: {}", fps);
    println!("Game speed: {}", config.simulation.game_speed);
    if config.simulation.sandbox {
        println!("Sandbox mode: outcomes disabled");
    }
    println!();

    let mut logger = match &args.events {
        Some(path) => match NotificationLogger::new(path) {
            Ok(logger) => logger,
            Err(e) => {
                eprintln!("Warning: Could not open event log {}: {}", path.display(), e);
                NotificationLogger::null()
            }
        },
        None => NotificationLogger::null(),
    };

    let mut sim = Simulation::new(config);
    let frame_dt = 1.0 / fps as f32;
    let mut last_day = 0;

    for _ in 0..seconds {
        for _ in 0..fps {
            sim.frame(frame_dt);
        }
        sim.tick(1.0);

        let notes = sim.drain_notifications();
        if let Err(e) = logger.log_batch(&notes) {
            eprintln!("Warning: Could not write events: {}", e);
        }

        let day = sim.clock().day();
        if day != last_day {
            last_day = day;
            let ledger = sim.ledger();
            let counts = sim.population().counts();
            println!(
                "[Day {:>3}] faith {:>5.1}  mana {:>5.1}  hearts {:>2}  natives {:>3}  settlers {:>3}  invaders {:>3}",
                day,
                ledger.faith(),
                ledger.mana(),
                ledger.hearts(),
                counts.natives,
                counts.settlers,
                counts.invaders
            );
        }

        if sim.outcome().is_some() {
            break;
        }
    }

    if let Err(e) = logger.flush() {
        eprintln!("Warning: Could not flush event log: {}", e);
    }

    let snapshot = sim.snapshot();
    if let Some(path) = &args.snapshot {
        match write_snapshot(&snapshot, path) {
            Ok(()) => println!("Wrote {}", path.display()),
            Err(e) => eprintln!("Warning: Could not write snapshot: {}", e),
        }
    }

    println!();
    match snapshot.outcome {
        Some(outcome) => println!("Simulation ended on day {}: {:?}", snapshot.day, outcome),
        None => println!("Simulation complete after {} days.", snapshot.day),
    }
    println!(
        "Final ledger: faith {:.1}, mana {:.1}, hearts {}",
        snapshot.ledger.faith, snapshot.ledger.mana, snapshot.ledger.hearts
    );
    println!(
        "Population: {} natives, {} settlers, {} invaders",
        snapshot.ledger.natives, snapshot.ledger.settlers, snapshot.ledger.invaders
    );
    println!("World events: {}", snapshot.event_history.len());
    println!("Notifications logged: {}", logger.count());
}
