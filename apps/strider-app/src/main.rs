//! Strider procedural gait CLI.
//!
//! Provides two modes of operation:
//! - `walk`: Drive a rig over analytic terrain headless and print gait statistics
//! - `config`: Load and validate a rig TOML file and print a summary

mod scene;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::builder::TypedValueParser;
use clap::{Parser, Subcommand};
use nalgebra::Vector3;
use tracing::{error, info};

use strider_core::config::{BalanceConfig, RigConfig};
use strider_core::error::StriderError;
use strider_core::pose::{position, yaw_of};
use strider_gait::{BodyDriver, DriveInput, GaitCoordinator, LegEvent};

use scene::{Pacing, Strategy, TerrainKind, build_rig, build_terrain};

// ---------------------------------------------------------------------------
// CLI
// ---------------------------------------------------------------------------

/// Procedural multi-leg locomotion.
#[derive(Parser)]
#[command(version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Walk a rig over terrain and print gait statistics.
    Walk {
        /// Built-in rig leg count (4 or 6). Ignored with --config.
        #[arg(short, long, default_value_t = 4, value_parser = clap::builder::PossibleValuesParser::new(["4", "6"]).map(|s| if s == "6" { 6_u8 } else { 4 }))]
        legs: u8,

        /// Terrain to walk on.
        #[arg(short, long, value_enum, default_value_t = TerrainKind::Flat)]
        terrain: TerrainKind,

        /// Number of ticks to simulate.
        #[arg(short = 'n', long, default_value_t = 600)]
        ticks: u32,

        /// Frame delta in seconds.
        #[arg(long, default_value_t = 1.0 / 60.0)]
        dt: f32,

        /// Forward input in [-1, 1].
        #[arg(short, long, default_value_t = 1.0, allow_negative_numbers = true)]
        forward: f32,

        /// Turn input in [-1, 1].
        #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
        turn: f32,

        /// Body balancing strategy for built-in rigs.
        #[arg(short, long, value_enum, default_value_t = Strategy::Split)]
        strategy: Strategy,

        /// Step pacing for built-in rigs.
        #[arg(short, long, value_enum, default_value_t = Pacing::Advisory)]
        pacing: Pacing,

        /// Load the rig from a TOML file instead.
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Load and validate a rig file.
    Config {
        /// Path to the rig TOML file.
        path: PathBuf,
    },
}

// ---------------------------------------------------------------------------
// Statistics
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
struct WalkStats {
    steps: Vec<usize>,
    max_concurrent: usize,
    min_height: f32,
    max_height: f32,
}

impl WalkStats {
    fn new(legs: usize, height: f32) -> Self {
        Self {
            steps: vec![0; legs],
            max_concurrent: 0,
            min_height: height,
            max_height: height,
        }
    }

    fn record(&mut self, events: &[LegEvent], stepping: usize, height: f32) {
        for (count, event) in self.steps.iter_mut().zip(events) {
            if *event == LegEvent::StepStarted {
                *count += 1;
            }
        }
        self.max_concurrent = self.max_concurrent.max(stepping);
        self.min_height = self.min_height.min(height);
        self.max_height = self.max_height.max(height);
    }
}

// ---------------------------------------------------------------------------
// Mode implementations
// ---------------------------------------------------------------------------

struct WalkArgs {
    legs: u8,
    terrain: TerrainKind,
    ticks: u32,
    dt: f32,
    input: DriveInput,
    strategy: Strategy,
    pacing: Pacing,
    config: Option<PathBuf>,
}

fn run_walk(args: WalkArgs) -> Result<(), StriderError> {
    let cfg = match &args.config {
        Some(path) => RigConfig::from_file(path)?,
        None => build_rig(args.legs, args.strategy, args.pacing),
    };
    let mut rig = GaitCoordinator::from_config(&cfg)?;
    let driver = BodyDriver::new(cfg.drive);
    let terrain = build_terrain(args.terrain);
    info!(
        legs = rig.legs().len(),
        terrain = ?args.terrain,
        balance = rig.balance().name(),
        "walking"
    );

    let mut stats = WalkStats::new(rig.legs().len(), rig.body().translation.vector.y);
    for _ in 0..args.ticks {
        driver.drive(rig.body_mut(), args.input, args.dt);
        let report = rig.tick(args.dt, &terrain);
        stats.record(
            &report.events,
            rig.stepping_count(),
            rig.body().translation.vector.y,
        );
    }

    let body = rig.body();
    let p = position(body);
    // nose-down pitch is positive
    let pitch = -(body.rotation * Vector3::z()).y.asin().to_degrees();
    println!("ticks={}, time={}", args.ticks, rig.now());
    println!(
        "body: position=({:.3}, {:.3}, {:.3}), yaw={:.1}deg, pitch={:.2}deg",
        p.x,
        p.y,
        p.z,
        yaw_of(&body.rotation).to_degrees(),
        pitch
    );
    println!(
        "body height: min={:.3}, max={:.3}",
        stats.min_height, stats.max_height
    );
    println!("max legs stepping at once: {}", stats.max_concurrent);
    for (leg, steps) in rig.legs().iter().zip(&stats.steps) {
        let state = if leg.is_enabled() { "" } else { " (disabled)" };
        println!("  {:<14} steps={steps}{state}", leg.name());
    }
    let total: usize = stats.steps.iter().sum();
    println!("\ntotal steps: {total}");
    Ok(())
}

fn run_config(path: &Path) -> Result<(), StriderError> {
    let cfg = RigConfig::from_file(path)?;
    println!("{}: ok", path.display());
    println!("legs: {}", cfg.legs.len());
    for leg in &cfg.legs {
        let [x, y, z] = leg.mount.position;
        let foot = if leg.foot_target.is_some() {
            ""
        } else {
            " (no foot target, will be disabled)"
        };
        println!(
            "  {:<14} mount=({x:.2}, {y:.2}, {z:.2}) step_distance={} step_duration={}{foot}",
            leg.name, leg.step.step_distance, leg.step.step_duration
        );
    }
    match cfg.balance {
        BalanceConfig::Split(b) => println!(
            "balance: split (height_offset={}, max_pitch_deg={})",
            b.height_offset, b.max_pitch_deg
        ),
        BalanceConfig::PlaneFit(b) => println!(
            "balance: plane_fit (height_offset={}, smooth_speed={})",
            b.height_offset, b.smooth_speed
        ),
    }
    println!(
        "pacing: {:?}, min_step_interval={}",
        cfg.pacing.mode, cfg.pacing.min_step_interval
    );
    Ok(())
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Walk {
            legs,
            terrain,
            ticks,
            dt,
            forward,
            turn,
            strategy,
            pacing,
            config,
        } => run_walk(WalkArgs {
            legs,
            terrain,
            ticks,
            dt,
            input: DriveInput::new(forward, turn),
            strategy,
            pacing,
            config,
        }),
        Commands::Config { path } => run_config(&path),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}
