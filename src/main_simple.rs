use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;

use traffic_signal::{
    config::{IntersectionConfig, DEFAULT_CONFIG_FILE},
    output::SimulatedOutput,
    simulation::{ManualClock, QueueScheduler, RandomDemand, ShutdownSignal, SignalController},
};

/// Runs the scheduler over simulated time and prints a service report.
#[derive(Parser)]
#[command(name = "traffic-signal-report")]
struct Args {
    /// Intersection configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Number of cycles to simulate
    #[arg(short = 'n', long, default_value = "100")]
    cycles: u64,

    /// Random seed for reproducible queue generation
    #[arg(short, long)]
    seed: Option<u64>,
}

fn main() -> Result<()> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Warn)
        .init();
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => IntersectionConfig::load_from_file(path)?,
        None if std::path::Path::new(DEFAULT_CONFIG_FILE).exists() => {
            IntersectionConfig::load_from_file(DEFAULT_CONFIG_FILE)?
        }
        None => IntersectionConfig::default(),
    };
    let seed = args.seed.or(config.random.seed);

    let clock = ManualClock::new();
    let mut controller = SignalController::new(
        SimulatedOutput::new(),
        clock.clone(),
        &config.signals.approaches,
        config.timing.yellow_dwell(),
        ShutdownSignal::new(),
    );
    controller.initialize()?;

    let mut scheduler = QueueScheduler::new(controller, RandomDemand::new(seed), &config.timing, &config.demand);
    let summary = scheduler.run(Some(args.cycles))?;

    let stats = scheduler.stats();
    let elapsed = clock.elapsed().as_secs_f64();

    println!("Cycles:               {}", summary.cycles_completed);
    println!("Simulated time:       {:.1}s", elapsed);
    println!("Vehicles served:      {}", stats.vehicles_served());
    println!("Yellow transitions:   {}", stats.yellow_transitions());
    println!("Phases per cycle:     {:.2}", stats.average_phases_per_cycle());
    for approach in scheduler.controller().approaches() {
        let totals = stats.totals(approach);
        println!("  {}: {:>6} vehicles in {:>5} phases", approach, totals.vehicles, totals.phases);
    }
    if elapsed > 0.0 {
        println!("Throughput:           {:.2} vehicles/s", stats.vehicles_served() as f64 / elapsed);
    }

    scheduler.into_controller().shutdown()?;
    Ok(())
}
