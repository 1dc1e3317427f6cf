use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use log::{error, info};
use std::path::{Path, PathBuf};

use traffic_signal::{
    config::{IntersectionConfig, Validate, DEFAULT_CONFIG_FILE},
    output::{OutputBackend, OutputDriver, DEFAULT_GPIO_CHIP},
    simulation::{QueueScheduler, RandomDemand, ShutdownSignal, SignalController, ThreadClock},
};

#[derive(Parser)]
#[command(name = "traffic-signal")]
#[command(about = "Three-way intersection signal controller with queue-driven phases")]
struct Args {
    /// Intersection configuration file (defaults to intersection.toml when present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Where signal outputs are driven
    #[arg(short, long, value_enum, default_value_t = Output::Simulated)]
    output: Output,

    /// GPIO character device used by the gpio output
    #[arg(long, default_value = DEFAULT_GPIO_CHIP)]
    gpio_chip: PathBuf,

    /// Random seed for reproducible queue generation
    #[arg(short, long)]
    seed: Option<u64>,

    /// Multiplier applied to every delay (0.1 runs ten times faster)
    #[arg(short, long)]
    time_scale: Option<f64>,

    /// Stop after this many cycles instead of running until interrupted
    #[arg(long)]
    cycles: Option<u64>,

    /// Enable verbose logging of signal transitions
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum)]
enum Output {
    /// In-memory output bank
    Simulated,
    /// Linux GPIO character device lines
    Gpio,
}

fn load_config(args: &Args) -> Result<IntersectionConfig> {
    let mut config = match &args.config {
        Some(path) => IntersectionConfig::load_from_file(path)?,
        None if Path::new(DEFAULT_CONFIG_FILE).exists() => {
            IntersectionConfig::load_from_file(DEFAULT_CONFIG_FILE)?
        }
        None => {
            info!("No configuration file found, using built-in defaults");
            IntersectionConfig::default()
        }
    };

    if let Some(seed) = args.seed {
        config.random.seed = Some(seed);
    }
    if let Some(time_scale) = args.time_scale {
        config.timing.time_scale = time_scale;
    }
    config.validate()?;

    Ok(config)
}

fn main() -> Result<()> {
    let args = Args::parse();

    env_logger::Builder::from_default_env()
        .filter_level(if args.verbose { log::LevelFilter::Debug } else { log::LevelFilter::Info })
        .init();
    info!("Starting traffic signal controller");

    let config = load_config(&args)?;

    // The listener only raises the flag; the control loop notices it before
    // its next sleep.
    let shutdown = ShutdownSignal::new();
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(1)
        .enable_all()
        .build()
        .context("failed to start interrupt listener")?;
    let listener = shutdown.clone();
    runtime.spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Interrupt received, finishing current step");
                listener.request();
            }
            Err(e) => error!("Unable to listen for interrupts: {}", e),
        }
    });

    let output = match args.output {
        Output::Simulated => OutputDriver::new_simulated(),
        Output::Gpio => OutputDriver::new_gpio(&args.gpio_chip)?,
    };
    info!("Signal outputs: {}", output.get_name());

    let clock = ThreadClock::new(config.timing.time_scale);
    let mut controller = SignalController::new(
        output,
        clock,
        &config.signals.approaches,
        config.timing.yellow_dwell(),
        shutdown.clone(),
    );
    controller.initialize().context("failed to initialize signal outputs")?;

    let demand = RandomDemand::new(config.random.seed);
    let mut scheduler = QueueScheduler::new(controller, demand, &config.timing, &config.demand);

    let summary = scheduler.run(args.cycles)?;
    let stats = scheduler.stats();
    info!("Stopped after {} cycles ({} vehicles served, {} yellow transitions){}",
          summary.cycles_completed,
          stats.vehicles_served(),
          stats.yellow_transitions(),
          if summary.interrupted { ", interrupted" } else { "" });

    scheduler.into_controller().shutdown().context("failed to reset signal outputs")?;
    runtime.shutdown_background();

    Ok(())
}
