//! # plotsim
//!
//! Simulated XY pen plotter. G-code is read from standard input, replies
//! (`ok`, `error: ...`) are written to standard output, and the pen path is
//! logged to standard error.

use std::process;
use std::thread;
use std::time::Duration;

use anyhow::{bail, Context};
use clap::Parser;
use plotcore::{MachineConfig, Simulator};
use plotsim_lib::{StdioChannel, TraceRenderer};
use tracing::{error, info};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

/// Plotter firmware simulator
#[derive(Parser, Debug)]
#[command(name = "plotsim")]
#[command(version)]
#[command(about = "Simulates an XY pen plotter's G-code handling and motion")]
struct Args {
    /// Travel of each axis, in mm.
    #[arg(long, default_value_t = MachineConfig::AXIS_TRAVEL)]
    axis_travel: f64,

    /// Pen heights above this are pen-up.
    #[arg(long, default_value_t = MachineConfig::PEN_THRESHOLD)]
    pen_threshold: f64,

    /// Simulation tick, in seconds.
    #[arg(long, default_value_t = MachineConfig::TICK)]
    tick: f64,

    /// Feed rate at power-on, in mm/min.
    #[arg(long, default_value_t = MachineConfig::INITIAL_FEED_RATE)]
    feed_rate: f64,

    /// Sleep one tick between ticks, animating in real time.
    #[arg(long)]
    realtime: bool,

    /// Stop after this many ticks.
    #[arg(long, value_name = "TICKS")]
    max_ticks: Option<u64>,

    /// Enable verbose logging (DEBUG level).
    #[arg(short, long)]
    verbose: bool,

    /// Output logs in JSON format.
    #[arg(long)]
    json: bool,
}
impl Args {
    fn machine_config(&self) -> anyhow::Result<MachineConfig> {
        if !(self.axis_travel > 0.0) {
            bail!("axis travel must be positive, got {}", self.axis_travel);
        }
        if !(self.tick > 0.0) {
            bail!("tick must be positive, got {}", self.tick);
        }
        if !(self.feed_rate > 0.0) {
            bail!("feed rate must be positive, got {}", self.feed_rate);
        }
        Ok(MachineConfig {
            axis_travel: self.axis_travel,
            pen_threshold: self.pen_threshold,
            tick: self.tick,
            initial_feed_rate: self.feed_rate,
            ..MachineConfig::default()
        })
    }
}

fn main() {
    let args = Args::parse();
    setup_tracing(&args);

    if let Err(e) = run(&args) {
        error!("{e:#}");
        process::exit(1);
    }
}

fn run(args: &Args) -> anyhow::Result<()> {
    let config = args.machine_config()?;
    let channel = StdioChannel::spawn().context("starting stdin reader")?;
    let mut simulator: Simulator<_, _> = Simulator::new(channel, TraceRenderer::new(), config);
    let pause = Duration::from_secs_f64(config.tick);

    loop {
        simulator.step().context("serial link failed")?;

        let drained = simulator.transport().channel().is_closed()
            && !simulator.transport().has_partial_line()
            && simulator.session().is_idle();
        if drained {
            break;
        }
        if args.max_ticks.is_some_and(|max| simulator.ticks() >= max) {
            info!("tick limit reached");
            break;
        }
        if args.realtime {
            thread::sleep(pause);
        }
    }

    let state = simulator.session().state();
    let renderer = simulator.renderer();
    info!(
        ticks = simulator.ticks(),
        seconds = simulator.elapsed(),
        x_mm = state.position().x * config.axis_travel,
        y_mm = state.position().y * config.axis_travel,
        drawn_mm = renderer.drawn() * config.axis_travel,
        travelled_mm = renderer.travelled() * config.axis_travel,
        homings = renderer.homings(),
        pending = simulator.session().queue().len(),
        "simulation finished"
    );
    Ok(())
}

fn setup_tracing(args: &Args) {
    let level = if args.verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::INFO
    };
    let filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);
    if args.json {
        builder.json().init();
    } else {
        builder.compact().init();
    }
}
