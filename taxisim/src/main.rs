//! Taxi fleet simulation application.
#![warn(
    missing_docs,
    trivial_casts,
    trivial_numeric_casts,
    unused_import_braces,
    unused_qualifications
)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions, clippy::default_trait_access)]

use std::convert::TryFrom;
use std::fs::File;
use std::io;
use std::path::PathBuf;

use clap::Parser;
use eyre::WrapErr;

use taxisim::{CsvSink, DurationModel, EventSink, LogSink, SimulationConfig, TextSink, Time};

/// Runs a discrete-event simulation of a taxi fleet.
#[derive(Parser)]
#[clap(version, author)]
struct Opt {
    /// Path to a JSON file with the simulation configuration.
    /// Options passed explicitly in the command line take precedence.
    #[clap(long)]
    config: Option<PathBuf>,

    /// No new events are processed once the simulation clock reaches this time.
    #[clap(short, long)]
    end_time: Option<Time>,

    /// Number of taxis.
    #[clap(short, long)]
    taxis: Option<usize>,

    /// Seed to use for random number generator.
    #[clap(short, long)]
    seed: Option<u64>,

    /// Time between consecutive taxis leaving the garage.
    #[clap(long)]
    departure_interval: Option<Time>,

    /// Average time of searching for a passenger.
    #[clap(long)]
    search_mean: Option<f64>,

    /// Average trip time.
    #[clap(long)]
    trip_mean: Option<f64>,

    /// How delays are determined: `exponential` or `fixed`.
    #[clap(long)]
    durations: Option<DurationModel>,

    /// Write dispatched events in CSV format to this file.
    #[clap(long)]
    csv: Option<PathBuf>,

    /// Write the final report in JSON format to this file.
    #[clap(long)]
    report: Option<PathBuf>,

    /// Do not print events to the stdout.
    #[clap(short, long)]
    quiet: bool,

    /// Verbosity.
    #[clap(short, long, parse(from_occurrences))]
    verbose: u64,

    /// Store the logs this file.
    #[clap(long)]
    log_output: Option<PathBuf>,

    /// Do not log to the stderr.
    #[clap(long)]
    no_stderr: bool,
}

impl TryFrom<&Opt> for SimulationConfig {
    type Error = eyre::Error;
    fn try_from(opt: &Opt) -> eyre::Result<Self> {
        let mut config: SimulationConfig = if let Some(path) = &opt.config {
            let file = File::open(path)
                .wrap_err_with(|| format!("unable to open config: {}", path.display()))?;
            serde_json::from_reader(file)
                .wrap_err_with(|| format!("unable to parse config: {}", path.display()))?
        } else {
            SimulationConfig::default()
        };
        if let Some(horizon) = opt.end_time {
            config.horizon = horizon;
        }
        if let Some(num_taxis) = opt.taxis {
            config.num_taxis = num_taxis;
        }
        if opt.seed.is_some() {
            config.seed = opt.seed;
        }
        if let Some(interval) = opt.departure_interval {
            config.departure_interval = interval;
        }
        if let Some(mean) = opt.search_mean {
            config.search_mean = mean;
        }
        if let Some(mean) = opt.trip_mean {
            config.trip_mean = mean;
        }
        if let Some(model) = opt.durations {
            config.durations = model;
        }
        config.validate().wrap_err("invalid configuration")?;
        Ok(config)
    }
}

/// Builds the event sinks requested by the user.
fn sinks(opt: &Opt) -> eyre::Result<Vec<Box<dyn EventSink>>> {
    let mut sinks: Vec<Box<dyn EventSink>> = Vec::new();
    sinks.push(Box::new(LogSink));
    if !opt.quiet {
        sinks.push(Box::new(TextSink::new(io::BufWriter::new(io::stdout()))));
    }
    if let Some(path) = &opt.csv {
        let file = File::create(path)
            .wrap_err_with(|| format!("unable to create CSV file: {}", path.display()))?;
        sinks.push(Box::new(CsvSink::new(io::BufWriter::new(file))));
    }
    Ok(sinks)
}

/// Set up a logger based on the given user options.
fn set_up_logger(opt: &Opt) -> Result<(), fern::InitError> {
    let log_level = match opt.verbose {
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        3 => log::LevelFilter::Trace,
        _ => log::LevelFilter::Warn,
    };
    let dispatch = fern::Dispatch::new()
        .format(|out, message, record| out.finish(format_args!("[{}] {}", record.level(), message)))
        .level(log_level);
    let dispatch = if let Some(path) = &opt.log_output {
        let _ = std::fs::remove_file(path);
        dispatch.chain(
            std::fs::OpenOptions::new()
                .write(true)
                .create(true)
                .append(false)
                .open(path)?,
        )
    } else {
        dispatch
    };
    let dispatch = if opt.no_stderr {
        dispatch
    } else {
        dispatch.chain(std::io::stderr())
    };
    dispatch.apply()?;
    Ok(())
}

fn main() -> eyre::Result<()> {
    color_eyre::install()?;
    let opt = Opt::parse();
    set_up_logger(&opt)?;
    let config = SimulationConfig::try_from(&opt)?;
    let mut sinks = sinks(&opt)?;
    let report = config.run(&mut sinks).wrap_err("simulation failed")?;
    println!("*** {} at time {} ***", report.termination, report.clock);
    if let Some(path) = &opt.report {
        let file = File::create(path)
            .wrap_err_with(|| format!("unable to create report file: {}", path.display()))?;
        serde_json::to_writer_pretty(file, &report).wrap_err("unable to write report")?;
    }
    Ok(())
}
