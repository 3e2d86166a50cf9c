//! Command-line driver for the branching-process simulator.
//!
//! Mirrors `main.cpp`'s flow: read a config file (`-i`), run
//! `num_simulations` independent replicas, and write each replica's
//! writer outputs under `-o`. A malformed config never starts a
//! simulation at all — every line error is collected and written to
//! `input_err.eevo` before exiting.

use std::path::{Path, PathBuf};

use clap::Parser;
use thiserror::Error;
use tracing::{error, info, info_span};

use observer::Observer;
use population::Population;
use rng::DeterministicRng;
use sim_config::{ConfigError, ParsedConfig};

/// Run a branching-process cell population simulation from a config file.
#[derive(Debug, Parser)]
#[command(name = "evo-sim", version, about)]
struct Cli {
    /// Path to the tab-separated config file.
    #[arg(short = 'i', long = "input")]
    input: PathBuf,

    /// Directory every replica's output files are written under.
    #[arg(short = 'o', long = "output")]
    output: PathBuf,

    /// Base RNG seed. Replica `n` runs with `seed + n`, so two runs of
    /// the same config with the same base seed replay identically.
    #[arg(long, default_value_t = 0)]
    seed: u64,
}

/// Everything that can end a run before every replica has finished.
#[derive(Debug, Error)]
enum RunError {
    #[error("failed to read config file {path}: {source}")]
    ReadConfig { path: PathBuf, #[source] source: std::io::Error },
    #[error("failed to create output directory {path}: {source}")]
    CreateOutputDir { path: PathBuf, #[source] source: std::io::Error },
    #[error("config file had {0} error(s), see input_err.eevo")]
    InvalidConfig(usize),
    #[error("failed to write {path}: {source}")]
    WriteErrorReport { path: PathBuf, #[source] source: std::io::Error },
    #[error("replica {sim_number}: failed to build population: {source}")]
    BuildPopulation { sim_number: u32, #[source] source: ConfigError },
    #[error("replica {sim_number}: {source}")]
    Engine { sim_number: u32, #[source] source: population::EngineError },
    #[error("replica {sim_number}: writer {kind} failed: {source}")]
    Observer { sim_number: u32, kind: &'static str, #[source] source: observer::ObserverError },
    #[error("writer configuration on line {line}: unrecognized writer kind {kind:?}")]
    UnknownWriterKind { line: usize, kind: String },
}

fn main() -> Result<(), RunError> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    run(&cli)
}

fn run(cli: &Cli) -> Result<(), RunError> {
    let text = std::fs::read_to_string(&cli.input)
        .map_err(|source| RunError::ReadConfig { path: cli.input.clone(), source })?;
    std::fs::create_dir_all(&cli.output)
        .map_err(|source| RunError::CreateOutputDir { path: cli.output.clone(), source })?;

    let config = match sim_config::parse(&text) {
        Ok(config) => config,
        Err(errors) => {
            let rendered = sim_config::render_errors(&errors);
            let path = cli.output.join("input_err.eevo");
            std::fs::write(&path, rendered).map_err(|source| RunError::WriteErrorReport { path, source })?;
            error!(count = errors.len(), "config file rejected, see input_err.eevo");
            return Err(RunError::InvalidConfig(errors.len()));
        }
    };

    info!(num_simulations = config.sim.num_simulations, sim_id = %config.sim.sim_id, "starting run");

    for sim_number in 0..config.sim.num_simulations {
        let span = info_span!("replica", sim_number);
        let _enter = span.enter();
        run_replica(&config, sim_number, cli.seed, &cli.output)?;
    }

    Ok(())
}

fn run_replica(config: &ParsedConfig, sim_number: u32, base_seed: u64, out_dir: &Path) -> Result<(), RunError> {
    let mut population =
        config.build_population().map_err(|source| RunError::BuildPopulation { sim_number, source })?;
    let mut random = DeterministicRng::new(base_seed.wrapping_add(sim_number as u64));

    let mut writers = build_writers(config, out_dir)?;
    for writer in &mut writers {
        writer
            .begin(sim_number, &population)
            .map_err(|source| RunError::Observer { sim_number, kind: "begin", source })?;
    }

    run_until_stopped(config, &mut population, &mut random, sim_number, &mut writers)?;

    for writer in &mut writers {
        writer
            .finish(sim_number, &population)
            .map_err(|source| RunError::Observer { sim_number, kind: "finish", source })?;
    }

    info!(
        final_time = population.time(),
        final_cells = population.total_cells(),
        extinct = population.is_extinct(),
        "replica finished"
    );
    Ok(())
}

/// Advance until the config's time or cell-count cap is reached, the
/// type space is exhausted, or the population goes extinct. The
/// extinction check is this driver's own addition beyond `main.cpp`'s
/// literal loop condition: without it, a population that dies out
/// before hitting either cap would keep calling `advance`, which would
/// keep returning `Err(EngineError::Extinct)` forever.
fn run_until_stopped(
    config: &ParsedConfig,
    population: &mut Population,
    random: &mut DeterministicRng,
    sim_number: u32,
    writers: &mut [Box<dyn Observer>],
) -> Result<(), RunError> {
    while population.time() < config.sim.max_time
        && population.total_cells() < config.sim.max_cells
        && !population.is_extinct()
        && !population.no_types_left()
    {
        match population.advance(random) {
            Ok(()) => {
                if let Some(event) = population.last_event() {
                    for writer in writers.iter_mut() {
                        writer
                            .on_event(sim_number, population, event)
                            .map_err(|source| RunError::Observer { sim_number, kind: "on_event", source })?;
                    }
                }
            }
            Err(population::EngineError::Extinct) => break,
            Err(source) => {
                error!(sim_number, %source, "structural invariant failure, aborting replica");
                return Err(RunError::Engine { sim_number, source });
            }
        }
    }
    Ok(())
}

fn build_writers(config: &ParsedConfig, out_dir: &Path) -> Result<Vec<Box<dyn Observer>>, RunError> {
    config
        .writers
        .iter()
        .map(|spec| {
            observer::build_writer(spec, out_dir)
                .map_err(|_| RunError::UnknownWriterKind { line: spec.line, kind: spec.kind.clone() })
        })
        .collect()
}
