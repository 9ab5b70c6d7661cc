//! Evolves cars that drive laps around a ring-shaped track.
//!
//! Usage:
//!   cargo run --release -p racetrack -- --config racetrack/config.ron --generations 50
//!   RUST_LOG=oxiga=debug cargo run -p racetrack -- --resume runs/network_gen50_rank0.csv

mod config;
mod track;

use config::RunConfig;
use track::Race;

use anyhow::{Context, Result};
use clap::Parser;
use oxiga::populations::sink::DirectorySink;
use oxiga::{GenerationAdvance, Handle, Network, Population};
use rand::Rng;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use std::f32::consts::TAU;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "racetrack")]
#[command(about = "Evolve neural network drivers on a ring track")]
struct Args {
    /// RON run configuration; built-in defaults if omitted
    #[arg(long)]
    config: Option<PathBuf>,
    /// Number of generations to run
    #[arg(long, default_value_t = 100)]
    generations: usize,
    /// Directory receiving stats.csv and saved networks
    #[arg(long, default_value = "runs")]
    output: PathBuf,
    /// Seed for reproducible runs, overriding the config
    #[arg(long)]
    seed: Option<u64>,
    /// Saved network records to seed the first generation with
    #[arg(long, num_args = 1..)]
    resume: Vec<PathBuf>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let mut config = match &args.config {
        Some(path) => RunConfig::load(path)?,
        None => RunConfig::default(),
    };
    if args.seed.is_some() {
        config.population.seed = args.seed;
    }
    config.check()?;

    let seeds = args
        .resume
        .iter()
        .map(|path| load_network(path))
        .collect::<Result<Vec<_>>>()?;
    let sink = DirectorySink::new(&args.output)
        .with_context(|| format!("failed to prepare output {}", args.output.display()))?;
    let mut population =
        Population::new_seeded(config.population.clone(), config.topology, seeds, sink)?;

    let mut rng = oxiga::rng::seeded(config.population.seed);
    let mut race = Race::new(config.track.clone(), population.len(), rng.gen_range(0.0..TAU));
    let handles: Vec<Handle> = population.handles().collect();

    while population.generation() <= args.generations {
        let inputs = race.sensors();
        let actions = population.tick_all(&inputs)?;

        let (track, cars) = race.cars_mut();
        let mut advance = None;
        for ((handle, car), actions) in handles.iter().zip(cars.iter_mut()).zip(actions) {
            let Some(actions) = actions else { continue };
            car.drive(actions[0], actions[1], track);
            if let Some(death) = car.death(track, config.max_ticks) {
                let fitness = car.fitness(track);
                debug!(%handle, ?death, fitness, "car died");
                advance = population.report_death(*handle, fitness)?;
            }
        }

        if let Some(advance) = advance {
            summarize(&advance);
            race.restart(rng.gen_range(0.0..TAU));
        }
    }

    if let Some(champion) = population.ranked_handles().first() {
        let path = args.output.join("champion.csv");
        if let Some(network) = population.network(*champion) {
            fs::write(&path, network.to_record())
                .with_context(|| format!("failed to write {}", path.display()))?;
            info!(path = %path.display(), "saved champion");
        }
    }
    Ok(())
}

fn load_network(path: &Path) -> Result<Network> {
    let record = fs::read_to_string(path)
        .with_context(|| format!("failed to read network {}", path.display()))?;
    Network::from_record(&record)
        .with_context(|| format!("failed to load network {}", path.display()))
}

fn summarize(advance: &GenerationAdvance) {
    info!(
        generation = advance.completed_generation,
        best = advance.fitness.maximum,
        mean = advance.fitness.mean,
        median = advance.fitness.median,
        saved = advance.saved_networks,
        random_children = advance.random_children,
        "generation finished"
    );
}
