//! A Population is a fixed-topology collection of
//! networks, each driving one agent of the host.
//!
//! Agents report their deaths one by one; once every
//! individual has died the population ranks, persists,
//! selects and breeds the next generation in one step.
mod config;
mod errors;
pub mod logging;
mod offspring_factory;
pub mod sink;

pub use config::PopulationConfig;
pub use errors::{ConfigError, PersistenceError, PopulationError};
use logging::{GenerationRecord, Stats};
use offspring_factory::OffspringFactory;
pub use offspring_factory::top_percent_count;
use sink::ReportSink;

use crate::networks::{Network, NetworkError, Topology};
use crate::rng::{self, EvolutionRng};

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use std::fmt;

/// Identifies an individual for the lifetime
/// of its population.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
pub struct Handle(usize);

impl Handle {
    /// Position of the individual in registration order.
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A network together with its episode state.
#[derive(Clone, Debug)]
pub struct Individual {
    network: Network,
    fitness: f32,
    alive: bool,
}

impl Individual {
    fn new(network: Network) -> Individual {
        Individual {
            network,
            fitness: 0.0,
            alive: true,
        }
    }

    pub fn network(&self) -> &Network {
        &self.network
    }

    pub fn fitness(&self) -> f32 {
        self.fitness
    }

    pub fn is_alive(&self) -> bool {
        self.alive
    }
}

/// Phase of the generation cycle.
///
/// Outside of [`Population::report_death`] a population
/// is always observed `Running`.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum PopulationState {
    Running,
    GenerationComplete,
    Repopulating,
}

/// A message from the host to the population.
#[derive(Clone, Copy, Debug)]
pub enum Event<'a> {
    /// The agent needs actions for its current sensor readings.
    Tick { handle: Handle, inputs: &'a [f32] },
    /// The agent's episode ended with the given fitness.
    Died { handle: Handle, fitness: f32 },
}

/// The population's answer to an [`Event`].
#[derive(Debug)]
pub enum Response {
    Actions(Vec<f32>),
    /// Holds the summary if this death completed the generation.
    Died(Option<GenerationAdvance>),
}

/// Summary of a completed generation.
///
/// After an advance every individual is alive again with zero
/// fitness and a new network for the non-elite slots, so the
/// host must restart the episodes of all of them.
#[derive(Debug)]
pub struct GenerationAdvance {
    /// Number of the generation that just ended.
    pub completed_generation: usize,
    /// Number of the generation now running.
    pub generation: usize,
    /// Handles of the completed generation, best first.
    pub ranking: Vec<Handle>,
    /// Final fitness of the completed generation.
    pub fitness: Stats,
    /// Number of networks written to the sink.
    pub saved_networks: usize,
    /// Number of bred slots replaced by random networks.
    pub random_children: usize,
    /// Writes that failed. Evolution carries on regardless.
    pub persistence_errors: Vec<PersistenceError>,
}

/// A population of fixed-topology networks evolved
/// by elitist selection and uniform crossover.
pub struct Population<S> {
    individuals: Vec<Individual>,
    ranking: Vec<Handle>,
    topology: Topology,
    config: PopulationConfig,
    generation: usize,
    alive_count: usize,
    initial_population: usize,
    state: PopulationState,
    record: GenerationRecord,
    rng: EvolutionRng,
    sink: S,
}

impl<S: ReportSink> Population<S> {
    /// Creates a population of `config.size` random networks.
    ///
    /// # Errors
    /// Returns [`PopulationError::InvalidConfig`] if the config
    /// fails [`PopulationConfig::validate`].
    ///
    /// # Examples
    /// ```
    /// use oxiga::populations::sink::MemorySink;
    /// use oxiga::{Population, PopulationConfig, Topology};
    ///
    /// let config = PopulationConfig {
    ///     size: 10,
    ///     seed: Some(42),
    ///     ..PopulationConfig::default()
    /// };
    /// let population = Population::new(config, Topology::default(), MemorySink::new()).unwrap();
    ///
    /// assert_eq!(population.len(), 10);
    /// assert_eq!(population.alive_count(), 10);
    /// assert_eq!(population.generation(), 1);
    /// ```
    pub fn new(
        config: PopulationConfig,
        topology: Topology,
        sink: S,
    ) -> Result<Population<S>, PopulationError> {
        Population::new_seeded(config, topology, Vec::new(), sink)
    }

    /// Creates a population whose first individuals hold the
    /// `seeds` networks, filling the rest of `config.size`
    /// with random ones.
    ///
    /// # Errors
    /// Returns [`PopulationError::TooManySeeds`] if there are more
    /// seeds than `config.size`, or [`PopulationError::Network`] if
    /// a seed does not have the population's topology.
    pub fn new_seeded(
        config: PopulationConfig,
        topology: Topology,
        seeds: Vec<Network>,
        sink: S,
    ) -> Result<Population<S>, PopulationError> {
        config.validate()?;
        if seeds.len() > config.size {
            return Err(PopulationError::TooManySeeds {
                seeds: seeds.len(),
                size: config.size,
            });
        }
        for seed in &seeds {
            if seed.topology() != &topology {
                return Err(NetworkError::TopologyMismatch {
                    expected: topology,
                    found: *seed.topology(),
                }
                .into());
            }
        }

        let size = config.size;
        let mut population = Population {
            individuals: Vec::with_capacity(size),
            ranking: Vec::with_capacity(size),
            topology,
            rng: rng::seeded(config.seed),
            config,
            generation: 1,
            alive_count: 0,
            initial_population: 0,
            state: PopulationState::Running,
            record: GenerationRecord::new(),
            sink,
        };
        let seed_count = seeds.len();
        for network in seeds {
            population.register(network)?;
        }
        while population.len() < size {
            let network = Network::new(&topology, &mut population.rng);
            population.register(network)?;
        }
        info!(size, seeds = seed_count, %topology, "population created");
        Ok(population)
    }

    /// Adds an alive individual to the population.
    ///
    /// # Errors
    /// Returns [`PopulationError::Network`] if the network's
    /// topology differs from the population's.
    pub fn register(&mut self, network: Network) -> Result<Handle, PopulationError> {
        if network.topology() != &self.topology {
            return Err(NetworkError::TopologyMismatch {
                expected: self.topology,
                found: *network.topology(),
            }
            .into());
        }
        let handle = Handle(self.individuals.len());
        self.individuals.push(Individual::new(network));
        self.ranking.push(handle);
        self.initial_population += 1;
        self.alive_count += 1;
        debug!(%handle, "registered individual");
        Ok(handle)
    }

    /// Marks an individual dead with its final fitness.
    ///
    /// Reporting an already dead individual does nothing.
    /// The death that leaves no individual alive advances the
    /// population to the next generation before returning,
    /// and the summary of that advance is returned.
    ///
    /// # Errors
    /// Returns [`PopulationError::UnknownIndividual`] for a
    /// handle of another population.
    ///
    /// # Examples
    /// ```
    /// use oxiga::populations::sink::MemorySink;
    /// use oxiga::{Population, PopulationConfig, Topology};
    ///
    /// let config = PopulationConfig {
    ///     size: 3,
    ///     seed: Some(1),
    ///     ..PopulationConfig::default()
    /// };
    /// let mut population = Population::new(config, Topology::default(), MemorySink::new()).unwrap();
    /// let handles: Vec<_> = population.handles().collect();
    ///
    /// assert!(population.report_death(handles[0], 2.0).unwrap().is_none());
    /// assert!(population.report_death(handles[1], 5.0).unwrap().is_none());
    /// let advance = population.report_death(handles[2], 1.0).unwrap().unwrap();
    ///
    /// assert_eq!(advance.completed_generation, 1);
    /// assert_eq!(advance.ranking, vec![handles[1], handles[0], handles[2]]);
    /// assert_eq!(population.generation(), 2);
    /// assert_eq!(population.alive_count(), 3);
    /// ```
    pub fn report_death(
        &mut self,
        handle: Handle,
        final_fitness: f32,
    ) -> Result<Option<GenerationAdvance>, PopulationError> {
        let individual = self.individual_mut(handle)?;
        if !individual.alive {
            return Ok(None);
        }
        individual.fitness = final_fitness;
        individual.alive = false;
        self.alive_count -= 1;
        debug!(%handle, fitness = final_fitness, alive = self.alive_count, "individual died");

        if self.alive_count == 0 {
            self.advance_generation().map(Some)
        } else {
            Ok(None)
        }
    }

    /// Dispatches a host event.
    pub fn handle_event(&mut self, event: Event<'_>) -> Result<Response, PopulationError> {
        match event {
            Event::Tick { handle, inputs } => {
                Ok(Response::Actions(self.tick(handle, inputs)?.to_vec()))
            }
            Event::Died { handle, fitness } => {
                Ok(Response::Died(self.report_death(handle, fitness)?))
            }
        }
    }

    /// Evaluates an alive individual's network on `inputs`.
    ///
    /// # Errors
    /// Returns [`PopulationError::NotAlive`] for a dead individual and
    /// [`PopulationError::Network`] if `inputs` has the wrong length.
    pub fn tick(&mut self, handle: Handle, inputs: &[f32]) -> Result<&[f32], PopulationError> {
        let individual = self.individual_mut(handle)?;
        if !individual.alive {
            return Err(PopulationError::NotAlive(handle));
        }
        Ok(individual.network.evaluate(inputs)?)
    }

    /// Evaluates every alive individual in parallel,
    /// `inputs[i]` feeding the individual with index `i`.
    /// Dead individuals yield `None`.
    ///
    /// # Errors
    /// Returns [`PopulationError::InputCount`] if there isn't exactly
    /// one input vector per individual, or [`PopulationError::Network`]
    /// if any vector has the wrong length.
    pub fn tick_all<I>(&mut self, inputs: &[I]) -> Result<Vec<Option<Vec<f32>>>, PopulationError>
    where
        I: AsRef<[f32]> + Sync,
    {
        if inputs.len() != self.individuals.len() {
            return Err(PopulationError::InputCount {
                expected: self.individuals.len(),
                found: inputs.len(),
            });
        }
        let outputs = self
            .individuals
            .par_iter_mut()
            .zip(inputs.par_iter())
            .map(|(individual, input)| {
                if !individual.alive {
                    return Ok(None);
                }
                individual
                    .network
                    .evaluate(input.as_ref())
                    .map(|out| Some(out.to_vec()))
            })
            .collect::<Result<Vec<_>, NetworkError>>()?;
        Ok(outputs)
    }

    /// Current fitness of an individual.
    pub fn fitness(&self, handle: Handle) -> Option<f32> {
        self.individuals.get(handle.0).map(|i| i.fitness)
    }

    /// Overwrites an alive individual's running fitness.
    pub fn set_fitness(&mut self, handle: Handle, fitness: f32) -> Result<(), PopulationError> {
        self.alive_individual_mut(handle)?.fitness = fitness;
        Ok(())
    }

    /// Adds `delta` to an alive individual's running
    /// fitness, returning the new total.
    pub fn add_fitness(&mut self, handle: Handle, delta: f32) -> Result<f32, PopulationError> {
        let individual = self.alive_individual_mut(handle)?;
        individual.fitness += delta;
        Ok(individual.fitness)
    }

    /// Returns the current generation number, starting at 1.
    pub fn generation(&self) -> usize {
        self.generation
    }

    pub fn alive_count(&self) -> usize {
        self.alive_count
    }

    /// Total number of individuals ever registered.
    pub fn initial_population(&self) -> usize {
        self.initial_population
    }

    pub fn len(&self) -> usize {
        self.individuals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.individuals.is_empty()
    }

    pub fn state(&self) -> PopulationState {
        self.state
    }

    /// Returns `false` for dead and unknown individuals.
    pub fn is_alive(&self, handle: Handle) -> bool {
        self.individuals.get(handle.0).map_or(false, |i| i.alive)
    }

    pub fn individual(&self, handle: Handle) -> Option<&Individual> {
        self.individuals.get(handle.0)
    }

    pub fn network(&self, handle: Handle) -> Option<&Network> {
        self.individuals.get(handle.0).map(|i| &i.network)
    }

    /// Handles of every individual, in registration order.
    pub fn handles(&self) -> impl Iterator<Item = Handle> {
        (0..self.individuals.len()).map(Handle)
    }

    /// Handles in the rank order of the last completed generation,
    /// so that the first [`top_percent_count`](Self::top_percent_count)
    /// are the surviving elite. Registration order before the first advance.
    pub fn ranked_handles(&self) -> &[Handle] {
        &self.ranking
    }

    /// Returns the individual with the highest current fitness.
    ///
    /// NaN fitness is never preferred, and ties go to
    /// the earliest registered individual.
    pub fn champion(&self) -> Option<(Handle, &Individual)> {
        offspring_factory::rank(&self.individuals)
            .first()
            .map(|h| (*h, &self.individuals[h.0]))
    }

    /// Number of individuals that survive and breed
    /// at each generation advance.
    pub fn top_percent_count(&self) -> usize {
        top_percent_count(self.individuals.len(), self.config.selection_percent)
    }

    /// Ranked fitness of every completed generation.
    pub fn record(&self) -> &GenerationRecord {
        &self.record
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn config(&self) -> &PopulationConfig {
        &self.config
    }

    pub fn topology(&self) -> &Topology {
        &self.topology
    }

    fn individual_mut(&mut self, handle: Handle) -> Result<&mut Individual, PopulationError> {
        self.individuals
            .get_mut(handle.0)
            .ok_or(PopulationError::UnknownIndividual(handle))
    }

    fn alive_individual_mut(&mut self, handle: Handle) -> Result<&mut Individual, PopulationError> {
        let individual = self.individual_mut(handle)?;
        if individual.alive {
            Ok(individual)
        } else {
            Err(PopulationError::NotAlive(handle))
        }
    }

    /// Ranks, persists, selects and breeds, then
    /// revives everyone for the next generation.
    fn advance_generation(&mut self) -> Result<GenerationAdvance, PopulationError> {
        self.state = PopulationState::GenerationComplete;
        let completed_generation = self.generation;
        let ranking = offspring_factory::rank(&self.individuals);
        let fitness: Vec<f32> = ranking
            .iter()
            .map(|h| self.individuals[h.0].fitness)
            .collect();
        let stats = Stats::from(fitness.iter().copied()).unwrap_or_default();
        info!(
            generation = completed_generation,
            best = stats.maximum,
            worst = stats.minimum,
            mean = stats.mean,
            median = stats.median,
            "generation complete"
        );

        let top = self.top_percent_count();
        let mut persistence_errors = Vec::new();
        let saved_networks = self.persist(
            completed_generation,
            &ranking,
            fitness,
            top,
            &mut persistence_errors,
        );

        self.state = PopulationState::Repopulating;
        let bred = OffspringFactory::new(&mut self.individuals, &self.config, &mut self.rng)
            .generate_offspring(&ranking, top);

        for individual in &mut self.individuals {
            individual.fitness = 0.0;
            individual.alive = true;
        }
        self.alive_count = self.individuals.len();
        self.state = PopulationState::Running;
        let tally = match bred {
            Ok(tally) => tally,
            Err(e) => {
                warn!(generation = completed_generation, error = %e, "breeding failed, replaying generation");
                return Err(e.into());
            }
        };
        debug!(
            elite = top.min(ranking.len()),
            bred = tally.bred,
            random = tally.random,
            "repopulated"
        );

        self.generation += 1;
        self.ranking = ranking.clone();

        Ok(GenerationAdvance {
            completed_generation,
            generation: self.generation,
            ranking,
            fitness: stats,
            saved_networks,
            random_children: tally.random,
            persistence_errors,
        })
    }

    /// Records the generation, flushes the report and, on saving
    /// generations, the elite networks. Returns how many networks
    /// were written.
    fn persist(
        &mut self,
        generation: usize,
        ranking: &[Handle],
        fitness: Vec<f32>,
        top: usize,
        errors: &mut Vec<PersistenceError>,
    ) -> usize {
        self.record.push(generation, fitness);
        if let Err(e) = self.sink.write_report(&self.record) {
            warn!(generation, error = %e, "failed to write generation report");
            errors.push(e);
        }

        if generation % self.config.network_saving_interval.get() != 0 {
            return 0;
        }
        let mut saved = 0;
        for (rank, handle) in ranking.iter().take(top).enumerate() {
            let record = self.individuals[handle.0].network.to_record();
            match self.sink.write_network(generation, rank, &record) {
                Ok(()) => saved += 1,
                Err(e) => {
                    warn!(generation, rank, error = %e, "failed to save network");
                    errors.push(e);
                }
            }
        }
        info!(generation, saved, "saved top networks");
        saved
    }
}

impl<S> fmt::Debug for Population<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Population")
            .field("topology", &self.topology)
            .field("generation", &self.generation)
            .field("size", &self.individuals.len())
            .field("alive_count", &self.alive_count)
            .field("state", &self.state)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sink::MemorySink;

    use std::io;
    use std::num::NonZeroUsize;
    use std::path::PathBuf;

    fn topology() -> Topology {
        Topology {
            input_count: NonZeroUsize::new(3).unwrap(),
            output_count: NonZeroUsize::new(2).unwrap(),
            hidden_layers: 1,
            neurons_per_layer: NonZeroUsize::new(4).unwrap(),
        }
    }

    fn config(size: usize, seed: u64) -> PopulationConfig {
        PopulationConfig {
            size,
            mutation_rate: 0.05,
            selection_percent: 20,
            seed: Some(seed),
            ..PopulationConfig::default()
        }
    }

    fn population(size: usize, seed: u64) -> Population<MemorySink> {
        Population::new(config(size, seed), topology(), MemorySink::new()).unwrap()
    }

    /// Kills every individual with fitness equal to its index,
    /// returning the advance.
    fn kill_all<S: ReportSink>(population: &mut Population<S>) -> GenerationAdvance {
        let handles: Vec<Handle> = population.handles().collect();
        let (last, rest) = handles.split_last().unwrap();
        for h in rest {
            assert!(population.report_death(*h, h.index() as f32).unwrap().is_none());
        }
        population
            .report_death(*last, last.index() as f32)
            .unwrap()
            .unwrap()
    }

    struct FailingSink;

    impl ReportSink for FailingSink {
        fn write_report(&mut self, _: &GenerationRecord) -> Result<(), PersistenceError> {
            Err(PersistenceError::Io {
                path: PathBuf::from("stats.csv"),
                source: io::Error::new(io::ErrorKind::PermissionDenied, "read-only"),
            })
        }

        fn write_network(&mut self, _: usize, _: usize, _: &str) -> Result<(), PersistenceError> {
            Err(PersistenceError::Io {
                path: PathBuf::from("network.csv"),
                source: io::Error::new(io::ErrorKind::PermissionDenied, "read-only"),
            })
        }
    }

    #[test]
    fn new_population() {
        let population = population(10, 0);
        assert_eq!(population.len(), 10);
        assert_eq!(population.initial_population(), 10);
        assert_eq!(population.alive_count(), 10);
        assert_eq!(population.generation(), 1);
        assert_eq!(population.state(), PopulationState::Running);
        assert_eq!(population.top_percent_count(), 2);
        assert!(population.record().is_empty());
        assert!(population.handles().all(|h| population.fitness(h) == Some(0.0)));
    }

    #[test]
    fn invalid_config_rejected() {
        let cfg = PopulationConfig {
            selection_percent: 150,
            ..config(4, 0)
        };
        assert!(matches!(
            Population::new(cfg, topology(), MemorySink::new()),
            Err(PopulationError::InvalidConfig(ConfigError::SelectionPercent(150)))
        ));
    }

    #[test]
    fn seeded_population() {
        let mut rng = rng::seeded(Some(5));
        let seed = Network::new(&topology(), &mut rng);
        let population = Population::new_seeded(
            config(4, 1),
            topology(),
            vec![seed.clone()],
            MemorySink::new(),
        )
        .unwrap();
        assert_eq!(population.len(), 4);
        assert_eq!(population.network(Handle(0)), Some(&seed));
        assert_ne!(population.network(Handle(1)), Some(&seed));
    }

    #[test]
    fn seeded_population_errors() {
        let mut rng = rng::seeded(Some(6));
        let seeds = vec![Network::new(&topology(), &mut rng); 3];
        assert!(matches!(
            Population::new_seeded(config(2, 0), topology(), seeds, MemorySink::new()),
            Err(PopulationError::TooManySeeds { seeds: 3, size: 2 })
        ));

        let other = Topology {
            hidden_layers: 0,
            ..topology()
        };
        let seeds = vec![Network::new(&other, &mut rng)];
        assert!(matches!(
            Population::new_seeded(config(2, 0), topology(), seeds, MemorySink::new()),
            Err(PopulationError::Network(NetworkError::TopologyMismatch { .. }))
        ));
    }

    #[test]
    fn register_counts_and_checks_topology() {
        let mut population = population(2, 2);
        let mut rng = rng::seeded(Some(7));
        let handle = population
            .register(Network::new(&topology(), &mut rng))
            .unwrap();
        assert_eq!(handle.index(), 2);
        assert_eq!(population.initial_population(), 3);
        assert_eq!(population.alive_count(), 3);

        let other = Topology {
            neurons_per_layer: NonZeroUsize::new(5).unwrap(),
            ..topology()
        };
        assert!(population
            .register(Network::new(&other, &mut rng))
            .is_err());
        assert_eq!(population.len(), 3);
    }

    #[test]
    fn ten_individuals_twenty_percent() {
        let mut population = population(10, 3);
        let elite: Vec<Network> = [9, 8]
            .iter()
            .map(|i| population.network(Handle(*i)).unwrap().clone())
            .collect();
        let advance = kill_all(&mut population);

        assert_eq!(advance.completed_generation, 1);
        assert_eq!(advance.generation, 2);
        assert_eq!(
            advance.ranking.iter().map(|h| h.index()).collect::<Vec<_>>(),
            vec![9, 8, 7, 6, 5, 4, 3, 2, 1, 0]
        );
        assert_eq!(advance.fitness.maximum, 9.0);
        assert_eq!(advance.fitness.median, 4.5);
        assert!(advance.persistence_errors.is_empty());

        // Elites keep their exact networks and lead the new slot order.
        assert_eq!(population.network(Handle(9)), Some(&elite[0]));
        assert_eq!(population.network(Handle(8)), Some(&elite[1]));
        assert_eq!(&population.ranked_handles()[..2], &[Handle(9), Handle(8)]);

        assert_eq!(population.generation(), 2);
        assert_eq!(population.alive_count(), 10);
        assert_eq!(population.state(), PopulationState::Running);
        assert!(population
            .handles()
            .all(|h| population.is_alive(h) && population.fitness(h) == Some(0.0)));
        assert_eq!(
            population.record().get(1).unwrap(),
            &[9.0, 8.0, 7.0, 6.0, 5.0, 4.0, 3.0, 2.0, 1.0, 0.0]
        );
        assert_eq!(population.sink().report(), "1,9,8,7,6,5,4,3,2,1,0,\n");
    }

    #[test]
    fn failed_breeding_replays_generation() {
        let mut population = population(5, 9);
        let stray = Topology {
            input_count: NonZeroUsize::new(1).unwrap(),
            ..topology()
        };
        // Handle 0 ranks last, so it is bred over.
        population.individuals[0].network = Network::new(&stray, &mut rng::seeded(Some(1)));

        let handles: Vec<Handle> = population.handles().collect();
        for h in &handles[..4] {
            population.report_death(*h, h.index() as f32).unwrap();
        }
        assert!(matches!(
            population.report_death(handles[4], 4.0),
            Err(PopulationError::Network(NetworkError::TopologyMismatch { .. }))
        ));

        assert_eq!(population.state(), PopulationState::Running);
        assert_eq!(population.generation(), 1);
        assert_eq!(population.alive_count(), 5);
        assert!(handles.iter().all(|h| population.is_alive(*h)));
        assert!(population.tick(handles[1], &[0.0; 3]).is_ok());
        assert!(population.report_death(handles[1], 1.0).unwrap().is_none());
    }

    #[test]
    fn report_death_is_idempotent() {
        let mut population = population(3, 4);
        assert!(population.report_death(Handle(0), 1.0).unwrap().is_none());
        assert!(population.report_death(Handle(0), 7.0).unwrap().is_none());
        assert_eq!(population.alive_count(), 2);
        assert_eq!(population.fitness(Handle(0)), Some(1.0));

        assert!(population.report_death(Handle(1), 1.0).unwrap().is_none());
        assert!(population.report_death(Handle(2), 1.0).unwrap().is_some());
        assert_eq!(population.generation(), 2);
        assert_eq!(population.record().len(), 1);
    }

    #[test]
    fn unknown_and_dead_handles() {
        let mut population = population(2, 5);
        assert!(matches!(
            population.report_death(Handle(7), 0.0),
            Err(PopulationError::UnknownIndividual(Handle(7)))
        ));
        population.report_death(Handle(0), 0.0).unwrap();
        assert!(matches!(
            population.tick(Handle(0), &[0.0; 3]),
            Err(PopulationError::NotAlive(Handle(0)))
        ));
        assert!(matches!(
            population.add_fitness(Handle(0), 1.0),
            Err(PopulationError::NotAlive(_))
        ));
        assert!(!population.is_alive(Handle(0)));
        assert!(!population.is_alive(Handle(9)));
    }

    #[test]
    fn fitness_accumulates() {
        let mut population = population(2, 6);
        population.set_fitness(Handle(1), 2.0).unwrap();
        assert_eq!(population.add_fitness(Handle(1), 0.5).unwrap(), 2.5);
        assert_eq!(population.champion().map(|(h, _)| h), Some(Handle(1)));
    }

    #[test]
    fn tick_checks_input_length() {
        let mut population = population(2, 7);
        let out = population.tick(Handle(0), &[0.1, 0.2, 0.3]).unwrap();
        assert_eq!(out.len(), 2);
        assert!(out.iter().all(|o| o.abs() < 1.0));
        assert!(matches!(
            population.tick(Handle(0), &[0.1]),
            Err(PopulationError::Network(NetworkError::DimensionMismatch { expected: 3, found: 1 }))
        ));
    }

    #[test]
    fn tick_all_matches_tick() {
        let mut population = population(5, 8);
        population.report_death(Handle(3), 0.0).unwrap();
        let inputs: Vec<Vec<f32>> = (0..5).map(|i| vec![i as f32 * 0.1, -0.2, 0.3]).collect();
        let outputs = population.tick_all(&inputs).unwrap();

        assert_eq!(outputs.len(), 5);
        assert!(outputs[3].is_none());
        for i in [0, 1, 2, 4] {
            let single = population.tick(Handle(i), &inputs[i]).unwrap().to_vec();
            assert_eq!(outputs[i].as_deref(), Some(single.as_slice()));
        }

        assert!(matches!(
            population.tick_all(&inputs[..4]),
            Err(PopulationError::InputCount { expected: 5, found: 4 })
        ));
    }

    #[test]
    fn events() {
        let mut population = population(2, 9);
        match population
            .handle_event(Event::Tick {
                handle: Handle(0),
                inputs: &[0.0, 0.5, 1.0],
            })
            .unwrap()
        {
            Response::Actions(actions) => assert_eq!(actions.len(), 2),
            other => panic!("expected actions, got {:?}", other),
        }
        assert!(matches!(
            population.handle_event(Event::Died { handle: Handle(0), fitness: 1.0 }),
            Ok(Response::Died(None))
        ));
        assert!(matches!(
            population.handle_event(Event::Died { handle: Handle(1), fitness: 2.0 }),
            Ok(Response::Died(Some(_)))
        ));
    }

    #[test]
    fn saves_networks_on_interval() {
        let cfg = PopulationConfig {
            network_saving_interval: NonZeroUsize::new(2).unwrap(),
            ..config(10, 10)
        };
        let mut population = Population::new(cfg, topology(), MemorySink::new()).unwrap();

        assert_eq!(kill_all(&mut population).saved_networks, 0);
        let champion = population.network(Handle(9)).unwrap().to_record();
        let advance = kill_all(&mut population);
        assert_eq!(advance.saved_networks, 2);

        let sink = population.sink();
        assert_eq!(sink.networks().count(), 2);
        assert_eq!(sink.network(2, 0), Some(champion.as_str()));
        assert!(Network::from_record(sink.network(2, 1).unwrap()).is_ok());
        assert_eq!(sink.report_writes(), 2);
        assert_eq!(sink.report().lines().count(), 2);
    }

    #[test]
    fn persistence_failure_still_advances() {
        let cfg = PopulationConfig {
            network_saving_interval: NonZeroUsize::MIN,
            ..config(5, 11)
        };
        let mut population = Population::new(cfg, topology(), FailingSink).unwrap();
        let advance = kill_all(&mut population);

        // One report and one elite network.
        assert_eq!(advance.persistence_errors.len(), 2);
        assert_eq!(advance.saved_networks, 0);
        assert_eq!(population.generation(), 2);
        assert_eq!(population.alive_count(), 5);
        assert_eq!(population.record().len(), 1);
    }

    #[test]
    fn same_seed_same_evolution() {
        let mut first = population(8, 12);
        let mut second = population(8, 12);
        for _ in 0..3 {
            kill_all(&mut first);
            kill_all(&mut second);
        }
        assert_eq!(first.generation(), 4);
        for h in first.handles() {
            assert_eq!(first.network(h), second.network(h));
        }
        assert_eq!(first.record(), second.record());
    }

    #[test]
    fn nan_fitness_ranks_last() {
        let mut population = population(3, 13);
        population.report_death(Handle(0), f32::NAN).unwrap();
        population.report_death(Handle(1), -5.0).unwrap();
        let advance = population.report_death(Handle(2), 1.0).unwrap().unwrap();
        assert_eq!(advance.ranking, vec![Handle(2), Handle(1), Handle(0)]);
    }

    #[test]
    fn single_individual_survives() {
        let mut population = population(1, 14);
        let network = population.network(Handle(0)).unwrap().clone();
        let advance = population.report_death(Handle(0), 3.0).unwrap().unwrap();
        assert_eq!(advance.ranking, vec![Handle(0)]);
        assert_eq!(population.network(Handle(0)), Some(&network));
    }

    #[test]
    fn boxed_sink() {
        let sink: Box<dyn ReportSink + Send> = Box::new(MemorySink::new());
        let mut population = Population::new(config(3, 15), topology(), sink).unwrap();
        assert_eq!(kill_all(&mut population).completed_generation, 1);
    }
}
