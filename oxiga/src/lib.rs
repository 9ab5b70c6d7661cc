//! A fixed-topology neuroevolution engine: a population of dense
//! feed-forward networks, each driving one agent of a host simulation,
//! evolved by a generational genetic algorithm.
//!
//! The host asks the population for actions each tick, and reports
//! each agent's fitness when it dies. Once the last agent of a
//! generation has died, the population ranks everyone, writes a
//! fitness report (and periodically the best networks) to a
//! [`ReportSink`](populations::sink::ReportSink), keeps the top
//! performers unchanged, and breeds the rest from them by uniform
//! crossover and mutation.
//!
//! Saved networks are plain text records that can be loaded back
//! with [`Network::from_record`] to seed a new population.
//!
//! # Example usage: steering towards a target
//! ```
//! use oxiga::populations::sink::MemorySink;
//! use oxiga::{Population, PopulationConfig, Topology};
//! use std::num::NonZeroUsize;
//!
//! // Agents see the target's offset and should output it back.
//! fn episode_fitness(actions: &[f32], target: f32) -> f32 {
//!     1.0 - (actions[0] - target).abs()
//! }
//!
//! fn main() {
//!     let topology = Topology {
//!         input_count: NonZeroUsize::new(1).unwrap(),
//!         output_count: NonZeroUsize::new(1).unwrap(),
//!         hidden_layers: 1,
//!         neurons_per_layer: NonZeroUsize::new(4).unwrap(),
//!     };
//!     let config = PopulationConfig {
//!         size: 30,
//!         seed: Some(7),
//!         ..PopulationConfig::default()
//!     };
//!
//!     let mut population = Population::new(config, topology, MemorySink::new()).unwrap();
//!     for _ in 0..20 {
//!         let handles: Vec<_> = population.handles().collect();
//!         for handle in handles {
//!             let actions = population.tick(handle, &[0.5]).unwrap().to_vec();
//!             let fitness = episode_fitness(&actions, 0.5);
//!             if let Some(advance) = population.report_death(handle, fitness).unwrap() {
//!                 println!(
//!                     "generation {}: best {}",
//!                     advance.completed_generation, advance.fitness.maximum
//!                 );
//!             }
//!         }
//!     }
//!     assert_eq!(population.generation(), 21);
//!     assert_eq!(population.record().len(), 20);
//! }
//! ```

pub mod networks;
pub mod populations;
pub mod rng;

pub use networks::{CrossoverStrategy, Network, NetworkError, Topology};
pub use populations::{
    Event, GenerationAdvance, Handle, Population, PopulationConfig, PopulationError,
    PopulationState, Response,
};
