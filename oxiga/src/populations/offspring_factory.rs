use super::{Handle, Individual, PopulationConfig};
use crate::networks::{operators, Network, NetworkError};
use crate::rng;

use rand::Rng;
use tracing::debug;

use std::cmp::Ordering;

/// Number of top-ranked individuals that survive and breed:
/// `selection_percent`% of `population_size`, rounded down,
/// but never less than 1.
///
/// # Examples
/// ```
/// use oxiga::populations::top_percent_count;
///
/// assert_eq!(top_percent_count(10, 20), 2);
/// assert_eq!(top_percent_count(3, 20), 1);
/// assert_eq!(top_percent_count(10, 0), 1);
/// ```
pub fn top_percent_count(population_size: usize, selection_percent: u8) -> usize {
    (population_size * selection_percent as usize / 100).max(1)
}

/// Orders handles by fitness, best first. Ties keep
/// registration order and NaN fitness ranks last.
pub(super) fn rank(individuals: &[Individual]) -> Vec<Handle> {
    let mut ranking: Vec<Handle> = (0..individuals.len()).map(Handle).collect();
    ranking.sort_by(|a, b| {
        let (fa, fb) = (individuals[a.0].fitness, individuals[b.0].fitness);
        match (fa.is_nan(), fb.is_nan()) {
            (true, true) => Ordering::Equal,
            (true, false) => Ordering::Greater,
            (false, true) => Ordering::Less,
            (false, false) => fb.total_cmp(&fa),
        }
    });
    ranking
}

/// What happened to the bred slots of one generation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(super) struct BreedingTally {
    pub(super) bred: usize,
    pub(super) random: usize,
}

/// Auxiliary type for offspring generation.
/// Overwrites every non-elite individual's network
/// with a child of the elite, according to the
/// population config.
pub(super) struct OffspringFactory<'a, R: ?Sized> {
    individuals: &'a mut [Individual],
    config: &'a PopulationConfig,
    rng: &'a mut R,
}

impl<'a, R: Rng + ?Sized> OffspringFactory<'a, R> {
    pub(super) fn new(
        individuals: &'a mut [Individual],
        config: &'a PopulationConfig,
        rng: &'a mut R,
    ) -> OffspringFactory<'a, R> {
        OffspringFactory {
            individuals,
            config,
            rng,
        }
    }

    /// Breeds every slot of `ranking` past the first `elite`,
    /// drawing both parents uniformly from the elite.
    /// Elite networks are left untouched.
    pub(super) fn generate_offspring(
        &mut self,
        ranking: &[Handle],
        elite: usize,
    ) -> Result<BreedingTally, NetworkError> {
        let elite = elite.min(ranking.len());
        let mut tally = BreedingTally::default();
        if elite == 0 {
            return Ok(tally);
        }

        // Parents are copied out so children can be
        // written without aliasing the arena.
        let parents: Vec<Network> = ranking[..elite]
            .iter()
            .map(|h| self.individuals[h.0].network.clone())
            .collect();

        for (slot, handle) in ranking.iter().enumerate().skip(elite) {
            let first = self.rng.gen_range(0..elite);
            let second = self.rng.gen_range(0..elite);
            let child = &mut self.individuals[handle.0].network;
            operators::crossover(
                child,
                &parents[first],
                &parents[second],
                self.config.mutation_rate,
                self.config.crossover_strategy,
                self.rng,
            )?;
            if self.config.child_mutation_rate > 0.0 {
                operators::mutate(child, self.config.child_mutation_rate, self.rng);
            }

            let random = rng::gen_bool(self.rng, self.config.random_child_chance);
            if random {
                operators::randomise(child, self.rng);
                tally.random += 1;
            } else {
                tally.bred += 1;
            }
            debug!(slot, %handle, first, second, random, "bred child");
        }
        Ok(tally)
    }
}
