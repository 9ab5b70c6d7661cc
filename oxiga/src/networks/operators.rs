//! Genetic operators over [`Network`] genomes.
//!
//! All operators rewrite their target in place and draw
//! from a caller-supplied generator, so seeded runs are
//! reproducible.
use super::{Network, NetworkError};
use crate::rng;

use rand::Rng;
use serde::{Deserialize, Serialize};

/// How a child's parameter is derived from the two
/// corresponding parent parameters during crossover.
///
/// The strategy applies to weights and biases alike.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default, Serialize, Deserialize)]
pub enum CrossoverStrategy {
    /// Arithmetic mean of both parents.
    #[default]
    Average,
    /// One parent's value, chosen by a fair coin flip per parameter.
    ParentChoice,
}

impl CrossoverStrategy {
    fn mix<R: Rng + ?Sized>(self, a: f32, b: f32, rng: &mut R) -> f32 {
        match self {
            Self::Average => (a + b) / 2.0,
            Self::ParentChoice => {
                if rng.gen::<bool>() {
                    a
                } else {
                    b
                }
            }
        }
    }
}

/// Overwrites every parameter of `child` with a mix of the
/// corresponding parameters of `parent_a` and `parent_b`.
///
/// Each weight and bias is handled independently: with probability
/// `mutation_probability` it is redrawn uniformly from `[-1, 1]`,
/// otherwise it is mixed according to `strategy`.
///
/// # Errors
/// Returns [`NetworkError::TopologyMismatch`] if the three networks
/// do not share a topology. `child` is left untouched in that case.
///
/// # Examples
/// ```
/// use oxiga::networks::{operators, CrossoverStrategy, Network, Topology};
/// use oxiga::rng;
///
/// let mut rng = rng::seeded(Some(1));
/// let topology = Topology::default();
/// let a = Network::new(&topology, &mut rng);
/// let b = Network::new(&topology, &mut rng);
/// let mut child = Network::new(&topology, &mut rng);
///
/// operators::crossover(&mut child, &a, &b, 0.0, CrossoverStrategy::Average, &mut rng).unwrap();
/// assert_eq!(child.biases()[0], (a.biases()[0] + b.biases()[0]) / 2.0);
/// ```
pub fn crossover<R: Rng + ?Sized>(
    child: &mut Network,
    parent_a: &Network,
    parent_b: &Network,
    mutation_probability: f32,
    strategy: CrossoverStrategy,
    rng: &mut R,
) -> Result<(), NetworkError> {
    child.check_compatible(parent_a)?;
    child.check_compatible(parent_b)?;

    for ((c, a), b) in child
        .parameters_mut()
        .zip(parent_a.parameters())
        .zip(parent_b.parameters())
    {
        *c = if rng::gen_bool(rng, mutation_probability) {
            rng::parameter(rng)
        } else {
            strategy.mix(*a, *b, rng)
        };
    }
    Ok(())
}

/// Redraws each parameter of `network` from `[-1, 1]`
/// with probability `mutation_rate`, leaving the rest as-is.
///
/// # Examples
/// ```
/// use oxiga::networks::{operators, Network, Topology};
/// use oxiga::rng;
///
/// let mut rng = rng::seeded(Some(2));
/// let mut network = Network::new(&Topology::default(), &mut rng);
/// let before = network.clone();
///
/// operators::mutate(&mut network, 0.0, &mut rng);
/// assert_eq!(network, before);
/// ```
pub fn mutate<R: Rng + ?Sized>(network: &mut Network, mutation_rate: f32, rng: &mut R) {
    for parameter in network.parameters_mut() {
        if rng::gen_bool(rng, mutation_rate) {
            *parameter = rng::parameter(rng);
        }
    }
}

/// Redraws every weight and bias of `network` from `[-1, 1]`.
pub fn randomise<R: Rng + ?Sized>(network: &mut Network, rng: &mut R) {
    for parameter in network.parameters_mut() {
        *parameter = rng::parameter(rng);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::networks::Topology;
    use std::num::NonZeroUsize;

    fn topology(inputs: usize, outputs: usize, layers: usize, neurons: usize) -> Topology {
        Topology {
            input_count: NonZeroUsize::new(inputs).unwrap(),
            output_count: NonZeroUsize::new(outputs).unwrap(),
            hidden_layers: layers,
            neurons_per_layer: NonZeroUsize::new(neurons).unwrap(),
        }
    }

    fn parents(seed: u64) -> (Network, Network, Network, rng::EvolutionRng) {
        let mut rng = rng::seeded(Some(seed));
        let t = topology(4, 2, 2, 5);
        let a = Network::new(&t, &mut rng);
        let b = Network::new(&t, &mut rng);
        let child = Network::new(&t, &mut rng);
        (a, b, child, rng)
    }

    #[test]
    fn crossover_average() {
        let (a, b, mut child, mut rng) = parents(1);
        crossover(&mut child, &a, &b, 0.0, CrossoverStrategy::Average, &mut rng).unwrap();
        for ((c, a), b) in child.parameters().zip(a.parameters()).zip(b.parameters()) {
            assert_eq!(*c, (a + b) / 2.0);
        }
    }

    #[test]
    fn crossover_parent_choice() {
        let (a, b, mut child, mut rng) = parents(2);
        crossover(&mut child, &a, &b, 0.0, CrossoverStrategy::ParentChoice, &mut rng).unwrap();
        let mut from_a = 0;
        let mut from_b = 0;
        for ((c, a), b) in child.parameters().zip(a.parameters()).zip(b.parameters()) {
            assert!(c == a || c == b);
            if c == a {
                from_a += 1;
            }
            if c == b {
                from_b += 1;
            }
        }
        // 4*5 + 5*5 + 5*2 + 3 = 58 parameters, both parents contribute.
        assert!(from_a > 0 && from_b > 0);
    }

    #[test]
    fn crossover_full_mutation_stays_in_range() {
        let (a, b, mut child, mut rng) = parents(3);
        crossover(&mut child, &a, &b, 1.0, CrossoverStrategy::Average, &mut rng).unwrap();
        assert!(child.parameters().all(|p| (-1.0..=1.0).contains(p)));
        // Fresh draws, not blends of the parents.
        let blended = child
            .parameters()
            .zip(a.parameters())
            .zip(b.parameters())
            .filter(|((c, a), b)| **c == (**a + **b) / 2.0)
            .count();
        assert!(blended < 3);
    }

    #[test]
    fn crossover_entries_come_from_matching_slots() {
        let (a, b, mut child, mut rng) = parents(4);
        crossover(&mut child, &a, &b, 0.05, CrossoverStrategy::ParentChoice, &mut rng).unwrap();
        for ((c, a), b) in child.parameters().zip(a.parameters()).zip(b.parameters()) {
            assert!(c == a || c == b || (-1.0..=1.0).contains(c));
        }
    }

    #[test]
    fn crossover_topology_mismatch() {
        let mut rng = rng::seeded(Some(5));
        let a = Network::new(&topology(3, 1, 1, 4), &mut rng);
        let b = Network::new(&topology(3, 1, 2, 4), &mut rng);
        let mut child = Network::new(&topology(3, 1, 1, 4), &mut rng);
        let before = child.clone();
        assert!(matches!(
            crossover(&mut child, &a, &b, 0.0, CrossoverStrategy::Average, &mut rng),
            Err(NetworkError::TopologyMismatch { .. })
        ));
        assert_eq!(child, before);
    }

    #[test]
    fn crossover_with_itself_as_both_parents() {
        let (a, _, mut child, mut rng) = parents(6);
        child
            .crossover_from(&a, &a, 0.0, CrossoverStrategy::Average, &mut rng)
            .unwrap();
        assert_eq!(child, a);
    }

    #[test]
    fn mutate_full_rate_changes_parameters() {
        let mut rng = rng::seeded(Some(7));
        let mut network = Network::new(&topology(6, 3, 1, 6), &mut rng);
        let before = network.clone();
        mutate(&mut network, 1.0, &mut rng);
        let changed = network
            .parameters()
            .zip(before.parameters())
            .filter(|(n, b)| n != b)
            .count();
        assert!(changed > network.parameters().count() - 3);
        assert!(network.parameters().all(|p| (-1.0..=1.0).contains(p)));
    }

    #[test]
    fn mutate_partial_rate_keeps_some() {
        let mut rng = rng::seeded(Some(8));
        let mut network = Network::new(&topology(10, 4, 2, 10), &mut rng);
        let before = network.clone();
        mutate(&mut network, 0.1, &mut rng);
        let total = network.parameters().count();
        let kept = network
            .parameters()
            .zip(before.parameters())
            .filter(|(n, b)| n == b)
            .count();
        assert!(kept > total / 2 && kept < total);
    }

    #[test]
    fn randomise_is_reproducible() {
        let t = topology(3, 2, 1, 4);
        let mut first = Network::new(&t, &mut rng::seeded(Some(9)));
        let mut second = Network::new(&t, &mut rng::seeded(Some(10)));
        assert_ne!(first, second);
        randomise(&mut first, &mut rng::seeded(Some(11)));
        randomise(&mut second, &mut rng::seeded(Some(11)));
        assert_eq!(first, second);
    }
}
