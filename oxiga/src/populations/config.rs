use super::errors::ConfigError;
use crate::networks::CrossoverStrategy;

use serde::{Deserialize, Serialize};
use tracing::warn;

use std::num::NonZeroUsize;

/// Configuration data for population generation
/// and evolution.
///
/// # Note
/// All quantities expressing probabilities
/// must be in the range [0.0, 1.0], which
/// [`PopulationConfig::validate`] enforces.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PopulationConfig {
    /// Number of individuals created along with
    /// the population.
    pub size: usize,
    /// Chance that a weight or bias is redrawn
    /// instead of inherited during crossover.
    /// Values above 0.1 are rarely useful.
    pub mutation_rate: f32,
    /// Chance that a bred child is discarded and
    /// replaced by a fully random network.
    /// Values above 0.05 are rarely useful.
    pub random_child_chance: f32,
    /// Top % of each generation which survives
    /// unchanged and parents the rest.
    pub selection_percent: u8,
    /// Top-ranked networks are saved every
    /// this many generations.
    pub network_saving_interval: NonZeroUsize,
    /// How parent parameters are combined.
    pub crossover_strategy: CrossoverStrategy,
    /// Chance that a parameter of a freshly crossed
    /// child is redrawn in an extra mutation pass.
    /// 0 disables the pass.
    pub child_mutation_rate: f32,
    /// Seed of the population's generator. Runs
    /// with the same seed and inputs evolve identically.
    pub seed: Option<u64>,
}

impl PopulationConfig {
    /// Returns a "zero-valued" default configuration.
    /// All values are 0, empty, or in the case of
    /// `NonZeroUsize`s, 1.
    ///
    /// # Note
    /// This value is not suitable for use in most experiments.
    /// It is meant as a way to abbreviate configuration
    /// instantiation, or to fill in unused values.
    ///
    /// # Examples
    /// ```
    /// use oxiga::PopulationConfig;
    ///
    /// let cfg = PopulationConfig {
    ///     size: 10,
    ///     selection_percent: 20,
    ///     ..PopulationConfig::zero()
    /// };
    /// assert!(cfg.validate().is_ok());
    /// ```
    pub const fn zero() -> PopulationConfig {
        PopulationConfig {
            size: 0,
            mutation_rate: 0.0,
            random_child_chance: 0.0,
            selection_percent: 0,
            network_saving_interval: NonZeroUsize::MIN,
            crossover_strategy: CrossoverStrategy::Average,
            child_mutation_rate: 0.0,
            seed: None,
        }
    }

    /// Checks that every probability lies in [0, 1] and
    /// that the selection percentage is at most 100.
    ///
    /// Probabilities above their useful range are accepted
    /// with a warning.
    ///
    /// # Examples
    /// ```
    /// use oxiga::PopulationConfig;
    ///
    /// let cfg = PopulationConfig {
    ///     mutation_rate: 1.5,
    ///     ..PopulationConfig::default()
    /// };
    /// assert!(cfg.validate().is_err());
    /// ```
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [
            ("mutation_rate", self.mutation_rate),
            ("random_child_chance", self.random_child_chance),
            ("child_mutation_rate", self.child_mutation_rate),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::Probability { name, value });
            }
        }
        if self.selection_percent > 100 {
            return Err(ConfigError::SelectionPercent(self.selection_percent));
        }

        if self.mutation_rate > 0.1 {
            warn!(mutation_rate = self.mutation_rate, "mutation rate above 0.1");
        }
        if self.random_child_chance > 0.05 {
            warn!(
                random_child_chance = self.random_child_chance,
                "random child chance above 0.05"
            );
        }
        if self.selection_percent == 0 {
            warn!("selection percent is 0, only the champion will breed");
        }
        Ok(())
    }
}

impl Default for PopulationConfig {
    fn default() -> PopulationConfig {
        PopulationConfig {
            size: 50,
            mutation_rate: 0.055,
            random_child_chance: 0.02,
            selection_percent: 20,
            network_saving_interval: NonZeroUsize::MIN.saturating_add(99),
            crossover_strategy: CrossoverStrategy::Average,
            child_mutation_rate: 0.0,
            seed: None,
        }
    }
}
