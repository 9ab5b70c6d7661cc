use crate::track::{Track, SENSOR_COUNT};

use anyhow::{ensure, Context, Result};
use oxiga::{PopulationConfig, Topology};
use serde::{Deserialize, Serialize};

use std::fs;
use std::num::NonZeroUsize;
use std::path::Path;

/// Everything a run needs besides its command line.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub population: PopulationConfig,
    pub topology: Topology,
    pub track: Track,
    /// Episode length limit, in ticks.
    pub max_ticks: usize,
}

impl Default for RunConfig {
    fn default() -> RunConfig {
        RunConfig {
            population: PopulationConfig {
                size: 40,
                network_saving_interval: NonZeroUsize::MIN.saturating_add(9),
                ..PopulationConfig::default()
            },
            topology: Topology::default(),
            track: Track::default(),
            max_ticks: 3000,
        }
    }
}

impl RunConfig {
    /// Reads a RON config file. Missing fields take their defaults.
    pub fn load(path: &Path) -> Result<RunConfig> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        let config: RunConfig = ron::from_str(&text)
            .with_context(|| format!("failed to parse config {}", path.display()))?;
        config.check()?;
        Ok(config)
    }

    /// Checks that the networks fit the car and that
    /// the track can be driven at all.
    pub fn check(&self) -> Result<()> {
        ensure!(
            self.topology.input_count.get() == SENSOR_COUNT,
            "cars have {} sensors, topology expects {} inputs",
            SENSOR_COUNT,
            self.topology.input_count
        );
        ensure!(
            self.topology.output_count.get() == 2,
            "cars take 2 actions (throttle, steering), topology produces {}",
            self.topology.output_count
        );
        ensure!(
            self.track.inner_radius >= 0.0 && self.track.inner_radius < self.track.outer_radius,
            "track inner radius must be below its outer radius"
        );
        ensure!(self.track.time_step > 0.0, "track time step must be positive");
        ensure!(self.track.acceleration > 0.0, "car acceleration must be positive");
        ensure!(self.track.max_speed > 0.0, "car max speed must be positive");
        ensure!(self.population.size > 0, "population size must be positive");
        self.population.validate()?;
        Ok(())
    }
}
