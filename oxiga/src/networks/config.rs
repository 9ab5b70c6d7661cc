use serde::{Deserialize, Serialize};

use std::fmt;
use std::num::NonZeroUsize;

/// Layer structure of a [`Network`].
///
/// A topology with `hidden_layers == 0` connects the inputs
/// straight to the outputs, and `neurons_per_layer` is unused.
/// Otherwise the network has `hidden_layers` fully-connected
/// hidden layers of `neurons_per_layer` neurons each.
///
/// [`Network`]: crate::networks::Network
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct Topology {
    /// Length of the sensor input vector.
    pub input_count: NonZeroUsize,
    /// Length of the action output vector.
    pub output_count: NonZeroUsize,
    /// Number of hidden layers.
    pub hidden_layers: usize,
    /// Width of every hidden layer.
    pub neurons_per_layer: NonZeroUsize,
}

impl Topology {
    /// Returns a "zero-valued" topology: a single
    /// input wired directly to a single output.
    ///
    /// # Note
    /// This value is not suitable for use in most experiments.
    /// It is meant as a way to abbreviate configuration
    /// instantiation, or to fill in unused values.
    ///
    /// # Examples
    /// ```
    /// use oxiga::networks::Topology;
    /// use std::num::NonZeroUsize;
    ///
    /// let topology = Topology {
    ///     input_count: NonZeroUsize::new(3).unwrap(),
    ///     hidden_layers: 1,
    ///     ..Topology::zero()
    /// };
    /// assert_eq!(topology.transition_count(), 2);
    /// ```
    pub const fn zero() -> Topology {
        Topology {
            input_count: NonZeroUsize::MIN,
            output_count: NonZeroUsize::MIN,
            hidden_layers: 0,
            neurons_per_layer: NonZeroUsize::MIN,
        }
    }

    /// Number of weight matrices (and bias scalars)
    /// in a network of this topology.
    ///
    /// Saturates at `usize::MAX` for topologies
    /// [`checked_parameter_count`](Self::checked_parameter_count) rejects.
    pub fn transition_count(&self) -> usize {
        self.hidden_layers.saturating_add(1)
    }

    /// Sizes of every layer, inputs first and outputs last.
    ///
    /// # Examples
    /// ```
    /// use oxiga::networks::Topology;
    /// use std::num::NonZeroUsize;
    ///
    /// let topology = Topology {
    ///     input_count: NonZeroUsize::new(7).unwrap(),
    ///     output_count: NonZeroUsize::new(2).unwrap(),
    ///     hidden_layers: 2,
    ///     neurons_per_layer: NonZeroUsize::new(4).unwrap(),
    /// };
    /// assert_eq!(topology.layer_sizes(), vec![7, 4, 4, 2]);
    /// ```
    pub fn layer_sizes(&self) -> Vec<usize> {
        std::iter::once(self.input_count.get())
            .chain(std::iter::repeat(self.neurons_per_layer.get()).take(self.hidden_layers))
            .chain(std::iter::once(self.output_count.get()))
            .collect()
    }

    /// Returns the `(rows, columns)` shape of every weight matrix.
    pub fn transition_shapes(&self) -> Vec<(usize, usize)> {
        self.layer_sizes().windows(2).map(|w| (w[0], w[1])).collect()
    }

    /// Total number of evolvable parameters (weights and biases),
    /// saturating at `usize::MAX`.
    pub fn parameter_count(&self) -> usize {
        self.checked_parameter_count().unwrap_or(usize::MAX)
    }

    /// Total number of evolvable parameters, or `None` if it
    /// does not fit in a `usize`. Computed without allocating,
    /// so it is safe to call on untrusted topologies.
    ///
    /// # Examples
    /// ```
    /// use oxiga::networks::Topology;
    ///
    /// assert_eq!(Topology::default().checked_parameter_count(), Some(7 * 16 + 16 * 16 + 16 * 2 + 3));
    ///
    /// let huge = Topology { hidden_layers: usize::MAX, ..Topology::zero() };
    /// assert_eq!(huge.checked_parameter_count(), None);
    /// ```
    pub fn checked_parameter_count(&self) -> Option<usize> {
        let inputs = self.input_count.get();
        let outputs = self.output_count.get();
        let width = self.neurons_per_layer.get();
        let transitions = self.hidden_layers.checked_add(1)?;
        let weights = match self.hidden_layers {
            0 => inputs.checked_mul(outputs)?,
            hidden => {
                let inner = width.checked_mul(width)?.checked_mul(hidden - 1)?;
                inputs
                    .checked_mul(width)?
                    .checked_add(inner)?
                    .checked_add(width.checked_mul(outputs)?)?
            }
        };
        weights.checked_add(transitions)
    }
}

impl Default for Topology {
    /// Seven sensors (five rangefinders, speed and acceleration)
    /// driving two actuators (throttle and steering).
    fn default() -> Self {
        Topology {
            input_count: NonZeroUsize::MIN.saturating_add(6),
            output_count: NonZeroUsize::MIN.saturating_add(1),
            hidden_layers: 2,
            neurons_per_layer: NonZeroUsize::MIN.saturating_add(15),
        }
    }
}

impl fmt::Display for Topology {
    /// Formats the topology as its dash-separated layer sizes, e.g. `7-16-16-2`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.input_count)?;
        for _ in 0..self.hidden_layers {
            write!(f, "-{}", self.neurons_per_layer)?;
        }
        write!(f, "-{}", self.output_count)
    }
}
