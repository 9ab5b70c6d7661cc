//! A Network is a fixed-topology, fully-connected
//! feedforward controller. Its genome is the full set
//! of weight matrices and per-layer bias scalars, which
//! the genetic operators rewrite in place.
//!
//! Every buffer a network needs is allocated when it is
//! built; evaluation and breeding never resize anything.
//! Changing a topology means building a new network.
mod codec;
mod config;
mod errors;
pub mod operators;

pub use config::Topology;
pub use errors::NetworkError;
pub use operators::CrossoverStrategy;

use ndarray::linalg::general_mat_vec_mul;
use ndarray::{Array1, Array2};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// A layered feedforward neural network with `tanh` activations.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(try_from = "NetworkParts", into = "NetworkParts")]
pub struct Network {
    topology: Topology,
    /// Row `i` of a matrix holds the weights leaving neuron `i`
    /// of the previous layer; column `j` those entering neuron
    /// `j` of the next one.
    weights: Box<[Array2<f32>]>,
    biases: Box<[f32]>,
    activations: Box<[Array1<f32>]>,
    outputs: Box<[f32]>,
}

impl Network {
    /// Builds a network with every weight and bias
    /// drawn uniformly from `[-1, 1]`.
    ///
    /// # Examples
    /// ```
    /// use oxiga::networks::{Network, Topology};
    /// use oxiga::rng;
    /// use std::num::NonZeroUsize;
    ///
    /// let topology = Topology {
    ///     input_count: NonZeroUsize::new(7).unwrap(),
    ///     output_count: NonZeroUsize::new(2).unwrap(),
    ///     hidden_layers: 2,
    ///     neurons_per_layer: NonZeroUsize::new(8).unwrap(),
    /// };
    /// let network = Network::new(&topology, &mut rng::seeded(Some(42)));
    ///
    /// assert_eq!(network.weights().len(), 3);
    /// assert_eq!(network.biases().len(), 3);
    /// assert!(network.biases().iter().all(|b| (-1.0..=1.0).contains(b)));
    /// ```
    pub fn new<R: Rng + ?Sized>(topology: &Topology, rng: &mut R) -> Network {
        let mut network = Network::zeroed(topology);
        operators::randomise(&mut network, rng);
        network
    }

    /// Builds a network of the given shape with every parameter set to 0.
    pub(crate) fn zeroed(topology: &Topology) -> Network {
        let weights = topology
            .transition_shapes()
            .into_iter()
            .map(Array2::zeros)
            .collect();
        Network::assemble(*topology, weights, vec![0.0; topology.transition_count()].into())
    }

    /// Wraps already-shaped parameters, allocating the activation
    /// buffers. Shapes must chain as `topology` describes.
    fn assemble(topology: Topology, weights: Box<[Array2<f32>]>, biases: Box<[f32]>) -> Network {
        let activations = topology
            .layer_sizes()
            .into_iter()
            .map(Array1::zeros)
            .collect();
        Network {
            topology,
            weights,
            biases,
            activations,
            outputs: vec![0.0; topology.output_count.get()].into(),
        }
    }

    /// Builds a network from explicit parameters.
    ///
    /// `weights` holds one row-major entry list per layer transition.
    ///
    /// # Errors
    /// Returns [`NetworkError::InvalidTopology`] if the number of
    /// matrices or biases, or the size of any matrix, disagrees
    /// with `topology`, or if `topology` has more parameters than
    /// can be addressed. No partially-built network is returned.
    ///
    /// # Examples
    /// ```
    /// use oxiga::networks::{Network, Topology};
    /// use std::num::NonZeroUsize;
    ///
    /// let topology = Topology {
    ///     input_count: NonZeroUsize::new(2).unwrap(),
    ///     ..Topology::zero()
    /// };
    /// let network = Network::from_parts(topology, vec![vec![0.5, -0.5]], vec![0.0]).unwrap();
    /// assert_eq!(network.weights()[0][[1, 0]], -0.5);
    ///
    /// assert!(Network::from_parts(topology, vec![vec![0.5]], vec![0.0]).is_err());
    /// ```
    pub fn from_parts(
        topology: Topology,
        weights: Vec<Vec<f32>>,
        biases: Vec<f32>,
    ) -> Result<Network, NetworkError> {
        if topology.checked_parameter_count().is_none() {
            return Err(NetworkError::InvalidTopology(format!(
                "{} hidden layers of {} neurons is too large",
                topology.hidden_layers, topology.neurons_per_layer
            )));
        }
        let transitions = topology.transition_count();
        if weights.len() != transitions {
            return Err(NetworkError::InvalidTopology(format!(
                "{} weight matrices given for {} layer transitions",
                weights.len(),
                transitions
            )));
        }
        if biases.len() != transitions {
            return Err(NetworkError::InvalidTopology(format!(
                "{} biases given for {} layer transitions",
                biases.len(),
                transitions
            )));
        }

        // Bounded by `weights.len()` from here on.
        let shapes = topology.transition_shapes();
        let matrices = weights
            .into_iter()
            .zip(shapes)
            .enumerate()
            .map(|(t, (entries, shape))| {
                let found = entries.len();
                Array2::from_shape_vec(shape, entries).map_err(|_| {
                    NetworkError::InvalidTopology(format!(
                        "transition {} expects {}x{} weights, got {}",
                        t, shape.0, shape.1, found
                    ))
                })
            })
            .collect::<Result<_, _>>()?;
        Ok(Network::assemble(topology, matrices, biases.into()))
    }

    /// Runs the network on `inputs` and returns its outputs,
    /// each in the open interval (-1, 1).
    ///
    /// Inputs are squashed with `tanh`, then every layer computes
    /// `tanh(previous · weights + bias)`, the bias being a single
    /// scalar added to every neuron of the layer. The final layer's
    /// activation is passed through `tanh` once more.
    ///
    /// Inputs are not normalised: callers should pre-scale them
    /// to a small range such as [-1, 1] or [0, 1].
    ///
    /// # Errors
    /// Returns [`NetworkError::DimensionMismatch`] if `inputs` does
    /// not have exactly `input_count` entries. The network's
    /// parameters are never modified.
    ///
    /// # Examples
    /// ```
    /// use oxiga::networks::{Network, Topology};
    /// use std::num::NonZeroUsize;
    ///
    /// let topology = Topology {
    ///     input_count: NonZeroUsize::new(2).unwrap(),
    ///     ..Topology::zero()
    /// };
    /// let mut network = Network::from_parts(topology, vec![vec![1.0, 1.0]], vec![0.5]).unwrap();
    ///
    /// let x = [0.3f32, -0.1];
    /// let expected = (x[0].tanh() + x[1].tanh() + 0.5).tanh().tanh();
    /// assert_eq!(network.evaluate(&x).unwrap(), &[expected]);
    ///
    /// assert!(network.evaluate(&[1.0]).is_err());
    /// ```
    pub fn evaluate(&mut self, inputs: &[f32]) -> Result<&[f32], NetworkError> {
        let expected = self.topology.input_count.get();
        if inputs.len() != expected {
            return Err(NetworkError::DimensionMismatch {
                expected,
                found: inputs.len(),
            });
        }

        for (activation, input) in self.activations[0].iter_mut().zip(inputs) {
            *activation = input.tanh();
        }
        for (t, (weights, &bias)) in self.weights.iter().zip(self.biases.iter()).enumerate() {
            let (previous, next) = self.activations.split_at_mut(t + 1);
            let next = &mut next[0];
            // next = previous · weights, written in place.
            general_mat_vec_mul(1.0, &weights.t(), &previous[t], 0.0, next);
            next.mapv_inplace(|sum| (sum + bias).tanh());
        }
        let last = &self.activations[self.activations.len() - 1];
        for (output, activation) in self.outputs.iter_mut().zip(last.iter()) {
            *output = activation.tanh();
        }

        Ok(&self.outputs)
    }

    /// Breeds `parent_a` and `parent_b` into `self`.
    /// See [`operators::crossover`].
    pub fn crossover_from<R: Rng + ?Sized>(
        &mut self,
        parent_a: &Network,
        parent_b: &Network,
        mutation_probability: f32,
        strategy: CrossoverStrategy,
        rng: &mut R,
    ) -> Result<(), NetworkError> {
        operators::crossover(self, parent_a, parent_b, mutation_probability, strategy, rng)
    }

    /// Returns the network's topology.
    pub fn topology(&self) -> &Topology {
        &self.topology
    }

    pub fn input_count(&self) -> usize {
        self.topology.input_count.get()
    }

    pub fn output_count(&self) -> usize {
        self.topology.output_count.get()
    }

    /// Number of weight matrices, which is also the number of biases.
    pub fn transition_count(&self) -> usize {
        self.weights.len()
    }

    /// Weight matrices in layer order, each shaped
    /// `(previous layer size, next layer size)`.
    pub fn weights(&self) -> &[Array2<f32>] {
        &self.weights
    }

    /// One bias per layer transition, in layer order.
    pub fn biases(&self) -> &[f32] {
        &self.biases
    }

    /// Overwrites a single weight. Returns `false` if out of bounds.
    pub fn set_weight(&mut self, transition: usize, row: usize, column: usize, value: f32) -> bool {
        match self
            .weights
            .get_mut(transition)
            .and_then(|m| m.get_mut((row, column)))
        {
            Some(weight) => {
                *weight = value;
                true
            }
            None => false,
        }
    }

    /// Overwrites a transition's bias. Returns `false` if out of bounds.
    pub fn set_bias(&mut self, transition: usize, value: f32) -> bool {
        match self.biases.get_mut(transition) {
            Some(bias) => {
                *bias = value;
                true
            }
            None => false,
        }
    }

    /// All weights (row-major, layer order) followed by all biases.
    pub(crate) fn parameters(&self) -> impl Iterator<Item = &f32> + '_ {
        self.weights
            .iter()
            .flat_map(|m| m.iter())
            .chain(self.biases.iter())
    }

    pub(crate) fn parameters_mut(&mut self) -> impl Iterator<Item = &mut f32> + '_ {
        self.weights
            .iter_mut()
            .flat_map(|m| m.iter_mut())
            .chain(self.biases.iter_mut())
    }

    /// Fails with [`NetworkError::TopologyMismatch`] unless
    /// `other` has the same topology as `self`.
    pub(crate) fn check_compatible(&self, other: &Network) -> Result<(), NetworkError> {
        if self.topology == other.topology {
            Ok(())
        } else {
            Err(NetworkError::TopologyMismatch {
                expected: self.topology,
                found: other.topology,
            })
        }
    }
}

/// Compares topology and parameters; transient
/// activation buffers are ignored.
impl PartialEq for Network {
    fn eq(&self, other: &Self) -> bool {
        self.topology == other.topology && self.weights == other.weights && self.biases == other.biases
    }
}

/// Serialized form of a [`Network`], validated on the way in.
#[derive(Clone, Serialize, Deserialize)]
struct NetworkParts {
    topology: Topology,
    weights: Vec<Vec<f32>>,
    biases: Vec<f32>,
}

impl TryFrom<NetworkParts> for Network {
    type Error = NetworkError;

    fn try_from(parts: NetworkParts) -> Result<Self, Self::Error> {
        Network::from_parts(parts.topology, parts.weights, parts.biases)
    }
}

impl From<Network> for NetworkParts {
    fn from(network: Network) -> Self {
        NetworkParts {
            topology: network.topology,
            weights: network.weights.iter().map(|m| m.iter().copied().collect()).collect(),
            biases: network.biases.to_vec(),
        }
    }
}
