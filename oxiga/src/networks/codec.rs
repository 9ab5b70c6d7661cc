//! Line-oriented text records for saving and loading networks.
//!
//! ```text
//! neurons_per_layer,hidden_layers
//! input_count,output_count
//! w,w,w,...,      <- one line per weight matrix, row-major
//! b,b,...,        <- one bias per layer transition
//! ```
//!
//! Values are written with the shortest representation that
//! parses back to the same `f32`, so a round trip is exact.
use super::{Network, NetworkError, Topology};

use ndarray::Array2;

use std::fmt::{self, Write};
use std::num::NonZeroUsize;
use std::str::FromStr;

impl Network {
    /// Serializes the network into a text record.
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
    /// let network = Network::from_parts(topology, vec![vec![0.5, -0.25]], vec![0.125]).unwrap();
    ///
    /// assert_eq!(network.to_record(), "1,0\n2,1\n0.5,-0.25,\n0.125,\n");
    /// ```
    pub fn to_record(&self) -> String {
        let mut record = String::new();
        // Writing into a String cannot fail.
        let _ = self.write_record(&mut record);
        record
    }

    fn write_record<W: Write>(&self, out: &mut W) -> fmt::Result {
        let topology = self.topology();
        writeln!(
            out,
            "{},{}",
            topology.neurons_per_layer, topology.hidden_layers
        )?;
        writeln!(out, "{},{}", topology.input_count, topology.output_count)?;
        for matrix in self.weights() {
            for weight in matrix.iter() {
                write!(out, "{},", weight)?;
            }
            writeln!(out)?;
        }
        for bias in self.biases() {
            write!(out, "{},", bias)?;
        }
        writeln!(out)
    }

    /// Rebuilds a network from a record written by [`Network::to_record`].
    ///
    /// # Errors
    /// Returns [`NetworkError::MalformedRecord`] naming the offending
    /// line if the header is invalid, a line has the wrong number of
    /// values for the declared topology, a value is not a finite
    /// number, or lines are missing or left over. Every size is
    /// checked against the record before anything is allocated, so
    /// a hostile header cannot exhaust memory.
    ///
    /// # Examples
    /// ```
    /// use oxiga::networks::Network;
    ///
    /// let network = Network::from_record("1,0\n2,1\n0.5,-0.25,\n0.125,\n").unwrap();
    /// assert_eq!(network.input_count(), 2);
    /// assert_eq!(network.biases(), &[0.125]);
    ///
    /// assert!(Network::from_record("1,0\n2,1\n0.5,\n0.125,\n").is_err());
    /// ```
    pub fn from_record(record: &str) -> Result<Network, NetworkError> {
        let mut lines = record.trim_end().lines().enumerate().map(|(i, l)| (i + 1, l));

        let (neurons, hidden_layers) = parse_header(lines.next(), 1, "neurons_per_layer,hidden_layers")?;
        let (inputs, outputs) = parse_header(lines.next(), 2, "input_count,output_count")?;
        let topology = Topology {
            input_count: non_zero(inputs, 2, "input_count")?,
            output_count: non_zero(outputs, 2, "output_count")?,
            hidden_layers,
            neurons_per_layer: non_zero(neurons, 1, "neurons_per_layer")?,
        };

        if topology.checked_parameter_count().is_none() {
            return Err(NetworkError::malformed(1, format!("topology {} is too large", Header(&topology))));
        }
        let transitions = topology.transition_count();
        let body: Vec<(usize, &str)> = lines.collect();
        if body.len() < transitions {
            let t = body.len();
            return Err(NetworkError::malformed(3 + t, format!("missing weights of transition {}", t)));
        }
        if body.len() == transitions {
            return Err(NetworkError::malformed(3 + transitions, "missing biases"));
        }

        // One line per transition was found, so the shapes are bounded by the record.
        let mut weights = Vec::with_capacity(transitions);
        let shapes = topology.transition_shapes();
        for (t, (&(line, text), (rows, columns))) in body.iter().zip(shapes).enumerate() {
            let values = parse_values(text, line)?;
            if rows.checked_mul(columns) != Some(values.len()) {
                return Err(NetworkError::malformed(
                    line,
                    format!(
                        "expected {}x{} weights for transition {}, found {}",
                        rows,
                        columns,
                        t,
                        values.len()
                    ),
                ));
            }
            let matrix = Array2::from_shape_vec((rows, columns), values)
                .map_err(|e| NetworkError::malformed(line, e.to_string()))?;
            weights.push(matrix);
        }

        let (line, text) = body[transitions];
        let biases = parse_values(text, line)?;
        if biases.len() != transitions {
            return Err(NetworkError::malformed(
                line,
                format!("expected {} biases, found {}", transitions, biases.len()),
            ));
        }

        if let Some((line, _)) = body.get(transitions + 1) {
            return Err(NetworkError::malformed(*line, "unexpected trailing content"));
        }
        Ok(Network::assemble(topology, weights.into(), biases.into()))
    }
}

impl fmt::Display for Network {
    /// Formats the network as its text record.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_record(f)
    }
}

impl FromStr for Network {
    type Err = NetworkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Network::from_record(s)
    }
}

/// Formats a topology the way its record header reads,
/// without walking its layers.
struct Header<'a>(&'a Topology);

impl fmt::Display for Header<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} inputs, {} outputs, {} hidden layers of {} neurons",
            self.0.input_count, self.0.output_count, self.0.hidden_layers, self.0.neurons_per_layer
        )
    }
}

fn parse_header(
    line: Option<(usize, &str)>,
    expected_line: usize,
    fields: &str,
) -> Result<(usize, usize), NetworkError> {
    let (line, text) =
        line.ok_or_else(|| NetworkError::malformed(expected_line, format!("missing {}", fields)))?;
    let parsed: Vec<&str> = text.trim().split(',').map(str::trim).collect();
    match parsed.as_slice() {
        [first, second] => {
            let parse = |s: &str| {
                s.parse::<usize>().map_err(|_| {
                    NetworkError::malformed(line, format!("{:?} is not a non-negative integer", s))
                })
            };
            Ok((parse(*first)?, parse(*second)?))
        }
        _ => Err(NetworkError::malformed(
            line,
            format!("expected {}, found {:?}", fields, text),
        )),
    }
}

fn non_zero(value: usize, line: usize, field: &str) -> Result<NonZeroUsize, NetworkError> {
    NonZeroUsize::new(value).ok_or_else(|| NetworkError::malformed(line, format!("{} must be positive", field)))
}

/// Parses a comma-terminated list of finite values.
fn parse_values(text: &str, line: usize) -> Result<Vec<f32>, NetworkError> {
    let text = text.trim();
    let body = text
        .strip_suffix(',')
        .ok_or_else(|| NetworkError::malformed(line, "values must be comma-terminated"))?;
    body.split(',')
        .map(|token| {
            let token = token.trim();
            match token.parse::<f32>() {
                Ok(value) if value.is_finite() => Ok(value),
                Ok(_) => Err(NetworkError::malformed(line, format!("non-finite value {:?}", token))),
                Err(_) => Err(NetworkError::malformed(line, format!("{:?} is not a number", token))),
            }
        })
        .collect()
}
