//! Fitness history of an evolving population.
use serde::{Deserialize, Serialize};

use std::collections::BTreeMap;
use std::fmt;

/// A struct for reporting basic statistical data.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Stats {
    pub maximum: f32,
    pub minimum: f32,
    pub mean: f32,
    pub median: f32,
}

impl Stats {
    /// Returns statistics about numbers in a sequence,
    /// or `None` if the sequence is empty.
    ///
    /// # Examples
    /// ```
    /// use oxiga::populations::logging::Stats;
    ///
    /// let stats = Stats::from([-2.0, -1.0, 0.5, 1.0, 1.5].iter().copied()).unwrap();
    /// assert_eq!(stats.maximum, 1.5);
    /// assert_eq!(stats.minimum, -2.0);
    /// assert_eq!(stats.mean, 0.0);
    /// assert_eq!(stats.median, 0.5);
    /// ```
    pub fn from(data: impl Iterator<Item = f32>) -> Option<Stats> {
        let mut data: Vec<f32> = data.collect();
        if data.is_empty() {
            return None;
        }
        let (mut max, mut min, mut sum) = (f32::MIN, f32::MAX, 0.0);
        for d in &data {
            max = d.max(max);
            min = d.min(min);
            sum += d;
        }
        data.sort_unstable_by(f32::total_cmp);
        let mid = data.len() / 2;
        let median = if data.len() % 2 == 0 {
            (data[mid - 1] + data[mid]) / 2.0
        } else {
            data[mid]
        };
        Some(Stats {
            maximum: max,
            minimum: min,
            mean: sum / data.len() as f32,
            median,
        })
    }
}

/// Append-only record of every completed generation's
/// final fitness values, best first.
///
/// Its `Display` form is the generation report: one line per
/// generation, `generation,fitness_1,...,fitness_N,`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GenerationRecord {
    generations: BTreeMap<usize, Vec<f32>>,
}

impl GenerationRecord {
    pub fn new() -> GenerationRecord {
        GenerationRecord::default()
    }

    /// Records the fitness values of `generation`.
    /// Returns `false`, leaving the record unchanged,
    /// if that generation was already recorded.
    ///
    /// # Examples
    /// ```
    /// use oxiga::populations::logging::GenerationRecord;
    ///
    /// let mut record = GenerationRecord::new();
    /// assert!(record.push(1, vec![3.0, 1.5]));
    /// assert!(record.push(2, vec![4.0, 0.25]));
    /// assert!(!record.push(2, vec![0.0, 0.0]));
    ///
    /// assert_eq!(record.to_string(), "1,3,1.5,\n2,4,0.25,\n");
    /// ```
    pub fn push(&mut self, generation: usize, fitness: Vec<f32>) -> bool {
        if self.generations.contains_key(&generation) {
            return false;
        }
        self.generations.insert(generation, fitness);
        true
    }

    /// Fitness values of `generation`, best first.
    pub fn get(&self, generation: usize) -> Option<&[f32]> {
        self.generations.get(&generation).map(Vec::as_slice)
    }

    /// The most recently completed generation.
    pub fn latest(&self) -> Option<(usize, &[f32])> {
        self.generations
            .iter()
            .next_back()
            .map(|(g, f)| (*g, f.as_slice()))
    }

    /// Iterates over generations in increasing order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &[f32])> {
        self.generations.iter().map(|(g, f)| (*g, f.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.generations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.generations.is_empty()
    }
}

impl fmt::Display for GenerationRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (generation, fitness) in self.iter() {
            write!(f, "{},", generation)?;
            for value in fitness {
                write!(f, "{},", value)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
