//! Random draws shared by the genetic operators
//! and the population manager.
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Generator type owned by a [`Population`](crate::Population).
pub type EvolutionRng = ChaCha8Rng;

/// Returns a generator seeded with `seed`, or
/// from system entropy if no seed is given.
///
/// # Examples
/// ```
/// use oxiga::rng::seeded;
/// use rand::Rng;
///
/// let a: f32 = seeded(Some(7)).gen();
/// let b: f32 = seeded(Some(7)).gen();
/// assert_eq!(a, b);
/// ```
pub fn seeded(seed: Option<u64>) -> EvolutionRng {
    match seed {
        Some(seed) => ChaCha8Rng::seed_from_u64(seed),
        None => ChaCha8Rng::from_entropy(),
    }
}

/// A fresh parameter value, uniform over `[-1, 1]`.
pub(crate) fn parameter<R: Rng + ?Sized>(rng: &mut R) -> f32 {
    rng.gen_range(-1.0..=1.0)
}

/// Returns `true` with probability `chance`.
pub(crate) fn gen_bool<R: Rng + ?Sized>(rng: &mut R, chance: f32) -> bool {
    rng.gen::<f32>() < chance
}
