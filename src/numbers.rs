use crate::types::{MAIN_MAX, NumberSet, SUPER_MAX};
use rand::Rng;

/// Draw a fresh set: five independent uniform mains (repeats allowed) and
/// one independent superbalota.
pub fn generate_numbers<R: Rng + ?Sized>(rng: &mut R) -> NumberSet {
    let numbers = std::array::from_fn(|_| rng.random_range(1..=MAIN_MAX));
    let super_ball = rng.random_range(1..=SUPER_MAX);
    NumberSet::from_parts_unchecked(numbers, super_ball)
}
