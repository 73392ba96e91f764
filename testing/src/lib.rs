//! Deterministic distributions for testing simulations that draw their delays at random.

#![warn(
    missing_docs,
    rust_2018_idioms,
    trivial_casts,
    trivial_numeric_casts,
    unused_import_braces,
    unused_qualifications
)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(
    clippy::module_name_repetitions,
    clippy::default_trait_access,
    clippy::cast_precision_loss
)]

use std::cell::Cell;

use rand::distributions::Distribution;

/// This distribution produces values between 0 and `N - 1` by requesting the `next_u32` from the
/// random number generator and applying `mod N` operation on it.
///
/// This is meant for testing, e.g., together with `rand::rngs::mock::StepRng` it can produce
/// predictable values that can be used in unit tests.
pub struct WrappingEchoDistribution<T> {
    size: T,
}

impl<T> WrappingEchoDistribution<T> {
    /// Constructs a new distribution generating values between 0 and `size - 1`.
    pub fn new(size: T) -> Self {
        Self { size }
    }
}

impl<T> Distribution<T> for WrappingEchoDistribution<T>
where
    T: std::convert::TryFrom<u32> + std::ops::Rem<T, Output = T> + Copy,
    <T as std::convert::TryFrom<u32>>::Error: std::fmt::Debug,
{
    fn sample<R: rand::Rng + ?Sized>(&self, rng: &mut R) -> T {
        T::try_from(rng.next_u32()).unwrap() % self.size
    }
}

/// A wrapper over a distribution generating integer values that casts them to floats.
pub struct ToFloatDistribution<D>(D);

impl<D> ToFloatDistribution<D> {
    /// Constructs a float distribution from an integer one.
    pub fn new(dist: D) -> Self {
        Self(dist)
    }
}

impl<D> Distribution<f64> for ToFloatDistribution<D>
where
    D: Distribution<u64>,
{
    fn sample<R: rand::Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        self.0.sample(rng) as f64
    }
}

/// Always returns the same value and never touches the random number generator.
#[derive(Debug, Clone, Copy)]
pub struct ConstantDistribution(pub f64);

impl Distribution<f64> for ConstantDistribution {
    fn sample<R: rand::Rng + ?Sized>(&self, _rng: &mut R) -> f64 {
        self.0
    }
}

/// Returns the given values in order, starting over after the last one.
///
/// # Panics
///
/// Sampling panics if the list of values is empty.
#[derive(Debug, Clone)]
pub struct CycleDistribution {
    values: Vec<f64>,
    position: Cell<usize>,
}

impl CycleDistribution {
    /// Constructs a distribution cycling through `values`.
    pub fn new(values: Vec<f64>) -> Self {
        Self {
            values,
            position: Cell::new(0),
        }
    }
}

impl Distribution<f64> for CycleDistribution {
    fn sample<R: rand::Rng + ?Sized>(&self, _rng: &mut R) -> f64 {
        let position = self.position.get();
        self.position.set((position + 1) % self.values.len());
        self.values[position]
    }
}
