use std::collections::BTreeMap;
use std::convert::TryFrom;

use rand_chacha::{rand_core::SeedableRng, ChaChaRng};
use serde::{Deserialize, Serialize};

use crate::{
    Action, DurationFunction, Error, EventSink, FixedDurations, RandomDurations, Report, Result,
    Simulator, TaxiId, TaxiProcess, Time,
};

/// How delays between actions are determined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::EnumString)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum DurationModel {
    /// Delays are drawn from exponential distributions. See
    /// [`RandomDurations`](crate::RandomDurations).
    Exponential,
    /// Every action is followed by a fixed delay. See [`FixedDurations`].
    Fixed,
}

impl Default for DurationModel {
    fn default() -> Self {
        Self::Exponential
    }
}

/// Number of trips the `index`-th taxi of the fleet makes: `2 * (index + 1)`.
#[must_use]
pub fn trip_count(index: usize) -> u32 {
    u32::try_from(index)
        .ok()
        .and_then(|i| i.checked_add(1))
        .and_then(|i| i.checked_mul(2))
        .unwrap_or(u32::MAX)
}

/// Time at which the `index`-th taxi leaves the garage: `index * departure_interval`.
#[must_use]
pub fn departure_offset(index: usize, departure_interval: Time) -> Time {
    Time::try_from(index)
        .ok()
        .and_then(|i| i.checked_mul(departure_interval))
        .unwrap_or(Time::MAX)
}

/// Simulation parameters. Missing fields take their default values when deserialized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// No new events are taken off the queue once the clock reaches this time.
    pub horizon: Time,
    /// Number of taxis in the fleet.
    pub num_taxis: usize,
    /// Time between consecutive taxis leaving the garage.
    pub departure_interval: Time,
    /// Seed for drawing random delays. If `None`, the generator is seeded from entropy.
    pub seed: Option<u64>,
    /// Average time spent searching for a passenger.
    pub search_mean: f64,
    /// Average trip time.
    pub trip_mean: f64,
    /// Delay following the end of a shift.
    pub end_delay: Time,
    /// How delays are determined.
    pub durations: DurationModel,
    /// Delays used by [`DurationModel::Fixed`], keyed by action names, e.g., `PICK_UP`.
    /// If `None`, the rounded means are used instead.
    pub fixed_durations: Option<BTreeMap<String, Time>>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            horizon: 180,
            num_taxis: 3,
            departure_interval: 5,
            seed: None,
            search_mean: 5.0,
            trip_mean: 20.0,
            end_delay: 1,
            durations: DurationModel::default(),
            fixed_durations: None,
        }
    }
}

impl SimulationConfig {
    /// Checks that all parameters are within their domains.
    ///
    /// # Errors
    ///
    /// Returns the first violation found.
    pub fn validate(&self) -> Result<()> {
        if self.horizon == 0 {
            return Err(Error::InvalidHorizon);
        }
        if self.num_taxis == 0 {
            return Err(Error::EmptyFleet);
        }
        for &(action, mean) in &[
            (Action::DropOff, self.search_mean),
            (Action::PickUp, self.trip_mean),
        ] {
            if !mean.is_finite() || mean <= 0.0 {
                return Err(Error::InvalidMean { action, mean });
            }
        }
        if self.end_delay == 0 {
            return Err(Error::NonPositiveDelay(Action::End));
        }
        if self.durations == DurationModel::Fixed {
            self.fixed_durations()?;
        }
        Ok(())
    }

    /// Builds the taxi processes, with the IDs equal to their positions in the fleet.
    #[must_use]
    pub fn fleet(&self) -> Vec<TaxiProcess> {
        (0..self.num_taxis)
            .map(|index| {
                TaxiProcess::new(
                    TaxiId::from(index),
                    trip_count(index),
                    departure_offset(index, self.departure_interval),
                )
            })
            .collect()
    }

    /// Delays used with [`DurationModel::Fixed`].
    ///
    /// # Errors
    ///
    /// Fails if the configured table is invalid. See [`FixedDurations::from_table`].
    pub fn fixed_durations(&self) -> Result<FixedDurations> {
        match &self.fixed_durations {
            Some(table) => FixedDurations::from_table(table),
            None => Ok(FixedDurations {
                search: round_mean(self.search_mean),
                trip: round_mean(self.trip_mean),
                end: self.end_delay,
            }),
        }
    }

    /// Builds the duration function selected by [`durations`](Self::durations).
    ///
    /// # Errors
    ///
    /// Fails if the parameters of the selected model are invalid.
    pub fn duration_function(&self) -> Result<Box<dyn DurationFunction>> {
        let durations: Box<dyn DurationFunction> = match self.durations {
            DurationModel::Exponential => {
                let rng = match self.seed {
                    Some(seed) => ChaChaRng::seed_from_u64(seed),
                    None => ChaChaRng::from_entropy(),
                };
                Box::new(RandomDurations::exponential(
                    rng,
                    self.search_mean,
                    self.trip_mean,
                    self.end_delay,
                )?)
            }
            DurationModel::Fixed => Box::new(self.fixed_durations()?),
        };
        Ok(durations)
    }

    /// Validates the configuration, then runs a simulation of the configured fleet,
    /// passing all dispatched events to `sink`.
    ///
    /// # Errors
    ///
    /// Returns any configuration error, or any error aborting the simulation.
    pub fn run<S: EventSink + ?Sized>(&self, sink: &mut S) -> Result<Report> {
        self.validate()?;
        let mut durations = self.duration_function()?;
        log::info!(
            "Starting simulation of {} taxis until time {}",
            self.num_taxis,
            self.horizon
        );
        Simulator::new(self.fleet())?.run(self.horizon, &mut *durations, sink)
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn round_mean(mean: f64) -> Time {
    std::cmp::max(mean.round() as Time, 1)
}
