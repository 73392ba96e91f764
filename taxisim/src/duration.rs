use std::collections::BTreeMap;

use rand::Rng;
use rand_distr::{Distribution, Exp};

use crate::{Action, Error, Result, Time};

/// Determines how long it takes a taxi to get to its next action.
pub trait DurationFunction {
    /// Returns the positive delay until the action following `previous`.
    ///
    /// # Errors
    ///
    /// Any error returned here is fatal and aborts the simulation.
    fn duration(&mut self, previous: Action) -> Result<Time>;
}

impl<F> DurationFunction for F
where
    F: FnMut(Action) -> Result<Time>,
{
    fn duration(&mut self, previous: Action) -> Result<Time> {
        self(previous)
    }
}

/// Draws delays at random.
///
/// After [`Action::Start`] and [`Action::DropOff`], the taxi is searching for passengers,
/// and the delay is drawn from the search distribution; after [`Action::PickUp`], the taxi is
/// making a trip, and the delay is drawn from the trip distribution. Any sampled value `x` is
/// turned into `floor(x) + 1` time units, so that delays are always positive. The delay after
/// [`Action::End`] is fixed.
pub struct RandomDurations<R, S, T>
where
    R: Rng,
    S: Distribution<f64>,
    T: Distribution<f64>,
{
    rng: R,
    search: S,
    trip: T,
    end_delay: Time,
}

impl<R, S, T> RandomDurations<R, S, T>
where
    R: Rng,
    S: Distribution<f64>,
    T: Distribution<f64>,
{
    /// Constructs a duration function drawing from the given search and trip distributions.
    pub fn new(rng: R, search: S, trip: T, end_delay: Time) -> Self {
        Self {
            rng,
            search,
            trip,
            end_delay,
        }
    }

    fn sample<D: Distribution<f64>>(rng: &mut R, dist: &D) -> Time {
        let value = dist.sample(rng);
        let value = if value.is_finite() && value > 0.0 {
            value
        } else {
            0.0
        };
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let whole = value.floor() as Time;
        whole.saturating_add(1)
    }
}

impl<R: Rng> RandomDurations<R, Exp<f64>, Exp<f64>> {
    /// Constructs a duration function drawing from exponential distributions with the given
    /// means.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidMean`] if any mean is not a positive finite number.
    pub fn exponential(rng: R, search_mean: f64, trip_mean: f64, end_delay: Time) -> Result<Self> {
        let search = exponential(Action::DropOff, search_mean)?;
        let trip = exponential(Action::PickUp, trip_mean)?;
        Ok(Self::new(rng, search, trip, end_delay))
    }
}

fn exponential(action: Action, mean: f64) -> Result<Exp<f64>> {
    if !mean.is_finite() || mean <= 0.0 {
        return Err(Error::InvalidMean { action, mean });
    }
    Exp::new(1.0 / mean).map_err(|_| Error::InvalidMean { action, mean })
}

impl<R, S, T> DurationFunction for RandomDurations<R, S, T>
where
    R: Rng,
    S: Distribution<f64>,
    T: Distribution<f64>,
{
    fn duration(&mut self, previous: Action) -> Result<Time> {
        let delay = match previous {
            Action::Start | Action::DropOff => Self::sample(&mut self.rng, &self.search),
            Action::PickUp => Self::sample(&mut self.rng, &self.trip),
            Action::End => self.end_delay,
        };
        log::trace!("Drew delay {} following {}", delay, previous);
        Ok(delay)
    }
}

/// Always returns the same delay for the same action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedDurations {
    /// Delay after [`Action::Start`] and [`Action::DropOff`].
    pub search: Time,
    /// Delay after [`Action::PickUp`].
    pub trip: Time,
    /// Delay after [`Action::End`].
    pub end: Time,
}

impl Default for FixedDurations {
    fn default() -> Self {
        Self {
            search: 5,
            trip: 20,
            end: 1,
        }
    }
}

impl FixedDurations {
    /// Builds fixed durations from a table mapping action names to the delay following them.
    ///
    /// [`Action::Start`] and [`Action::DropOff`] both start a search, so they must agree if
    /// both are given; one of them is enough.
    ///
    /// # Errors
    ///
    /// Fails if the table contains an unknown action name, if an action has no delay, if the
    /// two search delays disagree, or if any delay is zero.
    pub fn from_table(table: &BTreeMap<String, Time>) -> Result<Self> {
        let mut delays = BTreeMap::new();
        for (name, &delay) in table {
            let action = Action::parse(name)?;
            if delay == 0 {
                return Err(Error::NonPositiveDelay(action));
            }
            delays.insert(action, delay);
        }
        let search = match (delays.get(&Action::Start), delays.get(&Action::DropOff)) {
            (Some(start), Some(drop_off)) if start != drop_off => {
                return Err(Error::InconsistentDuration(Action::Start, Action::DropOff))
            }
            (Some(&delay), _) | (None, Some(&delay)) => delay,
            (None, None) => return Err(Error::MissingDuration(Action::DropOff)),
        };
        let get = |action| {
            delays
                .get(&action)
                .copied()
                .ok_or(Error::MissingDuration(action))
        };
        Ok(Self {
            search,
            trip: get(Action::PickUp)?,
            end: get(Action::End)?,
        })
    }
}

impl DurationFunction for FixedDurations {
    fn duration(&mut self, previous: Action) -> Result<Time> {
        Ok(match previous {
            Action::Start | Action::DropOff => self.search,
            Action::PickUp => self.trip,
            Action::End => self.end,
        })
    }
}
