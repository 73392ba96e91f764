use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{Error, TaxiId, Time};

/// Things a taxi does during its shift.
///
/// The declaration order is the final tie-break of the event order, so it must not change.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Action {
    /// Taxi leaves the garage.
    #[strum(serialize = "START")]
    Start,
    /// Passenger is picked up.
    #[strum(serialize = "PICK_UP")]
    PickUp,
    /// Passenger is dropped off.
    #[strum(serialize = "DROP_OFF")]
    DropOff,
    /// Taxi goes back to the garage.
    #[strum(serialize = "END")]
    End,
}

impl Action {
    /// Parses a canonical action name, e.g., `PICK_UP`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownAction`] for any other name.
    pub fn parse(name: &str) -> crate::Result<Self> {
        Self::from_str(name).map_err(|_| Error::UnknownAction(name.to_string()))
    }
}

/// Something a taxi does at a given time.
///
/// Events are ordered by the time first, then by the taxi ID, then by the action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Event {
    /// When the event occurs.
    pub time: Time,
    /// The taxi doing it.
    pub taxi: TaxiId,
    /// What is being done.
    pub action: Action,
}

impl Event {
    /// Constructs a new event.
    #[must_use]
    pub fn new(time: Time, taxi: TaxiId, action: Action) -> Self {
        Self { time, taxi, action }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Event(time={}, taxi={}, action={})",
            self.time, self.taxi, self.action
        )
    }
}
