//! Discrete-event simulation of a taxi fleet.
//!
//! Every taxi is a [`Process`] that only advances when the [`Simulator`] resumes it. The
//! simulator keeps a single priority queue of pending [`Event`]s, at most one per live taxi,
//! and always dispatches the earliest one, breaking ties by taxi ID and then by [`Action`].
//! With a seeded (or stubbed) [`DurationFunction`], the dispatched sequence is fully
//! reproducible.

#![warn(
    missing_docs,
    rust_2018_idioms,
    trivial_casts,
    trivial_numeric_casts,
    unused_import_braces,
    unused_qualifications
)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions, clippy::default_trait_access)]
#![deny(unsafe_code)]

use std::io;

use derive_more::{Display, From, Into};
use serde::{Deserialize, Serialize};

mod config;
pub use config::{departure_offset, trip_count, DurationModel, SimulationConfig};

mod duration;
pub use duration::{DurationFunction, FixedDurations, RandomDurations};

mod event;
pub use event::{Action, Event};

mod process;
pub use process::{Process, ProcessState, Step, TaxiProcess};

mod queue;
pub use queue::EventQueue;

mod simulator;
pub use simulator::{Report, Simulator, Termination};

mod sink;
pub use sink::{CsvSink, EventLog, EventSink, LogSink, TextSink};

/// Virtual simulation time, in minutes.
pub type Time = u64;

/// Taxi ID.
#[derive(
    From,
    Into,
    Debug,
    PartialEq,
    PartialOrd,
    Eq,
    Ord,
    Serialize,
    Deserialize,
    Copy,
    Clone,
    Hash,
    Display,
)]
pub struct TaxiId(usize);

/// Raised when a taxi process is driven out of order.
///
/// These are programming errors of the caller, and are kept apart from [`Step::Done`], which
/// is the normal way of a process to say it has nothing more to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ProtocolError {
    /// The process was resumed before it was started.
    #[error("taxi {0} was resumed before it was started")]
    NotStarted(TaxiId),
    /// The process was started more than once.
    #[error("taxi {0} has already been started")]
    AlreadyStarted(TaxiId),
    /// The process was resumed after it had already signaled it was done.
    #[error("taxi {0} was resumed after its shift ended")]
    Terminated(TaxiId),
}

/// Error type encompassing all simulation errors.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Action name outside of the known set of actions.
    #[error("unknown action: `{0}`")]
    UnknownAction(String),
    /// A duration table does not define a delay for the action.
    #[error("no duration defined for action {0}")]
    MissingDuration(Action),
    /// Two actions that must share a delay were given different ones.
    #[error("actions {0} and {1} must have the same duration")]
    InconsistentDuration(Action, Action),
    /// A duration function returned zero delay.
    #[error("delay following action {0} must be positive")]
    NonPositiveDelay(Action),
    /// The simulation horizon must be positive.
    #[error("simulation horizon must be positive")]
    InvalidHorizon,
    /// The fleet must have at least one taxi.
    #[error("there must be at least one taxi")]
    EmptyFleet,
    /// Distribution mean is not a positive finite number.
    #[error("invalid mean duration following {action}: {mean}")]
    InvalidMean {
        /// Action the mean applies to.
        action: Action,
        /// The rejected value.
        mean: f64,
    },
    /// Two processes were registered under the same ID.
    #[error("duplicate taxi ID: {0}")]
    DuplicateTaxi(TaxiId),
    /// An event refers to a taxi that is not in the live registry.
    #[error("event for unknown taxi: {0}")]
    UnknownTaxi(TaxiId),
    /// The simulator has already been run.
    #[error("simulation has already been run")]
    AlreadyRun,
    /// The next event time does not fit in [`Time`].
    #[error("simulation clock overflow")]
    ClockOverflow,
    /// See [`ProtocolError`].
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
    /// Event sink failed.
    #[error("event sink failed: {0}")]
    Sink(#[from] io::Error),
}

/// Result alias using [`Error`](enum.Error.html).
pub type Result<T> = std::result::Result<T, Error>;
