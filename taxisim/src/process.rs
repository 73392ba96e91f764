use crate::{Action, Event, ProtocolError, TaxiId, Time};

/// Result of resuming a process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// The process has suspended again after producing its next event.
    Event(Event),
    /// The process has nothing more to do and must not be resumed again.
    Done,
}

/// Lifecycle of a process as seen from the outside.
///
/// A process is only ever running inside of a call to [`Process::start`] or
/// [`Process::resume`], and because nothing can observe it in the middle of that call,
/// there is no running state here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessState {
    /// Created but not yet started.
    NotStarted,
    /// Suspended after producing an event, waiting for the next resume time.
    AwaitingResume,
    /// Done; any further resume is a protocol violation.
    Terminated,
}

/// A simulated entity that advances one step at a time, only when the scheduler asks it to.
pub trait Process {
    /// ID of the process, unique within a simulation.
    fn id(&self) -> TaxiId;

    /// Current lifecycle state.
    fn state(&self) -> ProcessState;

    /// Produces the first event. Must be called exactly once, before any call to `resume`.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::AlreadyStarted`] if called more than once.
    fn start(&mut self) -> Result<Event, ProtocolError>;

    /// Resumes the process at `time`, and returns the event it produces next, which happens
    /// exactly at `time`, or [`Step::Done`] if it has finished.
    ///
    /// # Errors
    ///
    /// Returns an error if the process has not been started or if it has already returned
    /// [`Step::Done`].
    fn resume(&mut self, time: Time) -> Result<Step, ProtocolError>;
}

/// Where the taxi is suspended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Position {
    NotStarted,
    After(Action),
    Terminated,
}

/// A taxi that leaves the garage, does a fixed number of trips, and goes back.
///
/// Over its lifetime, a taxi with `n` trips produces exactly `2n + 2` events:
/// [`Action::Start`], then `n` pairs of [`Action::PickUp`] and [`Action::DropOff`],
/// and finally [`Action::End`].
///
/// # Examples
///
/// ```
/// # use taxisim::{Action, Process, Step, TaxiId, TaxiProcess};
/// # fn main() -> Result<(), taxisim::ProtocolError> {
/// let mut taxi = TaxiProcess::new(TaxiId::from(0), 1, 0);
/// assert_eq!(taxi.start()?.action, Action::Start);
/// let actions: Vec<Step> = (1..)
///     .map(|time| taxi.resume(time))
///     .take(4)
///     .collect::<Result<_, _>>()?;
/// assert_eq!(
///     actions,
///     vec![
///         Step::Event(taxisim::Event::new(1, TaxiId::from(0), Action::PickUp)),
///         Step::Event(taxisim::Event::new(2, TaxiId::from(0), Action::DropOff)),
///         Step::Event(taxisim::Event::new(3, TaxiId::from(0), Action::End)),
///         Step::Done,
///     ]
/// );
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct TaxiProcess {
    id: TaxiId,
    remaining_trips: u32,
    start_time: Time,
    position: Position,
}

impl TaxiProcess {
    /// Constructs a taxi that will do `trips` trips, leaving the garage at `start_time`.
    #[must_use]
    pub fn new(id: TaxiId, trips: u32, start_time: Time) -> Self {
        Self {
            id,
            remaining_trips: trips,
            start_time,
            position: Position::NotStarted,
        }
    }

    /// Number of trips the taxi has yet to start.
    #[must_use]
    pub fn remaining_trips(&self) -> u32 {
        self.remaining_trips
    }

    fn event(&self, time: Time, action: Action) -> Event {
        Event::new(time, self.id, action)
    }
}

impl Process for TaxiProcess {
    fn id(&self) -> TaxiId {
        self.id
    }

    fn state(&self) -> ProcessState {
        match self.position {
            Position::NotStarted => ProcessState::NotStarted,
            Position::After(_) => ProcessState::AwaitingResume,
            Position::Terminated => ProcessState::Terminated,
        }
    }

    fn start(&mut self) -> Result<Event, ProtocolError> {
        if self.position != Position::NotStarted {
            return Err(ProtocolError::AlreadyStarted(self.id));
        }
        self.position = Position::After(Action::Start);
        Ok(self.event(self.start_time, Action::Start))
    }

    fn resume(&mut self, time: Time) -> Result<Step, ProtocolError> {
        let next = match self.position {
            Position::NotStarted => return Err(ProtocolError::NotStarted(self.id)),
            Position::Terminated => return Err(ProtocolError::Terminated(self.id)),
            Position::After(Action::End) => {
                self.position = Position::Terminated;
                return Ok(Step::Done);
            }
            Position::After(Action::PickUp) => Action::DropOff,
            Position::After(Action::Start) | Position::After(Action::DropOff) => {
                if self.remaining_trips > 0 {
                    self.remaining_trips -= 1;
                    Action::PickUp
                } else {
                    Action::End
                }
            }
        };
        self.position = Position::After(next);
        Ok(Step::Event(self.event(time, next)))
    }
}
