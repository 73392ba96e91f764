use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use crate::{
    DurationFunction, Error, EventQueue, EventSink, Process, Result, Step, TaxiId, TaxiProcess,
    Time,
};

/// Why the simulation has stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "reason")]
pub enum Termination {
    /// All taxis have finished their shifts.
    NoEventsRemaining,
    /// The clock has reached the horizon while some events were still pending.
    HorizonReached {
        /// Number of events left in the queue.
        pending: usize,
    },
}

impl fmt::Display for Termination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoEventsRemaining => write!(f, "no events remaining"),
            Self::HorizonReached { pending } => {
                write!(f, "horizon reached: {} events pending", pending)
            }
        }
    }
}

/// Summary of a finished simulation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Report {
    /// Why the simulation has stopped.
    pub termination: Termination,
    /// The time of the last dispatched event.
    pub clock: Time,
    /// Total number of dispatched events.
    pub dispatched: usize,
}

/// Drives the simulation: keeps the clock, the queue of pending events, and the registry of
/// taxis still in service.
///
/// Each live taxi has at most one pending event at any time: its next event is only
/// requested once its previous one has been dispatched.
pub struct Simulator<P = TaxiProcess> {
    events: EventQueue,
    processes: BTreeMap<TaxiId, P>,
    clock: Time,
    started: bool,
}

impl<P: Process> Simulator<P> {
    /// Constructs a simulator with the given processes.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DuplicateTaxi`] if two processes have the same ID.
    pub fn new<I>(processes: I) -> Result<Self>
    where
        I: IntoIterator<Item = P>,
    {
        let mut registry = BTreeMap::new();
        for process in processes {
            let id = process.id();
            if registry.insert(id, process).is_some() {
                return Err(Error::DuplicateTaxi(id));
            }
        }
        Ok(Self {
            events: EventQueue::default(),
            processes: registry,
            clock: Time::default(),
            started: false,
        })
    }

    /// Current simulation time.
    #[must_use]
    pub fn clock(&self) -> Time {
        self.clock
    }

    /// Number of taxis still in service.
    #[must_use]
    pub fn live_taxis(&self) -> usize {
        self.processes.len()
    }

    /// Checks if the taxi is still in service.
    #[must_use]
    pub fn is_live(&self, taxi: TaxiId) -> bool {
        self.processes.contains_key(&taxi)
    }

    /// Number of events waiting in the queue.
    #[must_use]
    pub fn pending_events(&self) -> usize {
        self.events.len()
    }

    /// Runs the simulation until there are no more events or the clock reaches `horizon`.
    ///
    /// The horizon is only checked before taking the next event off the queue, so the last
    /// dispatched event may occur at or after the horizon.
    ///
    /// # Errors
    ///
    /// Fails if the horizon is zero, or if the duration function, a process, or the sink
    /// returns an error, in which case the simulation is aborted right away.
    /// A simulator can only be run once; any further runs return [`Error::AlreadyRun`].
    pub fn run<D, S>(&mut self, horizon: Time, durations: &mut D, sink: &mut S) -> Result<Report>
    where
        D: DurationFunction + ?Sized,
        S: EventSink + ?Sized,
    {
        if horizon == 0 {
            return Err(Error::InvalidHorizon);
        }
        if self.started {
            return Err(Error::AlreadyRun);
        }
        self.started = true;
        self.prime()?;
        self.clock = 0;
        let mut dispatched = 0;
        let termination = loop {
            if self.clock >= horizon {
                break Termination::HorizonReached {
                    pending: self.events.len(),
                };
            }
            let event = match self.events.extract_min() {
                Some(event) => event,
                None => break Termination::NoEventsRemaining,
            };
            debug_assert!(event.time >= self.clock, "event from the past: {}", event);
            self.clock = event.time;
            log::debug!("[{}] Dispatching {}", self.clock, event);
            sink.dispatch(&event, self.processes.len())?;
            dispatched += 1;

            let delay = durations.duration(event.action)?;
            if delay == 0 {
                return Err(Error::NonPositiveDelay(event.action));
            }
            let next_time = self.clock.checked_add(delay).ok_or(Error::ClockOverflow)?;
            self.resume(event.taxi, next_time)?;
        };
        sink.finish()?;
        log::info!("[{}] Simulation ended: {}", self.clock, termination);
        Ok(Report {
            termination,
            clock: self.clock,
            dispatched,
        })
    }

    /// Starts all processes in the order of their IDs and queues their first events.
    fn prime(&mut self) -> Result<()> {
        for (id, process) in &mut self.processes {
            let event = process.start()?;
            log::trace!("Taxi {} starts with {}", id, event);
            self.events.insert(event);
        }
        Ok(())
    }

    fn resume(&mut self, taxi: TaxiId, time: Time) -> Result<()> {
        let process = self
            .processes
            .get_mut(&taxi)
            .ok_or(Error::UnknownTaxi(taxi))?;
        match process.resume(time)? {
            Step::Event(event) => {
                log::trace!("Queuing {}", event);
                self.events.insert(event);
            }
            Step::Done => {
                self.processes.remove(&taxi);
                log::debug!(
                    "[{}] Taxi {} is done; {} taxis left",
                    self.clock,
                    taxi,
                    self.processes.len()
                );
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{Action, Event, EventLog, FixedDurations};

    use itertools::Itertools;
    use rstest::{fixture, rstest};

    fn taxi(id: usize, trips: u32, start_time: Time) -> TaxiProcess {
        TaxiProcess::new(TaxiId::from(id), trips, start_time)
    }

    fn timeline(log: &EventLog) -> Vec<(Time, Action)> {
        log.events().iter().map(|e| (e.time, e.action)).collect()
    }

    #[fixture]
    fn single() -> Simulator {
        Simulator::new(vec![taxi(0, 2, 0)]).unwrap()
    }

    #[rstest]
    fn test_single_taxi(mut single: Simulator) {
        let mut log = EventLog::default();
        let report = single
            .run(1000, &mut FixedDurations::default(), &mut log)
            .unwrap();
        assert_eq!(
            timeline(&log),
            vec![
                (0, Action::Start),
                (5, Action::PickUp),
                (25, Action::DropOff),
                (30, Action::PickUp),
                (50, Action::DropOff),
                (55, Action::End),
            ]
        );
        assert_eq!(
            report,
            Report {
                termination: Termination::NoEventsRemaining,
                clock: 55,
                dispatched: 6,
            }
        );
        assert_eq!(single.live_taxis(), 0);
        assert_eq!(single.pending_events(), 0);
    }

    #[rstest]
    fn test_horizon_overshoots_by_one_event(mut single: Simulator) {
        let mut log = EventLog::default();
        let report = single
            .run(40, &mut FixedDurations::default(), &mut log)
            .unwrap();
        assert_eq!(
            timeline(&log),
            vec![
                (0, Action::Start),
                (5, Action::PickUp),
                (25, Action::DropOff),
                (30, Action::PickUp),
                (50, Action::DropOff),
            ]
        );
        assert_eq!(
            report.termination,
            Termination::HorizonReached { pending: 1 }
        );
        assert_eq!(report.clock, 50);
        assert_eq!(single.live_taxis(), 1);
    }

    #[rstest]
    fn test_horizon_hit_exactly(mut single: Simulator) {
        let mut log = EventLog::default();
        let report = single
            .run(30, &mut FixedDurations::default(), &mut log)
            .unwrap();
        assert_eq!(log.events().last().map(|e| e.time), Some(30));
        assert_eq!(
            report.termination,
            Termination::HorizonReached { pending: 1 }
        );
    }

    #[rstest]
    fn test_run_twice(mut single: Simulator) {
        let mut log = EventLog::default();
        single
            .run(1000, &mut FixedDurations::default(), &mut log)
            .unwrap();
        assert!(matches!(
            single.run(1000, &mut FixedDurations::default(), &mut log),
            Err(Error::AlreadyRun)
        ));
    }

    #[rstest]
    fn test_zero_horizon(mut single: Simulator) {
        assert!(matches!(
            single.run(0, &mut FixedDurations::default(), &mut EventLog::default()),
            Err(Error::InvalidHorizon)
        ));
    }

    #[rstest]
    fn test_duration_error_aborts(mut single: Simulator) {
        let mut log = EventLog::default();
        let mut durations = |action: Action| -> Result<Time> {
            match action {
                Action::PickUp => Err(Error::UnknownAction(String::from("PICK_UP"))),
                _ => Ok(1),
            }
        };
        let result = single.run(1000, &mut durations, &mut log);
        assert!(matches!(result, Err(Error::UnknownAction(_))));
        assert_eq!(
            timeline(&log),
            vec![(0, Action::Start), (1, Action::PickUp)]
        );
    }

    #[rstest]
    fn test_zero_delay_aborts(mut single: Simulator) {
        let mut durations = |_: Action| -> Result<Time> { Ok(0) };
        assert!(matches!(
            single.run(1000, &mut durations, &mut EventLog::default()),
            Err(Error::NonPositiveDelay(Action::Start))
        ));
    }

    #[test]
    fn test_clock_overflow() {
        let mut simulator = Simulator::new(vec![taxi(0, 1, Time::MAX - 1)]).unwrap();
        let mut durations = FixedDurations::default();
        assert!(matches!(
            simulator.run(Time::MAX, &mut durations, &mut EventLog::default()),
            Err(Error::ClockOverflow)
        ));
    }

    #[test]
    fn test_duplicate_taxi() {
        assert!(matches!(
            Simulator::new(vec![taxi(0, 1, 0), taxi(1, 1, 0), taxi(0, 2, 0)]),
            Err(Error::DuplicateTaxi(id)) if id == TaxiId::from(0)
        ));
    }

    #[test]
    fn test_ties_resolved_by_taxi_id() {
        let mut simulator =
            Simulator::new(vec![taxi(2, 1, 0), taxi(0, 1, 0), taxi(1, 1, 0)]).unwrap();
        let mut log = EventLog::default();
        simulator
            .run(1000, &mut FixedDurations::default(), &mut log)
            .unwrap();
        assert_eq!(log.events().len(), 12);
        for (_, group) in &log.events().iter().group_by(|e| e.time) {
            let ids: Vec<_> = group.map(|e| usize::from(e.taxi)).collect();
            assert_eq!(ids, vec![0, 1, 2]);
        }
    }

    #[test]
    fn test_live_taxis_reported_to_sink() {
        let mut simulator = Simulator::new(vec![taxi(0, 0, 0), taxi(1, 0, 10)]).unwrap();
        let mut log = EventLog::default();
        simulator
            .run(1000, &mut FixedDurations::default(), &mut log)
            .unwrap();
        assert_eq!(
            log.events(),
            &[
                Event::new(0, TaxiId::from(0), Action::Start),
                Event::new(5, TaxiId::from(0), Action::End),
                Event::new(10, TaxiId::from(1), Action::Start),
                Event::new(15, TaxiId::from(1), Action::End),
            ]
        );
        assert_eq!(log.live_taxis(), &[2, 2, 1, 1]);
    }
}
