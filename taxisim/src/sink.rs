use std::io::{self, Write};

use crate::Event;

/// Observes dispatched events. Has no influence on the simulation.
pub trait EventSink {
    /// Called for each dispatched event, together with the number of taxis that are still
    /// in service at that moment.
    ///
    /// # Errors
    ///
    /// Returns any I/O error encountered when writing the event out.
    fn dispatch(&mut self, event: &Event, live_taxis: usize) -> io::Result<()>;

    /// Called once when the simulation is over.
    ///
    /// # Errors
    ///
    /// Returns any I/O error encountered when flushing.
    fn finish(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<S: EventSink + ?Sized> EventSink for &mut S {
    fn dispatch(&mut self, event: &Event, live_taxis: usize) -> io::Result<()> {
        (**self).dispatch(event, live_taxis)
    }
    fn finish(&mut self) -> io::Result<()> {
        (**self).finish()
    }
}

impl<S: EventSink + ?Sized> EventSink for Box<S> {
    fn dispatch(&mut self, event: &Event, live_taxis: usize) -> io::Result<()> {
        (**self).dispatch(event, live_taxis)
    }
    fn finish(&mut self) -> io::Result<()> {
        (**self).finish()
    }
}

impl<S: EventSink> EventSink for Vec<S> {
    fn dispatch(&mut self, event: &Event, live_taxis: usize) -> io::Result<()> {
        self.iter_mut()
            .try_for_each(|sink| sink.dispatch(event, live_taxis))
    }
    fn finish(&mut self) -> io::Result<()> {
        self.iter_mut().try_for_each(|sink| sink.finish())
    }
}

impl<A: EventSink, B: EventSink> EventSink for (A, B) {
    fn dispatch(&mut self, event: &Event, live_taxis: usize) -> io::Result<()> {
        self.0.dispatch(event, live_taxis)?;
        self.1.dispatch(event, live_taxis)
    }
    fn finish(&mut self) -> io::Result<()> {
        self.0.finish()?;
        self.1.finish()
    }
}

/// Writes one line per event, indented by taxi ID, so that each taxi gets its own column.
pub struct TextSink<W: Write> {
    writer: W,
}

impl<W: Write> TextSink<W> {
    /// Constructs a sink writing to `writer`.
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Consumes the sink and returns the underlying writer.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> EventSink for TextSink<W> {
    fn dispatch(&mut self, event: &Event, live_taxis: usize) -> io::Result<()> {
        let indent = "    ".repeat(usize::from(event.taxi));
        writeln!(
            self.writer,
            "taxi {}: {}{} [live={}]",
            event.taxi, indent, event, live_taxis
        )
    }
    fn finish(&mut self) -> io::Result<()> {
        self.writer.flush()
    }
}

/// Logs events at the info level.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl EventSink for LogSink {
    fn dispatch(&mut self, event: &Event, live_taxis: usize) -> io::Result<()> {
        log::info!("[live={}] {}", live_taxis, event);
        Ok(())
    }
}

/// Writes events as CSV records with a `time,taxi,action` header.
pub struct CsvSink<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> CsvSink<W> {
    /// Constructs a sink writing CSV to `writer`.
    pub fn new(writer: W) -> Self {
        Self {
            writer: csv::Writer::from_writer(writer),
        }
    }
}

impl<W: Write> EventSink for CsvSink<W> {
    fn dispatch(&mut self, event: &Event, _live_taxis: usize) -> io::Result<()> {
        self.writer.serialize(event)?;
        Ok(())
    }
    fn finish(&mut self) -> io::Result<()> {
        self.writer.flush()
    }
}

/// Keeps all dispatched events in memory.
#[derive(Debug, Default, Clone)]
pub struct EventLog {
    events: Vec<Event>,
    live_taxis: Vec<usize>,
}

impl EventLog {
    /// All events dispatched so far, in order.
    #[must_use]
    pub fn events(&self) -> &[Event] {
        &self.events
    }

    /// Numbers of live taxis at each dispatched event.
    #[must_use]
    pub fn live_taxis(&self) -> &[usize] {
        &self.live_taxis
    }

    /// Takes the dispatched events out of the log.
    #[must_use]
    pub fn into_events(self) -> Vec<Event> {
        self.events
    }
}

impl EventSink for EventLog {
    fn dispatch(&mut self, event: &Event, live_taxis: usize) -> io::Result<()> {
        self.events.push(*event);
        self.live_taxis.push(live_taxis);
        Ok(())
    }
}
