use std::cmp::Reverse;
use std::collections::BinaryHeap;

use crate::Event;

/// Min-priority queue of pending events, ordered as defined by [`Event`]'s `Ord`.
///
/// # Examples
///
/// ```
/// # use taxisim::{Action, Event, EventQueue, TaxiId};
/// let mut queue = EventQueue::default();
/// queue.insert(Event::new(5, TaxiId::from(1), Action::Start));
/// queue.insert(Event::new(5, TaxiId::from(0), Action::PickUp));
/// queue.insert(Event::new(0, TaxiId::from(2), Action::Start));
/// assert_eq!(queue.extract_min().unwrap().taxi, TaxiId::from(2));
/// assert_eq!(queue.extract_min().unwrap().taxi, TaxiId::from(0));
/// assert_eq!(queue.extract_min().unwrap().taxi, TaxiId::from(1));
/// assert!(queue.is_empty());
/// ```
#[derive(Debug, Default)]
pub struct EventQueue {
    inner: BinaryHeap<Reverse<Event>>,
}

impl EventQueue {
    /// Adds an event to the queue.
    pub fn insert(&mut self, event: Event) {
        self.inner.push(Reverse(event));
    }

    /// Removes and returns the earliest event, or `None` if the queue is empty.
    pub fn extract_min(&mut self) -> Option<Event> {
        self.inner.pop().map(|Reverse(event)| event)
    }

    /// Checks if there are no pending events.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Number of pending events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.len()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{Action, TaxiId};

    #[test]
    fn test_extract_in_order() {
        let mut queue = EventQueue::default();
        assert!(queue.is_empty());
        assert_eq!(queue.extract_min(), None);

        let events = vec![
            Event::new(30, TaxiId::from(0), Action::PickUp),
            Event::new(10, TaxiId::from(2), Action::DropOff),
            Event::new(10, TaxiId::from(1), Action::End),
            Event::new(10, TaxiId::from(1), Action::Start),
            Event::new(0, TaxiId::from(3), Action::Start),
        ];
        for &event in &events {
            queue.insert(event);
        }
        assert_eq!(queue.len(), 5);

        let mut sorted = events;
        sorted.sort();
        let extracted: Vec<_> = std::iter::from_fn(|| queue.extract_min()).collect();
        assert_eq!(extracted, sorted);
        assert_eq!(extracted[0].time, 0);
        assert_eq!(extracted[1].action, Action::Start);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_duplicates_are_kept() {
        let mut queue = EventQueue::default();
        let event = Event::new(1, TaxiId::from(0), Action::Start);
        queue.insert(event);
        queue.insert(event);
        assert_eq!(queue.len(), 2);
        assert_eq!(queue.extract_min(), Some(event));
        assert_eq!(queue.extract_min(), Some(event));
        assert_eq!(queue.extract_min(), None);
    }
}
