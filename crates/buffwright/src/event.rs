//! Per-engine notification surface.
//!
//! Every stateful engine owns one [`EventLog`]. Emitted events are:
//! - passed, in subscription order, to every registered subscriber callback
//! - appended to an internal log that can be drained with
//!   [`EventLog::take_events`], typically at the end of each tick
//!
//! There is no global event state; two engine instances never see each
//! other's events.

use std::fmt;

/// Handle returned by [`EventLog::subscribe`].
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriberId(u64);

type Subscriber<E> = Box<dyn FnMut(&E)>;

/// Recorded events plus the observers interested in them.
///
/// # Example
///
/// ```
/// use std::cell::RefCell;
/// use std::rc::Rc;
/// use buffwright::event::EventLog;
///
/// let seen = Rc::new(RefCell::new(Vec::new()));
/// let sink = Rc::clone(&seen);
///
/// let mut log = EventLog::new();
/// log.subscribe(move |e: &u32| sink.borrow_mut().push(*e));
/// log.emit(7);
///
/// assert_eq!(*seen.borrow(), vec![7]);
/// assert_eq!(log.take_events(), vec![7]);
/// assert!(log.is_empty());
/// ```
pub struct EventLog<E> {
    events: Vec<E>,
    subscribers: Vec<(SubscriberId, Subscriber<E>)>,
    next_subscriber: u64,
}

impl<E> EventLog<E> {
    /// Creates an empty log with no subscribers.
    #[must_use]
    pub fn new() -> Self {
        Self {
            events: Vec::new(),
            subscribers: Vec::new(),
            next_subscriber: 0,
        }
    }

    /// Registers a callback invoked for every subsequent event.
    pub fn subscribe<F>(&mut self, callback: F) -> SubscriberId
    where
        F: FnMut(&E) + 'static,
    {
        let id = SubscriberId(self.next_subscriber);
        self.next_subscriber += 1;
        self.subscribers.push((id, Box::new(callback)));
        id
    }

    /// Removes a subscriber. Returns false if it was not registered.
    pub fn unsubscribe(&mut self, id: SubscriberId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(sid, _)| *sid != id);
        self.subscribers.len() != before
    }

    /// Returns the number of registered subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    /// Notifies subscribers and records the event.
    pub fn emit(&mut self, event: E) {
        for (_, callback) in &mut self.subscribers {
            callback(&event);
        }
        self.events.push(event);
    }

    /// Drains and returns all recorded events in emission order.
    pub fn take_events(&mut self) -> Vec<E> {
        std::mem::take(&mut self.events)
    }

    /// Returns the recorded events without draining them.
    #[must_use]
    pub fn events(&self) -> &[E] {
        &self.events
    }

    /// Returns the number of events currently in the log.
    #[must_use]
    pub fn event_count(&self) -> usize {
        self.events.len()
    }

    /// Returns true if the log is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Clears recorded events. Subscribers stay registered.
    pub fn clear(&mut self) {
        self.events.clear();
    }

    /// Clears recorded events and drops every subscriber.
    pub fn reset(&mut self) {
        self.events.clear();
        self.subscribers.clear();
    }
}

impl<E> Default for EventLog<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: fmt::Debug> fmt::Debug for EventLog<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventLog")
            .field("events", &self.events)
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn new_log_is_empty() {
        let log: EventLog<u32> = EventLog::new();
        assert!(log.is_empty());
        assert_eq!(log.event_count(), 0);
        assert_eq!(log.subscriber_count(), 0);
    }

    #[test]
    fn take_events_drains_in_order() {
        let mut log = EventLog::new();
        log.emit("a");
        log.emit("b");

        assert_eq!(log.events(), &["a", "b"]);
        assert_eq!(log.take_events(), vec!["a", "b"]);
        assert!(log.take_events().is_empty());
    }

    #[test]
    fn subscribers_run_in_subscription_order() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut log = EventLog::new();

        let first = Rc::clone(&seen);
        log.subscribe(move |e: &u32| first.borrow_mut().push(("first", *e)));
        let second = Rc::clone(&seen);
        log.subscribe(move |e: &u32| second.borrow_mut().push(("second", *e)));

        log.emit(1);
        assert_eq!(*seen.borrow(), vec![("first", 1), ("second", 1)]);
    }

    #[test]
    fn unsubscribe_stops_notifications() {
        let count = Rc::new(RefCell::new(0));
        let mut log = EventLog::new();
        let sink = Rc::clone(&count);
        let id = log.subscribe(move |_: &u32| *sink.borrow_mut() += 1);

        log.emit(1);
        assert!(log.unsubscribe(id));
        assert!(!log.unsubscribe(id));
        log.emit(2);

        assert_eq!(*count.borrow(), 1);
        assert_eq!(log.event_count(), 2);
    }

    #[test]
    fn independent_logs_do_not_share_events() {
        let mut a = EventLog::new();
        let b: EventLog<u32> = EventLog::new();
        a.emit(1);
        assert!(b.is_empty());
    }

    #[test]
    fn clear_keeps_subscribers_reset_drops_them() {
        let mut log: EventLog<u32> = EventLog::new();
        log.subscribe(|_| {});
        log.emit(1);

        log.clear();
        assert!(log.is_empty());
        assert_eq!(log.subscriber_count(), 1);

        log.reset();
        assert_eq!(log.subscriber_count(), 0);
    }
}
