use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::time::Duration;

use crossterm::event::{self, Event as CtEvent, KeyEvent};

/// Unified event type consumed by the session loop.
#[derive(Clone, Debug)]
pub enum Event {
    Key(KeyEvent),
    Resize,
    /// No input arrived within the poll interval; the status line still
    /// refreshes on these.
    Tick,
}

/// Source of terminal events (keyboard, resize, etc.)
pub trait EventSource: Send + 'static {
    /// Block for up to `timeout` waiting for an event.
    /// Returns Ok(event) if an event arrives before the timeout, or
    /// Err(Timeout) if it expires.
    fn recv_timeout(&self, timeout: Duration) -> Result<Event, RecvTimeoutError>;
}

/// Production event source backed by a crossterm reader thread.
pub struct CrosstermEventSource {
    rx: Receiver<Event>,
}

impl CrosstermEventSource {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();

        std::thread::spawn(move || loop {
            match event::read() {
                Ok(CtEvent::Key(key)) => {
                    if tx.send(Event::Key(key)).is_err() {
                        break;
                    }
                }
                Ok(CtEvent::Resize(_, _)) => {
                    if tx.send(Event::Resize).is_err() {
                        break;
                    }
                }
                Ok(_) => {}
                Err(_) => break,
            }
        });

        Self { rx }
    }
}

impl Default for CrosstermEventSource {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSource for CrosstermEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<Event, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

/// Test event source fed by an in-process channel.
pub struct TestEventSource {
    rx: Receiver<Event>,
}

impl TestEventSource {
    pub fn new(rx: Receiver<Event>) -> Self {
        Self { rx }
    }
}

impl EventSource for TestEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<Event, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

/// Advances the application one event at a time, substituting a `Tick`
/// whenever the poll interval passes without input.
pub struct Runner<E: EventSource> {
    event_source: E,
    tick_interval: Duration,
}

impl<E: EventSource> Runner<E> {
    pub fn new(event_source: E, tick_interval: Duration) -> Self {
        Self {
            event_source,
            tick_interval,
        }
    }

    /// Blocks up to the tick interval and returns the next event, or Tick
    /// on timeout.
    pub fn step(&self) -> Event {
        match self.event_source.recv_timeout(self.tick_interval) {
            Ok(ev) => ev,
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => Event::Tick,
        }
    }
}
