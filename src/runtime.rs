use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::time::Duration;

use crossterm::event::{self, Event as CtEvent, KeyEvent, MouseEvent, MouseEventKind};

/// Unified event type consumed by the app runner
#[derive(Clone, Debug)]
pub enum FlickEvent {
    Key(KeyEvent),
    Mouse(MouseEvent),
    Resize,
    Tick,
    /// The event source hung up; no further input can arrive
    Closed,
}

/// Source of terminal events (keyboard, mouse, resize)
pub trait FlickEventSource: Send + 'static {
    /// Block for up to `timeout` waiting for an event.
    /// Returns Ok(event) if an event arrives before the timeout, or Err(Timeout) if it expires.
    fn recv_timeout(&self, timeout: Duration) -> Result<FlickEvent, RecvTimeoutError>;
}

/// Production event source using crossterm
pub struct CrosstermEventSource {
    rx: Receiver<FlickEvent>,
}

impl CrosstermEventSource {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();

        std::thread::spawn(move || loop {
            let evt = match event::read() {
                Ok(CtEvent::Key(key)) => Some(FlickEvent::Key(key)),
                Ok(CtEvent::Mouse(mouse)) => forward_mouse(mouse).then_some(FlickEvent::Mouse(mouse)),
                Ok(CtEvent::Resize(_, _)) => Some(FlickEvent::Resize),
                Ok(_) => None,
                Err(err) => {
                    log::error!("terminal event reader stopped: {}", err);
                    break;
                }
            };

            if let Some(evt) = evt {
                if tx.send(evt).is_err() {
                    break;
                }
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

impl FlickEventSource for CrosstermEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<FlickEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

/// Scroll and release events carry nothing the game reacts to
fn forward_mouse(mouse: MouseEvent) -> bool {
    matches!(
        mouse.kind,
        MouseEventKind::Down(_) | MouseEventKind::Moved | MouseEventKind::Drag(_)
    )
}

/// Configurable ticker interface
pub trait Ticker: Send + Sync + 'static {
    fn interval(&self) -> Duration;
}

/// Fixed interval ticker
#[derive(Clone, Copy, Debug)]
pub struct FixedTicker {
    interval: Duration,
}

impl FixedTicker {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }
}

impl Ticker for FixedTicker {
    fn interval(&self) -> Duration {
        self.interval
    }
}

/// Test event source for unit tests
pub struct TestEventSource {
    rx: Receiver<FlickEvent>,
}

impl TestEventSource {
    pub fn new(rx: Receiver<FlickEvent>) -> Self {
        Self { rx }
    }
}

impl FlickEventSource for TestEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<FlickEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

/// Runner that advances the application one event/tick at a time
pub struct Runner<E: FlickEventSource, T: Ticker> {
    event_source: E,
    ticker: T,
}

impl<E: FlickEventSource, T: Ticker> Runner<E, T> {
    pub fn new(event_source: E, ticker: T) -> Self {
        Self {
            event_source,
            ticker,
        }
    }

    /// Blocks up to tick interval and returns the next event, Tick on timeout,
    /// or Closed once the source is gone
    pub fn step(&self) -> FlickEvent {
        match self.event_source.recv_timeout(self.ticker.interval()) {
            Ok(ev) => ev,
            Err(RecvTimeoutError::Timeout) => FlickEvent::Tick,
            Err(RecvTimeoutError::Disconnected) => FlickEvent::Closed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::{KeyModifiers, MouseButton};
    use std::sync::mpsc;

    fn mouse(kind: MouseEventKind) -> MouseEvent {
        MouseEvent {
            kind,
            column: 4,
            row: 7,
            modifiers: KeyModifiers::NONE,
        }
    }

    #[test]
    fn step_returns_tick_on_timeout() {
        let (_tx, rx) = mpsc::channel();
        let es = TestEventSource::new(rx);
        let ticker = FixedTicker::new(Duration::from_millis(1));
        let runner = Runner::new(es, ticker);

        // With no events available, step should yield Tick
        let ev = runner.step();
        match ev {
            FlickEvent::Tick => {}
            _ => panic!("expected Tick on timeout"),
        }
    }

    #[test]
    fn step_passes_through_events() {
        let (tx, rx) = mpsc::channel();
        tx.send(FlickEvent::Mouse(mouse(MouseEventKind::Down(MouseButton::Left))))
            .unwrap();
        let es = TestEventSource::new(rx);
        let ticker = FixedTicker::new(Duration::from_millis(10));
        let runner = Runner::new(es, ticker);

        match runner.step() {
            FlickEvent::Mouse(m) => {
                assert_eq!((m.column, m.row), (4, 7));
            }
            _ => panic!("expected Mouse event"),
        }
    }

    #[test]
    fn step_reports_closed_once_sender_is_gone() {
        let (tx, rx) = mpsc::channel::<FlickEvent>();
        tx.send(FlickEvent::Resize).unwrap();
        drop(tx);
        let runner = Runner::new(
            TestEventSource::new(rx),
            FixedTicker::new(Duration::from_millis(16)),
        );

        // queued events drain first, then every step says Closed instead of Tick
        assert!(matches!(runner.step(), FlickEvent::Resize));
        for _ in 0..3 {
            assert!(matches!(runner.step(), FlickEvent::Closed));
        }
    }

    #[test]
    fn only_actionable_mouse_events_are_forwarded() {
        assert!(forward_mouse(mouse(MouseEventKind::Down(MouseButton::Left))));
        assert!(forward_mouse(mouse(MouseEventKind::Moved)));
        assert!(forward_mouse(mouse(MouseEventKind::Drag(MouseButton::Left))));
        assert!(!forward_mouse(mouse(MouseEventKind::Up(MouseButton::Left))));
        assert!(!forward_mouse(mouse(MouseEventKind::ScrollDown)));
    }
}
