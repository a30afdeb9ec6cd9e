use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::time::{Duration, Instant};

use crossterm::event::{self, Event as CtEvent, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::session::Event;

/// What the terminal loop sees on each step
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TermEvent {
    Key(KeyEvent),
    Resize,
    /// No input arrived within the tick interval
    Tick,
    /// The input side has gone away; nothing more will arrive
    Closed,
}

impl TermEvent {
    /// The session event this terminal event stands for, if any.
    ///
    /// ctrl+s is shared by start and stop, enter resets, ctrl+c and esc quit.
    pub fn session_event(&self) -> Option<Event> {
        let key = match self {
            TermEvent::Tick => return Some(Event::TimerTick),
            TermEvent::Resize | TermEvent::Closed => return None,
            TermEvent::Key(key) => key,
        };

        if key.kind == KeyEventKind::Release {
            return None;
        }

        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Char('c') if ctrl => Some(Event::RequestQuit),
            KeyCode::Char('s') if ctrl => Some(Event::RequestToggle),
            KeyCode::Char(_) if ctrl => None,
            KeyCode::Char(c) => Some(Event::Keystroke(c)),
            KeyCode::Esc => Some(Event::RequestQuit),
            KeyCode::Enter => Some(Event::RequestReset),
            KeyCode::Backspace => Some(Event::Backspace),
            _ => None,
        }
    }
}

/// Anything that can hand over terminal events with a deadline
pub trait InputSource: Send + 'static {
    fn recv_timeout(&self, timeout: Duration) -> Result<TermEvent, RecvTimeoutError>;
}

/// Events delivered over a channel. The terminal reader thread feeds one;
/// tests feed one by hand.
pub struct ChannelSource {
    rx: Receiver<TermEvent>,
}

impl ChannelSource {
    pub fn new(rx: Receiver<TermEvent>) -> Self {
        Self { rx }
    }

    /// Spawn a thread reading crossterm events into a fresh channel
    pub fn terminal() -> Self {
        let (tx, rx) = mpsc::channel();

        std::thread::spawn(move || loop {
            let evt = match event::read() {
                Ok(CtEvent::Key(key)) => TermEvent::Key(key),
                Ok(CtEvent::Resize(_, _)) => TermEvent::Resize,
                Ok(_) => continue,
                Err(e) => {
                    tracing::error!(%e, "terminal event reader stopped");
                    break;
                }
            };
            if tx.send(evt).is_err() {
                break;
            }
        });

        Self::new(rx)
    }
}

impl InputSource for ChannelSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<TermEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

/// Hands the loop one event at a time. Every terminal event passes through
/// here, so session mutations stay ordered.
pub struct Runner<S: InputSource> {
    source: S,
    tick: Duration,
}

impl<S: InputSource> Runner<S> {
    pub fn new(source: S, tick: Duration) -> Self {
        Self { source, tick }
    }

    /// Blocks up to one tick and returns the next event, `Tick` on timeout
    pub fn step(&self) -> TermEvent {
        match self.source.recv_timeout(self.tick) {
            Ok(ev) => ev,
            Err(RecvTimeoutError::Timeout) => TermEvent::Tick,
            Err(RecvTimeoutError::Disconnected) => TermEvent::Closed,
        }
    }

    /// Wait for any key press, giving up after `limit` or once input closes.
    /// Returns whether a key arrived.
    pub fn wait_for_key(&self, limit: Duration) -> bool {
        let deadline = Instant::now() + limit;
        loop {
            let left = deadline.saturating_duration_since(Instant::now());
            if left.is_zero() {
                return false;
            }
            match self.source.recv_timeout(left) {
                Ok(TermEvent::Key(_)) => return true,
                Ok(_) => continue,
                Err(_) => return false,
            }
        }
    }
}
