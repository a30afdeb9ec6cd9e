use std::cell::Cell;
use std::rc::Rc;
use std::time::{Duration, Instant};

/// Source of monotonic timestamps for the clock
pub trait TimeSource {
    fn now(&self) -> Instant;
}

/// Production time source backed by `Instant::now`
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemTimeSource;

impl TimeSource for SystemTimeSource {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Hand-advanced time source for tests and replays.
///
/// Clones share the same underlying instant, so a test can keep one handle
/// and give another to the clock.
#[derive(Clone, Debug)]
pub struct ManualTimeSource {
    now: Rc<Cell<Instant>>,
}

impl ManualTimeSource {
    pub fn new() -> Self {
        Self {
            now: Rc::new(Cell::new(Instant::now())),
        }
    }

    pub fn advance(&self, by: Duration) {
        self.now.set(self.now.get() + by);
    }
}

impl Default for ManualTimeSource {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeSource for ManualTimeSource {
    fn now(&self) -> Instant {
        self.now.get()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, strum_macros::Display)]
pub enum ClockState {
    Stopped,
    Running,
    Paused,
}

/// Stopwatch for one attempt. Paused intervals do not count.
#[derive(Debug)]
pub struct Clock<T: TimeSource = SystemTimeSource> {
    time: T,
    state: ClockState,
    accumulated: Duration,
    running_since: Option<Instant>,
}

impl Clock<SystemTimeSource> {
    pub fn new() -> Self {
        Self::with_time_source(SystemTimeSource)
    }
}

impl Default for Clock<SystemTimeSource> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: TimeSource> Clock<T> {
    pub fn with_time_source(time: T) -> Self {
        Self {
            time,
            state: ClockState::Stopped,
            accumulated: Duration::ZERO,
            running_since: None,
        }
    }

    pub fn state(&self) -> ClockState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == ClockState::Running
    }

    /// Zero the elapsed time without touching the run/pause status
    pub fn reset(&mut self) {
        self.accumulated = Duration::ZERO;
        if self.running_since.is_some() {
            self.running_since = Some(self.time.now());
        }
    }

    pub fn start(&mut self) {
        if self.state != ClockState::Running {
            self.running_since = Some(self.time.now());
            self.state = ClockState::Running;
        }
    }

    /// Pause when running, otherwise (re)start
    pub fn toggle(&mut self) {
        match self.state {
            ClockState::Running => {
                self.freeze();
                self.state = ClockState::Paused;
            }
            ClockState::Paused | ClockState::Stopped => self.start(),
        }
    }

    pub fn stop(&mut self) {
        self.freeze();
        self.state = ClockState::Stopped;
    }

    pub fn elapsed(&self) -> Duration {
        match self.running_since {
            Some(since) => self.accumulated + self.time.now().saturating_duration_since(since),
            None => self.accumulated,
        }
    }

    fn freeze(&mut self) {
        if let Some(since) = self.running_since.take() {
            self.accumulated += self.time.now().saturating_duration_since(since);
        }
    }
}
