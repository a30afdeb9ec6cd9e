use crate::clock::{Clock, SystemTimeSource, TimeSource};
use crate::diff::{Outcome, TypedBuffer};
use crate::error::Result;
use crate::phrase::{Phrase, PhraseGenerator, WordBank};
use rand::rngs::StdRng;
use rand::Rng;
use std::fmt;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// The one active mode of a session. Quitting and Erroring are terminal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, strum_macros::Display)]
pub enum Phase {
    Playing,
    Paused,
    Finished,
    Quitting,
    Erroring,
}

impl Phase {
    pub fn is_terminal(self) -> bool {
        matches!(self, Phase::Quitting | Phase::Erroring)
    }
}

/// Note attached when a fresh phrase cannot be generated
pub const PHRASE_FAILURE_NOTE: &str = "Fatal error while generating phrase: ";

/// Why the session aborted. Set once, on entering `Erroring`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FailureRecord {
    pub cause: String,
    pub note: String,
}

impl FailureRecord {
    pub fn new(cause: impl fmt::Display, note: impl Into<String>) -> Self {
        Self {
            cause: cause.to_string(),
            note: note.into(),
        }
    }
}

impl fmt::Display for FailureRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.note, self.cause)
    }
}

/// Inputs accepted by the session, delivered one at a time
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    Keystroke(char),
    Backspace,
    /// Begin a fresh attempt; handled exactly like `RequestReset`
    RequestStart,
    RequestReset,
    RequestToggle,
    RequestQuit,
    FatalError {
        cause: String,
        note: String,
    },
    TimerTick,
}

impl Event {
    pub fn fatal(cause: impl fmt::Display, note: impl Into<String>) -> Self {
        Event::FatalError {
            cause: cause.to_string(),
            note: note.into(),
        }
    }
}

/// What the host should do after an event has been handled
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Intent {
    Render,
    ClockRestarted,
    ClockToggled,
    ClockStopped,
    Finished { elapsed: Duration },
    Shutdown,
    Log(String),
}

/// Read-only view of the session for rendering
#[derive(Clone, Debug)]
pub struct Snapshot<'a> {
    pub phase: Phase,
    pub phrase: &'a Phrase,
    pub typed: &'a [char],
    pub diff: &'a [Outcome],
    pub elapsed: Duration,
    pub failure: Option<&'a FailureRecord>,
}

impl Snapshot<'_> {
    /// Index of the next character to type
    pub fn cursor(&self) -> usize {
        self.typed.len()
    }
}

/// Session guarded for hosts that deliver events from several threads
pub type SharedSession<R = StdRng, T = SystemTimeSource> = Arc<Mutex<Session<R, T>>>;

/// A typing game: one phrase, one buffer, one clock, one phase.
#[derive(Debug)]
pub struct Session<R: Rng = StdRng, T: TimeSource = SystemTimeSource> {
    phase: Phase,
    bank: WordBank,
    word_count: usize,
    generator: PhraseGenerator<R>,
    phrase: Phrase,
    typed: TypedBuffer,
    clock: Clock<T>,
    failure: Option<FailureRecord>,
}

impl<R: Rng> Session<R, SystemTimeSource> {
    pub fn new(bank: WordBank, word_count: usize, rng: R) -> Result<Self> {
        Self::with_clock(bank, word_count, rng, Clock::new())
    }
}

impl<R: Rng, T: TimeSource> Session<R, T> {
    /// Generate the first phrase and start the clock. An empty bank or a
    /// zero word count fails here, before any event is processed.
    pub fn with_clock(
        bank: WordBank,
        word_count: usize,
        rng: R,
        mut clock: Clock<T>,
    ) -> Result<Self> {
        let mut generator = PhraseGenerator::new(rng);
        let phrase = generator.generate(word_count, &bank)?;

        clock.reset();
        clock.start();
        tracing::debug!(words = word_count, chars = phrase.len(), "session started");

        Ok(Self {
            phase: Phase::Playing,
            bank,
            word_count,
            generator,
            phrase,
            typed: TypedBuffer::new(),
            clock,
            failure: None,
        })
    }

    pub fn into_shared(self) -> SharedSession<R, T> {
        Arc::new(Mutex::new(self))
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn phrase(&self) -> &Phrase {
        &self.phrase
    }

    pub fn typed(&self) -> &TypedBuffer {
        &self.typed
    }

    pub fn clock(&self) -> &Clock<T> {
        &self.clock
    }

    pub fn elapsed(&self) -> Duration {
        self.clock.elapsed()
    }

    pub fn failure(&self) -> Option<&FailureRecord> {
        self.failure.as_ref()
    }

    pub fn word_count(&self) -> usize {
        self.word_count
    }

    pub fn snapshot(&self) -> Snapshot<'_> {
        Snapshot {
            phase: self.phase,
            phrase: &self.phrase,
            typed: self.typed.chars(),
            diff: self.typed.outcomes(),
            elapsed: self.clock.elapsed(),
            failure: self.failure.as_ref(),
        }
    }

    /// Process one event to completion and report what changed
    pub fn handle(&mut self, event: Event) -> Vec<Intent> {
        if self.phase.is_terminal() {
            tracing::trace!(phase = %self.phase, ?event, "dropped event");
            return vec![];
        }

        match event {
            Event::RequestQuit => {
                let mut intents = self.transition(Phase::Quitting);
                intents.push(Intent::Shutdown);
                intents
            }
            Event::FatalError { cause, note } => self.fail(FailureRecord { cause, note }),
            Event::RequestReset | Event::RequestStart => self.restart(),
            Event::RequestToggle => self.toggle(),
            Event::Keystroke(c) => self.keystroke(c),
            Event::Backspace => self.backspace(),
            Event::TimerTick => match self.phase {
                Phase::Playing => vec![Intent::Render],
                _ => vec![],
            },
        }
    }

    fn restart(&mut self) -> Vec<Intent> {
        let phrase = match self.generator.generate(self.word_count, &self.bank) {
            Ok(phrase) => phrase,
            Err(e) => return self.fail(FailureRecord::new(e, PHRASE_FAILURE_NOTE)),
        };

        self.phrase = phrase;
        self.typed.clear();
        self.clock.reset();
        self.clock.start();

        let mut intents = self.transition(Phase::Playing);
        intents.push(Intent::ClockRestarted);
        intents.push(Intent::Render);
        intents
    }

    fn toggle(&mut self) -> Vec<Intent> {
        let next = match self.phase {
            Phase::Playing => Phase::Paused,
            Phase::Paused => Phase::Playing,
            _ => return vec![],
        };
        self.clock.toggle();

        let mut intents = self.transition(next);
        intents.push(Intent::ClockToggled);
        intents.push(Intent::Render);
        intents
    }

    fn keystroke(&mut self, c: char) -> Vec<Intent> {
        if self.phase != Phase::Playing {
            return vec![];
        }

        if let Err(e) = self.typed.push(&self.phrase, c) {
            tracing::debug!(%e, "keystroke rejected");
            return vec![Intent::Log(format!("keystroke {c:?} rejected: {e}"))];
        }

        if !self.typed.is_complete(&self.phrase) {
            return vec![Intent::Render];
        }

        self.clock.stop();
        let elapsed = self.clock.elapsed();
        let mut intents = self.transition(Phase::Finished);
        intents.push(Intent::ClockStopped);
        intents.push(Intent::Finished { elapsed });
        intents.push(Intent::Render);
        intents
    }

    fn backspace(&mut self) -> Vec<Intent> {
        if self.phase != Phase::Playing || self.typed.pop().is_none() {
            return vec![];
        }
        vec![Intent::Render]
    }

    fn fail(&mut self, record: FailureRecord) -> Vec<Intent> {
        tracing::error!(%record, "session failed");
        let message = record.to_string();
        self.failure = Some(record);
        let mut intents = self.transition(Phase::Erroring);
        intents.push(Intent::Log(message));
        intents.push(Intent::Shutdown);
        intents
    }

    fn transition(&mut self, next: Phase) -> Vec<Intent> {
        let prev = std::mem::replace(&mut self.phase, next);
        tracing::debug!(%prev, %next, "phase transition");
        vec![Intent::Log(format!("{prev} -> {next}"))]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::{ClockState, ManualTimeSource};
    use assert_matches::assert_matches;
    use rand::SeedableRng;

    type TestSession = Session<StdRng, ManualTimeSource>;

    fn session(words: &[&str], count: usize) -> (TestSession, ManualTimeSource) {
        let time = ManualTimeSource::new();
        let bank = words.iter().copied().collect();
        let session = Session::with_clock(
            bank,
            count,
            StdRng::seed_from_u64(11),
            Clock::with_time_source(time.clone()),
        )
        .unwrap();
        (session, time)
    }

    fn type_str(session: &mut TestSession, s: &str) {
        for c in s.chars() {
            session.handle(Event::Keystroke(c));
        }
    }

    #[test]
    fn test_new_session_is_playing_with_running_clock() {
        let (session, _) = session(&["cat"], 1);
        assert_eq!(session.phase(), Phase::Playing);
        assert_eq!(session.phrase().as_str(), "cat");
        assert!(session.typed().is_empty());
        assert!(session.clock().is_running());
        assert!(session.failure().is_none());
    }

    #[test]
    fn test_construction_fails_on_empty_bank() {
        let result = Session::new(WordBank::default(), 3, StdRng::seed_from_u64(1));
        assert_matches!(result, Err(crate::error::Error::InvalidInput(_)));
    }

    #[test]
    fn test_construction_fails_on_zero_words() {
        let bank: WordBank = ["cat"].into_iter().collect();
        let result = Session::new(bank, 0, StdRng::seed_from_u64(1));
        assert!(result.is_err());
    }

    #[test]
    fn test_keystroke_renders_until_complete() {
        let (mut session, _) = session(&["cat"], 1);
        assert_eq!(session.handle(Event::Keystroke('c')), vec![Intent::Render]);
        assert_eq!(session.typed().outcomes(), &[Outcome::Hit]);
    }

    #[test]
    fn test_completion_finishes_and_stops_clock() {
        let (mut session, time) = session(&["cat"], 1);
        type_str(&mut session, "ca");
        time.advance(Duration::from_secs(2));

        let intents = session.handle(Event::Keystroke('t'));
        assert_eq!(session.phase(), Phase::Finished);
        assert_eq!(session.clock().state(), ClockState::Stopped);
        assert!(intents.contains(&Intent::ClockStopped));
        assert!(intents.contains(&Intent::Finished {
            elapsed: Duration::from_secs(2)
        }));

        time.advance(Duration::from_secs(5));
        assert_eq!(session.elapsed(), Duration::from_secs(2));
    }

    #[test]
    fn test_full_length_with_miss_is_not_finished() {
        let (mut session, _) = session(&["cat"], 1);
        type_str(&mut session, "cxt");
        assert_eq!(session.phase(), Phase::Playing);
        assert_eq!(
            session.typed().outcomes(),
            &[Outcome::Hit, Outcome::Miss, Outcome::Hit]
        );

        // buffer is full: further keys are rejected
        let intents = session.handle(Event::Keystroke('t'));
        assert!(!intents.contains(&Intent::Render));
        assert_eq!(session.typed().len(), 3);
    }

    #[test]
    fn test_backspace_allows_correction() {
        let (mut session, _) = session(&["cat"], 1);
        type_str(&mut session, "cxt");
        session.handle(Event::Backspace);
        session.handle(Event::Backspace);
        type_str(&mut session, "at");
        assert_eq!(session.phase(), Phase::Finished);
    }

    #[test]
    fn test_backspace_on_empty_is_ignored() {
        let (mut session, _) = session(&["cat"], 1);
        assert!(session.handle(Event::Backspace).is_empty());
        assert!(session.typed().is_empty());
    }

    #[test]
    fn test_toggle_pauses_and_ignores_keys() {
        let (mut session, time) = session(&["cat"], 1);
        time.advance(Duration::from_secs(1));

        let intents = session.handle(Event::RequestToggle);
        assert_eq!(session.phase(), Phase::Paused);
        assert!(intents.contains(&Intent::ClockToggled));
        assert_eq!(session.clock().state(), ClockState::Paused);

        time.advance(Duration::from_secs(10));
        assert!(session.handle(Event::Keystroke('c')).is_empty());
        assert!(session.handle(Event::Backspace).is_empty());
        assert!(session.typed().is_empty());
        assert_eq!(session.elapsed(), Duration::from_secs(1));

        session.handle(Event::RequestToggle);
        assert_eq!(session.phase(), Phase::Playing);
        time.advance(Duration::from_secs(1));
        assert_eq!(session.elapsed(), Duration::from_secs(2));
    }

    #[test]
    fn test_toggle_ignored_when_finished() {
        let (mut session, _) = session(&["cat"], 1);
        type_str(&mut session, "cat");
        assert!(session.handle(Event::RequestToggle).is_empty());
        assert_eq!(session.phase(), Phase::Finished);
        assert_eq!(session.clock().state(), ClockState::Stopped);
    }

    #[test]
    fn test_reset_from_paused_starts_fresh() {
        let (mut session, time) = session(&["cat"], 1);
        type_str(&mut session, "ca");
        time.advance(Duration::from_secs(3));
        session.handle(Event::RequestToggle);

        let intents = session.handle(Event::RequestReset);
        assert_eq!(session.phase(), Phase::Playing);
        assert!(intents.contains(&Intent::ClockRestarted));
        assert!(session.typed().is_empty());
        assert!(session.clock().is_running());
        assert_eq!(session.elapsed(), Duration::ZERO);
    }

    #[test]
    fn test_reset_from_finished() {
        let (mut session, time) = session(&["cat"], 1);
        type_str(&mut session, "cat");
        session.handle(Event::RequestReset);
        assert_eq!(session.phase(), Phase::Playing);
        time.advance(Duration::from_millis(40));
        assert_eq!(session.elapsed(), Duration::from_millis(40));
    }

    #[test]
    fn test_start_behaves_like_reset() {
        let (mut session, _) = session(&["cat"], 1);
        type_str(&mut session, "c");
        session.handle(Event::RequestStart);
        assert_eq!(session.phase(), Phase::Playing);
        assert!(session.typed().is_empty());
    }

    #[test]
    fn test_quit_is_terminal() {
        let (mut session, _) = session(&["cat"], 1);
        let intents = session.handle(Event::RequestQuit);
        assert_eq!(session.phase(), Phase::Quitting);
        assert!(intents.contains(&Intent::Shutdown));

        assert!(session.handle(Event::RequestReset).is_empty());
        assert!(session.handle(Event::fatal("boom", "note: ")).is_empty());
        assert_eq!(session.phase(), Phase::Quitting);
        assert!(session.failure().is_none());
    }

    #[test]
    fn test_fatal_error_records_failure() {
        let (mut session, _) = session(&["cat"], 1);
        session.handle(Event::RequestToggle);
        let intents = session.handle(Event::fatal("no entropy", "Fatal error: "));

        assert_eq!(session.phase(), Phase::Erroring);
        assert!(intents.contains(&Intent::Shutdown));
        let failure = session.failure().unwrap();
        assert_eq!(failure.to_string(), "Fatal error: no entropy");

        assert!(session.handle(Event::Keystroke('c')).is_empty());
        assert!(session.handle(Event::RequestQuit).is_empty());
        assert!(session.handle(Event::fatal("other", "x")).is_empty());
        assert_eq!(session.failure().unwrap().cause, "no entropy");
    }

    #[test]
    fn test_tick_renders_only_while_playing() {
        let (mut session, _) = session(&["cat"], 1);
        assert_eq!(session.handle(Event::TimerTick), vec![Intent::Render]);
        session.handle(Event::RequestToggle);
        assert!(session.handle(Event::TimerTick).is_empty());
    }

    #[test]
    fn test_transitions_emit_log_intent() {
        let (mut session, _) = session(&["cat"], 1);
        let intents = session.handle(Event::RequestToggle);
        assert!(intents.contains(&Intent::Log("Playing -> Paused".to_string())));
    }

    #[test]
    fn test_rejected_keystroke_is_logged() {
        let (mut session, _) = session(&["cat"], 1);
        type_str(&mut session, "cxt");

        let intents = session.handle(Event::Keystroke('y'));
        assert_eq!(intents.len(), 1);
        assert_matches!(
            &intents[0],
            Intent::Log(msg) if msg.contains("'y'") && msg.contains("rejected")
        );
        assert_eq!(session.phase(), Phase::Playing);
    }

    #[test]
    fn test_failure_is_logged_before_shutdown() {
        let (mut session, _) = session(&["cat"], 1);
        let intents = session.handle(Event::fatal("no entropy", "Fatal error: "));
        assert_eq!(
            intents,
            vec![
                Intent::Log("Playing -> Erroring".to_string()),
                Intent::Log("Fatal error: no entropy".to_string()),
                Intent::Shutdown,
            ]
        );
    }

    #[test]
    fn test_snapshot_reflects_state() {
        let (mut session, _) = session(&["cat"], 1);
        type_str(&mut session, "cx");
        let snap = session.snapshot();
        assert_eq!(snap.phase, Phase::Playing);
        assert_eq!(snap.phrase.as_str(), "cat");
        assert_eq!(snap.typed, &['c', 'x']);
        assert_eq!(snap.diff, &[Outcome::Hit, Outcome::Miss]);
        assert_eq!(snap.cursor(), 2);
        assert!(snap.failure.is_none());
    }

    #[test]
    fn test_shared_session_serializes_events() {
        let (session, _) = session(&["cat"], 1);
        let shared = session.into_shared();
        for c in "cat".chars() {
            shared.lock().unwrap().handle(Event::Keystroke(c));
        }
        assert_eq!(shared.lock().unwrap().phase(), Phase::Finished);
    }
}
