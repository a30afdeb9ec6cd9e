use crate::error::{Error, Result};
use crate::phrase::Phrase;

#[derive(Clone, Debug, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum Outcome {
    Hit,
    Miss,
}

impl Outcome {
    fn of(typed: char, expected: char) -> Self {
        if typed == expected {
            Outcome::Hit
        } else {
            Outcome::Miss
        }
    }
}

/// Classify every typed position against the phrase.
///
/// Positions past the end of `typed` are unwritten and not part of the
/// result.
pub fn classify(phrase: &Phrase, typed: &[char]) -> Result<Vec<Outcome>> {
    check_len(phrase, typed.len())?;
    Ok(typed
        .iter()
        .zip(phrase.chars())
        .map(|(&t, &p)| Outcome::of(t, p))
        .collect())
}

/// True only when the whole phrase has been typed without a single miss
pub fn is_complete(phrase: &Phrase, typed: &[char]) -> bool {
    typed == phrase.chars()
}

fn check_len(phrase: &Phrase, typed: usize) -> Result<()> {
    if typed > phrase.len() {
        return Err(Error::OutOfRange {
            typed,
            phrase: phrase.len(),
        });
    }
    Ok(())
}

/// Characters entered for the current attempt, with their outcomes cached
/// as they are typed so a redraw never rescans the buffer.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TypedBuffer {
    chars: Vec<char>,
    outcomes: Vec<Outcome>,
}

impl TypedBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn chars(&self) -> &[char] {
        &self.chars
    }

    pub fn outcomes(&self) -> &[Outcome] {
        &self.outcomes
    }

    pub fn len(&self) -> usize {
        self.chars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }

    pub fn misses(&self) -> usize {
        self.outcomes.iter().filter(|o| **o == Outcome::Miss).count()
    }

    /// Append `c` and classify only the new position. Fails without
    /// touching the buffer when the phrase is already fully typed.
    pub fn push(&mut self, phrase: &Phrase, c: char) -> Result<Outcome> {
        let idx = self.chars.len();
        check_len(phrase, idx + 1)?;
        let expected = phrase.char_at(idx).ok_or(Error::OutOfRange {
            typed: idx + 1,
            phrase: phrase.len(),
        })?;

        let outcome = Outcome::of(c, expected);
        self.chars.push(c);
        self.outcomes.push(outcome);
        Ok(outcome)
    }

    pub fn pop(&mut self) -> Option<char> {
        self.outcomes.pop();
        self.chars.pop()
    }

    pub fn clear(&mut self) {
        self.chars.clear();
        self.outcomes.clear();
    }

    pub fn is_complete(&self, phrase: &Phrase) -> bool {
        is_complete(phrase, &self.chars)
    }
}
