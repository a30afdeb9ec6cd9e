use crate::error::{Error, Result};
use itertools::Itertools;
use rand::rngs::{OsRng, StdRng};
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use std::fmt;

/// Joins the selected words of a phrase
pub const SEPARATOR: char = ' ';

/// Candidate words a phrase is drawn from. Duplicates are allowed and
/// weight the draw accordingly.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WordBank {
    words: Vec<String>,
}

impl WordBank {
    pub fn new(words: Vec<String>) -> Self {
        Self { words }
    }

    pub fn words(&self) -> &[String] {
        &self.words
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for WordBank {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self::new(iter.into_iter().map(Into::into).collect())
    }
}

/// The reference text for one attempt.
///
/// Characters are kept as single code points so positions line up with the
/// typed buffer index for index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Phrase {
    text: String,
    chars: Vec<char>,
}

impl Phrase {
    pub fn new(text: impl Into<String>) -> Result<Self> {
        let text = text.into();
        if text.is_empty() {
            return Err(Error::InvalidInput("phrase must not be empty".to_string()));
        }
        let chars = text.chars().collect();
        Ok(Self { text, chars })
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn chars(&self) -> &[char] {
        &self.chars
    }

    /// Number of characters (code points), not bytes
    pub fn len(&self) -> usize {
        self.chars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }

    pub fn char_at(&self, idx: usize) -> Option<char> {
        self.chars.get(idx).copied()
    }
}

impl fmt::Display for Phrase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Builds phrases from a word bank using an injected random source
#[derive(Debug)]
pub struct PhraseGenerator<R: Rng> {
    rng: R,
}

impl<R: Rng> PhraseGenerator<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }

    /// Draw `word_count` words uniformly with replacement and join them with
    /// a single space.
    pub fn generate(&mut self, word_count: usize, bank: &WordBank) -> Result<Phrase> {
        if bank.is_empty() {
            return Err(Error::InvalidInput("word bank is empty".to_string()));
        }
        if word_count == 0 {
            return Err(Error::InvalidInput(
                "word count must be positive".to_string(),
            ));
        }

        let text = (0..word_count)
            .filter_map(|_| bank.words().choose(&mut self.rng))
            .join(&SEPARATOR.to_string());

        tracing::trace!(word_count, phrase = %text, "generated phrase");
        Phrase::new(text)
    }
}

/// Random source for phrase generation. A fixed seed gives reproducible
/// phrases; otherwise the generator is seeded from the operating system.
pub fn seeded_rng(seed: Option<u64>) -> Result<StdRng> {
    match seed {
        Some(seed) => Ok(StdRng::seed_from_u64(seed)),
        None => Ok(StdRng::from_rng(OsRng)?),
    }
}
