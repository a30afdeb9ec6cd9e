use crate::error::{Error, Result};
use crate::phrase::WordBank;
use include_dir::{include_dir, Dir};
use serde::Deserialize;
use std::fs;
use std::path::Path;

static LANG_DIR: Dir = include_dir!("$CARGO_MANIFEST_DIR/src/lang");

/// Name of the word list compiled into the binary
pub const DEFAULT_LANGUAGE: &str = "english";

#[derive(Deserialize, Clone, Debug)]
pub struct Language {
    pub name: String,
    pub size: u32,
    pub words: Vec<String>,
}

/// Load a bundled word list by name, e.g. `english`
pub fn embedded(name: &str) -> Result<WordBank> {
    let file = LANG_DIR
        .get_file(format!("{name}.json"))
        .ok_or_else(|| Error::InvalidInput(format!("unknown word list: {name}")))?;

    let contents = file
        .contents_utf8()
        .ok_or_else(|| Error::InvalidInput(format!("word list {name} is not utf-8")))?;

    let lang: Language = serde_json::from_str(contents)?;
    Ok(WordBank::new(lang.words))
}

/// Load a plain text word list, one word per line
pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<WordBank> {
    let contents = fs::read_to_string(path.as_ref())?;
    let bank = parse_lines(&contents);
    tracing::info!(path = %path.as_ref().display(), words = bank.len(), "loaded word bank");
    Ok(bank)
}

/// Blank lines are skipped and surrounding whitespace trimmed
pub fn parse_lines(contents: &str) -> WordBank {
    contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect()
}
