//! Named text resources.
//!
//! A resource name is either one of the built-in resources compiled into the
//! crate or a filesystem path. Files are read once, fully, and closed.

use crate::error::{Result, SamplerError};
use std::borrow::Cow;
use std::path::Path;

/// Built-in ranked word-frequency table (`term,weight` lines).
pub const WORD_FREQUENCY_SEED: &str = "word-frequency-seed";

/// Built-in auxiliary reservoir (one word per line).
pub const OTHER_WORDS: &str = "other-words";

const BUILTIN: &[(&str, &str)] = &[
    (
        WORD_FREQUENCY_SEED,
        include_str!("../resources/word-frequency-seed.csv"),
    ),
    (OTHER_WORDS, include_str!("../resources/other-words.txt")),
];

/// Text of a built-in resource, if `name` is one.
pub fn builtin(name: &str) -> Option<&'static str> {
    BUILTIN
        .iter()
        .find(|(builtin, _)| *builtin == name)
        .map(|(_, text)| *text)
}

/// Resolve `name` to its full text.
pub fn load(name: &str) -> Result<Cow<'static, str>> {
    if let Some(text) = builtin(name) {
        return Ok(Cow::Borrowed(text));
    }
    let text = std::fs::read_to_string(Path::new(name)).map_err(|source| SamplerError::Io {
        resource: name.to_string(),
        source,
    })?;
    tracing::debug!(resource = name, bytes = text.len(), "loaded resource file");
    Ok(Cow::Owned(text))
}

/// Non-blank, non-comment lines with their 1-based line numbers, trimmed.
pub(crate) fn content_lines(text: &str) -> impl Iterator<Item = (usize, &str)> {
    text.lines()
        .enumerate()
        .map(|(i, line)| (i + 1, line.trim()))
        .filter(|(_, line)| !line.is_empty() && !line.starts_with('#'))
}
