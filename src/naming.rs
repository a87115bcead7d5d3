//! Book and chapter identifiers taken from timing file names.
//!
//! Timing files are named `{prefix}-{book_number}-{book_name}-{chapter}` (for example
//! `COV-01-mat-03.txt`). The book number there follows the timing scheme, which counts
//! New Testament books from `01`; the audio tree numbers the same books from `41`.
//! [`BookNumbering`] owns that difference so nothing else has to.

use std::path::Path;

use serde::Serialize;
use tracing::warn;

use crate::timing::TimingRecord;
use crate::{Error, Result};

/// Distance between timing-file and audio-directory book numbers for New Testament books.
pub const NEW_TESTAMENT_OFFSET: u32 = 40;

/// Identifiers parsed from a timing file's stem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimingFileName {
    pub prefix: String,

    /// Book number in the timing scheme, exactly as written (leading zeros kept).
    pub book_number: String,

    pub book_name: String,
    pub chapter: u32,
}

impl TimingFileName {
    pub fn parse(path: &Path) -> Result<Self> {
        let stem = path
            .file_stem()
            .and_then(|s| s.to_str())
            .ok_or_else(|| Error::FileName {
                name: path.display().to_string(),
                message: "file name is not valid UTF-8".to_owned(),
            })?;

        let invalid = |message: String| Error::FileName {
            name: stem.to_owned(),
            message,
        };

        let tokens: Vec<&str> = stem.split('-').collect();
        let [prefix, book_number, book_name, chapter, ..] = tokens.as_slice() else {
            return Err(invalid(format!(
                "expected at least 4 hyphen-separated tokens, found {}",
                tokens.len()
            )));
        };

        if book_number.is_empty() || !book_number.chars().all(|c| c.is_ascii_digit()) {
            return Err(invalid(format!("book number '{book_number}' is not numeric")));
        }
        if book_name.is_empty() {
            return Err(invalid("book name is empty".to_owned()));
        }
        let chapter = chapter
            .parse::<u32>()
            .ok()
            .filter(|c| *c > 0)
            .ok_or_else(|| invalid(format!("chapter '{chapter}' is not a positive number")))?;

        Ok(Self {
            prefix: (*prefix).to_owned(),
            book_number: (*book_number).to_owned(),
            book_name: (*book_name).to_owned(),
            chapter,
        })
    }
}

/// Conversion between the timing-file and audio-directory book numbering schemes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BookNumbering {
    pub offset: u32,
}

impl Default for BookNumbering {
    fn default() -> Self {
        Self {
            offset: NEW_TESTAMENT_OFFSET,
        }
    }
}

impl BookNumbering {
    pub fn new(offset: u32) -> Self {
        Self { offset }
    }

    /// Map a timing-scheme book number to the audio scheme.
    ///
    /// The result is zero-padded to the input's width, and never narrower than two digits,
    /// because the locator matches it as a literal directory-name prefix.
    pub fn to_audio(&self, timing_book_number: &str) -> Result<String> {
        let number = parse_book_number(timing_book_number)?;
        let mapped = number
            .checked_add(self.offset)
            .ok_or_else(|| Error::msg(format!("book number {number} overflows the offset")))?;
        Ok(pad_like(mapped, timing_book_number))
    }

    /// Map an audio-scheme book number back to the timing scheme.
    pub fn to_timing(&self, audio_book_number: &str) -> Result<String> {
        let number = parse_book_number(audio_book_number)?;
        let mapped = number.checked_sub(self.offset).ok_or_else(|| {
            Error::msg(format!(
                "audio book number {number} is below the numbering offset {}",
                self.offset
            ))
        })?;
        Ok(pad_like(mapped, audio_book_number))
    }
}

fn parse_book_number(raw: &str) -> Result<u32> {
    if raw.is_empty() || !raw.chars().all(|c| c.is_ascii_digit()) {
        return Err(Error::msg(format!("book number '{raw}' is not numeric")));
    }
    raw.parse()
        .map_err(|_| Error::msg(format!("book number '{raw}' is out of range")))
}

fn pad_like(number: u32, original: &str) -> String {
    let width = original.len().max(2);
    format!("{number:0width$}")
}

/// Agreement between a timing file's name and its embedded metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Correlation {
    pub book_matches: bool,
    pub chapter_matches: bool,
}

impl Correlation {
    pub fn is_match(&self) -> bool {
        self.book_matches && self.chapter_matches
    }
}

/// Compare filename identifiers with the `\id` / `\c` tags and warn on disagreement.
///
/// Book codes compare case-insensitively. A missing tag counts as a mismatch. Either way the
/// filename values stay authoritative, since they decide where clips are written.
pub fn correlate(name: &TimingFileName, record: &TimingRecord) -> Correlation {
    let book_matches = record
        .book_id
        .as_deref()
        .is_some_and(|id| id.eq_ignore_ascii_case(&name.book_name));
    let chapter_matches = record.chapter_number == Some(name.chapter);

    if !book_matches {
        warn!(
            file_book = %name.book_name,
            embedded_book = ?record.book_id,
            "book in file name does not match \\id tag; using file name"
        );
    }
    if !chapter_matches {
        warn!(
            file_chapter = name.chapter,
            embedded_chapter = ?record.chapter_number,
            "chapter in file name does not match \\c tag; using file name"
        );
    }

    Correlation {
        book_matches,
        chapter_matches,
    }
}
