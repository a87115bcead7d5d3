//! Verse-timing transcript parsing.
//!
//! A timing file interleaves USFM-style metadata tags with `start end label` triples:
//!
//! ```text
//! \id mat
//! \c 1
//! 0.0 2.5 041001
//! 2.5 6.0 041002
//! 6.0 6.0 041002b
//! ```
//!
//! Only two line shapes carry meaning:
//! - two tokens: a metadata tag (`\id`, `\c`) and its value
//! - three tokens: a timing triple
//!
//! Everything else is skipped. A verse's interval opens on the first triple that names it and
//! is closed at the start time of the first triple naming a different verse. Triples that repeat
//! the open verse (usually with a letter suffix, `2b`) keep its start and move its end.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use serde::Serialize;
use tracing::{trace, warn};

use crate::{Error, Result};

/// Packed labels (`041002`) keep the verse in their last three digits.
const PACKED_VERSE_WIDTH: usize = 3;

/// A half-open `[start, end)` span in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Interval {
    pub start: f64,
    pub end: f64,
}

impl Interval {
    /// Whether the interval covers any audio at all.
    pub fn is_extractable(&self) -> bool {
        self.end > self.start
    }
}

/// Everything read from one timing file.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TimingRecord {
    /// Book code from the `\id` tag, case preserved.
    pub book_id: Option<String>,

    /// Chapter from the `\c` tag.
    pub chapter_number: Option<u32>,

    /// Verse number to interval, ordered by verse.
    pub verses: BTreeMap<u32, Interval>,
}

impl TimingRecord {
    pub fn has_timing(&self) -> bool {
        !self.verses.is_empty()
    }
}

/// A verse marker split into its number and optional sub-verse suffix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerseLabel {
    pub number: u32,
    pub suffix: Option<String>,
}

impl VerseLabel {
    /// Parse labels such as `12`, `12b`, `v12b` or the packed `041012b`.
    ///
    /// Returns `None` when the label has no digit run or has trailing characters that are not
    /// letters.
    pub fn parse(label: &str) -> Option<Self> {
        let rest = label.trim_start_matches(|c: char| c.is_alphabetic());
        let digits_len = rest
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(rest.len());
        if digits_len == 0 {
            return None;
        }

        let (digits, tail) = rest.split_at(digits_len);
        if !tail.chars().all(char::is_alphabetic) {
            return None;
        }

        let verse_digits = if digits.len() > PACKED_VERSE_WIDTH {
            &digits[digits.len() - PACKED_VERSE_WIDTH..]
        } else {
            digits
        };

        Some(Self {
            number: verse_digits.parse().ok()?,
            suffix: (!tail.is_empty()).then(|| tail.to_owned()),
        })
    }
}

/// Line-at-a-time accumulator for one timing file.
#[derive(Debug, Default)]
pub struct MarkerParser {
    record: TimingRecord,
    current_verse: Option<u32>,
    start_time: f64,
    line: usize,
}

impl MarkerParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one line of the transcript.
    ///
    /// On error the parser keeps everything recorded so far; callers stop feeding and call
    /// [`MarkerParser::finish`] to get the partial record.
    pub fn feed_line(&mut self, line: &str) -> Result<()> {
        self.line += 1;

        let parts: Vec<&str> = line.split_whitespace().collect();
        match parts.as_slice() {
            [tag, value] => {
                self.metadata(tag, value);
                Ok(())
            }
            [start, end, label] => self.timing(start, end, label),
            _ => Ok(()),
        }
    }

    /// The verse whose interval is still open, if any.
    pub fn current_verse(&self) -> Option<u32> {
        self.current_verse
    }

    pub fn finish(self) -> TimingRecord {
        self.record
    }

    fn metadata(&mut self, tag: &str, value: &str) {
        match tag.trim_start_matches('\\') {
            "id" => self.record.book_id = Some(value.to_owned()),
            "c" => {
                // The file name decides the chapter; an unreadable tag only loses the cross-check.
                self.record.chapter_number = value.parse::<u32>().ok().filter(|c| *c > 0);
                if self.record.chapter_number.is_none() {
                    warn!(line = self.line, value, "ignoring unreadable chapter tag");
                }
            }
            other => trace!(line = self.line, tag = other, "ignoring metadata tag"),
        }
    }

    fn timing(&mut self, start: &str, end: &str, label: &str) -> Result<()> {
        let start = self.seconds(start, "start")?;
        let end = self.seconds(end, "end")?;
        let label = VerseLabel::parse(label)
            .ok_or_else(|| Error::parse(self.line, format!("invalid verse label '{label}'")))?;

        let verse = match self.current_verse {
            Some(current) if current == label.number => {
                if let Some(suffix) = &label.suffix {
                    trace!(verse = current, suffix = %suffix, "continuation marker");
                }
                current
            }
            Some(current) => {
                // A new verse closes the previous one where the new one starts.
                self.record.verses.insert(
                    current,
                    Interval {
                        start: self.start_time,
                        end: start,
                    },
                );
                self.start_time = start;
                label.number
            }
            None => {
                self.start_time = start;
                label.number
            }
        };

        self.current_verse = Some(verse);
        self.record.verses.insert(
            verse,
            Interval {
                start: self.start_time,
                end,
            },
        );
        Ok(())
    }

    fn seconds(&self, raw: &str, field: &str) -> Result<f64> {
        raw.parse::<f64>()
            .ok()
            .filter(|s| s.is_finite() && *s >= 0.0)
            .ok_or_else(|| Error::parse(self.line, format!("invalid {field} time '{raw}'")))
    }
}

/// A parse that stopped early, along with whatever was read before the failure.
#[derive(Debug, thiserror::Error)]
#[error("timing data parse stopped early: {source}")]
pub struct PartialParse {
    pub partial: TimingRecord,
    #[source]
    pub source: Error,
}

/// Parse a whole transcript from a reader.
pub fn parse_timing<R: BufRead>(reader: R) -> std::result::Result<TimingRecord, PartialParse> {
    let mut parser = MarkerParser::new();
    for line in reader.lines() {
        let outcome = line
            .map_err(Error::from)
            .and_then(|line| parser.feed_line(&line));
        if let Err(source) = outcome {
            return Err(PartialParse {
                partial: parser.finish(),
                source,
            });
        }
    }
    Ok(parser.finish())
}

/// Parse a timing file from disk.
///
/// A file that cannot be opened yields an empty partial record.
pub fn read_timing_file(path: &Path) -> std::result::Result<TimingRecord, PartialParse> {
    match File::open(path) {
        Ok(file) => parse_timing(BufReader::new(file)),
        Err(err) => Err(PartialParse {
            partial: TimingRecord::default(),
            source: err.into(),
        }),
    }
}
