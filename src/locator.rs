//! Finding a chapter recording inside the audio tree.
//!
//! The audio root holds one directory per book, named with the audio-scheme book number first
//! (`41-MAT`), and each book directory holds one file per chapter whose stem ends in the chapter
//! number (`MAT-03.mp3`).
//!
//! Directory entries are sorted by name before matching, so when several entries qualify the
//! lexicographically first one wins on every platform.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::debug;

use crate::{Error, Result};

/// A resolved chapter recording.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LocatedAudio {
    pub book_directory: PathBuf,
    pub chapter_file: PathBuf,

    /// Book number in the audio scheme, as used to find `book_directory`.
    pub resolved_book_number: String,
}

/// Look up the recording for one chapter.
///
/// `audio_book_number` is matched as a literal prefix of the directory name, so it must already
/// be offset-adjusted and padded the way the audio tree spells it. Returns `Ok(None)` when either
/// the book directory or the chapter file is missing.
pub fn locate(
    audio_root: &Path,
    audio_book_number: &str,
    chapter: u32,
) -> Result<Option<LocatedAudio>> {
    let Some(book_directory) = find_book_directory(audio_root, audio_book_number)? else {
        debug!(
            root = %audio_root.display(),
            book = audio_book_number,
            "no book directory with this prefix"
        );
        return Ok(None);
    };

    let Some(chapter_file) = find_chapter_file(&book_directory, chapter)? else {
        debug!(
            dir = %book_directory.display(),
            chapter,
            "no chapter file in book directory"
        );
        return Ok(None);
    };

    Ok(Some(LocatedAudio {
        book_directory,
        chapter_file,
        resolved_book_number: audio_book_number.to_owned(),
    }))
}

/// First subdirectory of `audio_root` whose name starts with `audio_book_number`.
pub fn find_book_directory(audio_root: &Path, audio_book_number: &str) -> Result<Option<PathBuf>> {
    Ok(sorted_entries(audio_root)?
        .into_iter()
        .filter(|path| path.is_dir())
        .find(|path| {
            file_name(path).is_some_and(|name| name.starts_with(audio_book_number))
        }))
}

/// First regular file in `book_directory` whose stem ends with `-{chapter}`.
///
/// The final hyphen token is compared numerically, so `MAT-3` and `MAT-03` both match chapter 3
/// while `MAT-13` does not.
pub fn find_chapter_file(book_directory: &Path, chapter: u32) -> Result<Option<PathBuf>> {
    Ok(sorted_entries(book_directory)?
        .into_iter()
        .filter(|path| path.is_file())
        .find(|path| chapter_suffix(path) == Some(chapter)))
}

fn chapter_suffix(path: &Path) -> Option<u32> {
    let stem = path.file_stem()?.to_str()?;
    let (_, token) = stem.rsplit_once('-')?;
    if token.is_empty() || !token.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    token.parse().ok()
}

fn file_name(path: &Path) -> Option<&str> {
    path.file_name()?.to_str()
}

/// List a directory, sorted by file name.
pub(crate) fn sorted_entries(dir: &Path) -> Result<Vec<PathBuf>> {
    let entries = fs::read_dir(dir).map_err(|err| Error::discovery(dir, err))?;

    let mut paths = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|err| Error::discovery(dir, err))?;
        paths.push(entry.path());
    }
    paths.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(paths)
}
