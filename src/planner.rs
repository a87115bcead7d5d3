//! Turning parsed verse intervals into clip extraction jobs.
//!
//! Clips land in a translation-recorder project tree:
//!
//! ```text
//! {output_root}/{lang}/reg/{book}/{chapter:02}/{lang}_reg_b{book_number}_{book}_c{chapter:02}_v{verse:02}_t01.{ext}
//! ```

use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, warn};

use crate::locator::LocatedAudio;
use crate::naming::TimingFileName;
use crate::timing::TimingRecord;

pub const DEFAULT_PROJECT_TYPE: &str = "reg";
pub const DEFAULT_TAKE: u32 = 1;

/// Where and how clips are named on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectLayout {
    pub output_root: PathBuf,

    /// Always stored lowercase.
    pub language_code: String,

    pub project_type: String,
    pub take: u32,
}

impl ProjectLayout {
    pub fn new(output_root: impl Into<PathBuf>, language_code: &str) -> Self {
        Self {
            output_root: output_root.into(),
            language_code: language_code.to_lowercase(),
            project_type: DEFAULT_PROJECT_TYPE.to_owned(),
            take: DEFAULT_TAKE,
        }
    }

    /// `{output_root}/{lang}/{type}/{book}/{chapter:02}`
    pub fn chapter_dir(&self, book_name: &str, chapter: u32) -> PathBuf {
        self.output_root
            .join(&self.language_code)
            .join(&self.project_type)
            .join(book_name.to_lowercase())
            .join(format!("{chapter:02}"))
    }

    /// Full destination path for one verse's clip.
    pub fn clip_path(
        &self,
        book_number: &str,
        book_name: &str,
        chapter: u32,
        verse: u32,
        extension: Option<&str>,
    ) -> PathBuf {
        let book = book_name.to_lowercase();
        let mut file_name = format!(
            "{lang}_{kind}_b{book_number}_{book}_c{chapter:02}_v{verse:02}_t{take:02}",
            lang = self.language_code,
            kind = self.project_type,
            take = self.take,
        );
        if let Some(ext) = extension {
            file_name.push('.');
            file_name.push_str(ext);
        }
        self.chapter_dir(&book, chapter).join(file_name)
    }
}

/// One clip to cut out of a chapter recording.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SegmentJob {
    pub verse: u32,
    pub source_file: PathBuf,
    pub start: f64,
    pub end: f64,
    pub destination_path: PathBuf,
}

/// Jobs for one chapter plus what was left out and why.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Plan {
    pub jobs: Vec<SegmentJob>,

    /// Verses whose clip already exists.
    pub skipped_existing: usize,

    /// Verses whose interval is empty or reversed.
    pub skipped_invalid: usize,
}

/// Build one job per verse, in verse order.
///
/// Names come from the timing file name, the book number from the audio scheme and the
/// container extension from the source recording.
pub fn plan_segments(
    record: &TimingRecord,
    name: &TimingFileName,
    located: &LocatedAudio,
    layout: &ProjectLayout,
) -> Plan {
    let extension = located
        .chapter_file
        .extension()
        .and_then(|ext| ext.to_str());

    let mut plan = Plan::default();
    for (&verse, interval) in &record.verses {
        let destination_path = layout.clip_path(
            &located.resolved_book_number,
            &name.book_name,
            name.chapter,
            verse,
            extension,
        );

        if destination_path.exists() {
            debug!(path = %destination_path.display(), "clip exists; skipping");
            plan.skipped_existing += 1;
            continue;
        }

        if !interval.is_extractable() {
            warn!(
                book = %name.book_name,
                chapter = name.chapter,
                verse,
                start = interval.start,
                end = interval.end,
                "verse interval is empty or reversed; skipping"
            );
            plan.skipped_invalid += 1;
            continue;
        }

        plan.jobs.push(SegmentJob {
            verse,
            source_file: located.chapter_file.clone(),
            start: interval.start,
            end: interval.end,
            destination_path,
        });
    }
    plan
}

/// Chapter directory every job in `plan` writes into, if there are any jobs.
pub fn plan_dir(plan: &Plan) -> Option<&Path> {
    plan.jobs.first()?.destination_path.parent()
}
