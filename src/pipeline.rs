//! High-level entry point: timing directory + audio tree in, per-verse clips out.
//!
//! We expose a single type (`Pipeline`) that wires the lower-level pieces together:
//! timing parse → name/metadata correlation → audio lookup → planning → extraction.
//!
//! Timing files are handled one at a time, in file-name order, and each one is finished
//! (every clip attempted) before the next starts. Only discovery errors (an input directory
//! that cannot be read) end the run; everything else is logged, counted and contained to the
//! timing file or verse it happened in.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, error, info, info_span, warn};

use crate::extractor::{ClipExtractor, FfmpegExtractor};
use crate::locator::{locate, sorted_entries};
use crate::naming::{TimingFileName, correlate};
use crate::opts::Opts;
use crate::planner::{plan_dir, plan_segments};
use crate::timing::read_timing_file;
use crate::{Error, Result};

/// Counters for one run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub dry_run: bool,
    pub timing_files: usize,

    /// Files whose parse stopped early; their partial verses were still used.
    pub parse_anomalies: usize,

    /// Files whose name and `\id`/`\c` tags disagree.
    pub mismatches: usize,

    /// Files with no matching book directory or chapter recording.
    pub lookup_misses: usize,

    /// Files abandoned for any other reason (bad name, unwritable output).
    pub files_failed: usize,

    pub clips_planned: usize,
    pub clips_written: usize,
    pub clips_failed: usize,
    pub clips_skipped_existing: usize,
    pub clips_skipped_invalid: usize,
}

/// The clip-making pipeline.
///
/// Typical usage:
/// - Construct once with [`Opts`] (and optionally a custom extractor).
/// - Call [`Pipeline::run`]; rerunning over the same output only fills in missing clips.
pub struct Pipeline<E: ClipExtractor = FfmpegExtractor> {
    opts: Opts,
    extractor: E,
}

impl Pipeline<FfmpegExtractor> {
    /// Create a pipeline that trims with `ffmpeg` from `PATH`.
    pub fn new(opts: Opts) -> Self {
        Self::with_extractor(opts, FfmpegExtractor::default())
    }
}

impl<E: ClipExtractor> Pipeline<E> {
    pub fn with_extractor(opts: Opts, extractor: E) -> Self {
        Self { opts, extractor }
    }

    /// Process every timing file in `opts.timing_dir`.
    pub fn run(&self) -> Result<RunSummary> {
        let timing_files = timing_files(&self.opts.timing_dir)?;
        // Fail before touching any timing file if the audio tree is unusable.
        sorted_entries(&self.opts.audio_dir)?;

        info!(
            timing_dir = %self.opts.timing_dir.display(),
            audio_dir = %self.opts.audio_dir.display(),
            output_dir = %self.opts.layout.output_root.display(),
            files = timing_files.len(),
            dry_run = self.opts.dry_run,
            "starting run"
        );

        let mut summary = RunSummary {
            dry_run: self.opts.dry_run,
            ..Default::default()
        };

        for path in &timing_files {
            let span = info_span!("timing_file", file = %path.display());
            let _enter = span.enter();

            if let Err(err) = self.process_file(path, &mut summary) {
                if err.is_fatal() {
                    return Err(err);
                }
                error!(error = %err, "skipping timing file");
                summary.files_failed += 1;
            }
        }

        info!(
            written = summary.clips_written,
            failed = summary.clips_failed,
            skipped = summary.clips_skipped_existing,
            "run finished"
        );
        Ok(summary)
    }

    fn process_file(&self, path: &Path, summary: &mut RunSummary) -> Result<()> {
        summary.timing_files += 1;

        let record = match read_timing_file(path) {
            Ok(record) => record,
            Err(partial) => {
                warn!(
                    error = %partial.source,
                    verses = partial.partial.verses.len(),
                    "timing data parse stopped early; using the verses read so far"
                );
                summary.parse_anomalies += 1;
                partial.partial
            }
        };

        if !record.has_timing() {
            info!("no timing lines; nothing to do");
            return Ok(());
        }

        let name = TimingFileName::parse(path)?;
        if !correlate(&name, &record).is_match() {
            summary.mismatches += 1;
        }

        let audio_book_number = self.opts.numbering.to_audio(&name.book_number)?;
        info!(
            book = %name.book_name,
            book_number = %name.book_number,
            audio_book_number = %audio_book_number,
            chapter = name.chapter,
            verses = record.verses.len(),
            "parsed timing file"
        );

        let Some(located) = locate(&self.opts.audio_dir, &audio_book_number, name.chapter)?
        else {
            error!(
                book = %name.book_name,
                audio_book_number = %audio_book_number,
                chapter = name.chapter,
                "no recording found for this chapter"
            );
            summary.lookup_misses += 1;
            return Ok(());
        };
        debug!(recording = %located.chapter_file.display(), "found chapter recording");

        let plan = plan_segments(&record, &name, &located, &self.opts.layout);
        summary.clips_planned += plan.jobs.len();
        summary.clips_skipped_existing += plan.skipped_existing;
        summary.clips_skipped_invalid += plan.skipped_invalid;

        if self.opts.dry_run {
            for job in &plan.jobs {
                info!(
                    verse = job.verse,
                    start = job.start,
                    end = job.end,
                    destination = %job.destination_path.display(),
                    "would extract"
                );
            }
            return Ok(());
        }

        if let Some(dir) = plan_dir(&plan) {
            fs::create_dir_all(dir).map_err(|err| {
                Error::msg(format!("cannot create project folder '{}': {err}", dir.display()))
            })?;
        }

        for job in &plan.jobs {
            match self.extractor.extract(job) {
                Ok(()) => {
                    debug!(verse = job.verse, destination = %job.destination_path.display(), "clip written");
                    summary.clips_written += 1;
                }
                Err(err) => {
                    error!(verse = job.verse, error = %err, "clip extraction failed");
                    summary.clips_failed += 1;
                }
            }
        }
        Ok(())
    }
}

/// Regular files in the timing directory, in name order.
fn timing_files(dir: &Path) -> Result<Vec<PathBuf>> {
    Ok(sorted_entries(dir)?
        .into_iter()
        .filter(|path| path.is_file())
        .collect())
}
