use std::cell::RefCell;
use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;
use trmaker::planner::SegmentJob;
use trmaker::{ClipExtractor, Error, Opts, Pipeline};

const MAT_1: &str = "\\id mat\n\\c 1\n0.0 2.5 041001\n2.5 6.0 041002\n6.0 6.0 041002b\n";

/// Records every job and writes a placeholder clip, failing for the listed verses.
#[derive(Default)]
struct RecordingExtractor {
    jobs: RefCell<Vec<SegmentJob>>,
    fail_verses: Vec<u32>,
}

impl RecordingExtractor {
    fn verses(&self) -> Vec<u32> {
        self.jobs.borrow().iter().map(|j| j.verse).collect()
    }
}

impl ClipExtractor for RecordingExtractor {
    fn extract(&self, job: &SegmentJob) -> trmaker::Result<()> {
        self.jobs.borrow_mut().push(job.clone());
        if self.fail_verses.contains(&job.verse) {
            return Err(Error::Extraction {
                command: "fake".to_owned(),
                status: "exit status: 1".to_owned(),
                stderr: "simulated failure".to_owned(),
            });
        }
        fs::write(&job.destination_path, b"clip")?;
        Ok(())
    }
}

struct Fixture {
    timing: TempDir,
    audio: TempDir,
    out: TempDir,
}

impl Fixture {
    fn new() -> anyhow::Result<Self> {
        let fixture = Self {
            timing: tempfile::tempdir()?,
            audio: tempfile::tempdir()?,
            out: tempfile::tempdir()?,
        };
        fixture.audio_file("40-XYZ", "XYZ-01.mp3")?;
        fixture.audio_file("41-MAT", "MAT-01.mp3")?;
        fixture.audio_file("41-MAT", "MAT-02.mp3")?;
        Ok(fixture)
    }

    fn audio_file(&self, book_dir: &str, file: &str) -> anyhow::Result<()> {
        let dir = self.audio.path().join(book_dir);
        fs::create_dir_all(&dir)?;
        fs::write(dir.join(file), b"not really audio")?;
        Ok(())
    }

    fn timing_file(&self, name: &str, content: &str) -> anyhow::Result<()> {
        fs::write(self.timing.path().join(name), content)?;
        Ok(())
    }

    fn opts(&self) -> Opts {
        Opts::new(
            "EN",
            self.timing.path(),
            self.audio.path(),
            self.out.path(),
        )
    }

    fn clip(&self, chapter: u32, verse: u32) -> PathBuf {
        self.out.path().join(format!(
            "en/reg/mat/{chapter:02}/en_reg_b41_mat_c{chapter:02}_v{verse:02}_t01.mp3"
        ))
    }
}

fn exists(path: &Path) -> bool {
    path.is_file()
}

#[test]
fn writes_one_clip_per_verse() -> anyhow::Result<()> {
    let fx = Fixture::new()?;
    fx.timing_file("COV-01-mat-01.txt", MAT_1)?;

    let extractor = RecordingExtractor::default();
    let summary = Pipeline::with_extractor(fx.opts(), &extractor).run()?;

    assert_eq!(summary.timing_files, 1);
    assert_eq!(summary.clips_planned, 2);
    assert_eq!(summary.clips_written, 2);
    assert_eq!(summary.mismatches, 0);
    assert_eq!(extractor.verses(), vec![1, 2]);

    let jobs = extractor.jobs.borrow();
    assert_eq!(jobs[0].source_file, fx.audio.path().join("41-MAT/MAT-01.mp3"));
    assert_eq!((jobs[0].start, jobs[0].end), (0.0, 2.5));
    assert_eq!((jobs[1].start, jobs[1].end), (2.5, 6.0));
    assert!(exists(&fx.clip(1, 1)));
    assert!(exists(&fx.clip(1, 2)));
    Ok(())
}

#[test]
fn second_run_extracts_nothing() -> anyhow::Result<()> {
    let fx = Fixture::new()?;
    fx.timing_file("COV-01-mat-01.txt", MAT_1)?;

    Pipeline::with_extractor(fx.opts(), RecordingExtractor::default()).run()?;

    let extractor = RecordingExtractor::default();
    let summary = Pipeline::with_extractor(fx.opts(), &extractor).run()?;

    assert!(extractor.verses().is_empty());
    assert_eq!(summary.clips_skipped_existing, 2);
    assert_eq!(summary.clips_written, 0);
    Ok(())
}

#[test]
fn existing_clip_is_skipped_while_siblings_are_made() -> anyhow::Result<()> {
    let fx = Fixture::new()?;
    fx.timing_file("COV-01-mat-01.txt", MAT_1)?;
    let existing = fx.clip(1, 1);
    fs::create_dir_all(existing.parent().expect("clip has a parent"))?;
    fs::write(&existing, b"keep me")?;

    let extractor = RecordingExtractor::default();
    let summary = Pipeline::with_extractor(fx.opts(), &extractor).run()?;

    assert_eq!(extractor.verses(), vec![2]);
    assert_eq!(summary.clips_skipped_existing, 1);
    assert_eq!(fs::read(&existing)?, b"keep me");
    Ok(())
}

#[test]
fn missing_audio_is_skipped_and_other_files_continue() -> anyhow::Result<()> {
    let fx = Fixture::new()?;
    // Book 02 maps to 42, which has no directory.
    fx.timing_file("COV-02-mrk-01.txt", "\\id mrk\n\\c 1\n0 1 1\n1 2 2\n")?;
    // Chapter 3 of Matthew has no recording.
    fx.timing_file("COV-01-mat-03.txt", "\\id mat\n\\c 3\n0 1 1\n")?;
    fx.timing_file("COV-01-mat-02.txt", "\\id mat\n\\c 2\n0 1 1\n1 2 2\n")?;

    let extractor = RecordingExtractor::default();
    let summary = Pipeline::with_extractor(fx.opts(), &extractor).run()?;

    assert_eq!(summary.timing_files, 3);
    assert_eq!(summary.lookup_misses, 2);
    assert_eq!(summary.clips_written, 2);
    assert!(exists(&fx.clip(2, 2)));
    Ok(())
}

#[test]
fn file_name_wins_over_embedded_tags() -> anyhow::Result<()> {
    let fx = Fixture::new()?;
    fx.timing_file("COV-01-mat-01.txt", "\\id mrk\n\\c 7\n0 1 1\n")?;

    let extractor = RecordingExtractor::default();
    let summary = Pipeline::with_extractor(fx.opts(), &extractor).run()?;

    assert_eq!(summary.mismatches, 1);
    assert!(exists(&fx.clip(1, 1)));
    Ok(())
}

#[test]
fn unreadable_chapter_tag_still_makes_every_clip() -> anyhow::Result<()> {
    let fx = Fixture::new()?;
    fx.timing_file(
        "COV-01-mat-01.txt",
        "\\id mat\n\\c 1a\n0.0 2.5 041001\n2.5 6.0 041002\n",
    )?;

    let extractor = RecordingExtractor::default();
    let summary = Pipeline::with_extractor(fx.opts(), &extractor).run()?;

    assert_eq!(extractor.verses(), vec![1, 2]);
    assert_eq!(summary.parse_anomalies, 0);
    assert_eq!(summary.mismatches, 1);
    assert!(exists(&fx.clip(1, 2)));
    Ok(())
}

#[test]
fn partial_parse_still_uses_verses_read_so_far() -> anyhow::Result<()> {
    let fx = Fixture::new()?;
    fx.timing_file(
        "COV-01-mat-01.txt",
        "\\id mat\n\\c 1\n0 1 1\n1 2 2\n2 x 3\n3 4 4\n",
    )?;

    let extractor = RecordingExtractor::default();
    let summary = Pipeline::with_extractor(fx.opts(), &extractor).run()?;

    assert_eq!(summary.parse_anomalies, 1);
    assert_eq!(extractor.verses(), vec![1, 2]);
    Ok(())
}

#[test]
fn failed_clip_does_not_stop_the_chapter() -> anyhow::Result<()> {
    let fx = Fixture::new()?;
    fx.timing_file("COV-01-mat-01.txt", "0 1 1\n1 2 2\n2 3 3\n")?;

    let extractor = RecordingExtractor {
        fail_verses: vec![2],
        ..Default::default()
    };
    let summary = Pipeline::with_extractor(fx.opts(), &extractor).run()?;

    assert_eq!(extractor.verses(), vec![1, 2, 3]);
    assert_eq!(summary.clips_failed, 1);
    assert_eq!(summary.clips_written, 2);
    assert!(!exists(&fx.clip(1, 2)));
    Ok(())
}

#[test]
fn bad_timing_file_name_is_contained() -> anyhow::Result<()> {
    let fx = Fixture::new()?;
    fx.timing_file("notes.txt", "0 1 1\n")?;
    fx.timing_file("COV-01-mat-01.txt", MAT_1)?;

    let summary = Pipeline::with_extractor(fx.opts(), RecordingExtractor::default()).run()?;

    assert_eq!(summary.files_failed, 1);
    assert_eq!(summary.clips_written, 2);
    Ok(())
}

#[test]
fn dry_run_touches_nothing() -> anyhow::Result<()> {
    let fx = Fixture::new()?;
    fx.timing_file("COV-01-mat-01.txt", MAT_1)?;

    let mut opts = fx.opts();
    opts.dry_run = true;
    let extractor = RecordingExtractor::default();
    let summary = Pipeline::with_extractor(opts, &extractor).run()?;

    assert!(summary.dry_run);
    assert_eq!(summary.clips_planned, 2);
    assert!(extractor.verses().is_empty());
    assert!(!fx.out.path().join("en").exists());
    Ok(())
}

#[test]
fn unreadable_inputs_abort_the_run() -> anyhow::Result<()> {
    let fx = Fixture::new()?;

    let mut opts = fx.opts();
    opts.timing_dir = fx.timing.path().join("missing");
    let err = Pipeline::with_extractor(opts, RecordingExtractor::default())
        .run()
        .unwrap_err();
    assert!(matches!(err, Error::Discovery { .. }));

    let mut opts = fx.opts();
    opts.audio_dir = fx.audio.path().join("missing");
    let err = Pipeline::with_extractor(opts, RecordingExtractor::default())
        .run()
        .unwrap_err();
    assert!(err.is_fatal());
    Ok(())
}
